/*!
 * Memory Module
 * Heap allocator, its arena and inspection types
 */

pub mod arena;
pub mod manager;
pub mod shared;
pub mod traits;
pub mod types;

// Re-export for convenience
pub use arena::VecArena;
pub use manager::Heap;
pub use shared::SharedHeap;
pub use traits::*;
pub use types::*;
