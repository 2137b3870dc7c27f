/*!
 * tagheap
 * Boundary-tag heap allocator over a growable arena
 *
 * A single heap region bounded by prologue/epilogue sentinels, first-fit
 * allocation over an explicit LIFO free list, block splitting, immediate
 * boundary-tag coalescing and a structural consistency checker.
 *
 * ```
 * use tagheap::{Heap, HeapConfig};
 *
 * let mut heap = Heap::new(HeapConfig::default()).unwrap();
 * let block = heap.allocate(10).unwrap();
 * heap.write_bytes(block, 0, b"hi").unwrap();
 * heap.deallocate(block).unwrap();
 * assert!(heap.check().is_ok());
 * ```
 */

pub mod core;
pub mod memory;
pub mod monitoring;

// Re-exports
pub use crate::core::{BlockHandle, ConsistencyViolation, HeapConfig, HeapError, HeapResult};
pub use memory::{Allocator, Arena, BlockInfo, Heap, HeapStats, SharedHeap, VecArena};
pub use monitoring::init_tracing;
