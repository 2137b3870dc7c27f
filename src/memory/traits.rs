/*!
 * Memory Traits
 * Abstractions at the heap's two seams: the arena it grows into and the
 * allocator interface it offers
 */

use crate::core::errors::{ConsistencyViolation, HeapResult};
use crate::core::types::{Address, BlockHandle, Size};

/// Raw memory provider backing heap growth
///
/// An arena is a contiguous range of offsets starting at 0 and ending at the
/// current break. It only ever grows, and growth never moves existing offsets.
pub trait Arena {
    /// Commit `additional` more bytes and return the start of the new region
    /// (the previous break), or `None` when the arena is exhausted
    fn extend(&mut self, additional: Size) -> Option<Address>;

    /// Current break: one past the last committed offset
    fn brk(&self) -> Address;

    /// Committed bytes, indexed by offset
    fn bytes(&self) -> &[u8];

    /// Mutable view of the committed bytes
    fn bytes_mut(&mut self) -> &mut [u8];
}

/// Allocator interface
pub trait Allocator {
    /// Allocate a block with at least `size` usable bytes
    fn allocate(&mut self, size: Size) -> Option<BlockHandle>;

    /// Release a block previously returned by `allocate`
    fn deallocate(&mut self, handle: BlockHandle) -> HeapResult<()>;

    /// Validate the heap structure
    fn check(&self) -> Result<(), ConsistencyViolation>;

    /// Usable payload bytes of a live block
    fn usable_size(&self, handle: BlockHandle) -> Option<Size>;
}
