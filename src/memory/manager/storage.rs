/*!
 * Payload Storage Operations
 * Bounds-checked read/write access to the payload of live blocks
 */

use super::layout;
use super::Heap;
use crate::core::errors::{HeapError, HeapResult};
use crate::core::types::{Address, BlockHandle, Size};
use crate::memory::traits::Arena;
use std::ops::Range;
use tracing::trace;

impl<A: Arena> Heap<A> {
    /// Payload byte range of a live block
    fn payload_range(&self, handle: BlockHandle) -> HeapResult<Range<Address>> {
        let bp = handle.offset();
        let usable = self
            .usable_size(handle)
            .ok_or(HeapError::InvalidHandle(bp))?;
        Ok(bp..bp + usable)
    }

    /// Sub-range `offset..offset + len` of a live block's payload
    fn payload_slice(&self, handle: BlockHandle, offset: Size, len: Size) -> HeapResult<Range<Address>> {
        let range = self.payload_range(handle)?;
        let usable = range.len();
        match offset.checked_add(len) {
            Some(end) if end <= usable => Ok(range.start + offset..range.start + end),
            _ => Err(HeapError::PayloadBounds {
                handle: handle.offset(),
                offset,
                len,
                usable,
            }),
        }
    }

    /// Whole usable payload of a live block
    pub fn payload(&self, handle: BlockHandle) -> HeapResult<&[u8]> {
        let range = self.payload_range(handle)?;
        Ok(&self.arena.bytes()[range])
    }

    /// Mutable view of a live block's usable payload
    ///
    /// Writes through this slice cannot reach the block's footer.
    pub fn payload_mut(&mut self, handle: BlockHandle) -> HeapResult<&mut [u8]> {
        let range = self.payload_range(handle)?;
        Ok(&mut self.arena.bytes_mut()[range])
    }

    /// Copy `data` into a live block starting `offset` bytes into its payload
    pub fn write_bytes(&mut self, handle: BlockHandle, offset: Size, data: &[u8]) -> HeapResult<()> {
        let range = self.payload_slice(handle, offset, data.len())?;
        self.arena.bytes_mut()[range].copy_from_slice(data);
        trace!(block = handle.offset(), offset, len = data.len(), "Wrote payload bytes");
        Ok(())
    }

    /// Copy `len` bytes out of a live block starting `offset` bytes into its
    /// payload
    pub fn read_bytes(&self, handle: BlockHandle, offset: Size, len: Size) -> HeapResult<Vec<u8>> {
        let range = self.payload_slice(handle, offset, len)?;
        Ok(self.arena.bytes()[range].to_vec())
    }
}
