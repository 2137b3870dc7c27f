/*!
 * Heap Allocator Implementation
 * Allocation, placement, deallocation and coalescing
 */

use super::free_list::FreeList;
use super::layout::{self, Tag};
use super::Heap;
use crate::core::errors::{ConsistencyViolation, HeapError, HeapResult};
use crate::core::types::{Address, BlockHandle, Size};
use crate::memory::traits::Arena;
use tracing::{debug, instrument, trace, warn};

impl<A: Arena> Heap<A> {
    /// Allocate a block with at least `size` usable bytes
    ///
    /// Returns `None` for zero-size requests (the heap is left untouched), for
    /// sizes that overflow the block computation, when the arena is exhausted,
    /// and when the heap is poisoned.
    pub fn allocate(&mut self, size: Size) -> Option<BlockHandle> {
        match self.try_allocate(size) {
            Ok(handle) => Some(handle),
            Err(HeapError::ZeroSize) => None,
            Err(err) => {
                debug!(requested = size, error = %err, "Allocation failed");
                None
            }
        }
    }

    /// Allocate a block, reporting why no block could be produced
    #[instrument(level = "trace", skip(self))]
    pub fn try_allocate(&mut self, size: Size) -> HeapResult<BlockHandle> {
        self.ensure_healthy()?;
        let result = self.allocate_block(size);
        self.track(result)
    }

    /// Release a block previously returned by `allocate`
    ///
    /// Freeing an unknown handle or an already freed block is a usage
    /// violation: the error is returned and the heap is not modified. A handle
    /// counts as already freed until its offset is handed out again.
    #[instrument(level = "trace", skip(self))]
    pub fn deallocate(&mut self, handle: BlockHandle) -> HeapResult<()> {
        self.ensure_healthy()?;
        let result = self.free_block(handle.offset());
        self.track(result)
    }

    fn allocate_block(&mut self, size: Size) -> HeapResult<BlockHandle> {
        if size == 0 {
            return Err(HeapError::ZeroSize);
        }
        let asize = layout::adjusted_size(size).ok_or(HeapError::SizeOverflow { requested: size })?;

        let bp = match self.find_fit(asize)? {
            Some(bp) => bp,
            None => {
                let extend = asize.max(self.config.chunk_size);
                match self.grow(extend)? {
                    Some(bp) => bp,
                    None => {
                        warn!(
                            requested = size,
                            block_size = asize,
                            brk = self.arena.brk(),
                            "Out of memory: arena cannot grow"
                        );
                        return Err(HeapError::OutOfMemory {
                            requested: size,
                            block_size: asize,
                            brk: self.arena.brk(),
                        });
                    }
                }
            }
        };

        let placed = self.place(bp, asize)?;
        self.live.insert(bp);
        self.freed.remove(&bp);
        debug!(
            block = bp,
            requested = size,
            block_size = placed,
            "Allocated block"
        );

        self.verify_if_enabled()?;
        Ok(BlockHandle::from_offset(bp))
    }

    /// First free block in list order holding at least `asize` bytes
    fn find_fit(&self, asize: Size) -> HeapResult<Option<Address>> {
        let bytes = self.arena.bytes();
        for bp in self.free_list.iter() {
            let tag = layout::header(bytes, bp)?;
            if tag.allocated {
                return Err(ConsistencyViolation::StaleFreeListEntry { offset: bp }.into());
            }
            if tag.size >= asize {
                return Ok(Some(bp));
            }
        }
        Ok(None)
    }

    /// Commit `asize` bytes of the free block at `bp`, splitting off the tail
    /// when it is large enough to stand alone. Returns the allocated size.
    fn place(&mut self, bp: Address, asize: Size) -> HeapResult<Size> {
        unlink(&mut self.free_list, bp)?;

        let bytes = self.arena.bytes_mut();
        let csize = layout::header(bytes, bp)?.size;
        let remainder = csize.saturating_sub(asize);

        if remainder < self.config.min_block_size {
            layout::write_tags(bytes, bp, Tag::used(csize))?;
            return Ok(csize);
        }

        layout::write_tags(bytes, bp, Tag::used(asize))?;
        let rest = bp + asize;
        layout::write_tags(bytes, rest, Tag::free(remainder))?;
        self.free_list.push(rest);
        trace!(block = bp, size = asize, rest, remainder, "Split free block");
        Ok(asize)
    }

    fn free_block(&mut self, bp: Address) -> HeapResult<()> {
        if !self.live.contains(&bp) {
            let err = if self.freed.contains(&bp) {
                HeapError::DoubleFree(bp)
            } else {
                HeapError::InvalidHandle(bp)
            };
            warn!(block = bp, error = %err, "Rejected free");
            return Err(err);
        }

        let bytes = self.arena.bytes_mut();
        let tag = layout::header(bytes, bp)?;
        let footer = layout::footer(bytes, bp)?;
        if !tag.allocated || footer != tag {
            return Err(ConsistencyViolation::HeaderFooterMismatch {
                offset: bp,
                header: tag.pack(),
                footer: footer.pack(),
            }
            .into());
        }

        layout::write_tags(bytes, bp, Tag::free(tag.size))?;
        self.live.remove(&bp);
        self.freed.insert(bp);
        let merged = self.coalesce(bp)?;
        debug!(block = bp, block_size = tag.size, merged, "Freed block");

        self.verify_if_enabled()
    }

    /// Merge the free block at `bp` with its free neighbours and list the
    /// survivor. Returns the survivor's payload offset.
    pub(super) fn coalesce(&mut self, bp: Address) -> HeapResult<Address> {
        let bytes = self.arena.bytes();
        let size = layout::header(bytes, bp)?.size;
        let prev = layout::prev_block(bytes, bp)?;
        let next = layout::next_block(bytes, bp)?;
        let prev_tag = layout::header(bytes, prev)?;
        let next_tag = layout::header(bytes, next)?;

        let (start, total) = match (prev_tag.allocated, next_tag.allocated) {
            (true, true) => (bp, size),
            (false, true) => {
                unlink(&mut self.free_list, prev)?;
                (prev, prev_tag.size + size)
            }
            (true, false) => {
                unlink(&mut self.free_list, next)?;
                (bp, size + next_tag.size)
            }
            (false, false) => {
                unlink(&mut self.free_list, prev)?;
                unlink(&mut self.free_list, next)?;
                (prev, prev_tag.size + size + next_tag.size)
            }
        };

        if total != size {
            layout::write_tags(self.arena.bytes_mut(), start, Tag::free(total))?;
            trace!(block = bp, merged = start, size = total, "Coalesced free blocks");
        }
        self.free_list.push(start);
        Ok(start)
    }
}

fn unlink(free_list: &mut FreeList, bp: Address) -> Result<(), ConsistencyViolation> {
    if free_list.remove(bp) {
        Ok(())
    } else {
        Err(ConsistencyViolation::FreeBlockNotListed { offset: bp })
    }
}
