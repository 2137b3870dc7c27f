/*!
 * Heap Consistency Checker
 * Walks the block chain and the free list validating structural invariants
 */

use super::layout::{self, Tag};
use super::Heap;
use crate::core::errors::ConsistencyViolation;
use crate::core::limits::{DSIZE, MIN_BLOCK_SIZE, PROLOGUE_SIZE};
use crate::memory::traits::Arena;
use ahash::RandomState;
use std::collections::HashSet;

impl<A: Arena> Heap<A> {
    /// Validate the heap from the prologue to the epilogue
    ///
    /// Checks, in walk order:
    /// - the prologue is a 16-byte allocated block with matching tags
    /// - every block is double-word aligned with a valid size
    /// - every block's header matches its footer
    /// - no free block is directly followed by another free block
    /// - the epilogue is a zero-size allocated header ending the arena
    /// - the free list holds exactly the free blocks of the walk
    ///
    /// Returns the first violation found. Never mutates the heap.
    pub fn check(&self) -> Result<(), ConsistencyViolation> {
        let bytes = self.arena.bytes();
        let start = self.heap_start;

        let prologue = layout::header(bytes, start)?;
        if prologue != Tag::used(PROLOGUE_SIZE) || layout::footer(bytes, start)? != prologue {
            return Err(ConsistencyViolation::BadPrologue { offset: start });
        }

        let mut free_blocks: HashSet<_, RandomState> = HashSet::default();
        let mut prev_free: Option<usize> = None;
        let mut bp = start;

        loop {
            let tag = layout::header(bytes, bp)?;
            if tag.size == 0 {
                break;
            }

            if bp % DSIZE != 0 {
                return Err(ConsistencyViolation::Misaligned { offset: bp });
            }
            if tag.size % DSIZE != 0 || (bp != start && tag.size < MIN_BLOCK_SIZE) {
                return Err(ConsistencyViolation::BadBlockSize {
                    offset: bp,
                    size: tag.size,
                });
            }

            let footer_word = layout::read_word(bytes, layout::footer_addr(bytes, bp, tag.size)?)?;
            if footer_word != tag.pack() {
                return Err(ConsistencyViolation::HeaderFooterMismatch {
                    offset: bp,
                    header: tag.pack(),
                    footer: footer_word,
                });
            }

            if tag.allocated {
                prev_free = None;
            } else {
                if let Some(prev) = prev_free {
                    return Err(ConsistencyViolation::UncoalescedNeighbors { offset: prev });
                }
                if !self.free_list.contains(bp) {
                    return Err(ConsistencyViolation::FreeBlockNotListed { offset: bp });
                }
                free_blocks.insert(bp);
                prev_free = Some(bp);
            }

            bp = layout::next_block(bytes, bp)?;
        }

        let epilogue = layout::header(bytes, bp)?;
        if epilogue != Tag::EPILOGUE || bp != bytes.len() {
            return Err(ConsistencyViolation::BadEpilogue { offset: bp });
        }

        if let Some(stale) = self.free_list.iter().find(|b| !free_blocks.contains(b)) {
            return Err(ConsistencyViolation::StaleFreeListEntry { offset: stale });
        }

        Ok(())
    }
}
