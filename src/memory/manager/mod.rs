/*!
 * Heap Manager
 *
 * Boundary-tag allocator over a single growable arena.
 *
 * ## Heap layout
 *
 * ```text
 *  | pad | hdr(16:a) | ftr(16:a) | zero or more blocks ... | hdr(0:a) |
 *        |       prologue        |                         | epilogue |
 * ```
 *
 * The always-allocated prologue and epilogue remove the edge cases from
 * neighbour lookups during coalescing.
 *
 * ## Allocation
 *
 * - **First fit** over an explicit LIFO free list
 * - **Splitting** when the remainder is at least `min_block_size`
 * - **Immediate coalescing** with both neighbours on every free and growth
 * - **Growth** by `max(request, chunk_size)` when nothing fits
 *
 * Any metadata inconsistency found while operating poisons the heap: the
 * violation is logged and every later mutating call fails with it.
 */

mod allocator;
mod checker;
mod free_list;
mod inspect;
pub(crate) mod layout;
mod storage;

use super::arena::VecArena;
use super::traits::{Allocator, Arena};
use crate::core::config::HeapConfig;
use crate::core::errors::{ConsistencyViolation, HeapError, HeapResult};
use crate::core::limits::{DSIZE, INITIAL_FRAME, PROLOGUE_SIZE};
use crate::core::types::{Address, BlockHandle, Size};
use ahash::RandomState;
use free_list::FreeList;
use layout::Tag;
use std::collections::HashSet;
use tracing::{debug, info};

/// Heap instance owning its arena and all allocator state
#[derive(Debug)]
pub struct Heap<A: Arena = VecArena> {
    arena: A,
    /// Payload offset of the prologue block
    heap_start: Address,
    free_list: FreeList,
    /// Payload offsets of blocks handed out and not yet freed
    live: HashSet<Address, RandomState>,
    /// Handles freed and not handed out again since
    freed: HashSet<Address, RandomState>,
    config: HeapConfig,
    grow_count: usize,
    poisoned: Option<ConsistencyViolation>,
}

impl Heap<VecArena> {
    /// Initialize a heap over a fresh `VecArena` sized by `config.arena_limit`
    pub fn new(config: HeapConfig) -> HeapResult<Self> {
        Self::init(VecArena::new(config.arena_limit), config)
    }
}

impl<A: Arena> Heap<A> {
    /// Lay out the prologue/epilogue frame and seed the first free chunk
    pub fn init(mut arena: A, config: HeapConfig) -> HeapResult<Self> {
        config.validate()?;

        let base = arena.extend(INITIAL_FRAME).ok_or_else(|| {
            HeapError::InitFailed(format!(
                "arena could not supply the {INITIAL_FRAME}-byte initial frame"
            ))
        })?;
        if base % DSIZE != 0 {
            return Err(HeapError::InitFailed(format!(
                "arena start 0x{base:x} is not {DSIZE}-byte aligned"
            )));
        }

        let heap_start = base + DSIZE;
        {
            let bytes = arena.bytes_mut();
            layout::write_word(bytes, base, 0)?;
            layout::write_tags(bytes, heap_start, Tag::used(PROLOGUE_SIZE))?;
            layout::set_header(bytes, base + INITIAL_FRAME, Tag::EPILOGUE)?;
        }

        let mut heap = Self {
            arena,
            heap_start,
            free_list: FreeList::new(),
            live: HashSet::default(),
            freed: HashSet::default(),
            config,
            grow_count: 0,
            poisoned: None,
        };

        if heap.grow(config.chunk_size)?.is_none() {
            return Err(HeapError::InitFailed(format!(
                "arena could not supply the initial {}-byte chunk",
                config.chunk_size
            )));
        }

        info!(
            heap_start,
            chunk_size = config.chunk_size,
            min_block_size = config.min_block_size,
            arena_limit = config.arena_limit,
            "Heap initialized with first-fit explicit free list"
        );
        Ok(heap)
    }

    pub fn config(&self) -> &HeapConfig {
        &self.config
    }

    pub fn arena(&self) -> &A {
        &self.arena
    }

    /// Payload offset of the prologue block
    pub fn heap_start(&self) -> Address {
        self.heap_start
    }

    /// Violation that poisoned this heap, if any
    pub fn poisoned(&self) -> Option<ConsistencyViolation> {
        self.poisoned
    }

    /// Extend the arena by `size` bytes (rounded to the double word) and turn
    /// the new region into one free block, coalesced with a free predecessor
    ///
    /// Returns the payload offset of the resulting free block, or `None` when
    /// the arena is exhausted.
    fn grow(&mut self, size: Size) -> HeapResult<Option<Address>> {
        let Some(size) = layout::align_up(size) else {
            return Ok(None);
        };
        let Some(bp) = self.arena.extend(size) else {
            return Ok(None);
        };

        // The old epilogue header becomes the new block's header
        let bytes = self.arena.bytes_mut();
        layout::write_tags(bytes, bp, Tag::free(size))?;
        layout::set_header(bytes, bp + size, Tag::EPILOGUE)?;
        self.grow_count += 1;

        let merged = self.coalesce(bp)?;
        debug!(
            grown = size,
            block = merged,
            brk = self.arena.brk(),
            "Heap grown"
        );
        Ok(Some(merged))
    }

    fn ensure_healthy(&self) -> HeapResult<()> {
        match self.poisoned {
            Some(violation) => Err(HeapError::Corruption(violation)),
            None => Ok(()),
        }
    }

    /// Record corruption surfaced by an operation
    fn track<T>(&mut self, result: HeapResult<T>) -> HeapResult<T> {
        if let Err(HeapError::Corruption(violation)) = &result {
            tracing::error!(
                offset = violation.offset(),
                violation = %violation,
                "Heap corruption detected, heap poisoned"
            );
            self.poisoned.get_or_insert(*violation);
        }
        result
    }

    fn verify_if_enabled(&self) -> HeapResult<()> {
        if self.config.check_after_mutation {
            self.check()?;
        }
        Ok(())
    }
}

impl<A: Arena> Allocator for Heap<A> {
    fn allocate(&mut self, size: Size) -> Option<BlockHandle> {
        Heap::allocate(self, size)
    }

    fn deallocate(&mut self, handle: BlockHandle) -> HeapResult<()> {
        Heap::deallocate(self, handle)
    }

    fn check(&self) -> Result<(), ConsistencyViolation> {
        Heap::check(self)
    }

    fn usable_size(&self, handle: BlockHandle) -> Option<Size> {
        Heap::usable_size(self, handle)
    }
}
