/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use super::types::{Address, Size};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Heap operation result
pub type HeapResult<T> = Result<T, HeapError>;

/// Allocator errors with serialization support
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum HeapError {
    #[error("Heap initialization failed: {0}")]
    #[diagnostic(
        code(heap::init_failed),
        help("The arena could not supply the prologue/epilogue frame or the first chunk.")
    )]
    InitFailed(String),

    #[error("Invalid heap configuration: {0}")]
    #[diagnostic(code(heap::invalid_config))]
    InvalidConfig(String),

    #[error("Zero-size allocation request")]
    #[diagnostic(code(heap::zero_size))]
    ZeroSize,

    #[error("Allocation size {requested} overflows the block size computation")]
    #[diagnostic(code(heap::size_overflow))]
    SizeOverflow { requested: Size },

    #[error("Out of memory: requested {requested} bytes (block {block_size}), arena break at 0x{brk:x}")]
    #[diagnostic(
        code(heap::out_of_memory),
        help("The arena limit was reached. Free blocks or raise the arena limit.")
    )]
    OutOfMemory {
        requested: Size,
        block_size: Size,
        brk: Address,
    },

    #[error("Invalid block handle: 0x{0:x}")]
    #[diagnostic(
        code(heap::invalid_handle),
        help("Only handles returned by allocate and not yet freed may be used.")
    )]
    InvalidHandle(Address),

    #[error("Double free of block 0x{0:x}")]
    #[diagnostic(code(heap::double_free))]
    DoubleFree(Address),

    #[error("Access of {len} bytes at offset {offset} exceeds usable size {usable} of block 0x{handle:x}")]
    #[diagnostic(code(heap::payload_bounds))]
    PayloadBounds {
        handle: Address,
        offset: Size,
        len: Size,
        usable: Size,
    },

    #[error("Heap corruption: {0}")]
    #[diagnostic(
        code(heap::corruption),
        help("Heap metadata can no longer be trusted; the heap must not be used further.")
    )]
    Corruption(#[from] ConsistencyViolation),
}

/// Structural violations found by the consistency checker
#[derive(Error, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "violation", rename_all = "snake_case")]
pub enum ConsistencyViolation {
    #[error("bad prologue header at 0x{offset:x}")]
    #[diagnostic(code(heap::check::prologue))]
    BadPrologue { offset: Address },

    #[error("bad epilogue header at 0x{offset:x}")]
    #[diagnostic(code(heap::check::epilogue))]
    BadEpilogue { offset: Address },

    #[error("block 0x{offset:x} is not double-word aligned")]
    #[diagnostic(code(heap::check::alignment))]
    Misaligned { offset: Address },

    #[error("block 0x{offset:x}: header 0x{header:x} does not match footer 0x{footer:x}")]
    #[diagnostic(code(heap::check::boundary_tag))]
    HeaderFooterMismatch {
        offset: Address,
        header: u64,
        footer: u64,
    },

    #[error("block 0x{offset:x} has invalid size {size}")]
    #[diagnostic(code(heap::check::size))]
    BadBlockSize { offset: Address, size: Size },

    #[error("word access at 0x{offset:x} is outside the arena (break 0x{brk:x})")]
    #[diagnostic(code(heap::check::bounds))]
    OutOfBounds { offset: Address, brk: Address },

    #[error("free block 0x{offset:x} is followed by another free block")]
    #[diagnostic(code(heap::check::coalescing))]
    UncoalescedNeighbors { offset: Address },

    #[error("free block 0x{offset:x} is missing from the free list")]
    #[diagnostic(code(heap::check::free_list_missing))]
    FreeBlockNotListed { offset: Address },

    #[error("free list entry 0x{offset:x} is not a free block")]
    #[diagnostic(code(heap::check::free_list_stale))]
    StaleFreeListEntry { offset: Address },
}

impl ConsistencyViolation {
    /// Offset of the block or word that triggered the violation
    pub fn offset(&self) -> Address {
        match *self {
            Self::BadPrologue { offset }
            | Self::BadEpilogue { offset }
            | Self::Misaligned { offset }
            | Self::HeaderFooterMismatch { offset, .. }
            | Self::BadBlockSize { offset, .. }
            | Self::OutOfBounds { offset, .. }
            | Self::UncoalescedNeighbors { offset }
            | Self::FreeBlockNotListed { offset }
            | Self::StaleFreeListEntry { offset } => offset,
        }
    }
}
