/*!
 * Heap Limits and Constants
 *
 * Centralized location for the block format constants and the default
 * tunables of the allocator.
 */

// =============================================================================
// BLOCK FORMAT
// =============================================================================

/// Word size (bytes). Headers and footers are one word each.
pub const WSIZE: usize = 8;

/// Double word size (bytes). Every block size and payload offset is a
/// multiple of this.
pub const DSIZE: usize = 16;

/// Header plus footer (bytes)
pub const OVERHEAD: usize = 2 * WSIZE;

/// Size of the prologue sentinel block (header + footer, no payload)
pub const PROLOGUE_SIZE: usize = DSIZE;

/// Smallest block that can exist: header, footer and room for two free-list
/// links in the payload
pub const MIN_BLOCK_SIZE: usize = OVERHEAD + 2 * WSIZE;

/// Low bits of a packed word that never carry size information
pub const SIZE_MASK: u64 = !0xf;

/// Allocated flag inside a packed word
pub const ALLOC_BIT: u64 = 0x1;

/// Bytes requested from the arena by `init` for pad, prologue and epilogue
pub const INITIAL_FRAME: usize = 4 * WSIZE;

// =============================================================================
// DEFAULT TUNABLES
// =============================================================================

/// Default heap growth step (4KB)
/// [PERF] Aligned with common page size
pub const DEFAULT_CHUNK_SIZE: usize = 1 << 12;

/// Default minimum remainder worth splitting off a free block
pub const DEFAULT_MIN_SPLIT: usize = MIN_BLOCK_SIZE;

/// Default arena capacity (20MB)
pub const DEFAULT_ARENA_LIMIT: usize = 20 * (1 << 20);

/// Largest arena a `Vec`-backed store can address
pub const MAX_ARENA_LIMIT: usize = isize::MAX as usize;
