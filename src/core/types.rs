/*!
 * Core Types
 * Common types used across the allocator
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Offset into the arena's committed byte range
pub type Address = usize;

/// Size type for heap operations
pub type Size = usize;

/// One packed header/footer word as stored in the heap
pub type Word = u64;

/// Handle to a live allocation: the payload offset of its block
///
/// Handles are plain offsets, so they stay valid across arena growth even when
/// the backing buffer is reallocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockHandle(Address);

impl BlockHandle {
    #[inline]
    pub const fn from_offset(offset: Address) -> Self {
        Self(offset)
    }

    #[inline]
    pub const fn offset(self) -> Address {
        self.0
    }
}

impl fmt::Display for BlockHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

impl From<BlockHandle> for Address {
    fn from(handle: BlockHandle) -> Self {
        handle.0
    }
}
