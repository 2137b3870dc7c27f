/*!
 * Memory Types
 * Heap walk and statistics records
 */

use crate::core::types::{Address, BlockHandle, Size};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One block as seen by a heap walk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    /// Payload offset
    pub offset: Address,
    /// Whole block size including header and footer
    pub size: Size,
    pub allocated: bool,
}

impl BlockInfo {
    pub fn handle(&self) -> BlockHandle {
        BlockHandle::from_offset(self.offset)
    }

    /// Byte range covered by the block, header to footer inclusive
    pub fn span(&self) -> std::ops::Range<Address> {
        let start = self.offset.saturating_sub(crate::core::limits::WSIZE);
        start..start + self.size
    }

    pub fn is_free(&self) -> bool {
        !self.allocated
    }
}

impl fmt::Display for BlockInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}:{}]",
            self.size,
            if self.allocated { 'a' } else { 'f' }
        )
    }
}

/// Heap statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeapStats {
    /// Committed arena bytes, sentinels included
    pub heap_size: Size,
    pub allocated_bytes: Size,
    pub free_bytes: Size,
    pub allocated_blocks: usize,
    pub free_blocks: usize,
    pub largest_free_block: Size,
    pub free_list_len: usize,
    /// Successful heap growths, the initial chunk included
    pub grow_count: usize,
}

impl HeapStats {
    /// Share of free bytes outside the largest free block, in percent
    pub fn fragmentation(&self) -> f64 {
        if self.free_bytes == 0 {
            return 0.0;
        }
        (1.0 - self.largest_free_block as f64 / self.free_bytes as f64) * 100.0
    }
}
