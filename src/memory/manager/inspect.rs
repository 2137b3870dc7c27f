/*!
 * Heap Inspection
 * Heap walks, printable dumps and statistics
 */

use super::layout;
use super::Heap;
use crate::core::errors::HeapResult;
use crate::core::types::{BlockHandle, Size};
use crate::memory::traits::Arena;
use crate::memory::types::{BlockInfo, HeapStats};
use std::fmt::Write;

impl<A: Arena> Heap<A> {
    /// All blocks between the prologue and the epilogue, in address order
    pub fn blocks(&self) -> HeapResult<Vec<BlockInfo>> {
        let bytes = self.arena.bytes();
        let mut blocks = Vec::new();
        let mut bp = layout::next_block(bytes, self.heap_start)?;
        loop {
            let tag = layout::header(bytes, bp)?;
            if tag.size == 0 {
                break;
            }
            blocks.push(BlockInfo {
                offset: bp,
                size: tag.size,
                allocated: tag.allocated,
            });
            bp = layout::next_block(bytes, bp)?;
        }
        Ok(blocks)
    }

    /// Render every block, sentinels included, one per line:
    ///
    /// ```text
    /// 0x10: header: [16:a] footer: [16:a]
    /// 0x20: header: [4096:f] footer: [4096:f]
    /// 0x1020: end of heap
    /// ```
    pub fn dump(&self) -> HeapResult<String> {
        let bytes = self.arena.bytes();
        let mut out = String::new();
        let mut bp = self.heap_start;
        loop {
            let hdr = layout::header(bytes, bp)?;
            if hdr.size == 0 {
                let _ = writeln!(out, "0x{bp:x}: end of heap");
                break;
            }
            let ftr = layout::footer(bytes, bp)?;
            let _ = writeln!(
                out,
                "0x{:x}: header: [{}:{}] footer: [{}:{}]",
                bp,
                hdr.size,
                if hdr.allocated { 'a' } else { 'f' },
                ftr.size,
                if ftr.allocated { 'a' } else { 'f' },
            );
            bp = layout::next_block(bytes, bp)?;
        }
        Ok(out)
    }

    /// Summarize block usage from a heap walk
    pub fn stats(&self) -> HeapResult<HeapStats> {
        let mut stats = HeapStats {
            heap_size: self.arena.brk(),
            free_list_len: self.free_list.len(),
            grow_count: self.grow_count,
            ..Default::default()
        };
        for block in self.blocks()? {
            if block.allocated {
                stats.allocated_blocks += 1;
                stats.allocated_bytes += block.size;
            } else {
                stats.free_blocks += 1;
                stats.free_bytes += block.size;
                stats.largest_free_block = stats.largest_free_block.max(block.size);
            }
        }
        Ok(stats)
    }

    /// Total bytes held by free blocks, per the free list
    pub fn free_bytes(&self) -> HeapResult<Size> {
        let bytes = self.arena.bytes();
        self.free_list
            .iter()
            .map(|bp| layout::header(bytes, bp).map(|tag| tag.size))
            .sum::<Result<Size, _>>()
            .map_err(Into::into)
    }

    /// Payload offsets of the free list, head first
    pub fn free_list_offsets(&self) -> Vec<usize> {
        self.free_list.iter().collect()
    }

    /// Whether `handle` refers to a live allocation
    pub fn is_live(&self, handle: BlockHandle) -> bool {
        self.live.contains(&handle.offset())
    }

    /// Number of live allocations
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Whole block size of a live allocation, metadata included
    pub fn block_size(&self, handle: BlockHandle) -> Option<Size> {
        if !self.is_live(handle) {
            return None;
        }
        layout::header(self.arena.bytes(), handle.offset())
            .ok()
            .map(|tag| tag.size)
    }

    /// Bytes of a live allocation the caller may use
    pub fn usable_size(&self, handle: BlockHandle) -> Option<Size> {
        self.block_size(handle).map(layout::usable_size)
    }
}
