/*!
 * Block Layout
 * Boundary-tag encoding and bounds-checked word access
 *
 * Every block looks like this, with `bp` the payload offset handed out to
 * callers:
 *
 * ```text
 *   bp - 8        bp                          bp + size - 16
 *   | hdr(size:a) | payload ...               | ftr(size:a) |
 * ```
 *
 * A header/footer word is the whole block size (a multiple of 16) OR'd with
 * the allocated bit. Free blocks carry no links in their payload; the free list
 * keeps them on the side.
 */

use crate::core::errors::ConsistencyViolation;
use crate::core::limits::{ALLOC_BIT, DSIZE, MIN_BLOCK_SIZE, OVERHEAD, SIZE_MASK, WSIZE};
use crate::core::types::{Address, Size, Word};

type LayoutResult<T> = Result<T, ConsistencyViolation>;

/// Decoded header/footer word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag {
    pub size: Size,
    pub allocated: bool,
}

impl Tag {
    pub const EPILOGUE: Tag = Tag {
        size: 0,
        allocated: true,
    };

    #[inline]
    pub const fn new(size: Size, allocated: bool) -> Self {
        Self { size, allocated }
    }

    #[inline]
    pub const fn free(size: Size) -> Self {
        Self::new(size, false)
    }

    #[inline]
    pub const fn used(size: Size) -> Self {
        Self::new(size, true)
    }

    /// Pack into the on-heap representation
    #[inline]
    pub fn pack(self) -> Word {
        (self.size as Word & SIZE_MASK) | if self.allocated { ALLOC_BIT } else { 0 }
    }

    #[inline]
    pub fn unpack(word: Word) -> Self {
        Self {
            size: (word & SIZE_MASK) as Size,
            allocated: word & ALLOC_BIT != 0,
        }
    }
}

/// Block size needed to serve a request of `requested` payload bytes
///
/// Includes header/footer overhead and rounds up to the double-word
/// alignment. Returns `None` for zero or overflowing requests.
pub fn adjusted_size(requested: Size) -> Option<Size> {
    if requested == 0 {
        return None;
    }
    if requested <= DSIZE {
        return Some(MIN_BLOCK_SIZE);
    }
    requested
        .checked_add(OVERHEAD + DSIZE - 1)
        .map(|v| v / DSIZE * DSIZE)
}

/// Round `value` up to the double-word boundary
#[inline]
pub fn align_up(value: Size) -> Option<Size> {
    value.checked_add(DSIZE - 1).map(|v| v & !(DSIZE - 1))
}

/// Usable payload bytes of a block of `block_size` bytes
#[inline]
pub fn usable_size(block_size: Size) -> Size {
    block_size.saturating_sub(OVERHEAD)
}

#[inline]
fn out_of_bounds(bytes: &[u8], offset: Address) -> ConsistencyViolation {
    ConsistencyViolation::OutOfBounds {
        offset,
        brk: bytes.len(),
    }
}

/// Read one little-endian word at `offset`
pub fn read_word(bytes: &[u8], offset: Address) -> LayoutResult<Word> {
    let end = offset
        .checked_add(WSIZE)
        .ok_or_else(|| out_of_bounds(bytes, offset))?;
    let raw = bytes
        .get(offset..end)
        .ok_or_else(|| out_of_bounds(bytes, offset))?;
    let mut buf = [0u8; WSIZE];
    buf.copy_from_slice(raw);
    Ok(Word::from_le_bytes(buf))
}

/// Write one little-endian word at `offset`
pub fn write_word(bytes: &mut [u8], offset: Address, word: Word) -> LayoutResult<()> {
    let brk = bytes.len();
    let end = offset
        .checked_add(WSIZE)
        .ok_or(ConsistencyViolation::OutOfBounds { offset, brk })?;
    let raw = bytes
        .get_mut(offset..end)
        .ok_or(ConsistencyViolation::OutOfBounds { offset, brk })?;
    raw.copy_from_slice(&word.to_le_bytes());
    Ok(())
}

/// Header offset of the block whose payload starts at `bp`
#[inline]
pub fn header_addr(bytes: &[u8], bp: Address) -> LayoutResult<Address> {
    bp.checked_sub(WSIZE).ok_or_else(|| out_of_bounds(bytes, bp))
}

/// Footer offset of a block of `size` bytes whose payload starts at `bp`
#[inline]
pub fn footer_addr(bytes: &[u8], bp: Address, size: Size) -> LayoutResult<Address> {
    bp.checked_add(size)
        .and_then(|end| end.checked_sub(DSIZE))
        .ok_or_else(|| out_of_bounds(bytes, bp))
}

pub fn header(bytes: &[u8], bp: Address) -> LayoutResult<Tag> {
    read_word(bytes, header_addr(bytes, bp)?).map(Tag::unpack)
}

/// Footer as located by the size stored in the header
pub fn footer(bytes: &[u8], bp: Address) -> LayoutResult<Tag> {
    let size = header(bytes, bp)?.size;
    read_word(bytes, footer_addr(bytes, bp, size)?).map(Tag::unpack)
}

pub fn set_header(bytes: &mut [u8], bp: Address, tag: Tag) -> LayoutResult<()> {
    let addr = header_addr(bytes, bp)?;
    write_word(bytes, addr, tag.pack())
}

/// Write matching header and footer for a block of `tag.size` bytes at `bp`
///
/// The footer position comes from `tag.size`, not from the current header, so
/// this can grow or shrink a block in one step.
pub fn write_tags(bytes: &mut [u8], bp: Address, tag: Tag) -> LayoutResult<()> {
    let word = tag.pack();
    let hdr = header_addr(bytes, bp)?;
    let ftr = footer_addr(bytes, bp, tag.size)?;
    write_word(bytes, hdr, word)?;
    write_word(bytes, ftr, word)
}

/// Payload offset of the block following `bp`
pub fn next_block(bytes: &[u8], bp: Address) -> LayoutResult<Address> {
    let size = header(bytes, bp)?.size;
    bp.checked_add(size).ok_or_else(|| out_of_bounds(bytes, bp))
}

/// Payload offset of the block preceding `bp`, found through its footer
pub fn prev_block(bytes: &[u8], bp: Address) -> LayoutResult<Address> {
    let prev_footer = bp
        .checked_sub(DSIZE)
        .ok_or_else(|| out_of_bounds(bytes, bp))?;
    let size = Tag::unpack(read_word(bytes, prev_footer)?).size;
    bp.checked_sub(size).ok_or_else(|| out_of_bounds(bytes, bp))
}
