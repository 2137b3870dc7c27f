/*!
 * Explicit Free List
 * LIFO doubly-linked index over the heap's free blocks
 *
 * Links live in a side table keyed by block payload offset instead of inside
 * the free block's payload, so no raw bytes are ever reinterpreted as
 * pointers. Push and remove are O(1).
 */

use crate::core::types::Address;
use ahash::RandomState;
use std::collections::HashMap;

/// Back/forward links of one free block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(super) struct FreeLink {
    pub prev: Option<Address>,
    pub next: Option<Address>,
}

#[derive(Debug, Default)]
pub(super) struct FreeList {
    head: Option<Address>,
    links: HashMap<Address, FreeLink, RandomState>,
}

impl FreeList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn head(&self) -> Option<Address> {
        self.head
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn contains(&self, block: Address) -> bool {
        self.links.contains_key(&block)
    }

    /// Insert `block` at the head
    pub fn push(&mut self, block: Address) {
        debug_assert!(!self.contains(block), "block 0x{block:x} pushed twice");
        if let Some(old_head) = self.head {
            if let Some(link) = self.links.get_mut(&old_head) {
                link.prev = Some(block);
            }
        }
        self.links.insert(
            block,
            FreeLink {
                prev: None,
                next: self.head,
            },
        );
        self.head = Some(block);
    }

    /// Splice `block` out of the list
    ///
    /// Returns `false` when the block was not listed.
    pub fn remove(&mut self, block: Address) -> bool {
        let Some(FreeLink { prev, next }) = self.links.remove(&block) else {
            return false;
        };

        match prev {
            // Interior or tail: the predecessor skips over us
            Some(prev) => {
                if let Some(link) = self.links.get_mut(&prev) {
                    link.next = next;
                }
            }
            // Head: retarget the list head
            None => self.head = next,
        }

        if let Some(next) = next {
            if let Some(link) = self.links.get_mut(&next) {
                link.prev = prev;
            }
        }
        true
    }

    /// Walk the list from the head
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }

    #[cfg(test)]
    pub fn link(&self, block: Address) -> Option<FreeLink> {
        self.links.get(&block).copied()
    }
}

pub(super) struct Iter<'a> {
    list: &'a FreeList,
    cursor: Option<Address>,
}

impl Iterator for Iter<'_> {
    type Item = Address;

    fn next(&mut self) -> Option<Address> {
        let current = self.cursor?;
        self.cursor = self.list.links.get(&current).and_then(|link| link.next);
        Some(current)
    }
}
