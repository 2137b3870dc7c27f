/*!
 * Vector-Backed Arena
 * Bounded, monotonically growing byte buffer standing in for sbrk
 */

use super::traits::Arena;
use crate::core::types::{Address, Size};
use tracing::{debug, warn};

/// Arena over an owned `Vec<u8>` with a hard capacity limit
///
/// Newly committed bytes are zeroed. Reallocation of the vector is invisible to
/// the heap because every heap reference is an offset.
#[derive(Debug, Clone)]
pub struct VecArena {
    bytes: Vec<u8>,
    limit: Size,
    extensions: usize,
}

impl VecArena {
    pub fn new(limit: Size) -> Self {
        Self {
            bytes: Vec::new(),
            limit,
            extensions: 0,
        }
    }

    /// Maximum number of bytes this arena will ever commit
    pub fn limit(&self) -> Size {
        self.limit
    }

    /// Number of successful `extend` calls
    pub fn extensions(&self) -> usize {
        self.extensions
    }
}

impl Arena for VecArena {
    fn extend(&mut self, additional: Size) -> Option<Address> {
        let old_brk = self.bytes.len();
        let new_brk = match old_brk.checked_add(additional) {
            Some(end) if end <= self.limit && self.bytes.try_reserve(additional).is_ok() => end,
            _ => {
                warn!(
                    requested = additional,
                    brk = old_brk,
                    limit = self.limit,
                    "Arena exhausted"
                );
                return None;
            }
        };

        self.bytes.resize(new_brk, 0);
        self.extensions += 1;
        debug!(from = old_brk, to = new_brk, "Arena extended");
        Some(old_brk)
    }

    fn brk(&self) -> Address {
        self.bytes.len()
    }

    fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}
