/*!
 * Heap Configuration
 * Tunables for heap growth, splitting and self-checking
 */

use super::errors::{HeapError, HeapResult};
use super::limits::{
    DEFAULT_ARENA_LIMIT, DEFAULT_CHUNK_SIZE, DEFAULT_MIN_SPLIT, DSIZE, INITIAL_FRAME,
    MAX_ARENA_LIMIT, MIN_BLOCK_SIZE,
};
use super::types::Size;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;

/// Environment variable overriding `chunk_size`
pub const ENV_CHUNK_SIZE: &str = "HEAP_CHUNK_SIZE";
/// Environment variable overriding `min_block_size`
pub const ENV_MIN_BLOCK_SIZE: &str = "HEAP_MIN_BLOCK_SIZE";
/// Environment variable overriding `arena_limit`
pub const ENV_ARENA_LIMIT: &str = "HEAP_ARENA_LIMIT";
/// Environment variable overriding `check_after_mutation`
pub const ENV_CHECK_AFTER_MUTATION: &str = "HEAP_CHECK_AFTER_MUTATION";

/// Heap configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeapConfig {
    /// Minimum number of bytes requested from the arena per growth
    pub chunk_size: Size,
    /// Smallest remainder split off a free block during placement
    pub min_block_size: Size,
    /// Capacity of the default `VecArena`
    pub arena_limit: Size,
    /// Run the consistency checker after every allocate/free
    pub check_after_mutation: bool,
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            min_block_size: DEFAULT_MIN_SPLIT,
            arena_limit: DEFAULT_ARENA_LIMIT,
            check_after_mutation: false,
        }
    }
}

impl HeapConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chunk_size(mut self, chunk_size: Size) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_min_block_size(mut self, min_block_size: Size) -> Self {
        self.min_block_size = min_block_size;
        self
    }

    pub fn with_arena_limit(mut self, arena_limit: Size) -> Self {
        self.arena_limit = arena_limit;
        self
    }

    pub fn with_check_after_mutation(mut self, enabled: bool) -> Self {
        self.check_after_mutation = enabled;
        self
    }

    /// Build a configuration from the environment
    ///
    /// Absent variables keep their defaults; unparsable ones are logged and
    /// ignored.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            chunk_size: env_or(ENV_CHUNK_SIZE, defaults.chunk_size),
            min_block_size: env_or(ENV_MIN_BLOCK_SIZE, defaults.min_block_size),
            arena_limit: env_or(ENV_ARENA_LIMIT, defaults.arena_limit),
            check_after_mutation: std::env::var(ENV_CHECK_AFTER_MUTATION)
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(defaults.check_after_mutation),
        }
    }

    /// Reject values that would break the block format
    pub fn validate(&self) -> HeapResult<()> {
        if self.chunk_size < MIN_BLOCK_SIZE || self.chunk_size % DSIZE != 0 {
            return Err(HeapError::InvalidConfig(format!(
                "chunk_size {} must be a multiple of {} and at least {}",
                self.chunk_size, DSIZE, MIN_BLOCK_SIZE
            )));
        }
        if self.min_block_size < MIN_BLOCK_SIZE || self.min_block_size % DSIZE != 0 {
            return Err(HeapError::InvalidConfig(format!(
                "min_block_size {} must be a multiple of {} and at least {}",
                self.min_block_size, DSIZE, MIN_BLOCK_SIZE
            )));
        }
        if self.arena_limit < INITIAL_FRAME + self.chunk_size {
            return Err(HeapError::InvalidConfig(format!(
                "arena_limit {} cannot hold the initial frame and one chunk ({} bytes)",
                self.arena_limit,
                INITIAL_FRAME + self.chunk_size
            )));
        }
        if self.arena_limit > MAX_ARENA_LIMIT {
            return Err(HeapError::InvalidConfig(format!(
                "arena_limit {} exceeds the largest addressable arena ({} bytes)",
                self.arena_limit, MAX_ARENA_LIMIT
            )));
        }
        Ok(())
    }
}

fn env_or<T: FromStr + Copy>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "Ignoring unparsable heap config value");
            default
        }),
        Err(_) => default,
    }
}
