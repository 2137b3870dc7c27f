/*!
 * Shared Heap
 * Externally locked handle for using one heap from several threads
 *
 * The heap itself is single-threaded; this wrapper serializes every call
 * behind one `parking_lot` mutex and adds no concurrency of its own.
 */

use super::arena::VecArena;
use super::manager::Heap;
use super::traits::Arena;
use super::types::HeapStats;
use crate::core::errors::{ConsistencyViolation, HeapResult};
use crate::core::types::{BlockHandle, Size};
use parking_lot::Mutex;
use std::sync::Arc;

/// Cloneable, mutex-guarded heap handle
#[derive(Debug)]
pub struct SharedHeap<A: Arena = VecArena> {
    inner: Arc<Mutex<Heap<A>>>,
}

impl<A: Arena> SharedHeap<A> {
    pub fn new(heap: Heap<A>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(heap)),
        }
    }

    /// Run `f` with exclusive access to the heap
    pub fn with<R>(&self, f: impl FnOnce(&mut Heap<A>) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut guard)
    }

    pub fn allocate(&self, size: Size) -> Option<BlockHandle> {
        self.with(|heap| heap.allocate(size))
    }

    pub fn deallocate(&self, handle: BlockHandle) -> HeapResult<()> {
        self.with(|heap| heap.deallocate(handle))
    }

    pub fn check(&self) -> Result<(), ConsistencyViolation> {
        self.inner.lock().check()
    }

    pub fn stats(&self) -> HeapResult<HeapStats> {
        self.inner.lock().stats()
    }

    pub fn write_bytes(&self, handle: BlockHandle, offset: Size, data: &[u8]) -> HeapResult<()> {
        self.with(|heap| heap.write_bytes(handle, offset, data))
    }

    pub fn read_bytes(&self, handle: BlockHandle, offset: Size, len: Size) -> HeapResult<Vec<u8>> {
        self.inner.lock().read_bytes(handle, offset, len)
    }
}

impl<A: Arena> Clone for SharedHeap<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: Arena> From<Heap<A>> for SharedHeap<A> {
    fn from(heap: Heap<A>) -> Self {
        Self::new(heap)
    }
}
