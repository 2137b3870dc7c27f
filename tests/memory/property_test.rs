/*!
 * Property Tests
 * Heap invariants under random allocate/free sequences
 */

use proptest::prelude::*;
use tagheap::{Arena, BlockHandle, Heap, HeapConfig};

#[derive(Debug, Clone)]
enum Op {
    Alloc(usize),
    Free(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (1usize..700).prop_map(Op::Alloc),
        2 => any::<usize>().prop_map(Op::Free),
    ]
}

fn fill(heap: &mut Heap, handle: BlockHandle, tag: u8) {
    let len = heap.usable_size(handle).unwrap();
    heap.write_bytes(handle, 0, &vec![tag; len]).unwrap();
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_heap_stays_consistent(ops in prop::collection::vec(op(), 1..120)) {
        let mut heap = Heap::new(HeapConfig::default().with_arena_limit(1 << 20)).unwrap();
        let mut live: Vec<(BlockHandle, u8)> = Vec::new();

        for (step, op) in ops.into_iter().enumerate() {
            match op {
                Op::Alloc(size) => {
                    if let Some(h) = heap.allocate(size) {
                        prop_assert!(heap.usable_size(h).unwrap() >= size);
                        prop_assert_eq!(h.offset() % 16, 0);
                        let tag = step as u8;
                        fill(&mut heap, h, tag);
                        live.push((h, tag));
                    }
                }
                Op::Free(pick) => {
                    if !live.is_empty() {
                        let (h, _) = live.swap_remove(pick % live.len());
                        heap.deallocate(h).unwrap();
                    }
                }
            }
            prop_assert_eq!(heap.check(), Ok(()));
        }

        // no live payload was clobbered by another block
        for (h, tag) in &live {
            let len = heap.usable_size(*h).unwrap();
            let data = heap.read_bytes(*h, 0, len).unwrap();
            prop_assert!(data.iter().all(|b| b == tag));
        }

        // live spans are disjoint and every block is accounted for
        let blocks = heap.blocks().unwrap();
        let allocated = blocks.iter().filter(|b| b.allocated).count();
        prop_assert_eq!(allocated, live.len());
        for pair in blocks.windows(2) {
            prop_assert_eq!(pair[0].offset + pair[0].size, pair[1].offset);
            prop_assert!(pair[0].allocated || pair[1].allocated);
        }

        for (h, _) in live.drain(..) {
            heap.deallocate(h).unwrap();
        }
        let stats = heap.stats().unwrap();
        prop_assert_eq!(stats.free_blocks, 1);
        prop_assert_eq!(stats.free_bytes, heap.arena().brk() - 32);
    }

    #[test]
    fn prop_alloc_free_restores_free_bytes(
        warmup in prop::collection::vec(1usize..400, 0..20),
        size in 1usize..6000,
    ) {
        let mut heap = Heap::new(HeapConfig::default()).unwrap();
        let kept: Vec<_> = warmup.iter().filter_map(|n| heap.allocate(*n)).collect();
        for h in kept.iter().step_by(2) {
            heap.deallocate(*h).unwrap();
        }

        let free_before = heap.free_bytes().unwrap();
        let brk_before = heap.arena().brk();

        let h = heap.allocate(size).unwrap();
        heap.deallocate(h).unwrap();

        let grown = heap.arena().brk() - brk_before;
        prop_assert_eq!(heap.free_bytes().unwrap(), free_before + grown);
        prop_assert_eq!(heap.check(), Ok(()));
    }

    #[test]
    fn prop_rejected_free_is_harmless(size in 1usize..500, delta in 1usize..64) {
        let mut heap = Heap::new(HeapConfig::default()).unwrap();
        let h = heap.allocate(size).unwrap();
        let snapshot = heap.arena().bytes().to_vec();

        let bogus = BlockHandle::from_offset(h.offset() + delta);
        prop_assert!(heap.deallocate(bogus).is_err());
        prop_assert_eq!(heap.arena().bytes(), snapshot.as_slice());
        prop_assert!(heap.poisoned().is_none());
    }
}
