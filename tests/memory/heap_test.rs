/*!
 * Heap Tests
 * Allocation, reuse, growth and usage-violation behavior
 */

use pretty_assertions::assert_eq;
use tagheap::{Arena, BlockHandle, BlockInfo, Heap, HeapConfig, HeapError, VecArena};

fn heap() -> Heap {
    Heap::new(HeapConfig::default()).expect("heap init should succeed")
}

#[test]
fn test_fresh_heap_layout() {
    let heap = heap();

    assert_eq!(heap.heap_start(), 16);
    assert_eq!(heap.arena().brk(), 32 + 4096);
    assert_eq!(
        heap.blocks().unwrap(),
        vec![BlockInfo {
            offset: 32,
            size: 4096,
            allocated: false
        }]
    );
    assert_eq!(heap.free_list_offsets(), vec![32]);
    assert_eq!(heap.check(), Ok(()));
}

#[test]
fn test_small_allocation_round_trip() {
    let mut heap = heap();

    let h1 = heap.allocate(10).expect("allocation should succeed");
    assert!(heap.usable_size(h1).unwrap() >= 10);
    assert_eq!(heap.block_size(h1), Some(32));
    assert_eq!(h1.offset() % 16, 0, "payload must be double-word aligned");
    assert_eq!(heap.check(), Ok(()));

    heap.deallocate(h1).expect("free should succeed");
    assert_eq!(heap.check(), Ok(()));
    assert_eq!(heap.free_list_offsets(), vec![32]);
    assert_eq!(heap.free_bytes().unwrap(), 4096);
    assert!(!heap.is_live(h1));
}

#[test]
fn test_first_fit_reuses_freed_block() {
    let mut heap = heap();

    let h1 = heap.allocate(100).unwrap();
    let h2 = heap.allocate(50).unwrap();
    assert_eq!(heap.block_size(h1), Some(128));
    assert_eq!(heap.block_size(h2), Some(80));
    let brk = heap.arena().brk();

    heap.deallocate(h1).unwrap();
    let h3 = heap.allocate(40).unwrap();

    assert_eq!(h3, h1, "first fit should find the freed block at the list head");
    assert_eq!(heap.block_size(h3), Some(64));
    assert_eq!(heap.arena().brk(), brk, "reuse must not grow the heap");
    assert_eq!(heap.stats().unwrap().grow_count, 1);
    assert_eq!(heap.check(), Ok(()));
}

#[test]
fn test_growth_coalesces_with_trailing_free_block() {
    let mut heap = heap();

    // 31 blocks of 128 bytes leave a 128-byte free tail in the first chunk
    let blocks: Vec<_> = (0..31).map(|_| heap.allocate(100).unwrap()).collect();
    assert_eq!(
        heap.blocks().unwrap().last(),
        Some(&BlockInfo {
            offset: 4000,
            size: 128,
            allocated: false
        })
    );
    let extensions = heap.arena().extensions();
    let brk = heap.arena().brk();

    let big = heap.allocate(200).unwrap();

    assert_eq!(heap.arena().extensions(), extensions + 1, "exactly one growth");
    assert_eq!(heap.arena().brk(), brk + 4096);
    assert_eq!(big.offset(), 4000, "new chunk merges with the free tail");
    assert_eq!(heap.block_size(big), Some(224));
    assert_eq!(
        heap.blocks().unwrap().last(),
        Some(&BlockInfo {
            offset: 4224,
            size: 4000,
            allocated: false
        })
    );
    assert_eq!(heap.check(), Ok(()));

    for h in blocks {
        heap.deallocate(h).unwrap();
    }
    heap.deallocate(big).unwrap();
    assert_eq!(heap.blocks().unwrap().len(), 1);
    assert_eq!(heap.free_bytes().unwrap(), 4096 * 2);
}

#[test]
fn test_large_request_grows_by_request_size() {
    let mut heap = heap();

    let h = heap.allocate(10_000).unwrap();
    assert_eq!(heap.block_size(h), Some(10_016));
    assert!(heap.arena().brk() >= 32 + 4096 + 10_016);
    assert_eq!(heap.check(), Ok(()));
}

#[test]
fn test_zero_size_leaves_heap_untouched() {
    let mut heap = heap();
    let _live = heap.allocate(48).unwrap();
    let before = heap.arena().bytes().to_vec();
    let free_before = heap.free_list_offsets();

    assert_eq!(heap.allocate(0), None);
    assert_eq!(heap.try_allocate(0), Err(HeapError::ZeroSize));

    assert_eq!(heap.arena().bytes(), before.as_slice());
    assert_eq!(heap.free_list_offsets(), free_before);
}

#[test]
fn test_absurd_size_is_rejected() {
    let mut heap = heap();
    assert_eq!(heap.allocate(usize::MAX), None);
    assert_eq!(
        heap.try_allocate(usize::MAX),
        Err(HeapError::SizeOverflow {
            requested: usize::MAX
        })
    );
    assert_eq!(heap.check(), Ok(()));
}

#[test]
fn test_double_free_is_rejected() {
    let mut heap = heap();
    let h = heap.allocate(64).unwrap();
    let _keep = heap.allocate(64).unwrap();
    heap.deallocate(h).unwrap();
    let before = heap.arena().bytes().to_vec();

    assert_eq!(heap.deallocate(h), Err(HeapError::DoubleFree(h.offset())));
    assert_eq!(heap.arena().bytes(), before.as_slice(), "rejected free must not touch the heap");
    assert_eq!(heap.check(), Ok(()));
    assert_eq!(heap.poisoned(), None);
}

#[test]
fn test_split_tail_is_not_a_double_free() {
    let mut heap = heap();
    let a = heap.allocate(10).unwrap();

    // start of the free remainder, never handed out
    let tail = BlockHandle::from_offset(a.offset() + 32);
    assert_eq!(heap.deallocate(tail), Err(HeapError::InvalidHandle(tail.offset())));
    assert_eq!(heap.check(), Ok(()));
}

#[test]
fn test_reissued_offset_can_be_freed_again() {
    let mut heap = heap();
    let a = heap.allocate(64).unwrap();
    heap.deallocate(a).unwrap();

    let b = heap.allocate(64).unwrap();
    assert_eq!(b, a);
    heap.deallocate(b).unwrap();
    assert_eq!(heap.deallocate(b), Err(HeapError::DoubleFree(b.offset())));
}

#[test]
fn test_foreign_handle_is_rejected() {
    let mut heap = heap();
    let h = heap.allocate(64).unwrap();

    let interior = BlockHandle::from_offset(h.offset() + 16);
    assert_eq!(
        heap.deallocate(interior),
        Err(HeapError::InvalidHandle(interior.offset()))
    );
    let outside = BlockHandle::from_offset(1 << 30);
    assert_eq!(
        heap.deallocate(outside),
        Err(HeapError::InvalidHandle(1 << 30))
    );
    assert!(heap.is_live(h));
    heap.deallocate(h).unwrap();
    assert_eq!(heap.check(), Ok(()));
}

#[test]
fn test_exhaustion_is_recoverable() {
    let config = HeapConfig::default().with_arena_limit(32 + 4096);
    let mut heap = Heap::new(config).unwrap();

    assert_eq!(heap.allocate(5000), None);
    assert!(matches!(
        heap.try_allocate(5000),
        Err(HeapError::OutOfMemory {
            requested: 5000,
            block_size: 5024,
            ..
        })
    ));
    assert_eq!(heap.poisoned(), None);

    let h = heap.allocate(10).expect("heap stays usable after exhaustion");
    heap.deallocate(h).unwrap();
    assert_eq!(heap.check(), Ok(()));
}

#[test]
fn test_unbounded_arena_reports_exhaustion() {
    let arena = VecArena::new(usize::MAX);
    let mut heap = Heap::init(arena, HeapConfig::default()).unwrap();

    assert_eq!(heap.allocate(usize::MAX / 2), None);
    assert!(matches!(
        heap.try_allocate(usize::MAX / 2),
        Err(HeapError::OutOfMemory { .. })
    ));
    assert_eq!(heap.poisoned(), None);
    assert_eq!(heap.arena().brk(), 32 + 4096);

    let h = heap.allocate(10).expect("heap stays usable after exhaustion");
    heap.deallocate(h).unwrap();
    assert_eq!(heap.check(), Ok(()));
}

#[test]
fn test_arena_limit_beyond_addressable_is_rejected() {
    let config = HeapConfig::default().with_arena_limit(usize::MAX);
    assert!(matches!(Heap::new(config), Err(HeapError::InvalidConfig(_))));
}

#[test]
fn test_fill_until_exhausted() {
    let config = HeapConfig::default().with_arena_limit(64 * 1024);
    let mut heap = Heap::new(config).unwrap();

    let mut live = Vec::new();
    while let Some(h) = heap.allocate(500) {
        live.push(h);
    }
    assert!(!live.is_empty());
    assert!(heap.arena().brk() <= 64 * 1024);
    assert_eq!(heap.check(), Ok(()));

    for h in live {
        heap.deallocate(h).unwrap();
    }
    let stats = heap.stats().unwrap();
    assert_eq!(stats.allocated_blocks, 0);
    assert_eq!(stats.free_blocks, 1);
}

#[test]
fn test_live_payloads_do_not_overlap() {
    let mut heap = heap();
    let handles: Vec<_> = (1..=40).map(|i| heap.allocate(i * 7).unwrap()).collect();

    for (i, h) in handles.iter().enumerate() {
        let len = heap.usable_size(*h).unwrap();
        heap.write_bytes(*h, 0, &vec![i as u8; len]).unwrap();
    }
    for (i, h) in handles.iter().enumerate() {
        let len = heap.usable_size(*h).unwrap();
        assert_eq!(heap.read_bytes(*h, 0, len).unwrap(), vec![i as u8; len]);
    }
    assert_eq!(heap.check(), Ok(()));
}

#[test]
fn test_split_threshold_is_configurable() {
    let config = HeapConfig::default().with_min_block_size(64);
    let mut heap = Heap::new(config).unwrap();

    let a = heap.allocate(100).unwrap();
    let _b = heap.allocate(100).unwrap();
    heap.deallocate(a).unwrap();

    // 128-byte hole, 80-byte request: a 48-byte tail is below the threshold
    let c = heap.allocate(50).unwrap();
    assert_eq!(c, a);
    assert_eq!(heap.block_size(c), Some(128));
    assert_eq!(heap.check(), Ok(()));
}

#[test]
fn test_check_after_mutation() {
    let config = HeapConfig::default().with_check_after_mutation(true);
    let mut heap = Heap::new(config).unwrap();
    let handles: Vec<_> = (0..20).map(|i| heap.allocate(16 * i + 1).unwrap()).collect();
    for h in handles.into_iter().rev() {
        heap.deallocate(h).unwrap();
    }
    assert_eq!(heap.free_bytes().unwrap(), 4096);
}

#[test]
fn test_dump_format() {
    let mut heap = heap();
    let expected = "0x10: header: [16:a] footer: [16:a]\n\
                    0x20: header: [4096:f] footer: [4096:f]\n\
                    0x1020: end of heap\n";
    assert_eq!(heap.dump().unwrap(), expected);

    heap.allocate(10).unwrap();
    let dump = heap.dump().unwrap();
    assert!(dump.contains("0x20: header: [32:a] footer: [32:a]"));
    assert!(dump.contains("0x40: header: [4064:f] footer: [4064:f]"));
}

#[test]
fn test_stats_serialize() {
    let mut heap = heap();
    heap.allocate(100).unwrap();
    let stats = heap.stats().unwrap();
    assert_eq!(stats.allocated_bytes, 128);
    assert_eq!(stats.free_bytes, 4096 - 128);
    assert_eq!(stats.largest_free_block, 4096 - 128);

    let json = serde_json::to_value(&stats).unwrap();
    assert_eq!(json["allocated_blocks"], 1);
    assert_eq!(json["heap_size"], 32 + 4096);
}
