//! Property tests for the allocator contract.

use proptest::prelude::*;
use swapalloc::{Allocator, Arena, ArenaConfig, Growth, SYSTEM, align::NATURAL_ALIGN};

fn arb_growth() -> impl Strategy<Value = Growth> {
  prop_oneof![Just(Growth::Fixed), Just(Growth::Doubling)]
}

fn arena(
  block_size: usize,
  growth: Growth,
) -> Arena<'static> {
  Arena::system(ArenaConfig::new(block_size).with_growth(growth)).unwrap()
}

/// Fills `size` bytes at `ptr` with a pattern derived from `seed`.
unsafe fn stamp(
  ptr: *mut u8,
  size: usize,
  seed: u8,
) {
  for i in 0..size {
    unsafe { *ptr.add(i) = seed.wrapping_add(i as u8) };
  }
}

unsafe fn stamped(
  ptr: *const u8,
  size: usize,
  seed: u8,
) -> bool {
  (0..size).all(|i| unsafe { *ptr.add(i) } == seed.wrapping_add(i as u8))
}

/// Grows a stamped allocation and checks the prefix survived.
fn prefix_survives<A: Allocator + ?Sized>(
  allocator: &A,
  old_size: usize,
  extra: usize,
  seed: u8,
) -> bool {
  unsafe {
    let old = allocator.alloc(old_size);
    stamp(old, old_size, seed);

    let new = allocator.realloc(old, old_size, old_size + extra);
    let ok = !new.is_null() && stamped(new, old_size, seed);

    allocator.free(if new.is_null() { old } else { new });
    ok
  }
}

proptest! {
  #[test]
  fn realloc_preserves_prefix_system(
    old_size in 1usize..512,
    extra in 0usize..4096,
    seed in any::<u8>(),
  ) {
    prop_assert!(prefix_survives(&SYSTEM, old_size, extra, seed));
  }

  #[test]
  fn realloc_preserves_prefix_arena(
    block_size in 16usize..1024,
    growth in arb_growth(),
    noise in prop::collection::vec(1usize..64, 0..8),
    old_size in 1usize..512,
    extra in 0usize..4096,
    seed in any::<u8>(),
  ) {
    let arena = arena(block_size, growth);
    for size in noise {
      arena.alloc(size);
    }
    prop_assert!(prefix_survives(&arena, old_size, extra, seed));
  }

  #[test]
  fn failed_realloc_leaves_old_intact(
    old_size in 1usize..32,
    seed in any::<u8>(),
  ) {
    let arena = arena(64, Growth::Disabled);

    unsafe {
      let old = arena.alloc(old_size);
      stamp(old, old_size, seed);
      // Pin `old` so it cannot be extended in place.
      arena.alloc(1);

      prop_assert!(arena.realloc(old, old_size, 64).is_null());
      prop_assert!(stamped(old, old_size, seed));
    }
  }

  #[test]
  fn arena_allocations_never_overlap(
    block_size in 16usize..512,
    growth in arb_growth(),
    sizes in prop::collection::vec(1usize..300, 1..64),
  ) {
    let arena = arena(block_size, growth);
    let mut ranges: Vec<(usize, usize)> = Vec::new();
    let mut used = 0;

    for size in sizes {
      let ptr = arena.alloc(size);
      prop_assert!(!ptr.is_null());
      prop_assert_eq!(ptr as usize % NATURAL_ALIGN, 0);

      let start = ptr as usize;
      for &(other, other_size) in &ranges {
        prop_assert!(start + size <= other || other + other_size <= start);
      }
      ranges.push((start, size));

      // Offsets only move forward between resets.
      prop_assert!(arena.used() >= used + size);
      used = arena.used();
    }
  }

  #[test]
  fn zero_alloc_is_zeroed_after_reuse(
    sizes in prop::collection::vec(1usize..256, 1..32),
  ) {
    let mut arena = arena(256, Growth::Doubling);

    for &size in &sizes {
      unsafe { stamp(arena.alloc(size), size, 0xA5) };
    }
    arena.reset();

    for &size in &sizes {
      let ptr = arena.zero_alloc(size);
      let bytes = unsafe { std::slice::from_raw_parts(ptr, size) };
      prop_assert!(bytes.iter().all(|&b| b == 0));
    }
  }

  #[test]
  fn reset_restarts_at_first_block(
    block_size in 16usize..512,
    growth in arb_growth(),
    sizes in prop::collection::vec(1usize..600, 1..32),
    next in 1usize..16,
  ) {
    let mut arena = arena(block_size, growth);
    for size in sizes {
      arena.alloc(size);
    }

    arena.reset();

    let ptr = arena.alloc(next);
    prop_assert_eq!(Some(ptr), arena.first_block_base());
  }

  #[test]
  fn reset_restarts_at_first_block_strictly_aligned(
    skew in 1usize..8,
    alignment in prop_oneof![Just(32usize), Just(64), Just(128)],
    growth in arb_growth(),
    sizes in prop::collection::vec(1usize..300, 1..24),
    next in 1usize..16,
  ) {
    // The upstream only guarantees natural alignment, and is knocked off any
    // stricter boundary by a few leading carves.
    let upstream = arena(1 << 20, Growth::Disabled);
    for _ in 0..skew {
      upstream.alloc(1);
    }

    let config = ArenaConfig::new(256).with_growth(growth).with_alignment(alignment);
    let mut inner = Arena::new(config, &upstream).unwrap();
    for size in sizes {
      let ptr = inner.alloc(size);
      prop_assert!(!ptr.is_null());
      prop_assert_eq!(ptr as usize % alignment, 0);
    }

    inner.reset();

    let ptr = inner.alloc(next);
    prop_assert_eq!(ptr as usize % alignment, 0);
    prop_assert_eq!(Some(ptr), inner.first_block_base());
  }
}
