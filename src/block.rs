use std::ptr::NonNull;

use crate::align::checked_align_to;

/// A backing block owned by an arena.
///
/// `raw`/`reserved` are exactly what the upstream handed out and are only used
/// to give the block back. Carving happens over `[base, base + capacity)`,
/// where `base` is `raw` rounded up to the arena alignment.
///
/// Invariant: `offset <= capacity`. Everything in `[base, base + offset)` has
/// been handed out since the last reset.
pub struct Block {
  pub raw: NonNull<u8>,
  pub reserved: usize,
  pub base: NonNull<u8>,
  pub capacity: usize,
  pub offset: usize,
  /// Sized exactly for one oversized request; never drives growth.
  pub dedicated: bool,
}

impl Block {
  pub fn new(
    raw: NonNull<u8>,
    reserved: usize,
    align: usize,
    dedicated: bool,
  ) -> Self {
    let address = raw.as_ptr() as usize;
    let padding = checked_align_to(address, align)
      .map_or(reserved, |aligned| aligned - address)
      .min(reserved);

    Self {
      raw,
      reserved,
      base: unsafe { NonNull::new_unchecked(raw.as_ptr().add(padding)) },
      capacity: reserved - padding,
      offset: 0,
      dedicated,
    }
  }

  /// Offset at which `size` bytes aligned to `align` would start, if they fit.
  pub fn fit(
    &self,
    size: usize,
    align: usize,
  ) -> Option<usize> {
    let cursor = (self.base.as_ptr() as usize).checked_add(self.offset)?;
    let start = checked_align_to(cursor, align)? - self.base.as_ptr() as usize;
    let end = start.checked_add(size)?;

    (end <= self.capacity).then_some(start)
  }

  /// Carves `size` bytes starting at `start`, as returned by [`Block::fit`].
  pub fn carve(
    &mut self,
    start: usize,
    size: usize,
  ) -> *mut u8 {
    debug_assert!(start + size <= self.capacity);
    self.offset = start + size;
    unsafe { self.base.as_ptr().add(start) }
  }

  pub fn remaining(
    &self,
  ) -> usize {
    self.capacity - self.offset
  }

  pub fn contains(
    &self,
    ptr: *const u8,
  ) -> bool {
    let base = self.base.as_ptr() as usize;
    (base..base + self.capacity).contains(&(ptr as usize))
  }
}
