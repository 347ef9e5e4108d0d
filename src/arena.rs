//! Bump allocation over a sequence of owned backing blocks.
//!
//! ```text
//!   Arena (current = 1)
//!
//!   blocks[0]  ┌────┬────┬──────┬────────┐
//!              │ A1 │ A2 │  A3  │ unused │   abandoned until reset
//!              └────┴────┴──────┴────────┘
//!   blocks[1]  ┌──────┬────┬──────────────────────────────────┐
//!              │  A4  │ A5 │             free space           │
//!              └──────┴────┴──────────────────────────────────┘
//!                          ▲
//!                          └── offset (next carve)
//!   blocks[2]  ┌──────────────────────┐
//!              │   A6 (dedicated)     │   exactly sized, oversized request
//!              └──────────────────────┘
//! ```
//!
//! Individual allocations are never reclaimed: `Free` is a no-op. The only
//! way to recover memory is [`Arena::reset`], which rewinds every block at
//! once, or [`Arena::release`], which also hands the blocks back upstream.

use std::{
  cell::{Cell, RefCell},
  fmt, ptr,
};

use tracing::{debug, trace, warn};

use crate::{
  align::checked_align_to,
  allocator::{AllocOp, Allocator},
  block::Block,
  config::{ArenaConfig, Growth},
  error::AllocResult,
  system::{SYSTEM, SystemAllocator},
};

/// A growable bump allocator.
///
/// Blocks are requested from the upstream allocator on demand and returned to
/// it on [`release`](Arena::release) or drop. The upstream is borrowed, not
/// owned, and may itself be an arena.
///
/// Pointers handed out stay valid until the next `reset`, `release` or until
/// the arena is dropped, whichever comes first. Keeping the arena alive for as
/// long as those pointers are used is the caller's job.
///
/// Not `Sync`: the offset bump is a plain read-modify-write. Give each thread
/// its own arena.
pub struct Arena<'a, U: Allocator + ?Sized = SystemAllocator> {
  upstream: &'a U,
  config: ArenaConfig,
  blocks: RefCell<Vec<Block>>,
  current: Cell<usize>,
  /// Block index and start offset of the most recent carve.
  last: Cell<Option<(usize, usize)>>,
}

impl Arena<'static, SystemAllocator> {
  /// Creates an arena backed by the host heap.
  pub fn system(
    config: ArenaConfig,
  ) -> AllocResult<Self> {
    Self::new(config, &SYSTEM)
  }
}

impl<'a, U: Allocator + ?Sized> Arena<'a, U> {
  pub fn new(
    config: ArenaConfig,
    upstream: &'a U,
  ) -> AllocResult<Self> {
    config.validate()?;

    Ok(Self {
      upstream,
      config,
      blocks: RefCell::new(Vec::new()),
      current: Cell::new(0),
      last: Cell::new(None),
    })
  }

  pub fn with_block_size(
    block_size: usize,
    upstream: &'a U,
  ) -> AllocResult<Self> {
    Self::new(ArenaConfig::new(block_size), upstream)
  }

  pub fn config(
    &self,
  ) -> &ArenaConfig {
    &self.config
  }

  pub fn upstream(
    &self,
  ) -> &'a U {
    self.upstream
  }

  pub fn block_count(
    &self,
  ) -> usize {
    self.blocks.borrow().len()
  }

  /// Usable bytes across backing blocks, alignment padding at the block
  /// start excluded.
  pub fn capacity(
    &self,
  ) -> usize {
    self.blocks.borrow().iter().map(|b| b.capacity).sum()
  }

  /// Bytes consumed since the last reset, alignment padding included.
  pub fn used(
    &self,
  ) -> usize {
    self.blocks.borrow().iter().map(|b| b.offset).sum()
  }

  /// Bytes left in the current block.
  pub fn remaining(
    &self,
  ) -> usize {
    self
      .blocks
      .borrow()
      .get(self.current.get())
      .map_or(0, Block::remaining)
  }

  /// Aligned start of the first block, if any block exists yet. The first
  /// allocation after a reset lands here.
  pub fn first_block_base(
    &self,
  ) -> Option<*mut u8> {
    self.blocks.borrow().first().map(|b| b.base.as_ptr())
  }

  /// Whether `ptr` lies inside one of this arena's blocks.
  pub fn owns(
    &self,
    ptr: *const u8,
  ) -> bool {
    self.blocks.borrow().iter().any(|b| b.contains(ptr))
  }

  /// Rewinds every block to empty while keeping them all.
  ///
  /// This is the only way to reclaim arena memory. Every pointer previously
  /// handed out becomes invalid; the next allocation starts again at the
  /// first block's base.
  pub fn reset(
    &mut self,
  ) {
    let blocks = self.blocks.get_mut();

    for block in blocks.iter_mut() {
      block.offset = 0;
    }

    self.current.set(0);
    self.last.set(None);

    debug!(blocks = blocks.len(), "arena reset");
  }

  /// Resets the arena and returns every block to the upstream allocator.
  ///
  /// The arena stays usable and requests fresh blocks on demand.
  pub fn release(
    &mut self,
  ) {
    let released = self.blocks.get_mut().len();
    self.return_all();
    self.current.set(0);
    self.last.set(None);

    debug!(blocks = released, "arena released");
  }

  /// Tears the arena down, returning every block upstream.
  pub fn destroy(
    self,
  ) {
    drop(self);
  }

  fn return_all(
    &mut self,
  ) {
    let blocks = std::mem::take(self.blocks.get_mut());

    for block in &blocks {
      self.return_block(block);
    }
  }

  fn return_block(
    &self,
    block: &Block,
  ) {
    unsafe {
      self.upstream.dispatch(
        AllocOp::Free,
        0,
        block.reserved,
        block.raw.as_ptr(),
        None,
      );
    }
  }

  fn request_block(
    &self,
    capacity: usize,
    dedicated: bool,
  ) -> Option<Block> {
    let raw = ptr::NonNull::new(self.upstream.alloc(capacity))?;
    Some(Block::new(raw, capacity, self.config.alignment, dedicated))
  }

  /// Adds a block able to hold `size` bytes and returns its index.
  fn grow(
    &self,
    blocks: &mut Vec<Block>,
    size: usize,
  ) -> Option<usize> {
    let align = self.config.alignment;
    let last_regular = blocks.iter().rev().find(|b| !b.dedicated).map(|b| b.capacity);
    let target = self.config.next_block_size(last_regular)?;

    let dedicated = size > target;
    if dedicated && self.config.growth == Growth::Disabled {
      return None;
    }
    let capacity = if dedicated { size } else { target };

    let mut block = self.request_block(capacity, dedicated)?;
    if block.fit(size, align).is_none() {
      // The upstream base is less aligned than we need; pay for the padding.
      self.return_block(&block);
      block = self.request_block(capacity.checked_add(align - 1)?, dedicated)?;
    }

    let capacity = block.capacity;
    let index = if dedicated && !blocks.is_empty() {
      // Keep serving small requests from the current block.
      let index = self.current.get() + 1;
      blocks.insert(index, block);
      index
    } else {
      blocks.push(block);
      let index = blocks.len() - 1;
      self.current.set(index);
      index
    };

    debug!(capacity, dedicated, blocks = blocks.len(), "arena grew");
    Some(index)
  }

  fn carve(
    &self,
    size: usize,
  ) -> *mut u8 {
    if size == 0 {
      return ptr::null_mut();
    }

    let align = self.config.alignment;
    let Some(size) = checked_align_to(size, align) else {
      warn!(size, "arena request overflows");
      return ptr::null_mut();
    };

    let mut blocks = self.blocks.borrow_mut();

    let found = (self.current.get()..blocks.len())
      .find_map(|index| blocks[index].fit(size, align).map(|start| (index, start)));

    let (index, start) = match found {
      Some(found) => {
        self.current.set(found.0);
        found
      }
      None => {
        let grown = self
          .grow(&mut blocks, size)
          .and_then(|index| blocks[index].fit(size, align).map(|start| (index, start)));

        match grown {
          Some(grown) => grown,
          None => {
            warn!(size, blocks = blocks.len(), "arena exhausted");
            return ptr::null_mut();
          }
        }
      }
    };

    let address = blocks[index].carve(start, size);
    self.last.set(Some((index, start)));

    trace!(size, block = index, ptr = ?address, "arena carve");
    address
  }

  /// Bumps the offset further when `old_ptr` is the most recent carve, in
  /// whichever block (regular or dedicated) it was made.
  fn extend_in_place(
    &self,
    old_ptr: *mut u8,
    new_size: usize,
  ) -> bool {
    let Some((index, start)) = self.last.get() else {
      return false;
    };
    let Some(new_size) = checked_align_to(new_size, self.config.alignment) else {
      return false;
    };

    let mut blocks = self.blocks.borrow_mut();
    let block = &mut blocks[index];

    if block.base.as_ptr().wrapping_add(start) != old_ptr {
      return false;
    }

    match start.checked_add(new_size) {
      Some(end) if end <= block.capacity => {
        block.offset = block.offset.max(end);
        trace!(size = new_size, block = index, ptr = ?old_ptr, "arena extend in place");
        true
      }
      _ => false,
    }
  }

  unsafe fn realloc_bytes(
    &self,
    old_ptr: *mut u8,
    old_size: usize,
    new_size: usize,
  ) -> *mut u8 {
    if old_ptr.is_null() {
      return self.carve(new_size);
    }

    if new_size <= old_size || self.extend_in_place(old_ptr, new_size) {
      return old_ptr;
    }

    let address = self.carve(new_size);

    if !address.is_null() {
      unsafe { ptr::copy_nonoverlapping(old_ptr, address, old_size) };
    }

    address
  }
}

unsafe impl<U: Allocator + ?Sized> Allocator for Arena<'_, U> {
  unsafe fn dispatch(
    &self,
    op: AllocOp,
    new_size: usize,
    old_size: usize,
    old_ptr: *mut u8,
    _user: Option<&()>,
  ) -> *mut u8 {
    match op {
      AllocOp::Alloc => self.carve(new_size),
      AllocOp::ZeroAlloc => {
        let address = self.carve(new_size);
        if !address.is_null() {
          // Zero the whole carve, padding to the alignment included.
          let carved = checked_align_to(new_size, self.config.alignment).unwrap_or(new_size);
          unsafe { ptr::write_bytes(address, 0, carved) };
        }
        address
      }
      AllocOp::Realloc => unsafe { self.realloc_bytes(old_ptr, old_size, new_size) },
      AllocOp::Free => ptr::null_mut(),
    }
  }
}

impl<U: Allocator + ?Sized> Drop for Arena<'_, U> {
  fn drop(
    &mut self,
  ) {
    self.return_all();
  }
}

impl<U: Allocator + ?Sized> fmt::Debug for Arena<'_, U> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_struct("Arena")
      .field("config", &self.config)
      .field("blocks", &self.block_count())
      .field("capacity", &self.capacity())
      .field("used", &self.used())
      .finish()
  }
}

// SAFETY: the arena exclusively owns its blocks and only touches the
// upstream through `&U`, which is `Send` when `U: Sync`.
unsafe impl<U: Allocator + Sync + ?Sized> Send for Arena<'_, U> {}

/// A stateless handle that serves whichever arena is passed as user context.
///
/// One handle can be stored once and reused against many arenas:
///
/// ```rust
/// use swapalloc::{Allocator, Arena, ArenaAllocator, ArenaConfig};
///
/// let a = Arena::system(ArenaConfig::new(256)).unwrap();
/// let b = Arena::system(ArenaConfig::new(256)).unwrap();
///
/// let p = ArenaAllocator.alloc_with(16, &a);
/// let q = ArenaAllocator.alloc_with(16, &b);
/// assert!(a.owns(p) && b.owns(q));
/// ```
///
/// Without a context there is nothing to carve from and every request is
/// exhaustion.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ArenaAllocator;

unsafe impl<'a, U: Allocator + ?Sized> Allocator<Arena<'a, U>> for ArenaAllocator {
  unsafe fn dispatch(
    &self,
    op: AllocOp,
    new_size: usize,
    old_size: usize,
    old_ptr: *mut u8,
    user: Option<&Arena<'a, U>>,
  ) -> *mut u8 {
    match user {
      Some(arena) => unsafe { arena.dispatch(op, new_size, old_size, old_ptr, None) },
      None => {
        if op != AllocOp::Free {
          warn!(op = %op, size = new_size, "arena handle called without an arena");
        }
        ptr::null_mut()
      }
    }
  }
}
