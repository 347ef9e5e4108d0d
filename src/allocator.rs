//! The allocator interface.
//!
//! Every memory request goes through one call shape:
//!
//! ```text
//!   dispatch(op, new_size, old_size, old_ptr, user) -> ptr | null
//!
//!   ┌────────────┬──────────────────────────────┬──────────────────────────────┐
//!   │ op         │ inputs                       │ result                       │
//!   ├────────────┼──────────────────────────────┼──────────────────────────────┤
//!   │ Alloc      │ new_size                     │ >= new_size bytes, uninit    │
//!   │ ZeroAlloc  │ new_size                     │ >= new_size bytes, zeroed    │
//!   │ Realloc    │ new_size, old_size, old_ptr  │ prefix preserved             │
//!   │ Free       │ old_ptr (may be null)        │ always null                  │
//!   └────────────┴──────────────────────────────┴──────────────────────────────┘
//! ```
//!
//! A null result from `Alloc`, `ZeroAlloc` or `Realloc` means exhaustion and is
//! the only failure this layer knows about. When `Realloc` fails the old block
//! is left untouched and stays valid.
//!
//! Zero sized `Alloc`/`ZeroAlloc` requests return null from every allocator in
//! this crate. `Realloc` with a null `old_ptr` behaves like `Alloc`.

use std::{
  fmt,
  ptr::{self, NonNull},
};

use crate::error::{AllocError, AllocResult};

/// The four operation kinds an allocator handle serves.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AllocOp {
  Alloc = 0,
  Free = 1,
  Realloc = 2,
  ZeroAlloc = 3,
}

impl AllocOp {
  pub const ALL: [AllocOp; 4] = [
    AllocOp::Alloc,
    AllocOp::Free,
    AllocOp::Realloc,
    AllocOp::ZeroAlloc,
  ];

  pub fn name(
    self,
  ) -> &'static str {
    match self {
      AllocOp::Alloc => "alloc",
      AllocOp::Free => "free",
      AllocOp::Realloc => "realloc",
      AllocOp::ZeroAlloc => "zero_alloc",
    }
  }
}

impl fmt::Display for AllocOp {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// A swappable allocation strategy.
///
/// `C` is the type of the user context forwarded verbatim to
/// [`dispatch`](Allocator::dispatch). Allocators that keep their state in
/// `self` use the default `()` and ignore it; a context-driven handle such as
/// [`ArenaAllocator`](crate::ArenaAllocator) reads its backing store from it,
/// so one handle can serve many contexts.
///
/// Call sites should only ever see `&A` or `&dyn Allocator` and never assume
/// which strategy backs it.
///
/// # Safety
///
/// Implementors must honour the contract in the module docs. In particular
/// `Alloc` and `ZeroAlloc` with a null `old_ptr` must be sound to call with any
/// size, and `Free` of a null pointer must be a no-op, because the provided
/// methods expose those as safe calls.
pub unsafe trait Allocator<C: ?Sized = ()> {
  /// The single entry point.
  ///
  /// # Safety
  ///
  /// For `Realloc` and `Free`, a non-null `old_ptr` must have been returned by
  /// this allocator (against the same context) and not yet invalidated, and
  /// `old_size` must not exceed the size it was requested with.
  unsafe fn dispatch(
    &self,
    op: AllocOp,
    new_size: usize,
    old_size: usize,
    old_ptr: *mut u8,
    user: Option<&C>,
  ) -> *mut u8;

  /// Returns at least `size` uninitialized bytes, or null.
  #[inline]
  fn alloc(
    &self,
    size: usize,
  ) -> *mut u8 {
    unsafe { self.dispatch(AllocOp::Alloc, size, 0, ptr::null_mut(), None) }
  }

  /// Returns at least `size` zeroed bytes, or null.
  #[inline]
  fn zero_alloc(
    &self,
    size: usize,
  ) -> *mut u8 {
    unsafe { self.dispatch(AllocOp::ZeroAlloc, size, 0, ptr::null_mut(), None) }
  }

  /// Resizes `old_ptr`, preserving its first `min(old_size, new_size)` bytes.
  ///
  /// # Safety
  ///
  /// See [`dispatch`](Allocator::dispatch).
  #[inline]
  unsafe fn realloc(
    &self,
    old_ptr: *mut u8,
    old_size: usize,
    new_size: usize,
  ) -> *mut u8 {
    unsafe { self.dispatch(AllocOp::Realloc, new_size, old_size, old_ptr, None) }
  }

  /// Releases `old_ptr`. Always returns null.
  ///
  /// # Safety
  ///
  /// See [`dispatch`](Allocator::dispatch).
  #[inline]
  unsafe fn free(
    &self,
    old_ptr: *mut u8,
  ) -> *mut u8 {
    unsafe { self.dispatch(AllocOp::Free, 0, 0, old_ptr, None) }
  }

  #[inline]
  fn alloc_with(
    &self,
    size: usize,
    user: &C,
  ) -> *mut u8 {
    unsafe { self.dispatch(AllocOp::Alloc, size, 0, ptr::null_mut(), Some(user)) }
  }

  #[inline]
  fn zero_alloc_with(
    &self,
    size: usize,
    user: &C,
  ) -> *mut u8 {
    unsafe { self.dispatch(AllocOp::ZeroAlloc, size, 0, ptr::null_mut(), Some(user)) }
  }

  /// # Safety
  ///
  /// See [`dispatch`](Allocator::dispatch).
  #[inline]
  unsafe fn realloc_with(
    &self,
    old_ptr: *mut u8,
    old_size: usize,
    new_size: usize,
    user: &C,
  ) -> *mut u8 {
    unsafe { self.dispatch(AllocOp::Realloc, new_size, old_size, old_ptr, Some(user)) }
  }

  /// # Safety
  ///
  /// See [`dispatch`](Allocator::dispatch).
  #[inline]
  unsafe fn free_with(
    &self,
    old_ptr: *mut u8,
    user: &C,
  ) -> *mut u8 {
    unsafe { self.dispatch(AllocOp::Free, 0, 0, old_ptr, Some(user)) }
  }

  /// [`alloc`](Allocator::alloc), with exhaustion as an error.
  fn try_alloc(
    &self,
    size: usize,
  ) -> AllocResult<NonNull<u8>> {
    NonNull::new(self.alloc(size)).ok_or(AllocError::exhausted(size))
  }

  /// [`zero_alloc`](Allocator::zero_alloc), with exhaustion as an error.
  fn try_zero_alloc(
    &self,
    size: usize,
  ) -> AllocResult<NonNull<u8>> {
    NonNull::new(self.zero_alloc(size)).ok_or(AllocError::exhausted(size))
  }

  /// [`realloc`](Allocator::realloc), with exhaustion as an error.
  ///
  /// On error `old_ptr` is still valid and owned by the caller.
  ///
  /// # Safety
  ///
  /// See [`dispatch`](Allocator::dispatch).
  unsafe fn try_realloc(
    &self,
    old_ptr: *mut u8,
    old_size: usize,
    new_size: usize,
  ) -> AllocResult<NonNull<u8>> {
    let ptr = unsafe { self.realloc(old_ptr, old_size, new_size) };
    NonNull::new(ptr).ok_or(AllocError::exhausted(new_size))
  }
}

unsafe impl<C: ?Sized, A: Allocator<C> + ?Sized> Allocator<C> for &A {
  #[inline]
  unsafe fn dispatch(
    &self,
    op: AllocOp,
    new_size: usize,
    old_size: usize,
    old_ptr: *mut u8,
    user: Option<&C>,
  ) -> *mut u8 {
    unsafe { (**self).dispatch(op, new_size, old_size, old_ptr, user) }
  }
}

/// Lends a context-free allocator to consumers that pass a typed context.
///
/// The wrapped allocator implements `Allocator<()>`; the wrapper implements
/// `Allocator<C>` for every `C` and drops the context before forwarding. This
/// lets the host heap stand in for a handle such as
/// [`ArenaAllocator`](crate::ArenaAllocator) without touching call sites:
///
/// ```rust
/// use swapalloc::{Allocator, Arena, ArenaAllocator, ArenaConfig, ContextFree, SYSTEM};
///
/// fn spawn<'a, A: Allocator<Arena<'a>>>(
///   allocator: &A,
///   arena: &Arena<'a>,
/// ) -> *mut u8 {
///   allocator.zero_alloc_with(32, arena)
/// }
///
/// let arena = Arena::system(ArenaConfig::new(256)).unwrap();
///
/// assert!(arena.owns(spawn(&ArenaAllocator, &arena)));
///
/// let heap = spawn(&ContextFree(SYSTEM), &arena);
/// assert!(!arena.owns(heap));
/// unsafe { SYSTEM.free(heap) };
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ContextFree<A>(pub A);

unsafe impl<C: ?Sized, A: Allocator> Allocator<C> for ContextFree<A> {
  #[inline]
  unsafe fn dispatch(
    &self,
    op: AllocOp,
    new_size: usize,
    old_size: usize,
    old_ptr: *mut u8,
    _user: Option<&C>,
  ) -> *mut u8 {
    unsafe { self.0.dispatch(op, new_size, old_size, old_ptr, None) }
  }
}
