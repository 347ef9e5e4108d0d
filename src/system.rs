use std::ptr;

use libc::{c_void, calloc, free, malloc, realloc};
use tracing::{trace, warn};

use crate::allocator::{AllocOp, Allocator};

/// Adapter onto the host's general purpose heap.
///
/// `Alloc`, `ZeroAlloc`, `Realloc` and `Free` map onto `malloc`, `calloc`,
/// `realloc` and `free`. The heap tracks block sizes itself, so `old_size` and
/// the (unit) user context are ignored. Holds no state: one value can be shared
/// for the whole process.
///
/// Consumers that pass a typed context take
/// [`ContextFree(SYSTEM)`](crate::ContextFree) instead.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SystemAllocator;

/// A ready made [`SystemAllocator`] handle.
pub const SYSTEM: SystemAllocator = SystemAllocator;

impl SystemAllocator {
  pub const fn new() -> Self {
    SystemAllocator
  }
}

unsafe impl Allocator for SystemAllocator {
  unsafe fn dispatch(
    &self,
    op: AllocOp,
    new_size: usize,
    _old_size: usize,
    old_ptr: *mut u8,
    _user: Option<&()>,
  ) -> *mut u8 {
    unsafe {
      let address = match op {
        AllocOp::Alloc if new_size == 0 => return ptr::null_mut(),
        AllocOp::ZeroAlloc if new_size == 0 => return ptr::null_mut(),
        AllocOp::Realloc if old_ptr.is_null() && new_size == 0 => return ptr::null_mut(),
        AllocOp::Alloc => malloc(new_size),
        AllocOp::ZeroAlloc => calloc(1, new_size),
        // `realloc(p, 0)` may free `p`; keep at least one byte so a shrink to
        // zero never invalidates the caller's pointer behind its back.
        AllocOp::Realloc => realloc(old_ptr as *mut c_void, new_size.max(1)),
        AllocOp::Free => {
          if !old_ptr.is_null() {
            free(old_ptr as *mut c_void);
          }
          trace!(ptr = ?old_ptr, "system free");
          return ptr::null_mut();
        }
      } as *mut u8;

      if address.is_null() {
        warn!(op = %op, size = new_size, "system heap exhausted");
      } else {
        trace!(op = %op, size = new_size, ptr = ?address, "system allocation");
      }

      address
    }
  }
}
