//! A growable byte buffer over an injected allocator.
//!
//! `Buffer` only ever talks to the [`Allocator`] it was built with, so the
//! same code runs on the host heap or inside an arena.

use std::{ops::Deref, ptr, slice};

use crate::{
  allocator::Allocator,
  error::{AllocError, AllocResult},
};

const MIN_CAPACITY: usize = 16;

pub struct Buffer<'a, A: Allocator + ?Sized> {
  allocator: &'a A,
  ptr: *mut u8,
  len: usize,
  capacity: usize,
}

impl<'a, A: Allocator + ?Sized> Buffer<'a, A> {
  /// Creates an empty buffer. Nothing is allocated until the first write.
  pub fn new(
    allocator: &'a A,
  ) -> Self {
    Self {
      allocator,
      ptr: ptr::null_mut(),
      len: 0,
      capacity: 0,
    }
  }

  pub fn with_capacity(
    capacity: usize,
    allocator: &'a A,
  ) -> AllocResult<Self> {
    let mut buffer = Self::new(allocator);
    buffer.reserve(capacity)?;
    Ok(buffer)
  }

  pub fn allocator(
    &self,
  ) -> &'a A {
    self.allocator
  }

  pub fn len(
    &self,
  ) -> usize {
    self.len
  }

  pub fn is_empty(
    &self,
  ) -> bool {
    self.len == 0
  }

  pub fn capacity(
    &self,
  ) -> usize {
    self.capacity
  }

  pub fn as_slice(
    &self,
  ) -> &[u8] {
    if self.ptr.is_null() {
      return &[];
    }
    unsafe { slice::from_raw_parts(self.ptr, self.len) }
  }

  /// Makes room for at least `additional` more bytes.
  ///
  /// On exhaustion the buffer is left exactly as it was.
  pub fn reserve(
    &mut self,
    additional: usize,
  ) -> AllocResult<()> {
    let needed = self
      .len
      .checked_add(additional)
      .ok_or(AllocError::exhausted(usize::MAX))?;

    if needed <= self.capacity {
      return Ok(());
    }

    let capacity = needed
      .max(self.capacity.saturating_mul(2))
      .max(MIN_CAPACITY);

    let ptr = if self.ptr.is_null() {
      self.allocator.try_zero_alloc(capacity)?
    } else {
      unsafe { self.allocator.try_realloc(self.ptr, self.capacity, capacity)? }
    };

    self.ptr = ptr.as_ptr();
    self.capacity = capacity;
    Ok(())
  }

  pub fn push(
    &mut self,
    byte: u8,
  ) -> AllocResult<()> {
    self.extend_from_slice(&[byte])
  }

  pub fn extend_from_slice(
    &mut self,
    bytes: &[u8],
  ) -> AllocResult<()> {
    self.reserve(bytes.len())?;

    if !bytes.is_empty() {
      unsafe { ptr::copy_nonoverlapping(bytes.as_ptr(), self.ptr.add(self.len), bytes.len()) };
      self.len += bytes.len();
    }

    Ok(())
  }

  /// Drops the contents but keeps the storage.
  pub fn clear(
    &mut self,
  ) {
    self.len = 0;
  }
}

impl<A: Allocator + ?Sized> Deref for Buffer<'_, A> {
  type Target = [u8];

  fn deref(
    &self,
  ) -> &[u8] {
    self.as_slice()
  }
}

impl<A: Allocator + ?Sized> Drop for Buffer<'_, A> {
  fn drop(
    &mut self,
  ) {
    if !self.ptr.is_null() {
      unsafe { self.allocator.free(self.ptr) };
    }
  }
}
