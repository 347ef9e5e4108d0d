use std::mem;

/// Natural alignment of every pointer handed out by this crate.
///
/// Two machine words, which is what the host `malloc` guarantees on the
/// platforms we care about (16 bytes on 64 bit, 8 bytes on 32 bit).
pub const NATURAL_ALIGN: usize = 2 * mem::size_of::<usize>();

/// Rounds `value` up to the machine word size.
///
/// # Examples
///
/// ```rust
/// use std::mem;
/// use swapalloc::align;
///
/// match mem::size_of::<usize>() {
///     8 => assert_eq!(align!(13), 16), // 64 bit machine.
///     4 => assert_eq!(align!(11), 12), // 32 bit machine.
///     _ => {},
/// };
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    $crate::align_to!($value, ::std::mem::size_of::<usize>())
  };
}

/// Rounds `value` up to `align`, which must be a power of two.
///
/// Wraps on overflow; use `align::checked_align_to` when `value` comes from a caller.
///
/// ```rust
/// use swapalloc::align_to;
///
/// assert_eq!(align_to!(1, 16), 16);
/// assert_eq!(align_to!(32, 16), 32);
/// assert_eq!(align_to!(0, 8), 0);
/// ```
#[macro_export]
macro_rules! align_to {
  ($value:expr, $align:expr) => {
    (($value) as usize).wrapping_add(($align) - 1) & !(($align) - 1)
  };
}

/// Rounds `value` up to `align`, returning `None` on overflow.
#[inline]
pub fn checked_align_to(
  value: usize,
  align: usize,
) -> Option<usize> {
  debug_assert!(align.is_power_of_two());
  value.checked_add(align - 1).map(|v| v & !(align - 1))
}
