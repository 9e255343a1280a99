/// Rounds `value` down to the nearest multiple of `alignment`.
///
/// `alignment` must be a power of two, otherwise the mask is meaningless.
///
/// # Examples
///
/// ```rust
/// use ralign::align_down;
///
/// assert_eq!(align_down!(13usize, 8usize), 8);
/// assert_eq!(align_down!(64usize, 16usize), 64);
/// assert_eq!(align_down!(0x1017usize, 0x10usize), 0x1010);
/// ```
#[macro_export]
macro_rules! align_down {
  ($value:expr, $alignment:expr) => {
    ($value) & !(($alignment) - 1)
  };
}

/// Rounds `value` up to the nearest multiple of `alignment`.
///
/// # Examples
///
/// ```rust
/// use ralign::align_up;
///
/// assert_eq!(align_up!(13usize, 8usize), 16);
/// assert_eq!(align_up!(64usize, 16usize), 64);
/// ```
#[macro_export]
macro_rules! align_up {
  ($value:expr, $alignment:expr) => {
    (($value) + ($alignment) - 1) & !(($alignment) - 1)
  };
}

/// Returns `true` if `value` is a multiple of the power-of-two `alignment`.
#[inline]
pub fn is_aligned(
  value: usize,
  alignment: usize,
) -> bool {
  value & (alignment - 1) == 0
}
