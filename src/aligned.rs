use std::ptr;

use crate::{
  align::is_aligned,
  align_down,
  header::{HEADER_SIZE, Header},
  raw::{Malloc, RawAllocator},
};

/// Prints where a block landed relative to its raw allocation.
///
/// # Safety
///
/// `handle` must be null or a live handle from [`AlignedAllocator::allocate`].
pub unsafe fn print_block(
  size: usize,
  alignment: usize,
  handle: *mut u8,
) {
  if handle.is_null() {
    println!("Allocation of {size} bytes aligned to {alignment} failed");
    return;
  }

  let raw = unsafe { Header::raw(handle) };

  println!(
    "Allocated {} bytes aligned to {}, handle = {:?}, raw = {:?}, slack = {}, handle % align = {}",
    size,
    alignment,
    handle,
    raw,
    handle as usize - raw as usize,
    handle as usize % alignment,
  );
}

/// Carves power-of-two aligned blocks out of an unaligned [`RawAllocator`].
///
/// Every block is over-allocated by `alignment + HEADER_SIZE` bytes. The
/// handle handed out is the first aligned address that leaves room for the
/// header in front of it, and the header records where the raw block starts
/// so [`AlignedAllocator::deallocate`] can give the exact pointer back.
///
/// ```text
///   raw                          handle (multiple of alignment)
///   │                              │
///   ▼                              ▼
///   ┌──────────────┬───────────────┬─────────────────────────┬──────────┐
///   │    slack     │  header: raw  │      size bytes         │  slack   │
///   └──────────────┴───────────────┴─────────────────────────┴──────────┘
///   ◄────────────── size + alignment + HEADER_SIZE bytes ───────────────►
/// ```
///
/// Nothing is validated: alignment must be a power of two and each handle
/// must be released exactly once. The safe entry point is
/// [`AlignedBlock`](crate::AlignedBlock).
#[derive(Debug, Default, Clone, Copy)]
pub struct AlignedAllocator<R = Malloc> {
  raw: R,
}

impl<R: RawAllocator> AlignedAllocator<R> {
  pub const fn new(raw: R) -> Self {
    Self { raw }
  }

  /// Returns a handle to `size` bytes aligned to `alignment`, or null if the
  /// raw allocator is exhausted or the padded size overflows.
  ///
  /// A `size` of zero still yields a valid, aligned handle.
  ///
  /// # Safety
  ///
  /// - `alignment` must be a non-zero power of two.
  /// - Only the `size` bytes starting at the handle may be touched. Writing
  ///   below the handle corrupts the header and the later release.
  /// - The handle must be passed to [`AlignedAllocator::deallocate`] on this
  ///   allocator exactly once.
  pub unsafe fn allocate(
    &self,
    size: usize,
    alignment: usize,
  ) -> *mut u8 {
    let Some(total) = size
      .checked_add(alignment)
      .and_then(|n| n.checked_add(HEADER_SIZE))
    else {
      return ptr::null_mut();
    };

    unsafe {
      let raw = self.raw.allocate(total);

      if raw.is_null() {
        return ptr::null_mut();
      }

      let address = align_down!(raw as usize + alignment + HEADER_SIZE, alignment);
      let handle = raw.add(address - raw as usize);

      debug_assert!(is_aligned(handle as usize, alignment));
      debug_assert!(handle as usize - raw as usize >= HEADER_SIZE);

      Header::write(handle, raw);

      handle
    }
  }

  /// Gives the raw block behind `handle` back to the raw allocator.
  ///
  /// Null is ignored. The header is left in place.
  ///
  /// # Safety
  ///
  /// `handle` must be null or a live handle from [`AlignedAllocator::allocate`]
  /// on this allocator. Releasing twice or releasing a foreign pointer is
  /// undefined behaviour; only the `canary` feature attempts to catch it.
  pub unsafe fn deallocate(
    &self,
    handle: *mut u8,
  ) {
    if handle.is_null() {
      return;
    }

    unsafe {
      let raw = Header::take(handle);
      self.raw.deallocate(raw);
    }
  }
}

/// [`AlignedAllocator::allocate`] over `malloc`.
///
/// # Safety
///
/// See [`AlignedAllocator::allocate`]. Release with [`aligned_free`].
#[inline]
pub unsafe fn aligned_malloc(
  size: usize,
  alignment: usize,
) -> *mut u8 {
  unsafe { AlignedAllocator::new(Malloc).allocate(size, alignment) }
}

/// [`AlignedAllocator::deallocate`] over `free`.
///
/// # Safety
///
/// `handle` must be null or come from [`aligned_malloc`], released once.
#[inline]
pub unsafe fn aligned_free(handle: *mut u8) {
  unsafe { AlignedAllocator::new(Malloc).deallocate(handle) }
}
