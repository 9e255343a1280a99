use std::{fmt, ptr::NonNull, slice};

use crate::{
  aligned::AlignedAllocator,
  error::{Error, Result},
  raw::{Malloc, RawAllocator},
};

/// An owned, aligned block of `size` bytes.
///
/// Only the payload is reachable through the block, so safe code cannot
/// touch the header in front of it. The block is released exactly once,
/// either by [`AlignedBlock::release`] or when it is dropped.
pub struct AlignedBlock<R: RawAllocator = Malloc> {
  handle: NonNull<u8>,
  size: usize,
  alignment: usize,
  allocator: AlignedAllocator<R>,
}

impl AlignedBlock<Malloc> {
  /// Allocates `size` bytes aligned to `alignment` from `malloc`.
  ///
  /// # Examples
  ///
  /// ```rust
  /// use ralign::AlignedBlock;
  ///
  /// let mut block = AlignedBlock::allocate(64, 16).unwrap();
  /// assert_eq!(0, block.as_ptr() as usize % 16);
  ///
  /// block.as_mut_slice().fill(7);
  /// assert!(block.as_slice().iter().all(|&b| b == 7));
  ///
  /// block.release();
  /// ```
  pub fn allocate(
    size: usize,
    alignment: usize,
  ) -> Result<Self> {
    Self::allocate_in(size, alignment, Malloc)
  }
}

impl<R: RawAllocator> AlignedBlock<R> {
  /// Allocates from an arbitrary raw allocator.
  ///
  /// Fails with [`Error::InvalidAlignment`] unless `alignment` is a power of
  /// two, and with [`Error::Exhausted`] when the raw allocator returns null.
  pub fn allocate_in(
    size: usize,
    alignment: usize,
    raw: R,
  ) -> Result<Self> {
    if !alignment.is_power_of_two() {
      return Err(Error::InvalidAlignment(alignment));
    }

    let allocator = AlignedAllocator::new(raw);

    // SAFETY: alignment was checked above, and the handle is owned by the
    // returned block, which releases it once.
    let handle = unsafe { allocator.allocate(size, alignment) };

    let handle = NonNull::new(handle).ok_or(Error::Exhausted { size, alignment })?;

    // SAFETY: the payload is `size` writable bytes owned by this block.
    unsafe { handle.as_ptr().write_bytes(0, size) };

    Ok(Self {
      handle,
      size,
      alignment,
      allocator,
    })
  }

  pub fn size(&self) -> usize {
    self.size
  }

  pub fn alignment(&self) -> usize {
    self.alignment
  }

  pub fn as_ptr(&self) -> *const u8 {
    self.handle.as_ptr()
  }

  pub fn as_mut_ptr(&mut self) -> *mut u8 {
    self.handle.as_ptr()
  }

  /// The payload, zeroed on allocation.
  pub fn as_slice(&self) -> &[u8] {
    unsafe { slice::from_raw_parts(self.handle.as_ptr(), self.size) }
  }

  pub fn as_mut_slice(&mut self) -> &mut [u8] {
    unsafe { slice::from_raw_parts_mut(self.handle.as_ptr(), self.size) }
  }

  /// Releases the block. Same as dropping it.
  pub fn release(self) {}
}

impl<R: RawAllocator> Drop for AlignedBlock<R> {
  fn drop(&mut self) {
    // SAFETY: the handle came from this allocator and is only released here.
    unsafe { self.allocator.deallocate(self.handle.as_ptr()) }
  }
}

impl<R: RawAllocator> fmt::Debug for AlignedBlock<R> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_struct("AlignedBlock")
      .field("handle", &self.handle)
      .field("size", &self.size)
      .field("alignment", &self.alignment)
      .finish()
  }
}
