use libc::{c_void, free, malloc};

/// An unaligned, general-purpose allocator the aligned primitive carves its
/// blocks out of.
///
/// Failure is signalled with a null pointer, the same way `malloc(3)` does.
pub trait RawAllocator {
  /// Returns at least `size` bytes, or null when memory is exhausted.
  ///
  /// # Safety
  ///
  /// The returned block must be released with [`RawAllocator::deallocate`]
  /// on the same allocator.
  unsafe fn allocate(
    &self,
    size: usize,
  ) -> *mut u8;

  /// Releases a block previously returned by [`RawAllocator::allocate`].
  ///
  /// # Safety
  ///
  /// `ptr` must have been issued by this allocator and not yet released.
  unsafe fn deallocate(
    &self,
    ptr: *mut u8,
  );
}

/// The platform `malloc`/`free` pair.
#[derive(Debug, Default, Clone, Copy)]
pub struct Malloc;

impl RawAllocator for Malloc {
  #[inline]
  unsafe fn allocate(
    &self,
    size: usize,
  ) -> *mut u8 {
    unsafe { malloc(size) as *mut u8 }
  }

  #[inline]
  unsafe fn deallocate(
    &self,
    ptr: *mut u8,
  ) {
    unsafe { free(ptr as *mut c_void) }
  }
}

impl<R: RawAllocator + ?Sized> RawAllocator for &R {
  #[inline]
  unsafe fn allocate(
    &self,
    size: usize,
  ) -> *mut u8 {
    unsafe { (**self).allocate(size) }
  }

  #[inline]
  unsafe fn deallocate(
    &self,
    ptr: *mut u8,
  ) {
    unsafe { (**self).deallocate(ptr) }
  }
}

#[cfg(test)]
pub(crate) mod testing {
  use std::{cell::RefCell, collections::HashSet};

  use super::*;

  /// Wraps [`Malloc`] and records every address it has issued but not yet
  /// seen released.
  #[derive(Default)]
  pub struct Tracking {
    outstanding: RefCell<HashSet<usize>>,
    issued: RefCell<Vec<(usize, usize)>>,
  }

  impl Tracking {
    pub fn outstanding(&self) -> usize {
      self.outstanding.borrow().len()
    }

    /// The `(address, size)` of the most recent raw allocation.
    pub fn last_issued(&self) -> Option<(usize, usize)> {
      self.issued.borrow().last().copied()
    }
  }

  impl RawAllocator for Tracking {
    unsafe fn allocate(
      &self,
      size: usize,
    ) -> *mut u8 {
      let ptr = unsafe { Malloc.allocate(size) };

      if !ptr.is_null() {
        self.outstanding.borrow_mut().insert(ptr as usize);
        self.issued.borrow_mut().push((ptr as usize, size));
      }

      ptr
    }

    unsafe fn deallocate(
      &self,
      ptr: *mut u8,
    ) {
      assert!(
        self.outstanding.borrow_mut().remove(&(ptr as usize)),
        "released {ptr:?}, which was never issued or was already released"
      );

      unsafe { Malloc.deallocate(ptr) }
    }
  }

  impl Drop for Tracking {
    fn drop(&mut self) {
      if !std::thread::panicking() {
        assert_eq!(0, self.outstanding(), "raw allocations leaked");
      }
    }
  }

  /// Simulates an exhausted heap.
  pub struct Exhausted;

  impl RawAllocator for Exhausted {
    unsafe fn allocate(
      &self,
      _size: usize,
    ) -> *mut u8 {
      std::ptr::null_mut()
    }

    unsafe fn deallocate(
      &self,
      ptr: *mut u8,
    ) {
      panic!("nothing was issued, yet {ptr:?} was released");
    }
  }
}
