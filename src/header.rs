use std::{mem, ptr};

/// Value mixed into the raw address to form the guard word.
#[cfg(feature = "canary")]
pub const CANARY_MAGIC: usize = 0xA11C_0DE5;

/// Metadata written immediately before every aligned handle.
///
/// `raw` is always the last field, so the original allocation address sits
/// exactly one pointer below the handle whether or not the canary is enabled.
#[repr(C)]
pub struct Header {
  #[cfg(feature = "canary")]
  pub canary: usize,
  pub raw: *mut u8,
}

/// Bytes reserved in front of every handle.
pub const HEADER_SIZE: usize = mem::size_of::<Header>();

impl Header {
  pub fn new(raw: *mut u8) -> Self {
    Self {
      #[cfg(feature = "canary")]
      canary: raw as usize ^ CANARY_MAGIC,
      raw,
    }
  }

  /// Address of the header belonging to `handle`.
  ///
  /// # Safety
  ///
  /// `handle` must have at least `HEADER_SIZE` bytes of the same allocation
  /// in front of it.
  #[inline]
  pub unsafe fn before(handle: *mut u8) -> *mut Header {
    unsafe { handle.sub(HEADER_SIZE) as *mut Header }
  }

  /// Stores the header in front of `handle`.
  ///
  /// Small alignments leave the slot unaligned for a pointer, hence the
  /// unaligned write.
  ///
  /// # Safety
  ///
  /// Same as [`Header::before`], and the slot must be writable.
  #[inline]
  pub unsafe fn write(
    handle: *mut u8,
    raw: *mut u8,
  ) {
    unsafe { ptr::write_unaligned(Self::before(handle), Self::new(raw)) }
  }

  /// Reads the raw allocation address stored one pointer below `handle`.
  ///
  /// # Safety
  ///
  /// `handle` must come from a live aligned allocation.
  #[inline]
  pub unsafe fn raw(handle: *mut u8) -> *mut u8 {
    unsafe { ptr::read_unaligned(handle.sub(mem::size_of::<*mut u8>()) as *const *mut u8) }
  }

  /// Reads the raw address for release.
  ///
  /// With the `canary` feature the guard word is verified and then cleared,
  /// so a second release of the same handle panics instead of freeing twice
  /// (as long as the memory has not been handed out again).
  ///
  /// # Safety
  ///
  /// Same as [`Header::raw`].
  #[inline]
  pub unsafe fn take(handle: *mut u8) -> *mut u8 {
    #[cfg(feature = "canary")]
    unsafe {
      let header = Self::before(handle);
      let Header { canary, raw } = ptr::read_unaligned(header);

      if canary != raw as usize ^ CANARY_MAGIC {
        tracing::error!(?handle, canary, ?raw, "aligned header corrupted");
        panic!("corrupted or released aligned block at {handle:?}");
      }

      ptr::write_unaligned(ptr::addr_of_mut!((*header).canary), 0);
      tracing::trace!(?handle, ?raw, "header verified");
      raw
    }

    #[cfg(not(feature = "canary"))]
    unsafe {
      Self::raw(handle)
    }
  }
}
