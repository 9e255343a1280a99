//! # ralign - Manual Aligned Allocation over `malloc`
//!
//! This crate implements an **aligned allocator** on top of the platform's
//! unaligned `malloc`/`free`, and a small benchmark that times it against the
//! C library's own `aligned_alloc`.
//!
//! ## Overview
//!
//! `malloc` only promises alignment suitable for fundamental types (16 bytes
//! on x86_64 glibc). To hand out a block aligned to any power of two, the
//! allocator asks for more than it needs and picks an aligned address inside:
//!
//! ```text
//!   Aligned Allocation:
//!
//!   malloc(size + alignment + HEADER_SIZE)
//!   │
//!   ▼
//!   ┌─────────┬────────────┬──────────────────────────────┬──────────────┐
//!   │  slack  │   header   │          payload             │    slack     │
//!   │         │ ┌────────┐ │                              │              │
//!   │         │ │ raw ───┼─┼──► points back at the start  │              │
//!   │         │ └────────┘ │    of the malloc block       │              │
//!   └─────────┴────────────┴──────────────────────────────┴──────────────┘
//!                          ▲
//!                          └── handle = (raw + alignment + HEADER_SIZE)
//!                                       & !(alignment - 1)
//! ```
//!
//! Releasing a handle reads the header one pointer below it and passes the
//! original address back to `free`.
//!
//! ## Crate Structure
//!
//! ```text
//!   ralign
//!   ├── align      - Power-of-two rounding (align_down!, align_up!, is_aligned)
//!   ├── header     - Metadata slot written before each handle (internal)
//!   ├── raw        - RawAllocator trait and the malloc/free implementation
//!   ├── aligned    - AlignedAllocator, aligned_malloc, aligned_free
//!   ├── block      - AlignedBlock, the safe owning wrapper
//!   ├── error      - Error and Result
//!   ├── bench      - Strategies, benchmark matrix and report
//!   └── logging    - tracing subscriber setup for the binary
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use ralign::{AlignedBlock, aligned_free, aligned_malloc};
//!
//! // Safe: the block owns its memory and frees it on drop.
//! let mut block = AlignedBlock::allocate(1024, 64).unwrap();
//! block.as_mut_slice()[0] = 42;
//! assert_eq!(0, block.as_ptr() as usize % 64);
//!
//! // Raw: the caller releases exactly once.
//! unsafe {
//!     let ptr = aligned_malloc(64, 16);
//!     assert!(!ptr.is_null());
//!     aligned_free(ptr);
//! }
//! ```
//!
//! ## Benchmark
//!
//! The `ralign` binary runs a fixed matrix of sizes and alignments and
//! prints two lines per row, the reference first:
//!
//! ```text
//!   std::aligned_alloc: 1520 us
//!   aligned_malloc: 1388 us
//! ```
//!
//! The last row allocates 1 MiB blocks, above glibc's mmap threshold, where
//! both strategies pay for mapping pages on every call.
//!
//! ## Features
//!
//! - `canary`: grows the header by one word holding a guard derived from the
//!   raw address. Release checks it and panics on corruption or a repeated
//!   release. Off by default so timings reflect the unchecked primitive.
//!
//! ## Limitations
//!
//! - **Single-threaded use**: no pooling and no synchronization of its own
//! - **No reallocation**: blocks cannot grow or shrink
//! - **Unix-only**: requires `libc` (`malloc`, `free`, `aligned_alloc`)
//!
//! ## Safety
//!
//! The raw primitives trust the caller completely. Writing below a handle,
//! releasing twice, or releasing a foreign pointer is undefined behaviour.

pub mod align;
pub mod aligned;
pub mod bench;
mod block;
mod error;
mod header;
pub mod logging;
pub mod raw;

pub use aligned::{AlignedAllocator, aligned_free, aligned_malloc, print_block};
pub use block::AlignedBlock;
pub use error::{Error, Result};
pub use header::HEADER_SIZE;
pub use raw::{Malloc, RawAllocator};
