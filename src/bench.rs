//! Timed allocate/free loops comparing aligned allocation strategies.

use std::{
  alloc::{self, Layout},
  fmt,
  hint::black_box,
  io::Write,
  ptr,
  time::{Duration, Instant},
};

use libc::{aligned_alloc, c_void, free};
use tracing::{debug, info, warn};

use crate::{
  aligned::AlignedAllocator,
  error::Result,
  raw::{Malloc, RawAllocator},
};

/// One row of the benchmark matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
  pub size: usize,
  pub alignment: usize,
  pub iterations: usize,
}

impl Config {
  pub const fn new(
    size: usize,
    alignment: usize,
    iterations: usize,
  ) -> Self {
    Self {
      size,
      alignment,
      iterations,
    }
  }
}

/// The fixed matrix run by the `ralign` binary.
///
/// The 1 MiB row sits above glibc's default mmap threshold (128 KiB), so
/// every allocation there maps and unmaps pages instead of touching the
/// arena.
pub const MATRIX: [Config; 5] = [
  Config::new(64, 16, 100_000),
  Config::new(128, 32, 100_000),
  Config::new(256, 64, 100_000),
  Config::new(1024, 64, 100_000),
  Config::new(1024 * 1024, 64, 1_000),
];

/// A way of obtaining and releasing aligned memory.
pub trait Strategy {
  /// Name printed in front of the timing.
  fn label(&self) -> &'static str;

  /// # Safety
  ///
  /// `alignment` must be a power of two. The result (null included) must be
  /// passed to [`Strategy::release`] with the same size and alignment.
  unsafe fn allocate(
    &self,
    size: usize,
    alignment: usize,
  ) -> *mut u8;

  /// # Safety
  ///
  /// `ptr` must come from [`Strategy::allocate`] on this strategy with the
  /// same `size` and `alignment`, released once.
  unsafe fn release(
    &self,
    ptr: *mut u8,
    size: usize,
    alignment: usize,
  );
}

/// The C library's own aligned allocation, `aligned_alloc` + `free`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Reference;

impl Strategy for Reference {
  fn label(&self) -> &'static str {
    "std::aligned_alloc"
  }

  unsafe fn allocate(
    &self,
    size: usize,
    alignment: usize,
  ) -> *mut u8 {
    unsafe { aligned_alloc(alignment, size) as *mut u8 }
  }

  unsafe fn release(
    &self,
    ptr: *mut u8,
    _size: usize,
    _alignment: usize,
  ) {
    unsafe { free(ptr as *mut c_void) }
  }
}

/// The hand-rolled [`AlignedAllocator`].
#[derive(Debug, Default, Clone, Copy)]
pub struct Custom<R = Malloc>(pub AlignedAllocator<R>);

impl<R: RawAllocator> Strategy for Custom<R> {
  fn label(&self) -> &'static str {
    "aligned_malloc"
  }

  unsafe fn allocate(
    &self,
    size: usize,
    alignment: usize,
  ) -> *mut u8 {
    unsafe { self.0.allocate(size, alignment) }
  }

  unsafe fn release(
    &self,
    ptr: *mut u8,
    _size: usize,
    _alignment: usize,
  ) {
    unsafe { self.0.deallocate(ptr) }
  }
}

/// Rust's global allocator with an explicit [`Layout`].
///
/// Zero sizes are bumped to one byte since the global allocator does not
/// accept empty layouts.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdAlloc;

impl StdAlloc {
  fn layout(
    size: usize,
    alignment: usize,
  ) -> Option<Layout> {
    Layout::from_size_align(size.max(1), alignment).ok()
  }
}

impl Strategy for StdAlloc {
  fn label(&self) -> &'static str {
    "std::alloc"
  }

  unsafe fn allocate(
    &self,
    size: usize,
    alignment: usize,
  ) -> *mut u8 {
    match Self::layout(size, alignment) {
      Some(layout) => unsafe { alloc::alloc(layout) },
      None => ptr::null_mut(),
    }
  }

  unsafe fn release(
    &self,
    ptr: *mut u8,
    size: usize,
    alignment: usize,
  ) {
    if ptr.is_null() {
      return;
    }

    if let Some(layout) = Self::layout(size, alignment) {
      unsafe { alloc::dealloc(ptr, layout) }
    }
  }
}

/// Result of one timed loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Measurement {
  pub label: &'static str,
  pub elapsed: Duration,
  /// Iterations where the strategy returned null.
  pub failures: usize,
}

impl Measurement {
  pub fn micros(&self) -> u128 {
    self.elapsed.as_micros()
  }
}

impl fmt::Display for Measurement {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(f, "{}: {} us", self.label, self.micros())
  }
}

/// Reference and custom timings for one configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
  pub config: Config,
  pub reference: Measurement,
  pub custom: Measurement,
}

/// Runs `config.iterations` allocate/free pairs back to back and times the
/// whole loop.
pub fn time_loop<S: Strategy + ?Sized>(
  strategy: &S,
  config: Config,
) -> Measurement {
  let Config {
    size,
    alignment,
    iterations,
  } = config;
  let mut failures = 0;

  let start = Instant::now();

  for _ in 0..iterations {
    // SAFETY: every matrix alignment is a power of two, and each pointer is
    // released once with the layout it was allocated with.
    unsafe {
      let ptr = black_box(strategy.allocate(size, alignment));
      failures += ptr.is_null() as usize;
      strategy.release(ptr, size, alignment);
    }
  }

  let elapsed = start.elapsed();

  if failures > 0 {
    warn!(
      strategy = strategy.label(),
      size, alignment, failures, "allocations returned null"
    );
  }

  Measurement {
    label: strategy.label(),
    elapsed,
    failures,
  }
}

/// Times `reference` then `custom` for every configuration, in order, and
/// writes two report lines per configuration to `out`.
pub fn run<W, A, B>(
  configs: &[Config],
  reference: &A,
  custom: &B,
  out: &mut W,
) -> Result<Vec<Comparison>>
where
  W: Write,
  A: Strategy + ?Sized,
  B: Strategy + ?Sized,
{
  let mut comparisons = Vec::with_capacity(configs.len());

  for &config in configs {
    debug!(
      size = config.size,
      alignment = config.alignment,
      iterations = config.iterations,
      "running configuration"
    );

    let reference = time_loop(reference, config);
    writeln!(out, "{reference}")?;

    let custom = time_loop(custom, config);
    writeln!(out, "{custom}")?;

    comparisons.push(Comparison {
      config,
      reference,
      custom,
    });
  }

  out.flush()?;

  Ok(comparisons)
}

/// Runs [`MATRIX`] with [`Reference`] against [`Custom`] over `malloc`.
pub fn run_matrix<W: Write>(out: &mut W) -> Result<Vec<Comparison>> {
  info!(configurations = MATRIX.len(), "starting benchmark");

  let comparisons = run(&MATRIX, &Reference, &Custom::<Malloc>::default(), out)?;

  info!("benchmark finished");

  Ok(comparisons)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::raw::testing::{Exhausted, Tracking};

  fn parse_line(line: &str) -> (&str, u128) {
    let (label, rest) = line.split_once(": ").unwrap();
    let micros = rest.strip_suffix(" us").unwrap();
    (label, micros.parse().unwrap())
  }

  #[test]
  fn test_matrix_report() {
    let mut out = Vec::new();
    let comparisons = run_matrix(&mut out).unwrap();

    let report = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(10, lines.len());

    for (pair, comparison) in lines.chunks(2).zip(&comparisons) {
      assert_eq!(("std::aligned_alloc", comparison.reference.micros()), parse_line(pair[0]));
      assert_eq!(("aligned_malloc", comparison.custom.micros()), parse_line(pair[1]));
      assert_eq!(0, comparison.reference.failures);
      assert_eq!(0, comparison.custom.failures);
    }

    let configs: Vec<Config> = comparisons.iter().map(|c| c.config).collect();
    assert_eq!(MATRIX.to_vec(), configs);
  }

  #[test]
  fn test_custom_loop_releases_everything() {
    let tracking = Tracking::default();
    let custom = Custom(AlignedAllocator::new(&tracking));

    let measurement = time_loop(&custom, Config::new(96, 32, 500));

    assert_eq!("aligned_malloc", measurement.label);
    assert_eq!(0, measurement.failures);
    assert_eq!(0, tracking.outstanding());
  }

  #[test]
  fn test_exhaustion_is_counted() {
    let custom = Custom(AlignedAllocator::new(Exhausted));

    let measurement = time_loop(&custom, Config::new(64, 16, 25));

    assert_eq!(25, measurement.failures);
  }

  #[test]
  fn test_strategies_align() {
    let strategies: [&dyn Strategy; 3] = [&Reference, &Custom::<Malloc>::default(), &StdAlloc];

    for strategy in strategies {
      for config in MATRIX {
        unsafe {
          let ptr = strategy.allocate(config.size, config.alignment);
          assert!(!ptr.is_null(), "{} failed", strategy.label());
          assert_eq!(0, ptr as usize % config.alignment);
          strategy.release(ptr, config.size, config.alignment);
        }
      }

      unsafe {
        let ptr = strategy.allocate(0, 8);
        strategy.release(ptr, 0, 8);
      }
    }
  }

  #[test]
  fn test_runs_are_independent() {
    let tracking = Tracking::default();
    let custom = Custom(AlignedAllocator::new(&tracking));
    let configs = [Config::new(64, 16, 1_000), Config::new(1024, 64, 200)];
    let mut out = Vec::new();

    let first = run(&configs, &Reference, &custom, &mut out).unwrap();
    assert_eq!(0, tracking.outstanding());

    let second = run(&configs, &Reference, &custom, &mut out).unwrap();
    assert_eq!(0, tracking.outstanding());

    assert_eq!(2, first.len());
    assert_eq!(2, second.len());

    for comparison in first.iter().chain(&second) {
      assert_eq!("aligned_malloc", comparison.custom.label);
      assert_eq!(0, comparison.custom.failures);
    }

    assert_eq!(8, String::from_utf8(out).unwrap().lines().count());
  }

  #[test]
  fn test_std_alloc_strategy() {
    let configs = [Config::new(256, 64, 1_000)];
    let mut out = Vec::new();

    let comparisons = run(&configs, &Reference, &StdAlloc, &mut out).unwrap();

    assert_eq!("std::alloc", comparisons[0].custom.label);
    assert_eq!(0, comparisons[0].custom.failures);
  }

  #[test]
  fn test_display() {
    let measurement = Measurement {
      label: "aligned_malloc",
      elapsed: Duration::from_micros(1_234),
      failures: 0,
    };

    assert_eq!("aligned_malloc: 1234 us", measurement.to_string());
  }
}
