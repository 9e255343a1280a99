use tracing_subscriber::{EnvFilter, fmt};

/// Installs the `tracing` subscriber used by the binary.
///
/// Logs go to stderr so stdout carries nothing but the report. `RUST_LOG`
/// overrides the default filter.
pub fn init() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
    #[cfg(debug_assertions)]
    {
      EnvFilter::new("ralign=debug")
    }
    #[cfg(not(debug_assertions))]
    {
      EnvFilter::new("ralign=info")
    }
  });

  fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .compact()
    .try_init()
    .ok();
}

#[cfg(test)]
mod tests {
  #[test]
  fn test_init_twice() {
    super::init();
    super::init();
  }
}
