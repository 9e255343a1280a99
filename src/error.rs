use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
  #[error("cannot allocate {size} bytes aligned to {alignment}: memory exhausted")]
  Exhausted { size: usize, alignment: usize },

  #[error("alignment {0} is not a power of two")]
  InvalidAlignment(usize),

  #[error("failed to write benchmark report")]
  Io(#[from] std::io::Error),
}
