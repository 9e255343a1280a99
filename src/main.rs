use std::{io, process::ExitCode};

use ralign::{bench, logging};

fn main() -> ExitCode {
  logging::init();

  let stdout = io::stdout();
  let mut out = stdout.lock();

  match bench::run_matrix(&mut out) {
    Ok(_) => ExitCode::SUCCESS,
    Err(err) => {
      tracing::error!(%err, "benchmark aborted");
      ExitCode::FAILURE
    }
  }
}
