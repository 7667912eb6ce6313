//! Invocation of the wake executable.

use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{Context, Result, anyhow};
use tracing::debug;

/// Ask wake to rewrite its build index (`wake --cache`).
///
/// The outcome is logged and otherwise ignored: a failed refresh leaves the index as it
/// was, which the next lookup will surface if it matters.
pub fn signal_rebuild(wake: &Path) {
  match run_cache_command(wake) {
    Ok(()) => debug!(wake = %wake.display(), "refreshed wake build index"),
    Err(err) => debug!(wake = %wake.display(), error = %format!("{err:#}"), "ignoring wake failure"),
  }
}

fn run_cache_command(wake: &Path) -> Result<()> {
  let status = Command::new(wake)
    .arg("--cache")
    .stdin(Stdio::null())
    .stdout(Stdio::null())
    .stderr(Stdio::null())
    .status()
    .with_context(|| format!("failed to run `{} --cache`", wake.display()))?;

  if !status.success() {
    return Err(anyhow!("`{} --cache` failed with status {}", wake.display(), status));
  }

  Ok(())
}
