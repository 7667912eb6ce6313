//! Error type shared by the resolver and the renderer.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, AssetsError>;

/// Failures raised while resolving or rendering assets.
#[derive(Debug, Error)]
pub enum AssetsError {
  /// The build index has no entry for the requested asset.
  #[error("could not find assets: group: {group:?}, name: {name:?}, build: {build:?}")]
  InvalidReference {
    /// Requested group.
    group: String,
    /// Requested asset name.
    name: String,
    /// Effective build variant.
    build: String,
  },
  /// Failed to read a file from disk.
  #[error("failed to read {}: {source}", .path.display())]
  Io {
    /// Path that caused the error.
    path: PathBuf,
    /// Source I/O error.
    #[source]
    source: std::io::Error,
  },
  /// Failed to parse one of wake's JSON files.
  #[error("failed to parse {}: {source}", .path.display())]
  Parse {
    /// Path that caused the error.
    path: PathBuf,
    /// Source parse error.
    #[source]
    source: serde_json::Error,
  },
}

impl AssetsError {
  pub(crate) fn invalid_reference(group: &str, name: &str, build: &str) -> Self {
    Self::InvalidReference {
      group: group.to_string(),
      name: name.to_string(),
      build: build.to_string(),
    }
  }
}
