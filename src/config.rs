//! Options controlling where the resolver looks for wake's files and how it caches them.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::models::ResolveMode;

/// File looked up by [`AssetsConfig::discover`].
pub const DEFAULT_CONFIG_FILE: &str = "wake-assets.json";
/// Build variant used when none is requested or the requested one is undeclared.
pub const DEFAULT_BUILD: &str = "min";
/// Build index written by `wake --cache`.
pub const CACHE_FILE: &str = ".wake.json";
/// Per-directory fingerprint manifest.
pub const MANIFEST_FILE: &str = ".manifest.json";
/// Dedicated wake configuration file.
pub const WAKE_FILE: &str = "wake.json";
/// Package descriptor whose `wake` key holds the configuration when `wake.json` is absent.
pub const PACKAGE_FILE: &str = "package.json";
/// Key of the wake configuration inside [`PACKAGE_FILE`].
pub const PACKAGE_WAKE_KEY: &str = "wake";

/// Options for [`crate::Assets`].
///
/// Relative paths are interpreted against the process working directory (`pwd`) or
/// against `pwd` itself (`root`, `wake`) when the resolver is constructed.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
  /// Project directory containing `wake.json`, `package.json` and `.wake.json`.
  pub pwd: PathBuf,
  /// Document root that URLs are computed against. Defaults to `pwd`.
  pub root: Option<PathBuf>,
  /// wake executable. Defaults to `node_modules/.bin/wake` under `pwd`.
  pub wake: Option<PathBuf>,
  /// Keep loaded files and resolved paths between lookups.
  pub cache: bool,
  /// Whether to resolve built targets or raw sources.
  pub mode: ResolveMode,
}

impl Default for AssetsConfig {
  fn default() -> Self {
    Self {
      pwd: PathBuf::from("."),
      root: None,
      wake: None,
      cache: true,
      mode: ResolveMode::Targets,
    }
  }
}

impl AssetsConfig {
  /// Load options from `wake-assets.json` in `dir`, falling back to defaults rooted at `dir`.
  pub fn discover(dir: &Path) -> Self {
    let candidate = dir.join(DEFAULT_CONFIG_FILE);
    let mut config = Self::from_path(&candidate).unwrap_or_default();
    config.pwd = dir.join(&config.pwd);
    config
  }

  /// Read options from a specific JSON file.
  pub fn from_path(path: &Path) -> Option<Self> {
    let content = fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
  }

  /// Set the project directory.
  pub fn with_pwd(mut self, pwd: impl Into<PathBuf>) -> Self {
    self.pwd = pwd.into();
    self
  }

  /// Set the document root.
  pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
    self.root = Some(root.into());
    self
  }

  /// Set the wake executable.
  pub fn with_wake(mut self, wake: impl Into<PathBuf>) -> Self {
    self.wake = Some(wake.into());
    self
  }

  /// Enable or disable caching.
  pub fn with_cache(mut self, cache: bool) -> Self {
    self.cache = cache;
    self
  }

  /// Choose between targets and sources.
  pub fn with_mode(mut self, mode: ResolveMode) -> Self {
    self.mode = mode;
    self
  }

  /// Absolute project directory.
  pub fn pwd_path(&self) -> PathBuf {
    absolutize(&self.pwd)
  }

  /// Absolute document root.
  pub fn root_path(&self) -> PathBuf {
    let pwd = self.pwd_path();
    match &self.root {
      Some(root) => normalize(&pwd.join(root)),
      None => pwd,
    }
  }

  /// Absolute path of the wake executable.
  pub fn wake_path(&self) -> PathBuf {
    let pwd = self.pwd_path();
    match &self.wake {
      Some(wake) => pwd.join(wake),
      None => pwd.join("node_modules").join(".bin").join("wake"),
    }
  }
}

fn absolutize(path: &Path) -> PathBuf {
  if path.is_absolute() {
    return normalize(path);
  }
  match std::env::current_dir() {
    Ok(cwd) => normalize(&cwd.join(path)),
    Err(_) => normalize(path),
  }
}

/// Lexically remove `.` and `..` components without touching the filesystem.
pub(crate) fn normalize(path: &Path) -> PathBuf {
  use std::path::Component;

  let mut result = PathBuf::new();
  for component in path.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => {
        if !result.pop() {
          result.push("..");
        }
      }
      other => result.push(other.as_os_str()),
    }
  }
  if result.as_os_str().is_empty() {
    result.push(".");
  }
  result
}
