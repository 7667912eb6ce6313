//! Data structures read from the artifacts wake writes to disk.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde_json::Value;

/// Project configuration keyed by group name, as found in `wake.json`.
pub type ProjectConfig = BTreeMap<String, GroupConfig>;

/// Build index keyed by group, then asset name, as found in `.wake.json`.
pub type BuildIndex = BTreeMap<String, BTreeMap<String, IndexEntry>>;

/// Directory manifest mapping plain basenames to fingerprinted basenames.
pub type Manifest = BTreeMap<String, String>;

/// Per-group section of the project configuration.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct GroupConfig {
  /// Build variants declared for the group. Only the keys are significant.
  #[serde(default)]
  pub builds: BTreeMap<String, Value>,
}

impl GroupConfig {
  /// Returns `true` when the group declares the given build variant.
  pub fn declares(&self, build: &str) -> bool {
    self.builds.contains_key(build)
  }
}

/// Source and target file lists recorded for one asset in the build index.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct IndexEntry {
  /// Source files in the order wake concatenates them.
  #[serde(default)]
  pub sources: Option<Vec<String>>,
  /// Built output per build variant.
  #[serde(default)]
  pub targets: Option<BTreeMap<String, String>>,
}

/// Which side of an index entry the resolver returns.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolveMode {
  /// The single built file for the requested variant.
  #[default]
  Targets,
  /// Every source file, useful while developing without a build step.
  Sources,
}

/// Cache key identifying one resolution request after build normalisation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResolutionKey {
  /// Asset group, e.g. `css`.
  pub group: String,
  /// Asset name within the group.
  pub name: String,
  /// Effective build variant.
  pub build: String,
}

impl ResolutionKey {
  /// Build a key from borrowed parts.
  pub fn new(group: &str, name: &str, build: &str) -> Self {
    Self {
      group: group.to_string(),
      name: name.to_string(),
      build: build.to_string(),
    }
  }
}

/// Kinds of asset the renderer knows how to emit tags for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssetKind {
  /// Stylesheets, rendered as `<link>` or `<style>`.
  Css,
  /// Scripts, rendered as `<script>`.
  Js,
  /// Images, rendered as `<img>`.
  Image,
}

impl AssetKind {
  /// Group name wake uses for this kind of asset.
  pub fn group(self) -> &'static str {
    match self {
      Self::Css => "css",
      Self::Js => "javascript",
      Self::Image => "binary",
    }
  }
}

impl fmt::Display for AssetKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.group())
  }
}
