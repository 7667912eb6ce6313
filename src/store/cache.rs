use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::models::{BuildIndex, Manifest, ProjectConfig, ResolutionKey};

/// Everything loaded or resolved during one cache epoch.
///
/// Values are shared through [`Rc`] so lookups can hand them out without cloning the
/// underlying maps. The store is not thread-safe; callers sharing an [`crate::Assets`]
/// across threads must serialise access themselves.
#[derive(Debug, Default)]
pub struct CacheStore {
  config: Option<Rc<ProjectConfig>>,
  index: Option<Rc<BuildIndex>>,
  manifests: HashMap<PathBuf, Rc<Manifest>>,
  paths: HashMap<ResolutionKey, Rc<[PathBuf]>>,
  epoch: u64,
}

impl CacheStore {
  /// Create an empty store at epoch zero.
  pub fn new() -> Self {
    Self::default()
  }

  /// Drop everything and start a new epoch.
  pub fn clear(&mut self) {
    self.config = None;
    self.index = None;
    self.manifests.clear();
    self.paths.clear();
    self.epoch += 1;
  }

  /// Number of times the store has been cleared.
  pub fn epoch(&self) -> u64 {
    self.epoch
  }

  /// Returns `true` when nothing has been loaded in the current epoch.
  pub fn is_empty(&self) -> bool {
    self.config.is_none()
      && self.index.is_none()
      && self.manifests.is_empty()
      && self.paths.is_empty()
  }

  /// Number of manifests loaded in the current epoch.
  pub fn manifest_count(&self) -> usize {
    self.manifests.len()
  }

  /// Number of resolution keys cached in the current epoch.
  pub fn resolved_count(&self) -> usize {
    self.paths.len()
  }

  pub(crate) fn config(&self) -> Option<Rc<ProjectConfig>> {
    self.config.clone()
  }

  pub(crate) fn store_config(&mut self, config: Rc<ProjectConfig>) {
    self.config = Some(config);
  }

  pub(crate) fn index(&self) -> Option<Rc<BuildIndex>> {
    self.index.clone()
  }

  pub(crate) fn store_index(&mut self, index: Rc<BuildIndex>) {
    self.index = Some(index);
  }

  pub(crate) fn manifest(&self, path: &Path) -> Option<Rc<Manifest>> {
    self.manifests.get(path).cloned()
  }

  pub(crate) fn store_manifest(&mut self, path: PathBuf, manifest: Rc<Manifest>) {
    self.manifests.insert(path, manifest);
  }

  pub(crate) fn paths(&self, key: &ResolutionKey) -> Option<Rc<[PathBuf]>> {
    self.paths.get(key).cloned()
  }

  pub(crate) fn store_paths(&mut self, key: ResolutionKey, paths: Rc<[PathBuf]>) {
    self.paths.insert(key, paths);
  }
}
