//! Resolution of logical asset references into fingerprinted file paths.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde_json::Value;
use tracing::{debug, trace};

use crate::config::{
  AssetsConfig, CACHE_FILE, DEFAULT_BUILD, MANIFEST_FILE, PACKAGE_FILE, PACKAGE_WAKE_KEY, WAKE_FILE,
};
use crate::error::{AssetsError, Result};
use crate::models::{BuildIndex, Manifest, ProjectConfig, ResolutionKey, ResolveMode};
use crate::renderer::{Renderer, RendererOptions, urls};
use crate::store::{self, CacheStore};
use crate::wake::signal_rebuild;

/// Resolver for assets built by wake in a single project.
///
/// Configuration, the build index, manifests and resolved paths are memoised in a
/// [`CacheStore`] until [`Assets::clear_cache`] starts a new epoch. With caching disabled
/// every lookup goes back to disk.
#[derive(Debug)]
pub struct Assets {
  pwd: PathBuf,
  root: PathBuf,
  wake: PathBuf,
  caching: bool,
  mode: ResolveMode,
  cache: CacheStore,
}

impl Assets {
  /// Create a resolver and ask wake to refresh its build index.
  pub fn new(config: AssetsConfig) -> Self {
    let mut assets = Self {
      pwd: config.pwd_path(),
      root: config.root_path(),
      wake: config.wake_path(),
      caching: config.cache,
      mode: config.mode,
      cache: CacheStore::new(),
    };
    assets.clear_cache();
    assets
  }

  /// Refresh wake's build index and forget everything loaded so far.
  pub fn clear_cache(&mut self) {
    signal_rebuild(&self.wake);
    self.cache.clear();
    debug!(epoch = self.cache.epoch(), "cleared asset cache");
  }

  /// Project directory the wake files are read from.
  pub fn pwd(&self) -> &Path {
    &self.pwd
  }

  /// Document root URLs are computed against.
  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Whether loaded data is kept between lookups.
  pub fn is_caching(&self) -> bool {
    self.caching
  }

  /// Current cache contents.
  pub fn cache(&self) -> &CacheStore {
    &self.cache
  }

  /// Resolve `names` in `group` into fingerprinted paths.
  ///
  /// Paths are returned in the order the names were given, each name contributing its
  /// paths in index order. An undeclared `build` silently falls back to the default.
  pub fn paths_for(
    &mut self,
    group: &str,
    names: &[&str],
    build: Option<&str>,
  ) -> Result<Vec<PathBuf>> {
    let build = self.effective_build(group, build)?;

    let mut paths = Vec::new();
    for name in names {
      let key = ResolutionKey::new(group, name, &build);
      paths.extend(self.read_paths(key)?.iter().cloned());
    }
    Ok(paths)
  }

  /// Normalise a requested build variant against the groups declared in the configuration.
  pub fn effective_build(&mut self, group: &str, build: Option<&str>) -> Result<String> {
    let config = self.read_config()?;
    let requested = build.unwrap_or(DEFAULT_BUILD);
    let declared = config
      .get(group)
      .is_some_and(|group_config| group_config.declares(requested));

    if declared {
      Ok(requested.to_string())
    } else {
      if requested != DEFAULT_BUILD {
        trace!(group, build = requested, "build not declared, using default");
      }
      Ok(DEFAULT_BUILD.to_string())
    }
  }

  /// Read an asset file as text.
  pub fn read_file(&self, path: &Path) -> Result<String> {
    store::read_file(path)
  }

  /// Read an asset file as bytes.
  pub fn read_bytes(&self, path: &Path) -> Result<Vec<u8>> {
    store::read_bytes(path)
  }

  /// Express `path` relative to the document root, with a leading `/`.
  pub fn relative(&self, path: &Path) -> String {
    urls::root_relative(&self.root, path)
  }

  /// Build a renderer over this resolver. Without caching this starts a fresh epoch.
  pub fn renderer(&mut self, options: RendererOptions) -> Renderer<'_> {
    if !self.caching {
      self.clear_cache();
    }
    Renderer::new(self, options)
  }

  fn read_paths(&mut self, key: ResolutionKey) -> Result<Rc<[PathBuf]>> {
    if let Some(paths) = self.cache.paths(&key) {
      trace!(group = %key.group, name = %key.name, build = %key.build, "resolved paths cache hit");
      return Ok(paths);
    }

    let paths: Rc<[PathBuf]> = Rc::from(self.find_paths_for(&key)?);
    if self.caching {
      self.cache.store_paths(key, Rc::clone(&paths));
    }
    Ok(paths)
  }

  fn find_paths_for(&mut self, key: &ResolutionKey) -> Result<Vec<PathBuf>> {
    let index = self.read_index()?;
    let invalid = || AssetsError::invalid_reference(&key.group, &key.name, &key.build);

    let entry = index
      .get(&key.group)
      .and_then(|names| names.get(&key.name))
      .ok_or_else(invalid)?;

    let selected: Vec<&String> = match self.mode {
      ResolveMode::Sources => entry.sources.as_ref().ok_or_else(invalid)?.iter().collect(),
      ResolveMode::Targets => {
        let target = entry
          .targets
          .as_ref()
          .and_then(|targets| targets.get(&key.build))
          .ok_or_else(invalid)?;
        vec![target]
      }
    };

    let pwd = self.pwd.clone();
    selected
      .into_iter()
      .map(|path| self.fingerprint(&pwd.join(path)))
      .collect()
  }

  fn fingerprint(&mut self, path: &Path) -> Result<PathBuf> {
    let (Some(dir), Some(basename)) = (path.parent(), path.file_name()) else {
      return Ok(path.to_path_buf());
    };

    let manifest = self.read_manifest(&dir.join(MANIFEST_FILE))?;
    let basename = basename.to_string_lossy();
    let basename: &str = &basename;
    let resolved = manifest.get(basename).map(String::as_str).unwrap_or(basename);

    Ok(dir.join(resolved))
  }

  fn read_config(&mut self) -> Result<Rc<ProjectConfig>> {
    if let Some(config) = self.cache.config() {
      trace!(epoch = self.cache.epoch(), "wake config cache hit");
      return Ok(config);
    }

    let config = Rc::new(self.load_config()?);
    if self.caching {
      self.cache.store_config(Rc::clone(&config));
    }
    Ok(config)
  }

  fn load_config(&self) -> Result<ProjectConfig> {
    let wake_file = self.pwd.join(WAKE_FILE);
    if let Some(config) = store::read_json_if_exists::<ProjectConfig>(&wake_file)? {
      debug!(path = %wake_file.display(), groups = config.len(), "loaded wake config");
      return Ok(config);
    }

    let package_file = self.pwd.join(PACKAGE_FILE);
    let Some(mut package) = store::read_json_if_exists::<Value>(&package_file)? else {
      debug!(pwd = %self.pwd.display(), "no wake config found");
      return Ok(ProjectConfig::new());
    };

    let config = match package.get_mut(PACKAGE_WAKE_KEY).map(Value::take) {
      Some(section) => serde_json::from_value(section).map_err(|source| AssetsError::Parse {
        path: package_file.clone(),
        source,
      })?,
      None => ProjectConfig::new(),
    };
    debug!(path = %package_file.display(), groups = config.len(), "loaded wake config from package");
    Ok(config)
  }

  fn read_index(&mut self) -> Result<Rc<BuildIndex>> {
    if let Some(index) = self.cache.index() {
      trace!(epoch = self.cache.epoch(), "build index cache hit");
      return Ok(index);
    }

    let path = self.pwd.join(CACHE_FILE);
    let index: Rc<BuildIndex> = Rc::new(store::read_json(&path)?);
    debug!(path = %path.display(), groups = index.len(), "loaded wake build index");
    if self.caching {
      self.cache.store_index(Rc::clone(&index));
    }
    Ok(index)
  }

  fn read_manifest(&mut self, path: &Path) -> Result<Rc<Manifest>> {
    if let Some(manifest) = self.cache.manifest(path) {
      trace!(path = %path.display(), "manifest cache hit");
      return Ok(manifest);
    }

    let manifest = Rc::new(store::read_json_if_exists::<Manifest>(path)?.unwrap_or_default());
    debug!(path = %path.display(), entries = manifest.len(), "loaded manifest");
    if self.caching {
      self.cache.store_manifest(path.to_path_buf(), Rc::clone(&manifest));
    }
    Ok(manifest)
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;
  use std::fs;
  use tempfile::{TempDir, tempdir};

  /// A project directory laid out the way wake leaves it after a build.
  pub(crate) struct Fixture {
    pub dir: TempDir,
  }

  impl Fixture {
    pub fn new() -> Self {
      let fixture = Self {
        dir: tempdir().unwrap(),
      };
      fs::create_dir_all(fixture.build_dir()).unwrap();
      fixture
    }

    pub fn path(&self) -> &Path {
      self.dir.path()
    }

    pub fn build_dir(&self) -> PathBuf {
      self.path().join("public").join("build")
    }

    pub fn write(&self, relative: &str, content: impl AsRef<[u8]>) -> PathBuf {
      let path = self.path().join(relative);
      fs::create_dir_all(path.parent().unwrap()).unwrap();
      fs::write(&path, content).unwrap();
      path
    }

    pub fn write_index(&self, index: serde_json::Value) {
      self.write(CACHE_FILE, index.to_string());
    }

    pub fn config(&self) -> AssetsConfig {
      AssetsConfig::default()
        .with_pwd(self.path())
        .with_root("public")
        .with_wake("missing/wake")
    }

    pub fn assets(&self) -> Assets {
      Assets::new(self.config())
    }

    /// Standard project: css/app with `min` and `src` builds, a manifest for `app.css`.
    pub fn standard() -> Self {
      let fixture = Self::new();
      let build = fixture.build_dir();
      fixture.write(
        WAKE_FILE,
        r#"{"css": {"builds": {"src": {}, "min": {}}}, "javascript": {"builds": {"min": {}}}}"#,
      );
      fixture.write_index(serde_json::json!({
        "css": {
          "app": {
            "sources": [
              fixture.path().join("css/reset.css"),
              fixture.path().join("css/app.css"),
            ],
            "targets": {
              "min": build.join("app.css"),
              "src": build.join("app-src.css"),
            },
          },
          "print": { "targets": { "min": build.join("print.css") } },
        },
        "javascript": {
          "main": { "targets": { "min": build.join("main.js") } },
        },
      }));
      fixture.write(
        "public/build/.manifest.json",
        r#"{"app.css": "app-ab12.css", "app-src.css": "app-src-cd34.css", "main.js": "main-ef56.js"}"#,
      );
      fixture
    }
  }

  #[test]
  fn resolves_target_through_manifest() {
    let fixture = Fixture::standard();
    let mut assets = fixture.assets();

    let paths = assets.paths_for("css", &["app"], None).unwrap();
    assert_eq!(paths, vec![fixture.build_dir().join("app-ab12.css")]);
  }

  #[test]
  fn passes_through_basenames_missing_from_manifest() {
    let fixture = Fixture::standard();
    let mut assets = fixture.assets();

    let paths = assets.paths_for("css", &["print"], None).unwrap();
    assert_eq!(paths, vec![fixture.build_dir().join("print.css")]);
  }

  #[test]
  fn directories_without_manifest_resolve_to_themselves() {
    let fixture = Fixture::new();
    fixture.write_index(serde_json::json!({
      "css": { "app": { "targets": { "min": fixture.build_dir().join("app.css") } } },
    }));
    let mut assets = fixture.assets();

    let paths = assets.paths_for("css", &["app"], None).unwrap();
    assert_eq!(paths, vec![fixture.build_dir().join("app.css")]);
  }

  #[test]
  fn explicit_declared_build_is_used() {
    let fixture = Fixture::standard();
    let mut assets = fixture.assets();

    let paths = assets.paths_for("css", &["app"], Some("src")).unwrap();
    assert_eq!(paths, vec![fixture.build_dir().join("app-src-cd34.css")]);
  }

  #[test]
  fn undeclared_build_falls_back_to_default() {
    let fixture = Fixture::standard();
    let mut assets = fixture.assets();

    let fallback = assets.paths_for("css", &["app"], Some("debug")).unwrap();
    let default = assets.paths_for("css", &["app"], Some(DEFAULT_BUILD)).unwrap();
    assert_eq!(fallback, default);
    assert_eq!(assets.effective_build("css", Some("debug")).unwrap(), "min");
    assert_eq!(assets.effective_build("unknown", Some("src")).unwrap(), "min");
  }

  #[test]
  fn concatenates_names_in_request_order() {
    let fixture = Fixture::standard();
    let mut assets = fixture.assets();

    let paths = assets.paths_for("css", &["print", "app"], None).unwrap();
    assert_eq!(paths, vec![
      fixture.build_dir().join("print.css"),
      fixture.build_dir().join("app-ab12.css"),
    ]);
  }

  #[test]
  fn sources_mode_returns_every_source_in_order() {
    let fixture = Fixture::standard();
    let mut assets = Assets::new(fixture.config().with_mode(ResolveMode::Sources));

    let paths = assets.paths_for("css", &["app"], None).unwrap();
    assert_eq!(paths, vec![
      fixture.path().join("css/reset.css"),
      fixture.path().join("css/app.css"),
    ]);
  }

  #[test]
  fn sources_mode_without_sources_is_invalid() {
    let fixture = Fixture::standard();
    let mut assets = Assets::new(fixture.config().with_mode(ResolveMode::Sources));

    let err = assets.paths_for("css", &["print"], None).unwrap_err();
    assert!(matches!(err, AssetsError::InvalidReference { .. }));
  }

  #[test]
  fn unknown_name_is_an_invalid_reference() {
    let fixture = Fixture::standard();
    let mut assets = fixture.assets();

    match assets.paths_for("css", &["missing"], Some("src")) {
      Err(AssetsError::InvalidReference { group, name, build }) => {
        assert_eq!(group, "css");
        assert_eq!(name, "missing");
        assert_eq!(build, "src");
      }
      other => panic!("expected invalid reference, got {other:?}"),
    }
  }

  #[test]
  fn unknown_group_is_an_invalid_reference() {
    let fixture = Fixture::standard();
    let mut assets = fixture.assets();

    let err = assets.paths_for("fonts", &["sans"], None).unwrap_err();
    assert!(matches!(
      err,
      AssetsError::InvalidReference { ref group, ref build, .. } if group == "fonts" && build == "min"
    ));
  }

  #[test]
  fn declared_build_without_target_is_an_invalid_reference() {
    let fixture = Fixture::standard();
    let mut assets = fixture.assets();

    let err = assets.paths_for("css", &["print"], Some("src")).unwrap_err();
    assert!(matches!(err, AssetsError::InvalidReference { ref name, .. } if name == "print"));
  }

  #[test]
  fn missing_index_is_an_io_error() {
    let fixture = Fixture::new();
    let mut assets = fixture.assets();

    let err = assets.paths_for("css", &["app"], None).unwrap_err();
    assert!(matches!(err, AssetsError::Io { .. }));
  }

  #[test]
  fn relative_index_paths_are_joined_to_pwd() {
    let fixture = Fixture::new();
    fixture.write_index(serde_json::json!({
      "css": { "app": { "targets": { "min": "public/build/app.css" } } },
    }));
    fixture.write("public/build/.manifest.json", r#"{"app.css": "app-99.css"}"#);
    let mut assets = fixture.assets();

    let paths = assets.paths_for("css", &["app"], None).unwrap();
    assert_eq!(paths, vec![fixture.build_dir().join("app-99.css")]);
  }

  #[test]
  fn repeated_lookups_hit_the_cache() {
    let fixture = Fixture::standard();
    let mut assets = fixture.assets();

    let first = assets.paths_for("css", &["app"], None).unwrap();
    fs::remove_file(fixture.path().join(CACHE_FILE)).unwrap();
    let second = assets.paths_for("css", &["app"], None).unwrap();

    assert_eq!(first, second);
    assert_eq!(assets.cache().resolved_count(), 1);
    assert_eq!(assets.cache().manifest_count(), 1);
  }

  #[test]
  fn cached_index_serves_new_names_without_rereading() {
    let fixture = Fixture::standard();
    let mut assets = fixture.assets();

    assets.paths_for("css", &["app"], None).unwrap();
    fixture.write_index(serde_json::json!({}));

    let paths = assets.paths_for("javascript", &["main"], None).unwrap();
    assert_eq!(paths, vec![fixture.build_dir().join("main-ef56.js")]);
  }

  #[test]
  fn clearing_the_cache_rereads_from_disk() {
    let fixture = Fixture::standard();
    let mut assets = fixture.assets();

    let before = assets.paths_for("css", &["app"], None).unwrap();
    fixture.write("public/build/.manifest.json", r#"{"app.css": "app-ffff.css"}"#);
    assert_eq!(assets.paths_for("css", &["app"], None).unwrap(), before);

    let epoch = assets.cache().epoch();
    assets.clear_cache();
    assert_eq!(assets.cache().epoch(), epoch + 1);
    assert!(assets.cache().is_empty());

    let after = assets.paths_for("css", &["app"], None).unwrap();
    assert_eq!(after, vec![fixture.build_dir().join("app-ffff.css")]);
  }

  #[test]
  fn fresh_epoch_matches_cached_result() {
    let fixture = Fixture::standard();
    let mut assets = fixture.assets();

    let cached = assets.paths_for("css", &["app", "print"], None).unwrap();
    assets.clear_cache();
    let fresh = assets.paths_for("css", &["app", "print"], None).unwrap();
    assert_eq!(cached, fresh);
  }

  #[test]
  fn disabled_cache_reads_every_time() {
    let fixture = Fixture::standard();
    let mut assets = Assets::new(fixture.config().with_cache(false));

    assets.paths_for("css", &["app"], None).unwrap();
    assert!(assets.cache().is_empty());

    fixture.write("public/build/.manifest.json", r#"{"app.css": "app-0000.css"}"#);
    let paths = assets.paths_for("css", &["app"], None).unwrap();
    assert_eq!(paths, vec![fixture.build_dir().join("app-0000.css")]);
  }

  #[test]
  fn config_falls_back_to_package_file() {
    let fixture = Fixture::standard();
    fs::remove_file(fixture.path().join(WAKE_FILE)).unwrap();
    fixture.write(
      PACKAGE_FILE,
      r#"{"name": "site", "wake": {"css": {"builds": {"src": {}}}}}"#,
    );
    let mut assets = fixture.assets();

    assert_eq!(assets.effective_build("css", Some("src")).unwrap(), "src");
  }

  #[test]
  fn wake_file_takes_precedence_over_package_file() {
    let fixture = Fixture::standard();
    fixture.write(PACKAGE_FILE, r#"{"wake": {"css": {"builds": {"dev": {}}}}}"#);
    let mut assets = fixture.assets();

    assert_eq!(assets.effective_build("css", Some("dev")).unwrap(), "min");
    assert_eq!(assets.effective_build("css", Some("src")).unwrap(), "src");
  }

  #[test]
  fn missing_config_falls_back_for_every_group() {
    let fixture = Fixture::standard();
    fs::remove_file(fixture.path().join(WAKE_FILE)).unwrap();
    let mut assets = fixture.assets();

    assert_eq!(assets.effective_build("css", Some("src")).unwrap(), "min");
    let paths = assets.paths_for("css", &["app"], Some("src")).unwrap();
    assert_eq!(paths, vec![fixture.build_dir().join("app-ab12.css")]);
  }

  #[test]
  fn relative_strips_the_document_root() {
    let fixture = Fixture::standard();
    let assets = fixture.assets();

    let url = assets.relative(&fixture.build_dir().join("app-ab12.css"));
    assert_eq!(url, "/build/app-ab12.css");
  }

  #[test]
  fn end_to_end_resolution_and_relative_path() {
    let fixture = Fixture::new();
    fixture.write_index(serde_json::json!({
      "css": { "app": { "targets": { "min": fixture.build_dir().join("app.css") } } },
    }));
    fixture.write("public/build/.manifest.json", "{}");
    let mut assets = Assets::new(fixture.config().with_root(fixture.build_dir()));

    let paths = assets.paths_for("css", &["app"], None).unwrap();
    assert_eq!(paths, vec![fixture.build_dir().join("app.css")]);
    assert_eq!(assets.relative(&paths[0]), "/app.css");
  }

  struct MessageLog(std::sync::Arc<std::sync::Mutex<Vec<String>>>);

  impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for MessageLog {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
      let mut visitor = MessageVisitor(String::new());
      event.record(&mut visitor);
      self.0.lock().unwrap().push(visitor.0);
    }
  }

  struct MessageVisitor(String);

  impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
      if field.name() == "message" {
        use std::fmt::Write;
        let _ = write!(self.0, "{value:?}");
      }
    }
  }

  #[test]
  fn cache_hits_are_traced_for_every_store() {
    use tracing_subscriber::prelude::*;

    let fixture = Fixture::standard();
    let mut assets = fixture.assets();
    let messages = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::registry().with(MessageLog(messages.clone()));

    tracing::subscriber::with_default(subscriber, || {
      assets.paths_for("css", &["app"], None).unwrap();
      assets.paths_for("javascript", &["main"], None).unwrap();
      assets.paths_for("css", &["app"], None).unwrap();
    });

    let messages = messages.lock().unwrap();
    for expected in [
      "wake config cache hit",
      "build index cache hit",
      "manifest cache hit",
      "resolved paths cache hit",
    ] {
      assert!(
        messages.iter().any(|message| message == expected),
        "missing {expected:?} in {messages:?}"
      );
    }
  }
}
