//! HTML rendering of resolved assets.
//!
//! A [`Renderer`] turns asset names into `<link>`, `<script>` and `<img>` tags pointing at
//! the fingerprinted files, or into `<style>`, `<script>` and data-URI `<img>` tags that
//! embed the file contents. URL computation and host sharding live in [`urls`], markup
//! in [`tags`] and data-URI encoding in [`inline`], so each can be tested on its own.

pub mod inline;
pub mod tags;
pub mod urls;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::assets::Assets;
use crate::error::Result;
use crate::models::AssetKind;

use self::inline::data_uri;
use self::tags::open_tag;

/// Renderer-wide defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RendererOptions {
  /// Build variant per wake group (`css`, `javascript`, `binary`).
  pub builds: BTreeMap<String, String>,
  /// Hosts to shard asset URLs across. Empty means root-relative URLs.
  pub hosts: Vec<String>,
  /// Embed file contents instead of linking to them.
  pub inline: bool,
}

impl RendererOptions {
  /// Use `build` for every asset of `kind` unless a call overrides it.
  pub fn with_build(mut self, kind: AssetKind, build: impl Into<String>) -> Self {
    self.builds.insert(kind.group().to_string(), build.into());
    self
  }

  /// Shard URLs across `hosts`.
  pub fn with_hosts<I, S>(mut self, hosts: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.hosts = hosts.into_iter().map(Into::into).collect();
    self
  }

  /// Embed contents by default.
  pub fn with_inline(mut self, inline: bool) -> Self {
    self.inline = inline;
    self
  }
}

/// Per-call options for the `include_*` methods.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncludeOptions {
  /// Build variant overriding the renderer's default for this kind.
  pub build: Option<String>,
  /// Overrides [`RendererOptions::inline`].
  pub inline: Option<bool>,
  /// Extra attributes added to every generated tag.
  pub html: BTreeMap<String, String>,
}

impl IncludeOptions {
  /// Options that change nothing.
  pub fn new() -> Self {
    Self::default()
  }

  /// Request a build variant.
  pub fn build(mut self, build: impl Into<String>) -> Self {
    self.build = Some(build.into());
    self
  }

  /// Force inline or referenced output.
  pub fn inline(mut self, inline: bool) -> Self {
    self.inline = Some(inline);
    self
  }

  /// Add an HTML attribute.
  pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self.html.insert(name.into(), value.into());
    self
  }
}

/// Emits HTML for assets resolved by a borrowed [`Assets`].
#[derive(Debug)]
pub struct Renderer<'a> {
  assets: &'a mut Assets,
  builds: BTreeMap<String, String>,
  hosts: Vec<String>,
  inline: bool,
}

impl<'a> Renderer<'a> {
  pub(crate) fn new(assets: &'a mut Assets, options: RendererOptions) -> Self {
    Self {
      assets,
      builds: options.builds,
      hosts: options
        .hosts
        .iter()
        .map(|host| urls::trim_host(host).to_string())
        .collect(),
      inline: options.inline,
    }
  }

  /// Stylesheets as `<link>` tags, or `<style>` blocks when inlined.
  pub fn include_css(&mut self, names: &[&str], options: &IncludeOptions) -> Result<String> {
    self.include(AssetKind::Css, names, options)
  }

  /// Scripts as `<script src>` tags, or inline `<script>` blocks.
  pub fn include_js(&mut self, names: &[&str], options: &IncludeOptions) -> Result<String> {
    self.include(AssetKind::Js, names, options)
  }

  /// Images as `<img>` tags, with data URIs when inlined.
  pub fn include_image(&mut self, names: &[&str], options: &IncludeOptions) -> Result<String> {
    self.include(AssetKind::Image, names, options)
  }

  /// Render tags for `names` of the given kind, concatenated without separators.
  pub fn include(
    &mut self,
    kind: AssetKind,
    names: &[&str],
    options: &IncludeOptions,
  ) -> Result<String> {
    let html = &options.html;

    if options.inline.unwrap_or(self.inline) {
      let mut out = String::new();
      for path in self.paths_for(kind, names, options)? {
        out.push_str(&self.inline_tag(kind, &path, html)?);
      }
      return Ok(out);
    }

    let tags: Vec<String> = self
      .urls_for(kind, names, options)?
      .iter()
      .map(|url| reference_tag(kind, url, html))
      .collect();
    Ok(tags.concat())
  }

  /// Resolve paths using the per-call build, then the renderer's build for `kind`.
  pub fn paths_for(
    &mut self,
    kind: AssetKind,
    names: &[&str],
    options: &IncludeOptions,
  ) -> Result<Vec<PathBuf>> {
    let build = options
      .build
      .as_deref()
      .or_else(|| self.builds.get(kind.group()).map(String::as_str));
    self.assets.paths_for(kind.group(), names, build)
  }

  /// Resolve URLs, sharded across hosts when any are configured.
  pub fn urls_for(
    &mut self,
    kind: AssetKind,
    names: &[&str],
    options: &IncludeOptions,
  ) -> Result<Vec<String>> {
    let paths = self.paths_for(kind, names, options)?;
    Ok(paths.iter().map(|path| self.url_for(path)).collect())
  }

  /// URL of a single resolved file.
  pub fn url_for(&self, path: &Path) -> String {
    urls::shard(&self.hosts, &self.assets.relative(path))
  }

  fn inline_tag(
    &self,
    kind: AssetKind,
    path: &Path,
    html: &BTreeMap<String, String>,
  ) -> Result<String> {
    let tag = match kind {
      AssetKind::Css => format!(
        "{}{}</style>",
        open_tag("style", &[("type", "text/css")], html),
        self.assets.read_file(path)?
      ),
      AssetKind::Js => format!(
        "{}{}</script>",
        open_tag("script", &[("type", "text/javascript")], html),
        self.assets.read_file(path)?
      ),
      AssetKind::Image => {
        let uri = data_uri(path, &self.assets.read_bytes(path)?);
        open_tag("img", &[("src", uri.as_str())], html)
      }
    };
    Ok(tag)
  }
}

fn reference_tag(kind: AssetKind, url: &str, html: &BTreeMap<String, String>) -> String {
  match kind {
    AssetKind::Css => open_tag(
      "link",
      &[("rel", "stylesheet"), ("type", "text/css"), ("href", url)],
      html,
    ),
    AssetKind::Js => format!(
      "{}</script>",
      open_tag("script", &[("type", "text/javascript"), ("src", url)], html)
    ),
    AssetKind::Image => open_tag("img", &[("src", url)], html),
  }
}
