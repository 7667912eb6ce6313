//! Root-relative URLs and host sharding.

use std::path::{Component, Path};
use std::sync::OnceLock;

use regex::Regex;
use xxhash_rust::xxh3::xxh3_64;

use crate::config::normalize;

fn trailing_slashes() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| Regex::new(r"/*$").expect("invalid trailing slash regex"))
}

/// Express `path` relative to `root` as a URL path with a leading `/`.
///
/// The result always uses forward slashes, whatever the native separator. Paths outside
/// the root keep their `..` segments.
pub fn root_relative(root: &Path, path: &Path) -> String {
  let root = normalize(root);
  let path = normalize(path);

  let root_parts: Vec<Component<'_>> = root.components().collect();
  let path_parts: Vec<Component<'_>> = path.components().collect();
  let shared = root_parts
    .iter()
    .zip(&path_parts)
    .take_while(|(a, b)| a == b)
    .count();

  let mut segments: Vec<String> = Vec::new();
  segments.extend(root_parts[shared..].iter().map(|_| String::from("..")));
  segments.extend(
    path_parts[shared..]
      .iter()
      .map(|part| part.as_os_str().to_string_lossy().into_owned()),
  );

  format!("/{}", segments.join("/"))
}

/// Strip trailing slashes from a host URL.
pub fn trim_host(host: &str) -> &str {
  match trailing_slashes().find(host) {
    Some(found) => &host[..found.start()],
    None => host,
  }
}

/// Pick the host responsible for `path`, or `None` when there are no hosts.
///
/// XXH3 is seedless and platform independent, so a path lands on the same host in every
/// process.
fn host_for(path: &str, host_count: usize) -> Option<usize> {
  if host_count == 0 {
    return None;
  }
  Some((xxh3_64(path.as_bytes()) % host_count as u64) as usize)
}

/// Prefix a root-relative path with its assigned host, or return it unchanged without hosts.
pub fn shard(hosts: &[String], path: &str) -> String {
  match host_for(path, hosts.len()) {
    Some(index) => format!("{}{}", trim_host(&hosts[index]), path),
    None => path.to_string(),
  }
}
