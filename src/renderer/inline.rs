//! Data-URI encoding for inlined binary assets.

use std::path::Path;

use base64::{Engine as _, engine::general_purpose};

/// Guess a MIME type from the file extension.
pub fn guess_mime_type(path: &Path) -> &'static str {
  let extension = path
    .extension()
    .and_then(|ext| ext.to_str())
    .map(str::to_ascii_lowercase)
    .unwrap_or_default();

  match extension.as_str() {
    "png" => "image/png",
    "jpg" | "jpeg" => "image/jpeg",
    "gif" => "image/gif",
    "svg" => "image/svg+xml",
    "webp" => "image/webp",
    "avif" => "image/avif",
    "ico" => "image/x-icon",
    "bmp" => "image/bmp",
    "css" => "text/css",
    "js" => "application/javascript",
    "json" => "application/json",
    "woff" => "font/woff",
    "woff2" => "font/woff2",
    "ttf" => "font/ttf",
    "otf" => "font/otf",
    _ => "application/octet-stream",
  }
}

/// Build a `data:` URI embedding `bytes`, typed after `path`.
pub fn data_uri(path: &Path, bytes: &[u8]) -> String {
  format!(
    "data:{};base64,{}",
    guess_mime_type(path),
    general_purpose::STANDARD.encode(bytes)
  )
}
