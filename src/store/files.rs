use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::{AssetsError, Result};

/// Read a file as UTF-8 text.
pub fn read_file(path: &Path) -> Result<String> {
  fs::read_to_string(path).map_err(|source| AssetsError::Io {
    path: path.to_path_buf(),
    source,
  })
}

/// Read a file as raw bytes.
pub fn read_bytes(path: &Path) -> Result<Vec<u8>> {
  fs::read(path).map_err(|source| AssetsError::Io {
    path: path.to_path_buf(),
    source,
  })
}

/// Read and deserialize a JSON file that must exist.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
  let content = read_file(path)?;
  parse_json(path, &content)
}

/// Read and deserialize a JSON file, returning `None` when it does not exist.
pub fn read_json_if_exists<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
  let content = match fs::read_to_string(path) {
    Ok(content) => content,
    Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
    Err(source) => {
      return Err(AssetsError::Io {
        path: path.to_path_buf(),
        source,
      });
    }
  };

  parse_json(path, &content).map(Some)
}

fn parse_json<T: DeserializeOwned>(path: &Path, content: &str) -> Result<T> {
  serde_json::from_str(content).map_err(|source| AssetsError::Parse {
    path: path.to_path_buf(),
    source,
  })
}
