//! The single place output files are created.

use std::fs;
use std::path::{Path, PathBuf};

use folio_core::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// A directory that pipeline stages write JSON into.
///
/// Creating one makes the directory (and any missing parents); creating it
/// again is harmless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDir {
    path: PathBuf,
}

impl OutputDir {
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        fs::create_dir_all(&path).map_err(|e| Error::io(&path, e))?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serialize `value` as pretty-printed JSON into `name`, replacing any
    /// existing file. Returns the written path.
    pub fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<PathBuf> {
        let path = self.path.join(name);
        let mut json = serde_json::to_string_pretty(value)?;
        json.push('\n');
        fs::write(&path, json).map_err(|e| Error::io(&path, e))?;
        Ok(path)
    }
}

/// Write `value` as JSON to an arbitrary file path, creating its directory.
pub(crate) fn write_json_file<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<PathBuf> {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return Err(Error::io(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a file path"),
        ));
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    OutputDir::create(dir)?.write_json(name, value)
}

/// Read and deserialize a JSON file.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    Ok(serde_json::from_str(&text)?)
}
