use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Backing store for battery-backed cartridge RAM.
///
/// `load` runs once when the cartridge is inserted; `store` receives the
/// whole RAM image whenever it changes and again on shutdown.
pub trait SaveStorage {
    /// Previously stored image, or `None` if nothing was saved yet.
    fn load(&mut self) -> Result<Option<Vec<u8>>>;
    fn store(&mut self, data: &[u8]) -> Result<()>;
}

/// Saves to a single file, `<save_dir>/<title>.sav` by default.
#[derive(Clone, Debug)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SaveStorage for FileStorage {
    fn load(&mut self) -> Result<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(Error::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn store(&mut self, data: &[u8]) -> Result<()> {
        fs::write(&self.path, data).map_err(|source| Error::Save {
            path: self.path.clone(),
            source,
        })
    }
}
