use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("state directory {dir} is unusable: {message}")]
    StateDir { dir: PathBuf, message: String },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// One document on disk that is only ever replaced whole. Readers see the
/// previous version or the new one, never a mix.
#[derive(Debug, Clone)]
pub struct AtomicFile {
    path: PathBuf,
}

impl AtomicFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    /// Current contents, `None` if the document was never written.
    pub fn read(&self) -> Result<Option<Vec<u8>>, PersistError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Replace the document with `content`, creating its directory if needed.
    pub fn replace(&self, content: &[u8]) -> Result<(), PersistError> {
        let dir = self.dir();
        fs::create_dir_all(dir).map_err(|err| PersistError::StateDir {
            dir: dir.to_path_buf(),
            message: err.to_string(),
        })?;

        // the temp file must share a filesystem with the target for the rename
        let mut staged = NamedTempFile::new_in(dir)?;
        staged.write_all(content)?;
        staged.as_file_mut().sync_all()?;
        staged
            .persist(&self.path)
            .map_err(|err| PersistError::Io(err.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn bare_file_names_live_in_the_working_directory() {
        assert_eq!(AtomicFile::new("state.json").dir(), Path::new("."));
        assert_eq!(AtomicFile::new("a/state.json").dir(), Path::new("a"));
    }

    #[test]
    fn unwritten_document_reads_as_none() {
        let temp = TempDir::new().unwrap();
        let file = AtomicFile::new(temp.path().join("state.json"));
        assert!(file.read().unwrap().is_none());
    }
}
