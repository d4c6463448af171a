//! Writes generated files to disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::round::GeneratedFile;

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
}

/// Writes each file under `<out>/<package path>/<snake_case class>.rs`.
pub struct GeneratedFileWriter {
    out_dir: PathBuf,
}

impl GeneratedFileWriter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Where `file` will be written.
    pub fn target(&self, file: &GeneratedFile) -> PathBuf {
        self.out_dir.join(&file.path)
    }

    pub fn write(&self, file: &GeneratedFile) -> Result<PathBuf, WriteError> {
        let path = self.target(file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| WriteError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&path, &file.contents).map_err(|source| WriteError::Write {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), model = %file.model.name, "wrote generated file");
        Ok(path)
    }

    /// Writes every file. A failed write does not stop the others.
    pub fn write_all<'a>(
        &self,
        files: impl IntoIterator<Item = &'a GeneratedFile>,
    ) -> Vec<Result<PathBuf, WriteError>> {
        files.into_iter().map(|file| self.write(file)).collect()
    }
}
