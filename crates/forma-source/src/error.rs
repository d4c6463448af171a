use std::io;
use std::path::PathBuf;

/// Failures that stop a scan. Problems inside a file are reported as
/// diagnostics instead.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    #[error("failed to list {}: {source}", path.display())]
    Walk { path: PathBuf, source: io::Error },
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("{} is not a valid package path", path.display())]
    InvalidPath { path: PathBuf },
}

impl From<glob::GlobError> for SourceError {
    fn from(err: glob::GlobError) -> Self {
        let path = err.path().to_path_buf();
        SourceError::Walk {
            path,
            source: err.into_error(),
        }
    }
}
