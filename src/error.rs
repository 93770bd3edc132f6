use std::path::{Path, PathBuf};

/// Errors that abort a compression run.
///
/// A convert tool that exits non-zero is not an error; it is logged and
/// counted in the report.
#[derive(Debug, thiserror::Error)]
pub enum CompressError {
    #[error("input path does not exist: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed walking directory tree: {0}")]
    Walk(#[from] walkdir::Error),
}

impl CompressError {
    /// Wraps an I/O error with the path it happened on.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        CompressError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, CompressError>;
