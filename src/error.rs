use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failures a caller of [`generate`](crate::generate) may want to tell apart.
///
/// Everything else is reported as a plain `anyhow` error with context.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// A path required by the run does not exist.
    #[error("not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The analyzed root exists but is not a directory.
    #[error("not a directory: {}", path.display())]
    NotADirectory { path: PathBuf },
}

impl GenerateError {
    pub fn not_found(path: &Path) -> Self {
        Self::NotFound {
            path: path.to_path_buf(),
        }
    }

    /// The missing path, if this is a not-found error.
    pub fn missing_path(&self) -> Option<&Path> {
        match self {
            Self::NotFound { path } => Some(path),
            Self::NotADirectory { .. } => None,
        }
    }
}

/// Finds the first [`GenerateError`] in an error chain.
pub fn find_generate_error(err: &anyhow::Error) -> Option<&GenerateError> {
    err.chain().find_map(|cause| cause.downcast_ref::<GenerateError>())
}
