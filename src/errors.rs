use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::CategoryId;

/// Error type for mixture configuration, selection, filesystem, and training failures.
#[derive(Debug, Error)]
pub enum MixError {
    /// Invalid settings or an unusable metadata record.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// A category's files cannot reach its byte target.
    #[error(
        "candidate pool for category '{category}' cannot fill {target_bytes} bytes (achieved {achieved_bytes})"
    )]
    PoolExhausted {
        /// Category whose pool ran dry.
        category: CategoryId,
        /// Bytes the category was asked to fill.
        target_bytes: u64,
        /// Bytes selected before giving up.
        achieved_bytes: u64,
    },
    /// An I/O failure tied to a path.
    #[error("filesystem error at '{}': {source}", path.display())]
    Filesystem {
        /// Path the operation touched.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Training or a per-category job failed.
    #[error("tokenizer training for '{target}' failed: {reason}")]
    Training {
        /// Output directory or category the job ran for.
        target: String,
        /// Failure description.
        reason: String,
    },
}

impl MixError {
    /// Build a closure that wraps an `io::Error` with the path it occurred at.
    pub(crate) fn at(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> MixError {
        let path = path.into();
        move |source| MixError::Filesystem { path, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filesystem_errors_name_the_path() {
        let err = MixError::at("/data/web/a.txt")(io::Error::new(
            io::ErrorKind::NotFound,
            "gone",
        ));
        let message = err.to_string();
        assert!(message.contains("/data/web/a.txt"));
        assert!(message.contains("gone"));
    }

    #[test]
    fn pool_exhaustion_reports_category_and_target() {
        let err = MixError::PoolExhausted {
            category: "code".to_string(),
            target_bytes: 120,
            achieved_bytes: 0,
        };
        assert_eq!(
            err.to_string(),
            "candidate pool for category 'code' cannot fill 120 bytes (achieved 0)"
        );
    }
}
