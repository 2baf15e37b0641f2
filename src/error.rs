use std::path::PathBuf;
use thiserror::Error;

/// Result type for per-file processing.
pub type QoeResult<T> = std::result::Result<T, QoeError>;

/// Failures that are contained to a single log file or class.
///
/// A missing file has no variant: the dataset iterator never yields it.
#[derive(Debug, Error)]
pub enum QoeError {
    #[error("malformed row at line {line}: {reason}")]
    MalformedRow { line: usize, reason: String },

    #[error("cannot read {}: {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error while processing {}: {reason}", path.display())]
    Processing { path: PathBuf, reason: String },

    #[error("class {class} has no valid bitrate samples")]
    UndefinedRange { class: u32 },
}

impl QoeError {
    pub fn malformed(line: usize, reason: impl Into<String>) -> Self {
        QoeError::MalformedRow {
            line,
            reason: reason.into(),
        }
    }
}
