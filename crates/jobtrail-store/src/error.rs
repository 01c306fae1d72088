use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("corrupt store at {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("failed to replace store file at {path}: {reason}")]
    Persist { path: PathBuf, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::Corrupt {
            path: PathBuf::from("/tmp/meta_jobs.csv"),
            reason: "missing id column".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "corrupt store at /tmp/meta_jobs.csv: missing id column"
        );
    }
}
