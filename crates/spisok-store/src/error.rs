use std::path::PathBuf;
use thiserror::Error;

use spisok_scheduler::ReminderId;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access reminder store at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("reminder store at {path:?} is not valid JSON: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize reminders: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("no reminder with id {0}")]
    NotFound(ReminderId),

    #[error("invalid reminder: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
