use std::path::PathBuf;

use thiserror::Error;

use crate::validation::DraftError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("File contains invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("File does not contain the required 'topic' and 'questions' sections")]
    MissingSections,
    #[error("File does not describe a valid quiz:\n{}", .0.join("\n"))]
    InvalidDocument(Vec<String>),
    #[error("Could not convert data to JSON: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("{0}")]
    InvalidQuestion(#[from] DraftError),
    #[error("No question with number {0}")]
    NoSuchQuestion(usize),
    #[error("Select a question first")]
    NothingSelected,
    #[error("No file name yet, use save-as")]
    NoFilePath,
    #[error("Question {0} has no sequence entry at position {1}")]
    NoSuchSequenceEntry(usize, usize),
    #[error("Question {0} is not a sequence question")]
    NotASequence(usize),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("Topic with ID {0} already exists, use the update option")]
    TopicExists(i64),
    #[error("Topic with ID {0} not found")]
    TopicNotFound(i64),
    #[error("Data has errors and cannot be imported:\n{}", .0.join("\n"))]
    ImportRejected(Vec<String>),
    #[error("'{0}' only works inside the shell")]
    ShellOnly(&'static str),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_failures_outside_file_reads_are_not_called_invalid_json() {
        let source = serde_json::from_str::<u8>("\"x\"").unwrap_err();
        let message = Error::from(source).to_string();
        assert!(message.starts_with("Could not convert data to JSON"));
        assert!(!message.contains("invalid JSON"));
    }
}
