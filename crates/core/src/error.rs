use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MoveError {
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to move {from} to {to}: {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
#[error("keyword extraction failed for '{input}': {reason}")]
pub struct KeywordExtractionError {
    pub input: String,
    pub reason: String,
}

impl KeywordExtractionError {
    pub fn new(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RemoteError {
    /// Fatal: the whole sync run stops when the session cannot be used.
    #[error("remote authentication failed: {0}")]
    Auth(String),
    #[error("remote {operation} failed: {message}")]
    Api {
        operation: String,
        message: String,
        transient: bool,
    },
}

impl RemoteError {
    pub fn api(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            operation: operation.into(),
            message: message.into(),
            transient: false,
        }
    }

    pub fn transient(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            operation: operation.into(),
            message: message.into(),
            transient: true,
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Api {
                transient: true,
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::RemoteError;

    #[test]
    fn only_transient_api_errors_are_retryable() {
        assert!(RemoteError::transient("upload", "HTTP 503").is_transient());
        assert!(!RemoteError::api("upload", "HTTP 400").is_transient());
        assert!(!RemoteError::Auth("token rejected".to_string()).is_transient());
    }
}
