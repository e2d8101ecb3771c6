// Error types for the extraction layer

use std::fmt;

use thiserror::Error;

use super::traits::ApiVersion;

#[derive(Debug, Clone, Error)]
pub enum DownloadError {
    /// Bridge interpreter or script could not be started
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Bridge process ran but exited unsuccessfully
    #[error("Execution error: {0}")]
    Execution(String),

    /// Bridge output was not a valid response envelope
    #[error("Parse error: {0}")]
    Parse(String),

    /// Bridge call exceeded the configured timeout
    #[error("Timed out after {0}s")]
    Timeout(u64),

    /// Extraction library answered with `status: "error"`
    #[error("{0}")]
    Upstream(String),

    /// Every extraction version was tried and none succeeded
    #[error("All download methods failed: {}", FailureList(.0))]
    AllVersionsFailed(Vec<VersionFailure>),
}

impl DownloadError {
    /// Messages of every failed attempt, in the order they were tried
    pub fn failure_messages(&self) -> Vec<&str> {
        match self {
            Self::AllVersionsFailed(failures) => {
                failures.iter().map(|f| f.message.as_str()).collect()
            }
            _ => Vec::new(),
        }
    }
}

/// One failed extraction attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionFailure {
    pub version: ApiVersion,
    pub message: String,
}

impl VersionFailure {
    pub fn new(version: ApiVersion, message: impl Into<String>) -> Self {
        Self {
            version,
            message: message.into(),
        }
    }
}

struct FailureList<'a>(&'a [VersionFailure]);

impl fmt::Display for FailureList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", failure.message)?;
        }
        Ok(())
    }
}
