//! Processor error definitions

use thiserror::Error;

/// Failure reported by a processor
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProcessError {
    /// The processor refused or failed to handle the batch
    #[error("processor '{processor}' rejected batch: {message}")]
    Rejected { processor: String, message: String },

    /// The processing context was cancelled before the batch completed
    #[error("processor '{processor}' cancelled")]
    Cancelled { processor: String },

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ProcessError {
    /// Create a rejection error
    pub fn rejected(processor: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rejected {
            processor: processor.into(),
            message: message.into(),
        }
    }

    /// Create a cancellation error
    pub fn cancelled(processor: impl Into<String>) -> Self {
        Self::Cancelled {
            processor: processor.into(),
        }
    }
}
