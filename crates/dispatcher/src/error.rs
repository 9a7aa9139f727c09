//! Dispatcher error types

use std::time::Duration;

use thiserror::Error;

use contracts::ProcessError;

/// Text carried by [`DispatchError::Overload`]
pub const OVERLOAD_MESSAGE: &str = "blocked";

/// Slicing errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BatchingError {
    /// Capacity of zero cannot make progress on a non-empty input
    #[error("capacity is zero, {len} items cannot be sliced")]
    ZeroCapacity { len: usize },
}

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The pacing window elapsed before every batch was sent
    #[error("blocked")]
    Overload {
        sent: usize,
        total: usize,
        elapsed: Duration,
        period: Duration,
    },

    /// The processor declared zero capacity for a non-empty submission
    #[error("processor '{processor}' declares zero capacity, {items} items cannot be sent")]
    ZeroCapacity { processor: String, items: usize },

    /// Processor failure, passed through verbatim
    #[error(transparent)]
    Processor(#[from] ProcessError),

    /// The queued dispatcher's run loop is gone
    #[error("dispatcher is shut down")]
    Closed,
}

impl DispatchError {
    /// Create a zero capacity error
    pub fn zero_capacity(processor: impl Into<String>, items: usize) -> Self {
        Self::ZeroCapacity {
            processor: processor.into(),
            items,
        }
    }

    /// True for the "try again later" condition
    pub fn is_overload(&self) -> bool {
        matches!(self, Self::Overload { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overload_message_is_stable() {
        let err = DispatchError::Overload {
            sent: 1,
            total: 2,
            elapsed: Duration::from_millis(1),
            period: Duration::from_millis(1),
        };
        assert_eq!(err.to_string(), OVERLOAD_MESSAGE);
        assert!(err.is_overload());
    }

    #[test]
    fn test_processor_error_is_verbatim() {
        let inner = ProcessError::rejected("demo", "disk full");
        let err = DispatchError::from(inner.clone());
        assert_eq!(err.to_string(), inner.to_string());
        assert!(!err.is_overload());
    }
}
