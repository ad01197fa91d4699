use std::time::Duration;
use thiserror::Error;

/// Errors reported by the [`EffectRunner`](crate::EffectRunner)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EffectRunnerError {
    #[error("Expected {expected} actions within {timeout:?}, received {received}")]
    Timeout {
        expected: usize,
        received: usize,
        timeout: Duration,
    },
}
