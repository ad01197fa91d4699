//! Errors surfaced by the store

use thiserror::Error;

/// Errors that can occur when wiring up or talking to a store.
///
/// Dispatching never fails; these only cover registration and lookup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No store is registered under the requested key.
    #[error("No store registered for {key}")]
    NotFound { key: String },

    /// Effects were registered outside of a tokio runtime.
    #[error("Effects require a running tokio runtime")]
    NoRuntime,

    /// The store task has stopped and no longer accepts messages.
    #[error("Store has stopped")]
    StoreStopped,
}
