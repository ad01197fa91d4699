//! Test hooks for selectors
//!
//! Only compiled for tests and with the `test-support` feature, so production
//! builds cannot pin selector values.

use crate::selector::{CacheToken, Cached, Selector};
use std::sync::atomic::Ordering;
use std::sync::PoisonError;

/// Override the value a selector produces
pub trait SelectorOverride<V> {
    /// Pin `value`: every evaluation returns it, whatever the state or version
    ///
    /// Composed selectors downstream see the pinned value as their input,
    /// including ones that already cached a value for the current version.
    fn mock_result(&self, value: V);

    /// Drop the pinned value; the next evaluation recomputes
    fn clear_mock_result(&self);

    fn is_mocked(&self) -> bool;
}

impl<S, V> SelectorOverride<V> for Selector<S, V>
where
    S: 'static,
    V: Clone + Send + Sync + 'static,
{
    fn mock_result(&self, value: V) {
        let mut cache = self
            .inner
            .cache
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *cache = Some(Cached {
            token: CacheToken::Pinned,
            stamp: 0,
            value,
        });
        self.inner.overrides.fetch_add(1, Ordering::AcqRel);
    }

    fn clear_mock_result(&self) {
        let mut cache = self
            .inner
            .cache
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *cache = None;
        self.inner.overrides.fetch_add(1, Ordering::AcqRel);
    }

    fn is_mocked(&self) -> bool {
        self.inner
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|cached| cached.token == CacheToken::Pinned)
    }
}
