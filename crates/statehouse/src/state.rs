//! State snapshots and version tokens

use crate::selector::Selector;
use futures::StreamExt;
use futures::stream::BoxStream;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

static NEXT_VERSION: AtomicU64 = AtomicU64::new(1);

/// Identity of one state snapshot
///
/// Versions are drawn from a process-wide counter, so two stores never hand
/// out the same token and a selector shared between them cannot serve a value
/// computed for the other store's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version(u64);

impl Version {
    /// Allocate a fresh, never used version
    pub fn next() -> Self {
        Self(NEXT_VERSION.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Read-only view of the store state at one version
#[derive(Debug)]
pub struct Snapshot<S> {
    pub version: Version,
    pub state: Arc<S>,
}

impl<S> Snapshot<S> {
    pub fn new(state: S) -> Self {
        Self {
            version: Version::next(),
            state: Arc::new(state),
        }
    }
}

// Manual impl: cloning a snapshot never requires `S: Clone`
impl<S> Clone for Snapshot<S> {
    fn clone(&self) -> Self {
        Self {
            version: self.version,
            state: Arc::clone(&self.state),
        }
    }
}

/// Shared read access to a store's state
///
/// Readers never block the store: they observe the latest published snapshot.
pub struct StateReader<S> {
    rx: watch::Receiver<Snapshot<S>>,
}

impl<S> StateReader<S> {
    pub(crate) fn new(rx: watch::Receiver<Snapshot<S>>) -> Self {
        Self { rx }
    }

    /// The latest published snapshot
    pub fn snapshot(&self) -> Snapshot<S> {
        self.rx.borrow().clone()
    }

    pub fn state(&self) -> Arc<S> {
        Arc::clone(&self.rx.borrow().state)
    }

    pub fn version(&self) -> Version {
        self.rx.borrow().version
    }

    /// Apply an unmemoized projection to the current state
    pub fn project<V>(&self, projection: impl FnOnce(&S) -> V) -> V {
        projection(&self.state())
    }
}

impl<S> StateReader<S>
where
    S: Send + Sync + 'static,
{
    /// Value of `selector` for the current state
    pub fn select_current<V>(&self, selector: &Selector<S, V>) -> V
    where
        V: Clone + Send + Sync + 'static,
    {
        let snapshot = self.snapshot();
        selector.map(&snapshot.state, snapshot.version)
    }

    /// Live view of `selector`
    ///
    /// Yields the value for the current state first, then one value per
    /// observed state transition. A slow consumer sees the latest snapshot,
    /// intermediate ones may be skipped. Every call starts a new, independent
    /// stream; it ends when the store is dropped.
    pub fn select<V>(&self, selector: &Selector<S, V>) -> BoxStream<'static, V>
    where
        V: Clone + Send + Sync + 'static,
    {
        let mut rx = self.rx.clone();
        rx.mark_changed();
        let selector = selector.clone();

        futures::stream::unfold((rx, selector), |(mut rx, selector)| async move {
            rx.changed().await.ok()?;
            let snapshot = rx.borrow_and_update().clone();
            let value = selector.map(&snapshot.state, snapshot.version);
            Some((value, (rx, selector)))
        })
        .boxed()
    }
}

impl<S> Clone for StateReader<S> {
    fn clone(&self) -> Self {
        Self {
            rx: self.rx.clone(),
        }
    }
}

impl<S> fmt::Debug for StateReader<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateReader")
            .field("version", &self.version())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[test]
    fn test_versions_are_unique_and_increasing() {
        let a = Version::next();
        let b = Version::next();
        assert!(b > a);
        assert_ne!(a, b);
    }

    #[test]
    fn test_snapshot_clone_shares_state() {
        let snapshot = Snapshot::new(vec![1, 2, 3]);
        let copy = snapshot.clone();
        assert_eq!(copy.version, snapshot.version);
        assert!(Arc::ptr_eq(&copy.state, &snapshot.state));
    }

    #[tokio::test]
    async fn test_select_starts_with_current_value() {
        let (tx, rx) = watch::channel(Snapshot::new(2));
        let reader = StateReader::new(rx);
        let double = Selector::new(|n: &i32| n * 2);

        let mut values = reader.select(&double);
        assert_eq!(values.next().await, Some(4));

        tx.send_replace(Snapshot::new(5));
        assert_eq!(values.next().await, Some(10));
        assert_eq!(reader.select_current(&double), 10);

        drop(tx);
        assert_eq!(values.next().await, None);
    }

    #[tokio::test]
    async fn test_select_is_restartable() {
        let (_tx, rx) = watch::channel(Snapshot::new(3));
        let reader = StateReader::new(rx);
        let identity = Selector::new(|n: &i32| *n);

        let first: Vec<i32> = reader.select(&identity).take(1).collect().await;
        let second: Vec<i32> = reader.select(&identity).take(1).collect().await;
        assert_eq!(first, vec![3]);
        assert_eq!(second, vec![3]);
        assert_eq!(reader.project(|n| n + 1), 4);
    }
}
