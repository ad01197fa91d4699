//! RecordingInterceptor - keeps every transition for later assertions

use statehouse::Interceptor;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;

/// One observed dispatch
#[derive(Debug, Clone, PartialEq)]
pub struct Record<S, A> {
    pub action: A,
    pub old: S,
    pub new: S,
}

struct Recorded<S, A> {
    records: Mutex<Vec<Record<S, A>>>,
    count: watch::Sender<usize>,
}

/// Interceptor recording `(action, old, new)` in dispatch order
///
/// Clones share the recording: install one clone in the store and keep
/// another to inspect.
pub struct RecordingInterceptor<S, A> {
    recorded: Arc<Recorded<S, A>>,
}

impl<S: Clone, A: Clone> RecordingInterceptor<S, A> {
    pub fn new() -> Self {
        Self {
            recorded: Arc::new(Recorded {
                records: Mutex::new(Vec::new()),
                count: watch::Sender::new(0),
            }),
        }
    }

    /// Everything recorded so far
    pub fn records(&self) -> Vec<Record<S, A>> {
        self.lock().clone()
    }

    pub fn actions(&self) -> Vec<A> {
        self.lock().iter().map(|r| r.action.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
        self.recorded.count.send_replace(0);
    }

    /// Wait until at least `count` dispatches were recorded
    ///
    /// Returns false if `timeout` elapses first.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        let mut rx = self.recorded.count.subscribe();
        let reached = tokio::time::timeout(timeout, rx.wait_for(|n| *n >= count)).await;
        matches!(reached, Ok(Ok(_)))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Record<S, A>>> {
        self.recorded
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S: Clone, A: Clone> Default for RecordingInterceptor<S, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, A> Clone for RecordingInterceptor<S, A> {
    fn clone(&self) -> Self {
        Self {
            recorded: Arc::clone(&self.recorded),
        }
    }
}

impl<S, A> Interceptor<S, A> for RecordingInterceptor<S, A>
where
    S: Clone + Send,
    A: Clone + Send,
{
    fn on_dispatch(&mut self, action: &A, old: &S, new: &S) {
        let mut records = self.lock();
        records.push(Record {
            action: action.clone(),
            old: old.clone(),
            new: new.clone(),
        });
        self.recorded.count.send_replace(records.len());
    }
}

impl<S, A> std::fmt::Debug for RecordingInterceptor<S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let len = self
            .recorded
            .records
            .lock()
            .map(|records| records.len())
            .unwrap_or_default();
        f.debug_struct("RecordingInterceptor")
            .field("records", &len)
            .finish()
    }
}
