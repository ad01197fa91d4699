//! Running a store on its own tokio task
//!
//! [`Store::spawn`](crate::Store::spawn) moves the store onto a task that
//! processes its inbox until stopped:
//! - the task is the only writer of the state
//! - callers talk to it through a clonable [`StoreHandle`]
//! - state is read from the latest published snapshot, without waiting on the task
//!
//! [`RunningStore::stop`] asks the task to finish what was queued before the
//! stop request and hands the store back. Dropping the `RunningStore` instead
//! aborts the task: the store, its effect subscriptions and its inbox go away,
//! and handles left behind see a closed store.

use crate::action::Action;
use crate::dispatcher::{Dispatcher, Envelope};
use crate::effect::{EffectHandle, Effects};
use crate::error::StoreError;
use crate::interceptor::Interceptor;
use crate::reducer::Reducer;
use crate::selector::Selector;
use crate::state::{Snapshot, StateReader};
use crate::store::Store;
use futures::stream::BoxStream;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Clonable access to a spawned store
pub struct StoreHandle<S, A> {
    dispatcher: Dispatcher<S, A>,
    reader: StateReader<S>,
}

impl<S, A> StoreHandle<S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    /// Queue an action; it is processed after everything queued before it
    pub fn dispatch(&self, action: A) {
        self.dispatcher.dispatch(action);
    }

    pub fn dispatcher(&self) -> &Dispatcher<S, A> {
        &self.dispatcher
    }

    pub fn reader(&self) -> &StateReader<S> {
        &self.reader
    }

    pub fn state(&self) -> Arc<S> {
        self.reader.state()
    }

    pub fn snapshot(&self) -> Snapshot<S> {
        self.reader.snapshot()
    }

    pub fn select_current<V>(&self, selector: &Selector<S, V>) -> V
    where
        V: Clone + Send + Sync + 'static,
    {
        self.reader.select_current(selector)
    }

    pub fn select<V>(&self, selector: &Selector<S, V>) -> BoxStream<'static, V>
    where
        V: Clone + Send + Sync + 'static,
    {
        self.reader.select(selector)
    }

    pub fn project<V>(&self, projection: impl FnOnce(&S) -> V) -> V {
        self.reader.project(projection)
    }

    /// Append a reducer once the store reaches this request
    pub fn register_reducer(
        &self,
        reducer: impl Reducer<S, A> + 'static,
    ) -> Result<(), StoreError> {
        self.dispatcher.send(Envelope::Reducer(Box::new(reducer)))
    }

    /// Append an interceptor once the store reaches this request
    pub fn register_interceptor(
        &self,
        interceptor: impl Interceptor<S, A> + 'static,
    ) -> Result<(), StoreError> {
        self.dispatcher
            .send(Envelope::Interceptor(Box::new(interceptor)))
    }

    /// Register effects on the running store
    ///
    /// Resolves once the store has subscribed them; actions queued after this
    /// call returns are seen by the new effects.
    pub async fn register_effects(
        &self,
        factory: impl Effects<S, A> + 'static,
    ) -> Result<Vec<EffectHandle>, StoreError> {
        let (reply, response) = oneshot::channel();
        self.dispatcher
            .send(Envelope::Effects(Box::new(factory), reply))?;
        response.await.map_err(|_| StoreError::StoreStopped)?
    }
}

impl<S, A> Clone for StoreHandle<S, A> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
            reader: self.reader.clone(),
        }
    }
}

impl<S, A> std::fmt::Debug for StoreHandle<S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreHandle")
            .field("version", &self.reader.version())
            .field("closed", &self.dispatcher.is_closed())
            .finish()
    }
}

/// A store running on its own task
///
/// Owns the task: dropping it without [`RunningStore::stop`] aborts the store.
pub struct RunningStore<S, A> {
    handle: StoreHandle<S, A>,
    task: Option<JoinHandle<Store<S, A>>>,
}

impl<S, A> RunningStore<S, A>
where
    S: Clone + PartialEq + Send + Sync + 'static,
    A: Action,
{
    pub(crate) fn new(
        dispatcher: Dispatcher<S, A>,
        reader: StateReader<S>,
        task: JoinHandle<Store<S, A>>,
    ) -> Self {
        Self {
            handle: StoreHandle { dispatcher, reader },
            task: Some(task),
        }
    }

    pub fn handle(&self) -> &StoreHandle<S, A> {
        &self.handle
    }

    /// Process everything queued so far, then stop the task and return the store
    ///
    /// Effects stay subscribed; their outputs wait on the inbox until the
    /// returned store is dispatched to or spawned again.
    pub async fn stop(mut self) -> Result<Store<S, A>, StoreError> {
        self.handle.dispatcher.send(Envelope::Stop)?;
        let task = self.task.take().ok_or(StoreError::StoreStopped)?;
        task.await.map_err(|e| {
            log::error!("Store task failed: {}", e);
            StoreError::StoreStopped
        })
    }
}

impl<S, A> Drop for RunningStore<S, A> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            log::debug!("RunningStore dropped without stop, aborting store task");
            task.abort();
        }
    }
}

impl<S, A> std::fmt::Debug for RunningStore<S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunningStore")
            .field("handle", &self.handle)
            .field(
                "finished",
                &self.task.as_ref().is_none_or(JoinHandle::is_finished),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::{ActionStream, Effect, EffectContext};
    use futures::StreamExt;
    use pretty_assertions::assert_eq;
    use std::borrow::Cow;

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Add(i32),
        Ping,
        Pong,
    }

    impl Action for Op {
        fn name(&self) -> Cow<'_, str> {
            Cow::Owned(format!("{:?}", self))
        }
    }

    fn add(state: i32, op: &Op) -> i32 {
        match op {
            Op::Add(n) => state + n,
            Op::Pong => state + 100,
            Op::Ping => state,
        }
    }

    #[tokio::test]
    async fn test_stop_processes_queued_actions() {
        let running = Store::new(0).with_reducer(add).spawn().unwrap();
        let handle = running.handle().clone();
        for n in 1..=10 {
            handle.dispatch(Op::Add(n));
        }

        let store = running.stop().await.unwrap();
        assert_eq!(*store.state(), 55);
        assert_eq!(*handle.state(), 55);
    }

    #[tokio::test]
    async fn test_registrations_apply_in_queue_order() {
        let running = Store::new(0).spawn().unwrap();
        let handle = running.handle();

        handle.dispatch(Op::Add(1));
        handle.register_reducer(add).unwrap();
        handle.dispatch(Op::Add(2));

        let store = running.stop().await.unwrap();
        assert_eq!(*store.state(), 2);
    }

    #[tokio::test]
    async fn test_register_effects_on_running_store() {
        let running = Store::new(0).with_reducer(add).spawn().unwrap();
        let handle = running.handle().clone();

        let handles = handle
            .register_effects(|_: &EffectContext<i32, Op>| {
                vec![Effect::dispatching_one(|actions: ActionStream<Op>| {
                    actions
                        .filter(|op| futures::future::ready(*op == Op::Ping))
                        .map(|_| Op::Pong)
                })]
            })
            .await
            .unwrap();
        assert_eq!(handles.len(), 1);

        let mut values = handle.select(&Selector::new(|s: &i32| *s));
        assert_eq!(values.next().await, Some(0));
        handle.dispatch(Op::Ping);
        assert_eq!(values.next().await, Some(100));

        running.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_handle_after_stop_reports_stopped() {
        let running = Store::new(0).with_reducer(add).spawn().unwrap();
        let handle = running.handle().clone();
        let store = running.stop().await.unwrap();
        drop(store);

        assert_eq!(
            handle.register_reducer(add).unwrap_err(),
            StoreError::StoreStopped
        );
        let result = handle
            .register_effects(|_: &EffectContext<i32, Op>| Vec::<Effect<Op>>::new())
            .await;
        assert_eq!(result.unwrap_err(), StoreError::StoreStopped);
    }

    #[test]
    fn test_spawn_without_runtime_fails() {
        let result = Store::<i32, Op>::new(0).spawn();
        assert_eq!(result.unwrap_err(), StoreError::NoRuntime);
    }

    #[tokio::test]
    async fn test_dropping_running_store_aborts_it() {
        let running = Store::new(0).with_reducer(add).spawn().unwrap();
        let handle = running.handle().clone();
        let effects = handle
            .register_effects(|_: &EffectContext<i32, Op>| {
                vec![Effect::non_dispatching(|actions: ActionStream<Op>| actions)]
            })
            .await
            .unwrap();
        let mut values = handle.select(&Selector::new(|s: &i32| *s));
        assert_eq!(values.next().await, Some(0));

        drop(running);
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        assert!(handle.dispatcher().is_closed());
        assert!(!effects[0].is_active());
        assert_eq!(values.next().await, None);
        assert_eq!(
            handle.register_reducer(add).unwrap_err(),
            StoreError::StoreStopped
        );
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Push {
        source: u32,
        seq: u32,
    }

    impl Action for Push {
        fn name(&self) -> Cow<'_, str> {
            Cow::Borrowed("Push")
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_dispatchers_are_serialized() {
        const SOURCES: u32 = 4;
        const PER_SOURCE: u32 = 50;

        let transitions = Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen = Arc::clone(&transitions);
        let running = Store::new(Vec::<(u32, u32)>::new())
            .with_reducer(|mut log: Vec<(u32, u32)>, push: &Push| {
                log.push((push.source, push.seq));
                log
            })
            .with_interceptor(move |_: &Push, old: &Vec<(u32, u32)>, new: &Vec<(u32, u32)>| {
                seen.lock().unwrap().push((old.clone(), new.clone()));
            })
            .spawn()
            .unwrap();

        let tasks: Vec<_> = (0..SOURCES)
            .map(|source| {
                let handle = running.handle().clone();
                tokio::spawn(async move {
                    for seq in 0..PER_SOURCE {
                        handle.dispatch(Push { source, seq });
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let store = running.stop().await.unwrap();
        let log = store.state();
        assert_eq!(log.len(), (SOURCES * PER_SOURCE) as usize);

        // Every source's actions were applied in the order it sent them
        for source in 0..SOURCES {
            let seqs: Vec<u32> = log
                .iter()
                .filter(|(s, _)| *s == source)
                .map(|(_, seq)| *seq)
                .collect();
            assert_eq!(seqs, (0..PER_SOURCE).collect::<Vec<_>>());
        }

        // Each transition starts from the state the previous one produced
        let transitions = transitions.lock().unwrap();
        assert_eq!(transitions.len(), log.len());
        assert!(transitions[0].0.is_empty());
        for pair in transitions.windows(2) {
            assert_eq!(pair[1].0, pair[0].1);
            assert_eq!(pair[1].1.len(), pair[1].0.len() + 1);
        }
    }
}
