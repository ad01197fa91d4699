//! Store - holds the state and runs the dispatch pipeline
//!
//! ```text
//! dispatch(action)
//!     │
//!     ▼
//! reducers (folded in registration order)
//!     │
//!     ▼
//! state replaced ──► interceptors (action, old, new), in registration order
//!     │
//!     ├──► state subscribers (select / select_current)
//!     └──► action stream ──► effects ──► Dispatcher ──► inbox ──┐
//!                                                                │
//!          dispatch(next) ◄──────────────────────────────────────┘
//! ```
//!
//! A `Store` is an owned value: only `&mut self` can dispatch, so there is
//! exactly one writer. Everything else (effects, other tasks) sends actions
//! to the store's inbox through a [`Dispatcher`]; the inbox is drained one
//! message at a time, never by recursing into the pipeline.

use crate::action::Action;
use crate::dispatcher::{Dispatcher, Envelope};
use crate::effect::{EffectContext, EffectHandle, Effects, Subscription};
use crate::error::StoreError;
use crate::interceptor::Interceptor;
use crate::reducer::Reducer;
use crate::runtime::RunningStore;
use crate::selector::Selector;
use crate::state::{Snapshot, StateReader, Version};
use futures::stream::BoxStream;
use statehouse_config::StoreConfig;
use std::ops::ControlFlow;
use tokio::sync::{mpsc, watch};

/// Store - holds application state and manages the dispatch loop
pub struct Store<S, A> {
    snapshot: Snapshot<S>,
    reducers: Vec<Box<dyn Reducer<S, A>>>,
    interceptors: Vec<Box<dyn Interceptor<S, A>>>,
    subscriptions: Vec<Subscription<A>>,
    state_tx: watch::Sender<Snapshot<S>>,
    dispatcher: Dispatcher<S, A>,
    inbox: mpsc::UnboundedReceiver<Envelope<S, A>>,
    config: StoreConfig,
}

impl<S, A> Store<S, A>
where
    S: Clone + PartialEq + Send + Sync + 'static,
    A: Action,
{
    pub fn new(initial_state: S) -> Self {
        Self::with_config(initial_state, StoreConfig::default())
    }

    pub fn with_config(initial_state: S, config: StoreConfig) -> Self {
        let snapshot = Snapshot::new(initial_state);
        let (state_tx, _) = watch::channel(snapshot.clone());
        let (tx, inbox) = mpsc::unbounded_channel();

        Self {
            snapshot,
            reducers: Vec::new(),
            interceptors: Vec::new(),
            subscriptions: Vec::new(),
            state_tx,
            dispatcher: Dispatcher::new(tx),
            inbox,
            config,
        }
    }

    /// Builder form of [`Store::register_reducer`]
    pub fn with_reducer(mut self, reducer: impl Reducer<S, A> + 'static) -> Self {
        self.register_reducer(reducer);
        self
    }

    /// Builder form of [`Store::register_interceptor`]
    pub fn with_interceptor(mut self, interceptor: impl Interceptor<S, A> + 'static) -> Self {
        self.register_interceptor(interceptor);
        self
    }

    /// Append a reducer; it takes part in every following dispatch
    pub fn register_reducer(&mut self, reducer: impl Reducer<S, A> + 'static) {
        self.reducers.push(Box::new(reducer));
    }

    /// Append an interceptor; it observes every following dispatch
    pub fn register_interceptor(&mut self, interceptor: impl Interceptor<S, A> + 'static) {
        self.interceptors.push(Box::new(interceptor));
    }

    /// Instantiate `factory` and subscribe each of its effects to the action stream
    ///
    /// Requires a tokio runtime; the effects run as tasks on it.
    pub fn register_effects(
        &mut self,
        factory: impl Effects<S, A> + 'static,
    ) -> Result<Vec<EffectHandle>, StoreError> {
        self.register_boxed_effects(&factory)
    }

    fn register_boxed_effects(
        &mut self,
        factory: &dyn Effects<S, A>,
    ) -> Result<Vec<EffectHandle>, StoreError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| StoreError::NoRuntime)?;
        let ctx = EffectContext::new(self.reader(), self.dispatcher.clone());

        let handles = factory
            .effects(&ctx)
            .into_iter()
            .map(|effect| {
                log::debug!("Registering effect '{}' ({:?})", effect.name(), effect.shape());
                let subscription =
                    Subscription::spawn(effect, self.dispatcher.clone(), &runtime);
                let handle = subscription.handle().clone();
                self.subscriptions.push(subscription);
                handle
            })
            .collect();
        Ok(handles)
    }

    /// Get the current state
    pub fn state(&self) -> &S {
        &self.snapshot.state
    }

    pub fn snapshot(&self) -> Snapshot<S> {
        self.snapshot.clone()
    }

    pub fn version(&self) -> Version {
        self.snapshot.version
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Get the dispatcher feeding this store's inbox
    pub fn dispatcher(&self) -> &Dispatcher<S, A> {
        &self.dispatcher
    }

    /// Read access to the state that stays valid after the store is spawned
    pub fn reader(&self) -> StateReader<S> {
        StateReader::new(self.state_tx.subscribe())
    }

    /// Handles of all effect subscriptions, in registration order
    pub fn effects(&self) -> Vec<EffectHandle> {
        self.subscriptions
            .iter()
            .map(|subscription| subscription.handle().clone())
            .collect()
    }

    /// Tear down and drop every effect subscription
    pub fn teardown_effects(&mut self) {
        self.subscriptions.clear();
    }

    /// Value of `selector` for the current state (memoized by version)
    pub fn select_current<V>(&self, selector: &Selector<S, V>) -> V
    where
        V: Clone + Send + Sync + 'static,
    {
        selector.map(&self.snapshot.state, self.snapshot.version)
    }

    /// Apply an unmemoized projection to the current state
    pub fn project<V>(&self, projection: impl FnOnce(&S) -> V) -> V {
        projection(&self.snapshot.state)
    }

    /// Live view of `selector`, one value per state transition
    pub fn select<V>(&self, selector: &Selector<S, V>) -> BoxStream<'static, V>
    where
        V: Clone + Send + Sync + 'static,
    {
        self.reader().select(selector)
    }

    /// Process an action through reducers, interceptors and subscribers
    ///
    /// Anything already waiting on the inbox (actions dispatched by
    /// interceptors or effects, late registrations) is processed right after,
    /// in arrival order.
    pub fn dispatch(&mut self, action: A) {
        self.apply(action);
        self.drain();
    }

    /// Process everything currently waiting on the inbox without blocking
    pub fn drain(&mut self) {
        while let Ok(envelope) = self.inbox.try_recv() {
            if self.handle(envelope).is_break() {
                log::debug!("Ignoring stop request, store is not running on a task");
            }
        }
    }

    /// Process the inbox until a stop request arrives
    pub async fn run(mut self) -> Self {
        log::info!("Store started");
        while let Some(envelope) = self.inbox.recv().await {
            if self.handle(envelope).is_break() {
                break;
            }
        }
        log::info!("Store stopped");
        self
    }

    /// Move the store onto its own tokio task
    pub fn spawn(self) -> Result<RunningStore<S, A>, StoreError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| StoreError::NoRuntime)?;
        let reader = self.reader();
        let dispatcher = self.dispatcher.clone();
        let task = runtime.spawn(self.run());
        Ok(RunningStore::new(dispatcher, reader, task))
    }

    fn handle(&mut self, envelope: Envelope<S, A>) -> ControlFlow<()> {
        match envelope {
            Envelope::Action(action) => self.apply(action),
            Envelope::Reducer(reducer) => self.reducers.push(reducer),
            Envelope::Interceptor(interceptor) => self.interceptors.push(interceptor),
            Envelope::Effects(factory, reply) => {
                let result = self.register_boxed_effects(factory.as_ref());
                if let Err(ref e) = result {
                    log::error!("Failed to register effects: {}", e);
                }
                // The caller may have stopped waiting
                let _ = reply.send(result);
            }
            Envelope::Stop => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    fn apply(&mut self, action: A) {
        let old = self.snapshot.clone();
        let next = self
            .reducers
            .iter()
            .fold(S::clone(&old.state), |state, reducer| {
                reducer.reduce(state, &action)
            });

        // An unchanged state keeps its version, so selectors stay cached
        let new = if next == *old.state {
            old.clone()
        } else {
            Snapshot::new(next)
        };
        log::trace!(
            "Reduced '{}': {} -> {}",
            action.name(),
            old.version,
            new.version
        );
        self.snapshot = new.clone();

        for interceptor in &mut self.interceptors {
            interceptor.on_dispatch(&action, &old.state, &new.state);
        }

        if new.version != old.version {
            self.state_tx.send_replace(new);
        }
        // Effects see every action, in dispatch order
        if let Some((last, rest)) = self.subscriptions.split_last() {
            for subscription in rest {
                subscription.push(action.clone());
            }
            last.push(action);
        }
    }
}

impl<S, A> std::fmt::Debug for Store<S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("version", &self.snapshot.version)
            .field("reducers", &self.reducers.len())
            .field("interceptors", &self.interceptors.len())
            .field("effects", &self.subscriptions.len())
            .finish()
    }
}
