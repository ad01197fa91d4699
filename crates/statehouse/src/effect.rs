//! Effects - asynchronous transformers from dispatched actions to new actions
//!
//! An effect receives the stream of every action dispatched after it was
//! registered and turns it into a stream of outputs. Each subscription has its
//! own unbounded queue, so a slow effect falls behind but never misses an
//! action. Its shape decides what the
//! store does with those outputs:
//!
//! - [`EffectShape::DispatchOne`]: every output is one action, dispatched as is
//! - [`EffectShape::DispatchMany`]: every output is a batch, dispatched in order
//! - [`EffectShape::NonDispatching`]: outputs are ignored, the effect only
//!   exists for its side effects
//!
//! ```
//! use futures::StreamExt;
//! use statehouse::{ActionTemplate, AnonymousAction, Effect};
//!
//! static FETCH: ActionTemplate = ActionTemplate::new("Fetch");
//! static FETCHED: ActionTemplate<String> = ActionTemplate::with_payload("FetchSucceeded");
//!
//! let effect: Effect<AnonymousAction> = Effect::dispatching_one(|actions| {
//!     actions
//!         .filter(|action| futures::future::ready(FETCH.matches(action)))
//!         .then(|_| async { FETCHED.create_with("payload".to_string()) })
//! })
//! .named("fetch");
//! ```
//!
//! Each registered effect runs on its own tokio task. Outputs go back through
//! the store's [`Dispatcher`], so they are reduced one at a time like any
//! other action.

use crate::dispatcher::Dispatcher;
use crate::state::StateReader;
use futures::StreamExt;
use futures::stream::{BoxStream, Stream};
use std::borrow::Cow;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;

/// Stream of actions dispatched to a store, as seen by one effect
pub type ActionStream<A> = BoxStream<'static, A>;

type Connect<A> = Box<dyn FnOnce(ActionStream<A>) -> BoxStream<'static, Vec<A>> + Send>;

/// How the store re-injects an effect's outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectShape {
    DispatchOne,
    DispatchMany,
    NonDispatching,
}

/// An unconnected effect
pub struct Effect<A> {
    name: Cow<'static, str>,
    shape: EffectShape,
    connect: Connect<A>,
}

impl<A: Send + 'static> Effect<A> {
    /// Effect producing exactly one action per output
    pub fn dispatching_one<F, St>(effect: F) -> Self
    where
        F: FnOnce(ActionStream<A>) -> St + Send + 'static,
        St: Stream<Item = A> + Send + 'static,
    {
        Self {
            name: Cow::Borrowed("dispatching-one"),
            shape: EffectShape::DispatchOne,
            connect: Box::new(move |actions| effect(actions).map(|action| vec![action]).boxed()),
        }
    }

    /// Effect producing a batch of actions per output
    pub fn dispatching_many<F, St>(effect: F) -> Self
    where
        F: FnOnce(ActionStream<A>) -> St + Send + 'static,
        St: Stream<Item = Vec<A>> + Send + 'static,
    {
        Self {
            name: Cow::Borrowed("dispatching-many"),
            shape: EffectShape::DispatchMany,
            connect: Box::new(move |actions| effect(actions).boxed()),
        }
    }

    /// Effect that only performs side effects
    ///
    /// Whatever the stream yields is discarded; each item marks one completed
    /// unit of work.
    pub fn non_dispatching<F, St, T>(effect: F) -> Self
    where
        F: FnOnce(ActionStream<A>) -> St + Send + 'static,
        St: Stream<Item = T> + Send + 'static,
        T: Send + 'static,
    {
        Self {
            name: Cow::Borrowed("non-dispatching"),
            shape: EffectShape::NonDispatching,
            connect: Box::new(move |actions| effect(actions).map(|_| Vec::new()).boxed()),
        }
    }

    /// Give the effect a name for logs and handles
    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> EffectShape {
        self.shape
    }

    /// Wire the effect to an action stream
    ///
    /// The returned stream yields the actions to dispatch, grouped per output:
    /// one-element batches for dispatching-one effects and empty batches for
    /// non-dispatching ones.
    pub fn connect(self, actions: ActionStream<A>) -> BoxStream<'static, Vec<A>> {
        (self.connect)(actions)
    }
}

impl<A> std::fmt::Debug for Effect<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effect")
            .field("name", &self.name)
            .field("shape", &self.shape)
            .finish()
    }
}

/// What an effects factory gets to see of the store
pub struct EffectContext<S, A> {
    state: StateReader<S>,
    dispatcher: Dispatcher<S, A>,
}

impl<S, A> EffectContext<S, A> {
    pub(crate) fn new(state: StateReader<S>, dispatcher: Dispatcher<S, A>) -> Self {
        Self { state, dispatcher }
    }

    /// Read access to the store's current state
    pub fn state(&self) -> &StateReader<S> {
        &self.state
    }

    /// Dispatcher for effects that need to dispatch outside their output stream
    pub fn dispatcher(&self) -> &Dispatcher<S, A> {
        &self.dispatcher
    }
}

/// Factory for the effects of one feature
///
/// Called once at registration; every returned effect gets its own
/// subscription to the action stream.
pub trait Effects<S, A>: Send {
    fn effects(&self, ctx: &EffectContext<S, A>) -> Vec<Effect<A>>;
}

impl<S, A, F> Effects<S, A> for F
where
    F: Fn(&EffectContext<S, A>) -> Vec<Effect<A>> + Send,
{
    fn effects(&self, ctx: &EffectContext<S, A>) -> Vec<Effect<A>> {
        self(ctx)
    }
}

struct Gate {
    open: RwLock<bool>,
    closed: Notify,
}

/// Handle to one live effect subscription
///
/// Clones refer to the same subscription.
#[derive(Clone)]
pub struct EffectHandle {
    name: Cow<'static, str>,
    shape: EffectShape,
    gate: Arc<Gate>,
}

impl EffectHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> EffectShape {
        self.shape
    }

    pub fn is_active(&self) -> bool {
        *self.gate.open.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stop the subscription
    ///
    /// Once this returns, the effect dispatches nothing anymore. Actions it
    /// handed to the store before are still processed.
    pub fn teardown(&self) {
        let mut open = self.gate.open.write().unwrap_or_else(PoisonError::into_inner);
        if *open {
            *open = false;
            self.gate.closed.notify_one();
            log::debug!("Effect '{}' torn down", self.name);
        }
    }

    /// Dispatch a batch unless the subscription was torn down
    fn forward<S, A>(&self, batch: Vec<A>, dispatcher: &Dispatcher<S, A>) -> bool {
        // Held across the sends, so teardown cannot complete in between
        let open = self.gate.open.read().unwrap_or_else(PoisonError::into_inner);
        if !*open {
            return false;
        }
        for action in batch {
            dispatcher.dispatch(action);
        }
        true
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("name", &self.name)
            .field("shape", &self.shape)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Effect subscription owned by a store; dropping it tears the effect down
pub(crate) struct Subscription<A> {
    handle: EffectHandle,
    actions: mpsc::UnboundedSender<A>,
    task: JoinHandle<()>,
}

impl<A: Send + 'static> Subscription<A> {
    /// Connect `effect` to a fresh action queue and drive it on `runtime`
    pub(crate) fn spawn<S: 'static>(
        effect: Effect<A>,
        dispatcher: Dispatcher<S, A>,
        runtime: &tokio::runtime::Handle,
    ) -> Self {
        let (actions, rx) = mpsc::unbounded_channel();
        let handle = EffectHandle {
            name: effect.name.clone(),
            shape: effect.shape,
            gate: Arc::new(Gate {
                open: RwLock::new(true),
                closed: Notify::new(),
            }),
        };
        let mut output = effect.connect(action_stream(rx));
        let task_handle = handle.clone();

        let task = runtime.spawn(async move {
            log::debug!("Effect '{}' subscribed", task_handle.name);
            loop {
                let batch = tokio::select! {
                    biased;
                    _ = task_handle.gate.closed.notified() => break,
                    batch = output.next() => match batch {
                        Some(batch) => batch,
                        None => break,
                    },
                };
                if !task_handle.forward(batch, &dispatcher) {
                    break;
                }
            }
            log::debug!("Effect '{}' finished", task_handle.name);
        });

        Self {
            handle,
            actions,
            task,
        }
    }

    pub(crate) fn handle(&self) -> &EffectHandle {
        &self.handle
    }

    /// Queue a dispatched action for the effect
    pub(crate) fn push(&self, action: A) {
        if self.actions.send(action).is_err() {
            log::trace!("Effect '{}' no longer listens", self.handle.name);
        }
    }
}

impl<A> Drop for Subscription<A> {
    fn drop(&mut self) {
        self.handle.teardown();
        self.task.abort();
    }
}

/// Turn a subscription queue into the action stream handed to effects
fn action_stream<A: Send + 'static>(rx: mpsc::UnboundedReceiver<A>) -> ActionStream<A> {
    futures::stream::unfold(rx, |mut rx| async move {
        let action = rx.recv().await?;
        Some((action, rx))
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::ready;

    fn input(actions: Vec<u32>) -> ActionStream<u32> {
        futures::stream::iter(actions).boxed()
    }

    #[tokio::test]
    async fn test_dispatching_one_wraps_each_output() {
        let effect = Effect::dispatching_one(|actions: ActionStream<u32>| actions.map(|n| n * 10));
        assert_eq!(effect.shape(), EffectShape::DispatchOne);

        let batches: Vec<Vec<u32>> = effect.connect(input(vec![1, 2])).collect().await;
        assert_eq!(batches, vec![vec![10], vec![20]]);
    }

    #[tokio::test]
    async fn test_dispatching_many_keeps_batches() {
        let effect =
            Effect::dispatching_many(|actions: ActionStream<u32>| actions.map(|n| vec![n; n as usize]));
        assert_eq!(effect.shape(), EffectShape::DispatchMany);

        let batches: Vec<Vec<u32>> = effect.connect(input(vec![2, 0])).collect().await;
        assert_eq!(batches, vec![vec![2, 2], vec![]]);
    }

    #[tokio::test]
    async fn test_non_dispatching_outputs_nothing() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let effect = Effect::non_dispatching(move |actions: ActionStream<u32>| {
            actions.then(move |n| {
                sink.lock().unwrap().push(n);
                ready(())
            })
        })
        .named("audit");
        assert_eq!(effect.name(), "audit");

        let batches: Vec<Vec<u32>> = effect.connect(input(vec![1, 2, 3])).collect().await;
        assert!(batches.iter().all(Vec::is_empty));
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_action_stream_ends_when_sender_drops() {
        let (tx, rx) = mpsc::unbounded_channel();
        let stream = action_stream(rx);
        tx.send(1u32).unwrap();
        tx.send(2).unwrap();
        drop(tx);

        let received: Vec<u32> = stream.collect().await;
        assert_eq!(received, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_action_stream_keeps_every_queued_action() {
        let (tx, rx) = mpsc::unbounded_channel();
        let stream = action_stream(rx);
        for n in 0..1000u32 {
            tx.send(n).unwrap();
        }
        drop(tx);

        let received: Vec<u32> = stream.collect().await;
        assert_eq!(received, (0..1000).collect::<Vec<_>>());
    }
}
