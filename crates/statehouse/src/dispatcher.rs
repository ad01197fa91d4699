//! Dispatcher for actions that re-enter the store
//!
//! Everything that wants to change a store from the outside (effects,
//! interceptors, other tasks, a [`StoreHandle`](crate::StoreHandle)) goes
//! through a Dispatcher. Messages land on the store's inbox and are processed
//! one at a time, in the order they were sent, by whoever owns the store.
//!
//! This enables patterns like:
//! - an effect reacting to `Fetch` dispatches `FetchSucceeded` once the request completes
//! - an interceptor dispatches a follow-up action without recursing into the pipeline

use crate::effect::{EffectHandle, Effects};
use crate::error::StoreError;
use crate::interceptor::Interceptor;
use crate::reducer::Reducer;
use tokio::sync::{mpsc, oneshot};

pub(crate) type EffectsReply = oneshot::Sender<Result<Vec<EffectHandle>, StoreError>>;

/// Message on a store's inbox
pub(crate) enum Envelope<S, A> {
    Action(A),
    Reducer(Box<dyn Reducer<S, A>>),
    Interceptor(Box<dyn Interceptor<S, A>>),
    Effects(Box<dyn Effects<S, A>>, EffectsReply),
    Stop,
}

/// Sends actions into a store's inbox
///
/// Actions dispatched here run through the full pipeline (reducers,
/// interceptors, effects) after everything queued before them.
pub struct Dispatcher<S, A> {
    tx: mpsc::UnboundedSender<Envelope<S, A>>,
}

impl<S, A> Dispatcher<S, A> {
    pub(crate) fn new(tx: mpsc::UnboundedSender<Envelope<S, A>>) -> Self {
        Self { tx }
    }

    /// Queue an action for the store
    ///
    /// Never fails; if the store is gone the action is dropped and logged.
    pub fn dispatch(&self, action: A) {
        if self.send(Envelope::Action(action)).is_err() {
            log::error!("Dispatcher: failed to send action, store has stopped");
        }
    }

    /// Whether the store behind this dispatcher has gone away
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub(crate) fn send(&self, envelope: Envelope<S, A>) -> Result<(), StoreError> {
        self.tx.send(envelope).map_err(|_| StoreError::StoreStopped)
    }
}

// Manual impl: the sender is clonable whatever S and A are
impl<S, A> Clone for Dispatcher<S, A> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<S, A> std::fmt::Debug for Dispatcher<S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("closed", &self.is_closed())
            .finish()
    }
}
