//! Reducers - pure functions that produce new state from current state + action
//!
//! A store folds every registered reducer over the state in registration
//! order. A reducer can be a plain closure or a [`RuleReducer`] assembled from
//! [`ReduceOn`] rules:
//!
//! ```
//! use statehouse::{ActionTemplate, AnonymousAction, ReduceOn, RuleReducer};
//!
//! static INCREMENT: ActionTemplate<i64> = ActionTemplate::with_payload("Increment");
//! static RESET: ActionTemplate = ActionTemplate::new("Reset");
//!
//! let reducer: RuleReducer<i64, AnonymousAction> = RuleReducer::new()
//!     .on(ReduceOn::template(&INCREMENT, |count: i64, n| count + n))
//!     .on(ReduceOn::template(&RESET, |_: i64, ()| 0));
//! ```

use crate::action::Action;
use crate::template::ActionTemplate;
use serde::de::DeserializeOwned;
use std::borrow::Cow;

/// Pure state transition
pub trait Reducer<S, A>: Send {
    fn reduce(&self, state: S, action: &A) -> S;
}

impl<S, A, F> Reducer<S, A> for F
where
    F: Fn(S, &A) -> S + Send,
{
    fn reduce(&self, state: S, action: &A) -> S {
        self(state, action)
    }
}

type Handler<S, A> = Box<dyn Fn(S, &A) -> Result<S, S> + Send>;

/// One rule of a [`RuleReducer`]: which actions it handles and how
///
/// Handlers return `Err(state)` to signal "not mine" after inspecting the
/// action (e.g. a template payload of the wrong shape); the state is then
/// passed on unchanged.
pub struct ReduceOn<S, A> {
    label: Cow<'static, str>,
    handler: Handler<S, A>,
}

impl<S: 'static, A: Action> ReduceOn<S, A> {
    /// Handle actions whose [`Action::name`] equals `name`
    pub fn name(
        name: impl Into<Cow<'static, str>>,
        handler: impl Fn(S, &A) -> S + Send + 'static,
    ) -> Self {
        let name = name.into();
        let label = name.clone();
        Self {
            label,
            handler: Box::new(move |state: S, action: &A| {
                if action.name() == name {
                    Ok(handler(state, action))
                } else {
                    Err(state)
                }
            }),
        }
    }

    /// Handle actions created by `template`; the handler receives the decoded payload
    pub fn template<P>(
        template: &ActionTemplate<P>,
        handler: impl Fn(S, P) -> S + Send + 'static,
    ) -> Self
    where
        P: DeserializeOwned + 'static,
    {
        let template = template.clone();
        Self {
            label: Cow::Owned(template.id().to_string()),
            handler: Box::new(move |state: S, action: &A| match template.payload(action) {
                Some(payload) => Ok(handler(state, payload)),
                None => Err(state),
            }),
        }
    }

    /// Handle actions accepted by `predicate`
    pub fn when(
        predicate: impl Fn(&A) -> bool + Send + 'static,
        handler: impl Fn(S, &A) -> S + Send + 'static,
    ) -> Self {
        Self {
            label: Cow::Borrowed("<predicate>"),
            handler: Box::new(move |state: S, action: &A| {
                if predicate(action) {
                    Ok(handler(state, action))
                } else {
                    Err(state)
                }
            }),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Reducer composed of ordered rules
///
/// Every rule that matches the action is applied, in the order the rules were
/// added, each one receiving the result of the previous. Actions no rule
/// matches leave the state untouched.
pub struct RuleReducer<S, A> {
    rules: Vec<ReduceOn<S, A>>,
}

impl<S, A> RuleReducer<S, A> {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule
    pub fn on(mut self, rule: ReduceOn<S, A>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<S, A> Default for RuleReducer<S, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Send, A: Send> Reducer<S, A> for RuleReducer<S, A> {
    fn reduce(&self, state: S, action: &A) -> S {
        self.rules
            .iter()
            .fold(state, |state, rule| match (rule.handler)(state, action) {
                Ok(next) => {
                    log::trace!("Rule '{}' handled action", rule.label);
                    next
                }
                Err(unchanged) => unchanged,
            })
    }
}
