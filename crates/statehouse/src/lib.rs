//! Unidirectional state container
//!
//! This crate provides:
//! - A [`Store`] holding one immutable state value, replaced on every dispatch
//! - [`Reducer`]s folding actions into new states, composable from [`ReduceOn`] rules
//! - [`ActionTemplate`]s for anonymous, identifier-stamped actions
//! - Memoized, composable [`Selector`]s keyed by state [`Version`]
//! - [`Effect`]s turning the action stream into follow-up actions
//! - [`Interceptor`]s observing every transition (logging, printing)
//! - A [`StoreRegistry`] to find running stores by type
//!
//! ```
//! use statehouse::{ActionTemplate, AnonymousAction, ReduceOn, RuleReducer, Selector, Store};
//!
//! #[derive(Debug, Clone, PartialEq, Default)]
//! struct Counter {
//!     counter: i64,
//! }
//!
//! static INCREMENT: ActionTemplate<i64> = ActionTemplate::with_payload("Increment");
//!
//! let reducer = RuleReducer::new().on(ReduceOn::template(&INCREMENT, |mut s: Counter, n| {
//!     s.counter += n;
//!     s
//! }));
//! let mut store: Store<Counter, AnonymousAction> = Store::new(Counter::default()).with_reducer(reducer);
//!
//! store.dispatch(INCREMENT.create_with(5));
//! store.dispatch(INCREMENT.create_with(3));
//!
//! let counter = Selector::new(|s: &Counter| s.counter);
//! assert_eq!(store.select_current(&counter), 8);
//! ```

pub mod action;
pub mod codec;
pub mod dispatcher;
pub mod effect;
pub mod error;
pub mod interceptor;
pub mod interceptors;
pub mod reducer;
pub mod registry;
pub mod runtime;
pub mod selector;
pub mod state;
pub mod store;
pub mod template;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use action::{Action, AnonymousAction};
pub use dispatcher::Dispatcher;
pub use effect::{ActionStream, Effect, EffectContext, EffectHandle, EffectShape, Effects};
pub use error::StoreError;
pub use interceptor::Interceptor;
pub use interceptors::{LoggingInterceptor, PrintInterceptor};
pub use reducer::{ReduceOn, Reducer, RuleReducer};
pub use registry::StoreRegistry;
pub use runtime::{RunningStore, StoreHandle};
pub use selector::Selector;
pub use state::{Snapshot, StateReader, Version};
pub use statehouse_config::StoreConfig;
pub use store::Store;
pub use template::{ActionTemplate, PayloadMarker};
