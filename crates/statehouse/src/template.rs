//! Action templates
//!
//! A template is a factory for [`AnonymousAction`]s and, at the same time, the
//! key used to recognize them again. Matching compares the stamped identifier
//! and decodes the payload, never the Rust type of the action, so it works for
//! actions that crossed a serialization boundary.
//!
//! ```
//! use statehouse::ActionTemplate;
//!
//! static FETCH: ActionTemplate = ActionTemplate::new("Fetch");
//! static FETCHED: ActionTemplate<Vec<String>> = ActionTemplate::with_payload("FetchSucceeded");
//!
//! let action = FETCHED.create_with(vec!["a".to_string()]);
//! assert!(FETCHED.matches(&action));
//! assert!(!FETCH.matches(&action));
//! assert_eq!(FETCHED.payload(&action), Some(vec!["a".to_string()]));
//! ```

use crate::action::{Action, AnonymousAction};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::marker::PhantomData;

/// Whether a template's actions carry a payload, and of which type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadMarker {
    Absent,
    Present { type_name: &'static str },
}

/// Factory and matcher for anonymous actions
///
/// `P` is the payload type; templates without payload use the default `()`.
pub struct ActionTemplate<P = ()> {
    id: Cow<'static, str>,
    has_payload: bool,
    _payload: PhantomData<fn() -> P>,
}

impl ActionTemplate<()> {
    /// Template for actions without payload
    pub const fn new(id: &'static str) -> Self {
        Self {
            id: Cow::Borrowed(id),
            has_payload: false,
            _payload: PhantomData,
        }
    }

    /// Create an action stamped with this template's identifier
    pub fn create(&self) -> AnonymousAction {
        AnonymousAction::new(self.id.clone(), None)
    }
}

impl<P> ActionTemplate<P> {
    /// Template for actions carrying a payload of type `P`
    pub const fn with_payload(id: &'static str) -> Self {
        Self {
            id: Cow::Borrowed(id),
            has_payload: true,
            _payload: PhantomData,
        }
    }

    /// Template with an identifier only known at runtime
    pub fn named(id: impl Into<String>, has_payload: bool) -> Self {
        Self {
            id: Cow::Owned(id.into()),
            has_payload,
            _payload: PhantomData,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn marker(&self) -> PayloadMarker {
        if self.has_payload {
            PayloadMarker::Present {
                type_name: std::any::type_name::<P>(),
            }
        } else {
            PayloadMarker::Absent
        }
    }

    fn stamped(&self, action: &AnonymousAction) -> bool {
        action.id() == self.id && action.payload().is_some() == self.has_payload
    }
}

impl<P: Serialize> ActionTemplate<P> {
    /// Create an action stamped with this template's identifier and payload
    ///
    /// A payload that cannot be encoded is dropped (and logged); the resulting
    /// action then no longer matches this template.
    pub fn create_with(&self, payload: P) -> AnonymousAction {
        let payload = match serde_json::to_value(payload) {
            Ok(value) => Some(value),
            Err(e) => {
                log::error!("Failed to encode payload for action '{}': {}", self.id, e);
                None
            }
        };
        AnonymousAction::new(self.id.clone(), payload)
    }
}

impl<P: DeserializeOwned> ActionTemplate<P> {
    /// Whether `action` was produced by this template
    ///
    /// Total: anything that is not an anonymous action with the same
    /// identifier and a payload decoding to `P` is a negative match. The
    /// identifier is compared first, so foreign actions are rejected without
    /// decoding anything.
    pub fn matches<A: Action>(&self, action: &A) -> bool {
        self.payload(action).is_some()
    }

    /// Decode the payload of `action` if it was produced by this template
    ///
    /// Returns `None` for foreign actions and for payloads of the wrong shape.
    pub fn payload<A: Action>(&self, action: &A) -> Option<P> {
        let anonymous = action.anonymous().filter(|a| self.stamped(a))?;
        let value = anonymous.payload().unwrap_or(&serde_json::Value::Null);
        P::deserialize(value).ok()
    }
}

impl<P> Clone for ActionTemplate<P> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            has_payload: self.has_payload,
            _payload: PhantomData,
        }
    }
}

impl<P> std::fmt::Debug for ActionTemplate<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionTemplate")
            .field("id", &self.id)
            .field("marker", &self.marker())
            .finish()
    }
}
