//! Actions - immutable descriptions of "something happened"

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt::Debug;

/// Trait for values that can be dispatched to a [`Store`](crate::Store)
///
/// Actions should be:
/// - Clone: they are broadcast to every effect subscription
/// - Debug: for logging
/// - Send + Sync + 'static: effects run on other tasks
///
/// Application enums implement `name` to give each variant a stable identity
/// that reducers can match on. Enums that also carry template-made actions
/// return them from `anonymous` so templates can recognize them.
pub trait Action: Clone + Debug + Send + Sync + 'static {
    /// Stable identifier of this action, used for rule matching and logging
    fn name(&self) -> Cow<'_, str>;

    /// The anonymous action wrapped by this value, if any
    fn anonymous(&self) -> Option<&AnonymousAction> {
        None
    }
}

/// Action created from an [`ActionTemplate`](crate::ActionTemplate)
///
/// Carries the template identifier and an optional payload encoded as JSON,
/// so it survives serialization boundaries without relying on type identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnonymousAction {
    id: Cow<'static, str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload: Option<serde_json::Value>,
}

impl AnonymousAction {
    pub(crate) fn new(id: Cow<'static, str>, payload: Option<serde_json::Value>) -> Self {
        Self { id, payload }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn payload(&self) -> Option<&serde_json::Value> {
        self.payload.as_ref()
    }
}

impl Action for AnonymousAction {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.id)
    }

    fn anonymous(&self) -> Option<&AnonymousAction> {
        Some(self)
    }
}
