//! Lookup of running stores by their state and action types

use crate::action::Action;
use crate::error::StoreError;
use crate::runtime::StoreHandle;
use std::any::{Any, TypeId};
use std::collections::HashMap;

/// Registry of store handles, one per `(state, action)` type pair
///
/// Lets independent parts of an application find the store they need
/// without threading handles through every constructor.
#[derive(Default)]
pub struct StoreRegistry {
    stores: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl StoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handle`, replacing any handle registered for the same types
    pub fn register<S, A>(&mut self, handle: StoreHandle<S, A>) -> Option<StoreHandle<S, A>>
    where
        S: Send + Sync + 'static,
        A: Action,
    {
        log::debug!("Registering {}", key::<S, A>());
        self.stores
            .insert(TypeId::of::<StoreHandle<S, A>>(), Box::new(handle))
            .and_then(|previous| previous.downcast::<StoreHandle<S, A>>().ok())
            .map(|previous| *previous)
    }

    /// Handle for the store of state `S` and action `A`
    pub fn get<S, A>(&self) -> Result<StoreHandle<S, A>, StoreError>
    where
        S: Send + Sync + 'static,
        A: Action,
    {
        self.stores
            .get(&TypeId::of::<StoreHandle<S, A>>())
            .and_then(|entry| entry.downcast_ref::<StoreHandle<S, A>>())
            .cloned()
            .ok_or_else(|| StoreError::NotFound { key: key::<S, A>() })
    }

    pub fn contains<S, A>(&self) -> bool
    where
        S: Send + Sync + 'static,
        A: Action,
    {
        self.stores.contains_key(&TypeId::of::<StoreHandle<S, A>>())
    }

    pub fn remove<S, A>(&mut self) -> Result<StoreHandle<S, A>, StoreError>
    where
        S: Send + Sync + 'static,
        A: Action,
    {
        self.stores
            .remove(&TypeId::of::<StoreHandle<S, A>>())
            .and_then(|entry| entry.downcast::<StoreHandle<S, A>>().ok())
            .map(|handle| *handle)
            .ok_or_else(|| StoreError::NotFound { key: key::<S, A>() })
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}

impl std::fmt::Debug for StoreRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreRegistry")
            .field("stores", &self.stores.len())
            .finish()
    }
}

fn key<S, A>() -> String {
    format!(
        "Store<{}, {}>",
        std::any::type_name::<S>(),
        std::any::type_name::<A>()
    )
}
