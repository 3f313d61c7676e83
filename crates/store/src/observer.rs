//! Mutation observers: the store's `on_mutate` hook.
//!
//! The store decides *what* changed; observers decide what to do about it. Persistence is
//! just one observer ([`WriteThrough`]); [`BusForwarder`] republishes events for views.

use thiserror::Error;

use pantry_events::EventBus;
use pantry_products::{Product, ProductEvent};

use crate::persistence::write_products;
use crate::storage::{DurableStorage, StorageError};

#[derive(Debug, Error)]
pub enum ObserverError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("failed to publish event: {0}")]
    Publish(String),
}

/// Invoked by the store after every successful mutation.
///
/// `snapshot` is the full product list, in insertion order, *after* the mutation.
pub trait MutationObserver {
    fn on_mutate(&mut self, event: &ProductEvent, snapshot: &[Product])
    -> Result<(), ObserverError>;
}

impl<F> MutationObserver for F
where
    F: FnMut(&ProductEvent, &[Product]) -> Result<(), ObserverError>,
{
    fn on_mutate(
        &mut self,
        event: &ProductEvent,
        snapshot: &[Product],
    ) -> Result<(), ObserverError> {
        self(event, snapshot)
    }
}

/// Writes the whole list to durable storage after each mutation (no batching).
#[derive(Debug)]
pub struct WriteThrough<S> {
    storage: S,
    key: String,
}

impl<S: DurableStorage> WriteThrough<S> {
    pub fn new(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl<S: DurableStorage> MutationObserver for WriteThrough<S> {
    fn on_mutate(
        &mut self,
        _event: &ProductEvent,
        snapshot: &[Product],
    ) -> Result<(), ObserverError> {
        write_products(&self.storage, &self.key, snapshot)?;
        Ok(())
    }
}

/// Republishes every mutation event on an [`EventBus`].
#[derive(Debug)]
pub struct BusForwarder<B> {
    bus: B,
}

impl<B> BusForwarder<B>
where
    B: EventBus<ProductEvent>,
{
    pub fn new(bus: B) -> Self {
        Self { bus }
    }
}

impl<B> MutationObserver for BusForwarder<B>
where
    B: EventBus<ProductEvent>,
{
    fn on_mutate(
        &mut self,
        event: &ProductEvent,
        _snapshot: &[Product],
    ) -> Result<(), ObserverError> {
        self.bus
            .publish(event.clone())
            .map_err(|err| ObserverError::Publish(format!("{err:?}")))
    }
}
