//! `pantry-store`: the persistent product store.
//!
//! The store owns the authoritative in-memory product list. It is loaded once from a
//! [`DurableStorage`] backend and, after every successful mutation, hands the change to
//! its registered [`MutationObserver`]s; [`WriteThrough`] is the observer that writes the
//! list back to storage.

pub mod config;
pub mod observer;
pub mod persistence;
pub mod storage;
pub mod store;

pub use config::{ConfigError, StoreConfig};
pub use observer::{BusForwarder, MutationObserver, ObserverError, WriteThrough};
pub use persistence::{LoadReport, LoadSource};
pub use storage::{DurableStorage, FileStorage, InMemoryStorage, StorageError};
pub use store::{Decrement, PersistenceStatus, ProductStore};
