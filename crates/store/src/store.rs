//! The product store.

use std::collections::HashSet;

use chrono::Utc;

use pantry_core::{DomainError, DomainResult, Entity, ProductId, entity::position_of};
use pantry_products::{
    Limits, Product, ProductAdded, ProductEvent, ProductRemoved, ProductUpdated, RemovalReason,
    Stock, StockDecremented, ValidatedDraft,
};

use crate::config::StoreConfig;
use crate::observer::{MutationObserver, ObserverError, WriteThrough};
use crate::persistence::{LoadReport, LoadSource, read_products};
use crate::storage::DurableStorage;

/// Whether the in-memory list is known to match durable storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceStatus {
    Synced,
    /// The last load or write failed; the session keeps working on in-memory state and
    /// the next successful write clears this.
    Degraded { error: String },
}

impl PersistenceStatus {
    pub fn is_degraded(&self) -> bool {
        matches!(self, PersistenceStatus::Degraded { .. })
    }
}

/// Outcome of [`ProductStore::decrement`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Decrement {
    /// One unit taken; `remaining` units left.
    Decremented { remaining: u32 },
    /// The last unit was taken and the product removed.
    Removed,
    /// No product with that id; nothing changed.
    NotFound,
}

/// Single source of truth for the product list.
///
/// The list is kept in insertion order (that is what gets persisted); [`ProductStore::list`]
/// returns the display order. Every successful mutation notifies each registered
/// [`MutationObserver`] with the change and the new list.
pub struct ProductStore {
    products: Vec<Product>,
    /// Every id the store has ever held, so deleted ids are never handed out again.
    issued: HashSet<ProductId>,
    observers: Vec<Box<dyn MutationObserver>>,
    status: PersistenceStatus,
}

impl core::fmt::Debug for ProductStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProductStore")
            .field("products", &self.products)
            .field("observers", &self.observers.len())
            .field("status", &self.status)
            .finish()
    }
}

impl Default for ProductStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductStore {
    /// Empty store with no observers (nothing is persisted).
    pub fn new() -> Self {
        Self::with_products(Vec::new())
    }

    /// Store over an existing list (insertion order preserved).
    pub fn with_products(products: Vec<Product>) -> Self {
        let issued = products.iter().map(Product::id_typed).collect();
        Self {
            products,
            issued,
            observers: Vec::new(),
            status: PersistenceStatus::Synced,
        }
    }

    /// Load the list from `storage` and keep it written through on every mutation.
    ///
    /// Loading never fails; see [`read_products`] for how bad data is handled.
    pub fn load<S>(storage: S, config: &StoreConfig, limits: &Limits) -> (Self, LoadReport)
    where
        S: DurableStorage + 'static,
    {
        let (products, report) = read_products(&storage, &config.storage_key, limits);
        tracing::info!(
            key = %config.storage_key,
            source = ?report.source,
            loaded = report.sanitize.loaded,
            dropped = report.sanitize.dropped,
            repaired = report.sanitize.repaired,
            undated = report.sanitize.undated,
            "loaded pantry products"
        );

        let mut store = Self::with_products(products);
        if let LoadSource::ReadFailed(error) = &report.source {
            store.status = PersistenceStatus::Degraded {
                error: error.clone(),
            };
        }
        store.observe(WriteThrough::new(storage, config.storage_key.clone()));
        (store, report)
    }

    /// Register an observer. Observers run in registration order.
    pub fn observe(&mut self, observer: impl MutationObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn persistence_status(&self) -> &PersistenceStatus {
        &self.status
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id() == &id)
    }

    /// Products in insertion (storage) order.
    pub fn snapshot(&self) -> &[Product] {
        &self.products
    }

    /// Products sorted by name for display. Does not reorder the store.
    pub fn list(&self) -> Vec<&Product> {
        let mut view: Vec<&Product> = self.products.iter().collect();
        view.sort_by(|a, b| Product::display_order(a, b));
        view
    }

    /// True when at least one product is down to its last unit.
    pub fn any_low_stock(&self) -> bool {
        self.products.iter().any(Product::is_low_stock)
    }

    /// Append a new product with a fresh id.
    pub fn add(&mut self, draft: ValidatedDraft) -> Product {
        let id = self.fresh_id();
        let product = Product::create(id, draft);
        self.issued.insert(id);
        self.products.push(product.clone());
        tracing::debug!(id = %id, name = product.name(), qty = product.qty(), "product added");

        self.notify(ProductEvent::ProductAdded(ProductAdded {
            product: product.clone(),
            occurred_at: Utc::now(),
        }));
        product
    }

    /// Replace every field of `id` except the id itself.
    pub fn update(&mut self, id: ProductId, draft: ValidatedDraft) -> DomainResult<Product> {
        let idx = position_of(&self.products, &id).ok_or_else(DomainError::not_found)?;
        let product = &mut self.products[idx];
        let before = product.clone();
        product.apply_edit(draft);
        let after = product.clone();
        tracing::debug!(id = %id, "product updated");

        self.notify(ProductEvent::ProductUpdated(ProductUpdated {
            before,
            after: after.clone(),
            occurred_at: Utc::now(),
        }));
        Ok(after)
    }

    /// Take one unit of `id`; the last unit removes the product.
    pub fn decrement(&mut self, id: ProductId) -> Decrement {
        let Some(idx) = position_of(&self.products, &id) else {
            return Decrement::NotFound;
        };

        match self.products[idx].take_one() {
            Stock::Remaining(remaining) => {
                tracing::debug!(id = %id, remaining, "product decremented");
                self.notify(ProductEvent::StockDecremented(StockDecremented {
                    product_id: id,
                    remaining,
                    occurred_at: Utc::now(),
                }));
                Decrement::Decremented { remaining }
            }
            Stock::Depleted => {
                let product = self.products.remove(idx);
                tracing::debug!(id = %id, "last unit taken; product removed");
                self.notify(ProductEvent::ProductRemoved(ProductRemoved {
                    product,
                    reason: RemovalReason::Depleted,
                    occurred_at: Utc::now(),
                }));
                Decrement::Removed
            }
        }
    }

    /// Delete `id`. Returns the removed product, `None` when it did not exist.
    pub fn remove(&mut self, id: ProductId) -> Option<Product> {
        let idx = position_of(&self.products, &id)?;
        let product = self.products.remove(idx);
        tracing::debug!(id = %id, "product removed");

        self.notify(ProductEvent::ProductRemoved(ProductRemoved {
            product: product.clone(),
            reason: RemovalReason::Explicit,
            occurred_at: Utc::now(),
        }));
        Some(product)
    }

    fn fresh_id(&self) -> ProductId {
        loop {
            let id = ProductId::new();
            if !self.issued.contains(&id) {
                return id;
            }
        }
    }

    /// Run every observer. Only storage failures change the persistence status.
    fn notify(&mut self, event: ProductEvent) {
        let event_type = pantry_events::Event::event_type(&event);
        let mut failure = None;
        for observer in self.observers.iter_mut() {
            match observer.on_mutate(&event, &self.products) {
                Ok(()) => {}
                Err(err @ ObserverError::Storage(_)) => {
                    tracing::warn!(
                        error = %err,
                        event = event_type,
                        "mutation not persisted; continuing with in-memory state"
                    );
                    failure = Some(err.to_string());
                }
                Err(err) => {
                    tracing::warn!(error = %err, event = event_type, "mutation observer failed");
                }
            }
        }

        self.status = match failure {
            Some(error) => PersistenceStatus::Degraded { error },
            None => PersistenceStatus::Synced,
        };
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Arc;

    use chrono::{Days, NaiveDate};
    use pantry_events::{EventBus, InMemoryEventBus};
    use pantry_products::{ProductDraft, validate};

    use super::*;
    use crate::observer::BusForwarder;
    use crate::storage::{InMemoryStorage, StorageError};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn tomorrow() -> String {
        today()
            .checked_add_days(Days::new(1))
            .unwrap()
            .format("%Y-%m-%d")
            .to_string()
    }

    fn draft(name: &str, qty: u32) -> ValidatedDraft {
        validate(&ProductDraft::new(name, tomorrow(), qty), today())
            .into_result()
            .unwrap()
    }

    fn config() -> StoreConfig {
        StoreConfig::default()
    }

    #[test]
    fn add_appends_with_a_new_id() {
        let mut store = ProductStore::new();
        let first = store.add(draft("Milk", 2));
        let second = store.add(draft("Milk", 2));

        assert_eq!(store.len(), 2);
        assert_ne!(first.id_typed(), second.id_typed());
        assert_eq!(store.get(first.id_typed()), Some(&first));
    }

    #[test]
    fn eggs_decremented_once_are_gone() {
        let mut store = ProductStore::new();
        let eggs = store.add(draft("Eggs", 1));

        assert_eq!(store.decrement(eggs.id_typed()), Decrement::Removed);
        assert!(store.list().iter().all(|p| p.id_typed() != eggs.id_typed()));
        assert!(store.is_empty());
    }

    #[test]
    fn decrement_keeps_products_with_stock_left() {
        let mut store = ProductStore::new();
        let rice = store.add(draft("Rice", 3));

        assert_eq!(
            store.decrement(rice.id_typed()),
            Decrement::Decremented { remaining: 2 }
        );
        assert_eq!(store.get(rice.id_typed()).unwrap().qty(), 2);
    }

    #[test]
    fn decrement_and_remove_of_unknown_ids_are_no_ops() {
        let mut store = ProductStore::new();
        store.add(draft("Rice", 3));
        let calls = Rc::new(RefCell::new(0));
        let counter = calls.clone();
        store.observe(move |_: &ProductEvent, _: &[Product]| -> Result<(), ObserverError> {
            *counter.borrow_mut() += 1;
            Ok(())
        });

        assert_eq!(store.decrement(ProductId::new()), Decrement::NotFound);
        assert_eq!(store.remove(ProductId::new()), None);
        assert_eq!(store.len(), 1);
        assert_eq!(*calls.borrow(), 0);
    }

    #[test]
    fn update_replaces_everything_but_the_id() {
        let mut store = ProductStore::new();
        let milk = store.add(draft("Milk", 2));

        let updated = store.update(milk.id_typed(), draft("Oat milk", 5)).unwrap();
        assert_eq!(updated.id_typed(), milk.id_typed());
        assert_eq!(updated.name(), "Oat milk");
        assert_eq!(store.get(milk.id_typed()).unwrap().qty(), 5);
    }

    #[test]
    fn update_of_unknown_id_is_not_found() {
        let mut store = ProductStore::new();
        let err = store.update(ProductId::new(), draft("Milk", 1)).unwrap_err();
        assert_eq!(err, DomainError::NotFound);
    }

    #[test]
    fn list_sorts_by_name_without_reordering_storage() {
        let mut store = ProductStore::new();
        store.add(draft("yogurt", 1));
        store.add(draft("Apples", 1));
        store.add(draft("bread", 1));
        store.add(draft("Ñoquis", 1));
        store.add(draft("Ácido fólico", 1));
        store.add(draft("Oliva", 1));

        let names: Vec<&str> = store.list().iter().map(|p| p.name()).collect();
        assert_eq!(
            names,
            vec!["Ácido fólico", "Apples", "bread", "Ñoquis", "Oliva", "yogurt"]
        );

        let stored: Vec<&str> = store.snapshot().iter().map(Product::name).collect();
        assert_eq!(
            stored,
            vec!["yogurt", "Apples", "bread", "Ñoquis", "Ácido fólico", "Oliva"]
        );
    }

    #[test]
    fn low_stock_tracks_single_units() {
        let mut store = ProductStore::new();
        let rice = store.add(draft("Rice", 2));
        assert!(!store.any_low_stock());

        store.decrement(rice.id_typed());
        assert!(store.any_low_stock());
    }

    #[test]
    fn every_mutation_is_written_through() {
        let storage = Arc::new(InMemoryStorage::new());
        let (mut store, report) = ProductStore::load(storage.clone(), &config(), &Limits::default());
        assert_eq!(report.source, LoadSource::Missing);
        assert_eq!(storage.get(&config().storage_key).unwrap(), None);

        let milk = store.add(draft("Milk", 2));
        let written = storage.get(&config().storage_key).unwrap().unwrap();
        assert!(written.contains(&milk.id_typed().to_string()));

        store.remove(milk.id_typed());
        assert_eq!(
            storage.get(&config().storage_key).unwrap().as_deref(),
            Some("[]")
        );
    }

    #[test]
    fn reload_yields_the_same_products() {
        let storage = Arc::new(InMemoryStorage::new());
        let (mut store, _) = ProductStore::load(storage.clone(), &config(), &Limits::default());
        store.add(draft("Milk", 2));
        let beans = store.add(draft("Beans", 7));
        store.decrement(beans.id_typed());

        let (reloaded, report) = ProductStore::load(storage, &config(), &Limits::default());
        assert!(report.sanitize.is_clean());
        assert_eq!(reloaded.snapshot(), store.snapshot());
    }

    #[test]
    fn write_failures_degrade_but_keep_the_session() {
        let storage = Arc::new(InMemoryStorage::with_quota(200));
        let (mut store, _) = ProductStore::load(storage.clone(), &config(), &Limits::default());

        let first = store.add(draft("Milk", 2));
        assert_eq!(store.persistence_status(), &PersistenceStatus::Synced);

        let second = store.add(draft("Flour", 1));
        assert!(store.persistence_status().is_degraded());
        assert_eq!(store.len(), 2);
        assert!(store.get(second.id_typed()).is_some());

        // Shrinking the list brings the write back under quota.
        store.remove(second.id_typed());
        assert_eq!(store.persistence_status(), &PersistenceStatus::Synced);
        let written = storage.get(&config().storage_key).unwrap().unwrap();
        assert!(written.contains(&first.id_typed().to_string()));
    }

    #[test]
    fn publish_failures_leave_persistence_synced() {
        let storage = Arc::new(InMemoryStorage::new());
        let (mut store, _) = ProductStore::load(storage.clone(), &config(), &Limits::default());
        store.observe(|_: &ProductEvent, _: &[Product]| -> Result<(), ObserverError> {
            Err(ObserverError::Publish("bus closed".into()))
        });

        let milk = store.add(draft("Milk", 2));
        assert_eq!(store.persistence_status(), &PersistenceStatus::Synced);
        let written = storage.get(&config().storage_key).unwrap().unwrap();
        assert!(written.contains(&milk.id_typed().to_string()));
    }

    #[test]
    fn read_failures_start_empty_and_degraded() {
        struct Broken;
        impl DurableStorage for Broken {
            fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
                Err(StorageError::Poisoned)
            }
            fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
                Ok(())
            }
            fn remove(&self, _key: &str) -> Result<(), StorageError> {
                Ok(())
            }
        }

        let (store, report) = ProductStore::load(Broken, &config(), &Limits::default());
        assert!(store.is_empty());
        assert!(matches!(report.source, LoadSource::ReadFailed(_)));
        assert!(store.persistence_status().is_degraded());
    }

    #[test]
    fn events_are_forwarded_to_the_bus() {
        let bus = Arc::new(InMemoryEventBus::<ProductEvent>::new());
        let sub = bus.subscribe();
        let mut store = ProductStore::new();
        store.observe(BusForwarder::new(bus.clone()));

        let eggs = store.add(draft("Eggs", 1));
        store.decrement(eggs.id_typed());

        let events = sub.drain();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], ProductEvent::ProductAdded(_)));
        match &events[1] {
            ProductEvent::ProductRemoved(e) => assert_eq!(e.reason, RemovalReason::Depleted),
            other => panic!("Expected ProductRemoved, got {other:?}"),
        }
    }

    #[test]
    fn removed_ids_are_not_reissued() {
        let mut store = ProductStore::new();
        let mut seen = HashSet::new();
        for _ in 0..50 {
            let p = store.add(draft("Tea", 1));
            assert!(seen.insert(p.id_typed()));
            store.remove(p.id_typed());
        }
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Add(u32),
            Decrement(usize),
            Remove(usize),
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (1u32..5).prop_map(Op::Add),
                (0usize..8).prop_map(Op::Decrement),
                (0usize..8).prop_map(Op::Remove),
            ]
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 128,
                ..ProptestConfig::default()
            })]

            /// Property: quantities stay positive, adds grow the list by one with an
            /// unused id, and a reload reproduces the list exactly.
            #[test]
            fn store_invariants_hold(ops in prop::collection::vec(op(), 1..40)) {
                let storage = Arc::new(InMemoryStorage::new());
                let (mut store, _) = ProductStore::load(storage.clone(), &config(), &Limits::default());

                for op in ops {
                    match op {
                        Op::Add(qty) => {
                            let before: HashSet<ProductId> =
                                store.snapshot().iter().map(Product::id_typed).collect();
                            let added = store.add(draft("Item", qty));
                            prop_assert_eq!(store.len(), before.len() + 1);
                            prop_assert!(!before.contains(&added.id_typed()));
                        }
                        Op::Decrement(i) => {
                            if let Some(id) = store.snapshot().get(i).map(Product::id_typed) {
                                let qty = store.get(id).unwrap().qty();
                                match store.decrement(id) {
                                    Decrement::Removed => prop_assert_eq!(qty, 1),
                                    Decrement::Decremented { remaining } => {
                                        prop_assert_eq!(remaining, qty - 1)
                                    }
                                    Decrement::NotFound => prop_assert!(false, "id vanished"),
                                }
                            }
                        }
                        Op::Remove(i) => {
                            if let Some(id) = store.snapshot().get(i).map(Product::id_typed) {
                                prop_assert!(store.remove(id).is_some());
                            }
                        }
                    }
                    prop_assert!(store.snapshot().iter().all(|p| p.qty() >= 1));
                }

                let (reloaded, _) = ProductStore::load(storage, &config(), &Limits::default());
                prop_assert_eq!(reloaded.snapshot(), store.snapshot());
            }
        }
    }
}
