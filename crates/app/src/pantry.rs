//! The `Pantry` façade: everything a UI shell needs, wired together explicitly.

use anyhow::Context;

use pantry_core::{Clock, DomainError, DomainResult, ProductId, SystemClock};
use pantry_products::{Field, Product, Validator};
use pantry_store::{
    Decrement, DurableStorage, FileStorage, LoadReport, MutationObserver, PersistenceStatus,
    ProductStore,
};

use crate::config::PantryConfig;
use crate::form::{FormError, ProductForm, Submitted};
use crate::view::{self, ProductRow};

/// Application state shared by the UI.
///
/// Owns the store (the only holder of the product list), the form workflow, the validator
/// and the calendar used for "today".
pub struct Pantry {
    store: ProductStore,
    form: ProductForm,
    validator: Validator,
    clock: Box<dyn Clock>,
}

impl core::fmt::Debug for Pantry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Pantry")
            .field("store", &self.store)
            .field("form", &self.form)
            .field("validator", &self.validator)
            .field("today", &self.clock.today())
            .finish()
    }
}

impl Pantry {
    pub fn new(store: ProductStore, validator: Validator, clock: impl Clock + 'static) -> Self {
        Self {
            store,
            form: ProductForm::new(),
            validator,
            clock: Box::new(clock),
        }
    }

    /// Load from any storage backend, writing through to it on every mutation.
    pub fn open<S>(
        storage: S,
        config: &PantryConfig,
        clock: impl Clock + 'static,
    ) -> (Self, LoadReport)
    where
        S: DurableStorage + 'static,
    {
        let (store, report) = ProductStore::load(storage, &config.store, &config.validator.limits);
        let pantry = Self::new(store, Validator::new(config.validator), clock);
        (pantry, report)
    }

    /// Process start: initialize logging, open the file backend in the configured data
    /// directory and load the product list. Uses the system clock.
    pub fn bootstrap(config: &PantryConfig) -> anyhow::Result<(Self, LoadReport)> {
        pantry_observability::init();

        let storage = FileStorage::open(&config.store.data_dir).with_context(|| {
            format!(
                "failed to open pantry storage at {:?}",
                config.store.data_dir
            )
        })?;
        tracing::info!(dir = ?storage.dir(), key = %config.store.storage_key, "opening pantry");

        Ok(Self::open(storage, config, SystemClock))
    }

    /// [`Pantry::bootstrap`] with configuration read from the environment.
    pub fn bootstrap_from_env() -> anyhow::Result<(Self, LoadReport)> {
        let config = PantryConfig::from_env().context("invalid pantry configuration")?;
        Self::bootstrap(&config)
    }

    pub fn store(&self) -> &ProductStore {
        &self.store
    }

    pub fn form(&self) -> &ProductForm {
        &self.form
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Register an extra mutation observer on the store.
    pub fn observe(&mut self, observer: impl MutationObserver + 'static) {
        self.store.observe(observer);
    }

    pub fn persistence_status(&self) -> &PersistenceStatus {
        self.store.persistence_status()
    }

    /// Product table in display order.
    pub fn rows(&self) -> Vec<ProductRow> {
        view::rows(&self.store, self.clock.today())
    }

    /// Whether the "low stock" notice should be shown.
    pub fn any_low_stock(&self) -> bool {
        self.store.any_low_stock()
    }

    pub fn open_new_form(&mut self) {
        self.form.open_new();
    }

    pub fn open_edit_form(&mut self, id: ProductId) -> DomainResult<()> {
        let product = self.store.get(id).ok_or_else(DomainError::not_found)?;
        self.form.open_edit(product, self.clock.today());
        Ok(())
    }

    pub fn set_field(&mut self, field: Field, value: impl Into<String>) -> Result<(), FormError> {
        self.form.set_field(field, value)
    }

    pub fn cancel_form(&mut self) {
        self.form.cancel();
    }

    pub fn submit_form(&mut self) -> Result<Submitted, FormError> {
        let today = self.clock.today();
        self.form.submit(&mut self.store, &self.validator, today)
    }

    pub fn decrement(&mut self, id: ProductId) -> Decrement {
        self.store.decrement(id)
    }

    pub fn remove(&mut self, id: ProductId) -> Option<Product> {
        self.store.remove(id)
    }
}
