//! Add/Edit form workflow.
//!
//! ```text
//! Closed ──open_new──▶ Open(New) ──submit──▶ validate ─┬─ ok ──▶ store.add ──▶ Closed
//!    ▲                                                 └─ errors ──▶ Open(New, showing errors)
//!    └──open_edit(p)──▶ Open(Editing(id)) ── same, with store.update
//! ```
//!
//! Validation only runs on submit, except that opening an edit form pre-checks the date so
//! an already-expired product is shown as invalid right away.

use chrono::NaiveDate;
use thiserror::Error;

use pantry_core::{DomainError, ProductId};
use pantry_products::validation::check_expiry;
use pantry_products::{Field, FieldErrors, Product, ProductDraft, Validator};
use pantry_store::ProductStore;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FormMode {
    New,
    Editing(ProductId),
}

/// An open form: the draft being typed plus what the last check found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenForm {
    pub mode: FormMode,
    pub draft: ProductDraft,
    pub errors: FieldErrors,
    pub advisories: FieldErrors,
}

impl OpenForm {
    fn new(mode: FormMode, draft: ProductDraft) -> Self {
        Self {
            mode,
            draft,
            errors: FieldErrors::new(),
            advisories: FieldErrors::new(),
        }
    }

    pub fn showing_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FormState {
    #[default]
    Closed,
    Open(OpenForm),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SubmitKind {
    Added,
    Updated,
}

/// A successful submit. The form is closed by then.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submitted {
    pub kind: SubmitKind,
    pub product: Product,
    /// Non-blocking notes from validation (e.g. a clamped quantity).
    pub advisories: FieldErrors,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("no form is open")]
    NotOpen,

    /// The form stays open showing these errors.
    #[error("draft has {} invalid field(s)", .0.len())]
    Invalid(FieldErrors),

    /// The product being edited no longer exists; the form was closed.
    #[error("product {0} no longer exists")]
    ProductGone(ProductId),
}

#[derive(Debug, Clone, Default)]
pub struct ProductForm {
    state: FormState,
}

impl ProductForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn open(&self) -> Option<&OpenForm> {
        match &self.state {
            FormState::Open(form) => Some(form),
            FormState::Closed => None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open().is_some()
    }

    /// Open a blank "add" form (any open form is discarded).
    pub fn open_new(&mut self) {
        self.state = FormState::Open(OpenForm::new(FormMode::New, ProductDraft::blank()));
    }

    /// Open an edit form pre-filled from `product`.
    pub fn open_edit(&mut self, product: &Product, today: NaiveDate) {
        let draft = ProductDraft::from_product(product);
        let mut form = OpenForm::new(FormMode::Editing(product.id_typed()), draft);
        if let Err(err) = check_expiry(&form.draft.expires_at, today) {
            form.errors.insert(Field::ExpiresAt, err);
        }
        self.state = FormState::Open(form);
    }

    /// Update one field of the draft, clearing that field's displayed error.
    pub fn set_field(&mut self, field: Field, value: impl Into<String>) -> Result<(), FormError> {
        let FormState::Open(form) = &mut self.state else {
            return Err(FormError::NotOpen);
        };
        let value = value.into();
        match field {
            Field::Name => form.draft.name = value,
            Field::Description => form.draft.description = value,
            Field::ExpiresAt => form.draft.expires_at = value,
            Field::Qty => form.draft.qty = value,
        }
        form.errors.remove(&field);
        form.advisories.remove(&field);
        Ok(())
    }

    /// Close without touching the store.
    pub fn cancel(&mut self) {
        self.state = FormState::Closed;
    }

    /// Validate the draft and, when it passes, add or update the product.
    pub fn submit(
        &mut self,
        store: &mut ProductStore,
        validator: &Validator,
        today: NaiveDate,
    ) -> Result<Submitted, FormError> {
        let FormState::Open(form) = &mut self.state else {
            return Err(FormError::NotOpen);
        };

        let validation = validator.validate(&form.draft, today);
        let advisories = validation.advisories().clone();
        let approved = match validation.into_result() {
            Ok(approved) => approved,
            Err(errors) => {
                tracing::debug!(invalid = errors.len(), "form submit rejected");
                form.errors = errors.clone();
                form.advisories = advisories;
                return Err(FormError::Invalid(errors));
            }
        };

        let mode = form.mode;
        let submitted = match mode {
            FormMode::New => Submitted {
                kind: SubmitKind::Added,
                product: store.add(approved),
                advisories,
            },
            FormMode::Editing(id) => match store.update(id, approved) {
                Ok(product) => Submitted {
                    kind: SubmitKind::Updated,
                    product,
                    advisories,
                },
                Err(DomainError::NotFound) => {
                    self.state = FormState::Closed;
                    return Err(FormError::ProductGone(id));
                }
                Err(err) => {
                    // `update` only reports missing products.
                    tracing::warn!(error = %err, "unexpected update failure");
                    self.state = FormState::Closed;
                    return Err(FormError::ProductGone(id));
                }
            },
        };

        self.state = FormState::Closed;
        Ok(submitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pantry_products::{FieldError, validate};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn fill(form: &mut ProductForm, name: &str, date: &str, qty: &str) {
        form.set_field(Field::Name, name).unwrap();
        form.set_field(Field::ExpiresAt, date).unwrap();
        form.set_field(Field::Qty, qty).unwrap();
    }

    #[test]
    fn new_form_adds_and_closes() {
        let mut store = ProductStore::new();
        let mut form = ProductForm::new();
        assert_eq!(form.state(), &FormState::Closed);

        form.open_new();
        fill(&mut form, "Milk", "2026-10-25", "2");
        let submitted = form.submit(&mut store, &Validator::default(), today()).unwrap();

        assert_eq!(submitted.kind, SubmitKind::Added);
        assert_eq!(submitted.product.name(), "Milk");
        assert!(!form.is_open());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn invalid_submit_stays_open_with_errors() {
        let mut store = ProductStore::new();
        let mut form = ProductForm::new();
        form.open_new();
        fill(&mut form, "", "2026-10-19", "0");

        let err = form.submit(&mut store, &Validator::default(), today()).unwrap_err();
        match err {
            FormError::Invalid(errors) => assert_eq!(errors.len(), 2),
            other => panic!("Expected Invalid, got {other:?}"),
        }

        let open = form.open().unwrap();
        assert!(open.showing_errors());
        assert_eq!(open.errors.get(&Field::Name), Some(&FieldError::EmptyName));
        assert!(store.is_empty());
    }

    #[test]
    fn editing_a_field_clears_its_error_only() {
        let mut store = ProductStore::new();
        let mut form = ProductForm::new();
        form.open_new();
        let _ = form.submit(&mut store, &Validator::default(), today());

        form.set_field(Field::Name, "Rice").unwrap();
        let open = form.open().unwrap();
        assert!(!open.errors.contains_key(&Field::Name));
        assert!(open.errors.contains_key(&Field::Qty));
    }

    #[test]
    fn edit_form_flags_stale_products_immediately() {
        let approved = validate(&ProductDraft::new("Yogurt", "2026-10-20", 1), today())
            .into_result()
            .unwrap();
        let mut store = ProductStore::new();
        let yogurt = store.add(approved);

        let later = NaiveDate::from_ymd_opt(2026, 10, 22).unwrap();
        let mut form = ProductForm::new();
        form.open_edit(&yogurt, later);

        let open = form.open().unwrap();
        assert_eq!(open.mode, FormMode::Editing(yogurt.id_typed()));
        assert_eq!(open.draft.name, "Yogurt");
        assert_eq!(open.draft.expires_at, "2026-10-20");
        assert_eq!(open.draft.qty, "1");
        assert_eq!(open.errors.get(&Field::ExpiresAt), Some(&FieldError::PastDate));

        form.set_field(Field::ExpiresAt, "2026-11-01").unwrap();
        let submitted = form.submit(&mut store, &Validator::default(), later).unwrap();
        assert_eq!(submitted.kind, SubmitKind::Updated);
        assert_eq!(submitted.product.id_typed(), yogurt.id_typed());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn editing_a_vanished_product_closes_the_form() {
        let approved = validate(&ProductDraft::new("Tea", "2026-12-01", 3), today())
            .into_result()
            .unwrap();
        let mut store = ProductStore::new();
        let tea = store.add(approved);

        let mut form = ProductForm::new();
        form.open_edit(&tea, today());
        store.remove(tea.id_typed());

        let err = form.submit(&mut store, &Validator::default(), today()).unwrap_err();
        assert_eq!(err, FormError::ProductGone(tea.id_typed()));
        assert!(!form.is_open());
        assert!(store.is_empty());
    }

    #[test]
    fn clamped_quantity_is_reported_on_success() {
        let mut store = ProductStore::new();
        let mut form = ProductForm::new();
        form.open_new();
        fill(&mut form, "Salt", "2027-01-01", "2000000");

        let submitted = form.submit(&mut store, &Validator::default(), today()).unwrap();
        assert_eq!(submitted.product.qty(), 1_000_000);
        assert_eq!(
            submitted.advisories.get(&Field::Qty),
            Some(&FieldError::QtyTooLarge { max: 1_000_000 })
        );
    }

    #[test]
    fn closed_form_rejects_input() {
        let mut store = ProductStore::new();
        let mut form = ProductForm::new();

        assert_eq!(form.set_field(Field::Name, "x"), Err(FormError::NotOpen));
        assert_eq!(
            form.submit(&mut store, &Validator::default(), today()),
            Err(FormError::NotOpen)
        );

        form.open_new();
        form.cancel();
        assert!(!form.is_open());
    }
}
