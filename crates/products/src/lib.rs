//! Products domain module.
//!
//! This crate contains the pantry's business rules: the `Product` entity, the form
//! validator that gates every user-originated mutation, and the sanitizer that repairs
//! records read back from durable storage. Everything here is deterministic domain logic
//! (no IO, no storage).

pub mod date;
pub mod draft;
pub mod product;
pub mod record;
pub mod validation;

mod text;

pub use draft::ProductDraft;
pub use product::{
    Product, ProductAdded, ProductEvent, ProductRemoved, ProductUpdated, RemovalReason, Stock,
    StockDecremented,
};
pub use record::{SanitizeReport, sanitize_records};
pub use validation::{
    Field, FieldError, FieldErrors, Limits, OversizeQty, ValidatedDraft, Validation, Validator,
    ValidatorConfig, validate,
};
