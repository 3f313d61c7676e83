//! `pantry-app`
//!
//! **Responsibility:** headless application layer for the pantry.
//!
//! This crate provides:
//! - The add/edit form state machine (`ProductForm`)
//! - The `Pantry` façade a UI shell drives (store + validator + form + clock)
//! - Display rows for the product list
//! - Configuration and bootstrap from the environment
//!
//! Rendering, routing and gestures belong to the shell; this crate is its entire contract
//! with the product store.

pub mod config;
pub mod form;
pub mod pantry;
pub mod view;

pub use config::PantryConfig;
pub use form::{FormError, FormMode, FormState, OpenForm, ProductForm, SubmitKind, Submitted};
pub use pantry::Pantry;
pub use view::ProductRow;
