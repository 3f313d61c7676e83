//! Form drafts: raw, not-yet-validated user input.

use crate::date;
use crate::product::Product;

/// User-entered candidate product data from the add/edit form.
///
/// Every field is kept exactly as typed (including the quantity, which a number input may
/// leave empty). Only [`crate::Validator`] turns a draft into something the store accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub expires_at: String,
    pub qty: String,
}

impl ProductDraft {
    /// Empty draft, as shown when the "add" form opens.
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn new(
        name: impl Into<String>,
        expires_at: impl Into<String>,
        qty: impl core::fmt::Display,
    ) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            expires_at: expires_at.into(),
            qty: qty.to_string(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Pre-populate a draft from an existing product (edit form).
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name().to_string(),
            description: product.description().to_string(),
            expires_at: product
                .expires_at()
                .map(date::format_iso)
                .unwrap_or_default(),
            qty: product.qty().to_string(),
        }
    }
}
