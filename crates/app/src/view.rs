//! Display rows for the product list.

use chrono::NaiveDate;

use pantry_core::ProductId;
use pantry_products::{Product, date};
use pantry_store::ProductStore;

/// One rendered line of the product table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRow {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    /// `dd/mm/yyyy`, empty when the stored record had no usable date.
    pub expires_on: String,
    pub qty: u32,
    /// Down to the last unit.
    pub low_stock: bool,
    pub expired: bool,
}

impl ProductRow {
    pub fn from_product(product: &Product, today: NaiveDate) -> Self {
        Self {
            id: product.id_typed(),
            name: product.name().to_string(),
            description: product.description().to_string(),
            expires_on: product
                .expires_at()
                .map(date::format_display)
                .unwrap_or_default(),
            qty: product.qty(),
            low_stock: product.is_low_stock(),
            expired: product.is_expired(today),
        }
    }
}

/// Rows in display order (by name).
pub fn rows(store: &ProductStore, today: NaiveDate) -> Vec<ProductRow> {
    store
        .list()
        .into_iter()
        .map(|p| ProductRow::from_product(p, today))
        .collect()
}
