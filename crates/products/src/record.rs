//! Stored product records and load-time sanitization.
//!
//! Durable storage holds a single JSON array. Anything may have happened to it since it
//! was written (manual edits, older app versions), so records are read loosely and every
//! invariant is re-established here before a `Product` is built.

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::Value;

use pantry_core::ProductId;

use crate::date;
use crate::product::Product;
use crate::text::{char_len, truncate_chars};
use crate::validation::Limits;

/// Name given to stored records whose name is missing or blank.
pub const UNNAMED: &str = "Sin nombre";

/// A stored record with no shape guarantees.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawProductRecord {
    id: Value,
    name: Value,
    description: Value,
    expires_at: Value,
    qty: Value,
}

/// What sanitization had to do to a stored list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SanitizeReport {
    /// Records loaded (possibly repaired).
    pub loaded: usize,
    /// Elements discarded (not an object).
    pub dropped: usize,
    /// Records kept but with at least one field rewritten.
    pub repaired: usize,
    /// Records kept without a usable expiration date (shown blank until edited).
    pub undated: usize,
}

impl SanitizeReport {
    pub fn is_clean(&self) -> bool {
        self.dropped == 0 && self.repaired == 0 && self.undated == 0
    }
}

/// Sanitize a parsed storage array into products (insertion order preserved).
pub fn sanitize_records(values: Vec<Value>, limits: &Limits) -> (Vec<Product>, SanitizeReport) {
    let mut report = SanitizeReport::default();
    let mut seen = HashSet::new();
    let mut products = Vec::with_capacity(values.len());

    for (index, value) in values.into_iter().enumerate() {
        let raw: RawProductRecord = match value {
            Value::Object(_) => match serde_json::from_value(value) {
                Ok(raw) => raw,
                Err(err) => {
                    tracing::warn!(index, error = %err, "dropping unreadable product record");
                    report.dropped += 1;
                    continue;
                }
            },
            _ => {
                tracing::warn!(index, "dropping product record that is not an object");
                report.dropped += 1;
                continue;
            }
        };

        let (product, repaired) = sanitize_one(raw, limits, &mut seen);
        if repaired {
            tracing::warn!(index, id = %product.id_typed(), "repaired stored product record");
            report.repaired += 1;
        }
        if product.expires_at().is_none() {
            tracing::warn!(index, id = %product.id_typed(), "stored product has no valid expiration date");
            report.undated += 1;
        }
        report.loaded += 1;
        products.push(product);
    }

    (products, report)
}

fn sanitize_one(
    raw: RawProductRecord,
    limits: &Limits,
    seen: &mut HashSet<ProductId>,
) -> (Product, bool) {
    let expires_at = raw.expires_at.as_str().and_then(date::parse_iso);
    let mut repaired = false;

    let id = match raw.id.as_str().and_then(|s| s.parse::<ProductId>().ok()) {
        Some(id) if !seen.contains(&id) => id,
        _ => {
            repaired = true;
            fresh_id(seen)
        }
    };
    seen.insert(id);

    let name = match raw.name.as_str().map(str::trim) {
        Some(name) if !name.is_empty() => {
            let kept = truncate_chars(name, limits.name_max).trim_end().to_string();
            repaired |= kept != raw.name.as_str().unwrap_or_default();
            kept
        }
        _ => {
            repaired = true;
            truncate_chars(UNNAMED, limits.name_max).trim_end().to_string()
        }
    };

    let description = match &raw.description {
        Value::String(d) if char_len(d) <= limits.description_max => d.clone(),
        Value::String(d) => {
            repaired = true;
            truncate_chars(d, limits.description_max)
        }
        Value::Null => String::new(),
        _ => {
            repaired = true;
            String::new()
        }
    };

    let (qty, qty_repaired) = sanitize_qty(&raw.qty, limits.qty_max);
    repaired |= qty_repaired;

    (
        Product::restore(id, name, description, expires_at, qty),
        repaired,
    )
}

fn fresh_id(seen: &HashSet<ProductId>) -> ProductId {
    loop {
        let id = ProductId::new();
        if !seen.contains(&id) {
            return id;
        }
    }
}

/// Coerce a stored quantity into `[1, max]`. Returns whether the value had to change.
fn sanitize_qty(value: &Value, max: u32) -> (u32, bool) {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match number {
        Some(n) if n.is_finite() => {
            let clamped = n.floor().clamp(1.0, f64::from(max));
            // Clamped into [1, max], so the cast is exact.
            let qty = clamped as u32;
            let exact = matches!(value, Value::Number(_)) && f64::from(qty) == n;
            (qty, !exact)
        }
        _ => (1, true),
    }
}
