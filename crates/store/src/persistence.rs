//! Reading and writing the product list.

use serde_json::Value;

use pantry_products::{Limits, Product, SanitizeReport, sanitize_records};

use crate::storage::{DurableStorage, StorageError};

/// Where the initial product list came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadSource {
    /// A stored array was parsed (possibly with repairs, see the report).
    Stored,
    /// Nothing stored under the key yet.
    Missing,
    /// The stored value is not a JSON array; treated as no data.
    Unparsable,
    /// The backend failed to read; treated as no data.
    ReadFailed(String),
}

/// Summary of the startup load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub source: LoadSource,
    pub sanitize: SanitizeReport,
}

impl LoadReport {
    fn empty(source: LoadSource) -> Self {
        Self {
            source,
            sanitize: SanitizeReport::default(),
        }
    }
}

/// Read and sanitize the product list stored under `key`.
///
/// Never fails: absent, unreadable or corrupt data all yield an empty list, and the
/// report says which case applied.
pub fn read_products<S>(storage: &S, key: &str, limits: &Limits) -> (Vec<Product>, LoadReport)
where
    S: DurableStorage + ?Sized,
{
    let raw = match storage.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return (Vec::new(), LoadReport::empty(LoadSource::Missing)),
        Err(err) => {
            tracing::warn!(key, error = %err, "failed to read stored products; starting empty");
            return (
                Vec::new(),
                LoadReport::empty(LoadSource::ReadFailed(err.to_string())),
            );
        }
    };

    let values = match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Array(values)) => values,
        Ok(_) => {
            tracing::warn!(key, "stored products are not a JSON array; starting empty");
            return (Vec::new(), LoadReport::empty(LoadSource::Unparsable));
        }
        Err(err) => {
            tracing::warn!(key, error = %err, "stored products are not valid JSON; starting empty");
            return (Vec::new(), LoadReport::empty(LoadSource::Unparsable));
        }
    };

    let (products, sanitize) = sanitize_records(values, limits);
    (
        products,
        LoadReport {
            source: LoadSource::Stored,
            sanitize,
        },
    )
}

/// Serialize the whole list (insertion order) and write it under `key`.
pub fn write_products<S>(storage: &S, key: &str, products: &[Product]) -> Result<(), StorageError>
where
    S: DurableStorage + ?Sized,
{
    let payload = serde_json::to_string(products)?;
    storage.set(key, &payload)
}
