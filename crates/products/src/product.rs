use core::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};
use icu_collator::{Collator, CollatorOptions};
use icu_locid::locale;
use serde::{Serialize, Serializer};

use pantry_core::{Entity, ProductId};
use pantry_events::Event;

use crate::validation::ValidatedDraft;

/// A pantry product.
///
/// Invariant: `qty >= 1` for as long as the product exists. Running out removes it.
/// `name` is trimmed and non-empty. `expires_at` is only `None` for a record loaded from
/// storage without a usable date; the edit form then asks for one.
///
/// Serializes to the storage record shape
/// (`{"id", "name", "description", "expiresAt": "yyyy-mm-dd", "qty"}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    id: ProductId,
    name: String,
    description: String,
    #[serde(serialize_with = "serialize_expiry")]
    expires_at: Option<NaiveDate>,
    qty: u32,
}

/// An undated record is written back as an empty `expiresAt` string.
fn serialize_expiry<S: Serializer>(
    date: &Option<NaiveDate>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match date {
        Some(date) => date.serialize(serializer),
        None => serializer.serialize_str(""),
    }
}

/// Result of taking one unit out of a product.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Stock {
    /// Units left after the decrement (always >= 1).
    Remaining(u32),
    /// The last unit was taken; the product must be removed.
    Depleted,
}

impl Product {
    /// Create a product from an approved draft.
    pub fn create(id: ProductId, draft: ValidatedDraft) -> Self {
        let (name, description, expires_at, qty) = draft.into_parts();
        Self {
            id,
            name,
            description,
            expires_at: Some(expires_at),
            qty,
        }
    }

    /// Rebuild a product from already-sanitized stored values.
    pub(crate) fn restore(
        id: ProductId,
        name: String,
        description: String,
        expires_at: Option<NaiveDate>,
        qty: u32,
    ) -> Self {
        Self {
            id,
            name,
            description,
            expires_at,
            qty: qty.max(1),
        }
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn expires_at(&self) -> Option<NaiveDate> {
        self.expires_at
    }

    pub fn qty(&self) -> u32 {
        self.qty
    }

    /// A single unit left.
    pub fn is_low_stock(&self) -> bool {
        self.qty == 1
    }

    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expires_at
            .is_some_and(|date| crate::date::is_expired(date, today))
    }

    /// Replace every field except the identifier.
    pub fn apply_edit(&mut self, draft: ValidatedDraft) {
        let (name, description, expires_at, qty) = draft.into_parts();
        self.name = name;
        self.description = description;
        self.expires_at = Some(expires_at);
        self.qty = qty;
    }

    /// Take one unit. Leaves the product untouched when it would reach zero.
    pub fn take_one(&mut self) -> Stock {
        if self.qty <= 1 {
            return Stock::Depleted;
        }
        self.qty -= 1;
        Stock::Remaining(self.qty)
    }

    /// Display ordering: by name under Spanish collation, ties broken by exact name.
    pub fn display_order(a: &Product, b: &Product) -> Ordering {
        compare_names(&a.name, &b.name)
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

thread_local! {
    static NAME_COLLATOR: Option<Collator> =
        match Collator::try_new(&locale!("es").into(), CollatorOptions::new()) {
            Ok(collator) => Some(collator),
            Err(err) => {
                tracing::warn!(error = %err, "name collator unavailable, sorting by code point");
                None
            }
        };
}

pub(crate) fn compare_names(a: &str, b: &str) -> Ordering {
    NAME_COLLATOR
        .with(|collator| match collator {
            Some(collator) => collator.compare(a, b),
            None => a.to_lowercase().cmp(&b.to_lowercase()),
        })
        .then_with(|| a.cmp(b))
}

/// Event: ProductAdded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductAdded {
    pub product: Product,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ProductUpdated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductUpdated {
    pub before: Product,
    pub after: Product,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockDecremented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockDecremented {
    pub product_id: ProductId,
    pub remaining: u32,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RemovalReason {
    /// Deleted by the user.
    Explicit,
    /// The last unit was decremented.
    Depleted,
}

/// Event: ProductRemoved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRemoved {
    pub product: Product,
    pub reason: RemovalReason,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductEvent {
    ProductAdded(ProductAdded),
    ProductUpdated(ProductUpdated),
    StockDecremented(StockDecremented),
    ProductRemoved(ProductRemoved),
}

impl ProductEvent {
    /// Identifier of the product the event is about.
    pub fn product_id(&self) -> ProductId {
        match self {
            ProductEvent::ProductAdded(e) => e.product.id_typed(),
            ProductEvent::ProductUpdated(e) => e.after.id_typed(),
            ProductEvent::StockDecremented(e) => e.product_id,
            ProductEvent::ProductRemoved(e) => e.product.id_typed(),
        }
    }
}

impl Event for ProductEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ProductEvent::ProductAdded(_) => "pantry.product.added",
            ProductEvent::ProductUpdated(_) => "pantry.product.updated",
            ProductEvent::StockDecremented(_) => "pantry.product.decremented",
            ProductEvent::ProductRemoved(_) => "pantry.product.removed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ProductEvent::ProductAdded(e) => e.occurred_at,
            ProductEvent::ProductUpdated(e) => e.occurred_at,
            ProductEvent::StockDecremented(e) => e.occurred_at,
            ProductEvent::ProductRemoved(e) => e.occurred_at,
        }
    }
}
