//! Product form validation.
//!
//! The validator is the gatekeeper for every store mutation that originates from a user
//! draft. It is pure: it reads a draft and a calendar date and returns a [`Validation`],
//! never touching the store. Approval is expressed in the type system: the store's `add`
//! and `update` only accept a [`ValidatedDraft`], which only this module can build.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use thiserror::Error;

use crate::date;
use crate::draft::ProductDraft;
use crate::text::{char_len, truncate_chars};

pub const DEFAULT_NAME_MAX: usize = 20;
pub const DEFAULT_DESCRIPTION_MAX: usize = 100;
pub const DEFAULT_QTY_MAX: u32 = 1_000_000;

/// Form fields, in display order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Name,
    Description,
    ExpiresAt,
    Qty,
}

impl Field {
    /// Field key as used in the storage record.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Description => "description",
            Field::ExpiresAt => "expiresAt",
            Field::Qty => "qty",
        }
    }
}

impl core::fmt::Display for Field {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-field validation failure (or advisory).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    #[error("name is required")]
    EmptyName,

    #[error("name must be at most {max} characters")]
    NameTooLong { max: usize },

    #[error("expiration date is required")]
    MissingDate,

    #[error("expiration date must be a yyyy-mm-dd date")]
    InvalidDate,

    #[error("expiration date cannot be in the past")]
    PastDate,

    #[error("quantity must be a whole number of at least 1")]
    InvalidQty,

    #[error("quantity cannot exceed {max}")]
    QtyTooLarge { max: u32 },
}

impl FieldError {
    /// Field the error belongs to.
    pub fn field(&self) -> Field {
        match self {
            FieldError::EmptyName | FieldError::NameTooLong { .. } => Field::Name,
            FieldError::MissingDate | FieldError::InvalidDate | FieldError::PastDate => {
                Field::ExpiresAt
            }
            FieldError::InvalidQty | FieldError::QtyTooLarge { .. } => Field::Qty,
        }
    }
}

/// At most one error per field.
pub type FieldErrors = BTreeMap<Field, FieldError>;

/// What to do with a quantity above [`Limits::qty_max`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum OversizeQty {
    /// Clamp to the cap and report a non-blocking `QtyTooLarge` advisory.
    #[default]
    Clamp,
    /// Report `QtyTooLarge` as a blocking error.
    Reject,
}

impl core::str::FromStr for OversizeQty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clamp" => Ok(OversizeQty::Clamp),
            "reject" => Ok(OversizeQty::Reject),
            other => Err(format!("unknown oversize quantity policy: {other:?}")),
        }
    }
}

/// Field length and quantity caps. Shared by validation and load-time sanitization.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Limits {
    pub name_max: usize,
    pub description_max: usize,
    pub qty_max: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            name_max: DEFAULT_NAME_MAX,
            description_max: DEFAULT_DESCRIPTION_MAX,
            qty_max: DEFAULT_QTY_MAX,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct ValidatorConfig {
    pub limits: Limits,
    pub oversize_qty: OversizeQty,
}

/// A draft the validator approved, with every field normalized.
///
/// Can only be obtained from [`Validation::approved`] / [`Validation::into_result`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedDraft {
    name: String,
    description: String,
    expires_at: NaiveDate,
    qty: u32,
}

impl ValidatedDraft {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn expires_at(&self) -> NaiveDate {
        self.expires_at
    }

    pub fn qty(&self) -> u32 {
        self.qty
    }

    pub(crate) fn into_parts(self) -> (String, String, NaiveDate, u32) {
        (self.name, self.description, self.expires_at, self.qty)
    }
}

/// Outcome of validating a draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    errors: FieldErrors,
    advisories: FieldErrors,
    approved: Option<ValidatedDraft>,
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn error(&self, field: Field) -> Option<FieldError> {
        self.errors.get(&field).copied()
    }

    /// Non-blocking notes (e.g. a clamped quantity).
    pub fn advisories(&self) -> &FieldErrors {
        &self.advisories
    }

    pub fn approved(&self) -> Option<&ValidatedDraft> {
        self.approved.as_ref()
    }

    pub fn into_result(self) -> Result<ValidatedDraft, FieldErrors> {
        match self.approved {
            Some(approved) if self.errors.is_empty() => Ok(approved),
            _ => Err(self.errors),
        }
    }
}

/// Validate a draft with the default configuration.
pub fn validate(draft: &ProductDraft, today: NaiveDate) -> Validation {
    Validator::default().validate(draft, today)
}

#[derive(Debug, Copy, Clone, Default)]
pub struct Validator {
    config: ValidatorConfig,
}

impl Validator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub fn validate(&self, draft: &ProductDraft, today: NaiveDate) -> Validation {
        let mut errors = FieldErrors::new();
        let mut advisories = FieldErrors::new();

        let name = self.check_name(&draft.name).map_err(|e| record(&mut errors, e)).ok();
        let description = self.normalize_description(&draft.description);
        let expires_at = check_expiry(&draft.expires_at, today)
            .map_err(|e| record(&mut errors, e))
            .ok();
        let qty = match self.check_qty(&draft.qty) {
            Ok((qty, advisory)) => {
                if let Some(advisory) = advisory {
                    record(&mut advisories, advisory);
                }
                Some(qty)
            }
            Err(e) => {
                record(&mut errors, e);
                None
            }
        };

        let approved = match (name, expires_at, qty) {
            (Some(name), Some(expires_at), Some(qty)) if errors.is_empty() => {
                Some(ValidatedDraft {
                    name,
                    description,
                    expires_at,
                    qty,
                })
            }
            _ => None,
        };

        Validation {
            errors,
            advisories,
            approved,
        }
    }

    fn check_name(&self, raw: &str) -> Result<String, FieldError> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(FieldError::EmptyName);
        }
        let max = self.config.limits.name_max;
        if char_len(name) > max {
            return Err(FieldError::NameTooLong { max });
        }
        Ok(name.to_string())
    }

    fn normalize_description(&self, raw: &str) -> String {
        truncate_chars(raw.trim(), self.config.limits.description_max)
    }

    /// Returns the accepted quantity plus an optional advisory.
    fn check_qty(&self, raw: &str) -> Result<(u32, Option<FieldError>), FieldError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(FieldError::InvalidQty);
        }
        let value: f64 = raw.parse().map_err(|_| FieldError::InvalidQty)?;
        if !value.is_finite() || value.fract() != 0.0 || value < 1.0 {
            return Err(FieldError::InvalidQty);
        }

        let max = self.config.limits.qty_max;
        if value > f64::from(max) {
            let too_large = FieldError::QtyTooLarge { max };
            return match self.config.oversize_qty {
                OversizeQty::Clamp => Ok((max, Some(too_large))),
                OversizeQty::Reject => Err(too_large),
            };
        }

        // In range [1, max] and integral, so the cast is exact.
        Ok((value as u32, None))
    }
}

/// Check an expiration date field on its own.
///
/// Also used by the edit form to flag already-expired products as soon as it opens.
pub fn check_expiry(raw: &str, today: NaiveDate) -> Result<NaiveDate, FieldError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(FieldError::MissingDate);
    }
    let expires_at = date::parse_iso(raw).ok_or(FieldError::InvalidDate)?;
    if date::is_expired(expires_at, today) {
        return Err(FieldError::PastDate);
    }
    Ok(expires_at)
}

fn record(map: &mut FieldErrors, error: FieldError) {
    map.insert(error.field(), error);
}
