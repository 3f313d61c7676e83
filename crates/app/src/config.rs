//! Application configuration.

use pantry_products::{OversizeQty, ValidatorConfig};
use pantry_store::{ConfigError, StoreConfig};

pub const ENV_NAME_MAX: &str = "PANTRY_NAME_MAX";
pub const ENV_DESCRIPTION_MAX: &str = "PANTRY_DESCRIPTION_MAX";
pub const ENV_QTY_MAX: &str = "PANTRY_QTY_MAX";
pub const ENV_OVERSIZE_QTY: &str = "PANTRY_OVERSIZE_QTY";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PantryConfig {
    pub store: StoreConfig,
    pub validator: ValidatorConfig,
}

impl PantryConfig {
    /// Defaults overridden by `PANTRY_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let store = StoreConfig::from_lookup(&lookup)?;
        let mut validator = ValidatorConfig::default();

        if let Some(v) = lookup(ENV_NAME_MAX) {
            validator.limits.name_max = parse_positive(ENV_NAME_MAX, &v)?;
        }
        if let Some(v) = lookup(ENV_DESCRIPTION_MAX) {
            validator.limits.description_max = parse_positive(ENV_DESCRIPTION_MAX, &v)?;
        }
        if let Some(v) = lookup(ENV_QTY_MAX) {
            validator.limits.qty_max = parse_positive(ENV_QTY_MAX, &v)?;
        }
        if let Some(v) = lookup(ENV_OVERSIZE_QTY) {
            validator.oversize_qty = v
                .parse::<OversizeQty>()
                .map_err(|reason| ConfigError::invalid(ENV_OVERSIZE_QTY, v.as_str(), reason))?;
        }

        Ok(Self { store, validator })
    }
}

fn parse_positive<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: core::str::FromStr + PartialOrd + Default,
    T::Err: core::fmt::Display,
{
    let value: T = raw
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::invalid(var, raw, e.to_string()))?;
    if value <= T::default() {
        return Err(ConfigError::invalid(var, raw, "must be greater than zero"));
    }
    Ok(value)
}
