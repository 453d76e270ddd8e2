//! Blob-budget configuration for chunked reads.

use crate::{Error, Result};
use log::debug;
use std::env;
use sysinfo::System;

/// Smallest budget chosen automatically, in elements.
pub const MIN_AUTO_BLOB_ELEMENTS: usize = 80_000;

/// Environment variable overriding the automatic budget (elements;
/// negative disables chunking).
pub const SLAB_SIZE_ENV: &str = "NXGRID_SLAB_SIZE";

/// How many elements a single slab may hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BlobBudget {
    /// [`SLAB_SIZE_ENV`] if set, otherwise a fraction of available memory
    /// with a floor of [`MIN_AUTO_BLOB_ELEMENTS`].
    #[default]
    Auto,
    /// Fixed element count (clamped to at least 1).
    Elements(usize),
    /// Always read whole arrays.
    Unlimited,
}

/// Configuration for [`crate::ChunkedReader`].
#[derive(Clone, Debug, PartialEq)]
pub struct ReaderConfig {
    pub blob_budget: BlobBudget,
    /// Fraction of available memory used by [`BlobBudget::Auto`]
    /// (0.0 < fraction <= 1.0). The product is taken as an element count.
    pub memory_fraction: f64,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            blob_budget: BlobBudget::Auto,
            memory_fraction: 0.01,
        }
    }
}

impl ReaderConfig {
    /// Set a fixed budget in elements.
    ///
    /// Values less than 1 are clamped to 1. Use
    /// [`Self::try_with_blob_elements`] to surface 0 as an error instead.
    #[must_use]
    pub fn with_blob_elements(mut self, elements: usize) -> Self {
        self.blob_budget = BlobBudget::Elements(elements.max(1));
        self
    }

    /// Fallible variant of [`Self::with_blob_elements`].
    ///
    /// # Errors
    /// Returns an error if `elements` is 0.
    pub fn try_with_blob_elements(mut self, elements: usize) -> Result<Self> {
        if elements == 0 {
            return Err(Error::InvalidConfig(
                "blob budget must be at least 1 element".to_string(),
            ));
        }
        self.blob_budget = BlobBudget::Elements(elements);
        Ok(self)
    }

    /// Disable chunking.
    #[must_use]
    pub fn unlimited(mut self) -> Self {
        self.blob_budget = BlobBudget::Unlimited;
        self
    }

    /// Set the fraction of available memory used by the automatic budget.
    #[must_use]
    pub fn with_memory_fraction(mut self, fraction: f64) -> Self {
        self.memory_fraction = fraction;
        self
    }

    /// Resolve the budget in elements; `None` means whole-array reads.
    ///
    /// # Errors
    /// Returns an error if [`SLAB_SIZE_ENV`] is not an integer, the memory
    /// fraction is out of range, or system memory cannot be queried.
    pub fn resolve_blob_budget(&self) -> Result<Option<usize>> {
        let env_value = match self.blob_budget {
            BlobBudget::Auto => env::var(SLAB_SIZE_ENV).ok(),
            _ => None,
        };
        self.resolve_with_override(env_value.as_deref())
    }

    fn resolve_with_override(&self, env_value: Option<&str>) -> Result<Option<usize>> {
        match self.blob_budget {
            BlobBudget::Elements(n) => Ok(Some(n.max(1))),
            BlobBudget::Unlimited => Ok(None),
            BlobBudget::Auto => {
                if let Some(raw) = env_value {
                    let value: i64 = raw.trim().parse().map_err(|_| {
                        Error::InvalidConfig(format!("{SLAB_SIZE_ENV} must be an integer, got {raw:?}"))
                    })?;
                    debug!("{SLAB_SIZE_ENV}={value}");
                    return Ok(usize::try_from(value).ok().map(|n| n.max(1)));
                }
                self.memory_budget().map(Some)
            }
        }
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    fn memory_budget(&self) -> Result<usize> {
        if !(0.0 < self.memory_fraction && self.memory_fraction <= 1.0) {
            return Err(Error::InvalidConfig(
                "memory_fraction must be in (0.0, 1.0]".to_string(),
            ));
        }
        let mut system = System::new();
        system.refresh_memory();
        let available = system.available_memory();
        if available == 0 {
            return Err(Error::InvalidConfig(
                "available system memory reported as 0".to_string(),
            ));
        }
        let budget = (available as f64 * self.memory_fraction).floor() as u64;
        let budget = usize::try_from(budget).unwrap_or(usize::MAX);
        Ok(budget.max(MIN_AUTO_BLOB_ELEMENTS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_budget() {
        let config = ReaderConfig::default().with_blob_elements(0);
        assert_eq!(config.resolve_blob_budget().unwrap(), Some(1));
        let config = ReaderConfig::default().with_blob_elements(1000);
        assert_eq!(config.resolve_blob_budget().unwrap(), Some(1000));
        assert!(ReaderConfig::default().try_with_blob_elements(0).is_err());
        assert_eq!(ReaderConfig::default().unlimited().resolve_blob_budget().unwrap(), None);
    }

    #[test]
    fn test_env_override() {
        let config = ReaderConfig::default();
        assert_eq!(config.resolve_with_override(Some("5000")).unwrap(), Some(5000));
        assert_eq!(config.resolve_with_override(Some(" 0 ")).unwrap(), Some(1));
        assert_eq!(config.resolve_with_override(Some("-1")).unwrap(), None);
        assert!(matches!(
            config.resolve_with_override(Some("lots")),
            Err(Error::InvalidConfig(_))
        ));
        // explicit settings ignore the environment
        let fixed = config.with_blob_elements(7);
        assert_eq!(fixed.resolve_with_override(Some("-1")).unwrap(), Some(7));
    }

    #[test]
    fn test_auto_budget_floor() {
        let config = ReaderConfig::default().with_memory_fraction(1e-12);
        let budget = config.resolve_with_override(None).unwrap().unwrap();
        assert_eq!(budget, MIN_AUTO_BLOB_ELEMENTS);
    }

    #[test]
    fn test_invalid_fraction() {
        let config = ReaderConfig::default().with_memory_fraction(1.5);
        assert!(matches!(
            config.resolve_with_override(None),
            Err(Error::InvalidConfig(_))
        ));
    }
}
