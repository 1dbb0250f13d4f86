//! Core runtime configuration.
//!
//! Configuration is resolved once at process start-up and then passed into every service as
//! an `Arc<CoreConfig>`. Services never read environment variables while handling an
//! operation.

use crate::constants::{
    BILLING_MODE_ENV, DATA_DIR_ENV, DEFAULT_DATA_DIR, LOW_STOCK_LIMIT, LOW_STOCK_LIMIT_ENV,
    SUMMARY_LOW_STOCK_LIMIT,
};
use crate::{ClinicError, ClinicResult};
use clinic_store::{ReceiptLog, RecordStore};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// How the accountant may bill an appointment that has not been consulted yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BillingMode {
    /// A `booked` appointment may be billed; the bill is recorded `unpaid` and the
    /// appointment stays `booked`.
    #[default]
    Deferred,
    /// Only `consulted` appointments may be billed.
    ConsultedOnly,
}

impl FromStr for BillingMode {
    type Err = ClinicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "deferred" => Ok(BillingMode::Deferred),
            "consulted-only" => Ok(BillingMode::ConsultedOnly),
            other => Err(ClinicError::Validation(format!(
                "unknown billing mode '{}' (expected 'deferred' or 'consulted-only')",
                other
            ))),
        }
    }
}

impl fmt::Display for BillingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BillingMode::Deferred => f.write_str("deferred"),
            BillingMode::ConsultedOnly => f.write_str("consulted-only"),
        }
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    billing_mode: BillingMode,
    low_stock_limit: u32,
    summary_low_stock_limit: u32,
}

impl CoreConfig {
    /// Create a new `CoreConfig` with the default stock limits.
    pub fn new(data_dir: PathBuf, billing_mode: BillingMode) -> ClinicResult<Self> {
        if data_dir.as_os_str().is_empty() {
            return Err(ClinicError::Validation("data_dir cannot be empty".into()));
        }

        Ok(Self {
            data_dir,
            billing_mode,
            low_stock_limit: LOW_STOCK_LIMIT,
            summary_low_stock_limit: SUMMARY_LOW_STOCK_LIMIT,
        })
    }

    /// Overrides the pharmacist alert limit and the administrator summary limit.
    pub fn with_stock_limits(mut self, low_stock_limit: u32, summary_low_stock_limit: u32) -> Self {
        self.low_stock_limit = low_stock_limit;
        self.summary_low_stock_limit = summary_low_stock_limit;
        self
    }

    /// Resolves configuration from variable lookups such as `std::env::var`.
    ///
    /// `lookup` receives the variable name and returns its value, if set.
    pub fn resolve(lookup: impl Fn(&str) -> Option<String>) -> ClinicResult<Self> {
        let data_dir = data_dir_from_env_value(lookup(DATA_DIR_ENV));
        let billing_mode = billing_mode_from_env_value(lookup(BILLING_MODE_ENV))?;
        let low_stock_limit = low_stock_limit_from_env_value(lookup(LOW_STOCK_LIMIT_ENV))?;

        Ok(Self::new(data_dir, billing_mode)?
            .with_stock_limits(low_stock_limit, SUMMARY_LOW_STOCK_LIMIT))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn billing_mode(&self) -> BillingMode {
        self.billing_mode
    }

    pub fn low_stock_limit(&self) -> u32 {
        self.low_stock_limit
    }

    pub fn summary_low_stock_limit(&self) -> u32 {
        self.summary_low_stock_limit
    }

    /// Opens the record store, creating the data directory if needed.
    pub fn store(&self) -> ClinicResult<RecordStore> {
        Ok(RecordStore::new(&self.data_dir)?)
    }

    pub fn receipts(&self) -> ReceiptLog {
        ReceiptLog::new(&self.data_dir)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse the data directory from an optional value, defaulting to `data`.
pub fn data_dir_from_env_value(value: Option<String>) -> PathBuf {
    non_blank(value)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

/// Parse the billing mode from an optional value, defaulting to [`BillingMode::Deferred`].
pub fn billing_mode_from_env_value(value: Option<String>) -> ClinicResult<BillingMode> {
    non_blank(value)
        .map(|v| v.parse::<BillingMode>())
        .transpose()
        .map(Option::unwrap_or_default)
}

/// Parse the low-stock alert limit from an optional value.
pub fn low_stock_limit_from_env_value(value: Option<String>) -> ClinicResult<u32> {
    non_blank(value)
        .map(|v| {
            v.parse::<u32>().map_err(|_| {
                ClinicError::Validation(format!("{} must be a whole number, got '{}'", LOW_STOCK_LIMIT_ENV, v))
            })
        })
        .transpose()
        .map(|limit| limit.unwrap_or(LOW_STOCK_LIMIT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_resolve_uses_defaults_when_unset() {
        let cfg = CoreConfig::resolve(|_| None).expect("resolve should succeed");
        assert_eq!(cfg.data_dir(), Path::new(DEFAULT_DATA_DIR));
        assert_eq!(cfg.billing_mode(), BillingMode::Deferred);
        assert_eq!(cfg.low_stock_limit(), LOW_STOCK_LIMIT);
        assert_eq!(cfg.summary_low_stock_limit(), SUMMARY_LOW_STOCK_LIMIT);
    }

    #[test]
    fn test_resolve_reads_every_variable() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (DATA_DIR_ENV, "/tmp/clinic"),
            (BILLING_MODE_ENV, "Consulted_Only"),
            (LOW_STOCK_LIMIT_ENV, "8"),
        ]);
        let cfg = CoreConfig::resolve(|k| vars.get(k).map(|v| v.to_string()))
            .expect("resolve should succeed");

        assert_eq!(cfg.data_dir(), Path::new("/tmp/clinic"));
        assert_eq!(cfg.billing_mode(), BillingMode::ConsultedOnly);
        assert_eq!(cfg.low_stock_limit(), 8);
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        assert_eq!(
            data_dir_from_env_value(Some("   ".into())),
            PathBuf::from(DEFAULT_DATA_DIR)
        );
        assert_eq!(
            billing_mode_from_env_value(Some("".into())).unwrap(),
            BillingMode::Deferred
        );
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            billing_mode_from_env_value(Some("later".into())),
            Err(ClinicError::Validation(_))
        ));
        assert!(matches!(
            low_stock_limit_from_env_value(Some("-1".into())),
            Err(ClinicError::Validation(_))
        ));
    }

    #[test]
    fn test_new_rejects_empty_data_dir() {
        assert!(CoreConfig::new(PathBuf::new(), BillingMode::Deferred).is_err());
    }
}
