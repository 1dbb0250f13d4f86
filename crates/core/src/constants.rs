//! Constants used throughout the clinic core crate.

/// Default directory for the collection files when none is configured.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Environment variable naming the data directory.
pub const DATA_DIR_ENV: &str = "CLINIC_DATA_DIR";

/// Environment variable selecting the billing mode.
pub const BILLING_MODE_ENV: &str = "CLINIC_BILLING_MODE";

/// Environment variable overriding the pharmacist low-stock alert limit.
pub const LOW_STOCK_LIMIT_ENV: &str = "CLINIC_LOW_STOCK_LIMIT";

/// Minimum spacing, in minutes, between a doctor's appointments on the same date.
pub const CONFLICT_WINDOW_MINUTES: i64 = 120;

/// Pharmacist alert: medicines with `stock <= LOW_STOCK_LIMIT` are flagged.
pub const LOW_STOCK_LIMIT: u32 = 5;

/// Administrator summary: medicines with `stock < SUMMARY_LOW_STOCK_LIMIT` are listed.
pub const SUMMARY_LOW_STOCK_LIMIT: u32 = 20;

/// Number of login attempts before the console gives up.
pub const MAX_LOGIN_ATTEMPTS: usize = 3;

/// Status written on newly created users and patients.
pub const ACTIVE_STATUS: &str = "active";

/// Currency label used on receipts and summaries.
pub const CURRENCY: &str = "RM";

/// Date format of every stored `date`/`dob` field.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Time format of every stored appointment `time` field.
pub const TIME_FORMAT: &str = "%H:%M";
