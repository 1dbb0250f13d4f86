//! Clinic Record Store
//!
//! This crate persists the clinic's entity collections as JSON arrays of flat records, one
//! file per collection, and exposes the small set of operations every role module uses.
//!
//! ## Storage Model
//!
//! ```text
//! <data_dir>/
//! ├── user.txt          # [ { "userID": "U1", ... }, ... ]
//! ├── patient.txt
//! ├── appointment.txt
//! ├── medicine.txt
//! ├── income.txt
//! └── bill_receipt.txt  # append-only, human-readable receipts
//! ```
//!
//! - Every operation reloads the whole collection, mutates it in memory, and rewrites the
//!   whole file. There is no locking and no atomic rename: two processes racing on the
//!   same file will lose the earlier writer's change.
//! - A missing or undecodable file reads as an empty collection.
//! - Each collection declares its identifier field explicitly (see [`Collection`]).
//!
//! ## Example Usage
//!
//! ```no_run
//! use clinic_store::{Collection, MatchMode, RecordStore};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = RecordStore::new(Path::new("data"))?;
//! let booked = store.find(Collection::Appointments, MatchMode::And, &[("status", "booked")]);
//! println!("{} booked appointments", booked.len());
//! # Ok(())
//! # }
//! ```

mod collection;
mod entity;
pub mod lenient;
mod receipts;
mod store;

pub use collection::{Collection, MatchMode};
pub use entity::Entity;
pub use receipts::{ReceiptLog, RECEIPT_FILE_NAME};
pub use store::{field_text, Record, RecordStore};

/// Errors that can occur during record store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Data directory exists but is not a directory
    #[error("Invalid data directory: {0}")]
    InvalidDataDirectory(String),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be encoded
    #[error("failed to serialise record: {0}")]
    Serialization(serde_json::Error),

    /// A stored record could not be decoded into its typed form
    #[error("failed to deserialise record: {0}")]
    Deserialization(serde_json::Error),

    /// A typed entity did not encode to a JSON object
    #[error("entity for {0} did not encode to a flat record")]
    NotARecord(Collection),

    /// A match mode other than `and`/`or` was requested
    #[error("Mode must be 'and' or 'or', got: '{0}'")]
    InvalidMode(String),

    /// Identifier allocation failed
    #[error("identifier error: {0}")]
    Id(#[from] clinic_ids::IdError),
}

/// Result type for record store operations.
pub type StoreResult<T> = Result<T, StoreError>;
