//! Prefix+number identifiers and their allocation.
//!
//! Every clinic collection identifies its records with a short letter prefix followed by a
//! decimal counter, for example `P3` (patient), `A12` (appointment) or `M1` (medicine).
//!
//! ## Allocation
//!
//! There is no persisted counter. The next identifier is derived from a snapshot of the
//! identifiers already present in a collection:
//!
//! - values whose prefix matches the collection prefix (case-insensitively) are considered
//! - the largest numeric suffix among them is found
//! - the result is `prefix + (max + 1)`, or `prefix + 1` when nothing matches
//!
//! Two allocations made against the same stale snapshot therefore produce the same
//! identifier. Callers serialise allocation with the write that follows it.

mod allocator;

pub use allocator::{next_id, PrefixedId};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IdError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The numeric suffix space for a prefix has been used up
    #[error("No identifiers left for prefix '{0}'")]
    Exhausted(String),
}

/// Result type for identifier operations.
pub type IdResult<T> = Result<T, IdError>;
