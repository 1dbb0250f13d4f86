//! Append-only, human-readable receipt log.

use crate::StoreResult;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// File name of the receipt log inside the data directory.
pub const RECEIPT_FILE_NAME: &str = "bill_receipt.txt";

/// Free-form receipt blocks appended one after another. Never parsed back.
#[derive(Debug, Clone)]
pub struct ReceiptLog {
    path: PathBuf,
}

impl ReceiptLog {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(RECEIPT_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `block` to the log, creating the file on first use.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the file cannot be opened or written.
    pub fn append(&self, block: &str) -> StoreResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(block.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_append_accumulates_blocks() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let log = ReceiptLog::new(temp_dir.path());

        log.append("first\n").unwrap();
        log.append("second\n").unwrap();

        let contents = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(contents, "first\nsecond\n");
    }
}
