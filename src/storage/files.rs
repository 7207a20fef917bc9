use redb::{ReadableTable, WriteTransaction};

use super::db::Handle;
use super::ledger::Ledger;
use super::models::FileRecord;
use crate::error::StoreError;

impl Ledger {
    // ========================================================================
    // File records
    // ========================================================================

    /// Insert a file record unless its hash is already recorded.
    /// Returns whether a new record was written.
    pub fn put_file_record(
        &self,
        tx: Option<&WriteTransaction>,
        record: &FileRecord,
    ) -> Result<bool, StoreError> {
        debug_assert!(!record.hash.is_empty(), "file hash must not be empty");

        self.handle(tx).write(|txn| {
            let mut table = txn.open_table(self.tables().files())?;
            if table.get(record.hash.as_str())?.is_some() {
                return Ok(false);
            }
            let data = rmp_serde::to_vec_named(record)?;
            table.insert(record.hash.as_str(), data.as_slice())?;
            tracing::debug!(hash = %record.hash, byte_size = record.byte_size, "Recorded file");
            Ok(true)
        })
    }

    /// Get the file record for a hash
    pub fn file_record(
        &self,
        tx: Option<&WriteTransaction>,
        hash: &str,
    ) -> Result<Option<FileRecord>, StoreError> {
        match self.handle(tx) {
            Handle::Database(db) => {
                let read_txn = db.begin_read()?;
                let table = read_txn.open_table(self.tables().files())?;
                read_file_record(&table, hash)
            }
            Handle::Transaction(txn) => {
                let table = txn.open_table(self.tables().files())?;
                read_file_record(&table, hash)
            }
        }
    }

    /// Ensure every hash has a file record. Fails with
    /// [`StoreError::FileNotExists`] listing the missing hashes.
    pub fn check_file<S: AsRef<str>>(
        &self,
        tx: Option<&WriteTransaction>,
        files: &[S],
    ) -> Result<(), StoreError> {
        let missing = match self.handle(tx) {
            Handle::Database(db) => {
                let read_txn = db.begin_read()?;
                let table = read_txn.open_table(self.tables().files())?;
                missing_files(&table, files)?
            }
            Handle::Transaction(txn) => {
                let table = txn.open_table(self.tables().files())?;
                missing_files(&table, files)?
            }
        };

        if missing.is_empty() {
            Ok(())
        } else {
            Err(StoreError::FileNotExists(missing))
        }
    }
}

fn read_file_record(
    table: &impl ReadableTable<&'static str, &'static [u8]>,
    hash: &str,
) -> Result<Option<FileRecord>, StoreError> {
    match table.get(hash)? {
        Some(data) => {
            let record: FileRecord = rmp_serde::from_slice(data.value())?;
            Ok(Some(record))
        }
        None => Ok(None),
    }
}

/// Hashes without a file record, in input order and without repeats.
pub(super) fn missing_files<S: AsRef<str>>(
    table: &impl ReadableTable<&'static str, &'static [u8]>,
    files: &[S],
) -> Result<Vec<String>, StoreError> {
    let mut missing: Vec<String> = Vec::new();
    for file in files {
        let file = file.as_ref();
        if table.get(file)?.is_none() && !missing.iter().any(|m| m == file) {
            missing.push(file.to_string());
        }
    }
    Ok(missing)
}
