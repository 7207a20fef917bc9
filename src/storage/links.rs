use std::collections::HashSet;

use chrono::Utc;
use redb::{ReadableTable, WriteTransaction};

use super::db::Handle;
use super::files::missing_files;
use super::ledger::Ledger;
use super::models::LinkRecord;
use super::tables::LINK_SEQUENCES;
use crate::content::check_hash;
use crate::error::StoreError;

type PairKey = (&'static str, &'static str);

impl Ledger {
    // ========================================================================
    // Links
    // ========================================================================

    /// Link files to an object. Pairs that are already linked are left as
    /// they are.
    pub fn link<S: AsRef<str>>(
        &self,
        tx: Option<&WriteTransaction>,
        object: &str,
        files: &[S],
    ) -> Result<(), StoreError> {
        if object.is_empty() {
            return Err(StoreError::EmptyObject);
        }
        if empty_files(files) {
            return Ok(());
        }
        check_hash(files)?;

        self.handle(tx).write(|txn| {
            let missing = {
                let table = txn.open_table(self.tables().files())?;
                missing_files(&table, files)?
            };
            if !missing.is_empty() {
                return Err(StoreError::FileNotExists(missing));
            }

            let now = Utc::now();
            let mut links = txn.open_table(self.tables().links())?;
            let mut index = txn.open_table(self.tables().object_index())?;
            let mut sequences = txn.open_table(LINK_SEQUENCES)?;

            let mut seq = sequences
                .get(self.tables().links.as_str())?
                .map(|v| v.value())
                .unwrap_or(0);
            let mut linked = 0usize;

            for file in files {
                let file = file.as_ref();
                if links.get((file, object))?.is_some() {
                    continue;
                }
                seq += 1;
                let record = LinkRecord {
                    file: file.to_string(),
                    object: object.to_string(),
                    created_at: now,
                    seq,
                };
                let data = rmp_serde::to_vec_named(&record)?;
                links.insert((file, object), data.as_slice())?;
                index.insert((object, file), ())?;
                linked += 1;
            }

            sequences.insert(self.tables().links.as_str(), seq)?;
            tracing::debug!(object, linked, "Linked files");
            Ok(())
        })
    }

    /// Make sure these files, and only these files, are linked to an object.
    pub fn link_only<S: AsRef<str>>(
        &self,
        tx: Option<&WriteTransaction>,
        object: &str,
        files: &[S],
    ) -> Result<(), StoreError> {
        if object.is_empty() {
            return Err(StoreError::EmptyObject);
        }
        if empty_files(files) {
            return self.unlink_all_of(tx, object);
        }

        self.handle(tx).write(|txn| {
            self.link(Some(txn), object, files)?;
            let keep: HashSet<&str> = files.iter().map(AsRef::as_ref).collect();
            let removed = self.unlink_where(txn, object, |file| !keep.contains(file))?;
            tracing::debug!(object, removed, "Reconciled links");
            Ok(())
        })
    }

    /// Unlink every file from an object.
    pub fn unlink_all_of(
        &self,
        tx: Option<&WriteTransaction>,
        object: &str,
    ) -> Result<(), StoreError> {
        if object.is_empty() {
            return Err(StoreError::EmptyObject);
        }
        self.handle(tx).write(|txn| {
            let removed = self.unlink_where(txn, object, |_| true)?;
            tracing::debug!(object, removed, "Unlinked all files");
            Ok(())
        })
    }

    /// Unlink files from an object. Pairs that are not linked are ignored.
    pub fn unlink<S: AsRef<str>>(
        &self,
        tx: Option<&WriteTransaction>,
        object: &str,
        files: &[S],
    ) -> Result<(), StoreError> {
        if object.is_empty() {
            return Err(StoreError::EmptyObject);
        }
        if empty_files(files) {
            return Ok(());
        }
        check_hash(files)?;

        self.handle(tx).write(|txn| {
            let mut links = txn.open_table(self.tables().links())?;
            let mut index = txn.open_table(self.tables().object_index())?;
            for file in files {
                let file = file.as_ref();
                links.remove((file, object))?;
                index.remove((object, file))?;
            }
            tracing::debug!(object, count = files.len(), "Unlinked files");
            Ok(())
        })
    }

    /// Remove the links of `object` whose file matches `remove`.
    fn unlink_where(
        &self,
        txn: &WriteTransaction,
        object: &str,
        remove: impl Fn(&str) -> bool,
    ) -> Result<usize, StoreError> {
        let mut index = txn.open_table(self.tables().object_index())?;
        let files = object_files(&index, object)?;
        let mut links = txn.open_table(self.tables().links())?;

        let mut removed = 0;
        for file in files.iter().filter(|f| remove(f.as_str())) {
            index.remove((object, file.as_str()))?;
            links.remove((file.as_str(), object))?;
            removed += 1;
        }
        Ok(removed)
    }

    /// Fail with [`StoreError::NotLinked`] unless the file is linked to the object.
    pub fn ensure_linked(
        &self,
        tx: Option<&WriteTransaction>,
        object: &str,
        file: &str,
    ) -> Result<(), StoreError> {
        if self.linked(tx, object, file)? {
            Ok(())
        } else {
            Err(StoreError::NotLinked)
        }
    }

    /// Check whether a file is linked to an object.
    pub fn linked(
        &self,
        tx: Option<&WriteTransaction>,
        object: &str,
        file: &str,
    ) -> Result<bool, StoreError> {
        check_hash(&[file])?;
        match self.handle(tx) {
            Handle::Database(db) => {
                let read_txn = db.begin_read()?;
                let index = read_txn.open_table(self.tables().object_index())?;
                let found = index.get((object, file))?.is_some();
                Ok(found)
            }
            Handle::Transaction(txn) => {
                let index = txn.open_table(self.tables().object_index())?;
                let found = index.get((object, file))?.is_some();
                Ok(found)
            }
        }
    }

    /// All files linked to an object, in the order they were linked.
    pub fn files_of(
        &self,
        tx: Option<&WriteTransaction>,
        object: &str,
    ) -> Result<Vec<String>, StoreError> {
        match self.handle(tx) {
            Handle::Database(db) => {
                let read_txn = db.begin_read()?;
                let index = read_txn.open_table(self.tables().object_index())?;
                let links = read_txn.open_table(self.tables().links())?;
                ordered_files(&index, &links, object)
            }
            Handle::Transaction(txn) => {
                let index = txn.open_table(self.tables().object_index())?;
                let links = txn.open_table(self.tables().links())?;
                ordered_files(&index, &links, object)
            }
        }
    }
}

/// Files recorded in the object index for `object`, in key order.
fn object_files(
    index: &impl ReadableTable<PairKey, ()>,
    object: &str,
) -> Result<Vec<String>, StoreError> {
    let mut files = Vec::new();
    for entry in index.range((object, "")..)? {
        let (key, _) = entry?;
        let (linked_object, file) = key.value();
        if linked_object != object {
            break;
        }
        files.push(file.to_string());
    }
    Ok(files)
}

fn ordered_files(
    index: &impl ReadableTable<PairKey, ()>,
    links: &impl ReadableTable<PairKey, &'static [u8]>,
    object: &str,
) -> Result<Vec<String>, StoreError> {
    let mut records = Vec::new();
    for file in object_files(index, object)? {
        if let Some(data) = links.get((file.as_str(), object))? {
            let record: LinkRecord = rmp_serde::from_slice(data.value())?;
            records.push(record);
        }
    }
    records.sort_by_key(|r| r.seq);
    Ok(records.into_iter().map(|r| r.file).collect())
}

fn empty_files<S: AsRef<str>>(files: &[S]) -> bool {
    files.is_empty() || (files.len() == 1 && files[0].as_ref().is_empty())
}
