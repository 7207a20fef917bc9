use redb::WriteTransaction;

use super::db::{Database, Handle};
use super::tables::{TableNames, LINK_SEQUENCES};
use crate::error::StoreError;

/// The link ledger of one bucket: its file records and the links between
/// file hashes and objects.
///
/// Every operation takes an optional caller-owned write transaction. With
/// `None` the operation runs on its own against the database.
#[derive(Clone)]
pub struct Ledger {
    db: Database,
    tables: TableNames,
}

impl Ledger {
    /// Open the ledger, creating its tables if they are missing.
    pub fn open(db: Database, links_table: &str, files_table: &str) -> Result<Self, StoreError> {
        let ledger = Self {
            db,
            tables: TableNames::new(links_table, files_table),
        };
        ledger.ensure_tables(None)?;
        Ok(ledger)
    }

    /// Create the ledger tables. Safe to call repeatedly.
    pub fn ensure_tables(&self, tx: Option<&WriteTransaction>) -> Result<(), StoreError> {
        self.handle(tx).write(|txn| {
            let _ = txn.open_table(self.tables.links())?;
            let _ = txn.open_table(self.tables.object_index())?;
            let _ = txn.open_table(self.tables.files())?;
            let _ = txn.open_table(LINK_SEQUENCES)?;
            Ok(())
        })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn tables(&self) -> &TableNames {
        &self.tables
    }

    pub(crate) fn handle<'a>(&'a self, tx: Option<&'a WriteTransaction>) -> Handle<'a> {
        Handle::new(&self.db, tx)
    }
}
