use redb::{Database as RedbDatabase, ReadTransaction, WriteTransaction};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::error::StoreError;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Commit error: {0}")]
    Commit(Box<redb::CommitError>),
    #[error("Database error: {0}")]
    RedbDatabase(Box<redb::DatabaseError>),
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] rmp_serde::decode::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] rmp_serde::encode::Error),
    #[error("Storage error: {0}")]
    Storage(Box<redb::StorageError>),
    #[error("Table error: {0}")]
    Table(Box<redb::TableError>),
    #[error("Transaction error: {0}")]
    Transaction(Box<redb::TransactionError>),
}

impl From<redb::CommitError> for DatabaseError {
    fn from(e: redb::CommitError) -> Self {
        DatabaseError::Commit(Box::new(e))
    }
}

impl From<redb::DatabaseError> for DatabaseError {
    fn from(e: redb::DatabaseError) -> Self {
        DatabaseError::RedbDatabase(Box::new(e))
    }
}

impl From<redb::StorageError> for DatabaseError {
    fn from(e: redb::StorageError) -> Self {
        DatabaseError::Storage(Box::new(e))
    }
}

impl From<redb::TableError> for DatabaseError {
    fn from(e: redb::TableError) -> Self {
        DatabaseError::Table(Box::new(e))
    }
}

impl From<redb::TransactionError> for DatabaseError {
    fn from(e: redb::TransactionError) -> Self {
        DatabaseError::Transaction(Box::new(e))
    }
}

pub struct Database {
    db: Arc<RedbDatabase>,
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
        }
    }
}

/// Result of running work inside a transaction owned by [`Database::transaction`].
#[derive(Debug)]
pub enum TxOutcome<T> {
    Committed(T),
    RolledBack(StoreError),
}

impl<T> TxOutcome<T> {
    pub fn into_result(self) -> Result<T, StoreError> {
        match self {
            TxOutcome::Committed(value) => Ok(value),
            TxOutcome::RolledBack(e) => Err(e),
        }
    }

    pub fn is_committed(&self) -> bool {
        matches!(self, TxOutcome::Committed(_))
    }
}

impl Database {
    /// Open or create a database at the given path
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self, DatabaseError> {
        std::fs::create_dir_all(data_dir.as_ref())?;
        let db_path = data_dir.as_ref().join("file-store.redb");
        let db = Arc::new(RedbDatabase::create(db_path)?);
        Ok(Self { db })
    }

    /// Begin a read transaction
    pub fn begin_read(&self) -> Result<ReadTransaction, DatabaseError> {
        Ok(self.db.begin_read()?)
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> Result<WriteTransaction, DatabaseError> {
        Ok(self.db.begin_write()?)
    }

    /// Run `work` in a new write transaction.
    ///
    /// The transaction commits only when `work` returns `Ok`. An error return
    /// or a panic aborts it; a panic is reported as [`StoreError::Fault`].
    pub fn transaction<T, F>(&self, work: F) -> TxOutcome<T>
    where
        F: FnOnce(&WriteTransaction) -> Result<T, StoreError>,
    {
        let txn = match self.begin_write() {
            Ok(txn) => txn,
            Err(e) => return TxOutcome::RolledBack(e.into()),
        };

        match panic::catch_unwind(AssertUnwindSafe(|| work(&txn))) {
            Ok(Ok(value)) => match txn.commit() {
                Ok(()) => TxOutcome::Committed(value),
                Err(e) => TxOutcome::RolledBack(e.into()),
            },
            Ok(Err(e)) => {
                abort(txn);
                TxOutcome::RolledBack(e)
            }
            Err(payload) => {
                abort(txn);
                let message = panic_message(payload.as_ref());
                tracing::warn!(panic = %message, "Transaction aborted by panic");
                TxOutcome::RolledBack(StoreError::Fault(message))
            }
        }
    }
}

fn abort(txn: WriteTransaction) {
    if let Err(e) = txn.abort() {
        tracing::warn!(error = %e, "Failed to abort transaction");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Where a ledger operation runs: on its own against the database, or inside
/// a write transaction owned by the caller.
#[derive(Clone, Copy)]
pub enum Handle<'a> {
    Database(&'a Database),
    Transaction(&'a WriteTransaction),
}

impl<'a> Handle<'a> {
    pub fn new(db: &'a Database, tx: Option<&'a WriteTransaction>) -> Self {
        match tx {
            Some(txn) => Handle::Transaction(txn),
            None => Handle::Database(db),
        }
    }

    /// Run `work` in a write transaction. A caller-owned transaction is used
    /// as-is and left uncommitted; otherwise a new one is committed or rolled
    /// back around `work`.
    pub fn write<T, F>(self, work: F) -> Result<T, StoreError>
    where
        F: FnOnce(&WriteTransaction) -> Result<T, StoreError>,
    {
        match self {
            Handle::Database(db) => db.transaction(work).into_result(),
            Handle::Transaction(txn) => work(txn),
        }
    }
}
