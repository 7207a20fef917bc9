pub mod db;
mod files;
mod ledger;
mod links;
pub mod models;
mod tables;

pub use db::{Database, DatabaseError, Handle, TxOutcome};
pub use ledger::Ledger;
pub use tables::*;
