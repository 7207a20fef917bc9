//! Shared helpers for file-store integration tests.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use file_store::content::{ContentStore, Machines, Transport};
use file_store::storage::{Database, Ledger};
use file_store::{Bucket, StoreError};

/// Copies files into `<root>/<machine>/<destination>` instead of over ssh,
/// recording every copy.
#[derive(Default)]
pub struct DirTransport {
    root: PathBuf,
    copies: Mutex<Vec<(String, PathBuf)>>,
    fail_on: Mutex<Option<String>>,
    delay: Option<Duration>,
}

impl DirTransport {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Fail every copy to `machine`.
    pub fn failing_on(self, machine: &str) -> Self {
        *self.fail_on.lock().unwrap() = Some(machine.to_string());
        self
    }

    /// Sleep before every copy, like a slow link.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Let copies to every machine succeed again.
    pub fn heal(&self) {
        *self.fail_on.lock().unwrap() = None;
    }

    /// Where a copy of `destination` lands for `machine`.
    pub fn replica_path(&self, machine: &str, destination: &Path) -> PathBuf {
        let relative = destination.strip_prefix("/").unwrap_or(destination);
        self.root.join(machine).join(relative)
    }

    pub fn copies(&self) -> Vec<(String, PathBuf)> {
        self.copies.lock().unwrap().clone()
    }
}

impl Transport for DirTransport {
    fn copy(&self, source: &Path, machine: &str, destination: &Path) -> Result<(), StoreError> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if self.fail_on.lock().unwrap().as_deref() == Some(machine) {
            return Err(StoreError::Replication {
                machine: machine.to_string(),
                reason: "connection refused".to_string(),
            });
        }
        let target = self.replica_path(machine, destination);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(source, &target)?;
        self.copies
            .lock()
            .unwrap()
            .push((machine.to_string(), destination.to_path_buf()));
        Ok(())
    }
}

pub fn test_db(dir: &tempfile::TempDir) -> Database {
    Database::open(dir.path().join("data")).unwrap()
}

pub fn test_ledger(dir: &tempfile::TempDir) -> Ledger {
    Ledger::open(test_db(dir), "file_links", "files").unwrap()
}

/// A bucket storing under `<dir>/files` with the given machines and a
/// directory-copy transport rooted at `<dir>/replicas`.
pub fn test_bucket(dir: &tempfile::TempDir, machines: Machines) -> (Bucket, Arc<DirTransport>) {
    test_bucket_with(dir, machines, DirTransport::new(dir.path().join("replicas")))
}

pub fn test_bucket_with(
    dir: &tempfile::TempDir,
    machines: Machines,
    transport: DirTransport,
) -> (Bucket, Arc<DirTransport>) {
    let transport = Arc::new(transport);
    let ledger = test_ledger(dir);
    let content = ContentStore::new(dir.path().join("files"), 2, machines, transport.clone());
    (Bucket::new("test", ledger, content), transport)
}

pub fn local_only() -> Machines {
    Machines::new(true, Vec::new())
}

pub fn remotes(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}
