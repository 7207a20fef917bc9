use std::collections::HashMap;
use std::sync::Arc;

use redb::WriteTransaction;
use tracing::info;

use crate::config::BucketConfig;
use crate::content::{ContentStore, Machines, Transport};
use crate::error::StoreError;
use crate::storage::{Database, Ledger};

/// A configured store: its link ledger and its replicated content store.
pub struct Bucket {
    name: String,
    ledger: Ledger,
    content: ContentStore,
}

impl Bucket {
    pub fn new(name: impl Into<String>, ledger: Ledger, content: ContentStore) -> Self {
        Self {
            name: name.into(),
            ledger,
            content,
        }
    }

    /// Open a bucket from its configuration. Machine addresses are
    /// classified as local or remote here, once.
    pub fn open(
        config: &BucketConfig,
        db: Database,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, StoreError> {
        let machines = Machines::resolve(&config.machines, config.scp_user.as_deref())?;
        let ledger = Ledger::open(db, &config.links_table, &config.files_table)?;

        info!(
            bucket = %config.name,
            dir = %config.dir,
            dir_depth = config.dir_depth,
            local = machines.has_local(),
            remotes = ?machines.remotes(),
            "Opened bucket"
        );

        let content = ContentStore::new(&config.dir, config.dir_depth, machines, transport);
        Ok(Self::new(&config.name, ledger, content))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn content(&self) -> &ContentStore {
        &self.content
    }

    /// Begin a write transaction for composing several bucket operations.
    pub fn begin_write(&self) -> Result<WriteTransaction, StoreError> {
        Ok(self.ledger.database().begin_write()?)
    }
}

/// Buckets by name.
#[derive(Default, Clone)]
pub struct Buckets {
    buckets: HashMap<String, Arc<Bucket>>,
}

impl Buckets {
    pub fn open(
        configs: &[BucketConfig],
        db: &Database,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, StoreError> {
        let mut buckets = Buckets::default();
        for config in configs {
            let bucket = Bucket::open(config, db.clone(), Arc::clone(&transport))?;
            buckets.insert(bucket);
        }
        Ok(buckets)
    }

    pub fn insert(&mut self, bucket: Bucket) {
        self.buckets
            .insert(bucket.name().to_string(), Arc::new(bucket));
    }

    pub fn get(&self, name: &str) -> Result<Arc<Bucket>, StoreError> {
        self.buckets
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::UnknownBucket(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.buckets.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
