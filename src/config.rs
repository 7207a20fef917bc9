use std::collections::HashSet;

use thiserror::Error;

use crate::content::HASH_LEN;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub node: NodeConfig,
    pub buckets: Vec<BucketConfig>,
    /// Maximum upload size in bytes
    pub max_upload_size: u64,
}

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub bind_address: String,
    /// Directory holding the ledger database
    pub data_dir: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketConfig {
    pub name: String,
    /// Root directory of stored files, the same on every machine
    pub dir: String,
    /// Number of single-character directory levels above each file.
    /// Changing it for an existing bucket hides the files already stored.
    pub dir_depth: u8,
    pub links_table: String,
    pub files_table: String,
    /// Replica machine addresses; this host may be one of them
    pub machines: Vec<String>,
    /// User for copying to remote machines
    pub scp_user: Option<String>,
}

impl BucketConfig {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            dir: format!("./files/{name}"),
            name,
            dir_depth: 2,
            links_table: "file_links".to_string(),
            files_table: "files".to_string(),
            machines: vec!["127.0.0.1".to_string()],
            scp_user: None,
        }
    }

    fn from_lookup(name: &str, lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = BucketConfig::new(name);
        let prefix = format!("BUCKET_{}", name.to_uppercase().replace('-', "_"));
        let var = |suffix: &str| lookup(&format!("{prefix}_{suffix}"));

        let dir_depth = match var("DIR_DEPTH") {
            Some(s) => s.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "{prefix}_DIR_DEPTH must be an integer between 0 and {HASH_LEN}"
                ))
            })?,
            None => defaults.dir_depth,
        };

        let machines = var("MACHINES")
            .map(|m| {
                m.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or(defaults.machines);

        Ok(Self {
            name: defaults.name,
            dir: var("DIR").unwrap_or(defaults.dir),
            dir_depth,
            links_table: var("LINKS_TABLE").unwrap_or(defaults.links_table),
            files_table: var("FILES_TABLE").unwrap_or(defaults.files_table),
            machines,
            scp_user: var("SCP_USER").filter(|u| !u.is_empty()),
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let fail = |msg: String| Err(ConfigError::ValidationError(msg));

        if self.dir.is_empty() {
            return fail(format!("bucket '{}' has an empty directory", self.name));
        }
        if self.dir_depth as usize > HASH_LEN {
            return fail(format!(
                "bucket '{}' directory depth {} exceeds the hash length {HASH_LEN}",
                self.name, self.dir_depth
            ));
        }
        if self.links_table.is_empty() || self.files_table.is_empty() {
            return fail(format!("bucket '{}' has an empty table name", self.name));
        }
        if self.links_table == self.files_table {
            return fail(format!(
                "bucket '{}' uses '{}' as both links and files table",
                self.name, self.links_table
            ));
        }
        if self.machines.is_empty() {
            return fail(format!("bucket '{}' has no machines", self.name));
        }
        Ok(())
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            data_dir: "./data".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = NodeConfig::default();
        let bind_address = lookup("BIND_ADDRESS").unwrap_or(defaults.bind_address);
        let data_dir = lookup("DATA_DIR").unwrap_or(defaults.data_dir);

        let max_upload_size = lookup("MAX_UPLOAD_SIZE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(10 * 1024 * 1024); // 10MB

        let names: Vec<String> = lookup("BUCKETS")
            .map(|b| {
                b.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| vec!["default".to_string()]);

        let buckets = names
            .iter()
            .map(|name| BucketConfig::from_lookup(name, &lookup))
            .collect::<Result<Vec<_>, _>>()?;

        let config = Config {
            node: NodeConfig {
                bind_address,
                data_dir,
            },
            buckets,
            max_upload_size,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.buckets.is_empty() {
            return Err(ConfigError::ValidationError(
                "BUCKETS must name at least one bucket".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for bucket in &self.buckets {
            if !seen.insert(bucket.name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "bucket '{}' is configured twice",
                    bucket.name
                )));
            }
            bucket.validate()?;
        }

        for bucket in self.buckets.iter().filter(|b| b.machines.len() > 1) {
            if bucket.scp_user.is_none() {
                tracing::warn!(
                    bucket = %bucket.name,
                    "Bucket replicates without BUCKET_<NAME>_SCP_USER; copies use the current user"
                );
            }
        }

        Ok(())
    }

    pub fn bucket(&self, name: &str) -> Option<&BucketConfig> {
        self.buckets.iter().find(|b| b.name == name)
    }
}
