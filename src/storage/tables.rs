use redb::TableDefinition;

/// Link sequences: links table name -> last sequence number handed out
pub const LINK_SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("link_sequences");

/// Table names for one bucket's ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    pub links: String,
    pub object_index: String,
    pub files: String,
}

impl TableNames {
    pub fn new(links: &str, files: &str) -> Self {
        Self {
            links: links.to_string(),
            object_index: format!("{links}_object_index"),
            files: files.to_string(),
        }
    }

    /// Links: (file, object) -> LinkRecord (msgpack)
    pub fn links(&self) -> TableDefinition<'_, (&'static str, &'static str), &'static [u8]> {
        TableDefinition::new(&self.links)
    }

    /// Object index: (object, file) -> ()
    pub fn object_index(&self) -> TableDefinition<'_, (&'static str, &'static str), ()> {
        TableDefinition::new(&self.object_index)
    }

    /// File records: hash -> FileRecord (msgpack)
    pub fn files(&self) -> TableDefinition<'_, &'static str, &'static [u8]> {
        TableDefinition::new(&self.files)
    }
}
