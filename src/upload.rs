use std::io::{Cursor, Read, Seek, SeekFrom};

use bytes::Bytes;
use chrono::Utc;
use redb::WriteTransaction;

use crate::bucket::Bucket;
use crate::check::FileCheck;
use crate::content::{hash_reader, Staged};
use crate::error::StoreError;
use crate::storage::models::FileRecord;

const OCTET_STREAM: &str = "application/octet-stream";

/// A file to store.
#[derive(Debug)]
pub struct Upload<R> {
    pub content: R,
    /// Content type declared by the sender, if any.
    pub content_type: Option<String>,
    /// Original file name, used to guess the content type.
    pub file_name: Option<String>,
}

impl<R> Upload<R> {
    pub fn new(content: R) -> Self {
        Self {
            content,
            content_type: None,
            file_name: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }
}

impl Upload<Cursor<Bytes>> {
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self::new(Cursor::new(data.into()))
    }
}

/// Content type of an upload: the declared type, else a guess from the file
/// name, else `application/octet-stream`.
pub fn detect_content_type(declared: Option<&str>, file_name: Option<&str>) -> String {
    declared
        .filter(|ct| !ct.is_empty() && *ct != OCTET_STREAM)
        .map(str::to_string)
        .or_else(|| {
            file_name
                .and_then(|n| mime_guess::from_path(n).first())
                .map(|m| m.to_string())
        })
        .unwrap_or_else(|| OCTET_STREAM.to_string())
}

struct Prepared {
    hash: String,
    content_type: String,
    byte_size: u64,
}

impl Bucket {
    /// Store files and, when `object` is not empty, link them to it.
    ///
    /// Every file is checked and hashed before anything is written. File
    /// records, links and the local copy of the bytes are written in one
    /// transaction (the caller's, if given). Copies to remote machines are
    /// made once that transaction is done: after its commit when this call
    /// owns it, before the caller commits otherwise. A replication failure
    /// does not undo committed records; all steps are idempotent, so the
    /// save can be retried with the same content. Returns the content hashes
    /// in input order.
    pub fn save<R: Read + Seek>(
        &self,
        tx: Option<&WriteTransaction>,
        check: &dyn FileCheck,
        object: &str,
        uploads: Vec<Upload<R>>,
    ) -> Result<Vec<String>, StoreError> {
        if uploads.is_empty() {
            return Ok(Vec::new());
        }
        let (hashes, staged) = self
            .ledger()
            .handle(tx)
            .write(|txn| self.save_in(txn, check, object, uploads))?;

        for (hash, bytes) in hashes.iter().zip(&staged) {
            self.content().replicate(bytes.path(), hash)?;
        }
        Ok(hashes)
    }

    fn save_in<R: Read + Seek>(
        &self,
        txn: &WriteTransaction,
        check: &dyn FileCheck,
        object: &str,
        mut uploads: Vec<Upload<R>>,
    ) -> Result<(Vec<String>, Vec<Staged>), StoreError> {
        let mut prepared = Vec::with_capacity(uploads.len());
        for upload in uploads.iter_mut() {
            prepared.push(prepare(upload, check)?);
        }

        let now = Utc::now();
        for file in &prepared {
            let record = FileRecord {
                hash: file.hash.clone(),
                content_type: file.content_type.clone(),
                byte_size: file.byte_size,
                created_at: now,
            };
            self.ledger().put_file_record(Some(txn), &record)?;
        }

        let hashes: Vec<String> = prepared.iter().map(|p| p.hash.clone()).collect();
        if !object.is_empty() {
            self.ledger().link(Some(txn), object, &hashes)?;
        }

        let mut staged = Vec::with_capacity(prepared.len());
        for (upload, file) in uploads.iter_mut().zip(&prepared) {
            upload.content.seek(SeekFrom::Start(0))?;
            staged.push(self.content().stage(&mut upload.content, &file.hash)?);
        }

        tracing::debug!(bucket = %self.name(), object, files = hashes.len(), "Saved files");
        Ok((hashes, staged))
    }
}

/// Measure, check and hash one upload, leaving its reader consumed.
fn prepare<R: Read + Seek>(
    upload: &mut Upload<R>,
    check: &dyn FileCheck,
) -> Result<Prepared, StoreError> {
    let byte_size = upload.content.seek(SeekFrom::End(0))?;
    upload.content.seek(SeekFrom::Start(0))?;

    let content_type =
        detect_content_type(upload.content_type.as_deref(), upload.file_name.as_deref());
    check.check(&content_type, byte_size)?;

    let hash = hash_reader(&mut upload.content)?;
    Ok(Prepared {
        hash,
        content_type,
        byte_size,
    })
}
