use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::NamedTempFile;

use super::addressing;
use super::machines::Machines;
use super::transport::Transport;
use crate::error::StoreError;

/// Bytes of one file, ready to be copied to remote machines.
#[derive(Debug)]
pub enum Staged {
    /// The stored file on this machine.
    Local(PathBuf),
    /// A temporary copy, removed on drop.
    Temp(NamedTempFile),
}

impl Staged {
    pub fn path(&self) -> &Path {
        match self {
            Staged::Local(path) => path,
            Staged::Temp(file) => file.path(),
        }
    }
}

/// Write-once, hash-addressed file storage replicated to a fixed set of
/// machines.
///
/// Every machine keeps files under the same root directory and layout.
pub struct ContentStore {
    root: PathBuf,
    depth: u8,
    machines: Machines,
    transport: Arc<dyn Transport>,
}

impl ContentStore {
    pub fn new<P: Into<PathBuf>>(
        root: P,
        depth: u8,
        machines: Machines,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            root: root.into(),
            depth,
            machines,
            transport,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn machines(&self) -> &Machines {
        &self.machines
    }

    /// Absolute path of a file, identical on every machine.
    pub fn path_for(&self, hash: &str) -> PathBuf {
        self.root.join(addressing::path_for(hash, self.depth))
    }

    /// Persist the bytes of `hash` on every machine: [`stage`](Self::stage)
    /// followed by [`replicate`](Self::replicate).
    pub fn save<R: Read + ?Sized>(&self, reader: &mut R, hash: &str) -> Result<(), StoreError> {
        let staged = self.stage(reader, hash)?;
        self.replicate(staged.path(), hash)
    }

    /// Make the bytes of `hash` available for replication without copying
    /// them anywhere yet: written in place when this host is a machine,
    /// held in a temporary file otherwise.
    pub fn stage<R: Read + ?Sized>(&self, reader: &mut R, hash: &str) -> Result<Staged, StoreError> {
        if self.machines.has_local() {
            self.write(reader, hash)?;
            return Ok(Staged::Local(self.path_for(hash)));
        }

        let mut staged = tempfile::Builder::new().prefix("fs_").tempfile()?;
        io::copy(reader, staged.as_file_mut())?;
        staged.as_file().sync_all()?;
        Ok(Staged::Temp(staged))
    }

    /// Write the bytes of `hash` to local disk unless a file already exists
    /// there. Returns whether this call created the file.
    ///
    /// Bytes go to a temporary file next to the destination and are published
    /// with an exclusive rename, so the destination only ever holds complete
    /// content. Concurrent writers of the same hash race on that rename; the
    /// losers see the file already present and succeed.
    pub fn write<R: Read + ?Sized>(&self, reader: &mut R, hash: &str) -> Result<bool, StoreError> {
        let destination = self.path_for(hash);
        match fs::metadata(&destination) {
            Ok(_) => return Ok(false),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let parent = destination.parent().unwrap_or(self.root.as_path());
        fs::create_dir_all(parent)?;

        // Removed on drop unless published
        let mut staged = tempfile::Builder::new().prefix(".fs_").tempfile_in(parent)?;
        let bytes = io::copy(reader, staged.as_file_mut())?;
        staged.as_file().sync_all()?;

        match staged.persist_noclobber(&destination) {
            Ok(_) => {
                tracing::debug!(hash, bytes, path = %destination.display(), "Wrote file");
                Ok(true)
            }
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e.error.into()),
        }
    }

    /// Copy `source` to the path of `hash` on every remote machine, one at a
    /// time. The first failure stops the remaining copies; machines already
    /// copied to keep their copy.
    pub fn replicate(&self, source: &Path, hash: &str) -> Result<(), StoreError> {
        let destination = self.path_for(hash);
        for machine in self.machines.remotes() {
            if let Err(e) = self.transport.copy(source, machine, &destination) {
                tracing::warn!(hash, machine = %machine, error = %e, "Replication failed");
                return Err(e);
            }
            tracing::debug!(hash, machine = %machine, "Replicated file");
        }
        Ok(())
    }

    /// Whether the file of `hash` is present on local disk.
    pub fn exists(&self, hash: &str) -> bool {
        self.path_for(hash).is_file()
    }

    /// Read the whole file of `hash` from local disk.
    pub fn read(&self, hash: &str) -> Result<Vec<u8>, StoreError> {
        Ok(fs::read(self.path_for(hash))?)
    }
}
