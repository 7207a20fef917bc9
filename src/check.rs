//! Policies applied to every file of an upload before anything is stored.

use crate::error::StoreError;

/// Largest image accepted by [`ImageCheck::default`].
pub const DEFAULT_MAX_IMAGE_SIZE: u64 = 2 << 20;

/// Decides whether a file may be stored, given its detected content type and
/// size in bytes. Any error fails the whole upload.
pub trait FileCheck {
    fn check(&self, content_type: &str, size: u64) -> Result<(), StoreError>;
}

impl<F> FileCheck for F
where
    F: Fn(&str, u64) -> Result<(), StoreError>,
{
    fn check(&self, content_type: &str, size: u64) -> Result<(), StoreError> {
        self(content_type, size)
    }
}

/// Accepts every file.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyFile;

impl FileCheck for AnyFile {
    fn check(&self, _content_type: &str, _size: u64) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Accepts `image/*` content up to `max_size` bytes.
#[derive(Debug, Clone, Copy)]
pub struct ImageCheck {
    pub max_size: u64,
}

impl Default for ImageCheck {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_IMAGE_SIZE,
        }
    }
}

impl FileCheck for ImageCheck {
    fn check(&self, content_type: &str, size: u64) -> Result<(), StoreError> {
        if !content_type.starts_with("image/") {
            return Err(StoreError::NotImage(content_type.to_string()));
        }
        if size > self.max_size {
            return Err(StoreError::TooLarge {
                size,
                limit: self.max_size,
            });
        }
        Ok(())
    }
}
