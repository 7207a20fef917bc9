use thiserror::Error;

use crate::storage::DatabaseError;

/// Language used when rendering user-facing error messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    En,
    Zh,
}

impl Locale {
    /// Map a language code to a locale. Unknown codes fall back to English.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_lowercase().as_str() {
            "zh" | "cn" => Locale::Zh,
            _ => Locale::En,
        }
    }
}

/// Broad error classes exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The caller supplied bad input.
    Args,
    /// An expected link is absent.
    NotLinked,
    /// A referenced hash has no file record.
    FileNotExists,
    /// Disk, transport or database failure.
    Storage,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object is empty")]
    EmptyObject,
    #[error("invalid file hash: {0}")]
    InvalidHash(String),
    #[error("invalid link object: {0}")]
    InvalidObject(String),
    #[error("no files")]
    NoFiles,
    #[error("file type({0}) is not an image.")]
    NotImage(String),
    #[error("file size({}) cann't exceed {}.", group_digits(.size), size_limit(.limit))]
    TooLarge { size: u64, limit: u64 },
    /// Rejection raised by a caller-supplied file check.
    #[error("{0}")]
    Rejected(String),
    #[error("some file not exists: {}", .0.join(", "))]
    FileNotExists(Vec<String>),
    #[error("the file is not linked to the object")]
    NotLinked,
    #[error("unknown bucket: {0}")]
    UnknownBucket(String),
    #[error("replication to {machine} failed: {reason}")]
    Replication { machine: String, reason: String },
    /// A panic raised while a transaction was open.
    #[error("transaction aborted by a fault: {0}")]
    Fault(String),
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

macro_rules! from_database_error {
    ($($source:ty),+ $(,)?) => {
        $(
            impl From<$source> for StoreError {
                fn from(e: $source) -> Self {
                    StoreError::Database(DatabaseError::from(e))
                }
            }
        )+
    };
}

from_database_error!(
    redb::CommitError,
    redb::DatabaseError,
    redb::StorageError,
    redb::TableError,
    redb::TransactionError,
    rmp_serde::decode::Error,
    rmp_serde::encode::Error,
);

impl StoreError {
    pub fn class(&self) -> ErrorClass {
        match self {
            StoreError::EmptyObject
            | StoreError::InvalidHash(_)
            | StoreError::InvalidObject(_)
            | StoreError::NoFiles
            | StoreError::NotImage(_)
            | StoreError::TooLarge { .. }
            | StoreError::Rejected(_)
            | StoreError::UnknownBucket(_) => ErrorClass::Args,
            StoreError::NotLinked => ErrorClass::NotLinked,
            StoreError::FileNotExists(_) => ErrorClass::FileNotExists,
            StoreError::Replication { .. }
            | StoreError::Fault(_)
            | StoreError::Database(_)
            | StoreError::Io(_) => ErrorClass::Storage,
        }
    }

    /// Wire code for the error class.
    pub fn code(&self) -> &'static str {
        match self.class() {
            ErrorClass::Args => "args-err",
            ErrorClass::NotLinked => "not-linked",
            ErrorClass::FileNotExists => "file-not-exists",
            ErrorClass::Storage => "storage-err",
        }
    }

    pub fn is_not_linked(&self) -> bool {
        matches!(self, StoreError::NotLinked)
    }

    pub fn is_file_not_exists(&self) -> bool {
        matches!(self, StoreError::FileNotExists(_))
    }

    /// Render the message in the given locale. Storage errors and caller
    /// rejections are returned as-is.
    pub fn localized(&self, locale: Locale) -> String {
        if locale == Locale::En {
            return self.to_string();
        }
        match self {
            StoreError::EmptyObject => "关联对象不能为空.".to_string(),
            StoreError::InvalidHash(hash) => format!("文件哈希({hash})格式不正确."),
            StoreError::InvalidObject(object) => format!("关联对象({object})格式不正确."),
            StoreError::NoFiles => "没有上传文件.".to_string(),
            StoreError::NotImage(content_type) => format!("文件类型({content_type})不是图片."),
            StoreError::TooLarge { size, limit } => {
                format!("文件大小({})不能超过{}.", group_digits(size), size_limit_zh(limit))
            }
            StoreError::FileNotExists(missing) => format!("文件不存在: {}", missing.join(", ")),
            StoreError::NotLinked => "文件未关联到该对象.".to_string(),
            StoreError::UnknownBucket(bucket) => format!("存储桶({bucket})不存在."),
            _ => self.to_string(),
        }
    }
}

const MIB: u64 = 1 << 20;

/// Format an integer with comma thousands separators.
fn group_digits(n: &u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn size_limit(limit: &u64) -> String {
    if *limit >= MIB && limit % MIB == 0 {
        format!("{}MB", limit / MIB)
    } else {
        format!("{} bytes", group_digits(limit))
    }
}

fn size_limit_zh(limit: &u64) -> String {
    if *limit >= MIB && limit % MIB == 0 {
        format!("{}兆", limit / MIB)
    } else {
        format!("{}字节", group_digits(limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_from_code() {
        assert_eq!(Locale::from_code("zh"), Locale::Zh);
        assert_eq!(Locale::from_code("cn"), Locale::Zh);
        assert_eq!(Locale::from_code("en"), Locale::En);
        assert_eq!(Locale::from_code("fr"), Locale::En);
        assert_eq!(Locale::from_code(""), Locale::En);
    }

    #[test]
    fn test_group_digits() {
        assert_eq!(group_digits(&0), "0");
        assert_eq!(group_digits(&999), "999");
        assert_eq!(group_digits(&1000), "1,000");
        assert_eq!(group_digits(&3_145_728), "3,145,728");
    }

    #[test]
    fn test_too_large_messages() {
        let err = StoreError::TooLarge {
            size: 3_145_728,
            limit: 2 * MIB,
        };
        assert_eq!(err.to_string(), "file size(3,145,728) cann't exceed 2MB.");
        assert_eq!(err.localized(Locale::Zh), "文件大小(3,145,728)不能超过2兆.");
    }

    #[test]
    fn test_not_image_messages() {
        let err = StoreError::NotImage("text/plain".to_string());
        assert_eq!(err.localized(Locale::En), "file type(text/plain) is not an image.");
        assert_eq!(err.localized(Locale::Zh), "文件类型(text/plain)不是图片.");
    }

    #[test]
    fn test_classes_and_codes() {
        assert_eq!(StoreError::EmptyObject.code(), "args-err");
        assert_eq!(StoreError::InvalidHash("x".into()).code(), "args-err");
        assert_eq!(StoreError::NotLinked.code(), "not-linked");
        assert_eq!(StoreError::FileNotExists(vec![]).code(), "file-not-exists");
        assert_eq!(StoreError::Fault("boom".into()).class(), ErrorClass::Storage);
        assert!(StoreError::NotLinked.is_not_linked());
        assert!(StoreError::FileNotExists(vec!["a".into()]).is_file_not_exists());
        assert!(!StoreError::EmptyObject.is_file_not_exists());
    }

    #[test]
    fn test_storage_errors_are_not_translated() {
        let err = StoreError::Replication {
            machine: "deploy@replica-1".to_string(),
            reason: "exit status: 1".to_string(),
        };
        assert_eq!(err.localized(Locale::Zh), err.to_string());
    }
}
