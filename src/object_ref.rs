//! Structured form of the object string files are linked to.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::StoreError;

/// Identifies an application entity: `table|id` or `table|id|field`.
///
/// `field` names which of several file attributes of the entity a link is
/// for; it is empty when the entity has only one. The zero value encodes to
/// the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub table: String,
    pub id: u64,
    pub field: String,
}

impl ObjectRef {
    pub fn new(table: impl Into<String>, id: u64) -> Self {
        Self {
            table: table.into(),
            id,
            field: String::new(),
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    pub fn is_zero(&self) -> bool {
        self.table.is_empty() && self.id == 0 && self.field.is_empty()
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return Ok(());
        }
        write!(f, "{}|{}", self.table, self.id)?;
        if !self.field.is_empty() {
            write!(f, "|{}", self.field)?;
        }
        Ok(())
    }
}

impl FromStr for ObjectRef {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(ObjectRef::default());
        }
        let invalid = || StoreError::InvalidObject(s.to_string());

        let mut parts = s.split('|');
        let table = parts.next().unwrap_or_default();
        let id = parts.next().ok_or_else(invalid)?;
        let field = parts.next();
        if parts.next().is_some() {
            return Err(invalid());
        }

        if table.is_empty() || !table.chars().all(|c| is_word_char(c) || c == '.') {
            return Err(invalid());
        }
        if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let id: u64 = id.parse().map_err(|_| invalid())?;
        if let Some(field) = field {
            if field.is_empty() || !field.chars().all(is_word_char) {
                return Err(invalid());
            }
        }

        Ok(ObjectRef {
            table: table.to_string(),
            id,
            field: field.unwrap_or_default().to_string(),
        })
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl Serialize for ObjectRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ObjectRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
