//! Generation history records.
//!
//! A [`HistoryRecord`] is written exactly once, after the credit deduction
//! for the same generation has been committed, and is never modified.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UserId;

/// Identifier of a history record.
///
/// Generated before the credit deduction so a retried insert targets the same
/// row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryRecordId(Uuid);

impl HistoryRecordId {
    /// Generate a fresh identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for HistoryRecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raised when a reference string is blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("reference must not be empty")]
pub struct EmptyReference;

/// Location of a generated image: a network URL or a `data:` descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImageReference(String);

impl ImageReference {
    /// Validate a reference.
    pub fn new(value: impl Into<String>) -> Result<Self, EmptyReference> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(EmptyReference);
        }
        Ok(Self(value))
    }

    /// Borrow the reference text.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for ImageReference {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ImageReference> for String {
    fn from(value: ImageReference) -> Self {
        value.0
    }
}

impl TryFrom<String> for ImageReference {
    type Error = EmptyReference;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Placeholder recorded when the client did not name the uploaded file.
pub const LOCAL_UPLOAD_SOURCE: &str = "local_upload";

/// Description of the image the user submitted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceReference(String);

impl SourceReference {
    /// Build a source reference from the client-supplied file name, falling
    /// back to [`LOCAL_UPLOAD_SOURCE`] when none was given.
    ///
    /// # Examples
    /// ```
    /// use headshot_backend::domain::SourceReference;
    ///
    /// assert_eq!(SourceReference::from_file_name(Some("me.jpg")).as_str(), "me.jpg");
    /// assert_eq!(SourceReference::from_file_name(Some("  ")).as_str(), "local_upload");
    /// assert_eq!(SourceReference::from_file_name(None).as_str(), "local_upload");
    /// ```
    pub fn from_file_name(file_name: Option<&str>) -> Self {
        match file_name.map(str::trim) {
            Some(name) if !name.is_empty() => Self(name.to_owned()),
            _ => Self(LOCAL_UPLOAD_SOURCE.to_owned()),
        }
    }

    /// Rehydrate a stored value.
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the reference text.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Immutable record of one completed generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    pub id: HistoryRecordId,
    pub owner: UserId,
    pub source_reference: SourceReference,
    pub result_reference: ImageReference,
    pub created_at: DateTime<Utc>,
}
