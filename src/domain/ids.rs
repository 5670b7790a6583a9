//! Domain identifier types with validation
//!
//! Newtype wrappers keep operation ids and file ids from being mixed up.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Export operation identifier
///
/// Assigned once when the operation is created and never changed afterwards.
///
/// # Examples
///
/// ```
/// use courier::domain::ids::OperationId;
///
/// let a = OperationId::generate();
/// let b = OperationId::generate();
/// assert_ne!(a, b);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OperationId(String);

impl OperationId {
    /// Generates a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Creates an OperationId from an existing string
    ///
    /// # Returns
    ///
    /// Returns `Ok(OperationId)` if the ID is valid, `Err` otherwise
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Operation ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the operation ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OperationId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for OperationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Opaque identifier of a stored file in the artifact store
///
/// # Examples
///
/// ```
/// use courier::domain::ids::FileId;
/// use std::str::FromStr;
///
/// let id = FileId::from_str("renders/hero.png").unwrap();
/// assert_eq!(id.as_str(), "renders/hero.png");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileId(String);

impl FileId {
    /// Creates a new FileId from a string
    ///
    /// # Returns
    ///
    /// Returns `Ok(FileId)` if the ID is valid, `Err` otherwise
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("File ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the file ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FileId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for FileId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Parses a list of raw identifiers, dropping blank entries
pub fn parse_file_ids<I, S>(raw: I) -> Vec<FileId>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter()
        .filter_map(|s| FileId::new(s.as_ref().trim()).ok())
        .collect()
}
