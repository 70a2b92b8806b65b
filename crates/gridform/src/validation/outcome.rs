//! Validation result and file metadata.

use chrono::{DateTime, Utc};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde::Deserialize;

/// Metadata about the validated file.
#[derive(Debug, Clone, serde::Serialize, Deserialize)]
pub struct FileMetadata {
    /// File name without path.
    pub file_name: String,
    /// Number of columns resolved from the uploaded header region.
    pub column_count: usize,
    /// Number of sampled data rows.
    pub row_count: usize,
    /// SHA-256 hash of the uploaded bytes, when they could be read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    /// When the validation was performed.
    pub validated_at: DateTime<Utc>,
}

impl FileMetadata {
    pub fn new() -> Self {
        Self {
            file_name: String::new(),
            column_count: 0,
            row_count: 0,
            hash: None,
            validated_at: Utc::now(),
        }
    }
}

impl Default for FileMetadata {
    fn default() -> Self {
        Self::new()
    }
}

/// Accumulated result of a whole-file validation run.
///
/// Validity is not stored: `is_valid()` is derived from the error list, so
/// no boolean can ever disagree with it. Serialization emits a `valid`
/// field computed the same way.
#[derive(Debug, Clone, Default)]
pub struct ValidationOutcome {
    errors: Vec<String>,
    metadata: FileMetadata,
}

impl ValidationOutcome {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            metadata: FileMetadata::new(),
        }
    }

    /// Record a validation error.
    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    /// Valid iff no errors were recorded.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Error messages in the order they were recorded.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn metadata(&self) -> &FileMetadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut FileMetadata {
        &mut self.metadata
    }
}

impl Serialize for ValidationOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ValidationOutcome", 3)?;
        state.serialize_field("valid", &self.is_valid())?;
        state.serialize_field("errors", &self.errors)?;
        state.serialize_field("metadata", &self.metadata)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity_tracks_error_list() {
        let mut outcome = ValidationOutcome::new();
        assert!(outcome.is_valid());

        outcome.add_error("something went wrong");
        assert!(!outcome.is_valid());
        assert_eq!(outcome.errors(), ["something went wrong"]);
    }

    #[test]
    fn test_serialized_valid_field_derives_from_errors() {
        let mut outcome = ValidationOutcome::new();
        outcome.metadata_mut().file_name = "upload.xlsx".to_string();

        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["valid"], serde_json::json!(true));
        assert_eq!(value["metadata"]["file_name"], serde_json::json!("upload.xlsx"));

        outcome.add_error("bad");
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["valid"], serde_json::json!(false));
        assert_eq!(value["errors"], serde_json::json!(["bad"]));
    }
}
