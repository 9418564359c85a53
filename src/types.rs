//! Request records for the cubic API.
//!
//! Each struct corresponds to one operation and serializes with the camelCase
//! keys the service expects. Field presence is guaranteed by construction; the
//! emptiness checks live in [`crate::validate`].

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CubicError;
use crate::validate;

/// A local file to upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    pub original_filename: String,
    /// Declared length in bytes, forwarded as the part length without re-measuring.
    pub size: u64,
    pub filepath: PathBuf,
    #[serde(alias = "mimetype")]
    pub mime_type: String,
}

/// Ordered text fields of a multipart form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields(Vec<(String, String)>);

impl FormFields {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(key, value);
        self
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push((key.into(), value.into()));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Body of the create-folder call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolder {
    pub cubic_id: String,
    pub cubic_name: String,
    pub section_name: String,
    pub folder_name: String,
}

/// Body of the delete-folder call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFolder {
    pub cubic_id: String,
    pub cubic_name: String,
    pub section_name: String,
    pub folder_name: String,
    pub folder_id: String,
}

/// Body of the single and folder file delete calls.
///
/// Only `sectionName` is required; every other key (cubicId, fileName,
/// folderName, ...) is forwarded to the service untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFile {
    pub section_name: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl DeleteFile {
    pub fn new(section_name: impl Into<String>) -> Self {
        Self {
            section_name: section_name.into(),
            fields: Map::new(),
        }
    }

    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Build from a loosely typed record, e.g. JSON read from disk.
    pub fn from_value(value: Value) -> Result<Self, CubicError> {
        validate::delete_file_record(&value)?;
        serde_json::from_value(value)
            .map_err(|_| CubicError::validation("sectionName", "Provide valid section name"))
    }
}

/// Metadata for an upload into a section's singles listing.
///
/// Sent to the service as `cardId`, `cardName`, `sectionName`, `sectionTitle`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleUploadMeta {
    pub cubic_id: String,
    pub cubic_name: String,
    pub section_name: String,
    pub section_title: String,
}

impl SingleUploadMeta {
    pub fn form_fields(&self) -> FormFields {
        FormFields::new()
            .with("cardId", self.cubic_id.as_str())
            .with("cardName", self.cubic_name.as_str())
            .with("sectionName", self.section_name.as_str())
            .with("sectionTitle", self.section_title.as_str())
    }
}

/// Metadata for an upload into a named folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderUploadMeta {
    pub card_id: String,
    pub card_name: String,
    pub section_name: String,
    pub section_title: String,
    pub folder_name: String,
    pub folder_id: String,
}

impl FolderUploadMeta {
    pub fn form_fields(&self) -> FormFields {
        FormFields::new()
            .with("cardId", self.card_id.as_str())
            .with("cardName", self.card_name.as_str())
            .with("sectionName", self.section_name.as_str())
            .with("sectionTitle", self.section_title.as_str())
            .with("folderName", self.folder_name.as_str())
            .with("folderId", self.folder_id.as_str())
    }
}
