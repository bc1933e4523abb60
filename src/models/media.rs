use super::Collection;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A resized rendition of a media asset
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MediaVariant {
    pub path: String,
    pub width: u32,
    pub height: u32,
    pub file_size: u64,
}

/// Metadata for an uploaded media file. The bytes live in external storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MediaAsset {
    #[serde(default)]
    pub id: String,
    pub file_name: String,
    pub mime_type: String,
    pub file_size: u64,
    pub original_path: String,
    #[serde(default)]
    pub variants: BTreeMap<String, MediaVariant>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy_id: Option<String>,
}

impl_document!(MediaAsset, Collection::MediaAssets);

impl MediaAsset {
    /// File extension for a supported image mime type
    pub fn extension_for(mime_type: &str) -> Option<&'static str> {
        match mime_type {
            "image/jpeg" => Some("jpg"),
            "image/png" => Some("png"),
            "image/gif" => Some("gif"),
            "image/webp" => Some("webp"),
            "image/svg+xml" => Some("svg"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_for() {
        assert_eq!(MediaAsset::extension_for("image/jpeg"), Some("jpg"));
        assert_eq!(MediaAsset::extension_for("image/svg+xml"), Some("svg"));
        assert_eq!(MediaAsset::extension_for("application/pdf"), None);
    }
}
