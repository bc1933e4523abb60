use super::Collection;
use serde::{Deserialize, Serialize};

/// A typed pointer to a document in another collection.
///
/// Serialized in the legacy backup form `{"$ref": "tags", "$id": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentRef {
    #[serde(rename = "$ref")]
    pub collection: Collection,
    #[serde(rename = "$id")]
    pub id: String,
}

impl DocumentRef {
    pub fn new(collection: Collection, id: impl Into<String>) -> Self {
        Self {
            collection,
            id: id.into(),
        }
    }
}

impl std::fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_reference_form() {
        let reference: DocumentRef =
            serde_json::from_str(r#"{"$ref": "tags", "$id": "abc"}"#).unwrap();
        assert_eq!(reference, DocumentRef::new(Collection::Tags, "abc"));
        assert_eq!(reference.to_string(), "tags/abc");
    }
}
