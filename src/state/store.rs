use crate::error::{AppError, Result};
use crate::models::Collection;
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Trait for document storage operations
///
/// Documents are JSON objects keyed by id within a [`Collection`]. Backends
/// enforce the unique fields declared by [`Collection::unique_fields`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Get a document by ID
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>>;

    /// All documents of a collection, ordered by id
    async fn list(&self, collection: Collection) -> Result<Vec<Value>>;

    /// Insert or replace a document
    async fn save(&self, collection: Collection, id: &str, document: Value) -> Result<()>;

    /// Insert or replace several documents atomically. Uniqueness is checked
    /// against the state after the whole batch is applied.
    async fn save_all(&self, collection: Collection, documents: Vec<(String, Value)>)
        -> Result<()>;

    /// Delete a document, returning whether it existed
    async fn delete(&self, collection: Collection, id: &str) -> Result<bool>;

    /// Count documents in a collection
    async fn count(&self, collection: Collection) -> Result<u64>;
}

/// Checks that writing `pending` over `existing` keeps every unique field of
/// `collection` unique.
pub(crate) fn check_unique<'a>(
    collection: Collection,
    existing: impl Iterator<Item = (&'a str, &'a Value)>,
    pending: &[(String, Value)],
) -> Result<()> {
    let fields = collection.unique_fields();
    if fields.is_empty() {
        return Ok(());
    }

    let mut state: HashMap<&str, &Value> = existing.collect();
    for (id, document) in pending {
        state.insert(id.as_str(), document);
    }

    for field in fields {
        let mut seen: HashMap<String, &str> = HashMap::new();
        for (&id, document) in &state {
            let key = match document.get(*field) {
                None | Some(Value::Null) => continue,
                Some(value) => value.to_string(),
            };
            if let Some(other) = seen.insert(key.clone(), id) {
                if other != id {
                    return Err(AppError::Conflict(format!(
                        "Duplicate {}.{} value {}",
                        collection, field, key
                    )));
                }
            }
        }
    }

    Ok(())
}

/// In-memory document store (for testing and development)
#[derive(Clone, Default)]
pub struct InMemoryStore {
    collections: Arc<DashMap<Collection, BTreeMap<String, Value>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>> {
        Ok(self
            .collections
            .get(&collection)
            .and_then(|docs| docs.get(id).cloned()))
    }

    async fn list(&self, collection: Collection) -> Result<Vec<Value>> {
        Ok(self
            .collections
            .get(&collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn save(&self, collection: Collection, id: &str, document: Value) -> Result<()> {
        self.save_all(collection, vec![(id.to_string(), document)])
            .await
    }

    async fn save_all(
        &self,
        collection: Collection,
        documents: Vec<(String, Value)>,
    ) -> Result<()> {
        // The entry guard serializes writers of this collection.
        let mut docs = self.collections.entry(collection).or_default();
        check_unique(
            collection,
            docs.iter().map(|(id, doc)| (id.as_str(), doc)),
            &documents,
        )?;

        for (id, document) in documents {
            tracing::debug!(collection = %collection, id = %id, "Saved document to memory");
            docs.insert(id, document);
        }
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool> {
        let removed = self
            .collections
            .get_mut(&collection)
            .map(|mut docs| docs.remove(id).is_some())
            .unwrap_or(false);
        tracing::debug!(collection = %collection, id = %id, removed, "Deleted document from memory");
        Ok(removed)
    }

    async fn count(&self, collection: Collection) -> Result<u64> {
        Ok(self
            .collections
            .get(&collection)
            .map(|docs| docs.len() as u64)
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_in_memory_store_operations() {
        let store = InMemoryStore::new();

        store
            .save(Collection::Tags, "t1", json!({"id": "t1", "name": "rust"}))
            .await
            .unwrap();

        let doc = store.get(Collection::Tags, "t1").await.unwrap().unwrap();
        assert_eq!(doc["name"], "rust");
        assert_eq!(store.count(Collection::Tags).await.unwrap(), 1);
        assert_eq!(store.count(Collection::Blogs).await.unwrap(), 0);

        assert!(store.delete(Collection::Tags, "t1").await.unwrap());
        assert!(!store.delete(Collection::Tags, "t1").await.unwrap());
        assert!(store.get(Collection::Tags, "t1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unique_field_conflict() {
        let store = InMemoryStore::new();
        store
            .save(Collection::TourSteps, "a", json!({"id": "a", "order": 1}))
            .await
            .unwrap();

        let err = store
            .save(Collection::TourSteps, "b", json!({"id": "b", "order": 1}))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // Re-saving the same document with its own value is fine.
        store
            .save(Collection::TourSteps, "a", json!({"id": "a", "order": 1}))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_batch_checks_final_state() {
        let store = InMemoryStore::new();
        store
            .save(Collection::TourSteps, "a", json!({"id": "a", "order": 0}))
            .await
            .unwrap();
        store
            .save(Collection::TourSteps, "b", json!({"id": "b", "order": 1}))
            .await
            .unwrap();

        store
            .save_all(
                Collection::TourSteps,
                vec![
                    ("a".to_string(), json!({"id": "a", "order": 1})),
                    ("b".to_string(), json!({"id": "b", "order": 0})),
                ],
            )
            .await
            .unwrap();

        let a = store.get(Collection::TourSteps, "a").await.unwrap().unwrap();
        assert_eq!(a["order"], 1);
    }

    #[test]
    fn test_null_values_are_not_unique_checked() {
        let existing = vec![("a".to_string(), json!({"name": null}))];
        let result = check_unique(
            Collection::Tags,
            existing.iter().map(|(id, v)| (id.as_str(), v)),
            &[("b".to_string(), json!({"name": null}))],
        );
        assert!(result.is_ok());
    }
}
