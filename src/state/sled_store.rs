use crate::error::{AppError, Result};
use crate::models::Collection;
use crate::state::store::check_unique;
use crate::state::DocumentStore;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use sled::Db;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Persistent document store using Sled embedded database, one tree per collection
#[derive(Clone)]
pub struct SledStore {
    db: Arc<Db>,
    trees: Arc<HashMap<Collection, sled::Tree>>,
    write_lock: Arc<Mutex<()>>,
}

impl SledStore {
    /// Create a new Sled store at the specified path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref();
        let db = sled::open(&path).map_err(|e| {
            AppError::Database(format!("Failed to open Sled database: {}", e))
        })?;

        let mut trees = HashMap::new();
        for collection in Collection::ALL {
            let tree = db.open_tree(collection.as_ref()).map_err(|e| {
                AppError::Database(format!("Failed to open {} tree: {}", collection, e))
            })?;
            trees.insert(collection, tree);
        }

        tracing::info!("Initialized Sled store at {:?}", path_str);

        Ok(Self {
            db: Arc::new(db),
            trees: Arc::new(trees),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn tree(&self, collection: Collection) -> Result<&sled::Tree> {
        self.trees
            .get(&collection)
            .ok_or_else(|| AppError::Internal(format!("No tree for collection {}", collection)))
    }

    fn serialize_document(document: &Value) -> Result<Vec<u8>> {
        serde_json::to_vec(document).map_err(|e| {
            AppError::Serialization(format!("Failed to serialize document: {}", e))
        })
    }

    fn deserialize_document(bytes: &[u8]) -> Result<Value> {
        serde_json::from_slice(bytes).map_err(|e| {
            AppError::Serialization(format!("Failed to deserialize document: {}", e))
        })
    }

    fn read_all(tree: &sled::Tree) -> Result<Vec<(String, Value)>> {
        tree.iter()
            .map(|entry| {
                let (key, bytes) = entry.map_err(|e| {
                    AppError::Database(format!("Failed to read document: {}", e))
                })?;
                let id = String::from_utf8_lossy(&key).into_owned();
                Ok((id, Self::deserialize_document(&bytes)?))
            })
            .collect()
    }

    /// Flush pending writes to disk
    pub async fn flush(&self) -> Result<()> {
        self.db.flush_async().await.map_err(|e| {
            AppError::Database(format!("Failed to flush database: {}", e))
        })?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for SledStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>> {
        let bytes = self.tree(collection)?.get(id.as_bytes()).map_err(|e| {
            AppError::Database(format!("Failed to get document: {}", e))
        })?;

        bytes.map(|b| Self::deserialize_document(&b)).transpose()
    }

    async fn list(&self, collection: Collection) -> Result<Vec<Value>> {
        Ok(Self::read_all(self.tree(collection)?)?
            .into_iter()
            .map(|(_, doc)| doc)
            .collect())
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
        let tree = self.tree(collection)?;

        {
            let _guard = self.write_lock.lock();

            if !collection.unique_fields().is_empty() {
                let existing = Self::read_all(tree)?;
                check_unique(
                    collection,
                    existing.iter().map(|(id, doc)| (id.as_str(), doc)),
                    &documents,
                )?;
            }

            let mut batch = sled::Batch::default();
            for (id, document) in &documents {
                batch.insert(id.as_bytes(), Self::serialize_document(document)?);
            }
            tree.apply_batch(batch).map_err(|e| {
                AppError::Database(format!("Failed to save documents: {}", e))
            })?;
        }

        self.flush().await?;

        tracing::debug!(collection = %collection, count = documents.len(), "Saved documents to Sled");
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool> {
        let removed = {
            let _guard = self.write_lock.lock();
            self.tree(collection)?
                .remove(id.as_bytes())
                .map_err(|e| AppError::Database(format!("Failed to delete document: {}", e)))?
                .is_some()
        };

        self.flush().await?;

        tracing::debug!(collection = %collection, id = %id, removed, "Deleted document from Sled");
        Ok(removed)
    }

    async fn count(&self, collection: Collection) -> Result<u64> {
        Ok(self.tree(collection)?.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_sled_store_persists_documents() {
        let temp_dir = TempDir::new().unwrap();

        {
            let store = SledStore::new(temp_dir.path()).unwrap();
            store
                .save(Collection::Blogs, "b1", json!({"id": "b1", "title": "First"}))
                .await
                .unwrap();
        }

        let store = SledStore::new(temp_dir.path()).unwrap();
        let doc = store.get(Collection::Blogs, "b1").await.unwrap().unwrap();
        assert_eq!(doc["title"], "First");
        assert_eq!(store.count(Collection::Blogs).await.unwrap(), 1);
        assert_eq!(store.count(Collection::Jobs).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sled_unique_conflict() {
        let temp_dir = TempDir::new().unwrap();
        let store = SledStore::new(temp_dir.path()).unwrap();

        store
            .save(Collection::Tags, "t1", json!({"id": "t1", "name": "rust"}))
            .await
            .unwrap();
        let err = store
            .save(Collection::Tags, "t2", json!({"id": "t2", "name": "rust"}))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(store.count(Collection::Tags).await.unwrap(), 1);
    }
}
