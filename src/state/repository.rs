use crate::error::{AppError, Result};
use crate::models::Document;
use crate::state::DocumentStore;
use std::marker::PhantomData;
use std::sync::Arc;
use uuid::Uuid;

/// Typed access to one collection of a [`DocumentStore`]
pub struct Repository<T: Document> {
    store: Arc<dyn DocumentStore>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Document> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Document> Repository<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<T>> {
        self.store
            .get(T::COLLECTION, id)
            .await?
            .map(|doc| serde_json::from_value(doc).map_err(AppError::from))
            .transpose()
    }

    /// Like [`find_by_id`](Self::find_by_id) but a missing document is `NotFound`
    pub async fn get(&self, id: &str) -> Result<T> {
        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::NotFound(format!("{} not found: {}", T::COLLECTION, id))
        })
    }

    pub async fn find_all(&self) -> Result<Vec<T>> {
        self.store
            .list(T::COLLECTION)
            .await?
            .into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(AppError::from))
            .collect()
    }

    pub async fn exists(&self, id: &str) -> Result<bool> {
        Ok(self.store.get(T::COLLECTION, id).await?.is_some())
    }

    /// Persist a document, assigning a fresh id when it has none
    pub async fn save(&self, mut entity: T) -> Result<T> {
        if entity.id().is_empty() {
            entity.set_id(Uuid::new_v4().to_string());
        }
        let document = serde_json::to_value(&entity)?;
        self.store
            .save(T::COLLECTION, entity.id(), document)
            .await?;
        Ok(entity)
    }

    /// Persist several documents in one atomic write
    pub async fn save_all(&self, entities: Vec<T>) -> Result<Vec<T>> {
        let mut documents = Vec::with_capacity(entities.len());
        let mut saved = Vec::with_capacity(entities.len());
        for mut entity in entities {
            if entity.id().is_empty() {
                entity.set_id(Uuid::new_v4().to_string());
            }
            documents.push((entity.id().to_string(), serde_json::to_value(&entity)?));
            saved.push(entity);
        }
        self.store.save_all(T::COLLECTION, documents).await?;
        Ok(saved)
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        self.store.delete(T::COLLECTION, id).await
    }

    pub async fn count(&self) -> Result<u64> {
        self.store.count(T::COLLECTION).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Tag;
    use crate::state::InMemoryStore;

    fn repository() -> Repository<Tag> {
        Repository::new(Arc::new(InMemoryStore::new()))
    }

    #[tokio::test]
    async fn test_save_assigns_id() {
        let tags = repository();
        let saved = tags.save(Tag::new("rust")).await.unwrap();

        assert!(!saved.id.is_empty());
        assert_eq!(tags.get(&saved.id).await.unwrap().name, "rust");
        assert!(tags.exists(&saved.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let tags = repository();
        assert!(matches!(
            tags.get("nope").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_save_all_and_find_all() {
        let tags = repository();
        tags.save_all(vec![Tag::new("a"), Tag::new("b")])
            .await
            .unwrap();

        let mut names: Vec<String> = tags
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(tags.count().await.unwrap(), 2);
    }
}
