//! Behaviour shared by every DocumentStore backend

use portfolio_backend::error::AppError;
use portfolio_backend::models::{Collection, Tag, TourStep};
use portfolio_backend::state::{DocumentStore, InMemoryStore, Repository, SledStore};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

/// Test suite that runs against any DocumentStore implementation
async fn test_store_operations(store: Arc<dyn DocumentStore>) {
    // Save and retrieve
    store
        .save(Collection::Blogs, "b1", json!({"id": "b1", "title": "One"}))
        .await
        .unwrap();
    let doc = store.get(Collection::Blogs, "b1").await.unwrap().unwrap();
    assert_eq!(doc["title"], "One");

    // Replace
    store
        .save(Collection::Blogs, "b1", json!({"id": "b1", "title": "Uno"}))
        .await
        .unwrap();
    assert_eq!(store.count(Collection::Blogs).await.unwrap(), 1);

    // Collections are isolated
    assert!(store.get(Collection::Jobs, "b1").await.unwrap().is_none());

    // List is ordered by id
    store
        .save(Collection::Blogs, "a0", json!({"id": "a0", "title": "Zero"}))
        .await
        .unwrap();
    let titles: Vec<_> = store
        .list(Collection::Blogs)
        .await
        .unwrap()
        .into_iter()
        .map(|d| d["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, vec!["Zero", "Uno"]);

    // Delete
    assert!(store.delete(Collection::Blogs, "b1").await.unwrap());
    assert!(!store.delete(Collection::Blogs, "b1").await.unwrap());
    assert!(store.get(Collection::Blogs, "b1").await.unwrap().is_none());
}

async fn test_unique_fields(store: Arc<dyn DocumentStore>) {
    let tags = Repository::<Tag>::new(store.clone());
    let rust = tags.save(Tag::new("rust")).await.unwrap();

    let err = tags.save(Tag::new("rust")).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Re-saving the holder of a value is not a conflict
    tags.save(rust.clone()).await.unwrap();
    assert_eq!(tags.count().await.unwrap(), 1);

    // Batches are checked against their final state
    let steps = Repository::<TourStep>::new(store.clone());
    let mut a = steps.save(TourStep::new(1, "#a", "A")).await.unwrap();
    let mut b = steps.save(TourStep::new(2, "#b", "B")).await.unwrap();
    a.order = 2;
    b.order = 1;
    steps.save_all(vec![a.clone(), b]).await.unwrap();

    let mut c = TourStep::new(3, "#c", "C");
    c.order = 2;
    let err = steps.save_all(vec![c]).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(steps.count().await.unwrap(), 2);
    assert_eq!(steps.get(&a.id).await.unwrap().order, 2);
}

#[tokio::test]
async fn test_in_memory_store() {
    test_store_operations(Arc::new(InMemoryStore::new())).await;
    test_unique_fields(Arc::new(InMemoryStore::new())).await;
}

#[tokio::test]
async fn test_sled_store() {
    let temp_dir = TempDir::new().unwrap();
    let store = SledStore::new(temp_dir.path().join("ops")).unwrap();
    test_store_operations(Arc::new(store)).await;

    let store = SledStore::new(temp_dir.path().join("unique")).unwrap();
    test_unique_fields(Arc::new(store)).await;
}

#[tokio::test]
async fn test_sled_persistence() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("persist");

    let id = {
        let store: Arc<dyn DocumentStore> = Arc::new(SledStore::new(&path).unwrap());
        let tag = Repository::<Tag>::new(store)
            .save(Tag::new("persisted"))
            .await
            .unwrap();
        tag.id
    };

    let store: Arc<dyn DocumentStore> = Arc::new(SledStore::new(&path).unwrap());
    let tag = Repository::<Tag>::new(store).get(&id).await.unwrap();
    assert_eq!(tag.name, "persisted");
}
