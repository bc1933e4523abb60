//! Legacy backup import

use portfolio_backend::migration::LegacyImporter;
use portfolio_backend::models::{
    Blog, Collection, Job, Profile, SkillGroup, Tag, TooltipPosition, TourStep, PROFILE_ID,
};
use portfolio_backend::state::{DocumentStore, InMemoryStore, Repository};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn write(dir: &Path, file: &str, value: serde_json::Value) {
    std::fs::write(dir.join(file), value.to_string()).unwrap();
}

fn write_backup(dir: &Path) {
    write(
        dir,
        "tags.json",
        json!([
            {"_id": {"$oid": "t-rust"}, "name": "rust"},
            {"_id": {"$oid": "t-web"}, "name": "web"},
            {"name": "no id"}
        ]),
    );
    write(
        dir,
        "skills.json",
        json!([
            {"_id": "s-rust", "name": "Rust", "rating": 9, "order": 1},
            {"_id": "s-ts", "name": "TypeScript", "rating": 7, "order": 2}
        ]),
    );
    write(
        dir,
        "skill_groups.json",
        json!([
            {
                "_id": "g-lang",
                "name": "Languages",
                "order": 1,
                "skills": [{"$ref": "skills", "$id": "s-rust"}, {"$ref": "skills", "$id": "s-ts"}]
            }
        ]),
    );
    write(
        dir,
        "profiles.json",
        json!([{"_id": "p1", "name": "Jane Doe", "title": "Engineer", "profileImage": {"url": "/me.png"}}]),
    );
    write(
        dir,
        "jobs.json",
        json!([
            {
                "_id": "j1",
                "title": "Backend Engineer",
                "company": "Acme",
                "startDate": "2021-02-01",
                "skills": [{"$ref": "skills", "$id": "s-rust"}, {"$ref": "skills", "$id": "s-gone"}]
            }
        ]),
    );
    write(
        dir,
        "blogs.json",
        json!([
            {
                "_id": "b1",
                "title": "Hello",
                "shortDescription": "First post",
                "content": "Body",
                "published": true,
                "createdAt": {"$date": "2022-05-01T10:00:00Z"},
                "tags": [
                    {"$ref": "tags", "$id": {"$oid": "t-rust"}},
                    {"$ref": "tags", "$id": "t-missing"},
                    {"$ref": "skills", "$id": "t-web"}
                ],
                "skills": [{"$ref": "skills", "$id": "s-ts"}]
            }
        ]),
    );
    write(
        dir,
        "tour_steps.json",
        json!([{"_id": "ts1", "order": 1, "selector": "#intro", "title": "Intro", "position": "top"}]),
    );
}

#[tokio::test]
async fn test_import_translates_references() {
    let dir = TempDir::new().unwrap();
    write_backup(dir.path());
    let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStore::new());

    let report = LegacyImporter::new(store.clone())
        .import_dir(dir.path())
        .await
        .unwrap();

    let tags = report.get(Collection::Tags).unwrap();
    assert_eq!((tags.upserted, tags.skipped), (2, 1));
    assert_eq!(report.get(Collection::SocialMediaLinks).unwrap().upserted, 0);

    let rust = Repository::<Tag>::new(store.clone())
        .find_all()
        .await
        .unwrap()
        .into_iter()
        .find(|t| t.name == "rust")
        .unwrap();
    assert_eq!(rust.legacy_id.as_deref(), Some("t-rust"));

    let blogs = Repository::<Blog>::new(store.clone()).find_all().await.unwrap();
    assert_eq!(blogs.len(), 1);
    assert_eq!(blogs[0].tags, vec![rust.id.clone()]);
    assert_eq!(blogs[0].skills.len(), 1);
    assert_eq!(blogs[0].created_at.to_rfc3339(), "2022-05-01T10:00:00+00:00");

    let jobs = Repository::<Job>::new(store.clone()).find_all().await.unwrap();
    assert_eq!(jobs[0].skills, vec!["Rust"]);

    let groups = Repository::<SkillGroup>::new(store.clone())
        .find_all()
        .await
        .unwrap();
    assert_eq!(groups[0].skills.len(), 2);
    assert_eq!(groups[0].rating, Some(8.0));

    let profile = Repository::<Profile>::new(store.clone())
        .get(PROFILE_ID)
        .await
        .unwrap();
    assert_eq!(profile.profile_image_url.as_deref(), Some("/me.png"));

    let steps = Repository::<TourStep>::new(store.clone()).find_all().await.unwrap();
    assert_eq!(steps[0].target_selector, "#intro");
    assert_eq!(steps[0].position, TooltipPosition::Top);
}

#[tokio::test]
async fn test_import_is_idempotent() {
    let dir = TempDir::new().unwrap();
    write_backup(dir.path());
    let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStore::new());
    let importer = LegacyImporter::new(store.clone());

    let first = importer.import_dir(dir.path()).await.unwrap();
    let blog_id = Repository::<Blog>::new(store.clone()).find_all().await.unwrap()[0]
        .id
        .clone();

    let second = importer.import_dir(dir.path()).await.unwrap();
    assert_eq!(first.total_upserted(), second.total_upserted());

    for collection in [Collection::Tags, Collection::Skills, Collection::Blogs, Collection::TourSteps] {
        let expected = first.get(collection).unwrap().upserted as u64;
        assert_eq!(store.count(collection).await.unwrap(), expected);
    }
    assert_eq!(store.count(Collection::Profiles).await.unwrap(), 1);

    let blogs = Repository::<Blog>::new(store.clone()).find_all().await.unwrap();
    assert_eq!(blogs[0].id, blog_id);
}

#[tokio::test]
async fn test_missing_files_are_skipped() {
    let dir = TempDir::new().unwrap();
    let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStore::new());

    let report = LegacyImporter::new(store)
        .import_dir(dir.path())
        .await
        .unwrap();
    assert_eq!(report.total_upserted(), 0);
    assert_eq!(report.collections.len(), 8);
}
