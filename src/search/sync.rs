//! Keeps the search indexes consistent with the document store.
//!
//! Full syncs rebuild every document of one kind in a single commit, which
//! also drops orphans left behind by missed incremental updates. Incremental
//! operations run after store writes and never fail the caller: errors are
//! logged, counted, and repaired by the next full sync.

use crate::metrics::{SEARCH_INDEX_OPERATIONS_TOTAL, SEARCH_SYNC_TOTAL};
use crate::models::{by_start_date_desc, Blog, Job, SkillGroup};
use crate::resolver::ReferenceResolver;
use crate::search::document::{EntityKind, SearchDocument};
use crate::search::error::SearchResult;
use crate::search::index::SearchIndexes;
use crate::search::mapper;
use crate::state::{DocumentStore, Repository};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

/// Outcome of a full sync of one entity kind
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub kind: EntityKind,
    pub indexed: usize,
    /// Previously indexed documents that no longer exist
    pub removed: usize,
    pub duration_ms: u64,
}

/// An entity whose search documents should be refreshed
#[derive(Debug, Clone, Copy)]
pub enum SearchableEntity<'a> {
    Blog(&'a Blog),
    Job(&'a Job),
    SkillGroup(&'a SkillGroup),
}

#[derive(Clone)]
pub struct SearchIndexSynchronizer {
    indexes: SearchIndexes,
    store: Arc<dyn DocumentStore>,
    resolver: ReferenceResolver,
}

impl SearchIndexSynchronizer {
    pub fn new(indexes: SearchIndexes, store: Arc<dyn DocumentStore>) -> Self {
        let resolver = ReferenceResolver::new(store.clone());
        Self {
            indexes,
            store,
            resolver,
        }
    }

    pub fn indexes(&self) -> &SearchIndexes {
        &self.indexes
    }

    /// Rebuild every indexed document of `kind` from the store
    pub async fn full_sync(&self, kind: EntityKind) -> SearchResult<SyncReport> {
        let start = Instant::now();
        let before: HashSet<String> = self
            .indexes
            .site
            .all_ids(Some(kind))?
            .into_iter()
            .collect();

        let result = match kind {
            EntityKind::Blog => self.sync_blogs().await,
            EntityKind::Job => self.sync_jobs().await,
            EntityKind::Skill => self.sync_skills().await,
        };

        let outcome = if result.is_ok() { "success" } else { "failure" };
        SEARCH_SYNC_TOTAL
            .with_label_values(&[kind.as_ref(), outcome])
            .inc();

        let current = result?;
        let removed = before.iter().filter(|id| !current.contains(*id)).count();

        let report = SyncReport {
            kind,
            indexed: current.len(),
            removed,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        tracing::info!(
            kind = %kind,
            indexed = report.indexed,
            removed = report.removed,
            duration_ms = report.duration_ms,
            "Search index full sync complete"
        );
        Ok(report)
    }

    /// Full sync of every kind, stopping at the first failure
    pub async fn full_sync_all(&self) -> SearchResult<Vec<SyncReport>> {
        let mut reports = Vec::with_capacity(EntityKind::ALL.len());
        for kind in EntityKind::ALL {
            reports.push(self.full_sync(kind).await?);
        }
        Ok(reports)
    }

    /// Full sync of every kind, logging failures instead of returning them
    pub async fn run_full_sync(&self) {
        let start = Instant::now();
        let mut failures = 0;
        for kind in EntityKind::ALL {
            if let Err(e) = self.full_sync(kind).await {
                failures += 1;
                tracing::error!(kind = %kind, error = %e, "Search index full sync failed");
            }
        }
        tracing::info!(
            duration_ms = start.elapsed().as_millis() as u64,
            failures,
            "Search index sync finished"
        );
    }

    async fn sync_blogs(&self) -> SearchResult<HashSet<String>> {
        let mut blogs: Vec<Blog> = Repository::<Blog>::new(self.store.clone())
            .find_all()
            .await?
            .into_iter()
            .filter(Blog::is_visible)
            .collect();
        blogs.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut site_docs = Vec::with_capacity(blogs.len());
        let mut blog_docs = Vec::with_capacity(blogs.len());
        for blog in &blogs {
            site_docs.push(mapper::blog_to_site_document(blog));
            blog_docs.push(self.blog_document(blog).await?);
        }

        self.indexes
            .site
            .replace_kind(EntityKind::Blog, &site_docs)
            .await?;
        self.indexes
            .blog
            .replace_kind(EntityKind::Blog, &blog_docs)
            .await?;

        Ok(ids(&site_docs))
    }

    async fn sync_jobs(&self) -> SearchResult<HashSet<String>> {
        let mut jobs = Repository::<Job>::new(self.store.clone())
            .find_all()
            .await?;
        jobs.sort_by(by_start_date_desc);

        let mut docs = Vec::with_capacity(jobs.len());
        for job in &jobs {
            docs.push(self.job_document(job).await?);
        }

        self.indexes
            .site
            .replace_kind(EntityKind::Job, &docs)
            .await?;
        Ok(ids(&docs))
    }

    async fn sync_skills(&self) -> SearchResult<HashSet<String>> {
        let mut groups = Repository::<SkillGroup>::new(self.store.clone())
            .find_all()
            .await?;
        groups.sort_by_key(|g| g.order);

        let docs: Vec<SearchDocument> = groups
            .iter()
            .flat_map(mapper::skill_group_to_site_documents)
            .collect();

        self.indexes
            .site
            .replace_kind(EntityKind::Skill, &docs)
            .await?;
        Ok(ids(&docs))
    }

    async fn blog_document(&self, blog: &Blog) -> SearchResult<SearchDocument> {
        let tags = self.resolver.resolve_tags(&blog.tags).await?;
        let skills = self.resolver.resolve_skills(&blog.skills).await?;
        Ok(mapper::blog_to_blog_document(
            blog,
            &tags.resolved,
            &skills.resolved,
        ))
    }

    async fn job_document(&self, job: &Job) -> SearchResult<SearchDocument> {
        let skills = self.resolver.resolve_job_skills(&job.skills).await?;
        Ok(mapper::job_to_site_document(job, &skills.resolved))
    }

    /// Refresh the documents of one entity. Unpublished blogs are removed.
    pub async fn index_one(&self, entity: SearchableEntity<'_>) {
        let (operation, id, result) = match entity {
            SearchableEntity::Blog(blog) if !blog.is_visible() => {
                ("remove_blog", blog.id.as_str(), self.try_remove_blog(&blog.id).await)
            }
            SearchableEntity::Blog(blog) => {
                ("index_blog", blog.id.as_str(), self.try_index_blog(blog).await)
            }
            SearchableEntity::Job(job) => {
                ("index_job", job.id.as_str(), self.try_index_job(job).await)
            }
            SearchableEntity::SkillGroup(group) => (
                "index_skill_group",
                group.id.as_str(),
                self.try_index_skill_group(group).await,
            ),
        };
        record(operation, id, result);
    }

    /// Remove the documents of one entity. For skills `id` is the group id.
    pub async fn remove_one(&self, kind: EntityKind, id: &str) {
        let (operation, result) = match kind {
            EntityKind::Blog => ("remove_blog", self.try_remove_blog(id).await),
            EntityKind::Job => ("remove_job", self.indexes.site.delete(id).await),
            EntityKind::Skill => (
                "remove_skill_group",
                self.indexes.site.delete_by_parent(id).await,
            ),
        };
        record(operation, id, result);
    }

    pub async fn index_blog(&self, blog: &Blog) {
        self.index_one(SearchableEntity::Blog(blog)).await
    }

    pub async fn remove_blog(&self, id: &str) {
        self.remove_one(EntityKind::Blog, id).await
    }

    pub async fn index_job(&self, job: &Job) {
        self.index_one(SearchableEntity::Job(job)).await
    }

    pub async fn remove_job(&self, id: &str) {
        self.remove_one(EntityKind::Job, id).await
    }

    pub async fn index_skill_group(&self, group: &SkillGroup) {
        self.index_one(SearchableEntity::SkillGroup(group)).await
    }

    pub async fn remove_skill_group(&self, id: &str) {
        self.remove_one(EntityKind::Skill, id).await
    }

    async fn try_index_blog(&self, blog: &Blog) -> SearchResult<()> {
        let blog_doc = self.blog_document(blog).await?;
        self.indexes
            .site
            .upsert(&mapper::blog_to_site_document(blog))
            .await?;
        self.indexes.blog.upsert(&blog_doc).await
    }

    async fn try_remove_blog(&self, id: &str) -> SearchResult<()> {
        self.indexes.site.delete(id).await?;
        self.indexes.blog.delete(id).await
    }

    async fn try_index_job(&self, job: &Job) -> SearchResult<()> {
        let doc = self.job_document(job).await?;
        self.indexes.site.upsert(&doc).await
    }

    async fn try_index_skill_group(&self, group: &SkillGroup) -> SearchResult<()> {
        let docs = mapper::skill_group_to_site_documents(group);
        self.indexes
            .site
            .replace_children(&group.id, &docs)
            .await
            .map(|_| ())
    }
}

fn ids(docs: &[SearchDocument]) -> HashSet<String> {
    docs.iter().map(|d| d.id.clone()).collect()
}

fn record(operation: &str, id: &str, result: SearchResult<()>) {
    match result {
        Ok(()) => {
            SEARCH_INDEX_OPERATIONS_TOTAL
                .with_label_values(&[operation, "success"])
                .inc();
            tracing::debug!(operation, id, "Search index updated");
        }
        Err(e) => {
            SEARCH_INDEX_OPERATIONS_TOTAL
                .with_label_values(&[operation, "failure"])
                .inc();
            tracing::warn!(operation, id, error = %e, "Search index update failed; next full sync will repair it");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Skill, Tag};
    use crate::search::SearchConfig;
    use crate::state::InMemoryStore;
    use chrono::NaiveDate;

    fn synchronizer() -> (SearchIndexSynchronizer, Arc<dyn DocumentStore>) {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStore::new());
        let indexes = SearchIndexes::open(&SearchConfig::default()).unwrap();
        (SearchIndexSynchronizer::new(indexes, store.clone()), store)
    }

    fn published(title: &str) -> Blog {
        let mut blog = Blog::new(title, "Short");
        blog.published = true;
        blog.content = "Body".to_string();
        blog
    }

    #[tokio::test]
    async fn test_full_sync_indexes_published_blogs_only() {
        let (sync, store) = synchronizer();
        let blogs = Repository::<Blog>::new(store.clone());
        blogs.save(published("Visible")).await.unwrap();
        blogs.save(Blog::new("Draft", "Short")).await.unwrap();

        let report = sync.full_sync(EntityKind::Blog).await.unwrap();

        assert_eq!(report.indexed, 1);
        assert_eq!(sync.indexes().site.count(Some(EntityKind::Blog)).unwrap(), 1);
        assert_eq!(sync.indexes().blog.count(None).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_full_sync_removes_orphans() {
        let (sync, store) = synchronizer();
        let blogs = Repository::<Blog>::new(store.clone());
        let blog = blogs.save(published("Gone soon")).await.unwrap();
        sync.full_sync(EntityKind::Blog).await.unwrap();

        blogs.delete(&blog.id).await.unwrap();
        let report = sync.full_sync(EntityKind::Blog).await.unwrap();

        assert_eq!(report.indexed, 0);
        assert_eq!(report.removed, 1);
        assert_eq!(sync.indexes().blog.count(None).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_blog_document_uses_resolved_names() {
        let (sync, store) = synchronizer();
        let tag = Repository::<Tag>::new(store.clone())
            .save(Tag::new("observability"))
            .await
            .unwrap();
        let mut blog = published("Tracing");
        blog.tags = vec![tag.id.clone(), "dangling".to_string()];
        let blog = Repository::<Blog>::new(store.clone()).save(blog).await.unwrap();

        sync.index_blog(&blog).await;

        let doc = sync.indexes().blog.get(&blog.id).unwrap().unwrap();
        assert_eq!(doc.tags, vec!["observability"]);
    }

    #[tokio::test]
    async fn test_unpublishing_removes_blog() {
        let (sync, _) = synchronizer();
        let mut blog = published("Flip");
        blog.id = "b1".to_string();
        sync.index_blog(&blog).await;
        assert!(sync.indexes().site.get("b1").unwrap().is_some());

        blog.published = false;
        sync.index_blog(&blog).await;
        assert!(sync.indexes().site.get("b1").unwrap().is_none());
        assert!(sync.indexes().blog.get("b1").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_skill_group_replace_and_remove() {
        let (sync, _) = synchronizer();
        let mut group = SkillGroup::new("Languages", 1);
        group.id = "g1".to_string();
        let mut rust = Skill::new("Rust", Some(9.0), 1);
        rust.id = "rust".to_string();
        group.skills.push(rust);

        sync.index_skill_group(&group).await;
        assert_eq!(
            sync.indexes().site.all_ids(Some(EntityKind::Skill)).unwrap(),
            vec!["g1_rust"]
        );

        sync.remove_skill_group("g1").await;
        assert_eq!(sync.indexes().site.count(Some(EntityKind::Skill)).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_job_sync() {
        let (sync, store) = synchronizer();
        Repository::<Job>::new(store.clone())
            .save(Job::new(
                "Engineer",
                "Acme",
                NaiveDate::from_ymd_opt(2021, 3, 1).unwrap(),
                "Platform work",
            ))
            .await
            .unwrap();

        let reports = sync.full_sync_all().await.unwrap();
        assert_eq!(reports.len(), 3);
        assert_eq!(sync.indexes().site.count(Some(EntityKind::Job)).unwrap(), 1);
    }
}
