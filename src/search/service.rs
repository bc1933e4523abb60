//! Read-side search over the site and blog indexes

use crate::search::config::SearchConfig;
use crate::search::document::{EntityKind, SearchDocument};
use crate::search::error::SearchResult;
use crate::search::index::{IndexManager, IndexStats, SearchIndexes};
use crate::search::query::{QueryBuilder, SearchQuery};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A compact hit shown in the site-wide search dropdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSearchHit {
    pub title: String,
    pub image_url: Option<String>,
    pub url: String,
}

impl From<SearchDocument> for SiteSearchHit {
    fn from(doc: SearchDocument) -> Self {
        Self {
            title: doc.title,
            image_url: doc.image_url,
            url: doc.url,
        }
    }
}

/// Site search results grouped by entity kind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteSearchResults {
    pub blogs: Vec<SiteSearchHit>,
    pub jobs: Vec<SiteSearchHit>,
    pub skills: Vec<SiteSearchHit>,
}

impl SiteSearchResults {
    pub fn is_empty(&self) -> bool {
        self.blogs.is_empty() && self.jobs.is_empty() && self.skills.is_empty()
    }
}

/// A ranked blog search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogSearchHit {
    pub id: String,
    pub title: String,
    pub short_description: Option<String>,
    pub image_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub url: String,
}

impl From<SearchDocument> for BlogSearchHit {
    fn from(doc: SearchDocument) -> Self {
        Self {
            id: doc.id,
            title: doc.title,
            short_description: doc.short_description,
            image_url: doc.image_url,
            published_at: doc.published_at,
            url: doc.url,
        }
    }
}

/// Search service
#[derive(Clone)]
pub struct SearchService {
    indexes: SearchIndexes,

    /// Configuration
    config: SearchConfig,
}

impl SearchService {
    pub fn new(indexes: SearchIndexes, config: SearchConfig) -> Self {
        Self { indexes, config }
    }

    /// Search blogs, jobs and skills, returning at most
    /// `max_results_per_group` hits of each kind.
    ///
    /// Short queries and engine failures yield empty results.
    pub fn site_search(&self, raw_query: &str) -> SiteSearchResults {
        let Some(query) = SearchQuery::normalize(raw_query, &self.config) else {
            return SiteSearchResults::default();
        };
        let query = query.with_limit(self.config.max_results_per_group);

        match self.try_site_search(&query) {
            Ok(results) => results,
            Err(e) => {
                tracing::error!(query = %query.text, error = %e, "Site search failed");
                SiteSearchResults::default()
            }
        }
    }

    fn try_site_search(&self, query: &SearchQuery) -> SearchResult<SiteSearchResults> {
        let site = &self.indexes.site;
        let builder = QueryBuilder::new(site.schema(), site.index().clone());

        let group = |kind: EntityKind| -> SearchResult<Vec<SiteSearchHit>> {
            let hits = site.search(&*builder.site_query(query, kind), query.limit)?;
            Ok(hits.into_iter().map(|(_, doc)| doc.into()).collect())
        };

        Ok(SiteSearchResults {
            blogs: group(EntityKind::Blog)?,
            jobs: group(EntityKind::Job)?,
            skills: group(EntityKind::Skill)?,
        })
    }

    /// Ranked search over published blogs, at most `max_blog_results` hits
    pub fn blog_search(&self, raw_query: &str) -> Vec<BlogSearchHit> {
        let Some(query) = SearchQuery::normalize(raw_query, &self.config) else {
            return Vec::new();
        };
        let query = query.with_limit(self.config.max_blog_results);

        match self.try_blog_search(&query) {
            Ok(hits) => hits,
            Err(e) => {
                tracing::error!(query = %query.text, error = %e, "Blog search failed");
                Vec::new()
            }
        }
    }

    fn try_blog_search(&self, query: &SearchQuery) -> SearchResult<Vec<BlogSearchHit>> {
        let blog: &IndexManager = &self.indexes.blog;
        let builder = QueryBuilder::new(blog.schema(), blog.index().clone());
        let hits = blog.search(&*builder.blog_query(query), query.limit)?;
        Ok(hits.into_iter().map(|(_, doc)| doc.into()).collect())
    }

    pub fn stats(&self) -> SearchResult<Vec<IndexStats>> {
        self.indexes.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, kind: EntityKind, title: &str, tags: &[&str]) -> SearchDocument {
        SearchDocument {
            id: id.to_string(),
            kind,
            parent_id: None,
            title: title.to_string(),
            short_description: Some(format!("About {}", title)),
            body: title.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            skills: vec![],
            image_url: None,
            url: format!("/{}", id),
            published_at: None,
        }
    }

    async fn service() -> SearchService {
        let config = SearchConfig::default();
        let indexes = SearchIndexes::open(&config).unwrap();
        indexes
            .site
            .upsert(&doc("b1", EntityKind::Blog, "Rust ownership", &[]))
            .await
            .unwrap();
        indexes
            .site
            .upsert(&doc("j1", EntityKind::Job, "Rust engineer", &[]))
            .await
            .unwrap();
        indexes
            .blog
            .upsert(&doc("b1", EntityKind::Blog, "Rust ownership", &["memory"]))
            .await
            .unwrap();
        indexes
            .blog
            .upsert(&doc("b2", EntityKind::Blog, "Café culture", &["rust"]))
            .await
            .unwrap();
        SearchService::new(indexes, config)
    }

    #[tokio::test]
    async fn test_site_search_groups_by_kind() {
        let service = service().await;
        let results = service.site_search("rust");

        assert_eq!(results.blogs.len(), 1);
        assert_eq!(results.jobs.len(), 1);
        assert!(results.skills.is_empty());
        assert_eq!(results.jobs[0].url, "/j1");
    }

    #[tokio::test]
    async fn test_blog_search_is_accent_insensitive() {
        let service = service().await;
        let hits = service.blog_search("cafe");

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "b2");
    }

    #[tokio::test]
    async fn test_blog_search_prefers_title_matches() {
        let service = service().await;
        let hits = service.blog_search("rust");

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "b1");
    }

    #[tokio::test]
    async fn test_short_and_malformed_queries() {
        let service = service().await;
        assert!(service.site_search("r").is_empty());
        assert!(service.blog_search(" ").is_empty());
        // Unbalanced syntax is parsed leniently rather than rejected
        let hits = service.blog_search("rust AND (");
        assert!(hits.len() <= 2);
    }
}
