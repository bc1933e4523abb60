//! Blog posts

use crate::content::validation::{field_errors, finish, is_blank, non_blank};
use crate::error::{AppError, FieldError, Result};
use crate::metrics::record_mutation;
use crate::models::{Blog, Collection, Page, PageRequest};
use crate::resolver::ReferenceResolver;
use crate::search::SearchIndexSynchronizer;
use crate::state::{DocumentStore, Repository};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub const DEFAULT_LATEST_LIMIT: usize = 3;
pub const MAX_LATEST_LIMIT: usize = 10;

/// A resolved reference shown by name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogView {
    pub id: String,
    pub title: String,
    pub short_description: String,
    /// Omitted from list views
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub published: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_image_url: Option<String>,
    pub tags: Vec<NamedRef>,
    pub skills: Vec<NamedRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// References that no longer resolve; only reported to admins
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unresolved_references: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BlogRequest {
    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 500, message = "must be between 1 and 500 characters"))]
    pub short_description: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub published: bool,
    pub featured_image_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
}

impl BlogRequest {
    fn check(&self) -> Result<()> {
        let mut errors = field_errors(self, "");
        if is_blank(&self.title) {
            errors.push(FieldError::new("title", "must not be blank"));
        }
        if self.published {
            if is_blank(&self.content) {
                errors.push(FieldError::new("content", "is required for published posts"));
            }
            if self.tags.iter().all(|t| is_blank(t)) {
                errors.push(FieldError::new("tags", "published posts need at least one tag"));
            }
        }
        finish(errors)
    }

    fn apply(self, blog: &mut Blog) {
        blog.title = self.title.trim().to_string();
        blog.short_description = self.short_description.trim().to_string();
        blog.content = self.content;
        blog.published = self.published;
        blog.featured_image_url = non_blank(self.featured_image_url);
        blog.tags = clean_refs(self.tags);
        blog.skills = clean_refs(self.skills);
    }
}

/// Trimmed, non-blank references in their original order without repeats
fn clean_refs(refs: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(refs.len());
    for reference in refs {
        let reference = reference.trim().to_string();
        if !reference.is_empty() && !out.contains(&reference) {
            out.push(reference);
        }
    }
    out
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct BlogFilter {
    pub published: Option<bool>,
}

pub struct BlogService {
    blogs: Repository<Blog>,
    resolver: ReferenceResolver,
    search: Option<SearchIndexSynchronizer>,
}

impl BlogService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            blogs: Repository::new(store.clone()),
            resolver: ReferenceResolver::new(store),
            search: None,
        }
    }

    /// Keep the search indexes updated after writes
    pub fn with_search(mut self, search: SearchIndexSynchronizer) -> Self {
        self.search = Some(search);
        self
    }

    async fn view(&self, blog: Blog, with_content: bool) -> Result<BlogView> {
        let tags = self.resolver.resolve_tags(&blog.tags).await?;
        let skills = self.resolver.resolve_skills(&blog.skills).await?;

        let mut unresolved = tags.missing;
        unresolved.extend(skills.missing);

        Ok(BlogView {
            id: blog.id,
            title: blog.title,
            short_description: blog.short_description,
            content: with_content.then_some(blog.content),
            published: blog.published,
            featured_image_url: blog.featured_image_url,
            tags: tags
                .resolved
                .into_iter()
                .map(|t| NamedRef { id: t.id, name: t.name })
                .collect(),
            skills: skills
                .resolved
                .into_iter()
                .map(|s| NamedRef { id: s.id, name: s.name })
                .collect(),
            created_at: blog.created_at,
            updated_at: blog.updated_at,
            unresolved_references: unresolved,
        })
    }

    async fn newest_first(&self, filter: BlogFilter) -> Result<Vec<Blog>> {
        let mut blogs: Vec<Blog> = self
            .blogs
            .find_all()
            .await?
            .into_iter()
            .filter(|b| filter.published.map_or(true, |p| b.published == p))
            .collect();
        blogs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(blogs)
    }

    /// Published posts, newest first, without content
    pub async fn list_published(&self) -> Result<Vec<BlogView>> {
        let blogs = self.newest_first(BlogFilter { published: Some(true) }).await?;
        let mut views = Vec::with_capacity(blogs.len());
        for blog in blogs {
            let mut view = self.view(blog, false).await?;
            view.unresolved_references.clear();
            views.push(view);
        }
        Ok(views)
    }

    /// The `limit` newest published posts
    pub async fn latest(&self, limit: Option<usize>) -> Result<Vec<BlogView>> {
        let limit = limit.unwrap_or(DEFAULT_LATEST_LIMIT);
        if !(1..=MAX_LATEST_LIMIT).contains(&limit) {
            return Err(AppError::invalid_field(
                "limit",
                format!("must be between 1 and {}", MAX_LATEST_LIMIT),
            ));
        }

        let mut views = self.list_published().await?;
        views.truncate(limit);
        Ok(views)
    }

    /// A published post; drafts are reported as not found
    pub async fn get_published(&self, id: &str) -> Result<BlogView> {
        match self.blogs.find_by_id(id).await? {
            Some(blog) if blog.is_visible() => {
                let mut view = self.view(blog, true).await?;
                view.unresolved_references.clear();
                Ok(view)
            }
            _ => Err(AppError::NotFound(format!("Blog not found: {}", id))),
        }
    }

    pub async fn admin_list(&self, request: PageRequest, filter: BlogFilter) -> Result<Page<BlogView>> {
        let page = Page::from_sorted(self.newest_first(filter).await?, request);
        let mut content = Vec::with_capacity(page.content.len());
        for blog in page.content.iter().cloned() {
            content.push(self.view(blog, false).await?);
        }
        Ok(Page {
            content,
            total_elements: page.total_elements,
            total_pages: page.total_pages,
            size: page.size,
            number: page.number,
        })
    }

    /// Any post, with unresolved references listed
    pub async fn admin_get(&self, id: &str) -> Result<BlogView> {
        let blog = self.blogs.get(id).await?;
        self.view(blog, true).await
    }

    pub async fn create(&self, request: BlogRequest, actor: &str) -> Result<BlogView> {
        request.check()?;

        let mut blog = Blog::new("", "");
        request.apply(&mut blog);
        let blog = self.blogs.save(blog).await?;

        record_mutation(Collection::Blogs.as_ref(), "create");
        tracing::info!(blog_id = %blog.id, subject = %actor, "Blog created");

        if let Some(search) = &self.search {
            search.index_blog(&blog).await;
        }
        self.view(blog, true).await
    }

    pub async fn update(&self, id: &str, request: BlogRequest, actor: &str) -> Result<BlogView> {
        request.check()?;

        let mut blog = self.blogs.get(id).await?;
        request.apply(&mut blog);
        blog.updated_at = Utc::now();
        let blog = self.blogs.save(blog).await?;

        record_mutation(Collection::Blogs.as_ref(), "update");
        tracing::info!(blog_id = %blog.id, subject = %actor, "Blog updated");

        if let Some(search) = &self.search {
            search.index_blog(&blog).await;
        }
        self.view(blog, true).await
    }

    pub async fn delete(&self, id: &str, actor: &str) -> Result<()> {
        if !self.blogs.delete(id).await? {
            return Err(AppError::NotFound(format!("Blog not found: {}", id)));
        }

        record_mutation(Collection::Blogs.as_ref(), "delete");
        tracing::info!(blog_id = %id, subject = %actor, "Blog deleted");

        if let Some(search) = &self.search {
            search.remove_blog(id).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Skill, Tag};
    use crate::state::create_in_memory_store;

    fn request(title: &str) -> BlogRequest {
        BlogRequest {
            title: title.to_string(),
            short_description: "Short".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_then_fetch() {
        let service = BlogService::new(create_in_memory_store());
        let created = service.create(request("Hello"), "tester").await.unwrap();

        assert!(!created.id.is_empty());
        let fetched = service.admin_get(&created.id).await.unwrap();
        assert_eq!(fetched.title, "Hello");
        assert_eq!(fetched.short_description, "Short");
    }

    #[tokio::test]
    async fn test_publish_requires_content_and_tag() {
        let service = BlogService::new(create_in_memory_store());
        let mut req = request("Hello");
        req.published = true;

        match service.create(req, "tester").await.unwrap_err() {
            AppError::InvalidFields(fields) => {
                let names: Vec<&str> = fields.iter().map(|f| f.field.as_str()).collect();
                assert_eq!(names, vec!["content", "tags"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_title_too_long() {
        let service = BlogService::new(create_in_memory_store());
        let err = service
            .create(request(&"x".repeat(201)), "tester")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidFields(_)));
    }

    #[tokio::test]
    async fn test_drafts_are_hidden_publicly() {
        let service = BlogService::new(create_in_memory_store());
        let draft = service.create(request("Draft"), "tester").await.unwrap();

        assert!(service.list_published().await.unwrap().is_empty());
        assert!(matches!(
            service.get_published(&draft.id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_detail_resolves_names_and_reports_dangling() {
        let store = create_in_memory_store();
        let tag = Repository::<Tag>::new(store.clone())
            .save(Tag::new("rust"))
            .await
            .unwrap();
        let skill = Repository::<Skill>::new(store.clone())
            .save(Skill::new("Tokio", Some(8.0), 0))
            .await
            .unwrap();
        let service = BlogService::new(store);

        let mut req = request("Async");
        req.published = true;
        req.content = "Body".to_string();
        req.tags = vec![tag.id.clone(), "gone".to_string()];
        req.skills = vec![skill.id.clone()];
        let created = service.create(req, "tester").await.unwrap();

        let public = service.get_published(&created.id).await.unwrap();
        assert_eq!(public.tags, vec![NamedRef { id: tag.id, name: "rust".to_string() }]);
        assert_eq!(public.skills[0].name, "Tokio");
        assert!(public.unresolved_references.is_empty());

        let admin = service.admin_get(&created.id).await.unwrap();
        assert_eq!(admin.unresolved_references, vec!["tags/gone"]);
    }

    #[tokio::test]
    async fn test_latest_limit_bounds() {
        let service = BlogService::new(create_in_memory_store());
        assert!(service.latest(Some(0)).await.is_err());
        assert!(service.latest(Some(11)).await.is_err());
        assert!(service.latest(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let service = BlogService::new(create_in_memory_store());
        let created = service.create(request("Bye"), "tester").await.unwrap();
        service.delete(&created.id, "tester").await.unwrap();

        assert!(matches!(
            service.admin_get(&created.id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            service.delete(&created.id, "tester").await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }
}
