//! Blog tags

use crate::content::validation::{field_errors, finish, is_blank, require};
use crate::error::{AppError, Result};
use crate::metrics::record_mutation;
use crate::models::{Collection, Tag};
use crate::state::{DocumentStore, Repository};
use chrono::Utc;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use validator::Validate;

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct TagRequest {
    #[validate(length(min = 1, max = 50, message = "must be between 1 and 50 characters"))]
    pub name: String,
}

impl TagRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn check(&self) -> Result<()> {
        let mut errors = field_errors(self, "");
        require(&mut errors, "name", &self.name);
        finish(errors)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BulkTagRequest {
    pub names: Vec<String>,
}

pub struct TagService {
    tags: Repository<Tag>,
}

impl TagService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            tags: Repository::new(store),
        }
    }

    /// All tags sorted by name, ignoring case
    pub async fn list(&self) -> Result<Vec<Tag>> {
        let mut tags = self.tags.find_all().await?;
        tags.sort_by_key(|t| t.name.to_lowercase());
        Ok(tags)
    }

    pub async fn get(&self, id: &str) -> Result<Tag> {
        self.tags.get(id).await
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Tag>> {
        let name = name.trim();
        Ok(self
            .tags
            .find_all()
            .await?
            .into_iter()
            .find(|t| t.name.eq_ignore_ascii_case(name)))
    }

    pub async fn create(&self, request: TagRequest, actor: &str) -> Result<Tag> {
        request.check()?;
        if let Some(existing) = self.find_by_name(&request.name).await? {
            return Err(AppError::Conflict(format!("Tag already exists: {}", existing.name)));
        }

        let tag = self.tags.save(Tag::new(request.name.trim())).await?;

        record_mutation(Collection::Tags.as_ref(), "create");
        tracing::info!(tag_id = %tag.id, subject = %actor, "Tag created");
        Ok(tag)
    }

    /// Create every new name, skipping blanks and names that already exist.
    /// Returns only the tags that were created.
    pub async fn create_bulk(&self, request: BulkTagRequest, actor: &str) -> Result<Vec<Tag>> {
        let mut known: HashSet<String> = self
            .tags
            .find_all()
            .await?
            .into_iter()
            .map(|t| t.name.to_lowercase())
            .collect();

        let mut errors = Vec::new();
        let mut fresh = Vec::new();
        for (i, name) in request.names.iter().enumerate() {
            if is_blank(name) {
                continue;
            }
            let tag_request = TagRequest::new(name.trim());
            errors.extend(field_errors(&tag_request, &format!("names[{}].", i)));
            if known.insert(name.trim().to_lowercase()) {
                fresh.push(Tag::new(name.trim()));
            }
        }
        finish(errors)?;

        let created = self.tags.save_all(fresh).await?;
        record_mutation(Collection::Tags.as_ref(), "bulk_create");
        tracing::info!(count = created.len(), subject = %actor, "Tags created in bulk");
        Ok(created)
    }

    pub async fn update(&self, id: &str, request: TagRequest, actor: &str) -> Result<Tag> {
        request.check()?;
        let mut tag = self.tags.get(id).await?;
        if let Some(existing) = self.find_by_name(&request.name).await? {
            if existing.id != tag.id {
                return Err(AppError::Conflict(format!("Tag already exists: {}", existing.name)));
            }
        }

        tag.name = request.name.trim().to_string();
        tag.updated_at = Utc::now();
        let tag = self.tags.save(tag).await?;

        record_mutation(Collection::Tags.as_ref(), "update");
        tracing::info!(tag_id = %tag.id, subject = %actor, "Tag updated");
        Ok(tag)
    }

    pub async fn delete(&self, id: &str, actor: &str) -> Result<()> {
        if !self.tags.delete(id).await? {
            return Err(AppError::NotFound(format!("Tag not found: {}", id)));
        }
        record_mutation(Collection::Tags.as_ref(), "delete");
        tracing::info!(tag_id = %id, subject = %actor, "Tag deleted");
        Ok(())
    }
}
