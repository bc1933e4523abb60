//! Reference resolution across collections.
//!
//! Content documents point at each other by id (or, for hand-authored
//! content, by name). Resolution keeps the caller's order, drops references
//! that no longer point anywhere and reports them in [`Resolution::missing`].
//! Dangling references are never an error; store failures are.

use crate::error::Result;
use crate::models::{Collection, Document, DocumentRef, Named, Skill, SkillGroup, Tag};
use crate::state::{DocumentStore, Repository};
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Outcome of resolving a list of references
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution<T> {
    pub resolved: Vec<T>,
    pub missing: Vec<String>,
}

impl<T> Default for Resolution<T> {
    fn default() -> Self {
        Self {
            resolved: Vec::new(),
            missing: Vec::new(),
        }
    }
}

/// A skill embedded in a group, resolved on behalf of a job
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillReference {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub skill_group_id: String,
}

impl SkillReference {
    fn new(skill: &Skill, group: &SkillGroup) -> Self {
        Self {
            id: skill.id.clone(),
            name: skill.name.clone(),
            rating: skill.rating,
            image_url: skill.image_url.clone(),
            skill_group_id: group.id.clone(),
        }
    }
}

#[derive(Clone)]
pub struct ReferenceResolver {
    store: Arc<dyn DocumentStore>,
}

impl ReferenceResolver {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Resolve typed references of any collection to their raw documents
    pub async fn resolve(&self, refs: &[DocumentRef]) -> Result<Resolution<Value>> {
        let mut resolution = Resolution::default();
        let mut seen = HashSet::new();

        for reference in refs {
            if !seen.insert(reference) {
                continue;
            }
            match self.store.get(reference.collection, &reference.id).await? {
                Some(doc) => resolution.resolved.push(doc),
                None => resolution.missing.push(reference.to_string()),
            }
        }

        log_missing(&resolution.missing);
        Ok(resolution)
    }

    /// Resolve ids within `T`'s collection to typed entities
    pub async fn resolve_ids<T: Document>(&self, ids: &[String]) -> Result<Resolution<T>> {
        let refs: Vec<DocumentRef> = ids
            .iter()
            .map(|id| DocumentRef::new(T::COLLECTION, id.clone()))
            .collect();
        let raw = self.resolve(&refs).await?;

        let resolved = raw
            .resolved
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<T>, _>>()?;
        Ok(Resolution {
            resolved,
            missing: raw.missing,
        })
    }

    pub async fn resolve_tags(&self, refs: &[String]) -> Result<Resolution<Tag>> {
        self.resolve_named(refs).await
    }

    /// Resolve standalone skills, as referenced by blogs
    pub async fn resolve_skills(&self, refs: &[String]) -> Result<Resolution<Skill>> {
        self.resolve_named(refs).await
    }

    /// Resolve a job's skill references against the skills embedded in groups
    pub async fn resolve_job_skills(&self, refs: &[String]) -> Result<Resolution<SkillReference>> {
        let groups = Repository::<SkillGroup>::new(self.store.clone())
            .find_all()
            .await?;
        let mut resolution = Resolution::default();
        let mut seen = HashSet::new();

        for reference in refs {
            let found = groups.iter().find_map(|group| {
                group
                    .find_skill(reference)
                    .map(|skill| SkillReference::new(skill, group))
            });
            match found {
                Some(skill) => {
                    if seen.insert(skill.id.clone()) {
                        resolution.resolved.push(skill);
                    }
                }
                None => resolution
                    .missing
                    .push(DocumentRef::new(Collection::Skills, reference.clone()).to_string()),
            }
        }

        log_missing(&resolution.missing);
        Ok(resolution)
    }

    /// Resolve by id, falling back to case-insensitive name
    async fn resolve_named<T: Document + Named>(&self, refs: &[String]) -> Result<Resolution<T>> {
        if refs.is_empty() {
            return Ok(Resolution::default());
        }

        let all = Repository::<T>::new(self.store.clone()).find_all().await?;
        let by_id: HashMap<&str, &T> = all.iter().map(|e| (e.id(), e)).collect();
        let by_name: HashMap<String, &T> = all
            .iter()
            .map(|e| (e.name().to_lowercase(), e))
            .collect();

        let mut resolution = Resolution::default();
        let mut seen = HashSet::new();
        for reference in refs {
            let found = by_id
                .get(reference.as_str())
                .or_else(|| by_name.get(&reference.to_lowercase()));
            match found {
                Some(entity) => {
                    if seen.insert(entity.id().to_string()) {
                        resolution.resolved.push((*entity).clone());
                    }
                }
                None => resolution
                    .missing
                    .push(DocumentRef::new(T::COLLECTION, reference.clone()).to_string()),
            }
        }

        log_missing(&resolution.missing);
        Ok(resolution)
    }
}

fn log_missing(missing: &[String]) {
    if !missing.is_empty() {
        tracing::debug!(missing = ?missing, "Dropped unresolved references");
    }
}
