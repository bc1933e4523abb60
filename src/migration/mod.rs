//! Import of legacy JSON backups into the document store.
//!
//! Collections are imported in dependency order so references can be
//! translated through the legacy to new id maps built along the way:
//!
//! ```text
//! tags ─┐
//!       ├─> blogs (tag and skill ids)
//! skills┼─> jobs (skill names)
//!       └─> skill_groups (embedded skills)
//! profiles, social_media_links, tour_steps (no references)
//! ```
//!
//! Every document is upserted by its legacy `_id`, so running an import
//! twice leaves the store unchanged.

pub mod legacy;

pub use legacy::{read_backup_file, LegacyDocument};

use crate::error::Result;
use crate::metrics::record_mutation;
use crate::resolver::ReferenceResolver;
use crate::models::{
    Blog, Collection, Document, Job, Profile, Skill, SkillGroup, SocialMediaLink, Tag,
    TooltipPosition, TourStep, PROFILE_ID,
};
use crate::state::{DocumentStore, Repository};
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Counts for one imported collection
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CollectionReport {
    pub collection: Collection,
    pub upserted: usize,
    pub skipped: usize,
}

impl CollectionReport {
    fn new(collection: Collection) -> Self {
        Self {
            collection,
            upserted: 0,
            skipped: 0,
        }
    }
}

/// Outcome of a whole backup import
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
    pub collections: Vec<CollectionReport>,
}

impl MigrationReport {
    pub fn get(&self, collection: Collection) -> Option<&CollectionReport> {
        self.collections.iter().find(|c| c.collection == collection)
    }

    pub fn total_upserted(&self) -> usize {
        self.collections.iter().map(|c| c.upserted).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.collections.iter().map(|c| c.skipped).sum()
    }
}

/// Entities that remember the id they had in the legacy store
trait LegacyKeyed: Document {
    fn legacy_id(&self) -> Option<&str>;
    fn set_legacy_id(&mut self, legacy_id: String);
}

macro_rules! impl_legacy_keyed {
    ($($ty:ty),* $(,)?) => {
        $(
            impl LegacyKeyed for $ty {
                fn legacy_id(&self) -> Option<&str> {
                    self.legacy_id.as_deref()
                }

                fn set_legacy_id(&mut self, legacy_id: String) {
                    self.legacy_id = Some(legacy_id);
                }
            }
        )*
    };
}

impl_legacy_keyed!(Tag, Skill, SkillGroup, SocialMediaLink, Job, Blog, TourStep);

/// Legacy id to new id, for one imported collection
type IdMap = HashMap<String, String>;

/// Imports a backup directory into a [`DocumentStore`]
pub struct LegacyImporter {
    store: Arc<dyn DocumentStore>,
    resolver: ReferenceResolver,
}

impl LegacyImporter {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            resolver: ReferenceResolver::new(store.clone()),
            store,
        }
    }

    /// Import every known backup file found in `dir`
    pub async fn import_dir(&self, dir: &Path) -> Result<MigrationReport> {
        tracing::info!(dir = %dir.display(), "Starting legacy import");
        let mut report = MigrationReport::default();

        let docs = load(dir, Collection::Tags).await?;
        let (tags_report, tag_ids) = self.upsert_all(build_each(&docs, build_tag)).await?;
        report.collections.push(tags_report);

        let docs = load(dir, Collection::Skills).await?;
        let (skills_report, skill_ids) = self.upsert_all(build_each(&docs, build_skill)).await?;
        report.collections.push(skills_report);

        let docs = load(dir, Collection::SkillGroups).await?;
        let mut groups = Vec::with_capacity(docs.len());
        for doc in &docs {
            let members = self.group_members(doc, &skill_ids).await?;
            groups.push((doc, build_skill_group(doc, members)));
        }
        report.collections.push(self.upsert_all(groups).await?.0);

        report
            .collections
            .push(self.import_profiles(&load(dir, Collection::Profiles).await?).await?);

        let docs = load(dir, Collection::SocialMediaLinks).await?;
        let (links_report, _) = self
            .upsert_all(build_each(&docs, build_social_media_link))
            .await?;
        report.collections.push(links_report);

        let docs = load(dir, Collection::Jobs).await?;
        let mut jobs = Vec::with_capacity(docs.len());
        for doc in &docs {
            let skills: Vec<Skill> = self.translate(doc, "skills", &skill_ids).await?;
            jobs.push((doc, build_job(doc, &skills)));
        }
        report.collections.push(self.upsert_all(jobs).await?.0);

        let docs = load(dir, Collection::Blogs).await?;
        let mut blogs = Vec::with_capacity(docs.len());
        for doc in &docs {
            let tags: Vec<Tag> = self.translate(doc, "tags", &tag_ids).await?;
            let skills: Vec<Skill> = self.translate(doc, "skills", &skill_ids).await?;
            blogs.push((doc, build_blog(doc, &tags, &skills)));
        }
        report.collections.push(self.upsert_all(blogs).await?.0);

        let docs = load(dir, Collection::TourSteps).await?;
        let (tour_report, _) = self.upsert_all(build_each(&docs, build_tour_step)).await?;
        report.collections.push(tour_report);

        tracing::info!(
            upserted = report.total_upserted(),
            skipped = report.total_skipped(),
            "Legacy import complete"
        );
        Ok(report)
    }

    /// Upsert each built entity by legacy id. Returns the legacy to new id
    /// map for reference translation in later collections.
    async fn upsert_all<T: LegacyKeyed>(
        &self,
        built: Vec<(&LegacyDocument, Option<T>)>,
    ) -> Result<(CollectionReport, IdMap)> {
        let repository = Repository::<T>::new(self.store.clone());
        let existing: IdMap = repository
            .find_all()
            .await?
            .into_iter()
            .filter_map(|e| Some((e.legacy_id()?.to_string(), e.id().to_string())))
            .collect();

        let mut report = CollectionReport::new(T::COLLECTION);
        let mut ids = IdMap::new();

        for (doc, entity) in built {
            let Some(legacy_id) = doc.legacy_id() else {
                tracing::warn!(collection = %T::COLLECTION, "Document has no _id, skipping");
                report.skipped += 1;
                continue;
            };
            let Some(mut entity) = entity else {
                tracing::warn!(
                    collection = %T::COLLECTION,
                    legacy_id = %legacy_id,
                    "Document is missing required fields, skipping"
                );
                report.skipped += 1;
                continue;
            };

            entity.set_id(existing.get(&legacy_id).cloned().unwrap_or_default());
            entity.set_legacy_id(legacy_id.clone());

            match repository.save(entity).await {
                Ok(entity) => {
                    record_mutation(T::COLLECTION.as_ref(), "import");
                    ids.insert(legacy_id, entity.id().to_string());
                    report.upserted += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        collection = %T::COLLECTION,
                        legacy_id = %legacy_id,
                        error = %e,
                        "Failed to save imported document, skipping"
                    );
                    report.skipped += 1;
                }
            }
        }

        tracing::info!(
            collection = %T::COLLECTION,
            upserted = report.upserted,
            skipped = report.skipped,
            "Collection imported"
        );
        Ok((report, ids))
    }

    /// The profile is a singleton; every backup profile is written onto it
    async fn import_profiles(&self, docs: &[LegacyDocument]) -> Result<CollectionReport> {
        let repository = Repository::<Profile>::new(self.store.clone());
        let mut report = CollectionReport::new(Collection::Profiles);
        let existing_created = repository
            .find_by_id(PROFILE_ID)
            .await?
            .map(|p| p.created_at);

        for doc in docs {
            let Some(profile) = build_profile(doc, existing_created) else {
                report.skipped += 1;
                continue;
            };
            repository.save(profile).await?;
            record_mutation(Collection::Profiles.as_ref(), "import");
            report.upserted += 1;
        }
        Ok(report)
    }

    /// Resolve a field's references to the imported entities, in order.
    /// References that were never imported or no longer resolve are dropped.
    async fn translate<T: Document>(
        &self,
        doc: &LegacyDocument,
        field: &str,
        ids: &IdMap,
    ) -> Result<Vec<T>> {
        let mut new_ids = Vec::new();
        for reference in doc.refs(field, T::COLLECTION) {
            match ids.get(&reference.id) {
                Some(id) => new_ids.push(id.clone()),
                None => tracing::warn!(
                    field,
                    reference = %reference,
                    owner = ?doc.legacy_id(),
                    "Dropping unresolvable legacy reference"
                ),
            }
        }
        Ok(self.resolver.resolve_ids::<T>(&new_ids).await?.resolved)
    }

    /// Group members, either referenced or embedded whole. An embedded
    /// member that was also imported as a standalone skill uses that skill.
    async fn group_members(&self, doc: &LegacyDocument, skill_ids: &IdMap) -> Result<Vec<Skill>> {
        let embedded = doc.embedded("skills");
        if embedded.is_empty() {
            return self.translate(doc, "skills", skill_ids).await;
        }

        let mut members = Vec::with_capacity(embedded.len());
        for member in &embedded {
            let imported = match member.legacy_id().and_then(|id| skill_ids.get(&id).cloned()) {
                Some(id) => self.resolver.resolve_ids::<Skill>(&[id]).await?.resolved.pop(),
                None => None,
            };
            let skill = imported.or_else(|| {
                let mut skill = build_skill(member)?;
                skill.id = member
                    .legacy_id()
                    .unwrap_or_else(|| Uuid::new_v4().to_string());
                Some(skill)
            });
            members.extend(skill);
        }
        Ok(members)
    }
}

async fn load(dir: &Path, collection: Collection) -> Result<Vec<LegacyDocument>> {
    read_backup_file(&dir.join(format!("{}.json", collection))).await
}

fn build_each<'a, T>(
    docs: &'a [LegacyDocument],
    build: impl Fn(&LegacyDocument) -> Option<T>,
) -> Vec<(&'a LegacyDocument, Option<T>)> {
    docs.iter().map(|doc| (doc, build(doc))).collect()
}

fn build_tag(doc: &LegacyDocument) -> Option<Tag> {
    let mut tag = Tag::new(doc.string(&["name"])?);
    stamp(doc, &mut tag.created_at, &mut tag.updated_at);
    Some(tag)
}

fn build_skill(doc: &LegacyDocument) -> Option<Skill> {
    let mut skill = Skill::new(
        doc.string(&["name"])?,
        doc.f64("rating"),
        doc.i32("order").unwrap_or(0),
    );
    skill.description = doc.string(&["description"]);
    skill.image_url = doc.image_url(&["image", "imageUrl"]);
    stamp(doc, &mut skill.created_at, &mut skill.updated_at);
    Some(skill)
}

fn build_skill_group(doc: &LegacyDocument, members: Vec<Skill>) -> Option<SkillGroup> {
    let mut group = SkillGroup::new(
        doc.string(&["name"])?,
        doc.i32("order").or_else(|| doc.i32("displayOrder")).unwrap_or(0),
    );
    group.description = doc.string(&["description"]);
    group.image_url = doc.image_url(&["image", "imageUrl"]);
    group.skills = members;
    group.recompute_rating();
    stamp(doc, &mut group.created_at, &mut group.updated_at);
    Some(group)
}

fn build_profile(
    doc: &LegacyDocument,
    existing_created: Option<chrono::DateTime<Utc>>,
) -> Option<Profile> {
    let now = Utc::now();
    Some(Profile {
        id: PROFILE_ID.to_string(),
        name: doc.string(&["name"])?,
        title: doc.string(&["title"]).unwrap_or_default(),
        headline: doc.string(&["headline"]),
        description: doc.string(&["description"]),
        location: doc.string(&["location"]),
        phone_number: doc.string(&["phoneNumber"]),
        primary_email: doc.string(&["primaryEmail"]),
        secondary_email: doc.string(&["secondaryEmail"]),
        profile_image_url: doc.image_url(&["profileImage", "profileImageUrl"]),
        sidebar_image_url: doc.image_url(&["sidebarImage", "sidebarImageUrl"]),
        background_image_url: doc.image_url(&["backgroundImage", "backgroundImageUrl"]),
        mobile_background_image_url: doc
            .image_url(&["mobileBackgroundImage", "mobileBackgroundImageUrl"]),
        cv_url: doc.image_url(&["cv", "cvUrl"]),
        created_at: existing_created
            .or_else(|| doc.timestamp("createdAt"))
            .unwrap_or(now),
        updated_at: doc.timestamp("updatedAt").unwrap_or(now),
    })
}

fn build_social_media_link(doc: &LegacyDocument) -> Option<SocialMediaLink> {
    let mut link = SocialMediaLink::new(doc.string(&["type"])?, doc.string(&["link"])?);
    link.name = doc.string(&["name"]);
    link.include_on_resume = doc.bool("includeOnResume");
    stamp(doc, &mut link.created_at, &mut link.updated_at);
    Some(link)
}

fn build_job(doc: &LegacyDocument, skills: &[Skill]) -> Option<Job> {
    let mut job = Job::new(
        doc.string(&["title"])?,
        doc.string(&["company"])?,
        doc.date("startDate")?,
        doc.string(&["shortDescription"]).unwrap_or_default(),
    );
    job.company_url = doc.string(&["companyUrl"]);
    job.company_image_url = doc.image_url(&["companyImage", "companyImageUrl"]);
    job.end_date = doc.date("endDate");
    job.location = doc.string(&["location"]);
    job.long_description = doc.string(&["longDescription"]);
    job.education = doc.bool("education") || doc.bool("isEducation");
    job.include_on_resume = doc.bool("includeOnResume");
    job.skills = skills.iter().map(|s| s.name.clone()).collect();
    stamp(doc, &mut job.created_at, &mut job.updated_at);
    Some(job)
}

fn build_blog(
    doc: &LegacyDocument,
    tags: &[Tag],
    skills: &[Skill],
) -> Option<Blog> {
    let mut blog = Blog::new(
        doc.string(&["title"])?,
        doc.string(&["shortDescription"]).unwrap_or_default(),
    );
    blog.content = doc.string(&["content"]).unwrap_or_default();
    blog.published = doc.bool("published");
    blog.featured_image_url = doc.image_url(&["featuredImage", "featuredImageUrl", "image"]);
    blog.tags = tags.iter().map(|t| t.id.clone()).collect();
    blog.skills = skills.iter().map(|s| s.id.clone()).collect();
    stamp(doc, &mut blog.created_at, &mut blog.updated_at);
    Some(blog)
}

fn build_tour_step(doc: &LegacyDocument) -> Option<TourStep> {
    let mut step = TourStep::new(
        doc.i32("order")?,
        doc.string(&["targetSelector", "selector"])?,
        doc.string(&["title"])?,
    );
    step.title_image_url = doc.image_url(&["titleImage", "titleImageUrl"]);
    step.description = doc.string(&["description"]).unwrap_or_default();
    step.position = doc
        .string(&["position"])
        .and_then(|p| p.to_ascii_lowercase().parse::<TooltipPosition>().ok())
        .unwrap_or_default();
    stamp(doc, &mut step.created_at, &mut step.updated_at);
    Some(step)
}

/// Carry over legacy timestamps when present
fn stamp(
    doc: &LegacyDocument,
    created_at: &mut chrono::DateTime<Utc>,
    updated_at: &mut chrono::DateTime<Utc>,
) {
    if let Some(ts) = doc.timestamp("createdAt").or_else(|| doc.timestamp("createdDate")) {
        *created_at = ts;
    }
    if let Some(ts) = doc.timestamp("updatedAt").or_else(|| doc.timestamp("updatedDate")) {
        *updated_at = ts;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::InMemoryStore;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> LegacyDocument {
        LegacyDocument::new(value)
    }

    fn importer() -> LegacyImporter {
        LegacyImporter::new(Arc::new(InMemoryStore::new()))
    }

    #[tokio::test]
    async fn test_translate_drops_unknown_references() {
        let importer = importer();
        let rust = Repository::<Tag>::new(importer.store.clone())
            .save(Tag::new("rust"))
            .await
            .unwrap();
        let ids: IdMap = [
            ("old-rust".to_string(), rust.id.clone()),
            ("deleted".to_string(), "no-such-tag".to_string()),
        ]
        .into_iter()
        .collect();

        let blog = doc(json!({
            "_id": "b1",
            "tags": [
                {"$ref": "tags", "$id": "old-rust"},
                {"$ref": "tags", "$id": "gone"},
                {"$ref": "tags", "$id": "deleted"},
                {"$ref": "skills", "$id": "old-rust"}
            ]
        }));
        let tags: Vec<Tag> = importer.translate(&blog, "tags", &ids).await.unwrap();
        assert_eq!(tags, vec![rust]);
    }

    #[test]
    fn test_build_tour_step_reads_selector_alias() {
        let step = build_tour_step(&doc(json!({
            "_id": "t1",
            "order": 3,
            "selector": "#hero",
            "title": "Welcome",
            "position": "Left"
        })))
        .unwrap();

        assert_eq!(step.order, 3);
        assert_eq!(step.target_selector, "#hero");
        assert_eq!(step.position, TooltipPosition::Left);
        assert!(build_tour_step(&doc(json!({"_id": "t2", "title": "x"}))).is_none());
    }

    #[test]
    fn test_build_job_requires_start_date() {
        assert!(build_job(
            &doc(json!({"_id": "j1", "title": "Dev", "company": "Acme"})),
            &[]
        )
        .is_none());

        let job = build_job(
            &doc(json!({
                "_id": "j2",
                "title": "Dev",
                "company": "Acme",
                "startDate": "2019-05-01",
                "education": true
            })),
            &[],
        )
        .unwrap();
        assert!(job.education);
        assert!(!job.include_on_resume);
    }

    #[tokio::test]
    async fn test_embedded_group_members() {
        let importer = importer();
        let group = doc(json!({
            "_id": "g1",
            "name": "Languages",
            "displayOrder": 2,
            "skills": [
                {"_id": "s1", "name": "Rust", "rating": 9},
                {"_id": "s2", "name": "Go", "rating": 7}
            ]
        }));

        let members = importer.group_members(&group, &IdMap::new()).await.unwrap();
        let ids: Vec<&str> = members.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s2"]);

        let group = build_skill_group(&group, members).unwrap();
        assert_eq!(group.order, 2);
        assert_eq!(group.rating, Some(8.0));
    }
}
