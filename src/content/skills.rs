//! Standalone skills and skill groups

use crate::content::validation::{apply_reorder, field_errors, finish, non_blank, require, ReorderRequest};
use crate::error::{AppError, Result};
use crate::metrics::record_mutation;
use crate::models::{by_start_date_desc, Collection, Job, Page, PageRequest, Skill, SkillGroup};
use crate::search::SearchIndexSynchronizer;
use crate::state::{DocumentStore, Repository};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SkillRequest {
    /// Kept when updating a group member; assigned when absent
    pub id: Option<String>,
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    pub name: String,
    #[validate(range(min = 0.0, max = 10.0, message = "must be between 0 and 10"))]
    pub rating: Option<f64>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    #[validate(range(min = 0, message = "must be at least 0"))]
    #[serde(default)]
    pub order: i32,
}

impl SkillRequest {
    fn errors(&self, prefix: &str) -> Vec<crate::error::FieldError> {
        let mut errors = field_errors(self, prefix);
        require(&mut errors, &format!("{}name", prefix), &self.name);
        errors
    }

    fn apply(self, skill: &mut Skill) {
        skill.name = self.name.trim().to_string();
        skill.rating = self.rating;
        skill.description = non_blank(self.description);
        skill.image_url = non_blank(self.image_url);
        skill.order = self.order;
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SkillGroupRequest {
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    #[validate(range(min = 0, message = "must be at least 0"))]
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub skills: Vec<SkillRequest>,
}

impl SkillGroupRequest {
    fn check(&self) -> Result<()> {
        let mut errors = field_errors(self, "");
        require(&mut errors, "name", &self.name);
        for (i, skill) in self.skills.iter().enumerate() {
            errors.extend(skill.errors(&format!("skills[{}].", i)));
        }
        finish(errors)
    }

    /// Members keep their previous id and creation time when matched by id
    fn apply(self, group: &mut SkillGroup) {
        let previous = std::mem::take(&mut group.skills);
        let now = Utc::now();

        group.name = self.name.trim().to_string();
        group.description = non_blank(self.description);
        group.image_url = non_blank(self.image_url);
        group.order = self.order;
        group.skills = self
            .skills
            .into_iter()
            .map(|request| {
                let existing = request
                    .id
                    .as_deref()
                    .and_then(|id| previous.iter().find(|s| s.id == id));
                let mut skill = match existing {
                    Some(skill) => skill.clone(),
                    None => {
                        let mut skill = Skill::new("", None, 0);
                        skill.id = non_blank(request.id.clone())
                            .unwrap_or_else(|| Uuid::new_v4().to_string());
                        skill
                    }
                };
                request.apply(&mut skill);
                skill.updated_at = now;
                skill
            })
            .collect();
        group.recompute_rating();
    }
}

/// A job listed under a skill it used
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    pub id: String,
    pub title: String,
    pub company: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillDetail {
    #[serde(flatten)]
    pub skill: Skill,
    pub jobs: Vec<JobSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillGroupDetail {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub order: i32,
    pub skills: Vec<SkillDetail>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn by_order_then_name<T>(order: impl Fn(&T) -> i32, name: impl Fn(&T) -> &str) -> impl Fn(&T, &T) -> std::cmp::Ordering {
    move |a, b| {
        order(a)
            .cmp(&order(b))
            .then_with(|| name(a).to_lowercase().cmp(&name(b).to_lowercase()))
    }
}

fn with_sorted_members(mut group: SkillGroup) -> SkillGroup {
    group
        .skills
        .sort_by(by_order_then_name(|s: &Skill| s.order, |s: &Skill| s.name.as_str()));
    group
}

pub struct SkillService {
    skills: Repository<Skill>,
    groups: Repository<SkillGroup>,
    jobs: Repository<Job>,
    search: Option<SearchIndexSynchronizer>,
}

impl SkillService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            skills: Repository::new(store.clone()),
            groups: Repository::new(store.clone()),
            jobs: Repository::new(store),
            search: None,
        }
    }

    pub fn with_search(mut self, search: SearchIndexSynchronizer) -> Self {
        self.search = Some(search);
        self
    }

    async fn ordered_skills(&self) -> Result<Vec<Skill>> {
        let mut skills = self.skills.find_all().await?;
        skills.sort_by(by_order_then_name(|s: &Skill| s.order, |s: &Skill| s.name.as_str()));
        Ok(skills)
    }

    async fn ensure_unique_name(&self, name: &str, except_id: Option<&str>) -> Result<()> {
        let taken = self.skills.find_all().await?.into_iter().any(|s| {
            s.name.eq_ignore_ascii_case(name.trim()) && Some(s.id.as_str()) != except_id
        });
        if taken {
            return Err(AppError::Conflict(format!("Skill already exists: {}", name.trim())));
        }
        Ok(())
    }

    /// Standalone skills in display order
    pub async fn list_skills(&self, request: PageRequest) -> Result<Page<Skill>> {
        Ok(Page::from_sorted(self.ordered_skills().await?, request))
    }

    pub async fn get_skill(&self, id: &str) -> Result<Skill> {
        self.skills.get(id).await
    }

    /// A client-supplied `id` is ignored; the store assigns a fresh one
    pub async fn create_skill(&self, request: SkillRequest, actor: &str) -> Result<Skill> {
        finish(request.errors(""))?;
        self.ensure_unique_name(&request.name, None).await?;

        let mut skill = Skill::new("", None, 0);
        request.apply(&mut skill);
        let skill = self.skills.save(skill).await?;

        record_mutation(Collection::Skills.as_ref(), "create");
        tracing::info!(skill_id = %skill.id, subject = %actor, "Skill created");
        Ok(skill)
    }

    pub async fn update_skill(&self, id: &str, request: SkillRequest, actor: &str) -> Result<Skill> {
        finish(request.errors(""))?;
        let mut skill = self.skills.get(id).await?;
        self.ensure_unique_name(&request.name, Some(id)).await?;

        request.apply(&mut skill);
        skill.updated_at = Utc::now();
        let skill = self.skills.save(skill).await?;

        record_mutation(Collection::Skills.as_ref(), "update");
        tracing::info!(skill_id = %skill.id, subject = %actor, "Skill updated");
        Ok(skill)
    }

    pub async fn delete_skill(&self, id: &str, actor: &str) -> Result<()> {
        if !self.skills.delete(id).await? {
            return Err(AppError::NotFound(format!("Skill not found: {}", id)));
        }
        record_mutation(Collection::Skills.as_ref(), "delete");
        tracing::info!(skill_id = %id, subject = %actor, "Skill deleted");
        Ok(())
    }

    /// Reassign positions in one batch and return every skill in the new order
    pub async fn reorder_skills(&self, request: &ReorderRequest, actor: &str) -> Result<Vec<Skill>> {
        let updated = apply_reorder(&self.skills, request).await?;
        record_mutation(Collection::Skills.as_ref(), "reorder");
        tracing::info!(count = updated.len(), subject = %actor, "Skills reordered");
        self.ordered_skills().await
    }

    async fn ordered_groups(&self) -> Result<Vec<SkillGroup>> {
        let mut groups: Vec<SkillGroup> = self
            .groups
            .find_all()
            .await?
            .into_iter()
            .map(with_sorted_members)
            .collect();
        groups.sort_by(by_order_then_name(|g: &SkillGroup| g.order, |g: &SkillGroup| g.name.as_str()));
        Ok(groups)
    }

    /// Groups in display order, members sorted by order
    pub async fn list_groups(&self) -> Result<Vec<SkillGroup>> {
        self.ordered_groups().await
    }

    pub async fn admin_list_groups(&self, request: PageRequest) -> Result<Page<SkillGroup>> {
        Ok(Page::from_sorted(self.ordered_groups().await?, request))
    }

    pub async fn get_group(&self, id: &str) -> Result<SkillGroup> {
        Ok(with_sorted_members(self.groups.get(id).await?))
    }

    /// A group whose members each list the jobs that used them
    pub async fn group_detail(&self, id: &str) -> Result<SkillGroupDetail> {
        let group = self.get_group(id).await?;
        let mut jobs = self.jobs.find_all().await?;
        jobs.sort_by(by_start_date_desc);

        let skills = group
            .skills
            .into_iter()
            .map(|skill| {
                let jobs = jobs
                    .iter()
                    .filter(|job| job.references_skill(&skill.id, &skill.name))
                    .map(|job| JobSummary {
                        id: job.id.clone(),
                        title: job.title.clone(),
                        company: job.company.clone(),
                        start_date: job.start_date,
                        end_date: job.end_date,
                    })
                    .collect();
                SkillDetail { skill, jobs }
            })
            .collect();

        Ok(SkillGroupDetail {
            id: group.id,
            name: group.name,
            rating: group.rating,
            description: group.description,
            image_url: group.image_url,
            order: group.order,
            skills,
            created_at: group.created_at,
            updated_at: group.updated_at,
        })
    }

    pub async fn create_group(&self, request: SkillGroupRequest, actor: &str) -> Result<SkillGroup> {
        request.check()?;

        let mut group = SkillGroup::new("", 0);
        request.apply(&mut group);
        let group = self.groups.save(group).await?;

        record_mutation(Collection::SkillGroups.as_ref(), "create");
        tracing::info!(skill_group_id = %group.id, subject = %actor, "Skill group created");

        if let Some(search) = &self.search {
            search.index_skill_group(&group).await;
        }
        Ok(with_sorted_members(group))
    }

    pub async fn update_group(
        &self,
        id: &str,
        request: SkillGroupRequest,
        actor: &str,
    ) -> Result<SkillGroup> {
        request.check()?;

        let mut group = self.groups.get(id).await?;
        request.apply(&mut group);
        group.updated_at = Utc::now();
        let group = self.groups.save(group).await?;

        record_mutation(Collection::SkillGroups.as_ref(), "update");
        tracing::info!(skill_group_id = %group.id, subject = %actor, "Skill group updated");

        if let Some(search) = &self.search {
            search.index_skill_group(&group).await;
        }
        Ok(with_sorted_members(group))
    }

    pub async fn delete_group(&self, id: &str, actor: &str) -> Result<()> {
        if !self.groups.delete(id).await? {
            return Err(AppError::NotFound(format!("Skill group not found: {}", id)));
        }

        record_mutation(Collection::SkillGroups.as_ref(), "delete");
        tracing::info!(skill_group_id = %id, subject = %actor, "Skill group deleted");

        if let Some(search) = &self.search {
            search.remove_skill_group(id).await;
        }
        Ok(())
    }

    pub async fn reorder_groups(
        &self,
        request: &ReorderRequest,
        actor: &str,
    ) -> Result<Vec<SkillGroup>> {
        let updated = apply_reorder(&self.groups, request).await?;
        record_mutation(Collection::SkillGroups.as_ref(), "reorder");
        tracing::info!(count = updated.len(), subject = %actor, "Skill groups reordered");
        self.ordered_groups().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::validation::ReorderItem;
    use crate::state::create_in_memory_store;

    fn skill(name: &str, rating: Option<f64>, order: i32) -> SkillRequest {
        SkillRequest {
            name: name.to_string(),
            rating,
            order,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_reorder_puts_a_before_b() {
        let service = SkillService::new(create_in_memory_store());
        let b = service.create_skill(skill("B", None, 0), "tester").await.unwrap();
        let a = service.create_skill(skill("A", None, 1), "tester").await.unwrap();

        let request = ReorderRequest::Items(vec![
            ReorderItem { id: a.id.clone(), order: 0 },
            ReorderItem { id: b.id.clone(), order: 1 },
        ]);
        let ordered = service.reorder_skills(&request, "tester").await.unwrap();

        assert_eq!(ordered[0].id, a.id);
        assert_eq!(ordered[1].id, b.id);
        let page = service.list_skills(PageRequest::default()).await.unwrap();
        assert_eq!(page.content[0].name, "A");
    }

    #[tokio::test]
    async fn test_duplicate_skill_name_conflicts() {
        let service = SkillService::new(create_in_memory_store());
        service.create_skill(skill("Rust", None, 0), "tester").await.unwrap();
        let err = service
            .create_skill(skill("rust", None, 1), "tester")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_create_with_existing_id_keeps_original() {
        let service = SkillService::new(create_in_memory_store());
        let rust = service.create_skill(skill("Rust", None, 0), "tester").await.unwrap();

        let mut request = skill("Go", None, 1);
        request.id = Some(rust.id.clone());
        let go = service.create_skill(request, "tester").await.unwrap();

        assert_ne!(go.id, rust.id);
        assert_eq!(service.get_skill(&rust.id).await.unwrap().name, "Rust");
        let page = service.list_skills(PageRequest::default()).await.unwrap();
        let names: Vec<_> = page.content.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Rust", "Go"]);
    }

    #[tokio::test]
    async fn test_rating_range() {
        let service = SkillService::new(create_in_memory_store());
        match service
            .create_skill(skill("Rust", Some(11.0), 0), "tester")
            .await
            .unwrap_err()
        {
            AppError::InvalidFields(fields) => assert_eq!(fields[0].field, "rating"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_group_rating_and_member_ids() {
        let service = SkillService::new(create_in_memory_store());
        let group = service
            .create_group(
                SkillGroupRequest {
                    name: "Languages".to_string(),
                    skills: vec![skill("Rust", Some(9.0), 1), skill("Go", Some(6.0), 0)],
                    ..Default::default()
                },
                "tester",
            )
            .await
            .unwrap();

        assert_eq!(group.rating, Some(7.5));
        assert_eq!(group.skills[0].name, "Go");
        assert!(group.skills.iter().all(|s| !s.id.is_empty()));

        let rust_id = group.skills[1].id.clone();
        let mut keep = skill("Rust", Some(7.0), 0);
        keep.id = Some(rust_id.clone());
        let updated = service
            .update_group(
                &group.id,
                SkillGroupRequest {
                    name: "Languages".to_string(),
                    skills: vec![keep],
                    ..Default::default()
                },
                "tester",
            )
            .await
            .unwrap();
        assert_eq!(updated.skills.len(), 1);
        assert_eq!(updated.skills[0].id, rust_id);
        assert_eq!(updated.rating, Some(7.0));
    }

    #[tokio::test]
    async fn test_nested_member_errors_are_prefixed() {
        let service = SkillService::new(create_in_memory_store());
        let err = service
            .create_group(
                SkillGroupRequest {
                    name: "Languages".to_string(),
                    skills: vec![skill("Rust", Some(20.0), 0)],
                    ..Default::default()
                },
                "tester",
            )
            .await
            .unwrap_err();
        match err {
            AppError::InvalidFields(fields) => assert_eq!(fields[0].field, "skills[0].rating"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_group_detail_lists_jobs() {
        let store = create_in_memory_store();
        let service = SkillService::new(store.clone());
        let group = service
            .create_group(
                SkillGroupRequest {
                    name: "Languages".to_string(),
                    skills: vec![skill("Rust", Some(9.0), 0)],
                    ..Default::default()
                },
                "tester",
            )
            .await
            .unwrap();

        let mut job = Job::new(
            "Engineer",
            "Acme",
            NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
            "Work",
        );
        job.skills = vec!["rust".to_string()];
        Repository::<Job>::new(store).save(job).await.unwrap();

        let detail = service.group_detail(&group.id).await.unwrap();
        assert_eq!(detail.skills[0].jobs.len(), 1);
        assert_eq!(detail.skills[0].jobs[0].company, "Acme");
    }
}
