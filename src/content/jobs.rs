//! Employment and education history

use crate::content::validation::{field_errors, finish, non_blank, require};
use crate::error::{AppError, FieldError, Result};
use crate::metrics::record_mutation;
use crate::models::{by_start_date_desc, Collection, Job, Page, PageRequest};
use crate::resolver::{ReferenceResolver, SkillReference};
use crate::search::SearchIndexSynchronizer;
use crate::state::{DocumentStore, Repository};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobView {
    pub id: String,
    pub title: String,
    pub company: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_image_url: Option<String>,
    pub start_date: NaiveDate,
    /// `None` for the current position
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub short_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_description: Option<String>,
    #[serde(rename = "isEducation")]
    pub education: bool,
    pub include_on_resume: bool,
    pub skills: Vec<SkillReference>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub company: String,
    pub company_url: Option<String>,
    pub company_image_url: Option<String>,
    /// ISO date, `YYYY-MM-DD`
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub short_description: String,
    pub long_description: Option<String>,
    #[serde(default, rename = "isEducation")]
    pub education: bool,
    pub include_on_resume: Option<bool>,
    #[serde(default)]
    pub skills: Vec<String>,
}

fn parse_date(errors: &mut Vec<FieldError>, field: &str, value: &str) -> Option<NaiveDate> {
    match NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            errors.push(FieldError::new(field, "must be an ISO date (YYYY-MM-DD)"));
            None
        }
    }
}

/// Validated dates of a job request
struct JobDates {
    start: NaiveDate,
    end: Option<NaiveDate>,
}

impl JobRequest {
    fn check(&self) -> Result<JobDates> {
        let mut errors = field_errors(self, "");
        require(&mut errors, "title", &self.title);
        require(&mut errors, "company", &self.company);
        require(&mut errors, "shortDescription", &self.short_description);

        let start = match non_blank(self.start_date.clone()) {
            Some(value) => parse_date(&mut errors, "startDate", &value),
            None => {
                errors.push(FieldError::new("startDate", "is required"));
                None
            }
        };
        let end = non_blank(self.end_date.clone())
            .and_then(|value| parse_date(&mut errors, "endDate", &value));

        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                errors.push(FieldError::new("endDate", "must not be before startDate"));
            }
        }

        finish(errors)?;
        match start {
            Some(start) => Ok(JobDates { start, end }),
            None => Err(AppError::invalid_field("startDate", "is required")),
        }
    }

    fn apply(self, job: &mut Job, dates: JobDates) {
        job.title = self.title.trim().to_string();
        job.company = self.company.trim().to_string();
        job.company_url = non_blank(self.company_url);
        job.company_image_url = non_blank(self.company_image_url);
        job.start_date = dates.start;
        job.end_date = dates.end;
        job.location = non_blank(self.location);
        job.short_description = self.short_description.trim().to_string();
        job.long_description = non_blank(self.long_description);
        job.education = self.education;
        job.include_on_resume = self.include_on_resume.unwrap_or(true);
        job.skills = self
            .skills
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct JobFilter {
    pub education: Option<bool>,
}

pub struct JobService {
    jobs: Repository<Job>,
    resolver: ReferenceResolver,
    search: Option<SearchIndexSynchronizer>,
}

impl JobService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            jobs: Repository::new(store.clone()),
            resolver: ReferenceResolver::new(store),
            search: None,
        }
    }

    pub fn with_search(mut self, search: SearchIndexSynchronizer) -> Self {
        self.search = Some(search);
        self
    }

    async fn view(&self, job: Job) -> Result<JobView> {
        let skills = self.resolver.resolve_job_skills(&job.skills).await?;
        Ok(JobView {
            id: job.id,
            title: job.title,
            company: job.company,
            company_url: job.company_url,
            company_image_url: job.company_image_url,
            start_date: job.start_date,
            end_date: job.end_date,
            location: job.location,
            short_description: job.short_description,
            long_description: job.long_description,
            education: job.education,
            include_on_resume: job.include_on_resume,
            skills: skills.resolved,
            created_at: job.created_at,
            updated_at: job.updated_at,
        })
    }

    async fn timeline(&self, filter: JobFilter) -> Result<Vec<Job>> {
        let mut jobs: Vec<Job> = self
            .jobs
            .find_all()
            .await?
            .into_iter()
            .filter(|j| filter.education.map_or(true, |e| j.education == e))
            .collect();
        jobs.sort_by(by_start_date_desc);
        Ok(jobs)
    }

    /// Every job, newest start date first
    pub async fn list(&self) -> Result<Vec<JobView>> {
        let jobs = self.timeline(JobFilter::default()).await?;
        let mut views = Vec::with_capacity(jobs.len());
        for job in jobs {
            views.push(self.view(job).await?);
        }
        Ok(views)
    }

    pub async fn get(&self, id: &str) -> Result<JobView> {
        let job = self.jobs.get(id).await?;
        self.view(job).await
    }

    pub async fn admin_list(&self, request: PageRequest, filter: JobFilter) -> Result<Page<JobView>> {
        let page = Page::from_sorted(self.timeline(filter).await?, request);
        let mut content = Vec::with_capacity(page.content.len());
        for job in page.content.iter().cloned() {
            content.push(self.view(job).await?);
        }
        Ok(Page {
            content,
            total_elements: page.total_elements,
            total_pages: page.total_pages,
            size: page.size,
            number: page.number,
        })
    }

    pub async fn create(&self, request: JobRequest, actor: &str) -> Result<JobView> {
        let dates = request.check()?;

        let mut job = Job::new("", "", dates.start, "");
        request.apply(&mut job, dates);
        let job = self.jobs.save(job).await?;

        record_mutation(Collection::Jobs.as_ref(), "create");
        tracing::info!(job_id = %job.id, subject = %actor, "Job created");

        if let Some(search) = &self.search {
            search.index_job(&job).await;
        }
        self.view(job).await
    }

    pub async fn update(&self, id: &str, request: JobRequest, actor: &str) -> Result<JobView> {
        let dates = request.check()?;

        let mut job = self.jobs.get(id).await?;
        request.apply(&mut job, dates);
        job.updated_at = Utc::now();
        let job = self.jobs.save(job).await?;

        record_mutation(Collection::Jobs.as_ref(), "update");
        tracing::info!(job_id = %job.id, subject = %actor, "Job updated");

        if let Some(search) = &self.search {
            search.index_job(&job).await;
        }
        self.view(job).await
    }

    pub async fn delete(&self, id: &str, actor: &str) -> Result<()> {
        if !self.jobs.delete(id).await? {
            return Err(AppError::NotFound(format!("Job not found: {}", id)));
        }

        record_mutation(Collection::Jobs.as_ref(), "delete");
        tracing::info!(job_id = %id, subject = %actor, "Job deleted");

        if let Some(search) = &self.search {
            search.remove_job(id).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Skill, SkillGroup};
    use crate::state::create_in_memory_store;

    fn request(title: &str, start: &str) -> JobRequest {
        JobRequest {
            title: title.to_string(),
            company: "Acme".to_string(),
            start_date: Some(start.to_string()),
            short_description: "Did things".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_defaults_resume_flag() {
        let service = JobService::new(create_in_memory_store());
        service.create(request("Old", "2018-05-01"), "tester").await.unwrap();
        service.create(request("New", "2022-01-10"), "tester").await.unwrap();

        let jobs = service.list().await.unwrap();
        assert_eq!(jobs[0].title, "New");
        assert_eq!(jobs[1].title, "Old");
        assert!(jobs.iter().all(|j| j.include_on_resume));
    }

    #[tokio::test]
    async fn test_date_validation() {
        let service = JobService::new(create_in_memory_store());

        let mut bad_end = request("Engineer", "2020-01-01");
        bad_end.end_date = Some("2019-12-31".to_string());
        match service.create(bad_end, "tester").await.unwrap_err() {
            AppError::InvalidFields(fields) => assert_eq!(fields[0].field, "endDate"),
            other => panic!("unexpected error: {:?}", other),
        }

        let mut missing = request("Engineer", "");
        missing.start_date = None;
        assert!(service.create(missing, "tester").await.is_err());

        assert!(service
            .create(request("Engineer", "01/02/2020"), "tester")
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_skills_resolve_against_groups() {
        let store = create_in_memory_store();
        let mut group = SkillGroup::new("Languages", 0);
        let mut rust = Skill::new("Rust", Some(9.0), 0);
        rust.id = "rust".to_string();
        group.skills.push(rust);
        let group = Repository::<SkillGroup>::new(store.clone())
            .save(group)
            .await
            .unwrap();

        let service = JobService::new(store);
        let mut req = request("Engineer", "2021-01-01");
        req.skills = vec!["RUST".to_string(), "Haskell".to_string()];
        let job = service.create(req, "tester").await.unwrap();

        assert_eq!(job.skills.len(), 1);
        assert_eq!(job.skills[0].name, "Rust");
        assert_eq!(job.skills[0].skill_group_id, group.id);
    }

    #[tokio::test]
    async fn test_education_filter() {
        let service = JobService::new(create_in_memory_store());
        let mut degree = request("BSc", "2010-09-01");
        degree.education = true;
        service.create(degree, "tester").await.unwrap();
        service.create(request("Engineer", "2015-01-01"), "tester").await.unwrap();

        let page = service
            .admin_list(PageRequest::default(), JobFilter { education: Some(true) })
            .await
            .unwrap();
        assert_eq!(page.total_elements, 1);
        assert_eq!(page.content[0].title, "BSc");
    }
}
