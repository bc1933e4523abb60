//! Resume data assembled from the profile, jobs and skill groups

use crate::content::{ProfileService, SkillService};
use crate::error::Result;
use crate::models::{by_start_date_desc, Job, Profile, SkillGroup, SocialMediaLink};
use crate::state::{DocumentStore, Repository};
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeProfile {
    pub name: String,
    pub title: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeJob {
    pub title: String,
    pub company: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub long_description: Option<String>,
}

impl From<&Job> for ResumeJob {
    fn from(job: &Job) -> Self {
        Self {
            title: job.title.clone(),
            company: job.company.clone(),
            start_date: job.start_date,
            end_date: job.end_date,
            location: job.location.clone(),
            long_description: job.long_description.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeSkill {
    pub name: String,
    pub rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeSkillGroup {
    pub name: String,
    pub skills: Vec<ResumeSkill>,
}

impl From<&SkillGroup> for ResumeSkillGroup {
    fn from(group: &SkillGroup) -> Self {
        Self {
            name: group.name.clone(),
            skills: group
                .skills
                .iter()
                .map(|s| ResumeSkill {
                    name: s.name.clone(),
                    rating: s.rating,
                })
                .collect(),
        }
    }
}

/// Everything a resume renderer needs
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeData {
    pub profile: ResumeProfile,
    pub employment: Vec<ResumeJob>,
    pub education: Vec<ResumeJob>,
    pub skill_groups: Vec<ResumeSkillGroup>,
}

/// First link of `link_type` (ignoring case) that is marked for the resume
fn resume_link(links: &[SocialMediaLink], link_type: &str) -> Option<String> {
    links
        .iter()
        .find(|l| l.include_on_resume && l.link_type.eq_ignore_ascii_case(link_type))
        .map(|l| l.link.clone())
}

/// Split jobs into employment and education, newest first.
///
/// Employment holds non-education jobs flagged `includeOnResume`; education
/// holds every education entry.
pub fn assemble(
    profile: &Profile,
    links: &[SocialMediaLink],
    mut jobs: Vec<Job>,
    groups: &[SkillGroup],
) -> ResumeData {
    jobs.sort_by(by_start_date_desc);

    ResumeData {
        profile: ResumeProfile {
            name: profile.name.clone(),
            title: profile.title.clone(),
            email: profile.primary_email.clone(),
            phone: profile.phone_number.clone(),
            location: profile.location.clone(),
            linkedin: resume_link(links, "linkedin"),
            github: resume_link(links, "github"),
            website: resume_link(links, "website"),
        },
        employment: jobs
            .iter()
            .filter(|j| j.include_on_resume && !j.education)
            .map(ResumeJob::from)
            .collect(),
        education: jobs.iter().filter(|j| j.education).map(ResumeJob::from).collect(),
        skill_groups: groups.iter().map(ResumeSkillGroup::from).collect(),
    }
}

pub struct ResumeService {
    profile: Arc<ProfileService>,
    skills: Arc<SkillService>,
    jobs: Repository<Job>,
}

impl ResumeService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        profile: Arc<ProfileService>,
        skills: Arc<SkillService>,
    ) -> Self {
        Self {
            profile,
            skills,
            jobs: Repository::new(store),
        }
    }

    /// Resume data; NotFound until a profile exists
    pub async fn data(&self) -> Result<ResumeData> {
        let profile = self.profile.get().await?;
        let links = self.profile.list_links().await?;
        let jobs = self.jobs.find_all().await?;
        let groups = self.skills.list_groups().await?;

        let data = assemble(&profile, &links, jobs, &groups);
        tracing::debug!(
            employment = data.employment.len(),
            education = data.education.len(),
            skill_groups = data.skill_groups.len(),
            "Assembled resume data"
        );
        Ok(data)
    }
}
