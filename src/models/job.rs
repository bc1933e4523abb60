use super::Collection;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// An employment or education entry. `skills` references skills by id or name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub company: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_image_url: Option<String>,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub short_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_description: Option<String>,
    #[serde(default, rename = "isEducation")]
    pub education: bool,
    #[serde(default = "default_include_on_resume")]
    pub include_on_resume: bool,
    #[serde(default)]
    pub skills: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy_id: Option<String>,
}

impl_document!(Job, Collection::Jobs);

fn default_include_on_resume() -> bool {
    true
}

impl Job {
    pub fn new(
        title: impl Into<String>,
        company: impl Into<String>,
        start_date: NaiveDate,
        short_description: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            title: title.into(),
            company: company.into(),
            company_url: None,
            company_image_url: None,
            start_date,
            end_date: None,
            location: None,
            short_description: short_description.into(),
            long_description: None,
            education: false,
            include_on_resume: true,
            skills: Vec::new(),
            created_at: now,
            updated_at: now,
            legacy_id: None,
        }
    }

    /// Whether this job references the given skill by id or by
    /// case-insensitive name.
    pub fn references_skill(&self, skill_id: &str, skill_name: &str) -> bool {
        self.skills
            .iter()
            .any(|s| s == skill_id || s.eq_ignore_ascii_case(skill_name))
    }
}

/// Newest first; ties broken by title so listings are stable
pub fn by_start_date_desc(a: &Job, b: &Job) -> std::cmp::Ordering {
    b.start_date
        .cmp(&a.start_date)
        .then_with(|| a.title.cmp(&b.title))
}
