//! Pure mappings from content entities to [`SearchDocument`]s

use crate::models::{Blog, Job, Skill, SkillGroup, Tag};
use crate::resolver::SkillReference;
use crate::search::document::{EntityKind, SearchDocument};
use once_cell::sync::Lazy;
use regex::Regex;

static MARKDOWN_SYNTAX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[#*_`~>\[\]()!|]|\d+\.").expect("valid markdown regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Replace markdown punctuation and ordered-list markers with spaces and
/// collapse whitespace.
pub fn strip_markdown(markdown: &str) -> String {
    let plain = MARKDOWN_SYNTAX.replace_all(markdown, " ");
    WHITESPACE.replace_all(&plain, " ").trim().to_string()
}

fn join_text<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn blog_url(id: &str) -> String {
    format!("/blogs/{}", id)
}

/// Blog entry for the site-wide index
pub fn blog_to_site_document(blog: &Blog) -> SearchDocument {
    SearchDocument {
        id: blog.id.clone(),
        kind: EntityKind::Blog,
        parent_id: None,
        title: blog.title.clone(),
        short_description: Some(blog.short_description.clone()),
        body: join_text([blog.title.as_str(), blog.short_description.as_str()]),
        tags: Vec::new(),
        skills: Vec::new(),
        image_url: blog.featured_image_url.clone(),
        url: blog_url(&blog.id),
        published_at: Some(blog.created_at),
    }
}

/// Blog entry for the blog index, with resolved tag and skill names
pub fn blog_to_blog_document(blog: &Blog, tags: &[Tag], skills: &[Skill]) -> SearchDocument {
    let tag_names: Vec<String> = tags.iter().map(|t| t.name.clone()).collect();
    let skill_names: Vec<String> = skills.iter().map(|s| s.name.clone()).collect();
    let content = strip_markdown(&blog.content);

    let body = join_text(
        [
            blog.title.as_str(),
            blog.short_description.as_str(),
            content.as_str(),
        ]
        .into_iter()
        .chain(tag_names.iter().map(String::as_str))
        .chain(skill_names.iter().map(String::as_str)),
    );

    SearchDocument {
        id: blog.id.clone(),
        kind: EntityKind::Blog,
        parent_id: None,
        title: blog.title.clone(),
        short_description: Some(blog.short_description.clone()),
        body,
        tags: tag_names,
        skills: skill_names,
        image_url: blog.featured_image_url.clone(),
        url: blog_url(&blog.id),
        published_at: Some(blog.created_at),
    }
}

pub fn job_to_site_document(job: &Job, skills: &[SkillReference]) -> SearchDocument {
    let skill_names: Vec<String> = skills.iter().map(|s| s.name.clone()).collect();
    let body = join_text(
        [
            job.title.as_str(),
            job.company.as_str(),
            job.short_description.as_str(),
            job.long_description.as_deref().unwrap_or_default(),
        ]
        .into_iter()
        .chain(skill_names.iter().map(String::as_str)),
    );

    SearchDocument {
        id: job.id.clone(),
        kind: EntityKind::Job,
        parent_id: None,
        title: job.title.clone(),
        short_description: Some(job.short_description.clone()),
        body,
        tags: Vec::new(),
        skills: skill_names,
        image_url: job.company_image_url.clone(),
        url: "/employment".to_string(),
        published_at: None,
    }
}

/// Id of an embedded skill's document: `{groupId}_{skillId}`
pub fn skill_document_id(group_id: &str, skill_id: &str) -> String {
    format!("{}_{}", group_id, skill_id)
}

/// One site document per skill embedded in `group`
pub fn skill_group_to_site_documents(group: &SkillGroup) -> Vec<SearchDocument> {
    group
        .sorted_skills()
        .into_iter()
        .map(|skill| SearchDocument {
            id: skill_document_id(&group.id, &skill.id),
            kind: EntityKind::Skill,
            parent_id: Some(group.id.clone()),
            title: skill.name.clone(),
            short_description: skill.description.clone(),
            body: join_text([
                skill.name.as_str(),
                skill.description.as_deref().unwrap_or_default(),
                group.name.as_str(),
            ]),
            tags: Vec::new(),
            skills: vec![skill.name.clone()],
            image_url: skill.image_url.clone(),
            url: "/skills".to_string(),
            published_at: None,
        })
        .collect()
}
