use super::Collection;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A blog post. `tags` and `skills` hold references (ids, or names for
/// hand-written content) into the tags and skills collections.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub short_description: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub published: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_image_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy_id: Option<String>,
}

impl_document!(Blog, Collection::Blogs);

impl Blog {
    pub fn new(title: impl Into<String>, short_description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            title: title.into(),
            short_description: short_description.into(),
            content: String::new(),
            published: false,
            featured_image_url: None,
            tags: Vec::new(),
            skills: Vec::new(),
            created_at: now,
            updated_at: now,
            legacy_id: None,
        }
    }

    /// Whether the post may be shown publicly and indexed
    pub fn is_visible(&self) -> bool {
        self.published
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blog_json_shape() {
        let mut blog = Blog::new("Hello", "Intro");
        blog.featured_image_url = Some("/img.png".to_string());
        let value = serde_json::to_value(&blog).unwrap();

        assert_eq!(value["shortDescription"], "Intro");
        assert_eq!(value["featuredImageUrl"], "/img.png");
        assert!(value.get("legacyId").is_none());
        assert!(!blog.is_visible());
    }
}
