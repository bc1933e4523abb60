use super::Collection;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Id of the single profile document
pub const PROFILE_ID: &str = "profile";

/// The site owner's profile; at most one exists
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default = "profile_id")]
    pub id: String,
    pub name: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sidebar_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_background_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cv_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl_document!(Profile, Collection::Profiles);

fn profile_id() -> String {
    PROFILE_ID.to_string()
}

/// A link to one of the owner's social media accounts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SocialMediaLink {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub link_type: String,
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub include_on_resume: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy_id: Option<String>,
}

impl_document!(SocialMediaLink, Collection::SocialMediaLinks);

impl SocialMediaLink {
    pub fn new(link_type: impl Into<String>, link: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            link_type: link_type.into(),
            link: link.into(),
            name: None,
            include_on_resume: false,
            created_at: now,
            updated_at: now,
            legacy_id: None,
        }
    }
}
