use serde::{de::DeserializeOwned, Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Named document collections held by the store
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Collection {
    Blogs,
    Jobs,
    Skills,
    SkillGroups,
    Tags,
    Profiles,
    SocialMediaLinks,
    TourSteps,
    MediaAssets,
}

impl Collection {
    pub const ALL: [Collection; 9] = [
        Collection::Blogs,
        Collection::Jobs,
        Collection::Skills,
        Collection::SkillGroups,
        Collection::Tags,
        Collection::Profiles,
        Collection::SocialMediaLinks,
        Collection::TourSteps,
        Collection::MediaAssets,
    ];

    /// Top-level fields whose values must be unique within the collection.
    /// Missing and null values are not indexed.
    pub fn unique_fields(&self) -> &'static [&'static str] {
        match self {
            Collection::Tags => &["name"],
            Collection::Skills => &["name"],
            Collection::TourSteps => &["order"],
            _ => &[],
        }
    }
}

/// An entity persisted as one JSON document in a [`Collection`]
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: Collection;

    fn id(&self) -> &str;

    fn set_id(&mut self, id: String);
}

/// Entities that can be referenced by name as well as by id
pub trait Named {
    fn name(&self) -> &str;
}

/// Entities carrying an explicit display position
pub trait Ordered {
    fn order(&self) -> i32;

    fn set_order(&mut self, order: i32);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_collection_names() {
        assert_eq!(Collection::SkillGroups.to_string(), "skill_groups");
        assert_eq!(Collection::from_str("tour_steps").unwrap(), Collection::TourSteps);
        assert_eq!(
            serde_json::to_string(&Collection::SocialMediaLinks).unwrap(),
            "\"social_media_links\""
        );
    }

    #[test]
    fn test_unique_fields() {
        assert_eq!(Collection::TourSteps.unique_fields(), &["order"]);
        assert!(Collection::Blogs.unique_fields().is_empty());
    }
}
