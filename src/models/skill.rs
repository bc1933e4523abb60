use super::{Collection, Named, Ordered};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A skill, either standalone in the skills collection or embedded in a group
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy_id: Option<String>,
}

impl_document!(Skill, Collection::Skills);

impl Skill {
    pub fn new(name: impl Into<String>, rating: Option<f64>, order: i32) -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            name: name.into(),
            rating,
            description: None,
            image_url: None,
            order,
            created_at: now,
            updated_at: now,
            legacy_id: None,
        }
    }
}

impl Named for Skill {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Ordered for Skill {
    fn order(&self) -> i32 {
        self.order
    }

    fn set_order(&mut self, order: i32) {
        self.order = order;
        self.updated_at = Utc::now();
    }
}

/// A named, ordered group of skills with a rating derived from its members
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SkillGroup {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub skills: Vec<Skill>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy_id: Option<String>,
}

impl_document!(SkillGroup, Collection::SkillGroups);

impl SkillGroup {
    pub fn new(name: impl Into<String>, order: i32) -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            name: name.into(),
            rating: None,
            description: None,
            image_url: None,
            order,
            skills: Vec::new(),
            created_at: now,
            updated_at: now,
            legacy_id: None,
        }
    }

    /// Sets `rating` to the mean of the rated members, rounded to one decimal.
    pub fn recompute_rating(&mut self) {
        let ratings: Vec<f64> = self.skills.iter().filter_map(|s| s.rating).collect();
        self.rating = if ratings.is_empty() {
            None
        } else {
            let mean = ratings.iter().sum::<f64>() / ratings.len() as f64;
            Some((mean * 10.0).round() / 10.0)
        };
    }

    /// Members in display order
    pub fn sorted_skills(&self) -> Vec<&Skill> {
        let mut skills: Vec<&Skill> = self.skills.iter().collect();
        skills.sort_by_key(|s| s.order);
        skills
    }

    pub fn find_skill(&self, reference: &str) -> Option<&Skill> {
        self.skills
            .iter()
            .find(|s| s.id == reference)
            .or_else(|| {
                self.skills
                    .iter()
                    .find(|s| s.name.eq_ignore_ascii_case(reference))
            })
    }
}

impl Ordered for SkillGroup {
    fn order(&self) -> i32 {
        self.order
    }

    fn set_order(&mut self, order: i32) {
        self.order = order;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_is_mean_of_rated_members() {
        let mut group = SkillGroup::new("Languages", 1);
        group.skills = vec![
            Skill::new("Rust", Some(9.0), 1),
            Skill::new("Java", Some(8.0), 2),
            Skill::new("Cobol", None, 3),
        ];
        group.recompute_rating();
        assert_eq!(group.rating, Some(8.5));
    }

    #[test]
    fn test_rating_rounds_to_one_decimal() {
        let mut group = SkillGroup::new("Tools", 1);
        group.skills = vec![
            Skill::new("a", Some(7.0), 1),
            Skill::new("b", Some(8.0), 2),
            Skill::new("c", Some(8.0), 3),
        ];
        group.recompute_rating();
        assert_eq!(group.rating, Some(7.7));
    }

    #[test]
    fn test_rating_empty_group() {
        let mut group = SkillGroup::new("Empty", 1);
        group.rating = Some(3.0);
        group.recompute_rating();
        assert_eq!(group.rating, None);
    }

    #[test]
    fn test_find_skill_by_id_then_name() {
        let mut group = SkillGroup::new("Languages", 1);
        let mut rust = Skill::new("Rust", Some(9.0), 2);
        rust.id = "s-rust".to_string();
        group.skills = vec![Skill::new("Java", None, 1), rust];

        assert_eq!(group.find_skill("s-rust").unwrap().name, "Rust");
        assert_eq!(group.find_skill("java").unwrap().name, "Java");
        assert!(group.find_skill("Go").is_none());
        assert_eq!(group.sorted_skills()[0].name, "Java");
    }
}
