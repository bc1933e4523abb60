use super::{Collection, Ordered};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Where a tour tooltip is anchored relative to its target
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TooltipPosition {
    Top,
    #[default]
    Bottom,
    Left,
    Right,
    Center,
}

/// One step of the guided site tour; `order` is unique across steps
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TourStep {
    #[serde(default)]
    pub id: String,
    pub order: i32,
    pub target_selector: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_image_url: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub position: TooltipPosition,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy_id: Option<String>,
}

impl_document!(TourStep, Collection::TourSteps);

impl TourStep {
    pub fn new(order: i32, target_selector: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            order,
            target_selector: target_selector.into(),
            title: title.into(),
            title_image_url: None,
            description: String::new(),
            position: TooltipPosition::default(),
            created_at: now,
            updated_at: now,
            legacy_id: None,
        }
    }
}

impl Ordered for TourStep {
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
    use std::str::FromStr;

    #[test]
    fn test_position_names() {
        assert_eq!(TooltipPosition::from_str("center").unwrap(), TooltipPosition::Center);
        assert_eq!(
            serde_json::to_string(&TooltipPosition::Left).unwrap(),
            "\"left\""
        );
        assert_eq!(TooltipPosition::default(), TooltipPosition::Bottom);
    }
}
