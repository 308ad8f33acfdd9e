//! Mission template catalog
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::board::SlotKey;

const DEFAULT_CATALOG_DATA: &str = include_str!("../assets/missions.json");

/// Difficulty band advertised on a mission template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Low,
    Medium,
    High,
}

impl Difficulty {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Reward granted when a mission is claimed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Reward {
    #[serde(default)]
    pub xp: i64,
    #[serde(default)]
    pub currency: i64,
}

/// A single measurable objective inside a mission template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Objective {
    pub id: String,
    pub label: String,
    #[serde(default = "default_objective_target")]
    pub target: u32,
    #[serde(default)]
    pub unit: String,
}

fn default_objective_target() -> u32 {
    1
}

/// An immutable mission template from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionTemplate {
    pub template_id: String,
    pub slot: SlotKey,
    pub title: String,
    pub summary: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub reward: Reward,
    #[serde(default)]
    pub objectives: Vec<Objective>,
    /// Free-form display tags surfaced to the UI layer.
    #[serde(default)]
    pub tags: HashMap<String, String>,
    /// XP multiplier applied while this mission is the linked hunt target.
    #[serde(default)]
    pub booster_multiplier: Option<f64>,
}

impl MissionTemplate {
    /// First objective, which drives the selection's progress target.
    #[must_use]
    pub fn primary_objective(&self) -> Option<&Objective> {
        self.objectives.first()
    }
}

/// Container for all mission templates known to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MissionCatalog {
    pub missions: Vec<MissionTemplate>,
}

impl MissionCatalog {
    /// Create an empty catalog (useful for tests)
    #[must_use]
    pub fn empty() -> Self {
        Self {
            missions: Vec::new(),
        }
    }

    /// Load catalog data from a JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into valid catalog data.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Create a catalog from pre-parsed templates
    #[must_use]
    pub fn from_templates(missions: Vec<MissionTemplate>) -> Self {
        Self { missions }
    }

    /// Load the catalog embedded in the crate's static assets.
    #[must_use]
    pub fn load_from_static() -> Self {
        serde_json::from_str(DEFAULT_CATALOG_DATA).unwrap_or_else(|_| Self::empty())
    }

    /// All templates offered for a slot, in catalog order.
    pub fn for_slot(&self, slot: SlotKey) -> impl Iterator<Item = &MissionTemplate> {
        self.missions.iter().filter(move |t| t.slot == slot)
    }

    /// Find a template by its id.
    #[must_use]
    pub fn find(&self, template_id: &str) -> Option<&MissionTemplate> {
        self.missions.iter().find(|t| t.template_id == template_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_catalog_covers_every_slot() {
        let catalog = MissionCatalog::load_from_static();
        for slot in SlotKey::ALL {
            assert_eq!(
                catalog.for_slot(slot).count(),
                4,
                "expected four templates for {slot}"
            );
        }
    }

    #[test]
    fn static_hunt_templates_carry_boosters_and_objectives() {
        let catalog = MissionCatalog::load_from_static();
        for template in catalog.for_slot(SlotKey::Hunt) {
            assert!(template.booster_multiplier.is_some());
            let objective = template.primary_objective().expect("objective");
            assert!(objective.target >= 1);
        }
    }

    #[test]
    fn catalog_from_json_applies_defaults() {
        let json = r#"{
            "missions": [
                {
                    "template_id": "m1",
                    "slot": "main",
                    "title": "Test Mission",
                    "summary": "A test mission"
                }
            ]
        }"#;

        let catalog = MissionCatalog::from_json(json).unwrap();
        assert_eq!(catalog.missions.len(), 1);
        let template = catalog.find("m1").unwrap();
        assert_eq!(template.difficulty, Difficulty::Low);
        assert_eq!(template.reward, Reward::default());
        assert!(template.objectives.is_empty());
        assert!(template.booster_multiplier.is_none());
    }
}
