//! Rule texts shown when the player breaks a rule of the road
//!
//! Loaded once from a JSON array; lookups by id return `None` when absent.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Rules bundled with the crate
const BUNDLED_RULES: &str = include_str!("../../assets/scenario_rules.json");

/// Rule identifiers the simulation raises itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleId {
    RedLightViolation,
}

impl RuleId {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::RedLightViolation => "RED_LIGHT_VIOLATION",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioRule {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    #[serde(default)]
    pub pause_game: bool,
    #[serde(default)]
    pub display_duration: f32,
}

/// Rules keyed by id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScenarioRules {
    rules: HashMap<String, ScenarioRule>,
}

impl ScenarioRules {
    /// Parse a JSON array of rules; later duplicates replace earlier ones
    pub fn from_json(json: &str) -> Result<Self> {
        let list: Vec<ScenarioRule> =
            serde_json::from_str(json).context("Failed to parse scenario rules")?;
        Ok(list.into_iter().collect())
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read rules file {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("Invalid rules file {}", path.display()))
    }

    /// The rules shipped in `assets/scenario_rules.json`
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_RULES)
    }

    pub fn get(&self, id: RuleId) -> Option<&ScenarioRule> {
        self.rules.get(id.as_str())
    }

    /// Lookup by raw id, including ids this crate has no [`RuleId`] for
    pub fn get_by_name(&self, id: &str) -> Option<&ScenarioRule> {
        self.rules.get(id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl FromIterator<ScenarioRule> for ScenarioRules {
    fn from_iter<I: IntoIterator<Item = ScenarioRule>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().map(|r| (r.id.clone(), r)).collect(),
        }
    }
}
