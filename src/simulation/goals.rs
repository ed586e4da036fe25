//! Scenario goals and the trigger zones that complete a level

use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use super::physics::{Aabb, ColliderSet};
use super::types::ColliderId;

const UNCHECKED_SYMBOL: &str = "[ ]";
const CHECKED_SYMBOL: &str = "[X]";

/// One objective shown to the player
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GoalData {
    pub text: String,
    #[serde(default)]
    pub xp_to_give: i32,
}

impl GoalData {
    pub fn new(text: impl Into<String>, xp_to_give: i32) -> Self {
        Self {
            text: text.into(),
            xp_to_give,
        }
    }
}

/// A titled list of goals for one scenario
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Goals {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub goals: Vec<GoalData>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GoalError {
    #[error("goal index {index} is out of range ({available} goals available)")]
    OutOfRange { index: usize, available: usize },

    #[error("goal at index {0} is already completed")]
    AlreadyCompleted(usize),
}

#[derive(Debug, Clone)]
struct GoalEntry {
    data: GoalData,
    completed: bool,
}

/// Completion state of a scenario's goals
#[derive(Debug, Clone, Default)]
pub struct GoalTracker {
    title: String,
    entries: Vec<GoalEntry>,
}

impl GoalTracker {
    pub fn new(goals: Goals) -> Self {
        Self {
            title: goals.title,
            entries: goals
                .goals
                .into_iter()
                .map(|data| GoalEntry {
                    data,
                    completed: false,
                })
                .collect(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn goal(&self, index: usize) -> Option<&GoalData> {
        self.entries.get(index).map(|e| &e.data)
    }

    /// Mark a goal completed and return it
    pub fn complete_goal(&mut self, index: usize) -> Result<GoalData, GoalError> {
        let available = self.entries.len();
        let Some(entry) = self.entries.get_mut(index) else {
            warn!(
                "Goal index {} is out of range. Available goals: {}",
                index, available
            );
            return Err(GoalError::OutOfRange { index, available });
        };
        if entry.completed {
            warn!("Goal at index {} is already completed.", index);
            return Err(GoalError::AlreadyCompleted(index));
        }
        entry.completed = true;
        Ok(entry.data.clone())
    }

    pub fn is_goal_completed(&self, index: usize) -> bool {
        self.entries.get(index).is_some_and(|e| e.completed)
    }

    pub fn next_uncompleted_goal(&self) -> Option<usize> {
        self.entries.iter().position(|e| !e.completed)
    }

    pub fn completed_count(&self) -> usize {
        self.entries.iter().filter(|e| e.completed).count()
    }

    pub fn all_completed(&self) -> bool {
        self.entries.iter().all(|e| e.completed)
    }

    /// One checkbox line per goal
    pub fn checklist(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| {
                let mark = if e.completed {
                    CHECKED_SYMBOL
                } else {
                    UNCHECKED_SYMBOL
                };
                format!("{} {}", mark, e.data.text)
            })
            .collect()
    }
}

/// Trigger volume that fires when a tagged collider enters it
#[derive(Debug, Clone)]
pub struct GoalZone {
    pub bounds: Aabb,
    pub tag: String,
    occupants: HashSet<ColliderId>,
}

impl GoalZone {
    pub fn new(bounds: Aabb, tag: impl Into<String>) -> Self {
        Self {
            bounds,
            tag: tag.into(),
            occupants: HashSet::new(),
        }
    }

    /// Tagged colliders that entered since the last update
    pub fn update(&mut self, colliders: &ColliderSet) -> Vec<ColliderId> {
        let inside: HashSet<ColliderId> = colliders
            .overlapping(&self.bounds)
            .filter(|c| c.tag == self.tag)
            .map(|c| c.id)
            .collect();

        let mut entered: Vec<ColliderId> = inside.difference(&self.occupants).copied().collect();
        entered.sort();
        self.occupants = inside;
        entered
    }
}
