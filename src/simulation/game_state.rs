//! Session and player progression state
//!
//! Tracks whether the simulation is paused and how much experience the
//! player has collected, turning the driving scenarios into a game.

use anyhow::{ensure, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::cell::Cell;

/// Experience thresholds and rewards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    /// Experience needed to leave level 1
    pub base_threshold: i32,
    /// Extra experience needed per level after the first
    pub level_multiplier: i32,
    /// Reward for finishing a level
    pub level_complete_xp: i32,
}

impl ProgressionConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.base_threshold > 0,
            "base_threshold must be positive, got {}",
            self.base_threshold
        );
        ensure!(
            self.level_multiplier >= 0,
            "level_multiplier must not be negative, got {}",
            self.level_multiplier
        );
        ensure!(
            self.level_complete_xp >= 0,
            "level_complete_xp must not be negative, got {}",
            self.level_complete_xp
        );
        Ok(())
    }
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            base_threshold: 100,
            level_multiplier: 20,
            level_complete_xp: 50,
        }
    }
}

/// Snapshot published with `EXPERIENCE_GAINED`, taken before the award
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExperienceGain {
    pub experience_gained: i32,
    pub current_experience: i32,
    pub current_level: i32,
    pub current_level_threshold: i32,
}

/// Player level and experience
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerProgress {
    config: ProgressionConfig,
    level: i32,
    experience: i32,
}

impl Default for PlayerProgress {
    fn default() -> Self {
        Self::new(ProgressionConfig::default())
    }
}

impl PlayerProgress {
    pub fn new(config: ProgressionConfig) -> Self {
        Self {
            config,
            level: 1,
            experience: 0,
        }
    }

    pub fn config(&self) -> &ProgressionConfig {
        &self.config
    }

    pub fn level(&self) -> i32 {
        self.level
    }

    pub fn experience(&self) -> i32 {
        self.experience
    }

    /// Experience needed to complete the current level
    pub fn level_threshold(&self) -> i32 {
        self.config.base_threshold.saturating_add(
            (self.level - 1).saturating_mul(self.config.level_multiplier),
        )
    }

    pub fn level_complete_xp(&self) -> i32 {
        self.config.level_complete_xp
    }

    /// Snapshot describing an upcoming award of `amount`
    pub fn gain_snapshot(&self, amount: i32) -> ExperienceGain {
        ExperienceGain {
            experience_gained: amount,
            current_experience: self.experience,
            current_level: self.level,
            current_level_threshold: self.level_threshold(),
        }
    }

    /// Add experience, levelling up as many times as it covers.
    /// Returns true when at least one level was gained.
    pub fn add_experience(&mut self, amount: i32) -> bool {
        self.experience = self.experience.saturating_add(amount.max(0));
        let mut leveled_up = false;

        // A non-positive threshold would never terminate
        if self.config.level_multiplier == 0 && self.level_threshold() > 0 {
            let threshold = self.level_threshold();
            let levels = self.experience / threshold;
            self.level = self.level.saturating_add(levels);
            self.experience %= threshold;
            leveled_up = levels > 0;
        }
        while self.level_threshold() > 0 && self.experience >= self.level_threshold() {
            self.experience -= self.level_threshold();
            self.level = self.level.saturating_add(1);
            leveled_up = true;
        }

        if leveled_up {
            info!("Level up! Now level {}", self.level);
        }
        leveled_up
    }

    /// Fraction of the current level completed, in [0, 1)
    pub fn progress(&self) -> f32 {
        let threshold = self.level_threshold();
        if threshold > 0 {
            self.experience as f32 / threshold as f32
        } else {
            0.0
        }
    }

    pub fn reset(&mut self) {
        self.level = 1;
        self.experience = 0;
    }

    pub fn summary(&self) -> String {
        format!(
            "Level {} | XP {}/{}",
            self.level,
            self.experience,
            self.level_threshold()
        )
    }
}

/// Pause state shared between the world and its event listeners
#[derive(Debug, Default)]
pub struct GameSession {
    paused: Cell<bool>,
}

impl GameSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_paused(&self) -> bool {
        self.paused.get()
    }

    /// Returns true if the session was running
    pub fn pause(&self) -> bool {
        !self.paused.replace(true)
    }

    /// Returns true if the session was paused
    pub fn resume(&self) -> bool {
        self.paused.replace(false)
    }

    /// Multiplier applied to simulation time
    pub fn time_scale(&self) -> f32 {
        if self.is_paused() {
            0.0
        } else {
            1.0
        }
    }
}
