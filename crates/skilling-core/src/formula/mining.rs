//! Mining: pickaxes and ore rocks.
//!
//! `p = ore.base_probability + pickaxe.probability_bonus + level * 0.0001`,
//! clamped to `[0.01, 0.50]`. The pickaxe contributes a flat bonus rather
//! than effective levels.

use serde::Deserialize;
use skilling_types::{ActivityFamily, TargetId, ToolTierId};

use super::ActivityFormula;
use crate::catalog::{GatherTarget, ToolTier, check_probability};

/// Probability gained per mining level.
pub const PER_LEVEL: f64 = 0.0001;

/// A pickaxe tier.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Pickaxe {
    /// Catalog key.
    pub id: ToolTierId,
    /// Mining level needed to wield the pickaxe.
    pub required_level: u32,
    /// Flat probability added to every roll.
    #[serde(default)]
    pub probability_bonus: f64,
    /// Minimum ticks before the first swing, and again after every ore.
    pub initial_delay_ticks: u64,
}

impl ToolTier for Pickaxe {
    fn id(&self) -> &ToolTierId {
        &self.id
    }

    fn required_level(&self) -> u32 {
        self.required_level
    }

    fn initial_delay_ticks(&self) -> u64 {
        self.initial_delay_ticks
    }

    fn validate(&self) -> Result<(), String> {
        check_probability("probability_bonus", self.probability_bonus, 0.0, 1.0)
    }
}

/// An ore rock.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Ore {
    /// Catalog key.
    pub id: TargetId,
    /// Mining level needed to mine the rock.
    pub required_level: u32,
    /// XP per ore.
    pub xp: u32,
    /// Chance per roll before bonuses.
    pub base_probability: f64,
    /// Item granted per ore.
    pub item: String,
    /// Ticks a mined-out rock stays empty.
    #[serde(default)]
    pub respawn_ticks: Option<u64>,
}

impl GatherTarget for Ore {
    fn id(&self) -> &TargetId {
        &self.id
    }

    fn required_level(&self) -> u32 {
        self.required_level
    }

    fn xp(&self) -> u32 {
        self.xp
    }

    fn item(&self) -> &str {
        &self.item
    }

    fn respawn_ticks(&self) -> Option<u64> {
        self.respawn_ticks
    }

    fn validate(&self) -> Result<(), String> {
        check_probability("base_probability", self.base_probability, 0.0, 1.0)
    }
}

/// Mining probability model.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mining;

impl ActivityFormula for Mining {
    const FAMILY: ActivityFamily = ActivityFamily::Mining;
    const MIN_PROBABILITY: f64 = 0.01;
    const MAX_PROBABILITY: f64 = 0.50;

    type Tool = Pickaxe;
    type Target = Ore;

    fn raw_probability(level: u32, tool: &Pickaxe, target: &Ore) -> f64 {
        target.base_probability + tool.probability_bonus + f64::from(level) * PER_LEVEL
    }
}
