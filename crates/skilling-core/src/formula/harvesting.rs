//! Harvesting: gloves and produce/root patches.
//!
//! `p = 0.045 - target.level * 0.0008 + (level + glove.level_bonus) / 2400`,
//! clamped to `[0.01, 0.35]`. After the glove's initial delay every tick is
//! a roll; a success does not restart any delay. Each success yields a
//! quantity drawn uniformly from the target's yield range.

use serde::Deserialize;
use skilling_types::{ActivityFamily, TargetId, ToolTierId};

use super::ActivityFormula;
use crate::catalog::{GatherTarget, ToolTier, YieldRange};

/// Base chance independent of level.
pub const BASE_PROBABILITY: f64 = 0.045;

/// Penalty per target level.
pub const TARGET_LEVEL_PENALTY: f64 = 0.0008;

/// Divisor applied to the effective level.
pub const LEVEL_DIVISOR: f64 = 2400.0;

/// A pair of harvesting gloves.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Glove {
    /// Catalog key.
    pub id: ToolTierId,
    /// Harvesting level needed to wear the gloves.
    pub required_level: u32,
    /// Added to the player's level before the formula runs.
    #[serde(default)]
    pub level_bonus: u32,
    /// Ticks before the first pick.
    pub initial_delay_ticks: u64,
}

impl ToolTier for Glove {
    fn id(&self) -> &ToolTierId {
        &self.id
    }

    fn required_level(&self) -> u32 {
        self.required_level
    }

    fn initial_delay_ticks(&self) -> u64 {
        self.initial_delay_ticks
    }
}

/// A produce or root patch.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Harvestable {
    /// Catalog key.
    pub id: TargetId,
    /// Target level: both the requirement and the formula penalty.
    pub level: u32,
    /// XP per successful pick.
    pub xp: u32,
    /// Item granted per pick.
    pub item: String,
    /// Units granted per successful pick.
    #[serde(rename = "yield")]
    pub yield_range: YieldRange,
    /// Ticks an emptied patch takes to regrow.
    #[serde(default)]
    pub respawn_ticks: Option<u64>,
}

impl GatherTarget for Harvestable {
    fn id(&self) -> &TargetId {
        &self.id
    }

    fn required_level(&self) -> u32 {
        self.level
    }

    fn xp(&self) -> u32 {
        self.xp
    }

    fn item(&self) -> &str {
        &self.item
    }

    fn yield_range(&self) -> Option<YieldRange> {
        Some(self.yield_range)
    }

    fn respawn_ticks(&self) -> Option<u64> {
        self.respawn_ticks
    }
}

/// Harvesting probability model.
#[derive(Debug, Clone, Copy, Default)]
pub struct Harvesting;

impl ActivityFormula for Harvesting {
    const FAMILY: ActivityFamily = ActivityFamily::Harvesting;
    const MIN_PROBABILITY: f64 = 0.01;
    const MAX_PROBABILITY: f64 = 0.35;

    type Tool = Glove;
    type Target = Harvestable;

    fn effective_level(level: u32, tool: &Glove) -> u32 {
        level.saturating_add(tool.level_bonus)
    }

    fn raw_probability(effective_level: u32, _tool: &Glove, target: &Harvestable) -> f64 {
        BASE_PROBABILITY - f64::from(target.level) * TARGET_LEVEL_PENALTY
            + f64::from(effective_level) / LEVEL_DIVISOR
    }

    fn post_success_delay(_tool: &Glove) -> u64 {
        1
    }
}
