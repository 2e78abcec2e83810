//! Woodcutting: axes and trees.
//!
//! `p = 0.0228 + tree.resource_probability * (level + axe.level_bonus) / 1747`,
//! clamped to `[0.01, 0.60]`. A felled log restarts the axe's initial delay.

use serde::Deserialize;
use skilling_types::{ActivityFamily, TargetId, ToolTierId};

use super::ActivityFormula;
use crate::catalog::{GatherTarget, ToolTier, check_probability};

/// Base chance independent of level.
pub const BASE_PROBABILITY: f64 = 0.0228;

/// Divisor applied to `resource_probability * effective_level`.
pub const LEVEL_DIVISOR: f64 = 1747.0;

/// An axe tier.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Axe {
    /// Catalog key.
    pub id: ToolTierId,
    /// Woodcutting level needed to wield the axe.
    pub required_level: u32,
    /// Added to the player's level before the formula runs.
    #[serde(default)]
    pub level_bonus: u32,
    /// Ticks before the first chop, and again after every log.
    pub initial_delay_ticks: u64,
}

impl ToolTier for Axe {
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

/// A tree species.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Tree {
    /// Catalog key.
    pub id: TargetId,
    /// Woodcutting level needed to chop the tree.
    pub required_level: u32,
    /// XP per log.
    pub xp: u32,
    /// Species weight in `[0, 1]`; harder trees have lower values.
    pub resource_probability: f64,
    /// Item granted per log.
    pub item: String,
    /// Ticks a felled tree stays down.
    #[serde(default)]
    pub respawn_ticks: Option<u64>,
}

impl GatherTarget for Tree {
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
        check_probability("resource_probability", self.resource_probability, 0.0, 1.0)
    }
}

/// Woodcutting probability model.
#[derive(Debug, Clone, Copy, Default)]
pub struct Woodcutting;

impl ActivityFormula for Woodcutting {
    const FAMILY: ActivityFamily = ActivityFamily::Woodcutting;
    const MIN_PROBABILITY: f64 = 0.01;
    const MAX_PROBABILITY: f64 = 0.60;

    type Tool = Axe;
    type Target = Tree;

    fn effective_level(level: u32, tool: &Axe) -> u32 {
        level.saturating_add(tool.level_bonus)
    }

    fn raw_probability(effective_level: u32, _tool: &Axe, target: &Tree) -> f64 {
        BASE_PROBABILITY + target.resource_probability * f64::from(effective_level) / LEVEL_DIVISOR
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::Catalogs;

    fn bronze_axe() -> Axe {
        Axe {
            id: ToolTierId::new("bronze"),
            required_level: 1,
            level_bonus: 0,
            initial_delay_ticks: 17,
        }
    }

    fn normal_tree() -> Tree {
        Tree {
            id: TargetId::new("normal"),
            required_level: 1,
            xp: 25,
            resource_probability: 0.825,
            item: "logs".to_owned(),
            respawn_ticks: None,
        }
    }

    #[test]
    fn level_one_bronze_axe_normal_tree() {
        let p = Woodcutting::probability(1, &bronze_axe(), &normal_tree());
        // 0.0228 + 0.825 * 1 / 1747
        assert_eq!(p.to_bits(), (0.0228_f64 + 0.825 * 1.0 / 1747.0).to_bits());
        assert!((p - 0.023_272).abs() < 1e-6);

        #[allow(clippy::cast_precision_loss)]
        let expected_ticks = bronze_axe().initial_delay_ticks as f64 + 1.0 / p;
        assert!((expected_ticks - 60.0).abs() < 0.5, "got {expected_ticks}");
    }

    #[test]
    fn level_bonus_raises_effective_level() {
        let mut axe = bronze_axe();
        axe.level_bonus = 10;
        assert_eq!(Woodcutting::effective_level(5, &axe), 15);
        let boosted = Woodcutting::probability(5, &axe, &normal_tree());
        let plain = Woodcutting::probability(15, &bronze_axe(), &normal_tree());
        assert_eq!(boosted.to_bits(), plain.to_bits());
    }

    #[test]
    fn high_levels_clamp_at_sixty_percent() {
        let mut tree = normal_tree();
        tree.resource_probability = 1.0;
        let mut axe = bronze_axe();
        axe.level_bonus = 5_000;
        let p = Woodcutting::probability(99, &axe, &tree);
        assert!((p - 0.60).abs() < f64::EPSILON);
    }

    #[test]
    fn success_restarts_the_axe_delay() {
        assert_eq!(Woodcutting::post_success_delay(&bronze_axe()), 17);
    }

    #[test]
    fn builtin_catalog_stays_in_band() {
        let catalogs = Catalogs::builtin().unwrap();
        for axe in catalogs.woodcutting.tools() {
            for tree in catalogs.woodcutting.targets() {
                for level in 0..=120 {
                    let p = Woodcutting::probability(level, axe, tree);
                    assert!((0.01..=0.60).contains(&p), "{p} for {level}/{axe:?}/{tree:?}");
                }
            }
        }
    }
}
