//! Fishing: rods and fish.
//!
//! `p = (fish.probability / 20) * (1 + level * 0.0005)`, clamped to
//! `[0.01, 0.15]`. Rods only gate eligibility and set the cast delay.

use serde::Deserialize;
use skilling_types::{ActivityFamily, TargetId, ToolTierId};

use super::ActivityFormula;
use crate::catalog::{GatherTarget, ToolTier, check_probability};

/// Divisor applied to a fish's catalog probability.
pub const PROBABILITY_DIVISOR: f64 = 20.0;

/// Multiplier growth per fishing level.
pub const PER_LEVEL: f64 = 0.0005;

/// A fishing rod tier.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Rod {
    /// Catalog key.
    pub id: ToolTierId,
    /// Fishing level needed to use the rod.
    pub required_level: u32,
    /// Ticks before the first bite check, and again after every catch.
    pub cast_delay_ticks: u64,
}

impl ToolTier for Rod {
    fn id(&self) -> &ToolTierId {
        &self.id
    }

    fn required_level(&self) -> u32 {
        self.required_level
    }

    fn initial_delay_ticks(&self) -> u64 {
        self.cast_delay_ticks
    }
}

/// A fish species.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Fish {
    /// Catalog key.
    pub id: TargetId,
    /// Fishing level needed to catch the fish.
    pub required_level: u32,
    /// XP per catch.
    pub xp: u32,
    /// Species weight; divided by 20 in the formula.
    pub probability: f64,
    /// Item granted per catch.
    pub item: String,
}

impl GatherTarget for Fish {
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

    fn validate(&self) -> Result<(), String> {
        check_probability("probability", self.probability, 0.0, PROBABILITY_DIVISOR)
    }
}

/// Fishing probability model.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fishing;

impl ActivityFormula for Fishing {
    const FAMILY: ActivityFamily = ActivityFamily::Fishing;
    const MIN_PROBABILITY: f64 = 0.01;
    const MAX_PROBABILITY: f64 = 0.15;

    type Tool = Rod;
    type Target = Fish;

    fn raw_probability(level: u32, _tool: &Rod, target: &Fish) -> f64 {
        (target.probability / PROBABILITY_DIVISOR) * (1.0 + f64::from(level) * PER_LEVEL)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::Catalogs;

    fn master_rod() -> Rod {
        Rod {
            id: ToolTierId::new("master"),
            required_level: 60,
            cast_delay_ticks: 3,
        }
    }

    fn turtle() -> Fish {
        Fish {
            id: TargetId::new("turtle"),
            required_level: 60,
            xp: 120,
            probability: 0.6,
            item: "raw_turtle".to_owned(),
        }
    }

    #[test]
    fn level_sixty_five_master_rod_turtle() {
        let p = Fishing::probability(65, &master_rod(), &turtle());
        // 0.03 * 1.0325
        assert!((p - 0.030_975).abs() < 1e-9, "got {p}");
        assert_eq!(p.to_bits(), ((0.6_f64 / 20.0) * (1.0 + 65.0 * 0.0005)).to_bits());
    }

    #[test]
    fn cast_delay_is_the_timing_constant() {
        assert_eq!(master_rod().initial_delay_ticks(), 3);
        assert_eq!(Fishing::post_success_delay(&master_rod()), 3);
    }

    #[test]
    fn easy_fish_clamp_at_fifteen_percent() {
        let mut fish = turtle();
        fish.probability = 4.0;
        let p = Fishing::probability(99, &master_rod(), &fish);
        assert!((p - 0.15).abs() < f64::EPSILON);
    }

    #[test]
    fn builtin_catalog_stays_in_band() {
        let catalogs = Catalogs::builtin().unwrap();
        for rod in catalogs.fishing.tools() {
            for fish in catalogs.fishing.targets() {
                for level in 0..=120 {
                    let p = Fishing::probability(level, rod, fish);
                    assert!((0.01..=0.15).contains(&p), "{p} for {level}/{rod:?}/{fish:?}");
                }
            }
        }
    }
}
