//! Per-family success probability formulas.
//!
//! Every family maps `(player level, tool tier, target)` to the probability
//! that a single roll succeeds. The constants are economy-critical: they set
//! how fast players progress, so each formula is evaluated in exactly the
//! documented operation order and clamped to its family band.
//!
//! | Family | Effective level | Formula | Clamp |
//! |---|---|---|---|
//! | Woodcutting | `level + axe.level_bonus` | `0.0228 + tree.resource_probability * eff / 1747` | `[0.01, 0.60]` |
//! | Mining | `level` | `ore.base_probability + pickaxe.probability_bonus + level * 0.0001` | `[0.01, 0.50]` |
//! | Fishing | `level` | `(fish.probability / 20) * (1 + level * 0.0005)` | `[0.01, 0.15]` |
//! | Harvesting | `level + glove.level_bonus` | `0.045 - target.level * 0.0008 + eff / 2400` | `[0.01, 0.35]` |
//!
//! Rolls are Bernoulli trials, so the expected number of attempts until a
//! success is `1 / p`.

pub mod fishing;
pub mod harvesting;
pub mod mining;
pub mod woodcutting;

use skilling_types::ActivityFamily;

use crate::catalog::{GatherTarget, ToolTier};

pub use fishing::Fishing;
pub use harvesting::Harvesting;
pub use mining::Mining;
pub use woodcutting::Woodcutting;

/// The probability model and timing rules of one activity family.
///
/// Implementors are zero-sized markers; the generic engine is instantiated
/// once per implementor.
pub trait ActivityFormula: Send + Sync + 'static {
    /// The family this formula belongs to.
    const FAMILY: ActivityFamily;

    /// Lower clamp bound.
    const MIN_PROBABILITY: f64;

    /// Upper clamp bound.
    const MAX_PROBABILITY: f64;

    /// Tool tier row type.
    type Tool: ToolTier;

    /// Target row type.
    type Target: GatherTarget;

    /// Level fed into the formula. Defaults to the raw skill level.
    fn effective_level(level: u32, _tool: &Self::Tool) -> u32 {
        level
    }

    /// Unclamped success probability for an already-effective level.
    fn raw_probability(effective_level: u32, tool: &Self::Tool, target: &Self::Target) -> f64;

    /// Clamped success probability for a player's skill level.
    fn probability(level: u32, tool: &Self::Tool, target: &Self::Target) -> f64 {
        let effective = Self::effective_level(level, tool);
        clamp_probability(
            Self::raw_probability(effective, tool, target),
            Self::MIN_PROBABILITY,
            Self::MAX_PROBABILITY,
        )
    }

    /// Ticks from a successful roll to the next roll.
    ///
    /// Defaults to the tool's initial delay: a success restarts the same
    /// wait as the very first attempt.
    fn post_success_delay(tool: &Self::Tool) -> u64 {
        tool.initial_delay_ticks()
    }
}

/// Clamp into `[min, max]`; a non-finite input maps to `min`.
pub fn clamp_probability(raw: f64, min: f64, max: f64) -> f64 {
    if raw.is_finite() { raw.clamp(min, max) } else { min }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_keeps_values_inside_band() {
        assert!((clamp_probability(0.2, 0.01, 0.5) - 0.2).abs() < f64::EPSILON);
        assert!((clamp_probability(0.9, 0.01, 0.5) - 0.5).abs() < f64::EPSILON);
        assert!((clamp_probability(-3.0, 0.01, 0.5) - 0.01).abs() < f64::EPSILON);
    }

    #[test]
    fn clamp_maps_nan_to_minimum() {
        assert!((clamp_probability(f64::NAN, 0.01, 0.5) - 0.01).abs() < f64::EPSILON);
        assert!((clamp_probability(f64::INFINITY, 0.01, 0.5) - 0.01).abs() < f64::EPSILON);
    }
}
