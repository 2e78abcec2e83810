//! Enumeration types shared across the skilling workspace.

use serde::{Deserialize, Serialize};

/// The four gathering activity families.
///
/// Each family has its own catalog, its own probability formula and its own
/// engine instance; the engines are otherwise structurally identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityFamily {
    /// Felling trees with an axe.
    Woodcutting,
    /// Mining ore rocks with a pickaxe.
    Mining,
    /// Catching fish with a rod.
    Fishing,
    /// Picking produce and roots with gloves.
    Harvesting,
}

impl ActivityFamily {
    /// Every family, in the order the system adapter processes them.
    pub const ALL: [Self; 4] = [
        Self::Woodcutting,
        Self::Mining,
        Self::Fishing,
        Self::Harvesting,
    ];

    /// Name of the skill this family trains and is gated by.
    pub const fn skill_name(self) -> &'static str {
        match self {
            Self::Woodcutting => "woodcutting",
            Self::Mining => "mining",
            Self::Fishing => "fishing",
            Self::Harvesting => "harvesting",
        }
    }

    /// Stable per-family salt mixed into the world seed so each engine owns
    /// an independent random stream.
    pub const fn seed_salt(self) -> u64 {
        match self {
            Self::Woodcutting => 0x5744_4354,
            Self::Mining => 0x4d49_4e45,
            Self::Fishing => 0x4649_5348,
            Self::Harvesting => 0x4841_5256,
        }
    }
}

impl core::fmt::Display for ActivityFamily {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.skill_name())
    }
}

/// Live state of a gathering session.
///
/// Terminal states are implicit: a cancelled, disconnected or exhausted
/// session is removed from its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Waiting for the tool's initial delay before the first roll.
    AwaitingInitialDelay,
    /// At least one roll has been made.
    Rolling,
}

/// Result of a single roll against a gathering target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum RollOutcome {
    /// The roll succeeded and the yield was added to the inventory.
    Gathered {
        /// Units granted.
        amount: u32,
    },
    /// The roll succeeded but the inventory had no room; the yield was
    /// discarded and the roll still counts.
    InventoryFull {
        /// Units that would have been granted.
        amount: u32,
    },
    /// The roll failed; the next attempt is on the following tick.
    Missed,
}

impl RollOutcome {
    /// Whether the underlying Bernoulli trial succeeded.
    pub const fn is_success(self) -> bool {
        !matches!(self, Self::Missed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn skill_names_are_distinct() {
        let mut names: Vec<_> = ActivityFamily::ALL.iter().map(|f| f.skill_name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 4);
    }

    #[test]
    fn family_deserializes_from_snake_case() {
        let family: ActivityFamily = serde_json::from_str("\"woodcutting\"").unwrap();
        assert_eq!(family, ActivityFamily::Woodcutting);
    }

    #[test]
    fn inventory_full_still_counts_as_success() {
        assert!(RollOutcome::InventoryFull { amount: 1 }.is_success());
        assert!(RollOutcome::Gathered { amount: 2 }.is_success());
        assert!(!RollOutcome::Missed.is_success());
    }
}
