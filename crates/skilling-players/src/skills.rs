//! Skill book: per-player levels, XP and temporary boosts.
//!
//! # Level-Up Formula
//!
//! XP required to advance from level N to level N+1 is `N * 100`. Levels
//! start at 1 and cap at [`MAX_SKILL_LEVEL`]. XP past the last level-up is
//! carried towards the next one; at the cap it is discarded.
//!
//! The level the gathering engines see is the *effective* level: the base
//! level plus any active boost.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use skilling_types::ActivityFamily;

use crate::error::PlayerError;

/// Highest trainable level.
pub const MAX_SKILL_LEVEL: u32 = 120;

/// XP needed per level step; multiplied by the current level.
pub const XP_PER_LEVEL_STEP: u32 = 100;

/// A player's gathering skills.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillBook {
    levels: BTreeMap<String, u32>,
    xp: BTreeMap<String, u32>,
    #[serde(default)]
    boosts: BTreeMap<String, u32>,
}

impl SkillBook {
    /// A book with every gathering skill at `starting_level`.
    pub fn new(starting_level: u32) -> Self {
        let level = starting_level.clamp(1, MAX_SKILL_LEVEL);
        let levels = ActivityFamily::ALL
            .iter()
            .map(|f| (f.skill_name().to_owned(), level))
            .collect();
        Self {
            levels,
            xp: BTreeMap::new(),
            boosts: BTreeMap::new(),
        }
    }

    /// Base level of a skill. Unknown skills are level 1.
    pub fn level(&self, skill: &str) -> u32 {
        self.levels.get(skill).copied().unwrap_or(1)
    }

    /// Base level plus any active boost.
    pub fn effective_level(&self, skill: &str) -> u32 {
        let boost = self.boosts.get(skill).copied().unwrap_or(0);
        self.level(skill).saturating_add(boost)
    }

    /// XP accumulated towards the next level.
    pub fn xp(&self, skill: &str) -> u32 {
        self.xp.get(skill).copied().unwrap_or(0)
    }

    /// Set a base level directly, clamped to `1..=MAX_SKILL_LEVEL`.
    pub fn set_level(&mut self, skill: &str, level: u32) {
        self.levels
            .insert(skill.to_owned(), level.clamp(1, MAX_SKILL_LEVEL));
        self.xp.remove(skill);
    }

    /// Apply a temporary boost, replacing any previous one for the skill.
    pub fn set_boost(&mut self, skill: &str, amount: u32) {
        if amount == 0 {
            self.boosts.remove(skill);
        } else {
            self.boosts.insert(skill.to_owned(), amount);
        }
    }

    /// Add XP to a skill, levelling up as many times as it pays for.
    ///
    /// Returns `Some(new_level)` if the skill levelled up.
    ///
    /// # Errors
    ///
    /// Returns [`PlayerError::ArithmeticOverflow`] if the XP total would
    /// overflow.
    pub fn add_xp(&mut self, skill: &str, amount: u32) -> Result<Option<u32>, PlayerError> {
        if amount == 0 {
            return Ok(None);
        }

        let level = self.levels.entry(skill.to_owned()).or_insert(1);
        if *level >= MAX_SKILL_LEVEL {
            return Ok(None);
        }
        let xp = self.xp.entry(skill.to_owned()).or_insert(0);
        *xp = xp
            .checked_add(amount)
            .ok_or_else(|| PlayerError::ArithmeticOverflow {
                context: format!("XP overflow for skill {skill}"),
            })?;

        let original = *level;
        while *level < MAX_SKILL_LEVEL {
            let threshold = level.saturating_mul(XP_PER_LEVEL_STEP);
            if *xp < threshold {
                break;
            }
            *xp = xp.saturating_sub(threshold);
            *level = level.saturating_add(1);
        }
        if *level >= MAX_SKILL_LEVEL {
            *xp = 0;
        }

        Ok((*level > original).then_some(*level))
    }
}

impl Default for SkillBook {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn new_book_starts_every_family() {
        let book = SkillBook::new(5);
        for family in ActivityFamily::ALL {
            assert_eq!(book.level(family.skill_name()), 5);
        }
    }

    #[test]
    fn level_one_needs_one_hundred_xp() {
        let mut book = SkillBook::default();
        assert_eq!(book.add_xp("mining", 99).unwrap(), None);
        assert_eq!(book.add_xp("mining", 1).unwrap(), Some(2));
        assert_eq!(book.xp("mining"), 0);
        // Level 2 needs 200 more.
        assert_eq!(book.add_xp("mining", 199).unwrap(), None);
        assert_eq!(book.add_xp("mining", 1).unwrap(), Some(3));
    }

    #[test]
    fn large_award_levels_up_repeatedly() {
        let mut book = SkillBook::default();
        // 100 + 200 + 300 = 600 reaches level 4, 50 left over.
        assert_eq!(book.add_xp("fishing", 650).unwrap(), Some(4));
        assert_eq!(book.xp("fishing"), 50);
    }

    #[test]
    fn cap_discards_extra_xp() {
        let mut book = SkillBook::default();
        book.set_level("harvesting", MAX_SKILL_LEVEL - 1);
        let result = book.add_xp("harvesting", u32::MAX / 2).unwrap();
        assert_eq!(result, Some(MAX_SKILL_LEVEL));
        assert_eq!(book.xp("harvesting"), 0);
        assert_eq!(book.add_xp("harvesting", 10).unwrap(), None);
        assert_eq!(book.xp("harvesting"), 0);
    }

    #[test]
    fn boosts_raise_effective_level_only() {
        let mut book = SkillBook::new(10);
        book.set_boost("woodcutting", 3);
        assert_eq!(book.level("woodcutting"), 10);
        assert_eq!(book.effective_level("woodcutting"), 13);
        book.set_boost("woodcutting", 0);
        assert_eq!(book.effective_level("woodcutting"), 10);
    }

    #[test]
    fn serializes_with_boosts_optional() {
        let book = SkillBook::new(3);
        let mut json = serde_json::to_value(&book).unwrap();
        json.as_object_mut().unwrap().remove("boosts");
        let back: SkillBook = serde_json::from_value(json).unwrap();
        assert_eq!(back, book);
    }
}
