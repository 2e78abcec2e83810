//! In-memory player store.
//!
//! Holds every connected player's [`SkillBook`] and [`Inventory`] and
//! implements the three collaborator contracts the gathering engines call
//! into. Each call takes the store lock briefly and never blocks on I/O.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use skilling_core::services::{
    AddItemOutcome, InventoryService, PersistenceManager, ServiceError, SkillService,
};
use skilling_types::PlayerId;
use tracing::{debug, info};

use crate::error::PlayerError;
use crate::inventory::Inventory;
use crate::persistence::DirtyTracker;
use crate::skills::SkillBook;

/// Everything stored for one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    /// Skill levels and XP.
    pub skills: SkillBook,
    /// Carried items.
    pub inventory: Inventory,
}

/// Defaults applied to newly connected players.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerDefaults {
    /// Starting level for every gathering skill.
    pub starting_level: u32,
    /// Inventory capacity in units.
    pub inventory_capacity: u32,
}

impl Default for PlayerDefaults {
    fn default() -> Self {
        Self {
            starting_level: 1,
            inventory_capacity: 28,
        }
    }
}

/// Connected players, keyed by id.
#[derive(Debug, Default)]
pub struct PlayerStore {
    records: Mutex<BTreeMap<PlayerId, PlayerRecord>>,
    dirty: DirtyTracker,
    defaults: PlayerDefaults,
}

impl PlayerStore {
    /// Create an empty store.
    pub fn new(defaults: PlayerDefaults) -> Self {
        Self {
            records: Mutex::new(BTreeMap::new()),
            dirty: DirtyTracker::new(),
            defaults,
        }
    }

    /// Register a player with default skills and an empty inventory.
    ///
    /// Returns `false` (leaving the record alone) if already connected.
    pub fn connect(&self, player: PlayerId) -> bool {
        let record = PlayerRecord {
            skills: SkillBook::new(self.defaults.starting_level),
            inventory: Inventory::new(self.defaults.inventory_capacity),
        };
        self.restore(player, record)
    }

    /// Register a player from previously saved state.
    ///
    /// Returns `false` (leaving the record alone) if already connected.
    pub fn restore(&self, player: PlayerId, record: PlayerRecord) -> bool {
        let mut records = self.records();
        if records.contains_key(&player) {
            return false;
        }
        records.insert(player, record);
        info!(player = %player, "Player connected");
        true
    }

    /// Remove a player, returning the final record for saving.
    pub fn disconnect(&self, player: PlayerId) -> Option<PlayerRecord> {
        let record = self.records().remove(&player);
        if record.is_some() {
            self.dirty.forget(player);
            info!(player = %player, "Player disconnected");
        }
        record
    }

    /// Number of connected players.
    pub fn len(&self) -> usize {
        self.records().len()
    }

    /// Whether no players are connected.
    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }

    /// Copy of a player's record.
    pub fn record(&self, player: PlayerId) -> Option<PlayerRecord> {
        self.records().get(&player).cloned()
    }

    /// Run `f` against a player's record, marking the player dirty.
    ///
    /// # Errors
    ///
    /// Returns [`PlayerError::PlayerNotFound`] if the player is not
    /// connected, otherwise whatever `f` returns.
    pub fn update<T>(
        &self,
        player: PlayerId,
        f: impl FnOnce(&mut PlayerRecord) -> Result<T, PlayerError>,
    ) -> Result<T, PlayerError> {
        let mut records = self.records();
        let record = records
            .get_mut(&player)
            .ok_or(PlayerError::PlayerNotFound(player))?;
        let out = f(record)?;
        self.dirty.mark(player);
        Ok(out)
    }

    /// Dirty tracking shared with the persist loop.
    pub const fn dirty(&self) -> &DirtyTracker {
        &self.dirty
    }

    /// Take the players that need saving, with their current records.
    pub fn drain_dirty(&self) -> Vec<(PlayerId, PlayerRecord)> {
        let ids = self.dirty.drain();
        let records = self.records();
        ids.into_iter()
            .filter_map(|id| records.get(&id).map(|r| (id, r.clone())))
            .collect()
    }

    fn records(&self) -> MutexGuard<'_, BTreeMap<PlayerId, PlayerRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl From<PlayerError> for ServiceError {
    fn from(err: PlayerError) -> Self {
        match err {
            PlayerError::PlayerNotFound(player) => Self::UnknownPlayer(player),
            other => Self::Unavailable {
                service: "player store",
                reason: other.to_string(),
            },
        }
    }
}

impl SkillService for PlayerStore {
    fn level(&self, player: PlayerId, skill: &str) -> Result<u32, ServiceError> {
        self.records()
            .get(&player)
            .map(|r| r.skills.effective_level(skill))
            .ok_or(ServiceError::UnknownPlayer(player))
    }

    fn grant_xp(
        &self,
        player: PlayerId,
        skill: &str,
        amount: u32,
    ) -> Result<Option<u32>, ServiceError> {
        let level_up = self.update(player, |r| r.skills.add_xp(skill, amount))?;
        if let Some(level) = level_up {
            debug!(player = %player, skill, level, "Skill level increased");
        }
        Ok(level_up)
    }
}

impl InventoryService for PlayerStore {
    fn try_add_item(
        &self,
        player: PlayerId,
        item: &str,
        amount: u32,
    ) -> Result<AddItemOutcome, ServiceError> {
        let result = self.update(player, |r| r.inventory.add(item, amount));
        match result {
            Ok(()) => Ok(AddItemOutcome::Added),
            Err(PlayerError::InventoryFull { .. }) => Ok(AddItemOutcome::Full),
            Err(e) => Err(e.into()),
        }
    }
}

impl PersistenceManager for PlayerStore {
    fn mark_dirty(&self, player: PlayerId) {
        self.dirty.mark(player);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn store() -> PlayerStore {
        PlayerStore::new(PlayerDefaults {
            starting_level: 1,
            inventory_capacity: 5,
        })
    }

    #[test]
    fn connect_is_idempotent() {
        let store = store();
        let player = PlayerId::new();
        assert!(store.connect(player));
        store
            .update(player, |r| r.inventory.add("logs", 2))
            .unwrap();
        assert!(!store.connect(player));
        assert_eq!(store.record(player).unwrap().inventory.quantity("logs"), 2);
    }

    #[test]
    fn unknown_player_maps_to_service_error() {
        let store = store();
        let ghost = PlayerId::new();
        assert!(matches!(
            store.level(ghost, "mining"),
            Err(ServiceError::UnknownPlayer(p)) if p == ghost
        ));
        assert!(matches!(
            store.try_add_item(ghost, "coal", 1),
            Err(ServiceError::UnknownPlayer(_))
        ));
    }

    #[test]
    fn full_inventory_is_an_outcome_not_an_error() {
        let store = store();
        let player = PlayerId::new();
        store.connect(player);
        assert_eq!(
            store.try_add_item(player, "potato", 5).unwrap(),
            AddItemOutcome::Added
        );
        assert_eq!(
            store.try_add_item(player, "potato", 1).unwrap(),
            AddItemOutcome::Full
        );
    }

    #[test]
    fn level_includes_boosts() {
        let store = store();
        let player = PlayerId::new();
        store.connect(player);
        store
            .update(player, |r| {
                r.skills.set_boost("fishing", 4);
                Ok(())
            })
            .unwrap();
        assert_eq!(store.level(player, "fishing").unwrap(), 5);
    }

    #[test]
    fn grant_xp_reports_level_up_and_dirties() {
        let store = store();
        let player = PlayerId::new();
        store.connect(player);
        assert_eq!(store.grant_xp(player, "woodcutting", 100).unwrap(), Some(2));
        let dirty = store.drain_dirty();
        assert_eq!(dirty.len(), 1);
        assert_eq!(dirty[0].1.skills.level("woodcutting"), 2);
        assert!(store.drain_dirty().is_empty());
    }

    #[test]
    fn disconnect_returns_final_record() {
        let store = store();
        let player = PlayerId::new();
        store.connect(player);
        store.mark_dirty(player);
        let record = store.disconnect(player).unwrap();
        assert_eq!(record.inventory.capacity(), 5);
        assert!(store.is_empty());
        assert!(store.dirty().is_empty());
        assert!(store.disconnect(player).is_none());
    }
}
