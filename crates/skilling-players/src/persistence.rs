//! Dirty tracking for periodic saves.
//!
//! Mutations flag a player; the server drains the set on its persist
//! interval and hands the ids to whatever store writes them.

use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use skilling_types::PlayerId;

/// Set of players whose state changed since the last flush.
#[derive(Debug, Default)]
pub struct DirtyTracker {
    dirty: Mutex<BTreeSet<PlayerId>>,
}

impl DirtyTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Flag a player.
    pub fn mark(&self, player: PlayerId) {
        self.set().insert(player);
    }

    /// Whether a player is flagged.
    pub fn is_dirty(&self, player: PlayerId) -> bool {
        self.set().contains(&player)
    }

    /// Number of flagged players.
    pub fn len(&self) -> usize {
        self.set().len()
    }

    /// Whether nobody is flagged.
    pub fn is_empty(&self) -> bool {
        self.set().is_empty()
    }

    /// Take every flagged player, in id order, clearing the set.
    pub fn drain(&self) -> Vec<PlayerId> {
        core::mem::take(&mut *self.set()).into_iter().collect()
    }

    /// Unflag a player, e.g. after it was saved on disconnect.
    pub fn forget(&self, player: PlayerId) {
        self.set().remove(&player);
    }

    fn set(&self) -> MutexGuard<'_, BTreeSet<PlayerId>> {
        self.dirty.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
