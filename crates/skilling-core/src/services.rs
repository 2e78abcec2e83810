//! Collaborator contracts consumed by the gathering engines.
//!
//! Skills, inventories and persistence live outside the engine. The engine
//! only talks to them through these traits, so tests and the server can
//! plug in whichever store they own. Implementations must not block: they
//! are called from inside the tick pass.

use std::sync::Arc;

use skilling_types::PlayerId;

/// Errors a collaborator can report.
///
/// Inside a tick pass these are isolated to the affected session, which is
/// left untouched and retried on the next tick.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The collaborator has no record of the player.
    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),

    /// The collaborator could not serve the request right now.
    #[error("{service} unavailable: {reason}")]
    Unavailable {
        /// Which collaborator failed.
        service: &'static str,
        /// Description of the failure.
        reason: String,
    },
}

/// Result of an inventory insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddItemOutcome {
    /// The items were added.
    Added,
    /// There was no room; nothing was added.
    Full,
}

/// Skill levels and XP.
pub trait SkillService: Send + Sync {
    /// Current effective level of `skill` (including temporary boosts).
    fn level(&self, player: PlayerId, skill: &str) -> Result<u32, ServiceError>;

    /// Award XP. Returns the new level if the award caused a level-up.
    fn grant_xp(&self, player: PlayerId, skill: &str, amount: u32)
    -> Result<Option<u32>, ServiceError>;
}

/// Player inventories.
pub trait InventoryService: Send + Sync {
    /// Add `amount` of `item`, all or nothing.
    fn try_add_item(
        &self,
        player: PlayerId,
        item: &str,
        amount: u32,
    ) -> Result<AddItemOutcome, ServiceError>;
}

/// Persistence bookkeeping.
pub trait PersistenceManager: Send + Sync {
    /// Flag the player's state as needing a save.
    fn mark_dirty(&self, player: PlayerId);
}

/// The three collaborators an engine needs, bundled for cheap cloning.
#[derive(Clone)]
pub struct Collaborators {
    /// Skill levels and XP.
    pub skills: Arc<dyn SkillService>,
    /// Inventories.
    pub inventory: Arc<dyn InventoryService>,
    /// Dirty tracking.
    pub persistence: Arc<dyn PersistenceManager>,
}

impl Collaborators {
    /// Use one store that implements all three contracts.
    pub fn from_store<S>(store: &Arc<S>) -> Self
    where
        S: SkillService + InventoryService + PersistenceManager + 'static,
    {
        Self {
            skills: Arc::clone(store) as Arc<dyn SkillService>,
            inventory: Arc::clone(store) as Arc<dyn InventoryService>,
            persistence: Arc::clone(store) as Arc<dyn PersistenceManager>,
        }
    }
}

impl core::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
