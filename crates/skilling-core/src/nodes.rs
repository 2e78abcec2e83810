//! Target availability: the extension point for node depletion.
//!
//! Gathering is modelled as a per-player probability process. Whether a
//! tree, rock or patch is a shared world object that can run out is decided
//! by whatever implements [`NodeAvailability`]; the engine only asks whether
//! a target can be gathered and reports successful gathers.
//!
//! [`AlwaysAvailable`] is the default. [`RespawnTimers`] is a shared handle
//! of depleted targets: a successful gather on a target with a catalog
//! `respawn_ticks` depletes it for that long, and the surrounding world may
//! deplete targets directly. Engines holding a clone stop sessions on
//! depleted targets.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use skilling_types::{PlayerId, TargetId};
use tracing::debug;

/// Decides whether a target can currently be gathered.
pub trait NodeAvailability: Send {
    /// Whether `target` can be gathered during `tick`.
    fn is_available(&self, target: &TargetId, tick: u64) -> bool;

    /// Called after `player` successfully gathered from `target`.
    fn on_gathered(
        &mut self,
        _player: PlayerId,
        _target: &TargetId,
        _respawn_ticks: Option<u64>,
        _tick: u64,
    ) {
    }
}

/// Every target is always available.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysAvailable;

impl NodeAvailability for AlwaysAvailable {
    fn is_available(&self, _target: &TargetId, _tick: u64) -> bool {
        true
    }
}

/// Shared table of depleted targets and the tick they come back.
#[derive(Debug, Clone, Default)]
pub struct RespawnTimers {
    depleted_until: Arc<Mutex<BTreeMap<TargetId, u64>>>,
}

impl RespawnTimers {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `target` unavailable until `respawn_ticks` after `now`.
    pub fn deplete(&self, target: TargetId, now: u64, respawn_ticks: u64) {
        let until = now.saturating_add(respawn_ticks);
        self.table().insert(target, until);
    }

    fn table(&self) -> std::sync::MutexGuard<'_, BTreeMap<TargetId, u64>> {
        self.depleted_until
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl NodeAvailability for RespawnTimers {
    fn is_available(&self, target: &TargetId, tick: u64) -> bool {
        self.table().get(target).is_none_or(|until| tick >= *until)
    }

    fn on_gathered(
        &mut self,
        player: PlayerId,
        target: &TargetId,
        respawn_ticks: Option<u64>,
        tick: u64,
    ) {
        let Some(respawn_ticks) = respawn_ticks else {
            return;
        };
        let until = tick.saturating_add(respawn_ticks);
        let mut table = self.table();
        table.retain(|_, respawn_at| *respawn_at > tick);
        table.insert(target.clone(), until);
        debug!(player = %player, target = %target, until, "Target depleted");
    }
}
