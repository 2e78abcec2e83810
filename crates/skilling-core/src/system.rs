//! Multi-family routing on top of the per-family engines.
//!
//! A player performs at most one gathering activity at a time. Starting a
//! session in one family cancels any session the player has in another
//! family, but only once the new start has been accepted.

use std::sync::{Arc, Mutex, PoisonError};

use skilling_types::{ActivityFamily, PlayerId};
use tracing::{debug, info};

use crate::catalog::Catalogs;
use crate::clock::TickCallback;
use crate::engine::{ActivityEngine, GatheringEngine, SessionStarted, StartError, TickReport};
use crate::formula::{Fishing, Harvesting, Mining, Woodcutting};
use crate::registry::SessionSnapshot;
use crate::rng::SeededRolls;
use crate::services::Collaborators;

/// All registered engines, processed in [`ActivityFamily::ALL`] order.
pub struct SkillingSystem {
    engines: Vec<Box<dyn ActivityEngine>>,
}

impl core::fmt::Debug for SkillingSystem {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let families: Vec<ActivityFamily> = self.engines.iter().map(|e| e.family()).collect();
        f.debug_struct("SkillingSystem")
            .field("families", &families)
            .field("active_sessions", &self.active_sessions())
            .finish()
    }
}

/// A system shared between the tick clock and request handlers.
pub type SharedSystem = Arc<Mutex<SkillingSystem>>;

impl SkillingSystem {
    /// Build one engine per family with seeded roll streams.
    pub fn new(catalogs: &Catalogs, collaborators: &Collaborators, world_seed: u64) -> Self {
        let rolls = |family| SeededRolls::for_family(world_seed, family);
        Self::from_engines(vec![
            Box::new(GatheringEngine::<Woodcutting>::new(
                Arc::clone(&catalogs.woodcutting),
                collaborators.clone(),
                rolls(ActivityFamily::Woodcutting),
            )) as Box<dyn ActivityEngine>,
            Box::new(GatheringEngine::<Mining>::new(
                Arc::clone(&catalogs.mining),
                collaborators.clone(),
                rolls(ActivityFamily::Mining),
            )) as Box<dyn ActivityEngine>,
            Box::new(GatheringEngine::<Fishing>::new(
                Arc::clone(&catalogs.fishing),
                collaborators.clone(),
                rolls(ActivityFamily::Fishing),
            )) as Box<dyn ActivityEngine>,
            Box::new(GatheringEngine::<Harvesting>::new(
                Arc::clone(&catalogs.harvesting),
                collaborators.clone(),
                rolls(ActivityFamily::Harvesting),
            )) as Box<dyn ActivityEngine>,
        ])
    }

    /// Assemble a system from custom engines.
    ///
    /// Engines are sorted into family order. A later engine for an already
    /// registered family is dropped.
    pub fn from_engines(mut engines: Vec<Box<dyn ActivityEngine>>) -> Self {
        engines.sort_by_key(|e| e.family());
        engines.dedup_by_key(|e| e.family());
        Self { engines }
    }

    /// Wrap the system for sharing with the clock.
    pub fn into_shared(self) -> SharedSystem {
        Arc::new(Mutex::new(self))
    }

    /// Start a session, cancelling any session the player has in another
    /// family once the start has succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`StartError::FamilyNotRegistered`] if no engine serves the
    /// family, otherwise whatever the engine rejected the start with. On
    /// error the player's existing sessions are untouched.
    pub fn start(
        &mut self,
        family: ActivityFamily,
        player: PlayerId,
        tool: &str,
        target: &str,
    ) -> Result<SessionStarted, StartError> {
        let started = self
            .engine_mut(family)
            .ok_or(StartError::FamilyNotRegistered { family })?
            .start(player, tool, target)?;

        for engine in self.engines.iter_mut().filter(|e| e.family() != family) {
            if engine.cancel(player) {
                info!(
                    player = %player,
                    from = %engine.family(),
                    to = %family,
                    "Switched gathering activity"
                );
            }
        }
        Ok(started)
    }

    /// Cancel the player's session in whichever family holds it.
    pub fn cancel(&mut self, player: PlayerId) -> bool {
        let mut cancelled = false;
        for engine in &mut self.engines {
            cancelled |= engine.cancel(player);
        }
        cancelled
    }

    /// Drop all of a disconnecting player's state.
    pub fn disconnect(&mut self, player: PlayerId) {
        if self.cancel(player) {
            debug!(player = %player, "Session dropped on disconnect");
        }
    }

    /// The player's current session, if any.
    pub fn session(&self, player: PlayerId) -> Option<SessionSnapshot> {
        self.engines.iter().find_map(|e| e.session(player))
    }

    /// Family the player is currently gathering in.
    pub fn active_family(&self, player: PlayerId) -> Option<ActivityFamily> {
        self.session(player).map(|s| s.family)
    }

    /// Total active sessions across every family.
    pub fn active_sessions(&self) -> usize {
        self.engines.iter().map(|e| e.active_sessions()).sum()
    }

    /// Run every engine's tick pass, in family order.
    pub fn process_tick(&mut self, tick: u64) -> Vec<TickReport> {
        self.engines
            .iter_mut()
            .map(|e| e.process_tick(tick))
            .collect()
    }

    fn engine_mut(&mut self, family: ActivityFamily) -> Option<&mut Box<dyn ActivityEngine>> {
        self.engines.iter_mut().find(|e| e.family() == family)
    }
}

/// Clock callback that runs the system's tick pass.
///
/// The lock is held for the whole pass, so start and cancel requests are
/// linearized against it: a cancel either lands before the pass (no roll)
/// or after it.
pub fn tick_callback(system: SharedSystem) -> impl TickCallback {
    move |tick: u64| {
        let reports = system
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .process_tick(tick);
        let rolls: usize = reports.iter().map(|r| r.rolls.len()).sum();
        if rolls > 0 {
            debug!(tick, rolls, "Skilling tick processed");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::clock::TickClock;
    use crate::engine::tests::{FakeStore, ScriptedRolls};

    fn system_with(store: &Arc<FakeStore>) -> SkillingSystem {
        let catalogs = Catalogs::builtin().unwrap();
        SkillingSystem::new(&catalogs, &Collaborators::from_store(store), 42)
    }

    #[test]
    fn switching_family_cancels_previous_session() {
        let player = PlayerId::new();
        let store = FakeStore::with_level(player, "woodcutting", 1);
        store.set_level(player, "fishing", 1);
        let mut system = system_with(&store);

        system
            .start(ActivityFamily::Woodcutting, player, "bronze", "normal")
            .unwrap();
        system
            .start(ActivityFamily::Fishing, player, "basic", "shrimp")
            .unwrap();

        assert_eq!(system.active_family(player), Some(ActivityFamily::Fishing));
        assert_eq!(system.active_sessions(), 1);
    }

    #[test]
    fn rejected_switch_keeps_current_activity() {
        let player = PlayerId::new();
        let store = FakeStore::with_level(player, "woodcutting", 1);
        store.set_level(player, "fishing", 1);
        let mut system = system_with(&store);

        system
            .start(ActivityFamily::Woodcutting, player, "bronze", "normal")
            .unwrap();
        let err = system
            .start(ActivityFamily::Fishing, player, "master", "shrimp")
            .unwrap_err();

        assert!(matches!(err, StartError::ToolBelowRequiredLevel { .. }));
        assert_eq!(
            system.active_family(player),
            Some(ActivityFamily::Woodcutting)
        );
    }

    #[test]
    fn missing_family_is_reported() {
        let player = PlayerId::new();
        let store = FakeStore::with_level(player, "mining", 1);
        let catalogs = Catalogs::builtin().unwrap();
        let wood: Box<dyn ActivityEngine> = Box::new(GatheringEngine::<Woodcutting>::new(
            catalogs.woodcutting,
            Collaborators::from_store(&store),
            ScriptedRolls::default(),
        ));
        let mut system = SkillingSystem::from_engines(vec![wood]);

        let err = system
            .start(ActivityFamily::Mining, player, "bronze", "copper")
            .unwrap_err();
        assert!(matches!(
            err,
            StartError::FamilyNotRegistered {
                family: ActivityFamily::Mining
            }
        ));
    }

    #[test]
    fn disconnect_clears_every_family() {
        let player = PlayerId::new();
        let store = FakeStore::with_level(player, "harvesting", 1);
        let mut system = system_with(&store);
        system
            .start(ActivityFamily::Harvesting, player, "cloth", "potato")
            .unwrap();

        system.disconnect(player);
        assert!(system.session(player).is_none());
        assert!(!system.cancel(player));
    }

    #[test]
    fn every_engine_reports_each_tick() {
        let store = Arc::new(FakeStore::default());
        let mut system = system_with(&store);
        let reports = system.process_tick(1);
        assert_eq!(reports.len(), ActivityFamily::ALL.len());
        assert!(reports.iter().all(|r| r.tick == 1 && r.rolls.is_empty()));
    }

    #[test]
    fn clock_drives_the_system() {
        let player = PlayerId::new();
        let store = FakeStore::with_level(player, "fishing", 60);
        let shared = system_with(&store).into_shared();
        shared
            .lock()
            .unwrap()
            .start(ActivityFamily::Fishing, player, "master", "shrimp")
            .unwrap();

        let clock = TickClock::new(600).unwrap();
        clock.register(tick_callback(Arc::clone(&shared)));
        for _ in 0..3 {
            clock.advance().unwrap();
        }

        let snapshot = shared.lock().unwrap().session(player).unwrap();
        assert_eq!(snapshot.state, skilling_types::SessionState::Rolling);
        assert!(snapshot.next_attempt_tick > 3);
    }
}
