//! Active-session registry for one engine.
//!
//! Only players with a live session have an entry, so a tick pass costs
//! O(active sessions) and idle players cost nothing. Iteration is in player
//! id order, which keeps seeded runs reproducible.

use std::collections::BTreeMap;
use std::sync::Arc;

use skilling_types::{ActivityFamily, PlayerId, SessionState, TargetId, ToolTierId};

use crate::catalog::{GatherTarget, ToolTier};
use crate::formula::ActivityFormula;

/// One player's in-progress gathering activity.
///
/// Tool and target rows are shared with the catalog, never copied.
#[derive(Debug)]
pub struct GatheringSession<F: ActivityFormula> {
    /// Owner of the session.
    pub player_id: PlayerId,
    /// Tool tier the session was started with.
    pub tool: Arc<F::Tool>,
    /// Target being gathered.
    pub target: Arc<F::Target>,
    /// Whether the first roll has happened yet.
    pub state: SessionState,
    /// Tick at which the next roll is due.
    pub next_attempt_tick: u64,
    /// Tick the session was created on.
    pub created_at_tick: u64,
    /// Tick of the most recent roll.
    pub last_roll_tick: Option<u64>,
}

impl<F: ActivityFormula> GatheringSession<F> {
    /// Whether a roll is due at `tick` and none has been made this tick.
    pub fn is_due(&self, tick: u64) -> bool {
        self.next_attempt_tick <= tick && self.last_roll_tick != Some(tick)
    }

    /// Owned, formula-independent view of the session.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            player_id: self.player_id,
            family: F::FAMILY,
            tool_tier: self.tool.id().clone(),
            target_id: self.target.id().clone(),
            state: self.state,
            next_attempt_tick: self.next_attempt_tick,
            created_at_tick: self.created_at_tick,
        }
    }
}

/// Owned view of a session, independent of the engine's formula type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Owner of the session.
    pub player_id: PlayerId,
    /// Family of the engine holding the session.
    pub family: ActivityFamily,
    /// Tool tier key.
    pub tool_tier: ToolTierId,
    /// Target key.
    pub target_id: TargetId,
    /// Current state.
    pub state: SessionState,
    /// Tick at which the next roll is due.
    pub next_attempt_tick: u64,
    /// Tick the session was created on.
    pub created_at_tick: u64,
}

/// Player-keyed map of active sessions.
#[derive(Debug)]
pub struct SessionRegistry<F: ActivityFormula> {
    sessions: BTreeMap<PlayerId, GatheringSession<F>>,
}

impl<F: ActivityFormula> Default for SessionRegistry<F> {
    fn default() -> Self {
        Self {
            sessions: BTreeMap::new(),
        }
    }
}

impl<F: ActivityFormula> SessionRegistry<F> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a session, returning the one it replaced.
    pub fn insert(&mut self, session: GatheringSession<F>) -> Option<GatheringSession<F>> {
        self.sessions.insert(session.player_id, session)
    }

    /// Remove and return a player's session.
    pub fn remove(&mut self, player: &PlayerId) -> Option<GatheringSession<F>> {
        self.sessions.remove(player)
    }

    /// Borrow a player's session.
    pub fn get(&self, player: &PlayerId) -> Option<&GatheringSession<F>> {
        self.sessions.get(player)
    }

    /// Mutably borrow a player's session.
    pub fn get_mut(&mut self, player: &PlayerId) -> Option<&mut GatheringSession<F>> {
        self.sessions.get_mut(player)
    }

    /// Number of active sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether there are no active sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Players whose session is due at `tick`, captured up front so the
    /// pass is unaffected by sessions added or removed while it runs.
    pub fn due(&self, tick: u64) -> Vec<PlayerId> {
        self.sessions
            .values()
            .filter(|session| session.is_due(tick))
            .map(|session| session.player_id)
            .collect()
    }
}
