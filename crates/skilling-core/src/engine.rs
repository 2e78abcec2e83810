//! Generic gathering engine.
//!
//! One [`GatheringEngine`] exists per activity family. It owns that
//! family's active sessions and, once per tick, makes exactly one roll for
//! every session that is due:
//!
//! 1. Fetch the player's level and compute the clamped probability `p`.
//! 2. Draw `r` from `[0, 1)`. If `r < p` the roll succeeds: the yield and
//!    XP are granted and the next roll waits the formula's post-success
//!    delay. Otherwise the next roll is on the following tick.
//! 3. A success with a full inventory still consumes the roll; the yield is
//!    discarded (no XP) and the session is rescheduled as on success.
//!
//! A collaborator error isolates to the affected session. An outage is
//! logged and the session is left exactly as it was, so it is retried next
//! tick. A player the collaborators no longer know has their session
//! removed.

use std::sync::Arc;

use skilling_types::{ActivityFamily, PlayerId, RollOutcome, SessionState, TargetId, ToolTierId};
use tracing::{debug, error, info, warn};

use crate::catalog::{CatalogFor, GatherTarget, ToolTier};
use crate::formula::ActivityFormula;
use crate::nodes::{AlwaysAvailable, NodeAvailability};
use crate::registry::{GatheringSession, SessionRegistry, SessionSnapshot};
use crate::rng::RollSource;
use crate::services::{AddItemOutcome, Collaborators, ServiceError};

/// Reasons a session could not be started.
#[derive(Debug, thiserror::Error)]
pub enum StartError {
    /// The tool tier is not in the family's catalog.
    #[error("unknown {family} tool tier {tool:?}")]
    UnknownTool {
        /// Engine family.
        family: ActivityFamily,
        /// Requested tool tier.
        tool: ToolTierId,
    },

    /// The target is not in the family's catalog.
    #[error("unknown {family} target {target:?}")]
    UnknownTarget {
        /// Engine family.
        family: ActivityFamily,
        /// Requested target.
        target: String,
    },

    /// The player's level is below the target's requirement.
    #[error("{family} level {level} is below the {required} required for {target}")]
    InsufficientLevel {
        /// Engine family.
        family: ActivityFamily,
        /// Requested target.
        target: TargetId,
        /// The player's level.
        level: u32,
        /// The target's requirement.
        required: u32,
    },

    /// The player's level is below the tool's requirement.
    #[error("{family} level {level} is below the {required} required for the {tool} tool")]
    ToolBelowRequiredLevel {
        /// Engine family.
        family: ActivityFamily,
        /// Requested tool tier.
        tool: ToolTierId,
        /// The player's level.
        level: u32,
        /// The tool's requirement.
        required: u32,
    },

    /// The target is depleted or respawning.
    #[error("{family} target {target} is unavailable")]
    TargetUnavailable {
        /// Engine family.
        family: ActivityFamily,
        /// Requested target.
        target: TargetId,
    },

    /// No engine is registered for the family.
    #[error("no engine registered for {family}")]
    FamilyNotRegistered {
        /// Requested family.
        family: ActivityFamily,
    },

    /// A collaborator failed while validating the request.
    #[error("collaborator error: {source}")]
    Service {
        /// The underlying collaborator error.
        #[from]
        source: ServiceError,
    },
}

/// Confirmation of a started session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStarted {
    /// Tick of the first roll.
    pub first_attempt_tick: u64,
    /// Whether an existing session in this engine was replaced.
    pub replaced: bool,
}

/// One roll made during a tick pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RollRecord {
    /// Player who rolled.
    pub player_id: PlayerId,
    /// Engine family.
    pub family: ActivityFamily,
    /// Target rolled against.
    pub target_id: TargetId,
    /// Clamped success probability used.
    pub probability: f64,
    /// What happened.
    pub outcome: RollOutcome,
    /// Tick of the following roll.
    pub next_attempt_tick: u64,
}

/// Summary of one engine's tick pass.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TickReport {
    /// The tick that was processed.
    pub tick: u64,
    /// Rolls made, in player id order.
    pub rolls: Vec<RollRecord>,
    /// Sessions removed because their target became unavailable.
    pub exhausted: Vec<PlayerId>,
    /// Sessions skipped because a collaborator failed; retried next tick.
    pub deferred: Vec<PlayerId>,
    /// Sessions removed because the collaborators no longer know the player.
    pub dropped: Vec<PlayerId>,
}

impl TickReport {
    fn empty(tick: u64) -> Self {
        Self {
            tick,
            ..Self::default()
        }
    }

    /// Number of rolls that succeeded (including inventory-full ones).
    pub fn successes(&self) -> usize {
        self.rolls.iter().filter(|r| r.outcome.is_success()).count()
    }
}

/// Object-safe view of an engine, used by the system adapter to hold all
/// four families side by side.
pub trait ActivityEngine: Send {
    /// Family this engine gathers for.
    fn family(&self) -> ActivityFamily;

    /// See [`GatheringEngine::start`].
    fn start(
        &mut self,
        player: PlayerId,
        tool: &str,
        target: &str,
    ) -> Result<SessionStarted, StartError>;

    /// See [`GatheringEngine::cancel`].
    fn cancel(&mut self, player: PlayerId) -> bool;

    /// Owned view of the player's session, if any.
    fn session(&self, player: PlayerId) -> Option<SessionSnapshot>;

    /// Number of active sessions.
    fn active_sessions(&self) -> usize;

    /// See [`GatheringEngine::process_tick`].
    fn process_tick(&mut self, tick: u64) -> TickReport;
}

/// Gathering engine for the family described by `F`.
pub struct GatheringEngine<F: ActivityFormula> {
    catalog: Arc<CatalogFor<F>>,
    sessions: SessionRegistry<F>,
    collaborators: Collaborators,
    rolls: Box<dyn RollSource>,
    nodes: Box<dyn NodeAvailability>,
    /// Last tick passed to `process_tick` (0 before the first).
    current_tick: u64,
}

impl<F: ActivityFormula> core::fmt::Debug for GatheringEngine<F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GatheringEngine")
            .field("family", &F::FAMILY)
            .field("active_sessions", &self.sessions.len())
            .field("current_tick", &self.current_tick)
            .finish_non_exhaustive()
    }
}

impl<F: ActivityFormula> GatheringEngine<F> {
    /// Create an engine with no sessions where every target is available.
    pub fn new(
        catalog: Arc<CatalogFor<F>>,
        collaborators: Collaborators,
        rolls: impl RollSource + 'static,
    ) -> Self {
        Self {
            catalog,
            sessions: SessionRegistry::new(),
            collaborators,
            rolls: Box::new(rolls),
            nodes: Box::new(AlwaysAvailable),
            current_tick: 0,
        }
    }

    /// Replace the target availability policy.
    #[must_use]
    pub fn with_node_availability(mut self, nodes: impl NodeAvailability + 'static) -> Self {
        self.nodes = Box::new(nodes);
        self
    }

    /// Last processed tick.
    pub const fn current_tick(&self) -> u64 {
        self.current_tick
    }

    /// Borrow a player's session.
    pub fn session(&self, player: PlayerId) -> Option<&GatheringSession<F>> {
        self.sessions.get(&player)
    }

    /// Number of active sessions.
    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Start (or restart) a session for `player`.
    ///
    /// Validates the target requirement, then the tool requirement, then
    /// target availability. On success any existing session of the player
    /// in this engine is replaced and the first roll is scheduled
    /// `initial_delay` ticks after the current tick. On failure the existing
    /// session, if any, is left alone.
    ///
    /// # Errors
    ///
    /// Returns a [`StartError`] describing the failed check.
    pub fn start(
        &mut self,
        player: PlayerId,
        tool: &str,
        target: &str,
    ) -> Result<SessionStarted, StartError> {
        let tool_row = self
            .catalog
            .tool(tool)
            .cloned()
            .ok_or_else(|| StartError::UnknownTool {
                family: F::FAMILY,
                tool: ToolTierId::new(tool),
            })?;
        let target_row =
            self.catalog
                .target(target)
                .cloned()
                .ok_or_else(|| StartError::UnknownTarget {
                    family: F::FAMILY,
                    target: target.to_owned(),
                })?;

        let level = self
            .collaborators
            .skills
            .level(player, F::FAMILY.skill_name())?;

        if level < target_row.required_level() {
            return Err(StartError::InsufficientLevel {
                family: F::FAMILY,
                target: target_row.id().clone(),
                level,
                required: target_row.required_level(),
            });
        }
        if level < tool_row.required_level() {
            return Err(StartError::ToolBelowRequiredLevel {
                family: F::FAMILY,
                tool: tool_row.id().clone(),
                level,
                required: tool_row.required_level(),
            });
        }
        if !self.nodes.is_available(target_row.id(), self.current_tick) {
            return Err(StartError::TargetUnavailable {
                family: F::FAMILY,
                target: target_row.id().clone(),
            });
        }

        let delay = tool_row.initial_delay_ticks().max(1);
        let first_attempt_tick = self.current_tick.saturating_add(delay);

        let replaced = self
            .sessions
            .insert(GatheringSession {
                player_id: player,
                tool: tool_row,
                target: Arc::clone(&target_row),
                state: SessionState::AwaitingInitialDelay,
                next_attempt_tick: first_attempt_tick,
                created_at_tick: self.current_tick,
                last_roll_tick: None,
            })
            .is_some();

        info!(
            player = %player,
            family = %F::FAMILY,
            tool,
            target = %target_row.id(),
            first_attempt_tick,
            replaced,
            "Gathering session started"
        );

        Ok(SessionStarted {
            first_attempt_tick,
            replaced,
        })
    }

    /// Remove the player's session. Idempotent; returns whether one existed.
    pub fn cancel(&mut self, player: PlayerId) -> bool {
        let removed = self.sessions.remove(&player).is_some();
        if removed {
            debug!(player = %player, family = %F::FAMILY, "Gathering session cancelled");
        }
        removed
    }

    /// Make one roll for every session due at `tick`.
    ///
    /// A tick that is not newer than the last processed one is ignored, so
    /// no session can roll twice in the same tick.
    pub fn process_tick(&mut self, tick: u64) -> TickReport {
        if tick <= self.current_tick {
            debug!(
                tick,
                current_tick = self.current_tick,
                family = %F::FAMILY,
                "Stale tick ignored"
            );
            return TickReport::empty(self.current_tick);
        }
        self.current_tick = tick;

        let mut report = TickReport::empty(tick);
        if self.sessions.is_empty() {
            return report;
        }
        for player in self.sessions.due(tick) {
            let Some(session) = self.sessions.get(&player) else {
                continue;
            };
            if !session.is_due(tick) {
                continue;
            }
            let tool = Arc::clone(&session.tool);
            let target = Arc::clone(&session.target);

            if !self.nodes.is_available(target.id(), tick) {
                self.sessions.remove(&player);
                info!(
                    player = %player,
                    family = %F::FAMILY,
                    target = %target.id(),
                    tick,
                    "Target exhausted, session ended"
                );
                report.exhausted.push(player);
                continue;
            }

            match self.roll(player, &tool, &target, tick) {
                Ok((probability, outcome)) => {
                    let delay = if outcome.is_success() {
                        F::post_success_delay(&tool).max(1)
                    } else {
                        1
                    };
                    let next_attempt_tick = tick.saturating_add(delay);
                    if let Some(session) = self.sessions.get_mut(&player) {
                        session.state = SessionState::Rolling;
                        session.next_attempt_tick = next_attempt_tick;
                        session.last_roll_tick = Some(tick);
                    }
                    report.rolls.push(RollRecord {
                        player_id: player,
                        family: F::FAMILY,
                        target_id: target.id().clone(),
                        probability,
                        outcome,
                        next_attempt_tick,
                    });
                }
                Err(ServiceError::UnknownPlayer(_)) => {
                    self.sessions.remove(&player);
                    warn!(
                        player = %player,
                        family = %F::FAMILY,
                        tick,
                        "Player no longer known, session ended"
                    );
                    report.dropped.push(player);
                }
                Err(e) => {
                    warn!(
                        player = %player,
                        family = %F::FAMILY,
                        tick,
                        error = %e,
                        "Roll skipped, collaborator failed; retrying next tick"
                    );
                    report.deferred.push(player);
                }
            }
        }

        if !report.rolls.is_empty() {
            debug!(
                tick,
                family = %F::FAMILY,
                rolls = report.rolls.len(),
                successes = report.successes(),
                "Tick pass complete"
            );
        }
        report
    }

    /// Evaluate one roll and apply its grants.
    ///
    /// Errors returned here happen before anything was granted.
    fn roll(
        &mut self,
        player: PlayerId,
        tool: &F::Tool,
        target: &F::Target,
        tick: u64,
    ) -> Result<(f64, RollOutcome), ServiceError> {
        let skill = F::FAMILY.skill_name();
        let level = self.collaborators.skills.level(player, skill)?;
        let probability = F::probability(level, tool, target);

        let r = self.rolls.unit();
        if r >= probability {
            debug!(player = %player, family = %F::FAMILY, tick, probability, r, "Roll missed");
            return Ok((probability, RollOutcome::Missed));
        }

        let amount = target
            .yield_range()
            .map_or(1, |range| self.rolls.between(range.min, range.max));

        match self
            .collaborators
            .inventory
            .try_add_item(player, target.item(), amount)?
        {
            AddItemOutcome::Full => {
                debug!(
                    player = %player,
                    family = %F::FAMILY,
                    item = target.item(),
                    amount,
                    "Inventory full, yield discarded"
                );
                Ok((probability, RollOutcome::InventoryFull { amount }))
            }
            AddItemOutcome::Added => {
                match self
                    .collaborators
                    .skills
                    .grant_xp(player, skill, target.xp())
                {
                    Ok(Some(new_level)) => {
                        info!(player = %player, skill, new_level, "Level up");
                    }
                    Ok(None) => {}
                    Err(e) => {
                        error!(
                            player = %player,
                            skill,
                            xp = target.xp(),
                            error = %e,
                            "Item granted but XP award failed"
                        );
                    }
                }
                self.collaborators.persistence.mark_dirty(player);
                self.nodes
                    .on_gathered(player, target.id(), target.respawn_ticks(), tick);
                debug!(
                    player = %player,
                    family = %F::FAMILY,
                    item = target.item(),
                    amount,
                    tick,
                    "Resource gathered"
                );
                Ok((probability, RollOutcome::Gathered { amount }))
            }
        }
    }
}

impl<F: ActivityFormula> ActivityEngine for GatheringEngine<F> {
    fn family(&self) -> ActivityFamily {
        F::FAMILY
    }

    fn start(
        &mut self,
        player: PlayerId,
        tool: &str,
        target: &str,
    ) -> Result<SessionStarted, StartError> {
        GatheringEngine::start(self, player, tool, target)
    }

    fn cancel(&mut self, player: PlayerId) -> bool {
        GatheringEngine::cancel(self, player)
    }

    fn session(&self, player: PlayerId) -> Option<SessionSnapshot> {
        self.sessions.get(&player).map(GatheringSession::snapshot)
    }

    fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    fn process_tick(&mut self, tick: u64) -> TickReport {
        GatheringEngine::process_tick(self, tick)
    }
}
