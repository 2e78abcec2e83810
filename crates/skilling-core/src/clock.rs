//! Tick clock driving every gathering engine.
//!
//! The clock owns a monotonically increasing tick counter and an ordered
//! list of callbacks. Each tick increments the counter and then runs every
//! callback synchronously, in registration order, before the tick counts
//! as complete.
//!
//! # Scheduling
//!
//! Scheduling is fixed-delay, not fixed-rate: the next tick is due
//! `tick_interval` after the previous tick's callbacks returned. A slow
//! callback delays later ticks but never causes a skipped or doubled tick,
//! and wall-clock time lost to a stall is not caught up.
//!
//! A panicking callback is logged and skipped for that tick; the remaining
//! callbacks still run and the loop keeps ticking.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Default wall-clock length of one tick in milliseconds.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 600;

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,

    /// Invalid clock configuration (e.g. a zero tick interval).
    #[error("invalid clock configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },

    /// `start` was called outside a Tokio runtime.
    #[error("tick clock must be started from within a Tokio runtime")]
    NoRuntime,
}

/// Work performed once per tick.
///
/// Callbacks run on the clock's task and must not block on I/O. Any
/// `FnMut(u64) + Send` closure is a callback.
pub trait TickCallback: Send {
    /// Called with the number of the tick that just started.
    fn on_tick(&mut self, tick: u64);
}

impl<F> TickCallback for F
where
    F: FnMut(u64) + Send,
{
    fn on_tick(&mut self, tick: u64) {
        self(tick);
    }
}

/// State shared between the clock handle and its background task.
struct ClockShared {
    tick: AtomicU64,
    running: AtomicBool,
    interval: Duration,
    /// Holding this lock for the whole tick serializes ticks.
    callbacks: Mutex<Vec<Box<dyn TickCallback>>>,
}

impl ClockShared {
    fn advance(&self) -> Result<u64, ClockError> {
        let mut callbacks = self
            .callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let tick = self
            .tick
            .load(Ordering::Acquire)
            .checked_add(1)
            .ok_or(ClockError::TickOverflow)?;
        self.tick.store(tick, Ordering::Release);

        for (index, callback) in callbacks.iter_mut().enumerate() {
            if panic::catch_unwind(AssertUnwindSafe(|| callback.on_tick(tick))).is_err() {
                error!(tick, callback = index, "Tick callback panicked");
            }
        }
        Ok(tick)
    }
}

/// Fixed-delay tick clock.
///
/// Cheap to share behind an [`Arc`]; all methods take `&self`.
pub struct TickClock {
    shared: Arc<ClockShared>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl core::fmt::Debug for TickClock {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TickClock")
            .field("tick", &self.tick())
            .field("running", &self.is_running())
            .field("interval", &self.shared.interval)
            .finish_non_exhaustive()
    }
}

impl TickClock {
    /// Create a stopped clock at tick 0.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if `tick_interval_ms` is 0.
    pub fn new(tick_interval_ms: u64) -> Result<Self, ClockError> {
        if tick_interval_ms == 0 {
            return Err(ClockError::InvalidConfig {
                reason: "tick_interval_ms must be at least 1".to_owned(),
            });
        }
        Ok(Self {
            shared: Arc::new(ClockShared {
                tick: AtomicU64::new(0),
                running: AtomicBool::new(false),
                interval: Duration::from_millis(tick_interval_ms),
                callbacks: Mutex::new(Vec::new()),
            }),
            task: Mutex::new(None),
        })
    }

    /// Return the number of the last tick that started (0 before the first).
    pub fn tick(&self) -> u64 {
        self.shared.tick.load(Ordering::Acquire)
    }

    /// Return the delay between the end of one tick and the start of the next.
    pub fn tick_interval(&self) -> Duration {
        self.shared.interval
    }

    /// Whether the background tick loop is running.
    pub fn is_running(&self) -> bool {
        let task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        self.shared.running.load(Ordering::Acquire)
            && task.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Append a callback. It runs after every previously registered one.
    ///
    /// Must not be called from inside a callback.
    pub fn register(&self, callback: impl TickCallback + 'static) {
        self.shared
            .callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(callback));
    }

    /// Run one tick immediately, independent of the background loop.
    ///
    /// Returns the new tick number once every callback has returned.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the counter would exceed
    /// `u64::MAX`.
    pub fn advance(&self) -> Result<u64, ClockError> {
        self.shared.advance()
    }

    /// Start the background tick loop.
    ///
    /// Idempotent: returns `Ok(false)` without side effects if the loop is
    /// already running. A loop whose task has exited is replaced.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::NoRuntime`] when called outside a Tokio runtime.
    pub fn start(&self) -> Result<bool, ClockError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_err| ClockError::NoRuntime)?;

        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        let alive = task.as_ref().is_some_and(|handle| !handle.is_finished());
        if alive && self.shared.running.load(Ordering::Acquire) {
            return Ok(false);
        }
        if let Some(previous) = task.take() {
            if !alive && self.shared.running.load(Ordering::Acquire) {
                warn!(tick = self.tick(), "Tick loop had exited, restarting");
            }
            previous.abort();
        }

        self.shared.running.store(true, Ordering::Release);
        *task = Some(runtime.spawn(run_loop(Arc::clone(&self.shared))));
        drop(task);

        info!(
            tick = self.tick(),
            interval_ms = self.shared.interval.as_millis(),
            "Tick clock started"
        );
        Ok(true)
    }

    /// Stop the background tick loop. No-op if it is not running.
    ///
    /// A tick whose callbacks are already executing completes; no further
    /// tick starts.
    pub fn stop(&self) {
        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        let was_running = self.shared.running.swap(false, Ordering::AcqRel);
        let handle = task.take();
        drop(task);
        if let Some(handle) = handle {
            handle.abort();
        }
        if was_running {
            info!(tick = self.tick(), "Tick clock stopped");
        }
    }
}

impl Drop for TickClock {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Background loop: sleep one interval, then run a full tick.
async fn run_loop(shared: Arc<ClockShared>) {
    loop {
        tokio::time::sleep(shared.interval).await;
        if !shared.running.load(Ordering::Acquire) {
            break;
        }
        match shared.advance() {
            Ok(tick) => debug!(tick, "Tick complete"),
            Err(e) => {
                error!(error = %e, "Tick clock halted");
                shared.running.store(false, Ordering::Release);
                break;
            }
        }
    }
}
