//! Periodic flush of dirty player state.
//!
//! The durable store is outside this server; a flush drains the dirty set
//! and emits each record as a structured log line.

use std::sync::Arc;
use std::time::Duration;

use skilling_players::PlayerStore;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Drain the dirty set once. Returns how many players were flushed.
pub fn flush(store: &PlayerStore) -> usize {
    let dirty = store.drain_dirty();
    for (player, record) in &dirty {
        match serde_json::to_string(record) {
            Ok(json) => debug!(player = %player, record = %json, "Player state flushed"),
            Err(e) => warn!(player = %player, error = %e, "Failed to serialize player state"),
        }
    }
    if !dirty.is_empty() {
        info!(players = dirty.len(), "Persist flush complete");
    }
    dirty.len()
}

/// Flush every `interval` until `shutdown` flips to `true`, then flush a
/// final time.
pub async fn run(store: Arc<PlayerStore>, interval: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(interval);
    // The first tick of a tokio interval completes immediately.
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                flush(&store);
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
    flush(&store);
}
