//! Bot spawner for seeding the server with gathering players.
//!
//! Each `bots` entry in `skilling-config.yaml` connects `count` players at
//! the configured level and starts them gathering. Bots are ordinary
//! players to the engines.

use skilling_core::config::BotConfig;
use skilling_core::system::SkillingSystem;
use skilling_players::PlayerStore;
use skilling_types::PlayerId;
use tracing::info;

use crate::error::ServerError;

/// Connect and start every configured bot.
///
/// # Errors
///
/// Returns [`ServerError::Bot`] for the first bot whose session the engine
/// rejects (unknown tool or target, or a level below a requirement).
pub fn spawn_bots(
    bots: &[BotConfig],
    store: &PlayerStore,
    system: &mut SkillingSystem,
) -> Result<Vec<PlayerId>, ServerError> {
    let mut spawned = Vec::new();
    for bot in bots {
        for _ in 0..bot.count {
            let player = PlayerId::new();
            store.connect(player);
            store
                .update(player, |record| {
                    record.skills.set_level(bot.family.skill_name(), bot.level);
                    Ok(())
                })
                .map_err(|e| ServerError::Bot {
                    family: bot.family,
                    target: bot.target.clone(),
                    source: skilling_core::engine::StartError::Service { source: e.into() },
                })?;
            system
                .start(bot.family, player, bot.tool.as_str(), bot.target.as_str())
                .map_err(|source| ServerError::Bot {
                    family: bot.family,
                    target: bot.target.clone(),
                    source,
                })?;
            spawned.push(player);
        }
        info!(
            family = %bot.family,
            tool = %bot.tool,
            target = %bot.target,
            level = bot.level,
            count = bot.count,
            "Bots gathering"
        );
    }
    Ok(spawned)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use skilling_core::catalog::Catalogs;
    use skilling_core::config::SkillingConfig;
    use skilling_core::services::Collaborators;
    use skilling_players::PlayerDefaults;
    use skilling_types::ActivityFamily;

    use super::*;

    fn world() -> (Arc<PlayerStore>, SkillingSystem) {
        let store = Arc::new(PlayerStore::new(PlayerDefaults::default()));
        let catalogs = Catalogs::builtin().unwrap();
        let system = SkillingSystem::new(&catalogs, &Collaborators::from_store(&store), 1);
        (store, system)
    }

    #[test]
    fn configured_bots_start_gathering() {
        let config = SkillingConfig::parse(
            "
bots:
  - family: mining
    tool: steel
    target: iron
    level: 25
    count: 3
  - family: fishing
    tool: basic
    target: shrimp
",
        )
        .unwrap();
        let (store, mut system) = world();
        let spawned = spawn_bots(&config.bots, &store, &mut system).unwrap();

        assert_eq!(spawned.len(), 4);
        assert_eq!(store.len(), 4);
        assert_eq!(system.active_family(spawned[0]), Some(ActivityFamily::Mining));
        assert_eq!(
            store.record(spawned[0]).unwrap().skills.level("mining"),
            25
        );
        assert_eq!(system.active_family(spawned[3]), Some(ActivityFamily::Fishing));
    }

    #[test]
    fn under_levelled_bot_is_reported() {
        let config = SkillingConfig::parse(
            "
bots:
  - family: woodcutting
    tool: bronze
    target: magic
    level: 10
",
        )
        .unwrap();
        let (store, mut system) = world();
        let err = spawn_bots(&config.bots, &store, &mut system).unwrap_err();
        assert!(matches!(err, ServerError::Bot { family: ActivityFamily::Woodcutting, .. }));
    }
}
