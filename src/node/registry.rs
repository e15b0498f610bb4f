//! Game Registry
//!
//! Holds every game the node is running, keyed by game identifier. Each
//! game sits behind its own lock so operations on different games never
//! contend; operations on one game serialize on its lock.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::core::hash::{hash_with_domain, short_hex, Digest};
use crate::error::{GameError, GameResult};
use crate::game::engine::{Game, GameConfig};
use crate::game::state::{GameId, Phase};
use crate::node::config::NodeConfig;
use crate::proof::commitment::MasterSecret;
use crate::proof::verify::Verifier;

const GAME_ID_DOMAIN: &[u8] = b"WEREWOLF_GAME_ID_V1";

/// Shared handle to one game.
pub type GameHandle = Arc<RwLock<Game>>;

/// Registry entry.
struct GameEntry {
    game: GameHandle,
    created_at: DateTime<Utc>,
}

/// Summary of a registered game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSummary {
    /// Game identifier.
    pub id: GameId,
    /// Current phase.
    pub phase: Phase,
    /// Current round.
    pub round: u32,
    /// Live players.
    pub alive: usize,
    /// When the game was registered with this node.
    pub created_at: DateTime<Utc>,
}

/// Games hosted by one trusted node.
pub struct GameRegistry {
    config: NodeConfig,
    verifier: Arc<dyn Verifier>,
    games: RwLock<BTreeMap<GameId, GameEntry>>,
}

impl GameRegistry {
    /// Create an empty registry backed by `verifier`.
    pub fn new(config: NodeConfig, verifier: Arc<dyn Verifier>) -> Self {
        Self {
            config,
            verifier,
            games: RwLock::new(BTreeMap::new()),
        }
    }

    /// Node configuration.
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Fresh random game identifier.
    pub fn generate_game_id() -> GameId {
        let id = uuid::Uuid::new_v4();
        hash_with_domain(GAME_ID_DOMAIN, id.as_bytes())
    }

    /// Create a game in `Lobby` under `id`.
    ///
    /// An existing game under the same id is replaced only when it is in
    /// `Lobby` or `Finished`. Uses the node's default game settings when
    /// `config` is `None`.
    pub async fn create_game(
        &self,
        id: GameId,
        config: Option<GameConfig>,
        master: &MasterSecret,
        admin_key: Digest,
    ) -> GameResult<GameHandle> {
        let config = config.unwrap_or_else(|| self.config.default_game.clone());
        let mut games = self.games.write().await;

        match games.get(&id) {
            Some(entry) => {
                let phase = entry.game.read().await.phase();
                if !phase.allows_new_game() {
                    return Err(GameError::InvalidConfig(format!(
                        "game {} is still in {}",
                        short_hex(&id),
                        phase
                    )));
                }
            }
            None if games.len() >= self.config.max_games => {
                return Err(GameError::InvalidConfig(format!(
                    "node already holds {} games",
                    games.len()
                )));
            }
            None => {}
        }

        let game = Game::create(id, config, master, admin_key, self.verifier.clone())?;
        let handle = Arc::new(RwLock::new(game));
        games.insert(id, GameEntry {
            game: handle.clone(),
            created_at: Utc::now(),
        });

        info!("Registered game {} ({} hosted)", short_hex(&id), games.len());
        Ok(handle)
    }

    /// Create a game and register it with the verifier.
    pub async fn create_and_start(
        &self,
        id: GameId,
        config: Option<GameConfig>,
        master: &MasterSecret,
        admin_key: Digest,
    ) -> GameResult<GameHandle> {
        let handle = self.create_game(id, config, master, admin_key).await?;
        handle.write().await.start()?;
        Ok(handle)
    }

    /// Look up a game.
    pub async fn get_game(&self, id: &GameId) -> GameResult<GameHandle> {
        let games = self.games.read().await;
        games
            .get(id)
            .map(|entry| entry.game.clone())
            .ok_or_else(|| GameError::UnknownGame(hex::encode(id)))
    }

    /// (phase, round) of a game.
    pub async fn game_state(&self, id: &GameId) -> GameResult<(Phase, u32)> {
        let game = self.get_game(id).await?;
        let state = game.read().await.state();
        Ok(state)
    }

    /// Summaries of every hosted game, in id order.
    pub async fn summaries(&self) -> Vec<GameSummary> {
        let games = self.games.read().await;
        let mut out = Vec::with_capacity(games.len());
        for (id, entry) in games.iter() {
            let game = entry.game.read().await;
            out.push(GameSummary {
                id: *id,
                phase: game.phase(),
                round: game.round(),
                alive: game.alive_players().len(),
                created_at: entry.created_at,
            });
        }
        out
    }

    /// Remove a game. Returns whether it existed.
    pub async fn remove_game(&self, id: &GameId) -> bool {
        let mut games = self.games.write().await;
        games.remove(id).is_some()
    }

    /// Number of hosted games.
    pub async fn game_count(&self) -> usize {
        let games = self.games.read().await;
        games.len()
    }

    /// Drop finished games. Returns how many were removed.
    pub async fn cleanup_finished(&self) -> usize {
        let mut games = self.games.write().await;
        let mut to_remove = Vec::new();

        for (id, entry) in games.iter() {
            if entry.game.read().await.phase() == Phase::Finished {
                to_remove.push(*id);
            }
        }

        for id in &to_remove {
            games.remove(id);
        }

        debug!("Cleaned up {} finished games", to_remove.len());
        to_remove.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proof::ledger::InMemoryLedger;

    fn master() -> MasterSecret {
        MasterSecret::from_bytes([21; 32])
    }

    fn registry(max_games: usize) -> GameRegistry {
        let config = NodeConfig {
            max_games,
            default_game: GameConfig::new(5, 1),
            ..Default::default()
        };
        GameRegistry::new(config, Arc::new(InMemoryLedger::new()))
    }

    #[tokio::test]
    async fn test_create_get_remove() {
        let registry = registry(4);
        let id = GameRegistry::generate_game_id();

        registry.create_game(id, None, &master(), [0; 32]).await.unwrap();
        assert_eq!(registry.game_count().await, 1);
        assert_eq!(registry.game_state(&id).await, Ok((Phase::Lobby, 0)));

        let game = registry.get_game(&id).await.unwrap();
        assert_eq!(game.read().await.player_count(), 5);

        assert!(registry.remove_game(&id).await);
        assert!(!registry.remove_game(&id).await);
        assert!(matches!(registry.get_game(&id).await, Err(GameError::UnknownGame(_))));
    }

    #[tokio::test]
    async fn test_generated_ids_differ() {
        assert_ne!(GameRegistry::generate_game_id(), GameRegistry::generate_game_id());
    }

    #[tokio::test]
    async fn test_active_game_cannot_be_replaced() {
        let registry = registry(4);
        let id = [1; 32];

        registry.create_and_start(id, None, &master(), [0; 32]).await.unwrap();
        assert_eq!(registry.game_state(&id).await, Ok((Phase::Night, 0)));

        let again = registry.create_game(id, None, &master(), [0; 32]).await;
        assert!(matches!(again, Err(GameError::InvalidConfig(_))));

        let game = registry.get_game(&id).await.unwrap();
        game.write().await.force_end_game(&master()).unwrap();

        registry.create_and_start(id, None, &master(), [0; 32]).await.unwrap();
        assert_eq!(registry.game_state(&id).await, Ok((Phase::Night, 0)));
    }

    #[tokio::test]
    async fn test_lobby_game_can_be_replaced() {
        let registry = registry(4);
        let id = [2; 32];

        registry.create_game(id, None, &master(), [0; 32]).await.unwrap();
        let replaced = registry
            .create_game(id, Some(GameConfig::new(8, 2)), &master(), [0; 32])
            .await
            .unwrap();

        assert_eq!(replaced.read().await.player_count(), 8);
        assert_eq!(registry.game_count().await, 1);
    }

    #[tokio::test]
    async fn test_capacity() {
        let registry = registry(2);
        registry.create_game([1; 32], None, &master(), [0; 32]).await.unwrap();
        registry.create_game([2; 32], None, &master(), [0; 32]).await.unwrap();

        let full = registry.create_game([3; 32], None, &master(), [0; 32]).await;
        assert!(matches!(full, Err(GameError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_games_are_independent() {
        let registry = registry(4);
        let a = registry.create_and_start([1; 32], None, &master(), [0; 32]).await.unwrap();
        let b = registry.create_and_start([2; 32], None, &master(), [0; 32]).await.unwrap();

        a.write().await.resolve_night().unwrap();

        assert_eq!(a.read().await.state(), (Phase::Day, 1));
        assert_eq!(b.read().await.state(), (Phase::Night, 0));
    }

    #[tokio::test]
    async fn test_cleanup_finished() {
        let registry = registry(4);
        let a = registry.create_game([1; 32], None, &master(), [0; 32]).await.unwrap();
        registry.create_game([2; 32], None, &master(), [0; 32]).await.unwrap();

        a.write().await.force_end_game(&master()).unwrap();

        assert_eq!(registry.cleanup_finished().await, 1);
        assert_eq!(registry.game_count().await, 1);

        let summaries = registry.summaries().await;
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].id, [2; 32]);
        assert_eq!(summaries[0].phase, Phase::Lobby);
        assert_eq!(summaries[0].alive, 5);
    }

    #[tokio::test]
    async fn test_invalid_game_config() {
        let registry = registry(4);
        let result = registry.create_game([1; 32], Some(GameConfig::new(3, 3)), &master(), [0; 32]).await;
        assert!(matches!(result, Err(GameError::InvalidConfig(_))));
        assert_eq!(registry.game_count().await, 0);
    }
}
