//! Node Configuration
//!
//! Settings for a trusted node hosting several games. Loaded from the
//! environment or a JSON document; anything missing falls back to the
//! defaults.

use serde::{Serialize, Deserialize};

use crate::error::{GameError, GameResult};
use crate::game::engine::GameConfig;

/// Trusted node configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Maximum number of games held at once.
    pub max_games: usize,
    /// Log filter used when `RUST_LOG` is not set.
    pub log_level: String,
    /// Game settings used when a caller does not supply its own.
    pub default_game: GameConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            max_games: 64,
            log_level: "info".to_string(),
            default_game: GameConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_games: env_parse("NODE_MAX_GAMES").unwrap_or(defaults.max_games),
            log_level: std::env::var("NODE_LOG_LEVEL").unwrap_or(defaults.log_level),
            default_game: GameConfig {
                player_count: env_parse("NODE_PLAYER_COUNT")
                    .unwrap_or(defaults.default_game.player_count),
                werewolf_count: env_parse("NODE_WEREWOLF_COUNT")
                    .unwrap_or(defaults.default_game.werewolf_count),
                ..defaults.default_game
            },
        }
    }

    /// Parse configuration from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Check the settings.
    pub fn validate(&self) -> GameResult<()> {
        if self.max_games == 0 {
            return Err(GameError::InvalidConfig("max_games must be at least 1".into()));
        }
        self.default_game.validate()
    }
}

fn env_parse(key: &str) -> Option<usize> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::RoleOrder;

    #[test]
    fn test_defaults_are_valid() {
        let config = NodeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_game.role_order, RoleOrder::Shuffled);
        assert!(config.default_game.end_on_win);
    }

    #[test]
    fn test_from_json_partial() {
        let config = NodeConfig::from_json(
            r#"{"max_games": 4, "default_game": {"player_count": 10, "werewolf_count": 3}}"#,
        )
        .unwrap();

        assert_eq!(config.max_games, 4);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.default_game.player_count, 10);
        assert_eq!(config.default_game.werewolf_count, 3);
        assert!(config.default_game.end_on_win);
    }

    #[test]
    fn test_from_json_role_order() {
        let config = NodeConfig::from_json(r#"{"default_game": {"role_order": "Sequential"}}"#).unwrap();
        assert_eq!(config.default_game.role_order, RoleOrder::Sequential);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = NodeConfig { max_games: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(GameError::InvalidConfig(_))));

        let config = NodeConfig {
            default_game: GameConfig::new(4, 4),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(GameError::InvalidConfig(_))));
    }

    #[test]
    fn test_from_env() {
        std::env::set_var("NODE_MAX_GAMES", "9");
        std::env::set_var("NODE_PLAYER_COUNT", "not a number");
        let config = NodeConfig::from_env();
        std::env::remove_var("NODE_MAX_GAMES");
        std::env::remove_var("NODE_PLAYER_COUNT");

        assert_eq!(config.max_games, 9);
        assert_eq!(config.default_game.player_count, GameConfig::default().player_count);
    }
}
