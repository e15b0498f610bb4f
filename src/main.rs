//! Werewolf Trusted Node
//!
//! Demo driver: hosts one game against the in-memory ledger, plays it to
//! the end and then audits the role assignment with the master secret.

use std::sync::Arc;

use anyhow::{bail, Context};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use werewolf_node::{
    VERSION,
    core::hash::short_hex,
    game::{expected_roles, Game, Phase, PlayerIndex, Role},
    node::{GameRegistry, NodeConfig},
    proof::{InMemoryLedger, MasterSecret, Verifier},
};

/// Rounds after which the demo gives up and force-ends the game.
const MAX_DEMO_ROUNDS: u32 = 64;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = NodeConfig::from_env();
    config.validate().context("invalid node configuration")?;

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Werewolf Node v{}", VERSION);
    info!(
        "Default game: {} players, {} werewolves, {:?}",
        config.default_game.player_count,
        config.default_game.werewolf_count,
        config.default_game.role_order
    );

    let ledger = Arc::new(InMemoryLedger::new());
    let registry = GameRegistry::new(config.clone(), ledger.clone());

    demo_game(&registry, &ledger).await
}

/// Play one game to the end.
async fn demo_game(registry: &GameRegistry, ledger: &InMemoryLedger) -> anyhow::Result<()> {
    info!("=== Starting Demo Game ===");

    let id = GameRegistry::generate_game_id();
    let master = MasterSecret::generate();
    let admin_key = master.commitment();

    let handle = registry.create_and_start(id, None, &master, admin_key).await?;
    let mut game = handle.write().await;

    info!("Game ID: {}", hex::encode(id));
    info!("Identity root: {}", short_hex(&game.tree_root()));

    // The operator holds the master secret, so it can drive the players.
    let config = game.config().clone();
    let roles = expected_roles(
        config.player_count,
        config.werewolf_count,
        config.role_order,
        &master,
        &id,
    );

    while game.phase() != Phase::Finished {
        if game.round() >= MAX_DEMO_ROUNDS {
            warn!("No winner after {} rounds, ending game", MAX_DEMO_ROUNDS);
            game.force_end_game(&master)?;
            break;
        }

        match game.phase() {
            Phase::Night => play_night(&mut game, &roles)?,
            Phase::Day => play_day(&mut game)?,
            other => bail!("unexpected phase {}", other),
        }

        let attested = game.attested_state()?;
        if attested != game.state() {
            bail!("verifier reports {:?}, node has {:?}", attested, game.state());
        }
    }

    // Print final results
    info!("=== Game Results ===");
    info!("Winner: {:?} after {} rounds", game.winner(), game.round());
    info!("Survivors: {:?}", game.alive_players());
    info!("Events: {}", game.events().len());
    info!("Event log: {} bytes of JSON", game.export_events_json()?.len());

    // Publish the master secret and audit every assignment
    info!("=== Auditing Role Assignment ===");
    let mut audited = 0;
    for (index, role) in roles.iter().enumerate() {
        let local = game.verify_fairness(&master, index, *role);
        let public = ledger.verify_fairness(&id, &master, index, *role);
        if !(local && public) {
            bail!("fairness check failed for player {}", index);
        }
        audited += 1;
    }
    info!("FAIRNESS VERIFIED: {} assignments match their commitments", audited);

    drop(game);
    let removed = registry.cleanup_finished().await;
    info!("Cleaned up {} finished game(s)", removed);

    Ok(())
}

/// Werewolves go for the lowest live villager; everyone else submits a
/// decoy so the number of night actions does not reveal the pack size.
fn play_night(game: &mut Game, roles: &[Role]) -> anyhow::Result<()> {
    let alive = game.alive_players();
    let prey = alive.iter().copied().find(|&i| !roles[i].is_werewolf());

    for &player in &alive {
        let target = match (roles[player].is_werewolf(), prey) {
            (true, Some(prey)) => prey,
            _ => decoy_target(&alive, player),
        };
        game.submit_action(player, target)?;
    }

    let outcome = game.resolve_night()?;
    info!("Night {}: victim {:?}", outcome.new_round, outcome.victim);
    Ok(())
}

/// Everyone votes for the same suspect, rotating with the round.
fn play_day(game: &mut Game) -> anyhow::Result<()> {
    let alive = game.alive_players();
    if alive.is_empty() {
        bail!("day phase with no live players");
    }
    let suspect = alive[game.round() as usize % alive.len()];

    for &player in &alive {
        let target = if player == suspect {
            decoy_target(&alive, player)
        } else {
            suspect
        };
        game.submit_action(player, target)?;
    }

    let outcome = game.resolve_day()?;
    if let Some(index) = outcome.eliminated {
        info!(
            "Day {}: player {} eliminated, revealed {:?}",
            game.round(),
            index,
            game.revealed_role(index)
        );
    } else {
        info!("Day {}: no elimination", game.round());
    }
    Ok(())
}

/// Next live player after `player`, wrapping around.
fn decoy_target(alive: &[PlayerIndex], player: PlayerIndex) -> PlayerIndex {
    alive
        .iter()
        .copied()
        .find(|&i| i > player)
        .or_else(|| alive.first().copied())
        .unwrap_or(player)
}
