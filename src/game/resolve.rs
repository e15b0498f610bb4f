//! Phase Resolution
//!
//! Pure planning functions: they read a consistent snapshot of the player
//! store and decide what a resolution does, without mutating anything.
//! The engine applies the plan only after the verifier has attested it.

use std::collections::BTreeMap;

use crate::game::state::{PlayerIndex, PlayerRecord, PlayerStore, Winner};

/// Result of resolving a night.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NightOutcome {
    /// Round after the night.
    pub new_round: u32,
    /// Player killed, if any.
    pub victim: Option<PlayerIndex>,
}

impl NightOutcome {
    /// Did someone die?
    pub fn has_death(&self) -> bool {
        self.victim.is_some()
    }
}

/// Result of resolving a day.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DayOutcome {
    /// Votes per target, counting only live voters and live targets.
    pub tally: BTreeMap<PlayerIndex, u32>,
    /// Player eliminated, if one target had strictly the most votes.
    pub eliminated: Option<PlayerIndex>,
}

/// Count pending targets of live players, ignoring targets that are
/// already dead.
fn tally_votes(store: &PlayerStore) -> BTreeMap<PlayerIndex, u32> {
    let mut tally = BTreeMap::new();
    for player in store.alive() {
        if let Some(target) = player.pending_target() {
            let target_alive = store.get(target).map(|t| t.is_alive()).unwrap_or(false);
            if target_alive {
                *tally.entry(target).or_insert(0) += 1;
            }
        }
    }
    tally
}

/// Decide the night victim.
///
/// Live werewolves are scanned in index order; the first one with a
/// pending target on a live player decides the victim.
pub fn plan_night(store: &PlayerStore, round: u32) -> NightOutcome {
    let victim = store
        .alive()
        .filter(|p| p.role().is_werewolf())
        .filter_map(PlayerRecord::pending_target)
        .find(|&target| store.get(target).map(|t| t.is_alive()).unwrap_or(false));

    NightOutcome {
        new_round: round + 1,
        victim,
    }
}

/// Decide the day elimination.
///
/// The target with strictly the most votes is eliminated. A tie for the
/// maximum eliminates no one.
pub fn plan_day(store: &PlayerStore) -> DayOutcome {
    let tally = tally_votes(store);

    let max = tally.values().copied().max().unwrap_or(0);
    let mut leaders = tally.iter().filter(|(_, &votes)| votes == max);
    let eliminated = match (leaders.next(), leaders.next()) {
        (Some((&target, _)), None) => Some(target),
        _ => None,
    };

    DayOutcome { tally, eliminated }
}

/// Evaluate the win conditions, pretending `dying` is already dead.
pub fn check_winner(store: &PlayerStore, dying: Option<PlayerIndex>) -> Option<Winner> {
    let (mut wolves, mut others) = store.alive_by_team();

    if let Some(player) = dying.and_then(|i| store.get(i).ok()).filter(|p| p.is_alive()) {
        if player.role().is_werewolf() {
            wolves -= 1;
        } else {
            others -= 1;
        }
    }

    if wolves == 0 {
        Some(Winner::Villagers)
    } else if wolves >= others {
        Some(Winner::Werewolves)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::RoleOrder;
    use crate::proof::commitment::MasterSecret;

    /// Sequential store: indices `0..wolves` are werewolves.
    fn store(count: usize, wolves: usize) -> PlayerStore {
        let master = MasterSecret::from_bytes([8; 32]);
        PlayerStore::create_players(count, wolves, RoleOrder::Sequential, &master, &[0; 32]).unwrap()
    }

    #[test]
    fn test_night_without_werewolf_action() {
        let mut players = store(5, 1);
        // Villagers acting at night do not kill.
        players.mark_acted(2, 3).unwrap();
        players.mark_acted(3, 4).unwrap();

        let outcome = plan_night(&players, 1);
        assert_eq!(outcome, NightOutcome { new_round: 2, victim: None });
        assert!(!outcome.has_death());
    }

    #[test]
    fn test_night_single_werewolf() {
        let mut players = store(5, 1);
        players.mark_acted(0, 3).unwrap();

        let outcome = plan_night(&players, 0);
        assert_eq!(outcome.victim, Some(3));
        assert_eq!(outcome.new_round, 1);
    }

    #[test]
    fn test_night_first_werewolf_decides() {
        let mut players = store(9, 3);
        players.mark_acted(0, 5).unwrap();
        players.mark_acted(1, 6).unwrap();
        players.mark_acted(2, 6).unwrap();

        // Werewolf 0 is found first, even though 6 has more werewolf votes.
        assert_eq!(plan_night(&players, 1).victim, Some(5));
    }

    #[test]
    fn test_night_skips_werewolves_without_target() {
        let mut players = store(8, 3);
        players.mark_acted(2, 7).unwrap();
        players.mark_acted(1, 5).unwrap();

        assert_eq!(plan_night(&players, 1).victim, Some(5));
    }

    #[test]
    fn test_night_skips_dead_target() {
        let mut players = store(8, 2);
        players.mark_acted(0, 6).unwrap();
        players.mark_acted(1, 4).unwrap();
        players.kill(6).unwrap();

        assert_eq!(plan_night(&players, 1).victim, Some(4));
    }

    #[test]
    fn test_night_dead_werewolf_ignored() {
        let mut players = store(6, 2);
        players.mark_acted(0, 4).unwrap();
        players.kill(0).unwrap();

        assert_eq!(plan_night(&players, 1).victim, None);
    }

    #[test]
    fn test_day_clear_majority() {
        let mut players = store(6, 1);
        // {A: 3, B: 1} with A = 2, B = 4
        players.mark_acted(0, 2).unwrap();
        players.mark_acted(1, 2).unwrap();
        players.mark_acted(3, 2).unwrap();
        players.mark_acted(2, 4).unwrap();

        let outcome = plan_day(&players);
        assert_eq!(outcome.eliminated, Some(2));
        assert_eq!(outcome.tally.get(&2), Some(&3));
        assert_eq!(outcome.tally.get(&4), Some(&1));
    }

    #[test]
    fn test_day_tie_is_no_lynch() {
        let mut players = store(6, 1);
        // {A: 2, B: 2}
        players.mark_acted(0, 2).unwrap();
        players.mark_acted(1, 2).unwrap();
        players.mark_acted(2, 4).unwrap();
        players.mark_acted(3, 4).unwrap();

        assert_eq!(plan_day(&players).eliminated, None);
    }

    #[test]
    fn test_day_no_votes() {
        let players = store(4, 1);
        let outcome = plan_day(&players);
        assert!(outcome.tally.is_empty());
        assert_eq!(outcome.eliminated, None);
    }

    #[test]
    fn test_day_stale_votes_of_dead_players_ignored() {
        let mut players = store(6, 1);
        players.mark_acted(0, 3).unwrap();
        players.mark_acted(1, 3).unwrap();
        players.mark_acted(2, 4).unwrap();
        players.kill(0).unwrap();
        players.kill(1).unwrap();

        let outcome = plan_day(&players);
        assert_eq!(outcome.tally.get(&3), None);
        assert_eq!(outcome.eliminated, Some(4));
    }

    #[test]
    fn test_votes_for_dead_target_ignored() {
        let mut players = store(6, 1);
        players.mark_acted(2, 5).unwrap();
        players.mark_acted(3, 5).unwrap();
        players.mark_acted(4, 1).unwrap();
        players.kill(5).unwrap();

        assert_eq!(plan_day(&players).eliminated, Some(1));
    }

    #[test]
    fn test_winner_conditions() {
        let mut players = store(5, 1);
        assert_eq!(check_winner(&players, None), None);
        assert_eq!(check_winner(&players, Some(0)), Some(Winner::Villagers));

        players.kill(1).unwrap();
        players.kill(2).unwrap();
        // 1 werewolf vs 2 others
        assert_eq!(check_winner(&players, None), None);
        assert_eq!(check_winner(&players, Some(3)), Some(Winner::Werewolves));
    }

    #[test]
    fn test_winner_ignores_already_dead_dying() {
        let mut players = store(5, 1);
        players.kill(2).unwrap();
        assert_eq!(check_winner(&players, Some(2)), None);
    }
}
