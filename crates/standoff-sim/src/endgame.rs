//! End-of-game detection and final scoring (§4.11).
//!
//! The session ends the instant only one player is left alive, or the
//! DEFCON 1 timer expires with more than one still standing — in which
//! case the highest score wins, with ties producing a draw (`None`).

use standoff_core::enums::SessionPhase;
use standoff_core::events::SimEvent;
use standoff_core::state::{GameSession, ScoreEntry};

/// Check end-of-game conditions and, if met, transition to `Ended` and emit
/// `GameEnd`. A no-op once already ended.
pub fn check(session: &mut GameSession, events: &mut Vec<SimEvent>) {
    if session.phase == SessionPhase::Ended {
        return;
    }

    let alive_ids: Vec<String> = session.players.values().filter(|p| p.is_alive()).map(|p| p.id.clone()).collect();
    let timer_expired = session.defcon_level == 1 && session.defcon_ms_remaining == 0;

    if alive_ids.len() > 1 && !timer_expired {
        return;
    }

    session.phase = SessionPhase::Ended;
    let winner_id = determine_winner(session, &alive_ids);
    events.push(SimEvent::GameEnd { winner_id });
}

fn determine_winner(session: &GameSession, alive_ids: &[String]) -> Option<String> {
    if alive_ids.len() == 1 {
        return Some(alive_ids[0].clone());
    }
    if alive_ids.is_empty() {
        return None;
    }

    let max_score = alive_ids.iter().filter_map(|id| session.players.get(id)).map(|p| p.score).max()?;
    let leaders: Vec<&String> = alive_ids
        .iter()
        .filter(|id| session.players.get(id.as_str()).map(|p| p.score) == Some(max_score))
        .collect();
    (leaders.len() == 1).then(|| leaders[0].clone())
}

/// Final per-player score lines for the `game_end` message (§4.11).
pub fn final_scores(session: &GameSession) -> Vec<ScoreEntry> {
    session
        .players
        .values()
        .map(|p| ScoreEntry {
            player_id: p.id.clone(),
            score: p.score,
            enemy_kills: p.enemy_kills,
            population_remaining: p.population_remaining,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use standoff_core::config::SessionConfig;
    use standoff_core::entities::Player;

    fn session_with_players(pops: &[(&str, u64, i64)]) -> GameSession {
        let mut session = GameSession {
            id: "s".into(),
            clock: Default::default(),
            phase: SessionPhase::Launch,
            defcon_level: 1,
            defcon_ms_remaining: 0,
            game_speed: 1,
            players: Default::default(),
            territories: Default::default(),
            cities: Default::default(),
            buildings: Default::default(),
            missiles: Default::default(),
            satellites: Default::default(),
            hacking_nodes: Default::default(),
            hacking_connections: Default::default(),
            hacking_traces: Default::default(),
            config: SessionConfig::default(),
        };
        for (id, pop, score) in pops {
            let mut player = Player::new(*id, *id, false);
            player.population_remaining = *pop;
            player.score = *score;
            session.players.insert(id.to_string(), player);
        }
        session
    }

    #[test]
    fn last_survivor_wins() {
        let mut session = session_with_players(&[("p1", 1000, 0), ("p2", 0, 0)]);
        let mut events = Vec::new();
        check(&mut session, &mut events);
        assert_eq!(session.phase, SessionPhase::Ended);
        assert!(matches!(events[0], SimEvent::GameEnd { winner_id: Some(ref id) } if id == "p1"));
    }

    #[test]
    fn defcon_one_expiry_breaks_tie_by_score() {
        let mut session = session_with_players(&[("p1", 500, 100), ("p2", 500, 40)]);
        session.defcon_ms_remaining = 0;
        let mut events = Vec::new();
        check(&mut session, &mut events);
        assert!(matches!(events[0], SimEvent::GameEnd { winner_id: Some(ref id) } if id == "p1"));
    }

    #[test]
    fn tied_score_at_defcon_one_expiry_is_a_draw() {
        let mut session = session_with_players(&[("p1", 500, 50), ("p2", 500, 50)]);
        session.defcon_ms_remaining = 0;
        let mut events = Vec::new();
        check(&mut session, &mut events);
        assert!(matches!(events[0], SimEvent::GameEnd { winner_id: None }));
    }

    #[test]
    fn game_continues_with_multiple_survivors_and_live_timer() {
        let mut session = session_with_players(&[("p1", 500, 0), ("p2", 500, 0)]);
        session.defcon_ms_remaining = 5_000;
        let mut events = Vec::new();
        check(&mut session, &mut events);
        assert_eq!(session.phase, SessionPhase::Launch);
        assert!(events.is_empty());
    }
}
