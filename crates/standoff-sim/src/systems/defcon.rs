//! DEFCON / phase state machine (§4.4).
//!
//! `lobby → placement(5) → escalation(4) → (3) → (2) → launch(1) → ended`.
//! Only forward transitions: timer expiry, or an authorized debug jump.

use standoff_core::enums::SessionPhase;
use standoff_core::events::SimEvent;
use standoff_core::state::GameSession;

fn phase_for_defcon(level: u8) -> SessionPhase {
    match level {
        5 => SessionPhase::Placement,
        4 | 3 | 2 => SessionPhase::Escalation,
        _ => SessionPhase::Launch,
    }
}

/// Advance the DEFCON timer by `dt_ms` (already scaled by `gameSpeed` by the
/// caller). Decrements and resets the timer on expiry, emitting
/// `defcon_change`; DEFCON 1's expiry is left for `endgame` to observe.
pub fn step(session: &mut GameSession, dt_ms: u64, events: &mut Vec<SimEvent>) {
    if session.phase == SessionPhase::Ended {
        return;
    }

    if session.defcon_ms_remaining > dt_ms {
        session.defcon_ms_remaining -= dt_ms;
        return;
    }

    if session.defcon_level > 1 {
        session.defcon_level -= 1;
        session.defcon_ms_remaining = session.config.defcon_duration_secs(session.defcon_level) * 1000;
        session.phase = phase_for_defcon(session.defcon_level);
        events.push(SimEvent::DefconChange {
            new_level: session.defcon_level,
        });
    } else {
        session.defcon_ms_remaining = 0;
    }
}

/// Force-advance one level, as if its timer had just expired (debug `advance_defcon`).
pub fn force_advance(session: &mut GameSession, events: &mut Vec<SimEvent>) {
    session.defcon_ms_remaining = 0;
    step(session, 0, events);
}

/// Jump directly to `level` (debug `set_defcon`), clamped to the valid range.
/// Only a forward (decreasing) jump is honoured, per §4.4's "forward on timer
/// expiry, or jump-forward via authorized debug command".
pub fn force_set(session: &mut GameSession, level: u8, events: &mut Vec<SimEvent>) {
    let level = level.clamp(1, 5);
    if level >= session.defcon_level {
        return;
    }
    session.defcon_level = level;
    session.defcon_ms_remaining = session.config.defcon_duration_secs(level) * 1000;
    session.phase = phase_for_defcon(level);
    events.push(SimEvent::DefconChange { new_level: level });
}

/// Zero the current timer so the next `step` call performs the transition
/// (debug `skip_timer`).
pub fn skip_timer(session: &mut GameSession) {
    session.defcon_ms_remaining = 0;
}

#[cfg(test)]
mod tests {
    use super::*;
    use standoff_core::config::SessionConfig;

    fn session_with(defcon_level: u8, remaining_ms: u64) -> GameSession {
        GameSession {
            id: "s".into(),
            clock: Default::default(),
            phase: phase_for_defcon(defcon_level),
            defcon_level,
            defcon_ms_remaining: remaining_ms,
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
        }
    }

    #[test]
    fn timer_counts_down_without_transition() {
        let mut session = session_with(5, 1000);
        let mut events = Vec::new();
        step(&mut session, 100, &mut events);
        assert_eq!(session.defcon_level, 5);
        assert_eq!(session.defcon_ms_remaining, 900);
        assert!(events.is_empty());
    }

    #[test]
    fn expiry_decrements_level_and_resets_timer() {
        let mut session = session_with(5, 50);
        let mut events = Vec::new();
        step(&mut session, 100, &mut events);
        assert_eq!(session.defcon_level, 4);
        assert_eq!(session.phase, SessionPhase::Escalation);
        assert_eq!(
            session.defcon_ms_remaining,
            session.config.defcon_escalation_secs * 1000
        );
        assert_eq!(events.len(), 1);
        matches!(events[0], SimEvent::DefconChange { new_level: 4 });
    }

    #[test]
    fn defcon_one_does_not_decrement_further() {
        let mut session = session_with(1, 0);
        let mut events = Vec::new();
        step(&mut session, 100, &mut events);
        assert_eq!(session.defcon_level, 1);
        assert!(events.is_empty());
    }

    #[test]
    fn defcon_never_increases_across_many_steps() {
        let mut session = session_with(5, 10);
        let mut events = Vec::new();
        let mut last = session.defcon_level;
        for _ in 0..500 {
            step(&mut session, 50, &mut events);
            assert!(session.defcon_level <= last);
            last = session.defcon_level;
        }
    }

    #[test]
    fn force_set_only_honours_forward_jumps() {
        let mut session = session_with(4, 500);
        let mut events = Vec::new();
        force_set(&mut session, 5, &mut events);
        assert_eq!(session.defcon_level, 4, "backward jump must be ignored");
        assert!(events.is_empty());

        force_set(&mut session, 1, &mut events);
        assert_eq!(session.defcon_level, 1);
        assert_eq!(session.phase, SessionPhase::Launch);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn skip_timer_then_step_performs_transition() {
        let mut session = session_with(5, 99_999);
        skip_timer(&mut session);
        let mut events = Vec::new();
        step(&mut session, 0, &mut events);
        assert_eq!(session.defcon_level, 4);
        assert_eq!(events.len(), 1);
    }
}
