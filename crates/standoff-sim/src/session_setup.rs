//! Builds a fresh `GameSession` from the catalog, a resolved `SessionConfig`,
//! and the lobby's finalized member list (§4.2 "start" effect).

use standoff_catalog::Catalog;
use standoff_core::config::SessionConfig;
use standoff_core::entities::Player;
use standoff_core::enums::SessionPhase;
use standoff_core::state::GameSession;
use standoff_core::types::SimClock;

/// One finalized lobby member, ready to become a `Player`.
pub struct SessionMember {
    pub player_id: String,
    pub name: String,
    pub territory_id: String,
    pub is_ai: bool,
}

/// Construct the initial `GameSession` for a starting lobby.
pub fn build_session(
    session_id: String,
    catalog: &Catalog,
    config: SessionConfig,
    members: &[SessionMember],
) -> GameSession {
    let mut territories = catalog.build_territories();
    let cities = catalog.build_cities();

    let mut players = std::collections::HashMap::new();
    for member in members {
        if let Some(territory) = territories.get_mut(&member.territory_id) {
            territory.owner_id = Some(member.player_id.clone());
        }

        let population: u64 = cities
            .values()
            .filter(|c| c.territory_id == member.territory_id)
            .map(|c| c.population)
            .sum();

        let mut player = Player::new(member.player_id.clone(), member.name.clone(), member.is_ai);
        player.territory_id = Some(member.territory_id.clone());
        player.population_remaining = population;
        players.insert(player.id.clone(), player);
    }

    let defcon_ms_remaining = config.defcon_duration_secs(5) * 1000;

    GameSession {
        id: session_id,
        clock: SimClock::default(),
        phase: SessionPhase::Placement,
        defcon_level: 5,
        defcon_ms_remaining,
        game_speed: 1,
        players,
        territories,
        cities,
        buildings: std::collections::HashMap::new(),
        missiles: std::collections::HashMap::new(),
        satellites: std::collections::HashMap::new(),
        hacking_nodes: catalog.build_hacking_nodes(),
        hacking_connections: catalog.build_hacking_connections(),
        hacking_traces: std::collections::HashMap::new(),
        config,
    }
}
