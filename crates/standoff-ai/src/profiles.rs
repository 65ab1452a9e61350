//! Per-territory placement templates for the scripted AI (§4.9).
//!
//! The AI doesn't plan; it runs a fixed build order against its territory's
//! catalog `startingPositions`, cycling through building types the same way
//! it cycles through targets at DEFCON 1.

use standoff_catalog::catalog::TerritoryDef;
use standoff_core::commands::PlaceableBuildingType;
use standoff_core::types::GeoPos;

const BUILD_ORDER: [PlaceableBuildingType; 4] = [
    PlaceableBuildingType::Silo,
    PlaceableBuildingType::Radar,
    PlaceableBuildingType::Silo,
    PlaceableBuildingType::Airfield,
];

/// One step of the AI's placement plan for a territory.
pub struct PlacementStep {
    pub building_type: PlaceableBuildingType,
    pub position: GeoPos,
}

/// Build the ordered placement plan for a territory, cycling through
/// `startingPositions` if the build order is longer than the available
/// positions.
pub fn placement_plan(territory: &TerritoryDef) -> Vec<PlacementStep> {
    if territory.starting_positions.is_empty() {
        return Vec::new();
    }
    BUILD_ORDER
        .iter()
        .enumerate()
        .map(|(i, building_type)| PlacementStep {
            building_type: *building_type,
            position: territory.starting_positions[i % territory.starting_positions.len()],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_territory() -> TerritoryDef {
        TerritoryDef {
            id: "t".into(),
            name: "T".into(),
            boundary_polygon: Vec::new(),
            city_ids: Vec::new(),
            starting_positions: vec![GeoPos::new(1.0, 1.0), GeoPos::new(2.0, 2.0)],
        }
    }

    #[test]
    fn plan_cycles_through_available_positions() {
        let plan = placement_plan(&sample_territory());
        assert_eq!(plan.len(), BUILD_ORDER.len());
        assert_eq!(plan[0].position, plan[2].position);
        assert_eq!(plan[1].position, plan[3].position);
    }

    #[test]
    fn plan_is_empty_without_starting_positions() {
        let mut territory = sample_territory();
        territory.starting_positions.clear();
        assert!(placement_plan(&territory).is_empty());
    }
}
