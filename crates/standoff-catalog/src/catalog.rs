//! Static game data: territories, cities, the hacking network topology, and
//! the per-`HackType` progress/trace curves (§3, §4.7, §9).
//!
//! Loaded once at server startup from a JSON document (§4.2's lobby host may
//! only override `SessionConfig`, not the catalog itself — the catalog is
//! server-operator configuration, not per-lobby).

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use standoff_core::entities::{City, HackingConnection, HackingNode, Territory};
use standoff_core::enums::HackType;
use standoff_core::types::GeoPos;

use crate::error::CatalogError;

const DEFAULT_CATALOG_JSON: &str = include_str!("../assets/default_catalog.json");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerritoryDef {
    pub id: String,
    pub name: String,
    pub boundary_polygon: Vec<GeoPos>,
    pub city_ids: Vec<String>,
    pub starting_positions: Vec<GeoPos>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityDef {
    pub id: String,
    pub territory_id: String,
    pub position: GeoPos,
    pub population: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HackNodeDef {
    pub id: String,
    pub position: GeoPos,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HackLinkDef {
    pub node_a: String,
    pub node_b: String,
}

/// Progress-per-tick and trace-per-tick for one `HackType` (§9 Open Question:
/// these curves are data, not hardcoded per-type constants).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HackCurveDef {
    pub progress_per_tick: f64,
    pub trace_per_tick: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub territories: Vec<TerritoryDef>,
    pub cities: Vec<CityDef>,
    pub hacking_nodes: Vec<HackNodeDef>,
    pub hacking_links: Vec<HackLinkDef>,
    pub hack_curves: HashMap<HackType, HackCurveDef>,
}

impl Catalog {
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, CatalogError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Built-in catalog shipped with the server, so it runs with no
    /// `--catalog` flag supplied.
    pub fn embedded() -> Self {
        Self::from_json_str(DEFAULT_CATALOG_JSON)
            .expect("embedded default catalog is valid JSON")
    }

    pub fn territory_ids(&self) -> Vec<&str> {
        self.territories.iter().map(|t| t.id.as_str()).collect()
    }

    pub fn territory(&self, id: &str) -> Option<&TerritoryDef> {
        self.territories.iter().find(|t| t.id == id)
    }

    pub fn hack_curve(&self, hack_type: HackType) -> Option<HackCurveDef> {
        self.hack_curves.get(&hack_type).copied()
    }

    /// Fresh, unowned `Territory` entities for a new session.
    pub fn build_territories(&self) -> HashMap<String, Territory> {
        self.territories
            .iter()
            .map(|def| {
                (
                    def.id.clone(),
                    Territory {
                        id: def.id.clone(),
                        name: def.name.clone(),
                        boundary_polygon: def.boundary_polygon.clone(),
                        city_ids: def.city_ids.clone(),
                        starting_positions: def.starting_positions.clone(),
                        owner_id: None,
                    },
                )
            })
            .collect()
    }

    /// Fresh, undamaged `City` entities for a new session.
    pub fn build_cities(&self) -> HashMap<String, City> {
        self.cities
            .iter()
            .map(|def| {
                (
                    def.id.clone(),
                    City {
                        id: def.id.clone(),
                        territory_id: def.territory_id.clone(),
                        geo_position: def.position,
                        population: def.population,
                        max_population: def.population,
                        destroyed: false,
                    },
                )
            })
            .collect()
    }

    pub fn build_hacking_nodes(&self) -> HashMap<String, HackingNode> {
        self.hacking_nodes
            .iter()
            .map(|def| {
                (
                    def.id.clone(),
                    HackingNode {
                        id: def.id.clone(),
                        position: def.position,
                        owner_id: None,
                        up: true,
                    },
                )
            })
            .collect()
    }

    pub fn build_hacking_connections(&self) -> Vec<HackingConnection> {
        self.hacking_links
            .iter()
            .map(|def| HackingConnection {
                node_a: def.node_a.clone(),
                node_b: def.node_b.clone(),
                up: true,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_catalog_parses() {
        let catalog = Catalog::embedded();
        assert!(!catalog.territories.is_empty());
        assert!(!catalog.cities.is_empty());
    }

    #[test]
    fn every_city_belongs_to_a_listed_territory() {
        let catalog = Catalog::embedded();
        let territory_ids: std::collections::HashSet<_> =
            catalog.territories.iter().map(|t| t.id.as_str()).collect();
        for city in &catalog.cities {
            assert!(
                territory_ids.contains(city.territory_id.as_str()),
                "city {} references unknown territory {}",
                city.id,
                city.territory_id
            );
        }
    }

    #[test]
    fn every_territory_city_id_resolves_to_a_real_city() {
        let catalog = Catalog::embedded();
        let city_ids: std::collections::HashSet<_> =
            catalog.cities.iter().map(|c| c.id.as_str()).collect();
        for territory in &catalog.territories {
            for city_id in &territory.city_ids {
                assert!(
                    city_ids.contains(city_id.as_str()),
                    "territory {} references unknown city {}",
                    territory.id,
                    city_id
                );
            }
        }
    }

    #[test]
    fn every_hack_type_has_a_curve() {
        let catalog = Catalog::embedded();
        for hack_type in [
            HackType::BlindRadar,
            HackType::DelaySilo,
            HackType::RevealTarget,
            HackType::DisableSatelliteComm,
        ] {
            assert!(
                catalog.hack_curve(hack_type).is_some(),
                "missing hack curve for {hack_type:?}"
            );
        }
    }

    #[test]
    fn hacking_links_reference_real_nodes() {
        let catalog = Catalog::embedded();
        let node_ids: std::collections::HashSet<_> =
            catalog.hacking_nodes.iter().map(|n| n.id.as_str()).collect();
        for link in &catalog.hacking_links {
            assert!(node_ids.contains(link.node_a.as_str()));
            assert!(node_ids.contains(link.node_b.as_str()));
        }
    }

    #[test]
    fn build_cities_copies_population_into_max_population() {
        let catalog = Catalog::embedded();
        let cities = catalog.build_cities();
        for def in &catalog.cities {
            let city = &cities[&def.id];
            assert_eq!(city.population, def.population);
            assert_eq!(city.max_population, def.population);
            assert!(!city.destroyed);
        }
    }
}
