//! Planets, zone grids, and player saves.
//!
//! A planet's type, size, and zones are pure functions of its id and never
//! change after creation. Buildings and resources are the mutable part and
//! are what the production engine advances.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::building::Building;
use crate::resources::ResourceStorage;

/// Planet classification, chosen from temperature and moisture noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlanetType {
    Mountain,
    Swamp,
    Frozen,
    Lava,
    Arid,
    Tropical,
    Tundra,
}

/// All planet types for iteration.
pub const ALL_PLANET_TYPES: [PlanetType; 7] = [
    PlanetType::Mountain,
    PlanetType::Swamp,
    PlanetType::Frozen,
    PlanetType::Lava,
    PlanetType::Arid,
    PlanetType::Tropical,
    PlanetType::Tundra,
];

/// What a zone cell supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ZoneType {
    Mining,
    Power,
    Agricultural,
    Wasteland,
}

/// One cell of a planet's zone grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    #[serde(rename = "type")]
    pub zone_type: ZoneType,
}

impl Zone {
    pub fn new(zone_type: ZoneType) -> Self {
        Self { zone_type }
    }
}

/// `size` rows of `size` zones, indexed `[y][x]`.
pub type ZoneGrid = Vec<Vec<Zone>>;

/// Orthogonal neighbour offsets: left, right, up, down.
pub const ORTHOGONAL_NEIGHBORS: [IVec2; 4] = [IVec2::NEG_X, IVec2::X, IVec2::NEG_Y, IVec2::Y];

/// An owned (or ownable) planet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Planet {
    /// `<galaxyId>_<position>`, e.g. `N1E1_11`.
    pub id: String,
    pub galaxy_id: String,
    /// Slot index 0..grid² within the galaxy.
    pub position: u32,
    #[serde(rename = "type")]
    pub planet_type: PlanetType,
    pub size: u32,
    pub owner_id: Option<String>,
    pub zones: ZoneGrid,
    pub buildings: Vec<Building>,
    pub resources: ResourceStorage,
}

impl Planet {
    pub fn in_bounds(&self, cell: IVec2) -> bool {
        let size = self.size as i32;
        cell.x >= 0 && cell.y >= 0 && cell.x < size && cell.y < size
    }

    pub fn zone_at(&self, x: u32, y: u32) -> Option<ZoneType> {
        self.zones
            .get(y as usize)
            .and_then(|row| row.get(x as usize))
            .map(|zone| zone.zone_type)
    }

    pub fn building_at(&self, x: u32, y: u32) -> Option<&Building> {
        self.buildings
            .iter()
            .find(|b| b.position_x == x && b.position_y == y)
    }

    /// Building at a signed cell; out-of-bounds cells have none.
    pub fn building_at_cell(&self, cell: IVec2) -> Option<&Building> {
        if cell.x < 0 || cell.y < 0 {
            return None;
        }
        self.building_at(cell.x as u32, cell.y as u32)
    }

    pub fn building(&self, building_id: &str) -> Option<&Building> {
        self.buildings.iter().find(|b| b.id == building_id)
    }

    pub fn building_mut(&mut self, building_id: &str) -> Option<&mut Building> {
        self.buildings.iter_mut().find(|b| b.id == building_id)
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id.as_deref() == Some(user_id)
    }

    /// First cell holding two buildings, if the one-per-cell rule is broken.
    pub fn find_duplicate_cell(&self) -> Option<(u32, u32)> {
        let mut seen = std::collections::HashSet::with_capacity(self.buildings.len());
        self.buildings
            .iter()
            .map(Building::cell)
            .find(|cell| !seen.insert(*cell))
    }
}

/// Persisted snapshot of everything a player owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSave {
    pub user_id: String,
    pub planets: Vec<Planet>,
    /// Unix milliseconds of the last save or offline claim.
    pub last_save_time: i64,
}

impl GameSave {
    pub fn new(user_id: impl Into<String>, planets: Vec<Planet>, now: i64) -> Self {
        Self {
            user_id: user_id.into(),
            planets,
            last_save_time: now,
        }
    }

    pub fn planet(&self, planet_id: &str) -> Option<&Planet> {
        self.planets.iter().find(|p| p.id == planet_id)
    }

    /// Replace the stored copy of a planet, if present.
    pub fn replace_planet(&mut self, planet: Planet) -> bool {
        match self.planets.iter_mut().find(|p| p.id == planet.id) {
            Some(slot) => {
                *slot = planet;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::building::{Building, BuildingType};

    fn planet() -> Planet {
        Planet {
            id: "N1E1_0".into(),
            galaxy_id: "N1E1".into(),
            position: 0,
            planet_type: PlanetType::Arid,
            size: 4,
            owner_id: Some("alice".into()),
            zones: vec![vec![Zone::new(ZoneType::Mining); 4]; 4],
            buildings: Vec::new(),
            resources: ResourceStorage::zero(),
        }
    }

    #[test]
    fn bounds_and_zone_lookup() {
        let p = planet();
        assert!(p.in_bounds(IVec2::new(3, 3)));
        assert!(!p.in_bounds(IVec2::new(4, 0)));
        assert!(!p.in_bounds(IVec2::new(-1, 0)));
        assert_eq!(p.zone_at(1, 2), Some(ZoneType::Mining));
        assert_eq!(p.zone_at(4, 0), None);
    }

    #[test]
    fn finds_duplicate_cells() {
        let mut p = planet();
        let planet_id = p.id.clone();
        let b = |id: &str| {
            Building::new_construction(id.into(), planet_id.clone(), BuildingType::MiningDrill, 1, 1, 0)
        };
        p.buildings.push(b("a"));
        assert_eq!(p.find_duplicate_cell(), None);
        p.buildings.push(b("b"));
        assert_eq!(p.find_duplicate_cell(), Some((1, 1)));
    }

    #[test]
    fn ownership_check() {
        let mut p = planet();
        assert!(p.is_owned_by("alice"));
        assert!(!p.is_owned_by("bob"));
        p.owner_id = None;
        assert!(!p.is_owned_by("alice"));
    }

    #[test]
    fn save_round_trips_through_json() {
        let save = GameSave::new("alice", vec![planet()], 1_700_000_000_000);
        let json = serde_json::to_string(&save).unwrap();
        assert!(json.contains("\"lastSaveTime\""));
        assert!(json.contains("\"ownerId\":\"alice\""));
        let back: GameSave = serde_json::from_str(&json).unwrap();
        assert_eq!(back, save);
    }
}
