//! Building types, the static building table, and placed building state.
//!
//! [`BuildingSpec::get`] is the single source of production, cost, and
//! placement rules. Validation of player actions and the production engine
//! both read from it, so the two can never drift apart.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::planet::ZoneType;
use crate::resources::{ResourceAmounts, ResourceStorage, ResourceType};

/// Kinds of buildings a player can place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BuildingType {
    // Tier 1 production
    MiningDrill,
    PowerPlant,
    HydroponicFarm,
    // Tier 2 processing
    Refinery,
    Transformer,
    FoodProcessor,
    // Utility
    ResidentialBlock,
    SystemFortress,
    ColonyShipyard,
}

/// All building types for iteration.
pub const ALL_BUILDING_TYPES: [BuildingType; 9] = [
    BuildingType::MiningDrill,
    BuildingType::PowerPlant,
    BuildingType::HydroponicFarm,
    BuildingType::Refinery,
    BuildingType::Transformer,
    BuildingType::FoodProcessor,
    BuildingType::ResidentialBlock,
    BuildingType::SystemFortress,
    BuildingType::ColonyShipyard,
];

/// Static configuration for one building type.
#[derive(Debug, Clone, Copy)]
pub struct BuildingSpec {
    pub building_type: BuildingType,
    pub name: &'static str,
    pub cost: ResourceAmounts,
    /// Construction time in seconds for level 1.
    pub build_time_secs: u32,
    pub input: ResourceAmounts,
    pub output: ResourceAmounts,
    /// Production cycles per second. Scales both input and output.
    pub rate: f64,
    pub required_zone: ZoneType,
    pub max_level: u32,
}

use ResourceType::*;

static BUILDING_TABLE: [BuildingSpec; 9] = [
    BuildingSpec {
        building_type: BuildingType::MiningDrill,
        name: "Mining Drill",
        cost: &[(Minerals, 50.0), (Energy, 20.0)],
        build_time_secs: 10,
        input: &[],
        output: &[(Minerals, 2.0)],
        rate: 1.0,
        required_zone: ZoneType::Mining,
        max_level: 5,
    },
    BuildingSpec {
        building_type: BuildingType::PowerPlant,
        name: "Power Plant",
        cost: &[(Minerals, 40.0), (Energy, 10.0)],
        build_time_secs: 10,
        input: &[],
        output: &[(Energy, 2.0)],
        rate: 1.0,
        required_zone: ZoneType::Power,
        max_level: 5,
    },
    BuildingSpec {
        building_type: BuildingType::HydroponicFarm,
        name: "Hydroponic Farm",
        cost: &[(Minerals, 30.0), (Energy, 15.0)],
        build_time_secs: 10,
        input: &[],
        output: &[(Food, 2.0)],
        rate: 1.0,
        required_zone: ZoneType::Agricultural,
        max_level: 5,
    },
    BuildingSpec {
        building_type: BuildingType::Refinery,
        name: "Refinery",
        cost: &[(Minerals, 100.0), (Energy, 50.0)],
        build_time_secs: 20,
        input: &[(Minerals, 3.0)],
        output: &[(Alloys, 1.0)],
        rate: 1.0,
        required_zone: ZoneType::Mining,
        max_level: 5,
    },
    BuildingSpec {
        building_type: BuildingType::Transformer,
        name: "Transformer",
        cost: &[(Minerals, 80.0), (Energy, 40.0)],
        build_time_secs: 20,
        input: &[(Energy, 3.0)],
        output: &[(PowerCells, 1.0)],
        rate: 1.0,
        required_zone: ZoneType::Power,
        max_level: 5,
    },
    BuildingSpec {
        building_type: BuildingType::FoodProcessor,
        name: "Food Processor",
        cost: &[(Minerals, 70.0), (Energy, 30.0)],
        build_time_secs: 20,
        input: &[(Food, 3.0)],
        output: &[(ConsumerGoods, 1.0)],
        rate: 1.0,
        required_zone: ZoneType::Agricultural,
        max_level: 5,
    },
    BuildingSpec {
        building_type: BuildingType::ResidentialBlock,
        name: "Residential Block",
        cost: &[(Minerals, 100.0), (Energy, 50.0), (Food, 50.0)],
        build_time_secs: 30,
        input: &[],
        output: &[],
        rate: 0.0,
        required_zone: ZoneType::Agricultural,
        max_level: 10,
    },
    BuildingSpec {
        building_type: BuildingType::SystemFortress,
        name: "System Fortress",
        cost: &[(Minerals, 500.0), (Energy, 300.0), (Alloys, 100.0)],
        build_time_secs: 60,
        input: &[],
        output: &[],
        rate: 0.0,
        required_zone: ZoneType::Mining,
        max_level: 3,
    },
    BuildingSpec {
        building_type: BuildingType::ColonyShipyard,
        name: "Colony Shipyard",
        cost: &[(Minerals, 200.0), (Energy, 150.0), (Alloys, 50.0)],
        build_time_secs: 40,
        input: &[(Minerals, 10.0), (Energy, 10.0), (Alloys, 5.0)],
        output: &[(ColonyShips, 1.0)],
        // One ship every ten seconds
        rate: 0.1,
        required_zone: ZoneType::Mining,
        max_level: 5,
    },
];

impl BuildingSpec {
    /// Look up the table entry for a building type.
    pub fn get(building_type: BuildingType) -> &'static BuildingSpec {
        // Table rows follow the enum's declaration order.
        &BUILDING_TABLE[building_type as usize]
    }

    /// The whole table, in [`ALL_BUILDING_TYPES`] order.
    pub fn table() -> &'static [BuildingSpec] {
        &BUILDING_TABLE
    }

    /// Cost of reaching `level` (level 1 is the initial build).
    pub fn cost_for_level(&self, level: u32) -> ResourceStorage {
        let mut cost = ResourceStorage::zero();
        cost.add_scaled(&ResourceStorage::from_amounts(self.cost), level.max(1) as f64);
        cost
    }

    /// Construction time in milliseconds for reaching `level`.
    pub fn build_millis_for_level(&self, level: u32) -> i64 {
        self.build_time_secs as i64 * 1000 * level.max(1) as i64
    }
}

/// Lifecycle of a placed building. Only `Active` buildings produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BuildingStatus {
    Constructing,
    Upgrading,
    Active,
}

/// Snapshot of a building's production rule, carried on the building for
/// clients. The engine always reads the static table, never this copy.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionSpec {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub input: BTreeMap<ResourceType, f64>,
    pub output: BTreeMap<ResourceType, f64>,
    pub rate_per_second: f64,
}

impl From<&BuildingSpec> for ProductionSpec {
    fn from(spec: &BuildingSpec) -> Self {
        Self {
            input: spec.input.iter().copied().collect(),
            output: spec.output.iter().copied().collect(),
            rate_per_second: spec.rate,
        }
    }
}

/// A building placed on a planet's zone grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Building {
    pub id: String,
    pub planet_id: String,
    #[serde(rename = "type")]
    pub building_type: BuildingType,
    pub level: u32,
    pub position_x: u32,
    pub position_y: u32,
    pub status: BuildingStatus,
    /// Unix milliseconds.
    pub construction_start: i64,
    /// Unix milliseconds.
    pub construction_end: i64,
    pub production: ProductionSpec,
    /// Derived each tick from neighbours; informational only.
    #[serde(default)]
    pub adjacency_bonus: f64,
}

impl Building {
    /// A fresh level-1 building in the `Constructing` state.
    pub fn new_construction(
        id: String,
        planet_id: String,
        building_type: BuildingType,
        x: u32,
        y: u32,
        now: i64,
    ) -> Self {
        let spec = BuildingSpec::get(building_type);
        Self {
            id,
            planet_id,
            building_type,
            level: 1,
            position_x: x,
            position_y: y,
            status: BuildingStatus::Constructing,
            construction_start: now,
            construction_end: now + spec.build_millis_for_level(1),
            production: ProductionSpec::from(spec),
            adjacency_bonus: 0.0,
        }
    }

    pub fn spec(&self) -> &'static BuildingSpec {
        BuildingSpec::get(self.building_type)
    }

    pub fn is_active(&self) -> bool {
        self.status == BuildingStatus::Active
    }

    /// Finish construction or upgrade once `now` has reached the end time.
    /// Returns `true` if the status changed. Active buildings are untouched.
    pub fn advance_status(&mut self, now: i64) -> bool {
        match self.status {
            BuildingStatus::Constructing | BuildingStatus::Upgrading
                if now >= self.construction_end =>
            {
                self.status = BuildingStatus::Active;
                true
            }
            _ => false,
        }
    }

    pub fn cell(&self) -> (u32, u32) {
        (self.position_x, self.position_y)
    }
}
