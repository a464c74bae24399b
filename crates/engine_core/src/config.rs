//! Tunables for generation and the economy. Plain values; loading them from
//! disk is the binary's job.

use serde::{Deserialize, Serialize};

use crate::resources::{ResourceStorage, ResourceType};

/// Universe generation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniverseConfig {
    /// Base seed every galaxy, planet, and player seed is derived from.
    #[serde(default = "default_global_seed")]
    pub global_seed: u64,
    /// Galaxy side length in slots (9 → 81 slots).
    #[serde(default = "default_grid_size")]
    pub galaxy_grid_size: u32,
    /// Occupancy threshold in [0, 1]: a cell holds a planet when its
    /// normalised density noise falls below this.
    #[serde(default = "default_planet_density")]
    pub planet_density: f64,
    #[serde(default = "default_min_planet_size")]
    pub min_planet_size: u32,
    #[serde(default = "default_max_planet_size")]
    pub max_planet_size: u32,
}

fn default_global_seed() -> u64 {
    42069
}
fn default_grid_size() -> u32 {
    9
}
fn default_planet_density() -> f64 {
    0.6
}
fn default_min_planet_size() -> u32 {
    4
}
fn default_max_planet_size() -> u32 {
    7
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self {
            global_seed: default_global_seed(),
            galaxy_grid_size: default_grid_size(),
            planet_density: default_planet_density(),
            min_planet_size: default_min_planet_size(),
            max_planet_size: default_max_planet_size(),
        }
    }
}

impl UniverseConfig {
    /// Number of slots in one galaxy.
    pub fn slot_count(&self) -> usize {
        (self.galaxy_grid_size * self.galaxy_grid_size) as usize
    }
}

/// Production and offline-reward parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EconomyConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Fraction of normal production granted for offline time, in [0, 1].
    #[serde(default = "default_offline_bonus_rate")]
    pub offline_bonus_rate: f64,
    #[serde(default = "default_max_offline_hours")]
    pub max_offline_hours: u32,
    #[serde(default = "default_starting_resources")]
    pub starting_resources: ResourceStorage,
}

fn default_tick_interval_ms() -> u64 {
    1000
}
fn default_offline_bonus_rate() -> f64 {
    0.25
}
fn default_max_offline_hours() -> u32 {
    24
}
fn default_starting_resources() -> ResourceStorage {
    ResourceStorage::from_amounts(&[
        (ResourceType::Minerals, 500.0),
        (ResourceType::Energy, 500.0),
        (ResourceType::Food, 500.0),
    ])
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            offline_bonus_rate: default_offline_bonus_rate(),
            max_offline_hours: default_max_offline_hours(),
            starting_resources: default_starting_resources(),
        }
    }
}

impl EconomyConfig {
    pub fn tick_interval_secs(&self) -> f64 {
        self.tick_interval_ms as f64 / 1000.0
    }
}
