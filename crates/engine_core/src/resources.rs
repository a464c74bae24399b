//! Resource storage shared by planets, production rates, and rewards.

use serde::{Deserialize, Serialize};

/// The eight tracked resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceType {
    // Primary
    Minerals,
    Energy,
    Food,
    // Secondary
    Alloys,
    PowerCells,
    ConsumerGoods,
    // Reserved for later tiers
    TechComponents,
    ColonyShips,
}

/// All resource types in storage order.
pub const ALL_RESOURCES: [ResourceType; 8] = [
    ResourceType::Minerals,
    ResourceType::Energy,
    ResourceType::Food,
    ResourceType::Alloys,
    ResourceType::PowerCells,
    ResourceType::ConsumerGoods,
    ResourceType::TechComponents,
    ResourceType::ColonyShips,
];

impl ResourceType {
    /// Wire name (matches the serde representation).
    pub fn name(&self) -> &'static str {
        match self {
            ResourceType::Minerals => "minerals",
            ResourceType::Energy => "energy",
            ResourceType::Food => "food",
            ResourceType::Alloys => "alloys",
            ResourceType::PowerCells => "powerCells",
            ResourceType::ConsumerGoods => "consumerGoods",
            ResourceType::TechComponents => "techComponents",
            ResourceType::ColonyShips => "colonyShips",
        }
    }
}

/// A static `(resource, amount)` list, used by the building table.
pub type ResourceAmounts = &'static [(ResourceType, f64)];

/// Amounts of every resource. Used both as a planet's stockpile and as a
/// per-second rate or reward vector, so individual fields may be negative
/// until [`ResourceStorage::clamp_non_negative`] is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceStorage {
    pub minerals: f64,
    pub energy: f64,
    pub food: f64,
    pub alloys: f64,
    pub power_cells: f64,
    pub consumer_goods: f64,
    pub tech_components: f64,
    pub colony_ships: f64,
}

impl ResourceStorage {
    /// All fields zero.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Build a storage from a sparse list of amounts.
    pub fn from_amounts(amounts: &[(ResourceType, f64)]) -> Self {
        let mut storage = Self::zero();
        for &(resource, amount) in amounts {
            *storage.get_mut(resource) += amount;
        }
        storage
    }

    pub fn get(&self, resource: ResourceType) -> f64 {
        match resource {
            ResourceType::Minerals => self.minerals,
            ResourceType::Energy => self.energy,
            ResourceType::Food => self.food,
            ResourceType::Alloys => self.alloys,
            ResourceType::PowerCells => self.power_cells,
            ResourceType::ConsumerGoods => self.consumer_goods,
            ResourceType::TechComponents => self.tech_components,
            ResourceType::ColonyShips => self.colony_ships,
        }
    }

    pub fn get_mut(&mut self, resource: ResourceType) -> &mut f64 {
        match resource {
            ResourceType::Minerals => &mut self.minerals,
            ResourceType::Energy => &mut self.energy,
            ResourceType::Food => &mut self.food,
            ResourceType::Alloys => &mut self.alloys,
            ResourceType::PowerCells => &mut self.power_cells,
            ResourceType::ConsumerGoods => &mut self.consumer_goods,
            ResourceType::TechComponents => &mut self.tech_components,
            ResourceType::ColonyShips => &mut self.colony_ships,
        }
    }

    /// Iterate `(resource, amount)` pairs in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceType, f64)> + '_ {
        ALL_RESOURCES.iter().map(move |&r| (r, self.get(r)))
    }

    /// Add `other × factor` to every field. Does not clamp.
    pub fn add_scaled(&mut self, other: &ResourceStorage, factor: f64) {
        for resource in ALL_RESOURCES {
            *self.get_mut(resource) += other.get(resource) * factor;
        }
    }

    /// Apply a delta and enforce the zero floor on every field.
    /// Overdrawn resources end at exactly zero; the shortfall is forgiven.
    pub fn apply_delta(&mut self, delta: &ResourceStorage, factor: f64) {
        self.add_scaled(delta, factor);
        self.clamp_non_negative();
    }

    pub fn clamp_non_negative(&mut self) {
        for resource in ALL_RESOURCES {
            let value = self.get_mut(resource);
            if *value < 0.0 {
                *value = 0.0;
            }
        }
    }

    /// Whether every field is at least the matching field of `cost`.
    pub fn covers(&self, cost: &ResourceStorage) -> bool {
        ALL_RESOURCES.iter().all(|&r| self.get(r) >= cost.get(r))
    }

    /// Subtract `cost` field by field. Callers check [`Self::covers`] first.
    pub fn deduct(&mut self, cost: &ResourceStorage) {
        self.add_scaled(cost, -1.0);
        self.clamp_non_negative();
    }

    /// First resource that is NaN or infinite, if any.
    pub fn first_non_finite(&self) -> Option<ResourceType> {
        self.iter().find(|(_, v)| !v.is_finite()).map(|(r, _)| r)
    }

    pub fn is_zero(&self) -> bool {
        self.iter().all(|(_, v)| v == 0.0)
    }
}
