//! Player building actions on a single planet.
//!
//! These functions validate against the static building table and mutate
//! the planet in place. Callers run them under the planet's engine lock.

use engine_core::{
    Building, BuildingSpec, BuildingStatus, BuildingType, GameError, GameResult, IVec2, Planet,
};
use uuid::Uuid;

/// Reject unless `user_id` owns the planet.
pub fn ensure_owner(planet: &Planet, user_id: &str) -> GameResult<()> {
    if planet.is_owned_by(user_id) {
        Ok(())
    } else {
        Err(GameError::NotOwner {
            user: user_id.to_string(),
            planet: planet.id.clone(),
        })
    }
}

/// Place a new level-1 building and pay for it.
pub fn build(
    planet: &mut Planet,
    building_type: BuildingType,
    x: u32,
    y: u32,
    now: i64,
) -> GameResult<Building> {
    if !planet.in_bounds(IVec2::new(x as i32, y as i32)) {
        return Err(GameError::OutOfBounds { x, y });
    }
    if planet.building_at(x, y).is_some() {
        return Err(GameError::CellOccupied { x, y });
    }

    let spec = BuildingSpec::get(building_type);
    let zone = planet.zone_at(x, y).ok_or(GameError::OutOfBounds { x, y })?;
    if zone != spec.required_zone {
        return Err(GameError::ZoneMismatch {
            building: building_type,
            required: spec.required_zone,
            actual: zone,
        });
    }

    let cost = spec.cost_for_level(1);
    if !planet.resources.covers(&cost) {
        return Err(GameError::InsufficientResources);
    }
    planet.resources.deduct(&cost);

    let building = Building::new_construction(
        Uuid::new_v4().to_string(),
        planet.id.clone(),
        building_type,
        x,
        y,
        now,
    );
    log::debug!("{} placed {:?} at ({}, {})", planet.id, building_type, x, y);
    planet.buildings.push(building.clone());
    Ok(building)
}

/// Raise an active building one level. The new level applies immediately;
/// the building stops producing until the upgrade finishes.
pub fn upgrade(planet: &mut Planet, building_id: &str, now: i64) -> GameResult<Building> {
    let (status, level, spec) = {
        let b = planet
            .building(building_id)
            .ok_or_else(|| GameError::BuildingNotFound(building_id.to_string()))?;
        (b.status, b.level, b.spec())
    };
    if status != BuildingStatus::Active {
        return Err(GameError::BuildingBusy(building_id.to_string()));
    }
    if level >= spec.max_level {
        return Err(GameError::MaxLevel(building_id.to_string()));
    }

    let next = level + 1;
    let cost = spec.cost_for_level(next);
    if !planet.resources.covers(&cost) {
        return Err(GameError::InsufficientResources);
    }
    planet.resources.deduct(&cost);

    let building = planet
        .building_mut(building_id)
        .ok_or_else(|| GameError::BuildingNotFound(building_id.to_string()))?;
    building.level = next;
    building.status = BuildingStatus::Upgrading;
    building.construction_start = now;
    building.construction_end = now + spec.build_millis_for_level(next);
    Ok(building.clone())
}

/// Remove a building. Nothing is refunded.
pub fn demolish(planet: &mut Planet, building_id: &str) -> GameResult<Building> {
    let index = planet
        .buildings
        .iter()
        .position(|b| b.id == building_id)
        .ok_or_else(|| GameError::BuildingNotFound(building_id.to_string()))?;
    Ok(planet.buildings.remove(index))
}
