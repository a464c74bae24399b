//! The per-planet production formula.
//!
//! Both the tick and offline rewards go through [`production_rate`], so a
//! planet earns the same per-second amounts online and offline (before the
//! offline rate is applied).

use engine_core::{Building, Planet, ResourceStorage, ORTHOGONAL_NEIGHBORS};
use thiserror::Error;

/// Output bonus per orthogonally adjacent building of the same type.
pub const ADJACENCY_BONUS_PER_NEIGHBOR: f64 = 0.025;

/// Why a planet was skipped for one tick.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TickError {
    #[error("resource {resource} is not finite")]
    NonFiniteResource { resource: &'static str },
    #[error("two buildings share cell ({x}, {y})")]
    DuplicateCell { x: u32, y: u32 },
    #[error("planet lock was poisoned")]
    Poisoned,
    #[error("panic while processing: {0}")]
    Panicked(String),
}

/// Bonus for `building` from same-type neighbours, regardless of their
/// status or level. 0 with no neighbours, 0.1 with four.
pub fn adjacency_bonus(planet: &Planet, building: &Building) -> f64 {
    let cell = glam::IVec2::new(building.position_x as i32, building.position_y as i32);
    let matching = ORTHOGONAL_NEIGHBORS
        .iter()
        .filter_map(|offset| planet.building_at_cell(cell + *offset))
        .filter(|other| other.building_type == building.building_type)
        .count();
    matching as f64 * ADJACENCY_BONUS_PER_NEIGHBOR
}

/// Net per-second production of every active building on the planet.
///
/// Outputs are scaled by `rate × (1 + adjacency bonus)`, inputs by `rate`
/// alone. Entries may be negative where consumption exceeds output.
pub fn production_rate(planet: &Planet) -> ResourceStorage {
    let mut rate = ResourceStorage::zero();
    for building in planet.buildings.iter().filter(|b| b.is_active()) {
        let spec = building.spec();
        let boost = 1.0 + adjacency_bonus(planet, building);
        for &(resource, amount) in spec.output {
            *rate.get_mut(resource) += amount * spec.rate * boost;
        }
        for &(resource, amount) in spec.input {
            *rate.get_mut(resource) -= amount * spec.rate;
        }
    }
    rate
}

/// Finish every construction or upgrade whose end time has passed.
/// Returns how many buildings changed.
pub fn advance_statuses(planet: &mut Planet, now: i64) -> usize {
    planet
        .buildings
        .iter_mut()
        .map(|b| b.advance_status(now))
        .filter(|changed| *changed)
        .count()
}

/// Recompute the informational `adjacency_bonus` carried on each building.
pub fn refresh_adjacency(planet: &mut Planet) {
    let bonuses: Vec<f64> = planet
        .buildings
        .iter()
        .map(|b| adjacency_bonus(planet, b))
        .collect();
    for (building, bonus) in planet.buildings.iter_mut().zip(bonuses) {
        building.adjacency_bonus = bonus;
    }
}

/// One tick for one planet: status transitions, then `dt_secs` of
/// production with the zero floor applied.
///
/// The planet is validated first and left untouched if it is inconsistent.
pub fn tick_planet(planet: &mut Planet, now: i64, dt_secs: f64) -> Result<usize, TickError> {
    validate(planet)?;

    let changed = advance_statuses(planet, now);
    refresh_adjacency(planet);
    let rate = production_rate(planet);
    planet.resources.apply_delta(&rate, dt_secs);

    if let Some(resource) = planet.resources.first_non_finite() {
        return Err(TickError::NonFiniteResource {
            resource: resource.name(),
        });
    }
    Ok(changed)
}

fn validate(planet: &Planet) -> Result<(), TickError> {
    if let Some(resource) = planet.resources.first_non_finite() {
        return Err(TickError::NonFiniteResource {
            resource: resource.name(),
        });
    }
    if let Some((x, y)) = planet.find_duplicate_cell() {
        return Err(TickError::DuplicateCell { x, y });
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use engine_core::{BuildingStatus, BuildingType, PlanetType, Zone, ZoneType};

    pub(crate) fn test_planet(size: u32) -> Planet {
        Planet {
            id: "N1E1_0".into(),
            galaxy_id: "N1E1".into(),
            position: 0,
            planet_type: PlanetType::Mountain,
            size,
            owner_id: Some("alice".into()),
            zones: vec![vec![Zone::new(ZoneType::Mining); size as usize]; size as usize],
            buildings: Vec::new(),
            resources: ResourceStorage::zero(),
        }
    }

    pub(crate) fn active(building_type: BuildingType, x: u32, y: u32) -> Building {
        let mut b = Building::new_construction(
            format!("{:?}-{}-{}", building_type, x, y),
            "N1E1_0".into(),
            building_type,
            x,
            y,
            0,
        );
        b.status = BuildingStatus::Active;
        b
    }

    #[test]
    fn lone_building_has_no_bonus() {
        let mut p = test_planet(5);
        p.buildings.push(active(BuildingType::MiningDrill, 2, 2));
        p.buildings.push(active(BuildingType::PowerPlant, 2, 1));
        assert_eq!(adjacency_bonus(&p, &p.buildings[0]), 0.0);
    }

    #[test]
    fn four_matching_neighbours_give_ten_percent() {
        let mut p = test_planet(5);
        p.buildings.push(active(BuildingType::MiningDrill, 2, 2));
        for (x, y) in [(1, 2), (3, 2), (2, 1), (2, 3)] {
            p.buildings.push(active(BuildingType::MiningDrill, x, y));
        }
        // Diagonal neighbours do not count.
        p.buildings.push(active(BuildingType::MiningDrill, 1, 1));
        assert!((adjacency_bonus(&p, &p.buildings[0]) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn edge_buildings_ignore_off_grid_cells() {
        let mut p = test_planet(4);
        p.buildings.push(active(BuildingType::MiningDrill, 0, 0));
        p.buildings.push(active(BuildingType::MiningDrill, 1, 0));
        assert!((adjacency_bonus(&p, &p.buildings[0]) - 0.025).abs() < 1e-12);
    }

    #[test]
    fn inputs_are_not_boosted() {
        let mut p = test_planet(5);
        p.buildings.push(active(BuildingType::Refinery, 1, 1));
        p.buildings.push(active(BuildingType::Refinery, 2, 1));
        let rate = production_rate(&p);
        assert!((rate.alloys - 2.0 * 1.025).abs() < 1e-12);
        assert!((rate.minerals + 6.0).abs() < 1e-12);
    }

    #[test]
    fn inactive_buildings_do_not_produce() {
        let mut p = test_planet(4);
        p.buildings.push(Building::new_construction(
            "b".into(),
            p.id.clone(),
            BuildingType::MiningDrill,
            0,
            0,
            0,
        ));
        assert!(production_rate(&p).is_zero());
    }

    #[test]
    fn shipyard_rate_scales_input_and_output() {
        let mut p = test_planet(4);
        p.buildings.push(active(BuildingType::ColonyShipyard, 0, 0));
        let rate = production_rate(&p);
        assert!((rate.colony_ships - 0.1).abs() < 1e-12);
        assert!((rate.minerals + 1.0).abs() < 1e-12);
        assert!((rate.alloys + 0.5).abs() < 1e-12);
    }

    #[test]
    fn overdraw_floors_at_zero() {
        let mut p = test_planet(4);
        p.resources.minerals = 1.0;
        p.buildings.push(active(BuildingType::Refinery, 0, 0));
        tick_planet(&mut p, 0, 1.0).unwrap();
        assert_eq!(p.resources.minerals, 0.0);
        assert_eq!(p.resources.alloys, 1.0);
    }

    #[test]
    fn tick_completes_construction_then_produces() {
        let mut p = test_planet(4);
        p.buildings.push(Building::new_construction(
            "d".into(),
            p.id.clone(),
            BuildingType::MiningDrill,
            0,
            0,
            0,
        ));
        assert_eq!(tick_planet(&mut p, 5_000, 1.0).unwrap(), 0);
        assert_eq!(p.resources.minerals, 0.0);
        assert_eq!(tick_planet(&mut p, 10_000, 1.0).unwrap(), 1);
        assert_eq!(p.resources.minerals, 2.0);
    }

    #[test]
    fn refresh_writes_bonus_onto_buildings() {
        let mut p = test_planet(4);
        p.buildings.push(active(BuildingType::PowerPlant, 0, 0));
        p.buildings.push(active(BuildingType::PowerPlant, 0, 1));
        refresh_adjacency(&mut p);
        assert!(p.buildings.iter().all(|b| (b.adjacency_bonus - 0.025).abs() < 1e-12));
    }

    #[test]
    fn invalid_planets_are_rejected_untouched() {
        let mut p = test_planet(4);
        p.buildings.push(active(BuildingType::MiningDrill, 1, 1));
        p.buildings.push(active(BuildingType::PowerPlant, 1, 1));
        assert_eq!(
            tick_planet(&mut p, 0, 1.0),
            Err(TickError::DuplicateCell { x: 1, y: 1 })
        );
        assert!(p.resources.is_zero());

        let mut q = test_planet(4);
        q.resources.food = f64::INFINITY;
        assert!(matches!(
            tick_planet(&mut q, 0, 1.0),
            Err(TickError::NonFiniteResource { resource: "food" })
        ));
    }
}
