//! Home planet placement for new players.
//!
//! A player's seed picks a galaxy off both axes, then an occupied slot in
//! it. Empty galaxies are retried with salted seeds a bounded number of
//! times; after that slot 0 of the last candidate is force-occupied.

use engine_core::{IVec2, Planet, ResourceStorage, UniverseConfig};

use crate::galaxy::{planet_id, GalaxyGenerator, GalaxyId, PlanetSlot};
use crate::random::{RandomStream, Seed};
use crate::zones::PlanetZoneGenerator;

/// Galaxy coordinates are drawn from `[-COORD_BAND, COORD_BAND)` per axis.
const COORD_BAND: f64 = 50.0;
/// Salted retries before falling back to a forced slot.
const MAX_ATTEMPTS: u32 = 8;
/// Redraws of a zero axis before it is pushed to 1.
const MAX_AXIS_REDRAWS: u32 = 16;

/// How the home planet was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// An occupied slot of a generated galaxy.
    Found,
    /// Every attempt hit an empty galaxy; slot 0 was force-occupied.
    Fallback,
}

/// Result of [`StartingPlanetAssigner::assign`].
#[derive(Debug, Clone)]
pub struct StartingAssignment {
    pub planet: Planet,
    /// Number of galaxies tried, including the successful one.
    pub attempts: u32,
    pub placement: Placement,
}

pub struct StartingPlanetAssigner {
    galaxies: GalaxyGenerator,
    zones: PlanetZoneGenerator,
    starting_resources: ResourceStorage,
}

impl StartingPlanetAssigner {
    pub fn new(config: UniverseConfig, starting_resources: ResourceStorage) -> Self {
        Self {
            zones: PlanetZoneGenerator::new(&config),
            galaxies: GalaxyGenerator::new(config),
            starting_resources,
        }
    }

    pub fn galaxies(&self) -> &GalaxyGenerator {
        &self.galaxies
    }

    /// Deterministically place `user_id`'s home planet.
    pub fn assign(&self, user_id: &str) -> StartingAssignment {
        let user_seed = Seed::new(self.galaxies.config().global_seed)
            .combine("player")
            .combine(user_id);

        let mut last = GalaxyId::ORIGIN;
        for attempt in 0..MAX_ATTEMPTS {
            let seed = if attempt == 0 {
                user_seed
            } else {
                user_seed.combine(&format!("attempt{}", attempt))
            };
            let mut stream = seed.stream();
            let galaxy_id = GalaxyId {
                coord: IVec2::new(draw_axis(&mut stream), draw_axis(&mut stream)),
            };
            last = galaxy_id;

            let galaxy = self.galaxies.generate_at(&galaxy_id);
            let occupied: Vec<&PlanetSlot> = galaxy.planets().collect();
            if occupied.is_empty() {
                log::debug!("Galaxy {} is empty, retrying placement for {}", galaxy_id, user_id);
                continue;
            }

            let slot = occupied[stream.pick_index(occupied.len())];
            let planet = self.build_planet(&galaxy_id, slot, user_id);
            log::info!(
                "Assigned starting planet {} ({:?}, size {}) to {} after {} attempt(s)",
                planet.id,
                planet.planet_type,
                planet.size,
                user_id,
                attempt + 1
            );
            return StartingAssignment {
                planet,
                attempts: attempt + 1,
                placement: Placement::Found,
            };
        }

        let slot = self.galaxies.forced_slot(&last, 0);
        let planet = self.build_planet(&last, &slot, user_id);
        log::warn!(
            "No occupied galaxy found for {} in {} attempts, forcing {}",
            user_id,
            MAX_ATTEMPTS,
            planet.id
        );
        StartingAssignment {
            planet,
            attempts: MAX_ATTEMPTS,
            placement: Placement::Fallback,
        }
    }

    fn build_planet(&self, galaxy: &GalaxyId, slot: &PlanetSlot, user_id: &str) -> Planet {
        let id = planet_id(galaxy, slot.position);
        Planet {
            zones: self.zones.generate_balanced(&id, slot.size),
            id,
            galaxy_id: galaxy.to_string(),
            position: slot.position,
            planet_type: slot.planet_type,
            size: slot.size,
            owner_id: Some(user_id.to_string()),
            buildings: Vec::new(),
            resources: self.starting_resources,
        }
    }
}

/// One non-zero coordinate axis.
fn draw_axis(stream: &mut RandomStream) -> i32 {
    for _ in 0..MAX_AXIS_REDRAWS {
        let v = ((stream.next_float() - 0.5) * 2.0 * COORD_BAND).floor() as i32;
        if v != 0 {
            return v;
        }
    }
    1
}
