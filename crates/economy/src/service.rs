//! Player sessions: login, actions, saving, and offline claims.
//!
//! `GameService` ties the generators, the production engine, and the save
//! repository together. The engine's copy of a loaded planet is always the
//! authoritative one; saves are refreshed from it on login, save, and disconnect.

use std::sync::Arc;

use engine_core::{
    Building, BuildingType, Clock, EconomyConfig, GameError, GameResult, GameSave, Planet,
    ResourceStorage, UniverseConfig,
};
use procgen::{Galaxy, GalaxyId, PlanetSlot, StartingPlanetAssigner};

use crate::actions;
use crate::engine::ProductionEngine;
use crate::offline::OfflineRewardCalculator;
use crate::persistence::{KeyValueStore, SaveRepository};

/// Result of [`GameService::login`].
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub save: GameSave,
    /// A home planet was assigned because no save existed.
    pub created: bool,
    /// Rewards paid to planets that came back from offline. `None` for a
    /// new save.
    pub offline: Option<OfflineClaim>,
}

/// Rewards granted by one offline claim.
#[derive(Debug, Clone, PartialEq)]
pub struct OfflineClaim {
    /// Offline time actually rewarded, after the cap.
    pub rewarded_millis: i64,
    pub rewards: Vec<(String, ResourceStorage)>,
}

impl OfflineClaim {
    pub fn total(&self) -> ResourceStorage {
        let mut total = ResourceStorage::zero();
        for (_, r) in &self.rewards {
            total.add_scaled(r, 1.0);
        }
        total
    }
}

pub struct GameService {
    engine: ProductionEngine,
    saves: SaveRepository,
    assigner: StartingPlanetAssigner,
    offline: OfflineRewardCalculator,
}

impl GameService {
    pub fn new(
        universe: UniverseConfig,
        economy: &EconomyConfig,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            engine: ProductionEngine::new(economy, clock),
            saves: SaveRepository::new(store),
            assigner: StartingPlanetAssigner::new(universe, economy.starting_resources),
            offline: OfflineRewardCalculator::new(economy),
        }
    }

    pub fn engine(&self) -> &ProductionEngine {
        &self.engine
    }

    pub fn saves(&self) -> &SaveRepository {
        &self.saves
    }

    fn now(&self) -> i64 {
        self.engine.now_millis()
    }

    /// Load (or create) the player's save and register their planets with
    /// the engine. Planets that were not loaded collect their offline
    /// rewards and the save is restamped. Planets already in the engine keep
    /// their live state.
    pub fn login(&self, user_id: &str) -> GameResult<LoginOutcome> {
        if let Some(mut save) = self.saves.load(user_id)? {
            let offline = self.settle_offline(&mut save);
            self.saves.store(&save)?;
            for (planet_id, _) in &offline.rewards {
                if let Some(planet) = save.planet(planet_id) {
                    self.engine.add_planet(planet.clone());
                }
            }
            log::info!(
                "{} logged in with {} planet(s), {} s offline",
                user_id,
                save.planets.len(),
                offline.rewarded_millis / 1000
            );
            return Ok(LoginOutcome {
                save,
                created: false,
                offline: Some(offline),
            });
        }

        let assignment = self.assigner.assign(user_id);
        let save = GameSave::new(user_id, vec![assignment.planet.clone()], self.now());
        self.saves.store(&save)?;
        self.engine.add_planet(assignment.planet);
        log::info!("Created new save for {}", user_id);
        Ok(LoginOutcome {
            save,
            created: true,
            offline: None,
        })
    }

    /// A planet the user owns: the engine copy if loaded, else the saved one.
    pub fn planet(&self, user_id: &str, planet_id: &str) -> GameResult<Planet> {
        let planet = match self.engine.planet(planet_id) {
            Some(planet) => planet,
            None => self
                .saves
                .load(user_id)?
                .and_then(|save| save.planet(planet_id).cloned())
                .ok_or_else(|| GameError::PlanetNotFound(planet_id.to_string()))?,
        };
        actions::ensure_owner(&planet, user_id)?;
        Ok(planet)
    }

    pub fn build(
        &self,
        user_id: &str,
        planet_id: &str,
        building_type: BuildingType,
        x: u32,
        y: u32,
    ) -> GameResult<Building> {
        let now = self.now();
        let building = self.engine.with_planet(planet_id, |planet| {
            actions::ensure_owner(planet, user_id)?;
            actions::build(planet, building_type, x, y, now)
        })??;
        self.engine.notify(planet_id);
        Ok(building)
    }

    pub fn upgrade(&self, user_id: &str, planet_id: &str, building_id: &str) -> GameResult<Building> {
        let now = self.now();
        let building = self.engine.with_planet(planet_id, |planet| {
            actions::ensure_owner(planet, user_id)?;
            actions::upgrade(planet, building_id, now)
        })??;
        self.engine.notify(planet_id);
        Ok(building)
    }

    pub fn demolish(&self, user_id: &str, planet_id: &str, building_id: &str) -> GameResult<Building> {
        let building = self.engine.with_planet(planet_id, |planet| {
            actions::ensure_owner(planet, user_id)?;
            actions::demolish(planet, building_id)
        })??;
        self.engine.notify(planet_id);
        Ok(building)
    }

    /// Write the engine's copies of the user's planets into their save.
    pub fn save(&self, user_id: &str) -> GameResult<GameSave> {
        let mut save = self
            .saves
            .load(user_id)?
            .ok_or_else(|| GameError::SaveNotFound(user_id.to_string()))?;
        for planet in self.engine.planets_owned_by(user_id) {
            if !save.replace_planet(planet.clone()) {
                save.planets.push(planet);
            }
        }
        save.last_save_time = self.now();
        self.saves.store(&save)?;
        log::debug!("Saved {} ({} planets)", user_id, save.planets.len());
        Ok(save)
    }

    /// Save, then unload the user's planets from the engine.
    pub fn disconnect(&self, user_id: &str) -> GameResult<GameSave> {
        let save = self.save(user_id)?;
        for planet in &save.planets {
            self.engine.remove_planet(&planet.id);
        }
        log::info!("{} disconnected", user_id);
        Ok(save)
    }

    /// Grant rewards for the time since the last save and restamp it.
    /// Planets loaded in the engine are online and earn nothing here.
    pub fn claim_offline_rewards(&self, user_id: &str) -> GameResult<OfflineClaim> {
        let mut save = self
            .saves
            .load(user_id)?
            .ok_or_else(|| GameError::SaveNotFound(user_id.to_string()))?;
        let claim = self.settle_offline(&mut save);
        self.saves.store(&save)?;
        log::info!(
            "{} claimed offline rewards for {} s",
            user_id,
            claim.rewarded_millis / 1000
        );
        Ok(claim)
    }

    /// Refresh loaded planets from the engine, pay offline rewards to the
    /// rest, and stamp the save with the current time.
    fn settle_offline(&self, save: &mut GameSave) -> OfflineClaim {
        let now = self.now();
        let elapsed = now - save.last_save_time;

        let mut rewards = Vec::new();
        for planet in save.planets.iter_mut() {
            match self.engine.planet(&planet.id) {
                Some(live) => *planet = live,
                None => {
                    let granted = self.offline.claim(planet, elapsed);
                    rewards.push((planet.id.clone(), granted));
                }
            }
        }
        save.last_save_time = now;

        let rewarded_millis = if rewards.is_empty() {
            0
        } else {
            elapsed.clamp(0, self.offline.max_offline_millis())
        };
        OfflineClaim {
            rewarded_millis,
            rewards,
        }
    }

    pub fn galaxy(&self, galaxy_id: &str) -> Galaxy {
        self.assigner.galaxies().generate(galaxy_id)
    }

    pub fn planet_at_position(&self, galaxy_id: &str, position: u32) -> Option<PlanetSlot> {
        self.galaxy(galaxy_id).planet_at(position).cloned()
    }

    /// Canonical form of a galaxy id, rejecting malformed input.
    pub fn canonical_galaxy_id(&self, galaxy_id: &str) -> Result<String, procgen::GalaxyIdError> {
        galaxy_id.parse::<GalaxyId>().map(|id| id.to_string())
    }
}
