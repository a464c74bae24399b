//! galaxy-server - headless idle galaxy session runner

mod config;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use economy::{DirectoryStore, GameService, PlanetUpdate};
use engine_core::{BuildingSpec, BuildingType, Planet, SystemClock, ZoneType};

use config::ServerConfig;

/// First free cell of `zone` on the planet, scanning row by row.
fn free_cell(planet: &Planet, zone: ZoneType) -> Option<(u32, u32)> {
    (0..planet.size)
        .flat_map(|y| (0..planet.size).map(move |x| (x, y)))
        .find(|&(x, y)| planet.zone_at(x, y) == Some(zone) && planet.building_at(x, y).is_none())
}

fn log_update(update: &PlanetUpdate) {
    let r = &update.resources;
    log::info!(
        "[{}] minerals {:.1} energy {:.1} food {:.1} alloys {:.1} ({} buildings)",
        update.planet_id,
        r.minerals,
        r.energy,
        r.food,
        r.alloys,
        update.buildings.len()
    );
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::load();
    log::info!(
        "Starting galaxy-server (seed {}, tick {} ms)",
        config.universe.global_seed,
        config.economy.tick_interval_ms
    );

    let store = DirectoryStore::open(&config.save_dir)
        .with_context(|| format!("opening save directory {:?}", config.save_dir))?;
    let service = GameService::new(
        config.universe.clone(),
        &config.economy,
        Arc::new(store),
        Arc::new(SystemClock),
    );
    service.engine().set_subscriber(Arc::new(log_update));
    service.engine().start();

    let user = config.demo_user.as_str();
    let outcome = service.login(user).context("login")?;
    let home = outcome
        .save
        .planets
        .first()
        .map(|p| p.id.clone())
        .context("save has no planets")?;
    if let Some(claim) = &outcome.offline {
        let total = claim.total();
        log::info!(
            "Offline for {} s: +{:.1} minerals, +{:.1} energy, +{:.1} food",
            claim.rewarded_millis / 1000,
            total.minerals,
            total.energy,
            total.food
        );
    }

    let planet = service.planet(user, &home).context("loading home planet")?;
    log::info!(
        "Home planet {} ({:?}, size {}) in galaxy {}",
        planet.id,
        planet.planet_type,
        planet.size,
        planet.galaxy_id
    );
    let galaxy = service.galaxy(&planet.galaxy_id);
    log::info!("Galaxy {} holds {} planets", galaxy.id, galaxy.occupied_count());

    match free_cell(&planet, ZoneType::Mining) {
        Some((x, y)) => match service.build(user, &home, BuildingType::MiningDrill, x, y) {
            Ok(b) => log::info!(
                "Building {} at ({}, {}), ready in {} s",
                BuildingSpec::get(b.building_type).name,
                x,
                y,
                (b.construction_end - b.construction_start) / 1000
            ),
            Err(e) => log::warn!("Could not build a drill: {}", e),
        },
        None => log::info!("No free mining cell on {}", home),
    }

    thread::sleep(Duration::from_secs(config.run_seconds));

    service.disconnect(user).context("saving on disconnect")?;
    service.engine().stop();
    log::info!("Session for {} saved to {:?}", user, config.save_dir);

    Ok(())
}
