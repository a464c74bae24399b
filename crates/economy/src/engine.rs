//! The production engine: a set of loaded planets advanced on a fixed timer.
//!
//! Each loaded planet sits behind its own mutex. The tick and player actions
//! both go through that lock, so an action never interleaves with a tick on
//! the same planet. One engine owns one membership map and one timer thread;
//! any number of engines can coexist.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use engine_core::{
    Building, Clock, EconomyConfig, GameError, GameResult, Planet, ResourceStorage, SystemClock,
    TickTimer,
};
use serde::Serialize;

use crate::production::{tick_planet, TickError};

/// What subscribers receive for a planet after a tick or an action.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanetUpdate {
    pub planet_id: String,
    pub resources: ResourceStorage,
    pub buildings: Vec<Building>,
}

impl From<&Planet> for PlanetUpdate {
    fn from(planet: &Planet) -> Self {
        Self {
            planet_id: planet.id.clone(),
            resources: planet.resources,
            buildings: planet.buildings.clone(),
        }
    }
}

/// Receives planet updates. Called from the tick thread with no planet
/// lock held, so implementations may call back into the engine.
pub trait PlanetSubscriber: Send + Sync {
    fn planet_updated(&self, update: &PlanetUpdate);
}

impl<F> PlanetSubscriber for F
where
    F: Fn(&PlanetUpdate) + Send + Sync,
{
    fn planet_updated(&self, update: &PlanetUpdate) {
        self(update)
    }
}

/// Forwards updates into an mpsc channel for a transport to drain.
pub struct ChannelSubscriber {
    sender: Mutex<Sender<PlanetUpdate>>,
}

impl ChannelSubscriber {
    pub fn new() -> (Self, Receiver<PlanetUpdate>) {
        let (sender, receiver) = mpsc::channel();
        (
            Self {
                sender: Mutex::new(sender),
            },
            receiver,
        )
    }
}

impl PlanetSubscriber for ChannelSubscriber {
    fn planet_updated(&self, update: &PlanetUpdate) {
        if let Ok(sender) = self.sender.lock() {
            // Receiver gone means nobody is listening any more.
            let _ = sender.send(update.clone());
        }
    }
}

/// Outcome of one pass over the loaded planets.
#[derive(Debug, Default)]
pub struct TickReport {
    pub processed: usize,
    /// Buildings that finished construction or upgrade this tick.
    pub completed_buildings: usize,
    pub skipped: Vec<(String, TickError)>,
}

type SharedPlanet = Arc<Mutex<Planet>>;

struct EngineState {
    planets: RwLock<HashMap<String, SharedPlanet>>,
    subscriber: RwLock<Option<Arc<dyn PlanetSubscriber>>>,
    clock: Arc<dyn Clock>,
    timer: Mutex<TickTimer>,
}

impl EngineState {
    fn subscriber(&self) -> Option<Arc<dyn PlanetSubscriber>> {
        self.subscriber.read().ok().and_then(|s| s.clone())
    }

    /// Loaded planets in id order.
    fn loaded(&self) -> Vec<(String, SharedPlanet)> {
        let mut planets: Vec<_> = match self.planets.read() {
            Ok(map) => map.iter().map(|(id, p)| (id.clone(), Arc::clone(p))).collect(),
            Err(_) => {
                log::error!("Planet registry lock poisoned, nothing to tick");
                return Vec::new();
            }
        };
        planets.sort_by(|a, b| a.0.cmp(&b.0));
        planets
    }

    fn tick_at(&self, now: i64) -> TickReport {
        let dt = match self.timer.lock() {
            Ok(timer) => timer.interval_seconds(),
            Err(poisoned) => poisoned.into_inner().interval_seconds(),
        };
        let subscriber = self.subscriber();
        let mut report = TickReport::default();

        for (id, planet) in self.loaded() {
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                let update = {
                    let mut guard = planet.lock().map_err(|_| TickError::Poisoned)?;
                    let completed = tick_planet(&mut guard, now, dt)?;
                    (completed, PlanetUpdate::from(&*guard))
                };
                if let Some(subscriber) = &subscriber {
                    subscriber.planet_updated(&update.1);
                }
                Ok::<_, TickError>(update.0)
            }));

            match result {
                Ok(Ok(completed)) => {
                    report.processed += 1;
                    report.completed_buildings += completed;
                }
                Ok(Err(e)) => {
                    log::error!("Skipping planet {} this tick: {}", id, e);
                    report.skipped.push((id, e));
                }
                Err(payload) => {
                    let e = TickError::Panicked(panic_message(payload.as_ref()));
                    log::error!("Skipping planet {} this tick: {}", id, e);
                    report.skipped.push((id, e));
                }
            }
        }

        match self.timer.lock() {
            Ok(mut timer) => timer.record(now),
            Err(poisoned) => poisoned.into_inner().record(now),
        }
        log::trace!(
            "Tick at {}: {} planets, {} skipped",
            now,
            report.processed,
            report.skipped.len()
        );
        report
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

struct Worker {
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

/// Advances loaded planets once per tick interval on a background thread.
pub struct ProductionEngine {
    state: Arc<EngineState>,
    worker: Mutex<Option<Worker>>,
}

impl ProductionEngine {
    pub fn new(config: &EconomyConfig, clock: Arc<dyn Clock>) -> Self {
        let interval = Duration::from_millis(config.tick_interval_ms.max(1));
        Self {
            state: Arc::new(EngineState {
                planets: RwLock::new(HashMap::new()),
                subscriber: RwLock::new(None),
                clock,
                timer: Mutex::new(TickTimer::new(interval)),
            }),
            worker: Mutex::new(None),
        }
    }

    pub fn with_system_clock(config: &EconomyConfig) -> Self {
        Self::new(config, Arc::new(SystemClock))
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.state.clock
    }

    pub fn now_millis(&self) -> i64 {
        self.state.clock.now_millis()
    }

    pub fn set_subscriber(&self, subscriber: Arc<dyn PlanetSubscriber>) {
        if let Ok(mut slot) = self.state.subscriber.write() {
            *slot = Some(subscriber);
        }
    }

    pub fn clear_subscriber(&self) {
        if let Ok(mut slot) = self.state.subscriber.write() {
            *slot = None;
        }
    }

    /// Load a planet, replacing any copy already loaded under the same id.
    pub fn add_planet(&self, planet: Planet) {
        if let Ok(mut map) = self.state.planets.write() {
            log::debug!("Loading planet {}", planet.id);
            map.insert(planet.id.clone(), Arc::new(Mutex::new(planet)));
        }
    }

    /// Unload a planet and hand back its latest state.
    pub fn remove_planet(&self, planet_id: &str) -> Option<Planet> {
        let shared = self.state.planets.write().ok()?.remove(planet_id)?;
        log::debug!("Unloaded planet {}", planet_id);
        let planet = match shared.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        Some(planet)
    }

    pub fn contains(&self, planet_id: &str) -> bool {
        self.state
            .planets
            .read()
            .map(|map| map.contains_key(planet_id))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.state.planets.read().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn planet_ids(&self) -> Vec<String> {
        self.state.loaded().into_iter().map(|(id, _)| id).collect()
    }

    /// Snapshot of a loaded planet.
    pub fn planet(&self, planet_id: &str) -> Option<Planet> {
        self.with_planet(planet_id, |p| p.clone()).ok()
    }

    /// Snapshots of every loaded planet owned by `user_id`.
    pub fn planets_owned_by(&self, user_id: &str) -> Vec<Planet> {
        self.state
            .loaded()
            .into_iter()
            .filter_map(|(_, shared)| {
                let guard = shared.lock().ok()?;
                guard.is_owned_by(user_id).then(|| guard.clone())
            })
            .collect()
    }

    /// Run `f` on a loaded planet while holding its lock. Ticks on this
    /// planet wait until `f` returns.
    pub fn with_planet<R>(&self, planet_id: &str, f: impl FnOnce(&mut Planet) -> R) -> GameResult<R> {
        let shared = self
            .state
            .planets
            .read()
            .ok()
            .and_then(|map| map.get(planet_id).cloned())
            .ok_or_else(|| GameError::PlanetNotLoaded(planet_id.to_string()))?;
        let mut guard = shared
            .lock()
            .map_err(|_| GameError::PlanetUnavailable(planet_id.to_string()))?;
        Ok(f(&mut guard))
    }

    /// Push the current state of a loaded planet to the subscriber.
    pub fn notify(&self, planet_id: &str) {
        let Some(subscriber) = self.state.subscriber() else {
            return;
        };
        if let Ok(update) = self.with_planet(planet_id, |p| PlanetUpdate::from(&*p)) {
            subscriber.planet_updated(&update);
        }
    }

    /// One tick at the clock's current time.
    pub fn tick(&self) -> TickReport {
        self.state.tick_at(self.state.clock.now_millis())
    }

    /// One tick at an explicit time. Production always covers exactly one
    /// tick interval.
    pub fn tick_at(&self, now_millis: i64) -> TickReport {
        self.state.tick_at(now_millis)
    }

    pub fn tick_interval(&self) -> Duration {
        match self.state.timer.lock() {
            Ok(timer) => timer.interval(),
            Err(poisoned) => poisoned.into_inner().interval(),
        }
    }

    pub fn tick_count(&self) -> u64 {
        match self.state.timer.lock() {
            Ok(timer) => timer.tick_count(),
            Err(poisoned) => poisoned.into_inner().tick_count(),
        }
    }

    /// Start the timer thread. Returns `false` if it was already running.
    pub fn start(&self) -> bool {
        let Ok(mut worker) = self.worker.lock() else {
            return false;
        };
        if worker.is_some() {
            return false;
        }

        let (stop, stop_rx) = mpsc::channel::<()>();
        let state = Arc::clone(&self.state);
        let interval = self.tick_interval();
        let handle = thread::spawn(move || loop {
            match stop_rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => {
                    state.tick_at(state.clock.now_millis());
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        });

        *worker = Some(Worker { stop, handle });
        log::info!("Production engine started ({} ms interval)", interval.as_millis());
        true
    }

    /// Stop the timer thread. An in-flight tick finishes first. Returns
    /// `false` if the engine was not running.
    pub fn stop(&self) -> bool {
        let worker = match self.worker.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        let Some(worker) = worker else {
            return false;
        };

        let _ = worker.stop.send(());
        if worker.handle.join().is_err() {
            log::error!("Production engine thread panicked");
        }
        log::info!("Production engine stopped");
        true
    }

    pub fn restart(&self) -> bool {
        self.stop();
        self.start()
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .map(|worker| worker.is_some())
            .unwrap_or(false)
    }
}

impl Drop for ProductionEngine {
    fn drop(&mut self) {
        self.stop();
    }
}
