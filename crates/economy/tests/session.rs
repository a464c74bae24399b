//! End-to-end player flow against an in-memory store and a manual clock.

use std::sync::Arc;
use std::time::Duration;

use economy::{ChannelSubscriber, GameService, MemoryStore, SaveRepository};
use engine_core::{
    BuildingStatus, BuildingType, Clock, EconomyConfig, GameError, ManualClock, Planet,
    UniverseConfig, ZoneType,
};

const START: i64 = 1_700_000_000_000;

fn setup() -> (GameService, Arc<ManualClock>, Arc<MemoryStore>) {
    let clock = Arc::new(ManualClock::new(START));
    let store = Arc::new(MemoryStore::new());
    let service = GameService::new(
        UniverseConfig::default(),
        &EconomyConfig::default(),
        store.clone(),
        clock.clone(),
    );
    (service, clock, store)
}

fn first_zone(planet: &Planet, zone: ZoneType) -> Option<(u32, u32)> {
    (0..planet.size)
        .flat_map(|y| (0..planet.size).map(move |x| (x, y)))
        .find(|&(x, y)| planet.zone_at(x, y) == Some(zone))
}

/// Log in, then find a user whose home planet has a mining cell.
fn login_with_mining(svc: &GameService) -> (String, Planet, (u32, u32)) {
    for i in 0..50 {
        let user = format!("miner{}", i);
        let planet = svc.login(&user).unwrap().save.planets[0].clone();
        if let Some(cell) = first_zone(&planet, ZoneType::Mining) {
            return (user, planet, cell);
        }
        svc.disconnect(&user).unwrap();
    }
    panic!("no home planet with a mining zone");
}

#[test]
fn drill_builds_then_produces() {
    let (svc, clock, _) = setup();
    let (user, planet, (x, y)) = login_with_mining(&svc);

    let drill = svc
        .build(&user, &planet.id, BuildingType::MiningDrill, x, y)
        .unwrap();
    let after_cost = svc.planet(&user, &planet.id).unwrap().resources;
    assert_eq!(after_cost.minerals, 450.0);
    assert_eq!(after_cost.energy, 480.0);

    // Still under construction: nothing produced.
    clock.advance(Duration::from_secs(5));
    svc.engine().tick();
    assert_eq!(svc.planet(&user, &planet.id).unwrap().resources, after_cost);

    clock.advance(Duration::from_secs(5));
    svc.engine().tick();
    let p = svc.planet(&user, &planet.id).unwrap();
    assert_eq!(p.building(&drill.id).unwrap().status, BuildingStatus::Active);
    assert_eq!(p.resources.minerals, 452.0);
    assert_eq!(p.resources.energy, 480.0);
    assert_eq!(p.resources.food, 500.0);

    // Another tick leaves timestamps alone.
    svc.engine().tick();
    let q = svc.planet(&user, &planet.id).unwrap();
    let (a, b) = (p.building(&drill.id).unwrap(), q.building(&drill.id).unwrap());
    assert_eq!(a.construction_start, b.construction_start);
    assert_eq!(a.construction_end, b.construction_end);
}

#[test]
fn actions_notify_subscriber() {
    let (svc, _, _) = setup();
    let (subscriber, updates) = ChannelSubscriber::new();
    svc.engine().set_subscriber(Arc::new(subscriber));
    let (user, planet, (x, y)) = login_with_mining(&svc);

    let drill = svc
        .build(&user, &planet.id, BuildingType::MiningDrill, x, y)
        .unwrap();
    svc.demolish(&user, &planet.id, &drill.id).unwrap();

    let received: Vec<_> = updates.try_iter().collect();
    assert_eq!(received.len(), 2);
    assert_eq!(received[0].buildings.len(), 1);
    assert!(received[1].buildings.is_empty());
}

#[test]
fn other_users_cannot_act() {
    let (svc, _, _) = setup();
    let (_, planet, (x, y)) = login_with_mining(&svc);
    assert!(matches!(
        svc.build("mallory", &planet.id, BuildingType::MiningDrill, x, y),
        Err(GameError::NotOwner { .. })
    ));
}

#[test]
fn disconnect_saves_and_unloads() {
    let (svc, clock, store) = setup();
    let (user, planet, (x, y)) = login_with_mining(&svc);
    svc.build(&user, &planet.id, BuildingType::MiningDrill, x, y)
        .unwrap();

    clock.advance(Duration::from_secs(60));
    let save = svc.disconnect(&user).unwrap();
    assert!(!svc.engine().contains(&planet.id));
    assert_eq!(save.last_save_time, clock.now_millis());
    assert_eq!(save.planets[0].buildings.len(), 1);

    let stored = SaveRepository::new(store).load(&user).unwrap().unwrap();
    assert_eq!(stored, save);

    // Ticks no longer touch the unloaded planet.
    svc.engine().tick();
    assert_eq!(
        svc.planet(&user, &planet.id).unwrap().resources,
        save.planets[0].resources
    );
}

#[test]
fn offline_rewards_are_capped_and_restamped() {
    let (svc, clock, _) = setup();
    let (user, planet, (x, y)) = login_with_mining(&svc);
    svc.build(&user, &planet.id, BuildingType::MiningDrill, x, y)
        .unwrap();
    clock.advance(Duration::from_secs(10));
    svc.engine().tick();
    let before = svc.disconnect(&user).unwrap().planets[0].resources;

    clock.advance(Duration::from_secs(48 * 3600));
    let claim = svc.login(&user).unwrap().offline.unwrap();
    assert_eq!(claim.rewarded_millis, 24 * 3_600_000);
    let expected = 2.0 * 24.0 * 3600.0 * 0.25;
    assert!((claim.total().minerals - expected).abs() < 1e-6);

    let after = svc.planet(&user, &planet.id).unwrap().resources;
    assert!((after.minerals - before.minerals - expected).abs() < 1e-6);

    // Claiming while logged in grants nothing.
    let again = svc.claim_offline_rewards(&user).unwrap();
    assert_eq!(again.rewarded_millis, 0);
    assert!(again.total().is_zero());
}

#[test]
fn claims_without_login_use_the_save() {
    let (svc, clock, _) = setup();
    svc.login("ghost").unwrap();
    svc.disconnect("ghost").unwrap();
    clock.advance(Duration::from_secs(3600));
    let claim = svc.claim_offline_rewards("ghost").unwrap();
    assert_eq!(claim.rewarded_millis, 3_600_000);
    // Fresh home planet has no buildings.
    assert!(claim.total().is_zero());
}

#[test]
fn missing_save_is_an_error() {
    let (svc, _, _) = setup();
    assert!(matches!(
        svc.claim_offline_rewards("nobody"),
        Err(GameError::SaveNotFound(_))
    ));
    assert!(matches!(svc.save("nobody"), Err(GameError::SaveNotFound(_))));
}

#[test]
fn logging_in_twice_keeps_progress() {
    let (svc, clock, _) = setup();
    let (user, planet, (x, y)) = login_with_mining(&svc);
    svc.build(&user, &planet.id, BuildingType::MiningDrill, x, y)
        .unwrap();
    clock.advance(Duration::from_secs(10));
    svc.engine().tick();
    let live = svc.planet(&user, &planet.id).unwrap();

    let outcome = svc.login(&user).unwrap();
    assert!(!outcome.created);
    assert_eq!(outcome.save.planets[0], live);
    assert_eq!(svc.planet(&user, &planet.id).unwrap(), live);
    assert_eq!(outcome.offline.unwrap().rewarded_millis, 0);
}
