//! Catch-up rewards for time spent offline.

use engine_core::{EconomyConfig, Planet, ResourceStorage, ALL_RESOURCES};

use crate::production::production_rate;

/// Turns elapsed offline time into a capped, rate-reduced reward using the
/// planet's current production. Construction that would have finished during
/// the gap is not replayed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OfflineRewardCalculator {
    pub bonus_rate: f64,
    pub max_offline_hours: u32,
}

impl OfflineRewardCalculator {
    pub fn new(config: &EconomyConfig) -> Self {
        Self {
            bonus_rate: config.offline_bonus_rate,
            max_offline_hours: config.max_offline_hours,
        }
    }

    pub fn max_offline_millis(&self) -> i64 {
        self.max_offline_hours as i64 * 3_600_000
    }

    /// Elapsed time in seconds after the cap. Negative spans count as zero.
    pub fn capped_seconds(&self, elapsed_millis: i64) -> f64 {
        (elapsed_millis.max(0) as f64 / 1000.0).min(self.max_offline_hours as f64 * 3600.0)
    }

    /// Reward for `elapsed_millis` offline. Only resources the planet makes
    /// on net earn anything; net consumption is never charged.
    pub fn calculate(&self, planet: &Planet, elapsed_millis: i64) -> ResourceStorage {
        let rate = production_rate(planet);
        let seconds = self.capped_seconds(elapsed_millis);

        let mut rewards = ResourceStorage::zero();
        for resource in ALL_RESOURCES {
            let per_second = rate.get(resource);
            if per_second > 0.0 {
                *rewards.get_mut(resource) = per_second * seconds * self.bonus_rate;
            }
        }
        rewards
    }

    /// Calculate and add the reward to the planet. Returns what was granted.
    pub fn claim(&self, planet: &mut Planet, elapsed_millis: i64) -> ResourceStorage {
        let rewards = self.calculate(planet, elapsed_millis);
        planet.resources.apply_delta(&rewards, 1.0);
        rewards
    }
}

impl Default for OfflineRewardCalculator {
    fn default() -> Self {
        Self::new(&EconomyConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::production::tests::{active, test_planet};
    use engine_core::BuildingType;

    const HOUR: i64 = 3_600_000;

    fn drill_and_refinery() -> Planet {
        let mut p = test_planet(4);
        p.buildings.push(active(BuildingType::MiningDrill, 0, 0));
        p.buildings.push(active(BuildingType::Refinery, 2, 2));
        p
    }

    #[test]
    fn one_hour_of_a_drill() {
        let mut p = test_planet(4);
        p.buildings.push(active(BuildingType::MiningDrill, 0, 0));
        let rewards = OfflineRewardCalculator::default().calculate(&p, HOUR);
        assert!((rewards.minerals - 2.0 * 3600.0 * 0.25).abs() < 1e-9);
    }

    #[test]
    fn reward_is_linear_then_flat() {
        let calc = OfflineRewardCalculator::default();
        let p = drill_and_refinery();
        let one = calc.calculate(&p, HOUR).alloys;
        let ten = calc.calculate(&p, 10 * HOUR).alloys;
        let cap = calc.calculate(&p, 24 * HOUR).alloys;
        let beyond = calc.calculate(&p, 48 * HOUR).alloys;
        assert!((ten - 10.0 * one).abs() < 1e-9);
        assert!((cap - 24.0 * one).abs() < 1e-9);
        assert_eq!(beyond, cap);
    }

    #[test]
    fn net_consumption_earns_nothing() {
        let calc = OfflineRewardCalculator::default();
        let p = drill_and_refinery();
        // Drill makes 2, refinery eats 3: minerals are net negative.
        let rewards = calc.calculate(&p, HOUR);
        assert_eq!(rewards.minerals, 0.0);
        assert!(rewards.alloys > 0.0);
    }

    #[test]
    fn claim_adds_to_stock() {
        let calc = OfflineRewardCalculator {
            bonus_rate: 0.5,
            max_offline_hours: 1,
        };
        let mut p = test_planet(4);
        p.resources.minerals = 10.0;
        p.buildings.push(active(BuildingType::MiningDrill, 0, 0));
        let granted = calc.claim(&mut p, 2 * HOUR);
        assert_eq!(granted.minerals, 3600.0);
        assert_eq!(p.resources.minerals, 3610.0);
    }

    #[test]
    fn negative_elapsed_is_zero() {
        let calc = OfflineRewardCalculator::default();
        assert_eq!(calc.capped_seconds(-5_000), 0.0);
        assert!(calc.calculate(&drill_and_refinery(), -5_000).is_zero());
        assert_eq!(calc.max_offline_millis(), 24 * HOUR);
    }
}
