//! Planet zone grids.
//!
//! A planet's zones are derived from its id and size alone: three noise
//! fields (resource, fertility, energy) are sampled per cell and the
//! strongest one decides the zone, or wasteland when none is strong enough.

use engine_core::{UniverseConfig, Zone, ZoneGrid, ZoneType};

use crate::random::{fbm, normalize, FbmParams, NoiseField, Seed};

/// Minimum normalised strength for a field to claim a cell.
const CLAIM_THRESHOLD: f64 = 0.4;
/// Below this for every field the cell is wasteland outright.
const BARREN_THRESHOLD: f64 = 0.3;
/// Share of cells each productive zone type should reach on a starting planet.
const BALANCE_MIN_SHARE: f64 = 0.15;

/// Sampling settings for one field.
#[derive(Debug, Clone, Copy)]
struct FieldSpec {
    spacing: f64,
    fbm: FbmParams,
}

/// Settings for the three fields of one pass.
#[derive(Debug, Clone, Copy)]
struct ZonePass {
    resource: FieldSpec,
    fertility: FieldSpec,
    energy: FieldSpec,
}

const STANDARD_PASS: ZonePass = ZonePass {
    resource: FieldSpec {
        spacing: 0.3,
        fbm: FbmParams::new(4, 0.5, 2.0, 1.0),
    },
    fertility: FieldSpec {
        spacing: 0.25,
        fbm: FbmParams::new(4, 0.5, 2.0, 1.0),
    },
    energy: FieldSpec {
        spacing: 0.35,
        fbm: FbmParams::new(4, 0.5, 2.0, 1.0),
    },
};

/// Flatter noise for the balancing retry: fewer octaves, lower persistence,
/// larger base scale.
const BALANCED_PASS: ZonePass = ZonePass {
    resource: FieldSpec {
        spacing: 0.2,
        fbm: FbmParams::new(3, 0.4, 2.0, 1.5),
    },
    fertility: FieldSpec {
        spacing: 0.2,
        fbm: FbmParams::new(3, 0.4, 2.0, 1.5),
    },
    energy: FieldSpec {
        spacing: 0.2,
        fbm: FbmParams::new(3, 0.4, 2.0, 1.5),
    },
};

/// Classify a cell from normalised field strengths in [0, 1].
/// Highest wins; ties favour resource, then fertility, then energy.
pub fn classify_zone(resource: f64, fertility: f64, energy: f64) -> ZoneType {
    let max = resource.max(fertility).max(energy);
    if max < BARREN_THRESHOLD {
        return ZoneType::Wasteland;
    }
    if resource == max && resource > CLAIM_THRESHOLD {
        ZoneType::Mining
    } else if fertility == max && fertility > CLAIM_THRESHOLD {
        ZoneType::Agricultural
    } else if energy == max && energy > CLAIM_THRESHOLD {
        ZoneType::Power
    } else {
        ZoneType::Wasteland
    }
}

/// Zone tallies for one grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ZoneCounts {
    pub mining: usize,
    pub power: usize,
    pub agricultural: usize,
    pub wasteland: usize,
}

impl ZoneCounts {
    pub fn of(grid: &ZoneGrid) -> Self {
        let mut counts = Self::default();
        for zone in grid.iter().flatten() {
            match zone.zone_type {
                ZoneType::Mining => counts.mining += 1,
                ZoneType::Power => counts.power += 1,
                ZoneType::Agricultural => counts.agricultural += 1,
                ZoneType::Wasteland => counts.wasteland += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.mining + self.power + self.agricultural + self.wasteland
    }

    /// Whether each productive type covers at least `min_share` of the grid.
    pub fn is_balanced(&self, min_share: f64) -> bool {
        let required = (self.total() as f64 * min_share).floor() as usize;
        self.mining >= required && self.power >= required && self.agricultural >= required
    }
}

/// Pure zone generator keyed on the global seed.
#[derive(Debug, Clone)]
pub struct PlanetZoneGenerator {
    global_seed: u64,
}

impl PlanetZoneGenerator {
    pub fn new(config: &UniverseConfig) -> Self {
        Self {
            global_seed: config.global_seed,
        }
    }

    /// `size × size` zones for a planet.
    pub fn generate(&self, planet_id: &str, size: u32) -> ZoneGrid {
        generate_pass(self.planet_seed(planet_id), size, &STANDARD_PASS)
    }

    /// Zones for a newly assigned starting planet. If mining, power, or
    /// agricultural cover less than 15% of cells, the grid is regenerated
    /// once from a salted seed with flatter noise. Single best-effort retry;
    /// the result is not guaranteed balanced.
    pub fn generate_balanced(&self, planet_id: &str, size: u32) -> ZoneGrid {
        let zones = self.generate(planet_id, size);
        let counts = ZoneCounts::of(&zones);
        if counts.is_balanced(BALANCE_MIN_SHARE) {
            return zones;
        }

        log::debug!(
            "Rebalancing zones for {} (mining {}, power {}, agricultural {})",
            planet_id,
            counts.mining,
            counts.power,
            counts.agricultural
        );
        let salted = self.planet_seed(planet_id).combine("balanced");
        generate_pass(salted, size, &BALANCED_PASS)
    }

    fn planet_seed(&self, planet_id: &str) -> Seed {
        Seed::new(self.global_seed).combine("planet").combine(planet_id)
    }
}

impl Default for PlanetZoneGenerator {
    fn default() -> Self {
        Self::new(&UniverseConfig::default())
    }
}

fn generate_pass(seed: Seed, size: u32, pass: &ZonePass) -> ZoneGrid {
    let resource = seed.combine("resource").noise();
    let fertility = seed.combine("fertility").noise();
    let energy = seed.combine("energy").noise();

    (0..size)
        .map(|y| {
            (0..size)
                .map(|x| {
                    // Cell centres, off the noise lattice.
                    let (cx, cy) = (x as f64 + 0.5, y as f64 + 0.5);
                    let r = sample(&resource, cx, cy, pass.resource);
                    let f = sample(&fertility, cx, cy, pass.fertility);
                    let e = sample(&energy, cx, cy, pass.energy);
                    Zone::new(classify_zone(r, f, e))
                })
                .collect()
        })
        .collect()
}

#[inline]
fn sample(field: &NoiseField, x: f64, y: f64, spec: FieldSpec) -> f64 {
    normalize(fbm(field, x * spec.spacing, y * spec.spacing, spec.fbm))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_is_square_for_every_size() {
        let gen = PlanetZoneGenerator::default();
        for size in 4..=7 {
            let zones = gen.generate("N1E1_11", size);
            assert_eq!(zones.len(), size as usize);
            assert!(zones.iter().all(|row| row.len() == size as usize));

            let balanced = gen.generate_balanced("N1E1_11", size);
            assert_eq!(balanced.len(), size as usize);
            assert!(balanced.iter().all(|row| row.len() == size as usize));
        }
    }

    #[test]
    fn zones_are_deterministic() {
        let gen = PlanetZoneGenerator::default();
        assert_eq!(gen.generate("S3W2_40", 6), gen.generate("S3W2_40", 6));
        assert_eq!(
            gen.generate_balanced("S3W2_40", 6),
            gen.generate_balanced("S3W2_40", 6)
        );
    }

    #[test]
    fn balanced_grid_is_unchanged_when_already_balanced() {
        let gen = PlanetZoneGenerator::default();
        for i in 0..40 {
            let id = format!("E{}_{}", i, i % 81);
            let zones = gen.generate(&id, 7);
            if ZoneCounts::of(&zones).is_balanced(0.15) {
                assert_eq!(gen.generate_balanced(&id, 7), zones);
            }
        }
    }

    #[test]
    fn classify_picks_strongest_field() {
        assert_eq!(classify_zone(0.9, 0.5, 0.5), ZoneType::Mining);
        assert_eq!(classify_zone(0.5, 0.9, 0.5), ZoneType::Agricultural);
        assert_eq!(classify_zone(0.5, 0.5, 0.9), ZoneType::Power);
    }

    #[test]
    fn classify_weak_fields_are_wasteland() {
        assert_eq!(classify_zone(0.2, 0.1, 0.25), ZoneType::Wasteland);
        assert_eq!(classify_zone(0.35, 0.1, 0.2), ZoneType::Wasteland);
        assert_eq!(classify_zone(0.4, 0.4, 0.4), ZoneType::Wasteland);
    }

    #[test]
    fn classify_ties_prefer_resource() {
        assert_eq!(classify_zone(0.8, 0.8, 0.8), ZoneType::Mining);
        assert_eq!(classify_zone(0.1, 0.8, 0.8), ZoneType::Agricultural);
    }

    #[test]
    fn counts_and_balance() {
        let grid: ZoneGrid = vec![
            vec![Zone::new(ZoneType::Mining), Zone::new(ZoneType::Power)],
            vec![Zone::new(ZoneType::Agricultural), Zone::new(ZoneType::Wasteland)],
        ];
        let counts = ZoneCounts::of(&grid);
        assert_eq!(counts.total(), 4);
        assert!(counts.is_balanced(0.15));

        let all_waste = vec![vec![Zone::new(ZoneType::Wasteland); 4]; 4];
        assert!(!ZoneCounts::of(&all_waste).is_balanced(0.15));
    }
}
