//! Galaxy generation: a square grid of planet slots per galaxy coordinate.
//!
//! Galaxies are addressed by signed grid coordinates written as direction
//! groups (`N1E1`, `S2W3`, `E4`) with `"0"` for the origin. Nothing about a
//! galaxy is stored; [`GalaxyGenerator::generate`] recomputes it from the id
//! on every call, so any number of callers can share one generator.

use std::fmt;
use std::str::FromStr;

use engine_core::{IVec2, PlanetType, UniverseConfig};
use serde::Serialize;
use thiserror::Error;

use crate::random::{fbm, map_range, normalize, FbmParams, NoiseField, Seed};

/// Rejection reasons from the strict galaxy id parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GalaxyIdError {
    #[error("galaxy id is empty")]
    Empty,
    #[error("unexpected character {0:?} in galaxy id")]
    UnexpectedChar(char),
    #[error("direction {0} has no magnitude")]
    MissingMagnitude(char),
    #[error("axis given twice in galaxy id")]
    DuplicateAxis,
    #[error("magnitude out of range")]
    MagnitudeOverflow,
}

/// A galaxy coordinate. `x` grows east, `y` grows north.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GalaxyId {
    pub coord: IVec2,
}

impl GalaxyId {
    pub const ORIGIN: GalaxyId = GalaxyId { coord: IVec2::ZERO };

    pub fn new(x: i32, y: i32) -> Self {
        Self {
            coord: IVec2::new(x, y),
        }
    }

    /// Parse, resolving malformed input to the origin. Generation uses this
    /// so every string maps to some galaxy.
    pub fn parse_lenient(id: &str) -> Self {
        match id.parse() {
            Ok(galaxy) => galaxy,
            Err(e) => {
                log::warn!("Malformed galaxy id {:?} ({}), using origin", id, e);
                Self::ORIGIN
            }
        }
    }

    pub fn is_origin(&self) -> bool {
        self.coord == IVec2::ZERO
    }

    /// The surrounding galaxies, row by row from the north-west. Galaxies on
    /// the edge of the coordinate range have fewer than eight.
    pub fn neighbors(&self) -> Vec<GalaxyId> {
        let mut out = Vec::with_capacity(8);
        for dy in [1, 0, -1] {
            for dx in [-1, 0, 1] {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let (Some(x), Some(y)) =
                    (self.coord.x.checked_add(dx), self.coord.y.checked_add(dy))
                else {
                    continue;
                };
                out.push(Self::new(x, y));
            }
        }
        out
    }
}

impl fmt::Display for GalaxyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let IVec2 { x, y } = self.coord;
        if x == 0 && y == 0 {
            return write!(f, "0");
        }
        if y != 0 {
            let dir = if y > 0 { 'N' } else { 'S' };
            write!(f, "{}{}", dir, y.unsigned_abs())?;
        }
        if x != 0 {
            let dir = if x > 0 { 'E' } else { 'W' };
            write!(f, "{}{}", dir, x.unsigned_abs())?;
        }
        Ok(())
    }
}

impl FromStr for GalaxyId {
    type Err = GalaxyIdError;

    /// Strict parse: `"0"` or one or two `[NSEW]<digits>` groups in any
    /// order, case-insensitive, each axis at most once.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(GalaxyIdError::Empty);
        }
        if s == "0" {
            return Ok(Self::ORIGIN);
        }

        let mut x: Option<i32> = None;
        let mut y: Option<i32> = None;
        let mut chars = s.chars().peekable();

        while let Some(c) = chars.next() {
            let dir = c.to_ascii_uppercase();
            if !matches!(dir, 'N' | 'S' | 'E' | 'W') {
                return Err(GalaxyIdError::UnexpectedChar(c));
            }
            let mut digits = String::new();
            while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
                digits.push(d);
                chars.next();
            }
            if digits.is_empty() {
                return Err(GalaxyIdError::MissingMagnitude(dir));
            }
            let magnitude: i32 = digits
                .parse()
                .map_err(|_| GalaxyIdError::MagnitudeOverflow)?;

            let (slot, value) = match dir {
                'N' => (&mut y, magnitude),
                'S' => (&mut y, -magnitude),
                'E' => (&mut x, magnitude),
                _ => (&mut x, -magnitude),
            };
            if slot.replace(value).is_some() {
                return Err(GalaxyIdError::DuplicateAxis);
            }
        }

        Ok(Self::new(x.unwrap_or(0), y.unwrap_or(0)))
    }
}

/// `<galaxyId>_<position>`.
pub fn planet_id(galaxy: &GalaxyId, position: u32) -> String {
    format!("{}_{}", galaxy, position)
}

/// Inverse of [`planet_id`]. `None` if the id has no valid position suffix
/// or the galaxy part does not parse strictly.
pub fn split_planet_id(id: &str) -> Option<(GalaxyId, u32)> {
    let (galaxy, position) = id.rsplit_once('_')?;
    Some((galaxy.parse().ok()?, position.parse().ok()?))
}

/// One occupied galaxy slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanetSlot {
    /// Row-major index: `y * grid + x`.
    pub position: u32,
    #[serde(rename = "type")]
    pub planet_type: PlanetType,
    pub size: u32,
    /// Display position in grid units, jittered inside the cell.
    pub x: f64,
    pub y: f64,
}

/// A generated galaxy: `grid × grid` slots, each a planet or empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Galaxy {
    pub id: String,
    pub grid_x: i32,
    pub grid_y: i32,
    pub slots: Vec<Option<PlanetSlot>>,
}

impl Galaxy {
    /// Occupied slots in position order.
    pub fn planets(&self) -> impl Iterator<Item = &PlanetSlot> {
        self.slots.iter().flatten()
    }

    pub fn occupied_count(&self) -> usize {
        self.planets().count()
    }

    pub fn planet_at(&self, position: u32) -> Option<&PlanetSlot> {
        self.slots.get(position as usize).and_then(Option::as_ref)
    }

    pub fn has_planet_at(&self, position: u32) -> bool {
        self.planet_at(position).is_some()
    }
}

// Cell spacing and octave settings per noise field.
const DENSITY_SPACING: f64 = 0.3;
const DENSITY_FBM: FbmParams = FbmParams::new(3, 0.5, 2.0, 1.0);
const TEMPERATURE_SPACING: f64 = 0.2;
const TEMPERATURE_FBM: FbmParams = FbmParams::new(4, 0.5, 2.0, 1.0);
const MOISTURE_SPACING: f64 = 0.25;
const MOISTURE_FBM: FbmParams = FbmParams::new(4, 0.5, 2.0, 1.0);
const SIZE_SPACING: f64 = 0.15;
const SIZE_FBM: FbmParams = FbmParams::new(3, 0.5, 2.0, 1.0);
/// Display jitter range within a cell.
const JITTER: f64 = 0.3;

/// Classify a planet from normalised temperature and moisture in [0, 1].
///
/// Temperature bands [0, 0.15, 0.3, 0.5, 0.7, 1] each split on moisture:
///
/// | temperature | moisture split |
/// |---|---|
/// | < 0.15 | frozen |
/// | < 0.3 | > 0.5 tundra, else frozen |
/// | < 0.5 | > 0.7 swamp, > 0.4 tropical, else mountain |
/// | < 0.7 | > 0.6 tropical, > 0.3 arid, else mountain |
/// | ≥ 0.7 | > 0.5 lava, else arid |
pub fn classify_planet(temperature: f64, moisture: f64) -> PlanetType {
    if temperature < 0.15 {
        PlanetType::Frozen
    } else if temperature < 0.3 {
        if moisture > 0.5 {
            PlanetType::Tundra
        } else {
            PlanetType::Frozen
        }
    } else if temperature < 0.5 {
        if moisture > 0.7 {
            PlanetType::Swamp
        } else if moisture > 0.4 {
            PlanetType::Tropical
        } else {
            PlanetType::Mountain
        }
    } else if temperature < 0.7 {
        if moisture > 0.6 {
            PlanetType::Tropical
        } else if moisture > 0.3 {
            PlanetType::Arid
        } else {
            PlanetType::Mountain
        }
    } else if moisture > 0.5 {
        PlanetType::Lava
    } else {
        PlanetType::Arid
    }
}

/// The four independent fields of one galaxy.
struct GalaxyFields {
    density: NoiseField,
    temperature: NoiseField,
    moisture: NoiseField,
    size: NoiseField,
}

impl GalaxyFields {
    fn new(base: Seed) -> Self {
        Self {
            density: base.combine("density").noise(),
            temperature: base.combine("temperature").noise(),
            moisture: base.combine("moisture").noise(),
            size: base.combine("size").noise(),
        }
    }
}

/// Pure galaxy generator. Holds only configuration.
#[derive(Debug, Clone)]
pub struct GalaxyGenerator {
    config: UniverseConfig,
}

impl GalaxyGenerator {
    pub fn new(config: UniverseConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &UniverseConfig {
        &self.config
    }

    /// Generate from an id string. Malformed ids resolve to the origin.
    pub fn generate(&self, galaxy_id: &str) -> Galaxy {
        self.generate_at(&GalaxyId::parse_lenient(galaxy_id))
    }

    /// Generate the galaxy at a coordinate.
    pub fn generate_at(&self, galaxy: &GalaxyId) -> Galaxy {
        let grid = self.config.galaxy_grid_size;
        let base = self.galaxy_seed(galaxy);
        let fields = GalaxyFields::new(base);
        let mut jitter = base.stream();

        let mut slots = Vec::with_capacity(self.config.slot_count());
        for gy in 0..grid {
            for gx in 0..grid {
                let (cx, cy) = cell_center(gx, gy);
                let density = normalize(fbm(
                    &fields.density,
                    cx * DENSITY_SPACING,
                    cy * DENSITY_SPACING,
                    DENSITY_FBM,
                ));

                // Lower density noise means occupied.
                if density < self.config.planet_density {
                    let mut slot = self.describe_slot(&fields, gx, gy);
                    slot.x += (jitter.next_float() - 0.5) * JITTER;
                    slot.y += (jitter.next_float() - 0.5) * JITTER;
                    slots.push(Some(slot));
                } else {
                    slots.push(None);
                }
            }
        }

        Galaxy {
            id: galaxy.to_string(),
            grid_x: galaxy.coord.x,
            grid_y: galaxy.coord.y,
            slots,
        }
    }

    /// Describe the slot at `position` as if it were occupied, ignoring the
    /// density field. Used as the fallback when a starting galaxy is empty.
    pub fn forced_slot(&self, galaxy: &GalaxyId, position: u32) -> PlanetSlot {
        let grid = self.config.galaxy_grid_size.max(1);
        let position = position.min(grid * grid - 1);
        let fields = GalaxyFields::new(self.galaxy_seed(galaxy));
        self.describe_slot(&fields, position % grid, position / grid)
    }

    fn galaxy_seed(&self, galaxy: &GalaxyId) -> Seed {
        Seed::new(self.config.global_seed)
            .combine("galaxy")
            .combine(&galaxy.to_string())
    }

    fn describe_slot(&self, fields: &GalaxyFields, gx: u32, gy: u32) -> PlanetSlot {
        let (cx, cy) = cell_center(gx, gy);
        let temperature = fbm(
            &fields.temperature,
            cx * TEMPERATURE_SPACING,
            cy * TEMPERATURE_SPACING,
            TEMPERATURE_FBM,
        );
        let moisture = fbm(
            &fields.moisture,
            cx * MOISTURE_SPACING,
            cy * MOISTURE_SPACING,
            MOISTURE_FBM,
        );
        let size_value = fbm(&fields.size, cx * SIZE_SPACING, cy * SIZE_SPACING, SIZE_FBM);

        let min = self.config.min_planet_size;
        let max = self.config.max_planet_size.max(min);
        let size = (map_range(size_value, min as f64, max as f64 + 1.0).floor() as u32).clamp(min, max);

        PlanetSlot {
            position: gy * self.config.galaxy_grid_size + gx,
            planet_type: classify_planet(normalize(temperature), normalize(moisture)),
            size,
            x: gx as f64,
            y: gy as f64,
        }
    }
}

impl Default for GalaxyGenerator {
    fn default() -> Self {
        Self::new(UniverseConfig::default())
    }
}

/// Sample at cell centres; simplex noise is zero on integer lattice points,
/// which would pin every galaxy's corner cell to the same value.
#[inline]
fn cell_center(gx: u32, gy: u32) -> (f64, f64) {
    (gx as f64 + 0.5, gy as f64 + 0.5)
}
