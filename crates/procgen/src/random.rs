//! Seeded random streams and coherent noise.
//!
//! **Seed-based determinism:** every value produced here is a pure function of
//! a [`Seed`] plus call order (streams) or coordinates (noise). Seeds are
//! derived by hashing, never from process state, so the same seed yields the
//! same galaxy and zone layout on every run.

use noise::{NoiseFn, Simplex};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// A 64-bit generation seed. Built from an integer or a string and
/// decorrelated per purpose with [`Seed::combine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Seed(u64);

impl Seed {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Hash a string into a seed (FNV-1a, then finalised).
    pub fn from_text(text: &str) -> Self {
        Self(mix64(fnv1a(text.as_bytes())))
    }

    pub fn value(self) -> u64 {
        self.0
    }

    /// Derive an independent seed for a named purpose, e.g. `"density"`.
    /// Same base and part always give the same result; different parts give
    /// unrelated seeds.
    pub fn combine(self, part: &str) -> Self {
        let h = fnv1a(part.as_bytes());
        Self(mix64(self.0.rotate_left(17) ^ h ^ 0x9e37_79b9_7f4a_7c15))
    }

    /// [`Seed::combine`] folded over several parts.
    pub fn combine_all(self, parts: &[&str]) -> Self {
        parts.iter().fold(self, |seed, part| seed.combine(part))
    }

    /// Sequential random stream for this seed.
    pub fn stream(self) -> RandomStream {
        RandomStream::derive(self)
    }

    /// Coherent noise field for this seed.
    pub fn noise(self) -> NoiseField {
        NoiseField::new(self)
    }
}

impl From<u64> for Seed {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Seed {
    fn from(text: &str) -> Self {
        Self::from_text(text)
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}

/// SplitMix64 finaliser.
fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Stateful, sequential pseudo-random stream. ChaCha8 keeps the sequence
/// stable across platforms and `rand` releases.
#[derive(Debug, Clone)]
pub struct RandomStream {
    rng: ChaCha8Rng,
}

impl RandomStream {
    pub fn derive(seed: Seed) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed.value()),
        }
    }

    /// Next value in [0, 1).
    pub fn next_float(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Uniform index in `0..len`. `len` must be non-zero.
    pub fn pick_index(&mut self, len: usize) -> usize {
        ((self.next_float() * len as f64) as usize).min(len.saturating_sub(1))
    }
}

/// Derive a deterministic u32 noise seed from a 64-bit seed.
#[inline]
fn noise_seed(seed: Seed) -> u32 {
    (seed
        .value()
        .wrapping_mul(0x9e37_79b9_7f4a_7c15)
        .wrapping_add(0x6c07_8965)
        >> 32) as u32
}

/// Stateless coherent noise for one seed. Nearby coordinates give nearby
/// values; every sample is clamped to [-1, 1].
pub struct NoiseField {
    seed: Seed,
    simplex: Simplex,
}

impl NoiseField {
    pub fn new(seed: Seed) -> Self {
        Self {
            seed,
            simplex: Simplex::new(noise_seed(seed)),
        }
    }

    pub fn seed(&self) -> Seed {
        self.seed
    }

    pub fn sample_2d(&self, x: f64, y: f64, scale: f64) -> f64 {
        self.simplex.get([x * scale, y * scale]).clamp(-1.0, 1.0)
    }

    pub fn sample_3d(&self, x: f64, y: f64, z: f64, scale: f64) -> f64 {
        self.simplex
            .get([x * scale, y * scale, z * scale])
            .clamp(-1.0, 1.0)
    }
}

impl std::fmt::Debug for NoiseField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoiseField").field("seed", &self.seed).finish()
    }
}

/// Octave settings for [`fbm`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FbmParams {
    /// Number of noise layers.
    pub octaves: u32,
    /// Amplitude multiplier per octave.
    pub persistence: f64,
    /// Frequency multiplier per octave.
    pub lacunarity: f64,
    /// Frequency of the first octave.
    pub scale: f64,
}

impl FbmParams {
    pub const fn new(octaves: u32, persistence: f64, lacunarity: f64, scale: f64) -> Self {
        Self {
            octaves,
            persistence,
            lacunarity,
            scale,
        }
    }
}

impl Default for FbmParams {
    fn default() -> Self {
        Self::new(4, 0.5, 2.0, 1.0)
    }
}

/// Fractional Brownian motion: `octaves` layers of 2D noise with rising
/// frequency and falling amplitude, normalised by total amplitude so the
/// result stays in [-1, 1].
pub fn fbm(field: &NoiseField, x: f64, y: f64, params: FbmParams) -> f64 {
    let mut total = 0.0;
    let mut frequency = params.scale;
    let mut amplitude = 1.0;
    let mut max_value = 0.0;

    for _ in 0..params.octaves {
        total += field.sample_2d(x, y, frequency) * amplitude;
        max_value += amplitude;
        amplitude *= params.persistence;
        frequency *= params.lacunarity;
    }

    if max_value > 0.0 {
        (total / max_value).clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Map a noise value from [-1, 1] to [0, 1].
#[inline]
pub fn normalize(value: f64) -> f64 {
    (value + 1.0) * 0.5
}

/// Map a noise value from [-1, 1] linearly onto [min, max].
#[inline]
pub fn map_range(value: f64, min: f64, max: f64) -> f64 {
    min + normalize(value) * (max - min)
}
