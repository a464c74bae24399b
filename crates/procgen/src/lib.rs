//! Deterministic universe generation: seeded randomness, galaxies, planet
//! zones, and home planet placement.

pub mod galaxy;
pub mod random;
pub mod starting;
pub mod zones;

pub use galaxy::*;
pub use random::*;
pub use starting::*;
pub use zones::*;
