//! Core types shared by generation and the economy.
//!
//! This crate provides the foundational types used across the workspace:
//! - Resources, buildings, planets, zones, and saves
//! - The static building table
//! - Configuration values and the error type
//! - Clock abstraction for the tick loop

pub mod building;
pub mod config;
pub mod error;
pub mod planet;
pub mod resources;
pub mod time;

pub use building::*;
pub use config::*;
pub use error::*;
pub use planet::*;
pub use resources::*;
pub use time::*;

// Re-export commonly used types
pub use glam::IVec2;
