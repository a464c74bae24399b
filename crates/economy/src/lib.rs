//! Tick-based economy: production, offline rewards, building actions,
//! persistence, and the player session service.

pub mod actions;
pub mod engine;
pub mod offline;
pub mod persistence;
pub mod production;
pub mod service;

pub use engine::*;
pub use offline::*;
pub use persistence::*;
pub use production::*;
pub use service::*;
