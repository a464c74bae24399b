//! Errors returned to callers of player actions and session requests.

use thiserror::Error;

use crate::building::BuildingType;
use crate::planet::ZoneType;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("planet {0} is not loaded")]
    PlanetNotLoaded(String),
    #[error("planet {0} does not exist")]
    PlanetNotFound(String),
    #[error("planet {0} is unavailable after a failed update")]
    PlanetUnavailable(String),
    #[error("user {user} does not own planet {planet}")]
    NotOwner { user: String, planet: String },
    #[error("building {0} does not exist")]
    BuildingNotFound(String),
    #[error("cell ({x}, {y}) is outside the planet grid")]
    OutOfBounds { x: u32, y: u32 },
    #[error("cell ({x}, {y}) already holds a building")]
    CellOccupied { x: u32, y: u32 },
    #[error("{building:?} needs a {required:?} zone, cell is {actual:?}")]
    ZoneMismatch {
        building: BuildingType,
        required: ZoneType,
        actual: ZoneType,
    },
    #[error("not enough resources")]
    InsufficientResources,
    #[error("building {0} is already at max level")]
    MaxLevel(String),
    #[error("building {0} is still under construction")]
    BuildingBusy(String),
    #[error("no save exists for user {0}")]
    SaveNotFound(String),
    #[error("persistence failed: {0}")]
    Persistence(String),
    #[error("save data is malformed: {0}")]
    Serialization(String),
}

pub type GameResult<T> = Result<T, GameError>;
