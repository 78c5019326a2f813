mod error;
mod ids;

pub use error::{GameError, Result};
pub use ids::{CityId, PlayerId, WorldId};
