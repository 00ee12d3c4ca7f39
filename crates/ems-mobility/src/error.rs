use ems_core::{GeoPoint, VehicleId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MobilityError {
    #[error("a path needs at least two points, got {0}")]
    TooFewPoints(usize),

    #[error("path point {0} is outside the valid latitude/longitude range")]
    InvalidCoordinate(GeoPoint),

    #[error("vehicle {0} is already in transit")]
    AlreadyInTransit(VehicleId),
}

pub type MobilityResult<T> = Result<T, MobilityError>;
