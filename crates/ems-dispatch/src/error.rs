use thiserror::Error;

use ems_assign::AssignError;
use ems_core::{CoreError, IncidentId, VehicleId, VehicleStatus};
use ems_mobility::MobilityError;
use ems_spatial::SpatialError;

/// Errors from dispatcher operations.
///
/// Running out of vehicles and re-dispatching an incident that already has
/// one are not errors; see [`DispatchOutcome`][crate::DispatchOutcome].
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("incident {0} not found")]
    IncidentNotFound(IncidentId),

    #[error("vehicle {0} not found")]
    VehicleNotFound(VehicleId),

    #[error("incident {0} is resolved")]
    IncidentResolved(IncidentId),

    #[error("incident {0} already exists")]
    DuplicateIncident(IncidentId),

    #[error("vehicle {0} already exists")]
    DuplicateVehicle(VehicleId),

    #[error("vehicle {vehicle} is committed to incident {incident}")]
    VehicleCommitted { vehicle: VehicleId, incident: IncidentId },

    #[error("status {0} is set by the dispatcher, not by operators")]
    ManagedStatus(VehicleStatus),

    /// The vehicle is still driving, either to a scene or home.
    #[error("vehicle {0} is in transit")]
    VehicleInTransit(VehicleId),

    /// A path was rejected before its leg started (too few points or
    /// coordinates out of range).
    #[error("invalid leg: {0}")]
    Geometry(MobilityError),

    #[error("spatial error: {0}")]
    Spatial(#[from] SpatialError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("assignment error: {0}")]
    Assign(#[from] AssignError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<MobilityError> for DispatchError {
    fn from(e: MobilityError) -> Self {
        match e {
            MobilityError::AlreadyInTransit(vehicle) => Self::VehicleInTransit(vehicle),
            other => Self::Geometry(other),
        }
    }
}

pub type DispatchResult<T> = Result<T, DispatchError>;
