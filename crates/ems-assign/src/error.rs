//! Assignment error type.

use thiserror::Error;

use ems_core::{IncidentId, VehicleId};

#[derive(Debug, Error)]
pub enum AssignError {
    #[error("vehicle {vehicle} is already committed to incident {holder}")]
    VehicleBusy { vehicle: VehicleId, holder: IncidentId },

    #[error("incident {incident} already holds vehicle {vehicle}")]
    IncidentHasVehicle { incident: IncidentId, vehicle: VehicleId },
}

pub type AssignResult<T> = Result<T, AssignError>;
