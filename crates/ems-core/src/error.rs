//! Shared error type.
//!
//! Sub-crates define their own error enums and wrap `CoreError` as one
//! variant via `#[from]`.

use thiserror::Error;

use crate::{HospitalId, IncidentId, VehicleId};

/// The top-level error type for `ems-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("coordinate ({lat}, {lng}) is outside the valid latitude/longitude range")]
    InvalidCoordinate { lat: f64, lng: f64 },

    #[error("vehicle {0} not found")]
    VehicleNotFound(VehicleId),

    #[error("incident {0} not found")]
    IncidentNotFound(IncidentId),

    #[error("hospital {0} not found")]
    HospitalNotFound(HospitalId),

    #[error("parse error: {0}")]
    Parse(String),
}

/// Shorthand result type for `ems-core`.
pub type CoreResult<T> = Result<T, CoreError>;
