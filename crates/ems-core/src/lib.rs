//! `ems-core`: foundational types for the emergency dispatch engine.
//!
//! This crate is a dependency of every other `ems-*` crate.  It intentionally
//! has no `ems-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module       | Contents                                                  |
//! |--------------|-----------------------------------------------------------|
//! | [`ids`]      | `NodeId`, `VehicleId`, `IncidentId`, `HospitalId`         |
//! | [`geo`]      | `GeoPoint`, Haversine distance in kilometres              |
//! | [`model`]    | `Vehicle`, `Incident`, `Hospital` and their enums         |
//! | [`fallback`] | `FallbackLocation` policies for unlocated incidents       |
//! | [`error`]    | `CoreError`, `CoreResult`                                 |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod error;
pub mod fallback;
pub mod geo;
pub mod ids;
pub mod model;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use fallback::{FallbackLocation, FixedLocation, JitterLocation};
pub use geo::{GeoPoint, distance_km};
pub use ids::{HospitalId, IncidentId, NodeId, VehicleId};
pub use model::{
    Category, Hospital, Incident, IncidentStatus, Severity, Vehicle, VehicleClass, VehicleStatus,
};
