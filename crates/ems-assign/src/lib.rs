//! `ems-assign`: who goes, and where the patient is taken.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                       |
//! |--------------|----------------------------------------------------------------|
//! | [`weights`]  | `VehicleWeights`, `HospitalWeights`                            |
//! | [`vehicle`]  | `score_vehicles`, `select_vehicle`, per-factor score functions |
//! | [`hospital`] | `score_hospitals`, `select_hospital`                           |
//! | [`busy`]     | `BusyIndex`: vehicle → incident claims                         |
//! | [`engine`]   | `AssignmentEngine`, `Decision`, `Assignment`                   |
//! | [`notice`]   | `HandoffNotice`, `required_resources`                          |
//! | [`error`]    | `AssignError`, `AssignResult<T>`                               |
//!
//! # Read, decide, claim
//!
//! Scoring is pure: it reads a snapshot of the fleet and hospitals and
//! returns a [`Decision`].  Applying the decision is a separate step.  The
//! exclusivity guarantee (a vehicle serves at most one open incident) holds
//! only if the caller runs [`AssignmentEngine::assign_and_claim`] while
//! holding the same lock that guards the [`BusyIndex`], so that reading the
//! busy set and recording the new claim happen as one step.

pub mod busy;
pub mod engine;
pub mod error;
pub mod hospital;
pub mod notice;
pub mod vehicle;
pub mod weights;

#[cfg(test)]
mod tests;

pub use busy::BusyIndex;
pub use engine::{Assignment, AssignmentEngine, Decision};
pub use error::{AssignError, AssignResult};
pub use hospital::{HospitalScore, score_hospitals, select_hospital, specialty_score};
pub use notice::{HandoffNotice, required_resources};
pub use vehicle::{VehicleScore, area_affinity, capability_score, score_vehicles, select_vehicle};
pub use weights::{HospitalWeights, VehicleWeights};
