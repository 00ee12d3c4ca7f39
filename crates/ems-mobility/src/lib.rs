//! `ems-mobility`: vehicle movement along a path over wall-clock time.
//!
//! # Crate layout
//!
//! | Module     | Contents                                                         |
//! |------------|------------------------------------------------------------------|
//! | [`path`]   | `PathSimulation`: interpolated position at any elapsed time      |
//! | [`driver`] | `drive`: tick loop reporting positions through a `PositionSink`  |
//! | [`state`]  | `LegKind`, `LegId`: what a running leg is for                    |
//! | [`store`]  | `LegRegistry`: at most one running leg per vehicle               |
//! | [`error`]  | `MobilityError`, `MobilityResult<T>`                             |
//!
//! # Movement model
//!
//! A leg is a polyline plus a total duration.  Speed along the polyline is
//! constant, so the position at elapsed time `t` is the point a fraction
//! `t / duration` of the way along the cumulative great-circle length.
//! Within a segment coordinates are interpolated linearly, which is close
//! enough at city scale.
//!
//! 1. The dispatcher plans a path and builds a [`PathSimulation`].
//! 2. [`LegRegistry::spawn`] starts one tokio task per leg, refusing a second
//!    leg for a vehicle that is already moving.
//! 3. The task runs [`drive`], which samples the simulation every tick and
//!    reports the exact destination once the duration has elapsed.
//! 4. Cancelling the leg's token stops the loop at the next await point.

pub mod driver;
pub mod error;
pub mod path;
pub mod state;
pub mod store;

#[cfg(test)]
mod tests;

pub use driver::{DriveOutcome, PositionSink, drive};
pub use error::{MobilityError, MobilityResult};
pub use path::PathSimulation;
pub use state::{LegId, LegKind};
pub use store::{ActiveLeg, LegRegistry};
