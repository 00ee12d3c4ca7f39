//! `ems-spatial`: navigation grid, traffic overlay, and routing.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                    |
//! |-------------|-------------------------------------------------------------|
//! | [`network`] | `BoundingBox`, `NavigationGraph` (CSR + cell index + R-tree)|
//! | [`router`]  | `Router` trait, `Route`, `AStarRouter`, `find_path`         |
//! | [`error`]   | `SpatialError`, `SpatialResult<T>`                          |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on `BoundingBox`.          |

pub mod error;
pub mod network;
pub mod router;


pub use error::{SpatialError, SpatialResult};
pub use network::{BoundingBox, GridCell, NavigationGraph};
pub use router::{
    AStarRouter, DEFAULT_SPEED_KMH, Route, Router, estimate_travel_minutes, find_path,
};
