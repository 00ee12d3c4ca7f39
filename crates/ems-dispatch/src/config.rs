//! Dispatcher configuration.
//!
//! Loaded from JSON.  Every field has a default, so `{}` is a complete
//! configuration covering central Pune:
//!
//! ```json
//! {
//!   "bounds": { "min_lat": 18.40, "min_lng": 73.70, "max_lat": 18.65, "max_lng": 73.95 },
//!   "resolution_deg": 0.01,
//!   "time_compression": 3.0,
//!   "vehicle_weights": { "distance": 0.6 }
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use ems_assign::{HospitalWeights, VehicleWeights};
use ems_spatial::{BoundingBox, DEFAULT_SPEED_KMH};

use crate::external::OSRM_ENDPOINTS;
use crate::{DispatchError, DispatchResult};

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Area covered by the navigation grid.
    pub bounds:                  BoundingBox,
    /// Grid step in degrees.
    pub resolution_deg:          f64,
    /// Assumed average emergency-vehicle speed for ETAs and straight-line legs.
    pub average_speed_kmh:       f64,
    /// Position report interval while driving to an incident.
    pub tick_interval_ms:        u64,
    /// Position report interval while returning to base.
    pub return_tick_interval_ms: u64,
    /// Simulated legs run this many times faster than the estimated real
    /// travel time.
    pub time_compression:        f64,
    /// Floor on a simulated leg's duration.
    pub min_leg_secs:            u64,
    /// Budget for one external routing request, all endpoints included.
    pub external_timeout_ms:     u64,
    /// Base URLs tried in order by [`OsrmRouter`][crate::OsrmRouter].
    pub osrm_endpoints:          Vec<String>,
    /// Dispatch triaged calls immediately and retry the pending queue
    /// whenever a vehicle frees up.
    pub auto_dispatch:           bool,
    pub vehicle_weights:         VehicleWeights,
    pub hospital_weights:        HospitalWeights,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            bounds:                  BoundingBox::new(18.40, 73.70, 18.65, 73.95),
            resolution_deg:          0.01,
            average_speed_kmh:       DEFAULT_SPEED_KMH,
            tick_interval_ms:        1_500,
            return_tick_interval_ms: 2_000,
            time_compression:        3.0,
            min_leg_secs:            30,
            external_timeout_ms:     5_000,
            osrm_endpoints:          OSRM_ENDPOINTS.iter().map(|s| (*s).to_owned()).collect(),
            auto_dispatch:           true,
            vehicle_weights:         VehicleWeights::default(),
            hospital_weights:        HospitalWeights::default(),
        }
    }
}

impl DispatchConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> DispatchResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_path(path: &Path) -> DispatchResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Reject values the dispatcher cannot run with.
    pub fn validate(&self) -> DispatchResult<()> {
        if !self.bounds.is_well_formed() {
            return Err(DispatchError::Config(format!(
                "bounding box {:?} has min greater than max",
                self.bounds
            )));
        }
        if !(self.resolution_deg.is_finite() && self.resolution_deg > 0.0) {
            return Err(DispatchError::Config(format!(
                "resolution_deg must be positive, got {}",
                self.resolution_deg
            )));
        }
        if !(self.average_speed_kmh.is_finite() && self.average_speed_kmh > 0.0) {
            return Err(DispatchError::Config(format!(
                "average_speed_kmh must be positive, got {}",
                self.average_speed_kmh
            )));
        }
        if !(self.time_compression.is_finite() && self.time_compression > 0.0) {
            return Err(DispatchError::Config(format!(
                "time_compression must be positive, got {}",
                self.time_compression
            )));
        }
        if self.tick_interval_ms == 0 || self.return_tick_interval_ms == 0 {
            return Err(DispatchError::Config("tick intervals must be non-zero".into()));
        }
        if !self.vehicle_weights.is_valid() {
            return Err(DispatchError::Config(format!(
                "vehicle weights must be finite and non-negative: {:?}",
                self.vehicle_weights
            )));
        }
        if !self.hospital_weights.is_valid() {
            return Err(DispatchError::Config(format!(
                "hospital weights must be finite and non-negative: {:?}",
                self.hospital_weights
            )));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn return_tick_interval(&self) -> Duration {
        Duration::from_millis(self.return_tick_interval_ms)
    }

    pub fn external_timeout(&self) -> Duration {
        Duration::from_millis(self.external_timeout_ms)
    }

    pub fn min_leg(&self) -> Duration {
        Duration::from_secs(self.min_leg_secs)
    }
}
