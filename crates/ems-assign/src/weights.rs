//! Scoring weights.
//!
//! Defaults reproduce the dispatch policy in use; they are plain data so a
//! deployment can tune them from configuration.

/// Weights for ranking ambulances.  Defaults: distance 0.50, capability
/// 0.30, area affinity 0.20.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct VehicleWeights {
    pub distance:   f64,
    pub capability: f64,
    pub affinity:   f64,
}

impl Default for VehicleWeights {
    fn default() -> Self {
        Self { distance: 0.50, capability: 0.30, affinity: 0.20 }
    }
}

impl VehicleWeights {
    /// Every weight finite and non-negative.
    pub fn is_valid(&self) -> bool {
        [self.distance, self.capability, self.affinity]
            .iter()
            .all(|w| w.is_finite() && *w >= 0.0)
    }
}

/// Weights for ranking receiving hospitals.  Defaults: distance 0.40,
/// critical-care beds 0.25, trauma capability 0.20, specialty 0.15.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HospitalWeights {
    pub distance:  f64,
    pub beds:      f64,
    pub trauma:    f64,
    pub specialty: f64,
}

impl Default for HospitalWeights {
    fn default() -> Self {
        Self { distance: 0.40, beds: 0.25, trauma: 0.20, specialty: 0.15 }
    }
}

impl HospitalWeights {
    pub fn is_valid(&self) -> bool {
        [self.distance, self.beds, self.trauma, self.specialty]
            .iter()
            .all(|w| w.is_finite() && *w >= 0.0)
    }
}
