//! Fallback location policies for incidents whose position could not be
//! extracted from the caller's description.
//!
//! The policy is pluggable: a control room may prefer a fixed rendezvous
//! point, while a demo deployment scatters unlocated calls around the city
//! so they remain visible on a map.
//!
//! # Determinism
//!
//! [`JitterLocation`] owns a `SmallRng` seeded from a caller-supplied seed,
//! so the same seed always yields the same sequence of points.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::GeoPoint;

/// Supplies a coordinate when triage produced none.
pub trait FallbackLocation: Send {
    fn fallback_point(&mut self) -> GeoPoint;
}

// ── FixedLocation ─────────────────────────────────────────────────────────────

/// Always returns the same point.
#[derive(Copy, Clone, Debug)]
pub struct FixedLocation(pub GeoPoint);

impl FallbackLocation for FixedLocation {
    fn fallback_point(&mut self) -> GeoPoint {
        self.0
    }
}

// ── JitterLocation ────────────────────────────────────────────────────────────

/// Uniformly random point in the box
/// `[origin.lat, origin.lat + span_lat] × [origin.lng, origin.lng + span_lng]`.
pub struct JitterLocation {
    origin:   GeoPoint,
    span_lat: f64,
    span_lng: f64,
    rng:      SmallRng,
}

impl JitterLocation {
    /// Negative spans are treated as zero.
    pub fn new(origin: GeoPoint, span_lat: f64, span_lng: f64, seed: u64) -> Self {
        Self {
            origin,
            span_lat: span_lat.max(0.0),
            span_lng: span_lng.max(0.0),
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl FallbackLocation for JitterLocation {
    fn fallback_point(&mut self) -> GeoPoint {
        // `gen::<f64>()` is in [0, 1), so zero spans collapse to `origin`
        // without tripping `gen_range`'s empty-range panic.
        let dlat = self.rng.r#gen::<f64>() * self.span_lat;
        let dlng = self.rng.r#gen::<f64>() * self.span_lng;
        GeoPoint::new(self.origin.lat + dlat, self.origin.lng + dlng)
    }
}
