//! Geographic coordinate type and great-circle distance.
//!
//! `GeoPoint` uses `f64` latitude/longitude in decimal degrees.  Paths are
//! interpolated and compared for exact equality at the end of a leg, so the
//! extra precision over `f32` is worth the memory at fleet scale.

use crate::{CoreError, CoreResult};

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6_371.0;

/// A WGS-84 geographic coordinate.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    #[inline]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Construct a point, rejecting anything outside ±90° / ±180° or NaN.
    pub fn try_new(lat: f64, lng: f64) -> CoreResult<Self> {
        let p = Self { lat, lng };
        if p.is_valid() {
            Ok(p)
        } else {
            Err(CoreError::InvalidCoordinate { lat, lng })
        }
    }

    /// `true` if both components are finite and inside the WGS-84 ranges.
    #[inline]
    pub fn is_valid(self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Haversine great-circle distance in kilometres.
    ///
    /// The deltas are taken as absolute values so `a.distance_km(b)` and
    /// `b.distance_km(a)` are bit-for-bit identical, and identical points
    /// give exactly `0.0`.
    pub fn distance_km(self, other: GeoPoint) -> f64 {
        let d_lat = (other.lat - self.lat).abs().to_radians();
        let d_lng = (other.lng - self.lng).abs().to_radians();

        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();

        let a = (d_lat * 0.5).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lng * 0.5).sin().powi(2);

        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_KM * c
    }

    /// Linear interpolation in coordinate space: `t = 0` is `self`, `t = 1`
    /// is `other`.  Not a geodesic; fine for short urban segments.
    #[inline]
    pub fn lerp(self, other: GeoPoint, t: f64) -> GeoPoint {
        GeoPoint {
            lat: self.lat + (other.lat - self.lat) * t,
            lng: self.lng + (other.lng - self.lng) * t,
        }
    }

    /// Approximate bounding-box check, much cheaper than `distance_km` for
    /// quick rejection.
    #[inline]
    pub fn within_bbox(self, center: GeoPoint, half_deg: f64) -> bool {
        (self.lat - center.lat).abs() <= half_deg
            && (self.lng - center.lng).abs() <= half_deg
    }
}

/// Free-function form of [`GeoPoint::distance_km`].
#[inline]
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    a.distance_km(b)
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lng)
    }
}
