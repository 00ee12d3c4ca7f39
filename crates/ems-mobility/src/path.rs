//! Position interpolation along a polyline.

use std::time::Duration;

use ems_core::GeoPoint;

use crate::{MobilityError, MobilityResult};

/// A validated path plus a total travel duration.
///
/// Per-segment great-circle lengths are summed once at construction; each
/// `position_at` call is a linear scan over the cumulative array.
#[derive(Clone, Debug)]
pub struct PathSimulation {
    points:        Vec<GeoPoint>,
    /// `cumulative_km[i]` = distance from `points[0]` to `points[i]`.
    cumulative_km: Vec<f64>,
    duration:      Duration,
}

impl PathSimulation {
    /// Validate `points` (at least two, all in range) and precompute lengths.
    pub fn new(points: Vec<GeoPoint>, duration: Duration) -> MobilityResult<Self> {
        if points.len() < 2 {
            return Err(MobilityError::TooFewPoints(points.len()));
        }
        if let Some(bad) = points.iter().find(|p| !p.is_valid()) {
            return Err(MobilityError::InvalidCoordinate(*bad));
        }

        let mut cumulative_km = Vec::with_capacity(points.len());
        let mut total = 0.0;
        cumulative_km.push(0.0);
        for w in points.windows(2) {
            total += w[0].distance_km(w[1]);
            cumulative_km.push(total);
        }

        Ok(Self { points, cumulative_km, duration })
    }

    /// Two-point path from `from` to `to`.
    pub fn straight_line(from: GeoPoint, to: GeoPoint, duration: Duration) -> MobilityResult<Self> {
        Self::new(vec![from, to], duration)
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Great-circle length of the whole path.
    pub fn total_km(&self) -> f64 {
        self.cumulative_km.last().copied().unwrap_or(0.0)
    }

    pub fn origin(&self) -> GeoPoint {
        self.points[0]
    }

    pub fn destination(&self) -> GeoPoint {
        self.points[self.points.len() - 1]
    }

    /// Fraction of the duration elapsed, clamped to `[0, 1]`.  A zero
    /// duration counts as already complete.
    pub fn progress(&self, elapsed: Duration) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }

    /// Interpolated position after `elapsed`.
    ///
    /// Once `elapsed ≥ duration`, or when the path has zero length, this is
    /// exactly the final point.
    pub fn position_at(&self, elapsed: Duration) -> GeoPoint {
        let total = self.total_km();
        if elapsed >= self.duration || total <= 0.0 {
            return self.destination();
        }

        let target = total * self.progress(elapsed);
        for i in 0..self.points.len() - 1 {
            let (start, end) = (self.cumulative_km[i], self.cumulative_km[i + 1]);
            if target > end {
                continue;
            }
            let seg = end - start;
            if seg <= 0.0 {
                return self.points[i + 1];
            }
            return self.points[i].lerp(self.points[i + 1], (target - start) / seg);
        }
        self.destination()
    }
}
