//! Leg planning: pick a path and a simulated duration for one trip.

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use tracing::{debug, warn};

use ems_core::GeoPoint;
use ems_spatial::{NavigationGraph, estimate_travel_minutes, find_path};

use crate::{DispatchConfig, ExternalRouter};

/// Where a planned path came from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RouteSource {
    External,
    Grid,
    StraightLine,
}

/// A path of at least two points plus travel estimates.
#[derive(Clone, Debug, PartialEq)]
pub struct PlannedLeg {
    pub points:       Vec<GeoPoint>,
    /// Expected real driving time.
    pub travel_secs:  f64,
    /// How long the simulated leg takes.
    pub sim_duration: Duration,
    pub source:       RouteSource,
}

impl PlannedLeg {
    /// Real driving time rounded to the nearest minute.
    pub fn eta_minutes(&self) -> u32 {
        (self.travel_secs / 60.0).round() as u32
    }
}

/// Tries the external router, then grid A*, then a straight line.
///
/// The grid path runs between node centres, so the true endpoints are
/// prepended and appended (dropping exact duplicates).  Planning never
/// fails: the straight line is always available.
pub struct Planner<X: ExternalRouter> {
    external:    X,
    speed_kmh:   f64,
    compression: f64,
    min_leg:     Duration,
    timeout:     Duration,
}

impl<X: ExternalRouter> Planner<X> {
    pub fn new(external: X, config: &DispatchConfig) -> Self {
        Self {
            external,
            speed_kmh:   config.average_speed_kmh,
            compression: config.time_compression,
            min_leg:     config.min_leg(),
            timeout:     config.external_timeout(),
        }
    }

    pub fn external(&self) -> &X {
        &self.external
    }

    /// Plan a trip from `from` to `to`.
    ///
    /// The graph lock is taken only for the synchronous grid search, never
    /// across the external call.
    pub async fn plan(&self, graph: &RwLock<NavigationGraph>, from: GeoPoint, to: GeoPoint) -> PlannedLeg {
        if let Some(leg) = self.plan_external(from, to).await {
            return leg;
        }
        let grid = {
            let graph = graph.read().unwrap_or_else(PoisonError::into_inner);
            self.plan_grid(&graph, from, to)
        };
        grid.unwrap_or_else(|| self.straight_line(from, to))
    }

    async fn plan_external(&self, from: GeoPoint, to: GeoPoint) -> Option<PlannedLeg> {
        if !self.external.is_enabled() {
            return None;
        }
        match tokio::time::timeout(self.timeout, self.external.route(from, to)).await {
            Ok(Ok(route)) if route.points.len() < 2 => {
                warn!(points = route.points.len(), "external route too short, falling back to grid");
                None
            }
            Ok(Ok(route)) if !route.points.iter().all(|p| p.is_valid()) => {
                warn!(points = route.points.len(), "external route has out-of-range points, falling back to grid");
                None
            }
            Ok(Ok(route)) => {
                debug!(points = route.points.len(), km = route.distance_km, "external route");
                Some(self.finish(route.points, route.duration_secs, RouteSource::External))
            }
            Ok(Err(e)) => {
                warn!("external routing failed, falling back to grid: {e}");
                None
            }
            Err(_) => {
                warn!(timeout_ms = self.timeout.as_millis() as u64, "external routing timed out, falling back to grid");
                None
            }
        }
    }

    /// Grid A* with the real endpoints attached.  `None` if the graph has no
    /// route or the result collapses to a single point.
    pub fn plan_grid(&self, graph: &NavigationGraph, from: GeoPoint, to: GeoPoint) -> Option<PlannedLeg> {
        let interior = find_path(graph, from, to);
        if interior.is_empty() {
            return None;
        }

        let mut points = Vec::with_capacity(interior.len() + 2);
        points.push(from);
        points.extend(interior);
        points.push(to);
        points.dedup();
        if points.len() < 2 {
            return None;
        }

        let travel_secs = f64::from(estimate_travel_minutes(graph, &points, self.speed_kmh)) * 60.0;
        Some(self.finish(points, travel_secs, RouteSource::Grid))
    }

    pub fn straight_line(&self, from: GeoPoint, to: GeoPoint) -> PlannedLeg {
        let travel_secs = from.distance_km(to) / self.speed_kmh * 3600.0;
        self.finish(vec![from, to], travel_secs, RouteSource::StraightLine)
    }

    /// Simulated duration: `max(min_leg, travel / compression)`.
    pub fn sim_duration(&self, travel_secs: f64) -> Duration {
        Duration::try_from_secs_f64(travel_secs / self.compression)
            .unwrap_or(Duration::ZERO)
            .max(self.min_leg)
    }

    fn finish(&self, points: Vec<GeoPoint>, travel_secs: f64, source: RouteSource) -> PlannedLeg {
        PlannedLeg {
            points,
            travel_secs,
            sim_duration: self.sim_duration(travel_secs),
            source,
        }
    }
}
