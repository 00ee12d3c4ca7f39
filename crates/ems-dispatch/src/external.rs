//! Optional road routing from an external service.
//!
//! When an external router answers, its geometry and duration replace the
//! grid path for realism.  Any failure is recoverable: the
//! [`Planner`][crate::Planner] falls back to the grid.

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use ems_core::GeoPoint;

/// Public OSRM instances, tried in this order.
pub const OSRM_ENDPOINTS: [&str; 3] = [
    "https://router.project-osrm.org/route/v1/driving/",
    "https://routing.openstreetmap.de/routed-car/route/v1/driving/",
    "https://osrm.overpass-api.de/route/v1/driving/",
];

#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("routing unavailable: {0}")]
    Unavailable(String),

    #[error("routing request timed out")]
    Timeout,

    #[error("malformed routing response: {0}")]
    Malformed(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// A road route: geometry, length, and expected real driving time.
#[derive(Clone, Debug, PartialEq)]
pub struct ExternalRoute {
    pub points:        Vec<GeoPoint>,
    pub distance_km:   f64,
    pub duration_secs: f64,
}

/// Road router consulted before the internal grid.
///
/// The returned future must be `Send`: the dispatcher awaits it from spawned
/// tasks.
pub trait ExternalRouter: Send + Sync + 'static {
    fn route(
        &self,
        from: GeoPoint,
        to:   GeoPoint,
    ) -> impl Future<Output = Result<ExternalRoute, RoutingError>> + Send;

    /// `false` lets the planner skip the call (and its warning) entirely.
    fn is_enabled(&self) -> bool {
        true
    }
}

// ── NoExternalRouter ──────────────────────────────────────────────────────────

/// Always unavailable; every leg uses the grid.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoExternalRouter;

impl ExternalRouter for NoExternalRouter {
    async fn route(&self, _from: GeoPoint, _to: GeoPoint) -> Result<ExternalRoute, RoutingError> {
        Err(RoutingError::Unavailable("no external router configured".into()))
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

// ── OsrmRouter ────────────────────────────────────────────────────────────────

/// OSRM `route/v1/driving` client.
///
/// Each base URL is tried in order; the first usable answer wins.  The
/// geometry is requested as GeoJSON, whose coordinates are `[lng, lat]`.
pub struct OsrmRouter {
    client:    reqwest::Client,
    endpoints: Vec<String>,
}

impl OsrmRouter {
    /// `timeout` bounds each HTTP request.
    pub fn new(endpoints: Vec<String>, timeout: Duration) -> Result<Self, RoutingError> {
        if endpoints.is_empty() {
            return Err(RoutingError::Unavailable("no OSRM endpoints configured".into()));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoints })
    }

    /// The public instances in [`OSRM_ENDPOINTS`].
    pub fn public(timeout: Duration) -> Result<Self, RoutingError> {
        Self::new(OSRM_ENDPOINTS.iter().map(|s| (*s).to_owned()).collect(), timeout)
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    async fn query(&self, base: &str, from: GeoPoint, to: GeoPoint) -> Result<ExternalRoute, RoutingError> {
        let url = request_url(base, from, to);
        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() { RoutingError::Timeout } else { RoutingError::Http(e) }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RoutingError::Unavailable(format!("{base} returned {status}")));
        }
        let body = response.text().await?;
        parse_osrm_response(&body)
    }
}

impl ExternalRouter for OsrmRouter {
    async fn route(&self, from: GeoPoint, to: GeoPoint) -> Result<ExternalRoute, RoutingError> {
        let mut last = RoutingError::Unavailable("no endpoints tried".into());
        for base in &self.endpoints {
            match self.query(base, from, to).await {
                Ok(route) => return Ok(route),
                Err(e) => {
                    debug!(endpoint = %base, "OSRM endpoint failed: {e}");
                    last = e;
                }
            }
        }
        Err(last)
    }
}

/// `{base}{lng},{lat};{lng},{lat}?overview=full&geometries=geojson`
pub fn request_url(base: &str, from: GeoPoint, to: GeoPoint) -> String {
    format!(
        "{base}{},{};{},{}?overview=full&geometries=geojson",
        from.lng, from.lat, to.lng, to.lat
    )
}

// ── Response parsing ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct OsrmResponse {
    code:   String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Deserialize)]
struct OsrmRoute {
    /// Metres.
    distance: f64,
    /// Seconds.
    duration: f64,
    geometry: OsrmGeometry,
}

#[derive(Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<[f64; 2]>,
}

/// Decode an OSRM route response body into the first route.
///
/// A non-`Ok` code, an empty route list, fewer than two coordinates, an
/// out-of-range coordinate, or a negative/non-finite duration is
/// [`RoutingError::Malformed`].
pub fn parse_osrm_response(body: &str) -> Result<ExternalRoute, RoutingError> {
    let parsed: OsrmResponse =
        serde_json::from_str(body).map_err(|e| RoutingError::Malformed(e.to_string()))?;
    if parsed.code != "Ok" {
        return Err(RoutingError::Malformed(format!("response code {:?}", parsed.code)));
    }
    let route = parsed
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| RoutingError::Malformed("no routes".into()))?;

    let points: Vec<GeoPoint> = route
        .geometry
        .coordinates
        .iter()
        .map(|&[lng, lat]| GeoPoint::new(lat, lng))
        .collect();
    if points.len() < 2 {
        return Err(RoutingError::Malformed(format!("{} geometry points", points.len())));
    }
    if let Some(bad) = points.iter().find(|p| !p.is_valid()) {
        return Err(RoutingError::Malformed(format!("coordinate out of range: {bad:?}")));
    }
    if !(route.duration.is_finite() && route.duration >= 0.0) {
        return Err(RoutingError::Malformed(format!("duration {}", route.duration)));
    }

    Ok(ExternalRoute {
        points,
        distance_km:   route.distance / 1000.0,
        duration_secs: route.duration,
    })
}
