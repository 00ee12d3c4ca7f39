//! Routing trait and default A* implementation.
//!
//! # Pluggability
//!
//! Callers route through the [`Router`] trait so a different search (e.g. a
//! precomputed hierarchy) can replace [`AStarRouter`] without touching the
//! dispatch layer.
//!
//! # Cost units
//!
//! Edge cost is great-circle kilometres times the traffic multiplier.  The
//! heuristic is plain great-circle kilometres to the goal node, which never
//! overestimates because every multiplier is ≥ 1.0.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ems_core::{GeoPoint, NodeId};

use crate::network::NavigationGraph;
use crate::{SpatialError, SpatialResult};

/// Average urban emergency-vehicle speed used for ETA estimates.
pub const DEFAULT_SPEED_KMH: f64 = 40.0;

// ── Route ─────────────────────────────────────────────────────────────────────

/// The result of a routing query.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// Nodes to visit in order, source and goal included.
    pub nodes: Vec<NodeId>,
    /// Coordinates of `nodes`.
    pub points: Vec<GeoPoint>,
    /// Sum of traffic-weighted edge lengths in km.
    pub weighted_km: f64,
}

impl Route {
    /// Travel time at `speed_kmh`, rounded to the nearest minute.
    pub fn travel_minutes(&self, speed_kmh: f64) -> u32 {
        minutes(self.weighted_km, speed_kmh)
    }

    /// `true` if source and goal are the same node.
    pub fn is_trivial(&self) -> bool {
        self.nodes.len() <= 1
    }
}

// ── Router trait ──────────────────────────────────────────────────────────────

/// Pluggable shortest-path engine over a [`NavigationGraph`].
///
/// Implementations must be `Send + Sync`; the dispatcher shares one router
/// across every planning task.
pub trait Router: Send + Sync {
    /// Compute a route from `from` to `to`.
    ///
    /// `from == to` yields a single-node route rather than an error.
    fn route(&self, graph: &NavigationGraph, from: NodeId, to: NodeId) -> SpatialResult<Route>;
}

// ── AStarRouter ───────────────────────────────────────────────────────────────

/// A* over the grid with a binary min-heap open set keyed by `f = g + h`.
///
/// Equal `f` values are broken by the lower `NodeId`, so identical inputs
/// produce identical routes on every run.
#[derive(Copy, Clone, Debug, Default)]
pub struct AStarRouter;

impl Router for AStarRouter {
    fn route(&self, graph: &NavigationGraph, from: NodeId, to: NodeId) -> SpatialResult<Route> {
        astar(graph, from, to)
    }
}

/// Open-set entry.  `Ord` is reversed so `BinaryHeap` pops the smallest `f`,
/// then the smallest node id.
#[derive(Copy, Clone, Debug)]
struct Open {
    f:    f64,
    g:    f64,
    node: NodeId,
}

impl Ord for Open {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for Open {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Open {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Open {}

fn astar(graph: &NavigationGraph, from: NodeId, to: NodeId) -> SpatialResult<Route> {
    let n = graph.node_count();
    if from.index() >= n {
        return Err(SpatialError::NodeNotFound(from));
    }
    if to.index() >= n {
        return Err(SpatialError::NodeNotFound(to));
    }

    let goal = graph.node_pos[to.index()];
    if from == to {
        return Ok(Route { nodes: vec![from], points: vec![goal], weighted_km: 0.0 });
    }

    // best_g[v] = cheapest known cost to reach v.
    let mut best_g = vec![f64::INFINITY; n];
    // prev[v] = predecessor on that cheapest path; INVALID for the source.
    let mut prev   = vec![NodeId::INVALID; n];

    best_g[from.index()] = 0.0;
    let mut open = BinaryHeap::new();
    open.push(Open {
        f:    graph.node_pos[from.index()].distance_km(goal),
        g:    0.0,
        node: from,
    });

    while let Some(Open { g, node, .. }) = open.pop() {
        if node == to {
            return Ok(reconstruct(graph, &prev, to, g));
        }

        // Skip stale heap entries.
        if g > best_g[node.index()] {
            continue;
        }

        for (next, base_km) in graph.neighbors(node) {
            let tentative = g + base_km * graph.traffic_multiplier(node, next);
            if tentative < best_g[next.index()] {
                best_g[next.index()] = tentative;
                prev[next.index()] = node;
                open.push(Open {
                    f:    tentative + graph.node_pos[next.index()].distance_km(goal),
                    g:    tentative,
                    node: next,
                });
            }
        }
    }

    Err(SpatialError::NoRoute { from, to })
}

fn reconstruct(graph: &NavigationGraph, prev: &[NodeId], to: NodeId, weighted_km: f64) -> Route {
    let mut nodes = vec![to];
    let mut cur = to;
    while prev[cur.index()] != NodeId::INVALID {
        cur = prev[cur.index()];
        nodes.push(cur);
    }
    nodes.reverse();
    let points = nodes.iter().map(|n| graph.node_pos[n.index()]).collect();
    Route { nodes, points, weighted_km }
}

// ── Point-to-point helpers ────────────────────────────────────────────────────

/// Grid path between two arbitrary coordinates, as node coordinates from the
/// start's nearest node to the end's nearest node.
///
/// Returns an empty vector when no route exists (including a zero-node
/// graph); callers must treat that as "no route", never as a zero-length
/// trip.  Both endpoints in the same cell yield a single point.
pub fn find_path(graph: &NavigationGraph, start: GeoPoint, end: GeoPoint) -> Vec<GeoPoint> {
    let (Some(from), Some(to)) = (graph.nearest_node(start), graph.nearest_node(end)) else {
        return Vec::new();
    };
    AStarRouter
        .route(graph, from, to)
        .map(|r| r.points)
        .unwrap_or_default()
}

/// Estimated minutes to drive `path` at `speed_kmh`, rounded.
///
/// Each consecutive pair contributes its great-circle length times the
/// traffic multiplier between the pair's nearest nodes.  Paths with fewer
/// than two points take 0 minutes.
pub fn estimate_travel_minutes(graph: &NavigationGraph, path: &[GeoPoint], speed_kmh: f64) -> u32 {
    let weighted_km: f64 = path
        .windows(2)
        .map(|w| {
            let multiplier = match (graph.nearest_node(w[0]), graph.nearest_node(w[1])) {
                (Some(a), Some(b)) if a != b => graph.traffic_multiplier(a, b),
                _ => 1.0,
            };
            w[0].distance_km(w[1]) * multiplier
        })
        .sum();
    minutes(weighted_km, speed_kmh)
}

/// `km / speed` in minutes, rounded.  Non-positive speeds give 0.
fn minutes(km: f64, speed_kmh: f64) -> u32 {
    if speed_kmh.is_nan() || speed_kmh <= 0.0 {
        return 0;
    }
    (km / speed_kmh * 60.0).round() as u32
}
