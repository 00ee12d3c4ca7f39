//! Uniform navigation grid with a traffic overlay.
//!
//! # Data layout
//!
//! One node per grid cell of a bounding box, numbered row-major from the
//! south-west corner.  Each node links to its (up to) 8 grid neighbours.
//! Adjacency is stored in **Compressed Sparse Row (CSR)** form: the
//! neighbours of `NodeId n` occupy
//!
//! ```text
//! edge_to[ node_out_start[n] .. node_out_start[n+1] ]
//! ```
//!
//! with the matching base length (km) in `edge_length_km`.
//!
//! # Lookup
//!
//! `nearest_node` quantises a point to its cell and looks up a `GridCell →
//! NodeId` hash index; cells at the box edge fall back to the surrounding
//! 3×3 block, and points far outside the box fall back to an R-tree.
//!
//! # Traffic
//!
//! The overlay is a separate `edge → multiplier` map keyed by the unordered
//! node pair.  Writes overwrite (last write wins); entries never expire on
//! their own.

use rstar::{AABB, PointDistance, RTree, RTreeObject};
use rustc_hash::{FxHashMap, FxHashSet};

use ems_core::{GeoPoint, NodeId};

use crate::{SpatialError, SpatialResult};

/// Upper bound on grid nodes; protects against a tiny resolution over a
/// large box allocating unbounded memory.
pub const MAX_NODES: usize = 4_000_000;

// ── BoundingBox ───────────────────────────────────────────────────────────────

/// Axis-aligned lat/lng rectangle in decimal degrees.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lng: f64,
    pub max_lat: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    pub const fn new(min_lat: f64, min_lng: f64, max_lat: f64, max_lng: f64) -> Self {
        Self { min_lat, min_lng, max_lat, max_lng }
    }

    /// `true` if `min ≤ max` on both axes.
    pub fn is_well_formed(&self) -> bool {
        self.min_lat <= self.max_lat && self.min_lng <= self.max_lng
    }

    pub fn contains(&self, p: GeoPoint) -> bool {
        (self.min_lat..=self.max_lat).contains(&p.lat)
            && (self.min_lng..=self.max_lng).contains(&p.lng)
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.min_lat + self.max_lat) * 0.5,
            (self.min_lng + self.max_lng) * 0.5,
        )
    }

    fn is_finite(&self) -> bool {
        self.min_lat.is_finite()
            && self.min_lng.is_finite()
            && self.max_lat.is_finite()
            && self.max_lng.is_finite()
    }
}

// ── GridCell ──────────────────────────────────────────────────────────────────

/// Quantised grid coordinate: `row` counts resolution steps north of
/// `min_lat`, `col` steps east of `min_lng`.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct GridCell {
    pub row: i64,
    pub col: i64,
}

// ── R-tree node entry ─────────────────────────────────────────────────────────

#[derive(Clone)]
struct NodeEntry {
    point: [f64; 2], // [lat, lng]
    id:    NodeId,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    /// Squared Euclidean distance in degree space; only used to pick a
    /// candidate when the point is nowhere near the grid.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dlat = self.point[0] - point[0];
        let dlng = self.point[1] - point[1];
        dlat * dlat + dlng * dlng
    }
}

// ── NavigationGraph ───────────────────────────────────────────────────────────

/// Grid graph over a bounding box.
///
/// Node and adjacency arrays are `pub` for indexed access in the router's
/// inner loop.  Everything except the traffic overlay is immutable after
/// construction.
pub struct NavigationGraph {
    // ── Node data ─────────────────────────────────────────────────────────
    /// Coordinate of each node.  Indexed by `NodeId`.
    pub node_pos: Vec<GeoPoint>,

    // ── CSR adjacency ─────────────────────────────────────────────────────
    /// Length = `node_count + 1`.
    pub node_out_start: Vec<u32>,
    /// Neighbour at the far end of each edge slot.
    pub edge_to: Vec<NodeId>,
    /// Haversine length of each edge slot, before traffic.
    pub edge_length_km: Vec<f64>,

    bounds:      BoundingBox,
    resolution:  f64,
    rows:        usize,
    cols:        usize,
    cell_index:  FxHashMap<GridCell, NodeId>,
    spatial_idx: RTree<NodeEntry>,
    traffic:     FxHashMap<(NodeId, NodeId), f64>,
}

impl NavigationGraph {
    /// Build the grid for `bounds` at `resolution` degrees per step.
    ///
    /// Rows are `⌊(max_lat − min_lat) / resolution⌋ + 1` (columns likewise),
    /// so a box whose span is an exact multiple of the resolution gets a
    /// node on its far edge.  An inverted box yields a zero-node graph.
    pub fn new(bounds: BoundingBox, resolution: f64) -> SpatialResult<Self> {
        if !resolution.is_finite() || resolution <= 0.0 {
            return Err(SpatialError::InvalidResolution(resolution));
        }
        if !bounds.is_finite() {
            return Err(SpatialError::InvalidBounds);
        }

        let (rows, cols) = if bounds.is_well_formed() {
            (
                steps(bounds.max_lat - bounds.min_lat, resolution),
                steps(bounds.max_lng - bounds.min_lng, resolution),
            )
        } else {
            (0, 0)
        };
        if rows.saturating_mul(cols) > MAX_NODES {
            return Err(SpatialError::GridTooLarge { rows, cols });
        }

        let node_count = rows * cols;
        let mut node_pos = Vec::with_capacity(node_count);
        let mut cell_index = FxHashMap::default();
        cell_index.reserve(node_count);

        for row in 0..rows {
            for col in 0..cols {
                let id = NodeId((row * cols + col) as u32);
                node_pos.push(GeoPoint::new(
                    bounds.min_lat + row as f64 * resolution,
                    bounds.min_lng + col as f64 * resolution,
                ));
                cell_index.insert(GridCell { row: row as i64, col: col as i64 }, id);
            }
        }

        // Nodes are visited in id order, so edges come out already grouped by
        // source and the CSR row pointer can be filled in one pass.
        let mut node_out_start = Vec::with_capacity(node_count + 1);
        let mut edge_to        = Vec::with_capacity(node_count * 8);
        let mut edge_length_km = Vec::with_capacity(node_count * 8);
        node_out_start.push(0u32);

        for row in 0..rows as i64 {
            for col in 0..cols as i64 {
                let here = node_pos[row as usize * cols + col as usize];
                for (dr, dc) in NEIGHBOUR_OFFSETS {
                    let (r, c) = (row + dr, col + dc);
                    if r < 0 || c < 0 || r >= rows as i64 || c >= cols as i64 {
                        continue;
                    }
                    let idx = r as usize * cols + c as usize;
                    edge_to.push(NodeId(idx as u32));
                    edge_length_km.push(here.distance_km(node_pos[idx]));
                }
                node_out_start.push(edge_to.len() as u32);
            }
        }

        let entries: Vec<NodeEntry> = node_pos
            .iter()
            .enumerate()
            .map(|(i, p)| NodeEntry { point: [p.lat, p.lng], id: NodeId(i as u32) })
            .collect();
        let spatial_idx = RTree::bulk_load(entries);

        Ok(Self {
            node_pos,
            node_out_start,
            edge_to,
            edge_length_km,
            bounds,
            resolution,
            rows,
            cols,
            cell_index,
            spatial_idx,
            traffic: FxHashMap::default(),
        })
    }

    /// A graph with no nodes.  Every path query against it is "no route".
    pub fn empty() -> Self {
        Self {
            node_pos:       Vec::new(),
            node_out_start: vec![0],
            edge_to:        Vec::new(),
            edge_length_km: Vec::new(),
            bounds:         BoundingBox::new(0.0, 0.0, 0.0, 0.0),
            resolution:     1.0,
            rows:           0,
            cols:           0,
            cell_index:     FxHashMap::default(),
            spatial_idx:    RTree::new(),
            traffic:        FxHashMap::default(),
        }
    }

    // ── Dimensions ────────────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.node_pos.len()
    }

    /// Number of directed edge slots (each undirected link counts twice).
    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_pos.is_empty()
    }

    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// `(rows, cols)` of the grid.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn node_pos(&self, node: NodeId) -> Option<GeoPoint> {
        self.node_pos.get(node.index()).copied()
    }

    // ── Traversal ─────────────────────────────────────────────────────────

    /// Neighbours of `node` with their base (untrafficked) length in km.
    ///
    /// # Panics
    /// If `node` is out of range.
    #[inline]
    pub fn neighbors(&self, node: NodeId) -> impl Iterator<Item = (NodeId, f64)> + '_ {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        (start..end).map(|i| (self.edge_to[i], self.edge_length_km[i]))
    }

    #[inline]
    pub fn out_degree(&self, node: NodeId) -> usize {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        end - start
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    /// Cell containing `pos` (nearest grid intersection).  Saturates for
    /// points too far out to quantise.
    pub fn cell_of(&self, pos: GeoPoint) -> GridCell {
        GridCell {
            row: ((pos.lat - self.bounds.min_lat) / self.resolution).round() as i64,
            col: ((pos.lng - self.bounds.min_lng) / self.resolution).round() as i64,
        }
    }

    /// Node whose cell contains `pos`.
    ///
    /// If that cell is absent (the point lies just past the box edge), the
    /// surrounding 3×3 block is searched for the node closest by great-circle
    /// distance; lower `NodeId` wins ties.  Points further out snap to the
    /// nearest node by the R-tree.  Returns `None` only for a zero-node graph
    /// or a non-finite coordinate.
    pub fn nearest_node(&self, pos: GeoPoint) -> Option<NodeId> {
        if self.is_empty() || !pos.lat.is_finite() || !pos.lng.is_finite() {
            return None;
        }

        let cell = self.cell_of(pos);
        if let Some(&id) = self.cell_index.get(&cell) {
            return Some(id);
        }

        let mut best: Option<(f64, NodeId)> = None;
        for dr in -1..=1 {
            for dc in -1..=1 {
                let near = GridCell { row: cell.row.saturating_add(dr), col: cell.col.saturating_add(dc) };
                let Some(&id) = self.cell_index.get(&near) else { continue };
                let d = pos.distance_km(self.node_pos[id.index()]);
                let better = match best {
                    None => true,
                    Some((bd, bid)) => d < bd || (d == bd && id < bid),
                };
                if better {
                    best = Some((d, id));
                }
            }
        }
        if let Some((_, id)) = best {
            return Some(id);
        }

        self.spatial_idx
            .nearest_neighbor(&[pos.lat, pos.lng])
            .map(|e| e.id)
    }

    // ── Traffic overlay ───────────────────────────────────────────────────

    /// Set `multiplier` on every edge incident to a node within `radius_km`
    /// (inclusive) of `center`, overwriting earlier values.
    ///
    /// Returns the number of distinct edges written.
    pub fn update_traffic(
        &mut self,
        center:     GeoPoint,
        radius_km:  f64,
        multiplier: f64,
    ) -> SpatialResult<usize> {
        if !multiplier.is_finite() || multiplier < 1.0 {
            return Err(SpatialError::InvalidMultiplier(multiplier));
        }

        let mut written: FxHashSet<(NodeId, NodeId)> = FxHashSet::default();
        for i in 0..self.node_count() {
            if center.distance_km(self.node_pos[i]) > radius_km {
                continue;
            }
            let node = NodeId(i as u32);
            let start = self.node_out_start[i] as usize;
            let end   = self.node_out_start[i + 1] as usize;
            for &other in &self.edge_to[start..end] {
                let key = edge_key(node, other);
                self.traffic.insert(key, multiplier);
                written.insert(key);
            }
        }
        Ok(written.len())
    }

    /// Drop every overlay entry.
    pub fn clear_traffic(&mut self) {
        self.traffic.clear();
    }

    /// Number of edges currently carrying an overlay.
    pub fn traffic_len(&self) -> usize {
        self.traffic.len()
    }

    /// Multiplier on the `a`–`b` edge; 1.0 if none was set.
    #[inline]
    pub fn traffic_multiplier(&self, a: NodeId, b: NodeId) -> f64 {
        self.traffic.get(&edge_key(a, b)).copied().unwrap_or(1.0)
    }

    /// Great-circle length of `a`–`b` times its traffic multiplier.
    ///
    /// # Panics
    /// If either node is out of range.
    #[inline]
    pub fn edge_weight(&self, a: NodeId, b: NodeId) -> f64 {
        self.node_pos[a.index()].distance_km(self.node_pos[b.index()])
            * self.traffic_multiplier(a, b)
    }
}

const NEIGHBOUR_OFFSETS: [(i64, i64); 8] = [
    (-1, -1), (-1, 0), (-1, 1),
    ( 0, -1),          ( 0, 1),
    ( 1, -1), ( 1, 0), ( 1, 1),
];

/// Grid steps along one axis, tolerating float error on exact multiples.
fn steps(span: f64, resolution: f64) -> usize {
    ((span / resolution + 1e-9).floor() as usize).saturating_add(1)
}

#[inline]
fn edge_key(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
    if a <= b { (a, b) } else { (b, a) }
}
