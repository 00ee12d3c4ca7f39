//! Spatial-subsystem error type.

use thiserror::Error;

use ems_core::NodeId;

/// Errors produced by `ems-spatial`.
#[derive(Debug, Error)]
pub enum SpatialError {
    #[error("no route from {from} to {to}")]
    NoRoute { from: NodeId, to: NodeId },

    #[error("node {0} not found in graph")]
    NodeNotFound(NodeId),

    #[error("grid resolution must be a positive, finite number of degrees (got {0})")]
    InvalidResolution(f64),

    #[error("bounding box has a non-finite corner")]
    InvalidBounds,

    #[error("grid of {rows}x{cols} cells exceeds the node limit")]
    GridTooLarge { rows: usize, cols: usize },

    #[error("traffic multiplier must be finite and >= 1.0 (got {0})")]
    InvalidMultiplier(f64),
}

pub type SpatialResult<T> = Result<T, SpatialError>;
