//! What a running leg is for.

use std::fmt;

use ems_core::IncidentId;

/// Purpose of a leg.  The dispatcher decides what arrival means from this.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LegKind {
    /// Driving to the scene of an incident.
    ToIncident(IncidentId),
    /// Returning to the home station.
    ToBase,
}

impl fmt::Display for LegKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LegKind::ToIncident(id) => write!(f, "to-incident {id}"),
            LegKind::ToBase         => f.write_str("to-base"),
        }
    }
}

/// Monotonic leg number, unique within one [`LegRegistry`][crate::LegRegistry].
///
/// A finishing task presents its id when deregistering so that a stale task
/// can never evict the leg that replaced it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LegId(pub u64);

impl fmt::Display for LegId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "leg#{}", self.0)
    }
}
