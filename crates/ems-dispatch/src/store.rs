//! The data-store side of the boundary.
//!
//! [`MemoryStore`] is an in-process stand-in for the external store: it
//! applies [`DispatchUpdate`]s to its own copies of the records.
//! [`StoreChange`] is the opposite direction, an edit that originated in the
//! store (an operator toggling a vehicle off-duty, say) and must be fed back
//! into the dispatcher with [`Dispatcher::apply_change`][crate::Dispatcher::apply_change].

use std::collections::BTreeMap;

use serde::Deserialize;

use ems_assign::HandoffNotice;
use ems_core::{Hospital, Incident, IncidentId, Vehicle, VehicleId, VehicleStatus};

use crate::{DispatchError, DispatchResult, DispatchUpdate, UpdateSink};

// ── StoreChange ───────────────────────────────────────────────────────────────

/// An externally originated edit.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreChange {
    VehicleAdded(Vehicle),
    VehicleStatusSet { vehicle: VehicleId, status: VehicleStatus },
    VehicleDeleted { vehicle: VehicleId },
    HospitalUpserted(Hospital),
    IncidentReported(Incident),
    IncidentResolved { incident: IncidentId },
    IncidentDeleted { incident: IncidentId },
}

// ── MemoryStore ───────────────────────────────────────────────────────────────

/// Record copies kept current by a stream of [`DispatchUpdate`]s.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    pub vehicles:  BTreeMap<VehicleId, Vehicle>,
    pub incidents: BTreeMap<IncidentId, Incident>,
    /// Every hospital notice received, in arrival order.
    pub notices:   Vec<HandoffNotice>,
    /// Number of `VehicleMoved` writes applied.
    pub moves:     usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UpdateSink for MemoryStore {
    fn apply(&mut self, update: DispatchUpdate) -> DispatchResult<()> {
        match update {
            DispatchUpdate::VehicleAdded(v) => {
                self.vehicles.insert(v.id, v);
            }
            DispatchUpdate::VehicleMoved { vehicle, position } => {
                let v = self
                    .vehicles
                    .get_mut(&vehicle)
                    .ok_or(DispatchError::VehicleNotFound(vehicle))?;
                v.position = position;
                self.moves += 1;
            }
            DispatchUpdate::VehicleStatus { vehicle, status } => {
                let v = self
                    .vehicles
                    .get_mut(&vehicle)
                    .ok_or(DispatchError::VehicleNotFound(vehicle))?;
                v.status = status;
            }
            DispatchUpdate::VehicleRemoved { vehicle } => {
                self.vehicles.remove(&vehicle);
            }
            DispatchUpdate::IncidentChanged(incident) => {
                self.incidents.insert(incident.id, incident);
            }
            DispatchUpdate::IncidentRemoved { incident } => {
                self.incidents.remove(&incident);
            }
            DispatchUpdate::HospitalNotified(notice) => self.notices.push(notice),
        }
        Ok(())
    }
}
