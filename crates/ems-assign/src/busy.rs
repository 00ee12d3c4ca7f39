//! The busy index: which incident holds which vehicle.

use rustc_hash::FxHashMap;

use ems_core::{IncidentId, VehicleId};

use crate::{AssignError, AssignResult};

/// Bidirectional `VehicleId ↔ IncidentId` claim map.
///
/// Maintained incrementally so that "is this vehicle free?" and "which
/// vehicle does this incident hold?" are both O(1).  A vehicle stays claimed
/// from assignment until it is back at base (or explicitly released).
#[derive(Clone, Debug, Default)]
pub struct BusyIndex {
    by_vehicle:  FxHashMap<VehicleId, IncidentId>,
    by_incident: FxHashMap<IncidentId, VehicleId>,
}

impl BusyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `incident` holds `vehicle`.
    ///
    /// Claiming a pair that already exists is a no-op.
    ///
    /// # Errors
    ///
    /// - [`AssignError::VehicleBusy`] if another incident holds `vehicle`.
    /// - [`AssignError::IncidentHasVehicle`] if `incident` already holds a
    ///   different vehicle.
    pub fn claim(&mut self, vehicle: VehicleId, incident: IncidentId) -> AssignResult<()> {
        if let Some(&holder) = self.by_vehicle.get(&vehicle) {
            if holder == incident {
                return Ok(());
            }
            return Err(AssignError::VehicleBusy { vehicle, holder });
        }
        if let Some(&held) = self.by_incident.get(&incident) {
            return Err(AssignError::IncidentHasVehicle { incident, vehicle: held });
        }
        self.by_vehicle.insert(vehicle, incident);
        self.by_incident.insert(incident, vehicle);
        Ok(())
    }

    /// Free `vehicle`, returning the incident that held it.
    pub fn release(&mut self, vehicle: VehicleId) -> Option<IncidentId> {
        let incident = self.by_vehicle.remove(&vehicle)?;
        self.by_incident.remove(&incident);
        Some(incident)
    }

    /// Free whatever vehicle `incident` holds.
    pub fn release_incident(&mut self, incident: IncidentId) -> Option<VehicleId> {
        let vehicle = self.by_incident.remove(&incident)?;
        self.by_vehicle.remove(&vehicle);
        Some(vehicle)
    }

    /// Incident currently holding `vehicle`.
    pub fn holder(&self, vehicle: VehicleId) -> Option<IncidentId> {
        self.by_vehicle.get(&vehicle).copied()
    }

    /// Vehicle currently held by `incident`.
    pub fn vehicle_for(&self, incident: IncidentId) -> Option<VehicleId> {
        self.by_incident.get(&incident).copied()
    }

    #[inline]
    pub fn is_busy(&self, vehicle: VehicleId) -> bool {
        self.by_vehicle.contains_key(&vehicle)
    }

    pub fn len(&self) -> usize {
        self.by_vehicle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_vehicle.is_empty()
    }

    /// All `(vehicle, incident)` claims, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (VehicleId, IncidentId)> + '_ {
        self.by_vehicle.iter().map(|(&v, &i)| (v, i))
    }
}
