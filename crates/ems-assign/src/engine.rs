//! The `AssignmentEngine`: one incident in, one decision out.

use tracing::debug;

use ems_core::{Hospital, Incident, IncidentId, IncidentStatus, Vehicle, VehicleId, VehicleStatus};

use crate::{
    AssignResult, BusyIndex, HospitalScore, HospitalWeights, VehicleScore, VehicleWeights,
    select_hospital, select_vehicle,
};

/// A chosen vehicle and (if any hospital has a position) a chosen hospital.
#[derive(Clone, Debug, PartialEq)]
pub struct Assignment {
    pub incident: IncidentId,
    pub vehicle:  VehicleScore,
    pub hospital: Option<HospitalScore>,
}

/// Outcome of one assignment attempt.  None of these are errors.
#[derive(Clone, Debug, PartialEq)]
pub enum Decision {
    Assign(Assignment),
    /// The candidate pool was empty.  The incident stays unassigned.
    NoVehicleAvailable,
    /// The incident already has a vehicle committed; nothing changes.
    AlreadyAssigned { vehicle: Option<VehicleId> },
    /// The incident is resolved.
    Closed,
}

/// Scores vehicles and hospitals with configurable weights.
#[derive(Clone, Debug, Default)]
pub struct AssignmentEngine {
    pub vehicle_weights:  VehicleWeights,
    pub hospital_weights: HospitalWeights,
}

impl AssignmentEngine {
    pub fn new(vehicle_weights: VehicleWeights, hospital_weights: HospitalWeights) -> Self {
        Self { vehicle_weights, hospital_weights }
    }

    /// Decide without side effects.
    pub fn assign<'a, V, H>(
        &self,
        incident:  &Incident,
        vehicles:  V,
        hospitals: H,
        busy:      &BusyIndex,
    ) -> Decision
    where
        V: IntoIterator<Item = &'a Vehicle>,
        H: IntoIterator<Item = &'a Hospital>,
    {
        if incident.status == IncidentStatus::Resolved {
            return Decision::Closed;
        }
        let held = busy.vehicle_for(incident.id);
        if incident.status.is_active() || held.is_some() {
            return Decision::AlreadyAssigned { vehicle: incident.assigned_vehicle.or(held) };
        }

        // Eligible: available and not claimed by any incident.
        let pool = vehicles
            .into_iter()
            .filter(|v| v.status == VehicleStatus::Available && !busy.is_busy(v.id));
        let Some(vehicle) = select_vehicle(incident, pool, &self.vehicle_weights) else {
            return Decision::NoVehicleAvailable;
        };
        let hospital = select_hospital(
            incident.position,
            incident.category,
            hospitals,
            &self.hospital_weights,
        );

        Decision::Assign(Assignment { incident: incident.id, vehicle, hospital })
    }

    /// Decide and, on [`Decision::Assign`], record the claim in `busy`.
    ///
    /// The caller must hold whatever lock guards `busy` for the whole call.
    pub fn assign_and_claim<'a, V, H>(
        &self,
        incident:  &Incident,
        vehicles:  V,
        hospitals: H,
        busy:      &mut BusyIndex,
    ) -> AssignResult<Decision>
    where
        V: IntoIterator<Item = &'a Vehicle>,
        H: IntoIterator<Item = &'a Hospital>,
    {
        let decision = self.assign(incident, vehicles, hospitals, busy);
        if let Decision::Assign(a) = &decision {
            busy.claim(a.vehicle.vehicle, incident.id)?;
            debug!(
                incident = %incident.id,
                vehicle = %a.vehicle.vehicle,
                score = a.vehicle.total,
                distance_km = a.vehicle.distance_km,
                hospital = ?a.hospital.as_ref().map(|h| h.hospital),
                "vehicle claimed"
            );
        }
        Ok(decision)
    }
}
