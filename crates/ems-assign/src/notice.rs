//! Hospital pre-arrival notices.

use ems_core::{Category, Hospital, HospitalId, Incident, IncidentId, Severity, VehicleId};

/// Sent to the receiving hospital once a vehicle and hospital are chosen.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HandoffNotice {
    pub incident:            IncidentId,
    pub vehicle:             VehicleId,
    pub hospital:            HospitalId,
    pub hospital_name:       String,
    pub severity:            Severity,
    pub category:            Category,
    /// Vehicle's estimated minutes to the scene.
    pub eta_minutes:         u32,
    pub golden_hour_minutes: Option<u32>,
    pub resources:           Vec<String>,
}

impl HandoffNotice {
    pub fn new(incident: &Incident, vehicle: VehicleId, hospital: &Hospital, eta_minutes: u32) -> Self {
        Self {
            incident: incident.id,
            vehicle,
            hospital: hospital.id,
            hospital_name: hospital.name.clone(),
            severity: incident.severity,
            category: incident.category,
            eta_minutes,
            golden_hour_minutes: incident.severity.golden_hour_minutes(),
            resources: required_resources(incident.severity, incident.category)
                .into_iter()
                .map(str::to_owned)
                .collect(),
        }
    }
}

/// What the emergency department should have ready.
///
/// High severity always adds a crash cart and ER team; the category adds its
/// own pair.  If nothing applies the list is just "General ER".
pub fn required_resources(severity: Severity, category: Category) -> Vec<&'static str> {
    let mut out = Vec::new();
    if severity == Severity::High {
        out.extend(["Crash Cart", "ER Team Standby"]);
    }
    match category {
        Category::Cardiac     => out.extend(["Cardiac Monitor", "Cath Lab Prep"]),
        Category::Trauma      => out.extend(["Trauma Bay", "Blood Bank Alert"]),
        Category::Burns       => out.extend(["Burn Ward", "IV Fluids"]),
        Category::Respiratory => out.extend(["Ventilator", "O2 Supply"]),
        Category::Accident    => out.extend(["X-Ray", "Ortho Standby"]),
        Category::Neurological | Category::Other => {}
    }
    if out.is_empty() {
        out.push("General ER");
    }
    out
}
