//! Ambulance scoring.

use std::cmp::Ordering;

use ems_core::{Incident, Severity, Vehicle, VehicleClass, VehicleId};

use crate::VehicleWeights;

/// One scored candidate.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehicleScore {
    pub vehicle:          VehicleId,
    pub distance_km:      f64,
    pub distance_score:   f64,
    pub capability_score: f64,
    pub affinity_score:   f64,
    pub total:            f64,
}

/// High-severity incidents want an advanced unit (1.0, else 0.1); everything
/// else mildly prefers a basic unit (0.9) but still accepts an advanced one
/// (0.6).
pub fn capability_score(severity: Severity, class: VehicleClass) -> f64 {
    match (severity, class) {
        (Severity::High, VehicleClass::Advanced) => 1.0,
        (Severity::High, VehicleClass::Basic)    => 0.1,
        (_, VehicleClass::Basic)                 => 0.9,
        (_, VehicleClass::Advanced)              => 0.6,
    }
}

/// 1.0 when the labels overlap, 0.3 otherwise.
///
/// Case-insensitive.  The labels overlap if the incident area contains the
/// vehicle area, or the vehicle area contains the first word of the incident
/// area.  An empty label never matches.
pub fn area_affinity(incident_area: &str, vehicle_area: &str) -> f64 {
    if areas_overlap(incident_area, vehicle_area) { 1.0 } else { 0.3 }
}

fn areas_overlap(incident_area: &str, vehicle_area: &str) -> bool {
    let incident = incident_area.trim().to_lowercase();
    let vehicle = vehicle_area.trim().to_lowercase();
    if incident.is_empty() || vehicle.is_empty() {
        return false;
    }
    if incident.contains(&vehicle) {
        return true;
    }
    incident
        .split(|c: char| c.is_whitespace() || c == ',')
        .find(|w| !w.is_empty())
        .is_some_and(|first| vehicle.contains(first))
}

/// Score every vehicle in `candidates` for `incident`, best first.
///
/// The distance term is `1 − d / d_max` over this candidate set, so the
/// farthest candidate scores 0 and scores shift with who else is eligible.
/// When every candidate sits on the incident (`d_max = 0`) they all score
/// 1.0.  Equal totals fall back to the shorter distance, then the lower id.
pub fn score_vehicles<'a, I>(incident: &Incident, candidates: I, weights: &VehicleWeights) -> Vec<VehicleScore>
where
    I: IntoIterator<Item = &'a Vehicle>,
{
    let with_dist: Vec<(&Vehicle, f64)> = candidates
        .into_iter()
        .map(|v| (v, v.position.distance_km(incident.position)))
        .collect();
    let max_dist = with_dist.iter().map(|&(_, d)| d).fold(0.0_f64, f64::max);

    let mut scores: Vec<VehicleScore> = with_dist
        .into_iter()
        .map(|(v, d)| {
            let distance_score = if max_dist > 0.0 { 1.0 - d / max_dist } else { 1.0 };
            let capability_score = capability_score(incident.severity, v.class);
            let affinity_score = area_affinity(&incident.area, &v.area);
            let total = weights.distance * distance_score
                + weights.capability * capability_score
                + weights.affinity * affinity_score;
            VehicleScore {
                vehicle: v.id,
                distance_km: d,
                distance_score,
                capability_score,
                affinity_score,
                total,
            }
        })
        .collect();

    scores.sort_by(rank);
    scores
}

/// Best candidate, or `None` for an empty pool.
pub fn select_vehicle<'a, I>(incident: &Incident, candidates: I, weights: &VehicleWeights) -> Option<VehicleScore>
where
    I: IntoIterator<Item = &'a Vehicle>,
{
    score_vehicles(incident, candidates, weights).into_iter().next()
}

fn rank(a: &VehicleScore, b: &VehicleScore) -> Ordering {
    b.total
        .total_cmp(&a.total)
        .then_with(|| a.distance_km.total_cmp(&b.distance_km))
        .then_with(|| a.vehicle.cmp(&b.vehicle))
}
