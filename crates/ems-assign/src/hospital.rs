//! Receiving-hospital scoring.

use std::cmp::Ordering;

use ems_core::{Category, GeoPoint, Hospital, HospitalId};

use crate::HospitalWeights;

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HospitalScore {
    pub hospital:        HospitalId,
    pub distance_km:     f64,
    pub distance_score:  f64,
    pub bed_score:       f64,
    pub trauma_score:    f64,
    pub specialty_score: f64,
    pub total:           f64,
}

/// 1.0 for a cardiac case at a cath-lab hospital, 0.5 for any other case at
/// a cath-lab hospital, 0.0 without a cath lab.
pub fn specialty_score(category: Category, cath_lab: bool) -> f64 {
    match (cath_lab, category) {
        (true, Category::Cardiac) => 1.0,
        (true, _)                 => 0.5,
        (false, _)                => 0.0,
    }
}

/// Score hospitals for a patient at `scene` with `category`, best first.
///
/// Hospitals without a position are skipped.  Distance normalises like the
/// vehicle score; beds normalise by the largest bed count among the
/// located hospitals (at least 1).  Ties go to the nearer hospital, then the
/// lower id.
pub fn score_hospitals<'a, I>(
    scene:     GeoPoint,
    category:  Category,
    hospitals: I,
    weights:   &HospitalWeights,
) -> Vec<HospitalScore>
where
    I: IntoIterator<Item = &'a Hospital>,
{
    let located: Vec<(&Hospital, f64)> = hospitals
        .into_iter()
        .filter_map(|h| h.position.map(|p| (h, p.distance_km(scene))))
        .collect();

    let max_dist = located.iter().map(|&(_, d)| d).fold(0.0_f64, f64::max);
    let max_beds = located
        .iter()
        .map(|(h, _)| h.critical_care_beds)
        .max()
        .unwrap_or(0)
        .max(1) as f64;

    let mut scores: Vec<HospitalScore> = located
        .into_iter()
        .map(|(h, d)| {
            let distance_score = if max_dist > 0.0 { 1.0 - d / max_dist } else { 1.0 };
            let bed_score = h.critical_care_beds as f64 / max_beds;
            let trauma_score = if h.trauma_capable { 1.0 } else { 0.0 };
            let specialty_score = specialty_score(category, h.cath_lab);
            let total = weights.distance * distance_score
                + weights.beds * bed_score
                + weights.trauma * trauma_score
                + weights.specialty * specialty_score;
            HospitalScore {
                hospital: h.id,
                distance_km: d,
                distance_score,
                bed_score,
                trauma_score,
                specialty_score,
                total,
            }
        })
        .collect();

    scores.sort_by(rank);
    scores
}

/// Best hospital, or `None` if no hospital has a position.
pub fn select_hospital<'a, I>(
    scene:     GeoPoint,
    category:  Category,
    hospitals: I,
    weights:   &HospitalWeights,
) -> Option<HospitalScore>
where
    I: IntoIterator<Item = &'a Hospital>,
{
    score_hospitals(scene, category, hospitals, weights).into_iter().next()
}

fn rank(a: &HospitalScore, b: &HospitalScore) -> Ordering {
    b.total
        .total_cmp(&a.total)
        .then_with(|| a.distance_km.total_cmp(&b.distance_km))
        .then_with(|| a.hospital.cmp(&b.hospital))
}
