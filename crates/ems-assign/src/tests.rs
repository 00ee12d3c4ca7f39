//! Unit tests for ems-assign.

use ems_core::{
    Category, GeoPoint, Hospital, HospitalId, Incident, IncidentId, Severity, Vehicle,
    VehicleClass, VehicleId,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Kilometres per degree of latitude on the 6371 km sphere.
const KM_PER_DEG_LAT: f64 = 6_371.0 * std::f64::consts::PI / 180.0;

fn scene() -> GeoPoint {
    GeoPoint::new(18.52, 73.85)
}

/// A point `km` due north of the scene.
fn north_of_scene(km: f64) -> GeoPoint {
    GeoPoint::new(18.52 + km / KM_PER_DEG_LAT, 73.85)
}

fn incident(severity: Severity, category: Category) -> Incident {
    Incident::new(IncidentId(1), scene(), severity, category, "Deccan Gymkhana")
}

fn vehicle(id: u32, class: VehicleClass, km: f64, area: &str) -> Vehicle {
    Vehicle::new(VehicleId(id), format!("PUN-{id}"), class, north_of_scene(km), area)
}

fn hospital(id: u32, km: f64, beds: u32, trauma: bool, cath: bool) -> Hospital {
    let mut h = Hospital::new(HospitalId(id), format!("H{id}"), Some(north_of_scene(km)));
    h.critical_care_beds = beds;
    h.trauma_capable = trauma;
    h.cath_lab = cath;
    h
}

// ── Factor scores ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod factors {
    use super::*;
    use crate::{area_affinity, capability_score, specialty_score};

    #[test]
    fn capability_table() {
        assert_eq!(capability_score(Severity::High, VehicleClass::Advanced), 1.0);
        assert_eq!(capability_score(Severity::High, VehicleClass::Basic), 0.1);
        assert_eq!(capability_score(Severity::Medium, VehicleClass::Basic), 0.9);
        assert_eq!(capability_score(Severity::Low, VehicleClass::Advanced), 0.6);
    }

    #[test]
    fn affinity_matches_either_direction() {
        // Incident area contains vehicle area.
        assert_eq!(area_affinity("Kothrud Depot, Paud Road", "kothrud"), 1.0);
        // Vehicle area contains the incident's first word.
        assert_eq!(area_affinity("Hadapsar near Magarpatta", "Hadapsar-Magarpatta"), 1.0);
        assert_eq!(area_affinity("Aundh", "Hinjewadi"), 0.3);
    }

    #[test]
    fn empty_labels_never_match() {
        assert_eq!(area_affinity("", "Kothrud"), 0.3);
        assert_eq!(area_affinity("Kothrud", ""), 0.3);
        assert_eq!(area_affinity("   ", "  "), 0.3);
    }

    #[test]
    fn specialty_table() {
        assert_eq!(specialty_score(Category::Cardiac, true), 1.0);
        assert_eq!(specialty_score(Category::Trauma, true), 0.5);
        assert_eq!(specialty_score(Category::Cardiac, false), 0.0);
    }
}

// ── Vehicle ranking ───────────────────────────────────────────────────────────

#[cfg(test)]
mod vehicles {
    use super::*;
    use crate::{VehicleWeights, score_vehicles, select_vehicle};

    #[test]
    fn near_basic_beats_far_advanced_at_five_to_one() {
        // Advanced at 5 km: 0.5·0 + 0.3·1.0 + 0.2·0.3 = 0.36
        // Basic at 1 km:    0.5·0.8 + 0.3·0.1 + 0.2·0.3 = 0.49
        let inc = incident(Severity::High, Category::Cardiac);
        let fleet = [
            vehicle(1, VehicleClass::Advanced, 5.0, "Baner"),
            vehicle(2, VehicleClass::Basic, 1.0, "Baner"),
        ];
        let scores = score_vehicles(&inc, &fleet, &VehicleWeights::default());
        assert_eq!(scores[0].vehicle, VehicleId(2));
        assert!((scores[0].total - 0.49).abs() < 1e-9, "{}", scores[0].total);
        assert!((scores[1].total - 0.36).abs() < 1e-9, "{}", scores[1].total);
    }

    #[test]
    fn far_advanced_wins_when_distances_are_close() {
        // Advanced at 5 km: 0.36; basic at 4.5 km: 0.5·0.1 + 0.03 + 0.06 = 0.14
        let inc = incident(Severity::High, Category::Cardiac);
        let fleet = [
            vehicle(1, VehicleClass::Advanced, 5.0, "Baner"),
            vehicle(2, VehicleClass::Basic, 4.5, "Baner"),
        ];
        let best = select_vehicle(&inc, &fleet, &VehicleWeights::default()).unwrap();
        assert_eq!(best.vehicle, VehicleId(1));
    }

    #[test]
    fn nearest_gets_full_distance_score_only_when_farthest_is_far() {
        let inc = incident(Severity::Low, Category::Other);
        let fleet = [
            vehicle(1, VehicleClass::Basic, 2.0, ""),
            vehicle(2, VehicleClass::Basic, 4.0, ""),
        ];
        let scores = score_vehicles(&inc, &fleet, &VehicleWeights::default());
        assert!((scores[0].distance_score - 0.5).abs() < 1e-9);
        assert_eq!(scores[1].distance_score, 0.0);
    }

    #[test]
    fn all_on_scene_score_one() {
        let inc = incident(Severity::Medium, Category::Trauma);
        let fleet = [
            vehicle(4, VehicleClass::Basic, 0.0, ""),
            vehicle(3, VehicleClass::Basic, 0.0, ""),
        ];
        let scores = score_vehicles(&inc, &fleet, &VehicleWeights::default());
        assert!(scores.iter().all(|s| s.distance_score == 1.0));
        // Equal totals and distances: lower id first.
        assert_eq!(scores[0].vehicle, VehicleId(3));
    }

    #[test]
    fn equal_totals_prefer_shorter_distance() {
        // Zero the distance weight so only class/affinity matter.
        let w = VehicleWeights { distance: 0.0, ..VehicleWeights::default() };
        let inc = incident(Severity::Medium, Category::Other);
        let fleet = [
            vehicle(1, VehicleClass::Basic, 3.0, ""),
            vehicle(2, VehicleClass::Basic, 2.0, ""),
        ];
        assert_eq!(select_vehicle(&inc, &fleet, &w).unwrap().vehicle, VehicleId(2));
    }

    #[test]
    fn affinity_can_tip_the_balance() {
        let inc = incident(Severity::Medium, Category::Other);
        let fleet = [
            vehicle(1, VehicleClass::Basic, 1.0, "Hinjewadi"),
            vehicle(2, VehicleClass::Basic, 1.2, "Deccan"),
        ];
        // 1: 0.5·(1−1/1.2) + 0.27 + 0.06 ≈ 0.413 ; 2: 0 + 0.27 + 0.2 = 0.47
        assert_eq!(
            select_vehicle(&inc, &fleet, &VehicleWeights::default()).unwrap().vehicle,
            VehicleId(2)
        );
    }

    #[test]
    fn empty_pool_selects_nothing() {
        let inc = incident(Severity::High, Category::Cardiac);
        let fleet: [Vehicle; 0] = [];
        assert!(select_vehicle(&inc, &fleet, &VehicleWeights::default()).is_none());
    }
}

// ── Hospital ranking ──────────────────────────────────────────────────────────

#[cfg(test)]
mod hospitals {
    use super::*;
    use crate::{HospitalWeights, score_hospitals, select_hospital};

    #[test]
    fn cardiac_prefers_cath_lab() {
        let hs = [
            hospital(1, 2.0, 10, false, false),
            hospital(2, 3.0, 10, false, true),
        ];
        // 1: 0.4·(1/3) + 0.25 = 0.383 ; 2: 0 + 0.25 + 0.15 = 0.40
        let best = select_hospital(scene(), Category::Cardiac, &hs, &HospitalWeights::default());
        assert_eq!(best.unwrap().hospital, HospitalId(2));
    }

    #[test]
    fn beds_normalise_by_maximum() {
        let hs = [
            hospital(1, 1.0, 15, true, false),
            hospital(2, 1.0, 5, true, false),
        ];
        let scores = score_hospitals(scene(), Category::Trauma, &hs, &HospitalWeights::default());
        assert_eq!(scores[0].hospital, HospitalId(1));
        assert_eq!(scores[0].bed_score, 1.0);
        assert!((scores[1].bed_score - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn zero_beds_everywhere_is_not_nan() {
        let hs = [hospital(1, 1.0, 0, false, false), hospital(2, 2.0, 0, false, false)];
        let scores = score_hospitals(scene(), Category::Other, &hs, &HospitalWeights::default());
        assert!(scores.iter().all(|s| s.bed_score == 0.0 && s.total.is_finite()));
    }

    #[test]
    fn unlocated_hospitals_are_skipped() {
        let mut lost = hospital(1, 0.1, 50, true, true);
        lost.position = None;
        let hs = [lost, hospital(2, 8.0, 2, false, false)];
        let scores = score_hospitals(scene(), Category::Cardiac, &hs, &HospitalWeights::default());
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].hospital, HospitalId(2));
    }

    #[test]
    fn nothing_located_selects_nothing() {
        let mut h = hospital(1, 1.0, 5, true, true);
        h.position = None;
        assert!(select_hospital(scene(), Category::Trauma, [&h], &HospitalWeights::default()).is_none());
    }
}

// ── Busy index ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod busy {
    use super::*;
    use crate::{AssignError, BusyIndex};

    #[test]
    fn claim_and_release() {
        let mut b = BusyIndex::new();
        b.claim(VehicleId(1), IncidentId(10)).unwrap();
        assert!(b.is_busy(VehicleId(1)));
        assert_eq!(b.holder(VehicleId(1)), Some(IncidentId(10)));
        assert_eq!(b.vehicle_for(IncidentId(10)), Some(VehicleId(1)));

        assert_eq!(b.release(VehicleId(1)), Some(IncidentId(10)));
        assert!(b.is_empty());
        assert_eq!(b.vehicle_for(IncidentId(10)), None);
    }

    #[test]
    fn second_incident_cannot_claim_busy_vehicle() {
        let mut b = BusyIndex::new();
        b.claim(VehicleId(1), IncidentId(10)).unwrap();
        let err = b.claim(VehicleId(1), IncidentId(11)).unwrap_err();
        assert!(matches!(
            err,
            AssignError::VehicleBusy { vehicle: VehicleId(1), holder: IncidentId(10) }
        ));
    }

    #[test]
    fn reclaim_by_same_incident_is_noop() {
        let mut b = BusyIndex::new();
        b.claim(VehicleId(1), IncidentId(10)).unwrap();
        b.claim(VehicleId(1), IncidentId(10)).unwrap();
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn incident_holds_one_vehicle() {
        let mut b = BusyIndex::new();
        b.claim(VehicleId(1), IncidentId(10)).unwrap();
        assert!(matches!(
            b.claim(VehicleId(2), IncidentId(10)),
            Err(AssignError::IncidentHasVehicle { .. })
        ));
        assert_eq!(b.release_incident(IncidentId(10)), Some(VehicleId(1)));
        assert!(!b.is_busy(VehicleId(1)));
    }
}

// ── Engine ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod engine {
    use ems_core::{IncidentStatus, VehicleStatus};

    use super::*;
    use crate::{Assignment, AssignmentEngine, BusyIndex, Decision};

    #[test]
    fn assigns_vehicle_and_hospital() {
        let eng = AssignmentEngine::default();
        let inc = incident(Severity::High, Category::Cardiac);
        let fleet = [vehicle(1, VehicleClass::Advanced, 2.0, "Deccan")];
        let hs = [hospital(7, 3.0, 10, true, true)];
        let mut busy = BusyIndex::new();

        let d = eng.assign_and_claim(&inc, &fleet, &hs, &mut busy).unwrap();
        let Decision::Assign(a) = d else { panic!("expected assignment") };
        assert_eq!(a.vehicle.vehicle, VehicleId(1));
        assert_eq!(a.hospital.map(|h| h.hospital), Some(HospitalId(7)));
        assert_eq!(busy.holder(VehicleId(1)), Some(IncidentId(1)));
    }

    #[test]
    fn no_hospital_is_not_fatal() {
        let eng = AssignmentEngine::default();
        let inc = incident(Severity::Low, Category::Other);
        let fleet = [vehicle(1, VehicleClass::Basic, 1.0, "")];
        let hs: [Hospital; 0] = [];
        let d = eng.assign(&inc, &fleet, &hs, &BusyIndex::new());
        assert!(matches!(d, Decision::Assign(Assignment { hospital: None, .. })));
    }

    #[test]
    fn empty_fleet_is_no_capacity() {
        let eng = AssignmentEngine::default();
        let inc = incident(Severity::High, Category::Trauma);
        let fleet: [Vehicle; 0] = [];
        let hs: [Hospital; 0] = [];
        let mut busy = BusyIndex::new();
        let d = eng.assign_and_claim(&inc, &fleet, &hs, &mut busy).unwrap();
        assert_eq!(d, Decision::NoVehicleAvailable);
        assert!(busy.is_empty());
    }

    #[test]
    fn busy_and_unavailable_vehicles_are_excluded() {
        let eng = AssignmentEngine::default();
        let mut offline = vehicle(1, VehicleClass::Advanced, 0.5, "");
        offline.status = VehicleStatus::OutOfService;
        let committed = vehicle(2, VehicleClass::Advanced, 0.6, "");
        let spare = vehicle(3, VehicleClass::Basic, 9.0, "");
        let fleet = [offline, committed, spare];
        let hs: [Hospital; 0] = [];

        let mut busy = BusyIndex::new();
        busy.claim(VehicleId(2), IncidentId(99)).unwrap();

        let inc = incident(Severity::High, Category::Cardiac);
        let d = eng.assign_and_claim(&inc, &fleet, &hs, &mut busy).unwrap();
        let Decision::Assign(a) = d else { panic!("expected assignment") };
        assert_eq!(a.vehicle.vehicle, VehicleId(3));
    }

    #[test]
    fn active_incident_is_idempotent() {
        let eng = AssignmentEngine::default();
        let mut inc = incident(Severity::High, Category::Cardiac);
        inc.status = IncidentStatus::EnRoute;
        inc.assigned_vehicle = Some(VehicleId(5));
        let fleet = [vehicle(1, VehicleClass::Advanced, 1.0, "")];
        let hs: [Hospital; 0] = [];
        let mut busy = BusyIndex::new();

        let d = eng.assign_and_claim(&inc, &fleet, &hs, &mut busy).unwrap();
        assert_eq!(d, Decision::AlreadyAssigned { vehicle: Some(VehicleId(5)) });
        assert!(busy.is_empty());
    }

    #[test]
    fn resolved_incident_is_closed() {
        let eng = AssignmentEngine::default();
        let mut inc = incident(Severity::Low, Category::Other);
        inc.status = IncidentStatus::Resolved;
        let fleet = [vehicle(1, VehicleClass::Basic, 1.0, "")];
        let hs: [Hospital; 0] = [];
        assert_eq!(eng.assign(&inc, &fleet, &hs, &BusyIndex::new()), Decision::Closed);
    }

    #[test]
    fn two_incidents_never_share_the_nearest_vehicle() {
        let eng = AssignmentEngine::default();
        let fleet = [
            vehicle(1, VehicleClass::Advanced, 0.5, ""),
            vehicle(2, VehicleClass::Advanced, 3.0, ""),
        ];
        let hs: [Hospital; 0] = [];
        let mut busy = BusyIndex::new();

        let a = incident(Severity::High, Category::Cardiac);
        let mut b = incident(Severity::High, Category::Cardiac);
        b.id = IncidentId(2);

        let Decision::Assign(first) = eng.assign_and_claim(&a, &fleet, &hs, &mut busy).unwrap() else {
            panic!("first should assign")
        };
        let Decision::Assign(second) = eng.assign_and_claim(&b, &fleet, &hs, &mut busy).unwrap() else {
            panic!("second should assign")
        };
        assert_ne!(first.vehicle.vehicle, second.vehicle.vehicle);

        let mut c = incident(Severity::High, Category::Cardiac);
        c.id = IncidentId(3);
        assert_eq!(
            eng.assign_and_claim(&c, &fleet, &hs, &mut busy).unwrap(),
            Decision::NoVehicleAvailable
        );
    }
}

// ── Handoff notices ───────────────────────────────────────────────────────────

#[cfg(test)]
mod notices {
    use super::*;
    use crate::{HandoffNotice, required_resources};

    #[test]
    fn high_severity_cardiac() {
        assert_eq!(
            required_resources(Severity::High, Category::Cardiac),
            vec!["Crash Cart", "ER Team Standby", "Cardiac Monitor", "Cath Lab Prep"]
        );
    }

    #[test]
    fn fallback_is_general_er() {
        assert_eq!(required_resources(Severity::Medium, Category::Other), vec!["General ER"]);
        assert_eq!(
            required_resources(Severity::High, Category::Other),
            vec!["Crash Cart", "ER Team Standby"]
        );
    }

    #[test]
    fn notice_carries_golden_hour() {
        let inc = incident(Severity::Medium, Category::Burns);
        let h = hospital(4, 2.0, 3, false, false);
        let n = HandoffNotice::new(&inc, VehicleId(8), &h, 12);
        assert_eq!(n.golden_hour_minutes, Some(90));
        assert_eq!(n.hospital_name, "H4");
        assert_eq!(n.resources, vec!["Burn Ward".to_string(), "IV Fluids".to_string()]);
    }
}
