//! Unit tests for ems-core primitives.

#[cfg(test)]
mod ids {
    use crate::{IncidentId, NodeId, VehicleId};

    #[test]
    fn index_roundtrip() {
        let id = NodeId(42);
        assert_eq!(id.index(), 42);
    }

    #[test]
    fn invalid_sentinels_are_max() {
        assert_eq!(VehicleId::INVALID.0, u32::MAX);
        assert_eq!(IncidentId::INVALID, IncidentId(u32::MAX));
        assert_ne!(IncidentId(0), IncidentId::INVALID);
    }

    #[test]
    fn display() {
        assert_eq!(VehicleId(7).to_string(), "VehicleId(7)");
    }
}

#[cfg(test)]
mod geo {
    use crate::{CoreError, GeoPoint, distance_km};

    #[test]
    fn zero_distance_is_exact() {
        let p = GeoPoint::new(18.5204, 73.8567);
        assert_eq!(p.distance_km(p), 0.0);
    }

    #[test]
    fn one_degree_of_latitude() {
        // ~1 degree of latitude ≈ 111.19 km
        let a = GeoPoint::new(18.0, 73.0);
        let b = GeoPoint::new(19.0, 73.0);
        let d = a.distance_km(b);
        assert!((d - 111.195).abs() < 0.05, "got {d}");
    }

    #[test]
    fn symmetric_bit_for_bit() {
        let pairs = [
            (GeoPoint::new(18.45, 73.75), GeoPoint::new(18.60, 73.90)),
            (GeoPoint::new(-33.86, 151.21), GeoPoint::new(51.50, -0.12)),
            (GeoPoint::new(0.0, 179.9), GeoPoint::new(0.0, -179.9)),
            (GeoPoint::new(89.9, 10.0), GeoPoint::new(-89.9, -170.0)),
        ];
        for (a, b) in pairs {
            assert_eq!(distance_km(a, b), distance_km(b, a), "{a} vs {b}");
        }
    }

    #[test]
    fn triangle_inequality_on_city_points() {
        let a = GeoPoint::new(18.52, 73.85);
        let b = GeoPoint::new(18.55, 73.80);
        let c = GeoPoint::new(18.48, 73.92);
        assert!(a.distance_km(c) <= a.distance_km(b) + b.distance_km(c) + 1e-12);
    }

    #[test]
    fn try_new_rejects_out_of_range() {
        assert!(GeoPoint::try_new(18.5, 73.8).is_ok());
        assert!(matches!(
            GeoPoint::try_new(91.0, 0.0),
            Err(CoreError::InvalidCoordinate { .. })
        ));
        assert!(GeoPoint::try_new(0.0, -180.5).is_err());
        assert!(GeoPoint::try_new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn lerp_endpoints_and_midpoint() {
        let a = GeoPoint::new(18.0, 73.0);
        let b = GeoPoint::new(18.2, 73.4);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        let mid = a.lerp(b, 0.5);
        assert!((mid.lat - 18.1).abs() < 1e-12);
        assert!((mid.lng - 73.2).abs() < 1e-12);
    }

    #[test]
    fn bbox_check() {
        let center = GeoPoint::new(18.52, 73.85);
        assert!(GeoPoint::new(18.53, 73.86).within_bbox(center, 0.1));
        assert!(!GeoPoint::new(19.5, 73.85).within_bbox(center, 0.1));
    }
}

#[cfg(test)]
mod model {
    use crate::{
        Category, GeoPoint, Incident, IncidentId, IncidentStatus, Severity, Vehicle, VehicleClass,
        VehicleId, VehicleStatus,
    };

    #[test]
    fn severity_parses_codes_and_words() {
        assert_eq!("P1".parse::<Severity>().unwrap(), Severity::High);
        assert_eq!("urgent".parse::<Severity>().unwrap(), Severity::Medium);
        assert_eq!(" p3 ".parse::<Severity>().unwrap(), Severity::Low);
        assert!("P9".parse::<Severity>().is_err());
    }

    #[test]
    fn severity_orders_most_urgent_first() {
        let mut v = vec![Severity::Low, Severity::High, Severity::Medium];
        v.sort();
        assert_eq!(v, vec![Severity::High, Severity::Medium, Severity::Low]);
    }

    #[test]
    fn golden_hour_limits() {
        assert_eq!(Severity::High.golden_hour_minutes(), Some(60));
        assert_eq!(Severity::Medium.golden_hour_minutes(), Some(90));
        assert_eq!(Severity::Low.golden_hour_minutes(), None);
    }

    #[test]
    fn unknown_category_is_other() {
        assert_eq!("Cardiac".parse::<Category>().unwrap(), Category::Cardiac);
        assert_eq!("snakebite".parse::<Category>().unwrap(), Category::Other);
    }

    #[test]
    fn vehicle_class_and_status_parse() {
        assert_eq!("ALS".parse::<VehicleClass>().unwrap(), VehicleClass::Advanced);
        assert_eq!("bls".parse::<VehicleClass>().unwrap(), VehicleClass::Basic);
        assert_eq!("offline".parse::<VehicleStatus>().unwrap(), VehicleStatus::OutOfService);
        assert!("flying".parse::<VehicleStatus>().is_err());
    }

    #[test]
    fn new_vehicle_parked_at_base() {
        let base = GeoPoint::new(18.52, 73.85);
        let v = Vehicle::new(VehicleId(1), "PUN-A1", VehicleClass::Advanced, base, "Shaniwar Wada");
        assert_eq!(v.position, base);
        assert_eq!(v.status, VehicleStatus::Available);
    }

    #[test]
    fn active_states() {
        assert!(!IncidentStatus::Reported.is_active());
        assert!(IncidentStatus::Assigned.is_active());
        assert!(IncidentStatus::EnRoute.is_active());
        assert!(IncidentStatus::OnScene.is_active());
        assert!(!IncidentStatus::Resolved.is_active());

        let inc = Incident::new(
            IncidentId(3),
            GeoPoint::new(18.5, 73.8),
            Severity::High,
            Category::Cardiac,
            "Camp",
        );
        assert_eq!(inc.status, IncidentStatus::Reported);
        assert!(inc.assigned_vehicle.is_none());
    }
}

#[cfg(test)]
mod fallback {
    use crate::{FallbackLocation, FixedLocation, GeoPoint, JitterLocation};

    #[test]
    fn fixed_is_constant() {
        let p = GeoPoint::new(18.5, 73.8);
        let mut f = FixedLocation(p);
        assert_eq!(f.fallback_point(), p);
        assert_eq!(f.fallback_point(), p);
    }

    #[test]
    fn jitter_is_deterministic_and_bounded() {
        let origin = GeoPoint::new(18.45, 73.78);
        let mut a = JitterLocation::new(origin, 0.15, 0.15, 42);
        let mut b = JitterLocation::new(origin, 0.15, 0.15, 42);
        for _ in 0..100 {
            let pa = a.fallback_point();
            assert_eq!(pa, b.fallback_point());
            assert!(pa.lat >= 18.45 && pa.lat < 18.60);
            assert!(pa.lng >= 73.78 && pa.lng < 73.93);
        }
    }

    #[test]
    fn zero_span_collapses_to_origin() {
        let origin = GeoPoint::new(18.45, 73.78);
        let mut j = JitterLocation::new(origin, 0.0, -1.0, 7);
        assert_eq!(j.fallback_point(), origin);
    }
}
