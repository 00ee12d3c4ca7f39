//! Unit tests for ems-mobility.
//!
//! Async tests run on a paused tokio clock, so a "ten minute" leg finishes
//! instantly and deterministically.

use std::time::Duration;

use ems_core::GeoPoint;

use crate::PathSimulation;

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Three collinear points due north, two equal segments of ~1.11 km.
fn north_path(duration_secs: u64) -> PathSimulation {
    PathSimulation::new(
        vec![
            GeoPoint::new(18.50, 73.85),
            GeoPoint::new(18.51, 73.85),
            GeoPoint::new(18.52, 73.85),
        ],
        Duration::from_secs(duration_secs),
    )
    .unwrap()
}

// ── PathSimulation ────────────────────────────────────────────────────────────

#[cfg(test)]
mod path {
    use super::*;
    use crate::MobilityError;

    #[test]
    fn rejects_short_paths() {
        let one = vec![GeoPoint::new(18.5, 73.8)];
        assert!(matches!(
            PathSimulation::new(one, Duration::from_secs(10)),
            Err(MobilityError::TooFewPoints(1))
        ));
        assert!(matches!(
            PathSimulation::new(Vec::new(), Duration::from_secs(10)),
            Err(MobilityError::TooFewPoints(0))
        ));
    }

    #[test]
    fn rejects_out_of_range_points() {
        let pts = vec![GeoPoint::new(18.5, 73.8), GeoPoint::new(95.0, 73.8)];
        assert!(matches!(
            PathSimulation::new(pts, Duration::from_secs(10)),
            Err(MobilityError::InvalidCoordinate(_))
        ));
    }

    #[test]
    fn starts_at_origin() {
        let sim = north_path(60);
        assert_eq!(sim.position_at(Duration::ZERO), sim.origin());
    }

    #[test]
    fn converges_exactly_at_and_after_duration() {
        let sim = north_path(60);
        let end = GeoPoint::new(18.52, 73.85);
        assert_eq!(sim.position_at(Duration::from_secs(60)), end);
        assert_eq!(sim.position_at(Duration::from_secs(3600)), end);
    }

    #[test]
    fn halfway_is_the_middle_vertex() {
        let sim = north_path(60);
        let mid = sim.position_at(Duration::from_secs(30));
        assert!((mid.lat - 18.51).abs() < 1e-9, "got {mid}");
        assert!((mid.lng - 73.85).abs() < 1e-12);
    }

    #[test]
    fn constant_speed_along_unequal_segments() {
        // First segment 1 step, second 3 steps: at 50 % we are half-way into
        // the second segment by distance.
        let sim = PathSimulation::new(
            vec![
                GeoPoint::new(18.50, 73.85),
                GeoPoint::new(18.51, 73.85),
                GeoPoint::new(18.54, 73.85),
            ],
            Duration::from_secs(100),
        )
        .unwrap();
        let p = sim.position_at(Duration::from_secs(50));
        assert!((p.lat - 18.52).abs() < 1e-6, "got {p}");
    }

    #[test]
    fn zero_length_path_is_already_there() {
        let here = GeoPoint::new(18.5, 73.8);
        let sim = PathSimulation::straight_line(here, here, Duration::from_secs(30)).unwrap();
        assert_eq!(sim.total_km(), 0.0);
        assert_eq!(sim.position_at(Duration::ZERO), here);
    }

    #[test]
    fn repeated_vertices_do_not_divide_by_zero() {
        let a = GeoPoint::new(18.50, 73.85);
        let b = GeoPoint::new(18.51, 73.85);
        let sim = PathSimulation::new(vec![a, a, b, b], Duration::from_secs(10)).unwrap();
        for s in 0..=10 {
            let p = sim.position_at(Duration::from_secs(s));
            assert!(p.lat.is_finite() && p.lng.is_finite());
        }
    }

    #[test]
    fn progress_is_clamped() {
        let sim = north_path(10);
        assert_eq!(sim.progress(Duration::ZERO), 0.0);
        assert_eq!(sim.progress(Duration::from_secs(5)), 0.5);
        assert_eq!(sim.progress(Duration::from_secs(50)), 1.0);

        let instant = north_path(0);
        assert_eq!(instant.progress(Duration::ZERO), 1.0);
        assert_eq!(instant.position_at(Duration::ZERO), instant.destination());
    }
}

// ── drive ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod driving {
    use std::sync::{Arc, Mutex};

    use tokio::time::Instant;
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::{DriveOutcome, drive};

    #[tokio::test(start_paused = true)]
    async fn reports_origin_then_converges_on_destination() {
        let sim = north_path(10);
        let token = CancellationToken::new();
        let mut seen = Vec::new();
        let mut sink = |p: GeoPoint| seen.push(p);

        let started = Instant::now();
        let outcome = drive(&sim, Duration::from_secs(1), &mut sink, &token).await;

        assert_eq!(outcome, DriveOutcome::Arrived);
        let took = started.elapsed();
        assert!(took >= Duration::from_secs(10) && took < Duration::from_millis(10_010), "{took:?}");
        assert_eq!(seen.first(), Some(&sim.origin()));
        assert_eq!(seen.last(), Some(&sim.destination()));
        // One report per whole second before arrival, plus the destination.
        assert_eq!(seen.len(), 11);
        assert!(seen.windows(2).all(|w| w[0].lat <= w[1].lat));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_length_path_reports_once() {
        let here = GeoPoint::new(18.5, 73.8);
        let sim = PathSimulation::straight_line(here, here, Duration::from_secs(30)).unwrap();
        let token = CancellationToken::new();
        let mut seen = Vec::new();
        let mut sink = |p: GeoPoint| seen.push(p);

        let outcome = drive(&sim, Duration::from_secs(1), &mut sink, &token).await;
        assert_eq!(outcome, DriveOutcome::Arrived);
        assert_eq!(seen, vec![here]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_before_arrival() {
        let sim = north_path(600);
        let token = CancellationToken::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let task = {
            let token = token.clone();
            let seen = Arc::clone(&seen);
            tokio::spawn(async move {
                let mut sink = move |p: GeoPoint| seen.lock().unwrap().push(p);
                drive(&sim, Duration::from_secs(2), &mut sink, &token).await
            })
        };

        tokio::time::sleep(Duration::from_secs(7)).await;
        token.cancel();
        assert_eq!(task.await.unwrap(), DriveOutcome::Cancelled);

        let seen = seen.lock().unwrap();
        assert!(!seen.is_empty());
        assert_ne!(seen.last(), Some(&GeoPoint::new(18.52, 73.85)));
    }

    #[tokio::test(start_paused = true)]
    async fn pre_cancelled_token_reports_nothing() {
        let sim = north_path(10);
        let token = CancellationToken::new();
        token.cancel();
        let mut count = 0;
        let mut sink = |_: GeoPoint| count += 1;
        assert_eq!(
            drive(&sim, Duration::from_secs(1), &mut sink, &token).await,
            DriveOutcome::Cancelled
        );
        assert_eq!(count, 0);
    }
}

// ── LegRegistry ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod registry {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use ems_core::{IncidentId, VehicleId};

    use crate::{LegId, LegKind, LegRegistry, MobilityError};

    #[tokio::test]
    async fn one_leg_per_vehicle() {
        let mut reg = LegRegistry::new();
        let v = VehicleId(1);
        reg.spawn(v, LegKind::ToIncident(IncidentId(9)), |_, cancel| async move {
            cancel.cancelled().await;
        })
        .unwrap();

        let mut called = false;
        let err = reg.spawn(v, LegKind::ToBase, |_, _| {
            called = true;
            async {}
        });
        assert!(matches!(err, Err(MobilityError::AlreadyInTransit(id)) if id == v));
        assert!(!called);
        assert_eq!(reg.active(v).map(|(_, k)| k), Some(LegKind::ToIncident(IncidentId(9))));

        for leg in reg.drain() {
            leg.stop().await;
        }
        assert!(reg.is_empty());
    }

    #[tokio::test]
    async fn stale_finish_does_not_evict_newer_leg() {
        let mut reg = LegRegistry::new();
        let v = VehicleId(2);
        let first = reg.spawn(v, LegKind::ToBase, |_, c| async move { c.cancelled().await }).unwrap();
        let old = reg.take(v).unwrap();
        old.stop().await;

        let second = reg.spawn(v, LegKind::ToBase, |_, c| async move { c.cancelled().await }).unwrap();
        assert!(second > first);
        assert!(!reg.finish(v, first));
        assert!(reg.is_active(v));
        assert!(reg.finish(v, second));
        assert!(!reg.is_active(v));
    }

    #[tokio::test]
    async fn stop_cancels_and_joins() {
        let mut reg = LegRegistry::new();
        let v = VehicleId(3);
        let stopped = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stopped);
        let id = reg
            .spawn(v, LegKind::ToBase, move |_, cancel| async move {
                cancel.cancelled().await;
                flag.store(true, Ordering::SeqCst);
            })
            .unwrap();
        assert_eq!(id, LegId(0));

        let leg = reg.take(v).unwrap();
        leg.stop().await;
        assert!(stopped.load(Ordering::SeqCst));
        assert_eq!(reg.len(), 0);
    }
}
