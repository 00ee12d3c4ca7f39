//! The `Dispatcher` handle and the incident/vehicle lifecycle it drives.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use ems_assign::{AssignmentEngine, BusyIndex, Decision, HandoffNotice};
use ems_core::{
    CoreError, FallbackLocation, GeoPoint, Hospital, HospitalId, Incident, IncidentId,
    IncidentStatus, Vehicle, VehicleId, VehicleStatus,
};
use ems_mobility::{DriveOutcome, LegId, LegKind, LegRegistry, PathSimulation, drive};
use ems_spatial::NavigationGraph;

use crate::{
    DispatchConfig, DispatchError, DispatchResult, DispatchUpdate, ExternalRouter,
    KeywordClassifier, NoExternalRouter, Planner, RouteSource, StoreChange, Triage,
    TriageClassifier,
};

// ── Outcomes ──────────────────────────────────────────────────────────────────

/// Result of a dispatch attempt.  Only `Dispatched` changes anything.
#[derive(Clone, Debug, PartialEq)]
pub enum DispatchOutcome {
    /// A vehicle is on its way.
    Dispatched {
        vehicle:     VehicleId,
        hospital:    Option<HospitalId>,
        /// Estimated real driving minutes to the scene.
        eta_minutes: u32,
        source:      RouteSource,
    },
    /// No eligible vehicle; the incident stays `Reported`.
    NoCapacity,
    /// The incident already has a vehicle; nothing changed.
    AlreadyDispatched { vehicle: Option<VehicleId> },
    /// The incident was resolved or deleted, or its vehicle removed, while
    /// the route was being planned.  Also returned if the chosen vehicle
    /// turned out to be moving already; the incident is back to `Reported`.
    Withdrawn,
}

/// What [`Dispatcher::report_call`] did with a call.
#[derive(Clone, Debug, PartialEq)]
pub struct CallReport {
    pub incident: IncidentId,
    pub triage:   Triage,
    /// `false` if the fallback location policy supplied the position.
    pub located:  bool,
    /// Present when auto-dispatch is on.
    pub outcome:  Option<DispatchOutcome>,
}

// ── Shared state ──────────────────────────────────────────────────────────────

/// Everything assignment reads and writes.  Guarded by one mutex so the
/// busy check and the claim are a single atomic step.
#[derive(Default)]
pub(crate) struct FleetState {
    vehicles:      BTreeMap<VehicleId, Vehicle>,
    incidents:     BTreeMap<IncidentId, Incident>,
    hospitals:     BTreeMap<HospitalId, Hospital>,
    busy:          BusyIndex,
    next_incident: u32,
}

impl FleetState {
    fn incident_mut(&mut self, id: IncidentId) -> DispatchResult<&mut Incident> {
        self.incidents.get_mut(&id).ok_or(DispatchError::IncidentNotFound(id))
    }

    fn vehicle_mut(&mut self, id: VehicleId) -> DispatchResult<&mut Vehicle> {
        self.vehicles.get_mut(&id).ok_or(DispatchError::VehicleNotFound(id))
    }
}

pub(crate) struct Inner<X: ExternalRouter> {
    pub(crate) config:   DispatchConfig,
    pub(crate) engine:   AssignmentEngine,
    pub(crate) planner:  Planner<X>,
    pub(crate) graph:    RwLock<NavigationGraph>,
    pub(crate) state:    Mutex<FleetState>,
    pub(crate) legs:     Mutex<LegRegistry>,
    pub(crate) triage:   Box<dyn TriageClassifier>,
    pub(crate) fallback: Mutex<Box<dyn FallbackLocation>>,
    pub(crate) updates:  UnboundedSender<DispatchUpdate>,
}

// ── Dispatcher ────────────────────────────────────────────────────────────────

/// Clonable handle to the dispatch engine.
///
/// Owns fleet, incident and hospital state, the navigation graph, and one
/// running leg task per moving vehicle.  Create via
/// [`DispatcherBuilder`][crate::DispatcherBuilder].
///
/// # Locking
///
/// `state` is taken before `legs` whenever both are needed.  Neither lock is
/// ever held across an `.await`: planning and stopping a leg happen between
/// two short critical sections.
pub struct Dispatcher<X: ExternalRouter = NoExternalRouter> {
    inner: Arc<Inner<X>>,
}

impl<X: ExternalRouter> Clone for Dispatcher<X> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<X: ExternalRouter> Dispatcher<X> {
    pub(crate) fn from_inner(inner: Inner<X>) -> Self {
        Self { inner: Arc::new(inner) }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.inner.config
    }

    // ── Registry edits ────────────────────────────────────────────────────

    /// Add a vehicle to the fleet.
    ///
    /// Only `Available` and `OutOfService` are accepted; the other states
    /// are reached through dispatch.
    pub fn add_vehicle(&self, vehicle: Vehicle) -> DispatchResult<()> {
        check_point(vehicle.position)?;
        check_point(vehicle.base)?;
        if matches!(vehicle.status, VehicleStatus::Dispatched | VehicleStatus::Returning) {
            return Err(DispatchError::ManagedStatus(vehicle.status));
        }

        let mut state = self.state();
        if state.vehicles.contains_key(&vehicle.id) {
            return Err(DispatchError::DuplicateVehicle(vehicle.id));
        }
        debug!(vehicle = %vehicle.id, unit = %vehicle.unit_code, class = %vehicle.class, "vehicle added");
        self.emit(DispatchUpdate::VehicleAdded(vehicle.clone()));
        state.vehicles.insert(vehicle.id, vehicle);
        Ok(())
    }

    /// Insert or replace a hospital record.
    pub fn add_hospital(&self, hospital: Hospital) -> DispatchResult<()> {
        if let Some(p) = hospital.position {
            check_point(p)?;
        }
        self.state().hospitals.insert(hospital.id, hospital);
        Ok(())
    }

    /// Register a new incident as `Reported` without dispatching it.
    ///
    /// An `IncidentId::INVALID` id is replaced with the next free id.  Any
    /// lifecycle or assignment fields on the input are reset.
    pub fn report_incident(&self, mut incident: Incident) -> DispatchResult<IncidentId> {
        check_point(incident.position)?;

        let mut state = self.state();
        if incident.id == IncidentId::INVALID {
            incident.id = IncidentId(state.next_incident);
        }
        // A deleted incident's id stays claimed while its vehicle drives home.
        if state.incidents.contains_key(&incident.id) || state.busy.vehicle_for(incident.id).is_some() {
            return Err(DispatchError::DuplicateIncident(incident.id));
        }
        reset_assignment(&mut incident);
        state.next_incident = state.next_incident.max(incident.id.0.saturating_add(1));

        info!(
            incident = %incident.id,
            severity = %incident.severity,
            category = %incident.category,
            area = %incident.area,
            "incident reported"
        );
        let id = incident.id;
        self.emit(DispatchUpdate::IncidentChanged(incident.clone()));
        state.incidents.insert(id, incident);
        Ok(id)
    }

    /// Triage a free-text call, locate it, register it, and (with
    /// `auto_dispatch`) dispatch it.
    ///
    /// A failing classifier degrades to [`KeywordClassifier`]; a missing or
    /// out-of-range position comes from the fallback location policy.
    pub async fn report_call(&self, description: &str, area: &str) -> DispatchResult<CallReport> {
        let triage = match self.inner.triage.classify(description) {
            Ok(t) => t,
            Err(e) => {
                warn!("triage classifier failed, using keyword rules: {e}");
                KeywordClassifier::triage(description)
            }
        };

        let located = triage.position.filter(|p| p.is_valid());
        let position = match located {
            Some(p) => p,
            None => self.fallback_point(),
        };
        let area = triage.area.clone().unwrap_or_else(|| area.to_owned());
        let incident = Incident::new(IncidentId::INVALID, position, triage.severity, triage.category, area)
            .with_description(description);

        let id = self.report_incident(incident)?;
        let outcome = if self.inner.config.auto_dispatch {
            Some(self.dispatch(id).await?)
        } else {
            None
        };
        Ok(CallReport { incident: id, triage, located: located.is_some(), outcome })
    }

    // ── Dispatch ──────────────────────────────────────────────────────────

    /// Assign the best vehicle and hospital to `id` and start the vehicle
    /// driving.
    ///
    /// Calling this on an incident that already has a vehicle is a logged
    /// no-op.  Running out of vehicles leaves the incident `Reported`.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::IncidentNotFound`], [`DispatchError::IncidentResolved`].
    /// - [`DispatchError::Geometry`] if the planned path is unusable; the
    ///   assignment is rolled back first.
    ///
    /// A vehicle found already moving when its leg starts is rolled back and
    /// reported as [`DispatchOutcome::Withdrawn`].
    pub async fn dispatch(&self, id: IncidentId) -> DispatchResult<DispatchOutcome> {
        // ── Decide and claim (one critical section) ───────────────────────
        let (vehicle, from, scene, hospital) = {
            let mut state = self.state();
            let st = &mut *state;
            let incident = st.incidents.get(&id).ok_or(DispatchError::IncidentNotFound(id))?;

            let decision = self.inner.engine.assign_and_claim(
                incident,
                st.vehicles.values(),
                st.hospitals.values(),
                &mut st.busy,
            )?;
            let assignment = match decision {
                Decision::Assign(a) => a,
                Decision::NoVehicleAvailable => {
                    warn!(incident = %id, "no vehicle available, incident stays reported");
                    return Ok(DispatchOutcome::NoCapacity);
                }
                Decision::AlreadyAssigned { vehicle } => {
                    warn!(incident = %id, vehicle = ?vehicle, "incident already dispatched, ignoring");
                    return Ok(DispatchOutcome::AlreadyDispatched { vehicle });
                }
                Decision::Closed => return Err(DispatchError::IncidentResolved(id)),
            };

            let vehicle = assignment.vehicle.vehicle;
            let hospital_id = assignment.hospital.as_ref().map(|h| h.hospital);

            let incident = st.incident_mut(id)?;
            incident.status = IncidentStatus::Assigned;
            incident.assigned_vehicle = Some(vehicle);
            incident.assigned_hospital = hospital_id;
            let scene = incident.position;
            self.emit(DispatchUpdate::IncidentChanged(incident.clone()));

            let v = st.vehicle_mut(vehicle)?;
            v.status = VehicleStatus::Dispatched;
            let from = v.position;
            self.emit(DispatchUpdate::VehicleStatus { vehicle, status: v.status });

            info!(
                incident = %id,
                vehicle = %vehicle,
                unit = %v.unit_code,
                score = assignment.vehicle.total,
                distance_km = assignment.vehicle.distance_km,
                hospital = ?hospital_id,
                "vehicle assigned"
            );
            let hospital = hospital_id.and_then(|h| st.hospitals.get(&h).cloned());
            (vehicle, from, scene, hospital)
        };

        // ── Plan (no locks held) ──────────────────────────────────────────
        let leg = self.inner.planner.plan(&self.inner.graph, from, scene).await;
        let hospital_leg = match hospital.as_ref().and_then(|h| h.position) {
            Some(dest) => Some(self.inner.planner.plan(&self.inner.graph, scene, dest).await),
            None => None,
        };
        let sim = match PathSimulation::new(leg.points.clone(), leg.sim_duration) {
            Ok(sim) => sim,
            Err(e) => {
                warn!(incident = %id, vehicle = %vehicle, "unusable path, rolling back: {e}");
                self.abandon(id, vehicle);
                return Err(e.into());
            }
        };

        // ── Commit: start the leg unless the world moved on ───────────────
        let mut state = self.state();
        let st = &mut *state;
        let still_ours = st.vehicles.contains_key(&vehicle)
            && st.incidents.get(&id).is_some_and(|i| {
                i.status == IncidentStatus::Assigned && i.assigned_vehicle == Some(vehicle)
            });
        if !still_ours {
            debug!(incident = %id, vehicle = %vehicle, "incident withdrawn while planning");
            return Ok(DispatchOutcome::Withdrawn);
        }

        let this = self.clone();
        let tick = self.inner.config.tick_interval();
        let kind = LegKind::ToIncident(id);
        let spawned = self.legs().spawn(vehicle, kind, move |leg_id, cancel| async move {
            this.run_leg(vehicle, kind, leg_id, sim, tick, cancel).await;
        });
        if let Err(e) = spawned {
            drop(state);
            self.abandon(id, vehicle);
            return match DispatchError::from(e) {
                DispatchError::VehicleInTransit(_) => {
                    warn!(incident = %id, %vehicle, "vehicle already moving, assignment rolled back");
                    Ok(DispatchOutcome::Withdrawn)
                }
                other => Err(other),
            };
        }

        let eta_minutes = leg.eta_minutes();
        let incident = st.incident_mut(id)?;
        incident.status = IncidentStatus::EnRoute;
        incident.dispatch_route = Some(leg.points);
        incident.hospital_route = hospital_leg.map(|l| l.points);
        self.emit(DispatchUpdate::IncidentChanged(incident.clone()));
        if let Some(h) = &hospital {
            self.emit(DispatchUpdate::HospitalNotified(HandoffNotice::new(incident, vehicle, h, eta_minutes)));
        }
        info!(incident = %id, vehicle = %vehicle, eta_minutes, source = ?leg.source, "vehicle en route");

        Ok(DispatchOutcome::Dispatched {
            vehicle,
            hospital: hospital.map(|h| h.id),
            eta_minutes,
            source: leg.source,
        })
    }

    /// Dispatch every `Reported` incident, most severe first, then oldest.
    ///
    /// Stops at the first `NoCapacity`: the candidate pool does not depend
    /// on the incident.  Per-incident errors are logged and skipped.
    pub async fn dispatch_pending(&self) -> Vec<(IncidentId, DispatchOutcome)> {
        let queue: Vec<IncidentId> = {
            let state = self.state();
            let mut q: Vec<_> = state
                .incidents
                .values()
                .filter(|i| i.status == IncidentStatus::Reported)
                .map(|i| (i.severity, i.id))
                .collect();
            q.sort_unstable();
            q.into_iter().map(|(_, id)| id).collect()
        };

        let mut out = Vec::with_capacity(queue.len());
        for id in queue {
            match self.dispatch(id).await {
                Ok(DispatchOutcome::NoCapacity) => {
                    out.push((id, DispatchOutcome::NoCapacity));
                    break;
                }
                Ok(outcome) => out.push((id, outcome)),
                Err(e) => debug!(incident = %id, "pending incident skipped: {e}"),
            }
        }
        out
    }

    // ── Resolution and removal ────────────────────────────────────────────

    /// Close `id` and send its vehicle back to base.
    ///
    /// Returns the returning vehicle, if any.  Resolving twice is a logged
    /// no-op.  The vehicle stays claimed until it reaches base.
    pub async fn resolve(&self, id: IncidentId) -> DispatchResult<Option<VehicleId>> {
        let (vehicle, running) = {
            let mut state = self.state();
            let st = &mut *state;
            let incident = st.incident_mut(id)?;
            if incident.status == IncidentStatus::Resolved {
                warn!(incident = %id, "incident already resolved, ignoring");
                return Ok(None);
            }
            incident.status = IncidentStatus::Resolved;
            let assigned = incident.assigned_vehicle;
            self.emit(DispatchUpdate::IncidentChanged(incident.clone()));
            info!(incident = %id, "incident resolved");

            let Some(vehicle) = assigned.filter(|v| st.vehicles.contains_key(v)) else {
                st.busy.release_incident(id);
                return Ok(None);
            };
            let v = st.vehicle_mut(vehicle)?;
            v.status = VehicleStatus::Returning;
            self.emit(DispatchUpdate::VehicleStatus { vehicle, status: v.status });
            (vehicle, self.legs().take(vehicle))
        };

        if let Some(leg) = running {
            leg.stop().await;
        }
        self.send_home(vehicle).await?;
        Ok(Some(vehicle))
    }

    /// Remove an incident.  A vehicle still heading to it stops where it is
    /// and becomes available; a vehicle already returning carries on home and
    /// keeps its claim until it gets there.
    pub async fn delete_incident(&self, id: IncidentId) -> DispatchResult<()> {
        let (freed, running) = {
            let mut state = self.state();
            let st = &mut *state;
            let incident = st.incidents.remove(&id).ok_or(DispatchError::IncidentNotFound(id))?;
            let returning = st
                .busy
                .vehicle_for(id)
                .and_then(|v| st.vehicles.get(&v))
                .is_some_and(|v| v.status == VehicleStatus::Returning);
            let held = if returning { None } else { st.busy.release_incident(id) };
            self.emit(DispatchUpdate::IncidentRemoved { incident: id });
            info!(incident = %id, vehicle = ?held, "incident deleted");

            match held.or(incident.assigned_vehicle.filter(|_| incident.status.is_active())) {
                Some(vehicle) => match st.vehicles.get_mut(&vehicle) {
                    Some(v) if v.status == VehicleStatus::Dispatched => {
                        v.status = VehicleStatus::Available;
                        self.emit(DispatchUpdate::VehicleStatus { vehicle, status: v.status });
                        (Some(vehicle), self.legs().take(vehicle))
                    }
                    _ => (None, None),
                },
                None => (None, None),
            }
        };

        if let Some(leg) = running {
            leg.stop().await;
        }
        if freed.is_some() && self.inner.config.auto_dispatch {
            self.dispatch_pending().await;
        }
        Ok(())
    }

    /// Remove a vehicle from the fleet.
    ///
    /// Its leg is cancelled, its claim cleared, and an unresolved incident
    /// it was serving goes back to `Reported` with no assignment.
    pub async fn remove_vehicle(&self, vehicle: VehicleId) -> DispatchResult<()> {
        let (requeued, running) = {
            let mut state = self.state();
            let st = &mut *state;
            st.vehicles.remove(&vehicle).ok_or(DispatchError::VehicleNotFound(vehicle))?;

            let mut requeued = None;
            if let Some(holder) = st.busy.release(vehicle) {
                if let Some(incident) = st.incidents.get_mut(&holder) {
                    if incident.status != IncidentStatus::Resolved {
                        reset_assignment(incident);
                        self.emit(DispatchUpdate::IncidentChanged(incident.clone()));
                        requeued = Some(holder);
                    }
                }
            }
            self.emit(DispatchUpdate::VehicleRemoved { vehicle });
            info!(%vehicle, requeued = ?requeued, "vehicle removed");
            (requeued, self.legs().take(vehicle))
        };

        if let Some(leg) = running {
            leg.stop().await;
        }
        if requeued.is_some() && self.inner.config.auto_dispatch {
            self.dispatch_pending().await;
        }
        Ok(())
    }

    /// Operator status change.
    ///
    /// Only `Available` and `OutOfService` may be set, and only on a vehicle
    /// that no incident holds and that is not driving.
    pub async fn set_vehicle_status(&self, vehicle: VehicleId, status: VehicleStatus) -> DispatchResult<()> {
        if matches!(status, VehicleStatus::Dispatched | VehicleStatus::Returning) {
            return Err(DispatchError::ManagedStatus(status));
        }
        {
            let mut state = self.state();
            let st = &mut *state;
            if let Some(incident) = st.busy.holder(vehicle) {
                return Err(DispatchError::VehicleCommitted { vehicle, incident });
            }
            let moving = self.legs().is_active(vehicle);
            let v = st.vehicle_mut(vehicle)?;
            if moving || v.status == VehicleStatus::Returning {
                return Err(DispatchError::VehicleInTransit(vehicle));
            }
            if v.status == status {
                return Ok(());
            }
            v.status = status;
            self.emit(DispatchUpdate::VehicleStatus { vehicle, status });
            info!(%vehicle, %status, "vehicle status set by operator");
        }

        if status == VehicleStatus::Available && self.inner.config.auto_dispatch {
            self.dispatch_pending().await;
        }
        Ok(())
    }

    /// Apply an edit that originated in the data store.
    pub async fn apply_change(&self, change: StoreChange) -> DispatchResult<()> {
        let auto = self.inner.config.auto_dispatch;
        match change {
            StoreChange::VehicleAdded(vehicle) => {
                let available = vehicle.status == VehicleStatus::Available;
                self.add_vehicle(vehicle)?;
                if available && auto {
                    self.dispatch_pending().await;
                }
            }
            StoreChange::VehicleStatusSet { vehicle, status } => {
                self.set_vehicle_status(vehicle, status).await?;
            }
            StoreChange::VehicleDeleted { vehicle } => self.remove_vehicle(vehicle).await?,
            StoreChange::HospitalUpserted(hospital) => self.add_hospital(hospital)?,
            StoreChange::IncidentReported(incident) => {
                let id = self.report_incident(incident)?;
                if auto {
                    self.dispatch(id).await?;
                }
            }
            StoreChange::IncidentResolved { incident: id } => {
                self.resolve(id).await?;
            }
            StoreChange::IncidentDeleted { incident: id } => self.delete_incident(id).await?,
        }
        Ok(())
    }

    // ── Traffic ───────────────────────────────────────────────────────────

    /// Slow every edge touching a node within `radius_km` of `center`.
    /// Returns the number of edge entries written.
    pub fn update_traffic(&self, center: GeoPoint, radius_km: f64, multiplier: f64) -> DispatchResult<usize> {
        let mut graph = self.inner.graph.write().unwrap_or_else(PoisonError::into_inner);
        let n = graph.update_traffic(center, radius_km, multiplier)?;
        info!(lat = center.lat, lng = center.lng, radius_km, multiplier, edges = n, "traffic updated");
        Ok(n)
    }

    pub fn clear_traffic(&self) {
        self.inner.graph.write().unwrap_or_else(PoisonError::into_inner).clear_traffic();
    }

    /// Run `f` with shared access to the navigation graph.
    pub fn with_graph<R>(&self, f: impl FnOnce(&NavigationGraph) -> R) -> R {
        let graph = self.inner.graph.read().unwrap_or_else(PoisonError::into_inner);
        f(&*graph)
    }

    // ── Snapshots ─────────────────────────────────────────────────────────

    pub fn incident(&self, id: IncidentId) -> Option<Incident> {
        self.state().incidents.get(&id).cloned()
    }

    pub fn vehicle(&self, id: VehicleId) -> Option<Vehicle> {
        self.state().vehicles.get(&id).cloned()
    }

    pub fn hospital(&self, id: HospitalId) -> Option<Hospital> {
        self.state().hospitals.get(&id).cloned()
    }

    /// All incidents in id order.
    pub fn incidents(&self) -> Vec<Incident> {
        self.state().incidents.values().cloned().collect()
    }

    /// All vehicles in id order.
    pub fn vehicles(&self) -> Vec<Vehicle> {
        self.state().vehicles.values().cloned().collect()
    }

    pub fn hospitals(&self) -> Vec<Hospital> {
        self.state().hospitals.values().cloned().collect()
    }

    /// Current `(vehicle, incident)` claims, sorted by vehicle.
    pub fn claims(&self) -> Vec<(VehicleId, IncidentId)> {
        let mut out: Vec<_> = self.state().busy.iter().collect();
        out.sort_unstable();
        out
    }

    /// Number of vehicles currently driving.
    pub fn active_legs(&self) -> usize {
        self.legs().len()
    }

    /// Cancel every running leg and wait for the tasks to stop.
    ///
    /// Vehicle and incident records keep their last state.
    pub async fn shutdown(&self) {
        let running = self.legs().drain();
        info!(legs = running.len(), "dispatcher shutting down");
        for leg in running {
            leg.stop().await;
        }
    }

    // ── Legs ──────────────────────────────────────────────────────────────

    /// Body of one leg task: drive, then apply the arrival.
    async fn run_leg(
        self,
        vehicle: VehicleId,
        kind:    LegKind,
        leg:     LegId,
        sim:     PathSimulation,
        tick:    Duration,
        cancel:  CancellationToken,
    ) {
        let outcome = {
            let mut sink = |p: GeoPoint| self.record_position(vehicle, p);
            drive(&sim, tick, &mut sink, &cancel).await
        };
        match outcome {
            DriveOutcome::Cancelled => debug!(%vehicle, %leg, %kind, "leg cancelled"),
            DriveOutcome::Arrived => {
                if self.arrive(vehicle, kind, leg) && self.inner.config.auto_dispatch {
                    self.retry_pending().await;
                }
            }
        }
    }

    fn record_position(&self, vehicle: VehicleId, position: GeoPoint) {
        let mut state = self.state();
        if let Some(v) = state.vehicles.get_mut(&vehicle) {
            v.position = position;
            self.emit(DispatchUpdate::VehicleMoved { vehicle, position });
        }
    }

    /// Apply a leg's arrival.  Returns `true` if the vehicle became
    /// available.  A leg that was already taken (cancelled concurrently)
    /// changes nothing.
    fn arrive(&self, vehicle: VehicleId, kind: LegKind, leg: LegId) -> bool {
        let mut state = self.state();
        let st = &mut *state;
        if !self.legs().finish(vehicle, leg) {
            debug!(%vehicle, %leg, "stale leg arrival ignored");
            return false;
        }

        match kind {
            LegKind::ToIncident(id) => {
                if let Some(incident) = st.incidents.get_mut(&id) {
                    if incident.status == IncidentStatus::EnRoute && incident.assigned_vehicle == Some(vehicle) {
                        incident.status = IncidentStatus::OnScene;
                        self.emit(DispatchUpdate::IncidentChanged(incident.clone()));
                        info!(incident = %id, %vehicle, "vehicle on scene");
                    }
                }
                false
            }
            LegKind::ToBase => {
                st.busy.release(vehicle);
                if let Some(v) = st.vehicles.get_mut(&vehicle) {
                    v.status = VehicleStatus::Available;
                    v.position = v.base;
                    self.emit(DispatchUpdate::VehicleStatus { vehicle, status: v.status });
                }
                info!(%vehicle, "vehicle back at base");
                true
            }
        }
    }

    /// Plan and start the return leg for a `Returning` vehicle.
    async fn send_home(&self, vehicle: VehicleId) -> DispatchResult<()> {
        let (from, base) = {
            let state = self.state();
            match state.vehicles.get(&vehicle) {
                Some(v) if v.status == VehicleStatus::Returning => (v.position, v.base),
                _ => return Ok(()),
            }
        };

        let leg = self.inner.planner.plan(&self.inner.graph, from, base).await;
        let sim = match PathSimulation::new(leg.points, leg.sim_duration) {
            Ok(sim) => sim,
            Err(e) => {
                warn!(%vehicle, "unusable return path, parking at base: {e}");
                self.park_at_base(vehicle);
                return Ok(());
            }
        };

        let state = self.state();
        if !state
            .vehicles
            .get(&vehicle)
            .is_some_and(|v| v.status == VehicleStatus::Returning)
        {
            return Ok(());
        }
        let this = self.clone();
        let tick = self.inner.config.return_tick_interval();
        self.legs().spawn(vehicle, LegKind::ToBase, move |leg_id, cancel| async move {
            this.run_leg(vehicle, LegKind::ToBase, leg_id, sim, tick, cancel).await;
        })?;
        info!(%vehicle, duration_s = leg.sim_duration.as_secs_f64(), source = ?leg.source, "vehicle returning");
        Ok(())
    }

    fn park_at_base(&self, vehicle: VehicleId) {
        let mut state = self.state();
        let st = &mut *state;
        st.busy.release(vehicle);
        if let Some(v) = st.vehicles.get_mut(&vehicle) {
            v.position = v.base;
            v.status = VehicleStatus::Available;
            self.emit(DispatchUpdate::VehicleMoved { vehicle, position: v.base });
            self.emit(DispatchUpdate::VehicleStatus { vehicle, status: v.status });
        }
    }

    /// Undo a claim whose leg could not start.
    fn abandon(&self, id: IncidentId, vehicle: VehicleId) {
        let mut state = self.state();
        let st = &mut *state;
        if st.busy.holder(vehicle) == Some(id) {
            st.busy.release(vehicle);
        }
        if let Some(incident) = st.incidents.get_mut(&id) {
            if incident.status == IncidentStatus::Assigned && incident.assigned_vehicle == Some(vehicle) {
                reset_assignment(incident);
                self.emit(DispatchUpdate::IncidentChanged(incident.clone()));
            }
        }
        if let Some(v) = st.vehicles.get_mut(&vehicle) {
            if v.status == VehicleStatus::Dispatched {
                v.status = VehicleStatus::Available;
                self.emit(DispatchUpdate::VehicleStatus { vehicle, status: v.status });
            }
        }
    }

    /// Boxed so the leg task's future type does not contain itself.
    fn retry_pending(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            let dispatched = self.dispatch_pending().await;
            if !dispatched.is_empty() {
                debug!(attempts = dispatched.len(), "pending queue retried");
            }
        })
    }

    // ── Helpers ───────────────────────────────────────────────────────────

    fn state(&self) -> MutexGuard<'_, FleetState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn legs(&self) -> MutexGuard<'_, LegRegistry> {
        self.inner.legs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fallback_point(&self) -> GeoPoint {
        self.inner
            .fallback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .fallback_point()
    }

    /// A closed receiver only means nobody is listening.
    fn emit(&self, update: DispatchUpdate) {
        let _ = self.inner.updates.send(update);
    }
}

fn check_point(p: GeoPoint) -> DispatchResult<()> {
    if p.is_valid() {
        Ok(())
    } else {
        Err(CoreError::InvalidCoordinate { lat: p.lat, lng: p.lng }.into())
    }
}

fn reset_assignment(incident: &mut Incident) {
    incident.status = IncidentStatus::Reported;
    incident.assigned_vehicle = None;
    incident.assigned_hospital = None;
    incident.dispatch_route = None;
    incident.hospital_route = None;
}
