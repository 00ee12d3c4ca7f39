//! The `LegRegistry`: running legs keyed by vehicle.

use std::collections::HashMap;
use std::future::Future;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use ems_core::VehicleId;

use crate::{LegId, LegKind, MobilityError, MobilityResult};

/// A spawned leg task and the handles needed to stop it.
pub struct ActiveLeg {
    pub id:   LegId,
    pub kind: LegKind,
    cancel:   CancellationToken,
    handle:   JoinHandle<()>,
}

impl ActiveLeg {
    /// Cancel the task and wait until it has fully stopped.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            if e.is_panic() {
                warn!(leg = %self.id, "leg task panicked: {e}");
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Sparse map `VehicleId → ActiveLeg`.  Only moving vehicles have an entry.
///
/// The registry is plain synchronous state so the owner can hold it under a
/// `std::sync::Mutex`.  Stopping a leg is split in two: [`take`](Self::take)
/// under the lock, then [`ActiveLeg::stop`] after releasing it.
#[derive(Default)]
pub struct LegRegistry {
    legs:    HashMap<VehicleId, ActiveLeg>,
    next_id: u64,
}

impl LegRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a leg for `vehicle`.
    ///
    /// `make` receives the new leg's id and cancellation token and returns
    /// the future to spawn.  Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// [`MobilityError::AlreadyInTransit`] if the vehicle already has a leg;
    /// `make` is not called in that case.
    pub fn spawn<F, Fut>(&mut self, vehicle: VehicleId, kind: LegKind, make: F) -> MobilityResult<LegId>
    where
        F:   FnOnce(LegId, CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self.legs.contains_key(&vehicle) {
            return Err(MobilityError::AlreadyInTransit(vehicle));
        }

        let id = LegId(self.next_id);
        self.next_id += 1;
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(make(id, cancel.clone()));

        debug!(%vehicle, leg = %id, %kind, "leg started");
        self.legs.insert(vehicle, ActiveLeg { id, kind, cancel, handle });
        Ok(id)
    }

    /// Deregister `vehicle`'s leg if it is still `leg`.  Called by the leg's
    /// own task on completion; returns `false` when the leg was already taken
    /// or replaced.
    pub fn finish(&mut self, vehicle: VehicleId, leg: LegId) -> bool {
        match self.legs.get(&vehicle) {
            Some(active) if active.id == leg => {
                self.legs.remove(&vehicle);
                true
            }
            _ => false,
        }
    }

    /// Remove and return `vehicle`'s leg without stopping it.
    pub fn take(&mut self, vehicle: VehicleId) -> Option<ActiveLeg> {
        self.legs.remove(&vehicle)
    }

    /// Remove every leg.
    pub fn drain(&mut self) -> Vec<ActiveLeg> {
        self.legs.drain().map(|(_, leg)| leg).collect()
    }

    /// `(id, kind)` of `vehicle`'s running leg.
    pub fn active(&self, vehicle: VehicleId) -> Option<(LegId, LegKind)> {
        self.legs.get(&vehicle).map(|l| (l.id, l.kind))
    }

    #[inline]
    pub fn is_active(&self, vehicle: VehicleId) -> bool {
        self.legs.contains_key(&vehicle)
    }

    pub fn len(&self) -> usize {
        self.legs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }
}
