//! Outbound state changes and the single-writer pump that applies them.

use serde::Serialize;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::warn;

use ems_assign::HandoffNotice;
use ems_core::{GeoPoint, Incident, IncidentId, Vehicle, VehicleId, VehicleStatus};

use crate::DispatchResult;

/// One change the dispatcher wants the data store to reflect.
///
/// Updates for a given vehicle are sent in the order they happened; the
/// pump applies them in channel order, so the store never sees interleaved
/// writes for the same record.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DispatchUpdate {
    VehicleAdded(Vehicle),
    VehicleMoved { vehicle: VehicleId, position: GeoPoint },
    VehicleStatus { vehicle: VehicleId, status: VehicleStatus },
    VehicleRemoved { vehicle: VehicleId },
    /// Full incident snapshot after any lifecycle or assignment change.
    IncidentChanged(Incident),
    IncidentRemoved { incident: IncidentId },
    HospitalNotified(HandoffNotice),
}

/// Destination for [`DispatchUpdate`]s.
///
/// A failed write is logged and skipped by [`pump_updates`]; the dispatcher's
/// in-memory state stays authoritative and later updates re-sync the record.
pub trait UpdateSink: Send {
    fn apply(&mut self, update: DispatchUpdate) -> DispatchResult<()>;
}

/// Drain `rx` into `sink` until every sender is dropped.
///
/// Returns `(applied, failed)`.
pub async fn pump_updates<S: UpdateSink + ?Sized>(
    mut rx: UnboundedReceiver<DispatchUpdate>,
    sink:   &mut S,
) -> (usize, usize) {
    let mut applied = 0;
    let mut failed = 0;
    while let Some(update) = rx.recv().await {
        match sink.apply(update) {
            Ok(()) => applied += 1,
            Err(e) => {
                warn!("store write failed, skipping: {e}");
                failed += 1;
            }
        }
    }
    (applied, failed)
}
