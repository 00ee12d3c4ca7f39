//! `ems-dispatch`: the dispatch orchestrator.
//!
//! Glues the navigation graph, the assignment engine, and the movement
//! simulator together behind one clonable [`Dispatcher`] handle.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                      |
//! |----------------|---------------------------------------------------------------|
//! | [`builder`]    | `DispatcherBuilder`: fluent construction and validation       |
//! | [`dispatcher`] | `Dispatcher`: incident lifecycle, legs, operator edits        |
//! | [`planner`]    | `Planner`: external router → grid A* → straight line          |
//! | [`external`]   | `ExternalRouter` trait, `OsrmRouter`, `NoExternalRouter`      |
//! | [`triage`]     | `TriageClassifier` trait, `KeywordClassifier`                 |
//! | [`updates`]    | `DispatchUpdate`, `UpdateSink`, `pump_updates`                |
//! | [`store`]      | `MemoryStore`, `StoreChange`                                  |
//! | [`loader`]     | CSV loaders for fleet and hospital seed data                  |
//! | [`config`]     | `DispatchConfig` (JSON, every field defaulted)                |
//! | [`error`]      | `DispatchError`, `DispatchResult<T>`                          |
//!
//! # Incident lifecycle
//!
//! ```text
//! report ─► dispatch ─► Assigned ─► (plan) ─► EnRoute ─► (leg arrives) ─► OnScene
//!                                                                        │
//!                          Available ◄─ (leg arrives at base) ◄─ Returning ◄─ resolve
//! ```
//!
//! Assignment reads the busy index and records the claim under one lock, so
//! two incidents dispatched concurrently can never take the same vehicle.
//! Every state change is pushed onto an unbounded channel of
//! [`DispatchUpdate`]s; [`pump_updates`] drains it into an [`UpdateSink`]
//! one write at a time.

pub mod builder;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod external;
pub mod loader;
pub mod planner;
pub mod store;
pub mod triage;
pub mod updates;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use builder::DispatcherBuilder;
pub use config::DispatchConfig;
pub use dispatcher::{CallReport, DispatchOutcome, Dispatcher};
pub use error::{DispatchError, DispatchResult};
pub use external::{
    ExternalRoute, ExternalRouter, NoExternalRouter, OSRM_ENDPOINTS, OsrmRouter, RoutingError,
};
pub use loader::{load_hospitals_csv, load_hospitals_reader, load_vehicles_csv, load_vehicles_reader};
pub use planner::{PlannedLeg, Planner, RouteSource};
pub use store::{MemoryStore, StoreChange};
pub use triage::{KeywordClassifier, Triage, TriageClassifier, TriageError};
pub use updates::{DispatchUpdate, UpdateSink, pump_updates};
