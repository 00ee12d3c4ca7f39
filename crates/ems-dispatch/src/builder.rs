//! Fluent builder for constructing a [`Dispatcher`].

use std::sync::{Mutex, RwLock};

use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};

use ems_assign::AssignmentEngine;
use ems_core::{FallbackLocation, FixedLocation, Hospital, Vehicle};
use ems_mobility::LegRegistry;
use ems_spatial::NavigationGraph;

use crate::dispatcher::{FleetState, Inner};
use crate::{
    DispatchConfig, DispatchResult, DispatchUpdate, Dispatcher, ExternalRouter, KeywordClassifier,
    NoExternalRouter, Planner, TriageClassifier,
};

/// Fluent builder for [`Dispatcher<X>`].
///
/// # Required inputs
///
/// - [`DispatchConfig`]: grid, speeds, tick intervals, weights.
///
/// # Optional inputs (have defaults)
///
/// | Method                  | Default                                         |
/// |-------------------------|-------------------------------------------------|
/// | `.external_router(r)`   | [`NoExternalRouter`] (grid routing only)        |
/// | `.graph(g)`             | Grid over `config.bounds` at `resolution_deg`   |
/// | `.triage(c)`            | [`KeywordClassifier`]                           |
/// | `.fallback(f)`          | [`FixedLocation`] at the centre of the bounds   |
/// | `.vehicles(v)`          | Empty fleet                                     |
/// | `.hospitals(h)`         | No hospitals                                    |
///
/// # Example
///
/// ```rust,ignore
/// let (dispatcher, updates) = DispatcherBuilder::new(DispatchConfig::default())
///     .vehicles(load_vehicles_csv(path)?)
///     .hospitals(hospitals)
///     .build()?;
/// tokio::spawn(async move { pump_updates(updates, &mut store).await });
/// dispatcher.report_call("elderly man collapsed, not breathing", "Kothrud").await?;
/// ```
pub struct DispatcherBuilder<X: ExternalRouter = NoExternalRouter> {
    config:    DispatchConfig,
    external:  X,
    graph:     Option<NavigationGraph>,
    triage:    Option<Box<dyn TriageClassifier>>,
    fallback:  Option<Box<dyn FallbackLocation>>,
    vehicles:  Vec<Vehicle>,
    hospitals: Vec<Hospital>,
}

impl DispatcherBuilder<NoExternalRouter> {
    pub fn new(config: DispatchConfig) -> Self {
        Self {
            config,
            external:  NoExternalRouter,
            graph:     None,
            triage:    None,
            fallback:  None,
            vehicles:  Vec::new(),
            hospitals: Vec::new(),
        }
    }
}

impl<X: ExternalRouter> DispatcherBuilder<X> {
    /// Consult `router` before the grid for every leg.
    pub fn external_router<Y: ExternalRouter>(self, router: Y) -> DispatcherBuilder<Y> {
        DispatcherBuilder {
            config:    self.config,
            external:  router,
            graph:     self.graph,
            triage:    self.triage,
            fallback:  self.fallback,
            vehicles:  self.vehicles,
            hospitals: self.hospitals,
        }
    }

    /// Use a prebuilt graph instead of building one from the config.
    pub fn graph(mut self, graph: NavigationGraph) -> Self {
        self.graph = Some(graph);
        self
    }

    pub fn triage<C: TriageClassifier + 'static>(mut self, classifier: C) -> Self {
        self.triage = Some(Box::new(classifier));
        self
    }

    pub fn fallback<F: FallbackLocation + 'static>(mut self, policy: F) -> Self {
        self.fallback = Some(Box::new(policy));
        self
    }

    pub fn vehicles(mut self, vehicles: Vec<Vehicle>) -> Self {
        self.vehicles = vehicles;
        self
    }

    pub fn hospitals(mut self, hospitals: Vec<Hospital>) -> Self {
        self.hospitals = hospitals;
        self
    }

    /// Validate inputs and construct the dispatcher.
    ///
    /// Returns the dispatcher and the receiving end of its update channel.
    /// Seed vehicles appear on the channel as `VehicleAdded`.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::Config`][crate::DispatchError::Config] for an
    ///   invalid configuration.
    /// - [`DispatchError::Spatial`][crate::DispatchError::Spatial] if the
    ///   grid cannot be built.
    /// - Any error from adding a seed vehicle or hospital.
    pub fn build(self) -> DispatchResult<(Dispatcher<X>, UnboundedReceiver<DispatchUpdate>)> {
        self.config.validate()?;

        let graph = match self.graph {
            Some(g) => g,
            None => NavigationGraph::new(self.config.bounds, self.config.resolution_deg)?,
        };
        let fallback: Box<dyn FallbackLocation> = match self.fallback {
            Some(f) => f,
            None => Box::new(FixedLocation(self.config.bounds.center())),
        };
        let triage: Box<dyn TriageClassifier> = match self.triage {
            Some(t) => t,
            None => Box::new(KeywordClassifier),
        };

        let (tx, rx) = unbounded_channel();
        let dispatcher = Dispatcher::from_inner(Inner {
            engine:   AssignmentEngine::new(self.config.vehicle_weights, self.config.hospital_weights),
            planner:  Planner::new(self.external, &self.config),
            graph:    RwLock::new(graph),
            state:    Mutex::new(FleetState::default()),
            legs:     Mutex::new(LegRegistry::new()),
            triage,
            fallback: Mutex::new(fallback),
            updates:  tx,
            config:   self.config,
        });

        for vehicle in self.vehicles {
            dispatcher.add_vehicle(vehicle)?;
        }
        for hospital in self.hospitals {
            dispatcher.add_hospital(hospital)?;
        }
        Ok((dispatcher, rx))
    }
}
