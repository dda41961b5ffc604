pub mod config;
pub mod domain;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod processors;
pub mod services;
pub mod store;
pub mod validation;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::config::RoutingConfig;
use crate::processors::{defaults, MockProcessor, Processor};
use crate::services::{HealthMonitor, Orchestrator};
use crate::store::InMemoryPaymentStore;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub monitor: Arc<HealthMonitor>,
    /// The mock pool, kept separately so the simulation endpoints can toggle
    /// degradation without downcasting trait objects.
    pub mocks: Vec<Arc<MockProcessor>>,
}

impl AppState {
    /// Wire the reference pool, health monitor and in-memory store together.
    pub fn new(routing: RoutingConfig) -> Self {
        let mocks = defaults::reference_pool();
        let processors: Vec<Arc<dyn Processor>> = mocks
            .iter()
            .map(|m| Arc::clone(m) as Arc<dyn Processor>)
            .collect();

        let monitor = Arc::new(HealthMonitor::new(routing));
        let orchestrator = Arc::new(Orchestrator::new(
            processors,
            Arc::clone(&monitor),
            Arc::new(InMemoryPaymentStore::new()),
            routing,
        ));

        Self {
            orchestrator,
            monitor,
            mocks,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/payments", post(handlers::payments::process_payment))
        .route("/payments/{id}", get(handlers::payments::get_payment_history))
        .route("/health/processors", get(handlers::health::processor_health))
        .route("/simulate/degrade", post(handlers::simulate::degrade))
        .route("/simulate/batch", post(handlers::simulate::batch))
        .with_state(state)
}
