pub mod health;
pub mod orchestrator;

pub use health::{HealthMonitor, ProcessorHealth, ProcessorStatus};
pub use orchestrator::Orchestrator;
