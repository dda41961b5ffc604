//! Processor health tracking.
//!
//! Each processor gets a bounded sliding window of recent authorization
//! outcomes. The health score is approvals over total within the active
//! window; an empty or fully expired window scores 1.0 so unknown processors
//! are not penalized.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::config::RoutingConfig;
use crate::domain::ResponseCode;

/// Coarse health state derived from the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessorStatus {
    Healthy,
    Degraded,
    CircuitOpen,
}

/// Point-in-time health snapshot for one processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorHealth {
    pub processor_name: String,
    pub health_score: f64,
    pub status: ProcessorStatus,
    pub total_recent: usize,
    pub approved_count: usize,
    pub error_count: usize,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
struct Outcome {
    approved: bool,
    recorded_at: Instant,
}

/// Concurrency-safe sliding-window health estimator.
///
/// A single reader/writer lock guards all windows; writers append and prune,
/// readers copy counts out. Snapshots are never stored.
pub struct HealthMonitor {
    windows: RwLock<HashMap<String, Vec<Outcome>>>,
    window_size: usize,
    window_duration: Duration,
    degraded_threshold: f64,
    circuit_open_threshold: f64,
}

impl HealthMonitor {
    pub fn new(routing: RoutingConfig) -> Self {
        Self {
            windows: RwLock::new(HashMap::new()),
            window_size: routing.health_window_size,
            window_duration: routing.health_window,
            degraded_threshold: routing.degraded_threshold,
            circuit_open_threshold: routing.circuit_open_threshold,
        }
    }

    /// Record one authorization outcome. Only `approved` counts as an
    /// approval; every other code counts as a failure.
    pub fn record(&self, processor_name: &str, code: ResponseCode) {
        let mut windows = self.windows.write().expect("health monitor lock poisoned");

        let window = windows.entry(processor_name.to_string()).or_default();
        window.push(Outcome {
            approved: code == ResponseCode::Approved,
            recorded_at: Instant::now(),
        });

        window.retain(|o| o.recorded_at.elapsed() < self.window_duration);
        if window.len() > self.window_size {
            let excess = window.len() - self.window_size;
            window.drain(..excess);
        }
    }

    /// Derive a fresh snapshot over the active window. Pruning is re-applied
    /// on read so a window whose entries have all aged out reports the
    /// optimistic bootstrap.
    pub fn health(&self, processor_name: &str) -> ProcessorHealth {
        let windows = self.windows.read().expect("health monitor lock poisoned");
        self.snapshot(processor_name, windows.get(processor_name))
    }

    /// Snapshot for every processor ever recorded, sorted by name.
    pub fn all_health(&self) -> Vec<ProcessorHealth> {
        let windows = self.windows.read().expect("health monitor lock poisoned");
        let mut healths: Vec<ProcessorHealth> = windows
            .iter()
            .map(|(name, window)| self.snapshot(name, Some(window)))
            .collect();
        healths.sort_by(|a, b| a.processor_name.cmp(&b.processor_name));
        healths
    }

    pub fn is_circuit_open(&self, processor_name: &str) -> bool {
        self.health(processor_name).status == ProcessorStatus::CircuitOpen
    }

    fn snapshot(&self, name: &str, window: Option<&Vec<Outcome>>) -> ProcessorHealth {
        let active: Vec<Outcome> = window
            .map(|w| {
                let mut active: Vec<Outcome> = w
                    .iter()
                    .copied()
                    .filter(|o| o.recorded_at.elapsed() < self.window_duration)
                    .collect();
                if active.len() > self.window_size {
                    let excess = active.len() - self.window_size;
                    active.drain(..excess);
                }
                active
            })
            .unwrap_or_default();

        if active.is_empty() {
            return ProcessorHealth {
                processor_name: name.to_string(),
                health_score: 1.0,
                status: ProcessorStatus::Healthy,
                total_recent: 0,
                approved_count: 0,
                error_count: 0,
                last_updated: Utc::now(),
            };
        }

        let approved = active.iter().filter(|o| o.approved).count();
        let total = active.len();
        let score = approved as f64 / total as f64;

        let status = if score < self.circuit_open_threshold {
            ProcessorStatus::CircuitOpen
        } else if score < self.degraded_threshold {
            ProcessorStatus::Degraded
        } else {
            ProcessorStatus::Healthy
        };

        ProcessorHealth {
            processor_name: name.to_string(),
            health_score: score,
            status,
            total_recent: total,
            approved_count: approved,
            error_count: total - approved,
            last_updated: Utc::now(),
        }
    }
}
