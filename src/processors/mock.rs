//! Configurable mock processor.
//!
//! Simulates a downstream authorization backend with a per-method outcome
//! distribution, uniform random latency and a runtime degraded toggle used by
//! the simulation endpoints.

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::domain::{PaymentMethod, PaymentRequest, ProcessorResponse, ResponseCode};
use crate::processors::Processor;

/// Probability of each response type. Rolled cumulatively in the order
/// approval, soft decline, hard decline; the remainder is a processor error.
#[derive(Debug, Clone, Copy)]
pub struct OutcomeDistribution {
    pub approval_rate: f64,
    pub soft_decline_rate: f64,
    pub hard_decline_rate: f64,
    pub error_rate: f64,
}

/// Per-method override of the default outcome distribution.
#[derive(Debug, Clone)]
pub struct MethodOverride {
    pub method: PaymentMethod,
    pub distribution: OutcomeDistribution,
}

#[derive(Debug, Clone)]
pub struct MockConfig {
    pub name: &'static str,
    pub methods: Vec<PaymentMethod>,
    pub default_outcomes: OutcomeDistribution,
    pub method_overrides: Vec<MethodOverride>,
    pub min_latency: Duration,
    pub max_latency: Duration,
}

pub struct MockProcessor {
    config: MockConfig,
    degraded: AtomicBool,
}

impl MockProcessor {
    pub fn new(config: MockConfig) -> Self {
        Self {
            config,
            degraded: AtomicBool::new(false),
        }
    }

    /// Toggle degraded mode: 80% processor errors, 20% approvals.
    pub fn set_degraded(&self, degraded: bool) {
        self.degraded.store(degraded, Ordering::Relaxed);
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Relaxed)
    }

    fn roll_outcome(&self, method: PaymentMethod) -> ResponseCode {
        let mut roll: f64 = rand::rng().random();

        if self.is_degraded() {
            if roll < 0.80 {
                return ResponseCode::ProcessorError;
            }
            return ResponseCode::Approved;
        }

        let dist = self
            .config
            .method_overrides
            .iter()
            .find(|o| o.method == method)
            .map(|o| o.distribution)
            .unwrap_or(self.config.default_outcomes);

        if roll < dist.approval_rate {
            return ResponseCode::Approved;
        }
        roll -= dist.approval_rate;
        if roll < dist.soft_decline_rate {
            return ResponseCode::SoftDecline;
        }
        roll -= dist.soft_decline_rate;
        if roll < dist.hard_decline_rate {
            return ResponseCode::DeclinedInsufficientFunds;
        }
        ResponseCode::ProcessorError
    }

    fn roll_latency(&self) -> Duration {
        let min = self.config.min_latency;
        let max = self.config.max_latency;
        let spread = max.saturating_sub(min).as_millis() as u64;
        if spread == 0 {
            return min;
        }
        min + Duration::from_millis(rand::rng().random_range(0..spread))
    }
}

#[async_trait]
impl Processor for MockProcessor {
    fn name(&self) -> &str {
        self.config.name
    }

    fn supported_methods(&self) -> &[PaymentMethod] {
        &self.config.methods
    }

    async fn authorize(
        &self,
        cancel: &CancellationToken,
        req: &PaymentRequest,
    ) -> ProcessorResponse {
        let started = Instant::now();

        tokio::select! {
            _ = tokio::time::sleep(self.roll_latency()) => {}
            _ = cancel.cancelled() => {
                return ProcessorResponse {
                    processor_name: self.config.name.to_string(),
                    code: ResponseCode::Timeout,
                    message: "request cancelled".to_string(),
                    timestamp: Utc::now(),
                    latency_ms: started.elapsed().as_millis() as u64,
                };
            }
        }

        let code = self.roll_outcome(req.payment_method);

        ProcessorResponse {
            processor_name: self.config.name.to_string(),
            code,
            message: response_message(code).to_string(),
            timestamp: Utc::now(),
            latency_ms: started.elapsed().as_millis() as u64,
        }
    }
}

fn response_message(code: ResponseCode) -> &'static str {
    match code {
        ResponseCode::Approved => "transaction approved",
        ResponseCode::SoftDecline => "soft decline - try again",
        ResponseCode::DeclinedInsufficientFunds => "insufficient funds",
        ResponseCode::DeclinedFraud => "suspected fraud",
        ResponseCode::ProcessorError => "internal processor error",
        ResponseCode::Timeout => "request timed out",
        ResponseCode::RateLimited => "rate limit exceeded",
    }
}
