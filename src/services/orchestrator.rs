//! Payment routing and retry engine.
//!
//! For each request the orchestrator derives an ordered list of eligible
//! processors from the health monitor, drives up to `max_attempts`
//! invocations, records every outcome back into the monitor and persists the
//! final result exactly once.

use chrono::Utc;
use std::cmp::Ordering;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::RoutingConfig;
use crate::domain::{
    Attempt, PaymentMethod, PaymentRequest, PaymentResult, PaymentStatus, ResponseCode,
};
use crate::processors::Processor;
use crate::services::health::{HealthMonitor, ProcessorStatus};
use crate::store::PaymentStore;

pub struct Orchestrator {
    processors: Vec<Arc<dyn Processor>>,
    monitor: Arc<HealthMonitor>,
    store: Arc<dyn PaymentStore>,
    max_attempts: u32,
}

struct Candidate {
    processor: Arc<dyn Processor>,
    health_score: f64,
    status: ProcessorStatus,
}

impl Orchestrator {
    pub fn new(
        processors: Vec<Arc<dyn Processor>>,
        monitor: Arc<HealthMonitor>,
        store: Arc<dyn PaymentStore>,
        routing: RoutingConfig,
    ) -> Self {
        Self {
            processors,
            monitor,
            store,
            max_attempts: routing.max_attempts,
        }
    }

    pub fn monitor(&self) -> &HealthMonitor {
        &self.monitor
    }

    /// Route a payment through the eligible processors and persist the final
    /// result. Total: every processor outcome becomes an [`Attempt`], never
    /// an error.
    pub async fn process_payment(
        &self,
        cancel: &CancellationToken,
        req: &PaymentRequest,
    ) -> PaymentResult {
        let mut result = PaymentResult::new(&req.transaction_id, PaymentStatus::Declined);

        let eligible = self.eligible_processors(req.payment_method);
        if eligible.is_empty() {
            tracing::warn!(
                txn_id = %req.transaction_id,
                payment_method = %req.payment_method,
                "no_eligible_processors"
            );
            self.store.save(result.clone());
            return result;
        }

        let mut attempt_num: u32 = 0;
        for candidate in eligible {
            if attempt_num >= self.max_attempts {
                break;
            }
            // A cancelled caller gets no further attempts.
            if cancel.is_cancelled() {
                break;
            }
            attempt_num += 1;

            let reason = routing_reason(&candidate, attempt_num, &result.attempts);

            tracing::info!(
                txn_id = %req.transaction_id,
                processor = candidate.processor.name(),
                attempt = attempt_num,
                reason = %reason,
                health_score = candidate.health_score,
                "payment_attempt"
            );

            let response = candidate.processor.authorize(cancel, req).await;
            let code = response.code;

            result.attempts.push(Attempt {
                processor_name: candidate.processor.name().to_string(),
                response: response.clone(),
                routing_reason: reason,
                attempt_number: attempt_num,
                timestamp: Utc::now(),
            });

            self.monitor.record(candidate.processor.name(), code);

            if code == ResponseCode::Approved {
                tracing::info!(
                    txn_id = %req.transaction_id,
                    processor = candidate.processor.name(),
                    total_attempts = attempt_num,
                    "payment_approved"
                );
                result.status = PaymentStatus::Approved;
                result.final_response = Some(response);
                self.store.save(result.clone());
                return result;
            }

            if code.is_hard_decline() {
                tracing::warn!(
                    txn_id = %req.transaction_id,
                    processor = candidate.processor.name(),
                    code = %code,
                    total_attempts = attempt_num,
                    "hard_decline_stopping"
                );
                result.status = PaymentStatus::Declined;
                result.final_response = Some(response);
                self.store.save(result.clone());
                return result;
            }

            tracing::warn!(
                txn_id = %req.transaction_id,
                processor = candidate.processor.name(),
                code = %code,
                attempt = attempt_num,
                "retriable_failure"
            );
        }

        tracing::warn!(
            txn_id = %req.transaction_id,
            total_attempts = attempt_num,
            "retries_exhausted"
        );
        result.status = PaymentStatus::ExhaustedRetries;
        result.final_response = result.attempts.last().map(|a| a.response.clone());
        self.store.save(result.clone());
        result
    }

    pub fn payment_history(&self, transaction_id: &str) -> Option<PaymentResult> {
        self.store.get(transaction_id)
    }

    /// Processors supporting the method, minus circuit-open ones, ordered by
    /// health score descending. The sort is stable, so configuration order
    /// breaks ties. Computed once per request.
    fn eligible_processors(&self, method: PaymentMethod) -> Vec<Candidate> {
        let mut eligible = Vec::new();

        for processor in &self.processors {
            if !processor.supports(method) {
                continue;
            }

            let health = self.monitor.health(processor.name());
            if health.status == ProcessorStatus::CircuitOpen {
                tracing::info!(
                    processor = processor.name(),
                    health_score = health.health_score,
                    "processor_skipped_circuit_open"
                );
                continue;
            }

            eligible.push(Candidate {
                processor: Arc::clone(processor),
                health_score: health.health_score,
                status: health.status,
            });
        }

        eligible.sort_by(|a, b| {
            b.health_score
                .partial_cmp(&a.health_score)
                .unwrap_or(Ordering::Equal)
        });

        eligible
    }
}

/// Attached to every attempt; support tooling greps these, so the wording is
/// fixed.
fn routing_reason(candidate: &Candidate, attempt_num: u32, attempts: &[Attempt]) -> String {
    if attempt_num == 1 {
        if candidate.status == ProcessorStatus::Degraded {
            return format!(
                "primary (degraded): health score {:.2}",
                candidate.health_score
            );
        }
        return format!(
            "primary: highest health score {:.2}",
            candidate.health_score
        );
    }

    let prev = &attempts[attempts.len() - 1];
    let mut reason = format!(
        "fallback: {} returned {}",
        prev.processor_name, prev.response.code
    );
    if candidate.status == ProcessorStatus::Degraded {
        reason.push_str(&format!(" (degraded: health {:.2})", candidate.health_score));
    }
    reason
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ProcessorResponse, ResponseCode};
    use crate::store::InMemoryPaymentStore;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicU32, Ordering as AtomicOrdering};

    /// Always returns the same response code.
    struct FixedProcessor {
        name: &'static str,
        methods: Vec<PaymentMethod>,
        code: ResponseCode,
        calls: AtomicU32,
    }

    impl FixedProcessor {
        fn new(name: &'static str, code: ResponseCode) -> Arc<Self> {
            Arc::new(Self {
                name,
                methods: vec![PaymentMethod::Card],
                code,
                calls: AtomicU32::new(0),
            })
        }

        fn call_count(&self) -> u32 {
            self.calls.load(AtomicOrdering::SeqCst)
        }
    }

    #[async_trait]
    impl Processor for FixedProcessor {
        fn name(&self) -> &str {
            self.name
        }

        fn supported_methods(&self) -> &[PaymentMethod] {
            &self.methods
        }

        async fn authorize(
            &self,
            _cancel: &CancellationToken,
            _req: &PaymentRequest,
        ) -> ProcessorResponse {
            self.calls.fetch_add(1, AtomicOrdering::SeqCst);
            ProcessorResponse {
                processor_name: self.name.to_string(),
                code: self.code,
                message: "test response".to_string(),
                timestamp: Utc::now(),
                latency_ms: 10,
            }
        }
    }

    fn orchestrator(processors: Vec<Arc<dyn Processor>>) -> Orchestrator {
        orchestrator_with_monitor(processors, Arc::new(HealthMonitor::new(Default::default())))
    }

    fn orchestrator_with_monitor(
        processors: Vec<Arc<dyn Processor>>,
        monitor: Arc<HealthMonitor>,
    ) -> Orchestrator {
        Orchestrator::new(
            processors,
            monitor,
            Arc::new(InMemoryPaymentStore::new()),
            RoutingConfig::default(),
        )
    }

    fn card_request(txn_id: &str) -> PaymentRequest {
        PaymentRequest {
            transaction_id: txn_id.to_string(),
            amount: dec!(100.00),
            currency: "USD".to_string(),
            payment_method: PaymentMethod::Card,
            customer_id: "cust-1".to_string(),
        }
    }

    #[tokio::test]
    async fn approved_on_first_attempt() {
        let orch = orchestrator(vec![
            FixedProcessor::new("ProcA", ResponseCode::Approved),
            FixedProcessor::new("ProcB", ResponseCode::Approved),
        ]);

        let result = orch
            .process_payment(&CancellationToken::new(), &card_request("tx-001"))
            .await;

        assert_eq!(result.status, PaymentStatus::Approved);
        assert_eq!(result.attempts.len(), 1);
        assert_eq!(result.attempts[0].processor_name, "ProcA");
        assert_eq!(result.attempts[0].attempt_number, 1);
        assert!(result.attempts[0].routing_reason.starts_with("primary:"));
        assert!(result.final_response.is_some());
    }

    #[tokio::test]
    async fn soft_decline_falls_back_to_next_processor() {
        let orch = orchestrator(vec![
            FixedProcessor::new("ProcA", ResponseCode::SoftDecline),
            FixedProcessor::new("ProcB", ResponseCode::Approved),
        ]);

        let result = orch
            .process_payment(&CancellationToken::new(), &card_request("tx-002"))
            .await;

        assert_eq!(result.status, PaymentStatus::Approved);
        assert_eq!(result.attempts.len(), 2);
        assert_eq!(result.attempts[0].response.code, ResponseCode::SoftDecline);
        assert_eq!(result.attempts[1].processor_name, "ProcB");
        assert!(
            result.attempts[1]
                .routing_reason
                .starts_with("fallback: ProcA returned soft_decline"),
            "unexpected reason: {}",
            result.attempts[1].routing_reason
        );
    }

    #[tokio::test]
    async fn hard_decline_stops_the_whole_pool() {
        let proc_b = FixedProcessor::new("ProcB", ResponseCode::Approved);
        let orch = orchestrator(vec![
            FixedProcessor::new("ProcA", ResponseCode::DeclinedInsufficientFunds),
            Arc::clone(&proc_b) as Arc<dyn Processor>,
        ]);

        let result = orch
            .process_payment(&CancellationToken::new(), &card_request("tx-003"))
            .await;

        assert_eq!(result.status, PaymentStatus::Declined);
        assert_eq!(result.attempts.len(), 1, "hard decline must not retry");
        assert_eq!(
            result.final_response.as_ref().unwrap().code,
            ResponseCode::DeclinedInsufficientFunds
        );
        assert_eq!(proc_b.call_count(), 0, "ProcB must never be invoked");
    }

    #[tokio::test]
    async fn fraud_decline_stops_immediately() {
        let orch = orchestrator(vec![
            FixedProcessor::new("ProcA", ResponseCode::DeclinedFraud),
            FixedProcessor::new("ProcB", ResponseCode::Approved),
        ]);

        let result = orch
            .process_payment(&CancellationToken::new(), &card_request("tx-004"))
            .await;

        assert_eq!(result.status, PaymentStatus::Declined);
        assert_eq!(result.attempts.len(), 1);
        assert_eq!(
            result.final_response.as_ref().unwrap().code,
            ResponseCode::DeclinedFraud
        );
    }

    #[tokio::test]
    async fn attempt_cap_stops_after_three() {
        let proc_d = FixedProcessor::new("ProcD", ResponseCode::Approved);
        let orch = orchestrator(vec![
            FixedProcessor::new("ProcA", ResponseCode::ProcessorError),
            FixedProcessor::new("ProcB", ResponseCode::SoftDecline),
            FixedProcessor::new("ProcC", ResponseCode::Timeout),
            Arc::clone(&proc_d) as Arc<dyn Processor>,
        ]);

        let result = orch
            .process_payment(&CancellationToken::new(), &card_request("tx-005"))
            .await;

        assert_eq!(result.status, PaymentStatus::ExhaustedRetries);
        assert_eq!(result.attempts.len(), 3);
        let numbers: Vec<u32> = result.attempts.iter().map(|a| a.attempt_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(proc_d.call_count(), 0, "fourth processor is never tried");
    }

    #[tokio::test]
    async fn unsupported_method_declines_with_no_attempts() {
        let orch = orchestrator(vec![
            FixedProcessor::new("ProcA", ResponseCode::Approved),
            FixedProcessor::new("ProcB", ResponseCode::Approved),
        ]);

        let mut req = card_request("tx-006");
        req.payment_method = PaymentMethod::Pix;
        let result = orch.process_payment(&CancellationToken::new(), &req).await;

        assert_eq!(result.status, PaymentStatus::Declined);
        assert!(result.attempts.is_empty());
        assert!(result.final_response.is_none());
    }

    #[tokio::test]
    async fn circuit_open_processor_is_skipped() {
        let monitor = Arc::new(HealthMonitor::new(Default::default()));
        for _ in 0..20 {
            monitor.record("ProcA", ResponseCode::ProcessorError);
        }

        let orch = orchestrator_with_monitor(
            vec![
                FixedProcessor::new("ProcA", ResponseCode::Approved),
                FixedProcessor::new("ProcB", ResponseCode::Approved),
            ],
            monitor,
        );

        let result = orch
            .process_payment(&CancellationToken::new(), &card_request("tx-007"))
            .await;

        assert_eq!(result.status, PaymentStatus::Approved);
        assert_eq!(result.attempts.len(), 1);
        assert_eq!(result.attempts[0].processor_name, "ProcB");
        assert_eq!(result.attempts[0].attempt_number, 1);
    }

    #[tokio::test]
    async fn healthier_processor_is_tried_first() {
        let monitor = Arc::new(HealthMonitor::new(Default::default()));
        // ProcA: 3/10 approved (degraded but usable), ProcB: 10/10.
        for _ in 0..7 {
            monitor.record("ProcA", ResponseCode::ProcessorError);
        }
        for _ in 0..3 {
            monitor.record("ProcA", ResponseCode::Approved);
        }
        for _ in 0..10 {
            monitor.record("ProcB", ResponseCode::Approved);
        }

        let orch = orchestrator_with_monitor(
            vec![
                FixedProcessor::new("ProcA", ResponseCode::Approved),
                FixedProcessor::new("ProcB", ResponseCode::Approved),
            ],
            monitor,
        );

        let result = orch
            .process_payment(&CancellationToken::new(), &card_request("tx-008"))
            .await;

        assert_eq!(result.status, PaymentStatus::Approved);
        assert_eq!(result.attempts.len(), 1);
        assert_eq!(result.attempts[0].processor_name, "ProcB");
    }

    #[tokio::test]
    async fn degraded_processors_are_still_tried() {
        let monitor = Arc::new(HealthMonitor::new(Default::default()));
        for _ in 0..7 {
            monitor.record("ProcA", ResponseCode::ProcessorError);
        }
        for _ in 0..3 {
            monitor.record("ProcA", ResponseCode::Approved);
        }

        let orch = orchestrator_with_monitor(
            vec![FixedProcessor::new("ProcA", ResponseCode::Approved)],
            monitor,
        );

        let result = orch
            .process_payment(&CancellationToken::new(), &card_request("tx-009"))
            .await;

        assert_eq!(result.status, PaymentStatus::Approved);
        assert!(
            result.attempts[0]
                .routing_reason
                .starts_with("primary (degraded): health score 0.30"),
            "unexpected reason: {}",
            result.attempts[0].routing_reason
        );
    }

    #[tokio::test]
    async fn every_retriable_code_advances_the_loop() {
        for code in [
            ResponseCode::SoftDecline,
            ResponseCode::ProcessorError,
            ResponseCode::Timeout,
            ResponseCode::RateLimited,
        ] {
            let orch = orchestrator(vec![
                FixedProcessor::new("ProcA", code),
                FixedProcessor::new("ProcB", ResponseCode::Approved),
            ]);

            let result = orch
                .process_payment(&CancellationToken::new(), &card_request("tx-sweep"))
                .await;

            assert_eq!(result.status, PaymentStatus::Approved, "code {code}");
            assert_eq!(result.attempts.len(), 2, "code {code}");
        }
    }

    #[tokio::test]
    async fn result_is_persisted_and_retrievable() {
        let orch = orchestrator(vec![FixedProcessor::new("ProcA", ResponseCode::Approved)]);

        orch.process_payment(&CancellationToken::new(), &card_request("tx-store"))
            .await;

        let stored = orch.payment_history("tx-store").expect("result stored");
        assert_eq!(stored.status, PaymentStatus::Approved);
        assert!(orch.payment_history("tx-nonexistent").is_none());
    }

    #[tokio::test]
    async fn outcome_is_recorded_into_the_monitor() {
        let orch = orchestrator(vec![FixedProcessor::new("ProcA", ResponseCode::SoftDecline)]);

        orch.process_payment(&CancellationToken::new(), &card_request("tx-rec"))
            .await;

        let h = orch.monitor().health("ProcA");
        assert_eq!(h.total_recent, 1);
        assert_eq!(h.error_count, 1);
    }

    #[tokio::test]
    async fn cancelled_before_first_attempt_exhausts_without_attempts() {
        let proc_a = FixedProcessor::new("ProcA", ResponseCode::Approved);
        let orch = orchestrator(vec![Arc::clone(&proc_a) as Arc<dyn Processor>]);

        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = orch.process_payment(&cancel, &card_request("tx-cancel")).await;

        assert_eq!(result.status, PaymentStatus::ExhaustedRetries);
        assert!(result.attempts.is_empty());
        assert!(result.final_response.is_none());
        assert_eq!(proc_a.call_count(), 0);
    }

    #[tokio::test]
    async fn cancellation_mid_loop_stops_before_next_attempt() {
        /// Cancels the shared token while returning a retriable failure.
        struct CancellingProcessor {
            methods: Vec<PaymentMethod>,
        }

        #[async_trait]
        impl Processor for CancellingProcessor {
            fn name(&self) -> &str {
                "ProcA"
            }

            fn supported_methods(&self) -> &[PaymentMethod] {
                &self.methods
            }

            async fn authorize(
                &self,
                cancel: &CancellationToken,
                _req: &PaymentRequest,
            ) -> ProcessorResponse {
                cancel.cancel();
                ProcessorResponse {
                    processor_name: "ProcA".to_string(),
                    code: ResponseCode::Timeout,
                    message: "request cancelled".to_string(),
                    timestamp: Utc::now(),
                    latency_ms: 0,
                }
            }
        }

        let proc_b = FixedProcessor::new("ProcB", ResponseCode::Approved);
        let orch = orchestrator(vec![
            Arc::new(CancellingProcessor {
                methods: vec![PaymentMethod::Card],
            }),
            Arc::clone(&proc_b) as Arc<dyn Processor>,
        ]);

        let result = orch
            .process_payment(&CancellationToken::new(), &card_request("tx-midcancel"))
            .await;

        assert_eq!(result.status, PaymentStatus::ExhaustedRetries);
        assert_eq!(result.attempts.len(), 1);
        assert_eq!(result.attempts[0].response.code, ResponseCode::Timeout);
        assert_eq!(proc_b.call_count(), 0);
    }

    #[tokio::test]
    async fn concurrent_payments_all_terminate_and_persist() {
        let orch = Arc::new(orchestrator(vec![
            FixedProcessor::new("ProcA", ResponseCode::Approved),
            FixedProcessor::new("ProcB", ResponseCode::Approved),
        ]));

        let mut handles = Vec::new();
        for i in 0..50 {
            let orch = Arc::clone(&orch);
            handles.push(tokio::spawn(async move {
                let req = card_request(&format!("tx-conc-{i}"));
                orch.process_payment(&CancellationToken::new(), &req).await
            }));
        }

        for handle in handles {
            let result = handle.await.unwrap();
            assert_eq!(result.status, PaymentStatus::Approved);
        }
        for i in 0..50 {
            assert!(orch.payment_history(&format!("tx-conc-{i}")).is_some());
        }
    }
}
