//! Demo endpoints: toggle processor degradation and fire synthetic batches.

use axum::{extract::State, response::IntoResponse, Json};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::domain::{PaymentMethod, PaymentRequest, PaymentResult, PaymentStatus};
use crate::error::AppError;
use crate::extractors::AppJson;
use crate::processors::Processor;
use crate::AppState;

#[derive(Deserialize)]
pub struct DegradeRequest {
    #[serde(default)]
    pub processor_name: String,
    #[serde(default)]
    pub degraded: bool,
}

#[derive(Serialize)]
struct DegradeResponse {
    processor: String,
    degraded: bool,
    message: &'static str,
}

/// POST /simulate/degrade
pub async fn degrade(
    State(state): State<AppState>,
    AppJson(req): AppJson<DegradeRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.processor_name.is_empty() {
        return Err(AppError::BadRequest("processor_name is required".to_string()));
    }

    let mock = state
        .mocks
        .iter()
        .find(|m| m.name() == req.processor_name)
        .ok_or_else(|| {
            AppError::NotFound(format!("processor not found: {}", req.processor_name))
        })?;

    mock.set_degraded(req.degraded);
    tracing::info!(
        processor = %req.processor_name,
        degraded = req.degraded,
        "processor_degradation_toggled"
    );

    Ok(Json(DegradeResponse {
        processor: req.processor_name,
        degraded: req.degraded,
        message: "degradation mode updated",
    }))
}

#[derive(Deserialize)]
pub struct BatchRequest {
    #[serde(default)]
    pub count: i64,
    pub method: Option<PaymentMethod>,
    pub currency: Option<String>,
}

#[derive(Serialize)]
struct BatchSummary {
    total: usize,
    approved: usize,
    declined: usize,
    exhausted_retries: usize,
    approval_rate: f64,
    avg_attempts: f64,
}

/// POST /simulate/batch
pub async fn batch(
    State(state): State<AppState>,
    AppJson(req): AppJson<BatchRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.count < 1 || req.count > 1000 {
        return Err(AppError::BadRequest(
            "count must be between 1 and 1000".to_string(),
        ));
    }

    let method = req.method.unwrap_or(PaymentMethod::Card);
    let currency = req.currency.unwrap_or_else(|| "USD".to_string());
    let run_id = Uuid::new_v4().simple().to_string();

    let mut results = Vec::with_capacity(req.count as usize);
    for i in 0..req.count {
        let payment = PaymentRequest {
            transaction_id: format!("batch-{}-{i}", &run_id[..8]),
            amount: random_amount(),
            currency: currency.clone(),
            payment_method: method,
            customer_id: format!("cust-batch-{i}"),
        };
        let result = state
            .orchestrator
            .process_payment(&CancellationToken::new(), &payment)
            .await;
        results.push(result);
    }

    Ok(Json(summarize(&results)))
}

/// Uniform amount between 5.00 and 200.00, exact to the cent.
fn random_amount() -> Decimal {
    Decimal::new(rand::rng().random_range(500..=20_000), 2)
}

fn summarize(results: &[PaymentResult]) -> BatchSummary {
    let mut approved = 0;
    let mut declined = 0;
    let mut exhausted = 0;
    let mut total_attempts = 0;

    for result in results {
        match result.status {
            PaymentStatus::Approved => approved += 1,
            PaymentStatus::Declined => declined += 1,
            PaymentStatus::ExhaustedRetries => exhausted += 1,
        }
        total_attempts += result.attempts.len();
    }

    BatchSummary {
        total: results.len(),
        approved,
        declined,
        exhausted_retries: exhausted,
        approval_rate: approved as f64 / results.len() as f64,
        avg_attempts: total_attempts as f64 / results.len() as f64,
    }
}
