use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tokio_util::sync::CancellationToken;

use crate::domain::{PaymentRequest, PaymentStatus};
use crate::error::AppError;
use crate::extractors::AppJson;
use crate::validation::validate_payment_request;
use crate::AppState;

/// POST /payments
pub async fn process_payment(
    State(state): State<AppState>,
    AppJson(req): AppJson<PaymentRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_payment_request(&req)?;

    let cancel = CancellationToken::new();
    let result = state.orchestrator.process_payment(&cancel, &req).await;

    let status = match result.status {
        PaymentStatus::Approved => StatusCode::OK,
        PaymentStatus::Declined | PaymentStatus::ExhaustedRetries => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
    };

    Ok((status, Json(result)))
}

/// GET /payments/{id}
pub async fn get_payment_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let result = state
        .orchestrator
        .payment_history(&id)
        .ok_or_else(|| AppError::NotFound(format!("transaction not found: {id}")))?;

    Ok(Json(result))
}
