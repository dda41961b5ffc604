use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;

use crate::services::ProcessorHealth;
use crate::AppState;

#[derive(Serialize)]
struct ProcessorHealthList {
    processors: Vec<ProcessorHealth>,
}

/// GET /health/processors
pub async fn processor_health(State(state): State<AppState>) -> impl IntoResponse {
    Json(ProcessorHealthList {
        processors: state.monitor.all_health(),
    })
}
