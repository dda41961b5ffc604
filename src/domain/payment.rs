//! Payment domain types.
//! Framework-agnostic representations shared by the orchestrator, the
//! processors and the HTTP layer.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Payment methods accepted by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Card,
    Pix,
    Oxxo,
    Pse,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PaymentMethod::Card => "card",
            PaymentMethod::Pix => "pix",
            PaymentMethod::Oxxo => "oxxo",
            PaymentMethod::Pse => "pse",
        };
        f.write_str(s)
    }
}

/// An incoming payment authorization request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub transaction_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub customer_id: String,
}

/// The outcome of a single processor authorization attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseCode {
    Approved,
    SoftDecline,
    DeclinedInsufficientFunds,
    DeclinedFraud,
    ProcessorError,
    Timeout,
    RateLimited,
}

impl ResponseCode {
    /// True for failures worth retrying on another processor.
    pub fn is_retriable(self) -> bool {
        matches!(
            self,
            ResponseCode::SoftDecline
                | ResponseCode::ProcessorError
                | ResponseCode::Timeout
                | ResponseCode::RateLimited
        )
    }

    /// True for declines that are final for the whole processor pool.
    pub fn is_hard_decline(self) -> bool {
        matches!(
            self,
            ResponseCode::DeclinedInsufficientFunds | ResponseCode::DeclinedFraud
        )
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResponseCode::Approved => "approved",
            ResponseCode::SoftDecline => "soft_decline",
            ResponseCode::DeclinedInsufficientFunds => "declined_insufficient_funds",
            ResponseCode::DeclinedFraud => "declined_fraud",
            ResponseCode::ProcessorError => "processor_error",
            ResponseCode::Timeout => "timeout",
            ResponseCode::RateLimited => "rate_limited",
        };
        f.write_str(s)
    }
}

/// A processor's verdict on one authorization attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorResponse {
    pub processor_name: String,
    pub code: ResponseCode,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub latency_ms: u64,
}

/// One step of the retry loop, never mutated once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
    pub processor_name: String,
    pub response: ProcessorResponse,
    pub routing_reason: String,
    /// 1-based attempt number.
    pub attempt_number: u32,
    pub timestamp: DateTime<Utc>,
}

/// Final status of a payment after orchestration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Approved,
    Declined,
    ExhaustedRetries,
}

/// The final record of a payment, written to the store exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentResult {
    pub transaction_id: String,
    pub status: PaymentStatus,
    pub attempts: Vec<Attempt>,
    pub final_response: Option<ProcessorResponse>,
}

impl PaymentResult {
    pub fn new(transaction_id: impl Into<String>, status: PaymentStatus) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            status,
            attempts: Vec::new(),
            final_response: None,
        }
    }
}
