use rust_decimal::Decimal;
use std::fmt;

use crate::domain::PaymentRequest;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

pub fn validate_required(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }

    Ok(())
}

pub fn validate_positive_amount(amount: &Decimal) -> ValidationResult {
    if amount <= &Decimal::ZERO {
        return Err(ValidationError::new("amount", "must be greater than zero"));
    }

    Ok(())
}

/// Field-level checks for an inbound payment request. The payment method is
/// already constrained by the enum at deserialization time.
pub fn validate_payment_request(req: &PaymentRequest) -> ValidationResult {
    validate_required("transaction_id", &req.transaction_id)?;
    validate_positive_amount(&req.amount)?;
    validate_required("currency", &req.currency)?;
    validate_required("customer_id", &req.customer_id)?;

    Ok(())
}
