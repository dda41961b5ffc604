//! Downstream processor contract and the mock pool used for demos.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::{PaymentMethod, PaymentRequest, ProcessorResponse};

pub mod defaults;
pub mod mock;

pub use mock::{MethodOverride, MockConfig, MockProcessor, OutcomeDistribution};

/// A downstream payment authorization backend.
///
/// Implementations never fail: every invocation yields a response with a
/// well-defined [`ResponseCode`](crate::domain::ResponseCode). Cancellation
/// of the caller's token must surface as a `timeout` response.
#[async_trait]
pub trait Processor: Send + Sync {
    /// Unique, stable identifier within the pool.
    fn name(&self) -> &str;

    /// Payment methods this processor can authorize.
    fn supported_methods(&self) -> &[PaymentMethod];

    /// Attempt to authorize a payment. Latency in the response is measured
    /// wall-clock elapsed.
    async fn authorize(
        &self,
        cancel: &CancellationToken,
        req: &PaymentRequest,
    ) -> ProcessorResponse;

    fn supports(&self, method: PaymentMethod) -> bool {
        self.supported_methods().contains(&method)
    }
}
