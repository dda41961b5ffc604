pub mod payment;

pub use payment::{
    Attempt, PaymentMethod, PaymentRequest, PaymentResult, PaymentStatus, ProcessorResponse,
    ResponseCode,
};
