pub mod payments_errors;
pub mod paypal_gateway;

pub use payments_errors::GatewayError;
pub use paypal_gateway::PayPalGateway;

use async_trait::async_trait;
use rust_decimal::Decimal;

/// Outcome of a successful charge
#[derive(Debug, Clone)]
pub struct ChargeOutcome {
    /// Opaque transaction reference assigned by the processor
    pub external_ref: String,
}

/// Contract for the external payment processor.
///
/// A charge is all-or-nothing: on `Ok` the money has been captured, on `Err`
/// nothing was taken. Implementations must bound the call with a timeout; a
/// timeout is reported as `GatewayError::Timeout` and treated by callers
/// exactly like a decline.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(
        &self,
        amount: Decimal,
        description: &str,
        payer_email: &str,
    ) -> std::result::Result<ChargeOutcome, GatewayError>;
}
