use async_trait::async_trait;

use crate::models::{CheckoutEvent, CheckoutSession, CreateCheckoutRequest, PaymentGatewayError};

/// External payment provider seam. The booking core only ever talks to the
/// provider through this trait: session creation on reserve, and
/// signature-verified event parsing on webhook delivery.
///
/// Verification returns a `Result` rather than panicking or throwing because
/// a bad signature is an expected branch of every webhook endpoint.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, PaymentGatewayError>;

    fn verify_and_parse_event(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<CheckoutEvent, PaymentGatewayError>;
}
