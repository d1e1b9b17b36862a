use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reservation context carried through the provider so the webhook can be
/// tied back to local state even without the session-id index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutMetadata {
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct CreateCheckoutRequest {
    /// Whole currency units; converted to the provider's minor units on the wire.
    pub amount: i64,
    pub currency: String,
    pub product_name: String,
    pub success_url: String,
    pub cancel_url: String,
    pub metadata: CheckoutMetadata,
}

#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub session_id: String,
    pub checkout_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutEventType {
    CheckoutSessionCompleted,
    Other(String),
}

impl CheckoutEventType {
    pub fn from_wire(value: &str) -> Self {
        match value {
            "checkout.session.completed" => Self::CheckoutSessionCompleted,
            other => Self::Other(other.to_string()),
        }
    }
}

/// A verified provider event as consumed by the reconciliation flow.
#[derive(Debug, Clone)]
pub struct CheckoutEvent {
    pub event_type: CheckoutEventType,
    pub session_id: String,
    pub payment_intent: Option<String>,
    pub metadata: Option<CheckoutMetadata>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum PaymentGatewayError {
    #[error("webhook signature verification failed")]
    InvalidSignature,

    #[error("malformed webhook payload: {0}")]
    MalformedEvent(String),

    #[error("payment gateway not configured")]
    NotConfigured,

    #[error("checkout session creation failed: {0}")]
    SessionCreation(String),
}
