use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;

use crate::models::{
    CheckoutEvent, CheckoutEventType, CheckoutMetadata, CheckoutSession, CreateCheckoutRequest,
    PaymentGatewayError,
};
use crate::services::gateway::PaymentGateway;
use crate::services::signature::{sign_payload, verify_signature};

pub const MOCK_WEBHOOK_SECRET: &str = "whsec_mock_secret";

/// In-process gateway used by tests and local development. Issues
/// deterministic session ids and verifies signatures with the same scheme as
/// the real adapter, so webhook plumbing is exercised end to end.
pub struct MockPaymentGateway {
    fail_session_creation: AtomicBool,
    session_counter: AtomicU64,
    created: Mutex<Vec<CreateCheckoutRequest>>,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self {
            fail_session_creation: AtomicBool::new(false),
            session_counter: AtomicU64::new(0),
            created: Mutex::new(Vec::new()),
        }
    }

    /// Makes subsequent `create_checkout_session` calls fail, to drive the
    /// compensation path.
    pub fn fail_next_sessions(&self, fail: bool) {
        self.fail_session_creation.store(fail, Ordering::SeqCst);
    }

    pub fn created_sessions(&self) -> Vec<CreateCheckoutRequest> {
        self.created
            .lock()
            .map(|sessions| sessions.clone())
            .unwrap_or_default()
    }

    /// Builds a signed `checkout.session.completed` delivery for `session_id`.
    /// Returns the raw payload and its signature header.
    pub fn completed_event(
        session_id: &str,
        payment_intent: &str,
        metadata: Option<&CheckoutMetadata>,
    ) -> (Vec<u8>, String) {
        let metadata_json = metadata
            .map(|m| {
                json!({
                    "appointment_id": m.appointment_id.to_string(),
                    "patient_id": m.patient_id.to_string(),
                    "doctor_id": m.doctor_id.to_string(),
                })
            })
            .unwrap_or_else(|| json!({}));

        let payload = json!({
            "type": "checkout.session.completed",
            "data": {
                "object": {
                    "id": session_id,
                    "payment_intent": payment_intent,
                    "metadata": metadata_json,
                }
            }
        });

        let bytes = payload.to_string().into_bytes();
        let header = sign_payload(MOCK_WEBHOOK_SECRET, &bytes, Utc::now().timestamp());
        (bytes, header)
    }

    /// Signs an arbitrary payload with the mock secret.
    pub fn sign(payload: &[u8]) -> String {
        sign_payload(MOCK_WEBHOOK_SECRET, payload, Utc::now().timestamp())
    }
}

impl Default for MockPaymentGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, PaymentGatewayError> {
        if self.fail_session_creation.load(Ordering::SeqCst) {
            return Err(PaymentGatewayError::SessionCreation(
                "simulated provider outage".to_string(),
            ));
        }

        let n = self.session_counter.fetch_add(1, Ordering::SeqCst) + 1;
        let session_id = format!("cs_test_{}", n);
        let checkout_url = format!("https://checkout.test/pay/{}", session_id);

        if let Ok(mut sessions) = self.created.lock() {
            sessions.push(request);
        }

        Ok(CheckoutSession {
            session_id,
            checkout_url,
        })
    }

    fn verify_and_parse_event(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<CheckoutEvent, PaymentGatewayError> {
        verify_signature(
            MOCK_WEBHOOK_SECRET,
            payload,
            signature_header,
            Utc::now().timestamp(),
        )?;

        let wire: serde_json::Value = serde_json::from_slice(payload)
            .map_err(|e| PaymentGatewayError::MalformedEvent(e.to_string()))?;

        let event_type = wire
            .get("type")
            .and_then(|t| t.as_str())
            .ok_or_else(|| PaymentGatewayError::MalformedEvent("missing type".to_string()))?;
        let object = wire
            .get("data")
            .and_then(|d| d.get("object"))
            .ok_or_else(|| PaymentGatewayError::MalformedEvent("missing data.object".to_string()))?;
        let session_id = object
            .get("id")
            .and_then(|id| id.as_str())
            .ok_or_else(|| PaymentGatewayError::MalformedEvent("missing session id".to_string()))?
            .to_string();

        let payment_intent = object
            .get("payment_intent")
            .and_then(|pi| pi.as_str())
            .map(str::to_string);

        let metadata = object
            .get("metadata")
            .and_then(|m| serde_json::from_value::<CheckoutMetadata>(m.clone()).ok());

        Ok(CheckoutEvent {
            event_type: CheckoutEventType::from_wire(event_type),
            session_id,
            payment_intent,
            metadata,
        })
    }
}
