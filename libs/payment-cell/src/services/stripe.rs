use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use tracing::{error, info};
use uuid::Uuid;

use async_trait::async_trait;
use shared_config::AppConfig;

use crate::models::{
    CheckoutEvent, CheckoutEventType, CheckoutMetadata, CheckoutSession, CreateCheckoutRequest,
    PaymentGatewayError,
};
use crate::services::gateway::PaymentGateway;
use crate::services::signature::verify_signature;

/// Stripe Checkout adapter. Sessions are created through the form-encoded
/// REST API and webhook payloads are authenticated with the signing secret
/// before any field is trusted.
pub struct StripeCheckoutGateway {
    client: Client,
    api_base: String,
    secret_key: String,
    webhook_secret: String,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    id: String,
    url: String,
}

#[derive(Debug, Deserialize)]
struct WireEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: WireEventData,
}

#[derive(Debug, Deserialize)]
struct WireEventData {
    object: WireSession,
}

#[derive(Debug, Deserialize)]
struct WireSession {
    id: String,
    #[serde(default)]
    payment_intent: Option<String>,
    #[serde(default)]
    metadata: Option<WireMetadata>,
}

#[derive(Debug, Deserialize)]
struct WireMetadata {
    #[serde(default)]
    appointment_id: Option<String>,
    #[serde(default)]
    patient_id: Option<String>,
    #[serde(default)]
    doctor_id: Option<String>,
}

impl StripeCheckoutGateway {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            api_base: config.stripe_api_base.clone(),
            secret_key: config.stripe_secret_key.clone(),
            webhook_secret: config.stripe_webhook_secret.clone(),
        }
    }

    fn parse_event(payload: &[u8]) -> Result<CheckoutEvent, PaymentGatewayError> {
        let wire: WireEvent = serde_json::from_slice(payload)
            .map_err(|e| PaymentGatewayError::MalformedEvent(e.to_string()))?;

        let metadata = wire.data.object.metadata.and_then(|m| {
            let appointment_id = Uuid::parse_str(m.appointment_id.as_deref()?).ok()?;
            let patient_id = Uuid::parse_str(m.patient_id.as_deref()?).ok()?;
            let doctor_id = Uuid::parse_str(m.doctor_id.as_deref()?).ok()?;
            Some(CheckoutMetadata {
                appointment_id,
                patient_id,
                doctor_id,
            })
        });

        Ok(CheckoutEvent {
            event_type: CheckoutEventType::from_wire(&wire.event_type),
            session_id: wire.data.object.id,
            payment_intent: wire.data.object.payment_intent,
            metadata,
        })
    }
}

#[async_trait]
impl PaymentGateway for StripeCheckoutGateway {
    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, PaymentGatewayError> {
        if self.secret_key.is_empty() {
            return Err(PaymentGatewayError::NotConfigured);
        }

        // Stripe wants minor units, our amounts are whole currency units.
        let unit_amount = request.amount * 100;

        let form: Vec<(&str, String)> = vec![
            ("mode", "payment".to_string()),
            (
                "line_items[0][price_data][currency]",
                request.currency.clone(),
            ),
            (
                "line_items[0][price_data][product_data][name]",
                request.product_name.clone(),
            ),
            (
                "line_items[0][price_data][unit_amount]",
                unit_amount.to_string(),
            ),
            ("line_items[0][quantity]", "1".to_string()),
            ("success_url", request.success_url.clone()),
            ("cancel_url", request.cancel_url.clone()),
            (
                "metadata[appointment_id]",
                request.metadata.appointment_id.to_string(),
            ),
            (
                "metadata[patient_id]",
                request.metadata.patient_id.to_string(),
            ),
            (
                "metadata[doctor_id]",
                request.metadata.doctor_id.to_string(),
            ),
        ];

        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| PaymentGatewayError::SessionCreation(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Checkout session creation failed with {}: {}", status, body);
            return Err(PaymentGatewayError::SessionCreation(format!(
                "provider returned {}",
                status
            )));
        }

        let session: SessionResponse = response
            .json()
            .await
            .map_err(|e| PaymentGatewayError::SessionCreation(e.to_string()))?;

        info!("Created checkout session {}", session.id);

        Ok(CheckoutSession {
            session_id: session.id,
            checkout_url: session.url,
        })
    }

    fn verify_and_parse_event(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<CheckoutEvent, PaymentGatewayError> {
        if self.webhook_secret.is_empty() {
            return Err(PaymentGatewayError::NotConfigured);
        }

        verify_signature(
            &self.webhook_secret,
            payload,
            signature_header,
            Utc::now().timestamp(),
        )?;

        Self::parse_event(payload)
    }
}
