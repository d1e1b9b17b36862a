use std::sync::Arc;

use tracing::{info, warn};

use payment_cell::models::{CheckoutEventType, PaymentGatewayError};
use payment_cell::services::gateway::PaymentGateway;

use crate::error::BookingError;
use crate::models::{Actor, AppointmentStatus, PaymentStatus};
use crate::services::lifecycle::AppointmentLifecycle;
use crate::store::{BookingStore, SettlementOutcome, StoreError};

/// How a webhook delivery was absorbed. Every variant is an HTTP 200 at the
/// edge; the provider only retries on errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookAck {
    /// First delivery: payment settled and appointment confirmed.
    Processed,
    /// Redelivery of a settled session; no state changed.
    AlreadyProcessed,
    /// An event type we do not act on, or a session we do not know.
    Ignored,
}

/// Applies provider webhook deliveries to local state. Settlement is
/// idempotent: the store's compare-and-set picks one winner per session and
/// every other delivery is acknowledged without side effects.
pub struct ReconciliationService {
    store: Arc<dyn BookingStore>,
    gateway: Arc<dyn PaymentGateway>,
}

impl ReconciliationService {
    pub fn new(store: Arc<dyn BookingStore>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { store, gateway }
    }

    pub async fn handle_webhook(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<WebhookAck, BookingError> {
        let event = self
            .gateway
            .verify_and_parse_event(payload, signature_header)
            .map_err(|e| match e {
                PaymentGatewayError::InvalidSignature => BookingError::InvalidSignature,
                PaymentGatewayError::MalformedEvent(msg) => BookingError::MalformedWebhook(msg),
                other => BookingError::MalformedWebhook(other.to_string()),
            })?;

        match event.event_type {
            CheckoutEventType::CheckoutSessionCompleted => {}
            CheckoutEventType::Other(kind) => {
                info!("Ignoring webhook event of type {}", kind);
                return Ok(WebhookAck::Ignored);
            }
        }

        let payment_intent = event.payment_intent.as_deref().unwrap_or("");

        match self
            .store
            .settle_payment(&event.session_id, payment_intent)
            .await?
        {
            SettlementOutcome::Settled(payment) => {
                self.confirm_appointment(payment.appointment_id).await?;
                info!("Settled session {}", event.session_id);
                Ok(WebhookAck::Processed)
            }
            SettlementOutcome::AlreadySettled => {
                info!("Session {} already settled, ignoring redelivery", event.session_id);
                Ok(WebhookAck::AlreadyProcessed)
            }
            SettlementOutcome::NotFound => {
                warn!("Webhook for unknown session {}", event.session_id);
                Ok(WebhookAck::Ignored)
            }
        }
    }

    async fn confirm_appointment(&self, appointment_id: uuid::Uuid) -> Result<(), BookingError> {
        // One retry: a lost race against a manual transition is resolved by
        // re-reading and reconciling against the fresh state.
        for _ in 0..2 {
            let appointment = self.store.get_appointment(appointment_id).await?;

            let update = match appointment.status {
                AppointmentStatus::Pending => AppointmentLifecycle::plan_transition(
                    &appointment,
                    AppointmentStatus::Confirmed,
                    Actor::System,
                )?,
                // Confirmed by hand before the settlement arrived; only the
                // payment status still needs to catch up.
                AppointmentStatus::Confirmed
                    if appointment.payment_status != PaymentStatus::Completed =>
                {
                    AppointmentLifecycle::plan_payment_settled(&appointment)
                }
                AppointmentStatus::Confirmed => return Ok(()),
                // The appointment reached a terminal state before the
                // settlement arrived. The payment stays settled; refunds are
                // a manual step.
                status => {
                    warn!(
                        "Payment settled for appointment {} already {}",
                        appointment.id, status
                    );
                    return Ok(());
                }
            };

            match self.store.apply_transition(appointment.id, &update).await {
                Ok(_) => return Ok(()),
                Err(StoreError::StaleTransition) => continue,
                Err(e) => return Err(e.into()),
            }
        }

        warn!(
            "Appointment {} kept changing while its settlement was applied",
            appointment_id
        );
        Ok(())
    }
}
