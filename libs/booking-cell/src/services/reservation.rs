use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info};
use uuid::Uuid;

use doctor_cell::services::directory::DoctorDirectory;
use payment_cell::models::{CheckoutMetadata, CreateCheckoutRequest};
use payment_cell::services::gateway::PaymentGateway;
use shared_config::AppConfig;

use crate::error::BookingError;
use crate::models::{
    Appointment, AppointmentStatus, PaymentRecord, PaymentRecordStatus, PaymentStatus,
    ReserveAppointmentRequest, ReserveAppointmentResponse, BOOKING_FEE_SURCHARGE,
};
use crate::services::slot_policy::SlotPolicy;
use crate::store::{BookingStore, StoreError};

/// Books a slot and opens a checkout session for it. The appointment row is
/// written first to hold the slot; if the payment side then fails, the held
/// slot is released again so no unpayable appointment survives.
pub struct ReservationService {
    config: Arc<AppConfig>,
    store: Arc<dyn BookingStore>,
    directory: Arc<dyn DoctorDirectory>,
    gateway: Arc<dyn PaymentGateway>,
}

impl ReservationService {
    pub fn new(
        config: Arc<AppConfig>,
        store: Arc<dyn BookingStore>,
        directory: Arc<dyn DoctorDirectory>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            config,
            store,
            directory,
            gateway,
        }
    }

    pub async fn reserve(
        &self,
        patient_id: Uuid,
        request: ReserveAppointmentRequest,
    ) -> Result<ReserveAppointmentResponse, BookingError> {
        let doctor = self
            .directory
            .get_doctor(request.doctor_id)
            .await
            .map_err(|_| BookingError::DoctorNotFound)?;

        let today = Utc::now().date_naive();
        SlotPolicy::check_bookable(
            self.store.as_ref(),
            &doctor,
            request.appointment_date,
            request.appointment_time,
            today,
        )
        .await?;

        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id,
            doctor_id: doctor.id,
            appointment_date: request.appointment_date,
            appointment_time: request.appointment_time,
            status: AppointmentStatus::Pending,
            payment_status: PaymentStatus::Pending,
            created_at: Utc::now(),
        };

        match self.store.insert_appointment(&appointment).await {
            Ok(()) => {}
            Err(StoreError::SlotTaken) => return Err(BookingError::SlotUnavailable),
            Err(e) => return Err(e.into()),
        }

        let amount = doctor.fee + BOOKING_FEE_SURCHARGE;

        let checkout_request = CreateCheckoutRequest {
            amount,
            currency: "usd".to_string(),
            product_name: format!("Consultation with Dr. {}", doctor.name),
            success_url: format!(
                "{}/appointments/booking-success?appointment_id={}",
                self.config.app_domain, appointment.id
            ),
            cancel_url: format!("{}/payment-cancel", self.config.app_domain),
            metadata: CheckoutMetadata {
                appointment_id: appointment.id,
                patient_id,
                doctor_id: doctor.id,
            },
        };

        let session = match self.gateway.create_checkout_session(checkout_request).await {
            Ok(session) => session,
            Err(e) => {
                error!(
                    "Checkout session failed for appointment {}: {}",
                    appointment.id, e
                );
                self.rollback_appointment(appointment.id).await;
                return Err(BookingError::PaymentSessionFailed(e.to_string()));
            }
        };

        let payment = PaymentRecord {
            id: Uuid::new_v4(),
            appointment_id: appointment.id,
            amount,
            checkout_session_id: session.session_id.clone(),
            payment_intent_id: None,
            status: PaymentRecordStatus::Pending,
            created_at: Utc::now(),
        };

        if let Err(e) = self.store.insert_payment(&payment).await {
            error!(
                "Failed to record payment for appointment {}: {}",
                appointment.id, e
            );
            self.rollback_appointment(appointment.id).await;
            return Err(e.into());
        }

        info!(
            "Reserved appointment {} with session {}",
            appointment.id, session.session_id
        );

        Ok(ReserveAppointmentResponse {
            appointment,
            amount,
            checkout_url: session.checkout_url,
            checkout_session_id: session.session_id,
        })
    }

    /// Releases a half-created reservation. Failure here only leaks a slot
    /// until the row is cleaned up, so it is logged rather than surfaced.
    async fn rollback_appointment(&self, id: Uuid) {
        if let Err(e) = self.store.delete_appointment(id).await {
            error!("Failed to roll back appointment {}: {}", id, e);
        }
    }
}
