use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;
use uuid::Uuid;

use crate::error::BookingError;
use crate::models::{Actor, Appointment, TransitionAction};
use crate::services::lifecycle::AppointmentLifecycle;
use crate::store::BookingStore;

/// Role-gated lifecycle operations. Ownership failures are reported as
/// `NotFound` so callers cannot probe for other people's appointments.
pub struct AppointmentActionService {
    store: Arc<dyn BookingStore>,
}

impl AppointmentActionService {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    /// A patient may cancel their own appointment while its date is still in
    /// the future. Past or same-day appointments are not cancellable and are
    /// indistinguishable from missing ones.
    pub async fn patient_cancel(
        &self,
        patient_id: Uuid,
        appointment_id: Uuid,
        today: NaiveDate,
    ) -> Result<Appointment, BookingError> {
        let appointment = self.store.get_appointment(appointment_id).await?;

        if appointment.patient_id != patient_id {
            debug!(
                "Patient {} attempted to cancel appointment {} they do not own",
                patient_id, appointment_id
            );
            return Err(BookingError::NotFound);
        }

        if appointment.appointment_date <= today {
            return Err(BookingError::NotFound);
        }

        let update = AppointmentLifecycle::plan_transition(
            &appointment,
            crate::models::AppointmentStatus::Cancelled,
            Actor::Patient,
        )?;

        Ok(self.store.apply_transition(appointment.id, &update).await?)
    }

    /// A doctor may confirm, complete, or cancel appointments on their own
    /// schedule.
    pub async fn doctor_transition(
        &self,
        doctor_id: Uuid,
        appointment_id: Uuid,
        action: TransitionAction,
    ) -> Result<Appointment, BookingError> {
        let appointment = self.store.get_appointment(appointment_id).await?;

        if appointment.doctor_id != doctor_id {
            debug!(
                "Doctor {} attempted transition on appointment {} they do not own",
                doctor_id, appointment_id
            );
            return Err(BookingError::NotFound);
        }

        let update = AppointmentLifecycle::plan_transition(
            &appointment,
            action.target_status(),
            Actor::Doctor,
        )?;

        Ok(self.store.apply_transition(appointment.id, &update).await?)
    }

    /// Admins may drive any appointment. An admin cancellation additionally
    /// voids the payment.
    pub async fn admin_transition(
        &self,
        appointment_id: Uuid,
        action: TransitionAction,
    ) -> Result<Appointment, BookingError> {
        let appointment = self.store.get_appointment(appointment_id).await?;

        let update = AppointmentLifecycle::plan_transition(
            &appointment,
            action.target_status(),
            Actor::Admin,
        )?;

        Ok(self.store.apply_transition(appointment.id, &update).await?)
    }
}
