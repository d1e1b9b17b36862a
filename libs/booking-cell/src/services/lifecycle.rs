use tracing::info;

use crate::error::BookingError;
use crate::models::{Actor, Appointment, AppointmentStatus, PaymentStatus};
use crate::store::TransitionUpdate;

/// The appointment state machine. Legality depends only on the current and
/// target status; side effects additionally depend on who is driving.
pub struct AppointmentLifecycle;

impl AppointmentLifecycle {
    /// Statuses reachable in one step from `from`. Completed and cancelled
    /// are terminal.
    pub fn valid_transitions(from: AppointmentStatus) -> &'static [AppointmentStatus] {
        match from {
            AppointmentStatus::Pending => {
                &[AppointmentStatus::Confirmed, AppointmentStatus::Cancelled]
            }
            AppointmentStatus::Confirmed => {
                &[AppointmentStatus::Completed, AppointmentStatus::Cancelled]
            }
            AppointmentStatus::Completed | AppointmentStatus::Cancelled => &[],
        }
    }

    pub fn validate_transition(
        from: AppointmentStatus,
        to: AppointmentStatus,
    ) -> Result<(), BookingError> {
        if from == to {
            return Err(BookingError::AlreadyInState(from));
        }
        if !Self::valid_transitions(from).contains(&to) {
            return Err(BookingError::InvalidTransition { from, to });
        }
        Ok(())
    }

    /// Validates the move and computes what the store must change alongside
    /// the status:
    /// - settlement-driven confirmation marks the payment completed;
    /// - completion marks the payment completed and bumps the patient's
    ///   visit counter;
    /// - an admin cancellation voids both the payment status and the
    ///   ledger row.
    pub fn plan_transition(
        appointment: &Appointment,
        to: AppointmentStatus,
        actor: Actor,
    ) -> Result<TransitionUpdate, BookingError> {
        Self::validate_transition(appointment.status, to)?;

        let mut update = TransitionUpdate {
            from: appointment.status,
            status: to,
            payment_status: None,
            increment_patient_visits: false,
            cancel_payment_record: false,
        };

        match (to, actor) {
            (AppointmentStatus::Confirmed, Actor::System) => {
                update.payment_status = Some(PaymentStatus::Completed);
            }
            (AppointmentStatus::Completed, _) => {
                update.payment_status = Some(PaymentStatus::Completed);
                update.increment_patient_visits = true;
            }
            (AppointmentStatus::Cancelled, Actor::Admin) => {
                update.payment_status = Some(PaymentStatus::Cancelled);
                update.cancel_payment_record = true;
            }
            _ => {}
        }

        info!(
            "Appointment {} moving {} -> {} ({})",
            appointment.id, appointment.status, to, actor
        );

        Ok(update)
    }

    /// Payment-status-only sync for an appointment that was confirmed by
    /// hand before its settlement arrived. The status itself stays put.
    pub fn plan_payment_settled(appointment: &Appointment) -> TransitionUpdate {
        TransitionUpdate {
            from: appointment.status,
            status: appointment.status,
            payment_status: Some(PaymentStatus::Completed),
            increment_patient_visits: false,
            cancel_payment_record: false,
        }
    }
}
