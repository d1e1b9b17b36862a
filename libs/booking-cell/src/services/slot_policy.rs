use chrono::{NaiveDate, NaiveTime};
use tracing::debug;
use uuid::Uuid;

use doctor_cell::models::DoctorProfile;

use crate::error::BookingError;
use crate::store::BookingStore;

/// Decides whether a slot is bookable before the reservation flow commits
/// anything. The advisory conflict read here gives early feedback; the
/// store's atomic check-and-insert remains the authority under races.
pub struct SlotPolicy;

impl SlotPolicy {
    pub async fn check_bookable(
        store: &dyn BookingStore,
        doctor: &DoctorProfile,
        date: NaiveDate,
        time: NaiveTime,
        today: NaiveDate,
    ) -> Result<(), BookingError> {
        // Same-day bookings are allowed; only dates already behind us fail.
        if date < today {
            return Err(BookingError::DateInPast);
        }

        if !doctor.is_available_at(date, time) {
            debug!(
                "Doctor {} does not offer {} {} as a slot",
                doctor.id, date, time
            );
            return Err(BookingError::SlotUnavailable);
        }

        if Self::slot_taken(store, doctor.id, date, time).await? {
            return Err(BookingError::SlotUnavailable);
        }

        Ok(())
    }

    async fn slot_taken(
        store: &dyn BookingStore,
        doctor_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<bool, BookingError> {
        let existing = store.active_appointment_at(doctor_id, date, time).await?;
        Ok(existing.is_some())
    }
}
