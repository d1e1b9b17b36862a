use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use crate::models::{Appointment, AppointmentStatus, PaymentRecord, PaymentRecordStatus};
use crate::store::{BookingStore, SettlementOutcome, StoreError, TransitionUpdate};

/// In-memory store for tests and local development. A single mutex over all
/// tables makes the check-and-insert and settlement CAS trivially atomic,
/// mirroring what the unique indexes give the SQL-backed store.
#[derive(Default)]
pub struct MemoryBookingStore {
    inner: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    appointments: HashMap<Uuid, Appointment>,
    payments: HashMap<String, PaymentRecord>,
    visits: HashMap<Uuid, u64>,
}

impl MemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Tables>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))
    }
}

#[async_trait]
impl BookingStore for MemoryBookingStore {
    async fn insert_appointment(&self, appointment: &Appointment) -> Result<(), StoreError> {
        let mut tables = self.lock()?;

        let taken = tables.appointments.values().any(|a| {
            a.doctor_id == appointment.doctor_id
                && a.appointment_date == appointment.appointment_date
                && a.appointment_time == appointment.appointment_time
                && a.status != AppointmentStatus::Cancelled
        });
        if taken {
            return Err(StoreError::SlotTaken);
        }

        tables
            .appointments
            .insert(appointment.id, appointment.clone());
        Ok(())
    }

    async fn delete_appointment(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        tables.appointments.remove(&id).ok_or(StoreError::NotFound)?;
        Ok(())
    }

    async fn get_appointment(&self, id: Uuid) -> Result<Appointment, StoreError> {
        let tables = self.lock()?;
        tables
            .appointments
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn active_appointment_at(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<Option<Appointment>, StoreError> {
        let tables = self.lock()?;
        Ok(tables
            .appointments
            .values()
            .find(|a| {
                a.doctor_id == doctor_id
                    && a.appointment_date == date
                    && a.appointment_time == time
                    && a.status != AppointmentStatus::Cancelled
            })
            .cloned())
    }

    async fn appointments_for_patient(
        &self,
        patient_id: Uuid,
    ) -> Result<Vec<Appointment>, StoreError> {
        let tables = self.lock()?;
        let mut result: Vec<Appointment> = tables
            .appointments
            .values()
            .filter(|a| a.patient_id == patient_id)
            .cloned()
            .collect();
        result.sort_by_key(|a| (a.appointment_date, a.appointment_time));
        Ok(result)
    }

    async fn appointments_for_doctor(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<Appointment>, StoreError> {
        let tables = self.lock()?;
        let mut result: Vec<Appointment> = tables
            .appointments
            .values()
            .filter(|a| a.doctor_id == doctor_id)
            .cloned()
            .collect();
        result.sort_by_key(|a| (a.appointment_date, a.appointment_time));
        Ok(result)
    }

    async fn all_appointments(&self) -> Result<Vec<Appointment>, StoreError> {
        let tables = self.lock()?;
        let mut result: Vec<Appointment> = tables.appointments.values().cloned().collect();
        result.sort_by_key(|a| a.created_at);
        Ok(result)
    }

    async fn apply_transition(
        &self,
        id: Uuid,
        update: &TransitionUpdate,
    ) -> Result<Appointment, StoreError> {
        let mut tables = self.lock()?;

        let appointment = tables.appointments.get_mut(&id).ok_or(StoreError::NotFound)?;
        if appointment.status != update.from {
            return Err(StoreError::StaleTransition);
        }
        appointment.status = update.status;
        if let Some(payment_status) = update.payment_status {
            appointment.payment_status = payment_status;
        }
        let updated = appointment.clone();

        if update.increment_patient_visits {
            *tables.visits.entry(updated.patient_id).or_insert(0) += 1;
        }

        if update.cancel_payment_record {
            if let Some(payment) = tables
                .payments
                .values_mut()
                .find(|p| p.appointment_id == id)
            {
                payment.status = PaymentRecordStatus::Cancelled;
            }
        }

        Ok(updated)
    }

    async fn insert_payment(&self, payment: &PaymentRecord) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        if tables.payments.contains_key(&payment.checkout_session_id) {
            return Err(StoreError::DuplicateSession);
        }
        tables
            .payments
            .insert(payment.checkout_session_id.clone(), payment.clone());
        Ok(())
    }

    async fn payment_for_appointment(
        &self,
        appointment_id: Uuid,
    ) -> Result<Option<PaymentRecord>, StoreError> {
        let tables = self.lock()?;
        Ok(tables
            .payments
            .values()
            .find(|p| p.appointment_id == appointment_id)
            .cloned())
    }

    async fn settle_payment(
        &self,
        session_id: &str,
        payment_intent: &str,
    ) -> Result<SettlementOutcome, StoreError> {
        let mut tables = self.lock()?;

        match tables.payments.get_mut(session_id) {
            None => Ok(SettlementOutcome::NotFound),
            Some(payment) if payment.status != PaymentRecordStatus::Pending => {
                Ok(SettlementOutcome::AlreadySettled)
            }
            Some(payment) => {
                payment.status = PaymentRecordStatus::Paid;
                payment.payment_intent_id = Some(payment_intent.to_string());
                Ok(SettlementOutcome::Settled(payment.clone()))
            }
        }
    }

    async fn completed_visits(&self, patient_id: Uuid) -> Result<u64, StoreError> {
        let tables = self.lock()?;
        Ok(tables.visits.get(&patient_id).copied().unwrap_or(0))
    }
}
