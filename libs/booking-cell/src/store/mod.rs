pub mod memory;
pub mod supabase;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use crate::models::{Appointment, AppointmentStatus, PaymentRecord, PaymentStatus};

#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// An active appointment already holds this doctor/date/time slot.
    #[error("slot already taken")]
    SlotTaken,

    /// A payment row for this checkout session already exists.
    #[error("duplicate checkout session")]
    DuplicateSession,

    #[error("record not found")]
    NotFound,

    /// The row's status no longer matches the state the transition was
    /// planned against.
    #[error("transition planned against stale state")]
    StaleTransition,

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Outcome of attempting to settle a payment row by session id.
/// `AlreadySettled` is the idempotent branch: the row exists but is no
/// longer pending, so the caller must not re-apply side effects.
#[derive(Debug, Clone)]
pub enum SettlementOutcome {
    Settled(PaymentRecord),
    AlreadySettled,
    NotFound,
}

/// Everything a transition applies atomically alongside the appointment
/// status change. `from` is the status the plan was validated against; the
/// store only applies the update while the row still holds it.
#[derive(Debug, Clone)]
pub struct TransitionUpdate {
    pub from: AppointmentStatus,
    pub status: AppointmentStatus,
    pub payment_status: Option<PaymentStatus>,
    pub increment_patient_visits: bool,
    pub cancel_payment_record: bool,
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Persists a new appointment, failing with `SlotTaken` when an active
    /// (non-cancelled) appointment already occupies the slot. The check and
    /// insert are a single atomic step.
    async fn insert_appointment(&self, appointment: &Appointment) -> Result<(), StoreError>;

    /// Removes a half-created appointment after a downstream failure.
    async fn delete_appointment(&self, id: Uuid) -> Result<(), StoreError>;

    async fn get_appointment(&self, id: Uuid) -> Result<Appointment, StoreError>;

    /// The active appointment holding a slot, if any. Cancelled appointments
    /// never hold a slot.
    async fn active_appointment_at(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<Option<Appointment>, StoreError>;

    async fn appointments_for_patient(
        &self,
        patient_id: Uuid,
    ) -> Result<Vec<Appointment>, StoreError>;

    async fn appointments_for_doctor(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<Appointment>, StoreError>;

    async fn all_appointments(&self) -> Result<Vec<Appointment>, StoreError>;

    /// Applies a validated transition and its side effects. Compare-and-set
    /// on `update.from`: a concurrent writer that moved the row first makes
    /// this fail with `StaleTransition` instead of overwriting.
    async fn apply_transition(
        &self,
        id: Uuid,
        update: &TransitionUpdate,
    ) -> Result<Appointment, StoreError>;

    /// Persists the payment ledger row for a freshly created checkout
    /// session. `DuplicateSession` guards the unique session-id index.
    async fn insert_payment(&self, payment: &PaymentRecord) -> Result<(), StoreError>;

    async fn payment_for_appointment(
        &self,
        appointment_id: Uuid,
    ) -> Result<Option<PaymentRecord>, StoreError>;

    /// Compare-and-set settlement: flips the row for `session_id` from
    /// pending to paid and stores the payment intent. Exactly one concurrent
    /// caller observes `Settled`.
    async fn settle_payment(
        &self,
        session_id: &str,
        payment_intent: &str,
    ) -> Result<SettlementOutcome, StoreError>;

    /// Completed-visit counter per patient, bumped when an appointment
    /// reaches completed.
    async fn completed_visits(&self, patient_id: Uuid) -> Result<u64, StoreError>;
}
