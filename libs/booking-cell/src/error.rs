use thiserror::Error;

use shared_models::error::AppError;

use crate::models::AppointmentStatus;
use crate::store::StoreError;

#[derive(Debug, Clone, Error)]
pub enum BookingError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("The selected slot is no longer available")]
    SlotUnavailable,

    #[error("Appointment date must be in the future")]
    DateInPast,

    #[error("Cannot move appointment from {from} to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Appointment is already {0}")]
    AlreadyInState(AppointmentStatus),

    #[error("Appointment was updated concurrently, try again")]
    TransitionConflict,

    #[error("Webhook signature verification failed")]
    InvalidSignature,

    #[error("Malformed webhook payload: {0}")]
    MalformedWebhook(String),

    #[error("Could not start payment session: {0}")]
    PaymentSessionFailed(String),

    #[error("Not allowed")]
    Unauthorized,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<BookingError> for AppError {
    fn from(e: BookingError) -> Self {
        let message = e.to_string();
        match e {
            BookingError::NotFound | BookingError::DoctorNotFound => AppError::NotFound(message),
            BookingError::SlotUnavailable
            | BookingError::AlreadyInState(_)
            | BookingError::TransitionConflict => AppError::Conflict(message),
            BookingError::DateInPast
            | BookingError::InvalidTransition { .. }
            | BookingError::InvalidSignature
            | BookingError::MalformedWebhook(_) => AppError::BadRequest(message),
            BookingError::PaymentSessionFailed(_) => AppError::ExternalService(message),
            BookingError::Unauthorized => AppError::Auth(message),
            BookingError::DatabaseError(_) => AppError::Database(message),
        }
    }
}

impl From<StoreError> for BookingError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::SlotTaken => BookingError::SlotUnavailable,
            StoreError::DuplicateSession => BookingError::SlotUnavailable,
            StoreError::NotFound => BookingError::NotFound,
            StoreError::StaleTransition => BookingError::TransitionConflict,
            StoreError::Unavailable(msg) => BookingError::DatabaseError(msg),
        }
    }
}
