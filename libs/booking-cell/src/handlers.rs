use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    Extension, Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{ReserveAppointmentRequest, TransitionRequest};
use crate::BookingState;

fn user_uuid(user: &User) -> Result<Uuid, AppError> {
    Uuid::parse_str(&user.id)
        .map_err(|_| AppError::Auth("Invalid user id in token".to_string()))
}

#[axum::debug_handler]
pub async fn reserve_appointment(
    State(state): State<Arc<BookingState>>,
    Extension(user): Extension<User>,
    Json(request): Json<ReserveAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    if !user.has_role("patient") {
        return Err(AppError::Auth("Patient role required".to_string()));
    }

    let patient_id = user_uuid(&user)?;
    let response = state.reservations.reserve(patient_id, request).await?;
    Ok(Json(json!(response)))
}

#[axum::debug_handler]
pub async fn my_appointments(
    State(state): State<Arc<BookingState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let patient_id = user_uuid(&user)?;
    let appointments = state
        .store
        .appointments_for_patient(patient_id)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    Ok(Json(json!(appointments)))
}

#[axum::debug_handler]
pub async fn doctor_appointments(
    State(state): State<Arc<BookingState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    if !user.has_role("doctor") {
        return Err(AppError::Auth("Doctor role required".to_string()));
    }

    let doctor_id = user_uuid(&user)?;
    let appointments = state
        .store
        .appointments_for_doctor(doctor_id)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    Ok(Json(json!(appointments)))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<Arc<BookingState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    if !user.has_role("admin") {
        return Err(AppError::Auth("Admin role required".to_string()));
    }

    let appointments = state
        .store
        .all_appointments()
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    Ok(Json(json!(appointments)))
}

/// Admins see any appointment; everyone else only their own side of it.
#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<BookingState>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .store
        .get_appointment(appointment_id)
        .await
        .map_err(|_| AppError::NotFound("Appointment not found".to_string()))?;

    if !user.has_role("admin") {
        let caller = user_uuid(&user)?;
        if appointment.patient_id != caller && appointment.doctor_id != caller {
            return Err(AppError::NotFound("Appointment not found".to_string()));
        }
    }

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn transition_appointment(
    State(state): State<Arc<BookingState>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<TransitionRequest>,
) -> Result<Json<Value>, AppError> {
    let updated = if user.has_role("admin") {
        state
            .actions
            .admin_transition(appointment_id, request.action)
            .await?
    } else if user.has_role("doctor") {
        let doctor_id = user_uuid(&user)?;
        state
            .actions
            .doctor_transition(doctor_id, appointment_id, request.action)
            .await?
    } else {
        return Err(AppError::Auth("Doctor or admin role required".to_string()));
    };

    Ok(Json(json!(updated)))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<BookingState>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let patient_id = user_uuid(&user)?;
    let today = Utc::now().date_naive();

    let cancelled = state
        .actions
        .patient_cancel(patient_id, appointment_id, today)
        .await?;

    Ok(Json(json!(cancelled)))
}

/// Provider webhook endpoint. Unauthenticated; the signature header is the
/// only credential.
#[axum::debug_handler]
pub async fn payment_webhook(
    State(state): State<Arc<BookingState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("Missing signature header".to_string()))?;

    state.reconciliation.handle_webhook(&body, signature).await?;

    Ok(Json(json!({ "received": true })))
}
