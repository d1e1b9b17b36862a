use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::DoctorError;
use crate::DoctorState;

#[axum::debug_handler]
pub async fn list_doctors(State(state): State<Arc<DoctorState>>) -> Result<Json<Value>, AppError> {
    let doctors = state
        .directory
        .list_approved()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!(doctors)))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(state): State<Arc<DoctorState>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let doctor = state
        .directory
        .get_doctor(doctor_id)
        .await
        .map_err(|e| match e {
            DoctorError::NotFound => AppError::NotFound("Doctor not found".to_string()),
            other => AppError::Internal(other.to_string()),
        })?;

    Ok(Json(json!(doctor)))
}
