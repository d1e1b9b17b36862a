use std::sync::Arc;

use axum::{routing::get, Router};

use crate::handlers;
use crate::DoctorState;

/// Public doctor listing routes; the marketplace exposes approved doctors
/// without authentication.
pub fn doctor_routes(state: Arc<DoctorState>) -> Router {
    Router::new()
        .route("/", get(handlers::list_doctors))
        .route("/{doctor_id}", get(handlers::get_doctor))
        .with_state(state)
}
