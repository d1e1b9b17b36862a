use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::BookingState;

/// Authenticated appointment routes. Role checks happen per handler; this
/// layer only establishes who the caller is.
pub fn appointment_routes(state: Arc<BookingState>) -> Router {
    Router::new()
        .route(
            "/",
            post(handlers::reserve_appointment).get(handlers::list_appointments),
        )
        .route("/mine", get(handlers::my_appointments))
        .route("/doctor", get(handlers::doctor_appointments))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route(
            "/{appointment_id}/transition",
            patch(handlers::transition_appointment),
        )
        .route(
            "/{appointment_id}/cancel",
            post(handlers::cancel_appointment),
        )
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ))
        .with_state(state)
}

/// Unauthenticated webhook route; deliveries carry their own signature.
pub fn webhook_routes(state: Arc<BookingState>) -> Router {
    Router::new()
        .route("/webhook", post(handlers::payment_webhook))
        .with_state(state)
}
