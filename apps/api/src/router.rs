use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use booking_cell::router::{appointment_routes, webhook_routes};
use booking_cell::store::supabase::SupabaseBookingStore;
use booking_cell::BookingState;
use doctor_cell::router::doctor_routes;
use doctor_cell::services::directory::SupabaseDoctorDirectory;
use doctor_cell::DoctorState;
use payment_cell::services::stripe::StripeCheckoutGateway;
use shared_config::AppConfig;
use shared_database::SupabaseClient;

pub fn create_router(config: Arc<AppConfig>) -> Router {
    let supabase = Arc::new(SupabaseClient::new(&config));

    let directory = Arc::new(SupabaseDoctorDirectory::new(supabase.clone()));
    let store = Arc::new(SupabaseBookingStore::new(supabase));
    let gateway = Arc::new(StripeCheckoutGateway::new(&config));

    let doctor_state = Arc::new(DoctorState {
        directory: directory.clone(),
    });
    let booking_state = Arc::new(BookingState::new(config, store, directory, gateway));

    Router::new()
        .route("/", get(|| async { "Clinic booking API is running!" }))
        .nest("/doctors", doctor_routes(doctor_state))
        .nest("/appointments", appointment_routes(booking_state.clone()))
        .nest("/appointments/payments", webhook_routes(booking_state))
}
