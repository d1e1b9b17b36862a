pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod store;

use std::sync::Arc;

use doctor_cell::services::directory::DoctorDirectory;
use payment_cell::services::gateway::PaymentGateway;
use shared_config::AppConfig;

use services::actions::AppointmentActionService;
use services::reconciliation::ReconciliationService;
use services::reservation::ReservationService;
use store::BookingStore;

/// Shared state for the booking routes: the store plus the three services
/// built over it.
pub struct BookingState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn BookingStore>,
    pub reservations: ReservationService,
    pub reconciliation: ReconciliationService,
    pub actions: AppointmentActionService,
}

impl BookingState {
    pub fn new(
        config: Arc<AppConfig>,
        store: Arc<dyn BookingStore>,
        directory: Arc<dyn DoctorDirectory>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            reservations: ReservationService::new(
                config.clone(),
                store.clone(),
                directory,
                gateway.clone(),
            ),
            reconciliation: ReconciliationService::new(store.clone(), gateway),
            actions: AppointmentActionService::new(store.clone()),
            config,
            store,
        }
    }
}
