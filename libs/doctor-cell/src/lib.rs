pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

use std::sync::Arc;

use services::directory::DoctorDirectory;

/// Shared state for the doctor routes: just the directory handle.
pub struct DoctorState {
    pub directory: Arc<dyn DoctorDirectory>,
}
