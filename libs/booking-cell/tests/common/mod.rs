#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use booking_cell::store::memory::MemoryBookingStore;
use booking_cell::BookingState;
use doctor_cell::models::{DayAvailability, DoctorProfile};
use doctor_cell::services::directory::InMemoryDoctorDirectory;
use payment_cell::services::mock::MockPaymentGateway;
use shared_utils::test_utils::TestConfig;

pub struct Harness {
    pub state: Arc<BookingState>,
    pub store: Arc<MemoryBookingStore>,
    pub directory: Arc<InMemoryDoctorDirectory>,
    pub gateway: Arc<MockPaymentGateway>,
}

pub fn harness() -> Harness {
    let config = TestConfig::default().to_arc();
    let store = Arc::new(MemoryBookingStore::new());
    let directory = Arc::new(InMemoryDoctorDirectory::new());
    let gateway = Arc::new(MockPaymentGateway::new());

    let state = Arc::new(BookingState::new(
        config,
        store.clone(),
        directory.clone(),
        gateway.clone(),
    ));

    Harness {
        state,
        store,
        directory,
        gateway,
    }
}

pub fn future_date() -> NaiveDate {
    Utc::now().date_naive() + Duration::days(7)
}

pub fn ten_am() -> NaiveTime {
    NaiveTime::from_hms_opt(10, 0, 0).unwrap()
}

pub fn approved_doctor(fee: i64) -> DoctorProfile {
    DoctorProfile {
        id: Uuid::new_v4(),
        name: "Chen".to_string(),
        specialization: "Dermatology".to_string(),
        fee,
        is_approved: true,
        availability: None,
    }
}

pub fn doctor_with_slots(fee: i64, date: NaiveDate, slots: Vec<NaiveTime>) -> DoctorProfile {
    DoctorProfile {
        availability: Some(vec![DayAvailability { date, slots }]),
        ..approved_doctor(fee)
    }
}
