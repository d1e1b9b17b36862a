use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One calendar day of a doctor's declared availability: the discrete
/// time-of-day slots patients may book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub slots: Vec<NaiveTime>,
}

/// Directory view of a doctor as consumed by the booking core.
/// Profile editing and approval workflows live outside this service;
/// the core only reads this snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorProfile {
    pub id: Uuid,
    pub name: String,
    pub specialization: String,
    pub fee: i64,
    pub is_approved: bool,
    /// None means the doctor publishes no slot schedule; conflict checking
    /// alone then decides bookability.
    pub availability: Option<Vec<DayAvailability>>,
}

impl DoctorProfile {
    pub fn is_available_at(&self, date: NaiveDate, time: NaiveTime) -> bool {
        match &self.availability {
            None => true,
            Some(days) => days
                .iter()
                .find(|day| day.date == date)
                .map(|day| day.slots.contains(&time))
                .unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("Directory error: {0}")]
    Directory(String),
}
