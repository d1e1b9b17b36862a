use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_database::{DbError, SupabaseClient};

use crate::models::{DoctorError, DoctorProfile};

/// Read-only doctor lookup consumed by the booking core. Only approved
/// doctors are visible through this interface.
#[async_trait]
pub trait DoctorDirectory: Send + Sync {
    async fn get_doctor(&self, id: Uuid) -> Result<DoctorProfile, DoctorError>;

    async fn list_approved(&self) -> Result<Vec<DoctorProfile>, DoctorError>;
}

pub struct SupabaseDoctorDirectory {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseDoctorDirectory {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    fn parse_profile(row: Value) -> Result<DoctorProfile, DoctorError> {
        serde_json::from_value(row)
            .map_err(|e| DoctorError::Directory(format!("failed to parse doctor row: {}", e)))
    }
}

#[async_trait]
impl DoctorDirectory for SupabaseDoctorDirectory {
    async fn get_doctor(&self, id: Uuid) -> Result<DoctorProfile, DoctorError> {
        debug!("Fetching doctor: {}", id);

        let path = format!("/rest/v1/doctors?id=eq.{}&is_approved=eq.true", id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| match e {
                DbError::NotFound(_) => DoctorError::NotFound,
                other => DoctorError::Directory(other.to_string()),
            })?;

        let row = result.into_iter().next().ok_or(DoctorError::NotFound)?;
        Self::parse_profile(row)
    }

    async fn list_approved(&self) -> Result<Vec<DoctorProfile>, DoctorError> {
        let path = "/rest/v1/doctors?is_approved=eq.true&order=name.asc";
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, path, None)
            .await
            .map_err(|e| DoctorError::Directory(e.to_string()))?;

        result.into_iter().map(Self::parse_profile).collect()
    }
}

/// In-memory directory used by tests and local runs.
#[derive(Default)]
pub struct InMemoryDoctorDirectory {
    doctors: RwLock<HashMap<Uuid, DoctorProfile>>,
}

impl InMemoryDoctorDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, profile: DoctorProfile) {
        self.doctors
            .write()
            .expect("doctor directory lock poisoned")
            .insert(profile.id, profile);
    }
}

#[async_trait]
impl DoctorDirectory for InMemoryDoctorDirectory {
    async fn get_doctor(&self, id: Uuid) -> Result<DoctorProfile, DoctorError> {
        let doctors = self.doctors.read().expect("doctor directory lock poisoned");
        doctors
            .get(&id)
            .filter(|profile| profile.is_approved)
            .cloned()
            .ok_or(DoctorError::NotFound)
    }

    async fn list_approved(&self) -> Result<Vec<DoctorProfile>, DoctorError> {
        let doctors = self.doctors.read().expect("doctor directory lock poisoned");
        let mut approved: Vec<DoctorProfile> = doctors
            .values()
            .filter(|profile| profile.is_approved)
            .cloned()
            .collect();
        approved.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(approved)
    }
}
