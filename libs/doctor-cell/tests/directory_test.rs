use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use doctor_cell::models::{DayAvailability, DoctorError, DoctorProfile};
use doctor_cell::services::directory::{
    DoctorDirectory, InMemoryDoctorDirectory, SupabaseDoctorDirectory,
};
use shared_config::AppConfig;
use shared_database::SupabaseClient;

fn profile(name: &str, approved: bool) -> DoctorProfile {
    DoctorProfile {
        id: Uuid::new_v4(),
        name: name.to_string(),
        specialization: "Dermatology".to_string(),
        fee: 100,
        is_approved: approved,
        availability: None,
    }
}

fn directory_for(server: &MockServer) -> SupabaseDoctorDirectory {
    let config = AppConfig {
        supabase_url: server.uri(),
        supabase_anon_key: "test-anon-key".to_string(),
        supabase_jwt_secret: "test-jwt-secret".to_string(),
        stripe_secret_key: String::new(),
        stripe_webhook_secret: String::new(),
        stripe_api_base: "http://localhost:12111".to_string(),
        app_domain: "http://localhost:3000".to_string(),
    };
    SupabaseDoctorDirectory::new(Arc::new(SupabaseClient::new(&config)))
}

#[tokio::test]
async fn fetches_an_approved_doctor() {
    let server = MockServer::start().await;
    let doctor = profile("Chen", true);

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", format!("eq.{}", doctor.id)))
        .and(query_param("is_approved", "eq.true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([doctor])))
        .mount(&server)
        .await;

    let directory = directory_for(&server);
    let fetched = directory.get_doctor(doctor.id).await.unwrap();

    assert_eq!(fetched.id, doctor.id);
    assert_eq!(fetched.fee, 100);
}

#[tokio::test]
async fn missing_doctor_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let directory = directory_for(&server);
    let result = directory.get_doctor(Uuid::new_v4()).await;

    assert_matches!(result, Err(DoctorError::NotFound));
}

#[tokio::test]
async fn in_memory_directory_hides_unapproved_doctors() {
    let directory = InMemoryDoctorDirectory::new();
    let approved = profile("Chen", true);
    let unapproved = profile("Okafor", false);
    directory.insert(approved.clone());
    directory.insert(unapproved.clone());

    assert!(directory.get_doctor(approved.id).await.is_ok());
    assert_matches!(
        directory.get_doctor(unapproved.id).await,
        Err(DoctorError::NotFound)
    );

    let listed = directory.list_approved().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "Chen");
}

#[tokio::test]
async fn listing_sorts_by_name() {
    let directory = InMemoryDoctorDirectory::new();
    directory.insert(profile("Okafor", true));
    directory.insert(profile("Chen", true));

    let listed = directory.list_approved().await.unwrap();
    let names: Vec<&str> = listed.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, ["Chen", "Okafor"]);
}

#[test]
fn availability_gates_slots_when_published() {
    let date = NaiveDate::from_ymd_opt(2026, 9, 15).unwrap();
    let ten = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
    let eleven = NaiveTime::from_hms_opt(11, 0, 0).unwrap();

    let mut doctor = profile("Chen", true);
    assert!(doctor.is_available_at(date, ten));

    doctor.availability = Some(vec![DayAvailability {
        date,
        slots: vec![ten],
    }]);
    assert!(doctor.is_available_at(date, ten));
    assert!(!doctor.is_available_at(date, eleven));

    let other_day = NaiveDate::from_ymd_opt(2026, 9, 16).unwrap();
    assert!(!doctor.is_available_at(other_day, ten));
}
