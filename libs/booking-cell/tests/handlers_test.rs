mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use booking_cell::router::{appointment_routes, webhook_routes};
use payment_cell::services::mock::MockPaymentGateway;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

use common::{approved_doctor, future_date, harness, Harness};

fn app(h: &Harness) -> Router {
    Router::new()
        .nest("/appointments", appointment_routes(h.state.clone()))
        .nest("/appointments/payments", webhook_routes(h.state.clone()))
}

fn bearer(user: &TestUser) -> String {
    let secret = TestConfig::default().jwt_secret;
    format!("Bearer {}", JwtTestUtils::create_test_token(user, &secret, None))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn reserve_request(user: &TestUser, doctor_id: Uuid) -> Request<Body> {
    let body = json!({
        "doctor_id": doctor_id,
        "appointment_date": future_date(),
        "appointment_time": "10:00:00",
    });
    Request::builder()
        .method("POST")
        .uri("/appointments")
        .header(header::AUTHORIZATION, bearer(user))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn webhook_request(payload: Vec<u8>, signature: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/appointments/payments/webhook")
        .header("stripe-signature", signature)
        .body(Body::from(payload))
        .unwrap()
}

#[tokio::test]
async fn requests_without_a_token_are_rejected() {
    let h = harness();
    let app = app(&h);

    let request = Request::builder()
        .method("GET")
        .uri("/appointments/mine")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.get("error").is_some());
}

#[tokio::test]
async fn patient_books_pays_and_admin_cancels() {
    let h = harness();
    let app = app(&h);

    let doctor_profile = approved_doctor(100);
    h.directory.insert(doctor_profile.clone());

    let patient = TestUser::patient("amira@example.com");
    let rival = TestUser::patient("noor@example.com");
    let admin = TestUser::admin("ops@example.com");

    // Reserve: consultation fee 100 plus the booking surcharge.
    let (status, body) = send(&app, reserve_request(&patient, doctor_profile.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["amount"], 105);
    assert_eq!(body["appointment"]["status"], "pending");
    let appointment_id = body["appointment"]["id"].as_str().unwrap().to_string();
    let session_id = body["checkout_session_id"].as_str().unwrap().to_string();

    // The slot is now held against everyone else.
    let (status, _) = send(&app, reserve_request(&rival, doctor_profile.id)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // A forged webhook changes nothing.
    let (payload, _) = MockPaymentGateway::completed_event(&session_id, "pi_123", None);
    let (status, _) = send(&app, webhook_request(payload.clone(), "t=1,v1=00")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // The real settlement confirms the appointment.
    let (payload, signature) = MockPaymentGateway::completed_event(&session_id, "pi_123", None);
    let (status, body) = send(&app, webhook_request(payload.clone(), &signature)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["received"], true);

    let request = Request::builder()
        .method("GET")
        .uri(format!("/appointments/{}", appointment_id))
        .header(header::AUTHORIZATION, bearer(&patient))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "confirmed");
    assert_eq!(body["payment_status"], "completed");

    // A provider retry is absorbed silently.
    let (status, _) = send(&app, webhook_request(payload, &signature)).await;
    assert_eq!(status, StatusCode::OK);

    // Admin cancels; the payment side is voided with it.
    let request = Request::builder()
        .method("PATCH")
        .uri(format!("/appointments/{}/transition", appointment_id))
        .header(header::AUTHORIZATION, bearer(&admin))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "action": "cancel" }).to_string()))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");
    assert_eq!(body["payment_status"], "cancelled");

    // The patient retrying their own cancel sees the conflict.
    let request = Request::builder()
        .method("POST")
        .uri(format!("/appointments/{}/cancel", appointment_id))
        .header(header::AUTHORIZATION, bearer(&patient))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // The freed slot is bookable again.
    let (status, _) = send(&app, reserve_request(&rival, doctor_profile.id)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn patients_only_see_their_own_appointments() {
    let h = harness();
    let app = app(&h);

    let doctor_profile = approved_doctor(100);
    h.directory.insert(doctor_profile.clone());

    let patient = TestUser::patient("amira@example.com");
    let other = TestUser::patient("noor@example.com");

    let (status, body) = send(&app, reserve_request(&patient, doctor_profile.id)).await;
    assert_eq!(status, StatusCode::OK);
    let appointment_id = body["appointment"]["id"].as_str().unwrap().to_string();

    let request = Request::builder()
        .method("GET")
        .uri("/appointments/mine")
        .header(header::AUTHORIZATION, bearer(&patient))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let request = Request::builder()
        .method("GET")
        .uri("/appointments/mine")
        .header(header::AUTHORIZATION, bearer(&other))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 0);

    // Another patient probing by id learns nothing.
    let request = Request::builder()
        .method("GET")
        .uri(format!("/appointments/{}", appointment_id))
        .header(header::AUTHORIZATION, bearer(&other))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn role_gates_on_listing_and_transitions() {
    let h = harness();
    let app = app(&h);
    let patient = TestUser::patient("amira@example.com");

    // Admin listing is closed to patients.
    let request = Request::builder()
        .method("GET")
        .uri("/appointments")
        .header(header::AUTHORIZATION, bearer(&patient))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // So is the doctor schedule view.
    let request = Request::builder()
        .method("GET")
        .uri("/appointments/doctor")
        .header(header::AUTHORIZATION, bearer(&patient))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Reservations are a patient operation.
    let doctor = TestUser::doctor("chen@example.com");
    let (status, _) = send(&app, reserve_request(&doctor, Uuid::new_v4())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Patients cannot drive lifecycle transitions directly.
    let request = Request::builder()
        .method("PATCH")
        .uri(format!("/appointments/{}/transition", Uuid::new_v4()))
        .header(header::AUTHORIZATION, bearer(&patient))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "action": "confirm" }).to_string()))
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn doctor_sees_their_schedule_and_completes_visits() {
    let h = harness();
    let app = app(&h);

    let mut doctor_profile = approved_doctor(100);
    let doctor = TestUser::doctor("chen@example.com");
    doctor_profile.id = Uuid::parse_str(&doctor.id).unwrap();
    h.directory.insert(doctor_profile.clone());

    let patient = TestUser::patient("amira@example.com");
    let (status, body) = send(&app, reserve_request(&patient, doctor_profile.id)).await;
    assert_eq!(status, StatusCode::OK);
    let appointment_id = body["appointment"]["id"].as_str().unwrap().to_string();

    let request = Request::builder()
        .method("GET")
        .uri("/appointments/doctor")
        .header(header::AUTHORIZATION, bearer(&doctor))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    for action in ["confirm", "complete"] {
        let request = Request::builder()
            .method("PATCH")
            .uri(format!("/appointments/{}/transition", appointment_id))
            .header(header::AUTHORIZATION, bearer(&doctor))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "action": action }).to_string()))
            .unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
    }

    let patient_id = Uuid::parse_str(&patient.id).unwrap();
    use booking_cell::store::BookingStore;
    assert_eq!(h.store.completed_visits(patient_id).await.unwrap(), 1);
}

#[tokio::test]
async fn webhook_without_signature_header_is_bad_request() {
    let h = harness();
    let app = app(&h);

    let request = Request::builder()
        .method("POST")
        .uri("/appointments/payments/webhook")
        .body(Body::from("{}"))
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
