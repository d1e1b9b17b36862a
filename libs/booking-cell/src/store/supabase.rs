use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_database::{DbError, SupabaseClient};

use crate::models::{Appointment, PaymentRecord, PaymentRecordStatus};
use crate::store::{BookingStore, SettlementOutcome, StoreError, TransitionUpdate};

/// PostgREST-backed store. Slot exclusivity rides on a partial unique index
/// over (doctor_id, appointment_date, appointment_time) for non-cancelled
/// rows, and settlement is a conditional PATCH so concurrent webhook
/// deliveries race on the database, not in this process.
pub struct SupabaseBookingStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseBookingStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    fn return_representation() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        headers
    }

    fn map_db_error(e: DbError) -> StoreError {
        match e {
            DbError::Conflict(_) => StoreError::SlotTaken,
            DbError::NotFound(_) => StoreError::NotFound,
            other => StoreError::Unavailable(other.to_string()),
        }
    }

    fn parse_rows<T: serde::de::DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>, StoreError> {
        rows.into_iter()
            .map(|row| {
                serde_json::from_value(row)
                    .map_err(|e| StoreError::Unavailable(format!("failed to parse row: {}", e)))
            })
            .collect()
    }
}

#[async_trait]
impl BookingStore for SupabaseBookingStore {
    async fn insert_appointment(&self, appointment: &Appointment) -> Result<(), StoreError> {
        debug!(
            "Inserting appointment {} for doctor {}",
            appointment.id, appointment.doctor_id
        );

        let body = serde_json::to_value(appointment)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let _: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                Some(body),
                Some(Self::return_representation()),
            )
            .await
            .map_err(Self::map_db_error)?;

        Ok(())
    }

    async fn delete_appointment(&self, id: Uuid) -> Result<(), StoreError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", id);
        let deleted: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::DELETE,
                &path,
                None,
                Some(Self::return_representation()),
            )
            .await
            .map_err(Self::map_db_error)?;

        if deleted.is_empty() {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn get_appointment(&self, id: Uuid) -> Result<Appointment, StoreError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", id);
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(Self::map_db_error)?;

        Self::parse_rows(rows)?
            .into_iter()
            .next()
            .ok_or(StoreError::NotFound)
    }

    async fn active_appointment_at(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<Option<Appointment>, StoreError> {
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&appointment_date=eq.{}&appointment_time=eq.{}&status=neq.cancelled",
            doctor_id, date, time
        );
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(Self::map_db_error)?;

        Ok(Self::parse_rows(rows)?.into_iter().next())
    }

    async fn appointments_for_patient(
        &self,
        patient_id: Uuid,
    ) -> Result<Vec<Appointment>, StoreError> {
        let path = format!(
            "/rest/v1/appointments?patient_id=eq.{}&order=appointment_date.asc,appointment_time.asc",
            patient_id
        );
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(Self::map_db_error)?;

        Self::parse_rows(rows)
    }

    async fn appointments_for_doctor(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<Appointment>, StoreError> {
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&order=appointment_date.asc,appointment_time.asc",
            doctor_id
        );
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(Self::map_db_error)?;

        Self::parse_rows(rows)
    }

    async fn all_appointments(&self) -> Result<Vec<Appointment>, StoreError> {
        let path = "/rest/v1/appointments?order=created_at.asc";
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, path, None)
            .await
            .map_err(Self::map_db_error)?;

        Self::parse_rows(rows)
    }

    async fn apply_transition(
        &self,
        id: Uuid,
        update: &TransitionUpdate,
    ) -> Result<Appointment, StoreError> {
        let mut body = json!({ "status": update.status });
        if let Some(payment_status) = update.payment_status {
            body["payment_status"] = json!(payment_status);
        }

        // Conditional on the planned-from status, so a concurrent writer
        // that moved the row first turns this into a stale no-match.
        let path = format!(
            "/rest/v1/appointments?id=eq.{}&status=eq.{}",
            id, update.from
        );
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(body),
                Some(Self::return_representation()),
            )
            .await
            .map_err(Self::map_db_error)?;

        let appointment: Appointment = match Self::parse_rows(rows)?.into_iter().next() {
            Some(appointment) => appointment,
            None => {
                let lookup = format!("/rest/v1/appointments?id=eq.{}", id);
                let existing: Vec<Value> = self
                    .supabase
                    .request(Method::GET, &lookup, None)
                    .await
                    .map_err(Self::map_db_error)?;
                return Err(if existing.is_empty() {
                    StoreError::NotFound
                } else {
                    StoreError::StaleTransition
                });
            }
        };

        if update.increment_patient_visits {
            let rpc_body = json!({ "p_patient_id": appointment.patient_id });
            let result: Result<Value, DbError> = self
                .supabase
                .request(Method::POST, "/rest/v1/rpc/increment_completed_visits", Some(rpc_body))
                .await;
            if let Err(e) = result {
                // The transition itself already landed; a missed counter bump
                // is recoverable from the appointments table.
                warn!("Failed to bump visit counter for {}: {}", appointment.patient_id, e);
            }
        }

        if update.cancel_payment_record {
            let payments_path = format!("/rest/v1/payments?appointment_id=eq.{}", id);
            let cancel_body = json!({ "status": PaymentRecordStatus::Cancelled });
            let _: Vec<Value> = self
                .supabase
                .request_with_headers(
                    Method::PATCH,
                    &payments_path,
                    Some(cancel_body),
                    Some(Self::return_representation()),
                )
                .await
                .map_err(Self::map_db_error)?;
        }

        Ok(appointment)
    }

    async fn insert_payment(&self, payment: &PaymentRecord) -> Result<(), StoreError> {
        let body =
            serde_json::to_value(payment).map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let _: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/payments",
                Some(body),
                Some(Self::return_representation()),
            )
            .await
            .map_err(|e| match e {
                DbError::Conflict(_) => StoreError::DuplicateSession,
                other => Self::map_db_error(other),
            })?;

        Ok(())
    }

    async fn payment_for_appointment(
        &self,
        appointment_id: Uuid,
    ) -> Result<Option<PaymentRecord>, StoreError> {
        let path = format!("/rest/v1/payments?appointment_id=eq.{}", appointment_id);
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(Self::map_db_error)?;

        Ok(Self::parse_rows(rows)?.into_iter().next())
    }

    async fn settle_payment(
        &self,
        session_id: &str,
        payment_intent: &str,
    ) -> Result<SettlementOutcome, StoreError> {
        let encoded = urlencoding::encode(session_id);

        // Conditional update: only a pending row matches, so redeliveries and
        // concurrent deliveries collapse to a single winner.
        let path = format!(
            "/rest/v1/payments?checkout_session_id=eq.{}&status=eq.pending",
            encoded
        );
        let body = json!({
            "status": PaymentRecordStatus::Paid,
            "payment_intent_id": payment_intent,
        });
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(body),
                Some(Self::return_representation()),
            )
            .await
            .map_err(Self::map_db_error)?;

        if let Some(payment) = Self::parse_rows::<PaymentRecord>(rows)?.into_iter().next() {
            return Ok(SettlementOutcome::Settled(payment));
        }

        // Nothing matched: either the row exists in a settled state or the
        // session is unknown.
        let lookup = format!("/rest/v1/payments?checkout_session_id=eq.{}", encoded);
        let existing: Vec<Value> = self
            .supabase
            .request(Method::GET, &lookup, None)
            .await
            .map_err(Self::map_db_error)?;

        if existing.is_empty() {
            Ok(SettlementOutcome::NotFound)
        } else {
            Ok(SettlementOutcome::AlreadySettled)
        }
    }

    async fn completed_visits(&self, patient_id: Uuid) -> Result<u64, StoreError> {
        let path = format!(
            "/rest/v1/patient_visits?patient_id=eq.{}&select=completed_count",
            patient_id
        );
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(Self::map_db_error)?;

        Ok(rows
            .first()
            .and_then(|row| row.get("completed_count"))
            .and_then(|count| count.as_u64())
            .unwrap_or(0))
    }
}
