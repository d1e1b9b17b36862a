use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use booking_cell::error::BookingError;
use booking_cell::models::{Actor, Appointment, AppointmentStatus, PaymentStatus};
use booking_cell::services::lifecycle::AppointmentLifecycle;

fn appointment(status: AppointmentStatus) -> Appointment {
    Appointment {
        id: Uuid::new_v4(),
        patient_id: Uuid::new_v4(),
        doctor_id: Uuid::new_v4(),
        appointment_date: NaiveDate::from_ymd_opt(2026, 9, 15).unwrap(),
        appointment_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        status,
        payment_status: PaymentStatus::Pending,
        created_at: Utc::now(),
    }
}

#[test]
fn pending_moves_to_confirmed_or_cancelled_only() {
    use AppointmentStatus::*;

    assert!(AppointmentLifecycle::validate_transition(Pending, Confirmed).is_ok());
    assert!(AppointmentLifecycle::validate_transition(Pending, Cancelled).is_ok());
    assert_matches!(
        AppointmentLifecycle::validate_transition(Pending, Completed),
        Err(BookingError::InvalidTransition {
            from: Pending,
            to: Completed
        })
    );
}

#[test]
fn confirmed_moves_to_completed_or_cancelled_only() {
    use AppointmentStatus::*;

    assert!(AppointmentLifecycle::validate_transition(Confirmed, Completed).is_ok());
    assert!(AppointmentLifecycle::validate_transition(Confirmed, Cancelled).is_ok());
    assert_matches!(
        AppointmentLifecycle::validate_transition(Confirmed, Pending),
        Err(BookingError::InvalidTransition { .. })
    );
}

#[test]
fn terminal_states_admit_nothing() {
    use AppointmentStatus::*;

    for terminal in [Completed, Cancelled] {
        assert!(AppointmentLifecycle::valid_transitions(terminal).is_empty());
        for target in [Pending, Confirmed, Completed, Cancelled] {
            if target == terminal {
                continue;
            }
            assert_matches!(
                AppointmentLifecycle::validate_transition(terminal, target),
                Err(BookingError::InvalidTransition { .. })
            );
        }
    }
}

#[test]
fn same_state_reports_already_in_state() {
    use AppointmentStatus::*;

    for status in [Pending, Confirmed, Completed, Cancelled] {
        assert_matches!(
            AppointmentLifecycle::validate_transition(status, status),
            Err(BookingError::AlreadyInState(s)) if s == status
        );
    }
}

#[test]
fn settlement_confirmation_completes_payment() {
    let pending = appointment(AppointmentStatus::Pending);
    let update =
        AppointmentLifecycle::plan_transition(&pending, AppointmentStatus::Confirmed, Actor::System)
            .unwrap();

    assert_eq!(update.status, AppointmentStatus::Confirmed);
    assert_eq!(update.payment_status, Some(PaymentStatus::Completed));
    assert!(!update.increment_patient_visits);
    assert!(!update.cancel_payment_record);
}

#[test]
fn manual_confirmation_leaves_payment_alone() {
    let pending = appointment(AppointmentStatus::Pending);

    for actor in [Actor::Doctor, Actor::Admin] {
        let update =
            AppointmentLifecycle::plan_transition(&pending, AppointmentStatus::Confirmed, actor)
                .unwrap();
        assert_eq!(update.payment_status, None);
    }
}

#[test]
fn completion_bumps_visits_and_completes_payment() {
    let confirmed = appointment(AppointmentStatus::Confirmed);
    let update = AppointmentLifecycle::plan_transition(
        &confirmed,
        AppointmentStatus::Completed,
        Actor::Doctor,
    )
    .unwrap();

    assert_eq!(update.payment_status, Some(PaymentStatus::Completed));
    assert!(update.increment_patient_visits);
}

#[test]
fn admin_cancellation_voids_payment() {
    let confirmed = appointment(AppointmentStatus::Confirmed);
    let update = AppointmentLifecycle::plan_transition(
        &confirmed,
        AppointmentStatus::Cancelled,
        Actor::Admin,
    )
    .unwrap();

    assert_eq!(update.payment_status, Some(PaymentStatus::Cancelled));
    assert!(update.cancel_payment_record);
}

#[test]
fn patient_cancellation_leaves_payment_alone() {
    let pending = appointment(AppointmentStatus::Pending);
    let update = AppointmentLifecycle::plan_transition(
        &pending,
        AppointmentStatus::Cancelled,
        Actor::Patient,
    )
    .unwrap();

    assert_eq!(update.payment_status, None);
    assert!(!update.cancel_payment_record);
}
