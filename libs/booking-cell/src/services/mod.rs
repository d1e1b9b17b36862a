pub mod actions;
pub mod lifecycle;
pub mod reconciliation;
pub mod reservation;
pub mod slot_policy;
