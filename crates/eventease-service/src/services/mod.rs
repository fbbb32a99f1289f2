//! Business logic between the HTTP handlers and the storage adapter.

pub mod attendance;
pub mod event_service;
pub mod ownership;
pub mod user_service;

pub use attendance::AttendanceLedger;
pub use ownership::check_ownership;
