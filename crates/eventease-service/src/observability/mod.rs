//! Observability module for the EventEase service.
//!
//! Provides metrics definitions and recording helpers.

pub mod metrics;
