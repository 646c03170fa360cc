//! Core types shared across snaplog facilities
//!
//! - **Correlation**: `RunId` tagging every log line of one change-log run
//! - **Schema constants**: canonical field keys and event names for logging

pub mod correlation;
pub mod schema;

pub use correlation::RunId;
