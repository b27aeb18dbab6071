//! Tests for the executor
//!
//! Organized by feature area

mod cancellation_tests;
mod condition_tests;
mod error_tests;
mod helpers;
