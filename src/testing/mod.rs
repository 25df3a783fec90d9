//! In-crate integration tests and shared test utilities.

pub(crate) mod utils;

mod engine_integration_tests;
