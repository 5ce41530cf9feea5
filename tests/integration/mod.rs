//! Integration tests for querychat.

pub mod binary_test;
pub mod http_backend_test;
pub mod orchestrator_test;
