//! End-to-end tests for system properties on mobile service tables.
//!
//! The "System Properties tests" group drives a table service through the
//! client SDK and checks that `__version`, `__createdAt` and `__updatedAt`
//! are returned, omitted and filterable as configured, and that stale
//! versions are rejected with a precondition failure.
//!
//! Scenarios are written as straight-line code: [`adapter::wait_for`] turns
//! each callback-style client operation into a blocking call.

pub mod adapter;
pub mod assertions;
pub mod data;
pub mod embedded;
pub mod error;
pub mod framework;
pub mod ops;
pub mod scenarios;
pub mod types;

pub use embedded::EmbeddedService;
pub use error::HarnessError;
pub use framework::{ExpectedFailure, TestCase, TestGroup, TestResult, TestStatus};
pub use scenarios::system_properties_tests;
pub use types::RoundTripRow;
