//! Test group, test case and result types, and the sequential runner.

mod case;
mod group;
mod result;
mod tracker;

pub use case::{ExpectedFailure, Scenario, TestCase, TestContext};
pub use group::TestGroup;
pub use result::{TestResult, TestStatus};
pub use tracker::RowTracker;
