use std::fmt;
use std::time::Duration;

use crate::error::HarnessError;
use crate::framework::case::ExpectedFailure;

/// Lifecycle of a test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestStatus {
    NotRun,
    Running,
    Passed,
    Failed,
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TestStatus::NotRun => "NOT RUN",
            TestStatus::Running => "RUNNING",
            TestStatus::Passed => "PASSED",
            TestStatus::Failed => "FAILED",
        };
        f.write_str(text)
    }
}

/// Outcome of one test case.
#[derive(Debug)]
pub struct TestResult {
    pub name: String,
    pub status: TestStatus,
    /// Error raised by the scenario, kept even when it was expected
    pub error: Option<HarnessError>,
    /// Step log written by the scenario
    pub log: Vec<String>,
    pub elapsed: Duration,
}

impl TestResult {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: TestStatus::NotRun,
            error: None,
            log: Vec::new(),
            elapsed: Duration::ZERO,
        }
    }

    /// Converts a scenario error into the result.
    ///
    /// The case passes if the error is of its expected failure class and
    /// fails otherwise.
    pub fn from_error(mut self, error: HarnessError, expected: Option<ExpectedFailure>) -> Self {
        self.status = match expected {
            Some(failure) if failure.matches(&error) => TestStatus::Passed,
            _ => TestStatus::Failed,
        };
        self.error = Some(error);
        self
    }

    pub fn passed(mut self) -> Self {
        self.status = TestStatus::Passed;
        self
    }

    pub fn failed(mut self, error: HarnessError) -> Self {
        self.status = TestStatus::Failed;
        self.error = Some(error);
        self
    }

    pub fn is_passed(&self) -> bool {
        self.status == TestStatus::Passed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use table_client::{ClientError, PreconditionFailed};

    fn precondition_failed() -> HarnessError {
        ClientError::from(PreconditionFailed::new("stale", serde_json::Value::Null)).into()
    }

    #[test]
    fn test_expected_failure_passes_and_keeps_error() {
        let result = TestResult::new("Merge Conflict")
            .from_error(precondition_failed(), Some(ExpectedFailure::PreconditionFailed));
        assert!(result.is_passed());
        assert!(result.error.unwrap().is_precondition_failed());
    }

    #[test]
    fn test_unexpected_failure_fails() {
        let result = TestResult::new("Merge Conflict").from_error(
            HarnessError::expected_value("a", "b"),
            Some(ExpectedFailure::PreconditionFailed),
        );
        assert_eq!(result.status, TestStatus::Failed);

        let result = TestResult::new("Plain").from_error(precondition_failed(), None);
        assert_eq!(result.status, TestStatus::Failed);
    }
}
