use std::panic::{self, AssertUnwindSafe};
use std::thread;
use std::time::Instant;

use table_client::MobileServiceClient;

use crate::error::HarnessError;
use crate::framework::case::{TestCase, TestContext};
use crate::framework::result::TestResult;

/// Ordered collection of test cases run against one table.
#[derive(Debug)]
pub struct TestGroup {
    name: String,
    cases: Vec<TestCase>,
}

impl TestGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cases: Vec::new(),
        }
    }

    pub fn add_test(&mut self, case: TestCase) {
        self.cases.push(case);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    /// Runs every case whose name contains `filter` (case-insensitive), in
    /// order, one at a time.
    ///
    /// `on_complete` sees each result as soon as its case finishes. Must not
    /// be called from inside an async task.
    pub fn run(
        &self,
        client: &MobileServiceClient,
        table_name: &str,
        filter: Option<&str>,
        mut on_complete: impl FnMut(&TestResult),
    ) -> Vec<TestResult> {
        let filter = filter.map(str::to_lowercase);
        let selected: Vec<_> = self
            .cases
            .iter()
            .filter(|case| {
                filter
                    .as_deref()
                    .map_or(true, |f| case.name().to_lowercase().contains(f))
            })
            .collect();

        tracing::info!(
            "Running {} of {} cases in {}",
            selected.len(),
            self.cases.len(),
            self.name
        );

        selected
            .into_iter()
            .enumerate()
            .map(|(index, case)| {
                let result = run_case(index, case, client, table_name);
                on_complete(&result);
                result
            })
            .collect()
    }
}

/// Runs one case on its own thread, then deletes the rows it left behind.
fn run_case(
    index: usize,
    case: &TestCase,
    client: &MobileServiceClient,
    table_name: &str,
) -> TestResult {
    let mut result = TestResult::new(case.name());
    tracing::info!("Starting {}", case.name());

    let start = Instant::now();
    let outcome = thread::scope(|scope| {
        let worker = thread::Builder::new()
            .name(format!("sysprops-case-{}", index))
            .spawn_scoped(scope, || {
                let mut ctx = TestContext::new(client.clone(), table_name);
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| case.run(&mut ctx)))
                    .unwrap_or_else(|_| Err(HarnessError::assertion("Scenario panicked")));
                let (log, tracker) = ctx.finish();
                tracker.cleanup();
                (outcome, log)
            });
        match worker {
            Ok(handle) => handle.join().unwrap_or_else(|_| {
                (
                    Err(HarnessError::assertion("Test worker panicked")),
                    Vec::new(),
                )
            }),
            Err(e) => (
                Err(HarnessError::Setup(format!("Failed to spawn test worker: {}", e))),
                Vec::new(),
            ),
        }
    });

    let (outcome, log) = outcome;
    result.log = log;
    result.elapsed = start.elapsed();

    let result = match (outcome, case.expected_failure()) {
        (Ok(()), None) => result.passed(),
        (Ok(()), Some(expected)) => result.failed(HarnessError::assertion(format!(
            "Expected {:?} but every operation succeeded",
            expected
        ))),
        (Err(error), expected) => result.from_error(error, expected),
    };

    match &result.error {
        Some(error) => tracing::info!("{} {}: {}", result.status, result.name, error),
        None => tracing::info!("{} {}", result.status, result.name),
    }
    result
}
