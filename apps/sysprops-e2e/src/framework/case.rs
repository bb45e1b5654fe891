use table_client::{JsonTable, MobileServiceClient, Table, TableRow};

use crate::error::HarnessError;
use crate::framework::tracker::RowTracker;

/// Scenario body run by a [`TestCase`].
pub type Scenario = Box<dyn Fn(&mut TestContext) -> Result<(), HarnessError> + Send + Sync>;

/// Error class a case is expected to end with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedFailure {
    /// The service rejected an update because the version was stale
    PreconditionFailed,
}

impl ExpectedFailure {
    pub fn matches(&self, error: &HarnessError) -> bool {
        match self {
            ExpectedFailure::PreconditionFailed => error.is_precondition_failed(),
        }
    }
}

/// Named scenario with an optional expected failure.
pub struct TestCase {
    name: String,
    expected_failure: Option<ExpectedFailure>,
    scenario: Scenario,
}

impl TestCase {
    pub fn new<F>(name: impl Into<String>, scenario: F) -> Self
    where
        F: Fn(&mut TestContext) -> Result<(), HarnessError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            expected_failure: None,
            scenario: Box::new(scenario),
        }
    }

    /// Marks the case as passing only if it ends with `failure`.
    pub fn expecting(mut self, failure: ExpectedFailure) -> Self {
        self.expected_failure = Some(failure);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn expected_failure(&self) -> Option<ExpectedFailure> {
        self.expected_failure
    }

    pub fn run(&self, ctx: &mut TestContext) -> Result<(), HarnessError> {
        (self.scenario)(ctx)
    }
}

impl std::fmt::Debug for TestCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.name)
            .field("expected_failure", &self.expected_failure)
            .finish_non_exhaustive()
    }
}

/// What a scenario gets to work with: the client, the table it targets,
/// a step log and the tracker of rows it still owns.
pub struct TestContext {
    client: MobileServiceClient,
    table_name: String,
    log: Vec<String>,
    tracker: RowTracker,
}

impl TestContext {
    pub fn new(client: MobileServiceClient, table_name: impl Into<String>) -> Self {
        let table_name = table_name.into();
        let tracker = RowTracker::new(client.clone(), &table_name);
        Self {
            client,
            table_name,
            log: Vec::new(),
            tracker,
        }
    }

    /// Typed handle on the scenario table, with `T`'s default properties.
    pub fn table<T: TableRow>(&self) -> Table<T> {
        self.client.table(self.table_name.clone())
    }

    /// JSON handle on the scenario table, with no properties selected.
    pub fn json_table(&self) -> JsonTable {
        self.client.json_table(self.table_name.clone())
    }

    /// Appends a line to the step log.
    pub fn log(&mut self, line: impl Into<String>) {
        let line = line.into();
        tracing::info!("{}", line);
        self.log.push(line);
    }

    /// Records a row the scenario inserted.
    pub fn track(&mut self, id: &str) {
        self.tracker.track(id);
    }

    /// Records that the scenario deleted a row itself.
    pub fn forget(&mut self, id: &str) {
        self.tracker.forget(id);
    }

    pub(crate) fn finish(self) -> (Vec<String>, RowTracker) {
        (self.log, self.tracker)
    }
}
