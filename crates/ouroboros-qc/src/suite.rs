//! Unit test suite - ordered test cases with init/cleanup hooks
//!
//! A suite runs as a small state machine:
//!
//! ```text
//! NotStarted -> InitRunning -> (InitFailed | CasesRunning)
//!            -> (Aborted | CasesCompleted) -> CleanupRunning -> Finished
//! ```
//!
//! A failure stops the suite unless both the run configuration and the
//! suite itself allow continuing. Cleanup runs whenever it is registered,
//! including after an aborted init.

use crate::config::RunConfiguration;
use crate::error::{QcError, Result};
use crate::outcome::{IntoOutcome, Outcome};
use crate::probe::MetricsProbe;
use crate::runner::RunObserver;
use crate::test_case::{TestCase, TestCaseResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Name given to the init hook's test case
pub const INIT_CASE_NAME: &str = "Init";

/// Suite execution state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuiteState {
    NotStarted,
    InitRunning,
    InitFailed,
    CasesRunning,
    Aborted,
    CasesCompleted,
    CleanupRunning,
    Finished,
}

impl std::fmt::Display for SuiteState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuiteState::NotStarted => write!(f, "not_started"),
            SuiteState::InitRunning => write!(f, "init_running"),
            SuiteState::InitFailed => write!(f, "init_failed"),
            SuiteState::CasesRunning => write!(f, "cases_running"),
            SuiteState::Aborted => write!(f, "aborted"),
            SuiteState::CasesCompleted => write!(f, "cases_completed"),
            SuiteState::CleanupRunning => write!(f, "cleanup_running"),
            SuiteState::Finished => write!(f, "finished"),
        }
    }
}

/// Result of running one suite
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteResult {
    /// Suite name
    pub suite_name: String,
    /// Init hook result (if an init is registered)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init_result: Option<TestCaseResult>,
    /// Case results in execution order
    pub case_results: Vec<TestCaseResult>,
    /// Passed cases
    pub success_count: usize,
    /// Failed cases
    pub failure_count: usize,
    /// Cases registered in the suite
    pub registered_cases: usize,
    /// Whether the suite stopped before running every case
    pub aborted: bool,
}

impl SuiteResult {
    fn new(suite_name: impl Into<String>, registered_cases: usize) -> Self {
        Self {
            suite_name: suite_name.into(),
            init_result: None,
            case_results: Vec::new(),
            success_count: 0,
            failure_count: 0,
            registered_cases,
            aborted: false,
        }
    }

    fn add_result(&mut self, result: TestCaseResult) {
        if result.passed {
            self.success_count += 1;
        } else {
            self.failure_count += 1;
        }
        self.case_results.push(result);
    }

    /// True when there is no init or it passed
    pub fn init_passed(&self) -> bool {
        self.init_result.as_ref().map_or(true, |r| r.passed)
    }

    /// A suite fails when any of its cases failed. A failing init is
    /// reported through [`init_passed`](Self::init_passed) only.
    pub fn is_failed(&self) -> bool {
        self.failure_count != 0
    }

    pub fn executed_count(&self) -> usize {
        self.case_results.len()
    }

    /// Whether every registered case was executed
    pub fn is_complete(&self) -> bool {
        self.executed_count() == self.registered_cases
    }
}

type CleanupFn = Box<dyn FnMut() -> Outcome>;

/// A named group of test cases sharing init/cleanup and a continuation policy
pub struct UnitTest {
    name: String,
    continue_on_failure: bool,
    init: Option<TestCase>,
    cleanup: Option<CleanupFn>,
    cases: Vec<TestCase>,
}

impl UnitTest {
    /// Start building a suite
    pub fn builder(name: impl Into<String>) -> UnitTestBuilder {
        UnitTestBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn continue_on_failure(&self) -> bool {
        self.continue_on_failure
    }

    /// Number of registered cases (init excluded)
    pub fn case_count(&self) -> usize {
        self.cases.len()
    }

    pub fn case_names(&self) -> impl Iterator<Item = &str> {
        self.cases.iter().map(|c| c.name())
    }

    pub fn has_init(&self) -> bool {
        self.init.is_some()
    }

    pub fn has_cleanup(&self) -> bool {
        self.cleanup.is_some()
    }

    /// Run the suite.
    ///
    /// Case failures are recorded in the returned result. Only a failing
    /// cleanup produces an error; a panicking cleanup unwinds to the caller.
    pub fn run(
        &mut self,
        config: &RunConfiguration,
        probe: &dyn MetricsProbe,
        observer: &mut dyn RunObserver,
    ) -> Result<SuiteResult> {
        let (result, cleanup) = self.execute(config, probe, observer);
        cleanup.map(|()| result)
    }

    /// Run the suite, keeping the collected results next to the cleanup verdict
    pub(crate) fn execute(
        &mut self,
        config: &RunConfiguration,
        probe: &dyn MetricsProbe,
        observer: &mut dyn RunObserver,
    ) -> (SuiteResult, Result<()>) {
        let may_continue = config.continue_on_failure && self.continue_on_failure;
        let mut result = SuiteResult::new(self.name.clone(), self.cases.len());
        let mut state = SuiteState::NotStarted;
        let mut cleanup = Ok(());

        while state != SuiteState::Finished {
            state = match state {
                SuiteState::NotStarted => {
                    if self.init.is_some() {
                        SuiteState::InitRunning
                    } else {
                        SuiteState::CasesRunning
                    }
                }
                SuiteState::InitRunning => {
                    let passed = match self.init.as_mut() {
                        Some(init) => {
                            let init_result = init.run(probe);
                            let passed = init_result.passed;
                            result.init_result = Some(init_result);
                            passed
                        }
                        None => true,
                    };
                    if passed {
                        SuiteState::CasesRunning
                    } else {
                        SuiteState::InitFailed
                    }
                }
                SuiteState::InitFailed => {
                    if may_continue {
                        SuiteState::CasesRunning
                    } else {
                        result.aborted = !self.cases.is_empty();
                        self.after_cases()
                    }
                }
                SuiteState::CasesRunning => {
                    self.run_cases(probe, observer, may_continue, &mut result)
                }
                SuiteState::Aborted | SuiteState::CasesCompleted => self.after_cases(),
                SuiteState::CleanupRunning => {
                    cleanup = self.run_cleanup();
                    SuiteState::Finished
                }
                SuiteState::Finished => SuiteState::Finished,
            };
            tracing::debug!(suite = %self.name, state = %state, "suite state");
        }

        (result, cleanup)
    }

    fn run_cases(
        &mut self,
        probe: &dyn MetricsProbe,
        observer: &mut dyn RunObserver,
        may_continue: bool,
        result: &mut SuiteResult,
    ) -> SuiteState {
        let total = self.cases.len();
        for (index, case) in self.cases.iter_mut().enumerate() {
            observer.on_case_start(&self.name, case.name());
            let case_result = case.run(probe);
            observer.on_case_finish(&self.name, &case_result);
            let passed = case_result.passed;
            result.add_result(case_result);

            if !passed && !may_continue {
                if index + 1 < total {
                    result.aborted = true;
                }
                return SuiteState::Aborted;
            }
        }
        SuiteState::CasesCompleted
    }

    fn after_cases(&self) -> SuiteState {
        if self.cleanup.is_some() {
            SuiteState::CleanupRunning
        } else {
            SuiteState::Finished
        }
    }

    fn run_cleanup(&mut self) -> Result<()> {
        let Some(cleanup) = self.cleanup.as_mut() else {
            return Ok(());
        };
        match cleanup() {
            Outcome::Passed => Ok(()),
            Outcome::Failed(failure) => Err(QcError::Cleanup {
                suite: self.name.clone(),
                message: failure.message,
            }),
        }
    }
}

impl std::fmt::Debug for UnitTest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitTest")
            .field("name", &self.name)
            .field("continue_on_failure", &self.continue_on_failure)
            .field("init", &self.init.is_some())
            .field("cleanup", &self.cleanup.is_some())
            .field("cases", &self.cases)
            .finish()
    }
}

/// Builder for [`UnitTest`]; registration errors surface from [`build`](Self::build)
pub struct UnitTestBuilder {
    name: String,
    continue_on_failure: bool,
    init: Option<TestCase>,
    cleanup: Option<CleanupFn>,
    cases: Vec<TestCase>,
    seen: HashSet<String>,
    errors: Vec<String>,
}

impl UnitTestBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            continue_on_failure: false,
            init: None,
            cleanup: None,
            cases: Vec::new(),
            seen: HashSet::new(),
            errors: Vec::new(),
        }
    }

    /// Allow the suite to continue past failures (default: false)
    pub fn continue_on_failure(mut self, continue_on_failure: bool) -> Self {
        self.continue_on_failure = continue_on_failure;
        self
    }

    /// Register the init hook
    pub fn init<F, R>(mut self, body: F) -> Self
    where
        F: FnMut() -> R + 'static,
        R: IntoOutcome,
    {
        if self.init.is_some() {
            self.errors.push("init registered more than once".to_string());
        } else {
            self.init = Some(TestCase::new(INIT_CASE_NAME, body));
        }
        self
    }

    /// Register the cleanup hook
    pub fn cleanup<F, R>(mut self, mut body: F) -> Self
    where
        F: FnMut() -> R + 'static,
        R: IntoOutcome,
    {
        if self.cleanup.is_some() {
            self.errors.push("cleanup registered more than once".to_string());
        } else {
            self.cleanup = Some(Box::new(move || body().into_outcome()));
        }
        self
    }

    /// Register a test case
    pub fn case<F, R>(self, name: impl Into<String>, body: F) -> Self
    where
        F: FnMut() -> R + 'static,
        R: IntoOutcome,
    {
        self.add_case(TestCase::new(name, body))
    }

    /// Register an already constructed test case
    pub fn add_case(mut self, case: TestCase) -> Self {
        if case.name().trim().is_empty() {
            self.errors.push("test case name must not be empty".to_string());
        } else if !self.seen.insert(case.name().to_string()) {
            self.errors.push(format!("duplicate test case '{}'", case.name()));
        } else {
            self.cases.push(case);
        }
        self
    }

    pub fn build(self) -> Result<UnitTest> {
        if self.name.trim().is_empty() {
            return Err(QcError::invalid_suite(self.name, "suite name must not be empty"));
        }
        if let Some(reason) = self.errors.into_iter().next() {
            return Err(QcError::invalid_suite(self.name, reason));
        }
        Ok(UnitTest {
            name: self.name,
            continue_on_failure: self.continue_on_failure,
            init: self.init,
            cleanup: self.cleanup,
            cases: self.cases,
        })
    }
}
