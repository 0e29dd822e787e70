//! Test runner - executes registered suites and aggregates their results

use crate::config::RunConfiguration;
use crate::error::{QcError, Result};
use crate::probe::{MetricsProbe, ProcessProbe};
use crate::registry::UnitTestClass;
use crate::suite::{SuiteResult, UnitTest};
use crate::test_case::TestCaseResult;
use serde::{Deserialize, Serialize};

/// Receives progress notifications while a run is in flight.
///
/// All methods default to no-ops.
pub trait RunObserver {
    fn on_suite_start(&mut self, _suite: &str) {}
    fn on_case_start(&mut self, _suite: &str, _case: &str) {}
    fn on_case_finish(&mut self, _suite: &str, _result: &TestCaseResult) {}
    fn on_suite_finish(&mut self, _result: &SuiteResult) {}
    fn on_run_finish(&mut self, _result: &GlobalResult) {}
}

/// Observer that ignores every notification
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

/// Aggregated result of a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalResult {
    /// Results of the suites that ran, in execution order
    pub suite_results: Vec<SuiteResult>,
    /// Suites with at least one failing case
    pub suites_failed: usize,
    /// Suites without failures
    pub suites_passed: usize,
    /// Suites registered with the runner
    pub suites_registered: usize,
    /// Cases of every suite the runner reached
    pub total_cases_registered: usize,
    /// Cases actually executed
    pub total_cases_executed: usize,
    /// Passed cases across all suites
    pub total_successes: usize,
    /// Failed cases across all suites
    pub total_failures: usize,
}

impl GlobalResult {
    fn add_case_count(&mut self, case_count: usize) {
        self.total_cases_registered += case_count;
    }

    fn consume(&mut self, suite_result: SuiteResult) {
        self.total_successes += suite_result.success_count;
        self.total_failures += suite_result.failure_count;
        self.total_cases_executed += suite_result.executed_count();
        if suite_result.is_failed() {
            self.suites_failed += 1;
        } else {
            self.suites_passed += 1;
        }
        self.suite_results.push(suite_result);
    }

    /// True iff no suite reported a failure
    pub fn overall_success(&self) -> bool {
        self.suites_failed == 0
    }

    /// True iff every registered case of every registered suite was executed
    pub fn is_complete(&self) -> bool {
        self.suite_results.len() == self.suites_registered
            && self.total_cases_executed == self.total_cases_registered
    }

    /// Suites that were registered but never reached
    pub fn suites_skipped(&self) -> usize {
        self.suites_registered - self.suite_results.len()
    }

    /// Failing suites
    pub fn failed_suites(&self) -> Vec<&SuiteResult> {
        self.suite_results.iter().filter(|r| r.is_failed()).collect()
    }
}

/// Test runner - owns the suites and runs them in registration order
pub struct Runner {
    suites: Vec<UnitTest>,
    probe: Box<dyn MetricsProbe>,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner {
    /// Create a runner measuring with [`ProcessProbe`]
    pub fn new() -> Self {
        Self::with_probe(ProcessProbe)
    }

    /// Create a runner with a custom metrics probe
    pub fn with_probe(probe: impl MetricsProbe + 'static) -> Self {
        Self {
            suites: Vec::new(),
            probe: Box::new(probe),
        }
    }

    /// Register a suite
    pub fn add_suite(&mut self, suite: UnitTest) {
        tracing::debug!(suite = %suite.name(), cases = suite.case_count(), "suite registered");
        self.suites.push(suite);
    }

    /// Register a test class
    pub fn add_class<T: UnitTestClass>(&mut self) -> Result<()> {
        let suite = UnitTest::from_class::<T>()?;
        self.add_suite(suite);
        Ok(())
    }

    pub fn suites(&self) -> &[UnitTest] {
        &self.suites
    }

    /// Run every suite without progress notifications
    pub fn run(&mut self, config: &RunConfiguration) -> Result<GlobalResult> {
        self.run_with_observer(config, &mut NoopObserver)
    }

    /// Run every suite, stopping after a suite with a failing case unless
    /// the configuration continues on failure.
    ///
    /// A cleanup failure aborts the run with [`QcError::Aborted`], which
    /// carries the results gathered so far.
    pub fn run_with_observer(
        &mut self,
        config: &RunConfiguration,
        observer: &mut dyn RunObserver,
    ) -> Result<GlobalResult> {
        let mut result = GlobalResult {
            suites_registered: self.suites.len(),
            ..GlobalResult::default()
        };

        for suite in self.suites.iter_mut() {
            result.add_case_count(suite.case_count());
            observer.on_suite_start(suite.name());

            let (suite_result, cleanup) = suite.execute(config, self.probe.as_ref(), observer);
            observer.on_suite_finish(&suite_result);
            tracing::info!(
                suite = %suite_result.suite_name,
                passed = suite_result.success_count,
                failed = suite_result.failure_count,
                "suite finished"
            );

            let failed = suite_result.is_failed();
            result.consume(suite_result);
            if let Err(e) = cleanup {
                tracing::error!(suite = %suite.name(), "{}", e);
                return Err(QcError::Aborted {
                    partial: Box::new(result),
                    source: Box::new(e),
                });
            }
            if failed && !config.continue_on_failure {
                tracing::info!(suite = %suite.name(), "stopping run after failing suite");
                break;
            }
        }

        observer.on_run_finish(&result);
        Ok(result)
    }
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("suites", &self.suites)
            .finish_non_exhaustive()
    }
}
