//! ouroboros-qc: class-driven unit test engine
//!
//! Registers suites of test cases with optional init/cleanup hooks, runs
//! them sequentially in registration order, measures each case (wall time,
//! processor time, memory delta) and aggregates the results into a
//! [`GlobalResult`] that reporters render.
//!
//! # Example
//!
//! ```rust
//! use ouroboros_qc::{assert_that, RunConfiguration, Runner, UnitTest};
//!
//! let math = UnitTest::builder("Math")
//!     .continue_on_failure(true)
//!     .case("add ok", || 1 + 1 == 2)
//!     .case("div by zero", || assert_that(false, "division by zero"))
//!     .build()
//!     .unwrap();
//!
//! let mut runner = Runner::new();
//! runner.add_suite(math);
//!
//! let result = runner.run(&RunConfiguration::default()).unwrap();
//! assert_eq!(result.total_failures, 1);
//! assert!(!result.overall_success());
//! assert!(result.is_complete());
//! ```

pub mod assertions;
pub mod cli;
pub mod config;
pub mod error;
pub mod outcome;
pub mod probe;
pub mod registry;
pub mod reporter;
pub mod runner;
pub mod suite;
pub mod test_case;

// Re-export main types
pub use assertions::{assert_that, dump_and_compare, expect, AssertionError, AssertionResult, Expectation};
pub use config::{Header, RunConfiguration};
pub use error::{QcError, Result};
pub use outcome::{Failure, FailureKind, IntoOutcome, OperationResult, Outcome};
pub use probe::{measure, MeasurementRecord, MetricsProbe, ProbeSnapshot, ProcessProbe};
pub use registry::{ClassRegistry, UnitTestClass};
pub use reporter::{ConsoleObserver, ReportFormat, Reporter, TestReport};
pub use runner::{GlobalResult, NoopObserver, RunObserver, Runner};
pub use suite::{SuiteResult, SuiteState, UnitTest, UnitTestBuilder};
pub use test_case::{TestCase, TestCaseResult};
