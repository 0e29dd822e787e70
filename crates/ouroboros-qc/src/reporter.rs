//! Test reporter - renders a finished run in various formats

use crate::config::{Header, RunConfiguration};
use crate::error::{QcError, Result};
use crate::runner::{GlobalResult, RunObserver};
use crate::suite::SuiteResult;
use crate::test_case::TestCaseResult;
use serde::{Deserialize, Serialize};
use std::fmt::Write as FmtWrite;
use std::io::Write as IoWrite;

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Console format (banner + per-suite tree)
    #[default]
    Console,
    /// JSON format (machine-parseable)
    Json,
    /// YAML format (human-readable, machine-parseable)
    Yaml,
    /// JUnit XML format (CI integration)
    JUnit,
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportFormat::Console => write!(f, "console"),
            ReportFormat::Json => write!(f, "json"),
            ReportFormat::Yaml => write!(f, "yaml"),
            ReportFormat::JUnit => write!(f, "junit"),
        }
    }
}

impl std::str::FromStr for ReportFormat {
    type Err = QcError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "console" | "text" => Ok(ReportFormat::Console),
            "json" => Ok(ReportFormat::Json),
            "yaml" | "yml" => Ok(ReportFormat::Yaml),
            "junit" | "xml" => Ok(ReportFormat::JUnit),
            _ => Err(QcError::Config(format!(
                "Unknown report format: {}. Use console, json, yaml or junit.",
                s
            ))),
        }
    }
}

/// Environment information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentInfo {
    /// Operating system
    pub platform: String,
    /// CPU architecture
    pub arch: String,
    /// Process id of the run
    pub pid: u32,
}

impl EnvironmentInfo {
    pub fn current() -> Self {
        Self {
            platform: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            pid: std::process::id(),
        }
    }
}

/// A finished run plus report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestReport {
    /// Report title
    pub title: String,
    /// Report generation timestamp
    pub generated_at: String,
    /// Whether no suite failed
    pub success: bool,
    /// Whether every registered case executed
    pub complete: bool,
    /// Run results
    pub result: GlobalResult,
    /// Environment info
    pub environment: EnvironmentInfo,
}

impl TestReport {
    pub fn new(title: impl Into<String>, result: GlobalResult) -> Self {
        Self {
            title: title.into(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            success: result.overall_success(),
            complete: result.is_complete(),
            result,
            environment: EnvironmentInfo::current(),
        }
    }

    /// Sum of the elapsed time of every executed case (ms)
    pub fn total_elapsed_ms(&self) -> i64 {
        self.result
            .suite_results
            .iter()
            .flat_map(|s| s.case_results.iter())
            .map(|c| c.measurement.elapsed_ms)
            .sum()
    }
}

/// Test reporter - generates reports in various formats
#[derive(Debug, Clone, Copy)]
pub struct Reporter {
    format: ReportFormat,
    color: bool,
}

impl Reporter {
    /// Create a new reporter with specified format
    pub fn new(format: ReportFormat) -> Self {
        Self { format, color: false }
    }

    /// Create console reporter
    pub fn console() -> Self {
        Self::new(ReportFormat::Console)
    }

    /// Create JSON reporter
    pub fn json() -> Self {
        Self::new(ReportFormat::Json)
    }

    /// Create YAML reporter
    pub fn yaml() -> Self {
        Self::new(ReportFormat::Yaml)
    }

    /// Create JUnit reporter
    pub fn junit() -> Self {
        Self::new(ReportFormat::JUnit)
    }

    /// Enable ANSI colors (console format only)
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn format(&self) -> ReportFormat {
        self.format
    }

    /// Generate report string
    pub fn generate(&self, report: &TestReport) -> Result<String> {
        match self.format {
            ReportFormat::Console => self.generate_console(report),
            ReportFormat::Json => Ok(serde_json::to_string_pretty(report)?),
            ReportFormat::Yaml => Ok(serde_yaml::to_string(report)?),
            ReportFormat::JUnit => self.generate_junit(report),
        }
    }

    /// Generate Console report
    fn generate_console(&self, report: &TestReport) -> Result<String> {
        let (reset, green, red, dim) = if self.color {
            ("\x1b[0m", "\x1b[32m", "\x1b[31m", "\x1b[2m")
        } else {
            ("", "", "", "")
        };
        let result = &report.result;
        let mut output = String::new();

        writeln!(output, "{} Result {}", "/".repeat(46), "\\".repeat(46))?;

        for suite in &result.suite_results {
            match suite.init_result {
                Some(ref init) if !init.passed => writeln!(
                    output,
                    " - {} : {}Initialization failed{} ({})",
                    suite.suite_name,
                    red,
                    reset,
                    init.debug_string()
                )?,
                _ => writeln!(output, " - {}", suite.suite_name)?,
            }

            for case in &suite.case_results {
                let (status, color) = if case.passed { ("SUCCESS", green) } else { ("FAILURE", red) };
                writeln!(
                    output,
                    "     * {} : {}{}{} {}({}){}",
                    case.name,
                    color,
                    status,
                    reset,
                    dim,
                    case.debug_string(),
                    reset
                )?;
                if let Some(ref failure) = case.failure {
                    writeln!(output, "         {}-> {}{}", dim, failure, reset)?;
                }
            }
        }

        writeln!(output, "{}", summary_line(result))?;
        Ok(output)
    }

    /// Generate JUnit XML report (for CI integration)
    fn generate_junit(&self, report: &TestReport) -> Result<String> {
        let result = &report.result;
        let mut output = String::new();

        writeln!(output, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
        writeln!(
            output,
            "<testsuites name=\"{}\" tests=\"{}\" failures=\"{}\" time=\"{:.3}\" timestamp=\"{}\">",
            escape_xml(&report.title),
            result.total_cases_executed,
            result.total_failures,
            report.total_elapsed_ms() as f64 / 1000.0,
            report.generated_at
        )?;

        for suite in &result.suite_results {
            write_junit_suite(&mut output, suite)?;
        }

        writeln!(output, "</testsuites>")?;
        Ok(output)
    }

    /// Generate the report and write it to `writer`
    pub fn write_to(&self, report: &TestReport, writer: &mut dyn IoWrite) -> Result<()> {
        let content = self.generate(report)?;
        writer
            .write_all(content.as_bytes())
            .map_err(|e| QcError::Report(format!("failed to write report: {}", e)))
    }
}

fn write_junit_suite(output: &mut String, suite: &SuiteResult) -> Result<()> {
    let init_failed = !suite.init_passed();
    let elapsed: i64 = suite.case_results.iter().map(|c| c.measurement.elapsed_ms).sum();
    writeln!(
        output,
        "  <testsuite name=\"{}\" tests=\"{}\" failures=\"{}\" errors=\"{}\" skipped=\"{}\" time=\"{:.3}\">",
        escape_xml(&suite.suite_name),
        suite.registered_cases,
        suite.failure_count,
        usize::from(init_failed),
        suite.registered_cases - suite.executed_count(),
        elapsed as f64 / 1000.0
    )?;

    if let Some(ref init) = suite.init_result {
        if init_failed {
            write_junit_case(output, &suite.suite_name, init, "error")?;
        }
    }
    for case in &suite.case_results {
        write_junit_case(output, &suite.suite_name, case, "failure")?;
    }

    writeln!(output, "  </testsuite>")?;
    Ok(())
}

fn write_junit_case(
    output: &mut String,
    suite_name: &str,
    case: &TestCaseResult,
    failure_tag: &str,
) -> Result<()> {
    writeln!(
        output,
        "    <testcase name=\"{}\" classname=\"{}\" time=\"{:.3}\">",
        escape_xml(&case.name),
        escape_xml(suite_name),
        case.measurement.elapsed_ms as f64 / 1000.0
    )?;
    if let Some(ref failure) = case.failure {
        writeln!(
            output,
            "      <{} type=\"{}\" message=\"{}\" />",
            failure_tag,
            failure.kind,
            escape_xml(&failure.message)
        )?;
    }
    writeln!(output, "      <system-out>{}</system-out>", escape_xml(&case.debug_string()))?;
    writeln!(output, "    </testcase>")?;
    Ok(())
}

/// One-line verdict of a run
pub fn summary_line(result: &GlobalResult) -> String {
    if !result.is_complete() {
        format!(
            "Not all tests were executed: {} test case(s) failed within {} unit test(s) ({} of {} test cases executed)",
            result.total_failures,
            result.suites_failed,
            result.total_cases_executed,
            result.total_cases_registered
        )
    } else if !result.overall_success() {
        format!(
            "All tests executed but {} test case(s) failed within {} unit test(s)",
            result.total_failures, result.suites_failed
        )
    } else {
        format!(
            "All tests executed with success ({} test cases executed within {} unit tests)",
            result.total_cases_executed,
            result.suite_results.len()
        )
    }
}

/// Escape XML special characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Prints suite and test case banners while a run is in progress
pub struct ConsoleObserver<W: IoWrite> {
    writer: W,
    unit_test_header: Header,
    test_case_header: Header,
}

impl ConsoleObserver<std::io::Stdout> {
    /// Observer printing to stdout
    pub fn stdout(config: &RunConfiguration) -> Self {
        Self::new(std::io::stdout(), config)
    }
}

impl<W: IoWrite> ConsoleObserver<W> {
    pub fn new(writer: W, config: &RunConfiguration) -> Self {
        Self {
            writer,
            unit_test_header: config.unit_test_header,
            test_case_header: config.test_case_header,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn print(&mut self, line: &str) {
        if let Err(e) = writeln!(self.writer, "{}", line) {
            tracing::warn!("failed to write progress line: {}", e);
        }
    }
}

impl<W: IoWrite> RunObserver for ConsoleObserver<W> {
    fn on_suite_start(&mut self, suite: &str) {
        let line = self.unit_test_header.render(suite);
        self.print(&line);
    }

    fn on_case_start(&mut self, _suite: &str, case: &str) {
        let line = self.test_case_header.render(case);
        self.print(&line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertions::assert_that;
    use crate::runner::Runner;
    use crate::suite::UnitTest;

    fn sample_result(continue_on_failure: bool) -> GlobalResult {
        let mut runner = Runner::new();
        runner.add_suite(
            UnitTest::builder("Math")
                .continue_on_failure(true)
                .case("add ok", || 1 + 1 == 2)
                .case("div by zero", || assert_that(false, "division by zero"))
                .build()
                .unwrap(),
        );
        runner.add_suite(
            UnitTest::builder("Strings")
                .init(|| false)
                .case("concat", || true)
                .build()
                .unwrap(),
        );
        let config = RunConfiguration::default().with_continue_on_failure(continue_on_failure);
        runner.run(&config).unwrap()
    }

    #[test]
    fn test_report_creation() {
        let report = TestReport::new("ouroboros", sample_result(true));
        assert!(!report.success);
        assert!(!report.complete);
        assert_eq!(report.result.suite_results.len(), 2);
        assert!(report.total_elapsed_ms() >= 0);
    }

    #[test]
    fn test_console_generation() {
        let report = TestReport::new("ouroboros", sample_result(true));
        let text = Reporter::console().generate(&report).unwrap();

        assert!(text.contains(" Result "));
        assert!(text.contains(" - Math\n"));
        assert!(text.contains("     * add ok : SUCCESS (time: "));
        assert!(text.contains("     * div by zero : FAILURE"));
        assert!(text.contains("-> assertion: division by zero"));
        assert!(text.contains(" - Strings : Initialization failed"));
        assert!(text.contains("Not all tests were executed"));
        assert!(!text.contains('\x1b'));

        let colored = Reporter::console().with_color(true).generate(&report).unwrap();
        assert!(colored.contains("\x1b[31mFAILURE"));
    }

    #[test]
    fn test_summary_lines() {
        let stopped = sample_result(false);
        assert_eq!(stopped.suite_results.len(), 1);
        assert!(summary_line(&stopped).starts_with("Not all tests were executed"));

        let mut runner = Runner::new();
        runner.add_suite(
            UnitTest::builder("Flaky")
                .continue_on_failure(true)
                .case("a", || false)
                .case("b", || true)
                .build()
                .unwrap(),
        );
        let failed = runner.run(&RunConfiguration::default()).unwrap();
        assert_eq!(
            summary_line(&failed),
            "All tests executed but 1 test case(s) failed within 1 unit test(s)"
        );

        let mut runner = Runner::new();
        runner.add_suite(UnitTest::builder("Ok").case("a", || true).build().unwrap());
        let passed = runner.run(&RunConfiguration::default()).unwrap();
        assert_eq!(
            summary_line(&passed),
            "All tests executed with success (1 test cases executed within 1 unit tests)"
        );
    }

    #[test]
    fn test_json_generation() {
        let report = TestReport::new("JsonRun", sample_result(true));
        let json = Reporter::json().generate(&report).unwrap();

        assert!(json.contains("\"title\": \"JsonRun\""));
        assert!(json.contains("\"div by zero\""));
        assert!(json.contains("\"kind\": \"assertion\""));

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        // Strings only failed its init
        assert_eq!(parsed["result"]["suites_failed"], 1);
        assert_eq!(parsed["result"]["suites_passed"], 1);
    }

    #[test]
    fn test_yaml_generation() {
        let report = TestReport::new("YamlRun", sample_result(true));
        let yaml = Reporter::yaml().generate(&report).unwrap();
        assert!(yaml.contains("title: YamlRun"));
        assert!(yaml.contains("suite_name: Math"));
    }

    #[test]
    fn test_junit_generation() {
        let report = TestReport::new("JUnitRun", sample_result(true));
        let xml = Reporter::junit().generate(&report).unwrap();

        assert!(xml.contains("<testsuites"));
        assert!(xml.contains("<testsuite name=\"Math\" tests=\"2\" failures=\"1\""));
        assert!(xml.contains("<failure type=\"assertion\" message=\"division by zero\""));
        assert!(xml.contains("<testsuite name=\"Strings\" tests=\"1\" failures=\"0\" errors=\"1\" skipped=\"1\""));
        assert!(xml.contains("<testcase name=\"Init\" classname=\"Strings\""));
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("JSON".parse::<ReportFormat>().unwrap(), ReportFormat::Json);
        assert_eq!("xml".parse::<ReportFormat>().unwrap(), ReportFormat::JUnit);
        assert!("html".parse::<ReportFormat>().is_err());
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("<test>"), "&lt;test&gt;");
        assert_eq!(escape_xml("a & b"), "a &amp; b");
        assert_eq!(escape_xml("\"quoted\""), "&quot;quoted&quot;");
    }

    #[test]
    fn test_console_observer_headers() {
        let config = RunConfiguration {
            continue_on_failure: true,
            test_case_header: Header::new(12, '-'),
            unit_test_header: Header::new(12, '='),
        };
        let mut runner = Runner::new();
        runner.add_suite(UnitTest::builder("Math").case("add", || true).build().unwrap());

        let mut observer = ConsoleObserver::new(Vec::new(), &config);
        runner.run_with_observer(&config, &mut observer).unwrap();

        let printed = String::from_utf8(observer.into_inner()).unwrap();
        assert_eq!(printed, "=== Math ===\n--- add ----\n");
    }
}
