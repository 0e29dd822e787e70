//! Run configuration
//!
//! Loaded from a TOML file such as:
//!
//! ```toml
//! continue_on_failure = false
//!
//! [test_case_header]
//! size = 60
//! filler = "-"
//!
//! [unit_test_header]
//! size = 60
//! filler = "="
//! ```

use crate::error::{QcError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Banner printed above a suite or a test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Total banner width
    pub size: usize,
    /// Fill character on both sides of the title
    pub filler: char,
}

impl Header {
    pub const fn new(size: usize, filler: char) -> Self {
        Self { size, filler }
    }

    /// Center `title` inside the banner.
    ///
    /// Titles wider than the banner get no filler at all.
    pub fn render(&self, title: &str) -> String {
        let title_len = title.chars().count() + 2;
        let first = self.size.saturating_sub(title_len) / 2;
        let second = self.size.saturating_sub(first + title_len);
        let filler = self.filler.to_string();
        format!("{} {} {}", filler.repeat(first), title, filler.repeat(second))
    }
}

fn default_test_case_header() -> Header {
    Header::new(50, '-')
}

fn default_unit_test_header() -> Header {
    Header::new(50, '=')
}

fn default_continue_on_failure() -> bool {
    true
}

/// Configuration of a test run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfiguration {
    /// Keep going after a failure (also requires the suite's own flag)
    #[serde(default = "default_continue_on_failure")]
    pub continue_on_failure: bool,
    /// Banner printed before each test case
    #[serde(default = "default_test_case_header")]
    pub test_case_header: Header,
    /// Banner printed before each suite
    #[serde(default = "default_unit_test_header")]
    pub unit_test_header: Header,
}

impl Default for RunConfiguration {
    fn default() -> Self {
        Self {
            continue_on_failure: default_continue_on_failure(),
            test_case_header: default_test_case_header(),
            unit_test_header: default_unit_test_header(),
        }
    }
}

impl RunConfiguration {
    /// Set the global continue-on-failure flag
    pub fn with_continue_on_failure(mut self, continue_on_failure: bool) -> Self {
        self.continue_on_failure = continue_on_failure;
        self
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| QcError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        for (label, header) in [
            ("test_case_header", &self.test_case_header),
            ("unit_test_header", &self.unit_test_header),
        ] {
            if header.size == 0 {
                return Err(QcError::Config(format!("{}.size must be greater than 0", label)));
            }
            if header.filler.is_control() {
                return Err(QcError::Config(format!("{}.filler must be printable", label)));
            }
        }
        Ok(())
    }
}
