//! Rendering of validation reports.
//!
//! Two formatters are provided: [`HumanFormatter`] for terminals and logs
//! and [`JsonFormatter`] for other tools.
//!
//! # Examples
//!
//! ```rust
//! use tic_guard::formatters::{FormatterConfig, HumanFormatter, ResultFormatter};
//! use tic_guard::validation::ValidationReport;
//!
//! let report = ValidationReport::new();
//! let formatter = HumanFormatter::with_config(FormatterConfig::default().with_colors(false));
//! let output = formatter.format(&report).unwrap();
//! assert!(output.contains("Validation PASSED"));
//! ```

use crate::error::{Result, TicDatError};
use crate::validation::{Level, ValidationIssue, ValidationReport};
use std::fmt::{self, Write};

/// Configuration options for formatting validation reports.
#[derive(Debug, Clone)]
pub struct FormatterConfig {
    /// Include the metrics summary
    pub include_metrics: bool,
    /// Include individual issue details
    pub include_issues: bool,
    /// Include offending keys and values of each issue
    pub include_values: bool,
    /// Maximum number of issues to display (-1 for all)
    pub max_issues: i32,
    /// Maximum number of keys or values listed per issue
    pub max_values: usize,
    /// Whether to use colorized output (for human formatter)
    pub use_colors: bool,
    /// Whether to include timestamps in output
    pub include_timestamps: bool,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            include_metrics: true,
            include_issues: true,
            include_values: true,
            max_issues: -1,
            max_values: 10,
            use_colors: true,
            include_timestamps: true,
        }
    }
}

impl FormatterConfig {
    /// Only the summary.
    pub fn minimal() -> Self {
        Self {
            include_metrics: true,
            include_issues: false,
            include_values: false,
            max_issues: 0,
            max_values: 0,
            use_colors: false,
            include_timestamps: false,
        }
    }

    /// Plain output with a bounded number of issues.
    pub fn ci() -> Self {
        Self {
            max_issues: 50,
            use_colors: false,
            ..Self::default()
        }
    }

    pub fn with_metrics(mut self, include: bool) -> Self {
        self.include_metrics = include;
        self
    }

    pub fn with_issues(mut self, include: bool) -> Self {
        self.include_issues = include;
        self
    }

    pub fn with_values(mut self, include: bool) -> Self {
        self.include_values = include;
        self
    }

    pub fn with_max_issues(mut self, max: i32) -> Self {
        self.max_issues = max;
        self
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    fn shown_issues<'a>(&self, report: &'a ValidationReport) -> &'a [ValidationIssue] {
        if !self.include_issues {
            &[]
        } else if self.max_issues < 0 {
            &report.issues
        } else {
            let max = self.max_issues as usize;
            &report.issues[..max.min(report.issues.len())]
        }
    }
}

/// Converts a validation report into a textual representation.
///
/// ```rust
/// use tic_guard::formatters::ResultFormatter;
/// use tic_guard::validation::ValidationReport;
///
/// struct OneLine;
///
/// impl ResultFormatter for OneLine {
///     fn format(&self, report: &ValidationReport) -> tic_guard::error::Result<String> {
///         Ok(format!("{} issue(s)", report.issues.len()))
///     }
/// }
/// ```
pub trait ResultFormatter {
    fn format(&self, report: &ValidationReport) -> Result<String>;

    /// Formats with an explicit configuration. The default ignores it.
    fn format_with_config(&self, report: &ValidationReport, _config: &FormatterConfig) -> Result<String> {
        self.format(report)
    }
}

/// Formats validation reports as structured JSON.
#[derive(Debug, Clone)]
pub struct JsonFormatter {
    config: FormatterConfig,
    pretty: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
            pretty: true,
        }
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self { config, pretty: true }
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultFormatter for JsonFormatter {
    fn format(&self, report: &ValidationReport) -> Result<String> {
        self.format_with_config(report, &self.config)
    }

    fn format_with_config(&self, report: &ValidationReport, config: &FormatterConfig) -> Result<String> {
        let filtered = filter_report(report, config);
        let rendered = if self.pretty {
            serde_json::to_string_pretty(&filtered)
        } else {
            serde_json::to_string(&filtered)
        };
        rendered.map_err(|e| TicDatError::Internal(format!("Failed to serialize report to JSON: {e}")))
    }
}

/// Formats validation reports for people reading a terminal.
#[derive(Debug, Clone, Default)]
pub struct HumanFormatter {
    config: FormatterConfig,
}

impl HumanFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self { config }
    }

    fn render(&self, out: &mut String, report: &ValidationReport, config: &FormatterConfig) -> fmt::Result {
        writeln!(out)?;
        match (report.is_success(), config.use_colors) {
            (true, true) => writeln!(out, "✅ \x1b[32mValidation PASSED\x1b[0m")?,
            (true, false) => writeln!(out, "✅ Validation PASSED")?,
            (false, true) => writeln!(out, "❌ \x1b[31mValidation FAILED\x1b[0m")?,
            (false, false) => writeln!(out, "❌ Validation FAILED")?,
        }
        if config.include_timestamps {
            writeln!(out, "Timestamp: {}", report.timestamp)?;
        }

        if config.include_metrics {
            let m = &report.metrics;
            writeln!(out)?;
            writeln!(out, "📊 Summary:")?;
            writeln!(out, "   Tables Checked: {}", m.tables_checked)?;
            writeln!(out, "   Rows Checked: {}", m.rows_checked)?;
            writeln!(out, "   Data Type Failures: {}", m.data_type_failures)?;
            writeln!(out, "   Foreign Key Failures: {}", m.foreign_key_failures)?;
            writeln!(out, "   Duplicate Keys: {}", m.duplicate_keys)?;
            writeln!(out, "   Execution Time: {}ms", m.execution_time_ms)?;
        }

        let shown = config.shown_issues(report);
        if !shown.is_empty() {
            writeln!(out)?;
            writeln!(out, "🔍 Issues Found:")?;
            for (i, issue) in shown.iter().enumerate() {
                writeln!(out)?;
                writeln!(
                    out,
                    "   {} Issue #{}: {}",
                    level_symbol(issue.level, config.use_colors),
                    i + 1,
                    issue.constraint
                )?;
                writeln!(out, "      Table: {}", issue.table)?;
                writeln!(out, "      Level: {}", issue.level)?;
                writeln!(out, "      Message: {}", issue.message)?;
                if config.include_values {
                    write_list(out, "Keys", &issue.primary_keys, config.max_values)?;
                    write_list(out, "Values", &issue.bad_values, config.max_values)?;
                }
            }
            if report.issues.len() > shown.len() {
                writeln!(out)?;
                writeln!(
                    out,
                    "   ... and {} more issues",
                    report.issues.len() - shown.len()
                )?;
            }
        }
        writeln!(out)
    }
}

impl ResultFormatter for HumanFormatter {
    fn format(&self, report: &ValidationReport) -> Result<String> {
        self.format_with_config(report, &self.config)
    }

    fn format_with_config(&self, report: &ValidationReport, config: &FormatterConfig) -> Result<String> {
        let mut output = String::new();
        self.render(&mut output, report, config)
            .map_err(|e| TicDatError::Internal(format!("Failed to render report: {e}")))?;
        Ok(output)
    }
}

fn level_symbol(level: Level, colors: bool) -> &'static str {
    match (level, colors) {
        (Level::Error, true) => "\x1b[31m🚨\x1b[0m",
        (Level::Error, false) => "🚨",
        (Level::Warning, true) => "\x1b[33m⚠️\x1b[0m",
        (Level::Warning, false) => "⚠️",
        (Level::Info, true) => "\x1b[34mℹ️\x1b[0m",
        (Level::Info, false) => "ℹ️",
    }
}

fn write_list(out: &mut String, label: &str, items: &[String], max: usize) -> fmt::Result {
    if items.is_empty() || max == 0 {
        return Ok(());
    }
    let shown = &items[..max.min(items.len())];
    write!(out, "      {label}: {}", shown.join(", "))?;
    if items.len() > shown.len() {
        write!(out, " (+{} more)", items.len() - shown.len())?;
    }
    writeln!(out)
}

fn filter_report(report: &ValidationReport, config: &FormatterConfig) -> ValidationReport {
    let mut filtered = report.clone();
    filtered.issues = config.shown_issues(report).to_vec();
    if !config.include_values {
        for issue in &mut filtered.issues {
            issue.primary_keys.clear();
            issue.bad_values.clear();
        }
    } else {
        for issue in &mut filtered.issues {
            issue.primary_keys.truncate(config.max_values);
            issue.bad_values.truncate(config.max_values);
        }
    }
    if !config.include_timestamps {
        filtered.timestamp = String::new();
    }
    filtered
}
