//! Error types for the draft optimizer.

use thiserror::Error;
use tic_guard::error::TicDatError;
use tic_guard::validation::ValidationReport;

/// Errors returned by [`solve`](crate::solve).
///
/// An infeasible draft is not an error: `solve` returns `Ok(None)` for it.
#[derive(Error, Debug)]
pub enum FantopError {
    /// The input data breaks the schema, a foreign key or a data type, or
    /// the drafted positions are not `1..=N`.
    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
        /// Every problem found, when the input was validated
        report: Option<Box<ValidationReport>>,
    },

    /// Error from the underlying data library.
    #[error(transparent)]
    Data(#[from] TicDatError),

    /// The solver failed for a reason other than infeasibility.
    #[error("Solver error: {0}")]
    Solver(String),

    /// An internal invariant did not hold.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FantopError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            report: None,
        }
    }

    pub fn invalid_report(report: ValidationReport) -> Self {
        let errors = report.issues_by_level(tic_guard::validation::Level::Error).len();
        Self::InvalidInput {
            message: format!("validation found {errors} error(s)"),
            report: Some(Box::new(report)),
        }
    }

    /// The validation report, when the input failed validation.
    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            Self::InvalidInput { report, .. } => report.as_deref(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, FantopError>;
