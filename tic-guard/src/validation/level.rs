//! Issue severity levels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The severity of a validation issue.
///
/// Levels are ordered by severity: Error > Warning > Info.
///
/// - **Error**: the data violates a declared constraint (bad value,
///   dangling foreign key, mismatched structure)
/// - **Warning**: the data loaded but something was lost or ignored
///   (duplicate primary keys in a source)
/// - **Info**: observations that need no action
///
/// ```rust
/// use tic_guard::validation::Level;
///
/// assert!(Level::Error > Level::Warning);
/// assert!(Level::Warning > Level::Info);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info = 0,
    #[default]
    Warning = 1,
    Error = 2,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Error => "error",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
