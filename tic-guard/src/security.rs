//! Identifier validation for the external formats.
//!
//! Table and field names come from user-defined schemas and end up inside
//! SQL statements and workbook sheet names, so they are validated and
//! escaped here before any writer uses them.

use crate::error::{Result, TicDatError};
use once_cell::sync::Lazy;
use regex::Regex;

/// Longest identifier accepted in SQL statements.
pub const MAX_IDENTIFIER_LENGTH: usize = 128;
/// Longest sheet name a workbook accepts.
pub const MAX_SHEET_NAME_LENGTH: usize = 31;

/// SQL identifier validation and escaping utilities.
pub struct SqlSecurity;

impl SqlSecurity {
    /// Validates and quotes a SQL identifier (table or column name).
    ///
    /// Field names such as `Player Name` contain spaces, so identifiers are
    /// always emitted double-quoted with inner quotes doubled.
    ///
    /// # Examples
    /// ```rust
    /// use tic_guard::security::SqlSecurity;
    ///
    /// assert_eq!(SqlSecurity::escape_identifier("Player Name").unwrap(), "\"Player Name\"");
    /// assert!(SqlSecurity::escape_identifier("id; DROP TABLE players--").is_err());
    /// assert!(SqlSecurity::escape_identifier(&"very_long_name_".repeat(100)).is_err());
    /// ```
    pub fn escape_identifier(identifier: &str) -> Result<String> {
        Self::validate_identifier(identifier)?;
        let escaped = identifier.replace('"', "\"\"");
        Ok(format!("\"{escaped}\""))
    }

    /// Validates a SQL identifier without quoting it.
    pub fn validate_identifier(identifier: &str) -> Result<()> {
        if identifier.trim().is_empty() {
            return Err(TicDatError::SecurityError(
                "SQL identifier cannot be empty or whitespace-only".to_string(),
            ));
        }
        if identifier.len() > MAX_IDENTIFIER_LENGTH {
            return Err(TicDatError::SecurityError(format!(
                "SQL identifier too long (max {MAX_IDENTIFIER_LENGTH} characters)"
            )));
        }
        InputValidator::validate_no_null_bytes(identifier, "SQL identifier")?;

        // Letters or underscore first, then letters, digits, `_`, space, `-` and `.`
        static IDENTIFIER_REGEX: Lazy<Regex> = Lazy::new(|| {
            #[allow(clippy::expect_used)]
            Regex::new(r"^[\p{L}_][\p{L}\p{N}_ .\-]*$")
                .expect("Hard-coded regex pattern should be valid")
        });
        if !IDENTIFIER_REGEX.is_match(identifier) {
            return Err(TicDatError::SecurityError(format!(
                "Invalid SQL identifier format: '{identifier}'. Identifiers must start with a letter or underscore and contain only letters, numbers, spaces, underscores, hyphens and dots"
            )));
        }
        Self::check_dangerous_patterns(identifier)
    }

    fn check_dangerous_patterns(identifier: &str) -> Result<()> {
        const PATTERNS: [&str; 3] = ["--", "/*", "*/"];
        if let Some(pattern) = PATTERNS.iter().find(|p| identifier.contains(*p)) {
            return Err(TicDatError::SecurityError(format!(
                "SQL identifier contains dangerous pattern '{pattern}'"
            )));
        }
        Ok(())
    }
}

/// Input validation utilities.
pub struct InputValidator;

impl InputValidator {
    /// Validates that a string doesn't contain null bytes.
    pub fn validate_no_null_bytes(value: &str, name: &str) -> Result<()> {
        if value.contains('\0') {
            return Err(TicDatError::SecurityError(format!(
                "{name} cannot contain null bytes"
            )));
        }
        Ok(())
    }

    /// Validates a workbook sheet name.
    pub fn validate_sheet_name(name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(TicDatError::SecurityError("sheet names cannot be empty".to_string()));
        }
        if name.chars().count() > MAX_SHEET_NAME_LENGTH {
            return Err(TicDatError::SecurityError(format!(
                "table '{name}' is too long to be a sheet name (max {MAX_SHEET_NAME_LENGTH} characters)"
            )));
        }
        if let Some(c) = name.chars().find(|c| matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\')) {
            return Err(TicDatError::SecurityError(format!(
                "sheet name '{name}' contains forbidden character '{c}'"
            )));
        }
        if name.starts_with('\'') || name.ends_with('\'') {
            return Err(TicDatError::SecurityError(format!(
                "sheet name '{name}' cannot start or end with an apostrophe"
            )));
        }
        Ok(())
    }
}
