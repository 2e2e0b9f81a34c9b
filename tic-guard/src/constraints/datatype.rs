//! Field value domains.
//!
//! A [`DataType`] describes which values a single field may hold. A value is
//! valid when it fits at least one of the enabled domains:
//!
//! - a number inside the interval (optionally integer-only),
//! - a string accepted by [`StringsAllowed`],
//! - `Null`, when the field is nullable.
//!
//! # Examples
//!
//! ```rust
//! use tic_guard::constraints::DataType;
//! use tic_guard::core::Value;
//!
//! // Positive integers
//! let draft_position = DataType::number()
//!     .with_min(0.0, false)
//!     .with_max(f64::INFINITY, false)
//!     .integer_only();
//! assert!(draft_position.valid(&Value::from(3)));
//! assert!(!draft_position.valid(&Value::from(0)));
//! assert!(!draft_position.valid(&Value::from(2.5)));
//!
//! // An enumerated set of labels
//! let flex = DataType::strings(["Flex Eligible", "Flex Ineligible"]);
//! assert!(flex.valid(&Value::from("Flex Eligible")));
//! assert!(!flex.valid(&Value::from(1)));
//! ```

use crate::core::Value;
use crate::error::{Result, TicDatError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Which strings a field accepts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StringsAllowed {
    /// No string is valid.
    #[default]
    None,
    /// Every string is valid.
    Any,
    /// Only the listed strings are valid.
    Only(BTreeSet<String>),
}

impl StringsAllowed {
    fn allows(&self, s: &str) -> bool {
        match self {
            StringsAllowed::None => false,
            StringsAllowed::Any => true,
            StringsAllowed::Only(set) => set.contains(s),
        }
    }

    fn is_none(&self) -> bool {
        matches!(self, StringsAllowed::None)
    }
}

/// The value domain of one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataType {
    pub number_allowed: bool,
    pub min: f64,
    pub max: f64,
    pub inclusive_min: bool,
    pub inclusive_max: bool,
    pub must_be_int: bool,
    pub strings_allowed: StringsAllowed,
    pub nullable: bool,
}

impl Default for DataType {
    /// Non-negative numbers: `[0, +inf)`, no strings, not nullable.
    fn default() -> Self {
        Self {
            number_allowed: true,
            min: 0.0,
            max: f64::INFINITY,
            inclusive_min: true,
            inclusive_max: false,
            must_be_int: false,
            strings_allowed: StringsAllowed::None,
            nullable: false,
        }
    }
}

impl DataType {
    /// Numbers in `[0, +inf)`; narrow it with the `with_*` methods.
    pub fn number() -> Self {
        Self::default()
    }

    /// Any finite or infinite number.
    pub fn any_number() -> Self {
        Self::default()
            .with_min(f64::NEG_INFINITY, true)
            .with_max(f64::INFINITY, true)
    }

    /// Only the listed strings; numbers are rejected.
    pub fn strings<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            number_allowed: false,
            strings_allowed: StringsAllowed::Only(allowed.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Any string; numbers are rejected.
    pub fn any_string() -> Self {
        Self {
            number_allowed: false,
            strings_allowed: StringsAllowed::Any,
            ..Self::default()
        }
    }

    pub fn with_min(mut self, min: f64, inclusive: bool) -> Self {
        self.min = min;
        self.inclusive_min = inclusive;
        self
    }

    pub fn with_max(mut self, max: f64, inclusive: bool) -> Self {
        self.max = max;
        self.inclusive_max = inclusive;
        self
    }

    pub fn integer_only(mut self) -> Self {
        self.must_be_int = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn with_strings(mut self, strings_allowed: StringsAllowed) -> Self {
        self.strings_allowed = strings_allowed;
        self
    }

    /// Rejects domains that can never hold anything sensible.
    pub fn check(&self) -> Result<()> {
        if !self.number_allowed && self.strings_allowed.is_none() && !self.nullable {
            return Err(TicDatError::schema(
                "data type must allow numbers, strings or nulls",
            ));
        }
        if self.number_allowed {
            if self.min.is_nan() || self.max.is_nan() {
                return Err(TicDatError::schema("data type bounds cannot be NaN"));
            }
            if self.min > self.max {
                return Err(TicDatError::schema(format!(
                    "data type min {} exceeds max {}",
                    self.min, self.max
                )));
            }
            if self.min == f64::INFINITY || self.max == f64::NEG_INFINITY {
                return Err(TicDatError::schema(
                    "data type interval cannot start at +inf or end at -inf",
                ));
            }
        }
        Ok(())
    }

    /// True iff `value` belongs to this domain.
    pub fn valid(&self, value: &Value) -> bool {
        match value {
            Value::Null => self.nullable,
            Value::Text(s) => self.strings_allowed.allows(s),
            Value::Number(n) => self.number_allowed && self.number_in_domain(*n),
        }
    }

    fn number_in_domain(&self, n: f64) -> bool {
        if n.is_nan() {
            return false;
        }
        let above_min = if self.inclusive_min {
            n >= self.min
        } else {
            n > self.min
        };
        let below_max = if self.inclusive_max {
            n <= self.max
        } else {
            n < self.max
        };
        if !(above_min && below_max) {
            return false;
        }
        !self.must_be_int || n.is_infinite() || n.fract() == 0.0
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.number_allowed {
            let open = if self.inclusive_min { '[' } else { '(' };
            let close = if self.inclusive_max { ']' } else { ')' };
            let kind = if self.must_be_int { "integers" } else { "numbers" };
            parts.push(format!(
                "{kind} in {open}{}, {}{close}",
                Value::Number(self.min),
                Value::Number(self.max)
            ));
        }
        match &self.strings_allowed {
            StringsAllowed::None => {}
            StringsAllowed::Any => parts.push("any string".to_string()),
            StringsAllowed::Only(set) => parts.push(format!(
                "one of {}",
                set.iter().cloned().collect::<Vec<_>>().join(", ")
            )),
        }
        if self.nullable {
            parts.push("null".to_string());
        }
        f.write_str(&parts.join(" or "))
    }
}
