//! Cell values and primary keys.
//!
//! A [`Value`] is what a single cell of a table holds: nothing, a number or a
//! piece of text. Numbers are always `f64`; integrality is a property checked
//! by data types, not a separate representation. Values carry a total order
//! so that [`PrimaryKey`]s can key ordered maps.

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A single cell value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// An empty cell.
    #[default]
    Null,
    /// A numeric cell.
    Number(f64),
    /// A text cell.
    Text(String),
}

impl Value {
    /// Parses raw text the way delimited files and spreadsheets are read:
    /// blank text is `Null`, anything that parses as a number (including
    /// `inf`/`-inf`) is a `Number`, everything else is kept as `Text`.
    pub fn parse_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Value::Null;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if !n.is_nan() => Value::Number(n),
            _ => Value::Text(raw.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the number held by this value, if any.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the text held by this value, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// True for finite numbers without a fractional part.
    pub fn is_integer(&self) -> bool {
        matches!(self, Value::Number(n) if n.is_finite() && n.fract() == 0.0)
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Number(_) => 1,
            Value::Text(_) => 2,
        }
    }
}

// -0.0 and 0.0 must compare and hash identically.
fn normalized(n: f64) -> f64 {
    if n == 0.0 {
        0.0
    } else {
        n
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => normalized(*a).total_cmp(&normalized(*b)),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Value::Null => {}
            Value::Number(n) => normalized(*n).to_bits().hash(state),
            Value::Text(s) => s.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Number(n) if n.is_infinite() => {
                write!(f, "{}", if *n > 0.0 { "inf" } else { "-inf" })
            }
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

// JSON has no infinities, so they travel as the strings "inf" / "-inf".
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Number(n) if n.is_infinite() => {
                serializer.serialize_str(if *n > 0.0 { "inf" } else { "-inf" })
            }
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                serializer.serialize_i64(*n as i64)
            }
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::Text(s) => serializer.serialize_str(s),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(match RawValue::deserialize(deserializer)? {
            RawValue::Null => Value::Null,
            RawValue::Bool(b) => Value::Number(if b { 1.0 } else { 0.0 }),
            RawValue::Number(n) => Value::Number(n),
            RawValue::Text(s) => match s.as_str() {
                "inf" => Value::Number(f64::INFINITY),
                "-inf" => Value::Number(f64::NEG_INFINITY),
                _ => Value::Text(s),
            },
        })
    }
}

macro_rules! value_from_number {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::Number(n as f64)
                }
            }
        )*
    };
}

value_from_number!(f64, f32, i64, i32, u32, usize);

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// The primary key of a row: one value per primary-key field, in schema order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrimaryKey(Vec<Value>);

impl PrimaryKey {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The key's only value, for single-field primary keys.
    pub fn single(&self) -> Option<&Value> {
        match self.0.as_slice() {
            [v] => Some(v),
            _ => None,
        }
    }

    pub fn into_values(self) -> Vec<Value> {
        self.0
    }
}

impl fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(v) = self.single() {
            return write!(f, "{v}");
        }
        f.write_str("(")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{v}")?;
        }
        f.write_str(")")
    }
}

macro_rules! key_from_scalar {
    ($($t:ty),*) => {
        $(
            impl From<$t> for PrimaryKey {
                fn from(v: $t) -> Self {
                    PrimaryKey(vec![Value::from(v)])
                }
            }
        )*
    };
}

key_from_scalar!(&str, String, f64, i64, i32, u32, usize);

impl From<Value> for PrimaryKey {
    fn from(v: Value) -> Self {
        PrimaryKey(vec![v])
    }
}

impl From<Vec<Value>> for PrimaryKey {
    fn from(values: Vec<Value>) -> Self {
        PrimaryKey(values)
    }
}

impl<A: Into<Value>, B: Into<Value>> From<(A, B)> for PrimaryKey {
    fn from((a, b): (A, B)) -> Self {
        PrimaryKey(vec![a.into(), b.into()])
    }
}

impl<A: Into<Value>, B: Into<Value>, C: Into<Value>> From<(A, B, C)> for PrimaryKey {
    fn from((a, b, c): (A, B, C)) -> Self {
        PrimaryKey(vec![a.into(), b.into(), c.into()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_parse_text() {
        assert_eq!(Value::parse_text(""), Value::Null);
        assert_eq!(Value::parse_text("  "), Value::Null);
        assert_eq!(Value::parse_text("12"), Value::Number(12.0));
        assert_eq!(Value::parse_text("-1.5"), Value::Number(-1.5));
        assert_eq!(Value::parse_text("inf"), Value::Number(f64::INFINITY));
        assert_eq!(Value::parse_text("QB"), Value::from("QB"));
        assert_eq!(Value::parse_text("nan"), Value::from("nan"));
    }

    #[test]
    fn test_ordering_across_variants() {
        let mut values = vec![Value::from("a"), Value::from(3), Value::Null, Value::from(-1)];
        values.sort();
        assert_eq!(
            values,
            vec![Value::Null, Value::from(-1), Value::from(3), Value::from("a")]
        );
    }

    #[test]
    fn test_negative_zero_is_zero() {
        let mut set = HashSet::new();
        set.insert(Value::Number(0.0));
        assert!(set.contains(&Value::Number(-0.0)));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::from(7).to_string(), "7");
        assert_eq!(Value::from(2.5).to_string(), "2.5");
        assert_eq!(Value::Number(f64::NEG_INFINITY).to_string(), "-inf");
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(PrimaryKey::from(("Pens", "Detroit")).to_string(), "(Pens, Detroit)");
    }

    #[test]
    fn test_json_round_trip_keeps_infinity() {
        let values = vec![
            Value::Null,
            Value::from(3),
            Value::from(0.25),
            Value::Number(f64::INFINITY),
            Value::from("Flex Eligible"),
        ];
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r#"[null,3,0.25,"inf","Flex Eligible"]"#);
        let back: Vec<Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, values);
    }

    #[test]
    fn test_json_booleans_are_numbers() {
        let back: Vec<Value> = serde_json::from_str("[true, false]").unwrap();
        assert_eq!(back, vec![Value::from(1), Value::from(0)]);
    }

    #[test]
    fn test_integer_detection() {
        assert!(Value::from(4).is_integer());
        assert!(!Value::from(4.5).is_integer());
        assert!(!Value::Number(f64::INFINITY).is_integer());
        assert!(!Value::from("4").is_integer());
    }
}
