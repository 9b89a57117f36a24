//! Column types and the typed cell value domain.
//!
//! Every table cell is a [`Value`]; every column carries a [`ColumnType`]
//! drawn from the fixed enumeration the storage layer understands. The
//! SQL-facing type names (`"double precision"`, `"varchar"` aliases) follow
//! the relational schema the workbench fronts.

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Timestamp display/parse format used across the engine.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Declared type of a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
    Timestamp,
    Boolean,
}

impl ColumnType {
    /// SQL-facing name, as exposed to callers and stored in table metadata.
    pub fn sql_name(&self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::Real => "double precision",
            ColumnType::Text => "text",
            ColumnType::Timestamp => "timestamp",
            ColumnType::Boolean => "boolean",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Real)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

impl FromStr for ColumnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "integer" | "int" | "bigint" => Ok(ColumnType::Integer),
            "double precision" | "double" | "real" | "float" => Ok(ColumnType::Real),
            "text" | "varchar" | "varchar(255)" | "character varying" => Ok(ColumnType::Text),
            "timestamp" | "timestamp without time zone" | "datetime" => Ok(ColumnType::Timestamp),
            "boolean" | "bool" => Ok(ColumnType::Boolean),
            other => Err(format!("Unknown column type: {other}")),
        }
    }
}

impl Serialize for ColumnType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.sql_name())
    }
}

impl<'de> Deserialize<'de> for ColumnType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A single table cell.
///
/// Serializes untagged, so JSON payloads carry plain scalars
/// (`null`, `true`, `42`, `1.5`, `"text"`); timestamps travel as their
/// ISO-like chrono string form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Real(f64),
    Timestamp(NaiveDateTime),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the cell, if it holds one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Real(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    /// Whether the cell can be stored in a column of the given type
    /// without conversion. `Null` is storable anywhere.
    pub fn matches_type(&self, column_type: ColumnType) -> bool {
        match self {
            Value::Null => true,
            Value::Int(_) => column_type == ColumnType::Integer,
            Value::Real(_) => column_type == ColumnType::Real,
            Value::Text(_) => column_type == ColumnType::Text,
            Value::Timestamp(_) => column_type == ColumnType::Timestamp,
            Value::Bool(_) => column_type == ColumnType::Boolean,
        }
    }

    /// Converts the cell to the given column type, when a lossless (or
    /// explicitly defined) conversion exists. Retyping a column applies this
    /// per cell and fails wholesale on the first `None`.
    pub fn coerce_to(&self, column_type: ColumnType) -> Option<Value> {
        if self.matches_type(column_type) {
            return Some(self.clone());
        }
        match (self, column_type) {
            (_, ColumnType::Text) => Some(Value::Text(self.to_string())),
            (Value::Int(i), ColumnType::Real) => Some(Value::Real(*i as f64)),
            (Value::Int(i), ColumnType::Boolean) => match i {
                0 => Some(Value::Bool(false)),
                1 => Some(Value::Bool(true)),
                _ => None,
            },
            (Value::Real(r), ColumnType::Integer) => {
                if r.fract() == 0.0 && r.is_finite() {
                    Some(Value::Int(*r as i64))
                } else {
                    None
                }
            }
            (Value::Bool(b), ColumnType::Integer) => Some(Value::Int(i64::from(*b))),
            (Value::Text(s), ColumnType::Integer) => s.trim().parse().ok().map(Value::Int),
            (Value::Text(s), ColumnType::Real) => s.trim().parse().ok().map(Value::Real),
            (Value::Text(s), ColumnType::Boolean) => match s.trim().to_lowercase().as_str() {
                "true" | "t" | "1" => Some(Value::Bool(true)),
                "false" | "f" | "0" => Some(Value::Bool(false)),
                _ => None,
            },
            (Value::Text(s), ColumnType::Timestamp) => parse_timestamp(s).map(Value::Timestamp),
            _ => None,
        }
    }

    /// Total ordering used for sort keys and deterministic tie-breaks.
    ///
    /// `Null` sorts first; integers and reals compare numerically across
    /// variants; otherwise values compare within their variant, and distinct
    /// variants fall back to a fixed variant rank.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        use Value::*;
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Null, _) => Ordering::Less,
            (_, Null) => Ordering::Greater,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Int(a), Int(b)) => a.cmp(b),
            (Real(a), Real(b)) => a.total_cmp(b),
            (Int(a), Real(b)) => (*a as f64).total_cmp(b),
            (Real(a), Int(b)) => a.total_cmp(&(*b as f64)),
            (Timestamp(a), Timestamp(b)) => a.cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            _ => self.variant_rank().cmp(&other.variant_rank()),
        }
    }

    fn variant_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Int(_) | Value::Real(_) => 2,
            Value::Timestamp(_) => 3,
            Value::Text(_) => 4,
        }
    }
}

impl fmt::Display for Value {
    /// Display form used for search, similarity scoring and text coercion.
    /// `Null` renders empty, matching how the UI shows missing cells.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r}"),
            Value::Timestamp(t) => write!(f, "{}", t.format(TIMESTAMP_FORMAT)),
            Value::Text(s) => f.write_str(s),
        }
    }
}

/// Parses the timestamp spellings accepted from callers: the engine's own
/// display format, the ISO `T` separator, and a bare date (midnight).
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(raw: &str) -> NaiveDateTime {
        parse_timestamp(raw).unwrap()
    }

    #[test]
    fn test_column_type_parse_aliases() {
        assert_eq!("integer".parse::<ColumnType>().unwrap(), ColumnType::Integer);
        assert_eq!(
            "double precision".parse::<ColumnType>().unwrap(),
            ColumnType::Real
        );
        assert_eq!("varchar(255)".parse::<ColumnType>().unwrap(), ColumnType::Text);
        assert_eq!("bool".parse::<ColumnType>().unwrap(), ColumnType::Boolean);
        assert!("geometry".parse::<ColumnType>().is_err());
    }

    #[test]
    fn test_column_type_serde_round_trip() {
        let json = serde_json::to_string(&ColumnType::Real).unwrap();
        assert_eq!(json, "\"double precision\"");
        let back: ColumnType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ColumnType::Real);
    }

    #[test]
    fn test_value_untagged_serialization() {
        assert_eq!(serde_json::to_string(&Value::Null).unwrap(), "null");
        assert_eq!(serde_json::to_string(&Value::Int(42)).unwrap(), "42");
        assert_eq!(serde_json::to_string(&Value::Real(1.5)).unwrap(), "1.5");
        assert_eq!(
            serde_json::to_string(&Value::Text("hi".into())).unwrap(),
            "\"hi\""
        );
    }

    #[test]
    fn test_sort_cmp_nulls_first_and_numeric_cross_variant() {
        assert_eq!(Value::Null.sort_cmp(&Value::Int(-5)), Ordering::Less);
        assert_eq!(Value::Int(2).sort_cmp(&Value::Real(2.5)), Ordering::Less);
        assert_eq!(Value::Real(3.0).sort_cmp(&Value::Int(3)), Ordering::Equal);
        assert_eq!(
            Value::Text("b".into()).sort_cmp(&Value::Text("a".into())),
            Ordering::Greater
        );
    }

    #[test]
    fn test_coerce_to_text_always_succeeds() {
        assert_eq!(
            Value::Int(7).coerce_to(ColumnType::Text),
            Some(Value::Text("7".into()))
        );
        assert_eq!(
            Value::Bool(true).coerce_to(ColumnType::Text),
            Some(Value::Text("true".into()))
        );
        assert_eq!(Value::Null.coerce_to(ColumnType::Text), Some(Value::Null));
    }

    #[test]
    fn test_coerce_real_to_integer_requires_integral() {
        assert_eq!(
            Value::Real(4.0).coerce_to(ColumnType::Integer),
            Some(Value::Int(4))
        );
        assert_eq!(Value::Real(4.5).coerce_to(ColumnType::Integer), None);
    }

    #[test]
    fn test_coerce_text_parsing() {
        assert_eq!(
            Value::Text(" 12 ".into()).coerce_to(ColumnType::Integer),
            Some(Value::Int(12))
        );
        assert_eq!(
            Value::Text("t".into()).coerce_to(ColumnType::Boolean),
            Some(Value::Bool(true))
        );
        assert_eq!(
            Value::Text("2021-03-04".into()).coerce_to(ColumnType::Timestamp),
            Some(Value::Timestamp(ts("2021-03-04 00:00:00")))
        );
        assert_eq!(Value::Text("nope".into()).coerce_to(ColumnType::Integer), None);
    }

    #[test]
    fn test_timestamp_display_format() {
        let v = Value::Timestamp(ts("2021-03-04 05:06:07"));
        assert_eq!(v.to_string(), "2021-03-04 05:06:07");
    }
}
