//! Scalar values and result rows shared by the gate, the store and the
//! pricing strategies

use serde_json::{Map, Value};

/// A typed scalar bound to a named query parameter
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl SqlValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Float(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlValue::Null, Into::into)
    }
}

/// One result row: column name to JSON scalar, in column order
pub type Row = Map<String, Value>;

/// One result set
pub type ResultTable = Vec<Row>;

/// Typed, lenient column access for rows read back from the ERP schema
///
/// Lookup tries the exact column name first, then a case-insensitive match.
pub trait RowExt {
    fn column(&self, name: &str) -> Option<&Value>;

    /// Trimmed text; `None` for NULL, missing or blank
    fn text(&self, name: &str) -> Option<String> {
        let rendered = match self.column(name)? {
            Value::Null => return None,
            Value::String(s) => s.trim().to_string(),
            other => other.to_string(),
        };
        (!rendered.is_empty()).then_some(rendered)
    }

    /// Numeric value; numeric strings are parsed
    fn float(&self, name: &str) -> Option<f64> {
        match self.column(name)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Integral value; integral floats and plain integer strings convert
    fn int(&self, name: &str) -> Option<i64> {
        match self.column(name)? {
            Value::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                    .map(|f| f as i64)
            }),
            Value::String(s) => s.trim().parse().ok(),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// Truthy flag: bit columns, 1/0, or Y/N text
    fn flag(&self, name: &str) -> bool {
        match self.column(name) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
            Some(Value::String(s)) => {
                matches!(s.trim().to_ascii_uppercase().as_str(), "Y" | "1" | "TRUE")
            }
            _ => false,
        }
    }
}

impl RowExt for Row {
    fn column(&self, name: &str) -> Option<&Value> {
        self.get(name).or_else(|| {
            self.iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v)
        })
    }
}
