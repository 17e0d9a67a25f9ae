//! Column values and the flat-form <-> relational column mapping.
//!
//! Survey forms and flat files produce a key→value map keyed by form field
//! names (`nombre_tambo`, `sup_total`, ...). Each record type declares, per
//! attribute, the relational column it lives in and the form key it is read
//! from; [`FieldValue`] handles the per-type conversion both ways.

use serde_json::{Number, Value};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments};
use std::collections::BTreeMap;

/// A flat form submission: form key → raw value.
pub type FormData = BTreeMap<String, Value>;

/// Form key carrying the record identifier.
pub const ID_FORM_KEY: &str = "uuid";

/// Form keys that describe a row rather than its content.
pub const INTERNAL_FORM_KEYS: [&str; 3] = [ID_FORM_KEY, "farm_id", "created_at"];

/// SQL storage class of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Real,
    Integer,
    OptionalInteger,
}

impl ColumnType {
    /// Column declaration used in CREATE TABLE.
    pub fn sql_decl(&self) -> &'static str {
        match self {
            Self::Text => "TEXT NOT NULL DEFAULT ''",
            Self::Real => "REAL NOT NULL DEFAULT 0",
            Self::Integer => "INTEGER NOT NULL DEFAULT 0",
            Self::OptionalInteger => "INTEGER",
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, Self::Text)
    }
}

/// One domain attribute of a record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    /// Relational column name
    pub column: &'static str,
    /// Flat form key
    pub form_key: &'static str,
    pub ty: ColumnType,
}

/// A value bound into a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Integer(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Real(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

/// Bind a dynamically typed value onto a query.
pub(crate) fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: SqlValue,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        SqlValue::Null => query.bind(Option::<i64>::None),
        SqlValue::Integer(v) => query.bind(v),
        SqlValue::Real(v) => query.bind(v),
        SqlValue::Text(v) => query.bind(v),
    }
}

/// Conversion between a record attribute, its form value and its SQL value.
///
/// `from_form` is lenient in the way form libraries are: a missing or null
/// value takes the type default, numbers arrive as strings, and text may
/// arrive as a number.
pub trait FieldValue: Sized {
    const TYPE: ColumnType;

    fn from_form(value: Option<&Value>) -> Result<Self, String>;

    fn to_form(&self) -> Value;

    fn to_sql(&self) -> SqlValue;
}

impl FieldValue for String {
    const TYPE: ColumnType = ColumnType::Text;

    fn from_form(value: Option<&Value>) -> Result<Self, String> {
        match value {
            None | Some(Value::Null) => Ok(String::new()),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(Value::Bool(b)) => Ok(b.to_string()),
            Some(other) => Err(format!("expected text, got {}", type_name(other))),
        }
    }

    fn to_form(&self) -> Value {
        Value::String(self.clone())
    }

    fn to_sql(&self) -> SqlValue {
        SqlValue::Text(self.clone())
    }
}

impl FieldValue for f64 {
    const TYPE: ColumnType = ColumnType::Real;

    fn from_form(value: Option<&Value>) -> Result<Self, String> {
        match value {
            None | Some(Value::Null) => Ok(0.0),
            Some(Value::Number(n)) => n
                .as_f64()
                .ok_or_else(|| format!("{} is not representable as a number", n)),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(0.0),
            Some(Value::String(s)) => parse_finite(s),
            Some(other) => Err(format!("expected a number, got {}", type_name(other))),
        }
    }

    fn to_form(&self) -> Value {
        Number::from_f64(*self).map(Value::Number).unwrap_or(Value::Null)
    }

    fn to_sql(&self) -> SqlValue {
        SqlValue::Real(*self)
    }
}

impl FieldValue for i64 {
    const TYPE: ColumnType = ColumnType::Integer;

    fn from_form(value: Option<&Value>) -> Result<Self, String> {
        match value {
            None | Some(Value::Null) => Ok(0),
            Some(Value::Number(n)) => match n.as_i64() {
                Some(v) => Ok(v),
                None => n
                    .as_f64()
                    .ok_or_else(|| format!("{} is not a whole number", n))
                    .and_then(integral),
            },
            Some(Value::String(s)) if s.trim().is_empty() => Ok(0),
            Some(Value::String(s)) => match s.trim().parse::<i64>() {
                Ok(v) => Ok(v),
                Err(_) => parse_finite(s).and_then(integral),
            },
            Some(other) => Err(format!("expected a whole number, got {}", type_name(other))),
        }
    }

    fn to_form(&self) -> Value {
        Value::from(*self)
    }

    fn to_sql(&self) -> SqlValue {
        SqlValue::Integer(*self)
    }
}

impl FieldValue for Option<i64> {
    const TYPE: ColumnType = ColumnType::OptionalInteger;

    fn from_form(value: Option<&Value>) -> Result<Self, String> {
        match value {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(v) => i64::from_form(Some(v)).map(Some),
        }
    }

    fn to_form(&self) -> Value {
        self.map(Value::from).unwrap_or(Value::Null)
    }

    fn to_sql(&self) -> SqlValue {
        (*self).into()
    }
}

fn parse_finite(s: &str) -> Result<f64, String> {
    match s.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("'{}' is not a number", s)),
    }
}

// pandas writes integer columns containing gaps as floats ("2020.0")
fn integral(v: f64) -> Result<i64, String> {
    if v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
        Ok(v as i64)
    } else {
        Err(format!("{} is not a whole number", v))
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "text",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
