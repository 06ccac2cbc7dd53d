//! Field kinds and JSON to store value coercion.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::Value;
use serde_json::Value as Json;
use uuid::Uuid;

use crate::error::{RepoError, Result};

/// Logical type of a declared entity field.
///
/// The kind decides how JSON input is coerced before it reaches the store,
/// so it must match the Rust type of the model field:
///
/// | kind | model field |
/// |---|---|
/// | `String` | `String` |
/// | `I32` / `I64` | `i32` / `i64` |
/// | `F64` | `f64` |
/// | `Bool` | `bool` |
/// | `Uuid` | `uuid::Uuid` |
/// | `DateTimeUtc` | `chrono::DateTime<Utc>` |
/// | `Date` | `chrono::NaiveDate` |
/// | `Decimal` | `rust_decimal::Decimal` |
///
/// Nullable fields use `Option<_>` of the same type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    String,
    I32,
    I64,
    F64,
    Bool,
    Uuid,
    DateTimeUtc,
    Date,
    Decimal,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::String => "String",
            FieldKind::I32 => "I32",
            FieldKind::I64 => "I64",
            FieldKind::F64 => "F64",
            FieldKind::Bool => "Bool",
            FieldKind::Uuid => "Uuid",
            FieldKind::DateTimeUtc => "DateTimeUtc",
            FieldKind::Date => "Date",
            FieldKind::Decimal => "Decimal",
        };
        f.write_str(name)
    }
}

impl FieldKind {
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(self, FieldKind::I32 | FieldKind::I64)
    }

    /// Typed SQL `NULL` for this kind.
    #[must_use]
    pub fn null(self) -> Value {
        match self {
            FieldKind::String => Value::String(None),
            FieldKind::I32 => Value::Int(None),
            FieldKind::I64 => Value::BigInt(None),
            FieldKind::F64 => Value::Double(None),
            FieldKind::Bool => Value::Bool(None),
            FieldKind::Uuid => Value::Uuid(None),
            FieldKind::DateTimeUtc => Value::ChronoDateTimeUtc(None),
            FieldKind::Date => Value::ChronoDate(None),
            FieldKind::Decimal => Value::Decimal(None),
        }
    }

    /// Coerce a non-null JSON value into a store value of this kind.
    ///
    /// # Errors
    /// `InvalidValue` when the JSON value cannot represent this kind.
    pub fn coerce(self, field: &str, v: &Json) -> Result<Value> {
        let mismatch = || RepoError::InvalidValue {
            field: field.to_owned(),
            expected: self,
            got: json_type(v),
        };

        Ok(match (self, v) {
            (FieldKind::String, Json::String(s)) => Value::String(Some(Box::new(s.clone()))),
            (FieldKind::I32, Json::Number(n)) => {
                let i = n
                    .as_i64()
                    .and_then(|i| i32::try_from(i).ok())
                    .ok_or_else(mismatch)?;
                Value::Int(Some(i))
            }
            (FieldKind::I64, Json::Number(n)) => Value::BigInt(Some(n.as_i64().ok_or_else(mismatch)?)),
            (FieldKind::F64, Json::Number(n)) => Value::Double(Some(n.as_f64().ok_or_else(mismatch)?)),
            (FieldKind::Bool, Json::Bool(b)) => Value::Bool(Some(*b)),
            (FieldKind::Uuid, Json::String(s)) => {
                let id = Uuid::parse_str(s).map_err(|_| mismatch())?;
                Value::Uuid(Some(Box::new(id)))
            }
            (FieldKind::DateTimeUtc, Json::String(s)) => {
                let dt = DateTime::parse_from_rfc3339(s)
                    .map_err(|_| mismatch())?
                    .with_timezone(&Utc);
                Value::ChronoDateTimeUtc(Some(Box::new(dt)))
            }
            (FieldKind::Date, Json::String(s)) => {
                let d = NaiveDate::from_str(s).map_err(|_| mismatch())?;
                Value::ChronoDate(Some(Box::new(d)))
            }
            (FieldKind::Decimal, Json::Number(n)) => {
                let d = parse_decimal(&n.to_string()).ok_or_else(mismatch)?;
                Value::Decimal(Some(Box::new(d)))
            }
            (FieldKind::Decimal, Json::String(s)) => {
                let d = parse_decimal(s).ok_or_else(mismatch)?;
                Value::Decimal(Some(Box::new(d)))
            }
            _ => return Err(mismatch()),
        })
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

pub(crate) fn json_type(v: &Json) -> &'static str {
    match v {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}
