//! Compiles `field__op -> value` filter specifications into predicates.

use std::fmt;

use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{Condition, EntityTrait, Order};
use serde_json::Value as Json;

use super::fields::{Field, FieldMap};
use super::kind::{FieldKind, json_type};
use super::values::Filters;
use crate::error::{RepoError, Result};

/// Separator between a field name and its operator suffix.
pub const OP_SEPARATOR: &str = "__";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    In,
    Like,
    /// Case-insensitive `LIKE`.
    Ilike,
}

impl FilterOp {
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        Some(match token {
            "eq" => FilterOp::Eq,
            "ne" => FilterOp::Ne,
            "lt" => FilterOp::Lt,
            "lte" => FilterOp::Lte,
            "gt" => FilterOp::Gt,
            "gte" => FilterOp::Gte,
            "in" => FilterOp::In,
            "like" => FilterOp::Like,
            "ilike" => FilterOp::Ilike,
            _ => return None,
        })
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Ne => "ne",
            FilterOp::Lt => "lt",
            FilterOp::Lte => "lte",
            FilterOp::Gt => "gt",
            FilterOp::Gte => "gte",
            FilterOp::In => "in",
            FilterOp::Like => "like",
            FilterOp::Ilike => "ilike",
        }
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Split `key` on the first `__` into the field name and operator token.
#[must_use]
pub fn split_key(key: &str) -> (&str, Option<&str>) {
    match key.split_once(OP_SEPARATOR) {
        Some((field, op)) => (field, Some(op)),
        None => (key, None),
    }
}

/// Compile a filter specification where keys may carry an operator suffix.
///
/// Unsuffixed keys mean `eq`. Predicates come out in input order.
///
/// # Errors
/// `InvalidField`, `UnsupportedOperator` or `InvalidValue`.
pub fn compile<E: EntityTrait>(fields: &FieldMap<E>, filters: &Filters) -> Result<Vec<SimpleExpr>> {
    filters
        .iter()
        .map(|(key, value)| {
            let (name, op) = split_key(key);
            let field = fields.resolve(name)?;
            let op = match op {
                Some(token) => FilterOp::parse(token)
                    .ok_or_else(|| RepoError::UnsupportedOperator(token.to_owned()))?,
                None => FilterOp::Eq,
            };
            predicate::<E>(field, name, op, value)
        })
        .collect()
}

/// Compile an exact-match specification: every key is a bare field name.
///
/// # Errors
/// `InvalidField` (including suffixed keys) or `InvalidValue`.
pub fn compile_exact<E: EntityTrait>(
    fields: &FieldMap<E>,
    filters: &Filters,
) -> Result<Vec<SimpleExpr>> {
    filters
        .iter()
        .map(|(name, value)| {
            let field = fields.resolve(name)?;
            predicate::<E>(field, name, FilterOp::Eq, value)
        })
        .collect()
}

/// AND all predicates together. An empty list matches everything.
#[must_use]
pub fn and_all(predicates: Vec<SimpleExpr>) -> Condition {
    predicates
        .into_iter()
        .fold(Condition::all(), Condition::add)
}

fn predicate<E: EntityTrait>(
    field: &Field<E>,
    name: &str,
    op: FilterOp,
    value: &Json,
) -> Result<SimpleExpr> {
    let col = || Expr::col((E::default(), field.col));

    Ok(match op {
        FilterOp::Eq if value.is_null() => col().is_null(),
        FilterOp::Ne if value.is_null() => col().is_not_null(),
        FilterOp::Eq => col().eq(field.kind.coerce(name, value)?),
        FilterOp::Ne => col().ne(field.kind.coerce(name, value)?),
        FilterOp::Lt => col().lt(field.kind.coerce(name, value)?),
        FilterOp::Lte => col().lte(field.kind.coerce(name, value)?),
        FilterOp::Gt => col().gt(field.kind.coerce(name, value)?),
        FilterOp::Gte => col().gte(field.kind.coerce(name, value)?),
        FilterOp::In => {
            let items = value.as_array().ok_or_else(|| RepoError::InvalidValue {
                field: name.to_owned(),
                expected: field.kind,
                got: json_type(value),
            })?;
            let values = items
                .iter()
                .map(|item| field.kind.coerce(name, item))
                .collect::<Result<Vec<_>>>()?;
            col().is_in(values)
        }
        FilterOp::Like => col().like(pattern(field, name, value)?),
        FilterOp::Ilike => {
            let lowered = pattern(field, name, value)?.to_lowercase();
            Expr::expr(Func::lower(col())).like(lowered)
        }
    })
}

fn pattern<E: EntityTrait>(field: &Field<E>, name: &str, value: &Json) -> Result<String> {
    match (field.kind, value) {
        (FieldKind::String, Json::String(s)) => Ok(s.clone()),
        (FieldKind::String, other) => Err(RepoError::InvalidValue {
            field: name.to_owned(),
            expected: FieldKind::String,
            got: json_type(other),
        }),
        (kind, _) => Err(RepoError::InvalidValue {
            field: name.to_owned(),
            expected: FieldKind::String,
            got: kind_name(kind),
        }),
    }
}

const fn kind_name(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::String => "string field",
        FieldKind::I32 | FieldKind::I64 => "integer field",
        FieldKind::F64 | FieldKind::Decimal => "numeric field",
        FieldKind::Bool => "bool field",
        FieldKind::Uuid => "uuid field",
        FieldKind::DateTimeUtc | FieldKind::Date => "temporal field",
    }
}

/// Ordering by a declared field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub descending: bool,
}

impl OrderBy {
    #[must_use]
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    #[must_use]
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }

    /// `"name"` is ascending, `"-name"` descending.
    #[must_use]
    pub fn parse(spec: &str) -> Self {
        match spec.strip_prefix('-') {
            Some(field) => Self::desc(field),
            None => Self::asc(spec),
        }
    }

    /// Resolve against the field map.
    ///
    /// # Errors
    /// `InvalidField` when the field is not declared.
    pub fn resolve<E: EntityTrait>(&self, fields: &FieldMap<E>) -> Result<(E::Column, Order)> {
        let field = fields.resolve(&self.field)?;
        let order = if self.descending {
            Order::Desc
        } else {
            Order::Asc
        };
        Ok((field.col, order))
    }
}
