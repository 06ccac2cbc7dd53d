use std::collections::HashMap;

use sea_orm::{EntityTrait, IdenStatic, Value};
use serde_json::Value as Json;

use super::kind::FieldKind;
use crate::error::{RepoError, Result};

/// A declared entity field: the column it maps to and how its values coerce.
pub struct Field<E: EntityTrait> {
    pub col: E::Column,
    pub kind: FieldKind,
    pub nullable: bool,
}

impl<E: EntityTrait> Clone for Field<E> {
    fn clone(&self) -> Self {
        Self {
            col: self.col,
            kind: self.kind,
            nullable: self.nullable,
        }
    }
}

impl<E: EntityTrait> Field<E> {
    /// Coerce an input value for this field, honouring nullability.
    ///
    /// # Errors
    /// `InvalidValue` on a kind mismatch or a `null` for a non-nullable field.
    pub fn value(&self, name: &str, v: &Json) -> Result<Value> {
        if v.is_null() {
            return if self.nullable {
                Ok(self.kind.null())
            } else {
                Err(RepoError::InvalidValue {
                    field: name.to_owned(),
                    expected: self.kind,
                    got: "null",
                })
            };
        }
        self.kind.coerce(name, v)
    }
}

/// Static descriptor table of an entity's declared fields, keyed by API name.
///
/// Names are matched case-insensitively.
#[must_use]
pub struct FieldMap<E: EntityTrait> {
    map: HashMap<String, Field<E>>,
}

impl<E: EntityTrait> Clone for FieldMap<E> {
    fn clone(&self) -> Self {
        Self {
            map: self.map.clone(),
        }
    }
}

impl<E: EntityTrait> Default for FieldMap<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EntityTrait> FieldMap<E> {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    pub fn insert(self, api_name: impl Into<String>, col: E::Column, kind: FieldKind) -> Self {
        self.declare(api_name.into(), col, kind, false)
    }

    pub fn insert_nullable(
        self,
        api_name: impl Into<String>,
        col: E::Column,
        kind: FieldKind,
    ) -> Self {
        self.declare(api_name.into(), col, kind, true)
    }

    fn declare(mut self, api_name: String, col: E::Column, kind: FieldKind, nullable: bool) -> Self {
        self.map.insert(
            api_name.to_lowercase(),
            Field {
                col,
                kind,
                nullable,
            },
        );
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Field<E>> {
        self.map.get(&name.to_lowercase())
    }

    /// Look a field up by name.
    ///
    /// # Errors
    /// `InvalidField` when `name` is not declared.
    pub fn resolve(&self, name: &str) -> Result<&Field<E>> {
        self.get(name)
            .ok_or_else(|| RepoError::InvalidField(name.to_owned()))
    }

    /// Reverse lookup: the API name and descriptor declared for `col`.
    #[must_use]
    pub fn by_column(&self, col: E::Column) -> Option<(&str, &Field<E>)> {
        self.map
            .iter()
            .find(|(_, f)| f.col.as_str() == col.as_str())
            .map(|(name, f)| (name.as_str(), f))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
