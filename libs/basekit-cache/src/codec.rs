//! Value codec between typed values and the store's raw strings.
//!
//! Booleans are stored as the tokens `true`/`false`, structured values as
//! JSON text and strings verbatim. Decoding probes the boolean tokens, then
//! JSON, then falls back to the raw string.

use serde_json::Value as Json;

const TRUE: &str = "true";
const FALSE: &str = "false";

/// A value read from or written to the cache.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheValue {
    Bool(bool),
    Json(Json),
    Text(String),
}

impl CacheValue {
    /// `None`-equivalent values are stored as a successful no-op.
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, CacheValue::Json(Json::Null))
    }

    /// Raw representation handed to the store.
    ///
    /// # Errors
    /// Only if the JSON value cannot be rendered.
    pub fn encode(&self) -> serde_json::Result<String> {
        match self {
            CacheValue::Bool(true) => Ok(TRUE.to_owned()),
            CacheValue::Bool(false) => Ok(FALSE.to_owned()),
            CacheValue::Json(v) => serde_json::to_string(v),
            CacheValue::Text(s) => Ok(s.clone()),
        }
    }

    #[must_use]
    pub fn decode(raw: &str) -> Self {
        match raw {
            TRUE => CacheValue::Bool(true),
            FALSE => CacheValue::Bool(false),
            _ => serde_json::from_str(raw)
                .map_or_else(|_| CacheValue::Text(raw.to_owned()), CacheValue::Json),
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CacheValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CacheValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The value as JSON, whatever variant it decoded to.
    #[must_use]
    pub fn into_json(self) -> Json {
        match self {
            CacheValue::Bool(b) => Json::Bool(b),
            CacheValue::Json(v) => v,
            CacheValue::Text(s) => Json::String(s),
        }
    }
}

impl From<bool> for CacheValue {
    fn from(b: bool) -> Self {
        CacheValue::Bool(b)
    }
}

impl From<&str> for CacheValue {
    fn from(s: &str) -> Self {
        CacheValue::Text(s.to_owned())
    }
}

impl From<String> for CacheValue {
    fn from(s: String) -> Self {
        CacheValue::Text(s)
    }
}

impl From<Json> for CacheValue {
    fn from(v: Json) -> Self {
        CacheValue::Json(v)
    }
}

impl<T: Into<CacheValue>> From<Option<T>> for CacheValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(CacheValue::Json(Json::Null), Into::into)
    }
}
