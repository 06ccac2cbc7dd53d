use std::fmt;

use serde_json::{Map, Value as Json};

/// Insertion-ordered `name -> value` input.
///
/// Used both as record data (`create`, `update`) and as a filter
/// specification (`"age__gte" -> 18`). Setting a key twice replaces the
/// earlier value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Values {
    entries: Vec<(String, Json)>,
}

/// Filter specification: keys are `field` or `field__op`.
pub type Filters = Values;

impl Values {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Values::set`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Json>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Json>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Json> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Overlay `other` on top of `self`; keys from `other` win.
    #[must_use]
    pub fn merged(mut self, other: &Values) -> Self {
        for (k, v) in other.iter() {
            self.set(k, v.clone());
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Json)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<Json>> FromIterator<(K, V)> for Values {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = Values::new();
        for (k, v) in iter {
            values.set(k, v);
        }
        values
    }
}

impl From<Map<String, Json>> for Values {
    fn from(map: Map<String, Json>) -> Self {
        map.into_iter().collect()
    }
}

impl fmt::Display for Values {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (k, v)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{k}={v}")?;
        }
        f.write_str("}")
    }
}
