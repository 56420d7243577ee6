use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SubmitError;

/// A flat set of named option values
///
/// Used for both layers a template is resolved against: the immutable configuration and the
/// general settings derived from it for one submission. A `null` value counts as unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings {
    values: Map<String, Value>,
}

impl Settings {
    pub fn new() -> Settings {
        Settings::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name).filter(|value| !value.is_null())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn insert(&mut self, name: &str, value: impl Into<Value>) {
        self.values.insert(name.to_string(), value.into());
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    /// Overwrite values with every entry of `other`, including explicit nulls
    pub fn extend(&mut self, other: Settings) {
        self.values.extend(other.values);
    }

    /// Only keep the names in `keys`
    pub fn narrow(&self, keys: &[&str]) -> Settings {
        let values = keys
            .iter()
            .filter_map(|key| self.values.get(*key).map(|value| (key.to_string(), value.clone())))
            .collect();
        Settings { values }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }
}

impl From<Map<String, Value>> for Settings {
    fn from(values: Map<String, Value>) -> Self {
        Settings { values }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Settings {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let values = iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        Settings { values }
    }
}

/// Look a name up in the general settings first, then in the configuration
pub fn resolve<'a>(name: &str, general: &'a Settings, config: &'a Settings) -> Result<&'a Value, SubmitError> {
    general
        .get(name)
        .or_else(|| config.get(name))
        .ok_or_else(|| SubmitError::MissingVariable(name.to_string()))
}
