//! Typed access to one plugin's section of the options file.

use serde_yaml::{Mapping, Value};

use crate::PluginError;

/// Options of a single plugin, i.e. the mapping found under the plugin id.
///
/// ```yaml
/// linelength:
///   enabled: true
///   length: 120
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PluginOptions {
    section: String,
    values: Mapping,
}

impl PluginOptions {
    /// Creates options for `section` from its parsed mapping.
    pub fn new(section: impl Into<String>, values: Mapping) -> Self {
        Self {
            section: section.into(),
            values,
        }
    }

    /// Creates an empty option set.
    pub fn empty(section: impl Into<String>) -> Self {
        Self::new(section, Mapping::new())
    }

    /// Returns the raw value of `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Returns true if `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Reads a YAML true/false option.
    pub fn get_bool(&self, key: &str, default: bool) -> Result<bool, PluginError> {
        match self.get(key) {
            None | Some(Value::Null) => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(other) => Err(self.type_error(key, "a boolean", other)),
        }
    }

    /// Reads a YAML integer option.
    pub fn get_int(&self, key: &str, default: u64) -> Result<u64, PluginError> {
        match self.get(key) {
            None | Some(Value::Null) => Ok(default),
            Some(Value::Number(n)) => n.as_u64().ok_or_else(|| {
                self.type_error(key, "a non-negative integer", &Value::Number(n.clone()))
            }),
            Some(other) => Err(self.type_error(key, "a non-negative integer", other)),
        }
    }

    /// Reads a YAML string option.
    pub fn get_string(&self, key: &str) -> Result<Option<String>, PluginError> {
        match self.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(self.type_error(key, "a string", other)),
        }
    }

    /// Reads a list option.
    ///
    /// Accepts either a YAML sequence of strings or a block string of
    /// whitespace separated items.
    pub fn get_list(&self, key: &str) -> Result<Option<Vec<String>>, PluginError> {
        match self.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.split_whitespace().map(str::to_string).collect())),
            Some(Value::Sequence(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    other => Err(self.type_error(key, "a list of strings", other)),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            Some(other) => Err(self.type_error(key, "a list of strings", other)),
        }
    }

    fn type_error(&self, key: &str, expected: &str, found: &Value) -> PluginError {
        PluginError::config(format!(
            "option {}.{} must be {}, found {:?}",
            self.section, key, expected, found
        ))
    }
}
