//! Plugin registration.
//!
//! Validators are known by id and registered up front, built-ins first and
//! external command validators after them. Registration order is dispatch
//! order.

use tracing::debug;
use vvv_plugin::Plugin;
use vvv_validators::{CommandPlugin, CommandSpec};

use crate::VvvError;

/// Creates a fresh plugin instance.
pub type PluginFactory = Box<dyn Fn() -> Box<dyn Plugin> + Send + Sync>;

/// Ordered mapping from plugin id to its factory.
#[derive(Default)]
pub struct PluginRegistry {
    entries: Vec<(String, PluginFactory)>,
}

impl PluginRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in validators.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for (id, factory) in vvv_validators::builtins() {
            registry.entries.push((id.to_string(), Box::new(factory)));
        }
        registry
    }

    /// Registers a plugin. Ids must be unique.
    pub fn register<F>(&mut self, id: impl Into<String>, factory: F) -> Result<(), VvvError>
    where
        F: Fn() -> Box<dyn Plugin> + Send + Sync + 'static,
    {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(VvvError::config("Validator id must not be empty"));
        }
        if self.contains(&id) {
            return Err(VvvError::config(format!(
                "Validator {} is registered more than once",
                id
            )));
        }
        debug!("Registered validator {}", id);
        self.entries.push((id, Box::new(factory)));
        Ok(())
    }

    /// Registers external command validators in the given order.
    pub fn register_commands(&mut self, commands: &[CommandSpec]) -> Result<(), VvvError> {
        for spec in commands {
            let spec = spec.clone();
            self.register(spec.id.clone(), move || {
                Box::new(CommandPlugin::new(spec.clone())) as Box<dyn Plugin>
            })?;
        }
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|(existing, _)| existing == id)
    }

    /// Registered ids in dispatch order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(id, _)| id.as_str())
    }

    /// Creates one instance of every plugin, in dispatch order.
    pub fn instantiate(&self) -> Vec<(String, Box<dyn Plugin>)> {
        self.entries
            .iter()
            .map(|(id, factory)| (id.clone(), factory()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.ids()).finish()
    }
}
