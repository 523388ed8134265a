//! YAML configuration files.
//!
//! Two optional files live in the project root:
//!
//! - `validation-options.yaml`: per-validator options keyed by validator id,
//!   plus the `commands` list declaring external command validators
//! - `validation-files.yaml`: file patterns keyed by validator id, plus the
//!   `all` section holding the global patterns
//!
//! ```yaml
//! # validation-files.yaml
//! all: |
//!   *
//!   !.*
//!   !node_modules
//!   !vendor
//!
//! linelength:
//!   - "*.py"
//!   - "*.rst"
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};
use tracing::debug;
use vvv_plugin::PluginOptions;
use vvv_validators::CommandSpec;

use crate::VvvError;

/// Default name of the options file.
pub const OPTIONS_FILE_NAME: &str = "validation-options.yaml";

/// Default name of the files file.
pub const FILES_FILE_NAME: &str = "validation-files.yaml";

/// Default installation directory, relative to the project root.
pub const INSTALLATION_DIR_NAME: &str = ".vvv";

/// Files file section holding the global patterns.
pub const ALL_SECTION: &str = "all";

/// Options file key holding external command validators.
pub const COMMANDS_KEY: &str = "commands";

/// How many parent directories are searched for configuration files.
pub const MAX_SEARCH_DEPTH: usize = 100;

/// Global patterns used when the files file has no `all` section.
pub const DEFAULT_MATCHLIST: &[&str] = &[
    "*",
    "!.*",
    "!node_modules",
    "!__pycache__",
    "!*.pyc",
    "!*.pyo",
    "!*.egg-info",
    "!target",
    "!build",
    "!dist",
    "!CVS",
];

/// Reads a YAML file into its top-level mapping.
///
/// An empty document is an empty mapping.
fn read_mapping(path: &Path) -> Result<Mapping, VvvError> {
    let text = fs::read_to_string(path).map_err(|e| {
        VvvError::config(format!("Could not read {}: {}", path.display(), e))
    })?;
    parse_mapping(&text, path)
}

fn parse_mapping(text: &str, path: &Path) -> Result<Mapping, VvvError> {
    let value: Value = serde_yaml::from_str(text).map_err(|source| VvvError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;
    match value {
        Value::Null => Ok(Mapping::new()),
        Value::Mapping(mapping) => Ok(mapping),
        _ => Err(VvvError::config(format!(
            "{} must contain a mapping at the top level",
            path.display()
        ))),
    }
}

fn section_key(key: &Value, path: &Path) -> Result<String, VvvError> {
    key.as_str().map(str::to_string).ok_or_else(|| {
        VvvError::config(format!(
            "{}: section names must be strings, got {:?}",
            path.display(),
            key
        ))
    })
}

/// Parsed `validation-options.yaml`.
#[derive(Debug, Clone, Default)]
pub struct OptionsFile {
    sections: HashMap<String, Mapping>,
    commands: Vec<CommandSpec>,
}

impl OptionsFile {
    /// Loads and validates an options file.
    pub fn load(path: &Path) -> Result<Self, VvvError> {
        Self::from_mapping(read_mapping(path)?, path)
    }

    /// Parses options from YAML text. `origin` is used in error messages.
    pub fn parse(text: &str, origin: &Path) -> Result<Self, VvvError> {
        Self::from_mapping(parse_mapping(text, origin)?, origin)
    }

    fn from_mapping(mapping: Mapping, path: &Path) -> Result<Self, VvvError> {
        let mut options = Self::default();

        for (key, value) in mapping {
            let name = section_key(&key, path)?;

            if name == COMMANDS_KEY {
                options.commands = match value {
                    Value::Null => Vec::new(),
                    value => serde_yaml::from_value(value).map_err(|source| VvvError::Yaml {
                        path: path.to_path_buf(),
                        source,
                    })?,
                };
                continue;
            }

            let section = match value {
                Value::Null => Mapping::new(),
                Value::Mapping(section) => section,
                _ => {
                    return Err(VvvError::config(format!(
                        "{}: options for {} must be a mapping",
                        path.display(),
                        name
                    )));
                }
            };
            options.sections.insert(name, section);
        }

        Ok(options)
    }

    /// Options of `id`, empty if the file has no section for it.
    pub fn plugin_options(&self, id: &str) -> PluginOptions {
        match self.sections.get(id) {
            Some(section) => PluginOptions::new(id, section.clone()),
            None => PluginOptions::empty(id),
        }
    }

    /// Ids of all configured sections.
    pub fn section_ids(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// External command validator declarations, in file order.
    pub fn commands(&self) -> &[CommandSpec] {
        &self.commands
    }
}

/// Parsed `validation-files.yaml`.
#[derive(Debug, Clone, Default)]
pub struct FilesFile {
    sections: HashMap<String, Vec<String>>,
}

impl FilesFile {
    /// Loads and validates a files file.
    pub fn load(path: &Path) -> Result<Self, VvvError> {
        Self::from_mapping(read_mapping(path)?, path)
    }

    /// Parses patterns from YAML text. `origin` is used in error messages.
    pub fn parse(text: &str, origin: &Path) -> Result<Self, VvvError> {
        Self::from_mapping(parse_mapping(text, origin)?, origin)
    }

    fn from_mapping(mapping: Mapping, path: &Path) -> Result<Self, VvvError> {
        let mut sections = HashMap::new();
        for (key, value) in mapping {
            let name = section_key(&key, path)?;
            let patterns = pattern_list(&value).ok_or_else(|| {
                VvvError::config(format!(
                    "{}: patterns for {} must be a list or a block of text",
                    path.display(),
                    name
                ))
            })?;
            sections.insert(name, patterns);
        }
        Ok(Self { sections })
    }

    /// Patterns configured for `id`.
    pub fn patterns(&self, id: &str) -> Option<&[String]> {
        self.sections.get(id).map(Vec::as_slice)
    }

    /// Global patterns, falling back to [`DEFAULT_MATCHLIST`].
    pub fn global_patterns(&self) -> Vec<String> {
        match self.patterns(ALL_SECTION) {
            Some(patterns) => patterns.to_vec(),
            None => DEFAULT_MATCHLIST.iter().map(|p| (*p).to_string()).collect(),
        }
    }

    /// Ids of all configured sections.
    pub fn section_ids(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }
}

/// A pattern section is either a list of strings or a whitespace separated
/// block of text.
fn pattern_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Null => Some(Vec::new()),
        Value::String(block) => Some(block.split_whitespace().map(str::to_string).collect()),
        Value::Sequence(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => None,
    }
}

/// Loads an optional configuration file.
///
/// An explicitly given file must exist. Otherwise `default_name` is looked up
/// in `project_root` and silently skipped if absent.
pub fn resolve_file(
    explicit: Option<&Path>,
    project_root: &Path,
    default_name: &str,
) -> Result<Option<PathBuf>, VvvError> {
    match explicit {
        Some(path) if path.is_file() => Ok(Some(path.to_path_buf())),
        Some(path) => Err(VvvError::config(format!(
            "Configuration file {} does not exist",
            path.display()
        ))),
        None => {
            let candidate = project_root.join(default_name);
            if candidate.is_file() {
                Ok(Some(candidate))
            } else {
                debug!("No {} in {}", default_name, project_root.display());
                Ok(None)
            }
        }
    }
}

/// Finds the nearest directory, starting from `start` itself, that contains a
/// configuration file.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .take(MAX_SEARCH_DEPTH)
        .find(|dir| {
            dir.join(OPTIONS_FILE_NAME).is_file() || dir.join(FILES_FILE_NAME).is_file()
        })
        .map(Path::to_path_buf)
}
