//! The capability contract every validator implements.

use std::path::PathBuf;

use crate::{PluginError, PluginOptions, Reporter, SourceFile};

/// Result of validating one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// No problems found.
    Passed,
    /// At least one problem was reported.
    Failed,
}

impl Outcome {
    /// Returns true if the validation failed.
    pub fn is_failed(self) -> bool {
        self == Outcome::Failed
    }
}

/// Per-plugin context handed to every lifecycle call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginContext {
    /// Plugin id as registered with the orchestrator.
    pub id: String,
    /// Absolute project root.
    pub project_root: PathBuf,
    /// Directory owned exclusively by this plugin for downloaded tooling.
    pub installation_path: PathBuf,
}

impl PluginContext {
    /// Creates a new context.
    pub fn new(
        id: impl Into<String>,
        project_root: impl Into<PathBuf>,
        installation_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id: id.into(),
            project_root: project_root.into(),
            installation_path: installation_path.into(),
        }
    }
}

/// A validator.
///
/// The orchestrator drives the lifecycle: `setup` once per run, then for each
/// matching file `check_is_installed` (until it succeeds), `check_requirements`
/// and `install` when needed, and finally `validate`.
///
/// Matching against the plugin's file patterns and binary detection happen
/// before any of these calls; a plugin only ever sees files it applies to.
pub trait Plugin: Send {
    /// File patterns used when the files configuration has no section for
    /// this plugin.
    fn default_matchlist(&self) -> Vec<String>;

    /// Returns true if this plugin must see binary files too.
    fn is_binary_friendly(&self) -> bool {
        false
    }

    /// Reads plugin specific options.
    fn setup(&mut self, _ctx: &PluginContext, _options: &PluginOptions) -> Result<(), PluginError> {
        Ok(())
    }

    /// Remediation message shown once if any file fails and the options
    /// file does not provide one.
    fn default_hint(&self) -> Option<String> {
        None
    }

    /// Checks whether the external tooling is already in place.
    fn check_is_installed(&self, _ctx: &PluginContext) -> Result<bool, PluginError> {
        Ok(true)
    }

    /// Checks that the system has the facilities (java, node, ...) needed to
    /// install and run the validator.
    fn check_requirements(&self, _ctx: &PluginContext) -> Result<(), PluginError> {
        Ok(())
    }

    /// Downloads and installs the validator tooling.
    fn install(&mut self, _ctx: &PluginContext) -> Result<(), PluginError> {
        Ok(())
    }

    /// Validates a file, reporting problems to `reporter`.
    fn validate(
        &mut self,
        ctx: &PluginContext,
        file: &SourceFile,
        reporter: &Reporter,
    ) -> Result<Outcome, PluginError>;
}
