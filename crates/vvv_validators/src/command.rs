//! command: Run an external program against each matching file.
//!
//! Wraps any command line linter that takes a file name as its last argument
//! and signals problems with a non-zero exit status. Its combined output is
//! reported verbatim.
//!
//! # Configuration
//!
//! Command validators are declared in the `commands` list of
//! `validation-options.yaml`:
//!
//! | Field | Type | Default | Description |
//! |-------|------|---------|-------------|
//! | id | string | required | Validator id, must be unique |
//! | command | string | required | Program to run |
//! | args | list | `[]` | Arguments placed before the file name |
//! | files | list | `["*"]` | Default file patterns |
//! | requires | list | `[]` | Executables that must be on `PATH` |
//! | install | string | none | Shell command run once in the installation directory |
//! | binary | bool | `false` | Also validate binary files |
//!
//! # Example
//!
//! ```yaml
//! commands:
//!   - id: shellcheck
//!     command: shellcheck
//!     args: ["--format", "gcc"]
//!     files: ["*.sh"]
//!   - id: flake8
//!     command: flake8
//!     requires: [python3]
//!     install: python3 -m venv . && bin/pip install flake8
//!     files: ["*.py"]
//! ```

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

use serde::Deserialize;
use tracing::{debug, info};
use vvv_plugin::{Outcome, Plugin, PluginContext, PluginError, Reporter, SourceFile, sysdeps};

/// Marker written into the installation directory after a successful install.
pub const INSTALLED_MARKER: &str = ".vvv-installed";

fn default_files() -> Vec<String> {
    vec!["*".to_string()]
}

/// Declaration of an external command validator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandSpec {
    pub id: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_files")]
    pub files: Vec<String>,
    #[serde(default)]
    pub requires: Vec<String>,
    #[serde(default)]
    pub install: Option<String>,
    #[serde(default)]
    pub binary: bool,
}

/// Generic subprocess validator.
#[derive(Debug, Clone)]
pub struct CommandPlugin {
    spec: CommandSpec,
}

impl CommandPlugin {
    pub fn new(spec: CommandSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    /// `PATH` with the installation's `bin/` directory in front.
    fn search_path(&self, ctx: &PluginContext) -> Option<OsString> {
        let mut dirs = vec![ctx.installation_path.join("bin")];
        if let Some(path) = env::var_os("PATH") {
            dirs.extend(env::split_paths(&path));
        }
        env::join_paths(dirs).ok()
    }

    /// Resolves the program, relative paths being relative to the project root.
    fn resolve_program(&self, ctx: &PluginContext) -> Option<PathBuf> {
        let command = self.spec.command.as_str();
        if command.contains('/') {
            let candidate = ctx.project_root.join(command);
            return sysdeps::which_in(&candidate.to_string_lossy(), None);
        }
        sysdeps::which_in(command, self.search_path(ctx).as_deref())
    }

    fn marker(&self, ctx: &PluginContext) -> PathBuf {
        ctx.installation_path.join(INSTALLED_MARKER)
    }
}

fn combined_output(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    [stdout.trim_end(), stderr.trim_end()]
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("\n")
}

impl Plugin for CommandPlugin {
    fn default_matchlist(&self) -> Vec<String> {
        self.spec.files.clone()
    }

    fn is_binary_friendly(&self) -> bool {
        self.spec.binary
    }

    fn default_hint(&self) -> Option<String> {
        Some(format!(
            "Files did not pass {}. Fix the reported issues or adjust validation-files.yaml.",
            self.spec.command
        ))
    }

    fn check_is_installed(&self, ctx: &PluginContext) -> Result<bool, PluginError> {
        if self.spec.install.is_some() {
            let installed = self.marker(ctx).exists();
            debug!("{} installation marker present: {}", self.spec.id, installed);
            return Ok(installed);
        }
        Ok(self.resolve_program(ctx).is_some())
    }

    fn check_requirements(&self, _ctx: &PluginContext) -> Result<(), PluginError> {
        for requirement in &self.spec.requires {
            sysdeps::has_exe(requirement, &self.spec.id)?;
        }
        Ok(())
    }

    fn install(&mut self, ctx: &PluginContext) -> Result<(), PluginError> {
        let Some(script) = &self.spec.install else {
            return Err(PluginError::missing_dependency(
                &self.spec.command,
                &self.spec.id,
            ));
        };

        fs::create_dir_all(&ctx.installation_path)?;
        info!(
            "Installing {} in {}",
            self.spec.id,
            ctx.installation_path.display()
        );

        let output = Command::new("sh")
            .arg("-c")
            .arg(script)
            .current_dir(&ctx.installation_path)
            .output()
            .map_err(|e| PluginError::command(format!("Could not run install script: {}", e)))?;

        if !output.status.success() {
            return Err(PluginError::command(format!(
                "Install script for {} failed with {}\n{}",
                self.spec.id,
                output.status,
                combined_output(&output)
            )));
        }

        fs::write(self.marker(ctx), script)?;
        Ok(())
    }

    fn validate(
        &mut self,
        ctx: &PluginContext,
        file: &SourceFile,
        reporter: &Reporter,
    ) -> Result<Outcome, PluginError> {
        let program = self
            .resolve_program(ctx)
            .unwrap_or_else(|| PathBuf::from(&self.spec.command));

        let mut command = Command::new(&program);
        command
            .args(&self.spec.args)
            .arg(&file.path)
            .current_dir(&ctx.project_root);
        if let Some(path) = self.search_path(ctx) {
            command.env("PATH", path);
        }

        debug!("Running {:?}", command);
        let output = command.output().map_err(|e| {
            PluginError::command(format!("Could not run {}: {}", program.display(), e))
        })?;

        if output.status.success() {
            return Ok(Outcome::Passed);
        }

        let mut text = combined_output(&output);
        if text.is_empty() {
            text = format!("{} exited with {}", self.spec.command, output.status);
        }
        reporter.report_unstructured(&ctx.id, text, Some(&file.relative))?;
        Ok(Outcome::Failed)
    }
}
