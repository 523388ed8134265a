//! Validation run orchestration.
//!
//! A run resolves the project and its configuration, sets up every
//! registered plugin, walks the targets and offers each candidate file to
//! every plugin in registration order. All findings end up in one
//! [`Reporter`]; its rendered output decides the exit code.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use vvv_plugin::{Aborted, Reporter, SourceFile};

use crate::config::{self, FilesFile, OptionsFile};
use crate::slot::{Dispatch, PluginSlot};
use crate::walker::{self, relative_path};
use crate::{MatchList, PluginRegistry, VvvError};

/// Exit code of a run without violations.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code of a run that reported something.
pub const EXIT_VIOLATIONS: i32 = 1;
/// Exit code for bad command line or configuration.
pub const EXIT_CONFIG_ERROR: i32 = 2;

/// Inputs of a validation run.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    /// Files or directories to validate. Empty means the current directory.
    pub targets: Vec<PathBuf>,
    /// Project root. Discovered from the first target when unset.
    pub project: Option<PathBuf>,
    /// Options file, `<project>/validation-options.yaml` when unset.
    pub options_file: Option<PathBuf>,
    /// Files file, `<project>/validation-files.yaml` when unset.
    pub files_file: Option<PathBuf>,
    /// Installation root, `<project>/.vvv` when unset.
    pub installation: Option<PathBuf>,
    /// Remove plugin installations before running.
    pub reinstall: bool,
    /// Stop at the first reported problem.
    pub abort_on_first_error: bool,
    /// Log every ignored path at `info`.
    pub debug_matching: bool,
}

impl RunConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a target.
    pub fn target(mut self, path: impl Into<PathBuf>) -> Self {
        self.targets.push(path.into());
        self
    }

    pub fn project(mut self, path: impl Into<PathBuf>) -> Self {
        self.project = Some(path.into());
        self
    }

    pub fn abort_on_first_error(mut self, yes: bool) -> Self {
        self.abort_on_first_error = yes;
        self
    }
}

/// A candidate file and the plugins that validated it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DispatchedFile {
    pub path: String,
    pub plugins: Vec<String>,
}

/// Result of a completed (or aborted) run.
#[derive(Debug)]
pub struct RunReport {
    /// Absolute project root.
    pub project_root: PathBuf,
    /// Rendered report, empty when nothing was found.
    pub output: String,
    pub reporter: Reporter,
    /// Files that passed the global patterns, in dispatch order.
    pub files: Vec<DispatchedFile>,
    /// True if fail-fast cancelled the run.
    pub aborted: bool,
}

impl RunReport {
    /// [`EXIT_SUCCESS`] if nothing was reported, [`EXIT_VIOLATIONS`] otherwise.
    ///
    /// Any recorded entry counts, even one that renders as blank text.
    pub fn exit_code(&self) -> i32 {
        if self.output.is_empty() && self.reporter.is_empty() {
            EXIT_SUCCESS
        } else {
            EXIT_VIOLATIONS
        }
    }
}

/// Drives a validation run.
#[derive(Debug)]
pub struct Orchestrator {
    config: RunConfig,
    registry: PluginRegistry,
}

/// Per-run state.
struct RunState {
    project_root: PathBuf,
    global: MatchList,
    dispatcher: Dispatcher,
}

/// The mutable part of a run: plugins, findings and the files seen so far.
struct Dispatcher {
    slots: Vec<PluginSlot>,
    reporter: Reporter,
    files: Vec<DispatchedFile>,
}

fn canonical_target(path: &Path) -> Result<PathBuf, VvvError> {
    fs::canonicalize(path)
        .map_err(|e| VvvError::config(format!("Target {} does not exist: {}", path.display(), e)))
}

fn resolve_project_root(explicit: Option<&Path>, first_target: &Path) -> Result<PathBuf, VvvError> {
    if let Some(project) = explicit {
        let root = fs::canonicalize(project).map_err(|e| {
            VvvError::config(format!("Project {} does not exist: {}", project.display(), e))
        })?;
        if !root.is_dir() {
            return Err(VvvError::config(format!(
                "Project {} is not a directory",
                project.display()
            )));
        }
        return Ok(root);
    }

    let start = if first_target.is_dir() {
        first_target
    } else {
        first_target.parent().unwrap_or(first_target)
    };
    Ok(config::find_project_root(start).unwrap_or_else(|| start.to_path_buf()))
}

impl Orchestrator {
    /// Creates an orchestrator running the built-in validators.
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            registry: PluginRegistry::with_builtins(),
        }
    }

    /// Replaces the plugin registry. Command validators from the options
    /// file are still registered after these.
    pub fn with_registry(mut self, registry: PluginRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Runs the validation.
    ///
    /// Errors are configuration errors detected before any file is
    /// validated. Everything that goes wrong later is recorded in the report.
    pub fn run(self) -> Result<RunReport, VvvError> {
        let Self {
            config,
            mut registry,
        } = self;

        let targets = if config.targets.is_empty() {
            vec![PathBuf::from(".")]
        } else {
            config.targets.clone()
        };
        let targets = targets
            .iter()
            .map(|t| canonical_target(t))
            .collect::<Result<Vec<_>, _>>()?;

        let project_root = resolve_project_root(config.project.as_deref(), &targets[0])?;
        info!("Project root {}", project_root.display());

        let options = match config::resolve_file(
            config.options_file.as_deref(),
            &project_root,
            config::OPTIONS_FILE_NAME,
        )? {
            Some(path) => OptionsFile::load(&path)?,
            None => OptionsFile::default(),
        };
        let files = match config::resolve_file(
            config.files_file.as_deref(),
            &project_root,
            config::FILES_FILE_NAME,
        )? {
            Some(path) => FilesFile::load(&path)?,
            None => FilesFile::default(),
        };

        let global = MatchList::new(files.global_patterns())?;
        debug!("Global patterns {:?}", global);

        registry.register_commands(options.commands())?;
        warn_unknown_sections(&registry, &options, &files);

        let installation_root = match &config.installation {
            Some(path) => std::path::absolute(path)?,
            None => project_root.join(config::INSTALLATION_DIR_NAME),
        };

        let mut slots = Vec::with_capacity(registry.len());
        for (id, plugin) in registry.instantiate() {
            let mut slot = PluginSlot::new(id, plugin, &project_root, &installation_root);
            slot.setup(&options.plugin_options(slot.id()), &files)?;
            slots.push(slot);
        }

        // Validate every target's placement before touching any file.
        let mut relative_targets = Vec::with_capacity(targets.len());
        for target in &targets {
            let relative = relative_path(&project_root, target).ok_or_else(|| {
                VvvError::config(format!(
                    "Target {} is outside of project {}",
                    target.display(),
                    project_root.display()
                ))
            })?;
            relative_targets.push(relative);
        }

        if config.reinstall {
            for slot in slots.iter_mut().filter(|s| s.is_enabled()) {
                slot.reinstall()?;
            }
        }

        let mut state = RunState {
            project_root,
            global,
            dispatcher: Dispatcher {
                slots,
                reporter: Reporter::new(config.abort_on_first_error),
                files: Vec::new(),
            },
        };

        let mut aborted = false;
        for (target, relative) in targets.iter().zip(&relative_targets) {
            if state.run_target(&config, target, relative).is_err() {
                aborted = true;
                info!("Aborting on first error");
                break;
            }
        }

        let Dispatcher {
            reporter, files, ..
        } = state.dispatcher;
        debug!("Checked {} files", files.len());
        Ok(RunReport {
            project_root: state.project_root,
            output: reporter.get_output(),
            reporter,
            files,
            aborted,
        })
    }
}

/// Section ids naming no registered plugin, sorted.
fn unknown_sections<'a>(
    registry: &PluginRegistry,
    ids: impl Iterator<Item = &'a str>,
) -> Vec<&'a str> {
    let mut unknown: Vec<_> = ids
        .filter(|id| *id != config::ALL_SECTION && !registry.contains(id))
        .collect();
    unknown.sort_unstable();
    unknown
}

fn warn_unknown_sections(registry: &PluginRegistry, options: &OptionsFile, files: &FilesFile) {
    for id in unknown_sections(registry, options.section_ids()) {
        warn!("Options given for unknown validator {}", id);
    }
    for id in unknown_sections(registry, files.section_ids()) {
        warn!("File patterns given for unknown validator {}", id);
    }
}

impl RunState {
    fn run_target(&mut self, config: &RunConfig, target: &Path, relative: &str) -> Result<(), Aborted> {
        if !target.is_dir() {
            if walker::is_whitelisted(target, &self.project_root, &self.global) {
                return self.dispatcher.run_file(&self.project_root, relative.to_string());
            }
            info!("File {} is excluded by the global patterns", relative);
            return Ok(());
        }

        if !relative.is_empty() && !walker::is_whitelisted(target, &self.project_root, &self.global)
        {
            info!("Target {} is excluded by the global patterns", relative);
            return Ok(());
        }

        let mut walk = walker::walk_from(&self.project_root, target, &self.global)
            .debug_matching(config.debug_matching);
        for file in walk.by_ref() {
            self.dispatcher.run_file(&self.project_root, file)?;
        }
        if walk.error_count() > 0 {
            warn!("{} entries could not be read", walk.error_count());
        }
        Ok(())
    }
}

impl Dispatcher {
    /// Offers one file to every plugin in registration order.
    fn run_file(&mut self, root: &Path, relative: String) -> Result<(), Aborted> {
        let file = SourceFile::new(root, relative);
        let mut validated_by = Vec::new();
        let mut result = Ok(());

        for slot in &mut self.slots {
            match slot.dispatch(&file, &self.reporter) {
                Ok(Dispatch::Validated(_)) => validated_by.push(slot.id().to_string()),
                Ok(_) => {}
                Err(aborted) => {
                    validated_by.push(slot.id().to_string());
                    result = Err(aborted);
                    break;
                }
            }
        }

        debug!("{}: {}", file.relative, validated_by.join(", "));
        self.files.push(DispatchedFile {
            path: file.relative,
            plugins: validated_by,
        });
        result
    }
}
