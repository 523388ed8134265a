//! Per-plugin lifecycle state.
//!
//! A [`PluginSlot`] wraps one plugin instance for the duration of a run:
//!
//! ```text
//! Unconfigured --setup--> Configured(enabled | disabled)
//!
//! per file:  Disabled | Skipped | BinarySkipped
//!            | install on demand --> Validated(pass | fail)
//!            | Unavailable | Errored
//! ```
//!
//! Every plugin call is made inside the slot's `plugin` tracing span and
//! behind `catch_unwind`, so a misbehaving validator ends up as an internal
//! error in the report instead of taking the run down.

use std::any::Any;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use tracing::{Span, debug, info, info_span, warn};
use vvv_plugin::{
    Aborted, Outcome, Plugin, PluginContext, PluginError, PluginOptions, Reporter, SourceFile,
};

use crate::config::FilesFile;
use crate::{MatchList, VvvError};

/// Settings resolved for a plugin by [`PluginSlot::setup`].
#[derive(Debug, Clone)]
pub struct PluginSettings {
    pub enabled: bool,
    pub matchlist: MatchList,
    pub hint: Option<String>,
}

/// What happened when a file was offered to a plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The plugin is switched off or was never configured.
    Disabled,
    /// The file is not in the plugin's match list.
    Skipped,
    /// The file is binary and the plugin only handles text.
    BinarySkipped,
    /// The plugin could not be installed earlier in this run.
    Unavailable,
    /// The plugin failed with an internal error on this file.
    Errored,
    /// The plugin validated the file.
    Validated(Outcome),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum InstallState {
    Unknown,
    Installed,
    Unavailable(String),
}

/// One registered plugin and its run-time state.
pub struct PluginSlot {
    ctx: PluginContext,
    plugin: Box<dyn Plugin>,
    settings: Option<PluginSettings>,
    install: InstallState,
    hinted: bool,
    span: Span,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Runs a plugin call, turning a panic into an internal plugin error.
fn guarded<T>(call: impl FnOnce() -> Result<T, PluginError>) -> Result<T, PluginError> {
    panic::catch_unwind(AssertUnwindSafe(call)).unwrap_or_else(|payload| {
        Err(PluginError::internal(format!(
            "panicked: {}",
            panic_message(payload.as_ref())
        )))
    })
}

impl PluginSlot {
    /// Wraps `plugin`. Its installation directory is
    /// `<installation_root>/<id>`.
    pub fn new(
        id: impl Into<String>,
        plugin: Box<dyn Plugin>,
        project_root: &Path,
        installation_root: &Path,
    ) -> Self {
        let id = id.into();
        let span = info_span!("plugin", id = %id);
        let ctx = PluginContext::new(id.clone(), project_root, installation_root.join(&id));
        Self {
            ctx,
            plugin,
            settings: None,
            install: InstallState::Unknown,
            hinted: false,
            span,
        }
    }

    pub fn id(&self) -> &str {
        &self.ctx.id
    }

    pub fn context(&self) -> &PluginContext {
        &self.ctx
    }

    /// Resolved settings, `None` until [`setup`](Self::setup) succeeds.
    pub fn settings(&self) -> Option<&PluginSettings> {
        self.settings.as_ref()
    }

    pub fn is_enabled(&self) -> bool {
        self.settings.as_ref().is_some_and(|s| s.enabled)
    }

    /// Reads the plugin's options and file patterns.
    ///
    /// `enabled` defaults to true. Patterns come from the files file section
    /// named after the plugin, or the plugin's own defaults. The `hint` option
    /// overrides the plugin's default hint.
    pub fn setup(&mut self, options: &PluginOptions, files: &FilesFile) -> Result<(), VvvError> {
        let _span = self.span.clone().entered();
        let id = self.ctx.id.clone();
        let plugin_error = |source| VvvError::Plugin {
            id: id.clone(),
            source,
        };

        let enabled = options.get_bool("enabled", true).map_err(plugin_error)?;
        if !enabled {
            debug!("Disabled by configuration");
            self.settings = Some(PluginSettings {
                enabled,
                matchlist: MatchList::empty(),
                hint: None,
            });
            return Ok(());
        }

        let Self { plugin, ctx, .. } = self;
        guarded(|| plugin.setup(ctx, options)).map_err(plugin_error)?;

        let matchlist = match files.patterns(&id) {
            Some(patterns) => MatchList::new(patterns)?,
            None => MatchList::new(self.plugin.default_matchlist())?,
        };
        let hint = match options.get_string("hint").map_err(plugin_error)? {
            Some(hint) => Some(hint),
            None => self.plugin.default_hint(),
        };
        debug!("Configured with patterns {:?}", matchlist);

        self.settings = Some(PluginSettings {
            enabled,
            matchlist,
            hint,
        });
        Ok(())
    }

    /// Returns true if the plugin is enabled and `relative` is in its
    /// match list.
    pub fn applies_to(&self, relative: &str) -> bool {
        self.settings
            .as_ref()
            .is_some_and(|s| s.enabled && s.matchlist.matches(relative))
    }

    /// Removes the plugin's installation directory so the next file
    /// installs it again.
    pub fn reinstall(&mut self) -> Result<(), VvvError> {
        let path = &self.ctx.installation_path;
        if path.exists() {
            info!("Removing {}", path.display());
            fs::remove_dir_all(path)?;
        }
        self.install = InstallState::Unknown;
        Ok(())
    }

    /// Offers `file` to the plugin.
    ///
    /// Validation failures and internal errors are recorded in `reporter`.
    /// `Err(Aborted)` means the reporter requested fail-fast cancellation.
    pub fn dispatch(&mut self, file: &SourceFile, reporter: &Reporter) -> Result<Dispatch, Aborted> {
        let _span = self.span.clone().entered();

        let Some(settings) = &self.settings else {
            return Ok(Dispatch::Disabled);
        };
        if !settings.enabled {
            return Ok(Dispatch::Disabled);
        }
        if !settings.matchlist.matches(&file.relative) {
            return Ok(Dispatch::Skipped);
        }

        if !self.plugin.is_binary_friendly() {
            match file.is_binary() {
                Ok(true) => {
                    debug!("Skipping binary file {}", file.relative);
                    return Ok(Dispatch::BinarySkipped);
                }
                Ok(false) => {}
                Err(e) => {
                    reporter.report_internal_error(
                        &self.ctx.id,
                        format!("Could not read {}: {}", file.relative, e),
                    )?;
                    return Ok(Dispatch::Errored);
                }
            }
        }

        if !self.ensure_installed(reporter)? {
            return Ok(Dispatch::Unavailable);
        }

        debug!("Validating {}", file.relative);
        let Self { plugin, ctx, .. } = self;
        match guarded(|| plugin.validate(ctx, file, reporter)) {
            Ok(Outcome::Passed) => Ok(Dispatch::Validated(Outcome::Passed)),
            Ok(Outcome::Failed) => {
                self.attach_hint(reporter);
                Ok(Dispatch::Validated(Outcome::Failed))
            }
            Err(PluginError::Aborted(aborted)) => {
                self.attach_hint(reporter);
                Err(aborted)
            }
            Err(e) => {
                warn!("Internal error on {}: {}", file.relative, e);
                reporter.report_internal_error(&self.ctx.id, format!("{}: {}", file.relative, e))?;
                Ok(Dispatch::Errored)
            }
        }
    }

    /// Installs the plugin on first use. Returns false if it is unavailable
    /// for the rest of the run.
    fn ensure_installed(&mut self, reporter: &Reporter) -> Result<bool, Aborted> {
        match &self.install {
            InstallState::Installed => return Ok(true),
            InstallState::Unavailable(reason) => {
                debug!("Unavailable: {}", reason);
                return Ok(false);
            }
            InstallState::Unknown => {}
        }

        let Self { plugin, ctx, .. } = self;
        let result = guarded(|| {
            if plugin.check_is_installed(ctx)? {
                return Ok(());
            }
            plugin.check_requirements(ctx)?;
            info!("Installing {} in {}", ctx.id, ctx.installation_path.display());
            plugin.install(ctx)
        });

        match result {
            Ok(()) => {
                self.install = InstallState::Installed;
                Ok(true)
            }
            Err(PluginError::Aborted(aborted)) => Err(aborted),
            Err(e) => {
                let reason = e.to_string();
                warn!("{}", reason);
                self.install = InstallState::Unavailable(reason.clone());
                reporter.report_internal_error(&self.ctx.id, reason)?;
                Ok(false)
            }
        }
    }

    /// Adds the plugin's hint to the report, once per run.
    fn attach_hint(&mut self, reporter: &Reporter) {
        if self.hinted {
            return;
        }
        if let Some(hint) = self.settings.as_ref().and_then(|s| s.hint.as_ref()) {
            reporter.hint_user(hint.clone());
        }
        self.hinted = true;
    }
}

impl std::fmt::Debug for PluginSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginSlot")
            .field("id", &self.ctx.id)
            .field("settings", &self.settings)
            .field("install", &self.install)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::Path as StdPath;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;
    use vvv_plugin::{Entry, Finding};

    #[derive(Default)]
    struct Calls {
        installed_checks: AtomicUsize,
        installs: AtomicUsize,
        validations: AtomicUsize,
    }

    /// Scripted plugin recording how often each lifecycle step runs.
    struct Scripted {
        calls: Arc<Calls>,
        installed: bool,
        requirements: Option<PluginError>,
        fail: bool,
        panic: bool,
        binary_friendly: bool,
    }

    impl Scripted {
        fn new(calls: Arc<Calls>) -> Self {
            Self {
                calls,
                installed: true,
                requirements: None,
                fail: false,
                panic: false,
                binary_friendly: false,
            }
        }
    }

    impl Plugin for Scripted {
        fn default_matchlist(&self) -> Vec<String> {
            vec!["*.txt".to_string()]
        }

        fn is_binary_friendly(&self) -> bool {
            self.binary_friendly
        }

        fn default_hint(&self) -> Option<String> {
            Some("Fix the scripted problems".to_string())
        }

        fn check_is_installed(&self, _ctx: &PluginContext) -> Result<bool, PluginError> {
            self.calls.installed_checks.fetch_add(1, Ordering::SeqCst);
            Ok(self.installed)
        }

        fn check_requirements(&self, _ctx: &PluginContext) -> Result<(), PluginError> {
            match &self.requirements {
                Some(PluginError::MissingDependency {
                    command,
                    needed_for,
                }) => Err(PluginError::missing_dependency(command, needed_for)),
                _ => Ok(()),
            }
        }

        fn install(&mut self, _ctx: &PluginContext) -> Result<(), PluginError> {
            self.calls.installs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn validate(
            &mut self,
            ctx: &PluginContext,
            file: &SourceFile,
            reporter: &Reporter,
        ) -> Result<Outcome, PluginError> {
            self.calls.validations.fetch_add(1, Ordering::SeqCst);
            if self.panic {
                panic!("scripted panic");
            }
            if self.fail {
                reporter.report_detailed(Finding::new(&ctx.id, &file.relative, "Scripted failure"))?;
                return Ok(Outcome::Failed);
            }
            Ok(Outcome::Passed)
        }
    }

    fn write(root: &StdPath, name: &str, content: &[u8]) -> SourceFile {
        fs::write(root.join(name), content).unwrap();
        SourceFile::new(root, name)
    }

    fn configured(root: &StdPath, plugin: Scripted) -> PluginSlot {
        let mut slot = PluginSlot::new("scripted", Box::new(plugin), root, &root.join(".vvv"));
        slot.setup(&PluginOptions::empty("scripted"), &FilesFile::default())
            .unwrap();
        slot
    }

    #[test]
    fn test_unconfigured_slot_is_disabled() {
        let temp = TempDir::new().unwrap();
        let calls = Arc::new(Calls::default());
        let mut slot = PluginSlot::new(
            "scripted",
            Box::new(Scripted::new(calls.clone())),
            temp.path(),
            &temp.path().join(".vvv"),
        );
        let file = write(temp.path(), "a.txt", b"text");

        assert!(slot.settings().is_none());
        assert_eq!(slot.dispatch(&file, &Reporter::new(false)), Ok(Dispatch::Disabled));
        assert_eq!(calls.validations.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_disabled_by_options() {
        let temp = TempDir::new().unwrap();
        let calls = Arc::new(Calls::default());
        let mut slot = PluginSlot::new(
            "scripted",
            Box::new(Scripted::new(calls.clone())),
            temp.path(),
            &temp.path().join(".vvv"),
        );
        let options = PluginOptions::new(
            "scripted",
            serde_yaml::from_str("enabled: false").unwrap(),
        );
        slot.setup(&options, &FilesFile::default()).unwrap();
        let file = write(temp.path(), "a.txt", b"text");

        assert!(!slot.is_enabled());
        assert_eq!(slot.dispatch(&file, &Reporter::new(false)), Ok(Dispatch::Disabled));
        assert_eq!(calls.installed_checks.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_setup_prefers_files_section_and_hint_option() {
        let temp = TempDir::new().unwrap();
        let mut slot = PluginSlot::new(
            "scripted",
            Box::new(Scripted::new(Arc::default())),
            temp.path(),
            &temp.path().join(".vvv"),
        );
        let files = FilesFile::parse("scripted: \"*.md\"\n", StdPath::new("files.yaml")).unwrap();
        let options = PluginOptions::new(
            "scripted",
            serde_yaml::from_str("hint: Read the docs").unwrap(),
        );

        slot.setup(&options, &files).unwrap();

        let settings = slot.settings().unwrap();
        assert_eq!(settings.matchlist.patterns().collect::<Vec<_>>(), vec!["*.md"]);
        assert_eq!(settings.hint.as_deref(), Some("Read the docs"));
        assert!(slot.applies_to("README.md"));
        assert!(!slot.applies_to("a.txt"));
    }

    #[test]
    fn test_bad_enabled_option_is_plugin_error() {
        let temp = TempDir::new().unwrap();
        let mut slot = PluginSlot::new(
            "scripted",
            Box::new(Scripted::new(Arc::default())),
            temp.path(),
            &temp.path().join(".vvv"),
        );
        let options = PluginOptions::new(
            "scripted",
            serde_yaml::from_str("enabled: sometimes").unwrap(),
        );

        let err = slot.setup(&options, &FilesFile::default()).unwrap_err();
        assert!(matches!(err, VvvError::Plugin { ref id, .. } if id == "scripted"));
    }

    #[test]
    fn test_non_matching_and_binary_files_are_skipped() {
        let temp = TempDir::new().unwrap();
        let calls = Arc::new(Calls::default());
        let mut slot = configured(temp.path(), Scripted::new(calls.clone()));
        let reporter = Reporter::new(false);

        let other = write(temp.path(), "a.md", b"text");
        let binary = write(temp.path(), "b.txt", b"\x00\x01\x02");

        assert_eq!(slot.dispatch(&other, &reporter), Ok(Dispatch::Skipped));
        assert_eq!(slot.dispatch(&binary, &reporter), Ok(Dispatch::BinarySkipped));
        assert_eq!(calls.validations.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_binary_friendly_plugin_sees_binary_files() {
        let temp = TempDir::new().unwrap();
        let calls = Arc::new(Calls::default());
        let mut plugin = Scripted::new(calls.clone());
        plugin.binary_friendly = true;
        let mut slot = configured(temp.path(), plugin);

        let binary = write(temp.path(), "b.txt", b"\x00\x01\x02");

        assert_eq!(
            slot.dispatch(&binary, &Reporter::new(false)),
            Ok(Dispatch::Validated(Outcome::Passed))
        );
    }

    #[test]
    fn test_install_on_demand_runs_once() {
        let temp = TempDir::new().unwrap();
        let calls = Arc::new(Calls::default());
        let mut plugin = Scripted::new(calls.clone());
        plugin.installed = false;
        let mut slot = configured(temp.path(), plugin);
        let reporter = Reporter::new(false);

        for name in ["a.txt", "b.txt", "c.txt"] {
            let file = write(temp.path(), name, b"text");
            assert_eq!(
                slot.dispatch(&file, &reporter),
                Ok(Dispatch::Validated(Outcome::Passed))
            );
        }

        assert_eq!(calls.installed_checks.load(Ordering::SeqCst), 1);
        assert_eq!(calls.installs.load(Ordering::SeqCst), 1);
        assert_eq!(calls.validations.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_missing_dependency_reported_once() {
        let temp = TempDir::new().unwrap();
        let calls = Arc::new(Calls::default());
        let mut plugin = Scripted::new(calls.clone());
        plugin.installed = false;
        plugin.requirements = Some(PluginError::missing_dependency("java", "scripted"));
        let mut slot = configured(temp.path(), plugin);
        let reporter = Reporter::new(false);

        for name in ["a.txt", "b.txt"] {
            let file = write(temp.path(), name, b"text");
            assert_eq!(slot.dispatch(&file, &reporter), Ok(Dispatch::Unavailable));
        }

        assert_eq!(reporter.internal_error_count(), 1);
        assert!(reporter.get_output().contains("java"));
        assert_eq!(calls.installs.load(Ordering::SeqCst), 0);
        assert_eq!(calls.validations.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_failure_attaches_hint_once() {
        let temp = TempDir::new().unwrap();
        let mut plugin = Scripted::new(Arc::default());
        plugin.fail = true;
        let mut slot = configured(temp.path(), plugin);
        let reporter = Reporter::new(false);

        for name in ["a.txt", "b.txt"] {
            let file = write(temp.path(), name, b"text");
            assert_eq!(
                slot.dispatch(&file, &reporter),
                Ok(Dispatch::Validated(Outcome::Failed))
            );
        }

        assert_eq!(reporter.finding_count(), 2);
        assert_eq!(reporter.hints(), vec!["Fix the scripted problems".to_string()]);
    }

    #[test]
    fn test_passing_file_adds_no_hint() {
        let temp = TempDir::new().unwrap();
        let mut slot = configured(temp.path(), Scripted::new(Arc::default()));
        let reporter = Reporter::new(false);
        let file = write(temp.path(), "a.txt", b"text");

        slot.dispatch(&file, &reporter).unwrap();

        assert!(reporter.is_empty());
    }

    #[test]
    fn test_abort_propagates_with_hint() {
        let temp = TempDir::new().unwrap();
        let mut plugin = Scripted::new(Arc::default());
        plugin.fail = true;
        let mut slot = configured(temp.path(), plugin);
        let reporter = Reporter::new(true);
        let file = write(temp.path(), "a.txt", b"text");

        assert_eq!(slot.dispatch(&file, &reporter), Err(Aborted));
        assert!(reporter.is_aborted());
        assert_eq!(reporter.hints().len(), 1);
    }

    #[test]
    fn test_panic_becomes_internal_error() {
        let temp = TempDir::new().unwrap();
        let calls = Arc::new(Calls::default());
        let mut plugin = Scripted::new(calls.clone());
        plugin.panic = true;
        let mut slot = configured(temp.path(), plugin);
        let reporter = Reporter::new(false);

        for name in ["a.txt", "b.txt"] {
            let file = write(temp.path(), name, b"text");
            assert_eq!(slot.dispatch(&file, &reporter), Ok(Dispatch::Errored));
        }

        assert_eq!(calls.validations.load(Ordering::SeqCst), 2);
        let entries = reporter.entries();
        assert_eq!(entries.len(), 2);
        match &entries[0] {
            Entry::InternalError { plugin_id, trace } => {
                assert_eq!(plugin_id, "scripted");
                assert!(trace.contains("scripted panic"));
            }
            other => panic!("Expected internal error, got {:?}", other),
        }
    }

    #[test]
    fn test_panic_in_suicidal_mode_aborts() {
        let temp = TempDir::new().unwrap();
        let mut plugin = Scripted::new(Arc::default());
        plugin.panic = true;
        let mut slot = configured(temp.path(), plugin);
        let reporter = Reporter::new(true);
        let file = write(temp.path(), "a.txt", b"text");

        assert_eq!(slot.dispatch(&file, &reporter), Err(Aborted));
        assert_eq!(reporter.internal_error_count(), 1);
    }

    #[test]
    fn test_reinstall_removes_installation_directory() {
        let temp = TempDir::new().unwrap();
        let mut slot = configured(temp.path(), Scripted::new(Arc::default()));
        let install_dir = slot.context().installation_path.clone();
        fs::create_dir_all(install_dir.join("bin")).unwrap();

        slot.reinstall().unwrap();

        assert!(!install_dir.exists());
        assert_eq!(install_dir, temp.path().join(".vvv").join("scripted"));
    }
}
