//! System-wide dependency checks.
//!
//! Checks for things like whether `java` or `node` is present before a
//! validator tries to install or run anything.

use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::PluginError;

/// Locates `program` the way a shell would.
///
/// A name containing a path separator is checked as is, anything else is
/// searched on `PATH`.
pub fn which(program: &str) -> Option<PathBuf> {
    which_in(program, env::var_os("PATH").as_deref())
}

/// Locates `program` using the given `PATH` value.
pub fn which_in(program: &str, path_var: Option<&OsStr>) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }

    env::split_paths(path_var?)
        .map(|dir| dir.join(program))
        .find(|path| is_executable(path))
}

/// Fails with a user friendly error if `command` is not installed.
pub fn has_exe(command: &str, needed_for: &str) -> Result<PathBuf, PluginError> {
    which(command).ok_or_else(|| PluginError::missing_dependency(command, needed_for))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
