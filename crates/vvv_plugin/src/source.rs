//! A file handed to a plugin for validation.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Number of leading bytes inspected by the binary heuristic.
pub const BINARY_PROBE_SIZE: usize = 1024;

/// A candidate file, known by both its project relative and absolute path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Project root relative path with `/` separators. Used in reports.
    pub relative: String,
    /// Absolute path used for I/O.
    pub path: PathBuf,
}

impl SourceFile {
    /// Creates a source file from the project root and a relative path.
    pub fn new(project_root: &Path, relative: impl Into<String>) -> Self {
        let relative = relative.into();
        let path = relative
            .split('/')
            .fold(project_root.to_path_buf(), |acc, part| acc.join(part));
        Self { relative, path }
    }

    /// Checks whether the file looks binary.
    ///
    /// Same heuristic as `git diff`: a NUL byte within the first
    /// [`BINARY_PROBE_SIZE`] bytes.
    pub fn is_binary(&self) -> std::io::Result<bool> {
        let mut buf = [0u8; BINARY_PROBE_SIZE];
        let mut file = File::open(&self.path)?;
        let mut filled = 0;
        while filled < buf.len() {
            let n = file.read(&mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(buf[..filled].contains(&0))
    }
}
