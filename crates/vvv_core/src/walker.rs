//! Depth-first project tree walker with match list pruning.
//!
//! Built on `walkdir`. Every entry is tested against the match list before it
//! is yielded or descended into:
//! - Rejected directories are pruned, their contents are never read
//! - Entries are visited in file name order, so output is reproducible
//! - Symbolic links are never followed
//! - Unreadable entries are logged and skipped

use std::path::{Component, Path};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::MatchList;

/// Converts `path` to a project relative path with `/` separators.
///
/// Returns `None` if `path` is not inside `root`. The root itself maps to an
/// empty string.
pub fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let mut parts = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(parts.join("/"))
}

/// Lazy sequence of matching files, see [`walk`].
pub struct Walk<'a> {
    root: &'a Path,
    matchlist: &'a MatchList,
    inner: walkdir::IntoIter,
    debug_matching: bool,
    errors: usize,
}

impl<'a> Walk<'a> {
    /// Logs every pruned path at `info` instead of `debug`.
    pub fn debug_matching(mut self, yes: bool) -> Self {
        self.debug_matching = yes;
        self
    }

    /// Number of entries skipped because they could not be read.
    pub fn error_count(&self) -> usize {
        self.errors
    }

    fn log_ignored(&self, relative: &str) {
        let reason = self.matchlist.explain(relative).unwrap_or("no matching pattern");
        if self.debug_matching {
            info!("Ignoring {} ({})", relative, reason);
        } else {
            debug!("Ignoring {} ({})", relative, reason);
        }
    }
}

impl Iterator for Walk<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    self.errors += 1;
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            // The start directory itself is not a candidate.
            if entry.depth() == 0 {
                continue;
            }

            let file_type = entry.file_type();
            if file_type.is_symlink() {
                debug!("Skipping symbolic link {}", entry.path().display());
                continue;
            }

            let Some(relative) = relative_path(self.root, entry.path()) else {
                warn!("Skipping {} outside of project root", entry.path().display());
                continue;
            };

            if !self.matchlist.matches(&relative) {
                self.log_ignored(&relative);
                if file_type.is_dir() {
                    self.inner.skip_current_dir();
                }
                continue;
            }

            if file_type.is_file() {
                return Some(relative);
            }
        }
    }
}

/// Walks `root` and yields matching files relative to `root`.
pub fn walk<'a>(root: &'a Path, matchlist: &'a MatchList) -> Walk<'a> {
    walk_from(root, root, matchlist)
}

/// Walks the `start` directory inside `root`, yielding paths relative to `root`.
///
/// Ancestors of `start` are not tested; use [`is_whitelisted`] for that.
pub fn walk_from<'a>(root: &'a Path, start: &Path, matchlist: &'a MatchList) -> Walk<'a> {
    let inner = WalkDir::new(start)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();

    Walk {
        root,
        matchlist,
        inner,
        debug_matching: false,
        errors: 0,
    }
}

/// Checks a single path the way the walker would reach it.
///
/// Every ancestor directory between `root` and `path`, and `path` itself,
/// must be included by `matchlist`. Paths outside `root` are rejected.
pub fn is_whitelisted(path: &Path, root: &Path, matchlist: &MatchList) -> bool {
    let Some(relative) = relative_path(root, path) else {
        debug!("{} is outside of {}", path.display(), root.display());
        return false;
    };
    if relative.is_empty() {
        return false;
    }

    let mut prefix = String::with_capacity(relative.len());
    for segment in relative.split('/') {
        if !prefix.is_empty() {
            prefix.push('/');
        }
        prefix.push_str(segment);

        if !matchlist.matches(&prefix) {
            debug!(
                "{} rejected at {} ({})",
                relative,
                prefix,
                matchlist.explain(&prefix).unwrap_or("no matching pattern")
            );
            return false;
        }
    }
    true
}
