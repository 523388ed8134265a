//! Ordered include/exclude pattern lists.
//!
//! A [`MatchList`] is compiled once from pattern strings and then answers
//! whether a project relative path is included. Rules are evaluated in order
//! and the last rule matching a path decides its fate. A path matched by no
//! rule is excluded.
//!
//! Pattern grammar, one entry per pattern:
//!
//! | Form | Meaning |
//! |------|---------|
//! | `*.py` | Glob tested against the file or directory name |
//! | `docs/*.rst` | Glob containing `/`, tested against the whole relative path |
//! | `/build` | Glob anchored to the project root |
//! | `RE:.*\.min\.js` | Regular expression tested against the whole relative path |
//! | `!pattern` | Any of the above, excluding instead of including |
//!
//! Globs support `*`, `?`, `[...]`, `{a,b}` and `**`. A single `*` or `?`
//! never crosses a `/`.

use std::fmt;

use globset::{GlobBuilder, GlobMatcher};
use regex::Regex;

use crate::VvvError;

/// Prefix marking a regular expression pattern.
pub const REGEX_PREFIX: &str = "RE:";

/// Prefix flipping a pattern to exclusion.
pub const NEGATION_PREFIX: char = '!';

/// What a matching rule does to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Polarity {
    Include,
    Exclude,
}

#[derive(Debug, Clone)]
enum Matcher {
    Glob {
        matcher: GlobMatcher,
        /// Tested against the last path segment only.
        basename: bool,
    },
    Regex(Regex),
}

impl Matcher {
    fn is_match(&self, path: &str) -> bool {
        match self {
            Matcher::Glob { matcher, basename } => {
                let candidate = if *basename {
                    path.rsplit('/').next().unwrap_or(path)
                } else {
                    path
                };
                matcher.is_match(candidate)
            }
            Matcher::Regex(regex) => regex.is_match(path),
        }
    }
}

#[derive(Debug, Clone)]
struct Rule {
    text: String,
    polarity: Polarity,
    matcher: Matcher,
}

impl Rule {
    fn compile(text: &str) -> Result<Self, VvvError> {
        let (polarity, body) = match text.strip_prefix(NEGATION_PREFIX) {
            Some(rest) => (Polarity::Exclude, rest.trim_start()),
            None => (Polarity::Include, text),
        };

        let matcher = if let Some(expr) = body.strip_prefix(REGEX_PREFIX) {
            let anchored = format!("^(?:{})$", expr);
            let regex = Regex::new(&anchored).map_err(|e| VvvError::pattern(text, e))?;
            Matcher::Regex(regex)
        } else {
            compile_glob(text, body)?
        };

        Ok(Self {
            text: text.to_string(),
            polarity,
            matcher,
        })
    }
}

fn compile_glob(text: &str, body: &str) -> Result<Matcher, VvvError> {
    let body = body.strip_prefix("./").unwrap_or(body);
    let body = body.trim_end_matches('/');
    let rooted = body.starts_with('/');
    let glob = body.trim_start_matches('/');

    if glob.is_empty() {
        return Err(VvvError::pattern(text, "empty pattern"));
    }

    let matcher = GlobBuilder::new(glob)
        .literal_separator(true)
        .backslash_escape(true)
        .build()
        .map_err(|e| VvvError::pattern(text, e.kind()))?
        .compile_matcher();

    Ok(Matcher::Glob {
        matcher,
        basename: !rooted && !glob.contains('/'),
    })
}

/// Compiled, ordered list of include and exclude rules.
///
/// Evaluation is a pure function of the path and the rules, so a `MatchList`
/// can be shared between threads freely.
#[derive(Clone, Default)]
pub struct MatchList {
    rules: Vec<Rule>,
}

impl MatchList {
    /// Compiles `patterns` in order.
    ///
    /// Surrounding whitespace is trimmed and empty entries are ignored.
    /// Fails on the first malformed glob or regular expression.
    pub fn new<I, S>(patterns: I) -> Result<Self, VvvError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules = patterns
            .into_iter()
            .filter_map(|p| {
                let p = p.as_ref().trim();
                (!p.is_empty()).then(|| Rule::compile(p))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// A list that matches nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the polarity of the last rule matching `path`, if any.
    pub fn decide(&self, path: &str) -> Option<Polarity> {
        self.deciding_rule(path).map(|rule| rule.polarity)
    }

    /// Returns true if `path` is included.
    pub fn matches(&self, path: &str) -> bool {
        self.decide(path) == Some(Polarity::Include)
    }

    /// Returns the pattern that decides `path`, for match debugging.
    pub fn explain(&self, path: &str) -> Option<&str> {
        self.deciding_rule(path).map(|rule| rule.text.as_str())
    }

    fn deciding_rule(&self, path: &str) -> Option<&Rule> {
        self.rules.iter().rev().find(|rule| rule.matcher.is_match(path))
    }

    /// Pattern texts in evaluation order.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|rule| rule.text.as_str())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl fmt::Debug for MatchList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.patterns()).finish()
    }
}
