//! Finding types for validation results.

use serde::{Deserialize, Serialize};

/// Severity level for findings.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Error - must be fixed.
    #[default]
    Error,
    /// Warning - should be reviewed.
    Warning,
    /// Info - informational message.
    Info,
}

/// One structured problem reported by a validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// The plugin that generated this finding.
    pub plugin_id: String,

    /// Project root relative path of the offending file.
    pub path: String,

    /// 1-based line number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,

    /// 1-based column number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,

    /// Severity level.
    #[serde(default)]
    pub severity: Severity,

    /// Validator specific message code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// One line message.
    pub message: String,

    /// The offending source text, or multi-line details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
}

impl Finding {
    /// Creates a new finding.
    pub fn new(
        plugin_id: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            path: path.into(),
            line: None,
            column: None,
            severity: Severity::Error,
            code: None,
            message: message.into(),
            excerpt: None,
        }
    }

    /// Sets the line number.
    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Sets the column number.
    pub fn with_column(mut self, column: usize) -> Self {
        self.column = Some(column);
        self
    }

    /// Sets the severity level.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Sets the message code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Sets the excerpt.
    pub fn with_excerpt(mut self, excerpt: impl Into<String>) -> Self {
        self.excerpt = Some(excerpt.into());
        self
    }

    /// Renders the finding as plain text.
    pub fn render(&self) -> String {
        let mut out = self.path.clone();
        if let Some(line) = self.line {
            out.push_str(&format!(":{}", line));
            if let Some(column) = self.column {
                out.push_str(&format!(":{}", column));
            }
        }
        out.push_str(&format!(": [{}]", self.plugin_id));
        if let Some(code) = &self.code {
            out.push_str(&format!(" [{}]", code));
        }
        out.push(' ');
        out.push_str(&self.message);

        if let Some(excerpt) = &self.excerpt {
            for line in excerpt.trim_end_matches(&['\r', '\n'][..]).lines() {
                out.push_str("\n    ");
                out.push_str(line);
            }
        }
        out
    }
}
