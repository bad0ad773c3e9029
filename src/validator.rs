//! Contract validation diagnostics.
//!
//! Resolution never stops at the first problem: every issue is pushed into a
//! [`Diagnostics`] sink keyed to its source location, and the compile run fails
//! once all methods and parameters have been checked.

use std::fmt;
use tracing::warn;

/// Category of a contract validation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// Parameter without any binding directive and no implicit binding
    MissingDirective,
    /// Parameter carrying more than one binding directive
    MultipleDirectives,
    /// Path parameter setting both `decoder` and `list_decoder`
    ConflictingPathDecoders,
    /// A directive field failed a structural check
    InvalidDirective,
    /// A type expression could not be parsed or is not supported where used
    InvalidType,
    /// Unknown or unsupported HTTP verb
    InvalidMethod,
    /// Malformed path template
    InvalidPath,
    /// Endpoint or parameter name that is empty or repeated
    InvalidName,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DiagnosticKind::MissingDirective => "MissingDirective",
            DiagnosticKind::MultipleDirectives => "MultipleDirectives",
            DiagnosticKind::ConflictingPathDecoders => "ConflictingPathDecoders",
            DiagnosticKind::InvalidDirective => "InvalidDirective",
            DiagnosticKind::InvalidType => "InvalidType",
            DiagnosticKind::InvalidMethod => "InvalidMethod",
            DiagnosticKind::InvalidPath => "InvalidPath",
            DiagnosticKind::InvalidName => "InvalidName",
        };
        f.write_str(s)
    }
}

/// One validation failure reported against a contract location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Where the issue occurred, e.g. `ExampleService.getItem(itemId)`
    pub location: String,
    pub kind: DiagnosticKind,
    pub message: String,
    /// Extra context rendered as `key=value`
    pub args: Vec<(String, String)>,
}

impl Diagnostic {
    pub fn new(location: impl Into<String>, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Diagnostic {
            location: location.into(),
            kind,
            message: message.into(),
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_arg(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.args.push((key.into(), value.to_string()));
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.location, self.message)?;
        for (key, value) in &self.args {
            write!(f, " {key}={value}")?;
        }
        Ok(())
    }
}

/// Ordered diagnostic sink; reporting never aborts the run.
#[derive(Debug, Default)]
pub struct Diagnostics {
    issues: Vec<Diagnostic>,
}

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        warn!(
            location = %diagnostic.location,
            kind = %diagnostic.kind,
            message = %diagnostic.message,
            "Contract validation issue"
        );
        self.issues.push(diagnostic);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.issues
    }
}

/// Render diagnostics the way the CLI prints them.
#[must_use]
pub fn format_issues(issues: &[Diagnostic]) -> String {
    let mut out = format!(
        "Contract validation failed. {} issue(s) found:\n",
        issues.len()
    );
    for issue in issues {
        out.push_str(&issue.to_string());
        out.push('\n');
    }
    out
}
