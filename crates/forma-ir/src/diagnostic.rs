//! Diagnostics reported to the user, attributable to a declaration site.

use std::fmt;
use std::path::PathBuf;

use crate::decl::SourceSpan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

/// The declaration a diagnostic points at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Origin {
    /// The declaring element, e.g. `models::User` or `models::User::get_name`.
    pub element: String,
    pub span: Option<SourceSpan>,
    pub file: Option<PathBuf>,
    /// Provenance of the setting involved, for setting validation errors.
    pub setting: Option<String>,
}

impl Origin {
    pub fn new(element: impl Into<String>) -> Self {
        Self {
            element: element.into(),
            ..Default::default()
        }
    }

    pub fn with_span(mut self, span: Option<SourceSpan>) -> Self {
        self.span = span;
        self
    }

    pub fn with_file(mut self, file: Option<PathBuf>) -> Self {
        self.file = file;
        self
    }

    pub fn with_setting(mut self, provenance: impl Into<String>) -> Self {
        self.setting = Some(provenance.into());
        self
    }

    /// `file:line:column` when known, otherwise the element name.
    pub fn location(&self) -> String {
        match (&self.file, self.span) {
            (Some(file), Some(span)) => format!("{}:{span}", file.display()),
            (Some(file), None) => file.display().to_string(),
            (None, Some(span)) => format!("{}:{span}", self.element),
            (None, None) => self.element.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{severity}: {message}")]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub origin: Origin,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, origin: Origin) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            origin,
        }
    }

    pub fn warning(message: impl Into<String>, origin: Origin) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            origin,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// An ordered batch of diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    pub fn append(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn has_errors(&self) -> bool {
        self.0.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.0.iter().filter(|d| d.is_error()).count()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    /// `Ok(value)` unless an error was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, Diagnostics> {
        if self.has_errors() {
            Err(self)
        } else {
            Ok(value)
        }
    }
}

impl From<Diagnostic> for Diagnostics {
    fn from(diagnostic: Diagnostic) -> Self {
        Self(vec![diagnostic])
    }
}

impl Extend<Diagnostic> for Diagnostics {
    fn extend<I: IntoIterator<Item = Diagnostic>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl FromIterator<Diagnostic> for Diagnostics {
    fn from_iter<I: IntoIterator<Item = Diagnostic>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diagnostic) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{diagnostic} ({})", diagnostic.origin.location())?;
        }
        Ok(())
    }
}
