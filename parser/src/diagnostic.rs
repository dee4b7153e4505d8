//! Non-fatal reports produced while parsing.

use std::fmt;

use crate::scanner::Marker;

/// How serious a [`Diagnostic`] is.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord)]
pub enum Severity {
    /// The input was accepted, but may not mean what its author intended.
    Warning,
    /// The input was rejected. Loading may have resumed at the next document.
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

/// A message about the input, attached to a position.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Diagnostic {
    /// How serious the report is.
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
    /// Where in the input the report applies.
    pub mark: Marker,
}

impl Diagnostic {
    /// Create a new [`Severity::Warning`].
    #[must_use]
    pub fn warning(mark: Marker, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            mark,
        }
    }

    /// Create a new [`Severity::Error`].
    #[must_use]
    pub fn error(mark: Marker, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            mark,
        }
    }

    /// Whether this is a [`Severity::Warning`].
    #[must_use]
    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} at {}", self.severity, self.message, self.mark)
    }
}
