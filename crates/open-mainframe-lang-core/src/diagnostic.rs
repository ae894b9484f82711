//! Diagnostic types for language compiler error/warning reporting.
//!
//! These types provide a uniform way for all language crates to report
//! errors, warnings, and informational messages with source location
//! context. A semantic analyzer never formats message text ad hoc: it
//! renders a structured diagnostic kind into a [`Diagnostic`] and hands it
//! to a [`DiagnosticSink`], optionally attaching secondary [`Note`]s that
//! point at related source ("note: previous definition here").

use std::fmt;

use crate::span::Span;

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Error — prevents successful compilation/execution.
    Error,
    /// Warning — compilation continues but something looks suspicious.
    Warning,
    /// Informational — not a problem, but worth noting.
    Info,
}

/// A secondary note attached to a diagnostic, pointing at related source.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    /// Location the note refers to.
    pub span: Span,
    /// Note text (e.g., "previous definition here").
    pub message: String,
}

/// A diagnostic message from the compiler.
///
/// Diagnostics are produced during semantic analysis, type checking, or
/// other validation phases. Each diagnostic carries a source location,
/// severity, a stable code, and zero or more secondary notes.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Severity of the diagnostic.
    pub severity: Severity,
    /// Stable code (e.g., "F-E101", "COBOL-W003").
    pub code: String,
    /// Human-readable message describing the issue.
    pub message: String,
    /// Source location where the issue was found.
    pub span: Span,
    /// Secondary notes pointing at related locations.
    pub notes: Vec<Note>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(code: impl Into<String>, message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Error,
            code: code.into(),
            message: message.into(),
            span,
            notes: Vec::new(),
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(code: impl Into<String>, message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Warning,
            code: code.into(),
            message: message.into(),
            span,
            notes: Vec::new(),
        }
    }

    /// Attach a secondary note to this diagnostic.
    pub fn with_note(mut self, span: Span, message: impl Into<String>) -> Self {
        self.notes.push(Note {
            span,
            message: message.into(),
        });
        self
    }

    /// Returns `true` if this diagnostic is an error.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.code, self.message)?;
        for note in &self.notes {
            write!(f, "; note: {}", note.message)?;
        }
        Ok(())
    }
}

/// Collects diagnostics produced during one compilation.
///
/// The sink is the narrow interface between an analysis phase and the
/// outer tooling: the phase reports structured diagnostics, the driver
/// decides how to render them.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
}

impl DiagnosticSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a diagnostic into the sink.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        if diagnostic.is_error() {
            self.error_count += 1;
        }
        self.diagnostics.push(diagnostic);
    }

    /// All diagnostics reported so far, in report order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Number of error-severity diagnostics reported so far.
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// Whether any error-severity diagnostic has been reported.
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    /// Drain all collected diagnostics, leaving the sink empty.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        self.error_count = 0;
        std::mem::take(&mut self.diagnostics)
    }
}
