//! The diagnostics model (§7).
//!
//! Diagnostics are appended to a per-file sink and never abort the engine
//! (§2, §7): a job that fails still transitions to `Done` (carrying an
//! error/recovery type) so dependents can keep making progress and so one
//! file can yield as many independent diagnostics as possible.

use crate::range::FileRange;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticCategory {
    Error,
    Warning,
}

/// The error kinds enumerated in §7. Kept as data (not `std::error::Error`
/// impls) because diagnostics are sunk, not propagated/unwound.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticKind {
    Lexical,
    Syntactic,
    NameResolution,
    Type,
    Coercion,
    Arity,
    ConstantEvaluation,
    PolymorphicInstantiation,
    CircularDependency,
    UnreachableCode,
    TagMisuse,
    Platform,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub kind: DiagnosticKind,
    pub path: String,
    pub range: FileRange,
    pub message: String,
}

impl Diagnostic {
    pub fn error(kind: DiagnosticKind, path: impl Into<String>, range: FileRange, message: impl Into<String>) -> Self {
        Diagnostic {
            category: DiagnosticCategory::Error,
            kind,
            path: path.into(),
            range,
            message: message.into(),
        }
    }
}

/// A diagnostics sink: the collaborator contract of §6
/// (`register_error_handler(fn(path, range, formatted_message))`).
///
/// Implementations must not re-enter the core from within `report`.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// The simplest sink: an in-memory vector, used by tests and the CLI.
#[derive(Default, Debug)]
pub struct DiagnosticBag {
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSink for DiagnosticBag {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

impl DiagnosticBag {
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.category == DiagnosticCategory::Error)
    }
}
