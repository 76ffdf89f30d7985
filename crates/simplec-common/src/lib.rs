//! Common types and utilities shared across the simplec compiler core.
//!
//! This crate provides foundational types used by every other crate in the
//! workspace:
//! - Source ranges (`FileRange`, 1-based, inclusive — the parser→core contract)
//! - The diagnostics model (`Diagnostic`, `DiagnosticCategory`, `DiagnosticKind`)
//! - Centralized limits and thresholds (`limits`)
//! - Engine-wide options (`EngineOptions`)

pub mod range;
pub use range::FileRange;

pub mod diagnostics;
pub use diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticKind, DiagnosticSink};

pub mod limits;

pub mod options;
pub use options::{AddressSize, EngineOptions};

pub mod ids;
pub use ids::{DefId, JobId, ScopeId};
