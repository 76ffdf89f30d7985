//! Narrowest-node hover resolution and UTF-16/UTF-8 position mapping (§4.9).
//!
//! This crate is deliberately thin: the typed-tree descent it hovers over
//! (`TypedExpression::narrowest_at`, `TypedStatement::expression_at`) already
//! lives in `simplec-types`, and the job bookkeeping it reads
//! (`Engine::jobs`, `ConstantScope::file_path`) already lives in
//! `simplec-engine`. What's left, and all this crate owns, is picking the
//! narrowest candidate among a file's declarations/expressions/static-ifs
//! (`hover`) and translating between the core's UTF-8-byte columns and an
//! LSP client's UTF-16 code-unit columns (`position`).
//!
//! JSON-RPC framing and the `initialize`/`didOpen` method dispatch table are
//! out of scope (§1, §6) — a collaborator wires this crate's `hover` up to
//! an actual transport.

pub mod hover;
pub mod position;

pub use hover::{hover, HoverInfo};
pub use position::{file_position_to_utf16, utf16_to_file_position, Utf16Position};
