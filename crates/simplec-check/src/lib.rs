//! Expression/statement typing, coercion, and polymorphic instantiation (§4).
//!
//! This crate owns every `JobKind`'s step logic (`dispatch`), the rules that
//! logic is built from (`expr`, `stmt`, `coerce`), the per-step local-binding
//! scratch state (`context`), and the [`JobRunner`](simplec_engine::JobRunner)
//! that drives `simplec-engine`'s scheduler with them (`checker`).

mod checker;
mod coerce;
mod context;
mod dispatch;
mod expr;
mod stmt;

pub use checker::Checker;
