//! `search_for_name` (§4.4).
//!
//! Evaluating a `using`'s module expression requires the full expression
//! typing machinery that `simplec-check` owns, so this function takes that
//! one evaluation as an injected callback rather than depending on
//! `simplec-check` — the same inversion-of-control the scheduler uses for
//! [`crate::JobRunner`], applied at function-call granularity since only one
//! operation (not a whole job kind) needs it here.

use crate::job::JobOutput;
use crate::scheduler::Engine;
use simplec_common::{JobId, ScopeId};

/// What evaluating a `using`'s module expression produced.
pub enum ModuleLookup {
    Scope(ScopeId),
    Wait(JobId),
    /// The expression isn't a module (already diagnosed by the caller) or
    /// hasn't been attempted; name lookup treats it as contributing nothing.
    NotAModule,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NameLookupResult {
    /// Resolved to a job-backed declaration; caller checks `Done`-ness and
    /// reads `declared_type()`/`constant_value()` off its output.
    Found(JobId),
    /// Resolved to a scope-bound constant (§4.8's polymorphic parameter
    /// bindings), identified by its owning scope and `scope_constants` index.
    FoundConstant { scope: ScopeId, index: usize },
    /// The name might still be exposed by a not-yet-resolved `static if`;
    /// the caller must suspend on this job.
    Wait(JobId),
    NotFound,
}

/// Walks, in order: (1) `scope`'s declaration hash table, (2) each `using`
/// whose `export` flag matches `external_only`, (3) each `static if`, (4)
/// `scope_constants` — then its parent, exactly as §4.4 specifies. Step (4)
/// ("at top level, static variable jobs") is folded into step (1): static
/// variables are declaration-like (§4.2) and already populate the same
/// declaration table, so a separate pass over them would just re-find the
/// same entries (documented as an Open Question resolution in `DESIGN.md`).
pub fn search_for_name(
    engine: &Engine,
    scope: ScopeId,
    name: &str,
    external_only: bool,
    resolve_using_target: &mut dyn FnMut(&Engine, ScopeId, usize) -> ModuleLookup,
) -> NameLookupResult {
    let mut current = Some(scope);
    while let Some(scope_id) = current {
        let s = engine.scope(scope_id);

        if let Some(entry) = s.declarations.get(name) {
            return NameLookupResult::Found(entry.job_id);
        }

        for &(stmt_index, export) in &s.using_statements {
            if export != external_only {
                continue;
            }
            match resolve_using_target(engine, scope_id, stmt_index) {
                ModuleLookup::Scope(target) => {
                    match search_for_name(engine, target, name, true, resolve_using_target) {
                        NameLookupResult::NotFound => continue,
                        other => return other,
                    }
                }
                ModuleLookup::Wait(job) => return NameLookupResult::Wait(job),
                ModuleLookup::NotAModule => continue,
            }
        }

        for &(_stmt_index, condition_job, body_scope) in &s.static_ifs {
            match engine.job(condition_job).output.as_ref() {
                Some(JobOutput::StaticIf(out)) if out.condition_true => {
                    match search_for_name(engine, body_scope, name, external_only, resolve_using_target) {
                        NameLookupResult::NotFound => continue,
                        other => return other,
                    }
                }
                Some(JobOutput::StaticIf(_)) => continue,
                _ => return NameLookupResult::Wait(condition_job),
            }
        }

        if let Some(index) = s.scope_constants.iter().position(|c| c.name == name) {
            return NameLookupResult::FoundConstant { scope: scope_id, index };
        }

        current = s.parent;
    }
    NameLookupResult::NotFound
}
