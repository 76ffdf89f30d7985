//! `Engine` and the job scheduler (§4.3).
//!
//! The scheduler itself never types an expression or statement — that logic
//! is owned by `simplec-check`'s `Checker`, which implements [`JobRunner`].
//! This breaks what would otherwise be a circular crate dependency (the
//! scheduler must invoke kind-specific step logic; that logic must inspect
//! and mutate scheduler state): `simplec-engine` depends on nothing that
//! depends back on it, and `simplec-check` depends on `simplec-engine`.

use crate::job::{JobInput, JobKind, JobOutcome, JobOutput, JobRecord, JobState};
use crate::scope::ConstantScope;
use simplec_arena::Arena;
use simplec_common::diagnostics::DiagnosticBag;
use simplec_common::{Diagnostic, DiagnosticKind, DiagnosticSink, EngineOptions, FileRange, JobId, ScopeId};
use tracing::{debug, span, Level};

/// Everything the scheduler and name lookup need: the job list, the scope
/// graph, the long-lived compilation arena (§4.1), diagnostics and options.
pub struct Engine {
    pub jobs: Vec<JobRecord>,
    pub scopes: Vec<ConstantScope>,
    pub compilation_arena: Arena,
    pub diagnostics: DiagnosticBag,
    pub options: EngineOptions,
}

impl Engine {
    pub fn new(options: EngineOptions) -> Self {
        Engine {
            jobs: Vec::new(),
            scopes: Vec::new(),
            compilation_arena: Arena::new(),
            diagnostics: DiagnosticBag::default(),
            options,
        }
    }

    pub fn add_scope(&mut self, scope: ConstantScope) -> ScopeId {
        let id = ScopeId::from_index(self.scopes.len());
        self.scopes.push(scope);
        id
    }

    pub fn scope(&self, id: ScopeId) -> &ConstantScope {
        &self.scopes[id.index()]
    }

    pub fn scope_mut(&mut self, id: ScopeId) -> &mut ConstantScope {
        &mut self.scopes[id.index()]
    }

    pub fn add_job(&mut self, kind: JobKind, input: JobInput, range: FileRange) -> JobId {
        let id = JobId::from_index(self.jobs.len());
        self.jobs.push(JobRecord {
            id,
            kind,
            state: JobState::Working,
            input,
            output: None,
            arena: Arena::new(),
            range,
        });
        id
    }

    pub fn job(&self, id: JobId) -> &JobRecord {
        &self.jobs[id.index()]
    }

    pub fn job_mut(&mut self, id: JobId) -> &mut JobRecord {
        &mut self.jobs[id.index()]
    }

    pub fn job_output(&self, id: JobId) -> Option<&JobOutput> {
        self.jobs[id.index()].output.as_ref()
    }

    /// Finds an existing polymorphic-instantiation job for `kind` at
    /// `(scope, statement_index)` whose parameter vector is equal to
    /// `parameters` under type equality + `constant_values_equal` (§4.8:
    /// the memoization key). Returns its id if one exists, so the caller
    /// reuses or waits on it instead of enqueuing a duplicate.
    pub fn find_polymorphic_job(
        &self,
        kind: JobKind,
        scope: ScopeId,
        statement_index: usize,
        parameters: &[crate::job::PolyParam],
    ) -> Option<JobId> {
        self.jobs.iter().find_map(|job| {
            if job.kind != kind {
                return None;
            }
            let JobInput::PolymorphicInstantiation(existing) = &job.input else {
                return None;
            };
            if existing.scope != scope || existing.statement_index != statement_index {
                return None;
            }
            if existing.parameters.len() != parameters.len() {
                return None;
            }
            let matches = existing
                .parameters
                .iter()
                .zip(parameters.iter())
                .all(|(a, b)| a.ty == b.ty && a.value == b.value);
            matches.then_some(job.id)
        })
    }

    /// Finds an existing `TypeFunctionBody` job for `body_scope`, so a call
    /// site reuses it instead of enqueuing a duplicate (§4.5 "Calls": "the
    /// body-typing job is enqueued once, on first call"). Two distinct
    /// function declarations never share a body scope, so `body_scope`
    /// equality alone is a sufficient key.
    pub fn find_function_body_job(&self, body_scope: ScopeId) -> Option<JobId> {
        self.jobs.iter().find_map(|job| {
            if job.kind != JobKind::TypeFunctionBody {
                return None;
            }
            match &job.input {
                JobInput::FunctionBody(input) if input.body_scope == body_scope => Some(job.id),
                _ => None,
            }
        })
    }
}

/// Implemented by the checker: runs one step of a job given everything
/// `Done` so far. Returning `Wait(job_id)` resets the job's private arena
/// (§5): the implementation must re-derive any transient state on the next
/// call rather than caching it across suspensions.
pub trait JobRunner {
    fn run_job(&mut self, engine: &mut Engine, job_id: JobId) -> JobOutcome;
}

/// Runs the scheduler to completion (§4.3): repeatedly scans for a runnable
/// job (`Working`, or `Waiting(k)` with `k` now `Done`), executes its step,
/// and loops until a full pass makes no progress. Anything left non-`Done`
/// at that point is part of a dependency cycle.
pub fn run_to_completion<R: JobRunner>(engine: &mut Engine, runner: &mut R) {
    let _span = span!(Level::DEBUG, "scheduler_run").entered();
    loop {
        let mut ran_any = false;
        let mut index = 0;
        while index < engine.jobs.len() {
            if is_runnable(engine, index) {
                let job_id = engine.jobs[index].id;
                debug!(job = job_id.index(), kind = engine.jobs[index].kind.name(), "stepping job");
                let outcome = runner.run_job(engine, job_id);
                apply_outcome(engine, job_id, outcome);
                ran_any = true;
            }
            index += 1;
        }
        if !ran_any {
            break;
        }
    }
    report_cycles(engine);
}

fn is_runnable(engine: &Engine, index: usize) -> bool {
    match engine.jobs[index].state {
        JobState::Working => true,
        JobState::Waiting(dep) => engine.jobs[dep.index()].is_done(),
        JobState::Done => false,
    }
}

fn apply_outcome(engine: &mut Engine, job_id: JobId, outcome: JobOutcome) {
    match outcome {
        JobOutcome::Done(output) => {
            let job = engine.job_mut(job_id);
            job.output = Some(output);
            job.state = JobState::Done;
        }
        JobOutcome::Wait(dep) => {
            let job = engine.job_mut(job_id);
            job.state = JobState::Waiting(dep);
            job.arena.reset();
        }
    }
}

/// Every job still non-`Done` once the scheduler can make no further
/// progress is, by the termination argument (§4.3), part of a cycle.
fn report_cycles(engine: &mut Engine) {
    let stuck: Vec<JobId> = engine
        .jobs
        .iter()
        .filter(|j| !j.is_done())
        .map(|j| j.id)
        .collect();
    if stuck.is_empty() {
        return;
    }
    let members = if engine.options.report_all_cycle_members {
        &stuck[..]
    } else {
        &stuck[..1]
    };
    for &job_id in members {
        let job = engine.job(job_id);
        let path = job
            .input
            .as_declaration()
            .map(|d| engine.scope(d.scope).file_path.to_string())
            .or_else(|| engine.scopes.first().map(|s| s.file_path.to_string()))
            .unwrap_or_default();
        engine.diagnostics.report(Diagnostic::error(
            DiagnosticKind::CircularDependency,
            path,
            job.range,
            format!("Circular dependency involving a {} job", job.kind.name()),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{DeclJobInput, JobOutcome, JobOutput};

    struct ImmediateRunner;

    impl JobRunner for ImmediateRunner {
        fn run_job(&mut self, engine: &mut Engine, job_id: JobId) -> JobOutcome {
            match engine.job(job_id).input.as_declaration() {
                Some(_) => JobOutcome::Done(JobOutput::ConstantDefinition(crate::job::ConstantDefinitionOutput {
                    ty: simplec_types::Type::default_integer(),
                    value: simplec_types::ConstantValue::Integer(1),
                })),
                None => JobOutcome::Done(JobOutput::FunctionBody(crate::job::FunctionBodyOutput { statements: vec![] })),
            }
        }
    }

    #[test]
    fn jobs_without_dependencies_all_complete() {
        let mut engine = Engine::new(EngineOptions::default());
        let scope = engine.add_scope(ConstantScope::new(None, std::rc::Rc::from(vec![]), true, std::rc::Rc::from("f.sp")));
        let a = engine.add_job(
            JobKind::TypeConstantDefinition,
            JobInput::Declaration(DeclJobInput { scope, statement_index: 0 }),
            FileRange::synthetic(),
        );
        let b = engine.add_job(
            JobKind::TypeConstantDefinition,
            JobInput::Declaration(DeclJobInput { scope, statement_index: 1 }),
            FileRange::synthetic(),
        );
        run_to_completion(&mut engine, &mut ImmediateRunner);
        assert!(engine.job(a).is_done());
        assert!(engine.job(b).is_done());
        assert!(!engine.diagnostics.has_errors());
    }

    struct CyclicRunner;

    impl JobRunner for CyclicRunner {
        fn run_job(&mut self, engine: &mut Engine, job_id: JobId) -> JobOutcome {
            // job 0 waits on job 1 and vice versa: a genuine 2-cycle.
            let other = if job_id.index() == 0 { JobId::from_index(1) } else { JobId::from_index(0) };
            JobOutcome::Wait(other)
        }
    }

    #[test]
    fn mutual_wait_is_reported_as_a_cycle() {
        let mut engine = Engine::new(EngineOptions::default());
        let scope = engine.add_scope(ConstantScope::new(None, std::rc::Rc::from(vec![]), true, std::rc::Rc::from("f.sp")));
        engine.add_job(
            JobKind::TypeConstantDefinition,
            JobInput::Declaration(DeclJobInput { scope, statement_index: 0 }),
            FileRange::new(1, 1, 1, 1),
        );
        engine.add_job(
            JobKind::TypeConstantDefinition,
            JobInput::Declaration(DeclJobInput { scope, statement_index: 1 }),
            FileRange::new(2, 1, 2, 1),
        );
        run_to_completion(&mut engine, &mut CyclicRunner);
        assert!(engine.diagnostics.has_errors());
        assert_eq!(engine.diagnostics.diagnostics.len(), 2);
        assert!(engine
            .diagnostics
            .diagnostics
            .iter()
            .all(|d| d.kind == DiagnosticKind::CircularDependency));
    }
}
