//! Drives the job scheduler over a directory of pre-parsed AST fixtures.
//!
//! There is no parser in this workspace (§2): a fixture is a `*.json` file
//! holding one source file's already-parsed `Vec<Statement>`, keyed by its
//! path relative to the fixtures directory. This is a test harness, not a
//! substitute for a real front end — real sources never reach this crate as
//! JSON.

use anyhow::{Context, Result};
use rustc_hash::FxHashMap;
use simplec_ast::Statement;
use simplec_check::Checker;
use simplec_common::{EngineOptions, FileRange};
use simplec_engine::{run_to_completion, Engine, FunctionBodyInput, JobInput, JobKind, JobOutput};
use std::path::Path;
use std::rc::Rc;
use tracing::debug;
use walkdir::WalkDir;

/// Reads every `*.json` fixture under `dir` into a path -> statements map,
/// keyed by the path relative to `dir` (e.g. `main.simple.json`).
pub fn load_fixtures(dir: &Path) -> Result<FxHashMap<Rc<str>, Rc<[Statement]>>> {
    let mut sources = FxHashMap::default();
    for entry in WalkDir::new(dir) {
        let entry = entry.with_context(|| format!("walking {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(dir)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .into_owned();
        let text = std::fs::read_to_string(entry.path())
            .with_context(|| format!("reading fixture {}", entry.path().display()))?;
        let statements: Vec<Statement> = serde_json::from_str(&text)
            .with_context(|| format!("parsing fixture {}", entry.path().display()))?;
        debug!(path = %relative, statements = statements.len(), "loaded fixture");
        sources.insert(Rc::from(relative.as_str()), Rc::from(statements));
    }
    Ok(sources)
}

/// Runs the scheduler to completion over `sources`, returning the populated
/// `Engine` (diagnostics, job/scope tables) and the `Checker` that drove it.
///
/// A `TypeFunctionDeclaration`/`TypePolymorphicFunction` job only computes a
/// function's signature; the body is typed lazily, by whichever call site
/// needs it first (`simplec-check`'s `expr.rs`). A whole-file checker can't
/// rely on that: a declared-but-never-called function — `main`, in every one
/// of these fixtures — would never have its body typed, and its diagnostics
/// would never surface. `force_declared_function_bodies` closes that gap by
/// enqueueing a `TypeFunctionBody` job for every completed, non-external
/// declaration that doesn't already have one, and re-running the scheduler
/// until a pass finds nothing left to force.
pub fn run_check(sources: FxHashMap<Rc<str>, Rc<[Statement]>>) -> (Engine, Checker) {
    let mut engine = Engine::new(EngineOptions::default());
    let mut checker = Checker::new();
    for (path, statements) in &sources {
        checker.add_source(Rc::clone(path), Rc::clone(statements));
        engine.add_job(
            JobKind::ParseFile,
            JobInput::ParseFile { path: Rc::clone(path) },
            FileRange::synthetic(),
        );
    }
    run_to_completion(&mut engine, &mut checker);
    force_declared_function_bodies(&mut engine, &mut checker);
    (engine, checker)
}

/// Enqueues a `TypeFunctionBody` job for every `Done` `FunctionDeclaration`
/// output whose `body_scope` has no body job yet, re-running the scheduler
/// after each round, until a round forces nothing new.
fn force_declared_function_bodies(engine: &mut Engine, checker: &mut Checker) {
    loop {
        let pending: Vec<_> = engine
            .jobs
            .iter()
            .filter_map(|job| match &job.output {
                Some(JobOutput::FunctionDeclaration(decl)) => decl.body_scope,
                _ => None,
            })
            .filter(|&body_scope| engine.find_function_body_job(body_scope).is_none())
            .collect();
        if pending.is_empty() {
            break;
        }
        for body_scope in pending {
            engine.add_job(
                JobKind::TypeFunctionBody,
                JobInput::FunctionBody(FunctionBodyInput { scope: body_scope, statement_index: 0, body_scope }),
                FileRange::synthetic(),
            );
        }
        run_to_completion(engine, checker);
    }
}
