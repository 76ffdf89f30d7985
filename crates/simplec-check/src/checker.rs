//! The `Checker`: `simplec-engine`'s [`JobRunner`] implementation, and the
//! only place this crate's typing rules meet the scheduler.
//!
//! There is no parser in this workspace (§2: out of scope), so a
//! compilation's source files arrive pre-parsed — `Checker` just owns the
//! table the `ParseFile` step reads from.

use rustc_hash::FxHashMap;
use simplec_ast::Statement;
use simplec_common::JobId;
use simplec_engine::{Engine, JobOutcome, JobRunner};
use std::rc::Rc;

use crate::dispatch;

pub struct Checker {
    sources: FxHashMap<Rc<str>, Rc<[Statement]>>,
}

impl Checker {
    pub fn new() -> Self {
        Checker { sources: FxHashMap::default() }
    }

    /// Registers a file's already-parsed statement list under `path`, so a
    /// `ParseFile` job for that path can resolve it.
    pub fn add_source(&mut self, path: impl Into<Rc<str>>, statements: impl Into<Rc<[Statement]>>) {
        self.sources.insert(path.into(), statements.into());
    }
}

impl Default for Checker {
    fn default() -> Self {
        Self::new()
    }
}

impl JobRunner for Checker {
    fn run_job(&mut self, engine: &mut Engine, job_id: JobId) -> JobOutcome {
        dispatch::step(engine, job_id, &self.sources)
    }
}
