//! Scope graph, job scheduler and name lookup (§3, §4.2–§4.4).
//!
//! This crate owns everything structural about the semantic core: the
//! `ConstantScope` graph, the `Job`/`JobState` records the scheduler drives,
//! and `search_for_name`. It deliberately does not know how to type an
//! expression or statement — that's `simplec-check`'s `Checker`, which
//! drives this crate's scheduler through the [`JobRunner`] trait.

pub mod job;
pub mod name_lookup;
pub mod process;
pub mod scheduler;
pub mod scope;

pub use job::{
    ConstantDefinitionOutput, DeclJobInput, EnumDefinitionOutput, FunctionBodyInput, FunctionBodyOutput,
    FunctionDeclarationOutput, JobInput, JobKind, JobOutcome, JobOutput, JobRecord, JobState,
    ParseFileOutput, PolyParam, PolymorphicInstantiationInput, PolymorphicInstantiationOutput,
    StaticIfOutput, StaticVariableOutput, StructLikeDefinitionOutput,
};
pub use name_lookup::{search_for_name, ModuleLookup, NameLookupResult};
pub use process::process_scope;
pub use scheduler::{run_to_completion, Engine, JobRunner};
pub use scope::{ConstantScope, DeclarationEntry, ScopeConstant};
