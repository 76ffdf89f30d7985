//! The `Job` data model (§3, §4.3): a flat, append-only list of tagged state
//! machines. Grounded on `yaram/simple-compiler`'s `typed_tree_generator.h`
//! (job-kind function signatures and per-kind result structs) and `tsz`'s
//! convention of keeping a kind enum's payload out of the enum itself so the
//! scheduler can match on `kind` without owning the (larger) input/output
//! payloads inline.

use simplec_common::{FileRange, JobId, ScopeId};
use simplec_types::{ConstantValue, Type};

/// The twelve job kinds (§3). `Using` is deliberately absent: `using`
/// statements are resolved directly by `search_for_name` (§4.4) rather than
/// scheduled, since they have no output of their own besides exposing names.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum JobKind {
    ParseFile,
    TypeStaticIf,
    TypeFunctionDeclaration,
    TypePolymorphicFunction,
    TypeConstantDefinition,
    TypeStructDefinition,
    TypePolymorphicStruct,
    TypeUnionDefinition,
    TypePolymorphicUnion,
    TypeEnumDefinition,
    TypeFunctionBody,
    TypeStaticVariable,
}

impl JobKind {
    pub fn name(self) -> &'static str {
        match self {
            JobKind::ParseFile => "ParseFile",
            JobKind::TypeStaticIf => "TypeStaticIf",
            JobKind::TypeFunctionDeclaration => "TypeFunctionDeclaration",
            JobKind::TypePolymorphicFunction => "TypePolymorphicFunction",
            JobKind::TypeConstantDefinition => "TypeConstantDefinition",
            JobKind::TypeStructDefinition => "TypeStructDefinition",
            JobKind::TypePolymorphicStruct => "TypePolymorphicStruct",
            JobKind::TypeUnionDefinition => "TypeUnionDefinition",
            JobKind::TypePolymorphicUnion => "TypePolymorphicUnion",
            JobKind::TypeEnumDefinition => "TypeEnumDefinition",
            JobKind::TypeFunctionBody => "TypeFunctionBody",
            JobKind::TypeStaticVariable => "TypeStaticVariable",
        }
    }
}

/// `{state, waiting_for?}` (§3) collapsed into one enum: `Waiting` carries
/// its own `waiting_for`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum JobState {
    Working,
    Waiting(JobId),
    Done,
}

/// A declaration-like statement's address within the scope tree: every
/// `Type*` job (except the polymorphic resolvers and function bodies, which
/// carry richer input) is keyed by exactly this pair.
#[derive(Copy, Clone, Debug)]
pub struct DeclJobInput {
    pub scope: ScopeId,
    pub statement_index: usize,
}

/// One slot of a polymorphic call's parameter vector (§4.5 "Calls",
/// `PolymorphicFunction` case): a type for a `$T`-style determiner slot, or a
/// type *and* value for a constant-parameter slot. `constant_values_equal`
/// plus type equality over this vector is the memoization key (§4.8).
#[derive(Clone, Debug, PartialEq)]
pub struct PolyParam {
    pub ty: Type,
    pub value: Option<ConstantValue>,
}

#[derive(Clone, Debug)]
pub struct PolymorphicInstantiationInput {
    pub scope: ScopeId,
    pub statement_index: usize,
    pub parent_scope: ScopeId,
    pub parameters: Vec<PolyParam>,
}

#[derive(Copy, Clone, Debug)]
pub struct FunctionBodyInput {
    /// Scope/statement the function was declared at (for error anchoring).
    pub scope: ScopeId,
    pub statement_index: usize,
    /// The scope the body's statements execute in (§4.2: allocated when the
    /// declaration is scope-processed).
    pub body_scope: ScopeId,
}

#[derive(Clone, Debug)]
pub enum JobInput {
    ParseFile { path: std::rc::Rc<str> },
    Declaration(DeclJobInput),
    StaticIf(DeclJobInput),
    PolymorphicInstantiation(PolymorphicInstantiationInput),
    FunctionBody(FunctionBodyInput),
}

impl JobInput {
    pub fn as_declaration(&self) -> Option<DeclJobInput> {
        match self {
            JobInput::Declaration(d) | JobInput::StaticIf(d) => Some(*d),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct FunctionDeclarationOutput {
    pub parameters: Vec<Type>,
    pub return_types: Vec<Type>,
    pub ty: Type,
    pub value: ConstantValue,
    /// Scope the body's statements execute in; `None` for `is_external`
    /// functions, which have no body to type.
    pub body_scope: Option<ScopeId>,
}

#[derive(Clone, Debug)]
pub struct StructLikeDefinitionOutput {
    pub members: Vec<(String, Type)>,
    pub ty: Type,
}

#[derive(Clone, Debug)]
pub struct ConstantDefinitionOutput {
    pub ty: Type,
    pub value: ConstantValue,
}

#[derive(Clone, Debug)]
pub struct EnumDefinitionOutput {
    pub ty: Type,
}

#[derive(Clone, Debug)]
pub struct StaticVariableOutput {
    pub ty: Type,
    pub is_external: bool,
}

#[derive(Clone, Debug)]
pub struct PolymorphicInstantiationOutput {
    pub ty: Type,
    pub value: ConstantValue,
    /// The fresh scope built for this instantiation (§4.8): for a
    /// polymorphic function, its body scope; for a polymorphic struct/union,
    /// the scope its members are typed in. Either way, `scope_constants`
    /// binds the polymorphic/constant parameters here.
    pub definition_scope: ScopeId,
}

/// Whether a `static if`'s condition evaluated true, so name lookup (§4.4
/// step 3) and statement typing know whether to expose/type its body.
#[derive(Clone, Debug)]
pub struct StaticIfOutput {
    pub condition_true: bool,
}

#[derive(Clone, Debug)]
pub struct FunctionBodyOutput {
    pub statements: Vec<simplec_types::TypedStatement>,
}

#[derive(Clone, Debug)]
pub struct ParseFileOutput {
    pub top_level_scope: ScopeId,
}

#[derive(Clone, Debug)]
pub enum JobOutput {
    ParseFile(ParseFileOutput),
    StaticIf(StaticIfOutput),
    FunctionDeclaration(FunctionDeclarationOutput),
    PolymorphicFunction(PolymorphicInstantiationOutput),
    ConstantDefinition(ConstantDefinitionOutput),
    StructDefinition(StructLikeDefinitionOutput),
    PolymorphicStruct(PolymorphicInstantiationOutput),
    UnionDefinition(StructLikeDefinitionOutput),
    PolymorphicUnion(PolymorphicInstantiationOutput),
    EnumDefinition(EnumDefinitionOutput),
    FunctionBody(FunctionBodyOutput),
    StaticVariable(StaticVariableOutput),
}

/// Referencing a struct/union/enum definition's name as an expression names
/// the type itself (§4.5 "Variables"): `x: MyStruct` needs `MyStruct` to
/// evaluate as a `Type::Type`-typed constant, not as a value of type
/// `MyStruct`. A bare unit variant, so a `'static` reference can stand in
/// for `declared_type()`'s borrow.
static TYPE_TYPE: Type = Type::Type;

impl JobOutput {
    /// The type of *referencing this declaration's name as an expression*
    /// (everything except `ParseFile`/`TypeStaticIf`/`TypeFunctionBody`,
    /// which don't name a single declared value). For a struct/union/enum
    /// definition this is `Type::Type`, not the aggregate type itself — the
    /// aggregate type is reached through `constant_value()` instead.
    pub fn declared_type(&self) -> Option<&Type> {
        match self {
            JobOutput::FunctionDeclaration(o) => Some(&o.ty),
            JobOutput::PolymorphicFunction(o)
            | JobOutput::PolymorphicStruct(o)
            | JobOutput::PolymorphicUnion(o) => Some(&o.ty),
            JobOutput::ConstantDefinition(o) => Some(&o.ty),
            JobOutput::StructDefinition(_) | JobOutput::UnionDefinition(_) | JobOutput::EnumDefinition(_) => Some(&TYPE_TYPE),
            JobOutput::StaticVariable(o) => Some(&o.ty),
            JobOutput::ParseFile(_) | JobOutput::StaticIf(_) | JobOutput::FunctionBody(_) => None,
        }
    }

    /// The compile-time value of referencing this declaration's name, where
    /// it has one. A struct/union/enum definition's value is the aggregate
    /// type itself, boxed as a `ConstantValue::Type` — constructed fresh
    /// here rather than cached, since nothing else needs the boxed form.
    pub fn constant_value(&self) -> Option<ConstantValue> {
        match self {
            JobOutput::FunctionDeclaration(o) => Some(o.value.clone()),
            JobOutput::PolymorphicFunction(o)
            | JobOutput::PolymorphicStruct(o)
            | JobOutput::PolymorphicUnion(o) => Some(o.value.clone()),
            JobOutput::ConstantDefinition(o) => Some(o.value.clone()),
            JobOutput::StructDefinition(o) | JobOutput::UnionDefinition(o) => Some(ConstantValue::Type(Box::new(o.ty.clone()))),
            JobOutput::EnumDefinition(o) => Some(ConstantValue::Type(Box::new(o.ty.clone()))),
            _ => None,
        }
    }
}

/// What a job's step function returns: either it completed (§4.3's "Done
/// with outputs"), or it suspends on another job. A step may also enqueue
/// new jobs as a side effect on `Engine` before returning either variant.
#[derive(Clone, Debug)]
pub enum JobOutcome {
    Done(JobOutput),
    Wait(JobId),
}

pub struct JobRecord {
    pub id: JobId,
    pub kind: JobKind,
    pub state: JobState,
    pub input: JobInput,
    pub output: Option<JobOutput>,
    pub arena: simplec_arena::Arena,
    pub range: FileRange,
}

impl JobRecord {
    pub fn is_done(&self) -> bool {
        matches!(self.state, JobState::Done)
    }
}
