//! Statement and declaration AST nodes (§3, §4.2, §4.6).
//!
//! Declarations are statements: a `ConstantScope`'s `statements` list mixes
//! ordinary control-flow statements with declaration-like statements
//! (function/struct/union/enum/constant/static-variable declarations,
//! `using`, `static if`), exactly as §4.2 describes scope processing
//! walking "every declaration-like statement" in a scope's statement list.

use crate::expr::Expression;
use serde::{Deserialize, Serialize};
use simplec_common::FileRange;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Statement {
    pub range: FileRange,
    pub kind: StatementKind,
}

impl Statement {
    pub fn new(range: FileRange, kind: StatementKind) -> Self {
        Statement { range, kind }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterKind {
    /// A plain, runtime-typed parameter.
    Normal,
    /// `$T` — introduces a type parameter bound to the argument's type.
    PolymorphicDeterminer,
    /// A parameter whose *value* (not just type) must be known at the call
    /// site and becomes part of the instantiation key (§4.8).
    Constant,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FunctionParameter {
    pub name: String,
    pub kind: ParameterKind,
    /// Absent only when `kind == PolymorphicDeterminer` and the type is
    /// purely inferred from the call site.
    pub type_expression: Option<Expression>,
    pub range: FileRange,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolymorphicParameterKind {
    /// `struct($T) { ... }` — a type parameter.
    TypeParameter,
    /// A constant parameter whose value participates in the instantiation key.
    ConstantParameter,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PolymorphicParameter {
    pub name: String,
    pub kind: PolymorphicParameterKind,
    pub type_expression: Option<Expression>,
    pub range: FileRange,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StructMember {
    pub name: String,
    pub type_expression: Expression,
    pub range: FileRange,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EnumVariant {
    pub name: String,
    /// Explicit `= value`, if given; otherwise auto-incremented (§3).
    pub value: Option<Expression>,
    pub range: FileRange,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AssemblyBinding {
    /// Constraint string, e.g. `"=r"` (output) or `"r"` (input) (§4.6, §9-c).
    pub constraint: String,
    pub value: Expression,
    pub range: FileRange,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum StatementKind {
    // --- ordinary statements ---
    Expression(Expression),
    VariableDeclaration {
        name: String,
        type_expression: Option<Expression>,
        initializer: Option<Expression>,
    },
    MultiReturnVariableDeclaration {
        names: Vec<String>,
        initializer: Expression,
    },
    Assignment {
        target: Expression,
        value: Expression,
    },
    MultiReturnAssignment {
        targets: Vec<Expression>,
        value: Expression,
    },
    BinaryOperationAssignment {
        target: Expression,
        operator: crate::operators::BinaryOperator,
        value: Expression,
    },
    IfStatement {
        condition: Expression,
        then_statements: Vec<Statement>,
        else_ifs: Vec<(Expression, Vec<Statement>)>,
        else_statements: Option<Vec<Statement>>,
    },
    WhileLoop {
        condition: Expression,
        statements: Vec<Statement>,
    },
    ForLoop {
        /// Defaults to `"it"` when absent (§4.6).
        index_name: Option<String>,
        from: Expression,
        to: Expression,
        statements: Vec<Statement>,
    },
    Return(Vec<Expression>),
    Break,
    InlineAssembly {
        bindings: Vec<AssemblyBinding>,
        body: String,
    },

    // --- declaration-like statements (§4.2) ---
    FunctionDeclaration {
        name: String,
        parameters: Vec<FunctionParameter>,
        return_types: Vec<Expression>,
        calling_convention: Option<String>,
        body: Option<Vec<Statement>>,
        is_external: bool,
        external_libraries: Vec<String>,
    },
    ConstantDefinition {
        name: String,
        value: Expression,
    },
    StructDefinition {
        name: String,
        parameters: Vec<PolymorphicParameter>,
        members: Vec<StructMember>,
    },
    UnionDefinition {
        name: String,
        parameters: Vec<PolymorphicParameter>,
        members: Vec<StructMember>,
    },
    EnumDefinition {
        name: String,
        backing_type: Option<Expression>,
        variants: Vec<EnumVariant>,
    },
    StaticVariableDeclaration {
        name: String,
        type_expression: Option<Expression>,
        initializer: Option<Expression>,
        is_external: bool,
        external_libraries: Vec<String>,
    },
    Using {
        module_expression: Expression,
        export: bool,
    },
    StaticIf {
        condition: Expression,
        statements: Vec<Statement>,
    },
}

impl StatementKind {
    /// Whether scope processing (§4.2) must register a job for this
    /// statement and index it in the scope's declaration table.
    pub fn is_declaration_like(&self) -> bool {
        matches!(
            self,
            StatementKind::FunctionDeclaration { .. }
                | StatementKind::ConstantDefinition { .. }
                | StatementKind::StructDefinition { .. }
                | StatementKind::UnionDefinition { .. }
                | StatementKind::EnumDefinition { .. }
                | StatementKind::StaticVariableDeclaration { .. }
        )
    }

    pub fn declared_name(&self) -> Option<&str> {
        match self {
            StatementKind::FunctionDeclaration { name, .. }
            | StatementKind::ConstantDefinition { name, .. }
            | StatementKind::StructDefinition { name, .. }
            | StatementKind::UnionDefinition { name, .. }
            | StatementKind::EnumDefinition { name, .. }
            | StatementKind::StaticVariableDeclaration { name, .. } => Some(name),
            _ => None,
        }
    }
}
