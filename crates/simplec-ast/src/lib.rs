//! The AST types that form the parser→core contract (§6 of the spec).
//!
//! This crate defines the shape the (external, out-of-scope) parser hands
//! to the semantic core: immutable trees of declarations, statements and
//! expressions, each carrying a [`FileRange`]. Everything here derives
//! `Serialize`/`Deserialize` so fixtures (and `simplec-cli`'s JSON-fixture
//! "source provider") can describe an AST without this workspace containing
//! a lexer or parser.

pub mod expr;
pub mod operators;
pub mod stmt;

pub use expr::{Expression, ExpressionKind};
pub use operators::{BinaryOperator, UnaryOperator};
pub use simplec_common::FileRange;
pub use stmt::{
    AssemblyBinding, EnumVariant, FunctionParameter, ParameterKind, PolymorphicParameter,
    PolymorphicParameterKind, Statement, StatementKind, StructMember,
};
