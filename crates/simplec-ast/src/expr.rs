//! Expression AST nodes (§4.5).

use crate::operators::{BinaryOperator, UnaryOperator};
use serde::{Deserialize, Serialize};
use simplec_common::FileRange;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Expression {
    pub range: FileRange,
    pub kind: ExpressionKind,
}

impl Expression {
    pub fn new(range: FileRange, kind: ExpressionKind) -> Self {
        Expression { range, kind }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ExpressionKind {
    IntegerLiteral(u64),
    FloatLiteral(f64),
    StringLiteral(String),
    BooleanLiteral(bool),
    Undef,

    /// `[a, b, c]`.
    ArrayLiteral(Vec<Expression>),
    /// `.{a = 1, b = 2}` — an undetermined struct literal (§4.5).
    StructLiteral(Vec<(String, Expression)>),

    /// A name reference, resolved via `search_for_name` (§4.4) or the local
    /// variable stack.
    Variable(String),

    BinaryOperation {
        operator: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    UnaryOperation {
        operator: UnaryOperator,
        operand: Box<Expression>,
    },

    /// `expression[index]`.
    Index {
        expression: Box<Expression>,
        index: Box<Expression>,
    },
    /// `expression.member`.
    Member {
        expression: Box<Expression>,
        member: String,
    },

    /// `expression(parameters...)`.
    Call {
        expression: Box<Expression>,
        parameters: Vec<Expression>,
    },
    /// `bake(expression, parameters...)` — resolves to the monomorphized
    /// function constant itself rather than calling it (§4.5 "Bake").
    Bake {
        expression: Box<Expression>,
        parameters: Vec<Expression>,
    },
    /// `expression as type_expression`.
    Cast {
        expression: Box<Expression>,
        type_expression: Box<Expression>,
    },

    /// `*element_type` — pointer type expression; evaluates to a `Type` constant.
    PointerType(Box<Expression>),
    /// `[len]element_type` (static) or `[]element_type` (dynamic) (§6 array layout).
    ArrayType {
        length: Option<Box<Expression>>,
        element: Box<Expression>,
    },
    /// `(params...) -> (returns...)` function type expression.
    FunctionType {
        parameters: Vec<Expression>,
        return_types: Vec<Expression>,
        calling_convention: Option<String>,
    },
}
