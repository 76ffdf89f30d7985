//! The persistent typed tree (§3): mirrors the AST but every node carries a
//! resolved type and, where known, a constant value. This is the semantic
//! engine's output format — consumed by a code generator or, within this
//! workspace, by the LSP hover bridge (§4.9).

use crate::constant::ConstantValue;
use crate::ty::Type;
use simplec_ast::{BinaryOperator, UnaryOperator};
use simplec_common::FileRange;

#[derive(Clone, Debug)]
pub struct TypedExpression {
    pub range: FileRange,
    pub ty: Type,
    pub constant_value: Option<ConstantValue>,
    pub kind: TypedExpressionKind,
}

impl TypedExpression {
    pub fn new(range: FileRange, ty: Type, constant_value: Option<ConstantValue>, kind: TypedExpressionKind) -> Self {
        TypedExpression { range, ty, constant_value, kind }
    }

    /// The narrowest child (by source range) containing `(line, column)`, or
    /// `self` if no child contains it. Used by the LSP hover bridge (§4.9).
    pub fn narrowest_at(&self, line: u32, column: u32) -> &TypedExpression {
        for child in self.children() {
            if child.range.contains(line, column) {
                return child.narrowest_at(line, column);
            }
        }
        self
    }

    pub fn children(&self) -> Vec<&TypedExpression> {
        match &self.kind {
            TypedExpressionKind::Leaf => vec![],
            TypedExpressionKind::ArrayLiteral(elements) => elements.iter().collect(),
            TypedExpressionKind::StructLiteral(members) => members.iter().map(|(_, e)| e).collect(),
            TypedExpressionKind::BinaryOperation { left, right, .. } => vec![left, right],
            TypedExpressionKind::UnaryOperation { operand, .. } => vec![operand],
            TypedExpressionKind::Index { expression, index } => vec![expression, index],
            TypedExpressionKind::Member { expression, .. } => vec![expression],
            TypedExpressionKind::Call { expression, parameters } => {
                let mut out = vec![expression.as_ref()];
                out.extend(parameters.iter());
                out
            }
            TypedExpressionKind::Cast { expression, .. } => vec![expression],
        }
    }
}

#[derive(Clone, Debug)]
pub enum TypedExpressionKind {
    /// Literals, variable references, and type expressions have no typed
    /// children worth descending into for hover purposes.
    Leaf,
    ArrayLiteral(Vec<TypedExpression>),
    StructLiteral(Vec<(String, TypedExpression)>),
    BinaryOperation {
        operator: BinaryOperator,
        left: Box<TypedExpression>,
        right: Box<TypedExpression>,
    },
    UnaryOperation {
        operator: UnaryOperator,
        operand: Box<TypedExpression>,
    },
    Index {
        expression: Box<TypedExpression>,
        index: Box<TypedExpression>,
    },
    Member {
        expression: Box<TypedExpression>,
        member: String,
    },
    Call {
        expression: Box<TypedExpression>,
        parameters: Vec<TypedExpression>,
    },
    Cast {
        expression: Box<TypedExpression>,
    },
}

#[derive(Clone, Debug)]
pub struct TypedStatement {
    pub range: FileRange,
    pub kind: TypedStatementKind,
}

impl TypedStatement {
    pub fn new(range: FileRange, kind: TypedStatementKind) -> Self {
        TypedStatement { range, kind }
    }

    pub fn expression_at(&self, line: u32, column: u32) -> Option<&TypedExpression> {
        for expr in self.direct_expressions() {
            if expr.range.contains(line, column) {
                return Some(expr.narrowest_at(line, column));
            }
        }
        for nested in self.nested_statements() {
            if nested.range.contains(line, column) {
                if let Some(found) = nested.expression_at(line, column) {
                    return Some(found);
                }
            }
        }
        None
    }

    fn direct_expressions(&self) -> Vec<&TypedExpression> {
        match &self.kind {
            TypedStatementKind::Expression(e) => vec![e],
            TypedStatementKind::VariableDeclaration { initializer, .. } => initializer.iter().collect(),
            TypedStatementKind::Assignment { target, value } => vec![target, value],
            TypedStatementKind::BinaryOperationAssignment { target, value, .. } => vec![target, value],
            TypedStatementKind::IfStatement { condition, .. } => vec![condition],
            TypedStatementKind::WhileLoop { condition, .. } => vec![condition],
            TypedStatementKind::ForLoop { from, to, .. } => vec![from, to],
            TypedStatementKind::Return(values) => values.iter().collect(),
            TypedStatementKind::Other => vec![],
        }
    }

    fn nested_statements(&self) -> Vec<&TypedStatement> {
        match &self.kind {
            TypedStatementKind::IfStatement { then_statements, else_statements, .. } => {
                let mut out: Vec<&TypedStatement> = then_statements.iter().collect();
                if let Some(else_stmts) = else_statements {
                    out.extend(else_stmts.iter());
                }
                out
            }
            TypedStatementKind::WhileLoop { statements, .. } => statements.iter().collect(),
            TypedStatementKind::ForLoop { statements, .. } => statements.iter().collect(),
            _ => vec![],
        }
    }
}

#[derive(Clone, Debug)]
pub enum TypedStatementKind {
    Expression(TypedExpression),
    VariableDeclaration {
        name: String,
        declared_type: Type,
        initializer: Option<TypedExpression>,
    },
    Assignment {
        target: TypedExpression,
        value: TypedExpression,
    },
    BinaryOperationAssignment {
        target: TypedExpression,
        operator: BinaryOperator,
        value: TypedExpression,
    },
    IfStatement {
        condition: TypedExpression,
        then_statements: Vec<TypedStatement>,
        else_statements: Option<Vec<TypedStatement>>,
    },
    WhileLoop {
        condition: TypedExpression,
        statements: Vec<TypedStatement>,
    },
    ForLoop {
        index_name: String,
        index_type: Type,
        from: TypedExpression,
        to: TypedExpression,
        statements: Vec<TypedStatement>,
    },
    Return(Vec<TypedExpression>),
    /// `break`, inline assembly, nested declarations: carried for
    /// completeness but not descended into by hover.
    Other,
}
