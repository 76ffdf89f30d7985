//! Binary/unary operators, per §4.5's operator tables.

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    BitwiseAnd,
    BitwiseOr,
    ShiftLeft,
    ShiftRight,
    /// `>>>`, logical (unsigned) right shift.
    ShiftRightUnsigned,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    BooleanAnd,
    BooleanOr,
}

impl BinaryOperator {
    /// True for `== != < <= > >=`: always yields `Boolean` (§4.5).
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOperator::Equal
                | BinaryOperator::NotEqual
                | BinaryOperator::LessThan
                | BinaryOperator::LessThanOrEqual
                | BinaryOperator::GreaterThan
                | BinaryOperator::GreaterThanOrEqual
        )
    }

    /// True for `&& ||`: booleans only.
    pub fn is_boolean_op(self) -> bool {
        matches!(self, BinaryOperator::BooleanAnd | BinaryOperator::BooleanOr)
    }

    /// True for bitwise/shift ops, which floats do not support (§4.5).
    pub fn is_bitwise_or_shift(self) -> bool {
        matches!(
            self,
            BinaryOperator::BitwiseAnd
                | BinaryOperator::BitwiseOr
                | BinaryOperator::ShiftLeft
                | BinaryOperator::ShiftRight
                | BinaryOperator::ShiftRightUnsigned
        )
    }

    /// True for `== !=`, the only operators pointers and enums support (§4.5).
    pub fn is_equality(self) -> bool {
        matches!(self, BinaryOperator::Equal | BinaryOperator::NotEqual)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOperator {
    /// `&x` — address-of; requires an addressed operand (§4.5).
    AddressOf,
    /// `*p` — dereference.
    Dereference,
    /// `!` — boolean negation.
    BooleanNot,
    /// Numeric negation.
    Negate,
}
