//! The `Type` / `ConstantValue` / `RuntimeValue` data model (§3).

pub mod constant;
pub mod layout;
pub mod runtime_value;
pub mod tree;
pub mod ty;

pub use constant::{ConstantValue, FunctionConstant, constant_values_equal};
pub use layout::{array_pointer_offset, size_of};
pub use runtime_value::RuntimeValue;
pub use tree::{TypedExpression, TypedExpressionKind, TypedStatement, TypedStatementKind};
pub use ty::{BuiltinFunctionKind, CallingConvention, FloatSize, IntegerSigned, IntegerSize, Type};
