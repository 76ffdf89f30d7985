//! `ConstantValue` and `FunctionConstant` (§3).

use crate::ty::Type;
use simplec_common::{DefId, ScopeId};
use std::rc::Rc;

/// Declaration pointer + body scope + child scope list + is_external flag (§3).
///
/// `declaration` is a [`DefId`] rather than a raw AST pointer: declarations
/// live inside their owning `ConstantScope`'s statement list, and are looked
/// up through the engine's definition table (§9's "arena + index/pointer
/// scheme" applied to declarations, not just scopes/jobs).
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionConstant {
    pub declaration: DefId,
    pub body_scope: ScopeId,
    pub child_scopes: Rc<Vec<ScopeId>>,
    pub is_external: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ConstantValue {
    Integer(u64),
    Float(f64),
    Boolean(bool),
    Type(Box<Type>),
    /// A runtime array constant: `{length, pointer}` (§6 array layout),
    /// where `pointer` is an opaque address (no process memory backs it in
    /// the semantic core; only the emitter gives it meaning).
    Array { length: u64, pointer: u64 },
    StaticArray(Rc<Vec<ConstantValue>>),
    Struct(Rc<Vec<ConstantValue>>),
    Function(FunctionConstant),
    PolymorphicFunction(FunctionConstant),
    BuiltinFunction(crate::ty::BuiltinFunctionKind),
    FileModule(ScopeId),
    Void,
    Undef,
}

/// Structural equality on the `ConstantValue` tree (§4.7), used to
/// deduplicate polymorphic instantiations (§4.8) and to dedupe call-site
/// job lookups. Equivalent to `==` for this type — spelled out as its own
/// function because §4.7/§4.8 name it explicitly and callers read more
/// clearly calling `constant_values_equal(a, b)` at a memoization site than
/// a bare `==`.
pub fn constant_values_equal(a: &ConstantValue, b: &ConstantValue) -> bool {
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_equality_ignores_identity() {
        let a = ConstantValue::StaticArray(Rc::new(vec![ConstantValue::Integer(1), ConstantValue::Integer(2)]));
        let b = ConstantValue::StaticArray(Rc::new(vec![ConstantValue::Integer(1), ConstantValue::Integer(2)]));
        assert!(constant_values_equal(&a, &b));
        let c = ConstantValue::StaticArray(Rc::new(vec![ConstantValue::Integer(1), ConstantValue::Integer(3)]));
        assert!(!constant_values_equal(&a, &c));
    }

    #[test]
    fn type_constants_compare_structurally() {
        let a = ConstantValue::Type(Box::new(Type::default_integer()));
        let b = ConstantValue::Type(Box::new(Type::default_integer()));
        let c = ConstantValue::Type(Box::new(Type::Boolean));
        assert!(constant_values_equal(&a, &b));
        assert!(!constant_values_equal(&a, &c));
    }
}
