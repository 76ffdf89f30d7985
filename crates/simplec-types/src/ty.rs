//! The `Type` tagged union (§3).
//!
//! `#[derive(PartialEq, Eq, Hash)]` on an enum whose nominal variants
//! (`Struct`/`Union`/`Enum`/`PolymorphicStruct`/`PolymorphicUnion`/
//! `PolymorphicFunction`) carry `def_id` as an explicit field already gives
//! exactly the equality rule §3 asks for: "equal iff their `def_id` *and*
//! each carried parameter/member type are equal" — there is no special-case
//! equality to hand-write, because the discriminator is data, not identity.

use simplec_common::{DefId, ScopeId};
use std::rc::Rc;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum IntegerSize {
    Bits8,
    Bits16,
    Bits32,
    Bits64,
}

impl IntegerSize {
    pub fn bytes(self) -> u32 {
        match self {
            IntegerSize::Bits8 => 1,
            IntegerSize::Bits16 => 2,
            IntegerSize::Bits32 => 4,
            IntegerSize::Bits64 => 8,
        }
    }

    pub fn bits(self) -> u32 {
        self.bytes() * 8
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FloatSize {
    Bits32,
    Bits64,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CallingConvention {
    Default,
    StdCall,
}

/// Builtin function names recognized by call-target dispatch (§4.5 "Calls").
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BuiltinFunctionKind {
    SizeOf,
    TypeOf,
    Globalify,
    Stackify,
    Sqrt,
}

impl BuiltinFunctionKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "size_of" => Some(BuiltinFunctionKind::SizeOf),
            "type_of" => Some(BuiltinFunctionKind::TypeOf),
            "globalify" => Some(BuiltinFunctionKind::Globalify),
            "stackify" => Some(BuiltinFunctionKind::Stackify),
            "sqrt" => Some(BuiltinFunctionKind::Sqrt),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BuiltinFunctionKind::SizeOf => "size_of",
            BuiltinFunctionKind::TypeOf => "type_of",
            BuiltinFunctionKind::Globalify => "globalify",
            BuiltinFunctionKind::Stackify => "stackify",
            BuiltinFunctionKind::Sqrt => "sqrt",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Integer { size: IntegerSize, signed: bool },
    Float { size: FloatSize },
    Boolean,
    Void,
    /// The type of a value that is itself a `Type` (e.g. the expression `u8`).
    Type,
    /// The type of the `undef` literal; coerces to any runtime type (§4.7).
    Undef,

    Pointer(Rc<Type>),
    StaticArray { length: u64, element: Rc<Type> },
    Array { element: Rc<Type> },

    Struct { def_id: DefId, members: Rc<Vec<(String, Type)>>, file_path: Rc<str> },
    Union { def_id: DefId, members: Rc<Vec<(String, Type)>>, file_path: Rc<str> },
    Enum { def_id: DefId, backing: IntegerSigned, variants: Rc<Vec<(String, i64)>> },

    Function { parameters: Rc<Vec<Type>>, return_types: Rc<Vec<Type>>, calling_convention: CallingConvention },
    MultiReturn(Rc<Vec<Type>>),

    PolymorphicFunction { def_id: DefId, parent_scope: ScopeId },
    PolymorphicStruct { def_id: DefId, parameter_types: Rc<Vec<Type>>, parent_scope: ScopeId },
    PolymorphicUnion { def_id: DefId, parameter_types: Rc<Vec<Type>>, parent_scope: ScopeId },

    UndeterminedInteger,
    UndeterminedFloat,
    UndeterminedStruct(Rc<Vec<(String, Type)>>),

    BuiltinFunction(BuiltinFunctionKind),
    FileModule(ScopeId),
}

/// An enum's backing integer type is always a concrete signed/unsigned
/// integer (§3: `backing: Integer`); this newtype keeps `Type::Enum` from
/// needing to carry a full `Rc<Type>` for something constrained to one variant.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct IntegerSigned {
    pub size: IntegerSize,
    pub signed: bool,
}

impl Type {
    pub fn pointer(element: Type) -> Type {
        Type::Pointer(Rc::new(element))
    }

    pub fn static_array(length: u64, element: Type) -> Type {
        Type::StaticArray { length, element: Rc::new(element) }
    }

    pub fn array(element: Type) -> Type {
        Type::Array { element: Rc::new(element) }
    }

    /// True iff this type has a defined in-memory layout (§3): only these
    /// may be variable/parameter/return types.
    pub fn is_runtime(&self) -> bool {
        matches!(
            self,
            Type::Integer { .. }
                | Type::Float { .. }
                | Type::Boolean
                | Type::Pointer(_)
                | Type::StaticArray { .. }
                | Type::Array { .. }
                | Type::Struct { .. }
                | Type::Union { .. }
                | Type::Enum { .. }
        )
    }

    pub fn is_undetermined(&self) -> bool {
        matches!(
            self,
            Type::UndeterminedInteger | Type::UndeterminedFloat | Type::UndeterminedStruct(_)
        )
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Type::Integer { .. } | Type::UndeterminedInteger)
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Type::Float { .. } | Type::UndeterminedFloat)
    }

    /// `i64` at address size — the default type of an `UndeterminedInteger`
    /// literal once it can no longer stay undetermined (§9).
    pub fn default_integer() -> Type {
        Type::Integer { size: IntegerSize::Bits64, signed: true }
    }

    /// `f64` — the default type of an `UndeterminedFloat` literal (§9).
    pub fn default_float() -> Type {
        Type::Float { size: FloatSize::Bits64 }
    }

    pub fn describe(&self) -> String {
        match self {
            Type::Integer { size, signed } => {
                format!("{}{}", if *signed { "i" } else { "u" }, size.bits())
            }
            Type::Float { size } => format!("f{}", if *size == FloatSize::Bits32 { 32 } else { 64 }),
            Type::Boolean => "bool".to_string(),
            Type::Void => "void".to_string(),
            Type::Type => "Type".to_string(),
            Type::Undef => "Undef".to_string(),
            Type::Pointer(inner) => format!("*{}", inner.describe()),
            Type::StaticArray { length, element } => format!("[{}]{}", length, element.describe()),
            Type::Array { element } => format!("[]{}", element.describe()),
            Type::Struct { members, .. } => {
                format!("struct {{{}}}", describe_members(members))
            }
            Type::Union { members, .. } => format!("union {{{}}}", describe_members(members)),
            Type::Enum { variants, .. } => {
                format!(
                    "enum {{{}}}",
                    variants.iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>().join("; ")
                )
            }
            Type::Function { parameters, return_types, .. } => format!(
                "({}) -> ({})",
                parameters.iter().map(Type::describe).collect::<Vec<_>>().join(", "),
                return_types.iter().map(Type::describe).collect::<Vec<_>>().join(", ")
            ),
            Type::MultiReturn(types) => {
                format!("({})", types.iter().map(Type::describe).collect::<Vec<_>>().join(", "))
            }
            Type::PolymorphicFunction { .. } => "<polymorphic function>".to_string(),
            Type::PolymorphicStruct { .. } => "<polymorphic struct>".to_string(),
            Type::PolymorphicUnion { .. } => "<polymorphic union>".to_string(),
            Type::UndeterminedInteger => "{integer}".to_string(),
            Type::UndeterminedFloat => "{float}".to_string(),
            Type::UndeterminedStruct(members) => format!("{{{}}}", describe_members(members)),
            Type::BuiltinFunction(kind) => format!("<builtin {}>", kind.name()),
            Type::FileModule(_) => "<module>".to_string(),
        }
    }
}

fn describe_members(members: &[(String, Type)]) -> String {
    members
        .iter()
        .map(|(name, ty)| format!("{}: {}", name, ty.describe()))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_classification() {
        assert!(Type::Boolean.is_runtime());
        assert!(Type::default_integer().is_runtime());
        assert!(!Type::UndeterminedInteger.is_runtime());
        assert!(!Type::Type.is_runtime());
        assert!(!Type::Void.is_runtime());
    }

    #[test]
    fn struct_equality_is_nominal_and_structural() {
        let members_a = Rc::new(vec![("x".to_string(), Type::default_integer())]);
        let members_b = Rc::new(vec![("x".to_string(), Type::Boolean)]);
        let a = Type::Struct { def_id: DefId(1), members: members_a.clone(), file_path: Rc::from("a.simple") };
        let b = Type::Struct { def_id: DefId(1), members: members_a, file_path: Rc::from("a.simple") };
        let c = Type::Struct { def_id: DefId(1), members: members_b, file_path: Rc::from("a.simple") };
        let d = Type::Struct { def_id: DefId(2), members: Rc::new(vec![("x".to_string(), Type::default_integer())]), file_path: Rc::from("a.simple") };
        assert_eq!(a, b);
        assert_ne!(a, c, "same def_id but different members must differ");
        assert_ne!(a, d, "different def_id must differ even with identical members");
    }
}
