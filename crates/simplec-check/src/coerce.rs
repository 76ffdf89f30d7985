//! Coercion (§4.7): `coerce(value, target)` accepts iff one of the rules
//! below holds. `probing` suppresses the diagnostic for a failed attempt
//! (§9: "a boolean parameter, not exceptions").

use simplec_common::{Diagnostic, DiagnosticKind, DiagnosticSink, FileRange};
use simplec_types::{ConstantValue, RuntimeValue, Type};

pub struct CoercionFailure;

/// Attempts to coerce `(ty, rv)` to `target`. On success returns the
/// possibly constant-folded `(Type, RuntimeValue)` pair — the value itself
/// is unchanged except when an `UndeterminedInteger`/`UndeterminedFloat`
/// constant is pinned to a concrete numeric type.
pub fn coerce(
    ty: &Type,
    rv: &RuntimeValue,
    target: &Type,
    probing: bool,
    range: FileRange,
    path: &str,
    diagnostics: &mut dyn DiagnosticSink,
) -> Result<(Type, RuntimeValue), CoercionFailure> {
    if normalized_eq(ty, target) {
        return Ok((target.clone(), rv.clone()));
    }

    match (ty, target) {
        (Type::UndeterminedInteger, Type::Integer { size, signed }) => {
            if let RuntimeValue::Constant(ConstantValue::Integer(raw)) = rv {
                if integer_fits(*raw, *size, *signed) {
                    return Ok((target.clone(), RuntimeValue::Constant(ConstantValue::Integer(*raw))));
                }
                return fail(
                    probing,
                    diagnostics,
                    DiagnosticKind::Coercion,
                    path,
                    range,
                    format!(
                        "Cannot implicitly convert constant {raw} (type '{}') to '{}'",
                        ty.describe(),
                        target.describe()
                    ),
                );
            }
            // A non-constant `UndeterminedInteger` (shouldn't occur: every
            // undetermined integer originates from a constant-foldable
            // literal or arithmetic over one) is coerced unconditionally.
            Ok((target.clone(), rv.clone()))
        }
        (Type::UndeterminedFloat, Type::Float { .. }) => Ok((target.clone(), rv.clone())),
        (Type::Integer { .. }, Type::Enum { backing, .. }) => {
            if normalized_eq(ty, &Type::Integer { size: backing.size, signed: backing.signed }) {
                Ok((target.clone(), rv.clone()))
            } else {
                fail(
                    probing,
                    diagnostics,
                    DiagnosticKind::Coercion,
                    path,
                    range,
                    format!("Cannot implicitly convert '{}' to '{}': backing type mismatch", ty.describe(), target.describe()),
                )
            }
        }
        (Type::UndeterminedStruct(members), Type::Struct { members: target_members, .. }) => {
            if members.len() != target_members.len() {
                return fail(
                    probing,
                    diagnostics,
                    DiagnosticKind::Coercion,
                    path,
                    range,
                    format!("Struct literal has {} member(s), '{}' expects {}", members.len(), target.describe(), target_members.len()),
                );
            }
            for ((name, member_ty), (target_name, target_ty)) in members.iter().zip(target_members.iter()) {
                if name != target_name {
                    return fail(
                        probing,
                        diagnostics,
                        DiagnosticKind::Coercion,
                        path,
                        range,
                        format!("Struct literal member '{name}' does not match '{target_name}' in '{}'", target.describe()),
                    );
                }
                coerce(member_ty, &RuntimeValue::Register, target_ty, probing, range, path, diagnostics)?;
            }
            Ok((target.clone(), rv.clone()))
        }
        (Type::Undef, t) if t.is_runtime() => Ok((target.clone(), RuntimeValue::Constant(ConstantValue::Undef))),
        _ => fail(
            probing,
            diagnostics,
            DiagnosticKind::Coercion,
            path,
            range,
            format!("Cannot implicitly convert '{}' to '{}'", ty.describe(), target.describe()),
        ),
    }
}

fn fail(
    probing: bool,
    diagnostics: &mut dyn DiagnosticSink,
    kind: DiagnosticKind,
    path: &str,
    range: FileRange,
    message: String,
) -> Result<(Type, RuntimeValue), CoercionFailure> {
    if !probing {
        diagnostics.report(Diagnostic::error(kind, path, range, message));
    }
    Err(CoercionFailure)
}

fn normalized_eq(a: &Type, b: &Type) -> bool {
    a == b
}

pub fn integer_fits(value: u64, size: simplec_types::IntegerSize, signed: bool) -> bool {
    let bits = size.bits();
    if signed {
        if bits >= 64 {
            return true;
        }
        let max = (1i64 << (bits - 1)) - 1;
        let min = -(1i64 << (bits - 1));
        let as_signed = value as i64;
        as_signed >= min && as_signed <= max
    } else {
        if bits >= 64 {
            return true;
        }
        let max = (1u64 << bits) - 1;
        value <= max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simplec_common::diagnostics::DiagnosticBag;
    use simplec_types::IntegerSize;

    #[test]
    fn undetermined_integer_out_of_range_fails_with_range_error() {
        let mut bag = DiagnosticBag::default();
        let ty = Type::UndeterminedInteger;
        let rv = RuntimeValue::Constant(ConstantValue::Integer(300));
        let target = Type::Integer { size: IntegerSize::Bits8, signed: false };
        let result = coerce(&ty, &rv, &target, false, FileRange::synthetic(), "f.sp", &mut bag);
        assert!(result.is_err());
        assert_eq!(bag.diagnostics.len(), 1);
        assert!(bag.diagnostics[0].message.contains("300"));
    }

    #[test]
    fn probing_suppresses_diagnostic() {
        let mut bag = DiagnosticBag::default();
        let ty = Type::Boolean;
        let rv = RuntimeValue::Register;
        let target = Type::default_integer();
        let result = coerce(&ty, &rv, &target, true, FileRange::synthetic(), "f.sp", &mut bag);
        assert!(result.is_err());
        assert!(bag.diagnostics.is_empty());
    }

    #[test]
    fn integer_in_range_coerces() {
        let mut bag = DiagnosticBag::default();
        let ty = Type::UndeterminedInteger;
        let rv = RuntimeValue::Constant(ConstantValue::Integer(200));
        let target = Type::Integer { size: IntegerSize::Bits8, signed: false };
        let result = coerce(&ty, &rv, &target, false, FileRange::synthetic(), "f.sp", &mut bag);
        assert!(result.is_ok());
    }
}
