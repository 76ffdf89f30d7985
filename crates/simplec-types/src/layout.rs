//! `size_of` and the bit-exact array layout of §6.
//!
//! Array layout: `{length: uint<addr_size>, pointer: *T}` packed in that
//! order — so `size_of([]T) == 2 * address_size_bytes` regardless of `T`.
//! Struct/union member layout (ordering beyond array/pointer) is not
//! specified by the spec beyond "sequential in declaration order"; no
//! padding/alignment rule is given, so members are packed with no padding
//! (documented as an Open Question resolution in `DESIGN.md`).

use crate::ty::Type;
use simplec_common::AddressSize;

/// Byte size of a runtime type under `address_size`. Returns `None` for
/// non-runtime types (§3: only runtime types have a defined layout).
pub fn size_of(ty: &Type, address_size: AddressSize) -> Option<u64> {
    match ty {
        Type::Integer { size, .. } => Some(size.bytes() as u64),
        Type::Float { size } => Some(if *size == crate::ty::FloatSize::Bits32 { 4 } else { 8 }),
        Type::Boolean => Some(1),
        Type::Pointer(_) => Some(address_size.bytes() as u64),
        Type::StaticArray { length, element } => {
            Some(length * size_of(element, address_size)?)
        }
        Type::Array { .. } => {
            // {length, pointer}, packed in that order (§6).
            Some(address_size.bytes() as u64 + address_size.bytes() as u64)
        }
        Type::Struct { members, .. } => {
            let mut total = 0u64;
            for (_, member_ty) in members.iter() {
                total += size_of(member_ty, address_size)?;
            }
            Some(total)
        }
        Type::Union { members, .. } => {
            let mut max = 0u64;
            for (_, member_ty) in members.iter() {
                max = max.max(size_of(member_ty, address_size)?);
            }
            Some(max)
        }
        Type::Enum { backing, .. } => Some(backing.size.bytes() as u64),
        _ => None,
    }
}

/// Byte offset of the `pointer` field within the array layout, i.e. the
/// length field's width (§6: length precedes pointer).
pub fn array_pointer_offset(address_size: AddressSize) -> u64 {
    address_size.bytes() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::{FloatSize, IntegerSize};

    #[test]
    fn array_layout_is_two_address_words() {
        let ty = Type::array(Type::Integer { size: IntegerSize::Bits8, signed: false });
        assert_eq!(size_of(&ty, AddressSize::Bits64), Some(16));
        assert_eq!(size_of(&ty, AddressSize::Bits32), Some(8));
    }

    #[test]
    fn static_array_size_multiplies() {
        let ty = Type::static_array(4, Type::Float { size: FloatSize::Bits64 });
        assert_eq!(size_of(&ty, AddressSize::Bits64), Some(32));
    }

    #[test]
    fn undetermined_has_no_layout() {
        assert_eq!(size_of(&Type::UndeterminedInteger, AddressSize::Bits64), None);
    }
}
