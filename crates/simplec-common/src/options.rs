//! Engine-wide configuration, grounded on `tsz_common::checker_options::CheckerOptions`.

/// Pointer/address size of the compilation target, per §6's calling
/// convention table. Drives `size_of`, the default type of
/// `UndeterminedInteger` (§9: "default-typed at address-size"), and the
/// `length` field width of the array layout (§6).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AddressSize {
    Bits32,
    Bits64,
}

impl AddressSize {
    pub fn bytes(self) -> u32 {
        match self {
            AddressSize::Bits32 => 4,
            AddressSize::Bits64 => 8,
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            AddressSize::Bits32 => 32,
            AddressSize::Bits64 => 64,
        }
    }
}

/// Engine-wide options, analogous in spirit to `tsz`'s `CheckerOptions`: a
/// small struct threaded through the scheduler and the checker rather than
/// global mutable state (§9: "Global mutable state ... is explicitly not
/// part of the core").
#[derive(Clone, Debug)]
pub struct EngineOptions {
    pub address_size: AddressSize,
    /// When true, a circular-dependency diagnostic is emitted per stuck job
    /// (§4.3); when false only the first is reported. Defaults to `true`.
    pub report_all_cycle_members: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            address_size: AddressSize::Bits64,
            report_all_cycle_members: true,
        }
    }
}
