//! Index-based handles for the compilation arena's cyclic graphs (scope
//! parent chains, job dependencies) — per §9's design note: "Use an arena +
//! index/pointer scheme: scopes and jobs are allocated in the compilation
//! arena and referred to by raw address or integer id; no reference
//! counting."

use serde::{Deserialize, Serialize};

macro_rules! index_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u32);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }

            pub fn from_index(index: usize) -> Self {
                $name(index as u32)
            }
        }
    };
}

index_id!(ScopeId, "Identifies a `ConstantScope` within a compilation.");
index_id!(
    DefId,
    "Identifies a declaration (function/struct/union/enum/constant/static variable)."
);
index_id!(JobId, "Identifies a `Job` within the scheduler's job list.");
