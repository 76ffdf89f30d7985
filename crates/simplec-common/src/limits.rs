//! Centralized limits and thresholds.
//!
//! Mirrors `tsz_common::limits`: a single place to tune recursion/iteration
//! caps instead of scattering magic numbers through the checker.

/// Maximum depth for recursive expression typing (§4.5). Prevents stack
/// overflow on pathologically nested expressions; exceeding it is an
/// internal invariant violation (a panic), not a diagnosable error, since
/// `spec.md` does not define a recovery diagnostic for it.
pub const MAX_EXPR_TYPING_DEPTH: u32 = 500;

/// Maximum number of scheduler loop passes with zero progress before giving
/// up and reporting every remaining non-`Done` job as part of a circular
/// dependency (§4.3). The scheduler already proves termination structurally
/// (progress-or-cycle), so this is a sanity backstop, not load-bearing.
pub const MAX_SCHEDULER_STALL_PASSES: u32 = 1;

/// Maximum nesting depth for polymorphic struct/union/function instantiation
/// (§4.8) before treating further recursion as non-terminating.
pub const MAX_POLYMORPHIC_INSTANTIATION_DEPTH: u32 = 64;
