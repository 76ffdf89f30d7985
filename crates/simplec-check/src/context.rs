//! Per-step typing context (§4.4 "the typed-variable stack (local bindings)
//! is searched *before* delegating to [`search_for_name`]", §4.6's
//! `in_breakable` and child-scope consumption order).
//!
//! Rebuilt from scratch at the start of every job step (§5: a `Wait` resets
//! the job's private arena, so nothing here may be assumed to survive a
//! suspension) — nothing on this type is persisted on the `JobRecord`.

use simplec_common::ScopeId;
use simplec_types::Type;
use std::collections::VecDeque;

#[derive(Clone, Debug)]
pub struct LocalBinding {
    pub name: String,
    pub ty: Type,
}

/// Statement-typing state for one function body / `static if` condition
/// (§4.6). `child_scopes` is drained in the exact order scope processing
/// produced them (§4.6's child-scope ordering invariant).
pub struct TypingContext {
    frames: Vec<Vec<LocalBinding>>,
    child_scopes: VecDeque<ScopeId>,
    pub in_breakable: bool,
    pub return_types: Vec<Type>,
    /// Coercion attempts made while probing (e.g. a `cast`'s first try)
    /// don't emit diagnostics (§4.7, §9).
    pub probing: bool,
}

impl TypingContext {
    pub fn new(child_scopes: impl IntoIterator<Item = ScopeId>, return_types: Vec<Type>) -> Self {
        TypingContext {
            frames: vec![Vec::new()],
            child_scopes: child_scopes.into_iter().collect(),
            in_breakable: false,
            return_types,
            probing: false,
        }
    }

    pub fn push_frame(&mut self) {
        self.frames.push(Vec::new());
    }

    pub fn pop_frame(&mut self) {
        self.frames.pop();
    }

    /// Binds `name` in the innermost frame. Duplicate names within the same
    /// frame are a hard error (§4.6), raised by the caller using the
    /// returned previous binding.
    pub fn declare(&mut self, name: String, ty: Type) -> Option<LocalBinding> {
        let previous = self.lookup_in_innermost(&name);
        self.frames
            .last_mut()
            .expect("at least one frame always present")
            .push(LocalBinding { name, ty });
        previous
    }

    fn lookup_in_innermost(&self, name: &str) -> Option<LocalBinding> {
        self.frames.last()?.iter().find(|b| b.name == name).cloned()
    }

    /// Searches innermost-frame-first, matching §4.4's "local variable stack
    /// searched before `search_for_name`".
    pub fn lookup(&self, name: &str) -> Option<&LocalBinding> {
        self.frames.iter().rev().find_map(|frame| frame.iter().rev().find(|b| b.name == name))
    }

    pub fn next_child_scope(&mut self) -> Option<ScopeId> {
        self.child_scopes.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_frame_shadows_outer() {
        let mut ctx = TypingContext::new([], vec![]);
        ctx.declare("x".into(), Type::Boolean);
        ctx.push_frame();
        ctx.declare("x".into(), Type::default_integer());
        assert_eq!(ctx.lookup("x").unwrap().ty, Type::default_integer());
        ctx.pop_frame();
        assert_eq!(ctx.lookup("x").unwrap().ty, Type::Boolean);
    }

    #[test]
    fn child_scopes_drain_in_order() {
        let mut ctx = TypingContext::new([ScopeId(1), ScopeId(2)], vec![]);
        assert_eq!(ctx.next_child_scope(), Some(ScopeId(1)));
        assert_eq!(ctx.next_child_scope(), Some(ScopeId(2)));
        assert_eq!(ctx.next_child_scope(), None);
    }
}
