//! `ConstantScope` (§3, §4.2): a lexical region owning a hashed declaration
//! table, pending `using`/`static if` entries, and the ordered list of child
//! scopes nested control-flow bodies allocate.

use rustc_hash::FxHashMap;
use simplec_common::{FileRange, JobId, ScopeId};
use simplec_types::{ConstantValue, Type};
use std::rc::Rc;

#[derive(Copy, Clone, Debug)]
pub struct DeclarationEntry {
    pub job_id: JobId,
    /// Source range of the first declaration under this name, used to point
    /// at the original definition when a duplicate is reported (§4.4).
    pub range: FileRange,
}

/// A name bound directly to a type/value pair rather than a job — how
/// polymorphic/constant parameters are exposed inside an instantiation's
/// fresh definition scope (§4.8: "`scope_constants` bind each
/// polymorphic/constant parameter to its provided type/value").
#[derive(Clone, Debug)]
pub struct ScopeConstant {
    pub name: String,
    pub ty: Type,
    pub value: ConstantValue,
}

pub struct ConstantScope {
    pub parent: Option<ScopeId>,
    pub statements: Rc<[simplec_ast::Statement]>,
    pub declarations: FxHashMap<String, DeclarationEntry>,
    pub scope_constants: Vec<ScopeConstant>,
    pub is_top_level: bool,
    pub file_path: Rc<str>,
    /// `(statement_index, export)` for every `using` statement directly in
    /// this scope, in source order (§4.4 step 2).
    pub using_statements: Vec<(usize, bool)>,
    /// `(statement_index, condition_job, body_scope)` for every `static if`
    /// directly in this scope (§4.4 step 3).
    pub static_ifs: Vec<(usize, JobId, ScopeId)>,
    /// Scopes allocated for nested control-flow bodies (if/while/for), in
    /// exactly the order scope processing produced them — consumed in that
    /// same order by statement typing (§4.6's "child-scope ordering
    /// invariant").
    pub child_scopes: Vec<ScopeId>,
}

impl ConstantScope {
    pub fn new(
        parent: Option<ScopeId>,
        statements: Rc<[simplec_ast::Statement]>,
        is_top_level: bool,
        file_path: Rc<str>,
    ) -> Self {
        ConstantScope {
            parent,
            statements,
            declarations: FxHashMap::default(),
            scope_constants: Vec::new(),
            is_top_level,
            file_path,
            using_statements: Vec::new(),
            static_ifs: Vec::new(),
            child_scopes: Vec::new(),
        }
    }

    pub fn find_scope_constant(&self, name: &str) -> Option<&ScopeConstant> {
        self.scope_constants.iter().find(|c| c.name == name)
    }
}
