//! `search_for_name` (§4.4) exercised across real scope graphs, and the
//! polymorphic-instantiation / function-body memoization keys on `Engine`.
//! `simplec-engine` has no checker of its own, so these build scopes and
//! jobs directly rather than going through `process_scope`'s statement walk.

use simplec_common::{EngineOptions, FileRange, ScopeId};
use simplec_engine::{
    job::{DeclJobInput, JobInput, PolyParam, PolymorphicInstantiationInput},
    name_lookup::{search_for_name, ModuleLookup, NameLookupResult},
    process_scope, ConstantScope, DeclarationEntry, Engine, JobKind, ScopeConstant,
};
use simplec_types::{ConstantValue, Type};
use std::rc::Rc;

fn no_using(_: &Engine, _: ScopeId, _: usize) -> ModuleLookup {
    ModuleLookup::NotAModule
}

fn empty_scope(engine: &mut Engine, parent: Option<ScopeId>, top_level: bool) -> ScopeId {
    engine.add_scope(ConstantScope::new(parent, Rc::from(vec![]), top_level, Rc::from("f.sp")))
}

#[test]
fn finds_a_declaration_in_its_own_scope() {
    let mut engine = Engine::new(EngineOptions::default());
    let scope = empty_scope(&mut engine, None, true);
    let job = engine.add_job(
        JobKind::TypeConstantDefinition,
        JobInput::Declaration(DeclJobInput { scope, statement_index: 0 }),
        FileRange::synthetic(),
    );
    engine.scope_mut(scope).declarations.insert("A".to_string(), DeclarationEntry { job_id: job, range: FileRange::synthetic() });

    let found = search_for_name(&engine, scope, "A", false, &mut no_using);
    assert_eq!(found, NameLookupResult::Found(job));
}

#[test]
fn falls_through_to_the_parent_scope() {
    let mut engine = Engine::new(EngineOptions::default());
    let parent = empty_scope(&mut engine, None, true);
    let child = empty_scope(&mut engine, Some(parent), false);
    let job = engine.add_job(
        JobKind::TypeConstantDefinition,
        JobInput::Declaration(DeclJobInput { scope: parent, statement_index: 0 }),
        FileRange::synthetic(),
    );
    engine.scope_mut(parent).declarations.insert("A".to_string(), DeclarationEntry { job_id: job, range: FileRange::synthetic() });

    assert_eq!(search_for_name(&engine, child, "A", false, &mut no_using), NameLookupResult::Found(job));
    assert_eq!(search_for_name(&engine, child, "missing", false, &mut no_using), NameLookupResult::NotFound);
}

#[test]
fn finds_a_scope_constant_bound_by_a_polymorphic_parameter() {
    let mut engine = Engine::new(EngineOptions::default());
    let scope = empty_scope(&mut engine, None, false);
    engine
        .scope_mut(scope)
        .scope_constants
        .push(ScopeConstant { name: "T".to_string(), ty: Type::Type, value: ConstantValue::Type(Box::new(Type::default_integer())) });

    let found = search_for_name(&engine, scope, "T", false, &mut no_using);
    assert_eq!(found, NameLookupResult::FoundConstant { scope, index: 0 });
}

#[test]
fn using_export_flag_gates_which_using_statements_are_visited() {
    let mut engine = Engine::new(EngineOptions::default());
    let module_scope = empty_scope(&mut engine, None, true);
    let job = engine.add_job(
        JobKind::TypeConstantDefinition,
        JobInput::Declaration(DeclJobInput { scope: module_scope, statement_index: 0 }),
        FileRange::synthetic(),
    );
    engine.scope_mut(module_scope).declarations.insert("Exported".to_string(), DeclarationEntry { job_id: job, range: FileRange::synthetic() });

    let importer = empty_scope(&mut engine, None, true);
    // `export` is false here: this `using` only makes `Exported` visible to
    // lookups within `importer` itself (external_only == false), not to
    // files that in turn `using` `importer`.
    engine.scope_mut(importer).using_statements.push((0, false));

    let mut resolve = |_: &Engine, scope_id: ScopeId, stmt_index: usize| -> ModuleLookup {
        assert_eq!(scope_id, importer);
        assert_eq!(stmt_index, 0);
        ModuleLookup::Scope(module_scope)
    };

    assert_eq!(search_for_name(&engine, importer, "Exported", false, &mut resolve), NameLookupResult::Found(job));
    // A module looking in from outside (`external_only == true`) must not
    // see a non-exporting `using`.
    assert_eq!(search_for_name(&engine, importer, "Exported", true, &mut no_using), NameLookupResult::NotFound);
}

#[test]
fn static_if_not_yet_decided_suspends_lookup() {
    let mut engine = Engine::new(EngineOptions::default());
    let scope = empty_scope(&mut engine, None, true);
    let condition_job = engine.add_job(
        JobKind::TypeStaticIf,
        JobInput::StaticIf(DeclJobInput { scope, statement_index: 0 }),
        FileRange::synthetic(),
    );
    let body_scope = empty_scope(&mut engine, Some(scope), false);
    engine.scope_mut(scope).static_ifs.push((0, condition_job, body_scope));

    let found = search_for_name(&engine, scope, "Whatever", false, &mut no_using);
    assert_eq!(found, NameLookupResult::Wait(condition_job));
}

#[test]
fn repeated_polymorphic_instantiation_with_equal_parameters_is_found() {
    let mut engine = Engine::new(EngineOptions::default());
    let scope = empty_scope(&mut engine, None, true);
    let params = vec![PolyParam { ty: Type::default_integer(), value: None }];
    let job = engine.add_job(
        JobKind::TypePolymorphicStruct,
        JobInput::PolymorphicInstantiation(PolymorphicInstantiationInput {
            scope,
            statement_index: 0,
            parent_scope: scope,
            parameters: params.clone(),
        }),
        FileRange::synthetic(),
    );

    assert_eq!(engine.find_polymorphic_job(JobKind::TypePolymorphicStruct, scope, 0, &params), Some(job));
    // A different parameter vector is a different instantiation.
    let other_params = vec![PolyParam { ty: Type::Boolean, value: None }];
    assert_eq!(engine.find_polymorphic_job(JobKind::TypePolymorphicStruct, scope, 0, &other_params), None);
}

#[test]
fn find_function_body_job_keys_on_body_scope_alone() {
    let mut engine = Engine::new(EngineOptions::default());
    let scope = empty_scope(&mut engine, None, true);
    let body_scope = empty_scope(&mut engine, Some(scope), false);
    assert_eq!(engine.find_function_body_job(body_scope), None);

    let job = engine.add_job(
        JobKind::TypeFunctionBody,
        JobInput::FunctionBody(simplec_engine::job::FunctionBodyInput { scope, statement_index: 0, body_scope }),
        FileRange::synthetic(),
    );
    assert_eq!(engine.find_function_body_job(body_scope), Some(job));
}

#[test]
fn process_scope_seeds_builtin_type_names_only_at_top_level() {
    let mut engine = Engine::new(EngineOptions::default());
    let top = process_scope(&mut engine, None, Rc::from(vec![]), true, Rc::from("f.sp"));
    assert_eq!(search_for_name(&engine, top, "u8", false, &mut no_using), NameLookupResult::FoundConstant { scope: top, index: engine.scope(top).scope_constants.iter().position(|c| c.name == "u8").unwrap() });

    let nested = process_scope(&mut engine, Some(top), Rc::from(vec![]), false, Rc::from("f.sp"));
    assert!(engine.scope(nested).scope_constants.is_empty());
    // A nested (non-top-level) scope still sees `u8` by walking up to `top`.
    assert!(matches!(search_for_name(&engine, nested, "u8", false, &mut no_using), NameLookupResult::FoundConstant { .. }));
}
