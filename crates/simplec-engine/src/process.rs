//! Scope processing (§4.2).
//!
//! Called once per new scope: the top-level scope of a parsed file, and
//! (lazily, by the checker) the body scope of a function/`static if`/nested
//! control-flow block the first time it needs typing. Purely structural —
//! it never evaluates an expression, so it can live in `simplec-engine`
//! without depending on `simplec-check`.

use crate::job::{DeclJobInput, JobInput, JobKind};
use crate::scope::{ConstantScope, DeclarationEntry, ScopeConstant};
use crate::scheduler::Engine;
use simplec_ast::{ParameterKind, Statement, StatementKind};
use simplec_common::{AddressSize, Diagnostic, DiagnosticKind, DiagnosticSink, EngineOptions, ScopeId};
use simplec_types::{ConstantValue, FloatSize, IntegerSize, Type};
use std::rc::Rc;

/// The primitive type names every file sees without a `using` (§6: there is
/// no prelude file, so the core seeds them directly): the fixed-width
/// integers, `isize`/`usize` at the target's address size, `f32`/`f64`,
/// `bool` and `void`. Bound the same way a polymorphic parameter is (§4.8)
/// — a `ScopeConstant` whose value is a boxed `Type` — since nothing
/// distinguishes a type name from any other compile-time constant here.
fn builtin_scope_constants(options: &EngineOptions) -> Vec<ScopeConstant> {
    let address = match options.address_size {
        AddressSize::Bits32 => IntegerSize::Bits32,
        AddressSize::Bits64 => IntegerSize::Bits64,
    };
    let integer = |name: &str, size, signed| ScopeConstant {
        name: name.to_string(),
        ty: Type::Type,
        value: ConstantValue::Type(Box::new(Type::Integer { size, signed })),
    };
    vec![
        integer("i8", IntegerSize::Bits8, true),
        integer("u8", IntegerSize::Bits8, false),
        integer("i16", IntegerSize::Bits16, true),
        integer("u16", IntegerSize::Bits16, false),
        integer("i32", IntegerSize::Bits32, true),
        integer("u32", IntegerSize::Bits32, false),
        integer("i64", IntegerSize::Bits64, true),
        integer("u64", IntegerSize::Bits64, false),
        integer("isize", address, true),
        integer("usize", address, false),
        ScopeConstant { name: "f32".to_string(), ty: Type::Type, value: ConstantValue::Type(Box::new(Type::Float { size: FloatSize::Bits32 })) },
        ScopeConstant { name: "f64".to_string(), ty: Type::Type, value: ConstantValue::Type(Box::new(Type::Float { size: FloatSize::Bits64 })) },
        ScopeConstant { name: "bool".to_string(), ty: Type::Type, value: ConstantValue::Type(Box::new(Type::Boolean)) },
        ScopeConstant { name: "void".to_string(), ty: Type::Type, value: ConstantValue::Type(Box::new(Type::Void)) },
    ]
}

/// Which `Type*` job a declaration-like statement requires (§4.2): plain vs.
/// polymorphic function/struct/union is decided by whether any parameter
/// introduces a type or constant parameter.
fn job_kind_for(kind: &StatementKind) -> Option<JobKind> {
    match kind {
        StatementKind::FunctionDeclaration { parameters, .. } => {
            let polymorphic = parameters
                .iter()
                .any(|p| matches!(p.kind, ParameterKind::PolymorphicDeterminer | ParameterKind::Constant));
            Some(if polymorphic {
                JobKind::TypePolymorphicFunction
            } else {
                JobKind::TypeFunctionDeclaration
            })
        }
        StatementKind::StructDefinition { parameters, .. } => Some(if parameters.is_empty() {
            JobKind::TypeStructDefinition
        } else {
            JobKind::TypePolymorphicStruct
        }),
        StatementKind::UnionDefinition { parameters, .. } => Some(if parameters.is_empty() {
            JobKind::TypeUnionDefinition
        } else {
            JobKind::TypePolymorphicUnion
        }),
        StatementKind::EnumDefinition { .. } => Some(JobKind::TypeEnumDefinition),
        StatementKind::ConstantDefinition { .. } => Some(JobKind::TypeConstantDefinition),
        StatementKind::StaticVariableDeclaration { .. } => Some(JobKind::TypeStaticVariable),
        _ => None,
    }
}

/// Processes `statements` into a freshly-allocated scope, recursing into
/// every nested body a control-flow or `static if` statement introduces.
/// Does not descend into function bodies: those are scope-processed lazily
/// by the checker once their `TypeFunctionDeclaration`/`TypePolymorphicFunction`
/// job runs, using this same function.
pub fn process_scope(
    engine: &mut Engine,
    parent: Option<ScopeId>,
    statements: Rc<[Statement]>,
    is_top_level: bool,
    file_path: Rc<str>,
) -> ScopeId {
    let scope_id = engine.add_scope(ConstantScope::new(parent, Rc::clone(&statements), is_top_level, Rc::clone(&file_path)));
    if is_top_level {
        let builtins = builtin_scope_constants(&engine.options);
        engine.scope_mut(scope_id).scope_constants.extend(builtins);
    }

    for (index, stmt) in statements.iter().enumerate() {
        match &stmt.kind {
            StatementKind::Using { export, .. } => {
                engine.scope_mut(scope_id).using_statements.push((index, *export));
            }
            StatementKind::StaticIf { statements: body, .. } => {
                let job_id = engine.add_job(
                    JobKind::TypeStaticIf,
                    JobInput::StaticIf(DeclJobInput { scope: scope_id, statement_index: index }),
                    stmt.range,
                );
                let body_scope = process_scope(engine, Some(scope_id), Rc::from(body.clone()), false, Rc::clone(&file_path));
                engine.scope_mut(scope_id).static_ifs.push((index, job_id, body_scope));
            }
            StatementKind::IfStatement { then_statements, else_ifs, else_statements, .. } => {
                let then_scope = process_scope(engine, Some(scope_id), Rc::from(then_statements.clone()), false, Rc::clone(&file_path));
                engine.scope_mut(scope_id).child_scopes.push(then_scope);
                for (_, stmts) in else_ifs {
                    let s = process_scope(engine, Some(scope_id), Rc::from(stmts.clone()), false, Rc::clone(&file_path));
                    engine.scope_mut(scope_id).child_scopes.push(s);
                }
                if let Some(stmts) = else_statements {
                    let s = process_scope(engine, Some(scope_id), Rc::from(stmts.clone()), false, Rc::clone(&file_path));
                    engine.scope_mut(scope_id).child_scopes.push(s);
                }
            }
            StatementKind::WhileLoop { statements: body, .. } => {
                let s = process_scope(engine, Some(scope_id), Rc::from(body.clone()), false, Rc::clone(&file_path));
                engine.scope_mut(scope_id).child_scopes.push(s);
            }
            StatementKind::ForLoop { statements: body, .. } => {
                let s = process_scope(engine, Some(scope_id), Rc::from(body.clone()), false, Rc::clone(&file_path));
                engine.scope_mut(scope_id).child_scopes.push(s);
            }
            other => {
                if let (Some(name), Some(kind)) = (other.declared_name(), job_kind_for(other)) {
                    register_declaration(engine, scope_id, index, name, kind, stmt.range, &file_path);
                }
            }
        }
    }

    scope_id
}

fn register_declaration(
    engine: &mut Engine,
    scope_id: ScopeId,
    index: usize,
    name: &str,
    kind: JobKind,
    range: simplec_common::FileRange,
    file_path: &Rc<str>,
) {
    if let Some(existing) = engine.scope(scope_id).declarations.get(name) {
        let existing_range = existing.range;
        engine.diagnostics.report(Diagnostic::error(
            DiagnosticKind::NameResolution,
            file_path.to_string(),
            range,
            format!(
                "Duplicate definition of '{name}': original definition at line {}, column {}",
                existing_range.first_line, existing_range.first_column
            ),
        ));
        return;
    }
    let job_id = engine.add_job(kind, JobInput::Declaration(DeclJobInput { scope: scope_id, statement_index: index }), range);
    engine
        .scope_mut(scope_id)
        .declarations
        .insert(name.to_string(), DeclarationEntry { job_id, range });
}

#[cfg(test)]
mod tests {
    use super::*;
    use simplec_ast::Expression;
    use simplec_ast::ExpressionKind;
    use simplec_common::{EngineOptions, FileRange};

    fn range() -> FileRange {
        FileRange::new(1, 1, 1, 1)
    }

    #[test]
    fn declares_one_job_per_declaration_statement() {
        let mut engine = Engine::new(EngineOptions::default());
        let statements: Rc<[Statement]> = Rc::from(vec![
            Statement::new(
                range(),
                StatementKind::ConstantDefinition { name: "A".into(), value: Expression::new(range(), ExpressionKind::IntegerLiteral(1)) },
            ),
            Statement::new(
                range(),
                StatementKind::ConstantDefinition { name: "B".into(), value: Expression::new(range(), ExpressionKind::IntegerLiteral(2)) },
            ),
        ]);
        let scope_id = process_scope(&mut engine, None, statements, true, Rc::from("f.sp"));
        assert_eq!(engine.scope(scope_id).declarations.len(), 2);
        assert_eq!(engine.jobs.len(), 2);
        assert!(!engine.diagnostics.has_errors());
    }

    #[test]
    fn duplicate_declaration_is_a_hard_error() {
        let mut engine = Engine::new(EngineOptions::default());
        let statements: Rc<[Statement]> = Rc::from(vec![
            Statement::new(
                range(),
                StatementKind::ConstantDefinition { name: "A".into(), value: Expression::new(range(), ExpressionKind::IntegerLiteral(1)) },
            ),
            Statement::new(
                range(),
                StatementKind::ConstantDefinition { name: "A".into(), value: Expression::new(range(), ExpressionKind::IntegerLiteral(2)) },
            ),
        ]);
        let scope_id = process_scope(&mut engine, None, statements, true, Rc::from("f.sp"));
        assert_eq!(engine.scope(scope_id).declarations.len(), 1);
        assert_eq!(engine.jobs.len(), 1);
        assert!(engine.diagnostics.has_errors());
    }

    #[test]
    fn if_statement_allocates_child_scopes_in_order() {
        let mut engine = Engine::new(EngineOptions::default());
        let cond = Expression::new(range(), ExpressionKind::BooleanLiteral(true));
        let statements: Rc<[Statement]> = Rc::from(vec![Statement::new(
            range(),
            StatementKind::IfStatement {
                condition: cond,
                then_statements: vec![],
                else_ifs: vec![],
                else_statements: Some(vec![]),
            },
        )]);
        let scope_id = process_scope(&mut engine, None, statements, true, Rc::from("f.sp"));
        assert_eq!(engine.scope(scope_id).child_scopes.len(), 2);
    }
}
