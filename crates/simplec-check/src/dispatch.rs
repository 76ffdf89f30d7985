//! One step function per `JobKind` (§4.2–§4.8): the glue between
//! `simplec-engine`'s scheduler and `expr`/`stmt`'s typing rules.
//!
//! `ParseFile` aside (there is no parser in this workspace, so sources are
//! supplied pre-parsed), every step here follows the same shape: pull the
//! declaration's AST out of its `ConstantScope`, type whatever it needs
//! (propagating a `Wait` immediately), and emit the matching `JobOutput`.

use crate::coerce::coerce;
use crate::context::TypingContext;
use crate::expr::{expect_type_constant, type_expression, ExprOutcome};
use crate::stmt::{default_typed, type_statements};
use rustc_hash::FxHashMap;
use simplec_ast::{ParameterKind, PolymorphicParameterKind, Statement, StatementKind};
use simplec_common::{Diagnostic, DiagnosticKind, DiagnosticSink, FileRange, JobId, ScopeId};
use simplec_engine::{
    process_scope, ConstantDefinitionOutput, ConstantScope, Engine, EnumDefinitionOutput,
    FunctionBodyOutput, FunctionDeclarationOutput, JobInput, JobKind, JobOutcome, JobOutput,
    ParseFileOutput, PolymorphicInstantiationInput, PolymorphicInstantiationOutput, ScopeConstant,
    StaticIfOutput, StaticVariableOutput, StructLikeDefinitionOutput,
};
use simplec_types::{CallingConvention, ConstantValue, FunctionConstant, IntegerSigned, IntegerSize, Type};
use std::rc::Rc;

fn report(engine: &mut Engine, kind: DiagnosticKind, path: &str, range: FileRange, message: impl Into<String>) {
    engine.diagnostics.report(Diagnostic::error(kind, path, range, message));
}

fn calling_convention_of(name: &Option<String>) -> CallingConvention {
    match name.as_deref() {
        Some("stdcall") => CallingConvention::StdCall,
        _ => CallingConvention::Default,
    }
}

/// Runs one step of `job_id`. `sources` backs `ParseFile`: the only job kind
/// that needs something besides `Engine` state, since parsing itself lives
/// outside this workspace.
pub fn step(engine: &mut Engine, job_id: JobId, sources: &FxHashMap<Rc<str>, Rc<[Statement]>>) -> JobOutcome {
    match engine.job(job_id).kind {
        JobKind::ParseFile => run_parse_file(engine, job_id, sources),
        JobKind::TypeStaticIf => run_static_if(engine, job_id),
        JobKind::TypeFunctionDeclaration => run_function_declaration(engine, job_id),
        JobKind::TypePolymorphicFunction => run_polymorphic_function(engine, job_id),
        JobKind::TypeConstantDefinition => run_constant_definition(engine, job_id),
        JobKind::TypeStructDefinition => run_struct_like_definition(engine, job_id, false),
        JobKind::TypePolymorphicStruct => run_polymorphic_struct_like(engine, job_id, false),
        JobKind::TypeUnionDefinition => run_struct_like_definition(engine, job_id, true),
        JobKind::TypePolymorphicUnion => run_polymorphic_struct_like(engine, job_id, true),
        JobKind::TypeEnumDefinition => run_enum_definition(engine, job_id),
        JobKind::TypeFunctionBody => run_function_body(engine, job_id),
        JobKind::TypeStaticVariable => run_static_variable(engine, job_id),
    }
}

fn run_parse_file(engine: &mut Engine, job_id: JobId, sources: &FxHashMap<Rc<str>, Rc<[Statement]>>) -> JobOutcome {
    let JobInput::ParseFile { path } = engine.job(job_id).input.clone() else {
        unreachable!("ParseFile job without ParseFile input");
    };
    match sources.get(&path) {
        Some(statements) => {
            let statements = Rc::clone(statements);
            let top_level_scope = process_scope(engine, None, statements, true, path);
            JobOutcome::Done(JobOutput::ParseFile(ParseFileOutput { top_level_scope }))
        }
        None => {
            let range = engine.job(job_id).range;
            report(engine, DiagnosticKind::Syntactic, &path, range, format!("No source registered for '{path}'"));
            let top_level_scope = process_scope(engine, None, Rc::from(Vec::new()), true, Rc::clone(&path));
            JobOutcome::Done(JobOutput::ParseFile(ParseFileOutput { top_level_scope }))
        }
    }
}

fn run_static_if(engine: &mut Engine, job_id: JobId) -> JobOutcome {
    let decl = engine.job(job_id).input.as_declaration().expect("TypeStaticIf carries a declaration input");
    let stmt = engine.scope(decl.scope).statements[decl.statement_index].clone();
    let StatementKind::StaticIf { condition, .. } = &stmt.kind else {
        unreachable!("TypeStaticIf job on a non-static-if statement");
    };
    let path = engine.scope(decl.scope).file_path.to_string();
    let mut ctx = TypingContext::new([], vec![]);
    let (te, rv) = match type_expression(engine, &mut ctx, decl.scope, &path, condition) {
        ExprOutcome::Typed(te, rv) => (te, rv),
        ExprOutcome::Wait(dep) => return JobOutcome::Wait(dep),
    };
    let condition_true = match rv.as_constant() {
        Some(ConstantValue::Boolean(b)) => *b,
        _ => {
            report(engine, DiagnosticKind::ConstantEvaluation, &path, te.range, "'static if' condition must be a compile-time constant boolean");
            false
        }
    };
    JobOutcome::Done(JobOutput::StaticIf(StaticIfOutput { condition_true }))
}

fn run_constant_definition(engine: &mut Engine, job_id: JobId) -> JobOutcome {
    let decl = engine.job(job_id).input.as_declaration().expect("TypeConstantDefinition carries a declaration input");
    let stmt = engine.scope(decl.scope).statements[decl.statement_index].clone();
    let StatementKind::ConstantDefinition { value, .. } = &stmt.kind else {
        unreachable!("TypeConstantDefinition job on a non-constant statement");
    };
    let path = engine.scope(decl.scope).file_path.to_string();
    let mut ctx = TypingContext::new([], vec![]);
    let (te, rv) = match type_expression(engine, &mut ctx, decl.scope, &path, value) {
        ExprOutcome::Typed(te, rv) => (te, rv),
        ExprOutcome::Wait(dep) => return JobOutcome::Wait(dep),
    };
    let (ty, value) = match rv.into_constant() {
        Some(cv) => (te.ty, cv),
        None => {
            report(engine, DiagnosticKind::ConstantEvaluation, &path, te.range, "Constant definition requires a compile-time value");
            (Type::Void, ConstantValue::Void)
        }
    };
    JobOutcome::Done(JobOutput::ConstantDefinition(ConstantDefinitionOutput { ty, value }))
}

fn run_struct_like_definition(engine: &mut Engine, job_id: JobId, is_union: bool) -> JobOutcome {
    let decl = engine.job(job_id).input.as_declaration().expect("TypeStructDefinition/TypeUnionDefinition carries a declaration input");
    let stmt = engine.scope(decl.scope).statements[decl.statement_index].clone();
    let members_ast = match &stmt.kind {
        StatementKind::StructDefinition { members, .. } | StatementKind::UnionDefinition { members, .. } => members.clone(),
        _ => unreachable!("TypeStructDefinition/TypeUnionDefinition job on a non-aggregate statement"),
    };
    let path = engine.scope(decl.scope).file_path.to_string();
    let file_path = Rc::clone(&engine.scope(decl.scope).file_path);

    let mut members = Vec::with_capacity(members_ast.len());
    for member in &members_ast {
        let mut ctx = TypingContext::new([], vec![]);
        let (te, rv) = match type_expression(engine, &mut ctx, decl.scope, &path, &member.type_expression) {
            ExprOutcome::Typed(te, rv) => (te, rv),
            ExprOutcome::Wait(dep) => return JobOutcome::Wait(dep),
        };
        let ty = expect_type_constant(&te, &rv, engine, &path, te.range).unwrap_or(Type::Void);
        members.push((member.name.clone(), ty));
    }

    let def_id = simplec_common::DefId::from_index(job_id.index());
    let ty = if is_union {
        Type::Union { def_id, members: Rc::new(members.clone()), file_path }
    } else {
        Type::Struct { def_id, members: Rc::new(members.clone()), file_path }
    };
    let output = StructLikeDefinitionOutput { members, ty };
    JobOutcome::Done(if is_union { JobOutput::UnionDefinition(output) } else { JobOutput::StructDefinition(output) })
}

fn run_enum_definition(engine: &mut Engine, job_id: JobId) -> JobOutcome {
    let decl = engine.job(job_id).input.as_declaration().expect("TypeEnumDefinition carries a declaration input");
    let stmt = engine.scope(decl.scope).statements[decl.statement_index].clone();
    let StatementKind::EnumDefinition { backing_type, variants, .. } = &stmt.kind else {
        unreachable!("TypeEnumDefinition job on a non-enum statement");
    };
    let path = engine.scope(decl.scope).file_path.to_string();

    let default_backing = IntegerSigned { size: IntegerSize::Bits64, signed: true };
    let backing = match backing_type {
        None => default_backing,
        Some(expr) => {
            let mut ctx = TypingContext::new([], vec![]);
            let (te, rv) = match type_expression(engine, &mut ctx, decl.scope, &path, expr) {
                ExprOutcome::Typed(te, rv) => (te, rv),
                ExprOutcome::Wait(dep) => return JobOutcome::Wait(dep),
            };
            match expect_type_constant(&te, &rv, engine, &path, te.range) {
                Some(Type::Integer { size, signed }) => IntegerSigned { size, signed },
                Some(other) => {
                    report(engine, DiagnosticKind::Type, &path, te.range, format!("Enum backing type must be an integer, found '{}'", other.describe()));
                    default_backing
                }
                None => default_backing,
            }
        }
    };

    let mut resolved = Vec::with_capacity(variants.len());
    let mut next_value: i64 = 0;
    for variant in variants {
        let value = match &variant.value {
            None => next_value,
            Some(expr) => {
                let mut ctx = TypingContext::new([], vec![]);
                let (te, rv) = match type_expression(engine, &mut ctx, decl.scope, &path, expr) {
                    ExprOutcome::Typed(te, rv) => (te, rv),
                    ExprOutcome::Wait(dep) => return JobOutcome::Wait(dep),
                };
                match rv.as_constant() {
                    Some(ConstantValue::Integer(v)) => *v as i64,
                    _ => {
                        report(engine, DiagnosticKind::ConstantEvaluation, &path, te.range, "Enum variant value must be a compile-time integer");
                        next_value
                    }
                }
            }
        };
        next_value = value + 1;
        resolved.push((variant.name.clone(), value));
    }

    let def_id = simplec_common::DefId::from_index(job_id.index());
    let ty = Type::Enum { def_id, backing, variants: Rc::new(resolved) };
    JobOutcome::Done(JobOutput::EnumDefinition(EnumDefinitionOutput { ty }))
}

fn run_static_variable(engine: &mut Engine, job_id: JobId) -> JobOutcome {
    let decl = engine.job(job_id).input.as_declaration().expect("TypeStaticVariable carries a declaration input");
    let stmt = engine.scope(decl.scope).statements[decl.statement_index].clone();
    let StatementKind::StaticVariableDeclaration { type_expression: type_expr, initializer, is_external, .. } = &stmt.kind else {
        unreachable!("TypeStaticVariable job on a non-static-variable statement");
    };
    let path = engine.scope(decl.scope).file_path.to_string();
    let mut ctx = TypingContext::new([], vec![]);

    let declared_type = match type_expr {
        None => None,
        Some(expr) => {
            let (te, rv) = match type_expression(engine, &mut ctx, decl.scope, &path, expr) {
                ExprOutcome::Typed(te, rv) => (te, rv),
                ExprOutcome::Wait(dep) => return JobOutcome::Wait(dep),
            };
            expect_type_constant(&te, &rv, engine, &path, te.range)
        }
    };

    let mut final_type = declared_type.clone();
    if let Some(init) = initializer {
        let (init_te, init_rv) = match type_expression(engine, &mut ctx, decl.scope, &path, init) {
            ExprOutcome::Typed(te, rv) => (te, rv),
            ExprOutcome::Wait(dep) => return JobOutcome::Wait(dep),
        };
        match &declared_type {
            Some(target) => {
                let _ = coerce(&init_te.ty, &init_rv, target, false, init_te.range, &path, &mut engine.diagnostics);
            }
            None => final_type = Some(default_typed(&init_te.ty)),
        }
    }

    let ty = final_type.unwrap_or_else(|| {
        report(engine, DiagnosticKind::Type, &path, stmt.range, "Static variable needs either a type or an initializer");
        Type::Void
    });
    if !*is_external && !ty.is_runtime() {
        report(engine, DiagnosticKind::Type, &path, stmt.range, format!("'{}' is not a valid runtime type", ty.describe()));
    }
    JobOutcome::Done(JobOutput::StaticVariable(StaticVariableOutput { ty, is_external: *is_external }))
}

fn run_function_declaration(engine: &mut Engine, job_id: JobId) -> JobOutcome {
    let decl = engine.job(job_id).input.as_declaration().expect("TypeFunctionDeclaration carries a declaration input");
    let stmt = engine.scope(decl.scope).statements[decl.statement_index].clone();
    let StatementKind::FunctionDeclaration { parameters, return_types, calling_convention, body, is_external, .. } = &stmt.kind else {
        unreachable!("TypeFunctionDeclaration job on a non-function statement");
    };
    let path = engine.scope(decl.scope).file_path.to_string();
    let file_path = Rc::clone(&engine.scope(decl.scope).file_path);

    let mut param_types = Vec::with_capacity(parameters.len());
    for param in parameters {
        let Some(type_ast) = &param.type_expression else {
            report(engine, DiagnosticKind::Type, &path, param.range, format!("Parameter '{}' needs a type", param.name));
            param_types.push(Type::Void);
            continue;
        };
        let mut ctx = TypingContext::new([], vec![]);
        let (te, rv) = match type_expression(engine, &mut ctx, decl.scope, &path, type_ast) {
            ExprOutcome::Typed(te, rv) => (te, rv),
            ExprOutcome::Wait(dep) => return JobOutcome::Wait(dep),
        };
        param_types.push(expect_type_constant(&te, &rv, engine, &path, te.range).unwrap_or(Type::Void));
    }

    let mut return_type_list = Vec::with_capacity(return_types.len());
    for expr in return_types {
        let mut ctx = TypingContext::new([], vec![]);
        let (te, rv) = match type_expression(engine, &mut ctx, decl.scope, &path, expr) {
            ExprOutcome::Typed(te, rv) => (te, rv),
            ExprOutcome::Wait(dep) => return JobOutcome::Wait(dep),
        };
        return_type_list.push(expect_type_constant(&te, &rv, engine, &path, te.range).unwrap_or(Type::Void));
    }

    let ty = Type::Function {
        parameters: Rc::new(param_types.clone()),
        return_types: Rc::new(return_type_list.clone()),
        calling_convention: calling_convention_of(calling_convention),
    };

    let body_statements: Rc<[Statement]> = Rc::from(body.clone().unwrap_or_default());
    let body_scope = process_scope(engine, Some(decl.scope), body_statements, false, file_path);

    let fc = FunctionConstant {
        declaration: simplec_common::DefId::from_index(job_id.index()),
        body_scope,
        child_scopes: Rc::new(Vec::new()),
        is_external: *is_external,
    };
    let output = FunctionDeclarationOutput {
        parameters: param_types,
        return_types: return_type_list,
        ty,
        value: ConstantValue::Function(fc),
        body_scope: if *is_external { None } else { Some(body_scope) },
    };
    JobOutcome::Done(JobOutput::FunctionDeclaration(output))
}

fn run_polymorphic_function(engine: &mut Engine, job_id: JobId) -> JobOutcome {
    match engine.job(job_id).input.clone() {
        JobInput::Declaration(decl) => {
            let def_id = simplec_common::DefId::from_index(job_id.index());
            let ty = Type::PolymorphicFunction { def_id, parent_scope: decl.scope };
            let value = ConstantValue::Type(Box::new(ty.clone()));
            JobOutcome::Done(JobOutput::PolymorphicFunction(PolymorphicInstantiationOutput { ty, value, definition_scope: decl.scope }))
        }
        JobInput::PolymorphicInstantiation(input) => run_polymorphic_function_instantiation(engine, job_id, input),
        _ => unreachable!("TypePolymorphicFunction job with unexpected input"),
    }
}

fn run_polymorphic_function_instantiation(engine: &mut Engine, job_id: JobId, input: PolymorphicInstantiationInput) -> JobOutcome {
    let stmt = engine.scope(input.scope).statements[input.statement_index].clone();
    let StatementKind::FunctionDeclaration { parameters, return_types, calling_convention, body, is_external, .. } = &stmt.kind else {
        unreachable!("TypePolymorphicFunction instantiation on a non-function statement");
    };
    let path = engine.scope(input.scope).file_path.to_string();
    let file_path = Rc::clone(&engine.scope(input.scope).file_path);

    let inst_scope = engine.add_scope(ConstantScope::new(Some(input.parent_scope), Rc::from(Vec::new()), false, Rc::clone(&file_path)));

    let mut param_types = Vec::with_capacity(parameters.len());
    let mut poly_index = 0usize;
    for formal in parameters {
        match formal.kind {
            ParameterKind::PolymorphicDeterminer | ParameterKind::Constant => {
                let slot = input.parameters.get(poly_index).cloned();
                poly_index += 1;
                let Some(slot) = slot else {
                    report(engine, DiagnosticKind::PolymorphicInstantiation, &path, formal.range, format!("Missing polymorphic argument for '{}'", formal.name));
                    param_types.push(Type::Void);
                    continue;
                };
                let bound_value = match formal.kind {
                    ParameterKind::PolymorphicDeterminer => ConstantValue::Type(Box::new(slot.ty.clone())),
                    _ => slot.value.clone().unwrap_or(ConstantValue::Void),
                };
                engine.scope_mut(inst_scope).scope_constants.push(ScopeConstant { name: formal.name.clone(), ty: slot.ty.clone(), value: bound_value });
                param_types.push(slot.ty);
            }
            ParameterKind::Normal => {
                let Some(type_ast) = &formal.type_expression else {
                    report(engine, DiagnosticKind::Type, &path, formal.range, format!("Parameter '{}' needs a type", formal.name));
                    param_types.push(Type::Void);
                    continue;
                };
                let mut ctx = TypingContext::new([], vec![]);
                let (te, rv) = match type_expression(engine, &mut ctx, inst_scope, &path, type_ast) {
                    ExprOutcome::Typed(te, rv) => (te, rv),
                    ExprOutcome::Wait(dep) => return JobOutcome::Wait(dep),
                };
                param_types.push(expect_type_constant(&te, &rv, engine, &path, te.range).unwrap_or(Type::Void));
            }
        }
    }

    let mut return_type_list = Vec::with_capacity(return_types.len());
    for expr in return_types {
        let mut ctx = TypingContext::new([], vec![]);
        let (te, rv) = match type_expression(engine, &mut ctx, inst_scope, &path, expr) {
            ExprOutcome::Typed(te, rv) => (te, rv),
            ExprOutcome::Wait(dep) => return JobOutcome::Wait(dep),
        };
        return_type_list.push(expect_type_constant(&te, &rv, engine, &path, te.range).unwrap_or(Type::Void));
    }

    let ty = Type::Function {
        parameters: Rc::new(param_types),
        return_types: Rc::new(return_type_list),
        calling_convention: calling_convention_of(calling_convention),
    };

    let body_statements: Rc<[Statement]> = Rc::from(body.clone().unwrap_or_default());
    let body_scope = process_scope(engine, Some(inst_scope), body_statements, false, file_path);

    let fc = FunctionConstant {
        declaration: simplec_common::DefId::from_index(job_id.index()),
        body_scope,
        child_scopes: Rc::new(vec![inst_scope]),
        is_external: *is_external,
    };
    let value = ConstantValue::Function(fc);
    JobOutcome::Done(JobOutput::PolymorphicFunction(PolymorphicInstantiationOutput { ty, value, definition_scope: body_scope }))
}

fn run_polymorphic_struct_like(engine: &mut Engine, job_id: JobId, is_union: bool) -> JobOutcome {
    match engine.job(job_id).input.clone() {
        JobInput::Declaration(decl) => {
            let def_id = simplec_common::DefId::from_index(job_id.index());
            let ty = if is_union {
                Type::PolymorphicUnion { def_id, parameter_types: Rc::new(Vec::new()), parent_scope: decl.scope }
            } else {
                Type::PolymorphicStruct { def_id, parameter_types: Rc::new(Vec::new()), parent_scope: decl.scope }
            };
            let value = ConstantValue::Type(Box::new(ty.clone()));
            let output = PolymorphicInstantiationOutput { ty, value, definition_scope: decl.scope };
            JobOutcome::Done(if is_union { JobOutput::PolymorphicUnion(output) } else { JobOutput::PolymorphicStruct(output) })
        }
        JobInput::PolymorphicInstantiation(input) => run_polymorphic_struct_like_instantiation(engine, job_id, input, is_union),
        _ => unreachable!("TypePolymorphicStruct/TypePolymorphicUnion job with unexpected input"),
    }
}

fn run_polymorphic_struct_like_instantiation(engine: &mut Engine, job_id: JobId, input: PolymorphicInstantiationInput, is_union: bool) -> JobOutcome {
    let stmt = engine.scope(input.scope).statements[input.statement_index].clone();
    let (formals, members_ast) = match &stmt.kind {
        StatementKind::StructDefinition { parameters, members, .. } | StatementKind::UnionDefinition { parameters, members, .. } => {
            (parameters.clone(), members.clone())
        }
        _ => unreachable!("TypePolymorphicStruct/TypePolymorphicUnion instantiation on a non-aggregate statement"),
    };
    let path = engine.scope(input.scope).file_path.to_string();
    let file_path = Rc::clone(&engine.scope(input.scope).file_path);

    let inst_scope = engine.add_scope(ConstantScope::new(Some(input.parent_scope), Rc::from(Vec::new()), false, Rc::clone(&file_path)));

    for (formal, slot) in formals.iter().zip(input.parameters.iter()) {
        let value = match formal.kind {
            PolymorphicParameterKind::TypeParameter => ConstantValue::Type(Box::new(slot.ty.clone())),
            PolymorphicParameterKind::ConstantParameter => slot.value.clone().unwrap_or(ConstantValue::Void),
        };
        engine.scope_mut(inst_scope).scope_constants.push(ScopeConstant { name: formal.name.clone(), ty: slot.ty.clone(), value });
    }

    let mut members = Vec::with_capacity(members_ast.len());
    for member in &members_ast {
        let mut ctx = TypingContext::new([], vec![]);
        let (te, rv) = match type_expression(engine, &mut ctx, inst_scope, &path, &member.type_expression) {
            ExprOutcome::Typed(te, rv) => (te, rv),
            ExprOutcome::Wait(dep) => return JobOutcome::Wait(dep),
        };
        let ty = expect_type_constant(&te, &rv, engine, &path, te.range).unwrap_or(Type::Void);
        members.push((member.name.clone(), ty));
    }

    let def_id = simplec_common::DefId::from_index(job_id.index());
    let concrete_ty = if is_union {
        Type::Union { def_id, members: Rc::new(members), file_path }
    } else {
        Type::Struct { def_id, members: Rc::new(members), file_path }
    };
    let value = ConstantValue::Type(Box::new(concrete_ty.clone()));
    let output = PolymorphicInstantiationOutput { ty: concrete_ty, value, definition_scope: inst_scope };
    JobOutcome::Done(if is_union { JobOutput::PolymorphicUnion(output) } else { JobOutput::PolymorphicStruct(output) })
}

/// Recovers a function's parameter names (from its declaration's AST) and
/// resolved parameter/return types (from the declaration or instantiation
/// job's own output) given only its body scope — `FunctionBodyInput` doesn't
/// carry a `DefId` back to the declaring job, so this scans for the
/// `TypeFunctionDeclaration`/`TypePolymorphicFunction` job whose
/// `FunctionConstant` owns `body_scope` (the same linear-scan style as
/// `Engine::find_function_body_job`).
fn locate_function_signature(
    engine: &Engine,
    body_scope: ScopeId,
) -> Option<(Vec<simplec_ast::FunctionParameter>, Vec<Type>, Vec<Type>)> {
    for job in &engine.jobs {
        if !matches!(job.kind, JobKind::TypeFunctionDeclaration | JobKind::TypePolymorphicFunction) {
            continue;
        }
        let Some(output) = job.output.as_ref() else { continue };
        let owns_scope = match output {
            JobOutput::FunctionDeclaration(o) => o.body_scope == Some(body_scope),
            JobOutput::PolymorphicFunction(o) => matches!(&o.value, ConstantValue::Function(fc) if fc.body_scope == body_scope),
            _ => false,
        };
        if !owns_scope {
            continue;
        }
        return match output {
            JobOutput::FunctionDeclaration(o) => {
                let decl = job.input.as_declaration()?;
                let StatementKind::FunctionDeclaration { parameters, .. } = &engine.scope(decl.scope).statements[decl.statement_index].kind else {
                    return None;
                };
                Some((parameters.clone(), o.parameters.clone(), o.return_types.clone()))
            }
            JobOutput::PolymorphicFunction(o) => {
                let JobInput::PolymorphicInstantiation(poly_input) = &job.input else { return None };
                let StatementKind::FunctionDeclaration { parameters, .. } = &engine.scope(poly_input.scope).statements[poly_input.statement_index].kind else {
                    return None;
                };
                let Type::Function { parameters: param_types, return_types, .. } = &o.ty else { return None };
                Some((parameters.clone(), (**param_types).clone(), (**return_types).clone()))
            }
            _ => None,
        };
    }
    None
}

fn run_function_body(engine: &mut Engine, job_id: JobId) -> JobOutcome {
    let JobInput::FunctionBody(input) = engine.job(job_id).input.clone() else {
        unreachable!("TypeFunctionBody job without FunctionBody input");
    };
    let Some((formals, param_types, return_types)) = locate_function_signature(engine, input.body_scope) else {
        // The owning declaration/instantiation job hasn't produced output yet
        // in a cache-resume scenario; nothing to type until it has.
        return JobOutcome::Done(JobOutput::FunctionBody(FunctionBodyOutput { statements: Vec::new() }));
    };

    let path = engine.scope(input.body_scope).file_path.to_string();
    let statements: Rc<[Statement]> = Rc::clone(&engine.scope(input.body_scope).statements);
    let child_scopes: Vec<ScopeId> = engine.scope(input.body_scope).child_scopes.clone();

    let mut ctx = TypingContext::new(child_scopes, return_types);
    for (formal, ty) in formals.iter().zip(param_types.iter()) {
        ctx.declare(formal.name.clone(), ty.clone());
    }

    match type_statements(engine, &mut ctx, input.body_scope, &path, &statements) {
        Ok(typed) => JobOutcome::Done(JobOutput::FunctionBody(FunctionBodyOutput { statements: typed })),
        Err(dep) => JobOutcome::Wait(dep),
    }
}
