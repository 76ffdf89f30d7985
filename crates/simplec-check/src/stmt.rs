//! Statement typing (§4.6).
//!
//! Each rule types a `StatementKind` into a `TypedStatementKind`, draining
//! the scope's pre-allocated child scopes in the exact order scope
//! processing produced them (§4.2's child-scope ordering invariant, enforced
//! by `TypingContext::next_child_scope`).

use crate::coerce::coerce;
use crate::context::TypingContext;
use crate::expr::{type_expression, ExprOutcome};
use simplec_ast::{Statement, StatementKind};
use simplec_common::{Diagnostic, DiagnosticKind, DiagnosticSink, ScopeId};
use simplec_engine::Engine;
use simplec_types::{RuntimeValue, Type, TypedExpression, TypedStatement, TypedStatementKind};

pub enum StmtOutcome {
    Typed(TypedStatement),
    Wait(simplec_common::JobId),
}

macro_rules! try_expr {
    ($outcome:expr) => {
        match $outcome {
            ExprOutcome::Typed(te, rv) => (te, rv),
            ExprOutcome::Wait(job) => return StmtOutcome::Wait(job),
        }
    };
}

fn report(engine: &mut Engine, kind: DiagnosticKind, path: &str, range: simplec_common::FileRange, message: impl Into<String>) {
    engine.diagnostics.report(Diagnostic::error(kind, path, range, message));
}

/// Types every statement in `statements`. Everything after a `Return` is
/// flagged `UnreachableCode` (§4.6) but still typed, so a function body
/// yields as many diagnostics as possible in one pass.
pub fn type_statements(
    engine: &mut Engine,
    ctx: &mut TypingContext,
    scope: ScopeId,
    path: &str,
    statements: &[Statement],
) -> Result<Vec<TypedStatement>, simplec_common::JobId> {
    let mut out = Vec::with_capacity(statements.len());
    let mut terminated_at: Option<usize> = None;
    for (i, stmt) in statements.iter().enumerate() {
        if terminated_at.is_some() {
            report(engine, DiagnosticKind::UnreachableCode, path, stmt.range, "Unreachable code");
        }
        match type_statement(engine, ctx, scope, path, stmt) {
            StmtOutcome::Typed(typed) => {
                if matches!(typed.kind, TypedStatementKind::Return(_)) && terminated_at.is_none() {
                    terminated_at = Some(i);
                }
                out.push(typed);
            }
            StmtOutcome::Wait(job) => return Err(job),
        }
    }
    Ok(out)
}

fn type_statement(engine: &mut Engine, ctx: &mut TypingContext, scope: ScopeId, path: &str, stmt: &Statement) -> StmtOutcome {
    let range = stmt.range;
    match &stmt.kind {
        StatementKind::Expression(expr) => {
            let (te, _) = try_expr!(type_expression(engine, ctx, scope, path, expr));
            StmtOutcome::Typed(TypedStatement::new(range, TypedStatementKind::Expression(te)))
        }
        StatementKind::VariableDeclaration { name, type_expression, initializer } => {
            type_variable_declaration(engine, ctx, scope, path, range, name, type_expression.as_ref(), initializer.as_ref())
        }
        StatementKind::MultiReturnVariableDeclaration { names, initializer } => {
            type_multi_return_declaration(engine, ctx, scope, path, range, names, initializer)
        }
        StatementKind::Assignment { target, value } => type_assignment(engine, ctx, scope, path, range, target, value),
        StatementKind::MultiReturnAssignment { targets, value } => type_multi_return_assignment(engine, ctx, scope, path, range, targets, value),
        StatementKind::BinaryOperationAssignment { target, operator, value } => {
            type_binary_assignment(engine, ctx, scope, path, range, target, *operator, value)
        }
        StatementKind::IfStatement { condition, then_statements, else_ifs, else_statements } => {
            type_if(engine, ctx, scope, path, range, condition, then_statements, else_ifs, else_statements)
        }
        StatementKind::WhileLoop { condition, statements } => type_while(engine, ctx, scope, path, range, condition, statements),
        StatementKind::ForLoop { index_name, from, to, statements } => type_for(engine, ctx, scope, path, range, index_name.as_deref(), from, to, statements),
        StatementKind::Return(values) => type_return(engine, ctx, scope, path, range, values),
        StatementKind::Break => {
            if !ctx.in_breakable {
                report(engine, DiagnosticKind::Syntactic, path, range, "'break' outside of a loop");
            }
            StmtOutcome::Typed(TypedStatement::new(range, TypedStatementKind::Other))
        }
        StatementKind::InlineAssembly { bindings, .. } => {
            for binding in bindings {
                let (_, _) = try_expr!(type_expression(engine, ctx, scope, path, &binding.value));
            }
            StmtOutcome::Typed(TypedStatement::new(range, TypedStatementKind::Other))
        }
        // Declaration-like statements nested inside a body are scheduled as
        // their own jobs by scope processing (§4.2); statement typing only
        // needs to record their presence for hover/unreachable-code purposes.
        StatementKind::FunctionDeclaration { .. }
        | StatementKind::ConstantDefinition { .. }
        | StatementKind::StructDefinition { .. }
        | StatementKind::UnionDefinition { .. }
        | StatementKind::EnumDefinition { .. }
        | StatementKind::StaticVariableDeclaration { .. }
        | StatementKind::Using { .. }
        | StatementKind::StaticIf { .. } => StmtOutcome::Typed(TypedStatement::new(range, TypedStatementKind::Other)),
    }
}

fn type_variable_declaration(
    engine: &mut Engine,
    ctx: &mut TypingContext,
    scope: ScopeId,
    path: &str,
    range: simplec_common::FileRange,
    name: &str,
    type_expression_ast: Option<&simplec_ast::Expression>,
    initializer: Option<&simplec_ast::Expression>,
) -> StmtOutcome {
    let declared_type = match type_expression_ast {
        Some(te_ast) => {
            let (te, rv) = try_expr!(type_expression(engine, ctx, scope, path, te_ast));
            match rv.as_constant() {
                Some(simplec_types::ConstantValue::Type(t)) => Some((**t).clone()),
                _ => {
                    report(engine, DiagnosticKind::Type, path, te.range, "Expected a type expression");
                    Some(Type::Void)
                }
            }
        }
        None => None,
    };

    let mut typed_initializer = None;
    let mut final_type = declared_type.clone();
    if let Some(init) = initializer {
        let (init_te, init_rv) = try_expr!(type_expression(engine, ctx, scope, path, init));
        match &declared_type {
            Some(target) => {
                let _ = coerce(&init_te.ty, &init_rv, target, false, init_te.range, path, &mut engine.diagnostics);
            }
            None => {
                final_type = Some(default_typed(&init_te.ty));
            }
        }
        typed_initializer = Some(init_te);
    }

    let final_type = final_type.unwrap_or_else(|| {
        report(engine, DiagnosticKind::Type, path, range, format!("'{name}' needs either a type or an initializer"));
        Type::Void
    });

    if let Some(previous) = ctx.declare(name.to_string(), final_type.clone()) {
        report(
            engine,
            DiagnosticKind::NameResolution,
            path,
            range,
            format!("'{name}' shadows a variable of the same name declared as '{}'", previous.ty.describe()),
        );
    }

    StmtOutcome::Typed(TypedStatement::new(
        range,
        TypedStatementKind::VariableDeclaration { name: name.to_string(), declared_type: final_type, initializer: typed_initializer },
    ))
}

/// Pins an `Undetermined*` type to its default concrete type once it's
/// bound to a variable with no explicit annotation (§9).
pub(crate) fn default_typed(ty: &Type) -> Type {
    match ty {
        Type::UndeterminedInteger => Type::default_integer(),
        Type::UndeterminedFloat => Type::default_float(),
        other => other.clone(),
    }
}

fn type_multi_return_declaration(
    engine: &mut Engine,
    ctx: &mut TypingContext,
    scope: ScopeId,
    path: &str,
    range: simplec_common::FileRange,
    names: &[String],
    initializer: &simplec_ast::Expression,
) -> StmtOutcome {
    let (init_te, _) = try_expr!(type_expression(engine, ctx, scope, path, initializer));
    let types: Vec<Type> = match &init_te.ty {
        Type::MultiReturn(types) => types.as_ref().clone(),
        other => vec![other.clone()],
    };
    if types.len() != names.len() {
        report(engine, DiagnosticKind::Arity, path, range, format!("Expected {} value(s), found {}", names.len(), types.len()));
    }
    for (name, ty) in names.iter().zip(types.iter().chain(std::iter::repeat(&Type::Void))) {
        ctx.declare(name.clone(), default_typed(ty));
    }
    StmtOutcome::Typed(TypedStatement::new(
        range,
        TypedStatementKind::VariableDeclaration { name: names.join(","), declared_type: Type::Void, initializer: Some(init_te) },
    ))
}

fn type_assignment(
    engine: &mut Engine,
    ctx: &mut TypingContext,
    scope: ScopeId,
    path: &str,
    range: simplec_common::FileRange,
    target: &simplec_ast::Expression,
    value: &simplec_ast::Expression,
) -> StmtOutcome {
    let (target_te, target_rv) = try_expr!(type_expression(engine, ctx, scope, path, target));
    if !target_rv.is_addressed() {
        report(engine, DiagnosticKind::TagMisuse, path, target_te.range, "Assignment target is not addressable");
    }
    let (value_te, value_rv) = try_expr!(type_expression(engine, ctx, scope, path, value));
    let _ = coerce(&value_te.ty, &value_rv, &target_te.ty, false, value_te.range, path, &mut engine.diagnostics);
    StmtOutcome::Typed(TypedStatement::new(range, TypedStatementKind::Assignment { target: target_te, value: value_te }))
}

fn type_multi_return_assignment(
    engine: &mut Engine,
    ctx: &mut TypingContext,
    scope: ScopeId,
    path: &str,
    range: simplec_common::FileRange,
    targets: &[simplec_ast::Expression],
    value: &simplec_ast::Expression,
) -> StmtOutcome {
    let (value_te, _) = try_expr!(type_expression(engine, ctx, scope, path, value));
    let types: Vec<Type> = match &value_te.ty {
        Type::MultiReturn(types) => types.as_ref().clone(),
        other => vec![other.clone()],
    };
    if types.len() != targets.len() {
        report(engine, DiagnosticKind::Arity, path, range, format!("Expected {} value(s), found {}", targets.len(), types.len()));
    }
    let mut typed_targets = Vec::with_capacity(targets.len());
    for (target, ty) in targets.iter().zip(types.iter().chain(std::iter::repeat(&Type::Void))) {
        let (target_te, target_rv) = try_expr!(type_expression(engine, ctx, scope, path, target));
        if !target_rv.is_addressed() {
            report(engine, DiagnosticKind::TagMisuse, path, target_te.range, "Assignment target is not addressable");
        }
        let _ = coerce(ty, &RuntimeValue::Register, &target_te.ty, true, target_te.range, path, &mut engine.diagnostics);
        typed_targets.push(target_te);
    }
    let target_te = typed_targets.into_iter().next().unwrap_or_else(|| value_te.clone());
    StmtOutcome::Typed(TypedStatement::new(range, TypedStatementKind::Assignment { target: target_te, value: value_te }))
}

fn type_binary_assignment(
    engine: &mut Engine,
    ctx: &mut TypingContext,
    scope: ScopeId,
    path: &str,
    range: simplec_common::FileRange,
    target: &simplec_ast::Expression,
    operator: simplec_ast::BinaryOperator,
    value: &simplec_ast::Expression,
) -> StmtOutcome {
    let (target_te, target_rv) = try_expr!(type_expression(engine, ctx, scope, path, target));
    if !target_rv.is_addressed() {
        report(engine, DiagnosticKind::TagMisuse, path, target_te.range, "Assignment target is not addressable");
    }
    let (value_te, value_rv) = try_expr!(type_expression(engine, ctx, scope, path, value));
    let _ = coerce(&value_te.ty, &value_rv, &target_te.ty, false, value_te.range, path, &mut engine.diagnostics);
    StmtOutcome::Typed(TypedStatement::new(range, TypedStatementKind::BinaryOperationAssignment { target: target_te, operator, value: value_te }))
}

fn type_if(
    engine: &mut Engine,
    ctx: &mut TypingContext,
    scope: ScopeId,
    path: &str,
    range: simplec_common::FileRange,
    condition: &simplec_ast::Expression,
    then_statements: &[Statement],
    else_ifs: &[(simplec_ast::Expression, Vec<Statement>)],
    else_statements: &Option<Vec<Statement>>,
) -> StmtOutcome {
    let (cond_te, cond_rv) = try_expr!(type_expression(engine, ctx, scope, path, condition));
    let _ = coerce(&cond_te.ty, &cond_rv, &Type::Boolean, false, cond_te.range, path, &mut engine.diagnostics);

    let then_scope = ctx.next_child_scope().unwrap_or(scope);
    ctx.push_frame();
    let then_typed = match type_statements(engine, ctx, then_scope, path, then_statements) {
        Ok(s) => s,
        Err(job) => {
            ctx.pop_frame();
            return StmtOutcome::Wait(job);
        }
    };
    ctx.pop_frame();

    // Each `else if` and the trailing `else` consumes its own pre-allocated
    // child scope, in source order (the child-scope ordering invariant) —
    // typed first into a flat list, then folded backwards into a nested
    // `TypedStatementKind::IfStatement` chain so the trailing `else` ends up
    // attached to the innermost `else if`, not discarded.
    let mut branches: Vec<(TypedExpression, Vec<TypedStatement>)> = Vec::with_capacity(else_ifs.len());
    for (else_cond, else_body) in else_ifs {
        let body_scope = ctx.next_child_scope().unwrap_or(scope);
        ctx.push_frame();
        let body_typed = match type_statements(engine, ctx, body_scope, path, else_body) {
            Ok(s) => s,
            Err(job) => {
                ctx.pop_frame();
                return StmtOutcome::Wait(job);
            }
        };
        ctx.pop_frame();
        let (econd_te, econd_rv) = try_expr!(type_expression(engine, ctx, scope, path, else_cond));
        let _ = coerce(&econd_te.ty, &econd_rv, &Type::Boolean, false, econd_te.range, path, &mut engine.diagnostics);
        branches.push((econd_te, body_typed));
    }

    let mut else_typed: Option<Vec<TypedStatement>> = match else_statements {
        Some(trailing) => {
            let body_scope = ctx.next_child_scope().unwrap_or(scope);
            ctx.push_frame();
            let body_typed = match type_statements(engine, ctx, body_scope, path, trailing) {
                Ok(s) => s,
                Err(job) => {
                    ctx.pop_frame();
                    return StmtOutcome::Wait(job);
                }
            };
            ctx.pop_frame();
            Some(body_typed)
        }
        None => None,
    };

    for (econd_te, body_typed) in branches.into_iter().rev() {
        let nested = TypedStatement::new(
            econd_te.range,
            TypedStatementKind::IfStatement { condition: econd_te, then_statements: body_typed, else_statements: else_typed.take() },
        );
        else_typed = Some(vec![nested]);
    }

    StmtOutcome::Typed(TypedStatement::new(
        range,
        TypedStatementKind::IfStatement { condition: cond_te, then_statements: then_typed, else_statements: else_typed },
    ))
}

fn type_while(
    engine: &mut Engine,
    ctx: &mut TypingContext,
    scope: ScopeId,
    path: &str,
    range: simplec_common::FileRange,
    condition: &simplec_ast::Expression,
    statements: &[Statement],
) -> StmtOutcome {
    let (cond_te, cond_rv) = try_expr!(type_expression(engine, ctx, scope, path, condition));
    let _ = coerce(&cond_te.ty, &cond_rv, &Type::Boolean, false, cond_te.range, path, &mut engine.diagnostics);

    let body_scope = ctx.next_child_scope().unwrap_or(scope);
    let was_breakable = ctx.in_breakable;
    ctx.in_breakable = true;
    ctx.push_frame();
    let body_typed = match type_statements(engine, ctx, body_scope, path, statements) {
        Ok(s) => s,
        Err(job) => {
            ctx.pop_frame();
            ctx.in_breakable = was_breakable;
            return StmtOutcome::Wait(job);
        }
    };
    ctx.pop_frame();
    ctx.in_breakable = was_breakable;

    StmtOutcome::Typed(TypedStatement::new(range, TypedStatementKind::WhileLoop { condition: cond_te, statements: body_typed }))
}

fn type_for(
    engine: &mut Engine,
    ctx: &mut TypingContext,
    scope: ScopeId,
    path: &str,
    range: simplec_common::FileRange,
    index_name: Option<&str>,
    from: &simplec_ast::Expression,
    to: &simplec_ast::Expression,
    statements: &[Statement],
) -> StmtOutcome {
    let (from_te, _from_rv) = try_expr!(type_expression(engine, ctx, scope, path, from));
    let (to_te, to_rv) = try_expr!(type_expression(engine, ctx, scope, path, to));
    if !from_te.ty.is_integer() || !to_te.ty.is_integer() {
        report(engine, DiagnosticKind::Type, path, range, "'for' bounds must be integers");
    }
    let index_type = default_typed(&from_te.ty);
    let _ = coerce(&to_te.ty, &to_rv, &index_type, true, to_te.range, path, &mut engine.diagnostics);

    let body_scope = ctx.next_child_scope().unwrap_or(scope);
    let was_breakable = ctx.in_breakable;
    ctx.in_breakable = true;
    ctx.push_frame();
    let index_name = index_name.unwrap_or("it").to_string();
    ctx.declare(index_name.clone(), index_type.clone());
    let body_typed = match type_statements(engine, ctx, body_scope, path, statements) {
        Ok(s) => s,
        Err(job) => {
            ctx.pop_frame();
            ctx.in_breakable = was_breakable;
            return StmtOutcome::Wait(job);
        }
    };
    ctx.pop_frame();
    ctx.in_breakable = was_breakable;

    StmtOutcome::Typed(TypedStatement::new(
        range,
        TypedStatementKind::ForLoop { index_name, index_type, from: from_te, to: to_te, statements: body_typed },
    ))
}

fn type_return(
    engine: &mut Engine,
    ctx: &mut TypingContext,
    scope: ScopeId,
    path: &str,
    range: simplec_common::FileRange,
    values: &[simplec_ast::Expression],
) -> StmtOutcome {
    let expected = ctx.return_types.clone();
    if values.len() != expected.len() {
        report(engine, DiagnosticKind::Arity, path, range, format!("Expected {} return value(s), found {}", expected.len(), values.len()));
    }
    let mut typed_values = Vec::with_capacity(values.len());
    for (i, value) in values.iter().enumerate() {
        let (te, rv) = try_expr!(type_expression(engine, ctx, scope, path, value));
        if let Some(target) = expected.get(i) {
            let _ = coerce(&te.ty, &rv, target, false, te.range, path, &mut engine.diagnostics);
        }
        typed_values.push(te);
    }
    StmtOutcome::Typed(TypedStatement::new(range, TypedStatementKind::Return(typed_values)))
}
