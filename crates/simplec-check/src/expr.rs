//! Expression typing (§4.5).
//!
//! Every rule here returns a `(Type, RuntimeValue)` pair wrapped in a
//! `TypedExpression`, or suspends the owning job with `ExprOutcome::Wait`.
//! A rule that fails after emitting a diagnostic still returns `Typed`,
//! carrying `Type::Void` as a recovery type (§7: "the owning job returns
//! failure but the scheduler continues") — the spec's `Type` enum has no
//! dedicated error variant, so `Void` plays that role here (documented in
//! `DESIGN.md`).

use crate::coerce::coerce;
use crate::context::TypingContext;
use simplec_ast::{BinaryOperator, Expression, ExpressionKind, UnaryOperator};
use simplec_common::{Diagnostic, DiagnosticKind, DiagnosticSink, FileRange, JobId, ScopeId};
use simplec_engine::{Engine, FunctionBodyInput, JobInput, JobKind, ModuleLookup, NameLookupResult};
use simplec_types::{
    constant_values_equal, BuiltinFunctionKind, CallingConvention, ConstantValue, FloatSize,
    IntegerSize, RuntimeValue, Type, TypedExpression, TypedExpressionKind,
};
use std::rc::Rc;

pub enum ExprOutcome {
    Typed(TypedExpression, RuntimeValue),
    Wait(JobId),
}

macro_rules! try_typed {
    ($outcome:expr) => {
        match $outcome {
            ExprOutcome::Typed(te, rv) => (te, rv),
            ExprOutcome::Wait(job) => return ExprOutcome::Wait(job),
        }
    };
}

fn recovery(range: FileRange, kind: TypedExpressionKind) -> (TypedExpression, RuntimeValue) {
    (TypedExpression::new(range, Type::Void, None, kind), RuntimeValue::Register)
}

fn leaf(range: FileRange, ty: Type, constant: Option<ConstantValue>) -> (TypedExpression, RuntimeValue) {
    let rv = match &constant {
        Some(cv) => RuntimeValue::Constant(cv.clone()),
        None => RuntimeValue::Register,
    };
    (TypedExpression::new(range, ty, constant, TypedExpressionKind::Leaf), rv)
}

fn report(diagnostics: &mut dyn DiagnosticSink, kind: DiagnosticKind, path: &str, range: FileRange, message: impl Into<String>) {
    diagnostics.report(Diagnostic::error(kind, path, range, message));
}

/// Only the simplification §4.4 step 2 needs: a `using`'s module expression
/// must be a bare `Variable(name)` naming a prior declaration whose job
/// output resolves to `Type::FileModule` (richer module expressions are out
/// of scope, documented in `DESIGN.md`).
pub fn resolve_using_module(engine: &Engine, scope: ScopeId, statement_index: usize) -> ModuleLookup {
    let Some(stmt) = engine.scope(scope).statements.get(statement_index) else {
        return ModuleLookup::NotAModule;
    };
    let simplec_ast::StatementKind::Using { module_expression, .. } = &stmt.kind else {
        return ModuleLookup::NotAModule;
    };
    let ExpressionKind::Variable(name) = &module_expression.kind else {
        return ModuleLookup::NotAModule;
    };
    match simplec_engine::search_for_name(engine, scope, name, false, &mut resolve_using_module_cb) {
        NameLookupResult::Found(job_id) => {
            let Some(job) = engine.job(job_id).output.as_ref() else {
                return ModuleLookup::Wait(job_id);
            };
            match job.declared_type() {
                Some(Type::FileModule(target)) => ModuleLookup::Scope(*target),
                _ => ModuleLookup::NotAModule,
            }
        }
        NameLookupResult::Wait(job_id) => ModuleLookup::Wait(job_id),
        NameLookupResult::FoundConstant { .. } | NameLookupResult::NotFound => ModuleLookup::NotAModule,
    }
}

fn resolve_using_module_cb(engine: &Engine, scope: ScopeId, statement_index: usize) -> ModuleLookup {
    resolve_using_module(engine, scope, statement_index)
}

pub fn type_expression(
    engine: &mut Engine,
    ctx: &mut TypingContext,
    scope: ScopeId,
    path: &str,
    expr: &Expression,
) -> ExprOutcome {
    let range = expr.range;
    match &expr.kind {
        ExpressionKind::IntegerLiteral(v) => {
            let (te, rv) = leaf(range, Type::UndeterminedInteger, Some(ConstantValue::Integer(*v)));
            ExprOutcome::Typed(te, rv)
        }
        ExpressionKind::FloatLiteral(v) => {
            let (te, rv) = leaf(range, Type::UndeterminedFloat, Some(ConstantValue::Float(*v)));
            ExprOutcome::Typed(te, rv)
        }
        ExpressionKind::StringLiteral(s) => {
            let bytes: Vec<ConstantValue> = s.bytes().map(|b| ConstantValue::Integer(b as u64)).collect();
            let ty = Type::static_array(bytes.len() as u64, Type::Integer { size: IntegerSize::Bits8, signed: false });
            let (te, rv) = leaf(range, ty, Some(ConstantValue::StaticArray(Rc::new(bytes))));
            ExprOutcome::Typed(te, rv)
        }
        ExpressionKind::BooleanLiteral(b) => {
            let (te, rv) = leaf(range, Type::Boolean, Some(ConstantValue::Boolean(*b)));
            ExprOutcome::Typed(te, rv)
        }
        ExpressionKind::Undef => {
            let (te, rv) = leaf(range, Type::Undef, Some(ConstantValue::Undef));
            ExprOutcome::Typed(te, rv)
        }

        ExpressionKind::ArrayLiteral(elements) => type_array_literal(engine, ctx, scope, path, range, elements),
        ExpressionKind::StructLiteral(members) => type_struct_literal(engine, ctx, scope, path, range, members),

        ExpressionKind::Variable(name) => type_variable(engine, ctx, scope, path, range, name),

        ExpressionKind::BinaryOperation { operator, left, right } => {
            type_binary(engine, ctx, scope, path, range, *operator, left, right)
        }
        ExpressionKind::UnaryOperation { operator, operand } => {
            type_unary(engine, ctx, scope, path, range, *operator, operand)
        }

        ExpressionKind::Index { expression, index } => type_index(engine, ctx, scope, path, range, expression, index),
        ExpressionKind::Member { expression, member } => type_member(engine, ctx, scope, path, range, expression, member),

        ExpressionKind::Call { expression, parameters } => type_call(engine, ctx, scope, path, range, expression, parameters, false),
        ExpressionKind::Bake { expression, parameters } => type_call(engine, ctx, scope, path, range, expression, parameters, true),
        ExpressionKind::Cast { expression, type_expression } => type_cast(engine, ctx, scope, path, range, expression, type_expression),

        ExpressionKind::PointerType(inner) => {
            let (inner_te, inner_rv) = try_typed!(type_expression(engine, ctx, scope, path, inner));
            match expect_type_constant(&inner_te, &inner_rv, engine, path, range) {
                Some(inner_ty) => {
                    let ty = Type::pointer(inner_ty);
                    let (te, rv) = leaf(range, Type::Type, Some(ConstantValue::Type(Box::new(ty))));
                    ExprOutcome::Typed(te, rv)
                }
                None => {
                    let (te, rv) = recovery(range, TypedExpressionKind::Leaf);
                    ExprOutcome::Typed(te, rv)
                }
            }
        }
        ExpressionKind::ArrayType { length, element } => {
            let (element_te, element_rv) = try_typed!(type_expression(engine, ctx, scope, path, element));
            let Some(element_ty) = expect_type_constant(&element_te, &element_rv, engine, path, range) else {
                let (te, rv) = recovery(range, TypedExpressionKind::Leaf);
                return ExprOutcome::Typed(te, rv);
            };
            let ty = match length {
                None => Type::array(element_ty),
                Some(len_expr) => {
                    let (len_te, len_rv) = try_typed!(type_expression(engine, ctx, scope, path, len_expr));
                    match len_rv.as_constant() {
                        Some(ConstantValue::Integer(len)) => Type::static_array(*len, element_ty),
                        _ => {
                            report(&mut engine.diagnostics, DiagnosticKind::ConstantEvaluation, path, len_te.range, "Array length must be a constant integer");
                            Type::static_array(0, element_ty)
                        }
                    }
                }
            };
            let (te, rv) = leaf(range, Type::Type, Some(ConstantValue::Type(Box::new(ty))));
            ExprOutcome::Typed(te, rv)
        }
        ExpressionKind::FunctionType { parameters, return_types, calling_convention } => {
            let mut param_types = Vec::with_capacity(parameters.len());
            for p in parameters {
                let (te, rv) = try_typed!(type_expression(engine, ctx, scope, path, p));
                match expect_type_constant(&te, &rv, engine, path, range) {
                    Some(t) => param_types.push(t),
                    None => param_types.push(Type::Void),
                }
            }
            let mut return_type_list = Vec::with_capacity(return_types.len());
            for r in return_types {
                let (te, rv) = try_typed!(type_expression(engine, ctx, scope, path, r));
                match expect_type_constant(&te, &rv, engine, path, range) {
                    Some(t) => return_type_list.push(t),
                    None => return_type_list.push(Type::Void),
                }
            }
            let calling_convention = match calling_convention.as_deref() {
                Some("stdcall") => CallingConvention::StdCall,
                _ => CallingConvention::Default,
            };
            let ty = Type::Function {
                parameters: Rc::new(param_types),
                return_types: Rc::new(return_type_list),
                calling_convention,
            };
            let (te, rv) = leaf(range, Type::Type, Some(ConstantValue::Type(Box::new(ty))));
            ExprOutcome::Typed(te, rv)
        }
    }
}

pub(crate) fn expect_type_constant(te: &TypedExpression, rv: &RuntimeValue, engine: &mut Engine, path: &str, range: FileRange) -> Option<Type> {
    match rv.as_constant() {
        Some(ConstantValue::Type(t)) => Some((**t).clone()),
        _ => {
            report(&mut engine.diagnostics, DiagnosticKind::Type, path, te.range, "Expected a type expression");
            let _ = range;
            None
        }
    }
}

fn type_array_literal(
    engine: &mut Engine,
    ctx: &mut TypingContext,
    scope: ScopeId,
    path: &str,
    range: FileRange,
    elements: &[Expression],
) -> ExprOutcome {
    if elements.is_empty() {
        report(&mut engine.diagnostics, DiagnosticKind::ConstantEvaluation, path, range, "Array literal must have at least one element");
        let (te, rv) = recovery(range, TypedExpressionKind::ArrayLiteral(vec![]));
        return ExprOutcome::Typed(te, rv);
    }
    let mut typed_elements = Vec::with_capacity(elements.len());
    let mut values = Vec::with_capacity(elements.len());
    let mut all_constant = true;
    let mut element_ty: Option<Type> = None;
    for element in elements {
        let (te, rv) = try_typed!(type_expression(engine, ctx, scope, path, element));
        let this_ty = te.ty.clone();
        let target_ty = element_ty.get_or_insert_with(|| this_ty.clone()).clone();
        let (coerced_ty, coerced_rv) = match coerce(&this_ty, &rv, &target_ty, false, te.range, path, &mut engine.diagnostics) {
            Ok(pair) => pair,
            Err(_) => (target_ty.clone(), rv.clone()),
        };
        if element_ty.as_ref() == Some(&this_ty) {
            element_ty = Some(coerced_ty);
        }
        all_constant &= coerced_rv.is_constant();
        if let Some(cv) = coerced_rv.as_constant() {
            values.push(cv.clone());
        }
        typed_elements.push(te);
    }
    // An array of bare literals (`[1, 2, 3]`) never coerces an element against
    // anything external, so `element_ty` is still undetermined here; pin it to
    // its default concrete type (§9) the same way `default_typed` does for an
    // un-annotated variable, since the array's element type is now baked into
    // a persistent `Type::StaticArray` rather than a single constant.
    let element_ty = crate::stmt::default_typed(&element_ty.unwrap_or(Type::Void));
    let ty = Type::static_array(typed_elements.len() as u64, element_ty);
    let constant = if all_constant { Some(ConstantValue::StaticArray(Rc::new(values))) } else { None };
    let rv = match &constant {
        Some(cv) => RuntimeValue::Constant(cv.clone()),
        None => RuntimeValue::Register,
    };
    let te = TypedExpression::new(range, ty, constant, TypedExpressionKind::ArrayLiteral(typed_elements));
    ExprOutcome::Typed(te, rv)
}

fn type_struct_literal(
    engine: &mut Engine,
    ctx: &mut TypingContext,
    scope: ScopeId,
    path: &str,
    range: FileRange,
    members: &[(String, Expression)],
) -> ExprOutcome {
    let mut typed_members = Vec::with_capacity(members.len());
    let mut member_types = Vec::with_capacity(members.len());
    let mut member_values = Vec::with_capacity(members.len());
    let mut all_constant = true;
    for (name, value) in members {
        let (te, rv) = try_typed!(type_expression(engine, ctx, scope, path, value));
        member_types.push((name.clone(), te.ty.clone()));
        all_constant &= rv.is_constant();
        member_values.push(rv.clone());
        typed_members.push((name.clone(), te));
    }
    let ty = Type::UndeterminedStruct(Rc::new(member_types));
    let rv = if all_constant {
        let values: Vec<ConstantValue> = member_values.into_iter().filter_map(|v| v.into_constant()).collect();
        RuntimeValue::Constant(ConstantValue::Struct(Rc::new(values)))
    } else {
        RuntimeValue::UndeterminedStruct(member_values)
    };
    let constant = rv.as_constant().cloned();
    let te = TypedExpression::new(range, ty, constant, TypedExpressionKind::StructLiteral(typed_members));
    ExprOutcome::Typed(te, rv)
}

fn type_variable(engine: &mut Engine, ctx: &mut TypingContext, scope: ScopeId, path: &str, range: FileRange, name: &str) -> ExprOutcome {
    if let Some(binding) = ctx.lookup(name) {
        let (te, _) = leaf(range, binding.ty.clone(), None);
        return ExprOutcome::Typed(te, RuntimeValue::Addressed);
    }
    match simplec_engine::search_for_name(engine, scope, name, false, &mut resolve_using_module_cb) {
        NameLookupResult::Found(job_id) => {
            if !engine.job(job_id).is_done() {
                return ExprOutcome::Wait(job_id);
            }
            let output = engine.job_output(job_id).expect("done job carries output");
            let ty = output.declared_type().cloned().unwrap_or(Type::Void);
            let constant = output.constant_value();
            let rv = match &constant {
                Some(cv) => RuntimeValue::Constant(cv.clone()),
                None => RuntimeValue::Addressed,
            };
            let te = TypedExpression::new(range, ty, constant, TypedExpressionKind::Leaf);
            ExprOutcome::Typed(te, rv)
        }
        NameLookupResult::FoundConstant { scope: owner, index } => {
            let sc = &engine.scope(owner).scope_constants[index];
            let ty = sc.ty.clone();
            let value = sc.value.clone();
            let te = TypedExpression::new(range, ty, Some(value.clone()), TypedExpressionKind::Leaf);
            ExprOutcome::Typed(te, RuntimeValue::Constant(value))
        }
        NameLookupResult::Wait(job_id) => ExprOutcome::Wait(job_id),
        NameLookupResult::NotFound => {
            report(&mut engine.diagnostics, DiagnosticKind::NameResolution, path, range, format!("Unknown name '{name}'"));
            let (te, rv) = recovery(range, TypedExpressionKind::Leaf);
            ExprOutcome::Typed(te, rv)
        }
    }
}

fn determine_binary_type(left: &Type, right: &Type) -> Option<Type> {
    if !left.is_undetermined() {
        return Some(left.clone());
    }
    if !right.is_undetermined() {
        return Some(right.clone());
    }
    match (left, right) {
        (Type::UndeterminedInteger, Type::UndeterminedInteger) => Some(Type::UndeterminedInteger),
        (Type::UndeterminedFloat, Type::UndeterminedFloat) => Some(Type::UndeterminedFloat),
        (Type::UndeterminedInteger, Type::UndeterminedFloat) | (Type::UndeterminedFloat, Type::UndeterminedInteger) => {
            Some(Type::UndeterminedFloat)
        }
        _ => None,
    }
}

fn fold_arithmetic(operator: BinaryOperator, ty: &Type, left: &ConstantValue, right: &ConstantValue) -> Option<ConstantValue> {
    match (left, right) {
        (ConstantValue::Integer(a), ConstantValue::Integer(b)) => {
            let signed = matches!(ty, Type::Integer { signed: true, .. });
            let (a, b) = (*a, *b);
            let result = if signed {
                let (a, b) = (a as i64, b as i64);
                let r = match operator {
                    BinaryOperator::Add => a.wrapping_add(b),
                    BinaryOperator::Subtract => a.wrapping_sub(b),
                    BinaryOperator::Multiply => a.wrapping_mul(b),
                    BinaryOperator::Divide => if b != 0 { a.wrapping_div(b) } else { return None },
                    BinaryOperator::Modulo => if b != 0 { a.wrapping_rem(b) } else { return None },
                    BinaryOperator::BitwiseAnd => a & b,
                    BinaryOperator::BitwiseOr => a | b,
                    BinaryOperator::ShiftLeft => a.wrapping_shl(b as u32),
                    BinaryOperator::ShiftRight => a.wrapping_shr(b as u32),
                    BinaryOperator::ShiftRightUnsigned => ((a as u64) >> (b as u32)) as i64,
                    _ => return None,
                };
                r as u64
            } else {
                let r = match operator {
                    BinaryOperator::Add => a.wrapping_add(b),
                    BinaryOperator::Subtract => a.wrapping_sub(b),
                    BinaryOperator::Multiply => a.wrapping_mul(b),
                    BinaryOperator::Divide => if b != 0 { a.wrapping_div(b) } else { return None },
                    BinaryOperator::Modulo => if b != 0 { a.wrapping_rem(b) } else { return None },
                    BinaryOperator::BitwiseAnd => a & b,
                    BinaryOperator::BitwiseOr => a | b,
                    BinaryOperator::ShiftLeft => a.wrapping_shl(b as u32),
                    BinaryOperator::ShiftRight | BinaryOperator::ShiftRightUnsigned => a.wrapping_shr(b as u32),
                    _ => return None,
                };
                r
            };
            Some(ConstantValue::Integer(result))
        }
        (ConstantValue::Float(a), ConstantValue::Float(b)) => {
            let r = match operator {
                BinaryOperator::Add => a + b,
                BinaryOperator::Subtract => a - b,
                BinaryOperator::Multiply => a * b,
                BinaryOperator::Divide => a / b,
                _ => return None,
            };
            Some(ConstantValue::Float(r))
        }
        _ => None,
    }
}

fn fold_comparison(operator: BinaryOperator, left: &ConstantValue, right: &ConstantValue, signed: bool) -> Option<bool> {
    match (left, right) {
        (ConstantValue::Integer(a), ConstantValue::Integer(b)) => {
            let ordering = if signed { (*a as i64).cmp(&(*b as i64)) } else { a.cmp(b) };
            Some(match operator {
                BinaryOperator::Equal => *a == *b,
                BinaryOperator::NotEqual => *a != *b,
                BinaryOperator::LessThan => ordering.is_lt(),
                BinaryOperator::LessThanOrEqual => ordering.is_le(),
                BinaryOperator::GreaterThan => ordering.is_gt(),
                BinaryOperator::GreaterThanOrEqual => ordering.is_ge(),
                _ => return None,
            })
        }
        (ConstantValue::Float(a), ConstantValue::Float(b)) => Some(match operator {
            BinaryOperator::Equal => a == b,
            BinaryOperator::NotEqual => a != b,
            BinaryOperator::LessThan => a < b,
            BinaryOperator::LessThanOrEqual => a <= b,
            BinaryOperator::GreaterThan => a > b,
            BinaryOperator::GreaterThanOrEqual => a >= b,
            _ => return None,
        }),
        (ConstantValue::Boolean(a), ConstantValue::Boolean(b)) => Some(match operator {
            BinaryOperator::Equal => a == b,
            BinaryOperator::NotEqual => a != b,
            _ => return None,
        }),
        _ => {
            let eq = constant_values_equal(left, right);
            match operator {
                BinaryOperator::Equal => Some(eq),
                BinaryOperator::NotEqual => Some(!eq),
                _ => None,
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn type_binary(
    engine: &mut Engine,
    ctx: &mut TypingContext,
    scope: ScopeId,
    path: &str,
    range: FileRange,
    operator: BinaryOperator,
    left: &Expression,
    right: &Expression,
) -> ExprOutcome {
    let (left_te, left_rv) = try_typed!(type_expression(engine, ctx, scope, path, left));
    let (right_te, right_rv) = try_typed!(type_expression(engine, ctx, scope, path, right));

    let build = |ty: Type, constant: Option<ConstantValue>, left_te: TypedExpression, right_te: TypedExpression| {
        let rv = match &constant {
            Some(cv) => RuntimeValue::Constant(cv.clone()),
            None => RuntimeValue::Register,
        };
        let te = TypedExpression::new(
            range,
            ty,
            constant,
            TypedExpressionKind::BinaryOperation { operator, left: Box::new(left_te), right: Box::new(right_te) },
        );
        (te, rv)
    };

    if operator.is_boolean_op() {
        let left_ok = coerce(&left_te.ty, &left_rv, &Type::Boolean, false, left_te.range, path, &mut engine.diagnostics);
        let right_ok = coerce(&right_te.ty, &right_rv, &Type::Boolean, false, right_te.range, path, &mut engine.diagnostics);
        let constant = match (left_ok, right_ok) {
            (Ok((_, l)), Ok((_, r))) => match (l.as_constant(), r.as_constant()) {
                (Some(ConstantValue::Boolean(a)), Some(ConstantValue::Boolean(b))) => Some(ConstantValue::Boolean(match operator {
                    BinaryOperator::BooleanAnd => *a && *b,
                    BinaryOperator::BooleanOr => *a || *b,
                    _ => unreachable!(),
                })),
                _ => None,
            },
            _ => None,
        };
        let (te, rv) = build(Type::Boolean, constant, left_te, right_te);
        return ExprOutcome::Typed(te, rv);
    }

    if operator.is_comparison() {
        let is_pointer_or_enum = matches!(left_te.ty, Type::Pointer(_) | Type::Enum { .. }) || matches!(right_te.ty, Type::Pointer(_) | Type::Enum { .. });
        if is_pointer_or_enum && !operator.is_equality() {
            report(
                &mut engine.diagnostics,
                DiagnosticKind::TagMisuse,
                path,
                range,
                format!("'{}' does not support ordering comparisons", left_te.ty.describe()),
            );
            let (te, rv) = build(Type::Boolean, None, left_te, right_te);
            return ExprOutcome::Typed(te, rv);
        }
        let signed = matches!(left_te.ty, Type::Integer { signed: true, .. });
        let constant = match (left_rv.as_constant(), right_rv.as_constant()) {
            (Some(a), Some(b)) => fold_comparison(operator, a, b, signed).map(ConstantValue::Boolean),
            _ => None,
        };
        let (te, rv) = build(Type::Boolean, constant, left_te, right_te);
        return ExprOutcome::Typed(te, rv);
    }

    let Some(result_ty) = determine_binary_type(&left_te.ty, &right_te.ty) else {
        report(
            &mut engine.diagnostics,
            DiagnosticKind::Type,
            path,
            range,
            format!("Cannot determine a common type for '{}' and '{}'", left_te.ty.describe(), right_te.ty.describe()),
        );
        let (te, rv) = build(Type::Void, None, left_te, right_te);
        return ExprOutcome::Typed(te, rv);
    };

    if operator.is_bitwise_or_shift() && result_ty.is_float() {
        report(&mut engine.diagnostics, DiagnosticKind::TagMisuse, path, range, "Bitwise/shift operators do not support float operands");
        let (te, rv) = build(result_ty, None, left_te, right_te);
        return ExprOutcome::Typed(te, rv);
    }

    let left_coerced = coerce(&left_te.ty, &left_rv, &result_ty, false, left_te.range, path, &mut engine.diagnostics);
    let right_coerced = coerce(&right_te.ty, &right_rv, &result_ty, false, right_te.range, path, &mut engine.diagnostics);
    let constant = match (left_coerced, right_coerced) {
        (Ok((_, l)), Ok((_, r))) => match (l.as_constant(), r.as_constant()) {
            (Some(a), Some(b)) => fold_arithmetic(operator, &result_ty, a, b),
            _ => None,
        },
        _ => None,
    };
    let (te, rv) = build(result_ty, constant, left_te, right_te);
    ExprOutcome::Typed(te, rv)
}

fn type_unary(
    engine: &mut Engine,
    ctx: &mut TypingContext,
    scope: ScopeId,
    path: &str,
    range: FileRange,
    operator: UnaryOperator,
    operand: &Expression,
) -> ExprOutcome {
    let (operand_te, operand_rv) = try_typed!(type_expression(engine, ctx, scope, path, operand));
    let build = |ty: Type, constant: Option<ConstantValue>, rv_override: Option<RuntimeValue>, operand_te: TypedExpression| {
        let rv = rv_override.unwrap_or_else(|| match &constant {
            Some(cv) => RuntimeValue::Constant(cv.clone()),
            None => RuntimeValue::Register,
        });
        let te = TypedExpression::new(range, ty, constant, TypedExpressionKind::UnaryOperation { operator, operand: Box::new(operand_te) });
        (te, rv)
    };

    match operator {
        UnaryOperator::AddressOf => {
            if let Some(ConstantValue::Type(inner)) = operand_rv.as_constant().cloned() {
                let ty = Type::pointer((*inner).clone());
                let (te, rv) = build(Type::Type, Some(ConstantValue::Type(Box::new(ty))), None, operand_te);
                return ExprOutcome::Typed(te, rv);
            }
            if let Some(ConstantValue::Function(fc)) = operand_rv.as_constant().cloned() {
                let body_job = engine.find_function_body_job(fc.body_scope).unwrap_or_else(|| {
                    engine.add_job(
                        JobKind::TypeFunctionBody,
                        JobInput::FunctionBody(FunctionBodyInput { scope, statement_index: 0, body_scope: fc.body_scope }),
                        range,
                    )
                });
                if !engine.job(body_job).is_done() {
                    return ExprOutcome::Wait(body_job);
                }
                let ty = operand_te.ty.clone();
                let (te, rv) = build(ty, Some(ConstantValue::Function(fc.clone())), Some(RuntimeValue::Constant(ConstantValue::Function(fc))), operand_te);
                return ExprOutcome::Typed(te, rv);
            }
            if !operand_rv.is_addressed() {
                report(&mut engine.diagnostics, DiagnosticKind::TagMisuse, path, range, "Operand is not addressable");
                let (te, rv) = build(Type::Void, None, None, operand_te);
                return ExprOutcome::Typed(te, rv);
            }
            let ty = Type::pointer(operand_te.ty.clone());
            let (te, rv) = build(ty, None, Some(RuntimeValue::Register), operand_te);
            ExprOutcome::Typed(te, rv)
        }
        UnaryOperator::Dereference => {
            let Type::Pointer(inner) = &operand_te.ty else {
                report(&mut engine.diagnostics, DiagnosticKind::Type, path, range, format!("Cannot dereference '{}'", operand_te.ty.describe()));
                let (te, rv) = build(Type::Void, None, None, operand_te);
                return ExprOutcome::Typed(te, rv);
            };
            let ty = (**inner).clone();
            let (te, rv) = build(ty, None, Some(RuntimeValue::Addressed), operand_te);
            ExprOutcome::Typed(te, rv)
        }
        UnaryOperator::BooleanNot => {
            match coerce(&operand_te.ty, &operand_rv, &Type::Boolean, false, operand_te.range, path, &mut engine.diagnostics) {
                Ok((_, rv)) => {
                    let constant = match rv.as_constant() {
                        Some(ConstantValue::Boolean(b)) => Some(ConstantValue::Boolean(!b)),
                        _ => None,
                    };
                    let (te, rv) = build(Type::Boolean, constant, None, operand_te);
                    ExprOutcome::Typed(te, rv)
                }
                Err(_) => {
                    let (te, rv) = build(Type::Boolean, None, None, operand_te);
                    ExprOutcome::Typed(te, rv)
                }
            }
        }
        UnaryOperator::Negate => {
            if !operand_te.ty.is_integer() && !operand_te.ty.is_float() {
                report(&mut engine.diagnostics, DiagnosticKind::Type, path, range, format!("Cannot negate '{}'", operand_te.ty.describe()));
                let (te, rv) = build(Type::Void, None, None, operand_te);
                return ExprOutcome::Typed(te, rv);
            }
            let ty = operand_te.ty.clone();
            let constant = match operand_rv.as_constant() {
                Some(ConstantValue::Integer(v)) => Some(ConstantValue::Integer((-(*v as i64)) as u64)),
                Some(ConstantValue::Float(v)) => Some(ConstantValue::Float(-v)),
                _ => None,
            };
            let (te, rv) = build(ty, constant, None, operand_te);
            ExprOutcome::Typed(te, rv)
        }
    }
}

fn type_index(
    engine: &mut Engine,
    ctx: &mut TypingContext,
    scope: ScopeId,
    path: &str,
    range: FileRange,
    base: &Expression,
    index: &Expression,
) -> ExprOutcome {
    let (base_te, base_rv) = try_typed!(type_expression(engine, ctx, scope, path, base));
    let (index_te, index_rv) = try_typed!(type_expression(engine, ctx, scope, path, index));

    if !index_te.ty.is_integer() {
        report(&mut engine.diagnostics, DiagnosticKind::Type, path, index_te.range, "Array index must be an integer");
    }

    let build = |ty: Type, constant: Option<ConstantValue>, rv_override: RuntimeValue, base_te: TypedExpression, index_te: TypedExpression| {
        let rv = if let Some(cv) = &constant { RuntimeValue::Constant(cv.clone()) } else { rv_override };
        let te = TypedExpression::new(range, ty, constant, TypedExpressionKind::Index { expression: Box::new(base_te), index: Box::new(index_te) });
        (te, rv)
    };

    match &base_te.ty.clone() {
        Type::StaticArray { length, element } => {
            let element_ty = (**element).clone();
            if let (Some(ConstantValue::StaticArray(elems)), Some(ConstantValue::Integer(i))) = (base_rv.as_constant(), index_rv.as_constant()) {
                if *i >= *length {
                    report(&mut engine.diagnostics, DiagnosticKind::ConstantEvaluation, path, range, format!("Index {i} out of range for array of length {length}"));
                    let (te, rv) = build(element_ty, None, RuntimeValue::Register, base_te, index_te);
                    return ExprOutcome::Typed(te, rv);
                }
                let value = elems[*i as usize].clone();
                let (te, rv) = build(element_ty, Some(value), RuntimeValue::Register, base_te, index_te);
                return ExprOutcome::Typed(te, rv);
            }
            let fallback = if base_rv.is_addressed() { RuntimeValue::Addressed } else { RuntimeValue::Register };
            let (te, rv) = build(element_ty, None, fallback, base_te, index_te);
            ExprOutcome::Typed(te, rv)
        }
        Type::Array { element } => {
            let element_ty = (**element).clone();
            let (te, rv) = build(element_ty, None, RuntimeValue::Addressed, base_te, index_te);
            ExprOutcome::Typed(te, rv)
        }
        Type::Pointer(element) => {
            let element_ty = (**element).clone();
            let (te, rv) = build(element_ty, None, RuntimeValue::Addressed, base_te, index_te);
            ExprOutcome::Typed(te, rv)
        }
        other => {
            report(&mut engine.diagnostics, DiagnosticKind::Type, path, range, format!("Type '{}' cannot be indexed", other.describe()));
            let (te, rv) = build(Type::Void, None, RuntimeValue::Register, base_te, index_te);
            ExprOutcome::Typed(te, rv)
        }
    }
}

fn type_member(
    engine: &mut Engine,
    ctx: &mut TypingContext,
    scope: ScopeId,
    path: &str,
    range: FileRange,
    base: &Expression,
    member: &str,
) -> ExprOutcome {
    let (base_te, base_rv) = try_typed!(type_expression(engine, ctx, scope, path, base));
    let build = |ty: Type, constant: Option<ConstantValue>, rv_override: RuntimeValue, base_te: TypedExpression| {
        let rv = if let Some(cv) = &constant { RuntimeValue::Constant(cv.clone()) } else { rv_override };
        let te = TypedExpression::new(range, ty, constant, TypedExpressionKind::Member { expression: Box::new(base_te), member: member.to_string() });
        (te, rv)
    };

    match &base_te.ty.clone() {
        Type::Array { element } => {
            if member == "length" {
                let ty = Type::Integer { size: address_integer_size(engine), signed: false };
                let constant = match base_rv.as_constant() {
                    Some(ConstantValue::Array { length, .. }) => Some(ConstantValue::Integer(*length)),
                    _ => None,
                };
                let (te, rv) = build(ty, constant, RuntimeValue::Register, base_te);
                return ExprOutcome::Typed(te, rv);
            }
            if member == "pointer" {
                let ty = Type::pointer((**element).clone());
                let (te, rv) = build(ty, None, RuntimeValue::Register, base_te);
                return ExprOutcome::Typed(te, rv);
            }
            member_not_found(engine, path, range, member, &base_te.ty, base_te)
        }
        Type::StaticArray { length, element } => {
            if member == "length" {
                let ty = Type::Integer { size: address_integer_size(engine), signed: false };
                let (te, rv) = build(ty, Some(ConstantValue::Integer(*length)), RuntimeValue::Register, base_te);
                return ExprOutcome::Typed(te, rv);
            }
            if member == "pointer" {
                let ty = Type::pointer((**element).clone());
                let classification = if base_rv.is_addressed() { RuntimeValue::Addressed } else { RuntimeValue::Register };
                let (te, rv) = build(ty, None, classification, base_te);
                return ExprOutcome::Typed(te, rv);
            }
            member_not_found(engine, path, range, member, &base_te.ty, base_te)
        }
        Type::Struct { members, .. } | Type::Union { members, .. } => {
            match members.iter().position(|(n, _)| n == member) {
                Some(idx) => {
                    let ty = members[idx].1.clone();
                    let constant = match base_rv.as_constant() {
                        Some(ConstantValue::Struct(values)) => values.get(idx).cloned(),
                        _ => None,
                    };
                    let classification = if base_rv.is_addressed() { RuntimeValue::Addressed } else { RuntimeValue::Register };
                    let (te, rv) = build(ty, constant, classification, base_te);
                    ExprOutcome::Typed(te, rv)
                }
                None => member_not_found(engine, path, range, member, &base_te.ty, base_te),
            }
        }
        Type::UndeterminedStruct(members) => match members.iter().position(|(n, _)| n == member) {
            Some(idx) => {
                let ty = members[idx].1.clone();
                let (te, rv) = build(ty, None, RuntimeValue::Register, base_te);
                ExprOutcome::Typed(te, rv)
            }
            None => member_not_found(engine, path, range, member, &base_te.ty, base_te),
        },
        Type::FileModule(target) => {
            let target = *target;
            match simplec_engine::search_for_name(engine, target, member, true, &mut resolve_using_module_cb) {
                NameLookupResult::Found(job_id) => {
                    if !engine.job(job_id).is_done() {
                        return ExprOutcome::Wait(job_id);
                    }
                    let output = engine.job_output(job_id).expect("done job carries output");
                    let ty = output.declared_type().cloned().unwrap_or(Type::Void);
                    let constant = output.constant_value();
                    let classification = if let Some(cv) = &constant { RuntimeValue::Constant(cv.clone()) } else { RuntimeValue::Addressed };
                    let (te, rv) = build(ty, constant, classification, base_te);
                    ExprOutcome::Typed(te, rv)
                }
                NameLookupResult::Wait(job_id) => ExprOutcome::Wait(job_id),
                _ => member_not_found(engine, path, range, member, &base_te.ty, base_te),
            }
        }
        _ => {
            if let Some(ConstantValue::Type(t)) = base_rv.as_constant() {
                if let Type::Enum { variants, .. } = t.as_ref() {
                    if let Some((_, value)) = variants.iter().find(|(n, _)| n == member) {
                        let enum_ty = (**t).clone();
                        let (te, rv) = build(enum_ty, Some(ConstantValue::Integer(*value as u64)), RuntimeValue::Register, base_te);
                        return ExprOutcome::Typed(te, rv);
                    }
                    return member_not_found(engine, path, range, member, t, base_te);
                }
            }
            report(&mut engine.diagnostics, DiagnosticKind::Type, path, range, format!("Type '{}' has no members", base_te.ty.describe()));
            let (te, rv) = build(Type::Void, None, RuntimeValue::Register, base_te);
            ExprOutcome::Typed(te, rv)
        }
    }
}

fn member_not_found(engine: &mut Engine, path: &str, range: FileRange, member: &str, ty: &Type, base_te: TypedExpression) -> ExprOutcome {
    report(&mut engine.diagnostics, DiagnosticKind::NameResolution, path, range, format!("'{}' has no member '{member}'", ty.describe()));
    let te = TypedExpression::new(range, Type::Void, None, TypedExpressionKind::Member { expression: Box::new(base_te), member: member.to_string() });
    ExprOutcome::Typed(te, RuntimeValue::Register)
}

fn address_integer_size(engine: &Engine) -> IntegerSize {
    match engine.options.address_size {
        simplec_common::AddressSize::Bits32 => IntegerSize::Bits32,
        simplec_common::AddressSize::Bits64 => IntegerSize::Bits64,
    }
}

#[allow(clippy::too_many_arguments)]
fn type_call(
    engine: &mut Engine,
    ctx: &mut TypingContext,
    scope: ScopeId,
    path: &str,
    range: FileRange,
    callee: &Expression,
    parameters: &[Expression],
    is_bake: bool,
) -> ExprOutcome {
    let (callee_te, callee_rv) = try_typed!(type_expression(engine, ctx, scope, path, callee));
    let mut typed_params = Vec::with_capacity(parameters.len());
    let mut param_results = Vec::with_capacity(parameters.len());
    for p in parameters {
        let (te, rv) = try_typed!(type_expression(engine, ctx, scope, path, p));
        param_results.push((te.ty.clone(), rv));
        typed_params.push(te);
    }

    let build = |ty: Type, constant: Option<ConstantValue>, rv_override: RuntimeValue, callee_te: TypedExpression, typed_params: Vec<TypedExpression>| {
        let rv = if let Some(cv) = &constant { RuntimeValue::Constant(cv.clone()) } else { rv_override };
        let te = TypedExpression::new(range, ty, constant, TypedExpressionKind::Call { expression: Box::new(callee_te), parameters: typed_params });
        (te, rv)
    };

    match callee_te.ty.clone() {
        Type::Function { parameters: param_types, return_types, .. } if !is_bake => {
            if param_types.len() != param_results.len() {
                report(&mut engine.diagnostics, DiagnosticKind::Arity, path, range, format!("Expected {} argument(s), found {}", param_types.len(), param_results.len()));
            }
            for (i, (ty, rv)) in param_results.iter().enumerate() {
                if let Some(target) = param_types.get(i) {
                    let _ = coerce(ty, rv, target, false, range, path, &mut engine.diagnostics);
                }
            }
            if let Some(ConstantValue::Function(fc)) = callee_rv.as_constant() {
                let body_job = engine.find_function_body_job(fc.body_scope).unwrap_or_else(|| {
                    engine.add_job(
                        JobKind::TypeFunctionBody,
                        JobInput::FunctionBody(FunctionBodyInput { scope, statement_index: 0, body_scope: fc.body_scope }),
                        range,
                    )
                });
                if !engine.job(body_job).is_done() {
                    return ExprOutcome::Wait(body_job);
                }
            }
            let result_ty = match return_types.len() {
                1 => return_types[0].clone(),
                _ => Type::MultiReturn(Rc::clone(&return_types)),
            };
            let (te, rv) = build(result_ty, None, RuntimeValue::Register, callee_te, typed_params);
            ExprOutcome::Typed(te, rv)
        }
        Type::Pointer(inner) if matches!(inner.as_ref(), Type::Function { .. }) && !is_bake => {
            let Type::Function { parameters: param_types, return_types, .. } = inner.as_ref() else { unreachable!() };
            if param_types.len() != param_results.len() {
                report(&mut engine.diagnostics, DiagnosticKind::Arity, path, range, format!("Expected {} argument(s), found {}", param_types.len(), param_results.len()));
            }
            for (i, (ty, rv)) in param_results.iter().enumerate() {
                if let Some(target) = param_types.get(i) {
                    let _ = coerce(ty, rv, target, false, range, path, &mut engine.diagnostics);
                }
            }
            let result_ty = match return_types.len() {
                1 => return_types[0].clone(),
                _ => Type::MultiReturn(Rc::clone(return_types)),
            };
            let (te, rv) = build(result_ty, None, RuntimeValue::Register, callee_te, typed_params);
            ExprOutcome::Typed(te, rv)
        }
        Type::BuiltinFunction(kind) if !is_bake => type_builtin_call(engine, path, range, kind, typed_params, param_results, callee_te),
        Type::PolymorphicFunction { def_id, parent_scope } => {
            type_polymorphic_function_call(engine, path, range, def_id, parent_scope, typed_params, param_results, callee_te, is_bake)
        }
        Type::PolymorphicStruct { def_id, .. } | Type::PolymorphicUnion { def_id, .. } if !is_bake => {
            type_polymorphic_aggregate_call(engine, path, range, def_id, typed_params, param_results, callee_te)
        }
        other => {
            report(&mut engine.diagnostics, DiagnosticKind::Type, path, range, format!("'{}' is not callable", other.describe()));
            let (te, rv) = build(Type::Void, None, RuntimeValue::Register, callee_te, typed_params);
            ExprOutcome::Typed(te, rv)
        }
    }
}

fn type_builtin_call(
    engine: &mut Engine,
    path: &str,
    range: FileRange,
    kind: BuiltinFunctionKind,
    typed_params: Vec<TypedExpression>,
    param_results: Vec<(Type, RuntimeValue)>,
    callee_te: TypedExpression,
) -> ExprOutcome {
    let build = |ty: Type, constant: Option<ConstantValue>| {
        let rv = match &constant {
            Some(cv) => RuntimeValue::Constant(cv.clone()),
            None => RuntimeValue::Register,
        };
        let te = TypedExpression::new(range, ty, constant, TypedExpressionKind::Call { expression: Box::new(callee_te), parameters: typed_params });
        (te, rv)
    };
    match kind {
        BuiltinFunctionKind::SizeOf => {
            let arg_ty = param_results.first().and_then(|(_, rv)| rv.as_constant()).and_then(|cv| match cv {
                ConstantValue::Type(t) => Some((**t).clone()),
                _ => None,
            });
            match arg_ty.and_then(|t| simplec_types::size_of(&t, engine.options.address_size)) {
                Some(size) => {
                    let (te, rv) = build(Type::Integer { size: address_integer_size(engine), signed: false }, Some(ConstantValue::Integer(size)));
                    ExprOutcome::Typed(te, rv)
                }
                None => {
                    report(&mut engine.diagnostics, DiagnosticKind::ConstantEvaluation, path, range, "size_of requires a runtime type");
                    let (te, rv) = build(Type::Void, None);
                    ExprOutcome::Typed(te, rv)
                }
            }
        }
        BuiltinFunctionKind::TypeOf => {
            let ty = param_results.first().map(|(t, _)| t.clone()).unwrap_or(Type::Void);
            let (te, rv) = build(Type::Type, Some(ConstantValue::Type(Box::new(ty))));
            ExprOutcome::Typed(te, rv)
        }
        BuiltinFunctionKind::Globalify | BuiltinFunctionKind::Stackify => {
            let ty = param_results.first().map(|(t, _)| t.clone()).unwrap_or(Type::Void);
            let (te, rv) = build(ty, None);
            ExprOutcome::Typed(te, rv)
        }
        BuiltinFunctionKind::Sqrt => {
            let (ty, rv) = param_results.first().cloned().unwrap_or((Type::Void, RuntimeValue::Register));
            let result_ty = if ty.is_float() { ty } else { Type::default_float() };
            let constant = match rv.as_constant() {
                Some(ConstantValue::Float(v)) => Some(ConstantValue::Float(v.sqrt())),
                Some(ConstantValue::Integer(v)) => Some(ConstantValue::Float((*v as f64).sqrt())),
                _ => None,
            };
            let (te, rv) = build(result_ty, constant);
            ExprOutcome::Typed(te, rv)
        }
    }
}

fn type_polymorphic_function_call(
    engine: &mut Engine,
    path: &str,
    range: FileRange,
    def_id: simplec_common::DefId,
    parent_scope: ScopeId,
    typed_params: Vec<TypedExpression>,
    param_results: Vec<(Type, RuntimeValue)>,
    callee_te: TypedExpression,
    is_bake: bool,
) -> ExprOutcome {
    let decl_job = JobId::from_index(def_id.index());
    let Some(decl) = engine.job(decl_job).input.as_declaration() else {
        report(&mut engine.diagnostics, DiagnosticKind::PolymorphicInstantiation, path, range, "Malformed polymorphic function reference");
        let te = TypedExpression::new(range, Type::Void, None, TypedExpressionKind::Call { expression: Box::new(callee_te), parameters: typed_params });
        return ExprOutcome::Typed(te, RuntimeValue::Register);
    };
    let formals: Vec<simplec_ast::FunctionParameter> = match &engine.scope(decl.scope).statements[decl.statement_index].kind {
        simplec_ast::StatementKind::FunctionDeclaration { parameters, .. } => parameters.clone(),
        _ => {
            report(&mut engine.diagnostics, DiagnosticKind::PolymorphicInstantiation, path, range, "Malformed polymorphic function reference");
            let te = TypedExpression::new(range, Type::Void, None, TypedExpressionKind::Call { expression: Box::new(callee_te), parameters: typed_params });
            return ExprOutcome::Typed(te, RuntimeValue::Register);
        }
    };
    let mut poly_params = Vec::new();
    for (formal, (ty, rv)) in formals.iter().zip(param_results.iter()) {
        match formal.kind {
            simplec_ast::ParameterKind::Normal => {}
            // An undetermined numeric literal passed to a `$T` slot pins to
            // its default concrete type (§9): the instantiation key, and `T`
            // inside the body, must be a concrete type like every other use
            // of an undetermined constant.
            simplec_ast::ParameterKind::PolymorphicDeterminer => {
                poly_params.push(simplec_engine::PolyParam { ty: crate::stmt::default_typed(ty), value: None })
            }
            simplec_ast::ParameterKind::Constant => match rv.as_constant() {
                Some(cv) => poly_params.push(simplec_engine::PolyParam { ty: ty.clone(), value: Some(cv.clone()) }),
                None => {
                    report(&mut engine.diagnostics, DiagnosticKind::PolymorphicInstantiation, path, range, "Constant parameter requires a compile-time value");
                }
            },
        }
    }

    let job_id = engine
        .find_polymorphic_job(JobKind::TypePolymorphicFunction, decl.scope, decl.statement_index, &poly_params)
        .unwrap_or_else(|| {
            engine.add_job(
                JobKind::TypePolymorphicFunction,
                JobInput::PolymorphicInstantiation(simplec_engine::PolymorphicInstantiationInput {
                    scope: decl.scope,
                    statement_index: decl.statement_index,
                    parent_scope,
                    parameters: poly_params,
                }),
                range,
            )
        });
    if !engine.job(job_id).is_done() {
        return ExprOutcome::Wait(job_id);
    }
    let output = engine.job_output(job_id).expect("done job carries output");
    let ty = output.declared_type().cloned().unwrap_or(Type::Void);
    let value = output.constant_value();

    if is_bake {
        let constant = value.clone();
        let rv = match &constant {
            Some(cv) => RuntimeValue::Constant(cv.clone()),
            None => RuntimeValue::Register,
        };
        let te = TypedExpression::new(range, ty, constant, TypedExpressionKind::Call { expression: Box::new(callee_te), parameters: typed_params });
        return ExprOutcome::Typed(te, rv);
    }

    let Type::Function { parameters: concrete_params, return_types, .. } = &ty else {
        let te = TypedExpression::new(range, Type::Void, None, TypedExpressionKind::Call { expression: Box::new(callee_te), parameters: typed_params });
        return ExprOutcome::Typed(te, RuntimeValue::Register);
    };
    for (i, (arg_ty, arg_rv)) in param_results.iter().enumerate() {
        if let Some(target) = concrete_params.get(i) {
            let _ = coerce(arg_ty, arg_rv, target, false, range, path, &mut engine.diagnostics);
        }
    }
    if let Some(ConstantValue::Function(fc)) = &value {
        let body_job = engine.find_function_body_job(fc.body_scope).unwrap_or_else(|| {
            engine.add_job(
                JobKind::TypeFunctionBody,
                JobInput::FunctionBody(FunctionBodyInput { scope: fc.body_scope, statement_index: 0, body_scope: fc.body_scope }),
                range,
            )
        });
        if !engine.job(body_job).is_done() {
            return ExprOutcome::Wait(body_job);
        }
    }
    let result_ty = match return_types.len() {
        1 => return_types[0].clone(),
        _ => Type::MultiReturn(Rc::clone(return_types)),
    };
    let te = TypedExpression::new(range, result_ty, None, TypedExpressionKind::Call { expression: Box::new(callee_te), parameters: typed_params });
    ExprOutcome::Typed(te, RuntimeValue::Register)
}

fn type_polymorphic_aggregate_call(
    engine: &mut Engine,
    path: &str,
    range: FileRange,
    def_id: simplec_common::DefId,
    typed_params: Vec<TypedExpression>,
    param_results: Vec<(Type, RuntimeValue)>,
    callee_te: TypedExpression,
) -> ExprOutcome {
    let decl_job = JobId::from_index(def_id.index());
    let Some(decl) = engine.job(decl_job).input.as_declaration() else {
        report(&mut engine.diagnostics, DiagnosticKind::PolymorphicInstantiation, path, range, "Malformed polymorphic struct/union reference");
        let te = TypedExpression::new(range, Type::Void, None, TypedExpressionKind::Call { expression: Box::new(callee_te), parameters: typed_params });
        return ExprOutcome::Typed(te, RuntimeValue::Register);
    };
    let kind = engine.job(decl_job).kind;
    let formals: Vec<simplec_ast::PolymorphicParameter> = match &engine.scope(decl.scope).statements[decl.statement_index].kind {
        simplec_ast::StatementKind::StructDefinition { parameters, .. } | simplec_ast::StatementKind::UnionDefinition { parameters, .. } => parameters.clone(),
        _ => vec![],
    };
    let mut poly_params = Vec::new();
    for (formal, (arg_ty, arg_rv)) in formals.iter().zip(param_results.iter()) {
        match formal.kind {
            simplec_ast::PolymorphicParameterKind::TypeParameter => match arg_rv.as_constant() {
                Some(ConstantValue::Type(t)) => poly_params.push(simplec_engine::PolyParam { ty: (**t).clone(), value: None }),
                _ => report(&mut engine.diagnostics, DiagnosticKind::PolymorphicInstantiation, path, range, format!("Parameter '{}' requires a type value", formal.name)),
            },
            simplec_ast::PolymorphicParameterKind::ConstantParameter => match arg_rv.as_constant() {
                Some(cv) => poly_params.push(simplec_engine::PolyParam { ty: arg_ty.clone(), value: Some(cv.clone()) }),
                None => report(&mut engine.diagnostics, DiagnosticKind::PolymorphicInstantiation, path, range, format!("Parameter '{}' requires a compile-time value", formal.name)),
            },
        }
    }

    let job_id = engine.find_polymorphic_job(kind, decl.scope, decl.statement_index, &poly_params).unwrap_or_else(|| {
        engine.add_job(
            kind,
            JobInput::PolymorphicInstantiation(simplec_engine::PolymorphicInstantiationInput {
                scope: decl.scope,
                statement_index: decl.statement_index,
                parent_scope: decl.scope,
                parameters: poly_params,
            }),
            range,
        )
    });
    if !engine.job(job_id).is_done() {
        return ExprOutcome::Wait(job_id);
    }
    let output = engine.job_output(job_id).expect("done job carries output");
    let constant = output.constant_value();
    let rv = match &constant {
        Some(cv) => RuntimeValue::Constant(cv.clone()),
        None => RuntimeValue::Register,
    };
    let te = TypedExpression::new(range, Type::Type, constant, TypedExpressionKind::Call { expression: Box::new(callee_te), parameters: typed_params });
    ExprOutcome::Typed(te, rv)
}

fn type_cast(
    engine: &mut Engine,
    ctx: &mut TypingContext,
    scope: ScopeId,
    path: &str,
    range: FileRange,
    expression: &Expression,
    type_expression_ast: &Expression,
) -> ExprOutcome {
    let (value_te, value_rv) = try_typed!(type_expression(engine, ctx, scope, path, expression));
    let (target_te, target_rv) = try_typed!(type_expression(engine, ctx, scope, path, type_expression_ast));
    let Some(target_ty) = expect_type_constant(&target_te, &target_rv, engine, path, range) else {
        let te = TypedExpression::new(range, Type::Void, None, TypedExpressionKind::Cast { expression: Box::new(value_te) });
        return ExprOutcome::Typed(te, RuntimeValue::Register);
    };

    if let Ok((ty, rv)) = coerce(&value_te.ty, &value_rv, &target_ty, true, range, path, &mut engine.diagnostics) {
        let constant = rv.as_constant().cloned();
        let te = TypedExpression::new(range, ty, constant, TypedExpressionKind::Cast { expression: Box::new(value_te) });
        return ExprOutcome::Typed(te, rv);
    }

    let constant = fold_cast(&value_rv, &target_ty, &value_te.ty);
    if cast_is_allowed(&value_te.ty, &target_ty, address_integer_size(engine)) {
        let rv = match &constant {
            Some(cv) => RuntimeValue::Constant(cv.clone()),
            None => RuntimeValue::Register,
        };
        let te = TypedExpression::new(range, target_ty, constant, TypedExpressionKind::Cast { expression: Box::new(value_te) });
        return ExprOutcome::Typed(te, rv);
    }

    report(
        &mut engine.diagnostics,
        DiagnosticKind::TagMisuse,
        path,
        range,
        format!("Cannot cast '{}' to '{}'", value_te.ty.describe(), target_ty.describe()),
    );
    let te = TypedExpression::new(range, Type::Void, None, TypedExpressionKind::Cast { expression: Box::new(value_te) });
    ExprOutcome::Typed(te, RuntimeValue::Register)
}

/// Is `from as to` allowed, beyond what `coerce` already accepts (§4.5
/// "Cast")? `address_size` is the target's pointer-sized integer — a
/// pointer cast only ever goes through the *unsigned* integer of that
/// size, and an integer/enum cast only ever goes through the enum's own
/// declared backing type, never any integer of matching width.
fn cast_is_allowed(from: &Type, to: &Type, address_size: IntegerSize) -> bool {
    let is_address_integer = |t: &Type| matches!(t, Type::Integer { size, signed: false } if *size == address_size);
    match (from, to) {
        (a, b) if (a.is_integer() || a.is_float()) && (b.is_integer() || b.is_float()) => true,
        (Type::Pointer(_), Type::Pointer(_)) => true,
        (Type::Pointer(_), b) if is_address_integer(b) => true,
        (a, Type::Pointer(_)) if is_address_integer(a) => true,
        (Type::Integer { size, signed }, Type::Enum { backing, .. }) => *size == backing.size && *signed == backing.signed,
        (Type::Enum { backing, .. }, Type::Integer { size, signed }) => *size == backing.size && *signed == backing.signed,
        _ => false,
    }
}

fn fold_cast(rv: &RuntimeValue, to: &Type, from: &Type) -> Option<ConstantValue> {
    match (rv.as_constant()?, to) {
        (ConstantValue::Integer(v), Type::Integer { size, .. }) => {
            let masked = if size.bits() >= 64 { *v } else { v & ((1u64 << size.bits()) - 1) };
            Some(ConstantValue::Integer(masked))
        }
        (ConstantValue::Integer(v), Type::Float { size }) => {
            let f = *v as f64;
            Some(ConstantValue::Float(if *size == FloatSize::Bits32 { f as f32 as f64 } else { f }))
        }
        (ConstantValue::Float(v), Type::Integer { .. }) => Some(ConstantValue::Integer(*v as u64)),
        (ConstantValue::Float(v), Type::Float { size }) => {
            Some(ConstantValue::Float(if *size == FloatSize::Bits32 { *v as f32 as f64 } else { *v }))
        }
        // Matches `cast_is_allowed`'s enum arm: only an integer of the
        // enum's own backing type folds, not any integer of matching width.
        (ConstantValue::Integer(v), Type::Enum { backing, .. })
            if matches!(from, Type::Integer { size, signed } if *size == backing.size && *signed == backing.signed) =>
        {
            Some(ConstantValue::Integer(*v))
        }
        _ => None,
    }
}
