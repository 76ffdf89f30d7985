//! End-to-end scenarios driving the scheduler over small, hand-built ASTs —
//! there is no parser in this workspace, so every fixture here stands in for
//! a `.simple` source file's already-parsed statement list.
//!
//! A `TypeFunctionDeclaration` job only computes a function's signature; its
//! body is typed lazily, the first time some call site needs it. None of
//! these fixtures calls `main` from anywhere, so every test forces `main`'s
//! body to be typed via `force_declared_function_bodies` before inspecting
//! diagnostics or the typed tree. `simplec-cli`'s driver does the same thing
//! for the same reason; it's duplicated here rather than shared because this
//! crate cannot depend on that binary-only crate.

use simplec_ast::{
    Expression, ExpressionKind, FunctionParameter, ParameterKind, PolymorphicParameter,
    PolymorphicParameterKind, Statement, StatementKind, StructMember,
};
use simplec_check::Checker;
use simplec_common::{DiagnosticKind, EngineOptions, FileRange, ScopeId};
use simplec_engine::{run_to_completion, Engine, FunctionBodyInput, JobInput, JobKind, JobOutput};
use simplec_types::{ConstantValue, Type, TypedExpressionKind, TypedStatementKind};
use std::rc::Rc;

fn range() -> FileRange {
    FileRange::new(1, 1, 1, 1)
}

fn var(name: &str) -> Expression {
    Expression::new(range(), ExpressionKind::Variable(name.to_string()))
}

fn int(v: u64) -> Expression {
    Expression::new(range(), ExpressionKind::IntegerLiteral(v))
}

fn stmt(kind: StatementKind) -> Statement {
    Statement::new(range(), kind)
}

fn check(path: &str, statements: Vec<Statement>) -> Engine {
    let mut engine = Engine::new(EngineOptions::default());
    let mut checker = Checker::new();
    let path: Rc<str> = Rc::from(path);
    checker.add_source(Rc::clone(&path), statements);
    engine.add_job(JobKind::ParseFile, JobInput::ParseFile { path: Rc::clone(&path) }, FileRange::synthetic());
    run_to_completion(&mut engine, &mut checker);
    force_declared_function_bodies(&mut engine, &mut checker);
    engine
}

fn force_declared_function_bodies(engine: &mut Engine, checker: &mut Checker) {
    loop {
        let pending: Vec<_> = engine
            .jobs
            .iter()
            .filter_map(|job| match &job.output {
                Some(JobOutput::FunctionDeclaration(decl)) => decl.body_scope,
                _ => None,
            })
            .filter(|&body_scope| engine.find_function_body_job(body_scope).is_none())
            .collect();
        if pending.is_empty() {
            break;
        }
        for body_scope in pending {
            engine.add_job(
                JobKind::TypeFunctionBody,
                JobInput::FunctionBody(FunctionBodyInput { scope: body_scope, statement_index: 0, body_scope }),
                FileRange::synthetic(),
            );
        }
        run_to_completion(engine, checker);
    }
}

fn top_level_scope(engine: &Engine) -> ScopeId {
    engine
        .jobs
        .iter()
        .find_map(|job| match &job.output {
            Some(JobOutput::ParseFile(o)) => Some(o.top_level_scope),
            _ => None,
        })
        .expect("a ParseFile job ran")
}

fn function_body<'a>(engine: &'a Engine, top_level: ScopeId, name: &str) -> &'a [simplec_types::TypedStatement] {
    let entry = engine.scope(top_level).declarations.get(name).unwrap_or_else(|| panic!("'{name}' not declared"));
    let output = engine.job(entry.job_id).output.as_ref().expect("declaration job is done");
    let JobOutput::FunctionDeclaration(decl) = output else { panic!("'{name}' is not a function") };
    let body_scope = decl.body_scope.expect("not external");
    let body_job = engine.find_function_body_job(body_scope).expect("body job was forced");
    match engine.job(body_job).output.as_ref().expect("body job is done") {
        JobOutput::FunctionBody(b) => &b.statements,
        _ => unreachable!(),
    }
}

fn main_declaration(body: Vec<Statement>) -> Statement {
    stmt(StatementKind::FunctionDeclaration {
        name: "main".into(),
        parameters: vec![],
        return_types: vec![],
        calling_convention: None,
        body: Some(body),
        is_external: false,
        external_libraries: vec![],
    })
}

fn variable_declaration(name: &str, type_expression: Option<Expression>, initializer: Option<Expression>) -> Statement {
    stmt(StatementKind::VariableDeclaration { name: name.into(), type_expression, initializer })
}

/// `main := () { x : u8 = 300; }` — the literal overflows `u8`'s range.
#[test]
fn out_of_range_constant_reports_coercion_error_inside_main() {
    let main_body = vec![variable_declaration("x", Some(var("u8")), Some(int(300)))];
    let engine = check("scenario1.sp", vec![main_declaration(main_body)]);

    assert!(engine.diagnostics.has_errors());
    let coercion = engine
        .diagnostics
        .diagnostics
        .iter()
        .find(|d| d.kind == DiagnosticKind::Coercion)
        .expect("a coercion diagnostic");
    assert!(coercion.message.contains("300"));
    assert!(coercion.message.contains("u8"));
}

/// `A : B = 1; B : A = 2;` — each static variable's declared type names the
/// other, so neither `TypeStaticVariable` job can finish without the other.
#[test]
fn mutually_typed_static_variables_report_a_cycle() {
    let top = vec![
        stmt(StatementKind::StaticVariableDeclaration {
            name: "A".into(),
            type_expression: Some(var("B")),
            initializer: Some(int(1)),
            is_external: false,
            external_libraries: vec![],
        }),
        stmt(StatementKind::StaticVariableDeclaration {
            name: "B".into(),
            type_expression: Some(var("A")),
            initializer: Some(int(2)),
            is_external: false,
            external_libraries: vec![],
        }),
    ];
    let engine = check("scenario2.sp", top);

    assert!(engine.diagnostics.has_errors());
    assert!(engine.diagnostics.diagnostics.iter().all(|d| d.kind == DiagnosticKind::CircularDependency));
    assert_eq!(engine.diagnostics.diagnostics.len(), 2);
}

/// `f :: (x: $T) T { return x; }` `main := () { y := f(7); }` — one
/// instantiation, `T` defaulting to `i64` from the untyped literal argument.
#[test]
fn polymorphic_call_instantiates_with_default_integer_type() {
    let f = stmt(StatementKind::FunctionDeclaration {
        name: "f".into(),
        parameters: vec![FunctionParameter {
            name: "x".into(),
            kind: ParameterKind::PolymorphicDeterminer,
            type_expression: None,
            range: range(),
        }],
        return_types: vec![var("T")],
        calling_convention: None,
        body: Some(vec![stmt(StatementKind::Return(vec![var("x")]))]),
        is_external: false,
        external_libraries: vec![],
    });
    let main_body = vec![variable_declaration(
        "y",
        None,
        Some(Expression::new(range(), ExpressionKind::Call { expression: Box::new(var("f")), parameters: vec![int(7)] })),
    )];
    let engine = check("scenario3.sp", vec![f, main_declaration(main_body)]);

    assert!(!engine.diagnostics.has_errors(), "{:?}", engine.diagnostics.diagnostics);
    let instantiations = engine.jobs.iter().filter(|j| j.kind == JobKind::TypePolymorphicFunction && matches!(j.input, JobInput::PolymorphicInstantiation(_))).count();
    assert_eq!(instantiations, 1);

    let top = top_level_scope(&engine);
    let body = function_body(&engine, top, "main");
    let TypedStatementKind::VariableDeclaration { declared_type, .. } = &body[0].kind else { panic!("expected a variable declaration") };
    assert_eq!(*declared_type, Type::Integer { size: simplec_types::IntegerSize::Bits64, signed: true });
}

/// `arr := [1, 2, 3]; n := arr.length;` — `arr` is `[3]i64`, `n` is `usize`.
#[test]
fn array_length_member_is_usize() {
    let main_body = vec![
        variable_declaration("arr", None, Some(Expression::new(range(), ExpressionKind::ArrayLiteral(vec![int(1), int(2), int(3)])))),
        variable_declaration(
            "n",
            None,
            Some(Expression::new(range(), ExpressionKind::Member { expression: Box::new(var("arr")), member: "length".into() })),
        ),
    ];
    let engine = check("scenario4.sp", vec![main_declaration(main_body)]);

    assert!(!engine.diagnostics.has_errors(), "{:?}", engine.diagnostics.diagnostics);
    let top = top_level_scope(&engine);
    let body = function_body(&engine, top, "main");

    let TypedStatementKind::VariableDeclaration { declared_type: arr_ty, .. } = &body[0].kind else { panic!() };
    assert_eq!(*arr_ty, Type::static_array(3, Type::default_integer()));

    let TypedStatementKind::VariableDeclaration { declared_type: n_ty, initializer, .. } = &body[1].kind else { panic!() };
    assert_eq!(*n_ty, Type::Integer { size: simplec_types::IntegerSize::Bits64, signed: false });
    let initializer = initializer.as_ref().expect("n has an initializer");
    assert_eq!(initializer.constant_value, Some(ConstantValue::Integer(3)));
}

/// `E :: enum { A; B; }` `main := () { v := E.A; }` — `v` has type `E`, value `0`.
#[test]
fn enum_variant_reference_has_enum_type_and_integer_value() {
    let e = stmt(StatementKind::EnumDefinition {
        name: "E".into(),
        backing_type: None,
        variants: vec![
            simplec_ast::EnumVariant { name: "A".into(), value: None, range: range() },
            simplec_ast::EnumVariant { name: "B".into(), value: None, range: range() },
        ],
    });
    let main_body = vec![variable_declaration(
        "v",
        None,
        Some(Expression::new(range(), ExpressionKind::Member { expression: Box::new(var("E")), member: "A".into() })),
    )];
    let engine = check("scenario5.sp", vec![e, main_declaration(main_body)]);

    assert!(!engine.diagnostics.has_errors(), "{:?}", engine.diagnostics.diagnostics);
    let top = top_level_scope(&engine);
    let body = function_body(&engine, top, "main");
    let TypedStatementKind::VariableDeclaration { declared_type, initializer, .. } = &body[0].kind else { panic!() };
    assert!(matches!(declared_type, Type::Enum { .. }));
    let initializer = initializer.as_ref().unwrap();
    assert_eq!(initializer.constant_value, Some(ConstantValue::Integer(0)));
}

/// `Pair :: struct($T) { a: T; b: T }`
/// `main := () { p : Pair(u8) = .{a=1,b=2}; q : Pair(u8) = .{a=3,b=4}; }` —
/// both declarations share one `ResolvePolymorphicStruct`-equivalent job.
#[test]
fn repeated_polymorphic_struct_instantiation_is_memoized() {
    let pair = stmt(StatementKind::StructDefinition {
        name: "Pair".into(),
        parameters: vec![PolymorphicParameter {
            name: "T".into(),
            kind: PolymorphicParameterKind::TypeParameter,
            type_expression: None,
            range: range(),
        }],
        members: vec![
            StructMember { name: "a".into(), type_expression: var("T"), range: range() },
            StructMember { name: "b".into(), type_expression: var("T"), range: range() },
        ],
    });
    let pair_of_u8 = || Expression::new(range(), ExpressionKind::Call { expression: Box::new(var("Pair")), parameters: vec![var("u8")] });
    let struct_literal = |a: u64, b: u64| {
        Expression::new(range(), ExpressionKind::StructLiteral(vec![("a".into(), int(a)), ("b".into(), int(b))]))
    };
    let main_body = vec![
        variable_declaration("p", Some(pair_of_u8()), Some(struct_literal(1, 2))),
        variable_declaration("q", Some(pair_of_u8()), Some(struct_literal(3, 4))),
    ];
    let engine = check("scenario6.sp", vec![pair, main_declaration(main_body)]);

    assert!(!engine.diagnostics.has_errors(), "{:?}", engine.diagnostics.diagnostics);
    let instantiations = engine
        .jobs
        .iter()
        .filter(|j| j.kind == JobKind::TypePolymorphicStruct && matches!(j.input, JobInput::PolymorphicInstantiation(_)))
        .count();
    assert_eq!(instantiations, 1, "p and q must share one Pair(u8) instantiation");

    let top = top_level_scope(&engine);
    let body = function_body(&engine, top, "main");
    let TypedStatementKind::VariableDeclaration { declared_type: p_ty, .. } = &body[0].kind else { panic!() };
    let TypedStatementKind::VariableDeclaration { declared_type: q_ty, .. } = &body[1].kind else { panic!() };
    assert_eq!(p_ty, q_ty);
}

/// `Rec :: struct { a: u8; }` `main := () { p : Rec = .{a = 300}; }` — a
/// non-probing struct-literal member coercion failure must still report
/// (§4.7), not just bubble a silent `Err` out of the member loop.
#[test]
fn struct_literal_member_out_of_range_reports_coercion_error() {
    let rec = stmt(StatementKind::StructDefinition {
        name: "Rec".into(),
        parameters: vec![],
        members: vec![StructMember { name: "a".into(), type_expression: var("u8"), range: range() }],
    });
    let main_body = vec![variable_declaration(
        "p",
        Some(var("Rec")),
        Some(Expression::new(range(), ExpressionKind::StructLiteral(vec![("a".into(), int(300))]))),
    )];
    let engine = check("scenario_struct_member.sp", vec![rec, main_declaration(main_body)]);

    assert!(engine.diagnostics.has_errors());
    let coercion = engine
        .diagnostics
        .diagnostics
        .iter()
        .find(|d| d.kind == DiagnosticKind::Coercion)
        .expect("a coercion diagnostic for the struct literal's bad member");
    assert!(coercion.message.contains("300"));
    assert!(coercion.message.contains("u8"));
}

/// The hover property (§8): every typed expression's narrowest child at a
/// point within its range is itself containable at that point.
#[test]
fn narrowest_child_range_is_contained_in_parent_range() {
    let main_body = vec![variable_declaration("x", Some(var("u8")), Some(int(5)))];
    let engine = check("scenario_hover.sp", vec![main_declaration(main_body)]);
    assert!(!engine.diagnostics.has_errors());

    let top = top_level_scope(&engine);
    let body = function_body(&engine, top, "main");
    let TypedStatementKind::VariableDeclaration { initializer, .. } = &body[0].kind else { panic!() };
    let initializer = initializer.as_ref().unwrap();
    let narrowest = initializer.narrowest_at(initializer.range.first_line, initializer.range.first_column);
    assert!(initializer.range.contains(narrowest.range.first_line, narrowest.range.first_column));
    assert!(matches!(narrowest.kind, TypedExpressionKind::Leaf));
}
