//! End-to-end parser tests built directly over `mcc_lexer::Lexer` (no macro
//! expansion involved in any of these inputs), covering the typedef+pointer
//! and array-of-function-pointers declarator scenarios.

use mcc_ast::types::{IntKind, TypeKind};
use mcc_ast::{DeclKind, ExprKind};
use mcc_common::CStd;
use mcc_lexer::Lexer;
use mcc_parser::Parser;

fn parse(src: &str) -> (Vec<mcc_ast::Decl>, mcc_ast::TypeArena) {
    let tokens = Lexer::new(src, 0).tokenize();
    let parser = Parser::from_tokens(tokens, CStd::C17);
    let (decls, types, diags) = parser.parse_translation_unit();
    assert!(!diags.has_errors(), "unexpected parse errors: {:?}", diags.iter().collect::<Vec<_>>());
    (decls, types)
}

#[test]
fn typedef_then_pointer_declarator_resolves_to_int() {
    // Scenario 4: `typedef int T; T *p;`
    let (decls, types) = parse("typedef int T; T *p;");
    assert_eq!(decls.len(), 2);
    let DeclKind::Typedef(td) = &decls[0].kind else { panic!("expected typedef") };
    assert_eq!(td.name, "T");
    assert!(matches!(types.get(td.ty).kind, TypeKind::Int(IntKind::Int, _)));

    let DeclKind::Variable(var) = &decls[1].kind else { panic!("expected variable decl") };
    assert_eq!(var.name, "p");
    let TypeKind::Pointer { pointee } = &types.get(var.ty).kind else { panic!("expected pointer type") };
    assert!(matches!(types.get(*pointee).kind, TypeKind::Int(IntKind::Int, _)));
}

#[test]
fn array_of_function_pointers_declarator() {
    // Scenario 5: `int (*arr[5])(int, int);`
    let (decls, types) = parse("int (*arr[5])(int, int);");
    assert_eq!(decls.len(), 1);
    let DeclKind::Variable(var) = &decls[0].kind else { panic!("expected variable decl") };
    assert_eq!(var.name, "arr");

    let TypeKind::Array { element, length, .. } = &types.get(var.ty).kind else {
        panic!("expected array type, got {:?}", types.get(var.ty).kind)
    };
    assert_eq!(*length, Some(5));

    let TypeKind::Pointer { pointee } = &types.get(*element).kind else { panic!("expected pointer element") };
    let TypeKind::Function { ret, params, variadic } = &types.get(*pointee).kind else {
        panic!("expected function type")
    };
    assert!(!variadic);
    assert_eq!(params.len(), 2);
    assert!(matches!(types.get(*ret).kind, TypeKind::Int(IntKind::Int, _)));
}

#[test]
fn simple_function_definition_with_return() {
    let (decls, _types) = parse("int add(int a, int b) { return a + b; }");
    assert_eq!(decls.len(), 1);
    let DeclKind::Function(f) = &decls[0].kind else { panic!("expected function decl") };
    assert_eq!(f.name, "add");
    let body = f.body.as_ref().expect("definition must have a body");
    assert_eq!(body.items.len(), 1);
}

#[test]
fn if_else_and_while_parse() {
    let (decls, _types) = parse(
        "int f(int x) { if (x) { return 1; } else { return 0; } while (x) { x = x - 1; } return x; }",
    );
    let DeclKind::Function(f) = &decls[0].kind else { panic!("expected function decl") };
    let body = f.body.as_ref().unwrap();
    assert_eq!(body.items.len(), 3);
}

#[test]
fn struct_forward_declaration_then_definition_completes_in_place() {
    let (decls, types) = parse("struct point; struct point { int x; int y; };");
    let DeclKind::Struct(fwd) = &decls[0].kind else { panic!("expected struct forward decl") };
    assert!(!types.is_complete(fwd.ty));
    let DeclKind::Struct(def) = &decls[1].kind else { panic!("expected struct definition") };
    assert!(types.is_complete(def.ty));
}

#[test]
fn ternary_and_comma_expression_precedence() {
    let (decls, _types) = parse("int f(void) { return 1 ? 2 : 3, 4; }");
    let DeclKind::Function(f) = &decls[0].kind else { panic!("expected function decl") };
    let body = f.body.as_ref().unwrap();
    let mcc_ast::BlockItem::Stmt(stmt) = &body.items[0] else { panic!("expected stmt") };
    let mcc_ast::StmtKind::Return(Some(expr)) = &stmt.kind else { panic!("expected return expr") };
    assert!(matches!(expr.kind, ExprKind::Comma { .. }));
}

#[test]
fn cast_disambiguated_from_parenthesized_expression() {
    let (decls, _types) = parse("typedef int T; int f(void) { return (T)1 + (2); }");
    let DeclKind::Function(f) = &decls[1].kind else { panic!("expected function decl") };
    let body = f.body.as_ref().unwrap();
    let mcc_ast::BlockItem::Stmt(stmt) = &body.items[0] else { panic!("expected stmt") };
    let mcc_ast::StmtKind::Return(Some(expr)) = &stmt.kind else { panic!("expected return expr") };
    let ExprKind::Binary { lhs, .. } = &expr.kind else { panic!("expected binary add") };
    assert!(matches!(lhs.kind, ExprKind::Cast { .. }));
}

#[test]
fn panic_mode_recovers_past_a_malformed_declaration() {
    let tokens = Lexer::new("int ===; int ok;", 0).tokenize();
    let parser = Parser::from_tokens(tokens, CStd::C17);
    let (decls, _types, diags) = parser.parse_translation_unit();
    assert!(diags.has_errors());
    assert!(decls.iter().any(|d| matches!(&d.kind, DeclKind::Variable(v) if v.name == "ok")));
}
