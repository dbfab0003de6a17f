use mcc_common::CStd;
use mcc_lexer::{Token, TokenKind};
use mcc_preprocessor::file_loader::{MapFileLoader, NullFileLoader};
use mcc_preprocessor::Preprocessor;

fn texts(tokens: &[Token]) -> Vec<&str> {
    tokens.iter().filter(|t| t.kind != TokenKind::Eof).map(|t| t.text.as_str()).collect()
}

#[test]
fn nested_conditional_inside_a_skipped_branch_does_not_leak_its_body() {
    let mut pp = Preprocessor::new(CStd::C17, NullFileLoader);
    let src = "\
#if 0
#if 1
inner_hidden
#endif
outer_hidden
#endif
visible
";
    let out = pp.preprocess(src, "t.c");
    assert!(!pp.diagnostics().has_errors());
    assert_eq!(texts(&out), vec!["visible"]);
}

#[test]
fn function_like_macro_recursion_through_headers() {
    let loader = MapFileLoader::new()
        .with_file("max.h", "#define MAX(a, b) ((a) > (b) ? (a) : (b))\n")
        .with_file("lib.h", "#include \"max.h\"\n#define CLAMP(x, lo, hi) MAX(lo, (x) < hi ? x : hi)\n");
    let mut pp = Preprocessor::new(CStd::C17, loader);
    let out = pp.preprocess("#include \"lib.h\"\nCLAMP(v, 0, 9)\n", "t.c");
    assert!(!pp.diagnostics().has_errors());
    assert_eq!(
        texts(&out),
        vec!["(", "(", "0", ")", ">", "(", "(", "v", ")", "<", "9", "?", "v", ":", "9", ")", "?", "(", "0", ")", ":", "(", "(", "v", ")", "<", "9", "?", "v", ":", "9", ")", ")"]
    );
}

#[test]
fn c23_elifdef_and_elifndef_select_branches() {
    let mut pp = Preprocessor::new(CStd::C23, NullFileLoader);
    let src = "\
#define FEATURE_B
#ifdef FEATURE_A
a
#elifdef FEATURE_B
b
#elifndef FEATURE_C
c_unreachable
#else
d
#endif
";
    let out = pp.preprocess(src, "t.c");
    assert!(!pp.diagnostics().has_errors());
    assert_eq!(texts(&out), vec!["b"]);
}

#[test]
fn error_directive_reports_inside_taken_branch_only() {
    let mut pp = Preprocessor::new(CStd::C17, NullFileLoader);
    pp.preprocess("#if 0\n#error should not fire\n#endif\n", "t.c");
    assert!(!pp.diagnostics().has_errors());

    let mut pp2 = Preprocessor::new(CStd::C17, NullFileLoader);
    pp2.preprocess("#if 1\n#error this should fire\n#endif\n", "t.c");
    assert!(pp2.diagnostics().has_errors());
}

#[test]
fn variadic_macro_through_directive_dispatch() {
    let mut pp = Preprocessor::new(CStd::C17, NullFileLoader);
    let out = pp.preprocess("#define LOG(fmt, ...) printf(fmt, __VA_ARGS__)\nLOG(\"%d\", 1, 2)\n", "t.c");
    assert!(!pp.diagnostics().has_errors());
    assert_eq!(texts(&out), vec!["printf", "(", "\"%d\"", ",", "1", ",", "2", ")"]);
}

#[test]
fn undef_then_use_leaves_macro_name_literal() {
    let mut pp = Preprocessor::new(CStd::C17, NullFileLoader);
    let out = pp.preprocess("#define FOO 1\n#undef FOO\nFOO\n", "t.c");
    assert!(!pp.diagnostics().has_errors());
    assert_eq!(texts(&out), vec!["FOO"]);
}

#[test]
fn cli_defined_macro_is_visible_to_conditionals() {
    let mut pp = Preprocessor::new(CStd::C17, NullFileLoader);
    pp.define_cli("DEBUG_LEVEL", Some("2"));
    let out = pp.preprocess("#if DEBUG_LEVEL >= 2\nverbose\n#endif\n", "t.c");
    assert!(!pp.diagnostics().has_errors());
    assert_eq!(texts(&out), vec!["verbose"]);
}

#[test]
fn include_depth_limit_is_enforced() {
    let loader = MapFileLoader::new().with_file("self.h", "#include \"self.h\"\n");
    let mut pp = Preprocessor::new(CStd::C17, loader);
    pp.set_max_include_depth(8);
    pp.preprocess("#include \"self.h\"\n", "t.c");
    assert!(pp.diagnostics().has_errors());
}
