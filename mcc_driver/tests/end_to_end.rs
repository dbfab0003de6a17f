//! Eight end-to-end scenarios covering macro rescan/self-reference, typedef
//! and array-of-function-pointer declarators, constant folding, loop
//! unrolling and strength reduction, each run through the real pipeline
//! (`mcc_driver::pipeline`) rather than against a hand-built AST or IR
//! fragment.

use mcc_common::CStd;
use mcc_driver::config::{Config, Target};
use mcc_driver::pipeline::{compile, expand};
use rstest::rstest;

fn base_config(target: Target) -> Config {
    Config { include_paths: vec![], defines: vec![], undefs: vec![], std: CStd::C17, target, emit_asm: true, expand_only: false }
}

/// Scenarios 1-3: macro expansion shapes, each checked by substring or
/// exact match on the rendered expansion.
#[rstest]
#[case::macro_paste_then_rescan("#define CAT(a,b) a##b\n#define X(n) CAT(v,n)\nint X(1) = 7;\n", "v1")]
#[case::indirect_function_like_rescan("#define A B\n#define B(x) x\nA(42)\n", "42")]
fn macro_expansion_scenarios(#[case] source: &str, #[case] expected_substring: &str) {
    let (expanded, diagnostics) = expand(source, "t.c", CStd::C17);
    assert!(!diagnostics.has_errors(), "unexpected diagnostics: {:?}", diagnostics.iter().collect::<Vec<_>>());
    assert!(expanded.contains(expected_substring), "expected '{expected_substring}' in: {expanded}");
}

#[test]
fn scenario_3_self_reference_blue_paints_the_inner_occurrence() {
    // f(f)(1) -> f + f (1): the inner f expands once, the outer re-occurrence
    // of f carries f in its hide set and stays literal.
    let (expanded, diagnostics) = expand("#define f(x) x+f\nf(f)(1)\n", "t.c", CStd::C17);
    assert!(!diagnostics.has_errors());
    let collapsed: String = expanded.split_whitespace().collect::<Vec<_>>().join(" ");
    assert_eq!(collapsed, "f + f (1)");
}

#[test]
fn scenario_4_typedef_then_pointer_declarator() {
    let (decls, types, diagnostics) = mcc_driver::pipeline::parse_translation_unit("typedef int T; T *p;\n", "t.c", CStd::C17);
    assert!(!diagnostics.has_errors());
    assert_eq!(decls.len(), 2);
    let mcc_ast::DeclKind::Variable(var) = &decls[1].kind else { panic!("expected a variable decl") };
    assert_eq!(var.name, "p");
    let mcc_ast::TypeKind::Pointer { pointee } = &types.get(var.ty).kind else { panic!("expected pointer type") };
    assert!(matches!(types.get(*pointee).kind, mcc_ast::TypeKind::Int(mcc_ast::IntKind::Int, _)));
}

#[test]
fn scenario_5_array_of_function_pointers() {
    let (decls, types, diagnostics) =
        mcc_driver::pipeline::parse_translation_unit("int (*arr[5])(int, int);\n", "t.c", CStd::C17);
    assert!(!diagnostics.has_errors());
    let mcc_ast::DeclKind::Variable(var) = &decls[0].kind else { panic!("expected a variable decl") };
    assert_eq!(var.name, "arr");
    let mcc_ast::TypeKind::Array { element, length, .. } = &types.get(var.ty).kind else { panic!("expected array type") };
    assert_eq!(*length, Some(5));
    let mcc_ast::TypeKind::Pointer { pointee } = &types.get(*element).kind else { panic!("expected array of pointers") };
    assert!(matches!(types.get(*pointee).kind, mcc_ast::TypeKind::Function { .. }));
}

#[test]
fn scenario_6_constant_folded_return_reaches_assembly() {
    let out = compile("int main(void) { return 3 + 5; }\n", "t.c", &base_config(Target::X86Gas), vec![]);
    assert!(!out.diagnostics.has_errors());
    assert!(out.text.contains('8'), "folded constant should reach the emitted assembly:\n{}", out.text);
}

#[test]
fn scenario_7_full_unroll_leaves_four_constant_additions() {
    // A hand-counted 4-iteration loop (init=0, step=1, limit=4, body s += iv)
    // over ANVIL IR directly: the pipeline's minimal lowering doesn't emit
    // loop-header PHIs (the driver spills locals to allocas instead, see
    // lower.rs), so the unroller's loop-header pattern only ever arises from
    // IR built directly as the optimizer's own test suite does.
    use anvil_ir::{Function, IrBuilder, IrType, Module};

    let mut module = Module::new("m");
    let f = module.add_function(Function::new("f", IrType::I32, vec![]));
    let preheader = module.add_block(f, "entry");
    let header = module.add_block(f, "loop");
    let body = module.add_block(f, "body");
    let exit = module.add_block(f, "exit");

    let mut b = IrBuilder::new(&mut module, f, preheader);
    let zero = b.module().const_int(IrType::I32, 0);
    b.build_br(header);

    b.set_block(header);
    let (iv_phi, iv) = b.build_phi(IrType::I32);
    let (s_phi, s) = b.build_phi(IrType::I32);
    let four = b.module().const_int(IrType::I32, 4);
    let cond = b.build_icmp(anvil_ir::Opcode::CmpSlt, iv, four);
    b.build_br_cond(cond, body, exit);

    b.set_block(body);
    let one = b.module().const_int(IrType::I32, 1);
    let next_iv = b.build_add(IrType::I32, iv, one);
    let next_s = b.build_add(IrType::I32, s, iv);
    b.build_br(header);

    b.add_phi_incoming(iv_phi, zero, preheader);
    b.add_phi_incoming(iv_phi, next_iv, body);
    b.add_phi_incoming(s_phi, zero, preheader);
    b.add_phi_incoming(s_phi, next_s, body);

    b.set_block(exit);
    b.build_ret(Some(s));

    anvil_opt::run_to_fixed_point(&mut module);

    let adds_in_preheader = module
        .block(preheader)
        .instructions
        .iter()
        .filter(|&&id| module.inst(id).opcode == anvil_ir::Opcode::Add)
        .count();
    assert!(adds_in_preheader >= 4, "expected the unrolled body's additions to land in the preheader, found {adds_in_preheader}");
}

#[test]
fn scenario_8_multiply_by_power_of_two_strength_reduces() {
    let out = compile("int f(int x) { return x * 16; }\n", "t.c", &base_config(Target::X86Gas), vec![]);
    assert!(!out.diagnostics.has_errors());
    let lowered = out.text.to_lowercase();
    assert!(lowered.contains("sal") || lowered.contains("shl"), "expected a shift mnemonic in:\n{}", out.text);
}
