//! Intel-syntax (NASM) x86 backend: bare register names, `dst, src` operand
//! order, `[base+offset]` addressing, no immediate sigil.

use anvil_ir::{FunctionId, Module};
use mcc_common::McResult;

use super::{Operand, X86Common, X86Dialect};
use crate::{ArchInfo, Backend};

pub struct NasmDialect;

impl X86Dialect for NasmDialect {
    fn render(op: &Operand) -> String {
        match op {
            Operand::Reg(r) => r.to_string(),
            Operand::Imm(v) => v.to_string(),
            Operand::Mem { base, offset } => {
                if *offset == 0 {
                    format!("[{base}]")
                } else if *offset > 0 {
                    format!("[{base}+{offset}]")
                } else {
                    format!("[{base}{offset}]")
                }
            }
            Operand::Label(name) => name.clone(),
        }
    }

    fn two(mnemonic: &str, dst: &Operand, src: &Operand) -> String {
        format!("    {mnemonic} {}, {}", Self::render(dst), Self::render(src))
    }

    fn one(mnemonic: &str, operand: &Operand) -> String {
        format!("    {mnemonic} {}", Self::render(operand))
    }

    fn zero(mnemonic: &str) -> String {
        format!("    {mnemonic}")
    }

    fn global_directive(name: &str) -> String {
        format!("global {name}")
    }

    fn text_section() -> &'static str {
        "section .text"
    }

    fn data_section() -> &'static str {
        "section .data"
    }

    fn ascii_entry(label: &str, content: &str) -> String {
        let escaped = content.replace('\\', "\\\\").replace('"', "\\\"");
        format!("{label}: db \"{escaped}\", 0")
    }

    fn float_entry(label: &str, bits: u64, is_f64: bool) -> String {
        if is_f64 {
            format!("{label}: dq {bits}")
        } else {
            format!("{label}: dd {}", bits as u32)
        }
    }

    fn comment(text: &str) -> String {
        format!("    ; {text}")
    }
}

pub type X86NasmBackend = X86Common<NasmDialect>;

impl Backend for X86NasmBackend {
    fn init(&mut self) {}

    fn cleanup(&mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        X86Common::reset(self);
    }

    fn codegen_module(&mut self, module: &Module) -> McResult<String> {
        X86Common::codegen_module(self, module)
    }

    fn codegen_func(&mut self, module: &Module, function: FunctionId) -> McResult<String> {
        X86Common::codegen_func(self, module, function)
    }

    fn arch_info(&self) -> ArchInfo {
        X86Common::<NasmDialect>::arch_info("x86-nasm")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anvil_ir::{Function, IrBuilder, IrType};

    #[test]
    fn allocates_a_stack_slot_and_round_trips_through_it() {
        let mut module = Module::new("m");
        let f = module.add_function(Function::new("box", IrType::I32, vec![]));
        let entry = module.add_block(f, "entry");
        let mut builder = IrBuilder::new(&mut module, f, entry);
        let slot = builder.build_alloca(IrType::I32);
        let fortytwo = builder.module().const_int(IrType::I32, 42);
        builder.build_store(slot, fortytwo);
        let loaded = builder.build_load(IrType::I32, slot);
        builder.build_ret(Some(loaded));

        let mut backend = X86NasmBackend::new();
        let asm = backend.codegen_func(&module, f).unwrap();
        assert!(asm.contains("global box"));
        assert!(asm.contains("lea eax, [ebp-"), "alloca lowers to a direct lea off the frame base");
        assert!(asm.contains("mov eax, 42"));
    }

    #[test]
    fn conditional_branch_emits_both_successor_labels() {
        let mut module = Module::new("m");
        let f = module.add_function(Function::new("pick", IrType::I32, vec![]));
        let entry = module.add_block(f, "entry");
        let then_blk = module.add_block(f, "then");
        let else_blk = module.add_block(f, "else");
        let mut builder = IrBuilder::new(&mut module, f, entry);
        let cond = builder.module().const_int(IrType::I1, 1);
        builder.build_br_cond(cond, then_blk, else_blk);
        builder.set_block(then_blk);
        let one = builder.module().const_int(IrType::I32, 1);
        builder.build_ret(Some(one));
        builder.set_block(else_blk);
        let zero = builder.module().const_int(IrType::I32, 0);
        builder.build_ret(Some(zero));

        let mut backend = X86NasmBackend::new();
        let asm = backend.codegen_func(&module, f).unwrap();
        assert!(asm.contains("pick.then:"));
        assert!(asm.contains("pick.else:"));
        assert!(asm.contains("jnz pick.then"));
    }
}
