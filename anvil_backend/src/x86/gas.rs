//! AT&T-syntax (GAS) x86 backend: `%`-prefixed registers, `$`-prefixed
//! immediates, `src, dst` operand order, `offset(%base)` addressing.

use anvil_ir::{FunctionId, Module};
use mcc_common::McResult;

use super::{Operand, X86Common, X86Dialect};
use crate::{ArchInfo, Backend};

pub struct GasDialect;

impl X86Dialect for GasDialect {
    fn render(op: &Operand) -> String {
        match op {
            Operand::Reg(r) => format!("%{r}"),
            Operand::Imm(v) => format!("${v}"),
            Operand::Mem { base, offset } => {
                if *offset == 0 {
                    format!("(%{base})")
                } else {
                    format!("{offset}(%{base})")
                }
            }
            Operand::Label(name) => format!("${name}"),
        }
    }

    fn two(mnemonic: &str, dst: &Operand, src: &Operand) -> String {
        format!("    {mnemonic} {}, {}", Self::render(src), Self::render(dst))
    }

    fn one(mnemonic: &str, operand: &Operand) -> String {
        match (mnemonic, operand) {
            ("call" | "jmp" | "jnz" | "je", Operand::Label(name)) => format!("    {mnemonic} {name}"),
            // AT&T syntax requires the `*` sigil on an indirect call/jump
            // through a register, to disambiguate from a call to a symbol
            // named by that register's text.
            ("call" | "jmp", Operand::Reg(r)) => format!("    {mnemonic} *%{r}"),
            _ => format!("    {mnemonic} {}", Self::render(operand)),
        }
    }

    fn zero(mnemonic: &str) -> String {
        format!("    {mnemonic}")
    }

    fn global_directive(name: &str) -> String {
        format!(".globl {name}")
    }

    fn text_section() -> &'static str {
        ".text"
    }

    fn data_section() -> &'static str {
        ".data"
    }

    fn ascii_entry(label: &str, content: &str) -> String {
        format!("{label}:\n    .asciz \"{}\"", content.replace('\\', "\\\\").replace('"', "\\\""))
    }

    fn float_entry(label: &str, bits: u64, is_f64: bool) -> String {
        if is_f64 {
            format!("{label}:\n    .quad {bits}")
        } else {
            format!("{label}:\n    .long {}", bits as u32)
        }
    }

    fn comment(text: &str) -> String {
        format!("    # {text}")
    }
}

pub type X86GasBackend = X86Common<GasDialect>;

impl Backend for X86GasBackend {
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
        X86Common::<GasDialect>::arch_info("x86-gas")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anvil_ir::{Function, IrBuilder, IrType, ValueData, ValueKind};

    fn param(module: &mut Module, ordinal: u32, ty: IrType) -> anvil_ir::ValueId {
        module.alloc_value(ValueData { kind: ValueKind::Param(ordinal), ty, name: None })
    }

    #[test]
    fn adds_two_parameters_and_returns() {
        let mut module = Module::new("m");
        let f = module.add_function(Function::new("add2", IrType::I32, vec![IrType::I32, IrType::I32]));
        let a = param(&mut module, 0, IrType::I32);
        let b = param(&mut module, 1, IrType::I32);
        module.function_mut(f).params = vec![a, b];
        let entry = module.add_block(f, "entry");
        let mut builder = IrBuilder::new(&mut module, f, entry);
        let sum = builder.build_add(IrType::I32, a, b);
        builder.build_ret(Some(sum));

        let mut backend = X86GasBackend::new();
        let asm = backend.codegen_func(&module, f).unwrap();
        assert!(asm.contains(".globl add2"));
        assert!(asm.contains("add2:"));
        assert!(asm.contains("add %ecx, %eax"));
        assert!(asm.contains("add2.epilogue:"));
    }

    #[test]
    fn string_literal_gets_pooled_and_deduplicated() {
        let mut module = Module::new("m");
        let f = module.add_function(Function::new("greet", IrType::Ptr, vec![]));
        let entry = module.add_block(f, "entry");
        let mut builder = IrBuilder::new(&mut module, f, entry);
        let s1 = builder.module().const_string("hi");
        let s2 = builder.module().const_string("hi");
        builder.build_store(s1, s2); // contrived use just to reference both
        let ret = builder.module().const_string("hi");
        builder.build_ret(Some(ret));

        let mut backend = X86GasBackend::new();
        let asm = backend.codegen_func(&module, f).unwrap();
        assert_eq!(asm.matches(".Lstr0:").count(), 1, "identical string literals share one pooled label");
    }
}
