//! An informal textual pretty-printer for debugging and test assertions.
//! There's no mandated textual IR format, so this is never parsed back in
//! anywhere — it exists purely to make manual inspection and test failure
//! output readable.

use crate::instruction::{Instruction, Opcode};
use crate::module::Module;
use crate::ty::IrType;
use crate::value::ValueKind;
use crate::{BlockId, FunctionId, ValueId};
use std::fmt;

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrType::Void => write!(f, "void"),
            IrType::I1 => write!(f, "i1"),
            IrType::I8 => write!(f, "i8"),
            IrType::I16 => write!(f, "i16"),
            IrType::I32 => write!(f, "i32"),
            IrType::I64 => write!(f, "i64"),
            IrType::F32 => write!(f, "f32"),
            IrType::F64 => write!(f, "f64"),
            IrType::Ptr => write!(f, "ptr"),
            IrType::Array { element, len } => write!(f, "[{len} x {element}]"),
            IrType::Struct(fields) => {
                write!(f, "{{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{field}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(opcode_mnemonic(*self))
    }
}

/// Renders a whole module as a flat text listing, grouped by function.
pub fn display_module(module: &Module) -> String {
    let mut out = String::new();
    out.push_str(&format!("module {}\n", module.name));
    for (id, func) in module.functions() {
        out.push_str(&display_function(module, id, func.name.clone()));
    }
    out
}

fn display_function(module: &Module, id: FunctionId, _name: String) -> String {
    let func = module.function(id);
    let mut out = String::new();
    let params: Vec<String> = func.param_types.iter().map(|t| t.to_string()).collect();
    if func.is_declaration {
        out.push_str(&format!("declare {} @{}({})\n", func.ret_ty, func.name, params.join(", ")));
        return out;
    }
    out.push_str(&format!("function {} @{}({}) {{\n", func.ret_ty, func.name, params.join(", ")));
    for &block_id in &func.blocks {
        out.push_str(&display_block(module, block_id));
    }
    out.push_str("}\n");
    out
}

fn display_block(module: &Module, id: BlockId) -> String {
    let block = module.block(id);
    let mut out = format!("{}:\n", block.name);
    for &inst_id in &block.instructions {
        out.push_str("  ");
        out.push_str(&display_instruction(module, module.inst(inst_id)));
        out.push('\n');
    }
    out
}

fn display_instruction(module: &Module, inst: &Instruction) -> String {
    let mnemonic = opcode_mnemonic(inst.opcode);
    let result = inst
        .result
        .map(|v| format!("{} = ", display_value(module, v)))
        .unwrap_or_default();

    if inst.opcode.is_phi() {
        let pairs: Vec<String> = inst
            .phi_incoming
            .iter()
            .map(|(v, b)| format!("[{}, {}]", display_value(module, *v), module.block(*b).name))
            .collect();
        return format!("{result}phi {}", pairs.join(", "));
    }

    let mut operands: Vec<String> = inst.operands.iter().map(|&v| display_value(module, v)).collect();
    if let Some(callee) = &inst.callee_name {
        operands.insert(0, format!("@{callee}"));
    }
    for succ in inst.successors.iter().flatten() {
        operands.push(module.block(*succ).name.clone());
    }
    format!("{result}{mnemonic} {}", operands.join(", "))
}

fn display_value(module: &Module, id: ValueId) -> String {
    match &module.value(id).kind {
        ValueKind::ConstantInt(v) => v.to_string(),
        ValueKind::ConstantFloat(v) => v.to_string(),
        ValueKind::ConstantNull => "null".to_string(),
        ValueKind::ConstantString(s) => format!("{s:?}"),
        ValueKind::Param(i) => format!("%arg{i}"),
        ValueKind::InstResult(inst) => format!("%v{}", inst.index()),
        ValueKind::Global(name) => format!("@{name}"),
        ValueKind::FunctionRef(name) => format!("@{name}"),
    }
}

fn opcode_mnemonic(op: Opcode) -> &'static str {
    match op {
        Opcode::Add => "add",
        Opcode::Sub => "sub",
        Opcode::Mul => "mul",
        Opcode::Sdiv => "sdiv",
        Opcode::Udiv => "udiv",
        Opcode::Smod => "smod",
        Opcode::Umod => "umod",
        Opcode::Neg => "neg",
        Opcode::And => "and",
        Opcode::Or => "or",
        Opcode::Xor => "xor",
        Opcode::Not => "not",
        Opcode::Shl => "shl",
        Opcode::Shr => "shr",
        Opcode::Sar => "sar",
        Opcode::Alloca => "alloca",
        Opcode::Load => "load",
        Opcode::Store => "store",
        Opcode::Gep => "gep",
        Opcode::StructGep => "struct_gep",
        Opcode::Br => "br",
        Opcode::BrCond => "br_cond",
        Opcode::Ret => "ret",
        Opcode::Call => "call",
        Opcode::CmpEq => "cmp_eq",
        Opcode::CmpNe => "cmp_ne",
        Opcode::CmpSlt => "cmp_slt",
        Opcode::CmpSle => "cmp_sle",
        Opcode::CmpSgt => "cmp_sgt",
        Opcode::CmpSge => "cmp_sge",
        Opcode::CmpUlt => "cmp_ult",
        Opcode::CmpUle => "cmp_ule",
        Opcode::CmpUgt => "cmp_ugt",
        Opcode::CmpUge => "cmp_uge",
        Opcode::Trunc => "trunc",
        Opcode::Zext => "zext",
        Opcode::Sext => "sext",
        Opcode::Bitcast => "bitcast",
        Opcode::Ptrtoint => "ptrtoint",
        Opcode::Inttoptr => "inttoptr",
        Opcode::Fadd => "fadd",
        Opcode::Fsub => "fsub",
        Opcode::Fmul => "fmul",
        Opcode::Fdiv => "fdiv",
        Opcode::Fneg => "fneg",
        Opcode::Fabs => "fabs",
        Opcode::FcmpOeq => "fcmp_oeq",
        Opcode::FcmpOne => "fcmp_one",
        Opcode::FcmpOlt => "fcmp_olt",
        Opcode::FcmpOle => "fcmp_ole",
        Opcode::FcmpOgt => "fcmp_ogt",
        Opcode::FcmpOge => "fcmp_oge",
        Opcode::Sitofp => "sitofp",
        Opcode::Uitofp => "uitofp",
        Opcode::Fptosi => "fptosi",
        Opcode::Fptoui => "fptoui",
        Opcode::Fpext => "fpext",
        Opcode::Fptrunc => "fptrunc",
        Opcode::Phi => "phi",
        Opcode::Select => "select",
        Opcode::Nop => "nop",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::IrBuilder;
    use crate::function::Function;

    #[test]
    fn renders_a_trivial_function() {
        let mut module = Module::new("m");
        let func_id = module.add_function(Function::new("answer", IrType::I32, vec![]));
        let entry = module.add_block(func_id, "entry");
        let mut b = IrBuilder::new(&mut module, func_id, entry);
        let c = b.module().const_int(IrType::I32, 42);
        b.build_ret(Some(c));
        let text = display_module(&module);
        assert!(text.contains("function i32 @answer"));
        assert!(text.contains("ret 42"));
    }
}
