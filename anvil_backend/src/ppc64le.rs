//! The PPC64LE ELFv2 backend: GAS syntax with ELFv2 directives, a 32-byte
//! minimum frame, the link register saved at `SP+16` and the TOC pointer
//! saved at `SP+24`, matching the ELFv2 ABI's own fixed layout.
//!
//! Unlike the x86 core this target is 64-bit throughout (`r3`/`r4` are the
//! naive primary/secondary GPRs, `f1`/`f2` the FPR equivalents), so every
//! IR integer width up to 64 bits fits a single register — no split-
//! register handling is needed the way a genuinely 32-bit-only x86 target
//! would need it for `i64`.

use std::collections::HashMap;

use anvil_ir::{Function, FunctionId, InstId, IrType, Module, Opcode, ValueId, ValueKind};
use mcc_common::{McError, McResult};

use crate::frame::{self, FrameLayout};
use crate::strings::StringPool;
use crate::{ArchInfo, Backend, Endianness};

const PRIMARY: &str = "r3";
const SECONDARY: &str = "r4";
const SCRATCH: &str = "r5";
const SCRATCH2: &str = "r6";
const CALLEE_ADDR: &str = "r12";
const SP: &str = "r1";
const PRIMARY_F: &str = "f1";
const SECONDARY_F: &str = "f2";

const STACK_ALIGN: u32 = 16;
const POINTER_SIZE: u32 = 8;
/// ELFv2 minimum frame: back-chain + LR-save (SP+16) + TOC-save (SP+24) +
/// padding to 32.
const LINKAGE_RESERVE: u32 = 32;
const ARG_REGS: [&str; 8] = ["r3", "r4", "r5", "r6", "r7", "r8", "r9", "r10"];

#[derive(Default)]
pub struct Ppc64leBackend {
    buffer: String,
    strings: StringPool,
    float_pool: Vec<(String, u64, bool)>,
}

impl Ppc64leBackend {
    pub fn new() -> Self {
        Self { strings: StringPool::new(".Lstr"), ..Default::default() }
    }

    fn emit(&mut self, line: impl AsRef<str>) {
        self.buffer.push_str(line.as_ref());
        self.buffer.push('\n');
    }

    fn mem(base: &str, offset: u32) -> String {
        format!("{offset}({base})")
    }

    fn is_alloca(module: &Module, value: ValueId) -> Option<InstId> {
        match &module.value(value).kind {
            ValueKind::InstResult(inst) if module.inst(*inst).opcode == Opcode::Alloca => Some(*inst),
            _ => None,
        }
    }

    fn block_label(func: &Function, module: &Module, block: anvil_ir::BlockId) -> String {
        if func.entry_block() == Some(block) {
            func.name.clone()
        } else {
            format!("{}.{}", func.name, module.block(block).name)
        }
    }

    fn intern_float(&mut self, v: f64, is_f64: bool) -> String {
        let bits = if is_f64 { v.to_bits() } else { (v as f32).to_bits() as u64 };
        if let Some((label, ..)) = self.float_pool.iter().find(|(_, b, f)| *b == bits && *f == is_f64) {
            return label.clone();
        }
        let label = format!(".Lfp{}", self.float_pool.len());
        self.float_pool.push((label.clone(), bits, is_f64));
        label
    }

    fn load_int(&mut self, module: &Module, layout: &FrameLayout, value: ValueId, reg: &str) {
        match &module.value(value).kind {
            ValueKind::ConstantInt(v) => self.emit(format!("    li {reg}, {v}")),
            ValueKind::ConstantNull => self.emit(format!("    li {reg}, 0")),
            ValueKind::Global(name) | ValueKind::FunctionRef(name) => self.emit(format!("    la {reg}, {name}@toc")),
            ValueKind::ConstantString(s) => {
                let label = self.strings.intern(s);
                self.emit(format!("    la {reg}, {label}@toc"));
            }
            ValueKind::ConstantFloat(_) => {
                let offset = layout.value_offsets.get(&value).copied().unwrap_or(0);
                self.emit(format!("    ld {reg}, {}", Self::mem(SP, offset)));
            }
            ValueKind::Param(_) | ValueKind::InstResult(_) => {
                let offset = *layout.value_offsets.get(&value).expect("every param/result has a slot");
                self.emit(format!("    ld {reg}, {}", Self::mem(SP, offset)));
            }
        }
    }

    fn load_float(&mut self, module: &Module, layout: &FrameLayout, value: ValueId, reg: &str) {
        let data = module.value(value);
        let is_f64 = data.ty == IrType::F64;
        let mnemonic = if is_f64 { "lfd" } else { "lfs" };
        match &data.kind {
            ValueKind::ConstantFloat(v) => {
                let label = self.intern_float(*v, is_f64);
                self.emit(format!("    la {SCRATCH}, {label}@toc"));
                self.emit(format!("    {mnemonic} {reg}, 0({SCRATCH})"));
            }
            _ => {
                let offset = *layout.value_offsets.get(&value).expect("every float value has a slot");
                self.emit(format!("    {mnemonic} {reg}, {}", Self::mem(SP, offset)));
            }
        }
    }

    fn store_int(&mut self, layout: &FrameLayout, result: ValueId, reg: &str) {
        let offset = *layout.value_offsets.get(&result).expect("result always has a slot");
        self.emit(format!("    std {reg}, {}", Self::mem(SP, offset)));
    }

    fn store_float(&mut self, layout: &FrameLayout, result: ValueId, reg: &str, is_f64: bool) {
        let offset = *layout.value_offsets.get(&result).expect("result always has a slot");
        let mnemonic = if is_f64 { "stfd" } else { "stfs" };
        self.emit(format!("    {mnemonic} {reg}, {}", Self::mem(SP, offset)));
    }

    fn int_binary_mnemonic(op: Opcode) -> Option<&'static str> {
        Some(match op {
            Opcode::Add => "add",
            Opcode::And => "and",
            Opcode::Or => "or",
            Opcode::Xor => "xor",
            Opcode::Shl => "sld",
            Opcode::Shr => "srd",
            Opcode::Sar => "srad",
            _ => return None,
        })
    }

    fn int_setcc_branch(op: Opcode) -> Option<&'static str> {
        Some(match op {
            Opcode::CmpEq => "beq",
            Opcode::CmpNe => "bne",
            Opcode::CmpSlt => "blt",
            Opcode::CmpSle => "ble",
            Opcode::CmpSgt => "bgt",
            Opcode::CmpSge => "bge",
            Opcode::CmpUlt => "blt",
            Opcode::CmpUle => "ble",
            Opcode::CmpUgt => "bgt",
            Opcode::CmpUge => "bge",
            _ => return None,
        })
    }

    fn is_unsigned_cmp(op: Opcode) -> bool {
        matches!(op, Opcode::CmpUlt | Opcode::CmpUle | Opcode::CmpUgt | Opcode::CmpUge)
    }

    fn float_setcc_branch(op: Opcode) -> Option<&'static str> {
        Some(match op {
            Opcode::FcmpOeq => "beq",
            Opcode::FcmpOne => "bne",
            Opcode::FcmpOlt => "blt",
            Opcode::FcmpOle => "ble",
            Opcode::FcmpOgt => "bgt",
            Opcode::FcmpOge => "bge",
            _ => return None,
        })
    }

    fn lower_instruction(&mut self, module: &Module, func: &Function, layout: &FrameLayout, inst_id: InstId) -> McResult<()> {
        let inst = module.inst(inst_id).clone();
        if inst.opcode.is_phi() || inst.opcode == Opcode::Nop {
            self.emit("    # phi elided at lowering time");
            return Ok(());
        }

        match inst.opcode {
            Opcode::Alloca => {
                let slot = *layout.alloca_offsets.get(&inst_id).expect("materialized earlier");
                self.emit(format!("    addi {PRIMARY}, {SP}, {slot}"));
                self.store_int(layout, inst.result.unwrap(), PRIMARY);
            }
            Opcode::Load => {
                let result = inst.result.unwrap();
                let is_f = module.value(result).ty.is_float();
                let address = inst.operands[0];
                if let Some(alloca_inst) = Self::is_alloca(module, address) {
                    let slot = *layout.alloca_offsets.get(&alloca_inst).expect("materialized earlier");
                    if is_f {
                        let is_f64 = module.value(result).ty == IrType::F64;
                        let mnemonic = if is_f64 { "lfd" } else { "lfs" };
                        self.emit(format!("    {mnemonic} {PRIMARY_F}, {}", Self::mem(SP, slot)));
                        self.store_float(layout, result, PRIMARY_F, is_f64);
                    } else {
                        self.emit(format!("    ld {PRIMARY}, {}", Self::mem(SP, slot)));
                        self.store_int(layout, result, PRIMARY);
                    }
                } else {
                    self.load_int(module, layout, address, SECONDARY);
                    if is_f {
                        let is_f64 = module.value(result).ty == IrType::F64;
                        let mnemonic = if is_f64 { "lfd" } else { "lfs" };
                        self.emit(format!("    {mnemonic} {PRIMARY_F}, 0({SECONDARY})"));
                        self.store_float(layout, result, PRIMARY_F, is_f64);
                    } else {
                        self.emit(format!("    ld {PRIMARY}, 0({SECONDARY})"));
                        self.store_int(layout, result, PRIMARY);
                    }
                }
            }
            Opcode::Store => {
                let address = inst.operands[0];
                let value = inst.operands[1];
                let is_f = module.value(value).ty.is_float();
                if let Some(alloca_inst) = Self::is_alloca(module, address) {
                    let slot = *layout.alloca_offsets.get(&alloca_inst).expect("materialized earlier");
                    if is_f {
                        let is_f64 = module.value(value).ty == IrType::F64;
                        self.load_float(module, layout, value, PRIMARY_F);
                        let mnemonic = if is_f64 { "stfd" } else { "stfs" };
                        self.emit(format!("    {mnemonic} {PRIMARY_F}, {}", Self::mem(SP, slot)));
                    } else {
                        self.load_int(module, layout, value, PRIMARY);
                        self.emit(format!("    std {PRIMARY}, {}", Self::mem(SP, slot)));
                    }
                } else {
                    self.load_int(module, layout, address, SECONDARY);
                    if is_f {
                        let is_f64 = module.value(value).ty == IrType::F64;
                        self.load_float(module, layout, value, PRIMARY_F);
                        let mnemonic = if is_f64 { "stfd" } else { "stfs" };
                        self.emit(format!("    {mnemonic} {PRIMARY_F}, 0({SECONDARY})"));
                    } else {
                        self.load_int(module, layout, value, PRIMARY);
                        self.emit(format!("    std {PRIMARY}, 0({SECONDARY})"));
                    }
                }
            }
            Opcode::Gep | Opcode::StructGep => {
                self.load_int(module, layout, inst.operands[0], PRIMARY);
                self.load_int(module, layout, inst.operands[1], SECONDARY);
                self.emit(format!("    add {PRIMARY}, {PRIMARY}, {SECONDARY}"));
                self.store_int(layout, inst.result.unwrap(), PRIMARY);
            }
            Opcode::Sub => {
                self.load_int(module, layout, inst.operands[0], PRIMARY);
                self.load_int(module, layout, inst.operands[1], SECONDARY);
                // `subf rt, ra, rb` computes `rb - ra`.
                self.emit(format!("    subf {PRIMARY}, {SECONDARY}, {PRIMARY}"));
                self.store_int(layout, inst.result.unwrap(), PRIMARY);
            }
            Opcode::Mul => {
                self.load_int(module, layout, inst.operands[0], PRIMARY);
                self.load_int(module, layout, inst.operands[1], SECONDARY);
                self.emit(format!("    mulld {PRIMARY}, {PRIMARY}, {SECONDARY}"));
                self.store_int(layout, inst.result.unwrap(), PRIMARY);
            }
            Opcode::Sdiv | Opcode::Udiv | Opcode::Smod | Opcode::Umod => {
                let signed = matches!(inst.opcode, Opcode::Sdiv | Opcode::Smod);
                let wants_remainder = matches!(inst.opcode, Opcode::Smod | Opcode::Umod);
                self.load_int(module, layout, inst.operands[0], PRIMARY);
                self.load_int(module, layout, inst.operands[1], SECONDARY);
                if wants_remainder {
                    self.emit(format!("    mr {SCRATCH}, {PRIMARY}"));
                }
                let divop = if signed { "divd" } else { "divdu" };
                self.emit(format!("    {divop} {PRIMARY}, {PRIMARY}, {SECONDARY}"));
                if wants_remainder {
                    // No integer-remainder instruction pre-POWER9: recover
                    // it as `dividend - quotient * divisor`.
                    self.emit(format!("    mulld {SCRATCH2}, {PRIMARY}, {SECONDARY}"));
                    self.emit(format!("    subf {PRIMARY}, {SCRATCH2}, {SCRATCH}"));
                }
                self.store_int(layout, inst.result.unwrap(), PRIMARY);
            }
            Opcode::Neg => {
                self.load_int(module, layout, inst.operands[0], PRIMARY);
                self.emit(format!("    neg {PRIMARY}, {PRIMARY}"));
                self.store_int(layout, inst.result.unwrap(), PRIMARY);
            }
            Opcode::Not => {
                self.load_int(module, layout, inst.operands[0], PRIMARY);
                self.emit(format!("    nor {PRIMARY}, {PRIMARY}, {PRIMARY}"));
                self.store_int(layout, inst.result.unwrap(), PRIMARY);
            }
            _ if Self::int_binary_mnemonic(inst.opcode).is_some() => {
                let mnemonic = Self::int_binary_mnemonic(inst.opcode).unwrap();
                self.load_int(module, layout, inst.operands[0], PRIMARY);
                self.load_int(module, layout, inst.operands[1], SECONDARY);
                self.emit(format!("    {mnemonic} {PRIMARY}, {PRIMARY}, {SECONDARY}"));
                self.store_int(layout, inst.result.unwrap(), PRIMARY);
            }
            _ if Self::int_setcc_branch(inst.opcode).is_some() => {
                let branch = Self::int_setcc_branch(inst.opcode).unwrap();
                let cmp = if Self::is_unsigned_cmp(inst.opcode) { "cmpld" } else { "cmpd" };
                self.load_int(module, layout, inst.operands[0], PRIMARY);
                self.load_int(module, layout, inst.operands[1], SECONDARY);
                self.emit(format!("    {cmp} {PRIMARY}, {SECONDARY}"));
                self.emit(format!("    li {PRIMARY}, 0"));
                let true_label = format!("{}.cmp{}_true", func.name, inst_id.index());
                self.emit(format!("    {branch} {true_label}"));
                let end_label = format!("{}.cmp{}_end", func.name, inst_id.index());
                self.emit(format!("    b {end_label}"));
                self.emit(format!("{true_label}:"));
                self.emit(format!("    li {PRIMARY}, 1"));
                self.emit(format!("{end_label}:"));
                self.store_int(layout, inst.result.unwrap(), PRIMARY);
            }
            Opcode::Fadd | Opcode::Fsub | Opcode::Fmul | Opcode::Fdiv => {
                let is_f64 = inst.result.map(|r| module.value(r).ty == IrType::F64).unwrap_or(false);
                let mnemonic = match (inst.opcode, is_f64) {
                    (Opcode::Fadd, true) => "fadd",
                    (Opcode::Fadd, false) => "fadds",
                    (Opcode::Fsub, true) => "fsub",
                    (Opcode::Fsub, false) => "fsubs",
                    (Opcode::Fmul, true) => "fmul",
                    (Opcode::Fmul, false) => "fmuls",
                    (Opcode::Fdiv, true) => "fdiv",
                    _ => "fdivs",
                };
                self.load_float(module, layout, inst.operands[0], PRIMARY_F);
                self.load_float(module, layout, inst.operands[1], SECONDARY_F);
                self.emit(format!("    {mnemonic} {PRIMARY_F}, {PRIMARY_F}, {SECONDARY_F}"));
                self.store_float(layout, inst.result.unwrap(), PRIMARY_F, is_f64);
            }
            Opcode::Fneg => {
                self.load_float(module, layout, inst.operands[0], PRIMARY_F);
                self.emit(format!("    fneg {PRIMARY_F}, {PRIMARY_F}"));
                let is_f64 = inst.result.map(|r| module.value(r).ty == IrType::F64).unwrap_or(false);
                self.store_float(layout, inst.result.unwrap(), PRIMARY_F, is_f64);
            }
            Opcode::Fabs => {
                self.load_float(module, layout, inst.operands[0], PRIMARY_F);
                self.emit(format!("    fabs {PRIMARY_F}, {PRIMARY_F}"));
                let is_f64 = inst.result.map(|r| module.value(r).ty == IrType::F64).unwrap_or(false);
                self.store_float(layout, inst.result.unwrap(), PRIMARY_F, is_f64);
            }
            Opcode::FcmpOeq | Opcode::FcmpOne | Opcode::FcmpOlt | Opcode::FcmpOle | Opcode::FcmpOgt | Opcode::FcmpOge => {
                let branch = Self::float_setcc_branch(inst.opcode).unwrap();
                self.load_float(module, layout, inst.operands[0], PRIMARY_F);
                self.load_float(module, layout, inst.operands[1], SECONDARY_F);
                self.emit(format!("    fcmpu {PRIMARY}, {PRIMARY_F}, {SECONDARY_F}"));
                self.emit(format!("    li {PRIMARY}, 0"));
                let true_label = format!("{}.fcmp{}_true", func.name, inst_id.index());
                self.emit(format!("    {branch} {true_label}"));
                let end_label = format!("{}.fcmp{}_end", func.name, inst_id.index());
                self.emit(format!("    b {end_label}"));
                self.emit(format!("{true_label}:"));
                self.emit(format!("    li {PRIMARY}, 1"));
                self.emit(format!("{end_label}:"));
                self.store_int(layout, inst.result.unwrap(), PRIMARY);
            }
            Opcode::Sitofp | Opcode::Uitofp => {
                let is_f64 = inst.result.map(|r| module.value(r).ty == IrType::F64).unwrap_or(false);
                self.load_int(module, layout, inst.operands[0], PRIMARY);
                self.store_int(layout, inst.operands[0], PRIMARY); // keep a slot to reload as a double below
                self.emit(format!("    std {PRIMARY}, {}", Self::mem(SP, *layout.value_offsets.get(&inst.operands[0]).unwrap())));
                self.emit(format!("    lfd {PRIMARY_F}, {}", Self::mem(SP, *layout.value_offsets.get(&inst.operands[0]).unwrap())));
                self.emit(format!("    fcfid {PRIMARY_F}, {PRIMARY_F}"));
                if !is_f64 {
                    self.emit(format!("    frsp {PRIMARY_F}, {PRIMARY_F}"));
                }
                self.store_float(layout, inst.result.unwrap(), PRIMARY_F, is_f64);
            }
            Opcode::Fptosi | Opcode::Fptoui => {
                self.load_float(module, layout, inst.operands[0], PRIMARY_F);
                self.emit(format!("    fctidz {PRIMARY_F}, {PRIMARY_F}"));
                let offset = *layout.value_offsets.get(&inst.result.unwrap()).expect("result has a slot");
                self.emit(format!("    stfd {PRIMARY_F}, {}", Self::mem(SP, offset)));
                self.emit(format!("    ld {PRIMARY}, {}", Self::mem(SP, offset)));
                self.store_int(layout, inst.result.unwrap(), PRIMARY);
            }
            Opcode::Fpext => {
                self.load_float(module, layout, inst.operands[0], PRIMARY_F);
                self.store_float(layout, inst.result.unwrap(), PRIMARY_F, true);
            }
            Opcode::Fptrunc => {
                self.load_float(module, layout, inst.operands[0], PRIMARY_F);
                self.emit(format!("    frsp {PRIMARY_F}, {PRIMARY_F}"));
                self.store_float(layout, inst.result.unwrap(), PRIMARY_F, false);
            }
            Opcode::Trunc | Opcode::Zext | Opcode::Sext | Opcode::Bitcast | Opcode::Ptrtoint | Opcode::Inttoptr => {
                self.load_int(module, layout, inst.operands[0], PRIMARY);
                self.store_int(layout, inst.result.unwrap(), PRIMARY);
            }
            Opcode::Select => {
                self.load_int(module, layout, inst.operands[0], PRIMARY);
                self.emit(format!("    cmpdi {PRIMARY}, 0"));
                let false_label = format!("{}.select{}_false", func.name, inst_id.index());
                let end_label = format!("{}.select{}_end", func.name, inst_id.index());
                self.emit(format!("    beq {false_label}"));
                self.load_int(module, layout, inst.operands[1], PRIMARY);
                self.store_int(layout, inst.result.unwrap(), PRIMARY);
                self.emit(format!("    b {end_label}"));
                self.emit(format!("{false_label}:"));
                self.load_int(module, layout, inst.operands[2], PRIMARY);
                self.store_int(layout, inst.result.unwrap(), PRIMARY);
                self.emit(format!("{end_label}:"));
            }
            Opcode::Call => {
                // Indirect calls carry the callee pointer as operands[0],
                // with the true arguments in operands[1..]; direct calls
                // have no callee operand, so all of operands[..] are
                // arguments.
                let args = if inst.callee_name.is_none() { &inst.operands[1..] } else { &inst.operands[..] };
                for (i, &arg) in args.iter().enumerate().take(ARG_REGS.len()) {
                    self.load_int(module, layout, arg, ARG_REGS[i]);
                }
                if args.len() > ARG_REGS.len() {
                    log::warn!("call to {:?} passes more than 8 arguments; overflow args are dropped by this naive backend", inst.callee_name);
                }
                match &inst.callee_name {
                    Some(name) => self.emit(format!("    bl {name}")),
                    None => {
                        self.load_int(module, layout, inst.operands[0], CALLEE_ADDR.into());
                        self.emit(format!("    mtctr {CALLEE_ADDR}"));
                        self.emit("    bctrl");
                    }
                }
                // ELFv2: a call may clobber the TOC pointer; reload it.
                self.emit(format!("    ld r2, 24({SP})"));
                if let Some(result) = inst.result {
                    self.store_int(layout, result, PRIMARY);
                }
            }
            Opcode::Br => {
                let target = inst.successors[0].expect("br has a target");
                self.emit(format!("    b {}", Self::block_label(func, module, target)));
            }
            Opcode::BrCond => {
                self.load_int(module, layout, inst.operands[0], PRIMARY);
                self.emit(format!("    cmpdi {PRIMARY}, 0"));
                let then_blk = inst.successors[0].expect("br_cond has a then target");
                let else_blk = inst.successors[1].expect("br_cond has an else target");
                self.emit(format!("    bne {}", Self::block_label(func, module, then_blk)));
                self.emit(format!("    b {}", Self::block_label(func, module, else_blk)));
            }
            Opcode::Ret => {
                if let Some(&value) = inst.operands.first() {
                    if module.value(value).ty.is_float() {
                        self.load_float(module, layout, value, PRIMARY_F);
                    } else {
                        self.load_int(module, layout, value, PRIMARY);
                    }
                }
                self.emit(format!("    b {}.epilogue", func.name));
            }
            Opcode::Phi | Opcode::Nop => unreachable!("handled above"),
        }
        Ok(())
    }

    fn lower_function(&mut self, module: &Module, func_id: FunctionId) -> McResult<()> {
        let func = module.function(func_id);
        if func.is_declaration {
            self.emit(format!(".globl {}", func.name));
            return Ok(());
        }
        if module.validate_function(func_id).is_err() {
            return Err(McError::codegen(format!("function {} failed block-shape validation", func.name)));
        }

        let layout = frame::materialize(module, func, POINTER_SIZE, STACK_ALIGN, LINKAGE_RESERVE);

        self.emit(format!(".globl {}", func.name));
        self.emit(format!(".type {}, @function", func.name));
        self.emit(format!("{}:", func.name));
        self.emit("    mflr r0");
        self.emit("    std r0, 16(r1)");
        self.emit("    std r2, 24(r1)");
        self.emit(format!("    stdu r1, -{}(r1)", layout.frame_size));

        for (i, &param) in func.params.iter().enumerate().take(ARG_REGS.len()) {
            self.store_int(&layout, param, ARG_REGS[i]);
        }

        for (i, &block_id) in func.blocks.iter().enumerate() {
            if i > 0 {
                self.emit(format!("{}:", Self::block_label(func, module, block_id)));
            }
            let inst_ids: Vec<InstId> = module.block(block_id).instructions.clone();
            for inst_id in inst_ids {
                self.lower_instruction(module, func, &layout, inst_id)?;
            }
        }

        self.emit(format!("{}.epilogue:", func.name));
        self.emit(format!("    addi r1, r1, {}", layout.frame_size));
        self.emit("    ld r0, 16(r1)");
        self.emit("    mtlr r0");
        self.emit("    blr");
        Ok(())
    }

    fn emit_data_section(&mut self) {
        if self.strings.is_empty() && self.float_pool.is_empty() {
            return;
        }
        self.emit(".section .data");
        for (label, content) in self.strings.entries().to_vec() {
            self.emit(format!("{label}:\n    .string \"{}\"", content.replace('\\', "\\\\").replace('"', "\\\"")));
        }
        for (label, bits, is_f64) in self.float_pool.clone() {
            if is_f64 {
                self.emit(format!("{label}:\n    .quad {bits}"));
            } else {
                self.emit(format!("{label}:\n    .long {}", bits as u32));
            }
        }
    }

    fn arch_info() -> ArchInfo {
        ArchInfo {
            name: "ppc64le",
            pointer_size: POINTER_SIZE,
            word_size: POINTER_SIZE,
            gpr_count: 32,
            fpr_count: 32,
            endianness: Endianness::Little,
            stack_grows_down: true,
            has_condition_codes: true,
            has_delay_slots: false,
        }
    }
}

impl Backend for Ppc64leBackend {
    fn init(&mut self) {}

    fn cleanup(&mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.strings.clear();
        self.float_pool.clear();
    }

    fn codegen_module(&mut self, module: &Module) -> McResult<String> {
        self.buffer.clear();
        self.emit(".text");
        let function_ids: Vec<FunctionId> = module.functions().map(|(id, _)| id).collect();
        for function in function_ids {
            self.lower_function(module, function)?;
        }
        self.emit_data_section();
        Ok(std::mem::take(&mut self.buffer))
    }

    fn codegen_func(&mut self, module: &Module, function: FunctionId) -> McResult<String> {
        self.buffer.clear();
        self.emit(".text");
        self.lower_function(module, function)?;
        self.emit_data_section();
        Ok(std::mem::take(&mut self.buffer))
    }

    fn arch_info(&self) -> ArchInfo {
        Self::arch_info()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anvil_ir::{Function as F, IrBuilder, IrType};

    #[test]
    fn frame_carries_the_elfv2_linkage_reserve() {
        let mut module = Module::new("m");
        let f = module.add_function(F::new("f", IrType::I32, vec![]));
        let entry = module.add_block(f, "entry");
        let mut builder = IrBuilder::new(&mut module, f, entry);
        let zero = builder.module().const_int(IrType::I32, 0);
        builder.build_ret(Some(zero));

        let mut backend = Ppc64leBackend::new();
        let asm = backend.codegen_func(&module, f).unwrap();
        assert!(asm.contains("std r0, 16(r1)"));
        assert!(asm.contains("std r2, 24(r1)"));
        assert!(asm.contains("stdu r1, -32(r1)"), "empty function still reserves the 32-byte minimum frame");
    }

    #[test]
    fn subtraction_uses_reversed_subf_operand_order() {
        let mut module = Module::new("m");
        let f = module.add_function(F::new("f", IrType::I32, vec![IrType::I32, IrType::I32]));
        let a = module.alloc_value(anvil_ir::ValueData { kind: anvil_ir::ValueKind::Param(0), ty: IrType::I32, name: None });
        let b = module.alloc_value(anvil_ir::ValueData { kind: anvil_ir::ValueKind::Param(1), ty: IrType::I32, name: None });
        module.function_mut(f).params = vec![a, b];
        let entry = module.add_block(f, "entry");
        let mut builder = IrBuilder::new(&mut module, f, entry);
        let diff = builder.build_sub(IrType::I32, a, b);
        builder.build_ret(Some(diff));

        let mut backend = Ppc64leBackend::new();
        let asm = backend.codegen_func(&module, f).unwrap();
        assert!(asm.contains("subf r3, r4, r3"));
    }

    #[test]
    fn remainder_recovered_from_divide_and_multiply() {
        let mut module = Module::new("m");
        let f = module.add_function(F::new("f", IrType::I32, vec![IrType::I32, IrType::I32]));
        let a = module.alloc_value(anvil_ir::ValueData { kind: anvil_ir::ValueKind::Param(0), ty: IrType::I32, name: None });
        let b = module.alloc_value(anvil_ir::ValueData { kind: anvil_ir::ValueKind::Param(1), ty: IrType::I32, name: None });
        module.function_mut(f).params = vec![a, b];
        let entry = module.add_block(f, "entry");
        let mut builder = IrBuilder::new(&mut module, f, entry);
        let rem = builder.build_smod(IrType::I32, a, b);
        builder.build_ret(Some(rem));

        let mut backend = Ppc64leBackend::new();
        let asm = backend.codegen_func(&module, f).unwrap();
        assert!(asm.contains("divd r3, r3, r4"));
        assert!(asm.contains("mulld r6, r3, r4"));
        assert!(asm.contains("subf r3, r6, r5"));
    }
}
