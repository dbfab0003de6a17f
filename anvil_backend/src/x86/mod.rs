//! The shared x86 lowering core: everything except the two dialects'
//! text-emission layer lives here. `gas` and `nasm` each provide an
//! `X86Dialect` impl and nothing else.
//!
//! Registers are fixed by convention rather than allocated: `eax`/`xmm0` is
//! always the primary integer/float register, `ecx`/`xmm1` the secondary.
//! Every SSA value — not just `ALLOCA`s — gets its own frame spill slot
//! (`frame::materialize`'s generalization past a literal alloca-only
//! reading); an instruction's lowering always starts by loading its
//! operands from their slots and ends by storing the result back to its
//! own, so no value is ever "live in a register" across an instruction
//! boundary. This targets 32-bit x86 (cdecl), with `EAX` as the primary
//! register.

pub mod gas;
pub mod nasm;

use anvil_ir::{Function, FunctionId, InstId, IrType, Module, Opcode, ValueId, ValueKind};
use mcc_common::{McError, McResult};

use crate::frame::{self, FrameLayout};
use crate::strings::StringPool;
use crate::{ArchInfo, Endianness};

pub const PRIMARY: &str = "eax";
pub const SECONDARY: &str = "ecx";
pub const DIVIDEND_HIGH: &str = "edx";
pub const BASE: &str = "ebp";
pub const STACK: &str = "esp";
pub const PRIMARY_F: &str = "xmm0";
pub const SECONDARY_F: &str = "xmm1";

pub const STACK_ALIGN: u32 = 16;
pub const POINTER_SIZE: u32 = 4;

/// One operand of a rendered instruction, dialect-agnostic; each
/// [`X86Dialect`] method turns these into its own text.
pub enum Operand<'a> {
    Reg(&'a str),
    Imm(i64),
    Mem { base: &'a str, offset: i32 },
    /// The address of a symbol (a global, a function, a pooled string or
    /// float constant) used as an immediate operand.
    Label(String),
}

/// The text-emission layer that differs between AT&T and Intel syntax.
/// Everything else — instruction selection, frame layout, operand
/// lifetimes — is shared in [`X86Common`].
pub trait X86Dialect {
    fn render(op: &Operand) -> String;
    /// `dst <- dst OP src` in whichever operand order the dialect uses.
    fn two(mnemonic: &str, dst: &Operand, src: &Operand) -> String;
    fn one(mnemonic: &str, operand: &Operand) -> String;
    fn zero(mnemonic: &str) -> String;
    fn label(name: &str) -> String {
        format!("{name}:")
    }
    fn global_directive(name: &str) -> String;
    fn text_section() -> &'static str;
    fn data_section() -> &'static str;
    fn ascii_entry(label: &str, content: &str) -> String;
    fn float_entry(label: &str, bits: u64, is_f64: bool) -> String;
    fn comment(text: &str) -> String;
}

/// Shared x86 lowering core, generic over the dialect `D`. `X86GasBackend`
/// and `X86NasmBackend` are thin type aliases over this.
pub struct X86Common<D> {
    buffer: String,
    strings: StringPool,
    float_pool: Vec<(String, u64, bool)>,
    _dialect: std::marker::PhantomData<D>,
}

impl<D: X86Dialect> Default for X86Common<D> {
    fn default() -> Self {
        Self { buffer: String::new(), strings: StringPool::new(".Lstr"), float_pool: Vec::new(), _dialect: std::marker::PhantomData }
    }
}

impl<D: X86Dialect> X86Common<D> {
    pub fn new() -> Self {
        Self::default()
    }

    fn emit(&mut self, line: String) {
        self.buffer.push_str(&line);
        self.buffer.push('\n');
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

    fn block_label(func: &Function, module: &Module, block: anvil_ir::BlockId) -> String {
        if func.entry_block() == Some(block) {
            func.name.clone()
        } else {
            format!("{}.{}", func.name, module.block(block).name)
        }
    }

    fn is_alloca(module: &Module, value: ValueId) -> Option<InstId> {
        match &module.value(value).kind {
            ValueKind::InstResult(inst) if module.inst(*inst).opcode == Opcode::Alloca => Some(*inst),
            _ => None,
        }
    }

    fn load_int(&mut self, module: &Module, layout: &FrameLayout, value: ValueId, reg: &str) {
        let data = module.value(value);
        match &data.kind {
            ValueKind::ConstantInt(v) => self.emit(D::two("mov", &Operand::Reg(reg), &Operand::Imm(*v))),
            ValueKind::ConstantNull => self.emit(D::two("mov", &Operand::Reg(reg), &Operand::Imm(0))),
            ValueKind::Global(name) | ValueKind::FunctionRef(name) => {
                self.emit(D::two("mov", &Operand::Reg(reg), &Operand::Label(name.clone())))
            }
            ValueKind::ConstantString(s) => {
                let label = self.strings.intern(s);
                self.emit(D::two("mov", &Operand::Reg(reg), &Operand::Label(label)));
            }
            ValueKind::ConstantFloat(_) => {
                self.emit(D::comment("integer load of a float-typed value; truncated to its stored slot"));
                let offset = layout.value_offsets.get(&value).copied().unwrap_or(0) as i32;
                self.emit(D::two("mov", &Operand::Reg(reg), &Operand::Mem { base: BASE, offset: -offset }));
            }
            ValueKind::Param(_) | ValueKind::InstResult(_) => {
                let offset = *layout.value_offsets.get(&value).expect("every param/result has a slot") as i32;
                self.emit(D::two("mov", &Operand::Reg(reg), &Operand::Mem { base: BASE, offset: -offset }));
            }
        }
    }

    fn load_float(&mut self, module: &Module, layout: &FrameLayout, value: ValueId, reg: &str) {
        let data = module.value(value);
        let is_f64 = data.ty == IrType::F64;
        let mnemonic = if is_f64 { "movsd" } else { "movss" };
        match &data.kind {
            ValueKind::ConstantFloat(v) => {
                let label = self.intern_float(*v, is_f64);
                self.emit(D::two(mnemonic, &Operand::Reg(reg), &Operand::Label(label)));
            }
            _ => {
                let offset = *layout.value_offsets.get(&value).expect("every float value has a slot") as i32;
                self.emit(D::two(mnemonic, &Operand::Reg(reg), &Operand::Mem { base: BASE, offset: -offset }));
            }
        }
    }

    fn store_int(&mut self, layout: &FrameLayout, result: ValueId, reg: &str) {
        let offset = *layout.value_offsets.get(&result).expect("result always has a slot") as i32;
        self.emit(D::two("mov", &Operand::Mem { base: BASE, offset: -offset }, &Operand::Reg(reg)));
    }

    fn store_float(&mut self, layout: &FrameLayout, result: ValueId, reg: &str, is_f64: bool) {
        let offset = *layout.value_offsets.get(&result).expect("result always has a slot") as i32;
        let mnemonic = if is_f64 { "movsd" } else { "movss" };
        self.emit(D::two(mnemonic, &Operand::Mem { base: BASE, offset: -offset }, &Operand::Reg(reg)));
    }

    fn int_binary_mnemonic(op: Opcode) -> Option<&'static str> {
        Some(match op {
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::Mul => "imul",
            Opcode::And => "and",
            Opcode::Or => "or",
            Opcode::Xor => "xor",
            Opcode::Shl => "shl",
            Opcode::Shr => "shr",
            Opcode::Sar => "sar",
            _ => return None,
        })
    }

    fn int_setcc_suffix(op: Opcode) -> Option<&'static str> {
        Some(match op {
            Opcode::CmpEq => "sete",
            Opcode::CmpNe => "setne",
            Opcode::CmpSlt => "setl",
            Opcode::CmpSle => "setle",
            Opcode::CmpSgt => "setg",
            Opcode::CmpSge => "setge",
            Opcode::CmpUlt => "setb",
            Opcode::CmpUle => "setbe",
            Opcode::CmpUgt => "seta",
            Opcode::CmpUge => "setae",
            _ => return None,
        })
    }

    fn float_setcc_suffix(op: Opcode) -> Option<&'static str> {
        Some(match op {
            Opcode::FcmpOeq => "sete",
            Opcode::FcmpOne => "setne",
            Opcode::FcmpOlt => "setb",
            Opcode::FcmpOle => "setbe",
            Opcode::FcmpOgt => "seta",
            Opcode::FcmpOge => "setae",
            _ => return None,
        })
    }

    fn lower_instruction(&mut self, module: &Module, func: &Function, layout: &FrameLayout, inst_id: InstId) -> McResult<()> {
        let inst = module.inst(inst_id).clone();
        if inst.opcode.is_phi() || inst.opcode == Opcode::Nop {
            self.emit(D::comment("phi elided at lowering time"));
            return Ok(());
        }

        match inst.opcode {
            Opcode::Alloca => {
                let slot = *layout.alloca_offsets.get(&inst_id).expect("materialized earlier");
                self.emit(D::two("lea", &Operand::Reg(PRIMARY), &Operand::Mem { base: BASE, offset: -(slot as i32) }));
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
                        let mnemonic = if is_f64 { "movsd" } else { "movss" };
                        self.emit(D::two(mnemonic, &Operand::Reg(PRIMARY_F), &Operand::Mem { base: BASE, offset: -(slot as i32) }));
                        self.store_float(layout, result, PRIMARY_F, is_f64);
                    } else {
                        self.emit(D::two("mov", &Operand::Reg(PRIMARY), &Operand::Mem { base: BASE, offset: -(slot as i32) }));
                        self.store_int(layout, result, PRIMARY);
                    }
                } else {
                    self.load_int(module, layout, address, SECONDARY);
                    if is_f {
                        let is_f64 = module.value(result).ty == IrType::F64;
                        let mnemonic = if is_f64 { "movsd" } else { "movss" };
                        self.emit(D::two(mnemonic, &Operand::Reg(PRIMARY_F), &Operand::Mem { base: SECONDARY, offset: 0 }));
                        self.store_float(layout, result, PRIMARY_F, is_f64);
                    } else {
                        self.emit(D::two("mov", &Operand::Reg(PRIMARY), &Operand::Mem { base: SECONDARY, offset: 0 }));
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
                        let mnemonic = if is_f64 { "movsd" } else { "movss" };
                        self.emit(D::two(mnemonic, &Operand::Mem { base: BASE, offset: -(slot as i32) }, &Operand::Reg(PRIMARY_F)));
                    } else {
                        self.load_int(module, layout, value, PRIMARY);
                        self.emit(D::two("mov", &Operand::Mem { base: BASE, offset: -(slot as i32) }, &Operand::Reg(PRIMARY)));
                    }
                } else {
                    self.load_int(module, layout, address, SECONDARY);
                    if is_f {
                        let is_f64 = module.value(value).ty == IrType::F64;
                        self.load_float(module, layout, value, PRIMARY_F);
                        let mnemonic = if is_f64 { "movsd" } else { "movss" };
                        self.emit(D::two(mnemonic, &Operand::Mem { base: SECONDARY, offset: 0 }, &Operand::Reg(PRIMARY_F)));
                    } else {
                        self.load_int(module, layout, value, PRIMARY);
                        self.emit(D::two("mov", &Operand::Mem { base: SECONDARY, offset: 0 }, &Operand::Reg(PRIMARY)));
                    }
                }
            }
            Opcode::Gep | Opcode::StructGep => {
                // No element-type/field-offset table survives to this layer
                // (`Instruction` only carries `ptr, index`); addressing is
                // byte-wise, which is all the IR can express here.
                self.load_int(module, layout, inst.operands[0], PRIMARY);
                self.load_int(module, layout, inst.operands[1], SECONDARY);
                self.emit(D::two("add", &Operand::Reg(PRIMARY), &Operand::Reg(SECONDARY)));
                self.store_int(layout, inst.result.unwrap(), PRIMARY);
            }
            Opcode::Sdiv | Opcode::Udiv | Opcode::Smod | Opcode::Umod => {
                self.load_int(module, layout, inst.operands[0], PRIMARY);
                let signed = matches!(inst.opcode, Opcode::Sdiv | Opcode::Smod);
                if signed {
                    self.emit(D::zero("cdq"));
                } else {
                    self.emit(D::two("mov", &Operand::Reg(DIVIDEND_HIGH), &Operand::Imm(0)));
                }
                self.load_int(module, layout, inst.operands[1], SECONDARY);
                self.emit(D::one(if signed { "idiv" } else { "div" }, &Operand::Reg(SECONDARY)));
                let wants_remainder = matches!(inst.opcode, Opcode::Smod | Opcode::Umod);
                let result_reg = if wants_remainder { DIVIDEND_HIGH } else { PRIMARY };
                self.store_int(layout, inst.result.unwrap(), result_reg);
            }
            Opcode::Neg => {
                self.load_int(module, layout, inst.operands[0], PRIMARY);
                self.emit(D::one("neg", &Operand::Reg(PRIMARY)));
                self.store_int(layout, inst.result.unwrap(), PRIMARY);
            }
            Opcode::Not => {
                self.load_int(module, layout, inst.operands[0], PRIMARY);
                self.emit(D::one("not", &Operand::Reg(PRIMARY)));
                self.store_int(layout, inst.result.unwrap(), PRIMARY);
            }
            _ if Self::int_binary_mnemonic(inst.opcode).is_some() => {
                let mnemonic = Self::int_binary_mnemonic(inst.opcode).unwrap();
                self.load_int(module, layout, inst.operands[0], PRIMARY);
                self.load_int(module, layout, inst.operands[1], SECONDARY);
                self.emit(D::two(mnemonic, &Operand::Reg(PRIMARY), &Operand::Reg(SECONDARY)));
                self.store_int(layout, inst.result.unwrap(), PRIMARY);
            }
            _ if Self::int_setcc_suffix(inst.opcode).is_some() => {
                let setcc = Self::int_setcc_suffix(inst.opcode).unwrap();
                self.load_int(module, layout, inst.operands[0], PRIMARY);
                self.load_int(module, layout, inst.operands[1], SECONDARY);
                self.emit(D::two("cmp", &Operand::Reg(PRIMARY), &Operand::Reg(SECONDARY)));
                self.emit(D::one(setcc, &Operand::Reg("al")));
                self.emit(D::two("movzx", &Operand::Reg(PRIMARY), &Operand::Reg("al")));
                self.store_int(layout, inst.result.unwrap(), PRIMARY);
            }
            Opcode::Fadd | Opcode::Fsub | Opcode::Fmul | Opcode::Fdiv => {
                let is_f64 = inst.result.map(|r| module.value(r).ty == IrType::F64).unwrap_or(false);
                let mnemonic = match (inst.opcode, is_f64) {
                    (Opcode::Fadd, false) => "addss",
                    (Opcode::Fadd, true) => "addsd",
                    (Opcode::Fsub, false) => "subss",
                    (Opcode::Fsub, true) => "subsd",
                    (Opcode::Fmul, false) => "mulss",
                    (Opcode::Fmul, true) => "mulsd",
                    (Opcode::Fdiv, false) => "divss",
                    _ => "divsd",
                };
                self.load_float(module, layout, inst.operands[0], PRIMARY_F);
                self.load_float(module, layout, inst.operands[1], SECONDARY_F);
                self.emit(D::two(mnemonic, &Operand::Reg(PRIMARY_F), &Operand::Reg(SECONDARY_F)));
                self.store_float(layout, inst.result.unwrap(), PRIMARY_F, is_f64);
            }
            Opcode::Fneg => {
                let is_f64 = inst.result.map(|r| module.value(r).ty == IrType::F64).unwrap_or(false);
                let neg_one = self.intern_float(-1.0, is_f64);
                self.load_float(module, layout, inst.operands[0], PRIMARY_F);
                let mnemonic = if is_f64 { "movsd" } else { "movss" };
                self.emit(D::two(mnemonic, &Operand::Reg(SECONDARY_F), &Operand::Label(neg_one)));
                let mul = if is_f64 { "mulsd" } else { "mulss" };
                self.emit(D::two(mul, &Operand::Reg(PRIMARY_F), &Operand::Reg(SECONDARY_F)));
                self.store_float(layout, inst.result.unwrap(), PRIMARY_F, is_f64);
            }
            Opcode::Fabs => {
                // No SSE `andps` mask pool kept for this naive backend:
                // approximate by squaring then square-rooting is overkill,
                // so fabs round-trips through a negate-if-negative compare.
                let is_f64 = inst.result.map(|r| module.value(r).ty == IrType::F64).unwrap_or(false);
                let zero = self.intern_float(0.0, is_f64);
                self.load_float(module, layout, inst.operands[0], PRIMARY_F);
                let mnemonic = if is_f64 { "movsd" } else { "movss" };
                self.emit(D::two(mnemonic, &Operand::Reg(SECONDARY_F), &Operand::Label(zero)));
                let maxop = if is_f64 { "maxsd" } else { "maxss" };
                let neg_one = self.intern_float(-1.0, is_f64);
                self.emit(D::two(mnemonic, &Operand::Reg("xmm2"), &Operand::Label(neg_one)));
                let mul = if is_f64 { "mulsd" } else { "mulss" };
                self.emit(D::two(mul, &Operand::Reg("xmm2"), &Operand::Reg(PRIMARY_F)));
                self.emit(D::two(maxop, &Operand::Reg(PRIMARY_F), &Operand::Reg("xmm2")));
                self.store_float(layout, inst.result.unwrap(), PRIMARY_F, is_f64);
            }
            Opcode::FcmpOeq | Opcode::FcmpOne | Opcode::FcmpOlt | Opcode::FcmpOle | Opcode::FcmpOgt | Opcode::FcmpOge => {
                let cmp_is_f64 = module.value(inst.operands[0]).ty == IrType::F64;
                let setcc = Self::float_setcc_suffix(inst.opcode).unwrap();
                let mnemonic = if cmp_is_f64 { "comisd" } else { "comiss" };
                self.load_float(module, layout, inst.operands[0], PRIMARY_F);
                self.load_float(module, layout, inst.operands[1], SECONDARY_F);
                self.emit(D::two(mnemonic, &Operand::Reg(PRIMARY_F), &Operand::Reg(SECONDARY_F)));
                self.emit(D::one(setcc, &Operand::Reg("al")));
                self.emit(D::two("movzx", &Operand::Reg(PRIMARY), &Operand::Reg("al")));
                self.store_int(layout, inst.result.unwrap(), PRIMARY);
            }
            Opcode::Sitofp | Opcode::Uitofp => {
                let is_f64 = inst.result.map(|r| module.value(r).ty == IrType::F64).unwrap_or(false);
                let mnemonic = if is_f64 { "cvtsi2sd" } else { "cvtsi2ss" };
                self.load_int(module, layout, inst.operands[0], PRIMARY);
                self.emit(D::two(mnemonic, &Operand::Reg(PRIMARY_F), &Operand::Reg(PRIMARY)));
                self.store_float(layout, inst.result.unwrap(), PRIMARY_F, is_f64);
            }
            Opcode::Fptosi | Opcode::Fptoui => {
                let src_is_f64 = module.value(inst.operands[0]).ty == IrType::F64;
                let mnemonic = if src_is_f64 { "cvttsd2si" } else { "cvttss2si" };
                self.load_float(module, layout, inst.operands[0], PRIMARY_F);
                self.emit(D::two(mnemonic, &Operand::Reg(PRIMARY), &Operand::Reg(PRIMARY_F)));
                self.store_int(layout, inst.result.unwrap(), PRIMARY);
            }
            Opcode::Fpext => {
                self.load_float(module, layout, inst.operands[0], PRIMARY_F);
                self.emit(D::two("cvtss2sd", &Operand::Reg(PRIMARY_F), &Operand::Reg(PRIMARY_F)));
                self.store_float(layout, inst.result.unwrap(), PRIMARY_F, true);
            }
            Opcode::Fptrunc => {
                self.load_float(module, layout, inst.operands[0], PRIMARY_F);
                self.emit(D::two("cvtsd2ss", &Operand::Reg(PRIMARY_F), &Operand::Reg(PRIMARY_F)));
                self.store_float(layout, inst.result.unwrap(), PRIMARY_F, false);
            }
            Opcode::Trunc | Opcode::Zext | Opcode::Sext | Opcode::Bitcast | Opcode::Ptrtoint | Opcode::Inttoptr => {
                self.load_int(module, layout, inst.operands[0], PRIMARY);
                self.store_int(layout, inst.result.unwrap(), PRIMARY);
            }
            Opcode::Select => {
                self.load_int(module, layout, inst.operands[0], PRIMARY);
                self.emit(D::two("cmp", &Operand::Reg(PRIMARY), &Operand::Imm(0)));
                let if_false_label = format!("{}.select{}", func.name, inst_id.index());
                let end_label = format!("{}.select{}_end", func.name, inst_id.index());
                self.emit(D::one("je", &Operand::Label(if_false_label.clone())));
                self.load_int(module, layout, inst.operands[1], PRIMARY);
                self.store_int(layout, inst.result.unwrap(), PRIMARY);
                self.emit(D::one("jmp", &Operand::Label(end_label.clone())));
                self.emit(D::label(&if_false_label));
                self.load_int(module, layout, inst.operands[2], PRIMARY);
                self.store_int(layout, inst.result.unwrap(), PRIMARY);
                self.emit(D::label(&end_label));
            }
            Opcode::Call => {
                // Indirect calls carry the callee pointer as operands[0],
                // with the true arguments in operands[1..]; direct calls
                // have no callee operand, so all of operands[..] are
                // arguments.
                let args = if inst.callee_name.is_none() { &inst.operands[1..] } else { &inst.operands[..] };
                let mut arg_regs = Vec::new();
                for &arg in args.iter().rev() {
                    self.load_int(module, layout, arg, SECONDARY);
                    self.emit(D::one("push", &Operand::Reg(SECONDARY)));
                    arg_regs.push(arg);
                }
                match &inst.callee_name {
                    Some(name) => self.emit(D::one("call", &Operand::Label(name.clone()))),
                    None => {
                        self.load_int(module, layout, inst.operands[0], PRIMARY);
                        self.emit(D::one("call", &Operand::Reg(PRIMARY)));
                    }
                }
                if !arg_regs.is_empty() {
                    self.emit(D::two("add", &Operand::Reg(STACK), &Operand::Imm(4 * arg_regs.len() as i64)));
                }
                if let Some(result) = inst.result {
                    self.store_int(layout, result, PRIMARY);
                }
            }
            Opcode::Br => {
                let target = inst.successors[0].expect("br has a target");
                self.emit(D::one("jmp", &Operand::Label(Self::block_label(func, module, target))));
            }
            Opcode::BrCond => {
                self.load_int(module, layout, inst.operands[0], PRIMARY);
                self.emit(D::two("test", &Operand::Reg(PRIMARY), &Operand::Reg(PRIMARY)));
                let then_blk = inst.successors[0].expect("br_cond has a then target");
                let else_blk = inst.successors[1].expect("br_cond has an else target");
                self.emit(D::one("jnz", &Operand::Label(Self::block_label(func, module, then_blk))));
                self.emit(D::one("jmp", &Operand::Label(Self::block_label(func, module, else_blk))));
            }
            Opcode::Ret => {
                if let Some(&value) = inst.operands.first() {
                    if module.value(value).ty.is_float() {
                        self.load_float(module, layout, value, PRIMARY_F);
                    } else {
                        self.load_int(module, layout, value, PRIMARY);
                    }
                }
                self.emit(D::one("jmp", &Operand::Label(format!("{}.epilogue", func.name))));
            }
            Opcode::Phi | Opcode::Nop => unreachable!("handled above"),
        }
        Ok(())
    }

    fn lower_function(&mut self, module: &Module, func_id: FunctionId) -> McResult<()> {
        let func = module.function(func_id);
        if func.is_declaration {
            self.emit(D::global_directive(&func.name));
            return Ok(());
        }
        if module.validate_function(func_id).is_err() {
            return Err(McError::codegen(format!("function {} failed block-shape validation", func.name)));
        }

        let layout = frame::materialize(module, func, POINTER_SIZE, STACK_ALIGN, 0);

        self.emit(D::global_directive(&func.name));
        self.emit(D::label(&func.name));
        self.emit(D::one("push", &Operand::Reg(BASE)));
        self.emit(D::two("mov", &Operand::Reg(BASE), &Operand::Reg(STACK)));
        if layout.frame_size > 0 {
            self.emit(D::two("sub", &Operand::Reg(STACK), &Operand::Imm(layout.frame_size as i64)));
        }
        // cdecl: incoming args sit above the saved return address and
        // saved base pointer, at increasing positive offsets from ebp;
        // copy each into its own spill slot so every later load goes
        // through the uniform `value_offsets` path.
        for (i, &param) in func.params.iter().enumerate() {
            let incoming_offset = 8 + 4 * i as i32;
            self.emit(D::two("mov", &Operand::Reg(PRIMARY), &Operand::Mem { base: BASE, offset: incoming_offset }));
            self.store_int(&layout, param, PRIMARY);
        }

        for (i, &block_id) in func.blocks.iter().enumerate() {
            if i > 0 {
                self.emit(D::label(&Self::block_label(func, module, block_id)));
            }
            let inst_ids: Vec<InstId> = module.block(block_id).instructions.clone();
            for inst_id in inst_ids {
                self.lower_instruction(module, func, &layout, inst_id)?;
            }
        }

        self.emit(D::label(&format!("{}.epilogue", func.name)));
        self.emit(D::two("mov", &Operand::Reg(STACK), &Operand::Reg(BASE)));
        self.emit(D::one("pop", &Operand::Reg(BASE)));
        self.emit(D::zero("ret"));
        Ok(())
    }

    fn emit_data_section(&mut self) {
        if self.strings.is_empty() && self.float_pool.is_empty() {
            return;
        }
        self.emit(D::data_section().to_string());
        for (label, content) in self.strings.entries().to_vec() {
            self.emit(D::ascii_entry(&label, &content));
        }
        for (label, bits, is_f64) in self.float_pool.clone() {
            self.emit(D::float_entry(&label, bits, is_f64));
        }
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
        self.strings.clear();
        self.float_pool.clear();
    }

    pub fn codegen_func(&mut self, module: &Module, function: FunctionId) -> McResult<String> {
        self.buffer.clear();
        self.emit(D::text_section().to_string());
        self.lower_function(module, function)?;
        self.emit_data_section();
        Ok(std::mem::take(&mut self.buffer))
    }

    pub fn codegen_module(&mut self, module: &Module) -> McResult<String> {
        self.buffer.clear();
        self.emit(D::text_section().to_string());
        let function_ids: Vec<FunctionId> = module.functions().map(|(id, _)| id).collect();
        for function in function_ids {
            self.lower_function(module, function)?;
        }
        self.emit_data_section();
        Ok(std::mem::take(&mut self.buffer))
    }

    pub fn arch_info(name: &'static str) -> ArchInfo {
        ArchInfo {
            name,
            pointer_size: POINTER_SIZE,
            word_size: POINTER_SIZE,
            gpr_count: 6,
            fpr_count: 8,
            endianness: Endianness::Little,
            stack_grows_down: true,
            has_condition_codes: true,
            has_delay_slots: false,
        }
    }

}
