//! Opcodes and instruction storage (the "IR instruction", the builder
//! contract).

use crate::ty::IrType;
use crate::{BlockId, ValueId};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Opcode {
    // Integer arithmetic.
    Add,
    Sub,
    Mul,
    Sdiv,
    Udiv,
    Smod,
    Umod,
    Neg,
    And,
    Or,
    Xor,
    Not,
    Shl,
    Shr,
    Sar,
    // Memory.
    Alloca,
    Load,
    Store,
    Gep,
    StructGep,
    // Control flow.
    Br,
    BrCond,
    Ret,
    Call,
    // Integer comparisons (signed and unsigned).
    CmpEq,
    CmpNe,
    CmpSlt,
    CmpSle,
    CmpSgt,
    CmpSge,
    CmpUlt,
    CmpUle,
    CmpUgt,
    CmpUge,
    // Conversions.
    Trunc,
    Zext,
    Sext,
    Bitcast,
    Ptrtoint,
    Inttoptr,
    // Floating point.
    Fadd,
    Fsub,
    Fmul,
    Fdiv,
    Fneg,
    Fabs,
    FcmpOeq,
    FcmpOne,
    FcmpOlt,
    FcmpOle,
    FcmpOgt,
    FcmpOge,
    // FP conversions.
    Sitofp,
    Uitofp,
    Fptosi,
    Fptoui,
    Fpext,
    Fptrunc,
    Phi,
    Select,
    Nop,
}

impl Opcode {
    pub fn is_terminator(self) -> bool {
        matches!(self, Opcode::Br | Opcode::BrCond | Opcode::Ret)
    }

    pub fn is_phi(self) -> bool {
        matches!(self, Opcode::Phi)
    }

    pub fn is_commutative(self) -> bool {
        matches!(
            self,
            Opcode::Add
                | Opcode::Mul
                | Opcode::And
                | Opcode::Or
                | Opcode::Xor
                | Opcode::CmpEq
                | Opcode::CmpNe
                | Opcode::Fadd
                | Opcode::Fmul
        )
    }
}

/// One instruction, owned by exactly one block. Branch targets live in
/// `successors`; PHI's parallel incoming-value/predecessor-block arrays
/// live in `phi_incoming` alongside the ordinary `operands` list (the
/// incoming values are *also* mirrored into `operands` so generic operand-
/// rewriting passes — constant folding's substitution, the unroller's
/// remapping — see every use site without special-casing PHI).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instruction {
    pub opcode: Opcode,
    pub operands: SmallVec<[ValueId; 2]>,
    pub result: Option<ValueId>,
    pub successors: [Option<BlockId>; 2],
    pub phi_incoming: Vec<(ValueId, BlockId)>,
    /// `Some(name)` for a direct `CALL`'s callee; indirect calls instead
    /// carry the callee as `operands[0]`.
    pub callee_name: Option<String>,
    /// For `ALLOCA`: the type of the object being allocated (the result is
    /// always a `Ptr` to it, so this is the only place its size/alignment
    /// survives for the backend's stack-slot materialization).
    pub alloca_ty: Option<IrType>,
}

impl Instruction {
    pub fn new(opcode: Opcode) -> Self {
        Self {
            opcode,
            operands: SmallVec::new(),
            result: None,
            successors: [None, None],
            phi_incoming: Vec::new(),
            callee_name: None,
            alloca_ty: None,
        }
    }
}
