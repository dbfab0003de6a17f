//! Constant folding with algebraic identities.
//!
//! For every instruction with constant operands, evaluates the operation
//! and replaces all uses of the result with the computed constant, marking
//! the original as a NOP. Also applies identities that only need *one*
//! constant operand (`x+0=x`, `x*0=0`, ...) and a handful that need no
//! constant at all but rely on operand identity (`x-x=0`, `x^x=0`,
//! `x cmp x`).

use anvil_ir::{Instruction, IrType, Module, Opcode, ValueId, ValueKind};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Const {
    Int(i64),
    Float(f64),
}

fn as_const(module: &Module, v: ValueId) -> Option<Const> {
    match &module.value(v).kind {
        ValueKind::ConstantInt(i) => Some(Const::Int(*i)),
        ValueKind::ConstantFloat(f) => Some(Const::Float(*f)),
        _ => None,
    }
}

/// Truncates a wrapping-arithmetic result to the bit width of `ty`, sign- or
/// zero-extending back to `i64` storage as appropriate. Signed types keep
/// the two's-complement sign bit; this matters for `SAR`/`SDIV` results.
fn truncate_signed(ty: &IrType, v: i64) -> i64 {
    match ty {
        IrType::I1 => (v & 1) as i64,
        IrType::I8 => v as i8 as i64,
        IrType::I16 => v as i16 as i64,
        IrType::I32 => v as i32 as i64,
        IrType::I64 => v,
        _ => v,
    }
}

fn truncate_unsigned(ty: &IrType, v: i64) -> i64 {
    match ty {
        IrType::I1 => (v & 1) as i64,
        IrType::I8 => (v as u8) as i64,
        IrType::I16 => (v as u16) as i64,
        IrType::I32 => (v as u32) as i64,
        IrType::I64 => v,
        _ => v,
    }
}

/// Evaluates a binary integer opcode on two constant `i64` payloads,
/// interpreting them per the instruction's own opcode (signed vs. unsigned)
/// and width (the instruction's result type). Division/modulo by zero
/// return `None` rather than invent a sentinel for *integer* div-by-zero —
/// only the floating-point path defines one, matching the sibling rule for
/// `#if`, where division by zero is diagnosed rather than treated as
/// undefined behavior.
fn eval_int_binary(op: Opcode, ty: &IrType, a: i64, b: i64) -> Option<i64> {
    let r = match op {
        Opcode::Add => a.wrapping_add(b),
        Opcode::Sub => a.wrapping_sub(b),
        Opcode::Mul => a.wrapping_mul(b),
        Opcode::Sdiv => {
            if b == 0 {
                return None;
            }
            a.wrapping_div(b)
        }
        Opcode::Udiv => {
            if b == 0 {
                return None;
            }
            ((a as u64).wrapping_div(b as u64)) as i64
        }
        Opcode::Smod => {
            if b == 0 {
                return None;
            }
            a.wrapping_rem(b)
        }
        Opcode::Umod => {
            if b == 0 {
                return None;
            }
            ((a as u64).wrapping_rem(b as u64)) as i64
        }
        Opcode::And => a & b,
        Opcode::Or => a | b,
        Opcode::Xor => a ^ b,
        Opcode::Shl => a.wrapping_shl(b as u32),
        Opcode::Shr => ((a as u64).wrapping_shr(b as u32)) as i64,
        Opcode::Sar => a.wrapping_shr(b as u32),
        Opcode::CmpEq => (a == b) as i64,
        Opcode::CmpNe => (a != b) as i64,
        Opcode::CmpSlt => (a < b) as i64,
        Opcode::CmpSle => (a <= b) as i64,
        Opcode::CmpSgt => (a > b) as i64,
        Opcode::CmpSge => (a >= b) as i64,
        Opcode::CmpUlt => ((a as u64) < (b as u64)) as i64,
        Opcode::CmpUle => ((a as u64) <= (b as u64)) as i64,
        Opcode::CmpUgt => ((a as u64) > (b as u64)) as i64,
        Opcode::CmpUge => ((a as u64) >= (b as u64)) as i64,
        _ => return None,
    };
    let is_cmp = matches!(
        op,
        Opcode::CmpEq
            | Opcode::CmpNe
            | Opcode::CmpSlt
            | Opcode::CmpSle
            | Opcode::CmpSgt
            | Opcode::CmpSge
            | Opcode::CmpUlt
            | Opcode::CmpUle
            | Opcode::CmpUgt
            | Opcode::CmpUge
    );
    if is_cmp {
        return Some(r & 1);
    }
    let is_unsigned_result = matches!(op, Opcode::Udiv | Opcode::Umod | Opcode::Shr);
    Some(if is_unsigned_result { truncate_unsigned(ty, r) } else { truncate_signed(ty, r) })
}

/// Evaluates a binary float opcode. Division by zero yields the
/// all-zero-operands sentinel (`0.0`) rather than propagating IEEE-754
/// infinity/NaN, keeping the pass conservative.
fn eval_float_binary(op: Opcode, a: f64, b: f64) -> Option<f64> {
    Some(match op {
        Opcode::Fadd => a + b,
        Opcode::Fsub => a - b,
        Opcode::Fmul => a * b,
        Opcode::Fdiv => {
            if b == 0.0 {
                0.0
            } else {
                a / b
            }
        }
        _ => return None,
    })
}

fn eval_float_cmp(op: Opcode, a: f64, b: f64) -> Option<i64> {
    Some(match op {
        Opcode::FcmpOeq => (a == b) as i64,
        Opcode::FcmpOne => (a != b) as i64,
        Opcode::FcmpOlt => (a < b) as i64,
        Opcode::FcmpOle => (a <= b) as i64,
        Opcode::FcmpOgt => (a > b) as i64,
        Opcode::FcmpOge => (a >= b) as i64,
        _ => return None,
    })
}

fn eval_unary(op: Opcode, ty: &IrType, operand: Const) -> Option<Const> {
    match (op, operand) {
        (Opcode::Neg, Const::Int(a)) => Some(Const::Int(truncate_signed(ty, a.wrapping_neg()))),
        (Opcode::Not, Const::Int(a)) => Some(Const::Int(truncate_unsigned(ty, !a))),
        (Opcode::Fneg, Const::Float(a)) => Some(Const::Float(-a)),
        (Opcode::Fabs, Const::Float(a)) => Some(Const::Float(a.abs())),
        _ => None,
    }
}

/// Result type's all-ones bit pattern (for the `x&-1=x`/`x|-1=-1`
/// identities, which are width-sensitive: `-1` as an `i8` is `0xFF`, not
/// `i64::MAX`).
fn all_ones(ty: &IrType) -> i64 {
    truncate_unsigned(ty, -1)
}

/// Replaces every operand reference to `old` with `new`, across every
/// instruction in every block of `function` (including PHI's mirrored
/// `phi_incoming` array), by `ValueId` equality.
fn replace_all_uses(module: &mut Module, function: anvil_ir::FunctionId, old: ValueId, new: ValueId) {
    let block_ids: Vec<_> = module.function(function).blocks.clone();
    for block_id in block_ids {
        let inst_ids: Vec<_> = module.block(block_id).instructions.clone();
        for inst_id in inst_ids {
            let inst = module.inst_mut(inst_id);
            for operand in inst.operands.iter_mut() {
                if *operand == old {
                    *operand = new;
                }
            }
            for (value, _) in inst.phi_incoming.iter_mut() {
                if *value == old {
                    *value = new;
                }
            }
        }
    }
}

/// Attempts to fold or identity-simplify one instruction, returning the
/// `ValueId` its result should be replaced with. Does not mutate the
/// instruction itself — the caller marks it `Nop` and rewires uses.
fn try_fold(module: &mut Module, inst: &Instruction) -> Option<ValueId> {
    let ty = inst.result.map(|r| module.value(r).ty.clone())?;

    // Binary arithmetic/comparison opcodes.
    if inst.operands.len() == 2 {
        let lhs = inst.operands[0];
        let rhs = inst.operands[1];
        let lc = as_const(module, lhs);
        let rc = as_const(module, rhs);

        // Full constant fold.
        if let (Some(l), Some(r)) = (lc, rc) {
            match (l, r) {
                (Const::Int(a), Const::Int(b)) => {
                    if let Some(v) = eval_int_binary(inst.opcode, &ty, a, b) {
                        return Some(module.const_int(ty, v));
                    }
                }
                (Const::Float(a), Const::Float(b)) => {
                    if let Some(v) = eval_float_binary(inst.opcode, a, b) {
                        return Some(module.const_float(ty, v));
                    }
                    if let Some(v) = eval_float_cmp(inst.opcode, a, b) {
                        return Some(module.const_int(IrType::I1, v));
                    }
                }
                _ => {}
            }
        }

        // Operand-identity rules: same ValueId on both sides, no constant
        // needed (`x-x=0`, `x^x=0`, `x&x=x`, `x|x=x`, `x cmp x`).
        if lhs == rhs {
            match inst.opcode {
                Opcode::Sub | Opcode::Xor => return Some(module.const_int(ty, 0)),
                Opcode::And | Opcode::Or => return Some(lhs),
                Opcode::CmpEq | Opcode::CmpSle | Opcode::CmpSge | Opcode::CmpUle | Opcode::CmpUge => {
                    return Some(module.const_int(IrType::I1, 1))
                }
                Opcode::CmpNe | Opcode::CmpSlt | Opcode::CmpSgt | Opcode::CmpUlt | Opcode::CmpUgt => {
                    return Some(module.const_int(IrType::I1, 0))
                }
                _ => {}
            }
        }

        // Single-constant algebraic identities.
        if let Some(Const::Int(rv)) = rc {
            match inst.opcode {
                Opcode::Add if rv == 0 => return Some(lhs),
                Opcode::Sub if rv == 0 => return Some(lhs),
                Opcode::Mul if rv == 0 => return Some(module.const_int(ty, 0)),
                Opcode::Mul if rv == 1 => return Some(lhs),
                Opcode::Sdiv | Opcode::Udiv if rv == 1 => return Some(lhs),
                Opcode::Smod | Opcode::Umod if rv == 1 => return Some(module.const_int(ty, 0)),
                Opcode::And if rv == 0 => return Some(module.const_int(ty, 0)),
                Opcode::And if rv == all_ones(&ty) => return Some(lhs),
                Opcode::Or if rv == 0 => return Some(lhs),
                Opcode::Or if rv == all_ones(&ty) => {
                    let ones = all_ones(&ty);
                    return Some(module.const_int(ty, ones));
                }
                Opcode::Shl | Opcode::Shr | Opcode::Sar if rv == 0 => return Some(lhs),
                _ => {}
            }
        }
        if let Some(Const::Int(lv)) = lc {
            match inst.opcode {
                Opcode::Add if lv == 0 => return Some(rhs),
                Opcode::Mul if lv == 0 => return Some(module.const_int(ty, 0)),
                Opcode::Mul if lv == 1 => return Some(rhs),
                Opcode::And if lv == 0 => return Some(module.const_int(ty, 0)),
                Opcode::And if lv == all_ones(&ty) => return Some(rhs),
                Opcode::Or if lv == 0 => return Some(rhs),
                Opcode::Or if lv == all_ones(&ty) => {
                    let ones = all_ones(&ty);
                    return Some(module.const_int(ty, ones));
                }
                _ => {}
            }
        }
        return None;
    }

    // Unary opcodes.
    if inst.operands.len() == 1 {
        let operand = inst.operands[0];
        if let Some(c) = as_const(module, operand) {
            if let Some(folded) = eval_unary(inst.opcode, &ty, c) {
                return Some(match folded {
                    Const::Int(v) => module.const_int(ty, v),
                    Const::Float(v) => module.const_float(ty, v),
                });
            }
        }
    }

    None
}

/// Runs the constant-folding + algebraic-identity pass once over every
/// block of `function`. Returns whether it changed anything; the pipeline
/// driver (`pipeline::run_to_fixed_point`) calls this repeatedly.
pub fn run(module: &mut Module, function: anvil_ir::FunctionId) -> bool {
    let mut changed = false;
    let block_ids: Vec<_> = module.function(function).blocks.clone();
    for block_id in block_ids {
        let inst_ids: Vec<_> = module.block(block_id).instructions.clone();
        for inst_id in inst_ids {
            let inst = module.inst(inst_id).clone();
            if inst.opcode == Opcode::Nop {
                continue;
            }
            if let Some(replacement) = try_fold(module, &inst) {
                if let Some(old_result) = inst.result {
                    if old_result != replacement {
                        log::trace!("const-fold: {:?} -> {:?}", inst.opcode, replacement);
                        replace_all_uses(module, function, old_result, replacement);
                        module.inst_mut(inst_id).opcode = Opcode::Nop;
                        module.inst_mut(inst_id).operands.clear();
                        changed = true;
                    }
                }
            }
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use anvil_ir::{Function, IrBuilder};

    fn new_function() -> (Module, anvil_ir::FunctionId, anvil_ir::BlockId) {
        let mut module = Module::new("m");
        let f = module.add_function(Function::new("f", IrType::I32, vec![]));
        let entry = module.add_block(f, "entry");
        (module, f, entry)
    }

    #[test]
    fn folds_add_of_two_constants() {
        let (mut module, f, entry) = new_function();
        let mut b = IrBuilder::new(&mut module, f, entry);
        let three = b.module().const_int(IrType::I32, 3);
        let five = b.module().const_int(IrType::I32, 5);
        let t = b.build_add(IrType::I32, three, five);
        b.build_ret(Some(t));

        let changed = run(&mut module, f);
        assert!(changed);
        let ret_inst = {
            let blk = module.block(entry);
            *blk.instructions.last().unwrap()
        };
        let ret = module.inst(ret_inst);
        assert_eq!(ret.opcode, Opcode::Ret);
        let retval = module.value(ret.operands[0]);
        assert_eq!(retval.kind, ValueKind::ConstantInt(8));
    }

    #[test]
    fn x_plus_zero_is_x_without_folding_to_constant() {
        let (mut module, f, entry) = new_function();
        let mut b = IrBuilder::new(&mut module, f, entry);
        let param = b.module().alloc_value(anvil_ir::ValueData {
            kind: ValueKind::Param(0),
            ty: IrType::I32,
            name: None,
        });
        let zero = b.module().const_int(IrType::I32, 0);
        let t = b.build_add(IrType::I32, param, zero);
        b.build_ret(Some(t));

        run(&mut module, f);
        let ret_inst = *module.block(entry).instructions.last().unwrap();
        let ret = module.inst(ret_inst);
        assert_eq!(ret.operands[0], param);
    }

    #[test]
    fn x_minus_x_is_zero() {
        let (mut module, f, entry) = new_function();
        let mut b = IrBuilder::new(&mut module, f, entry);
        let param = b.module().alloc_value(anvil_ir::ValueData {
            kind: ValueKind::Param(0),
            ty: IrType::I32,
            name: None,
        });
        let t = b.build_sub(IrType::I32, param, param);
        b.build_ret(Some(t));

        run(&mut module, f);
        let ret_inst = *module.block(entry).instructions.last().unwrap();
        let ret = module.inst(ret_inst);
        assert_eq!(module.value(ret.operands[0]).kind, ValueKind::ConstantInt(0));
    }

    #[test]
    fn integer_division_by_zero_does_not_fold() {
        let (mut module, f, entry) = new_function();
        let mut b = IrBuilder::new(&mut module, f, entry);
        let ten = b.module().const_int(IrType::I32, 10);
        let zero = b.module().const_int(IrType::I32, 0);
        let t = b.build_sdiv(IrType::I32, ten, zero);
        b.build_ret(Some(t));

        let changed = run(&mut module, f);
        assert!(!changed);
    }

    #[test]
    fn float_division_by_zero_yields_zero_sentinel() {
        let (mut module, f, entry) = new_function();
        let mut b = IrBuilder::new(&mut module, f, entry);
        let one = b.module().const_float(IrType::F64, 1.0);
        let zero = b.module().const_float(IrType::F64, 0.0);
        let inst = b.create(Opcode::Fdiv, Some(IrType::F64), None);
        b.add_operand(inst, one);
        b.add_operand(inst, zero);
        let result = b.result_of(inst).unwrap();
        b.build_ret(Some(result));

        run(&mut module, f);
        let ret_inst = *module.block(entry).instructions.last().unwrap();
        let ret = module.inst(ret_inst);
        assert_eq!(module.value(ret.operands[0]).kind, ValueKind::ConstantFloat(0.0));
    }
}
