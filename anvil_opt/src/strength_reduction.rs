//! Strength reduction: `MUL x, 2^n -> SHL x, n`, `UDIV x, 2^n -> SHR
//! x, n`, `UMOD x, 2^n -> AND x, (2^n - 1)`. Signed division/modulo by a
//! power of two are deliberately *not* rewritten, since the correct
//! transformation needs a sign-correction sequence this naive lowering has
//! no room for (see `DESIGN.md`).

use anvil_ir::{FunctionId, Module, Opcode, ValueKind};

/// `Some(n)` if `v` is a power of two `2^n` with `n >= 1` (rewriting by
/// `n == 0` would replace a multiply/divide by one with a shift by zero —
/// correct, but already handled more cheaply by constant folding's
/// algebraic identities, so strength reduction only fires for `n >= 1`).
fn power_of_two_exponent(v: i64) -> Option<u32> {
    if v <= 0 {
        return None;
    }
    let v = v as u64;
    if v.is_power_of_two() {
        Some(v.trailing_zeros())
    } else {
        None
    }
}

/// Runs the pass once over every block of `function`. Returns whether it
/// rewrote anything.
pub fn run(module: &mut Module, function: FunctionId) -> bool {
    let mut changed = false;
    let block_ids: Vec<_> = module.function(function).blocks.clone();
    for block_id in block_ids {
        let inst_ids: Vec<_> = module.block(block_id).instructions.clone();
        for inst_id in inst_ids {
            let inst = module.inst(inst_id).clone();
            if inst.operands.len() != 2 {
                continue;
            }
            let rhs = inst.operands[1];
            let rhs_const = match &module.value(rhs).kind {
                ValueKind::ConstantInt(v) => Some(*v),
                _ => None,
            };
            let Some(rhs_val) = rhs_const else { continue };
            let Some(ty) = inst.result.map(|r| module.value(r).ty.clone()) else { continue };

            let rewrite = match inst.opcode {
                Opcode::Mul => power_of_two_exponent(rhs_val).map(|n| (Opcode::Shl, module.const_int(ty.clone(), n as i64))),
                Opcode::Udiv => power_of_two_exponent(rhs_val).map(|n| (Opcode::Shr, module.const_int(ty.clone(), n as i64))),
                Opcode::Umod => {
                    power_of_two_exponent(rhs_val).map(|n| (Opcode::And, module.const_int(ty.clone(), rhs_val - 1)))
                }
                _ => None,
            };

            if let Some((new_opcode, new_rhs)) = rewrite {
                log::debug!("strength-reduction: {:?} by {} -> {:?}", inst.opcode, rhs_val, new_opcode);
                let lhs = inst.operands[0];
                let stored = module.inst_mut(inst_id);
                stored.opcode = new_opcode;
                stored.operands.clear();
                stored.operands.push(lhs);
                stored.operands.push(new_rhs);
                changed = true;
            }
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use anvil_ir::{Function, IrBuilder, IrType};

    fn new_function() -> (Module, FunctionId, anvil_ir::BlockId) {
        let mut module = Module::new("m");
        let f = module.add_function(Function::new("f", IrType::I32, vec![]));
        let entry = module.add_block(f, "entry");
        (module, f, entry)
    }

    #[test]
    fn mul_by_power_of_two_becomes_shift_left() {
        let (mut module, f, entry) = new_function();
        let mut b = IrBuilder::new(&mut module, f, entry);
        let param = b.module().alloc_value(anvil_ir::ValueData {
            kind: ValueKind::Param(0),
            ty: IrType::I32,
            name: None,
        });
        let sixteen = b.module().const_int(IrType::I32, 16);
        let t = b.build_mul(IrType::I32, param, sixteen);
        b.build_ret(Some(t));

        assert!(run(&mut module, f));
        let mul_inst = module.block(entry).instructions[0];
        let inst = module.inst(mul_inst);
        assert_eq!(inst.opcode, Opcode::Shl);
        assert_eq!(module.value(inst.operands[1]).kind, ValueKind::ConstantInt(4));
    }

    #[test]
    fn udiv_by_power_of_two_becomes_shift_right() {
        let (mut module, f, entry) = new_function();
        let mut b = IrBuilder::new(&mut module, f, entry);
        let param = b.module().alloc_value(anvil_ir::ValueData {
            kind: ValueKind::Param(0),
            ty: IrType::I32,
            name: None,
        });
        let eight = b.module().const_int(IrType::I32, 8);
        let t = b.build_udiv(IrType::I32, param, eight);
        b.build_ret(Some(t));

        assert!(run(&mut module, f));
        let div_inst = module.block(entry).instructions[0];
        assert_eq!(module.inst(div_inst).opcode, Opcode::Shr);
    }

    #[test]
    fn umod_by_power_of_two_becomes_and_mask() {
        let (mut module, f, entry) = new_function();
        let mut b = IrBuilder::new(&mut module, f, entry);
        let param = b.module().alloc_value(anvil_ir::ValueData {
            kind: ValueKind::Param(0),
            ty: IrType::I32,
            name: None,
        });
        let eight = b.module().const_int(IrType::I32, 8);
        let t = b.build_umod(IrType::I32, param, eight);
        b.build_ret(Some(t));

        assert!(run(&mut module, f));
        let mod_inst = module.block(entry).instructions[0];
        let inst = module.inst(mod_inst);
        assert_eq!(inst.opcode, Opcode::And);
        assert_eq!(module.value(inst.operands[1]).kind, ValueKind::ConstantInt(7));
    }

    #[test]
    fn signed_division_by_power_of_two_is_left_alone() {
        let (mut module, f, entry) = new_function();
        let mut b = IrBuilder::new(&mut module, f, entry);
        let param = b.module().alloc_value(anvil_ir::ValueData {
            kind: ValueKind::Param(0),
            ty: IrType::I32,
            name: None,
        });
        let eight = b.module().const_int(IrType::I32, 8);
        let t = b.build_sdiv(IrType::I32, param, eight);
        b.build_ret(Some(t));

        assert!(!run(&mut module, f));
        let div_inst = module.block(entry).instructions[0];
        assert_eq!(module.inst(div_inst).opcode, Opcode::Sdiv);
    }
}
