//! Full loop unrolling: recognizes a canonical rotated-loop shape
//! (a header block ending in PHIs and a conditional branch, paired with a
//! latch block that computes the next iteration and branches back) and, for
//! a known trip count in `1..=8` with a body of at most 32 non-terminator,
//! non-PHI instructions, clones the body that many times into the
//! preheader and retargets control flow straight to the loop exit.
//!
//! The header/preheader/latch/exit identification locates the latch
//! (predecessor branching back to the header), the preheader (predecessor
//! that isn't the latch), and the exit (the non-loop successor).
//! Distinguishing preheader from latch among a header's two predecessors
//! needs a disambiguation rule; this implementation uses block creation
//! order (`BlockId` index) — the
//! preheader is always built before the header it falls into, and the
//! latch always after, for every loop this front end or a hand-built test
//! can produce — and documents the choice in `DESIGN.md` rather than
//! silently assuming it.

use anvil_ir::{BlockId, FunctionId, IrBuilder, Module, Opcode, ValueId};
use std::collections::HashMap;

const MAX_TRIP_COUNT: u32 = 8;
const MAX_BODY_INSTRUCTIONS: usize = 32;

fn predecessors(module: &Module, function: FunctionId) -> HashMap<BlockId, Vec<BlockId>> {
    let mut preds: HashMap<BlockId, Vec<BlockId>> = HashMap::new();
    for &block_id in &module.function(function).blocks {
        let block = module.block(block_id);
        if let Some(&last) = block.instructions.last() {
            let term = module.inst(last);
            for succ in term.successors.iter().flatten() {
                preds.entry(*succ).or_default().push(block_id);
            }
        }
    }
    preds
}

fn const_int_value(module: &Module, v: ValueId) -> Option<i64> {
    match &module.value(v).kind {
        anvil_ir::ValueKind::ConstantInt(i) => Some(*i),
        _ => None,
    }
}

/// Evaluates a comparison opcode against two plain `i64`s, matching the
/// semantics `const_fold::eval_int_binary` uses for the same opcodes.
fn eval_cmp(opcode: Opcode, a: i64, b: i64) -> Option<bool> {
    Some(match opcode {
        Opcode::CmpEq => a == b,
        Opcode::CmpNe => a != b,
        Opcode::CmpSlt => a < b,
        Opcode::CmpSle => a <= b,
        Opcode::CmpSgt => a > b,
        Opcode::CmpSge => a >= b,
        Opcode::CmpUlt => (a as u64) < (b as u64),
        Opcode::CmpUle => (a as u64) <= (b as u64),
        Opcode::CmpUgt => (a as u64) > (b as u64),
        Opcode::CmpUge => (a as u64) >= (b as u64),
        _ => return None,
    })
}

/// One header PHI's loop-carried identity: its result value, the value it
/// takes coming from the preheader (iteration-0 value), and the value it
/// takes coming from the latch (next-iteration value, expressed in terms of
/// the *current* iteration's values).
struct CarriedPhi {
    result: ValueId,
    preheader_incoming: ValueId,
    latch_incoming: ValueId,
}

struct LoopShape {
    header: BlockId,
    preheader: BlockId,
    latch: BlockId,
    exit: BlockId,
    carried: Vec<CarriedPhi>,
}

fn find_loop(module: &Module, function: FunctionId, preds: &HashMap<BlockId, Vec<BlockId>>, header: BlockId) -> Option<LoopShape> {
    let header_block = module.block(header);
    let &first_inst = header_block.instructions.first()?;
    if !module.inst(first_inst).opcode.is_phi() {
        return None;
    }
    let &last_inst = header_block.instructions.last()?;
    let term = module.inst(last_inst);
    if term.opcode != Opcode::BrCond {
        return None;
    }
    let [Some(then_blk), Some(else_blk)] = term.successors else { return None };

    let header_preds = preds.get(&header)?;
    if header_preds.len() != 2 {
        return None;
    }
    let (a, b) = (header_preds[0], header_preds[1]);
    let (preheader, latch) = if a.index() < header.index() && b.index() > header.index() {
        (a, b)
    } else if b.index() < header.index() && a.index() > header.index() {
        (b, a)
    } else {
        return None;
    };

    let exit = if then_blk == latch {
        else_blk
    } else if else_blk == latch {
        then_blk
    } else {
        return None;
    };

    let mut carried = Vec::new();
    for &inst_id in &header_block.instructions {
        let inst = module.inst(inst_id);
        if !inst.opcode.is_phi() {
            break;
        }
        let result = inst.result?;
        let preheader_incoming = inst.phi_incoming.iter().find(|(_, p)| *p == preheader)?.0;
        let latch_incoming = inst.phi_incoming.iter().find(|(_, p)| *p == latch)?.0;
        carried.push(CarriedPhi { result, preheader_incoming, latch_incoming });
    }
    if carried.is_empty() {
        return None;
    }

    let body_len = module.block(latch).instructions.len().saturating_sub(1);
    if body_len > MAX_BODY_INSTRUCTIONS {
        return None;
    }

    Some(LoopShape { header, preheader, latch, exit, carried })
}

/// Reads the induction variable's trip count from the header's terminating
/// comparison against a constant bound. The induction variable is the
/// loop's *first* PHI (`shape.carried[0]`).
fn trip_count(module: &Module, shape: &LoopShape) -> Option<u32> {
    let header_block = module.block(shape.header);
    let term_id = *header_block.instructions.last()?;
    let term = module.inst(term_id);
    let cond = term.operands.first().copied()?;
    let cond_inst_id = match &module.value(cond).kind {
        anvil_ir::ValueKind::InstResult(id) => *id,
        _ => return None,
    };
    let cmp = module.inst(cond_inst_id);
    if cmp.operands.len() != 2 {
        return None;
    }
    let iv = shape.carried[0].result;
    let (iv_side, bound_side) = if cmp.operands[0] == iv {
        (0, 1)
    } else if cmp.operands[1] == iv {
        (1, 0)
    } else {
        return None;
    };
    let bound = const_int_value(module, cmp.operands[bound_side])?;
    let init = const_int_value(module, shape.carried[0].preheader_incoming)?;

    let step = step_of(module, shape, shape.carried[0].latch_incoming, iv)?;
    if step == 0 {
        return None;
    }

    let [Some(then_blk), Some(else_blk)] = module.inst(term_id).successors else { return None };
    let continue_when_true = then_blk == shape.latch;
    let _ = else_blk;

    // `cmp.operands` may have the IV on either side; comparisons are not
    // symmetric (`a < b` vs `b < a`), so flip the opcode to a canonical
    // "iv OP bound" form before evaluating per-iteration.
    let opcode = if iv_side == 0 { cmp.opcode } else { flip(cmp.opcode)? };

    let mut cur = init;
    let mut count = 0u32;
    for _ in 0..=MAX_TRIP_COUNT + 1 {
        let cond_val = eval_cmp(opcode, cur, bound)?;
        let keep_going = if continue_when_true { cond_val } else { !cond_val };
        if !keep_going {
            return if count >= 1 && count <= MAX_TRIP_COUNT { Some(count) } else { None };
        }
        count += 1;
        cur += step;
        if count > MAX_TRIP_COUNT {
            return None;
        }
    }
    None
}

fn flip(opcode: Opcode) -> Option<Opcode> {
    Some(match opcode {
        Opcode::CmpEq => Opcode::CmpEq,
        Opcode::CmpNe => Opcode::CmpNe,
        Opcode::CmpSlt => Opcode::CmpSgt,
        Opcode::CmpSgt => Opcode::CmpSlt,
        Opcode::CmpSle => Opcode::CmpSge,
        Opcode::CmpSge => Opcode::CmpSle,
        Opcode::CmpUlt => Opcode::CmpUgt,
        Opcode::CmpUgt => Opcode::CmpUlt,
        Opcode::CmpUle => Opcode::CmpUge,
        Opcode::CmpUge => Opcode::CmpUle,
        _ => return None,
    })
}

/// The induction variable's per-iteration step: the latch-incoming value
/// must be `ADD iv, const` or `ADD const, iv` (a `SUB iv, const` is folded
/// to the `ADD` form by negating, matching `const_fold`'s own
/// algebraic-identity conventions for subtraction).
fn step_of(module: &Module, shape: &LoopShape, latch_incoming: ValueId, iv: ValueId) -> Option<i64> {
    let inst_id = match &module.value(latch_incoming).kind {
        anvil_ir::ValueKind::InstResult(id) => *id,
        _ => return None,
    };
    // Must be defined in the latch block (the only block this pass clones).
    if !module.block(shape.latch).instructions.contains(&inst_id) {
        return None;
    }
    let inst = module.inst(inst_id);
    if inst.operands.len() != 2 {
        return None;
    }
    let (lhs, rhs) = (inst.operands[0], inst.operands[1]);
    match inst.opcode {
        Opcode::Add if lhs == iv => const_int_value(module, rhs),
        Opcode::Add if rhs == iv => const_int_value(module, lhs),
        Opcode::Sub if lhs == iv => const_int_value(module, rhs).map(|v| -v),
        _ => None,
    }
}

/// Clones the latch's non-terminator instructions `trip_count` times into
/// the preheader, remapping the induction variable (and every other
/// loop-carried PHI) to its value at each iteration, then retargets the
/// preheader's branch straight to the exit.
fn unroll(module: &mut Module, function: FunctionId, shape: &LoopShape, count: u32) {
    let latch_insts: Vec<_> = module
        .block(shape.latch)
        .instructions
        .iter()
        .copied()
        .filter(|&id| !module.inst(id).opcode.is_terminator())
        .collect();

    let mut remap: HashMap<ValueId, ValueId> = HashMap::new();
    for carried in &shape.carried {
        remap.insert(carried.result, carried.preheader_incoming);
    }

    for iteration in 0..count {
        log::debug!("loop-unroll: cloning iteration {iteration} of {count} into preheader");
        let mut builder = IrBuilder::new(module, function, shape.preheader);
        let mut iter_remap: HashMap<ValueId, ValueId> = HashMap::new();
        for &inst_id in &latch_insts {
            let original = builder.module().inst(inst_id).clone();
            let remapped_operands: Vec<ValueId> = original
                .operands
                .iter()
                .map(|v| remap.get(v).copied().unwrap_or(*v))
                .collect();
            let result_ty = original.result.map(|r| builder.module().value(r).ty.clone());
            let new_inst = builder.create(original.opcode, result_ty, None);
            for v in remapped_operands {
                builder.add_operand(new_inst, v);
            }
            if original.opcode == Opcode::Alloca {
                builder.module().inst_mut(new_inst).alloca_ty = original.alloca_ty.clone();
            }
            if original.callee_name.is_some() {
                builder.module().inst_mut(new_inst).callee_name = original.callee_name.clone();
            }
            if let Some(old_result) = original.result {
                let new_result = builder.result_of(new_inst).expect("result-bearing clone keeps its result");
                iter_remap.insert(old_result, new_result);
            }
        }
        // Advance every loop-carried PHI to its value for the next
        // iteration, expressed via this iteration's freshly cloned values.
        for carried in &shape.carried {
            let next = iter_remap.get(&carried.latch_incoming).copied().unwrap_or(carried.latch_incoming);
            let next = remap.get(&next).copied().unwrap_or(next);
            remap.insert(carried.result, next);
        }
        remap.extend(iter_remap);
    }

    // Retarget the preheader's original `br header` straight to the exit.
    let preheader_term = *module.block(shape.preheader).instructions.last().expect("preheader ends in a terminator");
    let term = module.inst_mut(preheader_term);
    if term.opcode == Opcode::Br {
        term.successors[0] = Some(shape.exit);
    }
}

/// Runs the pass once over `function`. Returns whether it unrolled
/// anything.
pub fn run(module: &mut Module, function: FunctionId) -> bool {
    let preds = predecessors(module, function);
    let header_candidates: Vec<BlockId> = module.function(function).blocks.clone();
    for header in header_candidates {
        let Some(shape) = find_loop(module, function, &preds, header) else { continue };
        let Some(count) = trip_count(module, &shape) else { continue };
        log::info!("loop-unroll: fully unrolling header block with trip count {count}");
        unroll(module, function, &shape, count);
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use anvil_ir::{Function, IrType};

    /// Builds a 4-iteration counted loop: `iv` from 0, step 1, limit 4, body
    /// `s = s + iv`.
    fn build_sample_loop() -> (Module, FunctionId, BlockId, BlockId) {
        let mut module = Module::new("m");
        let f = module.add_function(Function::new("f", IrType::I32, vec![]));
        let preheader = module.add_block(f, "preheader");
        let header = module.add_block(f, "header");
        let latch = module.add_block(f, "latch");
        let exit = module.add_block(f, "exit");

        let mut b = IrBuilder::new(&mut module, f, preheader);
        let zero = b.module().const_int(IrType::I32, 0);
        b.build_br(header);

        b.set_block(header);
        let (iv_phi, iv) = b.build_phi(IrType::I32);
        let (s_phi, s) = b.build_phi(IrType::I32);
        let four = b.module().const_int(IrType::I32, 4);
        let cond = b.build_icmp(Opcode::CmpSlt, iv, four);
        b.build_br_cond(cond, latch, exit);

        b.set_block(latch);
        let s2 = b.build_add(IrType::I32, s, iv);
        let one = b.module().const_int(IrType::I32, 1);
        let iv2 = b.build_add(IrType::I32, iv, one);
        b.build_br(header);

        b.set_block(exit);
        b.build_ret(Some(s));

        b.add_phi_incoming(iv_phi, zero, preheader);
        b.add_phi_incoming(iv_phi, iv2, latch);
        b.add_phi_incoming(s_phi, zero, preheader);
        b.add_phi_incoming(s_phi, s2, latch);

        (module, f, preheader, header)
    }

    #[test]
    fn recognizes_the_sample_loop_shape() {
        let (module, f, _, header) = build_sample_loop();
        let preds = predecessors(&module, f);
        let shape = find_loop(&module, f, &preds, header).expect("loop shape recognized");
        assert_eq!(shape.carried.len(), 2);
        let count = trip_count(&module, &shape).expect("trip count resolved");
        assert_eq!(count, 4);
    }

    #[test]
    fn fully_unrolls_four_iterations_into_the_preheader() {
        let (mut module, f, preheader, _header) = build_sample_loop();
        let changed = run(&mut module, f);
        assert!(changed);

        // Four ADDs for `s` plus four ADDs for `iv` were cloned into the
        // preheader, ahead of its (retargeted) terminator.
        let preheader_block = module.block(preheader);
        let add_count = preheader_block
            .instructions
            .iter()
            .filter(|&&id| module.inst(id).opcode == Opcode::Add)
            .count();
        assert_eq!(add_count, 8);

        let term_id = *preheader_block.instructions.last().unwrap();
        let term = module.inst(term_id);
        assert_eq!(term.opcode, Opcode::Br);
    }

    #[test]
    fn does_not_unroll_when_trip_count_exceeds_the_cap() {
        let mut module = Module::new("m");
        let f = module.add_function(Function::new("f", IrType::I32, vec![]));
        let preheader = module.add_block(f, "preheader");
        let header = module.add_block(f, "header");
        let latch = module.add_block(f, "latch");
        let exit = module.add_block(f, "exit");

        let mut b = IrBuilder::new(&mut module, f, preheader);
        let zero = b.module().const_int(IrType::I32, 0);
        b.build_br(header);

        b.set_block(header);
        let (iv_phi, iv) = b.build_phi(IrType::I32);
        let hundred = b.module().const_int(IrType::I32, 100);
        let cond = b.build_icmp(Opcode::CmpSlt, iv, hundred);
        b.build_br_cond(cond, latch, exit);

        b.set_block(latch);
        let one = b.module().const_int(IrType::I32, 1);
        let iv2 = b.build_add(IrType::I32, iv, one);
        b.build_br(header);

        b.set_block(exit);
        b.build_ret(None);

        b.add_phi_incoming(iv_phi, zero, preheader);
        b.add_phi_incoming(iv_phi, iv2, latch);

        assert!(!run(&mut module, f));
    }
}
