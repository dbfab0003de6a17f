//! The fixed-point pipeline driver: runs
//! constant-folding, strength-reduction and loop-unrolling over a function
//! in that order, looping while any pass reports a mutation, capped at a
//! configurable iteration count (default 32) to guard against a pass pair
//! that never settles — hitting the cap is logged at `warn`, not treated as
//! an error: macro expansion's hide-set mechanism bounds *its* termination
//! structurally, but nothing analogous bounds a pass pair that keeps
//! undoing each other's work here, hence the explicit cap.

use anvil_ir::{FunctionId, Module};

const DEFAULT_MAX_ITERATIONS: u32 = 32;

/// Runs the three passes to a fixed point over every non-declaration
/// function in `module`. Returns the total number of pass-iterations that
/// reported a change, across all functions (mostly useful for tests and
/// logging, not a semantically meaningful count on its own).
pub fn run_to_fixed_point(module: &mut Module) -> u32 {
    run_to_fixed_point_capped(module, DEFAULT_MAX_ITERATIONS)
}

pub fn run_to_fixed_point_capped(module: &mut Module, max_iterations: u32) -> u32 {
    let function_ids: Vec<FunctionId> = module.functions().map(|(id, _)| id).collect();
    let mut total_changes = 0;
    for function in function_ids {
        if module.function(function).is_declaration {
            continue;
        }
        let mut iterations = 0;
        loop {
            let mut changed = false;
            changed |= crate::const_fold::run(module, function);
            changed |= crate::strength_reduction::run(module, function);
            changed |= crate::loop_unroll::run(module, function);
            if changed {
                total_changes += 1;
            }
            iterations += 1;
            if !changed {
                log::debug!("optimizer: {} reached a fixed point after {} iterations", module.function(function).name, iterations);
                break;
            }
            if iterations >= max_iterations {
                log::warn!(
                    "optimizer: {} did not reach a fixed point within {} iterations, stopping",
                    module.function(function).name,
                    max_iterations
                );
                break;
            }
        }
    }
    total_changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use anvil_ir::{Function, IrBuilder, IrType, Opcode, ValueKind};

    #[test]
    fn pipeline_folds_then_strength_reduces_in_one_run() {
        let mut module = Module::new("m");
        let f = module.add_function(Function::new("f", IrType::I32, vec![]));
        let entry = module.add_block(f, "entry");
        let mut b = IrBuilder::new(&mut module, f, entry);
        // (2 + 2) * x  ->  const-fold 2+2=4, then strength-reduce *4 -> shl 2.
        let two_a = b.module().const_int(IrType::I32, 2);
        let two_b = b.module().const_int(IrType::I32, 2);
        let sum = b.build_add(IrType::I32, two_a, two_b);
        let x = b.module().alloc_value(anvil_ir::ValueData {
            kind: ValueKind::Param(0),
            ty: IrType::I32,
            name: None,
        });
        let product = b.build_mul(IrType::I32, x, sum);
        b.build_ret(Some(product));

        run_to_fixed_point(&mut module);

        let mul_inst_id = module
            .block(entry)
            .instructions
            .iter()
            .copied()
            .find(|&id| module.inst(id).opcode == Opcode::Shl)
            .expect("mul by folded constant 4 became a shift");
        let shift_amount = module.inst(mul_inst_id).operands[1];
        assert_eq!(module.value(shift_amount).kind, ValueKind::ConstantInt(2));
    }

    #[test]
    fn declarations_are_skipped() {
        let mut module = Module::new("m");
        let f = module.add_function(Function::new("extern_fn", IrType::Void, vec![]));
        module.function_mut(f).is_declaration = true;
        // Should not panic despite having no blocks.
        assert_eq!(run_to_fixed_point(&mut module), 0);
    }
}
