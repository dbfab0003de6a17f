//! Stack-slot materialization: assigns every ALLOCA its frame offset and,
//! since the naive per-instruction lowering never keeps a value live in a
//! register across instructions, extends the same treatment to every other
//! SSA value with a result — each gets its own spill slot sized by its
//! type. This is the one place the backend generalizes past an alloca-only
//! reading, recorded as a judgment call in `DESIGN.md`.

use std::collections::HashMap;

use anvil_ir::{Function, InstId, IrType, Module, Opcode, ValueId};

#[derive(Debug, Clone, Default)]
pub struct FrameLayout {
    /// Frame offset (bytes, growing away from the locals base) for the
    /// pointee of an ALLOCA instruction.
    pub alloca_offsets: HashMap<InstId, u32>,
    /// Frame offset for every other value that needs a spill slot: every
    /// instruction result (including an ALLOCA's own pointer-typed result)
    /// and every function parameter.
    pub value_offsets: HashMap<ValueId, u32>,
    /// Total frame size, rounded up to `stack_align` and including
    /// `reserve`.
    pub frame_size: u32,
}

fn round_up(value: u32, align: u32) -> u32 {
    if align == 0 {
        return value;
    }
    (value + align - 1) / align * align
}

/// Walks `function`'s blocks in order and assigns each ALLOCA pointee and
/// each result-producing value a slot, growing the running offset as it
/// goes. `reserve` is a fixed amount of ABI-mandated space carved out below
/// the locals (PPC64LE ELFv2's linkage area; zero for x86).
pub fn materialize(module: &Module, function: &Function, pointer_size: u32, stack_align: u32, reserve: u32) -> FrameLayout {
    let mut layout = FrameLayout::default();
    // Locals start above `reserve` so a target with a fixed linkage area
    // (PPC64LE ELFv2's 32-byte minimum frame) can address them with
    // positive offsets from the stack pointer without colliding with the
    // reserved region; x86 passes `reserve = 0` and addresses its slots as
    // negative offsets from the frame base instead.
    let mut offset = reserve;

    let mut assign = |offset: &mut u32, ty: &IrType| -> u32 {
        let size = ty.size_of(pointer_size).max(1);
        let align = ty.align_of(pointer_size).max(1);
        *offset = round_up(*offset, align);
        *offset += size;
        *offset
    };

    for &param in &function.params {
        let ty = module.value(param).ty.clone();
        let end = assign(&mut offset, &ty);
        layout.value_offsets.insert(param, end);
    }

    for &block_id in &function.blocks {
        for &inst_id in &module.block(block_id).instructions {
            let inst = module.inst(inst_id);
            if inst.opcode == Opcode::Alloca {
                let pointee = inst.alloca_ty.clone().unwrap_or(IrType::I64);
                let end = assign(&mut offset, &pointee);
                layout.alloca_offsets.insert(inst_id, end);
            }
            if let Some(result) = inst.result {
                let ty = module.value(result).ty.clone();
                let end = assign(&mut offset, &ty);
                layout.value_offsets.insert(result, end);
            }
        }
    }

    layout.frame_size = round_up(offset, stack_align);
    layout
}

#[cfg(test)]
mod tests {
    use super::*;
    use anvil_ir::{Function as F, IrBuilder};

    #[test]
    fn alloca_and_result_slots_are_disjoint_and_growing() {
        let mut module = Module::new("m");
        let f = module.add_function(F::new("f", IrType::I32, vec![]));
        let entry = module.add_block(f, "entry");
        let mut b = IrBuilder::new(&mut module, f, entry);
        let slot = b.build_alloca(IrType::I32);
        let one = b.module().const_int(IrType::I32, 1);
        let loaded = b.build_load(IrType::I32, slot);
        let sum = b.build_add(IrType::I32, loaded, one);
        b.build_ret(Some(sum));

        let layout = materialize(&module, module.function(f), 4, 16, 0);
        let alloca_inst = module.block(entry).instructions[0];
        assert!(layout.alloca_offsets.contains_key(&alloca_inst));
        assert!(layout.value_offsets.len() >= 3, "alloca result, load result, add result all get slots");
        assert_eq!(layout.frame_size % 16, 0);
    }

    #[test]
    fn ppc_reserve_is_added_after_rounding() {
        let mut module = Module::new("m");
        let f = module.add_function(F::new("f", IrType::I32, vec![]));
        module.add_block(f, "entry");
        let layout = materialize(&module, module.function(f), 8, 16, 32);
        assert_eq!(layout.frame_size, 32);
    }
}
