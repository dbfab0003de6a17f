//! The instruction builder: `create`/`add_operand` exactly as
//! specified, plus convenience constructors that are pure sugar over them
//! (they add no semantics of their own — every one of them bottoms out in
//! `create`/`add_operand`/`set_successor`/`add_phi_incoming`).

use crate::instruction::{Instruction, Opcode};
use crate::module::Module;
use crate::ty::IrType;
use crate::value::{ValueData, ValueKind};
use crate::{BlockId, FunctionId, InstId, ValueId};

pub struct IrBuilder<'m> {
    module: &'m mut Module,
    function: FunctionId,
    block: BlockId,
}

impl<'m> IrBuilder<'m> {
    pub fn new(module: &'m mut Module, function: FunctionId, block: BlockId) -> Self {
        Self { module, function, block }
    }

    pub fn function(&self) -> FunctionId {
        self.function
    }

    pub fn module(&mut self) -> &mut Module {
        self.module
    }

    /// Shared-reference view of the module for read-only queries (e.g.
    /// checking whether the current block already ends in a terminator)
    /// where a caller only has `&self`.
    pub fn module_shared(&self) -> &Module {
        self.module
    }

    pub fn set_block(&mut self, block: BlockId) {
        self.block = block;
    }

    pub fn current_block(&self) -> BlockId {
        self.block
    }

    /// Appends a fresh, operand-less instruction to the current block. If
    /// `result_ty` is `Some`, allocates the matching `InstResult` value and
    /// wires it as the instruction's result.
    pub fn create(&mut self, opcode: Opcode, result_ty: Option<IrType>, name: Option<String>) -> InstId {
        let inst_id = self.module.alloc_inst(Instruction::new(opcode));
        if let Some(ty) = result_ty {
            let value = self.module.alloc_value(ValueData { kind: ValueKind::InstResult(inst_id), ty, name });
            self.module.inst_mut(inst_id).result = Some(value);
        }
        self.module.block_mut(self.block).instructions.push(inst_id);
        inst_id
    }

    pub fn add_operand(&mut self, inst: InstId, val: ValueId) {
        self.module.inst_mut(inst).operands.push(val);
    }

    pub fn set_successor(&mut self, inst: InstId, slot: usize, target: BlockId) {
        self.module.inst_mut(inst).successors[slot] = Some(target);
    }

    pub fn add_phi_incoming(&mut self, inst: InstId, value: ValueId, predecessor: BlockId) {
        let data = self.module.inst_mut(inst);
        data.phi_incoming.push((value, predecessor));
        data.operands.push(value);
    }

    pub fn result_of(&self, inst: InstId) -> Option<ValueId> {
        self.module.inst(inst).result
    }

    // -- convenience constructors -----------------------------------------

    fn binary(&mut self, opcode: Opcode, ty: IrType, lhs: ValueId, rhs: ValueId) -> ValueId {
        let inst = self.create(opcode, Some(ty), None);
        self.add_operand(inst, lhs);
        self.add_operand(inst, rhs);
        self.result_of(inst).expect("binary op always produces a result")
    }

    pub fn build_add(&mut self, ty: IrType, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.binary(Opcode::Add, ty, lhs, rhs)
    }
    pub fn build_sub(&mut self, ty: IrType, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.binary(Opcode::Sub, ty, lhs, rhs)
    }
    pub fn build_mul(&mut self, ty: IrType, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.binary(Opcode::Mul, ty, lhs, rhs)
    }
    pub fn build_udiv(&mut self, ty: IrType, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.binary(Opcode::Udiv, ty, lhs, rhs)
    }
    pub fn build_sdiv(&mut self, ty: IrType, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.binary(Opcode::Sdiv, ty, lhs, rhs)
    }
    pub fn build_umod(&mut self, ty: IrType, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.binary(Opcode::Umod, ty, lhs, rhs)
    }
    pub fn build_smod(&mut self, ty: IrType, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.binary(Opcode::Smod, ty, lhs, rhs)
    }
    pub fn build_and(&mut self, ty: IrType, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.binary(Opcode::And, ty, lhs, rhs)
    }
    pub fn build_or(&mut self, ty: IrType, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.binary(Opcode::Or, ty, lhs, rhs)
    }
    pub fn build_xor(&mut self, ty: IrType, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.binary(Opcode::Xor, ty, lhs, rhs)
    }
    pub fn build_shl(&mut self, ty: IrType, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.binary(Opcode::Shl, ty, lhs, rhs)
    }
    pub fn build_shr(&mut self, ty: IrType, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.binary(Opcode::Shr, ty, lhs, rhs)
    }
    pub fn build_sar(&mut self, ty: IrType, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.binary(Opcode::Sar, ty, lhs, rhs)
    }

    pub fn build_icmp(&mut self, opcode: Opcode, lhs: ValueId, rhs: ValueId) -> ValueId {
        debug_assert!(matches!(
            opcode,
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
        ));
        self.binary(opcode, IrType::I1, lhs, rhs)
    }

    pub fn build_neg(&mut self, ty: IrType, operand: ValueId) -> ValueId {
        let inst = self.create(Opcode::Neg, Some(ty), None);
        self.add_operand(inst, operand);
        self.result_of(inst).unwrap()
    }

    pub fn build_not(&mut self, ty: IrType, operand: ValueId) -> ValueId {
        let inst = self.create(Opcode::Not, Some(ty), None);
        self.add_operand(inst, operand);
        self.result_of(inst).unwrap()
    }

    pub fn build_alloca(&mut self, ty: IrType) -> ValueId {
        let inst = self.create(Opcode::Alloca, Some(IrType::Ptr), None);
        self.module.inst_mut(inst).alloca_ty = Some(ty);
        self.result_of(inst).unwrap()
    }

    pub fn build_load(&mut self, ty: IrType, ptr: ValueId) -> ValueId {
        let inst = self.create(Opcode::Load, Some(ty), None);
        self.add_operand(inst, ptr);
        self.result_of(inst).unwrap()
    }

    pub fn build_store(&mut self, ptr: ValueId, value: ValueId) -> InstId {
        let inst = self.create(Opcode::Store, None, None);
        self.add_operand(inst, ptr);
        self.add_operand(inst, value);
        inst
    }

    pub fn build_gep(&mut self, ptr: ValueId, index: ValueId) -> ValueId {
        let inst = self.create(Opcode::Gep, Some(IrType::Ptr), None);
        self.add_operand(inst, ptr);
        self.add_operand(inst, index);
        self.result_of(inst).unwrap()
    }

    pub fn build_br(&mut self, target: BlockId) -> InstId {
        let inst = self.create(Opcode::Br, None, None);
        self.set_successor(inst, 0, target);
        inst
    }

    pub fn build_br_cond(&mut self, cond: ValueId, then_blk: BlockId, else_blk: BlockId) -> InstId {
        let inst = self.create(Opcode::BrCond, None, None);
        self.add_operand(inst, cond);
        self.set_successor(inst, 0, then_blk);
        self.set_successor(inst, 1, else_blk);
        inst
    }

    pub fn build_ret(&mut self, value: Option<ValueId>) -> InstId {
        let inst = self.create(Opcode::Ret, None, None);
        if let Some(v) = value {
            self.add_operand(inst, v);
        }
        inst
    }

    pub fn build_call(
        &mut self,
        callee: impl Into<String>,
        args: &[ValueId],
        ret_ty: IrType,
    ) -> Option<ValueId> {
        let has_result = !matches!(ret_ty, IrType::Void);
        let inst = self.create(Opcode::Call, has_result.then_some(ret_ty), None);
        self.module.inst_mut(inst).callee_name = Some(callee.into());
        for &arg in args {
            self.add_operand(inst, arg);
        }
        self.result_of(inst)
    }

    /// Creates a PHI with no incoming pairs yet; call [`Self::add_phi_incoming`]
    /// once per predecessor. PHIs must be inserted at the block head by the
    /// caller — the builder doesn't reorder, so keeping PHIs contiguous at
    /// the head is the caller's responsibility, upheld by emitting PHIs
    /// before anything else in a block.
    pub fn build_phi(&mut self, ty: IrType) -> (InstId, ValueId) {
        let inst = self.create(Opcode::Phi, Some(ty), None);
        (inst, self.result_of(inst).unwrap())
    }

    pub fn build_select(&mut self, ty: IrType, cond: ValueId, if_true: ValueId, if_false: ValueId) -> ValueId {
        let inst = self.create(Opcode::Select, Some(ty), None);
        self.add_operand(inst, cond);
        self.add_operand(inst, if_true);
        self.add_operand(inst, if_false);
        self.result_of(inst).unwrap()
    }

    pub fn build_cast(&mut self, opcode: Opcode, ty: IrType, operand: ValueId) -> ValueId {
        let inst = self.create(opcode, Some(ty), None);
        self.add_operand(inst, operand);
        self.result_of(inst).unwrap()
    }

    /// Two-operand form of [`Self::build_cast`]: any opcode that takes two
    /// operands and produces a typed result but isn't one of the named
    /// `build_*` arithmetic helpers above (floating-point arithmetic and
    /// `FCMP` variants, both keyed by a caller-supplied `Opcode`).
    pub fn build_cast2(&mut self, opcode: Opcode, ty: IrType, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.binary(opcode, ty, lhs, rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::Function;

    #[test]
    fn phi_carries_parallel_incoming_arrays() {
        let mut module = Module::new("m");
        let f = module.add_function(Function::new("f", IrType::I32, vec![]));
        let entry = module.add_block(f, "entry");
        let then_blk = module.add_block(f, "then");
        let else_blk = module.add_block(f, "else");
        let join = module.add_block(f, "join");

        let mut b = IrBuilder::new(&mut module, f, entry);
        let cond = b.module().const_int(IrType::I1, 1);
        b.build_br_cond(cond, then_blk, else_blk);

        b.set_block(then_blk);
        let one = b.module().const_int(IrType::I32, 1);
        b.build_br(join);

        b.set_block(else_blk);
        let two = b.module().const_int(IrType::I32, 2);
        b.build_br(join);

        b.set_block(join);
        let (phi_inst, phi_val) = b.build_phi(IrType::I32);
        b.add_phi_incoming(phi_inst, one, then_blk);
        b.add_phi_incoming(phi_inst, two, else_blk);
        b.build_ret(Some(phi_val));

        let stored = module.inst(phi_inst);
        assert_eq!(stored.phi_incoming.len(), 2);
        assert_eq!(stored.operands.len(), 2, "phi incoming values mirror into operands");
    }

    #[test]
    fn call_with_void_return_has_no_result() {
        let mut module = Module::new("m");
        let f = module.add_function(Function::new("f", IrType::Void, vec![]));
        let entry = module.add_block(f, "entry");
        let mut b = IrBuilder::new(&mut module, f, entry);
        let result = b.build_call("puts", &[], IrType::Void);
        assert!(result.is_none());
    }
}
