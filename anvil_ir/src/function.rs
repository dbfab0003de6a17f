//! IR functions: name, signature, parameter values, ordered block list
//! (first is entry), a backend-computed stack size, and a declaration flag
//! for external symbols.

use crate::ty::IrType;
use crate::{BlockId, ValueId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub ret_ty: IrType,
    pub param_types: Vec<IrType>,
    pub params: Vec<ValueId>,
    /// Ordered; `blocks[0]` is the entry block, which has no predecessors.
    pub blocks: Vec<BlockId>,
    /// `true` for an external declaration with no body (no blocks).
    pub is_declaration: bool,
    /// Computed by the backend during stack-slot materialization,
    /// not by the front end; `0` until then.
    pub stack_size: u32,
}

impl Function {
    pub fn new(name: impl Into<String>, ret_ty: IrType, param_types: Vec<IrType>) -> Self {
        Self {
            name: name.into(),
            ret_ty,
            param_types,
            params: Vec::new(),
            blocks: Vec::new(),
            is_declaration: false,
            stack_size: 0,
        }
    }

    pub fn entry_block(&self) -> Option<BlockId> {
        self.blocks.first().copied()
    }
}
