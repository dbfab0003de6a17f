//! The universal SSA operand abstraction. Value identity is the `ValueId`
//! itself (arena-index equality) — two `ValueId`s compare equal only if
//! they name the same arena slot, never by comparing payloads.

use crate::ty::IrType;
use crate::InstId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValueKind {
    ConstantInt(i64),
    ConstantFloat(f64),
    ConstantNull,
    ConstantString(String),
    /// A function parameter, by ordinal position.
    Param(u32),
    /// The result of an instruction.
    InstResult(InstId),
    /// A module-level global symbol, by name.
    Global(String),
    /// A reference to a function symbol (for `CALL`'s callee operand and
    /// function-pointer constants), by name.
    FunctionRef(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueData {
    pub kind: ValueKind,
    pub ty: IrType,
    pub name: Option<String>,
}
