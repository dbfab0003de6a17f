//! The ANVIL IR: SSA-style values, instructions, blocks,
//! functions and modules, keyed by stable [`mcc_common::Id`] handles so the
//! optimizer can rewrite operands and clone blocks without invalidating
//! other references.

pub mod block;
pub mod builder;
pub mod display;
pub mod function;
pub mod instruction;
pub mod module;
pub mod ty;
pub mod value;

pub use block::Block;
pub use builder::IrBuilder;
pub use function::Function;
pub use instruction::{Instruction, Opcode};
pub use module::{Global, Module};
pub use ty::IrType;
pub use value::{ValueData, ValueKind};

pub type ValueId = mcc_common::Id<ValueData>;
pub type InstId = mcc_common::Id<Instruction>;
pub type BlockId = mcc_common::Id<Block>;
pub type FunctionId = mcc_common::Id<Function>;
