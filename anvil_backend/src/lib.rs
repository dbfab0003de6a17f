//! The backend: per-architecture assembly-text emitters over ANVIL IR.
//!
//! Three concrete backends share the [`Backend`] trait: [`x86::gas::X86GasBackend`]
//! and [`x86::nasm::X86NasmBackend`] (AT&T and Intel syntax over the same
//! x86 lowering core) and [`ppc64le::Ppc64leBackend`] (GAS syntax with
//! ELFv2 frame conventions).

pub mod frame;
pub mod ppc64le;
pub mod strings;
pub mod x86;

use anvil_ir::{FunctionId, Module};
use mcc_common::McResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

/// Target machine characteristics a backend reports about itself (the
/// "arch_info"), consumed by the driver for diagnostics and by tests that
/// want to assert on a target's shape without hardcoding it twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchInfo {
    pub name: &'static str,
    pub pointer_size: u32,
    pub word_size: u32,
    pub gpr_count: u32,
    pub fpr_count: u32,
    pub endianness: Endianness,
    pub stack_grows_down: bool,
    pub has_condition_codes: bool,
    pub has_delay_slots: bool,
}

/// Common contract every architecture backend implements. A backend
/// owns a text buffer that `codegen_module`/`codegen_func` append to and
/// detach on return, plus whatever per-module state (the string pool,
/// principally) `reset` clears between compilations.
pub trait Backend {
    fn init(&mut self);
    fn cleanup(&mut self);
    fn reset(&mut self);
    fn codegen_module(&mut self, module: &Module) -> McResult<String>;
    fn codegen_func(&mut self, module: &Module, function: FunctionId) -> McResult<String>;
    fn arch_info(&self) -> ArchInfo;
}
