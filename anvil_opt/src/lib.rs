//! The optimizer: function-level passes over ANVIL IR with
//! correctness-preserving rewrites, plus a fixed-point pipeline driver.
//!
//! Every pass has the shape `fn run(module: &mut Module, function: FunctionId) -> bool`,
//! returning whether it mutated the function, so the pipeline can loop to
//! a fixed point.

pub mod const_fold;
pub mod loop_unroll;
pub mod pipeline;
pub mod strength_reduction;

pub use const_fold::run as run_const_fold;
pub use loop_unroll::run as run_loop_unroll;
pub use pipeline::run_to_fixed_point;
pub use strength_reduction::run as run_strength_reduction;
