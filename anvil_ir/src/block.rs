//! IR basic blocks: owned by exactly one function, with a stable name,
//! terminated (and only terminated) by a terminator instruction at the
//! tail; PHI instructions, if any, appear contiguously at the head.
//!
//! Modeled as an ordered `Vec<InstId>` rather than an intrusive doubly-
//! linked list — insertion order already gives the builder append-only
//! semantics, and the optimizer's loop-unroller only ever inserts whole
//! cloned blocks rather than splicing mid-block, so the extra pointer
//! bookkeeping a real intrusive list buys has no consumer here.

use crate::InstId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub name: String,
    pub instructions: Vec<InstId>,
}

impl Block {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), instructions: Vec::new() }
    }
}
