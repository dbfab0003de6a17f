//! The `#if`/`#ifdef`/.../`#endif` conditional-inclusion stack.

use mcc_common::Span;

#[derive(Debug, Clone)]
pub struct ConditionalFrame {
    /// Whether the currently active branch of this frame is taken.
    pub branch_taken: bool,
    /// Whether any branch in this `#if`/`#elif...`/`#else` chain has been
    /// taken yet, so a later `#elif` knows to skip its own (already-true)
    /// condition evaluation.
    pub any_branch_taken: bool,
    pub else_seen: bool,
    pub origin: Span,
}

impl ConditionalFrame {
    pub fn new(branch_taken: bool, origin: Span) -> Self {
        Self { branch_taken, any_branch_taken: branch_taken, else_seen: false, origin }
    }
}

#[derive(Debug, Default)]
pub struct ConditionalStack {
    frames: Vec<ConditionalFrame>,
}

impl ConditionalStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: ConditionalFrame) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<ConditionalFrame> {
        self.frames.pop()
    }

    pub fn top_mut(&mut self) -> Option<&mut ConditionalFrame> {
        self.frames.last_mut()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Whether tokens at this point in the file should be discarded: true
    /// if any enclosing frame has its branch not taken.
    pub fn is_skipping(&self) -> bool {
        self.frames.iter().any(|f| !f.branch_taken)
    }

    /// Whether any frame *enclosing* the current (topmost) one is skipping.
    /// `#elif`/`#else`/`#elifdef` consult this rather than [`is_skipping`]
    /// so they can tell "the whole chain is inside a skipped region" apart
    /// from "this chain already took an earlier branch".
    pub fn outer_skipping(&self) -> bool {
        let len = self.frames.len();
        self.frames[..len.saturating_sub(1)].iter().any(|f| !f.branch_taken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_false_frame_makes_the_whole_stack_skip() {
        let mut stack = ConditionalStack::new();
        stack.push(ConditionalFrame::new(true, Span::dummy()));
        assert!(!stack.is_skipping());
        stack.push(ConditionalFrame::new(false, Span::dummy()));
        assert!(stack.is_skipping());
        stack.pop();
        assert!(!stack.is_skipping());
    }
}
