//! "Blue paint" — the set of macro names forbidden from expanding a token.
//!
//! Represented as a persistent, structurally-shared sorted set so that
//! extending a token's hide set during expansion is a cheap
//! copy-on-extend rather than a deep clone of the whole token list (see
//! the "Hide sets" design note: copy-on-extend, equality by content).

use std::collections::BTreeSet;
use std::rc::Rc;

#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct HideSet(Rc<BTreeSet<String>>);

impl HideSet {
    pub fn empty() -> Self {
        Self(Rc::new(BTreeSet::new()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    /// Returns a new hide set equal to `self ∪ {name}`.
    pub fn extended(&self, name: &str) -> Self {
        if self.contains(name) {
            return self.clone();
        }
        let mut set = (*self.0).clone();
        set.insert(name.to_string());
        Self(Rc::new(set))
    }

    /// Returns `self ∪ other`, used when a rescanned token already carries
    /// a hide set of its own (e.g. the remaining input tokens during a
    /// rescan) and must be merged with the set painted by the macro that
    /// just expanded.
    pub fn union(&self, other: &HideSet) -> Self {
        if Rc::ptr_eq(&self.0, &other.0) {
            return self.clone();
        }
        let mut set = (*self.0).clone();
        set.extend(other.0.iter().cloned());
        Self(Rc::new(set))
    }

    pub fn intersection(&self, other: &HideSet) -> Self {
        let set: BTreeSet<String> = self.0.intersection(&other.0).cloned().collect();
        Self(Rc::new(set))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extended_is_monotonic() {
        let hs = HideSet::empty();
        assert!(hs.is_empty());
        let hs2 = hs.extended("A");
        assert!(hs2.contains("A"));
        assert!(!hs.contains("A"), "original hide set must be unaffected");
        let hs3 = hs2.extended("A");
        assert_eq!(hs3.len(), 1, "re-extending with the same name is a no-op");
    }

    #[test]
    fn union_merges_both_sets() {
        let a = HideSet::empty().extended("A");
        let b = HideSet::empty().extended("B");
        let u = a.union(&b);
        assert!(u.contains("A") && u.contains("B"));
    }
}
