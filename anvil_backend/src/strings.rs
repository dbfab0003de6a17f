//! String-literal pooling: `CONST-STRING` operands are deduplicated
//! by content into a table keyed by value, each unique string getting a
//! synthesized label.

use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct StringPool {
    labels_by_content: HashMap<String, String>,
    /// Insertion order, so the data section is emitted deterministically.
    ordered: Vec<(String, String)>,
    prefix: &'static str,
}

impl StringPool {
    pub fn new(prefix: &'static str) -> Self {
        Self { prefix, ..Default::default() }
    }

    /// Returns the label for `content`, minting a fresh one the first time
    /// this content is seen.
    pub fn intern(&mut self, content: &str) -> String {
        if let Some(label) = self.labels_by_content.get(content) {
            return label.clone();
        }
        let label = format!("{}{}", self.prefix, self.ordered.len());
        self.labels_by_content.insert(content.to_string(), label.clone());
        self.ordered.push((label.clone(), content.to_string()));
        label
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.ordered
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn clear(&mut self) {
        self.labels_by_content.clear();
        self.ordered.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_content_shares_a_label() {
        let mut pool = StringPool::new(".Lstr");
        let a = pool.intern("hello");
        let b = pool.intern("hello");
        let c = pool.intern("world");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(pool.entries().len(), 2);
    }
}
