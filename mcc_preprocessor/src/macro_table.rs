//! The macro table: hash-keyed on name with O(1) amortized lookup.

use hashbrown::HashMap;
use mcc_common::Span;
use mcc_lexer::Token;
use smallvec::SmallVec;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MacroKind {
    ObjectLike,
    FunctionLike {
        params: Vec<String>,
        variadic: bool,
    },
}

/// A `#define`d macro. The replacement list is an owned token sequence;
/// parameters within it are matched by name during substitution rather than
/// pre-resolved to an index, since the same body token list is reused for
/// every invocation.
#[derive(Debug, Clone)]
pub struct Macro {
    pub name: String,
    pub kind: MacroKind,
    pub replacement: SmallVec<[Token; 8]>,
    pub defined_at: Span,
}

impl Macro {
    pub fn is_function_like(&self) -> bool {
        matches!(self.kind, MacroKind::FunctionLike { .. })
    }

    pub fn params(&self) -> &[String] {
        match &self.kind {
            MacroKind::FunctionLike { params, .. } => params,
            MacroKind::ObjectLike => &[],
        }
    }

    pub fn is_variadic(&self) -> bool {
        matches!(self.kind, MacroKind::FunctionLike { variadic: true, .. })
    }

    /// Two macro definitions are "identical" for the silent-redefinition
    /// rule if their kind, parameter list and replacement spellings
    /// match (whitespace-insignificant differences aside, which the lexer
    /// already normalizes away — only token kind/text matter here).
    pub fn same_definition(&self, other: &Macro) -> bool {
        if self.kind != other.kind || self.replacement.len() != other.replacement.len() {
            return false;
        }
        self.replacement
            .iter()
            .zip(other.replacement.iter())
            .all(|(a, b)| a.kind == b.kind && a.text == b.text)
    }
}

#[derive(Debug, Default)]
pub struct MacroTable {
    macros: HashMap<String, Macro>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `Some(warning message)` if this redefines an existing macro
    /// with a different body (silent if identical).
    pub fn define(&mut self, mac: Macro) -> Option<String> {
        if let Some(existing) = self.macros.get(&mac.name) {
            if !existing.same_definition(&mac) {
                let name = mac.name.clone();
                self.macros.insert(mac.name.clone(), mac);
                return Some(format!("'{name}' macro redefined"));
            }
            return None;
        }
        self.macros.insert(mac.name.clone(), mac);
        None
    }

    pub fn undef(&mut self, name: &str) {
        self.macros.remove(name);
    }

    pub fn get(&self, name: &str) -> Option<&Macro> {
        self.macros.get(name)
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.macros.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcc_common::Position;
    use mcc_lexer::TokenKind;

    fn tok(kind: TokenKind, text: &str) -> Token {
        Token::new(kind, text, Span::single(Position::start(), 0))
    }

    #[test]
    fn redefinition_with_identical_body_is_silent() {
        let mut table = MacroTable::new();
        let body: SmallVec<[Token; 8]> = SmallVec::from_vec(vec![tok(TokenKind::IntLiteral { value: 1, suffix: mcc_lexer::IntSuffix::None }, "1")]);
        let m1 = Macro { name: "A".into(), kind: MacroKind::ObjectLike, replacement: body.clone(), defined_at: Span::dummy() };
        let m2 = Macro { name: "A".into(), kind: MacroKind::ObjectLike, replacement: body, defined_at: Span::dummy() };
        assert!(table.define(m1).is_none());
        assert!(table.define(m2).is_none());
    }

    #[test]
    fn redefinition_with_different_body_warns() {
        let mut table = MacroTable::new();
        let one: SmallVec<[Token; 8]> = SmallVec::from_vec(vec![tok(TokenKind::IntLiteral { value: 1, suffix: mcc_lexer::IntSuffix::None }, "1")]);
        let two: SmallVec<[Token; 8]> = SmallVec::from_vec(vec![tok(TokenKind::IntLiteral { value: 2, suffix: mcc_lexer::IntSuffix::None }, "2")]);
        table.define(Macro { name: "A".into(), kind: MacroKind::ObjectLike, replacement: one, defined_at: Span::dummy() });
        let warning = table.define(Macro { name: "A".into(), kind: MacroKind::ObjectLike, replacement: two, defined_at: Span::dummy() });
        assert!(warning.is_some());
    }
}
