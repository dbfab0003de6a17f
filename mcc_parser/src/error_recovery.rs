//! Panic-mode error recovery: on a parse error, discard tokens
//! until a synchronization point — a semicolon, or one of a fixed keyword
//! set that begins a declaration or statement. Panic mode clears once the
//! parser successfully commits to the next top-level production.

use mcc_lexer::TokenKind;

/// Whether `kind` is a synchronization point panic mode stops *at* (without
/// consuming it, so the next top-level parse attempt sees a clean start).
pub fn is_sync_point(kind: &TokenKind) -> bool {
    use TokenKind::*;
    matches!(
        kind,
        KwIf | KwWhile | KwFor | KwDo | KwSwitch | KwReturn | KwBreak | KwContinue | KwGoto
            | KwTypedef | KwExtern | KwStatic | KwAuto | KwRegister
            | KwVoid | KwChar | KwShort | KwInt | KwLong | KwFloat | KwDouble
            | KwSigned | KwUnsigned | KwBool | KwComplex
            | KwStruct | KwUnion | KwEnum
            | Eof
    )
}

/// Whether `kind` is a semicolon the recovery routine should consume before
/// stopping (a statement/declaration boundary it can safely step past).
pub fn is_consumed_sync_point(kind: &TokenKind) -> bool {
    matches!(kind, TokenKind::Semicolon)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declaration_starting_keywords_are_sync_points() {
        assert!(is_sync_point(&TokenKind::KwTypedef));
        assert!(is_sync_point(&TokenKind::KwStruct));
    }

    #[test]
    fn identifier_is_not_a_sync_point() {
        assert!(!is_sync_point(&TokenKind::Identifier("x".to_string())));
    }
}
