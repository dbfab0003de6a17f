use mcc_lexer::{Lexer, TokenKind};

fn kinds(src: &str) -> Vec<TokenKind> {
    Lexer::new(src, 0).tokenize().into_iter().map(|t| t.kind).collect()
}

#[test]
fn lexes_a_small_function() {
    let ks = kinds("int add(int a, int b) {\n    return a + b;\n}\n");
    assert_eq!(
        ks,
        vec![
            TokenKind::KwInt,
            TokenKind::Identifier("add".into()),
            TokenKind::LParen,
            TokenKind::KwInt,
            TokenKind::Identifier("a".into()),
            TokenKind::Comma,
            TokenKind::KwInt,
            TokenKind::Identifier("b".into()),
            TokenKind::RParen,
            TokenKind::LBrace,
            TokenKind::KwReturn,
            TokenKind::Identifier("a".into()),
            TokenKind::Plus,
            TokenKind::Identifier("b".into()),
            TokenKind::Semicolon,
            TokenKind::RBrace,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn skips_line_and_block_comments() {
    let ks = kinds("// leading comment\nint /* inline */ x;");
    assert_eq!(ks, vec![TokenKind::KwInt, TokenKind::Identifier("x".into()), TokenKind::Semicolon, TokenKind::Eof]);
}

#[test]
fn backslash_newline_splices_across_lines() {
    let ks = kinds("int x\\\n= 1;");
    assert_eq!(
        ks,
        vec![
            TokenKind::KwInt,
            TokenKind::Identifier("x".into()),
            TokenKind::Eq,
            TokenKind::IntLiteral { value: 1, suffix: mcc_lexer::IntSuffix::None },
            TokenKind::Semicolon,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn scans_float_and_hex_literals() {
    let ks = kinds("3.14 0x1F 1e10 .5f");
    assert!(matches!(ks[0], TokenKind::FloatLiteral { ref text, .. } if text == "3.14"));
    assert_eq!(ks[1], TokenKind::IntLiteral { value: 31, suffix: mcc_lexer::IntSuffix::None });
    assert!(matches!(ks[2], TokenKind::FloatLiteral { ref text, .. } if text == "1e10"));
}

#[test]
fn string_and_char_literals_with_escapes() {
    let ks = kinds(r#""hello\n" 'a' '\t'"#);
    assert_eq!(ks[0], TokenKind::StringLiteral("hello\n".to_string()));
    assert_eq!(ks[1], TokenKind::CharLiteral('a'));
    assert_eq!(ks[2], TokenKind::CharLiteral('\t'));
}

#[test]
fn recognizes_three_char_operators_and_digraphs() {
    let ks = kinds("a <<= b; c <: d :> e <% %>");
    assert!(ks.contains(&TokenKind::LtLtEq));
    assert!(ks.contains(&TokenKind::LBracket));
    assert!(ks.contains(&TokenKind::RBracket));
    assert!(ks.contains(&TokenKind::LBrace));
    assert!(ks.contains(&TokenKind::RBrace));
}

#[test]
fn unterminated_string_produces_error_diagnostic() {
    let mut lexer = Lexer::new("\"unterminated", 0);
    let _ = lexer.tokenize();
    assert!(lexer.diagnostics().has_errors());
}

#[test]
fn unexpected_character_reports_but_does_not_panic() {
    let mut lexer = Lexer::new("int x = `;", 0);
    let toks = lexer.tokenize();
    assert!(toks.iter().any(|t| t.is_error()));
    assert!(lexer.diagnostics().has_errors());
}
