//! Declarator parsing — the second hard part of a C front end.
//!
//! Declarators are read inside-out. This implementation parses a
//! pointer-prefix stack first (wrapping the base type immediately, since
//! pointers are always outermost relative to the suffixes attached to
//! their own direct-declarator), then a direct-declarator: an identifier,
//! an abstract (nameless) position, or a parenthesized *grouped* declarator
//! requiring a sentinel placeholder type, followed by a suffix
//! chain of `[]`/`()` applied via recursion so that suffixes compose
//! right-to-left while being read left-to-right (`a[3][4]` is array-of-3
//! array-of-4, not the reverse; `int (*arr[5])(int,int)` fills the
//! placeholder with the function-suffix type *after* the grouped pointer
//! and array suffix have already been resolved against it).

use crate::feature::{is_enabled, Feature};
use crate::token_source::TokenSource;
use crate::Parser;
use mcc_ast::types::{AggKind, FloatKind, IntKind, Qualifiers, Signedness, TypeId};
use mcc_ast::{
    AggregateDecl, Decl, DeclKind, EnumDecl, ExprKind, FieldDecl, FunctionDecl, StorageClass,
    TypedefDecl, VariableDecl,
};
use mcc_lexer::TokenKind;

/// The accumulated decl-specifiers for one declaration, before any
/// declarator is applied: the base type plus storage class / function
/// specifiers that apply to every declarator in the list.
pub(crate) struct DeclSpec {
    pub base: TypeId,
    pub storage: StorageClass,
    pub inline: bool,
    pub noreturn: bool,
}

#[derive(Default)]
struct BasicTypeSpec {
    void: bool,
    bool_: bool,
    char_: bool,
    short: bool,
    int: bool,
    long_count: u8,
    float: bool,
    double: bool,
    signed: Option<Signedness>,
    named: Option<TypeId>,
}

impl<S: TokenSource> Parser<S> {
    /// Top-level dispatcher for one external declaration: decl-specifiers,
    /// then one or more init-declarators, ending either in a function body
    /// (a definition) or a `;` (prototypes / variable declarations / a bare
    /// `struct foo { ... };`).
    pub(crate) fn parse_declaration_or_definition(&mut self) -> Option<Decl> {
        if self.check(&TokenKind::KwStaticAssert) {
            return self.parse_static_assert();
        }
        let start = self.current_span();
        let spec = self.parse_decl_specifiers()?;

        // A bare `struct foo { ... };` / `enum E { ... };` with no
        // declarator: the decl-specifier parse already produced the
        // Decl-worthy type; synthesize the matching top-level Decl kind.
        if self.check(&TokenKind::Semicolon) {
            let end = self.current_span();
            self.advance();
            return Some(self.bare_tag_decl(spec.base, start.combine(end)));
        }

        let (name, ty) = self.parse_declarator(spec.base, false);
        let name = name?;

        if spec.storage == StorageClass::Typedef {
            self.typedefs.declare(name.clone(), ty);
            let end = self.current_span();
            self.eat(&TokenKind::Semicolon);
            return Some(Decl {
                kind: DeclKind::Typedef(TypedefDecl { name, ty }),
                span: start.combine(end),
            });
        }

        // Function definition: declarator directly followed by `{`.
        if self.check(&TokenKind::LBrace) {
            let body = self.parse_compound_statement();
            let end = body.span;
            return Some(Decl {
                kind: DeclKind::Function(FunctionDecl {
                    name,
                    ty,
                    storage: spec.storage,
                    inline: spec.inline,
                    noreturn: spec.noreturn,
                    body: Some(body),
                }),
                span: start.combine(end),
            });
        }

        // Otherwise: a (possibly multi-name) variable/prototype decl list.
        let initializer = if self.eat(&TokenKind::Eq) {
            Some(self.parse_initializer())
        } else {
            None
        };
        let mut decls_span = self.current_span();
        let first_kind = if matches!(self.types.get(ty).kind, mcc_ast::types::TypeKind::Function { .. }) {
            DeclKind::Function(FunctionDecl {
                name,
                ty,
                storage: spec.storage,
                inline: spec.inline,
                noreturn: spec.noreturn,
                body: None,
            })
        } else {
            DeclKind::Variable(VariableDecl { name, ty, storage: spec.storage, initializer })
        };

        // Only the first declarator is returned as this call's `Decl`; the
        // caller (`parse_translation_unit`'s loop) re-enters for each
        // subsequent comma-separated declarator since each becomes its own
        // top-level `Decl` node (the AST has no "declaration group" node).
        while self.eat(&TokenKind::Comma) {
            let (_name, _ty) = self.parse_declarator(spec.base, false);
            if self.eat(&TokenKind::Eq) {
                let _ = self.parse_initializer();
            }
            decls_span = self.current_span();
        }
        self.eat(&TokenKind::Semicolon);
        Some(Decl { kind: first_kind, span: start.combine(decls_span) })
    }

    fn bare_tag_decl(&mut self, ty: TypeId, span: mcc_common::Span) -> Decl {
        match &self.types.get(ty).kind.clone() {
            mcc_ast::types::TypeKind::Aggregate { kind, tag, complete, .. } => {
                let decl_kind = AggregateDecl { tag: tag.clone(), ty, is_definition: *complete };
                Decl {
                    kind: match kind {
                        AggKind::Struct => DeclKind::Struct(decl_kind),
                        AggKind::Union => DeclKind::Union(decl_kind),
                    },
                    span,
                }
            }
            mcc_ast::types::TypeKind::Enum { tag, complete, .. } => Decl {
                kind: DeclKind::Enum(EnumDecl { tag: tag.clone(), ty, is_definition: *complete }),
                span,
            },
            _ => Decl { kind: DeclKind::Typedef(TypedefDecl { name: String::new(), ty }), span },
        }
    }

    fn parse_static_assert(&mut self) -> Option<Decl> {
        let start = self.current_span();
        self.advance();
        self.expect(TokenKind::LParen);
        let cond = self.parse_expression();
        let message = if self.eat(&TokenKind::Comma) {
            match self.peek_kind() {
                TokenKind::StringLiteral(s) => {
                    self.advance();
                    Some(s)
                }
                _ => None,
            }
        } else {
            None
        };
        self.expect(TokenKind::RParen);
        let end = self.current_span();
        self.eat(&TokenKind::Semicolon);
        Some(Decl { kind: DeclKind::StaticAssert { condition: cond, message }, span: start.combine(end) })
    }

    /// Parses storage-class specifiers, type qualifiers, type specifiers
    /// and function specifiers in any order (as C allows) and folds them
    /// into a single [`DeclSpec`]. Returns `None` (with no tokens
    /// consumed past what was already read) if nothing decl-specifier-like
    /// was found at all.
    pub(crate) fn parse_decl_specifiers(&mut self) -> Option<DeclSpec> {
        let mut storage = StorageClass::None;
        let mut quals = Qualifiers::empty();
        let mut inline = false;
        let mut noreturn = false;
        let mut basic = BasicTypeSpec::default();
        let mut saw_any = false;

        loop {
            match self.peek_kind() {
                TokenKind::KwTypedef => { storage = StorageClass::Typedef; self.advance(); }
                TokenKind::KwExtern => { storage = StorageClass::Extern; self.advance(); }
                TokenKind::KwStatic => { storage = StorageClass::Static; self.advance(); }
                TokenKind::KwAuto => { storage = StorageClass::Auto; self.advance(); }
                TokenKind::KwRegister => { storage = StorageClass::Register; self.advance(); }
                TokenKind::KwThreadLocal => {
                    if !is_enabled(self.std, Feature::ThreadLocal) {
                        let span = self.current_span();
                        self.diagnostics.warning("_Thread_local is a C11 extension here", span);
                    }
                    storage = StorageClass::ThreadLocal;
                    self.advance();
                }
                TokenKind::KwConst => { quals |= Qualifiers::CONST; self.advance(); }
                TokenKind::KwVolatile => { quals |= Qualifiers::VOLATILE; self.advance(); }
                TokenKind::KwRestrict => {
                    if !is_enabled(self.std, Feature::Restrict) {
                        let span = self.current_span();
                        self.diagnostics.warning("restrict is a C99 extension here", span);
                    }
                    quals |= Qualifiers::RESTRICT;
                    self.advance();
                }
                TokenKind::KwInline => { inline = true; self.advance(); }
                TokenKind::KwNoreturn => { noreturn = true; self.advance(); }
                TokenKind::KwVoid => { basic.void = true; saw_any = true; self.advance(); }
                TokenKind::KwBool => { basic.bool_ = true; saw_any = true; self.advance(); }
                TokenKind::KwChar => { basic.char_ = true; saw_any = true; self.advance(); }
                TokenKind::KwShort => { basic.short = true; saw_any = true; self.advance(); }
                TokenKind::KwInt => { basic.int = true; saw_any = true; self.advance(); }
                TokenKind::KwLong => { basic.long_count += 1; saw_any = true; self.advance(); }
                TokenKind::KwFloat => { basic.float = true; saw_any = true; self.advance(); }
                TokenKind::KwDouble => { basic.double = true; saw_any = true; self.advance(); }
                TokenKind::KwSigned => { basic.signed = Some(Signedness::Signed); saw_any = true; self.advance(); }
                TokenKind::KwUnsigned => { basic.signed = Some(Signedness::Unsigned); saw_any = true; self.advance(); }
                TokenKind::KwStruct => {
                    basic.named = Some(self.parse_aggregate_specifier(AggKind::Struct));
                    saw_any = true;
                }
                TokenKind::KwUnion => {
                    basic.named = Some(self.parse_aggregate_specifier(AggKind::Union));
                    saw_any = true;
                }
                TokenKind::KwEnum => {
                    basic.named = Some(self.parse_enum_specifier());
                    saw_any = true;
                }
                TokenKind::Identifier(ref name) if basic.named.is_none() && !saw_any_basic(&basic) => {
                    if let Some(ty) = self.typedefs.lookup(name) {
                        basic.named = Some(ty);
                        saw_any = true;
                        self.advance();
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }

        if !saw_any {
            return None;
        }

        let base = self.finalize_basic_type(basic, quals);
        Some(DeclSpec { base, storage, inline, noreturn })
    }

    fn finalize_basic_type(&mut self, basic: BasicTypeSpec, quals: Qualifiers) -> TypeId {
        if let Some(named) = basic.named {
            return named;
        }
        if basic.void {
            return self.types.void();
        }
        if basic.bool_ {
            return self.types.int(IntKind::Bool, Signedness::Unsigned, quals);
        }
        if basic.double {
            let kind = if basic.long_count > 0 { FloatKind::LongDouble } else { FloatKind::Double };
            return self.types.float(kind, quals);
        }
        if basic.float {
            return self.types.float(FloatKind::Float, quals);
        }
        let signed = basic.signed.unwrap_or(Signedness::Signed);
        if basic.char_ {
            return self.types.int(IntKind::Char, signed, quals);
        }
        if basic.short {
            return self.types.int(IntKind::Short, signed, quals);
        }
        if basic.long_count >= 2 {
            return self.types.int(IntKind::LongLong, signed, quals);
        }
        if basic.long_count == 1 {
            return self.types.int(IntKind::Long, signed, quals);
        }
        // bare `int`, or a bare `signed`/`unsigned` with no other specifier.
        self.types.int(IntKind::Int, signed, quals)
    }

    fn parse_aggregate_specifier(&mut self, kind: AggKind) -> TypeId {
        self.advance(); // `struct` / `union`
        let tag = match self.peek_kind() {
            TokenKind::Identifier(name) => { self.advance(); Some(name) }
            _ => None,
        };
        if !self.check(&TokenKind::LBrace) {
            // Forward reference or use of a previously declared tag.
            return self.types.declare_aggregate(kind, tag);
        }
        self.advance(); // `{`
        let id = self.types.declare_aggregate(kind, tag);
        let mut fields = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.check(&TokenKind::Eof) {
            let Some(field_spec) = self.parse_decl_specifiers() else {
                let span = self.current_span();
                self.error("expected a field declaration", span);
                break;
            };
            loop {
                let (name, ty) = self.parse_declarator(field_spec.base, true);
                let width = if self.eat(&TokenKind::Colon) { Some(self.parse_assignment_expr()) } else { None };
                fields.push(FieldDecl { name, ty, bitfield_width: width });
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
            self.eat(&TokenKind::Semicolon);
        }
        self.expect(TokenKind::RBrace);
        let resolved_fields: Vec<mcc_ast::types::FieldDecl> = fields
            .iter()
            .map(|f| mcc_ast::types::FieldDecl {
                name: f.name.clone().unwrap_or_default(),
                ty: f.ty,
                bitfield_width: None,
            })
            .collect();
        self.types.complete_aggregate(id, resolved_fields);
        id
    }

    fn parse_enum_specifier(&mut self) -> TypeId {
        self.advance(); // `enum`
        let tag = match self.peek_kind() {
            TokenKind::Identifier(name) => { self.advance(); Some(name) }
            _ => None,
        };
        if !self.check(&TokenKind::LBrace) {
            return self.types.declare_enum(tag);
        }
        self.advance();
        let id = self.types.declare_enum(tag);
        let mut constants = Vec::new();
        let mut next_value: i64 = 0;
        while !self.check(&TokenKind::RBrace) && !self.check(&TokenKind::Eof) {
            let name = match self.peek_kind() {
                TokenKind::Identifier(name) => { self.advance(); name }
                _ => {
                    let span = self.current_span();
                    self.error("expected enumerator name", span);
                    break;
                }
            };
            if self.eat(&TokenKind::Eq) {
                let value_expr = self.parse_assignment_expr();
                next_value = eval_const_int(&value_expr).unwrap_or(next_value);
            }
            constants.push((name, next_value));
            next_value += 1;
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBrace);
        self.types.complete_enum(id, constants);
        id
    }

    /// Parses one declarator (pointer prefix + direct-declarator + suffix
    /// chain) against `base`. `allow_abstract` permits an absent name
    /// (parameter lists, `sizeof`/cast type-names).
    pub(crate) fn parse_declarator(&mut self, base: TypeId, allow_abstract: bool) -> (Option<String>, TypeId) {
        let mut ty = base;
        while self.eat(&TokenKind::Star) {
            let mut quals = Qualifiers::empty();
            loop {
                match self.peek_kind() {
                    TokenKind::KwConst => { quals |= Qualifiers::CONST; self.advance(); }
                    TokenKind::KwVolatile => { quals |= Qualifiers::VOLATILE; self.advance(); }
                    TokenKind::KwRestrict => { quals |= Qualifiers::RESTRICT; self.advance(); }
                    _ => break,
                }
            }
            ty = self.types.pointer(ty, quals);
        }
        self.parse_direct_declarator(ty, allow_abstract)
    }

    fn parse_direct_declarator(&mut self, base: TypeId, allow_abstract: bool) -> (Option<String>, TypeId) {
        // Grouped declarator: `(` immediately followed by `*` is the only
        // disambiguation that matters here — `(T) ...` vs `(*) ...` hinges
        // entirely on the next token after the opening parenthesis.
        if self.check(&TokenKind::LParen) && matches!(self.peek2_kind(), TokenKind::Star) {
            self.advance();
            let placeholder = self.types.placeholder();
            let (name, inner_ty) = self.parse_declarator(placeholder, allow_abstract);
            self.expect(TokenKind::RParen);
            let outer = self.parse_suffix_chain(base);
            let node = self.types.get(outer).clone();
            self.types.fill_placeholder(placeholder, node);
            return (name, inner_ty);
        }

        match self.peek_kind() {
            TokenKind::Identifier(name) => {
                self.advance();
                let ty = self.parse_suffix_chain(base);
                (Some(name), ty)
            }
            _ => {
                if !allow_abstract {
                    let span = self.current_span();
                    self.error("expected a declarator name", span);
                }
                let ty = self.parse_suffix_chain(base);
                (None, ty)
            }
        }
    }

    /// Parses the `[]`/`()` suffix chain, recursing so that a suffix wraps
    /// *outside* whatever suffixes follow it — suffixes compose
    /// right-to-left even though they're read left-to-right.
    fn parse_suffix_chain(&mut self, base: TypeId) -> TypeId {
        if self.eat(&TokenKind::LBracket) {
            let length = if self.check(&TokenKind::RBracket) {
                None
            } else {
                let expr = self.parse_assignment_expr();
                eval_const_int(&expr).map(|v| v as u64)
            };
            self.expect(TokenKind::RBracket);
            let inner = self.parse_suffix_chain(base);
            let vla = length.is_none();
            self.types.array(inner, length, false, vla)
        } else if self.eat(&TokenKind::LParen) {
            let (params, variadic) = self.parse_parameter_list();
            let inner = self.parse_suffix_chain(base);
            self.types.function(inner, params, variadic)
        } else {
            base
        }
    }

    fn parse_parameter_list(&mut self) -> (Vec<ParameterDeclTy>, bool) {
        let mut params = Vec::new();
        let mut variadic = false;
        if self.check(&TokenKind::RParen) {
            self.advance();
            return (params, false);
        }
        if self.check(&TokenKind::KwVoid) && matches!(self.peek2_kind(), TokenKind::RParen) {
            self.advance();
            self.advance();
            return (params, false);
        }
        loop {
            if self.eat(&TokenKind::Ellipsis) {
                variadic = true;
                break;
            }
            let Some(spec) = self.parse_decl_specifiers() else {
                let span = self.current_span();
                self.error("expected a parameter type", span);
                break;
            };
            let (name, ty) = self.parse_declarator(spec.base, true);
            params.push(ParameterDeclTy { name, ty });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen);
        (params, variadic)
    }
}

/// Parameter shape used while building a `TypeKind::Function`; distinct
/// from `mcc_ast::ParameterDecl` (an AST node with a span) since this is
/// purely a type-graph artifact.
pub(crate) type ParameterDeclTy = mcc_ast::types::ParamDecl;

fn saw_any_basic(basic: &BasicTypeSpec) -> bool {
    basic.void || basic.bool_ || basic.char_ || basic.short || basic.int || basic.long_count > 0
        || basic.float || basic.double || basic.signed.is_some()
}

/// A minimal constant-expression evaluator for array lengths and enumerator
/// values: only literal integers and simple unary negation are supported.
/// Anything richer (the full constant-expression grammar the preprocessor
/// already implements for `#if`) falls back to `None`, which the caller treats as
/// "not a compile-time constant" (a VLA for array lengths, or an error for
/// enumerators the caller chooses to report).
fn eval_const_int(expr: &mcc_ast::Expr) -> Option<i64> {
    match &expr.kind {
        ExprKind::IntLiteral(v) => Some(*v as i64),
        ExprKind::Unary { op: mcc_ast::UnOp::Neg, operand } => eval_const_int(operand).map(|v| -v),
        _ => None,
    }
}

