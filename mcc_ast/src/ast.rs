//! Typed AST node set: declarations, statements and
//! expressions, each carrying a source [`Span`] and, for expressions, an
//! optional resolved [`TypeId`]. The tree is a strict tree — no node is
//! reachable from two parents — except that many nodes share `TypeId`s from
//! the same [`TypeArena`].

use crate::types::TypeId;
use mcc_common::Span;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageClass {
    None,
    Typedef,
    Extern,
    Static,
    Auto,
    Register,
    ThreadLocal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationUnit {
    pub decls: Vec<Decl>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decl {
    pub kind: DeclKind,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DeclKind {
    Function(FunctionDecl),
    Variable(VariableDecl),
    Typedef(TypedefDecl),
    Struct(AggregateDecl),
    Union(AggregateDecl),
    Enum(EnumDecl),
    /// A single `name = value` member inside an `enum` body.
    Enumerator(EnumeratorDecl),
    /// A struct/union member, including an optional bitfield width.
    Field(FieldDecl),
    /// A function parameter, named or abstract.
    Parameter(ParameterDecl),
    StaticAssert { condition: Expr, message: Option<String> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    pub ty: TypeId,
    pub storage: StorageClass,
    pub inline: bool,
    pub noreturn: bool,
    /// `None` for a prototype, `Some` for a definition.
    pub body: Option<CompoundStmt>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableDecl {
    pub name: String,
    pub ty: TypeId,
    pub storage: StorageClass,
    pub initializer: Option<Initializer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypedefDecl {
    pub name: String,
    pub ty: TypeId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateDecl {
    pub tag: Option<String>,
    pub ty: TypeId,
    /// `false` for a bare forward declaration (`struct foo;`).
    pub is_definition: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumDecl {
    pub tag: Option<String>,
    pub ty: TypeId,
    pub is_definition: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumeratorDecl {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: Option<String>,
    pub ty: TypeId,
    pub bitfield_width: Option<Expr>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterDecl {
    pub name: Option<String>,
    pub ty: TypeId,
}

/// An initializer: either a plain expression or a (possibly nested,
/// possibly designated) brace-init list, per the "initializer list" and
/// "designated init" expression kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Initializer {
    Expr(Expr),
    List(Vec<InitItem>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitItem {
    pub designators: Vec<Designator>,
    pub value: Initializer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Designator {
    Field(String),
    Index(Expr),
}

// ---------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompoundStmt {
    pub items: Vec<BlockItem>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BlockItem {
    Decl(Decl),
    Stmt(Stmt),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StmtKind {
    Compound(CompoundStmt),
    Expr(Expr),
    If { cond: Expr, then_branch: Box<Stmt>, else_branch: Option<Box<Stmt>> },
    While { cond: Expr, body: Box<Stmt> },
    DoWhile { body: Box<Stmt>, cond: Expr },
    For {
        init: Option<Box<BlockItem>>,
        cond: Option<Expr>,
        step: Option<Expr>,
        body: Box<Stmt>,
    },
    Switch { control: Expr, body: Box<Stmt> },
    Case {
        value: Expr,
        /// `Some(end)` for a GNU case-range extension.
        range_end: Option<Expr>,
        body: Box<Stmt>,
    },
    Default { body: Box<Stmt> },
    Break,
    Continue,
    Return(Option<Expr>),
    Goto(String),
    Label { name: String, body: Box<Stmt> },
    /// A bare `;`.
    Null,
}

// ---------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
    pub resolved_type: Option<TypeId>,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span, resolved_type: None }
    }

    pub fn with_type(mut self, ty: TypeId) -> Self {
        self.resolved_type = Some(ty);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add, Sub, Mul, Div, Mod,
    Shl, Shr,
    Lt, Gt, Le, Ge, Eq, Ne,
    BitAnd, BitXor, BitOr,
    LogAnd, LogOr,
    Assign,
    AddAssign, SubAssign, MulAssign, DivAssign, ModAssign,
    ShlAssign, ShrAssign, AndAssign, XorAssign, OrAssign,
    Comma,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnOp {
    Plus,
    Neg,
    BitNot,
    LogNot,
    AddrOf,
    Deref,
    /// Prefix `++`/`--`; postfix forms are [`ExprKind::PostfixUnary`].
    PreInc,
    PreDec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostfixOp {
    PostInc,
    PostDec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenericAssoc {
    /// `None` for the `default:` association.
    pub ty: Option<TypeId>,
    pub value: Box<Expr>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExprKind {
    IntLiteral(u64),
    FloatLiteral(f64),
    CharLiteral(char),
    StringLiteral(String),
    Identifier(String),
    Binary { op: BinOp, lhs: Box<Expr>, rhs: Box<Expr> },
    Unary { op: UnOp, operand: Box<Expr> },
    PostfixUnary { op: PostfixOp, operand: Box<Expr> },
    Ternary { cond: Box<Expr>, then_expr: Box<Expr>, else_expr: Box<Expr> },
    Call { callee: Box<Expr>, args: Vec<Expr> },
    Subscript { base: Box<Expr>, index: Box<Expr> },
    Member { base: Box<Expr>, field: String, arrow: bool },
    Cast { ty: TypeId, operand: Box<Expr> },
    Sizeof(SizeofArg),
    Alignof(TypeId),
    /// `(T){ ... }`, a compound literal.
    CompoundLiteral { ty: TypeId, init: Vec<InitItem> },
    InitializerList(Vec<InitItem>),
    Comma { lhs: Box<Expr>, rhs: Box<Expr> },
    Generic { control: Box<Expr>, assocs: Vec<GenericAssoc> },
    /// GNU statement expression `({ ... })`.
    StatementExpr(CompoundStmt),
    /// GNU labels-as-values `&&label`.
    LabelAddress(String),
    NullPointer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SizeofArg {
    Expr(Box<Expr>),
    Type(TypeId),
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcc_common::Span;

    #[test]
    fn expr_carries_optional_resolved_type() {
        let e = Expr::new(ExprKind::IntLiteral(7), Span::dummy());
        assert!(e.resolved_type.is_none());
    }
}
