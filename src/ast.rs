//! Abstract Syntax Tree for the Enki language
//!
//! The AST is produced by the parser and rewritten by the injection pass and
//! the type checker: every expression carries a resolved-type slot that is
//! empty until type checking, and enum definitions gain their synthesised
//! to-string function. Every node serialises with a `node` discriminator tag
//! so the JSON output is self-describing.

use crate::span::Span;
use crate::token::TokenKind;
use crate::typeck::scope::{ScopeArena, ScopeId};
use crate::typeck::ty::{EnumType, FnType, StructType, Ty};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A complete Enki program (one source file)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    /// The global block containing all top-level statements
    pub body: Block,
    /// All scopes of this program, indexed by `ScopeId`
    pub scopes: ScopeArena,
    /// The root of the scope tree
    pub global_scope: ScopeId,
    /// Name of the source file, for diagnostics
    pub file_name: String,
    pub span: Span,
}

/// An identifier with its source span
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

// ============ Expressions ============

/// An expression. `ty` is absent until the type checker fills it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
    pub ty: Option<Ty>,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self {
            kind,
            span,
            ty: None,
        }
    }

    /// Whether this expression is a legal assignment target.
    /// Only plain identifiers are assignable in this revision.
    pub fn is_assignable(&self) -> bool {
        matches!(self.kind, ExprKind::Identifier { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "node")]
pub enum ExprKind {
    /// A name reference: `x`
    Identifier { name: String },

    /// A literal: `42`, `3.14`, `"hi"`, `'c'`, `true`
    Literal(Literal),

    /// A binary operation: `a + b`
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// A function call: `f(a, b)`
    Call { callee: Box<Expr>, args: Vec<Expr> },

    /// Pointer dereference: `*p`
    Dereference { inner: Box<Expr> },

    /// Address-of: `&x`
    AddressOf { inner: Box<Expr> },

    /// Member access: `left.right`. The right side is parsed as a full
    /// expression; the type checker accepts only an identifier there.
    Dot { left: Box<Expr>, right: Box<Expr> },

    /// Positional struct instantiation: `struct Point { 1, 2 }`.
    /// `resolved_struct` is filled by the type checker.
    StructInstantiation {
        type_name: Ident,
        args: Vec<Expr>,
        resolved_struct: Option<StructType>,
    },
}

/// A literal value, kept as its source lexeme
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Literal {
    pub kind: LitKind,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LitKind {
    Int,
    Float,
    String,
    Bool,
    Char,
}

// ============ Statements ============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "node")]
pub enum StmtKind {
    /// `let x = expr` or `let x: type = expr`
    VarDecl(VarDecl),

    /// `x = expr`
    Assignment { target: Expr, value: Expr },

    /// A bare call used as a statement
    Expression { expr: Expr },

    /// `return` or `return expr`
    Return(ReturnStmt),

    /// `if cond { .. } else { .. }`
    If(IfStmt),

    /// `while cond { .. }`
    While(WhileStmt),

    /// A brace-delimited block with its own scope
    Block(Block),

    /// `import <"path">`
    Import(ImportStmt),

    /// `extern name(types) -> type from "module"`
    Extern(ExternDef),

    /// `define name(params) -> type { .. }`
    Function(FunctionDef),

    /// `enum Name { A, B }`
    Enum(EnumDef),

    /// `struct Name { field: type }`
    Struct(StructDef),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarDecl {
    pub name: Ident,
    /// The declared type if the source carried a `:` ascription; after type
    /// checking this always holds the variable's type.
    pub ty: Option<Ty>,
    pub init: Expr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnStmt {
    pub value: Option<Expr>,
    /// Name of the enclosing function, filled by the type checker
    pub enclosing_fn: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_branch: Box<Stmt>,
    pub else_branch: Option<Box<Stmt>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Box<Stmt>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub statements: Vec<Stmt>,
    pub scope: ScopeId,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportStmt {
    /// The module path literal. The loader has already been invoked by the
    /// time this node exists; the statement retains only the path.
    pub path: Literal,
    pub path_span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternDef {
    pub name: Ident,
    pub arg_types: Vec<Ty>,
    pub return_type: Ty,
    pub module_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: Ident,
    pub params: Vec<Param>,
    pub return_type: Ty,
    /// Absent for bodiless built-ins such as `print`
    pub body: Option<Block>,
    /// Resolved signature, filled by the type checker
    pub meta: Option<FnType>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Param {
    pub name: Ident,
    pub ty: Ty,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumDef {
    pub name: Ident,
    /// Members in declaration order
    pub members: Vec<Ident>,
    /// Resolved enum type, filled by the type checker
    pub meta: Option<EnumType>,
    /// The synthesised `<Name>_to_string` function, attached during type
    /// checking
    pub to_string_fn: Option<Box<FunctionDef>>,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructDef {
    pub name: Ident,
    pub fields: Vec<Param>,
    /// Resolved struct type, filled by the type checker
    pub meta: Option<StructType>,
    pub span: Span,
}

// ============ Binary operators ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equals,
    NotEquals,
    LessThan,
    GreaterThan,
    LessThanOrEqual,
    GreaterThanOrEqual,
}

impl BinaryOp {
    /// Operator precedence, tightest first
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Multiply | BinaryOp::Divide | BinaryOp::Modulo => 10,
            BinaryOp::Add | BinaryOp::Subtract => 20,
            BinaryOp::LessThan
            | BinaryOp::GreaterThan
            | BinaryOp::LessThanOrEqual
            | BinaryOp::GreaterThanOrEqual => 30,
            BinaryOp::Equals | BinaryOp::NotEquals => 40,
        }
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add
                | BinaryOp::Subtract
                | BinaryOp::Multiply
                | BinaryOp::Divide
                | BinaryOp::Modulo
        )
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::LessThan
                | BinaryOp::GreaterThan
                | BinaryOp::LessThanOrEqual
                | BinaryOp::GreaterThanOrEqual
        )
    }

    pub fn is_equality(self) -> bool {
        matches!(self, BinaryOp::Equals | BinaryOp::NotEquals)
    }

    /// Map a token to its binary operator, if it is one
    pub fn from_token(kind: TokenKind) -> Option<BinaryOp> {
        match kind {
            TokenKind::Plus => Some(BinaryOp::Add),
            TokenKind::Minus => Some(BinaryOp::Subtract),
            TokenKind::Asterisk => Some(BinaryOp::Multiply),
            TokenKind::Slash => Some(BinaryOp::Divide),
            TokenKind::Percent => Some(BinaryOp::Modulo),
            TokenKind::EqualsEquals => Some(BinaryOp::Equals),
            TokenKind::NotEquals => Some(BinaryOp::NotEquals),
            TokenKind::LessThan => Some(BinaryOp::LessThan),
            TokenKind::GreaterThan => Some(BinaryOp::GreaterThan),
            TokenKind::LessThanEquals => Some(BinaryOp::LessThanOrEqual),
            TokenKind::GreaterThanEquals => Some(BinaryOp::GreaterThanOrEqual),
            _ => None,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::Equals => "==",
            BinaryOp::NotEquals => "!=",
            BinaryOp::LessThan => "<",
            BinaryOp::GreaterThan => ">",
            BinaryOp::LessThanOrEqual => "<=",
            BinaryOp::GreaterThanOrEqual => ">=",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence_ordering() {
        assert!(BinaryOp::Multiply.precedence() < BinaryOp::Add.precedence());
        assert!(BinaryOp::Add.precedence() < BinaryOp::LessThan.precedence());
        assert!(BinaryOp::LessThan.precedence() < BinaryOp::Equals.precedence());
    }

    #[test]
    fn test_from_token() {
        assert_eq!(BinaryOp::from_token(TokenKind::Plus), Some(BinaryOp::Add));
        assert_eq!(
            BinaryOp::from_token(TokenKind::EqualsEquals),
            Some(BinaryOp::Equals)
        );
        assert_eq!(BinaryOp::from_token(TokenKind::Equals), None);
        assert_eq!(BinaryOp::from_token(TokenKind::LParen), None);
    }

    #[test]
    fn test_assignable_targets() {
        let span = Span::new(0, 1);
        let ident = Expr::new(
            ExprKind::Identifier {
                name: "x".to_string(),
            },
            span,
        );
        assert!(ident.is_assignable());

        let deref = Expr::new(
            ExprKind::Dereference {
                inner: Box::new(ident),
            },
            span,
        );
        assert!(!deref.is_assignable());
    }
}
