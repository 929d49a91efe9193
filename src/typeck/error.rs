//! Type checking errors
//!
//! Every error carries the span it should be reported at; the driver renders
//! the message together with source context.

use crate::ast::BinaryOp;
use crate::span::Span;
use crate::typeck::ty::Ty;
use thiserror::Error;

/// Result type for type checking operations
pub type TypeResult<T> = Result<T, TypeError>;

/// A type checking error anchored to a span
#[derive(Debug, Clone)]
pub struct TypeError {
    pub kind: TypeErrorKind,
    pub span: Span,
}

impl TypeError {
    pub fn new(kind: TypeErrorKind, span: Span) -> Self {
        Self { kind, span }
    }
}

impl std::fmt::Display for TypeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)
    }
}

#[derive(Error, Debug, Clone)]
pub enum TypeErrorKind {
    // ============ Name resolution ============
    #[error("symbol not found: {name}")]
    UnknownSymbol { name: String },

    #[error("could not resolve type name: {name}")]
    UnresolvedType { name: String },

    #[error("symbol is not a function: {name}")]
    NotAFunction { name: String },

    #[error("symbol is not an enum: {name}")]
    SymbolIsNotEnum { name: String },

    #[error("symbol is not a struct: {name}")]
    SymbolIsNotStruct { name: String },

    #[error("enum {enum_name} has no member {member}")]
    EnumMemberNotFound { enum_name: String, member: String },

    #[error("struct {struct_name} has no field {field}")]
    StructFieldNotFound { struct_name: String, field: String },

    // ============ Types ============
    #[error("type mismatch in {context}: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: Ty,
        actual: Ty,
        context: &'static str,
    },

    #[error("invalid binary operation: {op} between {left} and {right}")]
    InvalidBinaryOp { op: BinaryOp, left: Ty, right: Ty },

    #[error("condition cannot be a type meta-value")]
    ConditionIsMetaType,

    #[error("dereference operator '*' requires a pointer, got {actual}")]
    DereferenceNonPointer { actual: Ty },

    #[error("cannot return a value from a void function")]
    ReturnInVoidHasValue,

    #[error("missing return expression in non-void function")]
    ReturnInNonVoidMissing,

    #[error("return statement outside of a function")]
    ReturnOutsideFunction,

    #[error("argument count mismatch: expected {expected}, got {actual}")]
    ArgCountMismatch { expected: usize, actual: usize },

    #[error("extern declarations are only legal in the global scope")]
    ExternNotGlobal,

    #[error("invalid member access on {left}")]
    InvalidMemberAccess { left: Ty },

    #[error("import module path must be a string literal")]
    ImportPathNotString,
}

impl TypeErrorKind {
    pub fn at(self, span: Span) -> TypeError {
        TypeError::new(self, span)
    }
}
