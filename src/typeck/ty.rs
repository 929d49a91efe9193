//! Type representation for the Enki language
//!
//! Types are small owned values: primitives carry nothing, pointers box
//! their pointee, and the nominal types (enums, structs, functions) embed
//! their shape. Enum and struct equality is nominal, by name. The parser
//! produces `Unknown { name }` placeholders wherever an identifier appears
//! in type position; the checker substitutes the real type.

use crate::span::Span;
use crate::typeck::scope::ScopeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A type with the span of the place that spelled it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ty {
    #[serde(flatten)]
    pub kind: TyKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "base")]
pub enum TyKind {
    Void,
    Int,
    Float,
    String,
    Bool,
    Char,
    /// `&T`
    Pointer { pointee: Box<Ty> },
    Enum(EnumType),
    Struct(StructType),
    Function(Box<FnType>),
    /// The meta-type: the "value" of an identifier that names a type.
    /// Only extern parameters spell it.
    Meta,
    /// Parser placeholder for an identifier in type position, resolved
    /// during type checking
    Unknown { name: String },
    /// Internal; accepts any operand. Only the built-in `print` parameter
    /// carries it.
    Any,
}

/// A named enum type. Members keep their declaration order; the index map
/// serves name lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumType {
    pub name: String,
    pub members: Vec<EnumMember>,
    index: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumMember {
    pub name: String,
    pub span: Span,
}

impl EnumType {
    pub fn new(name: impl Into<String>, members: Vec<EnumMember>) -> Self {
        let index = members
            .iter()
            .enumerate()
            .map(|(i, m)| (m.name.clone(), i))
            .collect();
        Self {
            name: name.into(),
            members,
            index,
        }
    }

    pub fn member(&self, name: &str) -> Option<&EnumMember> {
        self.index.get(name).map(|&i| &self.members[i])
    }
}

/// A named struct type with ordered fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructType {
    pub name: String,
    pub fields: Vec<Variable>,
}

impl StructType {
    pub fn field(&self, name: &str) -> Option<&Variable> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A named, typed slot: struct field or function parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub ty: Ty,
    pub span: Span,
}

/// A function signature plus its body's scope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FnType {
    pub name: String,
    pub params: Vec<Variable>,
    pub return_type: Ty,
    /// The body block's scope; absent for bodiless built-ins
    pub scope: Option<ScopeId>,
}

impl Ty {
    pub fn new(kind: TyKind, span: Span) -> Self {
        Self { kind, span }
    }

    // ============ Constructors ============

    pub fn void(span: Span) -> Self {
        Self::new(TyKind::Void, span)
    }

    pub fn int(span: Span) -> Self {
        Self::new(TyKind::Int, span)
    }

    pub fn float(span: Span) -> Self {
        Self::new(TyKind::Float, span)
    }

    pub fn string(span: Span) -> Self {
        Self::new(TyKind::String, span)
    }

    pub fn bool(span: Span) -> Self {
        Self::new(TyKind::Bool, span)
    }

    pub fn char(span: Span) -> Self {
        Self::new(TyKind::Char, span)
    }

    pub fn meta(span: Span) -> Self {
        Self::new(TyKind::Meta, span)
    }

    pub fn any(span: Span) -> Self {
        Self::new(TyKind::Any, span)
    }

    pub fn pointer(pointee: Ty, span: Span) -> Self {
        Self::new(
            TyKind::Pointer {
                pointee: Box::new(pointee),
            },
            span,
        )
    }

    pub fn unknown(name: impl Into<String>, span: Span) -> Self {
        Self::new(TyKind::Unknown { name: name.into() }, span)
    }

    // ============ Predicates ============

    pub fn is_void(&self) -> bool {
        matches!(self.kind, TyKind::Void)
    }

    pub fn is_int(&self) -> bool {
        matches!(self.kind, TyKind::Int)
    }

    pub fn is_float(&self) -> bool {
        matches!(self.kind, TyKind::Float)
    }

    pub fn is_string(&self) -> bool {
        matches!(self.kind, TyKind::String)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self.kind, TyKind::Bool)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.kind, TyKind::Int | TyKind::Float)
    }

    pub fn is_meta(&self) -> bool {
        matches!(self.kind, TyKind::Meta)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self.kind, TyKind::Unknown { .. })
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self.kind, TyKind::Pointer { .. })
    }

    pub fn is_any(&self) -> bool {
        matches!(self.kind, TyKind::Any)
    }

    /// Primitive value types, the ones a type keyword can spell
    pub fn is_primitive(&self) -> bool {
        matches!(
            self.kind,
            TyKind::Void | TyKind::Int | TyKind::Float | TyKind::String | TyKind::Bool | TyKind::Char
        )
    }
}

/// Structural type equality. `Any` as the destination accepts everything;
/// enums and structs compare nominally; pointers compare their pointees
/// recursively; everything else compares by base alone.
pub fn types_equal(dest: &Ty, src: &Ty) -> bool {
    if dest.is_any() {
        return true;
    }
    match (&dest.kind, &src.kind) {
        (TyKind::Enum(a), TyKind::Enum(b)) => a.name == b.name,
        (TyKind::Struct(a), TyKind::Struct(b)) => a.name == b.name,
        (TyKind::Pointer { pointee: a }, TyKind::Pointer { pointee: b }) => types_equal(a, b),
        (a, b) => std::mem::discriminant(a) == std::mem::discriminant(b),
    }
}

/// Whether a value of type `src` may be assigned to a slot of type `dest`
pub fn can_assign(dest: &Ty, src: &Ty) -> bool {
    types_equal(dest, src)
}

/// Assignability with knowledge of whether the source expression is a type
/// reference. A `Meta` destination accepts type references and nothing else.
pub fn can_assign_with_context(dest: &Ty, src: &Ty, is_type_reference: bool) -> bool {
    if dest.is_meta() {
        return is_type_reference;
    }
    types_equal(dest, src)
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TyKind::Void => write!(f, "void"),
            TyKind::Int => write!(f, "int"),
            TyKind::Float => write!(f, "float"),
            TyKind::String => write!(f, "string"),
            TyKind::Bool => write!(f, "bool"),
            TyKind::Char => write!(f, "char"),
            TyKind::Pointer { pointee } => write!(f, "&{}", pointee),
            TyKind::Enum(e) => write!(f, "{}", e.name),
            TyKind::Struct(s) => write!(f, "{}", s.name),
            TyKind::Function(func) => write!(f, "{}", func.name),
            TyKind::Meta => write!(f, "type"),
            TyKind::Unknown { name } => write!(f, "<unknown: {}>", name),
            TyKind::Any => write!(f, "any"),
        }
    }
}
