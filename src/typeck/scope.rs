//! Scope tree and symbol table
//!
//! Scopes live in an arena owned by the `Program` and refer to each other by
//! `ScopeId`, so the parent/child structure carries no reference cycles. The
//! parser allocates one scope per block; the type checker fills the symbol
//! tables in its two passes. Symbol tables are ordered maps so serialised
//! programs are byte-stable.

use crate::span::Span;
use crate::typeck::ty::Ty;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Index of a scope in its program's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeId(pub u32);

/// What a symbol names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymbolKind {
    Function,
    Variable,
    Argument,
    Enum,
    Struct,
}

/// A named entry in a scope's symbol table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub ty: Ty,
    pub span: Span,
}

impl Symbol {
    pub fn new(name: impl Into<String>, kind: SymbolKind, ty: Ty, span: Span) -> Self {
        Self {
            name: name.into(),
            kind,
            ty,
            span,
        }
    }
}

/// One lexical scope
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    pub symbols: BTreeMap<String, Symbol>,
}

/// The arena of all scopes of a program. Index 0 is always the global scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeArena {
    scopes: Vec<Scope>,
}

impl ScopeArena {
    /// Create an arena holding just the global scope
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    /// Allocate a new scope as a child of `parent`
    pub fn alloc(&mut self, parent: ScopeId) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            parent: Some(parent),
            children: Vec::new(),
            symbols: BTreeMap::new(),
        });
        self.scopes[parent.0 as usize].children.push(id);
        id
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Insert a symbol into a scope. An existing symbol of the same name in
    /// the same scope is replaced (shadowing across scopes is handled by
    /// lookup order instead).
    pub fn insert(&mut self, scope: ScopeId, symbol: Symbol) {
        self.get_mut(scope).symbols.insert(symbol.name.clone(), symbol);
    }

    /// Walk the scope chain from `from` towards the root and return the
    /// first symbol with the given name. Inner symbols shadow outer ones.
    pub fn lookup(&self, from: ScopeId, name: &str) -> Option<&Symbol> {
        let scope = self.lookup_scope(from, name)?;
        self.get(scope).symbols.get(name)
    }

    /// Like `lookup`, but returns the scope that holds the symbol
    pub fn lookup_scope(&self, from: ScopeId, name: &str) -> Option<ScopeId> {
        let mut current = Some(from);
        while let Some(id) = current {
            if self.get(id).symbols.contains_key(name) {
                return Some(id);
            }
            current = self.get(id).parent;
        }
        None
    }

    /// Number of hops from `id` to the root
    pub fn depth(&self, id: ScopeId) -> usize {
        let mut depth = 0;
        let mut current = self.get(id).parent;
        while let Some(id) = current {
            depth += 1;
            current = self.get(id).parent;
        }
        depth
    }
}

impl Default for ScopeArena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typeck::ty::Ty;

    fn sym(name: &str) -> Symbol {
        Symbol::new(name, SymbolKind::Variable, Ty::int(Span::default()), Span::default())
    }

    #[test]
    fn test_lookup_walks_parents() {
        let mut arena = ScopeArena::new();
        let root = arena.root();
        let inner = arena.alloc(root);
        arena.insert(root, sym("x"));

        assert!(arena.lookup(inner, "x").is_some());
        assert!(arena.lookup(inner, "y").is_none());
    }

    #[test]
    fn test_shadowing_prefers_inner() {
        let mut arena = ScopeArena::new();
        let root = arena.root();
        let inner = arena.alloc(root);

        let mut outer_sym = sym("x");
        outer_sym.ty = Ty::int(Span::default());
        arena.insert(root, outer_sym);

        let mut inner_sym = sym("x");
        inner_sym.ty = Ty::string(Span::default());
        arena.insert(inner, inner_sym);

        let found = arena.lookup(inner, "x").unwrap();
        assert!(found.ty.is_string());
        let found_outer = arena.lookup(root, "x").unwrap();
        assert!(found_outer.ty.is_int());
    }

    #[test]
    fn test_parent_chain_reaches_root() {
        let mut arena = ScopeArena::new();
        let mut current = arena.root();
        for _ in 0..5 {
            current = arena.alloc(current);
        }
        assert_eq!(arena.depth(current), 5);

        // Walking parents terminates at the root
        let mut hops = 0;
        let mut cursor = Some(current);
        while let Some(id) = cursor {
            cursor = arena.get(id).parent;
            hops += 1;
            assert!(hops <= arena.len());
        }
    }

    #[test]
    fn test_children_recorded() {
        let mut arena = ScopeArena::new();
        let root = arena.root();
        let a = arena.alloc(root);
        let b = arena.alloc(root);
        assert_eq!(arena.get(root).children, vec![a, b]);
        assert_eq!(arena.get(a).parent, Some(root));
    }
}
