/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Scopes and the symbols they bind. Scopes form a tree mirroring the
//! lexical nesting of the module; symbols carry an append-only list of
//! declarations in source order.

use bitflags::bitflags;
use dupe::Dupe;
use parse_display::Display;
use pyflow_util::index::Arena;
use pyflow_util::index::Idx;
use ruff_python_ast::name::Name;
use ruff_text_size::TextRange;
use starlark_map::small_map::SmallMap;

use crate::binding::declaration::Declaration;
use crate::binding::declaration::DeclarationId;

pub type ScopeId = Idx<Scope>;
pub type SymbolId = Idx<Symbol>;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SymbolFlags: u16 {
        /// The symbol may be referenced before any assignment runs.
        const INITIALLY_UNBOUND = 1 << 0;
        /// Bound in a class body.
        const CLASS_MEMBER = 1 << 1;
        /// Bound by assignment to an attribute of `self` in a method.
        const INSTANCE_MEMBER = 1 << 2;
        /// Annotated with `ClassVar`.
        const CLASS_VAR = 1 << 3;
        /// The name is private by convention (leading underscore).
        const PRIVATE_MEMBER = 1 << 4;
        /// A stub file bound this name without re-exporting it.
        const EXTERNALLY_HIDDEN = 1 << 5;
        /// Excluded when matching this class against a protocol.
        const IGNORED_FOR_PROTOCOL_MATCH = 1 << 6;
    }
}

#[derive(Debug)]
pub struct Symbol {
    pub name: Name,
    pub flags: SymbolFlags,
    /// Declarations in source order. Append-only.
    pub declarations: Vec<DeclarationId>,
}

#[derive(Debug, Clone, Copy, Dupe, PartialEq, Eq, Display)]
pub enum ScopeKind {
    Builtin,
    Module,
    Class,
    Function,
    ListComprehension,
}

impl ScopeKind {
    /// Execution scopes are where bindings correspond to runtime name
    /// resolution; class and comprehension scopes are lexical only.
    pub fn is_execution_scope(self) -> bool {
        matches!(self, Self::Builtin | Self::Module | Self::Function)
    }
}

#[derive(Debug)]
pub struct Scope {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    pub range: TextRange,
    pub symbols: SmallMap<Name, SymbolId>,
}

/// The scope tree plus the arenas backing it. Scopes outlive the walker
/// frames that create them (deferred function binding reopens them), so
/// everything is arena-allocated and passed around by id.
#[derive(Debug, Default)]
pub struct Scopes {
    scopes: Arena<Scope>,
    symbols: Arena<Symbol>,
    declarations: Arena<Declaration>,
}

impl Scopes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_scope(&mut self, kind: ScopeKind, parent: Option<ScopeId>, range: TextRange) -> ScopeId {
        self.scopes.insert(Scope {
            kind,
            parent,
            range,
            symbols: SmallMap::new(),
        })
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        self.scopes.get(id)
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        self.symbols.get(id)
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        self.symbols.get_mut(id)
    }

    pub fn declaration(&self, id: DeclarationId) -> &Declaration {
        self.declarations.get(id)
    }

    pub fn declaration_mut(&mut self, id: DeclarationId) -> &mut Declaration {
        self.declarations.get_mut(id)
    }

    /// Install a new symbol in a scope. The caller must have checked the
    /// name is not already bound there.
    pub fn add_symbol(&mut self, scope: ScopeId, name: Name, flags: SymbolFlags) -> SymbolId {
        let id = self.symbols.insert(Symbol {
            name: name.clone(),
            flags,
            declarations: Vec::new(),
        });
        let previous = self.scopes.get_mut(scope).symbols.insert(name, id);
        assert!(previous.is_none(), "symbol bound twice in one scope");
        id
    }

    /// Append a declaration to a symbol, returning its id.
    pub fn add_declaration(&mut self, symbol: SymbolId, declaration: Declaration) -> DeclarationId {
        let id = self.declarations.insert(declaration);
        self.symbols.get_mut(symbol).declarations.push(id);
        id
    }

    /// Record a declaration that is not associated with any symbol
    /// (e.g. a function that will only ever be reached through its node).
    pub fn add_unbound_declaration(&mut self, declaration: Declaration) -> DeclarationId {
        self.declarations.insert(declaration)
    }

    /// The symbol bound directly in this scope, if any.
    pub fn look_up(&self, scope: ScopeId, name: &Name) -> Option<SymbolId> {
        self.scope(scope).symbols.get(name).copied()
    }

    /// Walk parent pointers looking for a symbol. Class scopes are not on
    /// the closure chain: a name bound in a class body is invisible to
    /// scopes nested inside that class.
    pub fn look_up_recursive(&self, scope: ScopeId, name: &Name) -> Option<(SymbolId, ScopeId)> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = self.scope(id);
            let skip = s.kind == ScopeKind::Class && id != scope;
            if !skip && let Some(symbol) = s.symbols.get(name) {
                return Some((*symbol, id));
            }
            current = s.parent;
        }
        None
    }

    /// The nearest enclosing scope (possibly this one) of kind Module or Builtin.
    pub fn global_scope(&self, scope: ScopeId) -> ScopeId {
        let mut current = scope;
        loop {
            let s = self.scope(current);
            if matches!(s.kind, ScopeKind::Module | ScopeKind::Builtin) {
                return current;
            }
            match s.parent {
                Some(parent) => current = parent,
                None => return current,
            }
        }
    }

    /// The nearest enclosing execution scope (possibly this one).
    pub fn execution_scope(&self, scope: ScopeId) -> ScopeId {
        let mut current = scope;
        loop {
            let s = self.scope(current);
            if s.kind.is_execution_scope() {
                return current;
            }
            match s.parent {
                Some(parent) => current = parent,
                None => return current,
            }
        }
    }

    /// The nearest enclosing non-class scope (possibly this one). Function
    /// scopes hang off this rather than off a class body.
    pub fn non_class_scope(&self, scope: ScopeId) -> ScopeId {
        let mut current = scope;
        loop {
            let s = self.scope(current);
            if s.kind != ScopeKind::Class {
                return current;
            }
            match s.parent {
                Some(parent) => current = parent,
                None => return current,
            }
        }
    }

    pub fn scope_ids(&self) -> impl Iterator<Item = ScopeId> + '_ {
        self.scopes.items().map(|(id, _)| id)
    }

    pub fn symbol_ids(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.symbols.items().map(|(id, _)| id)
    }
}
