/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! What the binder is allowed to know about other modules. Import *path*
//! resolution happens before binding; the binder only consumes its results,
//! via the per-node [`ImportInfo`] side channel and the [`ImportLookup`]
//! capability for symbol tables of already-resolved files.

use dupe::Dupe;
use pyflow_python::dunder;
use pyflow_python::module_path::ModulePath;
use ruff_python_ast::name::Name;
use ruff_text_size::TextRange;
use starlark_map::small_map::SmallMap;

/// Metadata about one name exported from a module.
#[derive(Debug, Clone, Copy, Dupe, Default)]
pub struct ExportedName {
    /// The defining module marked this name as not part of its public surface.
    pub is_externally_hidden: bool,
    /// The name should not participate in protocol matching (e.g. some
    /// synthesized stub internals).
    pub is_ignored_for_protocol_match: bool,
}

/// The symbol table of another module, as far as imports are concerned.
#[derive(Debug, Clone, Default)]
pub struct ModuleExports {
    names: SmallMap<Name, ExportedName>,
    dunder_all: Option<Vec<Name>>,
}

impl ModuleExports {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_names(names: impl IntoIterator<Item = Name>) -> Self {
        let mut res = Self::new();
        for name in names {
            res.add(name, ExportedName::default());
        }
        res
    }

    pub fn add(&mut self, name: Name, info: ExportedName) {
        self.names.insert(name, info);
    }

    /// Record an explicit `__all__` export list.
    pub fn set_dunder_all(&mut self, names: Vec<Name>) {
        self.dunder_all = Some(names);
    }

    pub fn contains(&self, name: &Name) -> bool {
        self.names.contains_key(name)
    }

    pub fn get(&self, name: &Name) -> Option<ExportedName> {
        self.names.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &Name> {
        self.names.keys()
    }

    /// The names a `from m import *` pulls in: the advertised export list if
    /// there is one, otherwise every public name that isn't excluded from
    /// protocol matching.
    pub fn wildcard(&self) -> Vec<Name> {
        match &self.dunder_all {
            Some(all) => all.clone(),
            None => self
                .names
                .iter()
                .filter(|(name, info)| {
                    !name.starts_with('_') && !info.is_ignored_for_protocol_match
                })
                .map(|(name, _)| name.clone())
                .collect(),
        }
    }
}

/// Look up the symbol table of a module whose path was already resolved.
pub trait ImportLookup {
    fn get(&self, path: &ModulePath) -> Option<ModuleExports>;
}

/// A lookup with no modules, for callers that bind files in isolation.
pub struct NoImports;

impl ImportLookup for NoImports {
    fn get(&self, _path: &ModulePath) -> Option<ModuleExports> {
        None
    }
}

#[derive(Debug, Clone, Copy, Dupe, PartialEq, Eq)]
pub enum ImportType {
    BuiltIn,
    ThirdParty,
    Local,
}

/// A package child module visible as an attribute of the package.
#[derive(Debug, Clone)]
pub struct ImplicitImport {
    pub name: Name,
    pub path: ModulePath,
}

/// What import resolution discovered for one module-name node. Produced by
/// a pre-pass; the binder never touches the filesystem.
#[derive(Debug, Clone)]
pub struct ImportInfo {
    pub is_import_found: bool,
    pub is_stub_file: bool,
    pub import_type: ImportType,
    pub is_py_typed_present: bool,
    /// When the import resolved to a stub, whether a matching source file exists.
    pub has_source_file: bool,
    /// The resolved file path at each dotted depth; `None` at depths that
    /// did not resolve.
    pub resolved_paths: Vec<Option<ModulePath>>,
    pub implicit_imports: Vec<ImplicitImport>,
}

impl ImportInfo {
    pub fn not_found() -> Self {
        Self {
            is_import_found: false,
            is_stub_file: false,
            import_type: ImportType::Local,
            is_py_typed_present: false,
            has_source_file: false,
            resolved_paths: Vec::new(),
            implicit_imports: Vec::new(),
        }
    }

    /// The path of the innermost dotted part, if it resolved.
    pub fn resolved_path(&self) -> Option<&ModulePath> {
        self.resolved_paths.last()?.as_ref()
    }

    pub fn implicit_import(&self, name: &Name) -> Option<&ImplicitImport> {
        self.implicit_imports.iter().find(|x| &x.name == name)
    }
}

/// The per-node import side channel, keyed by the module-name node's range
/// (each `import` alias, or the whole `from` statement).
#[derive(Debug, Default)]
pub struct ImportMap(SmallMap<TextRange, ImportInfo>);

impl ImportMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, range: TextRange, info: ImportInfo) {
        self.0.insert(range, info);
    }

    pub fn get(&self, range: TextRange) -> Option<&ImportInfo> {
        self.0.get(&range)
    }
}

/// Parse an `__all__ = [...]` style export list out of a module body, so
/// lookups built from sources can honor explicit export lists.
pub fn dunder_all_names(body: &[ruff_python_ast::Stmt]) -> Option<Vec<Name>> {
    use ruff_python_ast::Expr;
    use ruff_python_ast::Stmt;
    for stmt in body {
        if let Stmt::Assign(x) = stmt
            && let [Expr::Name(target)] = x.targets.as_slice()
            && target.id.as_str() == dunder::ALL
        {
            let elements = match &*x.value {
                Expr::List(x) => &x.elts,
                Expr::Tuple(x) => &x.elts,
                _ => continue,
            };
            let mut names = Vec::with_capacity(elements.len());
            for e in elements {
                if let Expr::StringLiteral(s) = e {
                    names.push(Name::new(s.value.to_str()));
                }
            }
            return Some(names);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use pyflow_python::ast::Ast;

    use super::*;

    #[test]
    fn test_wildcard_names() {
        let mut exports = ModuleExports::from_names([
            Name::new("public"),
            Name::new("_private"),
            Name::new("other"),
        ]);
        exports.add(
            Name::new("synthesized"),
            ExportedName {
                is_externally_hidden: false,
                is_ignored_for_protocol_match: true,
            },
        );
        let wildcard = exports.wildcard();
        assert_eq!(wildcard.len(), 2);
        assert!(wildcard.contains(&Name::new("public")));
        assert!(wildcard.contains(&Name::new("other")));

        exports.set_dunder_all(vec![Name::new("_private")]);
        assert_eq!(exports.wildcard(), vec![Name::new("_private")]);
    }

    #[test]
    fn test_dunder_all_names() {
        let (module, _) = Ast::parse("x = 1\n__all__ = [\"a\", \"b\"]\n");
        assert_eq!(
            dunder_all_names(&module.body),
            Some(vec![Name::new("a"), Name::new("b")])
        );
        let (module, _) = Ast::parse("x = 1\n");
        assert_eq!(dunder_all_names(&module.body), None);
    }
}
