/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Binding import statements. Path resolution already happened; here we
//! turn its results into alias declarations (with loader-actions trees for
//! dotted imports), bind the right local names, and report what did not
//! resolve. An unresolved import still binds an alias with no path, so
//! uses evaluate to an unknown type rather than an unbound one.

use ruff_python_ast::Alias;
use ruff_python_ast::Identifier;
use ruff_python_ast::StmtImport;
use ruff_python_ast::StmtImportFrom;
use ruff_python_ast::name::Name;
use ruff_text_size::TextRange;
use starlark_map::small_map::SmallMap;
use vec1::vec1;

use crate::binding::binder::Binder;
use crate::binding::declaration::AliasDeclaration;
use crate::binding::declaration::Declaration;
use crate::binding::declaration::DeclarationId;
use crate::binding::declaration::ModuleLoaderActions;
use crate::binding::flow::AssignTarget;
use crate::binding::narrow::ReferenceKey;
use crate::binding::scope::SymbolFlags;
use crate::binding::scope::SymbolId;
use crate::binding::table::NodeKey;
use crate::error::kind::ErrorKind;
use crate::export::lookup::ImportInfo;
use crate::export::lookup::ImportType;

impl<'a> Binder<'a> {
    pub(crate) fn import_stmt(&mut self, x: &'a StmtImport) {
        for alias in &x.names {
            self.import_alias(alias);
        }
    }

    fn import_alias(&mut self, alias: &'a Alias) {
        // Copy the map reference out so the info borrow is independent of `self`.
        let imports = self.imports;
        let info = imports.get(alias.name.range);
        self.import_diagnostics(alias.name.range, info, alias.name.as_str());
        match &alias.asname {
            Some(asname) => {
                // `import a.b.c as d` binds `d` directly to the innermost module.
                let symbol = self.bind_name(&asname.id);
                self.stub_visibility(symbol, Some(asname), &alias.name);
                let mut declaration = AliasDeclaration {
                    range: asname.range,
                    path: info.and_then(|i| i.resolved_path()).cloned(),
                    uses_local_name: true,
                    ..Default::default()
                };
                if let Some(info) = info {
                    add_implicit_siblings(&mut declaration.implicit_imports, info);
                }
                self.scopes
                    .add_declaration(symbol, Declaration::Alias(declaration));
                self.assignment_flow(
                    NodeKey::ident(asname),
                    AssignTarget::Symbol(symbol),
                    Some(ReferenceKey::of_name(&asname.id)),
                    false,
                );
            }
            None => {
                // `import a.b.c` binds `a`, with a loader-actions tree
                // recording that `a.b` and `a.b.c` become reachable.
                let parts = alias
                    .name
                    .id
                    .split('.')
                    .map(Name::new)
                    .collect::<Vec<_>>();
                let symbol = self.bind_name(&parts[0]);
                self.stub_visibility(symbol, None, &alias.name);
                self.extend_module_alias(symbol, alias, &parts, info);
                self.assignment_flow(
                    NodeKey::Identifier(alias.name.range),
                    AssignTarget::Symbol(symbol),
                    Some(ReferenceKey::of_name(&parts[0])),
                    false,
                );
            }
        }
    }

    /// Find the symbol's alias declaration for this first name part and
    /// extend its tree, or start a new declaration. Repeated `import a.b`
    /// and `import a.c` statements build one unified tree on `a`.
    fn extend_module_alias(
        &mut self,
        symbol: SymbolId,
        alias: &'a Alias,
        parts: &[Name],
        info: Option<&ImportInfo>,
    ) {
        let first = &parts[0];
        let existing: Option<DeclarationId> = self
            .scopes
            .symbol(symbol)
            .declarations
            .iter()
            .copied()
            .find(|id| {
                matches!(
                    self.scopes.declaration(*id),
                    Declaration::Alias(a) if a.first_name_part.as_ref() == Some(first)
                )
            });
        match existing {
            Some(id) => {
                if let Some(declaration) = self.scopes.declaration_mut(id).as_alias_mut() {
                    extend_loader_actions(declaration, parts, info);
                }
            }
            None => {
                let mut declaration = AliasDeclaration {
                    range: alias.name.range,
                    path: info.and_then(|i| i.resolved_paths.first()).and_then(|p| p.clone()),
                    first_name_part: Some(first.clone()),
                    ..Default::default()
                };
                extend_loader_actions(&mut declaration, parts, info);
                self.scopes
                    .add_declaration(symbol, Declaration::Alias(declaration));
            }
        }
    }

    pub(crate) fn import_from_stmt(&mut self, x: &'a StmtImportFrom) {
        let imports = self.imports;
        let info = imports.get(x.range);
        let display = match &x.module {
            Some(module) => format!("{}{}", ".".repeat(x.level as usize), module.as_str()),
            None => ".".repeat(x.level.max(1) as usize),
        };
        self.import_diagnostics(x.range, info, &display);
        if x.names.len() == 1 && x.names[0].name.as_str() == "*" {
            self.wildcard_import(x, info);
            return;
        }
        // Inside a package's init module, `from .sub import x` also makes
        // the submodule itself visible, unless an imported name shadows it.
        if self.module_info.path().is_init()
            && x.level == 1
            && let Some(module) = &x.module
        {
            let submodule = match module.as_str().split_once('.') {
                Some((first, _)) => Name::new(first),
                None => module.id.clone(),
            };
            let shadowed = x
                .names
                .iter()
                .any(|alias| bound_identifier(alias).id == submodule);
            if !shadowed {
                let symbol = self.bind_name(&submodule);
                self.scopes.add_declaration(
                    symbol,
                    Declaration::Alias(AliasDeclaration {
                        range: module.range,
                        path: info.and_then(|i| i.resolved_path()).cloned(),
                        ..Default::default()
                    }),
                );
                self.assignment_flow(
                    NodeKey::Identifier(module.range),
                    AssignTarget::Symbol(symbol),
                    Some(ReferenceKey::of_name(&submodule)),
                    false,
                );
            }
        }
        for alias in &x.names {
            let bound = bound_identifier(alias);
            let symbol = self.bind_name(&bound.id);
            self.stub_visibility(symbol, alias.asname.as_ref(), &alias.name);
            let submodule_fallback =
                info.and_then(|i| i.implicit_import(&alias.name.id))
                    .map(|implicit| {
                        Box::new(AliasDeclaration {
                            range: alias.name.range,
                            path: Some(implicit.path.clone()),
                            ..Default::default()
                        })
                    });
            self.scopes.add_declaration(
                symbol,
                Declaration::Alias(AliasDeclaration {
                    range: bound.range,
                    path: info.and_then(|i| i.resolved_path()).cloned(),
                    symbol_name: Some(alias.name.id.clone()),
                    uses_local_name: alias.asname.is_some(),
                    submodule_fallback,
                    ..Default::default()
                }),
            );
            self.assignment_flow(
                NodeKey::ident(bound),
                AssignTarget::Symbol(symbol),
                Some(ReferenceKey::of_name(&bound.id)),
                false,
            );
        }
    }

    fn wildcard_import(&mut self, x: &'a StmtImportFrom, info: Option<&ImportInfo>) {
        if !self.at_module_scope() {
            self.error(
                x.range,
                ErrorKind::BadWildcardImport,
                "A wildcard import is only allowed at module scope".to_owned(),
            );
        }
        let Some(exports) = info
            .and_then(|i| i.resolved_path())
            .and_then(|path| self.lookup.get(path))
        else {
            // The unresolved import was already reported.
            return;
        };
        let path = info.and_then(|i| i.resolved_path()).cloned();
        let names = exports.wildcard();
        for name in &names {
            let symbol = self.bind_name(name);
            self.scopes.add_declaration(
                symbol,
                Declaration::Alias(AliasDeclaration {
                    range: x.range,
                    path: path.clone(),
                    symbol_name: Some(name.clone()),
                    ..Default::default()
                }),
            );
        }
        self.wildcard_import_flow(NodeKey::Statement(x.range), names);
    }

    /// Stub files hide imported names from other modules unless the import
    /// re-exports them with `import X as X`.
    fn stub_visibility(
        &mut self,
        symbol: SymbolId,
        asname: Option<&Identifier>,
        name: &Identifier,
    ) {
        if !self.module_info.is_interface() {
            return;
        }
        match asname {
            None => {
                self.scopes
                    .symbol_mut(symbol)
                    .flags
                    .insert(SymbolFlags::EXTERNALLY_HIDDEN);
            }
            Some(asname) if asname.id == name.id => {
                self.scopes
                    .symbol_mut(symbol)
                    .flags
                    .remove(SymbolFlags::EXTERNALLY_HIDDEN);
            }
            Some(_) => {}
        }
    }

    fn import_diagnostics(&mut self, range: TextRange, info: Option<&ImportInfo>, name: &str) {
        let Some(info) = info else { return };
        if !info.is_import_found {
            self.error(
                range,
                ErrorKind::ImportError,
                format!("Import `{name}` could not be resolved"),
            );
            return;
        }
        if info.is_stub_file && !info.has_source_file {
            self.error(
                range,
                ErrorKind::MissingModuleSource,
                format!("Import `{name}` resolved to a stub with no matching source file"),
            );
        }
        if info.import_type == ImportType::ThirdParty
            && !info.is_stub_file
            && !info.is_py_typed_present
        {
            self.error_multiline(
                range,
                ErrorKind::MissingTypeStub,
                vec1![
                    format!("Stub file not found for `{name}`"),
                    "Types will be incomplete until a stub is created".to_owned(),
                ],
            );
        }
    }
}

fn bound_identifier(alias: &Alias) -> &Identifier {
    alias.asname.as_ref().unwrap_or(&alias.name)
}

/// Extend a declaration's loader-actions tree with one dotted import.
/// The tree mirrors the dotted name; each depth carries the file resolved
/// there, and the innermost level also lists the implicit sibling modules.
fn extend_loader_actions(
    declaration: &mut AliasDeclaration,
    parts: &[Name],
    info: Option<&ImportInfo>,
) {
    if declaration.path.is_none() {
        declaration.path = info
            .and_then(|i| i.resolved_paths.first())
            .and_then(|p| p.clone());
    }
    let mut current = &mut declaration.implicit_imports;
    for (depth, part) in parts.iter().enumerate().skip(1) {
        let entry = current
            .entry(part.clone())
            .or_insert(ModuleLoaderActions::default());
        if entry.path.is_none() {
            entry.path = info
                .and_then(|i| i.resolved_paths.get(depth))
                .and_then(|p| p.clone());
        }
        current = &mut entry.implicit_imports;
    }
    if let Some(info) = info {
        add_implicit_siblings(current, info);
    }
}

fn add_implicit_siblings(actions: &mut SmallMap<Name, ModuleLoaderActions>, info: &ImportInfo) {
    for implicit in &info.implicit_imports {
        let entry = actions
            .entry(implicit.name.clone())
            .or_insert(ModuleLoaderActions::default());
        if entry.path.is_none() {
            entry.path = Some(implicit.path.clone());
        }
    }
}
