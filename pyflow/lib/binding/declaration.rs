/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Declarations: the per-symbol record of where and how a name was bound.
//! A symbol accumulates one declaration per binding site, in source order.

use dupe::Dupe;
use pyflow_python::module_path::ModulePath;
use pyflow_util::index::Idx;
use ruff_python_ast::name::Name;
use ruff_text_size::TextRange;
use starlark_map::small_map::SmallMap;

use crate::binding::table::NodeKey;
use crate::export::special::SpecialBuiltIn;

pub type DeclarationId = Idx<Declaration>;

#[derive(Debug)]
pub enum Declaration {
    Variable(VariableDeclaration),
    Parameter(ParameterDeclaration),
    Function(FunctionDeclaration),
    Class(ClassDeclaration),
    Alias(AliasDeclaration),
    Intrinsic(IntrinsicDeclaration),
    SpecialBuiltInClass(SpecialBuiltInClassDeclaration),
}

impl Declaration {
    pub fn range(&self) -> TextRange {
        match self {
            Self::Variable(x) => x.range,
            Self::Parameter(x) => x.range,
            Self::Function(x) => x.range,
            Self::Class(x) => x.range,
            Self::Alias(x) => x.range,
            Self::Intrinsic(x) => x.range,
            Self::SpecialBuiltInClass(x) => x.range,
        }
    }

    pub fn as_function_mut(&mut self) -> Option<&mut FunctionDeclaration> {
        match self {
            Self::Function(x) => Some(x),
            _ => None,
        }
    }

    pub fn as_alias_mut(&mut self) -> Option<&mut AliasDeclaration> {
        match self {
            Self::Alias(x) => Some(x),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct VariableDeclaration {
    pub range: TextRange,
    /// The name follows the ALL_CAPS constant convention.
    pub is_constant: bool,
    /// The expression the variable's type would be inferred from.
    pub inferred_source: Option<NodeKey>,
    /// The annotation node, for annotated declarations.
    pub annotation: Option<NodeKey>,
    pub is_final: bool,
    /// Declared via assignment to `self.<name>` rather than a bare name.
    pub is_defined_by_member_access: bool,
    /// Set when the declaration looks like it may define a type alias.
    pub type_alias_name: Option<Name>,
    /// The annotation that made this an explicit `TypeAlias` declaration.
    pub type_alias_annotation: Option<NodeKey>,
}

#[derive(Debug)]
pub struct ParameterDeclaration {
    pub node: NodeKey,
    pub range: TextRange,
}

#[derive(Debug)]
pub struct FunctionDeclaration {
    pub node: NodeKey,
    pub range: TextRange,
    pub is_method: bool,
    pub is_async: bool,
    /// Set when any `yield` is seen in the body, reachable or not.
    pub is_generator: bool,
    /// Statement lists appended while walking the body.
    pub returns: Vec<NodeKey>,
    pub raises: Vec<NodeKey>,
    pub yields: Vec<NodeKey>,
}

impl FunctionDeclaration {
    pub fn new(node: NodeKey, range: TextRange, is_method: bool, is_async: bool) -> Self {
        Self {
            node,
            range,
            is_method,
            is_async,
            is_generator: false,
            returns: Vec::new(),
            raises: Vec::new(),
            yields: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub struct ClassDeclaration {
    pub node: NodeKey,
    pub range: TextRange,
}

/// A declaration produced by an import. `import a.b.c` produces one alias
/// declaration for `a`, whose loader-actions tree mirrors the dotted name;
/// repeated imports with the same first part extend the same tree.
#[derive(Debug, Default)]
pub struct AliasDeclaration {
    pub range: TextRange,
    /// The file the alias resolves to; `None` when resolution failed, in
    /// which case uses evaluate to an unknown type rather than an unbound one.
    pub path: Option<ModulePath>,
    /// The name imported from the source module (`from m import name`).
    pub symbol_name: Option<Name>,
    /// An explicit `as` alias was supplied.
    pub uses_local_name: bool,
    /// For multi-part imports, the first dotted part this symbol binds.
    pub first_name_part: Option<Name>,
    /// A sibling submodule to fall back to when the name is not an
    /// attribute of the source module.
    pub submodule_fallback: Option<Box<AliasDeclaration>>,
    pub implicit_imports: SmallMap<Name, ModuleLoaderActions>,
}

/// A tree mirroring a dotted module name. At each depth the path is either
/// the resolved file at that depth, or `None` for a non-terminal part.
#[derive(Debug, Default)]
pub struct ModuleLoaderActions {
    pub path: Option<ModulePath>,
    pub implicit_imports: SmallMap<Name, ModuleLoaderActions>,
}

/// The semantic type of a module-level intrinsic such as `__name__`.
#[derive(Debug, Clone, Copy, Dupe, PartialEq, Eq)]
pub enum IntrinsicKind {
    Str,
    Any,
    StrDict,
    StrIterable,
}

#[derive(Debug)]
pub struct IntrinsicDeclaration {
    pub range: TextRange,
    pub kind: IntrinsicKind,
}

#[derive(Debug)]
pub struct SpecialBuiltInClassDeclaration {
    pub range: TextRange,
    pub special: SpecialBuiltIn,
}

/// Python's convention for constants: all uppercase, underscores and digits allowed.
pub fn is_constant_name(name: &str) -> bool {
    !name.is_empty()
        && name.chars().any(|c| c.is_ascii_uppercase())
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
