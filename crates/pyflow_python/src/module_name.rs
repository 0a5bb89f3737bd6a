/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */

use std::fmt;
use std::fmt::Display;

use ruff_python_ast::name::Name;

/// The dotted name of a module, e.g. `os.path`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleName(Name);

impl Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ModuleName {
    pub fn from_str(x: &str) -> Self {
        Self(Name::new(x))
    }

    pub fn from_name(x: &Name) -> Self {
        Self(x.clone())
    }

    pub fn builtins() -> Self {
        Self::from_str("builtins")
    }

    pub fn typing() -> Self {
        Self::from_str("typing")
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_typing_stub(&self) -> bool {
        matches!(self.as_str(), "typing" | "typing_extensions")
    }

    pub fn components(&self) -> Vec<Name> {
        self.0.split('.').map(Name::new).collect()
    }

    pub fn first_component(&self) -> Name {
        match self.0.split_once('.') {
            None => self.0.clone(),
            Some((first, _)) => Name::new(first),
        }
    }

    pub fn append(&self, part: &Name) -> Self {
        Self(Name::new(format!("{}.{part}", self.0)))
    }

    /// Resolve a `from` import against this module's name. `level` is the
    /// number of leading dots; `is_init` says whether this module is a
    /// package `__init__` (in which case the module itself is the package
    /// the first dot refers to). Returns `None` when the dots escape the
    /// package root.
    pub fn new_maybe_relative(
        &self,
        is_init: bool,
        level: u32,
        module: Option<&Name>,
    ) -> Option<ModuleName> {
        if level == 0 {
            return module.map(ModuleName::from_name);
        }
        let mut components = self.components();
        let mut pops = level;
        if is_init {
            pops -= 1;
        }
        for _ in 0..pops {
            components.pop()?;
        }
        if let Some(module) = module {
            components.extend(module.split('.').map(Name::new));
        }
        if components.is_empty() {
            return None;
        }
        Some(Self(Name::new(
            components
                .iter()
                .map(Name::as_str)
                .collect::<Vec<_>>()
                .join("."),
        )))
    }
}
