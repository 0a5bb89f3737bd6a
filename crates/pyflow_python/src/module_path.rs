/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */

use std::fmt;
use std::fmt::Display;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use dupe::Dupe;

/// The path of a Python file. We distinguish real files from in-memory
/// contents (tests, unsaved editor buffers), but most callers only care
/// about the underlying path.
#[derive(Debug, Clone, Dupe, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModulePath(Arc<ModulePathDetails>);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModulePathDetails {
    FileSystem(PathBuf),
    Memory(PathBuf),
}

impl Display for ModulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_path().display())
    }
}

impl ModulePath {
    pub fn filesystem(path: PathBuf) -> Self {
        Self(Arc::new(ModulePathDetails::FileSystem(path)))
    }

    pub fn memory(path: PathBuf) -> Self {
        Self(Arc::new(ModulePathDetails::Memory(path)))
    }

    pub fn as_path(&self) -> &Path {
        match &*self.0 {
            ModulePathDetails::FileSystem(path) | ModulePathDetails::Memory(path) => path,
        }
    }

    /// Is this a package `__init__` module?
    pub fn is_init(&self) -> bool {
        self.as_path().file_stem() == Some("__init__".as_ref())
    }

    /// Is this a stub (`.pyi`) file?
    pub fn is_interface(&self) -> bool {
        self.as_path().extension() == Some("pyi".as_ref())
    }

    pub fn details(&self) -> &ModulePathDetails {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_classification() {
        assert!(ModulePath::filesystem(PathBuf::from("pkg/__init__.py")).is_init());
        assert!(ModulePath::filesystem(PathBuf::from("pkg/__init__.pyi")).is_interface());
        let plain = ModulePath::filesystem(PathBuf::from("pkg/mod.py"));
        assert!(!plain.is_init());
        assert!(!plain.is_interface());
    }
}
