/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */

use std::sync::Arc;

use dupe::Dupe;
use pyflow_python::ast::Ast;
use pyflow_python::module_name::ModuleName;
use pyflow_python::module_path::ModulePath;
use pyflow_util::lined_buffer::DisplayRange;
use pyflow_util::lined_buffer::LinedBuffer;
use ruff_python_ast::ModModule;
use ruff_text_size::TextRange;
use vec1::vec1;

use crate::error::collector::ErrorCollector;
use crate::error::kind::ErrorKind;

/// Information about a module, notably its name, path, and contents.
#[derive(Debug, Clone, Dupe)]
pub struct ModuleInfo(Arc<ModuleInfoInner>);

#[derive(Debug)]
struct ModuleInfoInner {
    name: ModuleName,
    path: ModulePath,
    contents: LinedBuffer,
}

impl PartialEq for ModuleInfo {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ModuleInfo {}

impl ModuleInfo {
    /// Create a new ModuleInfo. Will NOT read the `path`, but use the value from `contents` instead.
    pub fn new(name: ModuleName, path: ModulePath, contents: Arc<String>) -> Self {
        let contents = LinedBuffer::new(contents);
        Self(Arc::new(ModuleInfoInner {
            name,
            path,
            contents,
        }))
    }

    pub fn name(&self) -> &ModuleName {
        &self.0.name
    }

    pub fn path(&self) -> &ModulePath {
        &self.0.path
    }

    pub fn contents(&self) -> &Arc<String> {
        self.0.contents.contents()
    }

    pub fn line_count(&self) -> usize {
        self.0.contents.line_count()
    }

    pub fn code_at(&self, range: TextRange) -> &str {
        self.0.contents.code_at(range)
    }

    pub fn display_range(&self, range: TextRange) -> DisplayRange {
        self.0.contents.display_range(range)
    }

    /// Is this module a stub (`.pyi`) file?
    pub fn is_interface(&self) -> bool {
        self.0.path.is_interface()
    }

    /// Is this the stub that defines the `typing` module itself?
    pub fn is_typing_stub(&self) -> bool {
        self.is_interface() && self.0.name.is_typing_stub()
    }

    pub fn parse(&self, errors: &ErrorCollector) -> ModModule {
        let (module, parse_errors) = Ast::parse(self.contents());
        for err in parse_errors {
            errors.add(
                err.location,
                ErrorKind::ParseError,
                vec1![format!("Parse error: {}", err.error)],
            );
        }
        module
    }
}
