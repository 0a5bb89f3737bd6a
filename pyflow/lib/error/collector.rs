/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */

use std::cell::RefCell;
use std::fmt::Debug;

use dupe::Dupe;
use ruff_text_size::TextRange;
use vec1::Vec1;

use crate::error::config::RuleConfig;
use crate::error::error::Error;
use crate::error::kind::ErrorKind;
use crate::module::module_info::ModuleInfo;

#[derive(Debug, Default)]
struct ModuleErrors {
    /// Set to `true` when we have no duplicates and are sorted.
    clean: bool,
    items: Vec<Error>,
}

impl ModuleErrors {
    fn push(&mut self, err: Error) {
        self.clean = false;
        self.items.push(err);
    }

    fn cleanup(&mut self) {
        if self.clean {
            return;
        }
        self.clean = true;
        // Sort by source range only, so that the order errors were raised in
        // is preserved for errors at the same location.
        self.items
            .sort_by_key(|x| (x.range().start().to_u32(), x.range().end().to_u32()));
        self.items.dedup();
    }

    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn len(&mut self) -> usize {
        self.cleanup();
        self.items.len()
    }
}

/// Collects the diagnostics raised while binding one module. The binder is
/// single threaded, so interior mutability is enough; the collector is
/// handed around by shared reference.
#[derive(Debug)]
pub struct ErrorCollector {
    module_info: ModuleInfo,
    config: RuleConfig,
    errors: RefCell<ModuleErrors>,
}

impl ErrorCollector {
    pub fn new(module_info: ModuleInfo, config: RuleConfig) -> Self {
        Self {
            module_info,
            config,
            errors: RefCell::new(Default::default()),
        }
    }

    pub fn add(&self, range: TextRange, kind: ErrorKind, msg: Vec1<String>) {
        let Some(severity) = self.config.severity(kind) else {
            return;
        };
        let err = Error::new(self.module_info.dupe(), range, severity, kind, msg);
        self.errors.borrow_mut().push(err);
    }

    pub fn module_info(&self) -> &ModuleInfo {
        &self.module_info
    }

    pub fn is_empty(&self) -> bool {
        self.errors.borrow().is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.borrow_mut().len()
    }

    /// All diagnostics, sorted by source position.
    pub fn collect(&self) -> Vec<Error> {
        let mut errors = self.errors.borrow_mut();
        errors.cleanup();
        errors.items.clone()
    }
}
