/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */

use std::fmt;
use std::fmt::Display;

use pyflow_util::lined_buffer::DisplayRange;
use ruff_text_size::TextRange;
use vec1::Vec1;

use crate::error::config::Severity;
use crate::error::kind::ErrorKind;
use crate::module::module_info::ModuleInfo;

/// A single diagnostic produced while binding a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    module_info: ModuleInfo,
    range: TextRange,
    display_range: DisplayRange,
    severity: Severity,
    kind: ErrorKind,
    msg: Vec1<String>,
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {} [{}]",
            self.module_info.path(),
            self.display_range,
            self.msg.join("\n  "),
            self.kind,
        )
    }
}

impl Error {
    pub fn new(
        module_info: ModuleInfo,
        range: TextRange,
        severity: Severity,
        kind: ErrorKind,
        msg: Vec1<String>,
    ) -> Self {
        let display_range = module_info.display_range(range);
        Self {
            module_info,
            range,
            display_range,
            severity,
            kind,
            msg,
        }
    }

    pub fn range(&self) -> TextRange {
        self.range
    }

    pub fn display_range(&self) -> &DisplayRange {
        &self.display_range
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn msg(&self) -> String {
        self.msg.join("\n")
    }
}
