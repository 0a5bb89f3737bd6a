/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */

use dupe::Dupe;
use parse_display::Display;
use serde::Deserialize;

use crate::error::config::Severity;

/// The category of a diagnostic, used both for display and for
/// per-category severity overrides in the rule configuration.
#[derive(
    Debug, Clone, Copy, Dupe, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Deserialize,
)]
#[display(style = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// The file could not be parsed; reported at the parser's location.
    ParseError,
    /// Syntactically valid input that is nonetheless not legal Python.
    InvalidSyntax,
    /// An escape sequence in a string literal that Python does not recognize.
    InvalidEscapeSequence,
    /// An import whose module could not be resolved.
    ImportError,
    /// An import resolved to a third-party module with no stub and no py.typed marker.
    MissingTypeStub,
    /// An import resolved to a stub file with no matching source file.
    MissingModuleSource,
    /// A walrus target colliding with a comprehension binding.
    BadWalrusTarget,
    /// A malformed `global` declaration.
    BadGlobal,
    /// A malformed `nonlocal` declaration.
    BadNonlocal,
    /// A name assigned before its `global` declaration.
    GlobalReassignment,
    /// `await` outside an async function, or `yield from` inside one.
    AsyncError,
    /// `yield` outside a function.
    BadYield,
    /// A bare `raise` with no active exception.
    BadRaise,
    /// `return` outside a function.
    BadReturn,
    /// `break` or `continue` outside a loop.
    BadLoopControl,
    /// A wildcard import somewhere other than module scope.
    BadWildcardImport,
    /// A `TypeAlias` annotation outside module scope.
    BadTypeAlias,
    /// An annotation on a target form that cannot carry one.
    BadAnnotationTarget,
    /// A construct we recognize but do not support.
    Unsupported,
    /// An invariant of the binder itself was violated.
    InternalError,
}

impl ErrorKind {
    pub fn default_severity(self) -> Severity {
        match self {
            Self::MissingTypeStub | Self::GlobalReassignment => Severity::Warning,
            Self::InvalidEscapeSequence => Severity::Warning,
            Self::MissingModuleSource => Severity::Information,
            _ => Severity::Error,
        }
    }
}
