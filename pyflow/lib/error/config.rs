/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */

use std::collections::HashMap;

use dupe::Dupe;
use parse_display::Display;
use serde::Deserialize;

use crate::error::kind::ErrorKind;

/// How loudly a diagnostic is reported.
#[derive(
    Debug, Clone, Copy, Dupe, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Deserialize,
)]
#[display(style = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Information,
    Warning,
    Error,
}

/// A configured setting for one diagnostic category. Unlike [`Severity`]
/// this includes `none`, which suppresses the category entirely.
#[derive(Debug, Clone, Copy, Dupe, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleSetting {
    Error,
    Warning,
    Information,
    None,
}

impl RuleSetting {
    fn severity(self) -> Option<Severity> {
        match self {
            Self::Error => Some(Severity::Error),
            Self::Warning => Some(Severity::Warning),
            Self::Information => Some(Severity::Information),
            Self::None => None,
        }
    }
}

/// Per-category severity overrides, deserializable from configuration.
/// Categories without an override use their default severity.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleConfig(#[serde(default)] HashMap<ErrorKind, RuleSetting>);

impl RuleConfig {
    pub fn new(overrides: HashMap<ErrorKind, RuleSetting>) -> Self {
        Self(overrides)
    }

    /// `None` means the category is suppressed.
    pub fn severity(&self, kind: ErrorKind) -> Option<Severity> {
        match self.0.get(&kind) {
            Some(setting) => setting.severity(),
            None => Some(kind.default_severity()),
        }
    }
}
