/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */

use std::fmt;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;

use dupe::Dupe;
use parse_display::Display;
use regex::Regex;
use ruff_python_ast::BoolOp;
use ruff_python_ast::CmpOp;
use ruff_python_ast::Expr;
use ruff_python_ast::ExprAttribute;
use ruff_python_ast::Number;
use ruff_python_ast::UnaryOp;
use serde::Deserialize;
use serde::de;

/// The version of Python the checked code is written for.
#[derive(Debug, Clone, Copy, Dupe, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct PythonVersion {
    pub major: u32,
    pub minor: u32,
    pub micro: u32,
}

impl Default for PythonVersion {
    fn default() -> Self {
        Self {
            major: 3,
            minor: 13,
            micro: 0,
        }
    }
}

impl Display for PythonVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)
    }
}

impl FromStr for PythonVersion {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let pattern = Regex::new(r"^(\d+)(\.(\d+))?(\.(\d+))?$").unwrap();
        let captures = pattern
            .captures(s.trim())
            .ok_or_else(|| anyhow::anyhow!("invalid version string `{s}`"))?;
        let number = |i: usize, default: u32| -> anyhow::Result<u32> {
            match captures.get(i) {
                None => Ok(default),
                Some(m) => m
                    .as_str()
                    .parse()
                    .map_err(|_| anyhow::anyhow!("invalid version number `{}`", m.as_str())),
            }
        };
        let def = Self::default();
        let major = number(1, def.major)?;
        let minor = number(3, if major == def.major { def.minor } else { 0 })?;
        let micro = number(5, 0)?;
        Ok(Self {
            major,
            minor,
            micro,
        })
    }
}

impl<'de> Deserialize<'de> for PythonVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        PythonVersion::from_str(&s).map_err(de::Error::custom)
    }
}

impl PythonVersion {
    pub fn new(major: u32, minor: u32, micro: u32) -> Self {
        Self {
            major,
            minor,
            micro,
        }
    }

    pub fn at_least(self, major: u32, minor: u32) -> bool {
        self >= Self::new(major, minor, 0)
    }
}

/// The platform Python is running on, as reported by `sys.platform`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Deserialize)]
pub struct PythonPlatform(String);

impl Default for PythonPlatform {
    fn default() -> Self {
        Self::linux()
    }
}

impl PythonPlatform {
    pub fn new(platform: &str) -> Self {
        match platform {
            "Linux" | "linux" => Self::linux(),
            "Darwin" | "darwin" | "macos" => Self::mac(),
            "Windows" | "windows" | "win32" => Self::windows(),
            _ => Self(platform.to_owned()),
        }
    }

    pub fn linux() -> Self {
        Self("linux".to_owned())
    }

    pub fn mac() -> Self {
        Self("darwin".to_owned())
    }

    pub fn windows() -> Self {
        Self("win32".to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The subset of the `sys` module we can see statically, used to evaluate
/// version and platform checks without running any Python.
#[derive(Debug, Clone, Dupe, PartialEq, Eq, Hash, Default)]
pub struct SysInfo(Arc<SysInfoInner>);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
struct SysInfoInner {
    version: PythonVersion,
    platform: PythonPlatform,
}

/// A statically known Python value.
#[derive(Debug, PartialEq, PartialOrd)]
enum Value {
    Tuple(Vec<Value>),
    String(String),
    Int(i64),
    Bool(bool),
}

impl Value {
    fn to_bool(&self) -> bool {
        match self {
            Value::Bool(x) => *x,
            Value::Int(x) => *x != 0,
            Value::String(x) => !x.is_empty(),
            Value::Tuple(x) => !x.is_empty(),
        }
    }

    fn same_type(&self, other: &Value) -> bool {
        matches!(
            (self, other),
            (Value::Tuple(_), Value::Tuple(_))
                | (Value::String(_), Value::String(_))
                | (Value::Int(_), Value::Int(_))
                | (Value::Bool(_), Value::Bool(_))
        )
    }

    fn compare(&self, op: CmpOp, other: &Value) -> Option<bool> {
        if !self.same_type(other) {
            return None;
        }
        Some(match op {
            CmpOp::Eq => self == other,
            CmpOp::NotEq => self != other,
            CmpOp::Lt => self < other,
            CmpOp::LtE => self <= other,
            CmpOp::Gt => self > other,
            CmpOp::GtE => self >= other,
            _ => return None,
        })
    }
}

fn is_type_checking_name(x: &str) -> bool {
    x == "TYPE_CHECKING"
}

impl SysInfo {
    pub fn new(version: PythonVersion, platform: PythonPlatform) -> Self {
        Self(Arc::new(SysInfoInner { version, platform }))
    }

    pub fn version(&self) -> PythonVersion {
        self.0.version
    }

    pub fn platform(&self) -> &PythonPlatform {
        &self.0.platform
    }

    /// Return `Some` if we can statically evaluate the expression as a bool.
    /// The result is advisory; callers must stay well-formed when it is wrong.
    pub fn evaluate_bool(&self, x: &Expr) -> Option<bool> {
        match x {
            Expr::BoolOp(x) => {
                let values = x.values.iter().map(|v| self.evaluate_bool(v));
                match x.op {
                    // `and` is falsy if any operand is known falsy; whichever
                    // operand the runtime stops at, it stops at a falsy one.
                    BoolOp::And => {
                        let mut all_true = true;
                        for v in values {
                            match v {
                                Some(false) => return Some(false),
                                Some(true) => {}
                                None => all_true = false,
                            }
                        }
                        if all_true { Some(true) } else { None }
                    }
                    BoolOp::Or => {
                        let mut all_false = true;
                        for v in values {
                            match v {
                                Some(true) => return Some(true),
                                Some(false) => {}
                                None => all_false = false,
                            }
                        }
                        if all_false { Some(false) } else { None }
                    }
                }
            }
            Expr::UnaryOp(x) if x.op == UnaryOp::Not => Some(!self.evaluate_bool(&x.operand)?),
            _ => Some(self.evaluate(x)?.to_bool()),
        }
    }

    /// Version of `evaluate_bool` where `None` means no test (thus always statically true).
    pub fn evaluate_bool_opt(&self, x: Option<&Expr>) -> Option<bool> {
        match x {
            None => Some(true),
            Some(x) => self.evaluate_bool(x),
        }
    }

    fn version_tuple(&self) -> Value {
        Value::Tuple(vec![
            Value::Int(self.0.version.major as i64),
            Value::Int(self.0.version.minor as i64),
        ])
    }

    fn evaluate(&self, x: &Expr) -> Option<Value> {
        match x {
            Expr::Compare(x) if x.ops.len() == 1 && x.comparators.len() == 1 => {
                let left = self.evaluate(&x.left)?;
                let right = self.evaluate(&x.comparators[0])?;
                Some(Value::Bool(left.compare(x.ops[0], &right)?))
            }
            Expr::Attribute(ExprAttribute { value, attr, .. })
                if matches!(&**value, Expr::Name(name) if &name.id == "sys") =>
            {
                match attr.as_str() {
                    "platform" => Some(Value::String(self.0.platform.as_str().to_owned())),
                    "version_info" => Some(self.version_tuple()),
                    _ => None,
                }
            }
            Expr::Subscript(x) => {
                let Value::Tuple(elements) = self.evaluate(&x.value)? else {
                    return None;
                };
                match &*x.slice {
                    // sys.version_info[0]
                    Expr::NumberLiteral(i) => match &i.value {
                        Number::Int(i) => {
                            let i = usize::try_from(i.as_i64()?).ok()?;
                            elements.into_iter().nth(i)
                        }
                        _ => None,
                    },
                    // sys.version_info[:2]
                    Expr::Slice(slice) if slice.lower.is_none() && slice.step.is_none() => {
                        match slice.upper.as_deref() {
                            Some(Expr::NumberLiteral(i)) => match &i.value {
                                Number::Int(i) => {
                                    let i = usize::try_from(i.as_i64()?).ok()?;
                                    Some(Value::Tuple(elements.into_iter().take(i).collect()))
                                }
                                _ => None,
                            },
                            _ => None,
                        }
                    }
                    _ => None,
                }
            }
            Expr::Name(name) if is_type_checking_name(&name.id) => Some(Value::Bool(true)),
            Expr::Attribute(ExprAttribute { value, attr, .. })
                if value.is_name_expr() && is_type_checking_name(attr.as_str()) =>
            {
                Some(Value::Bool(true))
            }
            Expr::Tuple(x) => {
                let mut elements = Vec::with_capacity(x.elts.len());
                for e in &x.elts {
                    elements.push(self.evaluate(e)?);
                }
                Some(Value::Tuple(elements))
            }
            Expr::NumberLiteral(x) => match &x.value {
                Number::Int(i) => Some(Value::Int(i.as_i64()?)),
                _ => None,
            },
            Expr::BooleanLiteral(x) => Some(Value::Bool(x.value)),
            Expr::StringLiteral(x) => Some(Value::String(x.value.to_str().to_owned())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::Ast;

    use super::*;

    fn parse_expr(code: &str) -> Expr {
        let (module, errors) = Ast::parse(code);
        assert!(errors.is_empty(), "parse failed: {errors:?}");
        match module.body.into_iter().next() {
            Some(ruff_python_ast::Stmt::Expr(x)) => *x.value,
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    fn evaluate(code: &str) -> Option<bool> {
        SysInfo::new(PythonVersion::new(3, 12, 0), PythonPlatform::linux())
            .evaluate_bool(&parse_expr(code))
    }

    #[test]
    fn test_parse_version() {
        assert_eq!(
            PythonVersion::from_str("3.8").unwrap(),
            PythonVersion::new(3, 8, 0)
        );
        assert_eq!(
            PythonVersion::from_str("3.10.2").unwrap(),
            PythonVersion::new(3, 10, 2)
        );
        assert!(PythonVersion::from_str("not a version").is_err());
    }

    #[test]
    fn test_evaluate_version_checks() {
        assert_eq!(evaluate("sys.version_info >= (3, 10)"), Some(true));
        assert_eq!(evaluate("sys.version_info < (3, 0)"), Some(false));
        assert_eq!(evaluate("sys.version_info[0] == 3"), Some(true));
        assert_eq!(evaluate("sys.version_info[:2] == (3, 12)"), Some(true));
        assert_eq!(evaluate("sys.maxsize > 2"), None);
    }

    #[test]
    fn test_evaluate_platform_and_constants() {
        assert_eq!(evaluate("sys.platform == 'linux'"), Some(true));
        assert_eq!(evaluate("sys.platform == 'win32'"), Some(false));
        assert_eq!(evaluate("TYPE_CHECKING"), Some(true));
        assert_eq!(evaluate("typing.TYPE_CHECKING"), Some(true));
        assert_eq!(evaluate("cond"), None);
    }

    #[test]
    fn test_evaluate_connectives() {
        assert_eq!(evaluate("True and sys.platform == 'linux'"), Some(true));
        assert_eq!(evaluate("cond and False"), Some(false));
        assert_eq!(evaluate("cond or True"), Some(true));
        assert_eq!(evaluate("not (sys.version_info >= (3, 10))"), Some(false));
        assert_eq!(evaluate("cond or other"), None);
    }
}
