/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Deciding which expressions later narrowing can refine, and the canonical
//! keys that equate narrowing subjects. This is a pure classification over
//! expression shape; no types are involved.

use std::fmt;
use std::fmt::Display;

use ruff_python_ast::CmpOp;
use ruff_python_ast::Expr;
use ruff_python_ast::ExprCall;
use ruff_python_ast::UnaryOp;
use ruff_python_ast::name::Name;

/// The canonical string form of a name or dotted member chain. Two
/// expressions narrow together iff their keys are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReferenceKey(String);

impl Display for ReferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ReferenceKey {
    pub fn of_name(name: &Name) -> Self {
        Self(name.as_str().to_owned())
    }

    /// A key for a bare name or a dotted chain of member accesses rooted at
    /// a name. Anything else has no key and cannot be narrowed.
    pub fn of_expr(x: &Expr) -> Option<Self> {
        fn write(x: &Expr, out: &mut String) -> bool {
            match x {
                Expr::Name(name) => {
                    out.push_str(name.id.as_str());
                    true
                }
                Expr::Attribute(attr) => {
                    if !write(&attr.value, out) {
                        return false;
                    }
                    out.push('.');
                    out.push_str(attr.attr.as_str());
                    true
                }
                _ => false,
            }
        }
        let mut out = String::new();
        if write(x, &mut out) { Some(Self(out)) } else { None }
    }

    /// The key of a member access, when its base chain has one.
    pub fn of_attribute(x: &ruff_python_ast::ExprAttribute) -> Option<Self> {
        let base = Self::of_expr(&x.value)?;
        Some(Self(format!("{}.{}", base.0, x.attr.as_str())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Does `x` look like `type(subject)`? Returns the subject.
fn type_call_subject(x: &Expr) -> Option<&Expr> {
    match x {
        Expr::Call(call)
            if matches!(&*call.func, Expr::Name(name) if name.id.as_str() == "type")
                && call.arguments.args.len() == 1
                && call.arguments.keywords.is_empty() =>
        {
            Some(&call.arguments.args[0])
        }
        _ => None,
    }
}

/// If this side of a comparison narrows something, push its key.
fn narrow_side(x: &Expr, keys: &mut Vec<ReferenceKey>) -> bool {
    // `type(X) is Y` narrows X, not the call.
    let subject = type_call_subject(x).unwrap_or(x);
    match ReferenceKey::of_expr(subject) {
        Some(key) => {
            keys.push(key);
            true
        }
        None => false,
    }
}

fn narrowable_call(x: &ExprCall, keys: &mut Vec<ReferenceKey>) -> bool {
    let arg_count = match &*x.func {
        Expr::Name(name) => match name.id.as_str() {
            "isinstance" | "issubclass" => 2,
            "callable" => 1,
            _ => return false,
        },
        _ => return false,
    };
    if x.arguments.args.len() != arg_count || !x.arguments.keywords.is_empty() {
        return false;
    }
    narrow_side(&x.arguments.args[0], keys)
}

/// Decide whether later type analysis may refine anything based on this
/// expression, harvesting the reference keys of every narrowed subject.
/// This is deliberately shape-only; being wrong in the `true` direction
/// just costs a flow-analysis visit later.
pub fn is_narrowing_expression(x: &Expr, keys: &mut Vec<ReferenceKey>) -> bool {
    match x {
        Expr::Name(_) | Expr::Attribute(_) => narrow_side(x, keys),
        // A walrus narrows its target name.
        Expr::Named(x) => match &*x.target {
            Expr::Name(name) => {
                keys.push(ReferenceKey::of_name(&name.id));
                true
            }
            _ => false,
        },
        Expr::Compare(x) if x.ops.len() == 1 && x.comparators.len() == 1 => {
            let left = &*x.left;
            let right = &x.comparators[0];
            match x.ops[0] {
                // `is` / `is not` narrow both operands.
                CmpOp::Is | CmpOp::IsNot => {
                    let l = narrow_side(left, keys);
                    let r = narrow_side(right, keys);
                    l || r
                }
                // `==` / `!=` narrow only against the None singleton.
                CmpOp::Eq | CmpOp::NotEq => {
                    if right.is_none_literal_expr() {
                        narrow_side(left, keys)
                    } else if left.is_none_literal_expr() {
                        narrow_side(right, keys)
                    } else {
                        false
                    }
                }
                // Membership narrows the element being looked up.
                CmpOp::In | CmpOp::NotIn => narrow_side(left, keys),
                _ => false,
            }
        }
        Expr::UnaryOp(x) if x.op == UnaryOp::Not => is_narrowing_expression(&x.operand, keys),
        Expr::Call(x) => narrowable_call(x, keys),
        _ => false,
    }
}
