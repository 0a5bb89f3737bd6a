/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Binding the left-hand side of assignment-like forms: `=` targets, loop
//! targets, `with ... as` targets, comprehension targets. Targets are
//! pre-bound (symbols created) before the right-hand side is walked, then
//! bound (declarations and assignment flow emitted) afterwards.

use pyflow_python::ast::Ast;
use ruff_python_ast::Expr;
use ruff_python_ast::ExprAttribute;
use ruff_python_ast::ExprName;
use ruff_text_size::Ranged;

use crate::binding::binder::Binder;
use crate::binding::declaration::Declaration;
use crate::binding::declaration::VariableDeclaration;
use crate::binding::declaration::is_constant_name;
use crate::binding::flow::AssignTarget;
use crate::binding::narrow::ReferenceKey;
use crate::binding::scope::SymbolFlags;
use crate::binding::table::NodeKey;

/// Extra facts about one variable binding, threaded from the statement
/// that owns the target down to the declaration we record.
#[derive(Debug, Default, Clone)]
pub struct TargetInfo {
    pub inferred_source: Option<NodeKey>,
    pub annotation: Option<NodeKey>,
    pub is_final: bool,
    pub is_class_var: bool,
    /// The statement looks like it may define a type alias.
    pub possible_type_alias: bool,
    pub type_alias_annotation: Option<NodeKey>,
}

impl<'a> Binder<'a> {
    /// Ensure a symbol exists for every bare name in the target, without
    /// yet recording declarations or flow. This runs before the value is
    /// walked so the value can refer to the names being bound.
    pub(crate) fn pre_bind_target(&mut self, target: &'a Expr) {
        let mut names = Vec::new();
        Ast::expr_lvalue(target, &mut |name: &ExprName| names.push(name.id.clone()));
        for name in names {
            self.bind_name(&name);
        }
    }

    /// Record declarations and emit assignment flow for a fully walked target.
    pub(crate) fn bind_target(&mut self, target: &'a Expr, info: &TargetInfo) {
        match target {
            Expr::Name(name) => self.bind_name_target(name, info),
            Expr::Attribute(attr) => self.bind_attribute_target(attr, info),
            Expr::Subscript(subscript) => {
                self.expr(&subscript.value);
                self.expr(&subscript.slice);
            }
            Expr::Tuple(tuple) => {
                for element in &tuple.elts {
                    self.bind_target(element, info);
                }
            }
            Expr::List(list) => {
                for element in &list.elts {
                    self.bind_target(element, info);
                }
            }
            Expr::Starred(starred) => self.bind_target(&starred.value, info),
            // Anything else is a syntax error the parser already reported;
            // walk it so names still resolve.
            other => self.expr(other),
        }
    }

    pub(crate) fn bind_name_target(&mut self, name: &ExprName, info: &TargetInfo) {
        let symbol = self.bind_name(&name.id);
        if info.is_class_var {
            self.scopes.symbol_mut(symbol).flags |= SymbolFlags::CLASS_VAR;
        }
        // A bare `x: Final` in a class body still declares an instance member.
        if info.is_final && info.inferred_source.is_none() && self.in_class_body() {
            self.scopes.symbol_mut(symbol).flags |= SymbolFlags::INSTANCE_MEMBER;
        }
        self.scopes.add_declaration(
            symbol,
            Declaration::Variable(VariableDeclaration {
                range: name.range,
                is_constant: is_constant_name(name.id.as_str()),
                inferred_source: info.inferred_source,
                annotation: info.annotation,
                is_final: info.is_final,
                is_defined_by_member_access: false,
                type_alias_name: if info.possible_type_alias || info.type_alias_annotation.is_some()
                {
                    Some(name.id.clone())
                } else {
                    None
                },
                type_alias_annotation: info.type_alias_annotation,
            }),
        );
        self.assignment_flow(
            NodeKey::Expression(name.range),
            AssignTarget::Symbol(symbol),
            Some(ReferenceKey::of_name(&name.id)),
            false,
        );
    }

    fn bind_attribute_target(&mut self, attr: &'a ExprAttribute, info: &TargetInfo) {
        self.declare_attribute_member(attr, info);
        self.assignment_flow(
            NodeKey::Expression(attr.range()),
            AssignTarget::Member,
            ReferenceKey::of_attribute(attr),
            false,
        );
    }

    /// An assignment (or bare annotation) on `self.<name>` in a method
    /// declares an instance member on the enclosing class.
    pub(crate) fn declare_attribute_member(&mut self, attr: &'a ExprAttribute, info: &TargetInfo) {
        self.expr(&attr.value);
        if let Expr::Name(base) = &*attr.value
            && self.self_name.as_ref() == Some(&base.id)
            && let Some(class_scope) = self.enclosing_class
        {
            let symbol = match self.scopes.look_up(class_scope, &attr.attr.id) {
                Some(existing) => existing,
                None => self.scopes.add_symbol(
                    class_scope,
                    attr.attr.id.clone(),
                    SymbolFlags::INSTANCE_MEMBER | SymbolFlags::CLASS_MEMBER,
                ),
            };
            self.scopes.symbol_mut(symbol).flags |= SymbolFlags::INSTANCE_MEMBER;
            self.scopes.add_declaration(
                symbol,
                Declaration::Variable(VariableDeclaration {
                    range: attr.attr.range,
                    is_constant: is_constant_name(attr.attr.as_str()),
                    inferred_source: info.inferred_source,
                    annotation: info.annotation,
                    is_final: info.is_final,
                    is_defined_by_member_access: true,
                    type_alias_name: None,
                    type_alias_annotation: None,
                }),
            );
        }
    }
}
