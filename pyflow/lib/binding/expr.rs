/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! The expression side of the walker. Most expressions just walk their
//! children; names and member chains pick up the current flow node, calls
//! emit call nodes, `and`/`or`/`not` act as flow connectives when a branch
//! is being bound, and comprehensions/lambdas open scopes of their own.

use pyflow_python::ast::Ast;
use ruff_python_ast::Comprehension;
use ruff_python_ast::Expr;
use ruff_python_ast::ExprBoolOp;
use ruff_python_ast::ExprIf;
use ruff_python_ast::ExprLambda;
use ruff_python_ast::ExprNamed;
use ruff_python_ast::ExprYield;
use ruff_python_ast::ExprYieldFrom;
use ruff_python_ast::InterpolatedStringElement;
use ruff_python_ast::Parameters;
use ruff_python_ast::UnaryOp;
use ruff_text_size::Ranged;
use ruff_text_size::TextRange;

use crate::binding::binder::Binder;
use crate::binding::binder::DeferredTask;
use crate::binding::binder::DeferredWork;
use crate::binding::declaration::Declaration;
use crate::binding::declaration::VariableDeclaration;
use crate::binding::declaration::is_constant_name;
use crate::binding::flow::AssignTarget;
use crate::binding::narrow::ReferenceKey;
use crate::binding::narrow::is_narrowing_expression;
use crate::binding::scope::ScopeKind;
use crate::binding::table::NodeKey;
use crate::binding::target::TargetInfo;
use crate::error::kind::ErrorKind;

impl<'a> Binder<'a> {
    pub(crate) fn expr(&mut self, x: &'a Expr) {
        // `and`/`or`/`not` consume the active branch targets; everything
        // else walks its children outside any conditional context.
        match (x, self.true_target, self.false_target) {
            (Expr::BoolOp(b), _, _) => self.bool_op(b),
            (Expr::UnaryOp(u), Some(t), Some(f)) if u.op == UnaryOp::Not => {
                // `not` swaps the branch targets.
                self.bind_conditional(&u.operand, f, t);
            }
            _ => {
                let saved = (self.true_target.take(), self.false_target.take());
                self.expr_inner(x);
                (self.true_target, self.false_target) = saved;
            }
        }
    }

    pub(crate) fn expr_opt(&mut self, x: Option<&'a Expr>) {
        if let Some(x) = x {
            self.expr(x);
        }
    }

    fn expr_inner(&mut self, x: &'a Expr) {
        match x {
            Expr::Name(_) => {
                self.tables
                    .flow
                    .insert(NodeKey::Expression(x.range()), self.current_flow);
            }
            Expr::Attribute(attr) => {
                self.expr(&attr.value);
                if ReferenceKey::of_attribute(attr).is_some() {
                    self.tables
                        .flow
                        .insert(NodeKey::Expression(x.range()), self.current_flow);
                }
            }
            Expr::Call(call) => {
                self.expr(&call.func);
                for arg in &call.arguments.args {
                    self.expr(arg);
                }
                for keyword in &call.arguments.keywords {
                    self.expr(&keyword.value);
                }
                self.call_flow(NodeKey::Expression(x.range()));
            }
            Expr::Named(named) => self.assignment_expression(named),
            Expr::Lambda(lambda) => self.lambda(lambda),
            Expr::If(ternary) => self.ternary(ternary),
            Expr::ListComp(comp) => {
                self.comprehension(
                    NodeKey::Expression(comp.range),
                    comp.range,
                    &comp.generators,
                    |binder| binder.expr(&comp.elt),
                );
            }
            Expr::SetComp(comp) => {
                self.comprehension(
                    NodeKey::Expression(comp.range),
                    comp.range,
                    &comp.generators,
                    |binder| binder.expr(&comp.elt),
                );
            }
            Expr::DictComp(comp) => {
                self.comprehension(
                    NodeKey::Expression(comp.range),
                    comp.range,
                    &comp.generators,
                    |binder| {
                        if let Some(key) = &comp.key {
                            binder.expr(key);
                        }
                        binder.expr(&comp.value);
                    },
                );
            }
            Expr::Generator(comp) => {
                self.comprehension(
                    NodeKey::Expression(comp.range),
                    comp.range,
                    &comp.generators,
                    |binder| binder.expr(&comp.elt),
                );
            }
            Expr::Await(x) => {
                if !self.in_async && !self.in_lambda {
                    self.error(
                        x.range,
                        ErrorKind::AsyncError,
                        "`await` is only allowed inside an async function".to_owned(),
                    );
                }
                self.expr(&x.value);
            }
            Expr::Yield(x) => self.yield_expr(x),
            Expr::YieldFrom(x) => self.yield_from_expr(x),
            Expr::Compare(x) => {
                self.expr(&x.left);
                for comparator in &x.comparators {
                    self.expr(comparator);
                }
            }
            Expr::BinOp(x) => {
                self.expr(&x.left);
                self.expr(&x.right);
            }
            Expr::UnaryOp(x) => self.expr(&x.operand),
            Expr::Starred(x) => self.expr(&x.value),
            Expr::Subscript(x) => {
                self.expr(&x.value);
                self.expr(&x.slice);
            }
            Expr::Slice(x) => {
                self.expr_opt(x.lower.as_deref());
                self.expr_opt(x.upper.as_deref());
                self.expr_opt(x.step.as_deref());
            }
            Expr::Tuple(x) => {
                for element in &x.elts {
                    self.expr(element);
                }
            }
            Expr::List(x) => {
                for element in &x.elts {
                    self.expr(element);
                }
            }
            Expr::Set(x) => {
                for element in &x.elts {
                    self.expr(element);
                }
            }
            Expr::Dict(x) => {
                for item in &x.items {
                    self.expr_opt(item.key.as_ref());
                    self.expr(&item.value);
                }
            }
            Expr::FString(x) => {
                for element in x.value.elements() {
                    if let InterpolatedStringElement::Interpolation(interpolation) = element {
                        self.expr(&interpolation.expression);
                    }
                }
            }
            Expr::StringLiteral(x) => {
                for part in x.value.iter() {
                    self.check_string_escapes(part.range());
                }
            }
            Expr::BytesLiteral(x) => {
                for part in x.value.iter() {
                    self.check_string_escapes(part.range());
                }
            }
            Expr::BoolOp(_) => unreachable!("handled by `expr`"),
            // Remaining literal forms have no sub-structure we care about.
            _ => {}
        }
    }

    fn bool_op(&mut self, x: &'a ExprBoolOp) {
        let (Some(true_target), Some(false_target)) = (self.true_target, self.false_target) else {
            for value in &x.values {
                self.expr(value);
            }
            return;
        };
        // Short circuit: `and` jumps to the false target as soon as an
        // operand is false, `or` to the true target as soon as one is true.
        let last = x.values.len().saturating_sub(1);
        for (i, value) in x.values.iter().enumerate() {
            if i == last {
                self.bind_conditional(value, true_target, false_target);
            } else {
                let next = self.flow.branch_label();
                match x.op {
                    ruff_python_ast::BoolOp::And => {
                        self.bind_conditional(value, next, false_target)
                    }
                    ruff_python_ast::BoolOp::Or => self.bind_conditional(value, true_target, next),
                }
                self.current_flow = self.flow.finish_label(next);
            }
        }
    }

    fn ternary(&mut self, x: &'a ExprIf) {
        let then_label = self.flow.branch_label();
        let else_label = self.flow.branch_label();
        let post_label = self.flow.branch_label();
        self.bind_conditional(&x.test, then_label, else_label);
        self.current_flow = self.flow.finish_label(then_label);
        self.expr(&x.body);
        self.flow.add_antecedent(post_label, self.current_flow);
        self.current_flow = self.flow.finish_label(else_label);
        self.expr(&x.orelse);
        self.flow.add_antecedent(post_label, self.current_flow);
        self.current_flow = self.flow.finish_label(post_label);
    }

    /// A walrus binds in the innermost scope that is not a comprehension,
    /// hoisting the target out of any comprehensions in between.
    fn assignment_expression(&mut self, x: &'a ExprNamed) {
        self.expr(&x.value);
        let Expr::Name(name) = &*x.target else {
            self.expr(&x.target);
            return;
        };
        let mut container = self.scope;
        loop {
            let scope = self.scopes.scope(container);
            if scope.kind != ScopeKind::ListComprehension {
                break;
            }
            if self.scopes.look_up(container, &name.id).is_some() {
                self.error(
                    name.range,
                    ErrorKind::BadWalrusTarget,
                    format!(
                        "Assignment expression target `{}` is already bound by a comprehension",
                        name.id
                    ),
                );
            }
            match scope.parent {
                Some(parent) => container = parent,
                None => break,
            }
        }
        let symbol = if container == self.scope {
            self.bind_name(&name.id)
        } else {
            self.add_symbol(container, &name.id)
        };
        self.scopes.add_declaration(
            symbol,
            Declaration::Variable(VariableDeclaration {
                range: name.range,
                is_constant: is_constant_name(name.id.as_str()),
                inferred_source: Some(NodeKey::Expression(x.value.range())),
                ..Default::default()
            }),
        );
        self.assignment_flow(
            NodeKey::Expression(name.range),
            AssignTarget::Symbol(symbol),
            Some(ReferenceKey::of_name(&name.id)),
            false,
        );
    }

    fn lambda(&mut self, x: &'a ExprLambda) {
        // Defaults evaluate eagerly, in the enclosing scope.
        if let Some(parameters) = &x.parameters {
            self.walk_parameter_defaults(parameters);
        }
        let parent = self.scopes.non_class_scope(self.scope);
        let scope = self
            .scopes
            .add_scope(ScopeKind::Function, Some(parent), x.range);
        self.tables.scope.insert(NodeKey::Expression(x.range), scope);
        self.defer(DeferredTask {
            scope,
            work: DeferredWork::LambdaBody(x),
            function: None,
            enclosing_class: None,
            in_async: false,
            in_lambda: true,
        });
    }

    pub(crate) fn walk_parameter_defaults(&mut self, parameters: &'a Parameters) {
        for parameter in parameters.posonlyargs.iter().chain(&parameters.args) {
            self.expr_opt(parameter.default.as_deref());
        }
        for parameter in &parameters.kwonlyargs {
            self.expr_opt(parameter.default.as_deref());
        }
    }

    fn yield_expr(&mut self, x: &'a ExprYield) {
        self.expr_opt(x.value.as_deref());
        self.record_yield(NodeKey::Expression(x.range), x.range, false);
    }

    fn yield_from_expr(&mut self, x: &'a ExprYieldFrom) {
        self.expr(&x.value);
        self.record_yield(NodeKey::Expression(x.range), x.range, true);
    }

    fn record_yield(&mut self, node: NodeKey, range: TextRange, is_yield_from: bool) {
        if is_yield_from && self.in_async {
            self.error(
                range,
                ErrorKind::AsyncError,
                "`yield from` is not allowed in an async function".to_owned(),
            );
        }
        match self.function {
            Some(function) => {
                let declaration = self
                    .scopes
                    .declaration_mut(function)
                    .as_function_mut()
                    .expect("function ids always point at function declarations");
                declaration.yields.push(node);
                // Any yield makes a generator, even one flow analysis will
                // never reach.
                declaration.is_generator = true;
            }
            None => self.error(
                range,
                ErrorKind::BadYield,
                "`yield` is only allowed inside a function".to_owned(),
            ),
        }
    }

    /// Comprehensions open a scope of their own. Targets are pre-bound in a
    /// first pass over the generator clauses; the second pass aliases any
    /// target shadowing an outer name, then walks iterables and filters.
    /// All filters share one false label, so a failing guard at any
    /// position skips to the next outer iteration.
    fn comprehension(
        &mut self,
        node: NodeKey,
        range: TextRange,
        generators: &'a [Comprehension],
        body: impl FnOnce(&mut Self),
    ) {
        let parent = self.scope;
        let scope = self
            .scopes
            .add_scope(ScopeKind::ListComprehension, Some(parent), range);
        self.tables.scope.insert(node, scope);
        self.scope = scope;

        // Pass one: pre-bind every `for` target, noting fresh symbols.
        let mut added = Vec::new();
        for generator in generators {
            let mut names = Vec::new();
            Ast::expr_lvalue(&generator.target, &mut |name| names.push(name.id.clone()));
            for name in names {
                if self.scopes.look_up(scope, &name).is_none() {
                    let symbol = self.add_symbol(scope, &name);
                    added.push((name, symbol));
                }
            }
        }
        // Pass two: alias targets that shadow a name visible outside the
        // comprehension, so narrowing can thread through the shadowing.
        for (name, symbol) in added {
            if let Some((alias, _)) = self.scopes.look_up_recursive(parent, &name) {
                self.assignment_alias_flow(symbol, alias);
            }
        }

        let false_label = self.flow.branch_label();
        for generator in generators {
            self.expr(&generator.iter);
            self.bind_target(
                &generator.target,
                &TargetInfo {
                    inferred_source: Some(NodeKey::Expression(generator.iter.range())),
                    ..Default::default()
                },
            );
            for test in &generator.ifs {
                let true_label = self.flow.branch_label();
                self.bind_conditional(test, true_label, false_label);
                self.current_flow = self.flow.finish_label(true_label);
            }
        }
        body(self);
        self.scope = parent;
    }

    /// Pre-register reference keys mentioned by a type annotation, so later
    /// flow analysis considers annotated names even without any branch.
    pub(crate) fn annotation(&mut self, x: &'a Expr, register: bool) {
        if register {
            let mut keys = Vec::new();
            if is_narrowing_expression(x, &mut keys) {
                for key in keys {
                    self.record_reference(key);
                }
            }
        }
        self.expr(x);
    }
}
