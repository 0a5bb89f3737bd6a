/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! The statement side of the walker: one method per statement kind, each
//! responsible for its scope effects and its piece of the flow graph.

use pyflow_python::ast::Ast;
use ruff_python_ast::ExceptHandler;
use ruff_python_ast::ExceptHandlerExceptHandler;
use ruff_python_ast::Expr;
use ruff_python_ast::ExprName;
use ruff_python_ast::Identifier;
use ruff_python_ast::Pattern;
use ruff_python_ast::Stmt;
use ruff_python_ast::StmtAnnAssign;
use ruff_python_ast::StmtAssert;
use ruff_python_ast::StmtAssign;
use ruff_python_ast::StmtAugAssign;
use ruff_python_ast::StmtClassDef;
use ruff_python_ast::StmtDelete;
use ruff_python_ast::StmtFor;
use ruff_python_ast::StmtFunctionDef;
use ruff_python_ast::StmtGlobal;
use ruff_python_ast::StmtIf;
use ruff_python_ast::StmtMatch;
use ruff_python_ast::StmtNonlocal;
use ruff_python_ast::StmtRaise;
use ruff_python_ast::StmtReturn;
use ruff_python_ast::StmtTry;
use ruff_python_ast::StmtWhile;
use ruff_python_ast::StmtWith;
use ruff_text_size::Ranged;
use ruff_text_size::TextRange;

use crate::binding::binder::Binder;
use crate::binding::binder::DeferredTask;
use crate::binding::binder::DeferredWork;
use crate::binding::scope::ScopeKind;
use crate::binding::binder::MutableCapture;
use crate::binding::binder::all_parameters;
use crate::binding::declaration::ClassDeclaration;
use crate::binding::declaration::Declaration;
use crate::binding::declaration::FunctionDeclaration;
use crate::binding::declaration::SpecialBuiltInClassDeclaration;
use crate::binding::declaration::VariableDeclaration;
use crate::binding::declaration::is_constant_name;
use crate::binding::flow::AssignTarget;
use crate::binding::flow::FlowNodeId;
use crate::binding::narrow::ReferenceKey;
use crate::binding::scope::SymbolFlags;
use crate::binding::table::NodeKey;
use crate::binding::target::TargetInfo;
use crate::error::kind::ErrorKind;
use crate::export::special::SpecialBuiltIn;

/// What an annotation expression says beyond the type it spells.
struct AnnotationTraits<'e> {
    /// The type inside `Final[...]`/`ClassVar[...]`, or the annotation itself.
    inner: &'e Expr,
    is_final: bool,
    is_class_var: bool,
    is_type_alias: bool,
}

fn special_annotation_name(x: &Expr) -> Option<&str> {
    match x {
        Expr::Name(name) => Some(name.id.as_str()),
        Expr::Attribute(attr) if matches!(&*attr.value, Expr::Name(_)) => Some(attr.attr.as_str()),
        _ => None,
    }
}

fn classify_annotation(x: &Expr) -> AnnotationTraits<'_> {
    let mut traits = AnnotationTraits {
        inner: x,
        is_final: false,
        is_class_var: false,
        is_type_alias: false,
    };
    match x {
        Expr::Subscript(subscript) => match special_annotation_name(&subscript.value) {
            Some("Final") => {
                traits.inner = &subscript.slice;
                traits.is_final = true;
            }
            Some("ClassVar") => {
                traits.inner = &subscript.slice;
                traits.is_class_var = true;
            }
            _ => {}
        },
        _ => match special_annotation_name(x) {
            Some("Final") => traits.is_final = true,
            Some("ClassVar") => traits.is_class_var = true,
            Some("TypeAlias") => traits.is_type_alias = true,
            _ => {}
        },
    }
    traits
}

impl<'a> Binder<'a> {
    pub(crate) fn stmts(&mut self, xs: &'a [Stmt]) {
        for x in xs {
            self.tables.flow.insert(NodeKey::stmt(x), self.current_flow);
            self.stmt(x);
        }
    }

    fn stmt(&mut self, x: &'a Stmt) {
        match x {
            Stmt::FunctionDef(x) => self.function_def(x),
            Stmt::ClassDef(x) => self.class_def(x),
            Stmt::Return(x) => self.return_stmt(x),
            Stmt::Delete(x) => self.delete_stmt(x),
            Stmt::Assign(x) => self.assign(x),
            Stmt::AugAssign(x) => self.aug_assign(x),
            Stmt::AnnAssign(x) => self.ann_assign(x),
            Stmt::TypeAlias(x) => self.type_alias_stmt(x),
            Stmt::For(x) => self.for_stmt(x),
            Stmt::While(x) => self.while_stmt(x),
            Stmt::If(x) => self.if_stmt(x),
            Stmt::With(x) => self.with_stmt(x),
            Stmt::Match(x) => self.match_stmt(x),
            Stmt::Raise(x) => self.raise_stmt(x),
            Stmt::Try(x) => self.try_stmt(x),
            Stmt::Assert(x) => self.assert_stmt(x),
            Stmt::Import(x) => self.import_stmt(x),
            Stmt::ImportFrom(x) => self.import_from_stmt(x),
            Stmt::Global(x) => self.global_stmt(x),
            Stmt::Nonlocal(x) => self.nonlocal_stmt(x),
            Stmt::Expr(x) => self.expr(&x.value),
            Stmt::Pass(_) => { /* no-op */ }
            Stmt::Break(x) => {
                if let Some(target) = self.break_target {
                    self.flow.add_antecedent(target, self.current_flow);
                } else {
                    self.error(
                        x.range,
                        ErrorKind::BadLoopControl,
                        "Cannot `break` outside loop".to_owned(),
                    );
                }
                self.terminate_flow();
            }
            Stmt::Continue(x) => {
                if let Some(target) = self.continue_target {
                    self.flow.add_antecedent(target, self.current_flow);
                } else {
                    self.error(
                        x.range,
                        ErrorKind::BadLoopControl,
                        "Cannot `continue` outside loop".to_owned(),
                    );
                }
                self.terminate_flow();
            }
            _ => self.error(
                x.range(),
                ErrorKind::Unsupported,
                "This statement form is not supported".to_owned(),
            ),
        }
    }

    fn function_def(&mut self, x: &'a StmtFunctionDef) {
        let is_method = self.in_class_body();
        let node_key = NodeKey::Statement(x.range);
        let symbol = self.bind_name(&x.name.id);
        let declaration = self.scopes.add_declaration(
            symbol,
            Declaration::Function(FunctionDeclaration::new(
                node_key,
                x.name.range,
                is_method,
                x.is_async,
            )),
        );
        self.tables.declaration.insert(node_key, declaration);
        // Decorators, defaults and annotations evaluate now, in the
        // enclosing scope. Only the body is deferred.
        for decorator in &x.decorator_list {
            self.expr(&decorator.expression);
        }
        self.walk_parameter_defaults(&x.parameters);
        for parameter in all_parameters(&x.parameters) {
            if let Some(annotation) = &parameter.annotation {
                self.annotation(annotation, true);
            }
        }
        if let Some(returns) = &x.returns {
            self.annotation(returns, true);
        }
        let parent = self.scopes.non_class_scope(self.scope);
        let scope = self
            .scopes
            .add_scope(ScopeKind::Function, Some(parent), x.range);
        self.tables.scope.insert(node_key, scope);
        self.defer(DeferredTask {
            scope,
            work: DeferredWork::FunctionBody(x),
            function: Some(declaration),
            enclosing_class: if is_method { Some(self.scope) } else { None },
            in_async: x.is_async,
            in_lambda: false,
        });
        self.assignment_flow(
            NodeKey::ident(&x.name),
            AssignTarget::Symbol(symbol),
            Some(ReferenceKey::of_name(&x.name.id)),
            false,
        );
    }

    fn class_def(&mut self, x: &'a StmtClassDef) {
        // Decorators and bases evaluate in the enclosing scope.
        for decorator in &x.decorator_list {
            self.expr(&decorator.expression);
        }
        if let Some(arguments) = &x.arguments {
            for base in &arguments.args {
                self.expr(base);
            }
            for keyword in &arguments.keywords {
                self.expr(&keyword.value);
            }
        }
        let node_key = NodeKey::Statement(x.range);
        let symbol = self.bind_name(&x.name.id);
        let declaration = self.scopes.add_declaration(
            symbol,
            Declaration::Class(ClassDeclaration {
                node: node_key,
                range: x.name.range,
            }),
        );
        self.tables.declaration.insert(node_key, declaration);
        // The class scope's parent skips enclosing classes: names in an
        // outer class body are not visible inside a nested one.
        let parent = self.scopes.non_class_scope(self.scope);
        let scope = self.scopes.add_scope(ScopeKind::Class, Some(parent), x.range);
        self.tables.scope.insert(node_key, scope);
        let saved = self.scope;
        self.scope = scope;
        // Class bodies execute eagerly, unlike function bodies.
        self.stmts(&x.body);
        self.scope = saved;
        self.assignment_flow(
            NodeKey::ident(&x.name),
            AssignTarget::Symbol(symbol),
            Some(ReferenceKey::of_name(&x.name.id)),
            false,
        );
    }

    fn assign(&mut self, x: &'a StmtAssign) {
        // Inside the typing stub, a handful of plain assignments define
        // special classes the checker must recognize by name.
        if self.module_info.is_typing_stub()
            && let [Expr::Name(name)] = x.targets.as_slice()
            && let Some(special) = SpecialBuiltIn::new(&name.id)
        {
            let symbol = self.bind_name(&name.id);
            self.scopes.add_declaration(
                symbol,
                Declaration::SpecialBuiltInClass(SpecialBuiltInClassDeclaration {
                    range: name.range,
                    special,
                }),
            );
            return;
        }
        for target in &x.targets {
            self.pre_bind_target(target);
        }
        self.expr(&x.value);
        // A module-level `X = some_expression` (not a call) may later turn
        // out to be an implicit type alias.
        let possible_type_alias = self.at_module_scope()
            && matches!(x.targets.as_slice(), [Expr::Name(_)])
            && !matches!(&*x.value, Expr::Call(_));
        let info = TargetInfo {
            inferred_source: Some(NodeKey::Expression(x.value.range())),
            possible_type_alias,
            ..Default::default()
        };
        for target in &x.targets {
            self.bind_target(target, &info);
        }
    }

    fn aug_assign(&mut self, x: &'a StmtAugAssign) {
        match &*x.target {
            Expr::Name(name) => {
                // The destination is read before it is written.
                self.tables
                    .flow
                    .insert(NodeKey::Expression(name.range), self.current_flow);
                self.expr(&x.value);
                self.bind_name_target(
                    name,
                    &TargetInfo {
                        inferred_source: Some(NodeKey::Statement(x.range)),
                        ..Default::default()
                    },
                );
            }
            Expr::Attribute(_) | Expr::Subscript(_) => {
                self.expr(&x.value);
                self.bind_target(
                    &x.target,
                    &TargetInfo {
                        inferred_source: Some(NodeKey::Statement(x.range)),
                        ..Default::default()
                    },
                );
            }
            other => {
                // The parser already rejected this; resolve names anyway.
                self.expr(other);
                self.expr(&x.value);
            }
        }
    }

    fn ann_assign(&mut self, x: &'a StmtAnnAssign) {
        let traits = classify_annotation(&x.annotation);
        if traits.is_type_alias && !self.at_module_scope() {
            self.error(
                x.annotation.range(),
                ErrorKind::BadTypeAlias,
                "A `TypeAlias` declaration is only allowed at module scope".to_owned(),
            );
        }
        let info = TargetInfo {
            inferred_source: x.value.as_deref().map(|v| NodeKey::Expression(v.range())),
            annotation: Some(NodeKey::Expression(traits.inner.range())),
            is_final: traits.is_final,
            is_class_var: traits.is_class_var,
            possible_type_alias: false,
            type_alias_annotation: if traits.is_type_alias {
                Some(NodeKey::Expression(x.annotation.range()))
            } else {
                None
            },
        };
        match &*x.target {
            Expr::Name(name) => {
                self.pre_bind_target(&x.target);
                // A bare annotation pre-registers its keys for flow analysis;
                // an initialized one will register through its assignment.
                self.annotation(&x.annotation, x.value.is_none());
                self.expr_opt(x.value.as_deref());
                if x.value.is_some() {
                    self.bind_name_target(name, &info);
                } else {
                    self.declare_annotated_name(name, &info);
                }
            }
            Expr::Attribute(attr) => {
                self.annotation(&x.annotation, x.value.is_none());
                self.expr_opt(x.value.as_deref());
                if x.value.is_some() {
                    self.bind_target(&x.target, &info);
                } else {
                    self.declare_attribute_member(attr, &info);
                }
            }
            other => {
                self.error(
                    other.range(),
                    ErrorKind::BadAnnotationTarget,
                    "An annotation is not allowed on this form of target".to_owned(),
                );
                self.annotation(&x.annotation, false);
                self.expr_opt(x.value.as_deref());
                if x.value.is_some() {
                    self.pre_bind_target(&x.target);
                    self.bind_target(&x.target, &info);
                }
            }
        }
    }

    fn type_alias_stmt(&mut self, x: &'a ruff_python_ast::StmtTypeAlias) {
        if let Expr::Name(name) = &*x.name {
            let symbol = self.bind_name(&name.id);
            self.scopes.add_declaration(
                symbol,
                Declaration::Variable(VariableDeclaration {
                    range: name.range,
                    is_constant: is_constant_name(name.id.as_str()),
                    inferred_source: Some(NodeKey::Expression(x.value.range())),
                    type_alias_name: Some(name.id.clone()),
                    ..Default::default()
                }),
            );
            self.annotation(&x.value, false);
            self.assignment_flow(
                NodeKey::Expression(name.range),
                AssignTarget::Symbol(symbol),
                Some(ReferenceKey::of_name(&name.id)),
                false,
            );
        } else {
            self.error(
                x.name.range(),
                ErrorKind::InvalidSyntax,
                "Invalid type alias target".to_owned(),
            );
        }
    }

    fn for_stmt(&mut self, x: &'a StmtFor) {
        self.pre_bind_target(&x.target);
        self.expr(&x.iter);
        let pre_for = self.flow.loop_label();
        let pre_else = self.flow.branch_label();
        let post_for = self.flow.branch_label();
        self.flow.add_antecedent(pre_for, self.current_flow);
        self.current_flow = pre_for;
        self.flow.add_antecedent(pre_else, self.current_flow);
        self.bind_target(
            &x.target,
            &TargetInfo {
                inferred_source: Some(NodeKey::Expression(x.iter.range())),
                ..Default::default()
            },
        );
        let saved = (self.break_target, self.continue_target);
        self.break_target = Some(post_for);
        self.continue_target = Some(pre_for);
        self.stmts(&x.body);
        (self.break_target, self.continue_target) = saved;
        self.flow.add_antecedent(pre_for, self.current_flow);
        self.current_flow = self.flow.finish_label(pre_else);
        self.stmts(&x.orelse);
        self.flow.add_antecedent(post_for, self.current_flow);
        self.current_flow = self.flow.finish_label(post_for);
    }

    fn while_stmt(&mut self, x: &'a StmtWhile) {
        let pre_loop = self.flow.loop_label();
        let then_label = self.flow.branch_label();
        let else_label = self.flow.branch_label();
        let post_while = self.flow.branch_label();
        self.flow.add_antecedent(pre_loop, self.current_flow);
        self.current_flow = pre_loop;
        // A statically true test leaves the else arm unreachable, and vice
        // versa; `condition_flow` handles the pruning.
        self.bind_conditional(&x.test, then_label, else_label);
        self.current_flow = self.flow.finish_label(then_label);
        let saved = (self.break_target, self.continue_target);
        self.break_target = Some(post_while);
        self.continue_target = Some(pre_loop);
        self.stmts(&x.body);
        (self.break_target, self.continue_target) = saved;
        self.flow.add_antecedent(pre_loop, self.current_flow);
        self.current_flow = self.flow.finish_label(else_label);
        self.stmts(&x.orelse);
        self.flow.add_antecedent(post_while, self.current_flow);
        self.current_flow = self.flow.finish_label(post_while);
    }

    fn if_stmt(&mut self, x: &'a StmtIf) {
        let post_if = self.flow.branch_label();
        let branches = Ast::if_branches(x).collect::<Vec<_>>();
        self.bind_if_branches(&branches, post_if);
        self.current_flow = self.flow.finish_label(post_if);
    }

    fn bind_if_branches(
        &mut self,
        branches: &[(TextRange, Option<&'a Expr>, &'a [Stmt])],
        post: FlowNodeId,
    ) {
        match branches.split_first() {
            None => {
                // No else branch: the condition may fall through.
                self.flow.add_antecedent(post, self.current_flow);
            }
            Some((&(_, None, body), _)) => {
                self.stmts(body);
                self.flow.add_antecedent(post, self.current_flow);
            }
            Some((&(_, Some(test), body), rest)) => {
                let then_label = self.flow.branch_label();
                let else_label = self.flow.branch_label();
                self.bind_conditional(test, then_label, else_label);
                self.current_flow = self.flow.finish_label(then_label);
                self.stmts(body);
                self.flow.add_antecedent(post, self.current_flow);
                self.current_flow = self.flow.finish_label(else_label);
                self.bind_if_branches(rest, post);
            }
        }
    }

    fn with_stmt(&mut self, x: &'a StmtWith) {
        for item in &x.items {
            self.expr(&item.context_expr);
            if let Some(target) = &item.optional_vars {
                self.pre_bind_target(target);
                self.bind_target(
                    target,
                    &TargetInfo {
                        inferred_source: Some(NodeKey::Expression(item.context_expr.range())),
                        ..Default::default()
                    },
                );
            }
        }
        self.stmts(&x.body);
    }

    fn match_stmt(&mut self, x: &'a StmtMatch) {
        self.expr(&x.subject);
        let post_match = self.flow.branch_label();
        let base = self.current_flow;
        let mut has_wildcard = false;
        for case in &x.cases {
            self.current_flow = base;
            let mut captures: Vec<&Identifier> = Vec::new();
            Ast::pattern_lvalue(&case.pattern, &mut |ident| captures.push(ident));
            for ident in captures {
                let symbol = self.bind_name(&ident.id);
                self.scopes.add_declaration(
                    symbol,
                    Declaration::Variable(VariableDeclaration {
                        range: ident.range,
                        is_constant: is_constant_name(ident.as_str()),
                        inferred_source: Some(NodeKey::Expression(x.subject.range())),
                        ..Default::default()
                    }),
                );
                self.assignment_flow(
                    NodeKey::Identifier(ident.range),
                    AssignTarget::Symbol(symbol),
                    Some(ReferenceKey::of_name(&ident.id)),
                    false,
                );
            }
            if matches!(&case.pattern, Pattern::MatchAs(p) if p.pattern.is_none())
                && case.guard.is_none()
            {
                has_wildcard = true;
            }
            self.expr_opt(case.guard.as_deref());
            self.stmts(&case.body);
            self.flow.add_antecedent(post_match, self.current_flow);
        }
        // Without an irrefutable case, no case may match at all.
        if !has_wildcard {
            self.flow.add_antecedent(post_match, base);
        }
        self.current_flow = self.flow.finish_label(post_match);
    }

    fn raise_stmt(&mut self, x: &'a StmtRaise) {
        self.expr_opt(x.exc.as_deref());
        self.expr_opt(x.cause.as_deref());
        if x.exc.is_none() && self.except_depth == 0 {
            self.error(
                x.range,
                ErrorKind::BadRaise,
                "A bare `raise` requires an active exception".to_owned(),
            );
        }
        if let Some(function) = self.function
            && let Some(declaration) = self.scopes.declaration_mut(function).as_function_mut()
        {
            declaration.raises.push(NodeKey::Statement(x.range));
        }
        for target in self.finally_targets.clone() {
            self.flow.add_antecedent(target, self.current_flow);
        }
        self.terminate_flow();
    }

    fn return_stmt(&mut self, x: &'a StmtReturn) {
        self.expr_opt(x.value.as_deref());
        match self.function {
            Some(function) => {
                if let Some(declaration) =
                    self.scopes.declaration_mut(function).as_function_mut()
                {
                    declaration.returns.push(NodeKey::Statement(x.range));
                }
            }
            None if !self.in_lambda => {
                self.error(
                    x.range,
                    ErrorKind::BadReturn,
                    "Invalid `return` outside of a function".to_owned(),
                );
            }
            None => {}
        }
        if let Some(target) = self.return_target {
            self.flow.add_antecedent(target, self.current_flow);
        }
        for target in self.finally_targets.clone() {
            self.flow.add_antecedent(target, self.current_flow);
        }
        self.terminate_flow();
    }

    fn try_stmt(&mut self, x: &'a StmtTry) {
        let except_labels = x
            .handlers
            .iter()
            .map(|_| self.flow.branch_label())
            .collect::<Vec<_>>();
        let pre_finally = self.flow.branch_label();
        let pre_finally_return_or_raise = self.flow.branch_label();
        let has_finally = !x.finalbody.is_empty();
        let gate = if has_finally {
            // Intercepted raise/return paths enter the finally suite
            // through the gate, so the suite sees them without the try
            // body being duplicated.
            let gate = self.flow.pre_finally_gate(pre_finally_return_or_raise);
            self.flow.add_antecedent(pre_finally, gate);
            self.finally_targets.push(pre_finally_return_or_raise);
            Some(gate)
        } else {
            None
        };
        // An exception may be raised before the first statement runs.
        for label in &except_labels {
            self.flow.add_antecedent(*label, self.current_flow);
        }
        // While walking the try body, every side-effecting flow node also
        // threads into the except labels.
        self.except_targets.push(except_labels.clone());
        self.stmts(&x.body);
        self.except_targets.pop();
        self.stmts(&x.orelse);
        self.flow.add_antecedent(pre_finally, self.current_flow);
        let mut reachable = !self.flow.is_unreachable(self.current_flow);
        for (label, handler) in except_labels.iter().zip(&x.handlers) {
            self.current_flow = self.flow.finish_label(*label);
            let ExceptHandler::ExceptHandler(handler) = handler;
            self.except_handler(handler);
            self.flow.add_antecedent(pre_finally, self.current_flow);
            reachable = reachable || !self.flow.is_unreachable(self.current_flow);
        }
        if has_finally {
            self.finally_targets.pop();
        }
        self.current_flow = self.flow.finish_label(pre_finally);
        if let Some(gate) = gate {
            self.stmts(&x.finalbody);
            if !self.flow.is_unreachable(self.current_flow) {
                self.current_flow = self.flow.post_finally(self.current_flow, gate);
            }
        }
        if !reachable {
            self.current_flow = self.flow.unreachable();
        }
    }

    fn except_handler(&mut self, x: &'a ExceptHandlerExceptHandler) {
        self.except_depth += 1;
        if let Some(type_) = &x.type_ {
            self.expr(type_);
        }
        let symbol = x.name.as_ref().map(|name| {
            let symbol = self.bind_name(&name.id);
            self.scopes.add_declaration(
                symbol,
                Declaration::Variable(VariableDeclaration {
                    range: name.range,
                    is_constant: is_constant_name(name.as_str()),
                    inferred_source: x.type_.as_deref().map(|t| NodeKey::Expression(t.range())),
                    ..Default::default()
                }),
            );
            self.assignment_flow(
                NodeKey::Identifier(name.range),
                AssignTarget::Symbol(symbol),
                Some(ReferenceKey::of_name(&name.id)),
                false,
            );
            symbol
        });
        self.stmts(&x.body);
        // The exception name is unbound when the clause exits; the earlier
        // attachment keeps the in-clause flow visible.
        if let (Some(symbol), Some(name)) = (symbol, &x.name) {
            self.assignment_flow(
                NodeKey::Identifier(name.range),
                AssignTarget::Symbol(symbol),
                Some(ReferenceKey::of_name(&name.id)),
                true,
            );
        }
        self.except_depth -= 1;
    }

    fn assert_stmt(&mut self, x: &'a StmtAssert) {
        let true_label = self.flow.branch_label();
        let false_label = self.flow.branch_label();
        self.bind_conditional(&x.test, true_label, false_label);
        // The message only evaluates when the assertion fails.
        self.current_flow = self.flow.finish_label(false_label);
        self.expr_opt(x.msg.as_deref());
        self.current_flow = self.flow.finish_label(true_label);
    }

    fn delete_stmt(&mut self, x: &'a StmtDelete) {
        for target in &x.targets {
            match target {
                Expr::Name(name) => {
                    self.tables
                        .flow
                        .insert(NodeKey::Expression(name.range), self.current_flow);
                    if let Some((symbol, _)) = self.scopes.look_up_recursive(self.scope, &name.id)
                    {
                        self.assignment_flow(
                            NodeKey::Expression(name.range),
                            AssignTarget::Symbol(symbol),
                            Some(ReferenceKey::of_name(&name.id)),
                            true,
                        );
                    }
                }
                Expr::Attribute(_) | Expr::Subscript(_) => self.expr(target),
                other => {
                    self.error(
                        other.range(),
                        ErrorKind::InvalidSyntax,
                        "Invalid `del` target".to_owned(),
                    );
                    self.expr(other);
                }
            }
        }
    }

    fn global_stmt(&mut self, x: &'a StmtGlobal) {
        for name in &x.names {
            if self.mutable_capture(self.scope, &name.id) == Some(MutableCapture::Nonlocal) {
                self.error(
                    name.range,
                    ErrorKind::BadGlobal,
                    format!("`{}` was already declared nonlocal", name.id),
                );
                continue;
            }
            if !self.at_module_scope() && self.scopes.look_up(self.scope, &name.id).is_some() {
                self.error(
                    name.range,
                    ErrorKind::GlobalReassignment,
                    format!("`{}` was assigned before its `global` declaration", name.id),
                );
            }
            self.record_mutable_capture(name.id.clone(), MutableCapture::Global);
            let global = self.scopes.global_scope(self.scope);
            self.add_symbol(global, &name.id);
        }
    }

    fn nonlocal_stmt(&mut self, x: &'a StmtNonlocal) {
        if self.at_module_scope() {
            self.error(
                x.range,
                ErrorKind::BadNonlocal,
                "`nonlocal` is not allowed at module scope".to_owned(),
            );
            return;
        }
        for name in &x.names {
            if self.mutable_capture(self.scope, &name.id) == Some(MutableCapture::Global) {
                self.error(
                    name.range,
                    ErrorKind::BadNonlocal,
                    format!("`{}` was already declared global", name.id),
                );
                continue;
            }
            if self.scopes.look_up(self.scope, &name.id).is_some() {
                self.error(
                    name.range,
                    ErrorKind::BadNonlocal,
                    format!("`{}` was assigned before its `nonlocal` declaration", name.id),
                );
                continue;
            }
            if self.nonlocal_target(&name.id).is_none() {
                self.error(
                    name.range,
                    ErrorKind::BadNonlocal,
                    format!("No binding for nonlocal `{}` found in an enclosing scope", name.id),
                );
                continue;
            }
            self.record_mutable_capture(name.id.clone(), MutableCapture::Nonlocal);
        }
    }

    /// Record declarations for a bare annotation like `x: int`, which
    /// declares the name without binding it.
    fn declare_annotated_name(&mut self, name: &ExprName, info: &TargetInfo) {
        let symbol = self.bind_name(&name.id);
        if info.is_class_var {
            self.scopes.symbol_mut(symbol).flags |= SymbolFlags::CLASS_VAR;
        }
        if info.is_final && self.in_class_body() {
            // An uninitialized `Final` at class body top level still
            // declares an instance member.
            self.scopes.symbol_mut(symbol).flags |= SymbolFlags::INSTANCE_MEMBER;
        }
        self.scopes.add_declaration(
            symbol,
            Declaration::Variable(VariableDeclaration {
                range: name.range,
                is_constant: is_constant_name(name.id.as_str()),
                annotation: info.annotation,
                is_final: info.is_final,
                type_alias_annotation: info.type_alias_annotation,
                type_alias_name: if info.type_alias_annotation.is_some() {
                    Some(name.id.clone())
                } else {
                    None
                },
                ..Default::default()
            }),
        );
    }
}
