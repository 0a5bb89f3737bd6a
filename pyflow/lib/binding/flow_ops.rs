/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! The binder's side of flow-graph construction: every node created here
//! also threads into the enclosing try block's except labels (an exception
//! may escape from any side-effecting statement) and records its reference
//! keys in the active execution scope.

use ruff_python_ast::Expr;
use ruff_python_ast::name::Name;
use ruff_text_size::Ranged;
use starlark_map::small_set::SmallSet;

use crate::binding::binder::Binder;
use crate::binding::flow::AssignTarget;
use crate::binding::flow::ConditionKind;
use crate::binding::flow::FlowNodeId;
use crate::binding::narrow::ReferenceKey;
use crate::binding::narrow::is_narrowing_expression;
use crate::binding::scope::SymbolId;
use crate::binding::table::NodeKey;

impl<'a> Binder<'a> {
    /// Record that the flow graph mentions this key, so later narrowing
    /// knows a use of it needs flow analysis.
    pub(crate) fn record_reference(&mut self, key: ReferenceKey) {
        self.tables
            .code_flow_expressions
            .entry(self.execution_scope)
            .or_insert_with(SmallSet::new)
            .insert(key);
    }

    fn thread_except_targets(&mut self, node: FlowNodeId) {
        if let Some(targets) = self.except_targets.last() {
            for target in targets.clone() {
                self.flow.add_antecedent(target, node);
            }
        }
    }

    /// Emit an assignment flow node for `node` and attach it. With `unbind`
    /// set, an existing attachment wins: an exception-clause name becomes
    /// unbound at the clause's end without erasing its in-clause flow.
    pub(crate) fn assignment_flow(
        &mut self,
        node: NodeKey,
        target: AssignTarget,
        reference: Option<ReferenceKey>,
        unbind: bool,
    ) {
        if let Some(key) = reference {
            self.record_reference(key);
        }
        if !self.flow.is_unreachable(self.current_flow) {
            let flow_node = self.flow.assignment(node, self.current_flow, target, unbind);
            self.thread_except_targets(flow_node);
            self.current_flow = flow_node;
        }
        if unbind && self.tables.flow.contains_key(&node) {
            return;
        }
        self.tables.flow.insert(node, self.current_flow);
    }

    pub(crate) fn assignment_alias_flow(&mut self, target: SymbolId, alias: SymbolId) {
        if !self.flow.is_unreachable(self.current_flow) {
            self.current_flow = self.flow.assignment_alias(self.current_flow, target, alias);
        }
    }

    pub(crate) fn call_flow(&mut self, node: NodeKey) {
        if !self.flow.is_unreachable(self.current_flow) {
            let flow_node = self.flow.call(node, self.current_flow);
            self.thread_except_targets(flow_node);
            self.current_flow = flow_node;
        }
        self.tables.flow.insert(node, self.current_flow);
    }

    pub(crate) fn wildcard_import_flow(&mut self, node: NodeKey, names: Vec<Name>) {
        for name in &names {
            self.record_reference(ReferenceKey::of_name(name));
        }
        if !self.flow.is_unreachable(self.current_flow) {
            let flow_node = self.flow.wildcard_import(node, self.current_flow, names);
            self.thread_except_targets(flow_node);
            self.current_flow = flow_node;
        }
    }

    /// The condition node guarding one side of a branch on `test`.
    /// Statically decided conditions prune the opposite arm; expressions
    /// that narrowing cannot use pass through unchanged.
    pub(crate) fn condition_flow(
        &mut self,
        kind: ConditionKind,
        antecedent: FlowNodeId,
        test: &Expr,
    ) -> FlowNodeId {
        if self.flow.is_unreachable(antecedent) {
            return antecedent;
        }
        if let Some(value) = self.sys_info.evaluate_bool(test)
            && value != (kind == ConditionKind::WhenTrue)
        {
            return self.flow.unreachable();
        }
        let mut keys = Vec::new();
        if !is_narrowing_expression(test, &mut keys) {
            return antecedent;
        }
        for key in keys {
            self.record_reference(key);
        }
        let node = self
            .flow
            .condition(kind, antecedent, NodeKey::Expression(test.range()));
        self.thread_except_targets(node);
        node
    }

    /// Walk `test` with the given branch targets active, then wire the
    /// condition nodes. `and`/`or`/`not` route their own short circuits and
    /// are skipped here.
    pub(crate) fn bind_conditional(
        &mut self,
        test: &'a Expr,
        true_target: FlowNodeId,
        false_target: FlowNodeId,
    ) {
        let saved = (self.true_target, self.false_target);
        self.true_target = Some(true_target);
        self.false_target = Some(false_target);
        self.expr(test);
        (self.true_target, self.false_target) = saved;
        if !is_flow_connective(test) {
            let when_true = self.condition_flow(ConditionKind::WhenTrue, self.current_flow, test);
            self.flow.add_antecedent(true_target, when_true);
            let when_false = self.condition_flow(ConditionKind::WhenFalse, self.current_flow, test);
            self.flow.add_antecedent(false_target, when_false);
        }
    }

    /// Mark the control flow as terminated (after return/raise/break/continue).
    pub(crate) fn terminate_flow(&mut self) {
        self.current_flow = self.flow.unreachable();
    }
}

fn is_flow_connective(x: &Expr) -> bool {
    match x {
        Expr::BoolOp(_) => true,
        Expr::UnaryOp(u) => u.op == ruff_python_ast::UnaryOp::Not,
        _ => false,
    }
}
