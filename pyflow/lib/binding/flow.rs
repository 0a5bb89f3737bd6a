/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! The control flow graph. Nodes live in a per-module arena and refer to
//! each other by id, so cycles (loop labels pointing back at themselves)
//! need no special handling. Nodes are immutable once created, except that
//! label antecedent lists grow while the graph is under construction, and
//! the pre-finally gate flag is toggled by later narrowing traversals.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use pyflow_util::index::Arena;
use pyflow_util::index::Idx;
use ruff_python_ast::name::Name;

use crate::binding::scope::SymbolId;
use crate::binding::table::NodeKey;

pub type FlowNodeId = Idx<FlowNode>;

pyflow_util::assert_words!(FlowNode, 8);

/// Which way a branch condition was taken to reach the node below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionKind {
    WhenTrue,
    WhenFalse,
}

/// The target of an assignment flow node: a resolved symbol for bare-name
/// targets, or indeterminate for member accesses (which symbol a member
/// write lands on is a type question, not a binding question).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignTarget {
    Symbol(SymbolId),
    Member,
}

#[derive(Debug, Default)]
pub struct FlowLabel {
    pub antecedents: Vec<FlowNodeId>,
}

#[derive(Debug)]
pub enum FlowNode {
    /// The entry of a module or function body.
    Start,
    /// The singleton node for code no path reaches.
    Unreachable,
    /// A join point for branching control flow.
    BranchLabel(FlowLabel),
    /// A join point whose antecedents include back edges.
    LoopLabel(FlowLabel),
    /// A name or member was (re)bound. `unbind` marks the target as cleared
    /// instead, e.g. an exception name at the end of its handler.
    Assignment {
        node: NodeKey,
        antecedent: FlowNodeId,
        target: AssignTarget,
        unbind: bool,
    },
    /// A comprehension target shadowing a name from the enclosing scope;
    /// lets narrowing thread through the shadowing.
    AssignmentAlias {
        antecedent: FlowNodeId,
        target: SymbolId,
        alias: SymbolId,
    },
    /// A call was evaluated. Later phases use this to cut flow after calls
    /// to functions that never return.
    Call {
        node: NodeKey,
        antecedent: FlowNodeId,
    },
    /// A narrowing condition held (or failed) on the path below.
    Condition {
        kind: ConditionKind,
        antecedent: FlowNodeId,
        node: NodeKey,
    },
    /// Guards the entry to a `finally` suite from intercepted raise/return
    /// paths. Closed and reopened by later traversals, not by the binder.
    PreFinallyGate {
        antecedent: FlowNodeId,
        is_gate_closed: AtomicBool,
    },
    /// The flow after a `finally` suite, remembering which gate pairs with it.
    PostFinally {
        antecedent: FlowNodeId,
        gate: FlowNodeId,
    },
    /// A wildcard import bound every listed name at once.
    WildcardImport {
        node: NodeKey,
        antecedent: FlowNodeId,
        names: Vec<Name>,
    },
}

impl FlowNode {
    /// The single antecedent of a non-label node, if it has one.
    pub fn antecedent(&self) -> Option<FlowNodeId> {
        match self {
            FlowNode::Start | FlowNode::Unreachable => None,
            FlowNode::BranchLabel(_) | FlowNode::LoopLabel(_) => None,
            FlowNode::Assignment { antecedent, .. }
            | FlowNode::AssignmentAlias { antecedent, .. }
            | FlowNode::Call { antecedent, .. }
            | FlowNode::Condition { antecedent, .. }
            | FlowNode::PreFinallyGate { antecedent, .. }
            | FlowNode::PostFinally { antecedent, .. }
            | FlowNode::WildcardImport { antecedent, .. } => Some(*antecedent),
        }
    }
}

#[derive(Debug)]
pub struct FlowGraph {
    nodes: Arena<FlowNode>,
    unreachable: FlowNodeId,
}

impl FlowGraph {
    pub fn new() -> Self {
        let mut nodes = Arena::new();
        let unreachable = nodes.insert(FlowNode::Unreachable);
        Self { nodes, unreachable }
    }

    pub fn unreachable(&self) -> FlowNodeId {
        self.unreachable
    }

    pub fn is_unreachable(&self, id: FlowNodeId) -> bool {
        id == self.unreachable
    }

    pub fn get(&self, id: FlowNodeId) -> &FlowNode {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (FlowNodeId, &FlowNode)> {
        self.nodes.items()
    }

    pub fn start(&mut self) -> FlowNodeId {
        self.nodes.insert(FlowNode::Start)
    }

    pub fn branch_label(&mut self) -> FlowNodeId {
        self.nodes.insert(FlowNode::BranchLabel(FlowLabel::default()))
    }

    pub fn loop_label(&mut self) -> FlowNodeId {
        self.nodes.insert(FlowNode::LoopLabel(FlowLabel::default()))
    }

    /// Add an antecedent to a label, skipping unreachable edges and duplicates.
    pub fn add_antecedent(&mut self, label: FlowNodeId, node: FlowNodeId) {
        if self.is_unreachable(node) {
            return;
        }
        match self.nodes.get_mut(label) {
            FlowNode::BranchLabel(l) | FlowNode::LoopLabel(l) => {
                if !l.antecedents.contains(&node) {
                    l.antecedents.push(node);
                }
            }
            n => unreachable!("add_antecedent on non-label flow node {n:?}"),
        }
    }

    /// Collapse a finished label: no antecedents means the code below is
    /// unreachable, a single antecedent means the label adds nothing.
    pub fn finish_label(&self, label: FlowNodeId) -> FlowNodeId {
        match self.get(label) {
            FlowNode::BranchLabel(l) | FlowNode::LoopLabel(l) => match l.antecedents.as_slice() {
                [] => self.unreachable,
                [single] => *single,
                _ => label,
            },
            n => unreachable!("finish_label on non-label flow node {n:?}"),
        }
    }

    pub fn antecedents(&self, label: FlowNodeId) -> &[FlowNodeId] {
        match self.get(label) {
            FlowNode::BranchLabel(l) | FlowNode::LoopLabel(l) => &l.antecedents,
            _ => &[],
        }
    }

    pub fn assignment(
        &mut self,
        node: NodeKey,
        antecedent: FlowNodeId,
        target: AssignTarget,
        unbind: bool,
    ) -> FlowNodeId {
        debug_assert!(!self.is_unreachable(antecedent));
        self.nodes.insert(FlowNode::Assignment {
            node,
            antecedent,
            target,
            unbind,
        })
    }

    pub fn assignment_alias(
        &mut self,
        antecedent: FlowNodeId,
        target: SymbolId,
        alias: SymbolId,
    ) -> FlowNodeId {
        debug_assert!(!self.is_unreachable(antecedent));
        self.nodes.insert(FlowNode::AssignmentAlias {
            antecedent,
            target,
            alias,
        })
    }

    pub fn call(&mut self, node: NodeKey, antecedent: FlowNodeId) -> FlowNodeId {
        debug_assert!(!self.is_unreachable(antecedent));
        self.nodes.insert(FlowNode::Call { node, antecedent })
    }

    pub fn condition(
        &mut self,
        kind: ConditionKind,
        antecedent: FlowNodeId,
        node: NodeKey,
    ) -> FlowNodeId {
        debug_assert!(!self.is_unreachable(antecedent));
        self.nodes.insert(FlowNode::Condition {
            kind,
            antecedent,
            node,
        })
    }

    pub fn wildcard_import(
        &mut self,
        node: NodeKey,
        antecedent: FlowNodeId,
        names: Vec<Name>,
    ) -> FlowNodeId {
        debug_assert!(!self.is_unreachable(antecedent));
        self.nodes.insert(FlowNode::WildcardImport {
            node,
            antecedent,
            names,
        })
    }

    pub fn pre_finally_gate(&mut self, antecedent: FlowNodeId) -> FlowNodeId {
        self.nodes.insert(FlowNode::PreFinallyGate {
            antecedent,
            is_gate_closed: AtomicBool::new(false),
        })
    }

    pub fn post_finally(&mut self, antecedent: FlowNodeId, gate: FlowNodeId) -> FlowNodeId {
        debug_assert!(matches!(self.get(gate), FlowNode::PreFinallyGate { .. }));
        self.nodes.insert(FlowNode::PostFinally { antecedent, gate })
    }

    /// Toggle a gate. The binder never calls this; narrowing traversals do,
    /// to model a `finally` suite's dual reachability.
    pub fn set_gate_closed(&self, gate: FlowNodeId, closed: bool) {
        match self.get(gate) {
            FlowNode::PreFinallyGate { is_gate_closed, .. } => {
                is_gate_closed.store(closed, Ordering::Relaxed);
            }
            n => unreachable!("set_gate_closed on non-gate flow node {n:?}"),
        }
    }

    pub fn is_gate_closed(&self, gate: FlowNodeId) -> bool {
        match self.get(gate) {
            FlowNode::PreFinallyGate { is_gate_closed, .. } => {
                is_gate_closed.load(Ordering::Relaxed)
            }
            n => unreachable!("is_gate_closed on non-gate flow node {n:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_label() {
        let mut flow = FlowGraph::new();
        let start = flow.start();
        let label = flow.branch_label();
        // No antecedents: the label collapses to unreachable.
        assert_eq!(flow.finish_label(label), flow.unreachable());
        // One antecedent: the label is transparent.
        flow.add_antecedent(label, start);
        assert_eq!(flow.finish_label(label), start);
        // Two antecedents: the label stands.
        let other = flow.start();
        flow.add_antecedent(label, other);
        assert_eq!(flow.finish_label(label), label);
    }

    #[test]
    fn test_add_antecedent_dedups_and_skips_unreachable() {
        let mut flow = FlowGraph::new();
        let start = flow.start();
        let label = flow.branch_label();
        flow.add_antecedent(label, start);
        flow.add_antecedent(label, start);
        flow.add_antecedent(label, flow.unreachable());
        assert_eq!(flow.antecedents(label), &[start]);
    }

    #[test]
    fn test_gate_toggles() {
        let mut flow = FlowGraph::new();
        let start = flow.start();
        let gate = flow.pre_finally_gate(start);
        let post = flow.post_finally(start, gate);
        assert!(!flow.is_gate_closed(gate));
        flow.set_gate_closed(gate, true);
        assert!(flow.is_gate_closed(gate));
        match flow.get(post) {
            FlowNode::PostFinally { gate: g, .. } => assert_eq!(*g, gate),
            _ => panic!("expected PostFinally"),
        }
    }
}
