/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Side tables attaching binder output to AST nodes. The AST itself stays
//! immutable; everything later phases need is keyed by [`NodeKey`].

use ruff_python_ast::Expr;
use ruff_python_ast::Identifier;
use ruff_python_ast::Stmt;
use ruff_text_size::Ranged;
use ruff_text_size::TextRange;
use starlark_map::small_map::SmallMap;
use starlark_map::small_set::SmallSet;

use crate::binding::declaration::DeclarationId;
use crate::binding::flow::FlowNodeId;
use crate::binding::narrow::ReferenceKey;
use crate::binding::scope::ScopeId;

/// Identifies an AST node. Ranges alone are not unique (an expression
/// statement shares its range with its expression), so the key carries the
/// node's syntactic role as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKey {
    Module,
    Statement(TextRange),
    Expression(TextRange),
    Identifier(TextRange),
    Parameter(TextRange),
}

impl NodeKey {
    pub fn stmt(x: &Stmt) -> Self {
        Self::Statement(x.range())
    }

    pub fn expr(x: &Expr) -> Self {
        Self::Expression(x.range())
    }

    pub fn ident(x: &Identifier) -> Self {
        Self::Identifier(x.range())
    }
}

/// Everything the binder attaches to the syntax tree.
#[derive(Debug, Default)]
pub struct BindingTables {
    /// The flow node in effect where each relevant node executes.
    pub flow: SmallMap<NodeKey, FlowNodeId>,
    /// The flow node after a suite-like node (module, function body) completes.
    pub after_flow: SmallMap<NodeKey, FlowNodeId>,
    /// The scope introduced by each scope-introducing node.
    pub scope: SmallMap<NodeKey, ScopeId>,
    /// The declaration recorded for each class, function and parameter node.
    pub declaration: SmallMap<NodeKey, DeclarationId>,
    /// Per execution scope, every reference key the flow graph mentions.
    /// Later narrowing consults this to decide whether a use needs flow analysis.
    pub code_flow_expressions: SmallMap<ScopeId, SmallSet<ReferenceKey>>,
}
