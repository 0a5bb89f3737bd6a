/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! The binder walks one module's syntax tree and produces, for every scope,
//! a symbol table; for every relevant node, a flow node; and for every
//! execution scope, the set of reference keys later narrowing will consult.
//! Function and lambda bodies are bound via a deferred queue, after the
//! enclosing scope's walk completes, mirroring Python's deferred execution
//! of function bodies.

use std::collections::VecDeque;
use std::sync::Arc;

use dupe::Dupe;
use pyflow_python::dunder;
use pyflow_python::sys_info::SysInfo;
use ruff_python_ast::ExprLambda;
use ruff_python_ast::ModModule;
use ruff_python_ast::Parameter;
use ruff_python_ast::Parameters;
use ruff_python_ast::StmtFunctionDef;
use ruff_python_ast::name::Name;
use ruff_text_size::TextRange;
use starlark_map::small_map::SmallMap;
use starlark_map::small_set::SmallSet;
use tracing::debug;
use vec1::Vec1;
use vec1::vec1;

use crate::binding::declaration::Declaration;
use crate::binding::declaration::DeclarationId;
use crate::binding::declaration::IntrinsicDeclaration;
use crate::binding::declaration::IntrinsicKind;
use crate::binding::declaration::ParameterDeclaration;
use crate::binding::flow::AssignTarget;
use crate::binding::flow::FlowGraph;
use crate::binding::flow::FlowNodeId;
use crate::binding::narrow::ReferenceKey;
use crate::binding::scope::ScopeId;
use crate::binding::scope::ScopeKind;
use crate::binding::scope::Scopes;
use crate::binding::scope::SymbolFlags;
use crate::binding::scope::SymbolId;
use crate::binding::table::BindingTables;
use crate::binding::table::NodeKey;
use crate::error::collector::ErrorCollector;
use crate::error::kind::ErrorKind;
use crate::export::lookup::ImportLookup;
use crate::export::lookup::ImportMap;
use crate::export::lookup::ModuleExports;
use crate::module::module_info::ModuleInfo;

/// How a `global` or `nonlocal` statement rebinds a name for the rest of
/// its scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutableCapture {
    Global,
    Nonlocal,
}

/// A function or lambda body whose binding was postponed until the
/// enclosing scope finished.
pub(crate) enum DeferredWork<'a> {
    FunctionBody(&'a StmtFunctionDef),
    LambdaBody(&'a ExprLambda),
}

pub(crate) struct DeferredTask<'a> {
    pub scope: ScopeId,
    pub work: DeferredWork<'a>,
    pub function: Option<DeclarationId>,
    pub enclosing_class: Option<ScopeId>,
    pub in_async: bool,
    pub in_lambda: bool,
}

pub struct Binder<'a> {
    pub(crate) module_info: ModuleInfo,
    pub(crate) sys_info: &'a SysInfo,
    pub(crate) lookup: &'a dyn ImportLookup,
    pub(crate) imports: &'a ImportMap,
    pub(crate) errors: &'a ErrorCollector,
    pub(crate) scopes: Scopes,
    pub(crate) flow: FlowGraph,
    pub(crate) tables: BindingTables,
    /// The scope statements currently bind into.
    pub(crate) scope: ScopeId,
    /// The nearest execution scope, owner of the active reference map.
    pub(crate) execution_scope: ScopeId,
    pub(crate) current_flow: FlowNodeId,
    mutable_captures: SmallMap<ScopeId, SmallMap<Name, MutableCapture>>,
    pub(crate) true_target: Option<FlowNodeId>,
    pub(crate) false_target: Option<FlowNodeId>,
    pub(crate) break_target: Option<FlowNodeId>,
    pub(crate) continue_target: Option<FlowNodeId>,
    pub(crate) return_target: Option<FlowNodeId>,
    /// One entry per enclosing try block: the labels of its except clauses.
    pub(crate) except_targets: Vec<Vec<FlowNodeId>>,
    /// Labels that intercepted `return`/`raise` flow must also reach,
    /// one per enclosing `finally`.
    pub(crate) finally_targets: Vec<FlowNodeId>,
    /// How many except clauses we are lexically inside.
    pub(crate) except_depth: u32,
    /// The declaration of the function whose body we are binding.
    pub(crate) function: Option<DeclarationId>,
    pub(crate) enclosing_class: Option<ScopeId>,
    /// The name the current method binds for its instance (usually `self`).
    pub(crate) self_name: Option<Name>,
    pub(crate) in_async: bool,
    pub(crate) in_lambda: bool,
    deferred: VecDeque<DeferredTask<'a>>,
}

/// The result of binding one module, shared behind an `Arc`.
#[derive(Debug, Clone, Dupe)]
pub struct Bindings(Arc<BindingsInner>);

#[derive(Debug)]
struct BindingsInner {
    module_info: ModuleInfo,
    scopes: Scopes,
    flow: FlowGraph,
    tables: BindingTables,
    module_scope: ScopeId,
    docstring: Option<String>,
}

impl Bindings {
    pub fn new(
        module: &ModModule,
        module_info: ModuleInfo,
        builtins: Option<&ModuleExports>,
        lookup: &dyn ImportLookup,
        imports: &ImportMap,
        sys_info: &SysInfo,
        errors: &ErrorCollector,
    ) -> Self {
        debug!("binding module {}", module_info.name());
        let mut binder = Binder::new(module_info.dupe(), builtins, lookup, imports, sys_info, errors);
        let module_scope = binder.scope;
        binder.bind_module(module);
        let docstring = pyflow_python::ast::Ast::docstring(module);
        Self(Arc::new(BindingsInner {
            module_info,
            scopes: binder.scopes,
            flow: binder.flow,
            tables: binder.tables,
            module_scope,
            docstring,
        }))
    }

    pub fn module_info(&self) -> &ModuleInfo {
        &self.0.module_info
    }

    pub fn module_scope(&self) -> ScopeId {
        self.0.module_scope
    }

    pub fn docstring(&self) -> Option<&str> {
        self.0.docstring.as_deref()
    }

    pub fn scopes(&self) -> &Scopes {
        &self.0.scopes
    }

    pub fn flow(&self) -> &FlowGraph {
        &self.0.flow
    }

    pub fn flow_of(&self, key: NodeKey) -> Option<FlowNodeId> {
        self.0.tables.flow.get(&key).copied()
    }

    pub fn after_flow_of(&self, key: NodeKey) -> Option<FlowNodeId> {
        self.0.tables.after_flow.get(&key).copied()
    }

    pub fn scope_of(&self, key: NodeKey) -> Option<ScopeId> {
        self.0.tables.scope.get(&key).copied()
    }

    pub fn declaration_of(&self, key: NodeKey) -> Option<DeclarationId> {
        self.0.tables.declaration.get(&key).copied()
    }

    pub fn code_flow_expressions(&self, scope: ScopeId) -> Option<&SmallSet<ReferenceKey>> {
        self.0.tables.code_flow_expressions.get(&scope)
    }
}

/// Module-level names that exist without any assignment, with their fixed types.
const MODULE_INTRINSICS: &[(&str, IntrinsicKind)] = &[
    ("__doc__", IntrinsicKind::Str),
    ("__name__", IntrinsicKind::Str),
    ("__loader__", IntrinsicKind::Any),
    ("__package__", IntrinsicKind::Str),
    ("__spec__", IntrinsicKind::Any),
    ("__path__", IntrinsicKind::StrIterable),
    ("__file__", IntrinsicKind::Str),
    ("__cached__", IntrinsicKind::Str),
    ("__dict__", IntrinsicKind::StrDict),
];

impl<'a> Binder<'a> {
    fn new(
        module_info: ModuleInfo,
        builtins: Option<&ModuleExports>,
        lookup: &'a dyn ImportLookup,
        imports: &'a ImportMap,
        sys_info: &'a SysInfo,
        errors: &'a ErrorCollector,
    ) -> Self {
        let mut scopes = Scopes::new();
        let mut flow = FlowGraph::new();
        // The module gets an execution scope of its own, parented on the
        // builtins scope when one is configured. Binding the builtins file
        // itself, the single scope *is* the builtins scope.
        let module_scope = match builtins {
            Some(exports) => {
                let builtin_scope = scopes.add_scope(ScopeKind::Builtin, None, TextRange::default());
                for name in exports.names() {
                    let mut flags = SymbolFlags::empty();
                    if exports.get(name).is_some_and(|x| x.is_ignored_for_protocol_match) {
                        flags |= SymbolFlags::IGNORED_FOR_PROTOCOL_MATCH;
                    }
                    scopes.add_symbol(builtin_scope, name.clone(), flags);
                }
                scopes.add_scope(ScopeKind::Module, Some(builtin_scope), TextRange::default())
            }
            None => scopes.add_scope(ScopeKind::Builtin, None, TextRange::default()),
        };
        let unreachable = flow.unreachable();
        Self {
            module_info,
            sys_info,
            lookup,
            imports,
            errors,
            scopes,
            flow,
            tables: BindingTables::default(),
            scope: module_scope,
            execution_scope: module_scope,
            current_flow: unreachable,
            mutable_captures: SmallMap::new(),
            true_target: None,
            false_target: None,
            break_target: None,
            continue_target: None,
            return_target: None,
            except_targets: Vec::new(),
            finally_targets: Vec::new(),
            except_depth: 0,
            function: None,
            enclosing_class: None,
            self_name: None,
            in_async: false,
            in_lambda: false,
            deferred: VecDeque::new(),
        }
    }

    fn bind_module(&mut self, module: &'a ModModule) {
        self.tables.scope.insert(NodeKey::Module, self.scope);
        for (name, kind) in MODULE_INTRINSICS {
            let name = Name::new(*name);
            let symbol = self.scopes.add_symbol(self.scope, name, SymbolFlags::empty());
            self.scopes.add_declaration(
                symbol,
                Declaration::Intrinsic(IntrinsicDeclaration {
                    range: TextRange::default(),
                    kind: *kind,
                }),
            );
        }
        self.current_flow = self.flow.start();
        self.stmts(&module.body);
        self.tables.after_flow.insert(NodeKey::Module, self.current_flow);
        self.drain_deferred();
    }

    /// Run queued function bodies, outermost first. Tasks enqueued while a
    /// body is being bound land at the back of the queue, so a nested
    /// function's body always runs after its enclosing body finished.
    fn drain_deferred(&mut self) {
        let mut count = 0usize;
        while let Some(task) = self.deferred.pop_front() {
            count += 1;
            self.run_deferred(task);
        }
        if count > 0 {
            debug!("bound {count} deferred function bodies");
        }
    }

    pub(crate) fn defer(&mut self, task: DeferredTask<'a>) {
        self.deferred.push_back(task);
    }

    fn run_deferred(&mut self, task: DeferredTask<'a>) {
        // Restore the ambient state captured when the task was enqueued,
        // and reset everything that must not leak across bodies.
        self.scope = task.scope;
        self.execution_scope = self.scopes.execution_scope(task.scope);
        self.function = task.function;
        self.enclosing_class = task.enclosing_class;
        self.self_name = None;
        self.in_async = task.in_async;
        self.in_lambda = task.in_lambda;
        self.true_target = None;
        self.false_target = None;
        self.break_target = None;
        self.continue_target = None;
        self.except_targets.clear();
        self.finally_targets.clear();
        self.except_depth = 0;
        match task.work {
            DeferredWork::FunctionBody(x) => self.bind_function_body(x),
            DeferredWork::LambdaBody(x) => self.bind_lambda_body(x),
        }
    }

    fn bind_function_body(&mut self, x: &'a StmtFunctionDef) {
        self.current_flow = self.flow.start();
        self.bind_parameters(&x.parameters);
        if self.function.is_some_and(|f| {
            matches!(self.scopes.declaration(f), Declaration::Function(f) if f.is_method)
        }) {
            self.self_name = first_parameter_name(&x.parameters);
        }
        let return_label = self.flow.branch_label();
        self.return_target = Some(return_label);
        self.stmts(&x.body);
        self.flow.add_antecedent(return_label, self.current_flow);
        let after = self.flow.finish_label(return_label);
        self.tables.after_flow.insert(NodeKey::Statement(x.range), after);
    }

    fn bind_lambda_body(&mut self, x: &'a ExprLambda) {
        self.current_flow = self.flow.start();
        if let Some(parameters) = &x.parameters {
            self.bind_parameters(parameters);
        }
        let return_label = self.flow.branch_label();
        self.return_target = Some(return_label);
        self.expr(&x.body);
        self.flow.add_antecedent(return_label, self.current_flow);
        let after = self.flow.finish_label(return_label);
        self.tables.after_flow.insert(NodeKey::Expression(x.range), after);
    }

    fn bind_parameters(&mut self, parameters: &'a Parameters) {
        for parameter in all_parameters(parameters) {
            self.bind_parameter(parameter);
        }
    }

    fn bind_parameter(&mut self, parameter: &'a Parameter) {
        let name = &parameter.name;
        // Parameters are bound on entry, so unlike other local variables
        // they are never initially unbound.
        let symbol = match self.scopes.look_up(self.scope, &name.id) {
            Some(existing) => existing,
            None => self
                .scopes
                .add_symbol(self.scope, name.id.clone(), SymbolFlags::empty()),
        };
        let key = NodeKey::Parameter(parameter.range);
        let declaration = self.scopes.add_declaration(
            symbol,
            Declaration::Parameter(ParameterDeclaration {
                node: key,
                range: name.range,
            }),
        );
        self.tables.declaration.insert(key, declaration);
        self.assignment_flow(
            key,
            AssignTarget::Symbol(symbol),
            Some(ReferenceKey::of_name(&name.id)),
            false,
        );
    }

    /// Create (or find) the symbol an assignment to `name` binds, honoring
    /// `global` and `nonlocal` declarations in the current scope.
    pub(crate) fn bind_name(&mut self, name: &Name) -> SymbolId {
        match self.mutable_capture(self.scope, name) {
            Some(MutableCapture::Global) => {
                let global = self.scopes.global_scope(self.scope);
                self.add_symbol(global, name)
            }
            Some(MutableCapture::Nonlocal) => match self.nonlocal_target(name) {
                Some(symbol) => symbol,
                // The error was reported at the declaration; bind locally
                // so the rest of the scope still resolves.
                None => self.add_symbol(self.scope, name),
            },
            None => self.add_symbol(self.scope, name),
        }
    }

    pub(crate) fn add_symbol(&mut self, scope: ScopeId, name: &Name) -> SymbolId {
        if let Some(existing) = self.scopes.look_up(scope, name) {
            return existing;
        }
        let mut flags = SymbolFlags::INITIALLY_UNBOUND;
        if self.scopes.scope(scope).kind == ScopeKind::Class {
            flags |= SymbolFlags::CLASS_MEMBER;
        }
        if dunder::is_private_name(name.as_str()) {
            flags |= SymbolFlags::PRIVATE_MEMBER;
            if self.module_info.is_interface() {
                flags |= SymbolFlags::EXTERNALLY_HIDDEN;
            }
        }
        self.scopes.add_symbol(scope, name.clone(), flags)
    }

    pub(crate) fn mutable_capture(&self, scope: ScopeId, name: &Name) -> Option<MutableCapture> {
        self.mutable_captures.get(&scope)?.get(name).copied()
    }

    pub(crate) fn record_mutable_capture(&mut self, name: Name, capture: MutableCapture) {
        self.mutable_captures
            .entry(self.scope)
            .or_insert_with(SmallMap::new)
            .insert(name, capture);
    }

    /// The symbol a `nonlocal` name resolves to: the nearest binding in an
    /// enclosing function-ish scope, never the global scope.
    pub(crate) fn nonlocal_target(&self, name: &Name) -> Option<SymbolId> {
        let mut current = self.scopes.scope(self.scope).parent;
        while let Some(id) = current {
            let s = self.scopes.scope(id);
            match s.kind {
                ScopeKind::Module | ScopeKind::Builtin => return None,
                ScopeKind::Function | ScopeKind::ListComprehension => {
                    if let Some(symbol) = s.symbols.get(name) {
                        return Some(*symbol);
                    }
                }
                ScopeKind::Class => {}
            }
            current = s.parent;
        }
        None
    }

    pub(crate) fn error(&self, range: TextRange, kind: ErrorKind, msg: String) {
        self.errors.add(range, kind, vec1![msg]);
    }

    pub(crate) fn error_multiline(&self, range: TextRange, kind: ErrorKind, msg: Vec1<String>) {
        self.errors.add(range, kind, msg);
    }

    /// Is the innermost function-ish scope we are binding a class body?
    pub(crate) fn in_class_body(&self) -> bool {
        self.scopes.scope(self.scope).kind == ScopeKind::Class
    }

    pub(crate) fn at_module_scope(&self) -> bool {
        matches!(
            self.scopes.scope(self.scope).kind,
            ScopeKind::Module | ScopeKind::Builtin
        )
    }
}

pub(crate) fn all_parameters(parameters: &Parameters) -> impl Iterator<Item = &Parameter> {
    parameters
        .posonlyargs
        .iter()
        .map(|x| &x.parameter)
        .chain(parameters.args.iter().map(|x| &x.parameter))
        .chain(parameters.vararg.as_deref())
        .chain(parameters.kwonlyargs.iter().map(|x| &x.parameter))
        .chain(parameters.kwarg.as_deref())
}

fn first_parameter_name(parameters: &Parameters) -> Option<Name> {
    parameters
        .posonlyargs
        .first()
        .or_else(|| parameters.args.first())
        .map(|x| x.parameter.name.id.clone())
}
