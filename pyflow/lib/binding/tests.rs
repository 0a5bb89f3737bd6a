/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! End-to-end tests for the binder: parse a literal program, bind it, and
//! assert on the scopes, declarations, flow graph and diagnostics.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use dupe::Dupe;
use pyflow_python::module_name::ModuleName;
use pyflow_python::module_path::ModulePath;
use pyflow_python::sys_info::SysInfo;
use ruff_python_ast::ModModule;
use ruff_python_ast::Stmt;
use ruff_python_ast::name::Name;
use ruff_text_size::Ranged;
use ruff_text_size::TextRange;
use ruff_text_size::TextSize;
use starlark_map::small_map::SmallMap;

use crate::binding::binder::Bindings;
use crate::binding::declaration::Declaration;
use crate::binding::flow::FlowGraph;
use crate::binding::flow::FlowNode;
use crate::binding::flow::FlowNodeId;
use crate::binding::scope::ScopeKind;
use crate::binding::scope::SymbolFlags;
use crate::binding::scope::SymbolId;
use crate::binding::table::NodeKey;
use crate::error::collector::ErrorCollector;
use crate::error::config::RuleConfig;
use crate::error::error::Error;
use crate::error::kind::ErrorKind;
use crate::export::lookup::ImplicitImport;
use crate::export::lookup::ImportInfo;
use crate::export::lookup::ImportLookup;
use crate::export::lookup::ImportMap;
use crate::export::lookup::ImportType;
use crate::export::lookup::ModuleExports;
use crate::module::module_info::ModuleInfo;

#[derive(Default)]
struct StubLookup(SmallMap<ModulePath, ModuleExports>);

impl StubLookup {
    fn with(mut self, path: &str, exports: ModuleExports) -> Self {
        self.0
            .insert(ModulePath::filesystem(PathBuf::from(path)), exports);
        self
    }
}

impl ImportLookup for StubLookup {
    fn get(&self, path: &ModulePath) -> Option<ModuleExports> {
        self.0.get(path).cloned()
    }
}

fn found_info(paths: &[&str]) -> ImportInfo {
    ImportInfo {
        is_import_found: true,
        is_stub_file: false,
        import_type: ImportType::Local,
        is_py_typed_present: false,
        has_source_file: true,
        resolved_paths: paths
            .iter()
            .map(|p| Some(ModulePath::filesystem(PathBuf::from(*p))))
            .collect(),
        implicit_imports: Vec::new(),
    }
}

/// Attach the same import info to every import statement in the module.
fn imports_for_all(module: &ModModule, info: ImportInfo) -> ImportMap {
    let mut imports = ImportMap::new();
    for stmt in &module.body {
        match stmt {
            Stmt::Import(x) => {
                for alias in &x.names {
                    imports.insert(alias.name.range, info.clone());
                }
            }
            Stmt::ImportFrom(x) => imports.insert(x.range, info.clone()),
            _ => {}
        }
    }
    imports
}

struct Bound {
    code: String,
    module: ModModule,
    bindings: Bindings,
    errors: Vec<Error>,
}

fn bind(code: &str) -> Bound {
    bind_full(code, "main", "main.py", None, &StubLookup::default(), |_| {
        ImportMap::new()
    })
}

fn bind_full(
    code: &str,
    name: &str,
    path: &str,
    builtins: Option<&ModuleExports>,
    lookup: &dyn ImportLookup,
    make_imports: impl FnOnce(&ModModule) -> ImportMap,
) -> Bound {
    let module_info = ModuleInfo::new(
        ModuleName::from_str(name),
        ModulePath::filesystem(PathBuf::from(path)),
        Arc::new(code.to_owned()),
    );
    let errors = ErrorCollector::new(module_info.dupe(), RuleConfig::default());
    let module = module_info.parse(&errors);
    let imports = make_imports(&module);
    let sys_info = SysInfo::default();
    let bindings = Bindings::new(
        &module,
        module_info,
        builtins,
        lookup,
        &imports,
        &sys_info,
        &errors,
    );
    Bound {
        code: code.to_owned(),
        module,
        bindings,
        errors: errors.collect(),
    }
}

impl Bound {
    /// The range of `inner` within the first occurrence of `outer`.
    fn range_in(&self, outer: &str, inner: &str) -> TextRange {
        let outer_at = self.code.find(outer).unwrap_or_else(|| {
            panic!("`{outer}` not found in test program")
        });
        let inner_at = outer_at + self.code[outer_at..outer_at + outer.len()]
            .find(inner)
            .unwrap_or_else(|| panic!("`{inner}` not found within `{outer}`"));
        TextRange::new(
            TextSize::new(inner_at as u32),
            TextSize::new((inner_at + inner.len()) as u32),
        )
    }

    fn range_of(&self, needle: &str) -> TextRange {
        self.range_in(needle, needle)
    }

    fn error_kinds(&self) -> Vec<ErrorKind> {
        self.errors.iter().map(|x| x.kind()).collect()
    }

    fn module_symbol(&self, name: &str) -> Option<SymbolId> {
        self.bindings
            .scopes()
            .look_up(self.bindings.module_scope(), &Name::new(name))
    }

    fn stmt_flow(&self, needle: &str) -> FlowNodeId {
        self.bindings
            .flow_of(NodeKey::Statement(self.range_of(needle)))
            .unwrap_or_else(|| panic!("no flow attached to statement `{needle}`"))
    }
}

/// Every assignment node reachable by walking antecedents backwards.
fn reachable_assignments(flow: &FlowGraph, start: FlowNodeId) -> HashSet<NodeKey> {
    let mut result = HashSet::new();
    let mut visited = HashSet::new();
    let mut stack = vec![start];
    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        match flow.get(id) {
            FlowNode::Assignment {
                node, antecedent, ..
            } => {
                result.insert(*node);
                stack.push(*antecedent);
            }
            FlowNode::BranchLabel(label) | FlowNode::LoopLabel(label) => {
                stack.extend(label.antecedents.iter().copied());
            }
            other => {
                if let Some(antecedent) = other.antecedent() {
                    stack.push(antecedent);
                }
            }
        }
    }
    result
}

#[test]
fn test_branch_assignments_both_reach_use() {
    let bound = bind("x = 1\nif cond:\n    x = 2\nprint(x)\n");
    assert_eq!(bound.error_kinds(), Vec::new());

    // One symbol `x`, two variable declarations, in source order.
    let symbol = bound.module_symbol("x").unwrap();
    let declarations = &bound.bindings.scopes().symbol(symbol).declarations;
    assert_eq!(declarations.len(), 2);
    let ranges = declarations
        .iter()
        .map(|d| bound.bindings.scopes().declaration(*d).range().start())
        .collect::<Vec<_>>();
    assert!(ranges[0] < ranges[1], "declarations must be in source order");

    // The use of `x` sees both assignments through the branch join.
    let use_flow = bound
        .bindings
        .flow_of(NodeKey::Expression(bound.range_in("print(x)", "x")))
        .unwrap();
    let assignments = reachable_assignments(bound.bindings.flow(), use_flow);
    assert!(assignments.contains(&NodeKey::Expression(bound.range_in("x = 1", "x"))));
    assert!(assignments.contains(&NodeKey::Expression(bound.range_in("x = 2", "x"))));

    // `cond` is not statically known, so neither arm is unreachable.
    assert!(
        !bound
            .bindings
            .flow()
            .is_unreachable(bound.stmt_flow("x = 2"))
    );
    assert!(
        !bound
            .bindings
            .flow()
            .is_unreachable(bound.stmt_flow("print(x)"))
    );
}

#[test]
fn test_global_binds_into_module_scope() {
    let bound = bind("def f():\n    global g\n    g = 1\n");
    assert_eq!(bound.error_kinds(), Vec::new());
    // `g` lands in the module scope, not in `f`.
    assert!(bound.module_symbol("g").is_some());
    let function_scope = bound
        .bindings
        .scope_of(NodeKey::Statement(bound.range_of("def f():\n    global g\n    g = 1")))
        .unwrap();
    assert!(
        bound
            .bindings
            .scopes()
            .look_up(function_scope, &Name::new("g"))
            .is_none()
    );
}

#[test]
fn test_assignment_before_global_is_reported() {
    let bound = bind("def f():\n    g = 0\n    global g\n");
    assert_eq!(bound.error_kinds(), vec![ErrorKind::GlobalReassignment]);
}

#[test]
fn test_try_except_finally_flow() {
    let code = "try:\n    a = 1\nexcept E as e:\n    a = 2\nfinally:\n    a = 3\n";
    let bound = bind(code);

    // The except label joins the pre-try flow and the try body's
    // post-assignment flow. The caught-type expression is the first thing
    // evaluated in the clause, so its flow is the label itself.
    let handler_entry = bound
        .bindings
        .flow_of(NodeKey::Expression(bound.range_in("except E as e", "E")))
        .unwrap();
    match bound.bindings.flow().get(handler_entry) {
        FlowNode::BranchLabel(label) => assert_eq!(label.antecedents.len(), 2),
        other => panic!("expected the handler to start at a branch label, got {other:?}"),
    }

    // `e` is assigned at clause entry and unbound at clause exit; the
    // attached flow keeps the in-clause assignment visible.
    let e_key = NodeKey::Identifier(bound.range_in("as e", "e"));
    let e_nodes = bound
        .bindings
        .flow()
        .nodes()
        .filter_map(|(_, node)| match node {
            FlowNode::Assignment { node, unbind, .. } if *node == e_key => Some(*unbind),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(e_nodes, vec![false, true]);
    match bound.bindings.flow().get(bound.bindings.flow_of(e_key).unwrap()) {
        FlowNode::Assignment { unbind, .. } => assert!(!*unbind),
        other => panic!("expected an assignment attached to `e`, got {other:?}"),
    }

    // Both the try and except paths reach the finally suite, and the flow
    // after it is a reachable post-finally node.
    assert!(
        !bound
            .bindings
            .flow()
            .is_unreachable(bound.stmt_flow("a = 3"))
    );
    let after = bound.bindings.after_flow_of(NodeKey::Module).unwrap();
    let mut found_post_finally = false;
    let mut cursor = after;
    loop {
        match bound.bindings.flow().get(cursor) {
            FlowNode::PostFinally { gate, .. } => {
                found_post_finally = true;
                assert!(matches!(
                    bound.bindings.flow().get(*gate),
                    FlowNode::PreFinallyGate { .. }
                ));
                break;
            }
            node => match node.antecedent() {
                Some(antecedent) => cursor = antecedent,
                None => break,
            },
        }
    }
    assert!(found_post_finally, "module flow should end behind the finally");
}

#[test]
fn test_except_labels_collect_try_body_effects() {
    let code = "try:\n    a = 1\n    b = 2\nexcept E:\n    pass\n";
    let bound = bind(code);
    let handler_entry = bound.stmt_flow("pass");
    match bound.bindings.flow().get(handler_entry) {
        FlowNode::BranchLabel(label) => {
            // Pre-try flow plus one edge per assignment in the try body.
            assert_eq!(label.antecedents.len(), 3);
        }
        other => panic!("expected a branch label, got {other:?}"),
    }
}

#[test]
fn test_comprehension_scope_and_walrus_hoisting() {
    let bound = bind("xs = [1]\nys = [x for x in xs if x > 0]\nzs = [(y := x) for x in xs]\n");
    assert_eq!(bound.error_kinds(), Vec::new());

    let comp_key = NodeKey::Expression(bound.range_of("[x for x in xs if x > 0]"));
    let comp_scope = bound.bindings.scope_of(comp_key).unwrap();
    assert_eq!(
        bound.bindings.scopes().scope(comp_scope).kind,
        ScopeKind::ListComprehension
    );
    // `x` binds inside the comprehension and does not leak out.
    assert!(
        bound
            .bindings
            .scopes()
            .look_up(comp_scope, &Name::new("x"))
            .is_some()
    );
    assert!(bound.module_symbol("x").is_none());

    // The walrus target hoists out of the comprehension scope.
    assert!(bound.module_symbol("y").is_some());
    let walrus_comp = bound
        .bindings
        .scope_of(NodeKey::Expression(bound.range_of("[(y := x) for x in xs]")))
        .unwrap();
    assert!(
        bound
            .bindings
            .scopes()
            .look_up(walrus_comp, &Name::new("y"))
            .is_none()
    );
}

#[test]
fn test_walrus_colliding_with_comprehension_target() {
    let bound = bind("ys = [(x := 1) for x in xs]\n");
    assert_eq!(bound.error_kinds(), vec![ErrorKind::BadWalrusTarget]);
}

#[test]
fn test_init_module_submodule_import() {
    let code = "from . import sub\nsub = 1\n";
    let sub_path = ModulePath::filesystem(PathBuf::from("pkg/sub.py"));
    let bound = bind_full(
        code,
        "pkg",
        "pkg/__init__.py",
        None,
        &StubLookup::default(),
        |module| {
            let mut info = found_info(&["pkg/__init__.py"]);
            info.implicit_imports = vec![ImplicitImport {
                name: Name::new("sub"),
                path: sub_path.clone(),
            }];
            imports_for_all(module, info)
        },
    );
    assert_eq!(bound.error_kinds(), Vec::new());
    let symbol = bound.module_symbol("sub").unwrap();
    let declarations = &bound.bindings.scopes().symbol(symbol).declarations;
    assert_eq!(declarations.len(), 2);
    match bound.bindings.scopes().declaration(declarations[0]) {
        Declaration::Alias(alias) => {
            let fallback = alias
                .submodule_fallback
                .as_ref()
                .expect("expected an implicit submodule fallback");
            assert_eq!(fallback.path.as_ref(), Some(&sub_path));
        }
        other => panic!("expected the alias first, got {other:?}"),
    }
    assert!(matches!(
        bound.bindings.scopes().declaration(declarations[1]),
        Declaration::Variable(_)
    ));
}

#[test]
fn test_init_module_binds_submodule_of_relative_from() {
    let bound = bind_full(
        "from .a import b\n",
        "pkg",
        "pkg/__init__.py",
        None,
        &StubLookup::default(),
        |module| imports_for_all(module, found_info(&["pkg/a.py"])),
    );
    assert!(bound.module_symbol("a").is_some());
    assert!(bound.module_symbol("b").is_some());

    // A shadowing explicit import suppresses the implicit binding.
    let bound = bind_full(
        "from .a import a\n",
        "pkg",
        "pkg/__init__.py",
        None,
        &StubLookup::default(),
        |module| imports_for_all(module, found_info(&["pkg/a.py"])),
    );
    let symbol = bound.module_symbol("a").unwrap();
    assert_eq!(bound.bindings.scopes().symbol(symbol).declarations.len(), 1);
}

#[test]
fn test_generator_detection_even_when_unreachable() {
    let code = "def g1():\n    yield 1\n    return\n\ndef g2():\n    return\n    yield 1\n";
    let bound = bind(code);
    for stmt in &bound.module.body {
        if let Stmt::FunctionDef(def) = stmt {
            let declaration = bound
                .bindings
                .declaration_of(NodeKey::Statement(def.range()))
                .unwrap();
            match bound.bindings.scopes().declaration(declaration) {
                Declaration::Function(function) => {
                    assert!(
                        function.is_generator,
                        "{} must be a generator",
                        def.name.as_str()
                    );
                    assert_eq!(function.yields.len(), 1);
                }
                other => panic!("expected a function declaration, got {other:?}"),
            }
        }
    }
    // The second yield is dominated by `return`, so its statement flow is
    // unreachable even though generator detection saw it.
    let yield_stmt = bound.range_in("return\n    yield 1", "yield 1");
    let flow = bound
        .bindings
        .flow_of(NodeKey::Statement(yield_stmt))
        .unwrap();
    assert!(bound.bindings.flow().is_unreachable(flow));
}

#[test]
fn test_deferred_binding_order_and_nesting() {
    let code = "def outer():\n    x = 1\n    def inner():\n        return x\nouter_var = 2\n";
    let bound = bind(code);
    assert_eq!(bound.error_kinds(), Vec::new());
    // Nothing bound in a function body leaks into the module scope.
    assert!(bound.module_symbol("x").is_none());
    assert!(bound.module_symbol("outer").is_some());
    assert!(bound.module_symbol("outer_var").is_some());

    let outer_scope = bound
        .bindings
        .scope_of(NodeKey::Statement(
            bound.range_of("def outer():\n    x = 1\n    def inner():\n        return x"),
        ))
        .unwrap();
    let inner_scope = bound
        .bindings
        .scope_of(NodeKey::Statement(bound.range_of("def inner():\n        return x")))
        .unwrap();
    assert_eq!(
        bound.bindings.scopes().scope(inner_scope).parent,
        Some(outer_scope)
    );
    // `x` is visible from the inner function through the closure chain.
    let (_, found_in) = bound
        .bindings
        .scopes()
        .look_up_recursive(inner_scope, &Name::new("x"))
        .unwrap();
    assert_eq!(found_in, outer_scope);
}

#[test]
fn test_nonlocal_rebinds_outer_symbol() {
    let code = "def outer():\n    v = 1\n    def inner():\n        nonlocal v\n        v = 2\n";
    let bound = bind(code);
    assert_eq!(bound.error_kinds(), Vec::new());
    let outer_scope = bound
        .bindings
        .scope_of(NodeKey::Statement(
            bound.range_of("def outer():\n    v = 1\n    def inner():\n        nonlocal v\n        v = 2"),
        ))
        .unwrap();
    let inner_scope = bound
        .bindings
        .scope_of(NodeKey::Statement(
            bound.range_of("def inner():\n        nonlocal v\n        v = 2"),
        ))
        .unwrap();
    // Both assignments append to the single outer symbol.
    let symbol = bound
        .bindings
        .scopes()
        .look_up(outer_scope, &Name::new("v"))
        .unwrap();
    assert_eq!(bound.bindings.scopes().symbol(symbol).declarations.len(), 2);
    assert!(
        bound
            .bindings
            .scopes()
            .look_up(inner_scope, &Name::new("v"))
            .is_none()
    );
}

#[test]
fn test_nonlocal_errors() {
    let bound = bind("nonlocal x\n");
    assert!(bound.error_kinds().contains(&ErrorKind::BadNonlocal));

    let bound = bind("def f():\n    nonlocal missing\n");
    assert!(bound.error_kinds().contains(&ErrorKind::BadNonlocal));

    // A name that resolves only to the global scope is not a valid nonlocal.
    let bound = bind("g = 1\ndef f():\n    nonlocal g\n");
    assert!(bound.error_kinds().contains(&ErrorKind::BadNonlocal));
}

#[test]
fn test_while_true_makes_else_unreachable() {
    let bound = bind("while True:\n    break\nelse:\n    x = 1\ndone = 2\n");
    assert!(bound.bindings.flow().is_unreachable(bound.stmt_flow("x = 1")));
    // The break path still reaches the code after the loop.
    assert!(!bound.bindings.flow().is_unreachable(bound.stmt_flow("done = 2")));
}

#[test]
fn test_version_check_prunes_branch() {
    let bound = bind("import sys\nif sys.version_info >= (3, 0):\n    a = 1\nelse:\n    b = 2\n");
    assert!(!bound.bindings.flow().is_unreachable(bound.stmt_flow("a = 1")));
    assert!(bound.bindings.flow().is_unreachable(bound.stmt_flow("b = 2")));
}

#[test]
fn test_reference_map_collects_narrowing_keys() {
    let bound = bind("x = f()\nif isinstance(x, int):\n    pass\nif x.kind is None:\n    pass\n");
    let keys = bound
        .bindings
        .code_flow_expressions(bound.bindings.module_scope())
        .unwrap();
    let keys = keys.iter().map(|k| k.as_str()).collect::<HashSet<_>>();
    assert!(keys.contains("x"));
    assert!(keys.contains("x.kind"));
}

#[test]
fn test_annotation_preregisters_keys() {
    let bound = bind("y: int\n");
    let keys = bound
        .bindings
        .code_flow_expressions(bound.bindings.module_scope())
        .unwrap();
    assert!(keys.iter().any(|k| k.as_str() == "int"));
}

#[test]
fn test_control_flow_statement_errors() {
    let bound = bind("break\n");
    assert!(bound.error_kinds().contains(&ErrorKind::BadLoopControl));

    let bound = bind("def f():\n    continue\n");
    assert!(bound.error_kinds().contains(&ErrorKind::BadLoopControl));

    let bound = bind("return 1\n");
    assert!(bound.error_kinds().contains(&ErrorKind::BadReturn));

    let bound = bind("raise\n");
    assert!(bound.error_kinds().contains(&ErrorKind::BadRaise));

    // A bare raise is fine inside an except clause.
    let bound = bind("try:\n    pass\nexcept E:\n    raise\n");
    assert_eq!(bound.error_kinds(), Vec::new());
}

#[test]
fn test_async_rules() {
    let bound = bind("def f():\n    await g()\n");
    assert!(bound.error_kinds().contains(&ErrorKind::AsyncError));

    let bound = bind("async def f():\n    await g()\n");
    assert_eq!(bound.error_kinds(), Vec::new());

    let bound = bind("async def f():\n    yield from g()\n");
    assert!(bound.error_kinds().contains(&ErrorKind::AsyncError));

    // Plain `yield` in an async function makes an async generator; legal.
    let bound = bind("async def f():\n    yield 1\n");
    assert_eq!(bound.error_kinds(), Vec::new());
}

#[test]
fn test_merged_import_aliases() {
    let code = "import a.b\nimport a.c\n";
    let bound = bind_full(
        code,
        "main",
        "main.py",
        None,
        &StubLookup::default(),
        |module| {
            let mut imports = ImportMap::new();
            let mut ranges = Vec::new();
            for stmt in &module.body {
                if let Stmt::Import(x) = stmt {
                    ranges.push(x.names[0].name.range);
                }
            }
            imports.insert(ranges[0], found_info(&["a/__init__.py", "a/b.py"]));
            imports.insert(ranges[1], found_info(&["a/__init__.py", "a/c.py"]));
            imports
        },
    );
    let symbol = bound.module_symbol("a").unwrap();
    let declarations = &bound.bindings.scopes().symbol(symbol).declarations;
    // Both imports extend one declaration rather than appending a second.
    assert_eq!(declarations.len(), 1);
    match bound.bindings.scopes().declaration(declarations[0]) {
        Declaration::Alias(alias) => {
            assert_eq!(alias.first_name_part.as_ref().map(|n| n.as_str()), Some("a"));
            assert_eq!(
                alias.path.as_ref().map(|p| p.as_path().to_path_buf()),
                Some(PathBuf::from("a/__init__.py"))
            );
            let children = alias
                .implicit_imports
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>();
            assert_eq!(children, vec!["b", "c"]);
            assert_eq!(
                alias.implicit_imports.get(&Name::new("b")).unwrap().path,
                Some(ModulePath::filesystem(PathBuf::from("a/b.py")))
            );
        }
        other => panic!("expected an alias declaration, got {other:?}"),
    }
}

#[test]
fn test_wildcard_import() {
    let exports = ModuleExports::from_names([Name::new("a"), Name::new("b"), Name::new("_c")]);
    let lookup = StubLookup::default().with("m.py", exports);
    let bound = bind_full(
        "from m import *\n",
        "main",
        "main.py",
        None,
        &lookup,
        |module| imports_for_all(module, found_info(&["m.py"])),
    );
    assert!(bound.module_symbol("a").is_some());
    assert!(bound.module_symbol("b").is_some());
    assert!(bound.module_symbol("_c").is_none());

    let wildcard_names = bound
        .bindings
        .flow()
        .nodes()
        .find_map(|(_, node)| match node {
            FlowNode::WildcardImport { names, .. } => Some(
                names.iter().map(|n| n.as_str().to_owned()).collect::<Vec<_>>(),
            ),
            _ => None,
        })
        .expect("expected a wildcard import flow node");
    assert_eq!(wildcard_names, vec!["a", "b"]);

    let keys = bound
        .bindings
        .code_flow_expressions(bound.bindings.module_scope())
        .unwrap();
    assert!(keys.iter().any(|k| k.as_str() == "a"));
}

#[test]
fn test_wildcard_respects_dunder_all() {
    let mut exports = ModuleExports::from_names([Name::new("a"), Name::new("b")]);
    exports.set_dunder_all(vec![Name::new("a")]);
    let lookup = StubLookup::default().with("m.py", exports);
    let bound = bind_full(
        "from m import *\n",
        "main",
        "main.py",
        None,
        &lookup,
        |module| imports_for_all(module, found_info(&["m.py"])),
    );
    assert!(bound.module_symbol("a").is_some());
    assert!(bound.module_symbol("b").is_none());
}

#[test]
fn test_wildcard_outside_module_scope_is_reported() {
    let lookup = StubLookup::default().with("m.py", ModuleExports::from_names([Name::new("a")]));
    let bound = bind_full(
        "def f():\n    from m import *\n",
        "main",
        "main.py",
        None,
        &lookup,
        |module| {
            let mut imports = ImportMap::new();
            for stmt in &module.body {
                if let Stmt::FunctionDef(def) = stmt
                    && let Some(Stmt::ImportFrom(x)) = def.body.first()
                {
                    imports.insert(x.range, found_info(&["m.py"]));
                }
            }
            imports
        },
    );
    assert!(bound.error_kinds().contains(&ErrorKind::BadWildcardImport));
}

#[test]
fn test_import_diagnostics() {
    let bound = bind_full(
        "import missing\n",
        "main",
        "main.py",
        None,
        &StubLookup::default(),
        |module| imports_for_all(module, ImportInfo::not_found()),
    );
    assert_eq!(bound.error_kinds(), vec![ErrorKind::ImportError]);

    let bound = bind_full(
        "import stub_only\n",
        "main",
        "main.py",
        None,
        &StubLookup::default(),
        |module| {
            let mut info = found_info(&["stub_only.pyi"]);
            info.is_stub_file = true;
            info.has_source_file = false;
            imports_for_all(module, info)
        },
    );
    assert_eq!(bound.error_kinds(), vec![ErrorKind::MissingModuleSource]);

    let bound = bind_full(
        "import untyped\n",
        "main",
        "main.py",
        None,
        &StubLookup::default(),
        |module| {
            let mut info = found_info(&["untyped.py"]);
            info.import_type = ImportType::ThirdParty;
            imports_for_all(module, info)
        },
    );
    assert_eq!(bound.error_kinds(), vec![ErrorKind::MissingTypeStub]);
}

#[test]
fn test_stub_file_visibility() {
    let code = "import os\nfrom x import y as y\n_private = 1\n";
    let bound = bind_full(
        code,
        "m",
        "m.pyi",
        None,
        &StubLookup::default(),
        |module| imports_for_all(module, found_info(&["os/__init__.py"])),
    );
    let flags = |name: &str| {
        let symbol = bound.module_symbol(name).unwrap();
        bound.bindings.scopes().symbol(symbol).flags
    };
    assert!(flags("os").contains(SymbolFlags::EXTERNALLY_HIDDEN));
    assert!(!flags("y").contains(SymbolFlags::EXTERNALLY_HIDDEN));
    assert!(flags("_private").contains(SymbolFlags::EXTERNALLY_HIDDEN));
    assert!(flags("_private").contains(SymbolFlags::PRIVATE_MEMBER));
}

#[test]
fn test_typing_stub_special_assignments() {
    let bound = bind_full(
        "Tuple = _Alias()\nordinary = 1\n",
        "typing",
        "typing.pyi",
        None,
        &StubLookup::default(),
        |_| ImportMap::new(),
    );
    let symbol = bound.module_symbol("Tuple").unwrap();
    let declarations = &bound.bindings.scopes().symbol(symbol).declarations;
    assert_eq!(declarations.len(), 1);
    assert!(matches!(
        bound.bindings.scopes().declaration(declarations[0]),
        Declaration::SpecialBuiltInClass(_)
    ));
    // Ordinary assignments in the stub still bind normally.
    let ordinary = bound.module_symbol("ordinary").unwrap();
    assert!(matches!(
        bound.bindings.scopes().declaration(
            bound.bindings.scopes().symbol(ordinary).declarations[0]
        ),
        Declaration::Variable(_)
    ));
}

#[test]
fn test_module_intrinsics_and_docstring() {
    let bound = bind("\"\"\"A docstring.\"\"\"\nx = 1\n");
    assert_eq!(bound.bindings.docstring(), Some("A docstring."));
    for name in ["__name__", "__file__", "__dict__", "__path__"] {
        let symbol = bound.module_symbol(name).unwrap();
        assert!(matches!(
            bound.bindings.scopes().declaration(
                bound.bindings.scopes().symbol(symbol).declarations[0]
            ),
            Declaration::Intrinsic(_)
        ));
    }
}

#[test]
fn test_builtins_scope_is_parent_of_module() {
    let builtins = ModuleExports::from_names([Name::new("print"), Name::new("int")]);
    let bound = bind_full(
        "x = print\n",
        "main",
        "main.py",
        Some(&builtins),
        &StubLookup::default(),
        |_| ImportMap::new(),
    );
    let module_scope = bound.bindings.module_scope();
    assert_eq!(bound.bindings.scopes().scope(module_scope).kind, ScopeKind::Module);
    let (_, found_in) = bound
        .bindings
        .scopes()
        .look_up_recursive(module_scope, &Name::new("print"))
        .unwrap();
    assert_eq!(
        bound.bindings.scopes().scope(found_in).kind,
        ScopeKind::Builtin
    );
}

#[test]
fn test_class_members_invisible_to_methods() {
    let code = "class C:\n    attr = 1\n    def m(self):\n        self.field = 2\n        return attr\n";
    let bound = bind(code);
    let class_scope = bound
        .bindings
        .scope_of(NodeKey::Statement(bound.range_of(
            "class C:\n    attr = 1\n    def m(self):\n        self.field = 2\n        return attr",
        )))
        .unwrap();
    let scopes = bound.bindings.scopes();
    let attr = scopes.look_up(class_scope, &Name::new("attr")).unwrap();
    assert!(scopes.symbol(attr).flags.contains(SymbolFlags::CLASS_MEMBER));

    // `self.field = 2` declared an instance member on the class.
    let field = scopes.look_up(class_scope, &Name::new("field")).unwrap();
    assert!(scopes.symbol(field).flags.contains(SymbolFlags::INSTANCE_MEMBER));
    match scopes.declaration(scopes.symbol(field).declarations[0]) {
        Declaration::Variable(variable) => assert!(variable.is_defined_by_member_access),
        other => panic!("expected a variable declaration, got {other:?}"),
    }

    // The class body binding is not on the method's closure chain.
    let method_scope = bound
        .bindings
        .scope_of(NodeKey::Statement(
            bound.range_of("def m(self):\n        self.field = 2\n        return attr"),
        ))
        .unwrap();
    assert!(scopes.look_up_recursive(method_scope, &Name::new("attr")).is_none());
}

#[test]
fn test_del_emits_unbind() {
    let bound = bind("x = 1\ndel x\n");
    let del_target = NodeKey::Expression(bound.range_in("del x", "x"));
    let unbinds = bound
        .bindings
        .flow()
        .nodes()
        .filter(|(_, node)| {
            matches!(node, FlowNode::Assignment { node, unbind: true, .. } if *node == del_target)
        })
        .count();
    assert_eq!(unbinds, 1);
}

#[test]
fn test_escape_sequence_diagnostics() {
    let bound = bind("s = \"a\\qb\"\n");
    assert_eq!(bound.error_kinds(), vec![ErrorKind::InvalidEscapeSequence]);
    let expected_at = bound.code.find("\\q").unwrap();
    assert_eq!(
        bound.errors[0].range().start(),
        TextSize::new(expected_at as u32)
    );

    // Raw strings are exempt; `\n` is a real escape.
    let bound = bind("s = r\"a\\qb\"\nt = \"a\\nb\"\n");
    assert_eq!(bound.error_kinds(), Vec::new());

    // `\u` is only an escape in str literals, not bytes.
    let bound = bind("b = b\"a\\u0000\"\n");
    assert_eq!(bound.error_kinds(), vec![ErrorKind::InvalidEscapeSequence]);
}

#[test]
fn test_final_annotation_in_class_body() {
    let code = "class C:\n    limit: Final\n";
    let bound = bind(code);
    let class_scope = bound
        .bindings
        .scope_of(NodeKey::Statement(bound.range_of("class C:\n    limit: Final")))
        .unwrap();
    let symbol = bound
        .bindings
        .scopes()
        .look_up(class_scope, &Name::new("limit"))
        .unwrap();
    // An uninitialized Final at class body top level still declares an
    // instance member.
    assert!(
        bound
            .bindings
            .scopes()
            .symbol(symbol)
            .flags
            .contains(SymbolFlags::INSTANCE_MEMBER)
    );
}

#[test]
fn test_type_alias_annotation_outside_module_scope() {
    let bound = bind("def f():\n    x: TypeAlias = int\n");
    assert!(bound.error_kinds().contains(&ErrorKind::BadTypeAlias));

    let bound = bind("x: TypeAlias = int\n");
    assert_eq!(bound.error_kinds(), Vec::new());
    let symbol = bound.module_symbol("x").unwrap();
    match bound
        .bindings
        .scopes()
        .declaration(bound.bindings.scopes().symbol(symbol).declarations[0])
    {
        Declaration::Variable(variable) => {
            assert!(variable.type_alias_annotation.is_some());
            assert_eq!(variable.type_alias_name.as_ref().map(|n| n.as_str()), Some("x"));
        }
        other => panic!("expected a variable declaration, got {other:?}"),
    }
}

#[test]
fn test_binding_is_idempotent() {
    let code = "x = 1\nif x is None:\n    y = 2\nelse:\n    y = 3\nfor i in y:\n    if i:\n        break\n";
    let first = bind(code);
    let second = bind(code);
    assert_eq!(first.bindings.flow().len(), second.bindings.flow().len());
    let shape = |bound: &Bound| {
        bound
            .bindings
            .flow()
            .nodes()
            .map(|(_, node)| std::mem::discriminant(node))
            .collect::<Vec<_>>()
    };
    assert_eq!(shape(&first), shape(&second));
    let symbols = |bound: &Bound| {
        bound
            .bindings
            .scopes()
            .symbol_ids()
            .map(|id| bound.bindings.scopes().symbol(id).name.as_str().to_owned())
            .collect::<Vec<_>>()
    };
    assert_eq!(symbols(&first), symbols(&second));
}
