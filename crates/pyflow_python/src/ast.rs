/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under the MIT license found in the
 * LICENSE file in the root directory of this source tree.
 */

use std::iter;

use ruff_python_ast::Expr;
use ruff_python_ast::ExprName;
use ruff_python_ast::Identifier;
use ruff_python_ast::ModModule;
use ruff_python_ast::Pattern;
use ruff_python_ast::PySourceType;
use ruff_python_ast::Stmt;
use ruff_python_ast::StmtIf;
use ruff_python_parser::ParseError;
use ruff_python_parser::parse_unchecked_source;
use ruff_text_size::TextRange;

/// Just used for convenient namespacing - not a real type
pub struct Ast;

impl Ast {
    pub fn parse(contents: &str) -> (ModModule, Vec<ParseError>) {
        // PySourceType of Python vs Stub doesn't actually change the parsing
        let res = parse_unchecked_source(contents, PySourceType::Python);
        let errors = res.errors().to_owned();
        (res.into_syntax(), errors)
    }

    /// Iterates over the branches of an if statement, returning the test and body.
    /// A test of `None` is an `else` branch that is always taken.
    pub fn if_branches(x: &StmtIf) -> impl Iterator<Item = (TextRange, Option<&Expr>, &[Stmt])> {
        let first = iter::once((x.range, Some(&*x.test), x.body.as_slice()));
        let elses = x
            .elif_else_clauses
            .iter()
            .map(|x| (x.range, x.test.as_ref(), x.body.as_slice()));
        first.chain(elses)
    }

    /// We really want to avoid "making up" identifiers out of nowhere.
    /// But here, there isn't an identifier, but morally should be, so create the implicit one.
    pub fn expr_name_identifier(x: &ExprName) -> Identifier {
        Identifier::new(x.id.clone(), x.range)
    }

    /// Calls a function on all of the names bound by this lvalue expression.
    pub fn expr_lvalue<'a>(x: &'a Expr, f: &mut impl FnMut(&'a ExprName)) {
        match x {
            Expr::Name(x) => f(x),
            Expr::Tuple(x) => {
                for x in &x.elts {
                    Ast::expr_lvalue(x, f);
                }
            }
            Expr::List(x) => {
                for x in &x.elts {
                    Ast::expr_lvalue(x, f);
                }
            }
            Expr::Starred(x) => Ast::expr_lvalue(&x.value, f),
            Expr::Subscript(_) | Expr::Attribute(_) => { /* no-op */ }
            _ => {
                // Should not occur in well-formed Python code, doesn't introduce bindings.
                // Will raise an error later.
            }
        }
    }

    /// Calls a function on all of the names captured by this match pattern.
    pub fn pattern_lvalue<'a>(x: &'a Pattern, f: &mut impl FnMut(&'a Identifier)) {
        match x {
            Pattern::MatchValue(_) | Pattern::MatchSingleton(_) => {}
            Pattern::MatchSequence(x) => {
                for x in &x.patterns {
                    Ast::pattern_lvalue(x, f);
                }
            }
            Pattern::MatchMapping(x) => {
                for x in &x.patterns {
                    Ast::pattern_lvalue(x, f);
                }
                if let Some(rest) = &x.rest {
                    f(rest);
                }
            }
            Pattern::MatchClass(x) => {
                for x in &x.arguments.patterns {
                    Ast::pattern_lvalue(x, f);
                }
                for kw in &x.arguments.keywords {
                    Ast::pattern_lvalue(&kw.pattern, f);
                }
            }
            Pattern::MatchStar(x) => {
                if let Some(name) = &x.name {
                    f(name);
                }
            }
            Pattern::MatchAs(x) => {
                if let Some(pattern) = &x.pattern {
                    Ast::pattern_lvalue(pattern, f);
                }
                if let Some(name) = &x.name {
                    f(name);
                }
            }
            Pattern::MatchOr(x) => {
                for x in &x.patterns {
                    Ast::pattern_lvalue(x, f);
                }
            }
        }
    }

    /// The module docstring, if the module starts with a string expression.
    pub fn docstring(x: &ModModule) -> Option<String> {
        match x.body.first() {
            Some(Stmt::Expr(x)) => match &*x.value {
                Expr::StringLiteral(s) => Some(s.value.to_str().to_owned()),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn has_docstring(x: &ModModule) -> bool {
        Ast::docstring(x).is_some()
    }
}
