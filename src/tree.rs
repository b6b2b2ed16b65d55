// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The operator tree: the algebraic input to [`crate::compiler::compile`].
//!
//! This is the boundary the surface PEG notation parser is expected to
//! produce (out of scope for this crate) and grammar-level optimizers are
//! expected to rewrite (also out of scope) before handing it to the
//! compiler.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::action::Action;
use crate::class::ClassSpec;

/// A single character or an inclusive `[lo, hi]` range, as accepted by
/// `CLS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassItem {
    Char(char),
    Range(char, char),
}

/// Regex dialect flags accepted by `RGX`. Kept to the common subset every
/// regex engine in the retrieval pack exposes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegexFlags {
    pub case_insensitive: bool,
    pub multi_line: bool,
    pub dot_matches_newline: bool,
}

/// A PEG operator tree, generic over the opaque emitted-value type `V`
/// actions and captures produce.
pub enum Expr<V> {
    /// Matches any one character.
    Dot,
    /// Matches the literal string.
    Lit(String),
    /// Matches one character in (or, if `neg`, not in) the union of ranges.
    Cls(ClassSpec, bool),
    /// Matches the anchored regex pattern at the cursor.
    Rgx(String, RegexFlags),
    /// `e` zero or one time.
    Opt(Box<Expr<V>>),
    /// `e` zero or more times.
    Str(Box<Expr<V>>),
    /// `e` one or more times.
    Pls(Box<Expr<V>>),
    /// A reference to a named rule.
    Sym(String),
    /// Succeeds iff `e` succeeds; consumes no input.
    And(Box<Expr<V>>),
    /// Succeeds iff `e` fails; consumes no input.
    Not(Box<Expr<V>>),
    /// Matches `e`; emits the matched substring.
    Cap(Box<Expr<V>>),
    /// Matches `e`; binds `e`'s determined value to `name`.
    Bnd(String, Box<Expr<V>>),
    /// Matches each sub-expression in order.
    Seq(Vec<Expr<V>>),
    /// Tries alternatives in order; first success wins.
    Chc(Vec<Expr<V>>),
    /// Matches `e`; if an action is present, applies it to the
    /// emitted/bound values local to this rule.
    Rul(Box<Expr<V>>, Option<Arc<dyn Action<V>>>),
}

impl<V> Expr<V> {
    /// `BND(name, e)` is realized as `RUL(e, Bind(name))` (see spec.md
    /// §4.2 and §4.4). Building it through this constructor keeps that
    /// equivalence in one place rather than duplicating it at every call
    /// site that wants binding.
    pub fn bind(name: impl Into<String>, e: Expr<V>) -> Expr<V>
    where
        V: Clone + Default,
    {
        Expr::Bnd(name.into(), Box::new(e))
    }
}

/// An ordered set of named rules plus the name of the start rule. The
/// structure an external notation parser is expected to build and hand to
/// `compile()`.
pub struct Grammar<V> {
    rules: BTreeMap<String, Expr<V>>,
    order: Vec<String>,
    start: String,
}

impl<V> Grammar<V> {
    /// Begin building a grammar with the given start rule name. The start
    /// rule itself must still be added via [`GrammarBuilder::rule`].
    pub fn builder(start: impl Into<String>) -> GrammarBuilder<V> {
        GrammarBuilder {
            rules: BTreeMap::new(),
            order: Vec::new(),
            start: start.into(),
        }
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn rule(&self, name: &str) -> Option<&Expr<V>> {
        self.rules.get(name)
    }

    /// Rule names in the order they were added (deterministic compilation
    /// order; the spec does not require a particular CALL-address
    /// assignment order, but a deterministic one makes programs
    /// reproducible across compiles of the same grammar).
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }
}

/// Convenience assembler for [`Grammar`], since there is no notation parser
/// in scope to build one from source text.
pub struct GrammarBuilder<V> {
    rules: BTreeMap<String, Expr<V>>,
    order: Vec<String>,
    start: String,
}

impl<V> GrammarBuilder<V> {
    pub fn rule(mut self, name: impl Into<String>, e: Expr<V>) -> Self {
        let name = name.into();
        if !self.rules.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.rules.insert(name, e);
        self
    }

    pub fn build(self) -> Grammar<V> {
        Grammar {
            rules: self.rules,
            order: self.order,
            start: self.start,
        }
    }
}
