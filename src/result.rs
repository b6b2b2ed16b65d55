// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Match result assembly (spec.md §3 "VM runtime state", §6).

use std::collections::HashMap;

/// The outcome of a successful match: the end cursor, the top-level
/// emitted values, and the top-level bound values (last-write-wins per
/// name, spec.md §4.4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome<V> {
    pub end_pos: usize,
    pub args: Vec<V>,
    pub kwargs: Vec<(String, V)>,
}

impl<V> MatchOutcome<V> {
    pub(crate) fn new(end_pos: usize, args: Vec<V>, kwargs: Vec<(String, V)>) -> Self {
        MatchOutcome { end_pos, args, kwargs }
    }

    /// The determined value of `args`: the first element, or `None` if
    /// empty (spec.md §4.4 "Determine").
    pub fn determined(&self) -> Option<&V> {
        self.args.first()
    }

    /// Folds `kwargs` into a map for callers that don't need to preserve
    /// the order bindings were produced in. Ambient convenience, not
    /// required by the distilled spec, analogous to the teacher's own
    /// `cap_names` lookup built on top of its ordered capture slots.
    pub fn kwargs_map(&self) -> HashMap<String, V>
    where
        V: Clone,
    {
        self.kwargs.iter().cloned().collect()
    }
}
