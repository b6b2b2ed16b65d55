// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Action invocation glue (spec.md §4.4, §4.6, §9 "Dynamic action
//! callables"). Actions are user-supplied; we model them as an interface
//! with a single `invoke` method, as the Design Notes prescribe, rather
//! than baking in one concrete callable representation.

use crate::error::UserError;

/// A user-supplied rule action. `invoke` receives the input, the region
/// `[start, end)` the owning rule matched, and the emitted/bound values
/// local to that rule; it returns the replacement `args`/`kwargs` for that
/// scope (spec.md §9's "the action's returned mapping entirely replaces
/// the local kwargs slice").
pub trait Action<V> {
    fn invoke(
        &self,
        input: &str,
        start: usize,
        end: usize,
        args: &[V],
        kwargs: &[(String, V)],
    ) -> Result<(Vec<V>, Vec<(String, V)>), UserError>;
}

/// Adapts a plain closure into an [`Action`], for the common case of a
/// rule action that doesn't need its own named type.
pub struct FnAction<F>(pub F);

impl<V, F> Action<V> for FnAction<F>
where
    F: Fn(&str, usize, usize, &[V], &[(String, V)]) -> Result<(Vec<V>, Vec<(String, V)>), UserError>,
{
    fn invoke(
        &self,
        input: &str,
        start: usize,
        end: usize,
        args: &[V],
        kwargs: &[(String, V)],
    ) -> Result<(Vec<V>, Vec<(String, V)>), UserError> {
        (self.0)(input, start, end, args, kwargs)
    }
}

/// The action `BND(name, e)` compiles to: `RUL(e, Bind(name))`. Replaces
/// `local_args` with `[]` and sets `kwargs[name]` to the determined value
/// of `local_args` (spec.md §4.4).
pub struct Bind(pub String);

impl<V> Action<V> for Bind
where
    V: Clone + Default,
{
    fn invoke(
        &self,
        _input: &str,
        _start: usize,
        _end: usize,
        args: &[V],
        _kwargs: &[(String, V)],
    ) -> Result<(Vec<V>, Vec<(String, V)>), UserError> {
        let determined = args.first().cloned().unwrap_or_default();
        Ok((Vec::new(), vec![(self.0.clone(), determined)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_determines_first_element_or_default() {
        let bind = Bind("x".to_string());
        let (args, kwargs) = bind.invoke("input", 0, 0, &["42".to_string()], &[]).unwrap();
        assert!(args.is_empty());
        assert_eq!(kwargs, vec![("x".to_string(), "42".to_string())]);

        let (_, kwargs) = bind.invoke("input", 0, 0, &[], &[]).unwrap();
        assert_eq!(kwargs, vec![("x".to_string(), String::default())]);
    }
}
