// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Termination property test (spec.md §8.5(k)): for a randomly generated
//! non-left-recursive grammar of bounded depth and a random input of
//! bounded length, `run()` must return rather than loop forever. Since
//! the call is synchronous and single-threaded, simply reaching the
//! assertion after `run()` returns is itself the property under test.
//! There is no internal step counter on the public API to additionally
//! bound (that bookkeeping is a `#[cfg(test)]`-only affordance of
//! `vm.rs`'s own unit tests).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use peg_machine::{compile, run, ClassItem, ClassSpec, Expr, Grammar, GrammarBuilder};

const MAX_DEPTH: usize = 4;
const RULE_COUNT: usize = 4;

/// Builds a grammar of `RULE_COUNT` named rules, each a random small
/// operator tree of at most `MAX_DEPTH` nesting. `SYM` may only reference
/// rules with a strictly lower index than the current one, which rules
/// out left recursion (a rule can never (directly or through any chain of
/// first-position references) call back into itself).
fn random_grammar(rng: &mut StdRng) -> Grammar<String> {
    let digits = ClassSpec::new(vec![ClassItem::Range('0', '9')]).unwrap();
    let letters = ClassSpec::new(vec![ClassItem::Range('a', 'z')]).unwrap();

    let mut builder: GrammarBuilder<String> = Grammar::builder("Rule0");
    for i in 0..RULE_COUNT {
        let body = random_expr(rng, MAX_DEPTH, i, &digits, &letters);
        builder = builder.rule(format!("Rule{i}"), body);
    }
    builder.build()
}

fn random_expr(
    rng: &mut StdRng,
    depth: usize,
    max_callable: usize,
    digits: &ClassSpec,
    letters: &ClassSpec,
) -> Expr<String> {
    if depth == 0 {
        return random_leaf(rng, max_callable, digits, letters);
    }
    match rng.gen_range(0..8) {
        0 => random_leaf(rng, max_callable, digits, letters),
        1 => Expr::Opt(Box::new(random_expr(rng, depth - 1, max_callable, digits, letters))),
        // STR's body is restricted to a non-nullable leaf (DOT or a char
        // class), never an arbitrary subtree: a STR whose body can match
        // the empty string loops forever re-matching zero width, which is
        // a real degenerate case this generator must not produce (the
        // same pitfall real PEG/LPeg-style engines guard grammar authors
        // against, rather than a correctness bug in the VM itself).
        2 => Expr::Str(Box::new(non_nullable_leaf(rng, digits, letters))),
        3 => Expr::Cap(Box::new(random_expr(rng, depth - 1, max_callable, digits, letters))),
        4 => Expr::Not(Box::new(random_expr(rng, depth - 1, max_callable, digits, letters))),
        5 => Expr::Seq(vec![
            random_expr(rng, depth - 1, max_callable, digits, letters),
            random_expr(rng, depth - 1, max_callable, digits, letters),
        ]),
        6 => Expr::Chc(vec![
            random_expr(rng, depth - 1, max_callable, digits, letters),
            random_expr(rng, depth - 1, max_callable, digits, letters),
        ]),
        _ => random_leaf(rng, max_callable, digits, letters),
    }
}

fn random_leaf(
    rng: &mut StdRng,
    max_callable: usize,
    digits: &ClassSpec,
    letters: &ClassSpec,
) -> Expr<String> {
    let choice = if max_callable == 0 { rng.gen_range(0..3) } else { rng.gen_range(0..4) };
    match choice {
        0 => Expr::Dot,
        1 => Expr::Cls(digits.clone(), false),
        2 => Expr::Cls(letters.clone(), true),
        _ => {
            // Only reference an earlier rule: rules out left recursion.
            let target = rng.gen_range(0..max_callable);
            Expr::Sym(format!("Rule{target}"))
        }
    }
}

/// A leaf that always consumes at least one character when it succeeds,
/// safe to place under `STR` without risking a zero-width infinite loop.
fn non_nullable_leaf(rng: &mut StdRng, digits: &ClassSpec, letters: &ClassSpec) -> Expr<String> {
    if rng.gen_bool(0.5) {
        Expr::Dot
    } else if rng.gen_bool(0.5) {
        Expr::Cls(digits.clone(), false)
    } else {
        Expr::Cls(letters.clone(), true)
    }
}

fn random_input(rng: &mut StdRng, max_len: usize) -> String {
    let alphabet: Vec<char> = "abc012[]".chars().collect();
    let len = rng.gen_range(0..=max_len);
    (0..len).map(|_| alphabet[rng.gen_range(0..alphabet.len())]).collect()
}

#[test]
fn random_non_left_recursive_grammars_always_terminate() {
    // Surfaces the compiler's debug!/trace! output under RUST_LOG for
    // whoever is chasing down a failing seed; harmless if already set up
    // by an earlier test in the same binary.
    let _ = env_logger::try_init();

    let mut rng = StdRng::seed_from_u64(0xA11CE);
    for _ in 0..200 {
        let grammar = random_grammar(&mut rng);
        let program = match compile(&grammar) {
            Ok(program) => program,
            Err(_) => continue,
        };
        let input = random_input(&mut rng, 12);
        // Termination is the property: whatever `run` returns, it must
        // return rather than hang. Reaching this assertion proves it did.
        let outcome = run(&program, "Rule0", &input);
        match outcome {
            Ok(m) => assert!(m.end_pos <= input.len()),
            Err(_) => {}
        }
    }
}
