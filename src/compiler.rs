// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The compiler: operator tree -> instruction program (spec.md §4.2).
//!
//! Grounded on the teacher's own `Compiler` (`nfa.rs`'s sibling `compile.rs`
//! in the wider regex crate this was extracted from, and reconstructed here
//! per `zmbush-regex/src/compile.rs`'s `Compiler { size_limit, insts, .. }`
//! shape): a single struct accumulating an instruction vector as it walks
//! the tree once, followed by a resolution post-pass.

use std::sync::Arc;

use log::{debug, trace};

use crate::action::Bind;
use crate::class::ClassSpec;
use crate::error::CompileError;
use crate::inst::{Addr, Inst, Opcode, Program};
use crate::scanner::Scanner;
use crate::tree::{Expr, Grammar};

/// Bounds the size of the compiled program, the way the teacher bounds
/// compiled byte size with its own `size_limit`. Exceeding it is a
/// `CompileError::ProgramTooLarge`, not a panic or silent truncation.
#[derive(Debug, Clone, Copy)]
pub struct CompileOptions {
    pub max_instructions: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions { max_instructions: 65536 }
    }
}

/// Compile an operator tree into a program and its rule name -> address
/// index. Fails with `CompileError::UndefinedRule` or
/// `CompileError::InvalidNode` where applicable (spec.md §6).
pub fn compile<V: 'static>(grammar: &Grammar<V>) -> Result<Program<V>, CompileError> {
    compile_with(grammar, CompileOptions::default())
}

pub fn compile_with<V: 'static>(
    grammar: &Grammar<V>,
    options: CompileOptions,
) -> Result<Program<V>, CompileError> {
    let mut compiler = Compiler::new(options);
    compiler.compile_grammar(grammar)?;
    compiler.finish()
}

struct Compiler<V> {
    insts: Vec<Inst<V>>,
    index: std::collections::HashMap<String, Addr>,
    options: CompileOptions,
}

impl<V: 'static> Compiler<V> {
    fn new(options: CompileOptions) -> Self {
        // Address 0 is the universal FAIL sentinel (spec.md §3, §4.2).
        Compiler {
            insts: vec![Inst::new(Opcode::Fail, 0)],
            index: std::collections::HashMap::new(),
            options,
        }
    }

    fn len(&self) -> Addr {
        self.insts.len()
    }

    fn push(&mut self, inst: Inst<V>) -> Result<Addr, CompileError> {
        if self.insts.len() >= self.options.max_instructions {
            return Err(CompileError::ProgramTooLarge(self.options.max_instructions));
        }
        inst.debug_assert_shape();
        let addr = self.insts.len();
        self.insts.push(inst);
        Ok(addr)
    }

    fn compile_grammar(&mut self, grammar: &Grammar<V>) -> Result<(), CompileError> {
        for name in grammar.names() {
            let addr = self.len();
            self.index.insert(name.to_string(), addr);
            trace!("rule `{}` at address {}", name, addr);
            let expr = grammar.rule(name).expect("name came from grammar.names()");
            self.compile_expr(expr)?;
            self.push(Inst::new(Opcode::Return, 0))?;
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Program<V>, CompileError> {
        self.push(Inst::new(Opcode::Pass, 0))?;
        debug!(
            "compiled {} rules into {} instructions",
            self.index.len(),
            self.insts.len()
        );
        for inst in self.insts.iter_mut() {
            if inst.opcode == Opcode::Call {
                let name = inst.name.take().expect("CALL always carries a target name");
                let addr = self
                    .index
                    .get(&name)
                    .copied()
                    .ok_or(CompileError::UndefinedRule(name))?;
                inst.oploc = addr as isize;
            }
        }
        debug!("resolved all CALL targets");
        Ok(Program::new(self.insts, self.index))
    }

    fn compile_expr(&mut self, e: &Expr<V>) -> Result<(), CompileError> {
        match e {
            Expr::Dot => {
                self.push(Inst::scan(Scanner::Dot))?;
            }
            Expr::Lit(s) => {
                self.push(Inst::scan(Scanner::literal(s.clone())))?;
            }
            Expr::Cls(spec, neg) => {
                self.push(Inst::scan(Scanner::single_class(spec.clone(), *neg)))?;
            }
            Expr::Rgx(pat, flags) => {
                self.push(Inst::scan(Scanner::regex(pat, *flags)?))?;
            }
            Expr::Opt(inner) => self.compile_opt(inner)?,
            Expr::Str(inner) => self.compile_repeat(inner, 0)?,
            Expr::Pls(inner) => self.compile_repeat(inner, 1)?,
            Expr::Sym(name) => {
                self.push(Inst::call(name.clone()))?;
            }
            Expr::And(inner) => self.compile_and(inner)?,
            Expr::Not(inner) => self.compile_not(inner)?,
            Expr::Cap(inner) => self.compile_marked(inner, MarkedKind::Capture)?,
            Expr::Bnd(name, inner) => {
                self.compile_marked(inner, MarkedKind::Action(Arc::new(Bind(name.clone()))))?
            }
            Expr::Seq(items) => {
                for item in items {
                    self.compile_expr(item)?;
                }
            }
            Expr::Chc(alts) => self.compile_choice(alts)?,
            Expr::Rul(inner, action) => match action {
                None => self.compile_expr(inner)?,
                Some(action) => self.compile_marked(inner, MarkedKind::Action(action.clone()))?,
            },
        }
        Ok(())
    }

    /// `OPT(e)`: `[BRANCH(+len(e)+2), …e…, COMMIT(+1)]`.
    fn compile_opt(&mut self, e: &Expr<V>) -> Result<(), CompileError> {
        let branch_addr = self.push(Inst::new(Opcode::Branch, 0))?;
        self.compile_expr(e)?;
        let commit_addr = self.push(Inst::new(Opcode::Commit, 1))?;
        let after = commit_addr + 1;
        self.insts[branch_addr].oploc = (after as isize) - (branch_addr as isize);
        Ok(())
    }

    /// `STR(e)`/`PLS(e)`: `[BRANCH(+len(e)+2), …e…, UPDATE(−len(e))]`, with
    /// the mandatory first copy for `PLS` and the quantifier-collapse
    /// optimization (spec.md §4.2) when `e` is a bare, unannotated `CLS`.
    fn compile_repeat(&mut self, e: &Expr<V>, min: usize) -> Result<(), CompileError> {
        if let Expr::Cls(spec, neg) = e {
            self.push(Inst::scan(collapsed_class(spec, *neg, min)))?;
            return Ok(());
        }
        if min >= 1 {
            // PLS's mandatory first copy.
            self.compile_expr(e)?;
        }
        let branch_addr = self.push(Inst::new(Opcode::Branch, 0))?;
        let body_start = self.len();
        self.compile_expr(e)?;
        let update_addr = self.push(Inst::new(Opcode::Update, 0))?;
        self.insts[update_addr].oploc = (body_start as isize) - (update_addr as isize);
        let after = update_addr + 1;
        self.insts[branch_addr].oploc = (after as isize) - (branch_addr as isize);
        Ok(())
    }

    /// `AND(e)`: `[BRANCH(+len(e)+2), …e…, RESTORE(+2), FAIL]`.
    fn compile_and(&mut self, e: &Expr<V>) -> Result<(), CompileError> {
        let branch_addr = self.push(Inst::new(Opcode::Branch, 0))?;
        self.compile_expr(e)?;
        let restore_addr = self.push(Inst::new(Opcode::Restore, 2))?;
        let fail_addr = self.push(Inst::new(Opcode::Fail, 0))?;
        debug_assert_eq!(fail_addr, restore_addr + 1);
        self.insts[branch_addr].oploc = (fail_addr as isize) - (branch_addr as isize);
        Ok(())
    }

    /// `NOT(e)`: `[BRANCH(+len(e)+2), …e…, FAILTWICE]`.
    fn compile_not(&mut self, e: &Expr<V>) -> Result<(), CompileError> {
        let branch_addr = self.push(Inst::new(Opcode::Branch, 0))?;
        self.compile_expr(e)?;
        let failtwice_addr = self.push(Inst::new(Opcode::FailTwice, 0))?;
        let after = failtwice_addr + 1;
        self.insts[branch_addr].oploc = (after as isize) - (branch_addr as isize);
        Ok(())
    }

    /// `CHC([e1, ..., en])`: a right-fold of the two-alternative form
    /// `[BRANCH(+len(A)+2), …A…, COMMIT(+len(B)+1), …B…]`.
    fn compile_choice(&mut self, alts: &[Expr<V>]) -> Result<(), CompileError> {
        match alts {
            [] => return Err(CompileError::InvalidNode("empty CHC")),
            [only] => self.compile_expr(only)?,
            [first, rest @ ..] => {
                let branch_addr = self.push(Inst::new(Opcode::Branch, 0))?;
                self.compile_expr(first)?;
                let commit_addr = self.push(Inst::new(Opcode::Commit, 0))?;
                let b_start = self.len();
                self.insts[branch_addr].oploc = (b_start as isize) - (branch_addr as isize);
                self.compile_choice(rest)?;
                let after = self.len();
                self.insts[commit_addr].oploc = (after as isize) - (commit_addr as isize);
            }
        }
        Ok(())
    }

    /// Shared shape for `CAP(e)` and `RUL(e, action)`/`BND` (realized as
    /// `RUL(e, Bind(name))`): mark the head, compile `e`, carry
    /// capturing/action on the tail.
    ///
    /// Always inserts fresh `NOOP` carriers for the head and tail rather
    /// than conditionally fusing onto `e`'s natural first/last instruction
    /// (see DESIGN.md). This keeps `marking`/`capturing`/`action` confined
    /// to `NOOP` instructions only, which trivially satisfies the §3
    /// invariant that they never land on a stack-manipulating opcode.
    fn compile_marked(&mut self, e: &Expr<V>, kind: MarkedKind<V>) -> Result<(), CompileError> {
        let mut head = Inst::new(Opcode::Noop, 1);
        head.marking = true;
        self.push(head)?;
        self.compile_expr(e)?;
        let mut tail = Inst::new(Opcode::Noop, 1);
        match kind {
            MarkedKind::Capture => tail.capturing = true,
            MarkedKind::Action(action) => tail.action = Some(action),
        }
        self.push(tail)?;
        Ok(())
    }
}

enum MarkedKind<V> {
    Capture,
    Action(Arc<dyn crate::action::Action<V>>),
}

/// Builds the quantifier-collapsed scanner for `STR`/`PLS` over a bare
/// `CLS`: a single `SCAN` whose `Class` scanner consumes a greedy run with
/// `min` (0 for `STR`, 1 for `PLS`) and unbounded `max`. Correctness-
/// preserving because `Class` is the only scanner whose greedy semantics
/// match the outer quantifier exactly (spec.md §4.2).
fn collapsed_class(spec: &ClassSpec, neg: bool, min: usize) -> Scanner {
    Scanner::class(spec.clone(), neg, min, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::ClassItem;
    use crate::vm::run;

    fn digit_class() -> Expr<String> {
        Expr::Cls(ClassSpec::new(vec![ClassItem::Range('0', '9')]).unwrap(), false)
    }

    #[test]
    fn compiles_literal_rule() {
        let grammar = Grammar::<String>::builder("Start")
            .rule("Start", Expr::Lit("abc".to_string()))
            .build();
        let program = compile(&grammar).unwrap();
        assert_eq!(program[0].opcode, Opcode::Fail);
        assert_eq!(program.pass_addr(), program.len() - 1);
        let outcome = run(&program, "Start", "abcdef").unwrap();
        assert_eq!(outcome.end_pos, 3);
    }

    #[test]
    fn undefined_rule_is_a_compile_error() {
        let grammar = Grammar::<String>::builder("Start")
            .rule("Start", Expr::Sym("Missing".to_string()))
            .build();
        let err = compile(&grammar).unwrap_err();
        assert!(matches!(err, CompileError::UndefinedRule(name) if name == "Missing"));
    }

    #[test]
    fn quantifier_collapse_emits_single_scan() {
        let grammar = Grammar::<String>::builder("Start")
            .rule("Start", Expr::Pls(Box::new(digit_class())))
            .build();
        let program = compile(&grammar).unwrap();
        // FAIL sentinel, one SCAN, RETURN, PASS: collapse means no
        // BRANCH/UPDATE pair was emitted.
        assert_eq!(program.len(), 4);
        assert_eq!(program[1].opcode, Opcode::Scan);
    }

    #[test]
    fn program_too_large_is_reported() {
        let grammar = Grammar::<String>::builder("Start")
            .rule("Start", Expr::Lit("abc".to_string()))
            .build();
        let tiny = CompileOptions { max_instructions: 1 };
        let err = compile_with(&grammar, tiny).unwrap_err();
        assert!(matches!(err, CompileError::ProgramTooLarge(1)));
    }
}
