// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The instruction program data model (spec.md §3 "Instruction program",
//! §8.1 invariants). Mirrors the teacher's `Inst`/`Insts` split: a flat
//! `Vec<Inst<V>>` wrapped in a thin `Program<V>` that also carries the
//! rule name -> address index built by the compiler.

use std::sync::Arc;

use crate::action::Action;
use crate::scanner::Scanner;

pub type Addr = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Fail,
    Pass,
    Branch,
    Commit,
    Update,
    Restore,
    FailTwice,
    Call,
    Return,
    Jump,
    Scan,
    Noop,
}

impl Opcode {
    /// True for the opcodes that are never allowed to carry `marking`,
    /// `capturing`, or `action` (spec.md §3 invariants, §8.1(b)). A `NOOP`
    /// is inserted as a carrier instead wherever the compiler would
    /// otherwise need to mark one of these.
    pub fn is_stack_manipulating(self) -> bool {
        matches!(
            self,
            Opcode::Call
                | Opcode::Commit
                | Opcode::Update
                | Opcode::Restore
                | Opcode::FailTwice
                | Opcode::Return
        )
    }
}

/// A single instruction record. `oploc` is a signed relative offset for
/// every opcode except `CALL`, whose `oploc` becomes an absolute address
/// once the compiler's CALL-resolution post-pass runs.
pub struct Inst<V> {
    pub opcode: Opcode,
    pub oploc: isize,
    pub scanner: Option<Scanner>,
    pub marking: bool,
    pub capturing: bool,
    pub action: Option<Arc<dyn Action<V>>>,
    /// During compilation only: the target rule name for an unresolved
    /// `CALL`. Always `None` after `compile()` returns.
    pub name: Option<String>,
}

impl<V> Inst<V> {
    pub fn new(opcode: Opcode, oploc: isize) -> Inst<V> {
        Inst {
            opcode,
            oploc,
            scanner: None,
            marking: false,
            capturing: false,
            action: None,
            name: None,
        }
    }

    pub fn scan(scanner: Scanner) -> Inst<V> {
        Inst {
            scanner: Some(scanner),
            ..Inst::new(Opcode::Scan, 0)
        }
    }

    pub fn call(name: impl Into<String>) -> Inst<V> {
        Inst {
            name: Some(name.into()),
            ..Inst::new(Opcode::Call, 0)
        }
    }

    /// Asserts the §3 invariant that marking/capturing/action never land on
    /// a stack-manipulating opcode. Used defensively by the compiler when
    /// it inserts a `NOOP` carrier instead of marking such an instruction
    /// directly.
    pub fn debug_assert_shape(&self) {
        debug_assert!(
            !(self.opcode.is_stack_manipulating() && (self.marking || self.capturing || self.action.is_some())),
            "marking/capturing/action on a stack-manipulating opcode"
        );
    }
}

impl<V> Clone for Inst<V> {
    fn clone(&self) -> Self {
        Inst {
            opcode: self.opcode,
            oploc: self.oploc,
            scanner: self.scanner.clone(),
            marking: self.marking,
            capturing: self.capturing,
            action: self.action.clone(),
            name: self.name.clone(),
        }
    }
}

/// A compiled instruction program plus the rule name -> address index
/// produced alongside it. Immutable once constructed.
pub struct Program<V> {
    insts: Vec<Inst<V>>,
    index: std::collections::HashMap<String, Addr>,
}

impl<V> Program<V> {
    pub(crate) fn new(insts: Vec<Inst<V>>, index: std::collections::HashMap<String, Addr>) -> Program<V> {
        Program { insts, index }
    }

    pub fn len(&self) -> usize {
        self.insts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.insts.is_empty()
    }

    pub fn get(&self, addr: Addr) -> &Inst<V> {
        &self.insts[addr]
    }

    /// Address of the mandated trailing `PASS` sentinel (spec.md §3: "the
    /// program ends with a PASS sentinel").
    pub fn pass_addr(&self) -> Addr {
        self.insts.len() - 1
    }

    pub fn address_of(&self, rule: &str) -> Option<Addr> {
        self.index.get(rule).copied()
    }

    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(|s| s.as_str())
    }
}

impl<V> std::ops::Index<Addr> for Program<V> {
    type Output = Inst<V>;

    fn index(&self, addr: Addr) -> &Inst<V> {
        &self.insts[addr]
    }
}
