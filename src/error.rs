// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Error types for the compiler and the parsing machine.
//!
//! Following the teacher's own era: a hand-rolled `enum` implementing
//! `std::error::Error`, not `thiserror`/`anyhow`.

use std::error::Error as StdError;
use std::fmt;

/// Errors raised synchronously while compiling an operator tree into a
/// program. No program is returned when compilation fails.
#[derive(Debug)]
pub enum CompileError {
    /// A `SYM(name)` referenced a rule that was never defined.
    UndefinedRule(String),
    /// An operator tree node was structurally invalid (e.g. an empty
    /// `CHC`/`SEQ`, or a `CLS` with no ranges and no discrete chars).
    InvalidNode(&'static str),
    /// A `CLS` range was malformed (`lo > hi`).
    MalformedClass { lo: char, hi: char },
    /// An `RGX` pattern failed to compile with the host regex engine.
    BadRegex(regex::Error),
    /// The compiled program would exceed the configured instruction budget.
    ProgramTooLarge(usize),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::UndefinedRule(name) => {
                write!(f, "undefined rule: {}", name)
            }
            CompileError::InvalidNode(what) => {
                write!(f, "invalid operator tree node: {}", what)
            }
            CompileError::MalformedClass { lo, hi } => {
                write!(f, "malformed class range: [{}, {}]", lo, hi)
            }
            CompileError::BadRegex(err) => write!(f, "invalid regex: {}", err),
            CompileError::ProgramTooLarge(limit) => {
                write!(f, "compiled program exceeds {} instructions", limit)
            }
        }
    }
}

impl StdError for CompileError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            CompileError::BadRegex(err) => Some(err),
            _ => None,
        }
    }
}

impl From<regex::Error> for CompileError {
    fn from(err: regex::Error) -> Self {
        CompileError::BadRegex(err)
    }
}

/// An error propagated from a user-supplied [`crate::action::Action`].
/// The machine releases all frames and abandons value accumulation before
/// re-raising this to the caller, unchanged.
#[derive(Debug)]
pub struct UserError(pub Box<dyn StdError + Send + Sync + 'static>);

impl fmt::Display for UserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "action error: {}", self.0)
    }
}

impl StdError for UserError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.0.as_ref())
    }
}

/// The outcome of a `match()` call: a successful parse, a (non-exceptional)
/// failure to match, or a propagated error from a user action.
#[derive(Debug)]
pub enum MatchError {
    NoMatch,
    User(UserError),
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchError::NoMatch => write!(f, "no match"),
            MatchError::User(err) => write!(f, "{}", err),
        }
    }
}

impl StdError for MatchError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            MatchError::NoMatch => None,
            MatchError::User(err) => Some(err),
        }
    }
}

/// Indicates a miscompiled program or corrupted machine state: an opcode
/// that carries marking/capturing/action where it must not, a `CALL` whose
/// target is not a valid rule body, or a pop against an empty stack. This
/// is fatal and is never recovered from. It panics rather than returning a
/// `Result`, per the "VM MUST NOT attempt recovery" directive.
#[track_caller]
pub(crate) fn internal_error(what: &str) -> ! {
    panic!("peg_machine: internal error: {}", what)
}
