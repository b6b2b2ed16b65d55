// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The parsing machine (spec.md §4.3–§4.6): an explicit backtrack stack
//! interpreter over a compiled [`Program`]. Grounded on the teacher's own
//! `Backtrack` engine (`backtrack.rs`), generalized from regex capture
//! slots to the PEG machine's emitted-value/bound-value bookkeeping.

use crate::error::{internal_error, MatchError, UserError};
use crate::inst::{Addr, Opcode, Program};
use crate::result::MatchOutcome;

/// The three roles a stack entry can play, re-encoded as a Rust sum type
/// rather than the distilled spec's single sentinel-negative-field frame
/// shape (spec.md §9 Design Notes: "Re-encode as a tagged union for
/// clarity in a language with sum types").
#[derive(Debug, Clone, Copy)]
enum Frame {
    /// Records the state to restore on a subsequent failure: where to
    /// resume (`fail_addr`), the input position to roll back to, and the
    /// emitted/bound value lengths to truncate to.
    Backtrack {
        fail_addr: Addr,
        pos: usize,
        args_len: usize,
        kwargs_len: usize,
    },
    /// Records the input position and value-array lengths at the start of
    /// a capture or action scope.
    Mark {
        pos: usize,
        args_len: usize,
        kwargs_len: usize,
    },
    /// Records the return address of a rule invocation.
    Call { ret_addr: Addr },
}

/// Runs `program` starting at `start_rule` against `input`, from
/// `start_pos`. Returns the end cursor and the top-level emitted/bound
/// values on success, or `MatchError::NoMatch` for an ordinary failed
/// parse, or `MatchError::User` if a rule action returned an error (which
/// is propagated unchanged, per spec.md §7).
pub fn run<V>(
    program: &Program<V>,
    start_rule: &str,
    input: &str,
) -> Result<MatchOutcome<V>, MatchError>
where
    V: Clone + Default + From<String>,
{
    run_at(program, start_rule, input, 0)
}

pub fn run_at<V>(
    program: &Program<V>,
    start_rule: &str,
    input: &str,
    start_pos: usize,
) -> Result<MatchOutcome<V>, MatchError>
where
    V: Clone + Default + From<String>,
{
    let start_addr = program
        .address_of(start_rule)
        .unwrap_or_else(|| internal_error("match() start rule not present in program"));
    let (end_pos, args, kwargs, _steps) = exec(program, start_addr, input, start_pos)?;
    Ok(MatchOutcome::new(end_pos, args, kwargs))
}

/// Test-only entry point exposing the step count, used by the termination
/// property test (spec.md §8.5). Carries no behavior of its own.
#[cfg(test)]
pub(crate) fn run_with_steps<V>(
    program: &Program<V>,
    start_addr: Addr,
    input: &str,
) -> (Result<MatchOutcome<V>, MatchError>, usize)
where
    V: Clone + Default + From<String>,
{
    match exec(program, start_addr, input, 0) {
        Ok((end_pos, args, kwargs, steps)) => (Ok(MatchOutcome::new(end_pos, args, kwargs)), steps),
        Err((err, steps)) => (Err(err), steps),
    }
}

type ExecOk<V> = (usize, Vec<V>, Vec<(String, V)>, usize);

fn exec<V>(
    program: &Program<V>,
    start_addr: Addr,
    input: &str,
    start_pos: usize,
) -> Result<ExecOk<V>, MatchError>
where
    V: Clone + Default + From<String>,
{
    exec_inner(program, start_addr, input, start_pos).map_err(|(err, _)| err)
}

#[allow(clippy::type_complexity)]
fn exec_inner<V>(
    program: &Program<V>,
    start_addr: Addr,
    input: &str,
    start_pos: usize,
) -> Result<ExecOk<V>, (MatchError, usize)>
where
    V: Clone + Default + From<String>,
{
    let mut idx = start_addr;
    let mut pos = start_pos;
    let mut args: Vec<V> = Vec::new();
    let mut kwargs: Vec<(String, V)> = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();
    let mut steps: usize = 0;

    // Initialization (spec.md §4.3): a bottom "failure-fallback" frame that
    // catches a totally exhausted backtrack stack, then a "success-
    // fallback" frame whose resume address is the program's mandated
    // trailing PASS. The distilled spec writes these as `ret_idx=0` /
    // `ret_idx=-1`; the `-1` is the source notation's last-index idiom
    // (`prog[-1]` == the final PASS), not a literal negative address (see
    // DESIGN.md).
    stack.push(Frame::Backtrack {
        fail_addr: 0,
        pos: 0,
        args_len: 0,
        kwargs_len: 0,
    });
    stack.push(Frame::Call { ret_addr: program.pass_addr() });

    let pass_addr = program.pass_addr();

    loop {
        // `idx == 0` and `idx == pass_addr` are both terminal: rather than
        // physically re-entering the FAIL sentinel and re-triggering a
        // failure transition against an exhausted stack forever, treat
        // reaching address 0 the same way as reaching PASS: an immediate
        // exit, symmetric with PASS's own "terminate loop, report pos"
        // (spec.md §4.5 "a stable terminal state from which PASS is
        // unreachable"; decided in DESIGN.md).
        if idx == pass_addr {
            return Ok((pos, args, kwargs, steps));
        }
        if idx == 0 {
            return Err((MatchError::NoMatch, steps));
        }

        steps += 1;
        let inst = program.get(idx);

        if inst.marking {
            stack.push(Frame::Mark {
                pos,
                args_len: args.len(),
                kwargs_len: kwargs.len(),
            });
        }

        let mut failed = false;
        match inst.opcode {
            Opcode::Scan => {
                let scanner = inst
                    .scanner
                    .as_ref()
                    .unwrap_or_else(|| internal_error("SCAN instruction without a scanner"));
                match scanner.scan(input, pos) {
                    Some(new_pos) => {
                        pos = new_pos;
                        idx += 1;
                    }
                    None => failed = true,
                }
            }
            Opcode::Branch => {
                stack.push(Frame::Backtrack {
                    fail_addr: (idx as isize + inst.oploc) as usize,
                    pos,
                    args_len: args.len(),
                    kwargs_len: kwargs.len(),
                });
                idx += 1;
            }
            Opcode::Call => {
                stack.push(Frame::Call { ret_addr: idx + 1 });
                idx = inst.oploc as usize;
            }
            Opcode::Commit => {
                match stack.pop() {
                    Some(Frame::Backtrack { .. }) => {}
                    _ => internal_error("COMMIT against a non-backtrack frame"),
                }
                idx = (idx as isize + inst.oploc) as usize;
            }
            Opcode::Update => {
                match stack.last_mut() {
                    Some(Frame::Backtrack { pos: p, args_len, kwargs_len, .. }) => {
                        *p = pos;
                        *args_len = args.len();
                        *kwargs_len = kwargs.len();
                    }
                    _ => internal_error("UPDATE against a non-backtrack frame"),
                }
                idx = (idx as isize + inst.oploc) as usize;
            }
            Opcode::Restore => {
                match stack.pop() {
                    Some(Frame::Backtrack { pos: p, .. }) => pos = p,
                    _ => internal_error("RESTORE against a non-backtrack frame"),
                }
                idx = (idx as isize + inst.oploc) as usize;
            }
            Opcode::FailTwice => {
                match stack.pop() {
                    Some(Frame::Backtrack { .. }) => {}
                    _ => internal_error("FAILTWICE against a non-backtrack frame"),
                }
                failed = true;
            }
            Opcode::Return => match stack.pop() {
                Some(Frame::Call { ret_addr }) => idx = ret_addr,
                _ => internal_error("RETURN against a non-call frame"),
            },
            Opcode::Jump => {
                idx = (idx as isize + inst.oploc) as usize;
            }
            Opcode::Pass => {
                return Ok((pos, args, kwargs, steps));
            }
            Opcode::Fail => {
                failed = true;
            }
            Opcode::Noop => {
                idx += 1;
            }
        }

        if failed {
            loop {
                match stack.pop() {
                    Some(Frame::Backtrack { fail_addr, pos: p, args_len, kwargs_len }) => {
                        idx = fail_addr;
                        pos = p;
                        args.truncate(args_len);
                        kwargs.truncate(kwargs_len);
                        break;
                    }
                    Some(Frame::Mark { .. }) | Some(Frame::Call { .. }) => continue,
                    None => internal_error("pop from empty stack"),
                }
            }
            continue;
        }

        if inst.capturing || inst.action.is_some() {
            let mark = match stack.pop() {
                Some(Frame::Mark { pos: mark_pos, args_len, kwargs_len }) => {
                    (mark_pos, args_len, kwargs_len)
                }
                _ => internal_error("capturing/action instruction without a mark frame"),
            };
            let (mark_pos, args_len, kwargs_len) = mark;

            if inst.capturing {
                let substring = input[mark_pos..pos].to_string();
                args.truncate(args_len);
                args.push(V::from(substring));
                kwargs.truncate(kwargs_len);
            } else if let Some(action) = &inst.action {
                let local_args: Vec<V> = args[args_len..].to_vec();
                let local_kwargs: Vec<(String, V)> = kwargs[kwargs_len..].to_vec();
                let outcome = action
                    .invoke(input, mark_pos, pos, &local_args, &local_kwargs)
                    .map_err(|err: UserError| (MatchError::User(err), steps));
                let (new_args, new_kwargs) = outcome?;
                args.truncate(args_len);
                args.extend(new_args);
                kwargs.truncate(kwargs_len);
                kwargs.extend(new_kwargs);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::run_with_steps;
    use crate::class::ClassSpec;
    use crate::compiler::compile;
    use crate::tree::{ClassItem, Expr, Grammar};

    #[test]
    fn dot_plus_star_boundary_behaviors() {
        let grammar = Grammar::<String>::builder("Start")
            .rule("Start", Expr::Str(Box::new(Expr::Dot)))
            .build();
        let program = compile(&grammar).unwrap();
        let addr = program.address_of("Start").unwrap();
        let (result, _) = run_with_steps::<String>(&program, addr, "");
        assert_eq!(result.unwrap().end_pos, 0);

        let grammar = Grammar::<String>::builder("Start")
            .rule("Start", Expr::Pls(Box::new(Expr::Dot)))
            .build();
        let program = compile(&grammar).unwrap();
        let addr = program.address_of("Start").unwrap();
        let (result, _) = run_with_steps::<String>(&program, addr, "");
        assert!(result.is_err());
    }

    #[test]
    fn class_minimum_zero_vs_one() {
        let digits = ClassSpec::new(vec![ClassItem::Range('0', '9')]).unwrap();
        let grammar = Grammar::<String>::builder("Start")
            .rule("Start", Expr::Str(Box::new(Expr::Cls(digits.clone(), false))))
            .build();
        let program = compile(&grammar).unwrap();
        let addr = program.address_of("Start").unwrap();
        let (result, _) = run_with_steps::<String>(&program, addr, "abc");
        assert_eq!(result.unwrap().end_pos, 0);

        let grammar = Grammar::<String>::builder("Start")
            .rule("Start", Expr::Pls(Box::new(Expr::Cls(digits, false))))
            .build();
        let program = compile(&grammar).unwrap();
        let addr = program.address_of("Start").unwrap();
        let (result, _) = run_with_steps::<String>(&program, addr, "abc");
        assert!(result.is_err());
    }
}
