// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Terminals: the leaves of the operator tree, compiled down to `SCAN`
//! instructions. Mirrors the teacher's `InstChar`/`InstRanges`/`InstBytes`
//! split, generalized to the PEG scanner contract of spec.md §4.1.

use regex::{Regex, RegexBuilder};

use crate::class::ClassSpec;
use crate::error::CompileError;
use crate::tree::RegexFlags;

/// `scan(s, pos, slen) -> new_pos or FAILURE`. `None` is `FAILURE`; it never
/// mutates shared state and `pos` is always a char boundary, since the
/// input is a fully materialized string of Unicode scalar values.
#[derive(Debug, Clone)]
pub enum Scanner {
    /// Matches any one character. `FAILURE` iff `pos >= slen`.
    Dot,
    /// Matches the literal string. `FAILURE` iff the input doesn't start
    /// with it at `pos`.
    Literal(String),
    /// Matches one character in/not in `spec`'s union, consuming a greedy
    /// run of at least `min` and at most `max` (`None` = unbounded)
    /// matching (or non-matching, if `neg`) characters.
    Class {
        spec: ClassSpec,
        neg: bool,
        min: usize,
        max: Option<usize>,
    },
    /// Delegates to an anchored regex engine; returns the end position of
    /// its match.
    Regex(Box<Regex>),
}

impl Scanner {
    pub fn literal(s: impl Into<String>) -> Scanner {
        Scanner::Literal(s.into())
    }

    pub fn class(spec: ClassSpec, neg: bool, min: usize, max: Option<usize>) -> Scanner {
        Scanner::Class { spec, neg, min, max }
    }

    pub fn regex(pattern: &str, flags: RegexFlags) -> Result<Scanner, CompileError> {
        let anchored = format!("\\A(?:{})", pattern);
        let re = RegexBuilder::new(&anchored)
            .case_insensitive(flags.case_insensitive)
            .multi_line(flags.multi_line)
            .dot_matches_new_line(flags.dot_matches_newline)
            .build()?;
        Ok(Scanner::Regex(Box::new(re)))
    }

    /// A scanner built directly from ranges with `min=1, max=1`, the form
    /// `CLS` compiles to before quantifier collapse folds a `STR`/`PLS`
    /// wrapper into a wider `min`/`max`.
    pub fn single_class(spec: ClassSpec, neg: bool) -> Scanner {
        Scanner::Class { spec, neg, min: 1, max: Some(1) }
    }

    /// Returns `Some(new_pos)` on success, `None` (`FAILURE`) otherwise.
    /// Never mutates shared state.
    pub fn scan(&self, s: &str, pos: usize) -> Option<usize> {
        match self {
            Scanner::Dot => {
                let mut chars = s[pos..].chars();
                chars.next().map(|c| pos + c.len_utf8())
            }
            Scanner::Literal(lit) => {
                if s[pos..].starts_with(lit.as_str()) {
                    Some(pos + lit.len())
                } else {
                    None
                }
            }
            Scanner::Class { spec, neg, min, max } => {
                let mut cur = pos;
                let mut count = 0usize;
                let mut chars = s[pos..].chars();
                loop {
                    if let Some(limit) = max {
                        if count >= *limit {
                            break;
                        }
                    }
                    match chars.next() {
                        Some(c) if spec.contains(c) != *neg => {
                            cur += c.len_utf8();
                            count += 1;
                        }
                        _ => break,
                    }
                }
                if count >= *min {
                    Some(cur)
                } else {
                    None
                }
            }
            Scanner::Regex(re) => re.find(&s[pos..]).map(|m| pos + m.end()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::ClassItem;

    fn digits() -> ClassSpec {
        ClassSpec::new(vec![ClassItem::Range('0', '9')]).unwrap()
    }

    #[test]
    fn dot_fails_at_end_of_input() {
        assert_eq!(Scanner::Dot.scan("a", 1), None);
        assert_eq!(Scanner::Dot.scan("a", 0), Some(1));
    }

    #[test]
    fn literal_matches_exact_length() {
        let scanner = Scanner::literal("abc");
        assert_eq!(scanner.scan("abcdef", 0), Some(3));
        assert_eq!(scanner.scan("ab", 0), None);
    }

    #[test]
    fn class_greedy_run_respects_min_and_max() {
        let plus = Scanner::class(digits(), false, 1, None);
        assert_eq!(plus.scan("123foo", 0), Some(3));
        assert_eq!(plus.scan("foo", 0), None);

        let star = Scanner::class(digits(), false, 0, None);
        assert_eq!(star.scan("foo", 0), Some(0));

        let bounded = Scanner::class(digits(), false, 1, Some(2));
        assert_eq!(bounded.scan("12345", 0), Some(2));
    }

    #[test]
    fn class_negation_flips_membership() {
        let not_digit = Scanner::class(digits(), true, 1, Some(1));
        assert_eq!(not_digit.scan("a", 0), Some(1));
        assert_eq!(not_digit.scan("1", 0), None);
    }

    #[test]
    fn regex_scanner_is_anchored_at_pos() {
        let scanner = Scanner::regex(r"[0-9]+", RegexFlags::default()).unwrap();
        assert_eq!(scanner.scan("123foo", 0), Some(3));
        assert_eq!(scanner.scan("foo123", 0), None);
        assert_eq!(scanner.scan("foo123", 3), Some(6));
    }
}
