// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A backtracking regular-expression engine specialized for experimenting
//! with esoteric and unary-number pattern matching: the same compiled
//! pattern can be run against a string buffer or against a bare length
//! standing in for a run of one repeated character, so constructs like
//! `(?!(xx+)\1+$)` read as a primality test over the input's length.
//!
//! ```
//! use regex_math::{Config, Regex};
//!
//! let re = Regex::new(r"^(?!(xx+)\1+$)xx+$", Config::default()).unwrap();
//! assert!(re.match_number(13, b'x', 0).matched);
//! assert!(!re.match_number(12, b'x', 0).matched);
//! ```

mod config;
mod error;
mod groups;
mod input;
mod ir;
mod literal_scan;
mod matcher;
mod optimize;
mod parser;
mod primality;
mod stack;

pub use config::{Config, DebugTrace, OptimizationLevel};
pub use error::ParseError;
pub use input::{InputModel, NumberInput, StringInput};

use ir::Pattern;

/// Outcome of matching against a numerical (unary) input, spec §6's
/// `MatchNumber`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NumberMatch {
    pub matched: bool,
    pub match_offset: u64,
    pub match_length: u64,
    /// See `Regex::match_number`: false only when a `(*COMMIT)` fired and
    /// consumed the whole alternative set without matching.
    pub retry_at_next_start: bool,
}

/// Outcome of matching against a string input, spec §6's `MatchString`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StringMatch {
    pub matched: bool,
    pub match_start: usize,
    pub match_length: usize,
    pub retry_at_next_start: bool,
}

/// A compiled pattern. Immutable once built (`Send + Sync`); every call to
/// `match_number`/`match_string` creates its own scratch `Matcher` rather
/// than sharing mutable state, so one `Regex` can be matched concurrently
/// from multiple threads.
#[derive(Clone, Debug)]
pub struct Regex {
    pattern: Pattern,
    config: Config,
}

impl Regex {
    /// Parses `pattern` under `config`'s dialect flags, then runs the
    /// static optimizer (§4.F) over the result. Returns the parse error
    /// as-is on malformed input; no partial `Regex` is ever produced.
    pub fn new(pattern: &str, config: Config) -> Result<Regex, ParseError> {
        let mut ir = parser::parse(pattern, &config)?;
        optimize::static_opt::optimize(&mut ir, &config);
        Ok(Regex { pattern: ir, config })
    }

    /// Matches against a unary input of the given length. `basic_char` is
    /// the sentinel byte used only for `\w`/`\d`/`\s` class membership
    /// tests; it never appears in the reported offsets. `return_capture_index`
    /// is `0` for the whole match or `N` for the `N`th user capture
    /// (`\N`); a capture that never participated reports offset/length `0`.
    pub fn match_number(&self, input: u64, basic_char: u8, return_capture_index: u32) -> NumberMatch {
        let outcome = matcher::run_match(
            &self.pattern,
            &self.config,
            input::NumberInput { length: input, basic_char },
            return_capture_index,
        );
        NumberMatch {
            matched: outcome.matched,
            match_offset: outcome.start,
            match_length: outcome.length,
            retry_at_next_start: outcome.retry_at_next_start,
        }
    }

    /// Matches against a string input.
    pub fn match_string(&self, bytes: &[u8], return_capture_index: u32) -> StringMatch {
        let outcome =
            matcher::run_match(&self.pattern, &self.config, input::StringInput { bytes }, return_capture_index);
        StringMatch {
            matched: outcome.matched,
            match_start: outcome.start as usize,
            match_length: outcome.length as usize,
            retry_at_next_start: outcome.retry_at_next_start,
        }
    }

    /// Number of user-addressable capture groups in the pattern (`\1..\N`),
    /// not counting the implicit whole-match capture.
    pub fn capture_count(&self) -> u32 {
        self.pattern.num_captures
    }

    /// True when every alternative in the pattern requires `AnchorStart`,
    /// so a miss at position 0 can never succeed at a later one.
    pub fn is_anchored(&self) -> bool {
        self.pattern.anchored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_literal_match() {
        let re = Regex::new("abc", Config::default()).unwrap();
        let m = re.match_string(b"xxabcxx", 0);
        assert!(m.matched);
        assert_eq!(m.match_start, 2);
        assert_eq!(m.match_length, 3);
    }

    #[test]
    fn capture_reporting() {
        let re = Regex::new(r"a(b+)c", Config::default()).unwrap();
        let m = re.match_string(b"abbbc", 1);
        assert!(m.matched);
        assert_eq!(m.match_start, 1);
        assert_eq!(m.match_length, 3);
    }

    #[test]
    fn non_participating_capture_reports_zero() {
        let re = Regex::new(r"a(b)?c", Config::default()).unwrap();
        let m = re.match_string(b"ac", 1);
        assert!(m.matched);
        assert_eq!(m.match_length, 0);
    }

    #[test]
    fn parse_error_carries_offset() {
        let err = Regex::new("a(b", Config::default()).unwrap_err();
        assert_eq!(err.offset, 3);
    }

    #[test]
    fn unary_prime_length_scenario() {
        // spec §8 scenario 1: matches exactly at the primes in 0..30.
        let re = Regex::new(r"^(?!(xx+)\1+$)xx+$", Config::default()).unwrap();
        let primes: Vec<u64> = (0..30).filter(|&n| re.match_number(n, b'x', 0).matched).collect();
        assert_eq!(primes, vec![2, 3, 5, 7, 11, 13, 17, 19, 23, 29]);
    }
}
