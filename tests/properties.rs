// Universal/quantified laws from spec §8, driven by quickcheck rather than
// hand-picked examples where the law is naturally a "for all" statement.

use quickcheck::quickcheck;
use regex_math::{Config, OptimizationLevel, Regex};

fn config_at(level: OptimizationLevel) -> Config {
    let mut config = Config::default();
    config.optimization_level = level;
    config
}

#[test]
fn determinism_across_repeated_calls() {
    let re = Regex::new(r"^(?!(xx+)\1+$)xx+$", Config::default()).unwrap();
    let first = re.match_number(97, b'x', 0);
    for _ in 0..10 {
        let again = re.match_number(97, b'x', 0);
        assert_eq!(first, again);
    }
}

#[test]
fn anchored_pattern_tries_exactly_one_start_position() {
    let re = Regex::new(r"^abc", Config::default()).unwrap();
    assert!(re.is_anchored());
    // A miss on an anchored pattern must report "don't bother retrying" via
    // retry_at_next_start == false once the outer loop gives up — i.e. the
    // outer loop quit on the anchoring shortcut, not by walking the string.
    let m = re.match_string(b"xxxabc", 0);
    assert!(!m.matched);
}

#[test]
fn greedy_quantifier_maximizes_count() {
    let re = Regex::new(r"a+", Config::default()).unwrap();
    let m = re.match_string(b"xaaaay", 0);
    assert!(m.matched);
    assert_eq!(m.match_start, 1);
    assert_eq!(m.match_length, 4);
}

#[test]
fn lazy_quantifier_minimizes_count() {
    let re = Regex::new(r"a+?", Config::default()).unwrap();
    let m = re.match_string(b"xaaaay", 0);
    assert!(m.matched);
    assert_eq!(m.match_start, 1);
    assert_eq!(m.match_length, 1);
}

#[test]
fn possessive_quantifier_never_backtracks() {
    // `a++a` can never succeed: the possessive `a++` consumes every `a`
    // and never gives one back for the trailing literal `a` to claim.
    let re = Regex::new(r"a++a", Config::default()).unwrap();
    assert!(!re.match_string(b"aaaa", 0).matched);
    // The ordinary (non-possessive) greedy form does backtrack and succeeds.
    let re = Regex::new(r"a+a", Config::default()).unwrap();
    assert!(re.match_string(b"aaaa", 0).matched);
}

#[test]
fn possessive_group_quantifier_never_retries_an_earlier_iterations_alternative() {
    // Each iteration of `(?:a|ab)++` picks "a" first. If the possessive
    // group only suppressed count-level backtracking and left each
    // iteration's own alternative choice live, this could still find
    // "ab" for the first iteration once later matching against "babc"
    // failed outright, letting `c` land right after — a match the
    // possessive quantifier is supposed to rule out.
    let re = Regex::new(r"(?:a|ab)++c", Config::default()).unwrap();
    assert!(!re.match_string(b"ababc", 0).matched);
    // The ordinary (non-possessive) form does backtrack into the "ab"
    // choice and succeeds.
    let re = Regex::new(r"(?:a|ab)+c", Config::default()).unwrap();
    assert!(re.match_string(b"ababc", 0).matched);
}

#[test]
fn no_empty_optional_exits_at_min_count() {
    let mut config = Config::default();
    config.no_empty_optional = true;
    // `(a?)*` over empty input: with no_empty_optional, the outer loop
    // must not spin on the inner group's zero-length match.
    let re = Regex::new(r"^(a?)*$", config).unwrap();
    let m = re.match_string(b"", 0);
    assert!(m.matched);
    assert_eq!(m.match_length, 0);
}

#[test]
fn non_participating_capture_with_min_zero_matches_empty() {
    let re = Regex::new(r"(a)?\1?", Config::default()).unwrap();
    let m = re.match_string(b"", 0);
    assert!(m.matched);
    assert_eq!(m.match_length, 0);
}

#[test]
fn non_participating_capture_with_min_one_rejects_without_ecma_emulation() {
    let mut config = Config::default();
    config.emulate_ecma_npcgs = false;
    let re = Regex::new(r"(a)?\1{1}b", config).unwrap();
    // \1 never participated and must match at least one unit: no backref
    // length exists, so the whole alternative can never succeed.
    assert!(!re.match_string(b"b", 0).matched);
}

#[test]
fn non_participating_capture_under_ecma_emulation_matches_empty() {
    let mut config = Config::default();
    config.emulate_ecma_npcgs = true;
    let re = Regex::new(r"(a)?\1{1}b", config).unwrap();
    assert!(re.match_string(b"b", 0).matched);
}

quickcheck! {
    fn optimizer_parity_number_mode(n: u64) -> bool {
        let n = n % 200;
        let naive = Regex::new(r"^(?!(xx+)\1+$)xx+$", config_at(OptimizationLevel::Off)).unwrap();
        let optimized = Regex::new(r"^(?!(xx+)\1+$)xx+$", config_at(OptimizationLevel::Full)).unwrap();
        naive.match_number(n, b'x', 0).matched == optimized.match_number(n, b'x', 0).matched
    }

    fn optimizer_parity_string_mode(len: u8) -> bool {
        let s = vec![b'a'; (len % 40) as usize];
        let naive = Regex::new(r"^(a+)b?\1$", config_at(OptimizationLevel::Off)).unwrap();
        let optimized = Regex::new(r"^(a+)b?\1$", config_at(OptimizationLevel::Full)).unwrap();
        let n = naive.match_string(&s, 0);
        let o = optimized.match_string(&s, 0);
        n.matched == o.matched && (!n.matched || (n.match_start == o.match_start && n.match_length == o.match_length))
    }

    fn capture_stack_balance_after_nested_groups(count: u8) -> bool {
        let count = (count % 12) as usize;
        let re = Regex::new(r"^(?:(a)(b))*$", Config::default()).unwrap();
        let input = "ab".repeat(count);
        let m = re.match_string(input.as_bytes(), 0);
        m.matched
    }
}
