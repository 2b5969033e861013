// Static optimizer (component F), run once after parsing. Grounded on
// `original_source/matcher-optimization.h`'s `staticallyOptimizeGroup`: it
// walks every group looking for a handful of fixed shapes and rewrites them
// in place, the same way the source swaps a `RegexGroup` subtree for a
// synthetic `RegexSymbol` before the first match ever runs.
//
// Two rewrites live here:
//   - `stamp_const_length_eligible`: marks single-alternative groups whose
//     length is a compile-time constant, so the matcher can add instead of
//     re-walking them in numerical mode (§4.F rule 1).
//   - the unary primality/power-of-two idioms (§4.F rules 2-4): a negative
//     lookaround wrapping a self-referential backref loop is swapped for a
//     single `IsPrime`/`IsPowerOf2` leaf.
//
// The source additionally recognizes a third shape, `(?!(x(xx)+|)\1*$)`
// (a literal followed by a *nested* doubling group) — not implemented here.
// Patterns using that exact idiom still match correctly; they just run the
// ordinary backtracking interpreter instead of the closed-form shortcut.
// See DESIGN.md.

use crate::config::Config;
use crate::ir::{Group, GroupType, Pattern, PredicateSource, Symbol, SymbolId, SymbolKind, UNBOUNDED};

pub fn optimize(pattern: &mut Pattern, config: &Config) {
    if !config.optimization_level.allows_static() {
        return;
    }
    stamp_const_length_eligible(pattern);
    rewrite_unary_predicates(pattern);
}

/// §4.F rule 1: a group is const-length-eligible when it has exactly one
/// alternative and every symbol in it is a fixed-count character, string,
/// backref, or no-op. A backref to the group's own capture is excluded —
/// self-reference can't be resolved by arithmetic alone.
fn stamp_const_length_eligible(pattern: &mut Pattern) {
    let mut eligible = Vec::new();
    for (i, group) in pattern.groups.iter().enumerate() {
        if group.alternatives.len() != 1 {
            continue;
        }
        let own_capture = group.backref_index;
        let is_const = group.alternatives[0].iter().all(|&sid| {
            let sym = &pattern.symbols[sid.0 as usize];
            if !sym.quant.is_fixed() {
                return false;
            }
            match &sym.kind {
                SymbolKind::Character { .. } | SymbolKind::Str { .. } | SymbolKind::NoOp => true,
                SymbolKind::Backref { index } => Some(*index) != own_capture,
                _ => false,
            }
        });
        if is_const {
            eligible.push(i);
        }
    }
    for i in eligible {
        pattern.groups[i].const_length_eligible = true;
    }
}

fn rewrite_unary_predicates(pattern: &mut Pattern) {
    let mut rewrites: Vec<(SymbolId, SymbolKind)> = Vec::new();

    for group in &pattern.groups {
        if !matches!(group.group_type, GroupType::NegativeLookahead | GroupType::NegativeLookinto) {
            continue;
        }
        let self_sym = &pattern.symbols[group.self_symbol.0 as usize];
        if self_sym.quant.min == 0 {
            // A negative lookaround quantified to zero repetitions can
            // never run; nothing to rewrite.
            continue;
        }
        if group.alternatives.len() != 1 {
            continue;
        }
        let seq = &group.alternatives[0];
        let is_lookinto = group.group_type == GroupType::NegativeLookinto;
        let source = |capture: u32| {
            if is_lookinto {
                match group.condition_backref {
                    Some(backref_index) => PredicateSource::Lookinto { backref_index },
                    // No enclosing capture for the parser to bind to; fall
                    // back to testing the live cursor like an ordinary
                    // lookahead (see matcher.rs's note on `Lookinto`).
                    None => PredicateSource::SpaceLeft,
                }
            } else {
                let _ = capture;
                PredicateSource::SpaceLeft
            }
        };

        if let Some((capture, accept_zero)) = match_prime_shape(pattern, seq) {
            rewrites.push((
                group.self_symbol,
                SymbolKind::IsPrime { accept_zero, source: source(capture) },
            ));
            continue;
        }
        if let Some((capture, zero_counts)) = match_pow2_shape(pattern, seq) {
            rewrites.push((
                group.self_symbol,
                SymbolKind::IsPowerOf2 { zero_counts, source: source(capture) },
            ));
        }
    }

    for (sym_id, kind) in rewrites {
        pattern.symbols[sym_id.0 as usize].kind = kind;
    }
}

fn sym<'p>(pattern: &'p Pattern, id: SymbolId) -> &'p Symbol {
    &pattern.symbols[id.0 as usize]
}

fn grp<'p>(pattern: &'p Pattern, id: crate::ir::GroupId) -> &'p Group {
    &pattern.groups[id.0 as usize]
}

fn literal_byte(s: &Symbol) -> Option<u8> {
    match s.kind {
        SymbolKind::Character { any: false, byte } => Some(byte),
        _ => None,
    }
}

/// `(xx+)` or `(xx+|)`: a single literal byte, then one-or-more of the same
/// byte.
fn match_literal_run(pattern: &Pattern, alt: &[SymbolId]) -> bool {
    if alt.len() != 2 {
        return false;
    }
    let first = sym(pattern, alt[0]);
    let rest = sym(pattern, alt[1]);
    let (Some(a), Some(b)) = (literal_byte(first), literal_byte(rest)) else {
        return false;
    };
    if a != b {
        return false;
    }
    first.quant.is_fixed() && first.quant.min == 1 && rest.quant.min >= 1 && rest.quant.max == UNBOUNDED
}

/// `(?!(xx+|)\1+$)` / `(?!(xx+)\1+$)` -> `(capture_index, accept_zero)`.
///
/// `accept_zero` mirrors the source's `matchZero`-derived `lazy` flag: the
/// two-alternative form has an empty branch, so plain backtracking already
/// fails the whole assertion at length 0 (no override needed) and only
/// needs length 1 forced true. The one-alternative form has no way to match
/// length 0 *or* 1 (the run requires 2+ bytes), so both must be forced.
fn match_prime_shape(pattern: &Pattern, seq: &[SymbolId]) -> Option<(u32, bool)> {
    if seq.len() != 3 {
        return None;
    }
    let group_sym = sym(pattern, seq[0]);
    let inner_gid = match group_sym.kind {
        SymbolKind::Group(g) => g,
        _ => return None,
    };
    let inner = grp(pattern, inner_gid);
    if inner.group_type != GroupType::Capturing {
        return None;
    }
    if !(group_sym.quant.is_fixed() && group_sym.quant.min == 1) {
        return None;
    }
    let capture = inner.backref_index?;

    let backref_sym = sym(pattern, seq[1]);
    match backref_sym.kind {
        SymbolKind::Backref { index } if index == capture => {}
        _ => return None,
    }
    if backref_sym.quant.min < 1 || backref_sym.quant.max != UNBOUNDED {
        return None;
    }
    if !matches!(sym(pattern, seq[2]).kind, SymbolKind::AnchorEnd) {
        return None;
    }

    match inner.alternatives.len() {
        1 => {
            if match_literal_run(pattern, &inner.alternatives[0]) {
                Some((capture, true))
            } else {
                None
            }
        }
        2 => {
            if match_literal_run(pattern, &inner.alternatives[0]) && inner.alternatives[1].is_empty() {
                Some((capture, false))
            } else {
                None
            }
        }
        _ => None,
    }
}

/// `(?!(x*)(\1\1)+$)` -> `(capture_index, zero_counts)`. `zero_counts` is
/// true exactly when the repeated atom is `x+` rather than `x*`: with `x+`
/// the first group can never match an empty string, so at length 0 plain
/// backtracking fails the whole inner match and the negative lookaround
/// vacuously succeeds — the override has to reproduce that.
fn match_pow2_shape(pattern: &Pattern, seq: &[SymbolId]) -> Option<(u32, bool)> {
    if seq.len() != 3 {
        return None;
    }
    let g1_sym = sym(pattern, seq[0]);
    let g1_gid = match g1_sym.kind {
        SymbolKind::Group(g) => g,
        _ => return None,
    };
    let g1 = grp(pattern, g1_gid);
    if g1.group_type != GroupType::Capturing || !(g1_sym.quant.is_fixed() && g1_sym.quant.min == 1) {
        return None;
    }
    let capture = g1.backref_index?;
    if g1.alternatives.len() != 1 || g1.alternatives[0].len() != 1 {
        return None;
    }
    let atom = sym(pattern, g1.alternatives[0][0]);
    literal_byte(atom)?;
    if atom.quant.max != UNBOUNDED || atom.quant.min > 1 {
        return None;
    }
    let zero_counts = atom.quant.min != 0;

    let g2_sym = sym(pattern, seq[1]);
    let g2_gid = match g2_sym.kind {
        SymbolKind::Group(g) => g,
        _ => return None,
    };
    let g2 = grp(pattern, g2_gid);
    if !matches!(g2.group_type, GroupType::NonCapturing | GroupType::Capturing | GroupType::BranchReset) {
        return None;
    }
    if g2_sym.quant.min < 1 || g2_sym.quant.max != UNBOUNDED {
        return None;
    }
    if g2.alternatives.len() != 1 || g2.alternatives[0].len() != 2 {
        return None;
    }
    for &sid in &g2.alternatives[0] {
        let s = sym(pattern, sid);
        match s.kind {
            SymbolKind::Backref { index } if index == capture => {}
            _ => return None,
        }
        if !(s.quant.is_fixed() && s.quant.min == 1) {
            return None;
        }
    }
    if !matches!(sym(pattern, seq[2]).kind, SymbolKind::AnchorEnd) {
        return None;
    }

    Some((capture, zero_counts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn optimize_source(source: &str, config: &Config) -> Pattern {
        let mut pattern = crate::parser::parse(source, config).unwrap();
        optimize(&mut pattern, config);
        pattern
    }

    #[test]
    fn recognizes_prime_shape_without_empty_alt() {
        let config = Config::default();
        let pattern = optimize_source(r"^(?!(xx+)\1+$)x+$", &config);
        let found = pattern.symbols.iter().any(|s| matches!(
            s.kind,
            SymbolKind::IsPrime { accept_zero: true, source: PredicateSource::SpaceLeft }
        ));
        assert!(found, "expected a rewritten IsPrime{{accept_zero:true}} symbol");
    }

    #[test]
    fn recognizes_prime_shape_with_empty_alt() {
        let config = Config::default();
        let pattern = optimize_source(r"^(?!(xx+|)\1+$)x+$", &config);
        let found = pattern.symbols.iter().any(|s| matches!(
            s.kind,
            SymbolKind::IsPrime { accept_zero: false, source: PredicateSource::SpaceLeft }
        ));
        assert!(found, "expected a rewritten IsPrime{{accept_zero:false}} symbol");
    }

    #[test]
    fn recognizes_power_of_two_shape() {
        let config = Config::default();
        let pattern = optimize_source(r"^(?!(x*)(\1\1)+$)x+$", &config);
        let found = pattern.symbols.iter().any(|s| matches!(
            s.kind,
            SymbolKind::IsPowerOf2 { zero_counts: false, source: PredicateSource::SpaceLeft }
        ));
        assert!(found, "expected a rewritten IsPowerOf2{{zero_counts:false}} symbol");
    }

    #[test]
    fn leaves_unrelated_negative_lookaheads_alone() {
        let config = Config::default();
        let pattern = optimize_source(r"(?!abc)x+", &config);
        let rewritten = pattern
            .symbols
            .iter()
            .any(|s| matches!(s.kind, SymbolKind::IsPrime { .. } | SymbolKind::IsPowerOf2 { .. }));
        assert!(!rewritten);
    }

    #[test]
    fn off_optimization_level_skips_rewrite() {
        use crate::config::OptimizationLevel;
        let mut config = Config::default();
        config.optimization_level = OptimizationLevel::Off;
        let pattern = optimize_source(r"^(?!(xx+)\1+$)x+$", &config);
        let rewritten = pattern.symbols.iter().any(|s| matches!(s.kind, SymbolKind::IsPrime { .. }));
        assert!(!rewritten);
    }
}
