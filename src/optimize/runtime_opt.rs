// Runtime optimizer (component G), spec §4.G. Invoked by `matcher::repeat_simple`
// right before it would otherwise try every possible repeat count one at a
// time via backtracking. Grounded on
// `original_source/matcher-optimization.h`'s
// `runtimeOptimize_matchSymbol_Character_or_Backref`, which inspects the
// symbols *after* the current repeat and, when the tail pins the count down
// to a single arithmetic solution, computes it directly instead of pushing
// a chain of `SimpleRepeatFewer` backtrack records.
//
// Only the two tail shapes `Config::OptimizationLevel::Basic` documents are
// implemented:
//   1. end-anchored tail — any run of (zero-width) lookarounds followed by
//      `$`.
//   2. backref-subtract tail — a single fixed-count backref followed by `$`.
//
// The source's fuller runtime optimizer additionally handles a
// maxed-out-capturing-group-then-self-backref shape, lookahead-derived
// anchoring with a "multiplication" shortcut for geometric-growth patterns,
// and a recursive jump straight into a nested anchored multiplication. None
// of those three are implemented here — patterns that rely on exactly those
// idioms still match correctly, they just run the ordinary backtracking
// loop instead of the closed-form shortcut. See DESIGN.md.

use crate::ir::{Pattern, SymbolId, SymbolKind};

/// What the symbols after a repeat resolve to, if anything closed-form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TailShape {
    EndAnchored,
    BackrefSubtract { capture: u32 },
}

/// Walks forward from `next` (the symbol right after a repeat) looking for
/// one of the two recognized tail shapes. Zero-width lookarounds in between
/// are transparent — they don't consume any of `spaceLeft`, so they don't
/// change the arithmetic.
pub fn classify_tail(pattern: &Pattern, mut next: Option<SymbolId>) -> Option<TailShape> {
    loop {
        let sid = next?;
        let sym = pattern.symbol(sid);
        match &sym.kind {
            SymbolKind::NoOp => next = pattern.next_sibling(sid),
            SymbolKind::AnchorEnd => return Some(TailShape::EndAnchored),
            SymbolKind::Group(gid) if sym.quant.min >= 1 && pattern.group(*gid).group_type.is_lookaround() => {
                next = pattern.next_sibling(sid);
            }
            SymbolKind::Backref { index } if sym.quant.is_fixed() && sym.quant.min == 1 => {
                return match pattern.next_sibling(sid) {
                    Some(after) if matches!(pattern.symbol(after).kind, SymbolKind::AnchorEnd) => {
                        Some(TailShape::BackrefSubtract { capture: *index })
                    }
                    _ => None,
                };
            }
            _ => return None,
        }
    }
}

/// Solves for the exact repeat count implied by `shape`, given `space_left`
/// units remaining before the repeat runs and `multiple` units per
/// repetend. `None` means the arithmetic has no solution — since the tail
/// pins the count to a single value, that means no count at all can
/// satisfy the rest of the pattern, not just that this shortcut doesn't
/// apply.
pub fn solve_count(
    shape: TailShape,
    space_left: u64,
    multiple: u64,
    captured_len: impl Fn(u32) -> Option<u64>,
) -> Option<u64> {
    if multiple == 0 {
        return None;
    }
    match shape {
        TailShape::EndAnchored => {
            if space_left % multiple != 0 {
                return None;
            }
            Some(space_left / multiple)
        }
        TailShape::BackrefSubtract { capture } => {
            let captured = captured_len(capture)?;
            let remaining = space_left.checked_sub(captured)?;
            if remaining % multiple != 0 {
                return None;
            }
            Some(remaining / multiple)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_anchored_divides_evenly() {
        assert_eq!(solve_count(TailShape::EndAnchored, 12, 3, |_| None), Some(4));
    }

    #[test]
    fn end_anchored_rejects_remainder() {
        assert_eq!(solve_count(TailShape::EndAnchored, 13, 3, |_| None), None);
    }

    #[test]
    fn backref_subtract_solves_for_count() {
        let shape = TailShape::BackrefSubtract { capture: 0 };
        assert_eq!(solve_count(shape, 10, 2, |_| Some(4)), Some(3));
    }

    #[test]
    fn backref_subtract_rejects_when_capture_too_long() {
        let shape = TailShape::BackrefSubtract { capture: 0 };
        assert_eq!(solve_count(shape, 3, 2, |_| Some(10)), None);
    }
}
