// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Pattern IR (component A): a tree of symbols and groups with quantifiers,
//! backref indices, and anchor flags. Consumed, never mutated, by the
//! matcher — the only mutation happens once, at construction, when the
//! static optimizer rewrites matching subtrees in place (§4.F).
//!
//! Per the design note "replace back-pointer slots with indices," the IR
//! lives in two flat arenas (`Pattern::symbols`, `Pattern::groups`) and all
//! of the source's raw `self`/`parentAlternative` pointers become
//! `SymbolId`/`GroupId` indices into them.

use bit_set::BitSet;

/// Sentinel quantifier maximum meaning "unbounded".
pub const UNBOUNDED: u32 = u32::MAX;

/// Index into `Pattern::symbols`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolId(pub u32);

/// Index into `Pattern::groups`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupId(pub u32);

/// A quantifier attached to a symbol: `{min,max}`, with `max == UNBOUNDED`
/// meaning no upper bound, plus the lazy/possessive flags.
#[derive(Clone, Copy, Debug)]
pub struct Quantifier {
    pub min: u32,
    pub max: u32,
    pub lazy: bool,
    pub possessive: bool,
}

impl Quantifier {
    pub fn once() -> Quantifier {
        Quantifier { min: 1, max: 1, lazy: false, possessive: false }
    }

    pub fn is_fixed(&self) -> bool {
        self.max != UNBOUNDED && self.min == self.max
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerbKind {
    Accept,
    Fail,
    Commit,
    Prune,
    Skip,
    Then,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupType {
    NonCapturing,
    Capturing,
    Atomic,
    BranchReset,
    Lookahead,
    MolecularLookahead,
    NegativeLookahead,
    Lookinto,
    MolecularLookinto,
    NegativeLookinto,
    Conditional,
    LookaroundConditional,
}

impl GroupType {
    /// Lookaround variants never consume input and contribute no forward
    /// progress of their own.
    pub fn is_lookaround(self) -> bool {
        matches!(
            self,
            GroupType::Lookahead
                | GroupType::MolecularLookahead
                | GroupType::NegativeLookahead
                | GroupType::Lookinto
                | GroupType::MolecularLookinto
                | GroupType::NegativeLookinto
        )
    }

    pub fn is_negative(self) -> bool {
        matches!(self, GroupType::NegativeLookahead | GroupType::NegativeLookinto)
    }

    pub fn is_lookinto(self) -> bool {
        matches!(
            self,
            GroupType::Lookinto | GroupType::MolecularLookinto | GroupType::NegativeLookinto
        )
    }

    pub fn is_molecular(self) -> bool {
        matches!(self, GroupType::MolecularLookahead | GroupType::MolecularLookinto)
    }
}

/// Where an `IsPrime`/`IsPowerOf2` predicate reads its operand from: the
/// ordinary "space left" of the current match, or (§4.F rule 4) the length
/// already captured by an enclosing negative `Lookinto`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PredicateSource {
    SpaceLeft,
    Lookinto { backref_index: u32 },
}

#[derive(Clone, Debug)]
pub enum SymbolKind {
    NoOp,
    AlwaysMatch,
    NeverMatch,
    Character { any: bool, byte: u8 },
    CharacterClass { set: BitSet, negate: bool },
    /// A coalesced run of ≥2 distinct literal bytes (§4.B).
    Str { bytes: Vec<u8> },
    /// 0-based internal capture index. User syntax is 1-based (`\1` ->
    /// internal index 0).
    Backref { index: u32 },
    AnchorStart,
    AnchorEnd,
    WordBoundary { negate: bool },
    /// `\K`.
    ResetStart,
    Digit { negate: bool },
    Space { negate: bool },
    WordChar { negate: bool },
    Verb(VerbKind),
    Group(GroupId),

    // Synthetic nodes installed by the static optimizer (§4.F). Each keeps
    // enough of the original shape to run without revisiting child symbols.
    //
    // The constant-length-group shortcut (§4.F rule 1) is *not* modeled as
    // a synthetic symbol here: unlike the primality/power-of-two rewrites,
    // it is valid only in numerical mode, and a single `Pattern` can be
    // matched in both numerical and string mode (`match_number` and
    // `match_string` on the same `Regex`). Baking a mode-specific rewrite
    // into the shared, immutable IR would make one mode's optimization
    // silently wrong for the other. Instead `Group::is_const_length` is a
    // mode-independent *structural* fact checked once at construction, and
    // the matcher decides at dispatch time, per call, whether to take the
    // arithmetic shortcut (only when matching numerically) or run the
    // group normally (see `matcher::const_length`).
    /// `n == 1` is always accepted (no regex shape here can itself match
    /// length 1, so the rewrite must special-case it to match what
    /// unoptimized backtracking would have done). `accept_zero` additionally
    /// accepts `n == 0`, for the inner-group shape that has no empty
    /// alternative (so backtracking itself could never produce length 0
    /// either) — see `optimize::static_opt` for which shape sets which.
    IsPrime { accept_zero: bool, source: PredicateSource },
    IsPowerOf2 { zero_counts: bool, source: PredicateSource },
}

#[derive(Clone, Debug)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub quant: Quantifier,
    pub parent: GroupId,
    pub alt_index: u32,
    pub slot_index: u32,
}

impl Symbol {
    pub fn matches_quantifiers(&self) -> bool {
        !matches!(
            self.kind,
            SymbolKind::AnchorStart
                | SymbolKind::AnchorEnd
                | SymbolKind::WordBoundary { .. }
                | SymbolKind::ResetStart
                | SymbolKind::Verb(_)
        )
    }
}

#[derive(Clone, Debug)]
pub struct Group {
    pub id: GroupId,
    pub group_type: GroupType,
    pub alternatives: Vec<Vec<SymbolId>>,
    /// Capturing groups only: 0-based internal capture index.
    pub backref_index: Option<u32>,
    /// Conditional/lookaround-conditional groups: the tested backref, or
    /// the embedded lookaround's first symbol.
    pub condition_backref: Option<u32>,
    pub embedded_lookaround: Option<GroupId>,
    pub parent: Option<GroupId>,
    /// The symbol whose `kind` is `SymbolKind::Group(self.id)` (the
    /// analogue of the source's `self` back-pointer for a group).
    pub self_symbol: SymbolId,
    /// Set once by `optimize::static_opt` (§4.F rule 1): true when every
    /// alternative is a single alternative of fixed-count characters and
    /// backrefs, so the group's total length is computable by arithmetic
    /// alone. Checked by the matcher only in numerical mode (see the note
    /// on `SymbolKind` above).
    pub const_length_eligible: bool,
}

/// The parsed and statically-optimized pattern. Immutable once built;
/// shared by every `Matcher` invocation.
#[derive(Clone, Debug)]
pub struct Pattern {
    pub symbols: Vec<Symbol>,
    pub groups: Vec<Group>,
    pub root: GroupId,
    /// Number of user-addressable capture groups (`\1`..`\N`); does not
    /// include the implicit whole-match capture.
    pub num_captures: u32,
    pub max_group_depth: u32,
    pub anchored: bool,
    /// Set by `literal_scan`: a byte every unanchored start position must
    /// begin with, if the grammar pins one down. `None` means "no cheap
    /// necessary condition" — the matcher falls back to trying every
    /// position.
    pub required_leading_byte: Option<u8>,
    pub source: String,
}

impl Pattern {
    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0 as usize]
    }

    pub fn group(&self, id: GroupId) -> &Group {
        &self.groups[id.0 as usize]
    }

    /// The symbol immediately following `id` in its alternative, if any.
    pub fn next_sibling(&self, id: SymbolId) -> Option<SymbolId> {
        let sym = self.symbol(id);
        let alt = &self.group(sym.parent).alternatives[sym.alt_index as usize];
        alt.get(sym.slot_index as usize + 1).copied()
    }
}

pub(crate) fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

pub(crate) fn is_digit_byte(b: u8) -> bool {
    b.is_ascii_digit()
}

pub(crate) fn is_space_byte(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}
