// Component E: the match engine. A single generic `Matcher<'p, M>` replaces
// the source's `RegexMatcher<USE_STRINGS>` template instantiation pair —
// monomorphized per `InputModel` the same way the source specialized per
// `USE_STRINGS`, but without the macro duplication that implies in C++.
//
// The dispatch loop is a `Cursor`-driven state machine rather than the
// source's recursive `matchSymbol` calls: `dispatch` advances one symbol
// and returns where to go next (another symbol, "end of this alternative,"
// overall success, or "backtrack"), and `unwind` pops `MatchingStack`
// records until it finds one that produces a new `Cursor`. This keeps the
// whole engine iterative, which matters since `loopGroup`-driven repeats
// and deeply nested backtracking would otherwise grow the native call
// stack unboundedly.

use crate::config::Config;
use crate::groups::{CaptureTable, CaptureValue, GroupStackFrame};
use crate::input::InputModel;
use crate::ir::{GroupId, GroupType, Pattern, PredicateSource, Symbol, SymbolId, SymbolKind, UNBOUNDED};
use crate::optimize::runtime_opt;
use crate::primality;
use crate::stack::{MatchingStack, ResumeAction, StackRecord};
use log::{debug, trace};

/// What the dispatch loop should do next.
enum Cursor {
    Symbol(SymbolId),
    EndOfAlternative,
    Accept,
    Fail,
}

/// Result of a single top-level match attempt (spec §6's `NumberMatch` /
/// `StringMatch`, mode-agnostic half).
pub struct MatchOutcome {
    pub matched: bool,
    pub start: u64,
    pub length: u64,
    /// Set when a `(*COMMIT)` or `(*SKIP)` fired during a failed attempt:
    /// the caller should not look for a match at a later start position
    /// (`(*COMMIT)`), or should resume scanning from `resume_from` rather
    /// than `start + 1` (`(*SKIP)`).
    pub retry_at_next_start: bool,
}

struct Matcher<'p, M> {
    pattern: &'p Pattern,
    config: &'p Config,
    input: M,
    position: u64,
    match_start: u64,
    captures: CaptureTable,
    capture_stack: Vec<u32>,
    group_stack: Vec<GroupStackFrame>,
    stack: MatchingStack,
    no_retry: bool,
    skip_to: Option<u64>,
}

impl<'p, M: InputModel> Matcher<'p, M> {
    fn new(pattern: &'p Pattern, config: &'p Config, input: M) -> Matcher<'p, M> {
        Matcher {
            pattern,
            config,
            input,
            position: 0,
            match_start: 0,
            captures: CaptureTable::new(pattern.num_captures),
            capture_stack: Vec::new(),
            group_stack: Vec::new(),
            stack: MatchingStack::new(),
            no_retry: false,
            skip_to: None,
        }
    }

    fn reset_for_attempt(&mut self, start: u64) {
        self.position = start;
        self.match_start = start;
        self.captures = CaptureTable::new(self.pattern.num_captures);
        self.capture_stack.clear();
        self.group_stack.clear();
        self.stack.clear();
    }

    // ---- top-level driver ------------------------------------------------

    fn try_whole_pattern(&mut self, start: u64) -> bool {
        self.reset_for_attempt(start);
        self.run_group_to_completion(self.pattern.root)
    }

    fn run_group_to_completion(&mut self, gid: GroupId) -> bool {
        let multi_alt = self.pattern.group(gid).alternatives.len() > 1;
        let mut cursor = self.begin_group_frame(gid, 0, multi_alt);
        loop {
            cursor = match cursor {
                Cursor::Symbol(s) => self.dispatch(s),
                Cursor::EndOfAlternative => self.close_current_group(),
                Cursor::Accept => return true,
                Cursor::Fail => match self.unwind() {
                    Some(c) => c,
                    None => return false,
                },
            };
        }
    }

    // ---- dispatch ----------------------------------------------------------

    fn dispatch(&mut self, sym_id: SymbolId) -> Cursor {
        let sym = self.pattern.symbol(sym_id);
        if self.config.debug_trace.logs_symbols() {
            trace!("dispatch {:?} at {}", sym.kind, self.position);
        }
        match &sym.kind {
            SymbolKind::NoOp | SymbolKind::AlwaysMatch => self.advance_past(sym_id),
            SymbolKind::NeverMatch => Cursor::Fail,
            SymbolKind::Character { .. }
            | SymbolKind::CharacterClass { .. }
            | SymbolKind::Digit { .. }
            | SymbolKind::Space { .. }
            | SymbolKind::WordChar { .. }
            | SymbolKind::Str { .. }
            | SymbolKind::Backref { .. } => self.repeat_simple(sym_id),
            SymbolKind::AnchorStart => {
                if self.position == 0 {
                    self.advance_past(sym_id)
                } else {
                    Cursor::Fail
                }
            }
            SymbolKind::AnchorEnd => {
                if self.position == self.input.len() {
                    self.advance_past(sym_id)
                } else {
                    Cursor::Fail
                }
            }
            SymbolKind::WordBoundary { negate } => {
                let before = self.position > 0 && self.input.word_char_at(self.position - 1);
                let after = self.input.word_char_at(self.position);
                if (before != after) != *negate {
                    self.advance_past(sym_id)
                } else {
                    Cursor::Fail
                }
            }
            SymbolKind::ResetStart => {
                self.stack.push(StackRecord::RestoreMatchStart { previous: self.match_start });
                self.match_start = self.position;
                self.advance_past(sym_id)
            }
            SymbolKind::Verb(verb) => self.dispatch_verb(*verb, sym_id),
            SymbolKind::Group(gid) => self.dispatch_group_entry(sym_id, *gid),
            SymbolKind::IsPrime { accept_zero, source } => {
                let n = self.predicate_operand(*source);
                let ok = n == 1 || (*accept_zero && n == 0) || primality::is_prime(n);
                if ok {
                    self.advance_past(sym_id)
                } else {
                    Cursor::Fail
                }
            }
            SymbolKind::IsPowerOf2 { zero_counts, source } => {
                let n = self.predicate_operand(*source);
                let ok = (*zero_counts && n == 0) || primality::is_power_of_two(n);
                if ok {
                    self.advance_past(sym_id)
                } else {
                    Cursor::Fail
                }
            }
        }
    }

    fn predicate_operand(&self, source: PredicateSource) -> u64 {
        match source {
            PredicateSource::SpaceLeft => self.input.len().saturating_sub(self.position),
            PredicateSource::Lookinto { backref_index } => {
                self.captures.read(backref_index).length.unwrap_or(0)
            }
        }
    }

    fn dispatch_verb(&mut self, verb: crate::ir::VerbKind, sym_id: SymbolId) -> Cursor {
        use crate::ir::VerbKind::*;
        if self.config.debug_trace.logs_groups() {
            debug!("verb {:?} at {}", verb, self.position);
        }
        match verb {
            Accept => Cursor::Accept,
            Fail => Cursor::Fail,
            Commit => {
                self.stack.cut_to(0);
                self.no_retry = true;
                self.advance_past(sym_id)
            }
            Prune => {
                self.stack.cut_to(0);
                self.advance_past(sym_id)
            }
            Skip => {
                self.stack.cut_to(0);
                self.skip_to = Some(self.position);
                self.advance_past(sym_id)
            }
            Then => {
                let mark = self.group_stack.last().map(|f| f.entry_stack_mark).unwrap_or(0);
                self.stack.cut_to(mark);
                Cursor::Fail
            }
        }
    }

    fn advance_past(&self, sym_id: SymbolId) -> Cursor {
        match self.pattern.next_sibling(sym_id) {
            Some(next) => Cursor::Symbol(next),
            None => Cursor::EndOfAlternative,
        }
    }

    // ---- simple (non-group) repetition protocol, §4.E ----------------------

    fn unit_len(&self, sym: &Symbol) -> Option<u64> {
        match &sym.kind {
            SymbolKind::Character { .. }
            | SymbolKind::CharacterClass { .. }
            | SymbolKind::Digit { .. }
            | SymbolKind::Space { .. }
            | SymbolKind::WordChar { .. } => Some(1),
            SymbolKind::Str { bytes } => Some(bytes.len() as u64),
            SymbolKind::Backref { index } => self.backref_length(*index, sym.quant.min),
            _ => None,
        }
    }

    /// Length contributed by one repetend of a backreference: the
    /// captured length, or (for a non-participating group) 0 when ECMA
    /// NPCG emulation is on or no repetitions are required, else "cannot
    /// proceed."
    fn backref_length(&self, index: u32, min_count: u32) -> Option<u64> {
        match self.captures.read(index).length {
            Some(len) => Some(len),
            None => {
                if self.config.emulate_ecma_npcgs || min_count == 0 {
                    Some(0)
                } else {
                    None
                }
            }
        }
    }

    fn unit_matches_at(&self, sym: &Symbol, p: u64) -> bool {
        match &sym.kind {
            SymbolKind::Character { any, byte } => *any || self.input.byte_at(p) == Some(*byte),
            SymbolKind::CharacterClass { set, negate } => match self.input.byte_at(p) {
                Some(b) => set.contains(b as usize) != *negate,
                None => false,
            },
            SymbolKind::Digit { negate } => match self.input.byte_at(p) {
                Some(b) => crate::ir::is_digit_byte(b) != *negate,
                None => false,
            },
            SymbolKind::Space { negate } => match self.input.byte_at(p) {
                Some(b) => crate::ir::is_space_byte(b) != *negate,
                None => false,
            },
            SymbolKind::WordChar { negate } => match self.input.byte_at(p) {
                Some(b) => crate::ir::is_word_byte(b) != *negate,
                None => false,
            },
            _ => unreachable!("unit_matches_at only handles single-byte symbol kinds"),
        }
    }

    /// Whether a whole `multiple`-unit repetend starting at `pos` is
    /// content-valid. Character classes are checked byte by byte (string
    /// mode varies per position); literals and backreferences are checked
    /// as a single run.
    fn unit_window_matches(&self, sym: &Symbol, pos: u64, multiple: u64) -> bool {
        match &sym.kind {
            SymbolKind::Str { bytes } => {
                (0..bytes.len() as u64).all(|i| self.input.byte_at(pos + i) == Some(bytes[i as usize]))
            }
            SymbolKind::Backref { index } => match self.captures.read(*index).length {
                Some(len) => {
                    len == 0
                        || (pos + len <= self.input.len() && self.input.units_equal(self.captures.read(*index).offset, pos, len))
                }
                None => true,
            },
            _ => pos + multiple <= self.input.len() && self.unit_matches_at(sym, pos),
        }
    }

    fn longest_verified_run(&self, sym_id: SymbolId, start: u64, multiple: u64, cap: u64) -> u64 {
        let sym = self.pattern.symbol(sym_id);
        let mut n = 0u64;
        while n < cap {
            if !self.unit_window_matches(sym, start + multiple * n, multiple) {
                break;
            }
            n += 1;
        }
        n
    }

    fn repeat_simple(&mut self, sym_id: SymbolId) -> Cursor {
        let sym = self.pattern.symbol(sym_id);
        let quant = sym.quant;
        let multiple = match self.unit_len(sym) {
            Some(m) => m,
            None => return Cursor::Fail,
        };
        if multiple == 0 {
            // A zero-length repetend (an empty backreference) is skipped
            // outright: no choice point, since every rep contributes
            // nothing to distinguish from any other rep count.
            return self.advance_past(sym_id);
        }
        let start = self.position;
        if quant.lazy {
            let need = quant.min as u64;
            if self.longest_verified_run(sym_id, start, multiple, need) < need {
                return Cursor::Fail;
            }
            self.position = start + multiple * need;
            if !quant.possessive && (quant.max == UNBOUNDED || need < quant.max as u64) {
                self.stack.push(StackRecord::Resume {
                    position: self.position,
                    action: ResumeAction::SimpleRepeatMore { symbol: sym_id, start, count: need, multiple },
                });
            }
            self.advance_past(sym_id)
        } else {
            if !quant.possessive && self.config.optimization_level.allows_runtime_basic() {
                if let Some(cursor) = self.try_runtime_tail_shortcut(sym_id, start, multiple, quant) {
                    return cursor;
                }
            }
            let space_units = self.input.len().saturating_sub(start) / multiple;
            let cap = if quant.max == UNBOUNDED { space_units } else { space_units.min(quant.max as u64) };
            let count = self.longest_verified_run(sym_id, start, multiple, cap);
            if count < quant.min as u64 {
                return Cursor::Fail;
            }
            self.position = start + multiple * count;
            if !quant.possessive && count > quant.min as u64 {
                self.stack.push(StackRecord::Resume {
                    position: self.position,
                    action: ResumeAction::SimpleRepeatFewer { symbol: sym_id, start, count: count - 1, multiple },
                });
            }
            self.advance_past(sym_id)
        }
    }

    /// §4.G rules 1-2: when the symbols after this repeat pin its count down
    /// to a single arithmetic solution, compute it directly instead of
    /// pushing a `SimpleRepeatFewer` chain the backtracker would otherwise
    /// have to walk one count at a time. Returns `None` to fall back to the
    /// ordinary loop when no recognized tail shape follows.
    fn try_runtime_tail_shortcut(
        &mut self,
        sym_id: SymbolId,
        start: u64,
        multiple: u64,
        quant: crate::ir::Quantifier,
    ) -> Option<Cursor> {
        let shape = runtime_opt::classify_tail(self.pattern, self.pattern.next_sibling(sym_id))?;
        let space_left = self.input.len().saturating_sub(start);
        let count = runtime_opt::solve_count(shape, space_left, multiple, |idx| self.captures.read(idx).length);
        let count = match count {
            Some(c) => c,
            // The tail demands an exact count and arithmetic found none: no
            // other count could satisfy it either, so this alternative is
            // dead regardless of what the naive loop would have tried.
            None => return Some(Cursor::Fail),
        };
        if count < quant.min as u64 || (quant.max != UNBOUNDED && count > quant.max as u64) {
            return Some(Cursor::Fail);
        }
        let verified = if self.input.is_numeric() {
            count
        } else {
            self.longest_verified_run(sym_id, start, multiple, count)
        };
        if verified != count {
            return Some(Cursor::Fail);
        }
        self.position = start + multiple * count;
        // The tail pins this to the one count that can possibly work, so
        // unlike the general case there's nothing to push for backtracking.
        Some(self.advance_past(sym_id))
    }

    fn resume_simple_repeat_more(&mut self, sym_id: SymbolId, start: u64, count: u64, multiple: u64) -> Cursor {
        let sym = self.pattern.symbol(sym_id);
        let quant = sym.quant;
        if !self.unit_window_matches(sym, self.position, multiple) {
            return Cursor::Fail;
        }
        let new_count = count + 1;
        self.position += multiple;
        if !quant.possessive && (quant.max == UNBOUNDED || new_count < quant.max as u64) {
            self.stack.push(StackRecord::Resume {
                position: self.position,
                action: ResumeAction::SimpleRepeatMore { symbol: sym_id, start, count: new_count, multiple },
            });
        }
        self.advance_past(sym_id)
    }

    fn resume_simple_repeat_fewer(&mut self, sym_id: SymbolId, start: u64, count: u64, multiple: u64) -> Cursor {
        let quant = self.pattern.symbol(sym_id).quant;
        if count > quant.min as u64 {
            self.stack.push(StackRecord::Resume {
                position: self.position,
                action: ResumeAction::SimpleRepeatFewer { symbol: sym_id, start, count: count - 1, multiple },
            });
        }
        self.advance_past(sym_id)
    }

    // ---- group entry/exit ---------------------------------------------------

    fn dispatch_group_entry(&mut self, sym_id: SymbolId, gid: GroupId) -> Cursor {
        if self.input.is_numeric()
            && self.config.optimization_level.allows_static()
            && self.pattern.group(gid).const_length_eligible
        {
            if let Some(cursor) = self.try_const_length(sym_id, gid) {
                return cursor;
            }
        }
        let group_type = self.pattern.group(gid).group_type;
        match group_type {
            GroupType::Conditional => self.enter_conditional(sym_id, gid),
            GroupType::LookaroundConditional => self.enter_lookaround_conditional(sym_id, gid),
            t if t.is_lookaround() => self.enter_lookaround(sym_id, gid),
            _ => {
                let multi_alt = self.pattern.group(gid).alternatives.len() > 1;
                self.begin_group_frame(gid, 0, multi_alt)
            }
        }
    }

    fn begin_group_frame(&mut self, gid: GroupId, alt_index: u32, push_choice: bool) -> Cursor {
        if self.config.debug_trace.logs_groups() {
            debug!("enter group {:?} alt {} at {}", gid, alt_index, self.position);
        }
        let frame = GroupStackFrame {
            group: gid,
            position: self.position,
            loop_count: 1,
            num_captured: 0,
            alt_index,
            entry_stack_mark: 0,
            loop_entry_mark: 0,
        };
        self.group_stack.push(frame);
        self.stack.push(StackRecord::UndoGroupPush);
        self.group_stack.last_mut().unwrap().loop_entry_mark = self.stack.len();
        if push_choice && (alt_index as usize + 1) < self.pattern.group(gid).alternatives.len() {
            self.stack.push(StackRecord::Resume {
                position: self.position,
                action: ResumeAction::NextAlternative { group: gid, alt_index: alt_index + 1 },
            });
        }
        let mark = self.stack.len();
        self.group_stack.last_mut().unwrap().entry_stack_mark = mark;
        self.first_symbol_of(gid, alt_index)
    }

    fn retry_alternative(&mut self, gid: GroupId, alt_index: u32) -> Cursor {
        self.group_stack.last_mut().unwrap().alt_index = alt_index;
        if (alt_index as usize + 1) < self.pattern.group(gid).alternatives.len() {
            self.stack.push(StackRecord::Resume {
                position: self.position,
                action: ResumeAction::NextAlternative { group: gid, alt_index: alt_index + 1 },
            });
        }
        let mark = self.stack.len();
        self.group_stack.last_mut().unwrap().entry_stack_mark = mark;
        self.first_symbol_of(gid, alt_index)
    }

    fn first_symbol_of(&self, gid: GroupId, alt_index: u32) -> Cursor {
        match self.pattern.group(gid).alternatives[alt_index as usize].first() {
            Some(&s) => Cursor::Symbol(s),
            None => Cursor::EndOfAlternative,
        }
    }

    fn begin_loop_iteration(&mut self, gid: GroupId, new_count: u32) -> Cursor {
        if !self.config.enable_persistent_backrefs {
            let n = self.group_stack.last().unwrap().num_captured;
            for _ in 0..n {
                if let Some(idx) = self.capture_stack.pop() {
                    let previous = self.captures.read(idx);
                    self.stack.push(StackRecord::RestoreCapture { index: idx, previous });
                    self.captures.write(idx, CaptureValue::non_participating());
                }
            }
        }
        {
            let frame = self.group_stack.last_mut().unwrap();
            frame.loop_count = new_count;
            frame.position = self.position;
            frame.num_captured = 0;
            frame.alt_index = 0;
        }
        if self.pattern.group(gid).alternatives.len() > 1 {
            self.stack.push(StackRecord::Resume {
                position: self.position,
                action: ResumeAction::NextAlternative { group: gid, alt_index: 1 },
            });
        }
        let mark = self.stack.len();
        self.group_stack.last_mut().unwrap().entry_stack_mark = mark;
        self.first_symbol_of(gid, 0)
    }

    fn close_current_group(&mut self) -> Cursor {
        let frame = *self.group_stack.last().expect("close_current_group with an empty group stack");
        match self.pattern.group(frame.group).group_type {
            GroupType::Atomic => {
                self.stack.cut_to(frame.entry_stack_mark);
                self.finalize_close(frame)
            }
            _ => self.close_ordinary(frame),
        }
    }

    fn close_ordinary(&mut self, frame: GroupStackFrame) -> Cursor {
        let quant = self.pattern.symbol(self.pattern.group(frame.group).self_symbol).quant;
        let zero_length = self.position == frame.position;
        let maxed_by_empty = zero_length
            && frame.loop_count >= quant.min
            && (quant.max == UNBOUNDED || self.config.no_empty_optional);
        let at_max = quant.max != UNBOUNDED && frame.loop_count >= quant.max;

        if quant.lazy {
            if frame.loop_count < quant.min {
                return self.begin_loop_iteration(frame.group, frame.loop_count + 1);
            }
            // Pushed regardless of possessiveness: the group still needs
            // ordinary internal backtracking to settle on its own greedy
            // extent (an inner alternative may need reconsidering when a
            // later iteration fails outright). `finalize_close` is what
            // makes a possessive quantifier atomic — it cuts this (and
            // every other choice point the repetition accumulated) away
            // the moment the count is settled, so nothing downstream ever
            // sees it.
            if !at_max && !maxed_by_empty {
                self.stack.push(StackRecord::Resume {
                    position: self.position,
                    action: ResumeAction::LoopRepeatMore { group: frame.group, count: frame.loop_count },
                });
            }
            self.finalize_close(frame)
        } else {
            if !at_max && !maxed_by_empty {
                self.stack.push(StackRecord::Resume {
                    position: self.position,
                    action: ResumeAction::LoopRepeatFewer {
                        group: frame.group,
                        count: frame.loop_count,
                        capture_start: frame.position,
                    },
                });
                return self.begin_loop_iteration(frame.group, frame.loop_count + 1);
            }
            self.finalize_close(frame)
        }
    }

    fn resume_loop_repeat_fewer(&mut self, count: u32, capture_start: u64) -> Cursor {
        let frame = {
            let frame = self.group_stack.last_mut().expect("loop-repeat-fewer with no open group");
            frame.loop_count = count;
            frame.position = capture_start;
            *frame
        };
        self.finalize_close(frame)
    }

    fn resume_loop_repeat_more(&mut self, gid: GroupId, count: u32) -> Cursor {
        self.begin_loop_iteration(gid, count + 1)
    }

    fn finalize_close(&mut self, frame: GroupStackFrame) -> Cursor {
        let group = self.pattern.group(frame.group);
        let backref_index = group.backref_index;
        let self_symbol = group.self_symbol;
        if self.config.debug_trace.logs_groups() {
            debug!("exit group {:?} after {} iterations, at {}", frame.group, frame.loop_count, self.position);
        }
        if self.pattern.symbol(self_symbol).quant.possessive {
            // The repetition just settled on its final count (whether by
            // hitting max/zero-length or by an internal LoopRepeatFewer
            // giving back iterations). Cut every choice point any
            // iteration pushed — its own alternative retries included —
            // back to the group's very first entry, mirroring the
            // `GroupType::Atomic` cut in `close_current_group`. A
            // possessive quantifier is an atomic group around its own
            // repeat loop: once committed, not even iteration 1's
            // alternative choice survives.
            self.stack.cut_to(frame.loop_entry_mark);
        }
        self.group_stack.pop();
        self.stack.push(StackRecord::UndoGroupPop { frame });
        if let Some(parent) = self.group_stack.last_mut() {
            parent.num_captured += frame.num_captured;
        }
        if let Some(idx) = backref_index {
            self.write_capture(idx, frame.position, self.position - frame.position);
        }
        if self.group_stack.is_empty() {
            return Cursor::Accept;
        }
        match self.pattern.next_sibling(self_symbol) {
            Some(next) => Cursor::Symbol(next),
            None => Cursor::EndOfAlternative,
        }
    }

    fn write_capture(&mut self, index: u32, offset: u64, length: u64) {
        let previous = self.captures.read(index);
        self.stack.push(StackRecord::RestoreCapture { index, previous });
        self.captures.write(index, CaptureValue::of(offset, length));
        self.capture_stack.push(index);
        if let Some(frame) = self.group_stack.last_mut() {
            frame.num_captured += 1;
        }
    }

    // ---- conditionals and lookaround ----------------------------------------

    fn enter_conditional(&mut self, sym_id: SymbolId, gid: GroupId) -> Cursor {
        let backref = self.pattern.group(gid).condition_backref.expect("conditional group without a tested backref");
        let condition = self.captures.read(backref).length.is_some();
        self.enter_branch(sym_id, gid, condition)
    }

    fn enter_lookaround_conditional(&mut self, sym_id: SymbolId, gid: GroupId) -> Cursor {
        let embedded = self
            .pattern
            .group(gid)
            .embedded_lookaround
            .expect("lookaround-conditional without an embedded assertion");
        let negative = self.pattern.group(embedded).group_type.is_negative();
        let matched = self.match_subgroup_fully(embedded, !negative);
        self.enter_branch(sym_id, gid, matched != negative)
    }

    fn enter_branch(&mut self, sym_id: SymbolId, gid: GroupId, condition: bool) -> Cursor {
        if condition {
            self.begin_group_frame(gid, 0, false)
        } else if self.pattern.group(gid).alternatives.len() > 1 {
            self.begin_group_frame(gid, 1, false)
        } else {
            self.advance_past(sym_id)
        }
    }

    fn enter_lookaround(&mut self, sym_id: SymbolId, gid: GroupId) -> Cursor {
        let negative = self.pattern.group(gid).group_type.is_negative();
        let matched = self.match_subgroup_fully(gid, !negative);
        if matched != negative {
            self.advance_past(sym_id)
        } else {
            Cursor::Fail
        }
    }

    /// Runs `gid`'s alternatives to completion in an isolated scope: its
    /// own matching stack and group stack, so none of its internal choice
    /// points leak back into the enclosing attempt. This gives every
    /// lookaround variant atomic, no-backtrack-from-outside semantics.
    /// That's correct for plain (non-molecular) lookahead/lookinto, but a
    /// deliberate simplification for the molecular variants, which are
    /// documented as *not* atomic — backtracking should be able to re-enter
    /// the body and try a different internal alternative. Implementing that
    /// would mean keeping the lookaround's choice points live on the outer
    /// stack instead of an isolated one; not done here (see DESIGN.md).
    /// `Lookinto`'s "scoped against a named capture rather than the current
    /// input tail" semantics (§6 glossary) are likewise only honored by the
    /// primality/power-of-two static rewrite, which reads the named
    /// capture's length directly — the general case still probes the live
    /// cursor like `Lookahead`.
    fn match_subgroup_fully(&mut self, gid: GroupId, keep_captures_on_success: bool) -> bool {
        let saved_position = self.position;
        let saved_captures = self.captures.clone();
        let saved_capture_stack_len = self.capture_stack.len();
        let outer_stack = std::mem::replace(&mut self.stack, MatchingStack::new());
        let outer_group_stack = std::mem::take(&mut self.group_stack);

        let matched = self.run_group_to_completion(gid);

        self.stack = outer_stack;
        self.group_stack = outer_group_stack;
        self.capture_stack.truncate(saved_capture_stack_len);
        self.position = saved_position;
        if !(matched && keep_captures_on_success) {
            self.captures = saved_captures;
        }
        matched
    }

    // ---- §4.F rule 1: constant-length group arithmetic shortcut -----------

    fn try_const_length(&mut self, sym_id: SymbolId, gid: GroupId) -> Option<Cursor> {
        let group = self.pattern.group(gid);
        if group.alternatives.len() != 1 {
            return None;
        }
        let per_iter = self.const_alt_length(&group.alternatives[0])?;
        let quant = self.pattern.symbol(sym_id).quant;
        let start = self.position;
        let backref_index = group.backref_index;

        if per_iter == 0 {
            if let Some(idx) = backref_index {
                self.write_capture(idx, start, 0);
            }
            return Some(self.advance_past(sym_id));
        }

        let cursor = if quant.lazy {
            let need = quant.min as u64;
            if start + per_iter * need > self.input.len() {
                return Some(Cursor::Fail);
            }
            self.position = start + per_iter * need;
            if !quant.possessive && (quant.max == UNBOUNDED || need < quant.max as u64) {
                self.stack.push(StackRecord::Resume {
                    position: self.position,
                    action: ResumeAction::SimpleRepeatMore { symbol: sym_id, start, count: need, multiple: per_iter },
                });
            }
            self.advance_past(sym_id)
        } else {
            let space_units = self.input.len().saturating_sub(start) / per_iter;
            let cap = if quant.max == UNBOUNDED { space_units } else { space_units.min(quant.max as u64) };
            if cap < quant.min as u64 {
                return Some(Cursor::Fail);
            }
            self.position = start + per_iter * cap;
            if !quant.possessive && cap > quant.min as u64 {
                self.stack.push(StackRecord::Resume {
                    position: self.position,
                    action: ResumeAction::SimpleRepeatFewer { symbol: sym_id, start, count: cap - 1, multiple: per_iter },
                });
            }
            self.advance_past(sym_id)
        };

        if let Some(idx) = backref_index {
            self.write_capture(idx, start, self.position - start);
        }
        Some(cursor)
    }

    fn const_alt_length(&self, alt: &[SymbolId]) -> Option<u64> {
        let mut total = 0u64;
        for &s in alt {
            let sym = self.pattern.symbol(s);
            if !sym.quant.is_fixed() {
                return None;
            }
            let unit = match &sym.kind {
                SymbolKind::Character { .. } => 1,
                SymbolKind::Str { bytes } => bytes.len() as u64,
                SymbolKind::Backref { index } => self.captures.read(*index).length?,
                _ => return None,
            };
            total += unit * sym.quant.min as u64;
        }
        Some(total)
    }

    // ---- backtrack unwind ---------------------------------------------------

    fn unwind(&mut self) -> Option<Cursor> {
        loop {
            match self.stack.pop()? {
                StackRecord::Resume { position, action } => {
                    if self.config.debug_trace.logs_symbols() {
                        trace!("backtrack to {} via {:?}", position, action);
                    }
                    self.position = position;
                    let cursor = match action {
                        ResumeAction::NextAlternative { group, alt_index } => self.retry_alternative(group, alt_index),
                        ResumeAction::LoopRepeatFewer { count, capture_start, .. } => {
                            self.resume_loop_repeat_fewer(count, capture_start)
                        }
                        ResumeAction::LoopRepeatMore { group, count } => self.resume_loop_repeat_more(group, count),
                        ResumeAction::SimpleRepeatFewer { symbol, start, count, multiple } => {
                            self.resume_simple_repeat_fewer(symbol, start, count, multiple)
                        }
                        ResumeAction::SimpleRepeatMore { symbol, start, count, multiple } => {
                            self.resume_simple_repeat_more(symbol, start, count, multiple)
                        }
                    };
                    return Some(cursor);
                }
                StackRecord::RestoreCapture { index, previous } => self.captures.write(index, previous),
                StackRecord::UndoGroupPush => {
                    self.group_stack.pop();
                }
                StackRecord::UndoGroupPop { frame } => self.group_stack.push(frame),
                StackRecord::RestoreMatchStart { previous } => self.match_start = previous,
            }
        }
    }
}

/// Runs the outer "try every start position" loop (spec §4.E), honoring
/// `Pattern::anchored` and the `(*COMMIT)`/`(*SKIP)` no-retry signals.
///
/// `return_capture_index` selects what span is reported on success: `0` is
/// the whole match, `N >= 1` is the `N`th user capture (`\N`). A capture
/// that never participated reports offset/length `0` even though `matched`
/// is still `true` — the overall match succeeded, that particular group
/// just never ran.
pub fn run_match<M: InputModel + Clone>(
    pattern: &Pattern,
    config: &Config,
    input: M,
    return_capture_index: u32,
) -> MatchOutcome {
    let last_start = input.len();
    let mut matcher = Matcher::new(pattern, config, input);
    let mut start = 0u64;
    loop {
        if matcher.try_whole_pattern(start) {
            let (offset, length) = if return_capture_index == 0 {
                (matcher.match_start, matcher.position - matcher.match_start)
            } else {
                let value = matcher.captures.read(return_capture_index - 1);
                match value.length {
                    Some(len) => (value.offset, len),
                    None => (0, 0),
                }
            };
            return MatchOutcome { matched: true, start: offset, length, retry_at_next_start: false };
        }
        if matcher.no_retry || pattern.anchored || start >= last_start {
            return MatchOutcome {
                matched: false,
                start: 0,
                length: 0,
                retry_at_next_start: !matcher.no_retry,
            };
        }
        start = match matcher.skip_to.take() {
            Some(resume) => resume.max(start + 1).min(last_start),
            None => match pattern.required_leading_byte {
                // If the required byte never occurs again, no later start
                // position can match either; jump straight to the end.
                Some(b) => matcher.input.find_from(b, start + 1).unwrap_or(last_start).min(last_start),
                None => (start + 1).min(last_start),
            },
        };
    }
}
