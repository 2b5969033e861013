// Recursive-descent parser: pattern text -> `Pattern` IR (component A).
//
// Grounded on `original_source/parser.cpp` for the exact shape of the
// grammar (group syntaxes, verb spellings, backreference validation) and
// on the teacher's module layout (a single parser owning a flat arena,
// rather than building an intermediate AST that gets lowered separately).
// Unlike `mbrubeck-fancy-regex`'s parser this one never emits a `Expr`
// tree: symbols and groups are pushed directly into the arena as they're
// recognized, exactly as the source's recursive-descent parser populates
// its symbol table while it reads.

use bit_set::BitSet;

use crate::config::Config;
use crate::error::ParseError;
use crate::ir::{
    Group, GroupId, GroupType, Pattern, Quantifier, Symbol, SymbolId, SymbolKind, VerbKind, UNBOUNDED,
};

pub fn parse(source: &str, config: &Config) -> Result<Pattern, ParseError> {
    let mut p = Parser {
        bytes: source.as_bytes(),
        pos: 0,
        config,
        symbols: Vec::new(),
        groups: Vec::new(),
        next_capture: 0,
        depth: 0,
        max_depth: 0,
    };

    let root = GroupId(0);
    p.groups.push(Group {
        id: root,
        group_type: GroupType::NonCapturing,
        alternatives: Vec::new(),
        backref_index: None,
        condition_backref: None,
        embedded_lookaround: None,
        parent: None,
        self_symbol: SymbolId(0),
        const_length_eligible: false,
    });
    p.depth = 1;
    p.max_depth = 1;
    p.parse_group_body_into(root)?;
    if p.pos != p.bytes.len() {
        return Err(p.err("unexpected ')' with no matching '('"));
    }

    let anchored = p.compute_anchored(root);
    let mut pattern = Pattern {
        symbols: p.symbols,
        groups: p.groups,
        root,
        num_captures: p.next_capture,
        max_group_depth: p.max_depth,
        anchored,
        required_leading_byte: None,
        source: source.to_string(),
    };
    pattern.required_leading_byte = crate::literal_scan::required_leading_byte(&pattern);
    Ok(pattern)
}

enum AtomResult {
    Symbol(SymbolId),
    Group(SymbolId, GroupId),
}

enum ClassEscape {
    Literal(u8),
    BuiltinSet(Vec<u8>),
}

struct Parser<'c> {
    bytes: &'c [u8],
    pos: usize,
    config: &'c Config,
    symbols: Vec<Symbol>,
    groups: Vec<Group>,
    next_capture: u32,
    depth: u32,
    max_depth: u32,
}

impl<'c> Parser<'c> {
    // ---- lexical primitives -------------------------------------------

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek();
        if b.is_some() {
            self.pos += 1;
        }
        b
    }

    fn eat(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, b: u8) -> Result<(), ParseError> {
        if self.eat(b) {
            Ok(())
        } else {
            Err(self.err(format!("expected '{}'", b as char)))
        }
    }

    fn err(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(self.pos, message)
    }

    fn err_at(&self, offset: usize, message: impl Into<String>) -> ParseError {
        ParseError::new(offset, message)
    }

    fn parse_u32(&mut self) -> Result<u32, ParseError> {
        let start = self.pos;
        let mut n: u32 = 0;
        let mut any = false;
        while let Some(b) = self.peek() {
            if b.is_ascii_digit() {
                any = true;
                n = n.saturating_mul(10).saturating_add((b - b'0') as u32);
                self.bump();
            } else {
                break;
            }
        }
        if !any {
            return Err(self.err_at(start, "expected a number"));
        }
        Ok(n)
    }

    /// `config.free_spacing_mode`: unescaped whitespace and `#`-to-end-of-line
    /// comments are insignificant outside character classes.
    fn skip_free_spacing(&mut self) {
        if !self.config.free_spacing_mode {
            return;
        }
        loop {
            match self.peek() {
                Some(b) if b.is_ascii_whitespace() => {
                    self.bump();
                }
                Some(b'#') => {
                    while self.peek().map(|b| b != b'\n').unwrap_or(false) {
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    // ---- symbol/group arena helpers ------------------------------------

    fn push_symbol(&mut self, kind: SymbolKind, parent: GroupId, alt_index: u32, slot_index: u32) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(Symbol { kind, quant: Quantifier::once(), parent, alt_index, slot_index });
        id
    }

    // ---- top-level structure: alternatives and sequences ---------------

    fn parse_group_body_into(&mut self, gid: GroupId) -> Result<(), ParseError> {
        let mut alternatives = Vec::new();
        loop {
            let alt_index = alternatives.len() as u32;
            let seq = self.parse_alternative(gid, alt_index)?;
            alternatives.push(seq);
            if self.peek() == Some(b'|') {
                self.bump();
                continue;
            }
            break;
        }
        self.groups[gid.0 as usize].alternatives = alternatives;
        Ok(())
    }

    /// `(?|...)`: every alternative's capturing groups reuse the same
    /// index sequence, so `(?|(a)|(b))\1` binds `\1` to whichever
    /// alternative matched.
    fn parse_group_body_branch_reset(&mut self, gid: GroupId) -> Result<(), ParseError> {
        let saved_next_capture = self.next_capture;
        let mut max_next = saved_next_capture;
        let mut alternatives = Vec::new();
        loop {
            self.next_capture = saved_next_capture;
            let alt_index = alternatives.len() as u32;
            let seq = self.parse_alternative(gid, alt_index)?;
            alternatives.push(seq);
            max_next = max_next.max(self.next_capture);
            if self.peek() == Some(b'|') {
                self.bump();
                continue;
            }
            break;
        }
        self.next_capture = max_next;
        self.groups[gid.0 as usize].alternatives = alternatives;
        Ok(())
    }

    fn parse_alternative(&mut self, gid: GroupId, alt_index: u32) -> Result<Vec<SymbolId>, ParseError> {
        let mut seq = Vec::new();
        loop {
            self.skip_free_spacing();
            match self.peek() {
                None | Some(b'|') | Some(b')') => break,
                _ => {
                    let ids = self.parse_term(gid, alt_index, seq.len() as u32)?;
                    seq.extend(ids);
                }
            }
        }
        let seq = self.coalesce_literal_run(seq);
        for (slot, &sid) in seq.iter().enumerate() {
            let sym = &mut self.symbols[sid.0 as usize];
            sym.parent = gid;
            sym.alt_index = alt_index;
            sym.slot_index = slot as u32;
        }
        Ok(seq)
    }

    /// §4.B: a run of ≥2 distinct, unquantified literal bytes collapses
    /// into a single `Str` symbol.
    fn coalesce_literal_run(&mut self, seq: Vec<SymbolId>) -> Vec<SymbolId> {
        let mut out = Vec::with_capacity(seq.len());
        let mut i = 0;
        while i < seq.len() {
            if let Some(byte) = self.plain_literal_byte(seq[i]) {
                let mut j = i + 1;
                let mut bytes = vec![byte];
                while j < seq.len() {
                    match self.plain_literal_byte(seq[j]) {
                        Some(b) => {
                            bytes.push(b);
                            j += 1;
                        }
                        None => break,
                    }
                }
                if bytes.len() >= 2 {
                    let id = SymbolId(self.symbols.len() as u32);
                    self.symbols.push(Symbol {
                        kind: SymbolKind::Str { bytes },
                        quant: Quantifier::once(),
                        parent: GroupId(0),
                        alt_index: 0,
                        slot_index: 0,
                    });
                    out.push(id);
                    i = j;
                    continue;
                }
            }
            out.push(seq[i]);
            i += 1;
        }
        out
    }

    fn plain_literal_byte(&self, id: SymbolId) -> Option<u8> {
        let sym = &self.symbols[id.0 as usize];
        if sym.quant.min == 1 && sym.quant.max == 1 && !sym.quant.lazy && !sym.quant.possessive {
            if let SymbolKind::Character { any: false, byte } = sym.kind {
                return Some(byte);
            }
        }
        None
    }

    fn parse_term(&mut self, gid: GroupId, alt_index: u32, slot_index: u32) -> Result<Vec<SymbolId>, ParseError> {
        let start = self.pos;
        match self.parse_atom(gid, alt_index, slot_index)? {
            AtomResult::Symbol(sym_id) => {
                let quant = self.parse_quantifier_suffix()?;
                self.apply_quantifier(sym_id, quant, start)?;
                Ok(vec![sym_id])
            }
            AtomResult::Group(sym_id, inner_gid) => {
                let quant = self.parse_quantifier_suffix()?;
                let group_type = self.groups[inner_gid.0 as usize].group_type;
                if (group_type.is_lookaround() || group_type == GroupType::Atomic) && quant.is_some() {
                    // Lookaround/atomic quantifier fixup: wrap in a plain
                    // non-capturing group carrying the quantifier, and
                    // force the inner group back to {1,1} (it always was
                    // one, this just makes the rewrite visible).
                    let q = quant.unwrap();
                    let wrapper_gid = GroupId(self.groups.len() as u32);
                    self.groups.push(Group {
                        id: wrapper_gid,
                        group_type: GroupType::NonCapturing,
                        alternatives: vec![vec![sym_id]],
                        backref_index: None,
                        condition_backref: None,
                        embedded_lookaround: None,
                        parent: Some(gid),
                        self_symbol: SymbolId(0),
                        const_length_eligible: false,
                    });
                    let wrapper_sym = SymbolId(self.symbols.len() as u32);
                    self.symbols.push(Symbol {
                        kind: SymbolKind::Group(wrapper_gid),
                        quant: q,
                        parent: gid,
                        alt_index,
                        slot_index,
                    });
                    self.groups[wrapper_gid.0 as usize].self_symbol = wrapper_sym;
                    let inner_sym = &mut self.symbols[sym_id.0 as usize];
                    inner_sym.parent = wrapper_gid;
                    inner_sym.alt_index = 0;
                    inner_sym.slot_index = 0;
                    Ok(vec![wrapper_sym])
                } else {
                    self.apply_quantifier(sym_id, quant, start)?;
                    Ok(vec![sym_id])
                }
            }
        }
    }

    fn apply_quantifier(&mut self, sym_id: SymbolId, quant: Option<Quantifier>, start: usize) -> Result<(), ParseError> {
        let q = match quant {
            None => return Ok(()),
            Some(q) => q,
        };
        let sym = &mut self.symbols[sym_id.0 as usize];
        if sym.matches_quantifiers() {
            sym.quant = q;
            return Ok(());
        }
        if !self.config.allow_quantifiers_on_assertions {
            return Err(self.err_at(start, "a zero-width assertion cannot take a quantifier"));
        }
        if q.max == 0 {
            sym.kind = SymbolKind::NoOp;
        }
        sym.quant = Quantifier::once();
        Ok(())
    }

    fn parse_quantifier_suffix(&mut self) -> Result<Option<Quantifier>, ParseError> {
        let (min, max) = match self.peek() {
            Some(b'*') => {
                self.bump();
                (0, UNBOUNDED)
            }
            Some(b'+') => {
                self.bump();
                (1, UNBOUNDED)
            }
            Some(b'?') => {
                self.bump();
                (0, 1)
            }
            Some(b'{') => {
                let save = self.pos;
                self.bump();
                match self.parse_bounded_quantifier() {
                    Ok(mm) => mm,
                    Err(_) => {
                        self.pos = save;
                        return Ok(None);
                    }
                }
            }
            _ => return Ok(None),
        };
        let mut lazy = false;
        let mut possessive = false;
        if self.eat(b'?') {
            lazy = true;
        } else if self.peek() == Some(b'+') && self.config.allow_possessive_quantifiers {
            self.bump();
            possessive = true;
        }
        Ok(Some(Quantifier { min, max, lazy, possessive }))
    }

    fn parse_bounded_quantifier(&mut self) -> Result<(u32, u32), ParseError> {
        let has_min = self.peek().map(|b| b.is_ascii_digit()).unwrap_or(false);
        if !has_min && self.peek() != Some(b',') {
            return Err(self.err("not a bounded quantifier"));
        }
        let min = if has_min { self.parse_u32()? } else { 0 };
        let max = if self.eat(b',') {
            if self.peek().map(|b| b.is_ascii_digit()).unwrap_or(false) {
                self.parse_u32()?
            } else {
                UNBOUNDED
            }
        } else {
            min
        };
        if !self.eat(b'}') {
            return Err(self.err("not a bounded quantifier"));
        }
        if max != UNBOUNDED && min > max {
            return Err(self.err("quantifier minimum exceeds its maximum"));
        }
        Ok((min, max))
    }

    // ---- atoms -----------------------------------------------------------

    fn parse_atom(&mut self, gid: GroupId, alt_index: u32, slot_index: u32) -> Result<AtomResult, ParseError> {
        let c = self.bump().ok_or_else(|| self.err("unexpected end of pattern"))?;
        match c {
            b'.' => Ok(AtomResult::Symbol(self.push_symbol(
                SymbolKind::Character { any: true, byte: 0 },
                gid,
                alt_index,
                slot_index,
            ))),
            b'^' => Ok(AtomResult::Symbol(self.push_symbol(SymbolKind::AnchorStart, gid, alt_index, slot_index))),
            b'$' => Ok(AtomResult::Symbol(self.push_symbol(SymbolKind::AnchorEnd, gid, alt_index, slot_index))),
            b'[' => {
                let kind = self.parse_char_class()?;
                Ok(AtomResult::Symbol(self.push_symbol(kind, gid, alt_index, slot_index)))
            }
            b'(' => {
                if self.config.enable_verbs && self.peek() == Some(b'*') {
                    if let Some(verb) = self.try_parse_verb()? {
                        return Ok(AtomResult::Symbol(self.push_symbol(
                            SymbolKind::Verb(verb),
                            gid,
                            alt_index,
                            slot_index,
                        )));
                    }
                }
                let (sym_id, inner_gid) = self.parse_group_open(gid, alt_index, slot_index)?;
                Ok(AtomResult::Group(sym_id, inner_gid))
            }
            b'\\' => {
                let kind = self.parse_escape()?;
                Ok(AtomResult::Symbol(self.push_symbol(kind, gid, alt_index, slot_index)))
            }
            b => Ok(AtomResult::Symbol(self.push_symbol(
                SymbolKind::Character { any: false, byte: b },
                gid,
                alt_index,
                slot_index,
            ))),
        }
    }

    fn parse_escape(&mut self) -> Result<SymbolKind, ParseError> {
        let start = self.pos - 1;
        let c = self.bump().ok_or_else(|| self.err("pattern ends with a trailing backslash"))?;
        Ok(match c {
            b'd' => SymbolKind::Digit { negate: false },
            b'D' => SymbolKind::Digit { negate: true },
            b's' => SymbolKind::Space { negate: false },
            b'S' => SymbolKind::Space { negate: true },
            b'w' => SymbolKind::WordChar { negate: false },
            b'W' => SymbolKind::WordChar { negate: true },
            b'b' => SymbolKind::WordBoundary { negate: false },
            b'B' => SymbolKind::WordBoundary { negate: true },
            b'K' => {
                if !self.config.allow_reset_start {
                    return Err(self.err_at(start, "\\K is not enabled in this dialect"));
                }
                SymbolKind::ResetStart
            }
            b'n' => SymbolKind::Character { any: false, byte: b'\n' },
            b't' => SymbolKind::Character { any: false, byte: b'\t' },
            b'r' => SymbolKind::Character { any: false, byte: b'\r' },
            b'f' => SymbolKind::Character { any: false, byte: 0x0c },
            b'v' => SymbolKind::Character { any: false, byte: 0x0b },
            b'0' => SymbolKind::Character { any: false, byte: 0 },
            b'1'..=b'9' => {
                self.pos -= 1;
                let n = self.parse_u32()?;
                if n == 0 || n > self.next_capture {
                    return Err(self.err_at(start, "backreference to a capture group that is not open yet"));
                }
                SymbolKind::Backref { index: n - 1 }
            }
            other => SymbolKind::Character { any: false, byte: other },
        })
    }

    fn try_parse_verb(&mut self) -> Result<Option<VerbKind>, ParseError> {
        let save = self.pos;
        self.bump(); // '*'
        let name_start = self.pos;
        while self.peek().map(|b| b.is_ascii_alphabetic()).unwrap_or(false) {
            self.bump();
        }
        let verb = match &self.bytes[name_start..self.pos] {
            b"ACCEPT" => Some(VerbKind::Accept),
            b"FAIL" | b"F" => Some(VerbKind::Fail),
            b"COMMIT" => Some(VerbKind::Commit),
            b"PRUNE" => Some(VerbKind::Prune),
            b"SKIP" => Some(VerbKind::Skip),
            b"THEN" => Some(VerbKind::Then),
            _ => None,
        };
        match verb {
            Some(v) if self.peek() == Some(b')') => {
                self.bump();
                Ok(Some(v))
            }
            _ => {
                self.pos = save;
                Ok(None)
            }
        }
    }

    // ---- character classes -------------------------------------------------

    fn parse_char_class(&mut self) -> Result<SymbolKind, ParseError> {
        let negate = self.eat(b'^');
        let mut set = BitSet::with_capacity(256);
        let mut pending: Option<u8> = None;
        loop {
            match self.peek() {
                None => return Err(self.err("unterminated character class")),
                Some(b']') => {
                    if let Some(b) = pending.take() {
                        set.insert(b as usize);
                    }
                    self.bump();
                    break;
                }
                Some(b'-') if pending.is_some() => {
                    self.bump();
                    if self.peek() == Some(b']') {
                        set.insert(pending.take().unwrap() as usize);
                        set.insert(b'-' as usize);
                        self.bump();
                        break;
                    }
                    let hi = self.parse_class_literal()?;
                    let lo = pending.take().unwrap();
                    if lo > hi {
                        return Err(self.err("character range is out of order"));
                    }
                    for b in lo..=hi {
                        set.insert(b as usize);
                    }
                }
                Some(b'\\') => {
                    if let Some(b) = pending.take() {
                        set.insert(b as usize);
                    }
                    match self.class_escape()? {
                        ClassEscape::Literal(b) => pending = Some(b),
                        ClassEscape::BuiltinSet(bytes) => {
                            for b in bytes {
                                set.insert(b as usize);
                            }
                        }
                    }
                }
                Some(_) => {
                    if let Some(b) = pending.take() {
                        set.insert(b as usize);
                    }
                    pending = Some(self.bump().unwrap());
                }
            }
        }
        if set.is_empty() && !negate && !self.config.allow_empty_character_classes {
            return Err(self.err("empty character classes are not enabled in this dialect"));
        }
        Ok(SymbolKind::CharacterClass { set, negate })
    }

    fn parse_class_literal(&mut self) -> Result<u8, ParseError> {
        match self.peek() {
            Some(b'\\') => match self.class_escape()? {
                ClassEscape::Literal(b) => Ok(b),
                ClassEscape::BuiltinSet(_) => Err(self.err("a class shorthand cannot be a range endpoint")),
            },
            Some(_) => Ok(self.bump().unwrap()),
            None => Err(self.err("unterminated character class")),
        }
    }

    fn class_escape(&mut self) -> Result<ClassEscape, ParseError> {
        self.bump(); // backslash
        let c = self.bump().ok_or_else(|| self.err("trailing backslash in character class"))?;
        Ok(match c {
            b'd' => ClassEscape::BuiltinSet((0u8..=255).filter(|&b| crate::ir::is_digit_byte(b)).collect()),
            b'D' => ClassEscape::BuiltinSet((0u8..=255).filter(|&b| !crate::ir::is_digit_byte(b)).collect()),
            b's' => ClassEscape::BuiltinSet((0u8..=255).filter(|&b| crate::ir::is_space_byte(b)).collect()),
            b'S' => ClassEscape::BuiltinSet((0u8..=255).filter(|&b| !crate::ir::is_space_byte(b)).collect()),
            b'w' => ClassEscape::BuiltinSet((0u8..=255).filter(|&b| crate::ir::is_word_byte(b)).collect()),
            b'W' => ClassEscape::BuiltinSet((0u8..=255).filter(|&b| !crate::ir::is_word_byte(b)).collect()),
            b'n' => ClassEscape::Literal(b'\n'),
            b't' => ClassEscape::Literal(b'\t'),
            b'r' => ClassEscape::Literal(b'\r'),
            b'f' => ClassEscape::Literal(0x0c),
            b'v' => ClassEscape::Literal(0x0b),
            b'b' => ClassEscape::Literal(0x08),
            b'0' => ClassEscape::Literal(0),
            other => ClassEscape::Literal(other),
        })
    }

    // ---- groups -------------------------------------------------------------

    fn parse_group_open(&mut self, enclosing: GroupId, alt_index: u32, slot_index: u32) -> Result<(SymbolId, GroupId), ParseError> {
        if self.peek() != Some(b'?') {
            let idx = self.next_capture;
            self.next_capture += 1;
            return self.finish_group(GroupType::Capturing, Some(idx), None, None, enclosing, alt_index, slot_index, false);
        }
        self.bump(); // '?'
        match self.peek() {
            Some(b':') => {
                self.bump();
                self.finish_group(GroupType::NonCapturing, None, None, None, enclosing, alt_index, slot_index, false)
            }
            Some(b'>') => {
                if !self.config.allow_atomic_groups {
                    return Err(self.err("atomic groups are not enabled in this dialect"));
                }
                self.bump();
                self.finish_group(GroupType::Atomic, None, None, None, enclosing, alt_index, slot_index, false)
            }
            Some(b'=') => {
                self.bump();
                self.finish_group(GroupType::Lookahead, None, None, None, enclosing, alt_index, slot_index, false)
            }
            Some(b'!') => {
                self.bump();
                self.finish_group(GroupType::NegativeLookahead, None, None, None, enclosing, alt_index, slot_index, false)
            }
            Some(b'*') => {
                if !self.config.allow_molecular_lookaround {
                    return Err(self.err("molecular lookahead is not enabled in this dialect"));
                }
                self.bump();
                self.finish_group(GroupType::MolecularLookahead, None, None, None, enclosing, alt_index, slot_index, false)
            }
            Some(b'^') => {
                if !self.config.allow_lookinto {
                    return Err(self.err("lookinto is not enabled in this dialect"));
                }
                self.bump();
                match self.bump() {
                    Some(b'=') => {
                        self.finish_group(GroupType::Lookinto, None, None, None, enclosing, alt_index, slot_index, false)
                    }
                    Some(b'!') => self.finish_group(
                        GroupType::NegativeLookinto,
                        None,
                        None,
                        None,
                        enclosing,
                        alt_index,
                        slot_index,
                        false,
                    ),
                    Some(b'*') => {
                        if !self.config.allow_molecular_lookaround {
                            return Err(self.err("molecular lookinto is not enabled in this dialect"));
                        }
                        self.finish_group(
                            GroupType::MolecularLookinto,
                            None,
                            None,
                            None,
                            enclosing,
                            alt_index,
                            slot_index,
                            false,
                        )
                    }
                    _ => Err(self.err("expected '=', '!', or '*' after '(?^'")),
                }
            }
            Some(b'|') => {
                if !self.config.allow_branch_reset_groups {
                    return Err(self.err("branch-reset groups are not enabled in this dialect"));
                }
                self.bump();
                self.finish_group(GroupType::BranchReset, None, None, None, enclosing, alt_index, slot_index, true)
            }
            Some(b'(') => {
                self.bump();
                if self.peek().map(|b| b.is_ascii_digit()).unwrap_or(false) {
                    if !self.config.allow_conditionals {
                        return Err(self.err("conditional groups are not enabled in this dialect"));
                    }
                    let n = self.parse_u32()?;
                    self.expect(b')')?;
                    self.finish_group(
                        GroupType::Conditional,
                        None,
                        Some(n.saturating_sub(1)),
                        None,
                        enclosing,
                        alt_index,
                        slot_index,
                        false,
                    )
                } else if self.peek() == Some(b'?') {
                    if !self.config.allow_lookaround_conditionals {
                        return Err(self.err("lookaround conditionals are not enabled in this dialect"));
                    }
                    let (_, embedded_gid) = self.parse_group_open(enclosing, alt_index, slot_index)?;
                    self.finish_group(
                        GroupType::LookaroundConditional,
                        None,
                        None,
                        Some(embedded_gid),
                        enclosing,
                        alt_index,
                        slot_index,
                        false,
                    )
                } else {
                    Err(self.err("expected a capture number or a lookaround after '(?('"))
                }
            }
            _ => Err(self.err("unrecognized group syntax after '(?'")),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn finish_group(
        &mut self,
        group_type: GroupType,
        backref_index: Option<u32>,
        condition_backref: Option<u32>,
        embedded_lookaround: Option<GroupId>,
        enclosing: GroupId,
        alt_index: u32,
        slot_index: u32,
        branch_reset: bool,
    ) -> Result<(SymbolId, GroupId), ParseError> {
        let gid = GroupId(self.groups.len() as u32);
        self.groups.push(Group {
            id: gid,
            group_type,
            alternatives: Vec::new(),
            backref_index,
            condition_backref,
            embedded_lookaround,
            parent: Some(enclosing),
            self_symbol: SymbolId(0),
            const_length_eligible: false,
        });
        let sym_id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(Symbol {
            kind: SymbolKind::Group(gid),
            quant: Quantifier::once(),
            parent: enclosing,
            alt_index,
            slot_index,
        });
        self.groups[gid.0 as usize].self_symbol = sym_id;
        if group_type.is_lookinto() {
            self.groups[gid.0 as usize].condition_backref = self.nearest_enclosing_capture(enclosing);
        }

        self.depth += 1;
        self.max_depth = self.max_depth.max(self.depth);
        let result = if branch_reset {
            self.parse_group_body_branch_reset(gid)
        } else {
            self.parse_group_body_into(gid)
        };
        self.depth -= 1;
        result?;
        self.expect(b')')?;
        Ok((sym_id, gid))
    }

    /// A `Lookinto` group (§6 glossary: "scoped against a named capture
    /// rather than the current input tail") binds to the nearest capturing
    /// group enclosing it, walking outward through `parent`. If none
    /// encloses it, the group falls back to lookahead-style matching
    /// against the live cursor (see the note on `enter_lookaround` in
    /// `matcher.rs`).
    fn nearest_enclosing_capture(&self, mut gid: GroupId) -> Option<u32> {
        loop {
            let group = &self.groups[gid.0 as usize];
            if let Some(idx) = group.backref_index {
                return Some(idx);
            }
            match group.parent {
                Some(p) => gid = p,
                None => return None,
            }
        }
    }

    // ---- anchoring analysis -------------------------------------------------

    fn compute_anchored(&self, gid: GroupId) -> bool {
        self.groups[gid.0 as usize].alternatives.iter().all(|alt| self.alt_is_anchored(alt))
    }

    fn alt_is_anchored(&self, alt: &[SymbolId]) -> bool {
        for &sid in alt {
            let sym = &self.symbols[sid.0 as usize];
            match &sym.kind {
                SymbolKind::AnchorStart => return true,
                SymbolKind::NoOp | SymbolKind::ResetStart => continue,
                SymbolKind::Group(inner) if sym.quant.min >= 1 => {
                    return self.compute_anchored(*inner);
                }
                _ => return false,
            }
        }
        false
    }
}
