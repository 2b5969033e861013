// Prefix accelerator for the "try every start position" loop (spec §4.E).
// The teacher's `literals.rs` builds a full Aho-Corasick automaton over
// every required leading literal; this engine only ever needs a single
// required byte (unary patterns have no alternation worth indexing, and
// string patterns are a secondary mode), so this is the one-byte case of
// that idea: `memchr` stands in for the automaton.

use crate::ir::{GroupId, GroupType, Pattern, SymbolKind};

/// A byte every match of `pattern` must begin with, if the grammar pins one
/// down unconditionally. `None` is always safe (just means no shortcut);
/// returning `Some(b)` when some alternative doesn't actually require `b`
/// would make the matcher skip over real matches, so every analysis below
/// fails closed.
pub fn required_leading_byte(pattern: &Pattern) -> Option<u8> {
    leading_byte_of_group(pattern, pattern.root)
}

fn leading_byte_of_group(pattern: &Pattern, gid: GroupId) -> Option<u8> {
    let group = pattern.group(gid);
    let mut found = None;
    for alt in &group.alternatives {
        let byte = leading_byte_of_alt(pattern, alt)?;
        match found {
            None => found = Some(byte),
            Some(existing) if existing == byte => {}
            Some(_) => return None,
        }
    }
    found
}

fn leading_byte_of_alt(pattern: &Pattern, alt: &[crate::ir::SymbolId]) -> Option<u8> {
    for &sid in alt {
        let sym = pattern.symbol(sid);
        match &sym.kind {
            // Zero-width, no opinion on the next byte: keep looking.
            SymbolKind::NoOp | SymbolKind::ResetStart | SymbolKind::AnchorStart => continue,
            SymbolKind::Character { any: false, byte } if sym.quant.min >= 1 => return Some(*byte),
            SymbolKind::Str { bytes } if sym.quant.min >= 1 && !bytes.is_empty() => return Some(bytes[0]),
            SymbolKind::Group(inner) if sym.quant.min >= 1 => {
                let group_type = pattern.group(*inner).group_type;
                if recurses_into(group_type) {
                    return leading_byte_of_group(pattern, *inner);
                }
                return None;
            }
            // Anything else (optional atoms, character classes, negative
            // assertions, backrefs, conditionals...) could start a match
            // with more than one byte, or with none at all.
            _ => return None,
        }
    }
    None
}

/// Required positive assertions test the live cursor just like ordinary
/// content, so their first byte is just as binding. Negative assertions and
/// conditionals aren't: they say what must *not* be there, or branch on
/// something the prefix scan can't see.
fn recurses_into(group_type: GroupType) -> bool {
    matches!(
        group_type,
        GroupType::NonCapturing
            | GroupType::Capturing
            | GroupType::Atomic
            | GroupType::BranchReset
            | GroupType::Lookahead
            | GroupType::MolecularLookahead
            | GroupType::Lookinto
            | GroupType::MolecularLookinto
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn leading_byte_for(source: &str) -> Option<u8> {
        let pattern = crate::parser::parse(source, &Config::default()).unwrap();
        required_leading_byte(&pattern)
    }

    #[test]
    fn plain_literal_prefix() {
        assert_eq!(leading_byte_for("abc"), Some(b'a'));
    }

    #[test]
    fn alternation_with_same_prefix() {
        assert_eq!(leading_byte_for("(?:abc|ade)"), Some(b'a'));
    }

    #[test]
    fn alternation_with_different_prefixes_gives_up() {
        assert_eq!(leading_byte_for("(?:abc|xde)"), None);
    }

    #[test]
    fn optional_atom_gives_up() {
        assert_eq!(leading_byte_for("a?bc"), None);
    }

    #[test]
    fn negative_lookahead_gives_up() {
        assert_eq!(leading_byte_for("(?!a)bc"), None);
    }

    #[test]
    fn positive_lookahead_counts() {
        assert_eq!(leading_byte_for("(?=a)bc"), Some(b'a'));
    }
}
