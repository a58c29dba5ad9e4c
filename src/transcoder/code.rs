//! Pulse code table
//!
//! Fixed mapping from board coordinates to pulse patterns: files are the
//! letters A-H, ranks the digits 1-8. Lookup uppercases letters so `e2e4`
//! and `E2E4` decode identically. Characters outside the table have no
//! pattern and are skipped by the planner.

use crate::types::PulseSymbol::{self, Long, Short};

/// Pattern table, ranks first. Slices are ordered as transmitted.
pub const CODE_TABLE: [(char, &[PulseSymbol]); 16] = [
    ('1', &[Short, Long, Long, Long, Long]),
    ('2', &[Short, Short, Long, Long, Long]),
    ('3', &[Short, Short, Short, Long, Long]),
    ('4', &[Short, Short, Short, Short, Long]),
    ('5', &[Short, Short, Short, Short, Short]),
    ('6', &[Long, Short, Short, Short, Short]),
    ('7', &[Long, Long, Short, Short, Short]),
    ('8', &[Long, Long, Long, Short, Short]),
    ('A', &[Short, Long]),
    ('B', &[Long, Short, Short, Short]),
    ('C', &[Long, Short, Long, Short]),
    ('D', &[Long, Short, Short]),
    ('E', &[Short]),
    ('F', &[Short, Short, Long, Short]),
    ('G', &[Long, Long, Short]),
    ('H', &[Short, Short, Short, Short]),
];

/// Canonical table key for a character.
pub fn normalize(c: char) -> char {
    c.to_ascii_uppercase()
}

/// Pattern for a character, if it has one.
pub fn lookup(c: char) -> Option<&'static [PulseSymbol]> {
    let key = normalize(c);
    CODE_TABLE
        .iter()
        .find(|(ch, _)| *ch == key)
        .map(|(_, pattern)| *pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(lookup('a'), lookup('A'));
        assert_eq!(lookup('h'), lookup('H'));
        assert!(lookup('e').is_some());
    }

    #[test]
    fn test_digits_map_directly() {
        assert_eq!(lookup('1'), Some([Short, Long, Long, Long, Long].as_slice()));
        assert_eq!(lookup('8'), Some([Long, Long, Long, Short, Short].as_slice()));
    }

    #[test]
    fn test_letters_use_their_patterns() {
        assert_eq!(lookup('E'), Some([Short].as_slice()));
        assert_eq!(lookup('A'), Some([Short, Long].as_slice()));
        assert_eq!(lookup('H'), Some([Short, Short, Short, Short].as_slice()));
    }

    #[test]
    fn test_unknown_characters_have_no_pattern() {
        assert_eq!(lookup('9'), None);
        assert_eq!(lookup('0'), None);
        assert_eq!(lookup('i'), None);
        assert_eq!(lookup('?'), None);
        assert_eq!(lookup(' '), None);
        assert_eq!(lookup('é'), None);
    }

    #[test]
    fn test_table_covers_the_whole_board() {
        for c in ('a'..='h').chain('1'..='8') {
            assert!(lookup(c).is_some(), "no pattern for {:?}", c);
        }
    }
}
