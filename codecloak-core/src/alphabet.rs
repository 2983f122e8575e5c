//! Bijective base-26 letter encoding for generated identifiers
//!
//! Counter values map to letter strings the way spreadsheet columns are
//! numbered: 0 -> "a", 25 -> "z", 26 -> "aa", 27 -> "ab". There is no
//! leading-zero ambiguity, so every non-negative index has exactly one
//! encoding and every encoding decodes back to exactly one index. Package
//! identifiers use the lowercase alphabet, class identifiers the uppercase
//! one.

/// Encode a non-negative index as a lowercase letter string.
pub fn encode_lower(index: i64) -> String {
    encode(index, b'a')
}

/// Encode a non-negative index as an uppercase letter string.
pub fn encode_upper(index: i64) -> String {
    encode(index, b'A')
}

/// Decode a lowercase letter string back to its index. Returns `None` for
/// an empty string, any character outside `a..=z`, or a string encoding an
/// index beyond `i64::MAX` (no counter can ever reach one).
pub fn decode_lower(s: &str) -> Option<i64> {
    decode(s, b'a')
}

/// Decode an uppercase letter string back to its index. Returns `None` for
/// an empty string, any character outside `A..=Z`, or a string encoding an
/// index beyond `i64::MAX`.
pub fn decode_upper(s: &str) -> Option<i64> {
    decode(s, b'A')
}

fn encode(mut index: i64, base: u8) -> String {
    debug_assert!(index >= 0, "identifier index must be non-negative");
    let mut letters = Vec::new();
    loop {
        letters.push(base + (index % 26) as u8);
        index = index / 26 - 1;
        if index < 0 {
            break;
        }
    }
    letters.reverse();
    letters.into_iter().map(char::from).collect()
}

fn decode(s: &str, base: u8) -> Option<i64> {
    if s.is_empty() {
        return None;
    }
    let mut acc: i64 = 0;
    for b in s.bytes() {
        if !(base..base + 26).contains(&b) {
            return None;
        }
        // Ordinary words easily exceed the counter range ("infrastructure"
        // encodes an index past i64::MAX), so overflow is invalid input,
        // not a panic.
        acc = acc.checked_mul(26)?.checked_add(i64::from(b - base) + 1)?;
    }
    Some(acc - 1)
}
