//! General helpers shared across crates.

/// Check if a byte can start an identifier (`[A-Za-z_$]`)
#[inline]
pub const fn is_identifier_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_' || c == b'$'
}

/// Check if a byte can continue an identifier (`[A-Za-z0-9_$]`)
#[inline]
pub const fn is_identifier_char(c: u8) -> bool {
    is_identifier_start(c) || c.is_ascii_digit()
}

/// Check if a whole string is a simple identifier
pub fn is_simple_identifier(s: &str) -> bool {
    let bytes = s.as_bytes();
    match bytes.split_first() {
        Some((first, rest)) => {
            is_identifier_start(*first) && rest.iter().all(|c| is_identifier_char(*c))
        }
        None => false,
    }
}

/// Truncate to at most `max` characters, respecting char boundaries.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
