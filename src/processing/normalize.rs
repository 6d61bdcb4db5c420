//! Canonical cleanup of extracted PDF text.
//!
//! Every whitespace run (including newlines and Unicode spaces) becomes a single ASCII space,
//! control and invisible formatting characters are dropped, and the ends are trimmed. The output
//! never grows and cleaning it again is a no-op.

/// Invisible characters that PDF text layers leak into extracted text.
const INVISIBLE: &[char] = &[
    '\u{00AD}', // soft hyphen
    '\u{200B}', // zero-width space
    '\u{200C}', // zero-width non-joiner
    '\u{200D}', // zero-width joiner
    '\u{2060}', // word joiner
    '\u{FEFF}', // byte-order mark
];

/// Normalize raw extracted text.
pub fn clean(raw: &str) -> String {
    let mut cleaned = String::with_capacity(raw.len());
    let mut pending_space = false;

    for ch in raw.chars() {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if is_droppable(ch) {
            continue;
        }
        if pending_space && !cleaned.is_empty() {
            cleaned.push(' ');
        }
        pending_space = false;
        cleaned.push(ch);
    }

    cleaned
}

fn is_droppable(ch: char) -> bool {
    ch.is_control() || INVISIBLE.contains(&ch)
}
