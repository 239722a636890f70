//! The markup reserves `{` for structural templates, so a literal brace in
//! text content is written as the sequence `{}{`.
//!
//! The transform applies to text content at the codec boundary only; the
//! tree always stores the literal text.

use std::borrow::Cow;

pub const RESERVED: char = '{';
pub const ESCAPE_SEQUENCE: &str = "{}{";

pub fn escape_braces(text: &str) -> Cow<'_, str> {
    if text.contains(RESERVED) {
        Cow::Owned(text.replace(RESERVED, ESCAPE_SEQUENCE))
    } else {
        Cow::Borrowed(text)
    }
}

/// Inverse of [`escape_braces`]. Matches are taken left to right without
/// overlap, which keeps escaped input made of `{`/`}` runs unambiguous.
pub fn unescape_braces(text: &str) -> Cow<'_, str> {
    if text.contains(ESCAPE_SEQUENCE) {
        Cow::Owned(text.replace(ESCAPE_SEQUENCE, "{"))
    } else {
        Cow::Borrowed(text)
    }
}
