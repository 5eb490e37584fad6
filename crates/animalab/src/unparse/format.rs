//! Quoting and number formatting for emitted documents.
//!
//! Everything here must lex back to the text it was given: names print bare
//! only when they would come back as a single identifier, and quoted text
//! uses only escapes the lexer decodes.

use std::borrow::Cow;

fn is_identifier_char(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

/// Returns `true` if `text` lexes back as one identifier.
pub(crate) fn is_bare(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if is_identifier_char(first) && !first.is_ascii_digit() => {
            chars.all(is_identifier_char)
        }
        _ => false,
    }
}

/// A name: bare when possible, quoted otherwise.
pub(crate) fn format_name(text: &str) -> Cow<'_, str> {
    if is_bare(text) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(format_string(text))
    }
}

/// Always-quoted text.
///
/// Double quotes are preferred; single quotes are used when the text holds
/// a `"` but no `'`.
pub(crate) fn format_string(text: &str) -> String {
    let quote = if text.contains('"') && !text.contains('\'') {
        '\''
    } else {
        '"'
    };
    let mut out = String::with_capacity(text.len() + 2);
    out.push(quote);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            '\0' => out.push_str("\\000"),
            '\u{07}' => out.push_str("\\a"),
            '\u{08}' => out.push_str("\\b"),
            '\u{1B}' => out.push_str("\\e"),
            '\u{0C}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{0B}' => out.push_str("\\v"),
            c if c.is_control() => out.push_str(&format!("\\x{:02X}", u32::from(c))),
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// The shortest decimal that reads back as the same `f32`.
pub(crate) fn format_number(value: f32) -> String {
    format!("{value}")
}

/// A signed offset as `+ x` or `- x`; `None` for zero.
pub(crate) fn format_offset(value: f32) -> Option<String> {
    if value < 0.0 {
        Some(format!("- {}", format_number(-value)))
    } else if value > 0.0 {
        Some(format!("+ {}", format_number(value)))
    } else {
        None
    }
}
