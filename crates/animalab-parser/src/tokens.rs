//! Token types produced by the [`lexer`](super::lexer).

use std::fmt;

use crate::span::{Position, Span};

/// The class of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// A run of identifier characters, with escapes decoded.
    Identifier,
    /// A `'...'` string, with escapes decoded.
    SingleQuoted,
    /// A `"..."` string, with escapes decoded.
    DoubleQuoted,
    /// A number literal; the text is kept verbatim.
    Number,
    /// A run of symbol characters.
    Symbol,
}

impl TokenKind {
    /// Returns `true` for both quoted string kinds.
    pub fn is_string(&self) -> bool {
        matches!(self, TokenKind::SingleQuoted | TokenKind::DoubleQuoted)
    }

    /// Returns `true` for tokens that can name something: identifiers and strings.
    pub fn is_name(&self) -> bool {
        matches!(
            self,
            TokenKind::Identifier | TokenKind::SingleQuoted | TokenKind::DoubleQuoted
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Identifier => write!(f, "identifier"),
            TokenKind::SingleQuoted | TokenKind::DoubleQuoted => write!(f, "string"),
            TokenKind::Number => write!(f, "number"),
            TokenKind::Symbol => write!(f, "symbol"),
        }
    }
}

/// Which characters the lexer treats as symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolSet<'a> {
    /// ASCII punctuation, except quotes, backslash and underscore.
    Punctuation,
    /// Exactly the listed characters.
    Only(&'a [char]),
}

impl SymbolSet<'_> {
    /// The symbols of the document language.
    pub const DOCUMENT: SymbolSet<'static> = SymbolSet::Only(&[
        '<', '=', '>', '+', '-', '*', ',', '.', '&', '|', '!', '(', ')', '[', ']', ':', ';', '{',
        '}', '/',
    ]);

    pub fn contains(&self, c: char) -> bool {
        match self {
            SymbolSet::Punctuation => {
                c.is_ascii_punctuation() && !matches!(c, '"' | '\'' | '\\' | '_')
            }
            SymbolSet::Only(chars) => chars.contains(&c),
        }
    }
}

impl Default for SymbolSet<'_> {
    fn default() -> Self {
        SymbolSet::Punctuation
    }
}

/// A token with its source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    kind: TokenKind,
    text: String,
    span: Span,
    position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span, position: Position) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
            position,
        }
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// Decoded token text.
    ///
    /// Strings and identifiers have their escapes resolved; numbers and
    /// symbols are the source text.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn span(&self) -> Span {
        self.span
    }

    /// 0-based row and column of the first character.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Returns `true` if this is the single-character symbol `c`.
    pub fn is_symbol(&self, c: char) -> bool {
        self.kind == TokenKind::Symbol && self.text.len() == c.len_utf8() && self.text.starts_with(c)
    }

    /// Returns `true` if this is an identifier equal to `keyword`, ignoring case.
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Identifier && self.text.eq_ignore_ascii_case(keyword)
    }

    /// The numeric value of a number token.
    ///
    /// Radix-prefixed literals (`0b`, `0o`, `0x`) are integers; everything
    /// else is parsed as a decimal float.
    pub fn number(&self) -> Option<f64> {
        if self.kind != TokenKind::Number {
            return None;
        }
        match radix_integer(&self.text) {
            Some(value) => value.map(|v| v as f64),
            None => self.text.parse().ok(),
        }
    }

    /// The value as an `f32`, parsed directly from decimal text so short
    /// literals such as `0.1` keep their nearest `f32`.
    pub fn as_f32(&self) -> Option<f32> {
        if self.kind != TokenKind::Number {
            return None;
        }
        match radix_integer(&self.text) {
            Some(value) => value.map(|v| v as f32),
            None => self.text.parse().ok(),
        }
    }

    /// The value as an integer, if the literal is integral.
    pub fn as_i64(&self) -> Option<i64> {
        if self.kind != TokenKind::Number {
            return None;
        }
        if let Some(value) = radix_integer(&self.text) {
            return value;
        }
        if let Ok(value) = self.text.parse::<i64>() {
            return Some(value);
        }
        let value: f64 = self.text.parse().ok()?;
        (value.fract() == 0.0 && value.abs() < i64::MAX as f64).then_some(value as i64)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::SingleQuoted => write!(f, "'{}'", self.text),
            TokenKind::DoubleQuoted => write!(f, "\"{}\"", self.text),
            _ => write!(f, "{}", self.text),
        }
    }
}

/// Decode a radix-prefixed integer literal.
///
/// Returns `None` when the text is not radix-prefixed, and `Some(None)` when
/// it is but does not fit an `i64`.
fn radix_integer(text: &str) -> Option<Option<i64>> {
    let (negative, unsigned) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let mut chars = unsigned.chars();
    if chars.next() != Some('0') {
        return None;
    }
    let radix = match chars.next()?.to_ascii_lowercase() {
        'b' => 2,
        'o' => 8,
        'x' => 16,
        _ => return None,
    };
    let magnitude = i64::from_str_radix(&unsigned[2..], radix).ok();
    Some(magnitude.map(|m| if negative { -m } else { m }))
}
