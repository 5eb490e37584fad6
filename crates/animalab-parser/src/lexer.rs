//! Lexical analyzer for Animalab documents.
//!
//! [`tokenize`] turns source text into a lazy stream of [`Token`]s. Tokens are
//! identifiers, single- or double-quoted strings, numbers and symbol runs.
//! Whitespace and control characters only separate tokens. Lexing stops at
//! the first error, which is yielded as the last item of the stream.

use winnow::{
    Parser as _,
    error::{ContextError, ErrMode},
    token::{any, one_of, take_while},
};

use crate::{
    error::{Diagnostic, ErrorCode, ParseError},
    span::{Position, Span},
    tokens::{SymbolSet, Token, TokenKind},
};

/// Diagnostic details attached to a lexer failure.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LexContext {
    code: ErrorCode,
    message: &'static str,
    help: Option<&'static str>,
}

type Input<'a> = &'a str;
type IResult<O> = std::result::Result<O, ErrMode<ContextError<LexContext>>>;

fn cut(code: ErrorCode, message: &'static str, help: Option<&'static str>) -> ErrMode<ContextError<LexContext>> {
    let mut e = ContextError::new();
    e.push(LexContext {
        code,
        message,
        help,
    });
    ErrMode::Cut(e)
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || c.is_control()
}

fn is_identifier_char(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

fn scan<'a>(input: &mut Input<'a>, pred: impl Fn(char) -> bool) -> IResult<&'a str> {
    take_while(0.., pred).parse_next(input)
}

fn scan_at_most<'a>(input: &mut Input<'a>, max: usize, pred: impl Fn(char) -> bool) -> IResult<&'a str> {
    take_while(0..=max, pred).parse_next(input)
}

fn next_char(input: &mut Input<'_>) -> IResult<char> {
    any.parse_next(input)
}

fn expect_char(input: &mut Input<'_>, c: char) -> IResult<char> {
    one_of(c).parse_next(input)
}

/// Returns `true` if a number literal starts at the head of `input`.
///
/// A sign or a dot counts as the start of a number when a digit follows
/// immediately, so `*+5` lexes as `*` then `+5`.
fn starts_number(input: &str) -> bool {
    let mut chars = input.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() => true,
        Some('.') => chars.next().is_some_and(|c| c.is_ascii_digit()),
        Some('+' | '-') => match chars.next() {
            Some(c) if c.is_ascii_digit() => true,
            Some('.') => chars.next().is_some_and(|c| c.is_ascii_digit()),
            _ => false,
        },
        _ => false,
    }
}

/// Decode a numeric escape body of 1 to `max` digits in `radix`.
fn numeric_escape(input: &mut Input<'_>, leading: Option<char>, max: usize, radix: u32) -> IResult<char> {
    let digits = scan_at_most(input, max, |c| c.is_digit(radix))?;
    let mut text = String::new();
    text.extend(leading);
    text.push_str(digits);
    if text.is_empty() {
        return Err(if input.is_empty() {
            cut(
                ErrorCode::E002,
                "unterminated escape sequence",
                Some("the document ended inside an escape"),
            )
        } else {
            cut(
                ErrorCode::E003,
                "escape sequence has no digits",
                Some("write at least one digit, e.g. `\\x41`"),
            )
        });
    }
    u32::from_str_radix(&text, radix)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| {
            cut(
                ErrorCode::E003,
                "invalid escaped codepoint",
                Some("valid range: `0x0000`-`0xD7FF` or `0xE000`-`0x10FFFF`"),
            )
        })
}

/// Parse an escape sequence, starting at the backslash.
///
/// Named escapes are case-insensitive. `\0`-`\7` start an octal escape of up
/// to three digits, `\o` takes up to three octal digits, `\x` two hex digits,
/// `\u` four and `\U` eight. Any other character stands for itself.
fn escape(input: &mut Input<'_>) -> IResult<char> {
    expect_char(input, '\\')?;
    let c = next_char(input).map_err(|_| {
        cut(
            ErrorCode::E002,
            "unterminated escape sequence",
            Some("the document ended right after `\\`"),
        )
    })?;
    let decoded = match c {
        'a' | 'A' => '\u{07}',
        'b' | 'B' | 'h' | 'H' => '\u{08}',
        'e' | 'E' => '\u{1B}',
        'f' | 'F' => '\u{0C}',
        'n' | 'N' => '\n',
        'r' | 'R' => '\r',
        't' | 'T' => '\t',
        'v' | 'V' => '\u{0B}',
        '0'..='7' => numeric_escape(input, Some(c), 2, 8)?,
        'o' | 'O' => numeric_escape(input, None, 3, 8)?,
        'x' | 'X' => numeric_escape(input, None, 2, 16)?,
        'u' => numeric_escape(input, None, 4, 16)?,
        'U' => numeric_escape(input, None, 8, 16)?,
        other => other,
    };
    Ok(decoded)
}

/// Parse a quoted string, including both quotes.
fn quoted(input: &mut Input<'_>, quote: char) -> IResult<String> {
    expect_char(input, quote)?;
    let mut text = String::new();
    loop {
        text.push_str(scan(input, |c| c != quote && c != '\\')?);
        match input.chars().next() {
            None => {
                return Err(cut(
                    ErrorCode::E001,
                    "unterminated string literal",
                    if quote == '"' {
                        Some("add a closing `\"`")
                    } else {
                        Some("add a closing `'`")
                    },
                ));
            }
            Some('\\') => text.push(escape(input)?),
            Some(_) => {
                expect_char(input, quote)?;
                return Ok(text);
            }
        }
    }
}

/// Parse a number literal. The token keeps the source text.
fn number<'a>(input: &mut Input<'a>) -> IResult<&'a str> {
    let start = *input;
    if input.starts_with(['+', '-']) {
        next_char(input)?;
    }

    let mut chars = input.chars();
    let radix = match (chars.next(), chars.next().map(|c| c.to_ascii_lowercase())) {
        (Some('0'), Some('b')) => Some(2),
        (Some('0'), Some('o')) => Some(8),
        (Some('0'), Some('x')) => Some(16),
        _ => None,
    };

    if let Some(radix) = radix {
        next_char(input)?;
        next_char(input)?;
        let digits = scan(input, |c| c.is_digit(radix))?;
        if digits.is_empty() || input.starts_with(is_identifier_char) {
            return Err(cut(
                ErrorCode::E004,
                "invalid number literal",
                Some("`0b`, `0o` and `0x` must be followed by digits of that radix"),
            ));
        }
    } else {
        scan(input, |c| c.is_ascii_digit())?;
        if input.starts_with('.') {
            next_char(input)?;
            scan(input, |c| c.is_ascii_digit())?;
        }
        if has_exponent(input) {
            next_char(input)?;
            if input.starts_with(['+', '-']) {
                next_char(input)?;
            }
            scan(input, |c| c.is_ascii_digit())?;
        }
    }

    Ok(&start[..start.len() - input.len()])
}

/// Returns `true` if an exponent with at least one digit starts here.
fn has_exponent(input: &str) -> bool {
    let mut chars = input.chars();
    if !matches!(chars.next(), Some('e' | 'E')) {
        return false;
    }
    match chars.next() {
        Some('+' | '-') => chars.next().is_some_and(|c| c.is_ascii_digit()),
        Some(c) => c.is_ascii_digit(),
        None => false,
    }
}

/// Parse a run of symbol characters, stopping before a signed number.
fn symbols<'a>(input: &mut Input<'a>, set: SymbolSet<'_>) -> IResult<&'a str> {
    let start = *input;
    while let Some(c) = input.chars().next() {
        if !set.contains(c) || (start.len() != input.len() && starts_number(input)) {
            break;
        }
        next_char(input)?;
    }
    Ok(&start[..start.len() - input.len()])
}

/// Parse an identifier. The first character may be anything that does not
/// start another token class; the rest are identifier characters or escapes.
fn identifier(input: &mut Input<'_>) -> IResult<String> {
    let mut text = String::new();
    if !input.starts_with('\\') {
        text.push(next_char(input)?);
    }
    loop {
        let run = scan(input, is_identifier_char)?;
        if !run.is_empty() {
            text.push_str(run);
        } else if input.starts_with('\\') {
            text.push(escape(input)?);
        } else {
            return Ok(text);
        }
    }
}

/// A lazy token stream over one document.
///
/// Created by [`tokenize`]. After an error the stream ends.
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    source: &'a str,
    input: Input<'a>,
    symbols: SymbolSet<'a>,
    position: Position,
    finished: bool,
}

impl<'a> Tokens<'a> {
    fn offset(&self) -> usize {
        self.source.len() - self.input.len()
    }

    /// Position after walking `text` from `from`.
    fn walk(from: Position, text: &str) -> Position {
        let mut row = from.row();
        let mut col = from.col();
        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '\r' if chars.peek() == Some(&'\n') => {}
                '\r' | '\n' => {
                    row += 1;
                    col = 0;
                }
                _ => col += 1,
            }
        }
        Position::new(row, col)
    }

    fn skip_separators(&mut self) {
        let skipped = scan(&mut self.input, is_separator).unwrap_or_default();
        self.position = Self::walk(self.position, skipped);
    }

    fn lex_token(&mut self) -> IResult<(TokenKind, String)> {
        let input = &mut self.input;
        match input.chars().next() {
            Some('"') => Ok((TokenKind::DoubleQuoted, quoted(input, '"')?)),
            Some('\'') => Ok((TokenKind::SingleQuoted, quoted(input, '\'')?)),
            Some(_) if starts_number(input) => Ok((TokenKind::Number, number(input)?.to_string())),
            Some(c) if self.symbols.contains(c) => {
                Ok((TokenKind::Symbol, symbols(input, self.symbols)?.to_string()))
            }
            _ => Ok((TokenKind::Identifier, identifier(input)?)),
        }
    }

    fn convert_err(&self, err: ErrMode<ContextError<LexContext>>, start: usize) -> ParseError {
        let context_error = match err {
            ErrMode::Backtrack(ctx) | ErrMode::Cut(ctx) => ctx,
            ErrMode::Incomplete(_) => ContextError::new(),
        };
        let end = self.offset();
        let position = Self::walk(self.position, &self.source[start..end]);
        let span = Span::new(start..end.max(start + 1).min(self.source.len()));

        let diagnostic = match context_error.context().next() {
            Some(LexContext {
                code,
                message,
                help,
            }) => {
                let mut diag = Diagnostic::error(*message)
                    .with_code(*code)
                    .with_label(span, code.description());
                if let Some(h) = help {
                    diag = diag.with_help(*h);
                }
                diag
            }
            None => Diagnostic::error("unexpected character")
                .with_code(ErrorCode::E100)
                .with_label(span, "cannot start a token"),
        };
        ParseError::new(diagnostic, position)
    }
}

impl Iterator for Tokens<'_> {
    type Item = Result<Token, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        self.skip_separators();
        if self.input.is_empty() {
            self.finished = true;
            return None;
        }

        let start = self.offset();
        let before = self.input;
        match self.lex_token() {
            Ok((kind, text)) => {
                let end = self.offset();
                let token = Token::new(kind, text, Span::new(start..end), self.position);
                self.position = Self::walk(self.position, &before[..end - start]);
                Some(Ok(token))
            }
            Err(err) => {
                self.finished = true;
                Some(Err(self.convert_err(err, start)))
            }
        }
    }
}

impl std::iter::FusedIterator for Tokens<'_> {}

/// Tokenize `text`, treating the characters of `symbols` as symbols.
///
/// The stream is lazy: nothing is lexed until it is pulled.
pub fn tokenize<'a>(text: &'a str, symbols: SymbolSet<'a>) -> Tokens<'a> {
    Tokens {
        source: text,
        input: text,
        symbols,
        position: Position::default(),
        finished: false,
    }
}
