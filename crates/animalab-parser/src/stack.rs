//! The stack parser engine.
//!
//! A [`StackParser`] is a pushdown automaton over [`Rule`]s. Each token goes
//! to the rule on top of the stack, which may ask the engine, through its
//! [`Control`] handle, to attach a child rule or to detach itself. Rules are
//! generic over two types:
//!
//! - `C`, a context snapshot a child receives from its parent when attached.
//! - `S`, the session shared by every rule of one parse.
//!
//! A child can only reach its parent through the snapshot it was given and
//! the session, so a rule that has been detached and dropped has no way left
//! to mutate shared state.
//!
//! However the parse ends, the whole stack is unwound and every attached
//! rule's detach hook runs exactly once, top to root.

use log::{trace, warn};

use crate::{
    error::{Diagnostic, ErrorCode, ParseError, Result},
    lexer::tokenize,
    span::{Position, Span},
    tokens::{SymbolSet, Token, TokenKind},
};

/// How many times one token may be handed between rules.
const MAX_FORWARDS: usize = 64;

/// A token as delivered to a rule.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenEvent {
    token: Token,
    line_break: bool,
    indent: usize,
}

impl TokenEvent {
    pub fn new(token: Token, line_break: bool, indent: usize) -> Self {
        Self {
            token,
            line_break,
            indent,
        }
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn kind(&self) -> TokenKind {
        self.token.kind()
    }

    pub fn text(&self) -> &str {
        self.token.text()
    }

    pub fn position(&self) -> Position {
        self.token.position()
    }

    pub fn span(&self) -> Span {
        self.token.span()
    }

    /// Returns `true` if this token is the first on its line.
    pub fn line_break(&self) -> bool {
        self.line_break
    }

    /// Column of the first token on this token's line.
    pub fn indent(&self) -> usize {
        self.indent
    }

    pub fn is_symbol(&self, c: char) -> bool {
        self.token.is_symbol(c)
    }

    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.token.is_keyword(keyword)
    }

    /// An "unexpected token" diagnostic pointing at this token.
    pub fn unexpected(&self, expected: &str) -> Diagnostic {
        Diagnostic::error(format!(
            "unexpected {} `{}`",
            self.token.kind(),
            self.token.text()
        ))
        .with_code(ErrorCode::E100)
        .with_label(self.token.span(), format!("expected {expected}"))
        .with_position(self.token.position())
    }
}

/// One grammar production driven by the [`StackParser`].
pub trait Rule<C, S> {
    /// A short name used in logs and persistence names.
    fn hint(&self) -> &str {
        ""
    }

    /// The context snapshot handed to children attached by this rule.
    fn context(&self) -> Option<&C> {
        None
    }

    /// Called once the rule is on the stack.
    ///
    /// `inherited` is the parent's context; the root rule gets `None`.
    fn on_attach(&mut self, inherited: Option<&C>, session: &mut S) -> Result<()> {
        let _ = (inherited, session);
        Ok(())
    }

    /// Handle one token while this rule is on top of the stack.
    fn on_token(&mut self, event: &TokenEvent, session: &mut S, control: &mut Control<C, S>) -> Result<()>;

    /// Called exactly once when the rule leaves the stack, including while
    /// the stack is unwound after an error.
    fn on_detach(&mut self, session: &mut S) -> Result<()> {
        let _ = session;
        Ok(())
    }
}

enum Request<C, S> {
    Attach {
        rule: Box<dyn Rule<C, S>>,
        forward: bool,
    },
    Detach {
        forward: bool,
    },
}

/// A rule's handle for changing the stack while it handles a token.
///
/// At most one change can be requested per token.
pub struct Control<C, S> {
    request: Option<Request<C, S>>,
}

impl<C, S> Control<C, S> {
    fn new() -> Self {
        Self { request: None }
    }

    fn set(&mut self, request: Request<C, S>) -> Result<()> {
        if self.request.is_some() {
            return Err(Diagnostic::error("a rule requested two stack changes for one token")
                .with_code(ErrorCode::E104));
        }
        self.request = Some(request);
        Ok(())
    }

    /// Push `rule`; it handles the tokens after this one.
    pub fn attach(&mut self, rule: impl Rule<C, S> + 'static) -> Result<()> {
        self.set(Request::Attach {
            rule: Box::new(rule),
            forward: false,
        })
    }

    /// Push `rule` and hand it the current token right after its attach hook.
    pub fn attach_with_token(&mut self, rule: impl Rule<C, S> + 'static) -> Result<()> {
        self.set(Request::Attach {
            rule: Box::new(rule),
            forward: true,
        })
    }

    /// Pop the current rule once this token is handled.
    pub fn detach(&mut self) -> Result<()> {
        self.set(Request::Detach { forward: false })
    }

    /// Pop the current rule and hand the current token to its parent.
    pub fn detach_and_forward(&mut self) -> Result<()> {
        self.set(Request::Detach { forward: true })
    }
}

/// The attached rules of one parse, root first.
struct Frames<C, S> {
    rules: Vec<Box<dyn Rule<C, S>>>,
}

impl<C, S> Frames<C, S> {
    fn push(&mut self, rule: Box<dyn Rule<C, S>>, session: &mut S) -> Result<()> {
        trace!(rule = rule.hint(), depth = self.rules.len(); "Attach rule");
        self.rules.push(rule);
        let last = self.rules.len() - 1;
        let (parents, top) = self.rules.split_at_mut(last);
        let inherited = parents.last().and_then(|parent| parent.context());
        top[0].on_attach(inherited, session)
    }

    fn pop(&mut self, session: &mut S) -> Option<Result<()>> {
        let mut rule = self.rules.pop()?;
        trace!(rule = rule.hint(), depth = self.rules.len(); "Detach rule");
        Some(rule.on_detach(session))
    }

    fn dispatch(&mut self, event: &TokenEvent, session: &mut S) -> Result<()> {
        for _ in 0..MAX_FORWARDS {
            let Some(top) = self.rules.last_mut() else {
                return Ok(());
            };
            let mut control = Control::new();
            top.on_token(event, session, &mut control)?;

            match control.request {
                None => return Ok(()),
                Some(Request::Attach { rule, forward }) => {
                    self.push(rule, session)?;
                    if !forward {
                        return Ok(());
                    }
                }
                Some(Request::Detach { forward }) => {
                    if self.rules.len() <= 1 {
                        return Err(Diagnostic::error("the root rule cannot be detached")
                            .with_code(ErrorCode::E104)
                            .with_label(event.span(), "while handling this token"));
                    }
                    if let Some(result) = self.pop(session) {
                        result?;
                    }
                    if !forward {
                        return Ok(());
                    }
                }
            }
        }
        Err(Diagnostic::error("token was handed between rules too many times")
            .with_code(ErrorCode::E104)
            .with_label(event.span(), "this token"))
    }
}

/// Drives a grammar of [`Rule`]s over a document.
#[derive(Debug, Clone, Copy)]
pub struct StackParser<'a> {
    symbols: SymbolSet<'a>,
}

impl<'a> StackParser<'a> {
    pub fn new(symbols: SymbolSet<'a>) -> Self {
        Self { symbols }
    }

    /// Parse `text` with `root` as the bottom of the stack.
    ///
    /// Multi-character symbol runs are delivered one character at a time.
    /// When parsing stops, successfully or not, every rule still on the stack
    /// is detached. The first error is returned; later detach errors are
    /// only logged.
    pub fn parse<C, S>(
        &self,
        root: impl Rule<C, S> + 'static,
        text: &str,
        session: &mut S,
    ) -> std::result::Result<(), ParseError> {
        let mut frames = Frames { rules: Vec::new() };
        let mut position = Position::default();

        let mut result = match frames.push(Box::new(root), session) {
            Ok(()) => self.run(&mut frames, text, session, &mut position),
            Err(diag) => Err(ParseError::new(diag, position)),
        };

        while let Some(detached) = frames.pop(session) {
            if let Err(diag) = detached {
                if result.is_ok() {
                    result = Err(ParseError::new(diag, position));
                } else {
                    warn!(error:% = diag; "Detach failed while unwinding");
                }
            }
        }
        result
    }

    fn run<C, S>(
        &self,
        frames: &mut Frames<C, S>,
        text: &str,
        session: &mut S,
        position: &mut Position,
    ) -> std::result::Result<(), ParseError> {
        let mut row = None;
        let mut indent = 0;

        for token in tokenize(text, self.symbols) {
            let token = token?;
            let line_break = row.is_none_or(|row| token.position().row() > row);
            if line_break {
                indent = token.position().col();
            }
            row = Some(token.position().row());
            *position = token.position();

            if token.kind() == TokenKind::Symbol && token.text().chars().count() > 1 {
                let start = token.span().start();
                for (i, (offset, c)) in token.text().char_indices().enumerate() {
                    let at = token.position().advance(i);
                    *position = at;
                    let single = Token::new(
                        TokenKind::Symbol,
                        c.to_string(),
                        Span::new(start + offset..start + offset + c.len_utf8()),
                        at,
                    );
                    let event = TokenEvent::new(single, line_break, indent);
                    frames
                        .dispatch(&event, session)
                        .map_err(|diag| ParseError::new(diag, at))?;
                }
                continue;
            }

            let event = TokenEvent::new(token, line_break, indent);
            frames
                .dispatch(&event, session)
                .map_err(|diag| ParseError::new(diag, event.position()))?;
        }
        Ok(())
    }
}
