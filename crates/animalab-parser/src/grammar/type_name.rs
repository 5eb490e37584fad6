//! Qualified behaviour type names.
//!
//! A type name is either a run of identifiers joined by `.`, `,` or `:`
//! (`Game.Audio.Footsteps`, `Game.Footsteps, Game`), or a run of quoted
//! strings that are concatenated. The name ends at the record's `{`.

use crate::{stack::TokenEvent, tokens::TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Identifiers,
    Strings,
}

/// Accumulates the tokens of a type name.
#[derive(Debug, Default)]
pub(crate) struct TypeName {
    text: String,
    mode: Option<Mode>,
}

impl TypeName {
    /// Append `event` to the name, returning `false` if it cannot continue it.
    pub fn push(&mut self, event: &TokenEvent) -> bool {
        let accepted = match (self.mode, event.kind()) {
            (None | Some(Mode::Identifiers), TokenKind::Identifier) => {
                self.mode = Some(Mode::Identifiers);
                true
            }
            (None | Some(Mode::Strings), TokenKind::SingleQuoted | TokenKind::DoubleQuoted) => {
                self.mode = Some(Mode::Strings);
                true
            }
            (Some(Mode::Identifiers), TokenKind::Symbol) => {
                event.is_symbol('.') || event.is_symbol(',') || event.is_symbol(':')
            }
            _ => false,
        };
        if accepted {
            self.text.push_str(event.text());
        }
        accepted
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}
