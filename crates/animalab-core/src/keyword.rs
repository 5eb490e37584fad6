//! Keyword-backed enums.
//!
//! Several graph enums appear in documents as keywords (`additive`,
//! `simple1D`, `sourceThenDestination`, ...). They are read case-insensitively
//! and always written back in lower camel case.

use thiserror::Error;

/// Error returned when text does not name any variant of a keyword enum.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} `{text}`")]
pub struct UnknownKeyword {
    kind: &'static str,
    text: String,
}

impl UnknownKeyword {
    pub fn new(kind: &'static str, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Declares an enum whose variants map to document keywords.
///
/// Generates `ALL`, `keyword()`, `Display` and a case-insensitive `FromStr`.
macro_rules! keyword_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident ($kind:literal) {
            $( $(#[$vmeta:meta])* $variant:ident => $keyword:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every variant in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The canonical keyword for this variant.
            pub fn keyword(self) -> &'static str {
                match self {
                    $( $name::$variant => $keyword ),+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.keyword())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::keyword::UnknownKeyword;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|variant| variant.keyword().eq_ignore_ascii_case(s))
                    .ok_or_else(|| $crate::keyword::UnknownKeyword::new($kind, s))
            }
        }
    };
}

pub(crate) use keyword_enum;
