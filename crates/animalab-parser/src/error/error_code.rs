//! Error codes for the Animalab diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E0xx` - Lexer errors
//! - `E1xx` - Grammar errors
//! - `E2xx` - Link warnings (recoverable)

use std::fmt;

/// Error codes for categorizing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Lexer Errors (E0xx)
    // =========================================================================
    /// Unterminated string literal.
    ///
    /// A string was opened with a quote but the document ended first.
    E001,

    /// Unterminated escape sequence.
    ///
    /// The document ended right after a backslash or inside a numeric escape.
    E002,

    /// Invalid escape sequence.
    ///
    /// A numeric escape had no digits or named an invalid codepoint.
    E003,

    /// Invalid number literal.
    ///
    /// A radix prefix (`0b`, `0o`, `0x`) was not followed by valid digits.
    E004,

    // =========================================================================
    // Grammar Errors (E1xx)
    // =========================================================================
    /// Unexpected token.
    ///
    /// The active grammar rule did not expect this token.
    E100,

    /// Unknown behaviour type.
    ///
    /// A behaviour record names a type the host registry does not know.
    E101,

    /// Unknown behaviour field.
    ///
    /// A behaviour record assigns a field its schema does not declare.
    E102,

    /// Invalid value.
    ///
    /// A literal could not be converted to the type its field or option needs.
    E103,

    /// Invalid stack operation.
    ///
    /// A grammar rule asked the parser stack for something it cannot do,
    /// such as detaching the root rule.
    E104,

    // =========================================================================
    // Link Warnings (E2xx)
    // =========================================================================
    /// Duplicate parameter.
    ///
    /// A parameter name was declared twice; the later declaration is ignored.
    E200,

    /// Unresolved transition source.
    E201,

    /// Unresolved transition destination.
    E202,

    /// Unresolved default state.
    E203,

    /// Unresolved sync layer.
    E204,

    /// Duplicate node name.
    ///
    /// A state or state machine reuses a name already taken in its scope.
    E205,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            ErrorCode::E004 => "E004",
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E103 => "E103",
            ErrorCode::E104 => "E104",
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
            ErrorCode::E203 => "E203",
            ErrorCode::E204 => "E204",
            ErrorCode::E205 => "E205",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "unterminated string literal",
            ErrorCode::E002 => "unterminated escape sequence",
            ErrorCode::E003 => "invalid escape sequence",
            ErrorCode::E004 => "invalid number literal",
            ErrorCode::E100 => "unexpected token",
            ErrorCode::E101 => "unknown behaviour type",
            ErrorCode::E102 => "unknown behaviour field",
            ErrorCode::E103 => "invalid value",
            ErrorCode::E104 => "invalid stack operation",
            ErrorCode::E200 => "duplicate parameter",
            ErrorCode::E201 => "unresolved transition source",
            ErrorCode::E202 => "unresolved transition destination",
            ErrorCode::E203 => "unresolved default state",
            ErrorCode::E204 => "unresolved sync layer",
            ErrorCode::E205 => "duplicate node name",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::E001.to_string(), "E001");
        assert_eq!(ErrorCode::E100.to_string(), "E100");
        assert_eq!(ErrorCode::E204.to_string(), "E204");
    }

    #[test]
    fn test_error_code_description() {
        assert_eq!(ErrorCode::E001.description(), "unterminated string literal");
        assert_eq!(ErrorCode::E004.description(), "invalid number literal");
        assert_eq!(
            ErrorCode::E202.description(),
            "unresolved transition destination"
        );
    }
}
