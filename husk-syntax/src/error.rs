use thiserror::Error;

use crate::span::Span;

/// Errors produced while lexing or parsing a source unit.
///
/// The error carries the offending byte span; callers that own the source
/// text (the project loader) wrap it with a `NamedSource` for rendering.
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    #[error("unterminated string literal")]
    UnterminatedString { span: Span },

    #[error("unterminated block comment")]
    UnterminatedComment { span: Span },

    #[error("expected {expected}, found {found}")]
    Expected {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("{construct} is not part of the declaration subset")]
    Unsupported { construct: String, span: Span },
}

impl ParseError {
    pub fn unterminated_string(span: Span) -> Self {
        ParseError::UnterminatedString { span }
    }

    pub fn unterminated_comment(span: Span) -> Self {
        ParseError::UnterminatedComment { span }
    }

    pub fn expected(expected: impl Into<String>, found: impl Into<String>, span: Span) -> Self {
        ParseError::Expected {
            expected: expected.into(),
            found: found.into(),
            span,
        }
    }

    pub fn unsupported(construct: impl Into<String>, span: Span) -> Self {
        ParseError::Unsupported {
            construct: construct.into(),
            span,
        }
    }

    /// The byte span the error points at.
    pub fn span(&self) -> Span {
        match self {
            ParseError::UnterminatedString { span }
            | ParseError::UnterminatedComment { span }
            | ParseError::Expected { span, .. }
            | ParseError::Unsupported { span, .. } => *span,
        }
    }
}
