//! Parse errors
//!
//! Every variant is learner-facing: a parse error always reflects the
//! submitted text, never the grader's configuration. Positions are 1-based
//! character offsets into the submitted string.

use thiserror::Error;

/// Parse error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("empty input: no formula was entered")]
    EmptyInput,

    #[error("unrecognized character at position {at}")]
    UnexpectedChar { at: usize },

    #[error("unbalanced parentheses: '{open}' at position {at} is never closed")]
    UnclosedBracket { open: char, at: usize },

    #[error("unbalanced parentheses: unexpected '{close}' at position {at}")]
    UnmatchedBracket { close: char, at: usize },

    #[error("missing operator at position {at}: write the multiplication sign explicitly")]
    MissingOperator { at: usize },

    #[error("malformed numbered-variable subscript at position {at}: expected an integer between braces, like a_{{2}}")]
    MalformedSubscript { at: usize },

    #[error("unexpected {found} at position {at}, expected {expected}")]
    Unexpected {
        found: String,
        expected: &'static str,
        at: usize,
    },

    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: &'static str },
}

pub type ParseResult<T> = Result<T, ParseError>;
