//! # Rubric Parse - formula parser for the Rubric grader
//!
//! Turns submitted formula text into a [`rubric_ast::expr::Expr`] tree, or a
//! [`error::ParseError`] that points at the exact position of the problem.

pub mod error;
pub mod lexer;
pub mod parser;

pub mod prelude {
    pub use crate::error::{ParseError, ParseResult};
    pub use crate::lexer::{tokenize, Loc, NumberedVar, Spanned, Token};
    pub use crate::parser::{parse, Parser};
}

pub use parser::parse;
