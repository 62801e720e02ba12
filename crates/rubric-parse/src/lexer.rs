//! Lexer for grading formulas
//!
//! Tokenizes submitted formula text using logos. Every token carries its byte
//! span so parse errors can point at the exact offending position. Nothing is
//! case-folded here: `M` and `m` are distinct identifiers as far as the lexer
//! and parser are concerned.

use logos::{Logos, Span};

use crate::error::{ParseError, ParseResult};

/// Source location (byte span)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Loc {
    pub start: usize,
    pub end: usize,
}

impl Loc {
    pub fn new(start: usize, end: usize) -> Self {
        Loc { start, end }
    }

    pub fn from_span(span: Span) -> Self {
        Loc { start: span.start, end: span.end }
    }

    /// 1-based position for learner-facing messages.
    pub fn position(&self) -> usize {
        self.start + 1
    }
}

/// Token with location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub value: T,
    pub loc: Loc,
}

impl<T> Spanned<T> {
    pub fn new(value: T, loc: Loc) -> Self {
        Spanned { value, loc }
    }
}

/// A numbered-variable occurrence: prefix plus integer subscript.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberedVar {
    pub prefix: Box<str>,
    pub index: i64,
}

fn lex_number(lex: &mut logos::Lexer<Token>) -> Option<f64> {
    lex.slice().parse().ok()
}

fn lex_ident(lex: &mut logos::Lexer<Token>) -> Box<str> {
    lex.slice().into()
}

/// Split `prefix_{index}` into its parts. The regex guarantees the shape, so
/// the only possible failure is an out-of-range integer subscript.
fn lex_numbered(lex: &mut logos::Lexer<Token>) -> Option<NumberedVar> {
    let slice = lex.slice();
    let brace = slice.find('{')?;
    let prefix = &slice[..brace - 1];
    let index = slice[brace + 1..slice.len() - 1].parse().ok()?;
    Some(NumberedVar { prefix: prefix.into(), index })
}

/// Token type
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Token {
    /// Numeric literal: `3`, `3.5`, `.5`, `2e-3`
    #[regex(r"([0-9]+(\.[0-9]*)?|\.[0-9]+)([eE][+-]?[0-9]+)?", lex_number)]
    Number(f64),

    /// Numbered variable: `a_{3}`, `coef_{-1}`. Must be matched before the
    /// plain identifier (logos prefers the longer match).
    #[regex(r"[A-Za-z][A-Za-z0-9_]*_\{-?[0-9]+\}", lex_numbered)]
    Numbered(NumberedVar),

    /// Identifier: `m`, `x_1`, `omega0`
    #[regex(r"[A-Za-z][A-Za-z0-9_]*", lex_ident)]
    Ident(Box<str>),

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("^")]
    Caret,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
}

impl Token {
    /// Check if this token could begin an expression. Used to tell "the
    /// expression just ended" apart from "two expressions are sitting next
    /// to each other with no operator between them".
    pub fn can_start_expr(&self) -> bool {
        matches!(
            self,
            Token::Number(_)
                | Token::Numbered(_)
                | Token::Ident(_)
                | Token::LParen
                | Token::LBracket
        )
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Number(x) => write!(f, "number '{}'", x),
            Token::Numbered(nv) => write!(f, "'{}_{{{}}}'", nv.prefix, nv.index),
            Token::Ident(name) => write!(f, "'{}'", name),
            Token::Plus => write!(f, "'+'"),
            Token::Minus => write!(f, "'-'"),
            Token::Star => write!(f, "'*'"),
            Token::Slash => write!(f, "'/'"),
            Token::Caret => write!(f, "'^'"),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
            Token::LBracket => write!(f, "'['"),
            Token::RBracket => write!(f, "']'"),
            Token::LBrace => write!(f, "'{{'"),
            Token::RBrace => write!(f, "'}}'"),
            Token::Comma => write!(f, "','"),
        }
    }
}

/// Tokenize a whole formula up front. Fails on the first unrecognizable
/// character, pointing at its position.
pub fn tokenize(source: &str) -> ParseResult<Vec<Spanned<Token>>> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push(Spanned::new(token, Loc::from_span(lexer.span()))),
            Err(()) => {
                return Err(ParseError::UnexpectedChar { at: lexer.span().start + 1 });
            }
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source).unwrap().into_iter().map(|s| s.value).collect()
    }

    #[test]
    fn test_basic_tokens() {
        assert_eq!(
            kinds("m*(1-x)"),
            vec![
                Token::Ident("m".into()),
                Token::Star,
                Token::LParen,
                Token::Number(1.0),
                Token::Minus,
                Token::Ident("x".into()),
                Token::RParen,
            ]
        );
    }

    #[test]
    fn test_number_forms() {
        assert_eq!(kinds("2 3.5 .5 1e3 2.5e-2"), vec![
            Token::Number(2.0),
            Token::Number(3.5),
            Token::Number(0.5),
            Token::Number(1000.0),
            Token::Number(0.025),
        ]);
    }

    #[test]
    fn test_numbered_variable() {
        assert_eq!(
            kinds("a_{0} + a_{-1}"),
            vec![
                Token::Numbered(NumberedVar { prefix: "a".into(), index: 0 }),
                Token::Plus,
                Token::Numbered(NumberedVar { prefix: "a".into(), index: -1 }),
            ]
        );
    }

    #[test]
    fn test_numbered_prefix_with_underscore() {
        assert_eq!(
            kinds("a_b_{2}"),
            vec![Token::Numbered(NumberedVar { prefix: "a_b".into(), index: 2 })]
        );
    }

    #[test]
    fn test_compound_identifier_is_not_numbered() {
        assert_eq!(kinds("x_1"), vec![Token::Ident("x_1".into())]);
    }

    #[test]
    fn test_case_preserved() {
        assert_eq!(kinds("M m"), vec![Token::Ident("M".into()), Token::Ident("m".into())]);
    }

    #[test]
    fn test_unexpected_char() {
        assert_eq!(tokenize("x + $"), Err(ParseError::UnexpectedChar { at: 5 }));
    }

    #[test]
    fn test_spans() {
        let tokens = tokenize("ab + c").unwrap();
        assert_eq!(tokens[0].loc, Loc::new(0, 2));
        assert_eq!(tokens[1].loc, Loc::new(3, 4));
        assert_eq!(tokens[2].loc, Loc::new(5, 6));
    }
}
