//! Parser for grading formulas
//!
//! Pratt parser over the token stream. Precedence, lowest to highest:
//! addition/subtraction, multiplication/division (left-associative), unary
//! minus, exponentiation (right-associative). Adjacency never means
//! multiplication: `2x` and `)(` are reported as a missing operator rather
//! than silently multiplied, since the learner most likely dropped a `*`.
//!
//! Unknown function names are not parse errors. The same text can be a valid
//! call in one grading context and an unresolved name in another, so name
//! resolution is deferred entirely to evaluation.

use rubric_ast::expr::Expr;
use rubric_ast::op::{Assoc, BinOp, UnaryOp};

use crate::error::{ParseError, ParseResult};
use crate::lexer::{tokenize, Loc, Spanned, Token};

/// Parser
pub struct Parser {
    tokens: Vec<Spanned<Token>>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Spanned<Token>>) -> Self {
        Parser { tokens, pos: 0 }
    }

    // ============ Utilities ============

    fn peek(&self) -> Option<&Spanned<Token>> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Spanned<Token>> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn at(&self, token: &Token) -> bool {
        self.peek().map(|t| &t.value == token).unwrap_or(false)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.at(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consume the closing bracket of a pair, or report the unclosed opener.
    fn expect_close(&mut self, close: Token, open: char, open_loc: Loc) -> ParseResult<()> {
        match self.next() {
            Some(ref t) if t.value == close => Ok(()),
            Some(t) => Err(ParseError::Unexpected {
                found: t.value.to_string(),
                expected: if close == Token::RParen { "')'" } else { "']'" },
                at: t.loc.position(),
            }),
            None => Err(ParseError::UnclosedBracket { open, at: open_loc.position() }),
        }
    }

    // ============ Expression Parsing (Pratt) ============

    pub fn parse_expr(&mut self) -> ParseResult<Expr> {
        self.parse_expr_bp(0)
    }

    /// Parse an expression with a minimum binding power.
    fn parse_expr_bp(&mut self, min_bp: u8) -> ParseResult<Expr> {
        let mut lhs = self.parse_prefix()?;

        loop {
            let Some(tok) = self.peek() else { break };

            if let Some(op) = binop_of(&tok.value) {
                let (l_bp, r_bp) = infix_binding_power(op);
                if l_bp < min_bp {
                    break;
                }
                self.next();
                let rhs = self.parse_expr_bp(r_bp)?;
                lhs = Expr::binary(op, lhs, rhs);
                continue;
            }

            // Two value-like tokens in a row: the learner almost certainly
            // dropped an explicit operator, so say so instead of guessing.
            if tok.value.can_start_expr() {
                return Err(ParseError::MissingOperator { at: tok.loc.position() });
            }

            break;
        }

        Ok(lhs)
    }

    /// Parse prefix expression (unary minus and atoms)
    fn parse_prefix(&mut self) -> ParseResult<Expr> {
        if self.at(&Token::Minus) {
            self.next();
            let operand = self.parse_expr_bp(UnaryOp::Neg.precedence())?;
            return Ok(Expr::neg(operand));
        }
        self.parse_atom()
    }

    /// Parse atomic expression
    fn parse_atom(&mut self) -> ParseResult<Expr> {
        let Some(tok) = self.next() else {
            return Err(ParseError::UnexpectedEof { expected: "an expression" });
        };

        match tok.value {
            Token::Number(x) => Ok(Expr::Number(x)),

            Token::Numbered(nv) => Ok(Expr::Numbered { prefix: nv.prefix, index: nv.index }),

            Token::Ident(name) => {
                if self.at(&Token::LParen) {
                    let open_loc = self.peek().map(|t| t.loc).unwrap_or(tok.loc);
                    self.next();
                    let args = self.parse_call_args(open_loc)?;
                    Ok(Expr::Call { name, args })
                } else if self.at(&Token::LBrace) {
                    // `a_{}` or `a_{x}` lexes as an identifier followed by a
                    // brace; the learner meant a numbered variable.
                    Err(ParseError::MalformedSubscript { at: tok.loc.position() })
                } else {
                    Ok(Expr::Ident(name))
                }
            }

            Token::LParen => {
                let inner = self.parse_expr_bp(0)?;
                self.expect_close(Token::RParen, '(', tok.loc)?;
                Ok(inner)
            }

            Token::LBracket => {
                let items = self.parse_array_items(tok.loc)?;
                Ok(Expr::Array(items))
            }

            Token::RParen => Err(ParseError::UnmatchedBracket { close: ')', at: tok.loc.position() }),
            Token::RBracket => Err(ParseError::UnmatchedBracket { close: ']', at: tok.loc.position() }),

            other => Err(ParseError::Unexpected {
                found: other.to_string(),
                expected: "an expression",
                at: tok.loc.position(),
            }),
        }
    }

    /// Parse call arguments after the opening parenthesis.
    fn parse_call_args(&mut self, open_loc: Loc) -> ParseResult<Vec<Expr>> {
        let mut args = Vec::new();
        if self.eat(&Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr_bp(0)?);
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect_close(Token::RParen, '(', open_loc)?;
        Ok(args)
    }

    /// Parse array items after the opening bracket.
    fn parse_array_items(&mut self, open_loc: Loc) -> ParseResult<Vec<Expr>> {
        if let Some(tok) = self.peek() {
            if tok.value == Token::RBracket {
                return Err(ParseError::Unexpected {
                    found: tok.value.to_string(),
                    expected: "an expression (empty arrays are not allowed)",
                    at: tok.loc.position(),
                });
            }
        }
        let mut items = vec![self.parse_expr_bp(0)?];
        while self.eat(&Token::Comma) {
            items.push(self.parse_expr_bp(0)?);
        }
        self.expect_close(Token::RBracket, '[', open_loc)?;
        Ok(items)
    }
}

fn binop_of(token: &Token) -> Option<BinOp> {
    match token {
        Token::Plus => Some(BinOp::Add),
        Token::Minus => Some(BinOp::Sub),
        Token::Star => Some(BinOp::Mul),
        Token::Slash => Some(BinOp::Div),
        Token::Caret => Some(BinOp::Pow),
        _ => None,
    }
}

fn infix_binding_power(op: BinOp) -> (u8, u8) {
    let prec = op.precedence();
    match op.assoc() {
        Assoc::Right => (prec, prec),
        Assoc::Left => (prec, prec + 1),
    }
}

// ============ Convenience Functions ============

/// Parse a formula into an expression tree.
///
/// Leading and trailing whitespace is ignored; an all-whitespace input is the
/// dedicated [`ParseError::EmptyInput`], not a crash or a generic error.
pub fn parse(source: &str) -> ParseResult<Expr> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(ParseError::EmptyInput);
    }
    let mut parser = Parser::new(tokens);
    let expr = parser.parse_expr()?;

    if let Some(trailing) = parser.peek() {
        return Err(match &trailing.value {
            Token::RParen => ParseError::UnmatchedBracket { close: ')', at: trailing.loc.position() },
            Token::RBracket => ParseError::UnmatchedBracket { close: ']', at: trailing.loc.position() },
            other => ParseError::Unexpected {
                found: other.to_string(),
                expected: "end of input",
                at: trailing.loc.position(),
            },
        });
    }

    Ok(expr)
}
