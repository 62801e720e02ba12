//! Operators in grading formulas
//!
//! The operator set is deliberately small: formulas are arithmetic, not a
//! programming language. Precedence and associativity live here so the parser
//! and the pretty printer agree on them.

use serde::{Deserialize, Serialize};

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinOp {
    Add, // +
    Sub, // -
    Mul, // *
    Div, // /
    Pow, // ^
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg, // -
}

/// Operator associativity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Assoc {
    Left,
    Right,
}

impl BinOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Pow => "^",
        }
    }

    /// Operator precedence (higher = tighter binding).
    ///
    /// Unary minus sits between `*`/`/` and `^`: `-2*x` is `(-2)*x` while
    /// `-x^2` is `-(x^2)`.
    pub fn precedence(&self) -> u8 {
        match self {
            BinOp::Add | BinOp::Sub => 1,
            BinOp::Mul | BinOp::Div => 3,
            BinOp::Pow => 8,
        }
    }

    pub fn assoc(&self) -> Assoc {
        match self {
            BinOp::Pow => Assoc::Right,
            _ => Assoc::Left,
        }
    }
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
        }
    }

    /// Binding power of the prefix operator. Exponentiation binds tighter,
    /// everything else binds looser.
    pub fn precedence(&self) -> u8 {
        match self {
            UnaryOp::Neg => 5,
        }
    }
}
