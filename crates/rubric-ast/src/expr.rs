//! Expression trees
//!
//! The core AST node. A tree is immutable once parsed: it carries no
//! back-references and no interior mutability, so one parse can be
//! re-evaluated across any number of sampling trials.

use serde::{Deserialize, Serialize};

use crate::op::{BinOp, UnaryOp};

/// Expression (the core AST node)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Numeric literal
    Number(f64),

    /// Named reference (variable, constant, or zero-argument symbol)
    Ident(Box<str>),

    /// Numbered variable: `a_{3}`, `a_{-1}`. The prefix names a declared
    /// family; the subscript selects one member of it.
    Numbered { prefix: Box<str>, index: i64 },

    /// Unary operation
    Unary(UnaryOp, Box<Expr>),

    /// Binary operation
    Binary(BinOp, Box<Expr>, Box<Expr>),

    /// Function call: `name(arg, arg, ...)`
    Call { name: Box<str>, args: Vec<Expr> },

    /// Array literal: `[e, e, ...]`. Nested literals denote matrices with
    /// the inner literals as rows.
    Array(Vec<Expr>),
}

// ============ Constructors ============

impl Expr {
    pub fn number(x: f64) -> Self {
        Expr::Number(x)
    }

    pub fn ident(name: impl Into<Box<str>>) -> Self {
        Expr::Ident(name.into())
    }

    pub fn numbered(prefix: impl Into<Box<str>>, index: i64) -> Self {
        Expr::Numbered { prefix: prefix.into(), index }
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary(op, Box::new(operand))
    }

    pub fn neg(operand: Expr) -> Self {
        Expr::unary(UnaryOp::Neg, operand)
    }

    pub fn binary(op: BinOp, l: Expr, r: Expr) -> Self {
        Expr::Binary(op, Box::new(l), Box::new(r))
    }

    pub fn add(l: Expr, r: Expr) -> Self {
        Expr::binary(BinOp::Add, l, r)
    }

    pub fn sub(l: Expr, r: Expr) -> Self {
        Expr::binary(BinOp::Sub, l, r)
    }

    pub fn mul(l: Expr, r: Expr) -> Self {
        Expr::binary(BinOp::Mul, l, r)
    }

    pub fn div(l: Expr, r: Expr) -> Self {
        Expr::binary(BinOp::Div, l, r)
    }

    pub fn pow(l: Expr, r: Expr) -> Self {
        Expr::binary(BinOp::Pow, l, r)
    }

    pub fn call(name: impl Into<Box<str>>, args: Vec<Expr>) -> Self {
        Expr::Call { name: name.into(), args }
    }

    pub fn array(items: Vec<Expr>) -> Self {
        Expr::Array(items)
    }
}

// ============ Traversal ============

impl Expr {
    /// Pre-order walk over every node in the tree.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Expr)) {
        f(self);
        match self {
            Expr::Number(_) | Expr::Ident(_) | Expr::Numbered { .. } => {}
            Expr::Unary(_, operand) => operand.walk(f),
            Expr::Binary(_, l, r) => {
                l.walk(f);
                r.walk(f);
            }
            Expr::Call { args, .. } => {
                for arg in args {
                    arg.walk(f);
                }
            }
            Expr::Array(items) => {
                for item in items {
                    item.walk(f);
                }
            }
        }
    }

    /// Names of all functions called anywhere in the tree.
    pub fn called_functions(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.walk(&mut |e| {
            if let Expr::Call { name, .. } = e {
                if !names.contains(&name.as_ref()) {
                    names.push(name.as_ref());
                }
            }
        });
        names
    }

    /// Depth of the tree (a single leaf has depth 1).
    pub fn depth(&self) -> usize {
        match self {
            Expr::Number(_) | Expr::Ident(_) | Expr::Numbered { .. } => 1,
            Expr::Unary(_, operand) => 1 + operand.depth(),
            Expr::Binary(_, l, r) => 1 + l.depth().max(r.depth()),
            Expr::Call { args, .. } => {
                1 + args.iter().map(Expr::depth).max().unwrap_or(0)
            }
            Expr::Array(items) => {
                1 + items.iter().map(Expr::depth).max().unwrap_or(0)
            }
        }
    }
}

// ============ Display ============

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Number(x) => write!(f, "{}", x),
            Expr::Ident(name) => write!(f, "{}", name),
            Expr::Numbered { prefix, index } => write!(f, "{}_{{{}}}", prefix, index),
            Expr::Unary(op, operand) => write!(f, "{}{}", op.symbol(), operand),
            Expr::Binary(op, l, r) => write!(f, "({} {} {})", l, op.symbol(), r),
            Expr::Call { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expr::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}
