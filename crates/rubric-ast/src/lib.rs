//! # Rubric AST
//!
//! Expression trees for the Rubric formula grader.
//!
//! A grading formula parses into an [`expr::Expr`] tree: numbers,
//! identifiers, numbered variables (`a_{3}`), unary/binary arithmetic,
//! function calls and array literals. Trees are immutable and carry no
//! source positions (the parser reports positions; the tree is what gets
//! evaluated, many times, against sampled trial data).

pub mod expr;
pub mod op;
pub mod ser;

/// Prelude - common imports
pub mod prelude {
    pub use crate::expr::Expr;
    pub use crate::op::{Assoc, BinOp, UnaryOp};
    pub use crate::ser;
}
