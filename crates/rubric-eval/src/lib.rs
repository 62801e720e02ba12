//! # Rubric Eval - multi-domain expression evaluator
//!
//! Evaluates parsed formula trees over real scalars, complex scalars, vectors
//! and matrices, with precise shape rules and a categorized error taxonomy.

pub mod arith;
pub mod error;
pub mod eval;
pub mod funcs;
pub mod value;

pub mod prelude {
    pub use crate::error::{EvalError, EvalResult};
    pub use crate::eval::{eval, EvalOptions, Evaluator};
    pub use crate::funcs::{default_constants, gamma_complex, gamma_real, Builtin};
    pub use crate::value::{Binding, Bindings, FnValue, FormulaFn, SinusoidFn, Tensor, Value};
}
