//! Evaluator
//!
//! Walks an immutable expression tree against one trial's bindings and
//! produces a [`Value`] or a categorized [`EvalError`]. Evaluation is pure:
//! the same tree and bindings always produce the same value, which is what
//! lets the grader reuse one parse across every trial.

use rubric_ast::expr::Expr;

use crate::arith;
use crate::error::{EvalError, EvalResult};
use crate::funcs;
use crate::value::{Binding, Bindings, FnValue, Tensor, Value};

/// Evaluation options
#[derive(Debug, Clone, Copy)]
pub struct EvalOptions {
    /// Maximum rank an array literal may have (1 = vectors only).
    pub max_array_dim: usize,
    /// Real-only branch mode: real inputs leaving the real domain are domain
    /// violations instead of complex results.
    pub strict_real: bool,
    /// Recursion cap; submitted expressions cannot nest deeper than this.
    pub max_depth: usize,
}

impl Default for EvalOptions {
    fn default() -> Self {
        EvalOptions { max_array_dim: 1, strict_real: false, max_depth: 200 }
    }
}

/// Evaluator over one trial's bindings.
pub struct Evaluator<'a> {
    bindings: &'a Bindings,
    options: EvalOptions,
}

impl<'a> Evaluator<'a> {
    pub fn new(bindings: &'a Bindings) -> Self {
        Evaluator { bindings, options: EvalOptions::default() }
    }

    pub fn with_options(bindings: &'a Bindings, options: EvalOptions) -> Self {
        Evaluator { bindings, options }
    }

    pub fn eval(&self, expr: &Expr) -> EvalResult<Value> {
        self.eval_at(expr, 0)
    }

    fn eval_at(&self, expr: &Expr, depth: usize) -> EvalResult<Value> {
        if depth > self.options.max_depth {
            return Err(EvalError::TooDeep);
        }

        match expr {
            Expr::Number(x) => Ok(Value::Real(*x)),

            Expr::Ident(name) => match self.bindings.get(name) {
                Some(Binding::Value(v)) => Ok(v.clone()),
                Some(Binding::Function(_)) => Err(EvalError::domain(format!(
                    "'{}' is a function; call it with arguments, like {}(x)",
                    name, name
                ))),
                None => Err(EvalError::UndefinedName(name.to_string())),
            },

            Expr::Numbered { prefix, index } => {
                let key = format!("{}_{{{}}}", prefix, index);
                match self.bindings.get(&key) {
                    Some(Binding::Value(v)) => Ok(v.clone()),
                    _ => Err(EvalError::UndefinedName(key)),
                }
            }

            Expr::Unary(op, operand) => {
                let value = self.eval_at(operand, depth + 1)?;
                arith::unary(*op, &value)
            }

            Expr::Binary(op, l, r) => {
                let lhs = self.eval_at(l, depth + 1)?;
                let rhs = self.eval_at(r, depth + 1)?;
                arith::binary(*op, &lhs, &rhs, self.options.strict_real)
            }

            Expr::Call { name, args } => self.eval_call(name, args, depth),

            Expr::Array(items) => self.eval_array(items, depth),
        }
    }

    /// Resolve and invoke a function. Trial bindings (sampled and author
    /// functions) shadow builtins; a name found in neither is an unresolved
    /// identifier, not a parse-time concern.
    fn eval_call(&self, name: &str, args: &[Expr], depth: usize) -> EvalResult<Value> {
        let resolved = match self.bindings.get(name) {
            Some(Binding::Function(f)) => Some(f.clone()),
            Some(Binding::Value(_)) => {
                return Err(EvalError::domain(format!(
                    "'{}' is a variable and cannot be called as a function",
                    name
                )))
            }
            None => {
                let lookup_name = if self.bindings.case_sensitive() {
                    name.to_string()
                } else {
                    name.to_lowercase()
                };
                funcs::lookup(&lookup_name).map(FnValue::Builtin)
            }
        };
        let Some(function) = resolved else {
            return Err(EvalError::UndefinedFunction(name.to_string()));
        };

        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval_at(arg, depth + 1)?);
        }

        match function {
            FnValue::Builtin(b) => b.apply(&values, self.options.strict_real),
            FnValue::Sampled(f) => f.invoke(&values),
            FnValue::Formula(f) => {
                if f.params.len() != values.len() {
                    return Err(EvalError::FunctionArity {
                        name: f.name.clone(),
                        expected: f.params.len(),
                        received: values.len(),
                    });
                }
                let mut scope = self.bindings.clone();
                for (param, value) in f.params.iter().zip(values) {
                    scope.insert_value(param, value);
                }
                Evaluator::with_options(&scope, self.options).eval_at(&f.body, depth + 1)
            }
        }
    }

    /// Columnized array literals: a flat literal is a column vector, a
    /// literal of literals is a matrix with the inner literals as rows, and
    /// each extra nesting level raises the rank by one. Elements must agree
    /// in shape; the final rank is capped by `max_array_dim`.
    fn eval_array(&self, items: &[Expr], depth: usize) -> EvalResult<Value> {
        let mut values = Vec::with_capacity(items.len());
        for item in items {
            values.push(self.eval_at(item, depth + 1)?);
        }

        let tensor = if values.iter().all(Value::is_scalar) {
            Tensor::vector(values.iter().map(|v| v.as_complex().unwrap()).collect())
        } else {
            let first = match &values[0] {
                Value::Tensor(t) => t.shape.clone(),
                scalar => {
                    let offender = values.iter().find(|v| !v.is_scalar()).unwrap();
                    return Err(EvalError::shape("combine", scalar.describe(), offender.describe()));
                }
            };
            let mut data = Vec::new();
            for value in &values {
                match value {
                    Value::Tensor(t) if t.shape == first => data.extend_from_slice(&t.data),
                    other => {
                        return Err(EvalError::shape(
                            "combine",
                            crate::value::describe_shape(&first),
                            other.describe(),
                        ))
                    }
                }
            }
            let mut shape = vec![values.len()];
            shape.extend_from_slice(&first);
            Tensor::new(shape, data)
        };

        if tensor.rank() > self.options.max_array_dim {
            return Err(EvalError::RankLimit {
                rank: tensor.rank(),
                max: self.options.max_array_dim,
            });
        }
        Ok(Value::Tensor(tensor))
    }
}

/// Evaluate an expression against bindings with default options.
pub fn eval(expr: &Expr, bindings: &Bindings) -> EvalResult<Value> {
    Evaluator::new(bindings).eval(expr)
}
