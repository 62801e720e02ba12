//! Runtime values for formula evaluation
//!
//! A [`Value`] is a real scalar, a complex scalar, or a tensor of complex
//! entries with an explicit shape (rank 1 = vector, rank 2 = matrix). Shapes
//! never broadcast: an operation either has a defined shape rule or fails
//! with a shape mismatch naming both operands.

use std::collections::HashMap;
use std::rc::Rc;

use num_complex::Complex64;
use rubric_ast::expr::Expr;

use crate::error::{low_ordinal, EvalError, EvalResult};

/// Runtime value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Real(f64),
    Complex(Complex64),
    Tensor(Tensor),
}

/// Dense tensor of complex entries, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    pub shape: Vec<usize>,
    pub data: Vec<Complex64>,
}

impl Tensor {
    pub fn new(shape: Vec<usize>, data: Vec<Complex64>) -> Self {
        debug_assert_eq!(shape.iter().product::<usize>(), data.len());
        Tensor { shape, data }
    }

    pub fn vector(data: Vec<Complex64>) -> Self {
        Tensor { shape: vec![data.len()], data }
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_vector(&self) -> bool {
        self.rank() == 1
    }

    pub fn is_matrix(&self) -> bool {
        self.rank() == 2
    }

    pub fn is_square(&self) -> bool {
        self.is_matrix() && self.shape[0] == self.shape[1]
    }

    /// Rows of a matrix (rank 2 only).
    pub fn rows(&self) -> usize {
        self.shape[0]
    }

    /// Columns of a matrix (rank 2 only).
    pub fn cols(&self) -> usize {
        self.shape[1]
    }

    /// Matrix entry at (row, col). Rank 2 only.
    pub fn get(&self, row: usize, col: usize) -> Complex64 {
        self.data[row * self.cols() + col]
    }

    /// The n-by-n identity matrix.
    pub fn identity(n: usize) -> Self {
        let mut data = vec![Complex64::new(0.0, 0.0); n * n];
        for i in 0..n {
            data[i * n + i] = Complex64::new(1.0, 0.0);
        }
        Tensor { shape: vec![n, n], data }
    }

    /// Frobenius norm.
    pub fn norm(&self) -> f64 {
        self.data.iter().map(|c| c.norm_sqr()).sum::<f64>().sqrt()
    }

    /// Learner-facing description: "vector of length 3",
    /// "matrix of shape (rows: 2, cols: 3)", "tensor of shape (2, 3, 4)".
    pub fn describe(&self) -> String {
        describe_shape(&self.shape)
    }
}

/// Learner-facing description of a shape.
pub fn describe_shape(shape: &[usize]) -> String {
    match shape {
        [n] => format!("vector of length {}", n),
        [r, c] => format!("matrix of shape (rows: {}, cols: {})", r, c),
        dims => {
            let joined: Vec<String> = dims.iter().map(|d| d.to_string()).collect();
            format!("tensor of shape ({})", joined.join(", "))
        }
    }
}

impl Value {
    /// Wrap a complex result, demoting to `Real` when the imaginary part is
    /// exactly zero.
    pub fn from_complex(c: Complex64) -> Self {
        if c.im == 0.0 {
            Value::Real(c.re)
        } else {
            Value::Complex(c)
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Value::Real(_) | Value::Complex(_))
    }

    /// Scalar value as a complex number; `None` for tensors.
    pub fn as_complex(&self) -> Option<Complex64> {
        match self {
            Value::Real(x) => Some(Complex64::new(*x, 0.0)),
            Value::Complex(c) => Some(*c),
            Value::Tensor(_) => None,
        }
    }

    /// Real scalar value; `None` for complex scalars and tensors.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(x) => Some(*x),
            _ => None,
        }
    }

    /// Check that every component is finite, mapping infinities and NaNs to
    /// an overflow error.
    pub fn checked(self) -> EvalResult<Value> {
        let finite = match &self {
            Value::Real(x) => x.is_finite(),
            Value::Complex(c) => c.re.is_finite() && c.im.is_finite(),
            Value::Tensor(t) => t.data.iter().all(|c| c.re.is_finite() && c.im.is_finite()),
        };
        if finite {
            Ok(self)
        } else {
            Err(EvalError::Overflow)
        }
    }

    /// Learner-facing description of what kind of value this is.
    pub fn describe(&self) -> String {
        match self {
            Value::Real(_) | Value::Complex(_) => "scalar".to_string(),
            Value::Tensor(t) => t.describe(),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Real(x) => write!(f, "{}", x),
            Value::Complex(c) => write!(f, "{}", c),
            Value::Tensor(t) => {
                write!(f, "[")?;
                for (i, c) in t.data.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", c)?;
                }
                write!(f, "]")
            }
        }
    }
}

// ============ Functions ============

/// A function callable from a formula. Closed set of variants: builtins,
/// author formula functions, and per-trial sampled functions.
#[derive(Debug, Clone)]
pub enum FnValue {
    Builtin(crate::funcs::Builtin),
    Formula(Rc<FormulaFn>),
    Sampled(Rc<SinusoidFn>),
}

impl FnValue {
    pub fn name(&self) -> &str {
        match self {
            FnValue::Builtin(b) => b.name(),
            FnValue::Formula(f) => &f.name,
            FnValue::Sampled(s) => &s.name,
        }
    }
}

/// Author-defined function: named parameters plus a body tree, evaluated with
/// the parameters bound over the ambient trial bindings.
#[derive(Debug, Clone)]
pub struct FormulaFn {
    pub name: String,
    pub params: Vec<String>,
    pub body: Expr,
}

/// One sampled smooth function: a finite sum of sinusoids
///
///   y_i = center + (amplitude / num_terms) * sum_jk a[i,j,k] * sin(b[i,j,k] * x_k + c[i,j,k])
///
/// The coefficient tables are drawn once per trial; invoking the function is
/// then fully deterministic for the rest of that trial.
#[derive(Debug, Clone)]
pub struct SinusoidFn {
    pub name: String,
    pub input_dim: usize,
    pub output_dim: usize,
    pub num_terms: usize,
    pub center: f64,
    pub amplitude: f64,
    /// Flattened `[output][term][input]` coefficient tables.
    pub a: Vec<f64>,
    pub b: Vec<f64>,
    pub c: Vec<f64>,
}

impl SinusoidFn {
    pub fn invoke(&self, args: &[Value]) -> EvalResult<Value> {
        if args.len() != self.input_dim {
            return Err(EvalError::FunctionArity {
                name: self.name.clone(),
                expected: self.input_dim,
                received: args.len(),
            });
        }

        let mut xs = Vec::with_capacity(self.input_dim);
        let mut report = Vec::new();
        let mut any_bad = false;
        for (k, arg) in args.iter().enumerate() {
            match arg.as_real() {
                Some(x) => {
                    xs.push(x);
                    report.push(format!("{} input is ok: received a scalar as expected", low_ordinal(k + 1)));
                }
                None => {
                    any_bad = true;
                    xs.push(0.0);
                    report.push(format!(
                        "{} input has an error: received a {}, expected a scalar",
                        low_ordinal(k + 1),
                        arg.describe()
                    ));
                }
            }
        }
        if any_bad {
            return Err(EvalError::FunctionInputs {
                name: self.name.clone(),
                report: report.join("\n\t"),
            });
        }

        let mut out = Vec::with_capacity(self.output_dim);
        for i in 0..self.output_dim {
            let mut sum = 0.0;
            for j in 0..self.num_terms {
                for (k, &x) in xs.iter().enumerate() {
                    let idx = (i * self.num_terms + j) * self.input_dim + k;
                    sum += self.a[idx] * (self.b[idx] * x + self.c[idx]).sin();
                }
            }
            out.push(self.center + self.amplitude / self.num_terms as f64 * sum);
        }

        if self.output_dim == 1 {
            Ok(Value::Real(out[0]))
        } else {
            Ok(Value::Tensor(Tensor::vector(
                out.into_iter().map(|x| Complex64::new(x, 0.0)).collect(),
            )))
        }
    }
}

// ============ Bindings ============

/// What a name resolves to during evaluation.
#[derive(Debug, Clone)]
pub enum Binding {
    Value(Value),
    Function(FnValue),
}

/// Trial bindings: name to value/function map, built fresh for each trial and
/// read-only while the trial's expressions are evaluated.
///
/// When `case_sensitive` is off, keys are folded to lowercase at insertion
/// and lookup; the parser never folds, so error messages keep the learner's
/// original spelling.
#[derive(Debug, Clone)]
pub struct Bindings {
    map: HashMap<String, Binding>,
    case_sensitive: bool,
}

impl Bindings {
    pub fn new(case_sensitive: bool) -> Self {
        Bindings { map: HashMap::new(), case_sensitive }
    }

    /// Bindings preloaded with the default mathematical constants.
    pub fn with_defaults(case_sensitive: bool) -> Self {
        let mut bindings = Bindings::new(case_sensitive);
        for (name, value) in crate::funcs::default_constants() {
            bindings.insert_value(name, value);
        }
        bindings
    }

    fn key(&self, name: &str) -> String {
        if self.case_sensitive {
            name.to_string()
        } else {
            name.to_lowercase()
        }
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn insert_value(&mut self, name: &str, value: Value) {
        self.map.insert(self.key(name), Binding::Value(value));
    }

    pub fn insert_function(&mut self, name: &str, f: FnValue) {
        self.map.insert(self.key(name), Binding::Function(f));
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.map.get(&self.key(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(&self.key(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe() {
        assert_eq!(Value::Real(2.0).describe(), "scalar");
        assert_eq!(
            Value::Tensor(Tensor::vector(vec![Complex64::new(1.0, 0.0); 3])).describe(),
            "vector of length 3"
        );
        let m = Tensor::new(vec![2, 3], vec![Complex64::new(0.0, 0.0); 6]);
        assert_eq!(m.describe(), "matrix of shape (rows: 2, cols: 3)");
    }

    #[test]
    fn test_from_complex_demotes_real() {
        assert_eq!(Value::from_complex(Complex64::new(2.0, 0.0)), Value::Real(2.0));
        assert_eq!(
            Value::from_complex(Complex64::new(0.0, 1.0)),
            Value::Complex(Complex64::new(0.0, 1.0))
        );
    }

    #[test]
    fn test_checked_overflow() {
        assert_eq!(Value::Real(f64::INFINITY).checked(), Err(EvalError::Overflow));
        assert!(Value::Real(1.0e300).checked().is_ok());
    }

    #[test]
    fn test_case_insensitive_bindings() {
        let mut bindings = Bindings::new(false);
        bindings.insert_value("Mass", Value::Real(2.0));
        assert!(bindings.get("mass").is_some());
        assert!(bindings.get("MASS").is_some());
    }

    #[test]
    fn test_case_sensitive_bindings() {
        let mut bindings = Bindings::new(true);
        bindings.insert_value("M", Value::Real(2.0));
        assert!(bindings.get("M").is_some());
        assert!(bindings.get("m").is_none());
    }

    #[test]
    fn test_sinusoid_consistency() {
        let f = SinusoidFn {
            name: "f".into(),
            input_dim: 1,
            output_dim: 1,
            num_terms: 2,
            center: 0.0,
            amplitude: 10.0,
            a: vec![0.7, 0.9],
            b: vec![1.1, -2.3],
            c: vec![0.4, 5.0],
        };
        let first = f.invoke(&[Value::Real(1.2)]).unwrap();
        let second = f.invoke(&[Value::Real(1.2)]).unwrap();
        assert_eq!(first, second);
        let other = f.invoke(&[Value::Real(1.3)]).unwrap();
        assert_ne!(first, other);
    }

    #[test]
    fn test_sinusoid_input_report() {
        let f = SinusoidFn {
            name: "f".into(),
            input_dim: 1,
            output_dim: 1,
            num_terms: 1,
            center: 0.0,
            amplitude: 10.0,
            a: vec![0.5],
            b: vec![1.0],
            c: vec![0.0],
        };
        let bad = Value::Tensor(Tensor::vector(vec![Complex64::new(1.0, 0.0); 2]));
        let err = f.invoke(&[bad]).unwrap_err();
        match err {
            EvalError::FunctionInputs { report, .. } => {
                assert!(report.contains("1st input has an error"));
                assert!(report.contains("vector of length 2"));
            }
            other => panic!("expected FunctionInputs, got {:?}", other),
        }
    }
}
