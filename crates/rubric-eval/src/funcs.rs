//! Built-in functions and constants
//!
//! All scalar functions are complex-capable. For a real input that leaves the
//! real branch domain (`sqrt(-4)`, `ln(-1)`, `arcsin(2)`) the result moves to
//! the complex plane instead of failing; in strict-real mode the same inputs
//! are domain violations. Complex inputs always take the complex path.
//!
//! Factorial is extended over the complex plane by the gamma function,
//! `fact(z) = gamma(z + 1)`, with poles at the negative integers.

use num_complex::Complex64;
use std::f64::consts::PI;

use crate::arith;
use crate::error::{low_ordinal, EvalError, EvalResult};
use crate::value::{Tensor, Value};

/// Built-in function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Sin,
    Cos,
    Tan,
    Sec,
    Csc,
    Cot,
    Arcsin,
    Arccos,
    Arctan,
    Sinh,
    Cosh,
    Tanh,
    Arcsinh,
    Arccosh,
    Arctanh,
    Sqrt,
    Ln,
    Log10,
    Log2,
    Exp,
    Abs,
    Arg,
    Re,
    Im,
    Conj,
    Fact,
    Min,
    Max,
    Cross,
    Trans,
    Adj,
    Norm,
}

/// Resolve a function name. `log` is natural log; `factorial`, `ctrans` and
/// `adjoint` are aliases.
pub fn lookup(name: &str) -> Option<Builtin> {
    let builtin = match name {
        "sin" => Builtin::Sin,
        "cos" => Builtin::Cos,
        "tan" => Builtin::Tan,
        "sec" => Builtin::Sec,
        "csc" => Builtin::Csc,
        "cot" => Builtin::Cot,
        "arcsin" => Builtin::Arcsin,
        "arccos" => Builtin::Arccos,
        "arctan" => Builtin::Arctan,
        "sinh" => Builtin::Sinh,
        "cosh" => Builtin::Cosh,
        "tanh" => Builtin::Tanh,
        "arcsinh" => Builtin::Arcsinh,
        "arccosh" => Builtin::Arccosh,
        "arctanh" => Builtin::Arctanh,
        "sqrt" => Builtin::Sqrt,
        "ln" | "log" => Builtin::Ln,
        "log10" => Builtin::Log10,
        "log2" => Builtin::Log2,
        "exp" => Builtin::Exp,
        "abs" => Builtin::Abs,
        "arg" => Builtin::Arg,
        "re" => Builtin::Re,
        "im" => Builtin::Im,
        "conj" => Builtin::Conj,
        "fact" | "factorial" => Builtin::Fact,
        "min" => Builtin::Min,
        "max" => Builtin::Max,
        "cross" => Builtin::Cross,
        "trans" => Builtin::Trans,
        "ctrans" | "adj" | "adjoint" => Builtin::Adj,
        "norm" => Builtin::Norm,
        _ => return None,
    };
    Some(builtin)
}

/// Default mathematical constants. User constants are laid over these, and an
/// author may shadow them deliberately.
pub fn default_constants() -> Vec<(&'static str, Value)> {
    vec![
        ("pi", Value::Real(PI)),
        ("e", Value::Real(std::f64::consts::E)),
        ("i", Value::Complex(Complex64::new(0.0, 1.0))),
        ("j", Value::Complex(Complex64::new(0.0, 1.0))),
    ]
}

impl Builtin {
    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Sin => "sin",
            Builtin::Cos => "cos",
            Builtin::Tan => "tan",
            Builtin::Sec => "sec",
            Builtin::Csc => "csc",
            Builtin::Cot => "cot",
            Builtin::Arcsin => "arcsin",
            Builtin::Arccos => "arccos",
            Builtin::Arctan => "arctan",
            Builtin::Sinh => "sinh",
            Builtin::Cosh => "cosh",
            Builtin::Tanh => "tanh",
            Builtin::Arcsinh => "arcsinh",
            Builtin::Arccosh => "arccosh",
            Builtin::Arctanh => "arctanh",
            Builtin::Sqrt => "sqrt",
            Builtin::Ln => "ln",
            Builtin::Log10 => "log10",
            Builtin::Log2 => "log2",
            Builtin::Exp => "exp",
            Builtin::Abs => "abs",
            Builtin::Arg => "arg",
            Builtin::Re => "re",
            Builtin::Im => "im",
            Builtin::Conj => "conj",
            Builtin::Fact => "fact",
            Builtin::Min => "min",
            Builtin::Max => "max",
            Builtin::Cross => "cross",
            Builtin::Trans => "trans",
            Builtin::Adj => "adj",
            Builtin::Norm => "norm",
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            Builtin::Min | Builtin::Max | Builtin::Cross => 2,
            _ => 1,
        }
    }

    /// Apply to already-evaluated arguments.
    pub fn apply(&self, args: &[Value], strict_real: bool) -> EvalResult<Value> {
        if args.len() != self.arity() {
            return Err(EvalError::FunctionArity {
                name: self.name().to_string(),
                expected: self.arity(),
                received: args.len(),
            });
        }

        match self {
            Builtin::Sin => lift(self.name(), &args[0], strict_real, |_| true, f64::sin, Complex64::sin),
            Builtin::Cos => lift(self.name(), &args[0], strict_real, |_| true, f64::cos, Complex64::cos),
            Builtin::Tan => lift(self.name(), &args[0], strict_real, |_| true, f64::tan, Complex64::tan),
            Builtin::Sec => lift(self.name(), &args[0], strict_real, |_| true, |x| x.cos().recip(), |c| c.cos().inv()),
            Builtin::Csc => lift(self.name(), &args[0], strict_real, |_| true, |x| x.sin().recip(), |c| c.sin().inv()),
            Builtin::Cot => lift(self.name(), &args[0], strict_real, |_| true, |x| x.tan().recip(), |c| c.tan().inv()),
            Builtin::Arcsin => lift(self.name(), &args[0], strict_real, |x| x.abs() <= 1.0, f64::asin, Complex64::asin),
            Builtin::Arccos => lift(self.name(), &args[0], strict_real, |x| x.abs() <= 1.0, f64::acos, Complex64::acos),
            Builtin::Arctan => lift(self.name(), &args[0], strict_real, |_| true, f64::atan, Complex64::atan),
            Builtin::Sinh => lift(self.name(), &args[0], strict_real, |_| true, f64::sinh, Complex64::sinh),
            Builtin::Cosh => lift(self.name(), &args[0], strict_real, |_| true, f64::cosh, Complex64::cosh),
            Builtin::Tanh => lift(self.name(), &args[0], strict_real, |_| true, f64::tanh, Complex64::tanh),
            Builtin::Arcsinh => lift(self.name(), &args[0], strict_real, |_| true, f64::asinh, Complex64::asinh),
            Builtin::Arccosh => lift(self.name(), &args[0], strict_real, |x| x >= 1.0, f64::acosh, Complex64::acosh),
            Builtin::Arctanh => lift(self.name(), &args[0], strict_real, |x| x.abs() < 1.0, f64::atanh, Complex64::atanh),
            Builtin::Sqrt => lift(self.name(), &args[0], strict_real, |x| x >= 0.0, f64::sqrt, Complex64::sqrt),
            Builtin::Ln => lift(self.name(), &args[0], strict_real, |x| x > 0.0, f64::ln, Complex64::ln),
            Builtin::Log10 => lift(self.name(), &args[0], strict_real, |x| x > 0.0, f64::log10, |c| c.ln() / std::f64::consts::LN_10),
            Builtin::Log2 => lift(self.name(), &args[0], strict_real, |x| x > 0.0, f64::log2, |c| c.ln() / std::f64::consts::LN_2),
            Builtin::Exp => lift(self.name(), &args[0], strict_real, |_| true, f64::exp, Complex64::exp),
            Builtin::Abs => abs(&args[0]),
            Builtin::Arg => {
                let c = expect_scalar(self.name(), 1, &args[0])?;
                Ok(Value::Real(c.arg()))
            }
            Builtin::Re => {
                let c = expect_scalar(self.name(), 1, &args[0])?;
                Ok(Value::Real(c.re))
            }
            Builtin::Im => {
                let c = expect_scalar(self.name(), 1, &args[0])?;
                Ok(Value::Real(c.im))
            }
            Builtin::Conj => match &args[0] {
                Value::Tensor(t) => Ok(Value::Tensor(arith::conjugate(t))),
                scalar => Ok(Value::from_complex(scalar.as_complex().unwrap().conj())),
            },
            Builtin::Fact => fact(self.name(), &args[0]),
            Builtin::Min => extremum(self.name(), args, f64::min),
            Builtin::Max => extremum(self.name(), args, f64::max),
            Builtin::Cross => cross(self.name(), args),
            Builtin::Trans => match &args[0] {
                Value::Tensor(t) => Ok(Value::Tensor(arith::transpose(t)?)),
                scalar => Ok(scalar.clone()),
            },
            Builtin::Adj => match &args[0] {
                Value::Tensor(t) => Ok(Value::Tensor(arith::transpose(&arith::conjugate(t))?)),
                scalar => Ok(Value::from_complex(scalar.as_complex().unwrap().conj())),
            },
            Builtin::Norm => match &args[0] {
                Value::Tensor(t) => Ok(Value::Real(t.norm())),
                scalar => Ok(Value::Real(scalar.as_complex().unwrap().norm())),
            },
        }
    }
}

/// Single-input report for a scalar function handed a tensor.
fn scalar_input_error(name: &str, position: usize, got: &Value) -> EvalError {
    EvalError::FunctionInputs {
        name: name.to_string(),
        report: format!(
            "{} input has an error: received a {}, expected a scalar",
            low_ordinal(position),
            got.describe()
        ),
    }
}

fn expect_scalar(name: &str, position: usize, v: &Value) -> EvalResult<Complex64> {
    v.as_complex().ok_or_else(|| scalar_input_error(name, position, v))
}

/// Lift a real function with a known real domain to the full value type. Real
/// inputs inside the domain stay real; outside it they move to the complex
/// branch, or fail in strict-real mode.
fn lift(
    name: &str,
    v: &Value,
    strict_real: bool,
    real_domain: impl Fn(f64) -> bool,
    real_f: impl Fn(f64) -> f64,
    complex_f: impl Fn(Complex64) -> Complex64,
) -> EvalResult<Value> {
    match v {
        Value::Real(x) => {
            if real_domain(*x) {
                Value::Real(real_f(*x)).checked()
            } else if strict_real {
                Err(EvalError::domain(format!(
                    "{}({}) is undefined over the reals",
                    name, x
                )))
            } else {
                Value::from_complex(complex_f(Complex64::new(*x, 0.0))).checked()
            }
        }
        Value::Complex(c) => Value::from_complex(complex_f(*c)).checked(),
        Value::Tensor(_) => Err(scalar_input_error(name, 1, v)),
    }
}

fn abs(v: &Value) -> EvalResult<Value> {
    match v {
        Value::Real(x) => Ok(Value::Real(x.abs())),
        Value::Complex(c) => Ok(Value::Real(c.norm())),
        Value::Tensor(t) => Ok(Value::Tensor(Tensor::new(
            t.shape.clone(),
            t.data.iter().map(|c| Complex64::new(c.norm(), 0.0)).collect(),
        ))),
    }
}

fn fact(name: &str, v: &Value) -> EvalResult<Value> {
    match v {
        Value::Real(x) => {
            if x.fract() == 0.0 && *x < 0.0 {
                Err(EvalError::domain(format!(
                    "factorial is undefined at the negative integer {}",
                    x
                )))
            } else {
                Value::Real(gamma_real(x + 1.0)).checked()
            }
        }
        Value::Complex(c) => {
            if c.im == 0.0 && c.re.fract() == 0.0 && c.re < 0.0 {
                Err(EvalError::domain(format!(
                    "factorial is undefined at the negative integer {}",
                    c.re
                )))
            } else {
                Value::from_complex(gamma_complex(c + 1.0)).checked()
            }
        }
        Value::Tensor(_) => Err(scalar_input_error(name, 1, v)),
    }
}

fn extremum(name: &str, args: &[Value], pick: impl Fn(f64, f64) -> f64) -> EvalResult<Value> {
    let mut values = Vec::with_capacity(args.len());
    for (k, arg) in args.iter().enumerate() {
        match arg.as_real() {
            Some(x) => values.push(x),
            None => {
                return Err(EvalError::domain(format!(
                    "{} is only defined for real numbers, its {} input was a {}",
                    name,
                    low_ordinal(k + 1),
                    match arg {
                        Value::Complex(_) => "complex number".to_string(),
                        other => other.describe(),
                    }
                )))
            }
        }
    }
    Ok(Value::Real(pick(values[0], values[1])))
}

/// Cross product with the full two-input report.
fn cross(name: &str, args: &[Value]) -> EvalResult<Value> {
    let mut report = Vec::new();
    let mut vectors = Vec::new();
    for (k, arg) in args.iter().enumerate() {
        match arg {
            Value::Tensor(t) if t.is_vector() && t.len() == 3 => {
                vectors.push(t);
                report.push(format!(
                    "{} input is ok: received a vector of length 3 as expected",
                    low_ordinal(k + 1)
                ));
            }
            other => report.push(format!(
                "{} input has an error: received a {}, expected a vector of length 3",
                low_ordinal(k + 1),
                other.describe()
            )),
        }
    }
    if vectors.len() != 2 {
        return Err(EvalError::FunctionInputs {
            name: name.to_string(),
            report: report.join("\n\t"),
        });
    }
    Value::Tensor(arith::cross(vectors[0], vectors[1])).checked()
}

// ============ Gamma (Lanczos approximation) ============

const LANCZOS_G: f64 = 7.0;
const LANCZOS: [f64; 9] = [
    0.999_999_999_999_809_9,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_6,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_572e-6,
    1.505_632_735_149_311_6e-7,
];

/// Gamma over the reals. Poles at non-positive integers are the caller's
/// responsibility; at a pole this returns an infinity that the overflow check
/// will catch.
pub fn gamma_real(x: f64) -> f64 {
    if x < 0.5 {
        // Reflection: gamma(x) = pi / (sin(pi x) * gamma(1 - x))
        PI / ((PI * x).sin() * gamma_real(1.0 - x))
    } else {
        let x = x - 1.0;
        let mut acc = LANCZOS[0];
        for (i, &c) in LANCZOS.iter().enumerate().skip(1) {
            acc += c / (x + i as f64);
        }
        let t = x + LANCZOS_G + 0.5;
        (2.0 * PI).sqrt() * t.powf(x + 0.5) * (-t).exp() * acc
    }
}

/// Gamma over the complex plane, same coefficients and reflection.
pub fn gamma_complex(z: Complex64) -> Complex64 {
    if z.re < 0.5 {
        let sin = (PI * z).sin();
        PI / (sin * gamma_complex(1.0 - z))
    } else {
        let z = z - 1.0;
        let mut acc = Complex64::new(LANCZOS[0], 0.0);
        for (i, &c) in LANCZOS.iter().enumerate().skip(1) {
            acc += c / (z + i as f64);
        }
        let t = z + LANCZOS_G + 0.5;
        (2.0 * PI).sqrt() * t.powc(z + 0.5) * (-t).exp() * acc
    }
}
