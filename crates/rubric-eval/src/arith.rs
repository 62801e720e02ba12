//! Arithmetic over values
//!
//! Shape rules are exact: elementwise add/subtract wants identical shapes,
//! multiplication knows scalar scaling, dot products and matrix products, and
//! everything else is a shape mismatch naming both operands. There is no
//! broadcasting anywhere; `scalar + vector` is an error, not a spread.

use num_complex::Complex64;
use rubric_ast::op::{BinOp, UnaryOp};

use crate::error::{EvalError, EvalResult};
use crate::value::{Tensor, Value};

/// Apply a binary operator.
pub fn binary(op: BinOp, l: &Value, r: &Value, strict_real: bool) -> EvalResult<Value> {
    match op {
        BinOp::Add => add(l, r),
        BinOp::Sub => sub(l, r),
        BinOp::Mul => mul(l, r),
        BinOp::Div => div(l, r),
        BinOp::Pow => pow(l, r, strict_real),
    }
}

/// Apply a unary operator.
pub fn unary(op: UnaryOp, operand: &Value) -> EvalResult<Value> {
    match op {
        UnaryOp::Neg => neg(operand),
    }
}

pub fn neg(v: &Value) -> EvalResult<Value> {
    let negated = match v {
        Value::Real(x) => Value::Real(-x),
        Value::Complex(c) => Value::Complex(-c),
        Value::Tensor(t) => Value::Tensor(Tensor::new(
            t.shape.clone(),
            t.data.iter().map(|c| -c).collect(),
        )),
    };
    Ok(negated)
}

pub fn add(l: &Value, r: &Value) -> EvalResult<Value> {
    elementwise(l, r, "add", |a, b| a + b)
}

pub fn sub(l: &Value, r: &Value) -> EvalResult<Value> {
    elementwise(l, r, "subtract", |a, b| a - b)
}

/// Elementwise combination: scalar with scalar, or same-shape tensors.
fn elementwise(
    l: &Value,
    r: &Value,
    op: &'static str,
    f: impl Fn(Complex64, Complex64) -> Complex64,
) -> EvalResult<Value> {
    match (l, r) {
        (Value::Tensor(a), Value::Tensor(b)) => {
            if a.shape != b.shape {
                return Err(EvalError::shape(op, a.describe(), b.describe()));
            }
            let data = a.data.iter().zip(&b.data).map(|(&x, &y)| f(x, y)).collect();
            Value::Tensor(Tensor::new(a.shape.clone(), data)).checked()
        }
        (Value::Tensor(_), _) | (_, Value::Tensor(_)) => {
            Err(EvalError::shape(op, l.describe(), r.describe()))
        }
        _ => {
            // Both scalars; as_complex cannot fail here.
            let (a, b) = (l.as_complex().unwrap(), r.as_complex().unwrap());
            Value::from_complex(f(a, b)).checked()
        }
    }
}

pub fn mul(l: &Value, r: &Value) -> EvalResult<Value> {
    match (l, r) {
        (Value::Tensor(a), Value::Tensor(b)) => tensor_product(a, b),
        (Value::Tensor(t), scalar) | (scalar, Value::Tensor(t)) => {
            let s = scalar.as_complex().unwrap();
            let data = t.data.iter().map(|&c| c * s).collect();
            Value::Tensor(Tensor::new(t.shape.clone(), data)).checked()
        }
        _ => {
            let (a, b) = (l.as_complex().unwrap(), r.as_complex().unwrap());
            Value::from_complex(a * b).checked()
        }
    }
}

/// Tensor-times-tensor: dot product for vectors, matrix product otherwise.
fn tensor_product(a: &Tensor, b: &Tensor) -> EvalResult<Value> {
    match (a.rank(), b.rank()) {
        (1, 1) => {
            if a.len() != b.len() {
                return Err(EvalError::shape("multiply", a.describe(), b.describe()));
            }
            let dot = a.data.iter().zip(&b.data).map(|(&x, &y)| x * y).sum();
            Value::from_complex(dot).checked()
        }
        (2, 1) => {
            // (m x n) * (n) -> (m)
            if a.cols() != b.len() {
                return Err(EvalError::shape("multiply", a.describe(), b.describe()));
            }
            let mut data = Vec::with_capacity(a.rows());
            for i in 0..a.rows() {
                let mut sum = Complex64::new(0.0, 0.0);
                for k in 0..a.cols() {
                    sum += a.get(i, k) * b.data[k];
                }
                data.push(sum);
            }
            Value::Tensor(Tensor::vector(data)).checked()
        }
        (1, 2) => {
            // (n) * (n x p) -> (p)
            if a.len() != b.rows() {
                return Err(EvalError::shape("multiply", a.describe(), b.describe()));
            }
            let mut data = Vec::with_capacity(b.cols());
            for j in 0..b.cols() {
                let mut sum = Complex64::new(0.0, 0.0);
                for k in 0..a.len() {
                    sum += a.data[k] * b.get(k, j);
                }
                data.push(sum);
            }
            Value::Tensor(Tensor::vector(data)).checked()
        }
        (2, 2) => {
            if a.cols() != b.rows() {
                return Err(EvalError::shape("multiply", a.describe(), b.describe()));
            }
            let (m, n, p) = (a.rows(), a.cols(), b.cols());
            let mut data = Vec::with_capacity(m * p);
            for i in 0..m {
                for j in 0..p {
                    let mut sum = Complex64::new(0.0, 0.0);
                    for k in 0..n {
                        sum += a.get(i, k) * b.get(k, j);
                    }
                    data.push(sum);
                }
            }
            Value::Tensor(Tensor::new(vec![m, p], data)).checked()
        }
        _ => Err(EvalError::shape("multiply", a.describe(), b.describe())),
    }
}

pub fn div(l: &Value, r: &Value) -> EvalResult<Value> {
    match (l, r) {
        (Value::Tensor(t), scalar) if scalar.is_scalar() => {
            let s = scalar.as_complex().unwrap();
            if s.norm_sqr() == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            let data = t.data.iter().map(|&c| c / s).collect();
            Value::Tensor(Tensor::new(t.shape.clone(), data)).checked()
        }
        (Value::Tensor(_), _) | (_, Value::Tensor(_)) => {
            Err(EvalError::shape("divide", l.describe(), r.describe()))
        }
        _ => {
            let (a, b) = (l.as_complex().unwrap(), r.as_complex().unwrap());
            if b.norm_sqr() == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            Value::from_complex(a / b).checked()
        }
    }
}

pub fn pow(l: &Value, r: &Value, strict_real: bool) -> EvalResult<Value> {
    match (l, r) {
        (Value::Tensor(t), exponent) if exponent.is_scalar() => matrix_pow(t, exponent),
        (Value::Tensor(_), _) | (_, Value::Tensor(_)) => {
            Err(EvalError::shape("exponentiate", l.describe(), r.describe()))
        }
        (Value::Real(base), Value::Real(exp)) => {
            if *base == 0.0 && *exp < 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            if *base < 0.0 && exp.fract() != 0.0 {
                // Negative base, fractional exponent: the result leaves the
                // real line.
                if strict_real {
                    return Err(EvalError::domain(format!(
                        "cannot raise the negative number {} to the fractional power {} over the reals",
                        base, exp
                    )));
                }
                let c = Complex64::new(*base, 0.0).powc(Complex64::new(*exp, 0.0));
                return Value::from_complex(c).checked();
            }
            Value::Real(base.powf(*exp)).checked()
        }
        _ => {
            let (a, b) = (l.as_complex().unwrap(), r.as_complex().unwrap());
            if a.norm_sqr() == 0.0 && b.re < 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            Value::from_complex(a.powc(b)).checked()
        }
    }
}

/// Matrix exponentiation by a non-negative integer.
fn matrix_pow(t: &Tensor, exponent: &Value) -> EvalResult<Value> {
    if !t.is_square() {
        return Err(EvalError::domain(format!(
            "can only raise a square matrix to a power, received a {}",
            t.describe()
        )));
    }
    let n = match exponent.as_real() {
        Some(x) if x.fract() == 0.0 => x,
        Some(_) => {
            return Err(EvalError::domain(
                "a matrix power must be a non-negative integer".to_string(),
            ))
        }
        None => {
            return Err(EvalError::domain(
                "a matrix power must be a non-negative integer".to_string(),
            ))
        }
    };
    if n < 0.0 {
        return Err(EvalError::domain(
            "negative matrix powers are not supported".to_string(),
        ));
    }
    // Keeps pathological exponents from turning into long multiply loops.
    if n > 256.0 {
        return Err(EvalError::domain(format!(
            "matrix power {} is too large to evaluate",
            n
        )));
    }

    let mut result = Tensor::identity(t.rows());
    for _ in 0..n as u64 {
        match tensor_product(&result, t)? {
            Value::Tensor(next) => result = next,
            _ => unreachable!("square matrix product is a matrix"),
        }
    }
    Value::Tensor(result).checked()
}

// ============ Structural helpers (used by builtins) ============

/// Transpose. Vectors are unchanged, matrices swap rows and columns.
pub fn transpose(t: &Tensor) -> EvalResult<Tensor> {
    match t.rank() {
        1 => Ok(t.clone()),
        2 => {
            let (m, n) = (t.rows(), t.cols());
            let mut data = Vec::with_capacity(m * n);
            for j in 0..n {
                for i in 0..m {
                    data.push(t.get(i, j));
                }
            }
            Ok(Tensor::new(vec![n, m], data))
        }
        _ => Err(EvalError::domain(format!(
            "cannot transpose a {}",
            t.describe()
        ))),
    }
}

/// Elementwise complex conjugate.
pub fn conjugate(t: &Tensor) -> Tensor {
    Tensor::new(t.shape.clone(), t.data.iter().map(|c| c.conj()).collect())
}

/// Cross product of two 3-vectors.
pub fn cross(a: &Tensor, b: &Tensor) -> Tensor {
    let (a, b) = (&a.data, &b.data);
    Tensor::vector(vec![
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vec3(x: f64, y: f64, z: f64) -> Value {
        Value::Tensor(Tensor::vector(vec![
            Complex64::new(x, 0.0),
            Complex64::new(y, 0.0),
            Complex64::new(z, 0.0),
        ]))
    }

    fn mat2(a: f64, b: f64, c: f64, d: f64) -> Value {
        Value::Tensor(Tensor::new(
            vec![2, 2],
            vec![
                Complex64::new(a, 0.0),
                Complex64::new(b, 0.0),
                Complex64::new(c, 0.0),
                Complex64::new(d, 0.0),
            ],
        ))
    }

    #[test]
    fn test_scalar_add() {
        assert_eq!(add(&Value::Real(2.0), &Value::Real(3.0)).unwrap(), Value::Real(5.0));
    }

    #[test]
    fn test_scalar_plus_vector_is_an_error() {
        let err = add(&Value::Real(1.0), &vec3(1.0, 2.0, 3.0)).unwrap_err();
        assert!(matches!(err, EvalError::ShapeMismatch { op: "add", .. }));
    }

    #[test]
    fn test_vector_add_same_shape() {
        let sum = add(&vec3(1.0, 2.0, 3.0), &vec3(10.0, 20.0, 30.0)).unwrap();
        assert_eq!(sum, vec3(11.0, 22.0, 33.0));
    }

    #[test]
    fn test_vector_add_shape_mismatch() {
        let two = Value::Tensor(Tensor::vector(vec![Complex64::new(1.0, 0.0); 2]));
        assert!(add(&vec3(1.0, 2.0, 3.0), &two).is_err());
    }

    #[test]
    fn test_dot_product() {
        let dot = mul(&vec3(1.0, 2.0, 3.0), &vec3(4.0, 5.0, 6.0)).unwrap();
        assert_eq!(dot, Value::Real(32.0));
    }

    #[test]
    fn test_matrix_vector_product() {
        let m = mat2(1.0, 2.0, 3.0, 4.0);
        let v = Value::Tensor(Tensor::vector(vec![
            Complex64::new(1.0, 0.0),
            Complex64::new(1.0, 0.0),
        ]));
        let out = mul(&m, &v).unwrap();
        assert_eq!(
            out,
            Value::Tensor(Tensor::vector(vec![
                Complex64::new(3.0, 0.0),
                Complex64::new(7.0, 0.0),
            ]))
        );
    }

    #[test]
    fn test_matrix_product_inner_dim_mismatch() {
        let m = mat2(1.0, 2.0, 3.0, 4.0);
        let odd = Value::Tensor(Tensor::new(
            vec![3, 2],
            vec![Complex64::new(1.0, 0.0); 6],
        ));
        assert!(matches!(mul(&m, &odd), Err(EvalError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(div(&Value::Real(1.0), &Value::Real(0.0)), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn test_negative_base_fractional_power_goes_complex() {
        let out = pow(&Value::Real(-4.0), &Value::Real(0.5), false).unwrap();
        match out {
            Value::Complex(c) => {
                assert!(c.re.abs() < 1e-12);
                assert!((c.im - 2.0).abs() < 1e-12);
            }
            other => panic!("expected complex, got {:?}", other),
        }
    }

    #[test]
    fn test_negative_base_fractional_power_strict_real() {
        assert!(matches!(
            pow(&Value::Real(-4.0), &Value::Real(0.5), true),
            Err(EvalError::Domain(_))
        ));
    }

    #[test]
    fn test_matrix_power() {
        let m = mat2(1.0, 1.0, 0.0, 1.0);
        let out = pow(&m, &Value::Real(3.0), false).unwrap();
        assert_eq!(out, mat2(1.0, 3.0, 0.0, 1.0));
    }

    #[test]
    fn test_matrix_power_zero_is_identity() {
        let m = mat2(5.0, 2.0, 1.0, 3.0);
        let out = pow(&m, &Value::Real(0.0), false).unwrap();
        assert_eq!(out, mat2(1.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn test_negative_matrix_power_rejected() {
        let m = mat2(1.0, 1.0, 0.0, 1.0);
        assert!(matches!(pow(&m, &Value::Real(-1.0), false), Err(EvalError::Domain(_))));
    }

    #[test]
    fn test_transpose() {
        let m = Tensor::new(
            vec![2, 3],
            (1..=6).map(|x| Complex64::new(x as f64, 0.0)).collect(),
        );
        let t = transpose(&m).unwrap();
        assert_eq!(t.shape, vec![3, 2]);
        assert_eq!(t.get(0, 1), Complex64::new(4.0, 0.0));
    }

    #[test]
    fn test_cross_product() {
        let a = Tensor::vector(vec![
            Complex64::new(2.0, 0.0),
            Complex64::new(-1.0, 0.0),
            Complex64::new(3.0, 0.0),
        ]);
        let b = Tensor::vector(vec![
            Complex64::new(-1.0, 0.0),
            Complex64::new(4.0, 0.0),
            Complex64::new(1.0, 0.0),
        ]);
        let c = cross(&a, &b);
        assert_eq!(c.data[0], Complex64::new(-13.0, 0.0));
        assert_eq!(c.data[1], Complex64::new(-5.0, 0.0));
        assert_eq!(c.data[2], Complex64::new(7.0, 0.0));
    }

    #[test]
    fn test_overflow_detected() {
        assert_eq!(
            pow(&Value::Real(10.0), &Value::Real(1.0e9), false),
            Err(EvalError::Overflow)
        );
    }
}
