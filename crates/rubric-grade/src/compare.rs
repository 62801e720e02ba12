//! Comparers
//!
//! A comparer decides, for one trial, how much credit a submitted value earns
//! against the reference value. The default is numeric equality within
//! tolerance; congruence and linear-scale comparers cover the common
//! non-identity equivalences, and the custom variant carries an opaque
//! host-supplied callable for everything else.
//!
//! Credit is a fraction in [0, 1]. A submission's credit for an answer is the
//! minimum over all trials, so "correct" means every trial agreed.

use std::sync::Arc;

use num_complex::Complex64;

use rubric_eval::error::{EvalError, EvalResult};
use rubric_eval::value::{Bindings, Value};

use crate::config::{ComparerSpec, Tolerance};

/// Host-supplied comparer: receives the reference value, the submitted value
/// and the trial's bindings (so sampled parameters are visible), and returns
/// a credit fraction.
pub trait CustomComparer {
    fn compare(
        &self,
        reference: &Value,
        submitted: &Value,
        trial: &Bindings,
        tolerance: Tolerance,
    ) -> EvalResult<f64>;
}

/// Comparer: a closed set of built-in equivalences plus one opaque custom
/// variant.
#[derive(Clone)]
pub enum Comparer {
    Equality,
    Congruence { modulus: f64 },
    LinearScale,
    Custom(Arc<dyn CustomComparer>),
}

impl std::fmt::Debug for Comparer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Comparer::Equality => write!(f, "Equality"),
            Comparer::Congruence { modulus } => write!(f, "Congruence {{ modulus: {} }}", modulus),
            Comparer::LinearScale => write!(f, "LinearScale"),
            Comparer::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

impl From<ComparerSpec> for Comparer {
    fn from(spec: ComparerSpec) -> Self {
        match spec {
            ComparerSpec::Equality => Comparer::Equality,
            ComparerSpec::Congruence { modulus } => Comparer::Congruence { modulus },
            ComparerSpec::LinearScale => Comparer::LinearScale,
        }
    }
}

impl Comparer {
    /// Credit for one trial.
    pub fn apply(
        &self,
        reference: &Value,
        submitted: &Value,
        trial: &Bindings,
        tolerance: Tolerance,
    ) -> EvalResult<f64> {
        match self {
            Comparer::Equality => Ok(credit(within_tolerance(reference, submitted, tolerance))),
            Comparer::Congruence { modulus } => congruent(reference, submitted, *modulus, tolerance),
            Comparer::LinearScale => linear_scale(reference, submitted, tolerance),
            Comparer::Custom(custom) => custom.compare(reference, submitted, trial, tolerance),
        }
    }
}

fn credit(pass: bool) -> f64 {
    if pass {
        1.0
    } else {
        0.0
    }
}

/// Numeric equality within tolerance. Scalars compare by modulus of the
/// difference; same-shape tensors by Frobenius norm of the difference. A
/// relative tolerance scales with the reference magnitude. Values of
/// different kinds or shapes are never equal.
pub fn within_tolerance(reference: &Value, submitted: &Value, tolerance: Tolerance) -> bool {
    match (reference, submitted) {
        (Value::Tensor(a), Value::Tensor(b)) => {
            if a.shape != b.shape {
                return false;
            }
            let diff: f64 = a
                .data
                .iter()
                .zip(&b.data)
                .map(|(&x, &y)| (x - y).norm_sqr())
                .sum::<f64>()
                .sqrt();
            diff <= tolerance.bound(a.norm())
        }
        (Value::Tensor(_), _) | (_, Value::Tensor(_)) => false,
        _ => {
            let (a, b) = (
                reference.as_complex().unwrap(),
                submitted.as_complex().unwrap(),
            );
            (a - b).norm() <= tolerance.bound(a.norm())
        }
    }
}

/// Equality modulo a constant: the difference must be within tolerance of
/// some integer multiple of the modulus. Real scalars only.
fn congruent(
    reference: &Value,
    submitted: &Value,
    modulus: f64,
    tolerance: Tolerance,
) -> EvalResult<f64> {
    let a = real_only(reference, "congruence comparer")?;
    let b = match submitted.as_real() {
        Some(x) => x,
        // A complex or array submission is simply not congruent.
        None => return Ok(0.0),
    };
    let diff = a - b;
    let residue = diff - modulus * (diff / modulus).round();
    Ok(credit(residue.abs() <= tolerance.bound(a.abs())))
}

fn real_only(v: &Value, what: &str) -> EvalResult<f64> {
    v.as_real().ok_or_else(|| {
        EvalError::domain(format!("the {} needs a real scalar, received a {}", what, v.describe()))
    })
}

/// Equality up to a nonzero scalar multiple. The best-fit scale factor is the
/// least-squares projection of the submission onto the reference; the
/// submission passes when the rescaled reference matches it within tolerance
/// and the factor is nonzero.
fn linear_scale(reference: &Value, submitted: &Value, tolerance: Tolerance) -> EvalResult<f64> {
    let (ref_data, sub_data): (Vec<Complex64>, Vec<Complex64>) = match (reference, submitted) {
        (Value::Tensor(a), Value::Tensor(b)) => {
            if a.shape != b.shape {
                return Ok(0.0);
            }
            (a.data.clone(), b.data.clone())
        }
        (Value::Tensor(_), _) | (_, Value::Tensor(_)) => return Ok(0.0),
        _ => (
            vec![reference.as_complex().unwrap()],
            vec![submitted.as_complex().unwrap()],
        ),
    };

    let ref_norm_sqr: f64 = ref_data.iter().map(|c| c.norm_sqr()).sum();
    let sub_norm: f64 = sub_data.iter().map(|c| c.norm_sqr()).sum::<f64>().sqrt();
    if ref_norm_sqr == 0.0 {
        // Zero reference: only a zero submission matches, at any scale.
        return Ok(credit(sub_norm <= tolerance.bound(0.0)));
    }

    let scale: Complex64 = ref_data
        .iter()
        .zip(&sub_data)
        .map(|(&r, &s)| r.conj() * s)
        .sum::<Complex64>()
        / ref_norm_sqr;
    if scale.norm() < 1e-12 {
        return Ok(0.0);
    }

    let residual: f64 = ref_data
        .iter()
        .zip(&sub_data)
        .map(|(&r, &s)| (s - scale * r).norm_sqr())
        .sum::<f64>()
        .sqrt();
    Ok(credit(residual <= tolerance.bound(sub_norm)))
}
