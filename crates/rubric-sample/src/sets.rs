//! Sampling sets
//!
//! A sampling set is a rule producing one random value per trial for a
//! declared variable or function. The random source is always passed in
//! explicitly, so trial generation is deterministic for a fixed seed and
//! concurrent graders never share state.

use num_complex::Complex64;
use rand::Rng;
use std::rc::Rc;

use rubric_eval::funcs::Builtin;
use rubric_eval::value::{FnValue, SinusoidFn, Value};

/// A set from which random variable samples are taken.
#[derive(Debug, Clone, PartialEq)]
pub enum SamplingSet {
    /// Uniform real in [start, stop).
    RealInterval { start: f64, stop: f64 },
    /// Uniform integer, both endpoints included.
    IntegerRange { start: i64, stop: i64 },
    /// Uniform over a rectangle in the complex plane.
    ComplexRectangle { re: (f64, f64), im: (f64, f64) },
    /// Uniform modulus and argument over an annular sector.
    ComplexSector { modulus: (f64, f64), argument: (f64, f64) },
    /// Uniform choice from a fixed, non-empty list.
    DiscreteSet(Vec<f64>),
}

impl Default for SamplingSet {
    fn default() -> Self {
        SamplingSet::RealInterval { start: 1.0, stop: 5.0 }
    }
}

fn uniform<R: Rng>(rng: &mut R, start: f64, stop: f64) -> f64 {
    start + (stop - start) * rng.gen::<f64>()
}

impl SamplingSet {
    /// Normalize reversed interval endpoints by swapping them.
    pub fn normalized(self) -> Self {
        match self {
            SamplingSet::RealInterval { start, stop } if start > stop => {
                SamplingSet::RealInterval { start: stop, stop: start }
            }
            SamplingSet::IntegerRange { start, stop } if start > stop => {
                SamplingSet::IntegerRange { start: stop, stop: start }
            }
            other => other,
        }
    }

    /// Draw one value.
    pub fn gen_sample<R: Rng>(&self, rng: &mut R) -> Value {
        match self {
            SamplingSet::RealInterval { start, stop } => Value::Real(uniform(rng, *start, *stop)),
            SamplingSet::IntegerRange { start, stop } => {
                Value::Real(rng.gen_range(*start..=*stop) as f64)
            }
            SamplingSet::ComplexRectangle { re, im } => Value::Complex(Complex64::new(
                uniform(rng, re.0, re.1),
                uniform(rng, im.0, im.1),
            )),
            SamplingSet::ComplexSector { modulus, argument } => {
                let m = uniform(rng, modulus.0, modulus.1);
                let theta = uniform(rng, argument.0, argument.1);
                Value::Complex(m * Complex64::new(0.0, theta).exp())
            }
            SamplingSet::DiscreteSet(values) => {
                Value::Real(values[rng.gen_range(0..values.len())])
            }
        }
    }
}

/// A set from which random function samples are taken.
#[derive(Debug, Clone)]
pub enum FunctionSet {
    /// A fresh smooth synthetic function per trial.
    Random(RandomFunctionSpec),
    /// Uniform choice among fixed builtin functions.
    Specific(Vec<Builtin>),
}

/// Shape of the random smooth functions: sums of `num_terms` sinusoids over
/// `input_dim` inputs, producing `output_dim` outputs scaled to oscillate
/// around `center` with roughly the given amplitude.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomFunctionSpec {
    pub input_dim: usize,
    pub output_dim: usize,
    pub num_terms: usize,
    pub center: f64,
    pub amplitude: f64,
}

impl Default for RandomFunctionSpec {
    fn default() -> Self {
        RandomFunctionSpec { input_dim: 1, output_dim: 1, num_terms: 3, center: 0.0, amplitude: 10.0 }
    }
}

impl RandomFunctionSpec {
    /// Draw the coefficient tables for one trial. Amplitudes sit in
    /// [0.5, 1), angular frequencies in [-pi, pi), phases in [0, 2*pi).
    pub fn gen_sample<R: Rng>(&self, name: &str, rng: &mut R) -> SinusoidFn {
        let n = self.output_dim * self.num_terms * self.input_dim;
        let mut a = Vec::with_capacity(n);
        let mut b = Vec::with_capacity(n);
        let mut c = Vec::with_capacity(n);
        for _ in 0..n {
            a.push(rng.gen::<f64>() / 2.0 + 0.5);
            b.push(2.0 * std::f64::consts::PI * (rng.gen::<f64>() - 0.5));
            c.push(2.0 * std::f64::consts::PI * rng.gen::<f64>());
        }
        SinusoidFn {
            name: name.to_string(),
            input_dim: self.input_dim,
            output_dim: self.output_dim,
            num_terms: self.num_terms,
            center: self.center,
            amplitude: self.amplitude,
            a,
            b,
            c,
        }
    }
}

impl FunctionSet {
    /// Draw one callable for this trial.
    pub fn gen_sample<R: Rng>(&self, name: &str, rng: &mut R) -> FnValue {
        match self {
            FunctionSet::Random(spec) => FnValue::Sampled(Rc::new(spec.gen_sample(name, rng))),
            FunctionSet::Specific(choices) => {
                FnValue::Builtin(choices[rng.gen_range(0..choices.len())])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_real_interval_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        let set = SamplingSet::RealInterval { start: -2.0, stop: 4.0 };
        for _ in 0..100 {
            match set.gen_sample(&mut rng) {
                Value::Real(x) => assert!((-2.0..4.0).contains(&x)),
                other => panic!("expected real, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_integer_range_inclusive() {
        let mut rng = StdRng::seed_from_u64(2);
        let set = SamplingSet::IntegerRange { start: -2, stop: 4 };
        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            match set.gen_sample(&mut rng) {
                Value::Real(x) => {
                    assert_eq!(x.fract(), 0.0);
                    assert!((-2.0..=4.0).contains(&x));
                    seen.insert(x as i64);
                }
                other => panic!("expected real, got {:?}", other),
            }
        }
        // Both endpoints should show up over 500 draws.
        assert!(seen.contains(&-2));
        assert!(seen.contains(&4));
    }

    #[test]
    fn test_reversed_interval_normalizes() {
        let set = SamplingSet::RealInterval { start: 4.0, stop: -2.0 }.normalized();
        assert_eq!(set, SamplingSet::RealInterval { start: -2.0, stop: 4.0 });
    }

    #[test]
    fn test_complex_rectangle() {
        let mut rng = StdRng::seed_from_u64(3);
        let set = SamplingSet::ComplexRectangle { re: (1.0, 4.0), im: (-5.0, 0.0) };
        for _ in 0..100 {
            match set.gen_sample(&mut rng) {
                Value::Complex(c) => {
                    assert!((1.0..4.0).contains(&c.re));
                    assert!((-5.0..0.0).contains(&c.im));
                }
                other => panic!("expected complex, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_complex_sector_modulus() {
        let mut rng = StdRng::seed_from_u64(4);
        let set = SamplingSet::ComplexSector {
            modulus: (1.0, 3.0),
            argument: (0.0, std::f64::consts::FRAC_PI_2),
        };
        for _ in 0..100 {
            match set.gen_sample(&mut rng) {
                Value::Complex(c) => {
                    let m = c.norm();
                    assert!((1.0 - 1e-9..3.0 + 1e-9).contains(&m));
                    assert!(c.re >= -1e-9 && c.im >= -1e-9);
                }
                other => panic!("expected complex, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_discrete_set() {
        let mut rng = StdRng::seed_from_u64(5);
        let set = SamplingSet::DiscreteSet(vec![1.0, 2.0, 3.0]);
        for _ in 0..50 {
            match set.gen_sample(&mut rng) {
                Value::Real(x) => assert!([1.0, 2.0, 3.0].contains(&x)),
                other => panic!("expected real, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_deterministic_for_fixed_seed() {
        let set = SamplingSet::default();
        let mut a = StdRng::seed_from_u64(99);
        let mut b = StdRng::seed_from_u64(99);
        for _ in 0..20 {
            assert_eq!(set.gen_sample(&mut a), set.gen_sample(&mut b));
        }
    }

    #[test]
    fn test_random_function_coefficient_ranges() {
        let mut rng = StdRng::seed_from_u64(6);
        let spec = RandomFunctionSpec::default();
        let f = spec.gen_sample("f", &mut rng);
        for &x in &f.a {
            assert!((0.5..1.0).contains(&x));
        }
        for &x in &f.b {
            assert!((-std::f64::consts::PI..std::f64::consts::PI).contains(&x));
        }
        for &x in &f.c {
            assert!((0.0..2.0 * std::f64::consts::PI).contains(&x));
        }
    }

    #[test]
    fn test_random_functions_differ_across_trials() {
        let mut rng = StdRng::seed_from_u64(7);
        let spec = RandomFunctionSpec::default();
        let f = spec.gen_sample("f", &mut rng);
        let g = spec.gen_sample("f", &mut rng);
        let x = Value::Real(1.3);
        assert_ne!(f.invoke(&[x.clone()]).unwrap(), g.invoke(&[x]).unwrap());
    }
}
