//! Grader configuration
//!
//! The in-memory option set the host builds (directly or from JSON) to
//! construct a grader. Field names and defaults mirror the author-facing
//! configuration language: `answers`, `variables`/`sample_from`,
//! `user_constants`, `user_functions`, `numbered_vars`, `tolerance`,
//! `samples`, `case_sensitive`, `max_array_dim`, `blacklist`/`whitelist`/
//! `forbidden_strings`, plus `seed` for reproducible trials.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Configuration of a single-formula grader.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraderConfig {
    /// Reference answers; a submission matching any one of them is correct.
    pub answers: Vec<AnswerSpec>,

    /// Sampled variable declarations.
    #[serde(default, alias = "sample_from")]
    pub variables: Vec<VariableSpec>,

    /// Fixed named values laid over the default constants (pi, e, i, j).
    #[serde(default)]
    pub user_constants: BTreeMap<String, ConstantSpec>,

    /// Author-defined functions: formulas, random functions, or a choice
    /// among builtins.
    #[serde(default)]
    pub user_functions: Vec<UserFunctionSpec>,

    /// Numbered-variable prefixes: declaring `a` makes every `a_{n}` a fresh
    /// sampled scalar, consistent within a trial.
    #[serde(default)]
    pub numbered_vars: Vec<String>,

    #[serde(default)]
    pub tolerance: Tolerance,

    /// Number of random trials; every trial must agree for a submission to
    /// be correct.
    #[serde(default = "default_samples")]
    pub samples: usize,

    #[serde(default = "default_true")]
    pub case_sensitive: bool,

    /// Maximum rank of array literals a submission may use (1 = vectors).
    #[serde(default = "default_array_dim")]
    pub max_array_dim: usize,

    /// Builtin functions a submission must not use.
    #[serde(default)]
    pub blacklist: Vec<String>,

    /// If non-empty, the only builtin functions a submission may use.
    #[serde(default)]
    pub whitelist: Vec<String>,

    /// Raw substrings a submission must not contain.
    #[serde(default)]
    pub forbidden_strings: Vec<String>,

    /// Trial seed; omitted means a fresh random seed per grader.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_samples() -> usize {
    5
}

fn default_true() -> bool {
    true
}

fn default_array_dim() -> usize {
    1
}

/// One reference answer, optionally with a non-default comparer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerSpec {
    Simple(String),
    Detailed {
        formula: String,
        #[serde(default)]
        comparer: ComparerSpec,
    },
}

impl AnswerSpec {
    pub fn formula(&self) -> &str {
        match self {
            AnswerSpec::Simple(f) => f,
            AnswerSpec::Detailed { formula, .. } => formula,
        }
    }

    pub fn comparer(&self) -> ComparerSpec {
        match self {
            AnswerSpec::Simple(_) => ComparerSpec::Equality,
            AnswerSpec::Detailed { comparer, .. } => comparer.clone(),
        }
    }
}

/// Declarative comparer selection. The custom-callable comparer has no
/// configuration form; hosts attach it through
/// [`crate::grader::FormulaGrader::with_custom_comparer`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ComparerSpec {
    #[default]
    Equality,
    /// Equal modulo a constant.
    Congruence { modulus: f64 },
    /// Equal up to a nonzero scalar multiple.
    LinearScale,
}

/// A sampled variable declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariableSpec {
    pub name: String,

    #[serde(default)]
    pub sample_from: SamplingSpec,

    /// Strictly real: leaving the real domain while this configuration is in
    /// effect is a domain violation instead of a complex result.
    #[serde(default)]
    pub strict: bool,

    /// Dependent sampler: the value of this formula over the other
    /// declarations' current trial values. Overrides `sample_from`.
    #[serde(default)]
    pub formula: Option<String>,
}

/// Declarative form of a sampling set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum SamplingSpec {
    RealInterval {
        #[serde(default = "default_interval_start")]
        start: f64,
        #[serde(default = "default_interval_stop")]
        stop: f64,
    },
    IntegerRange {
        #[serde(default = "default_int_start")]
        start: i64,
        #[serde(default = "default_int_stop")]
        stop: i64,
    },
    ComplexRectangle {
        #[serde(default = "default_unit_range")]
        re: [f64; 2],
        #[serde(default = "default_unit_range")]
        im: [f64; 2],
    },
    ComplexSector {
        #[serde(default = "default_unit_range")]
        modulus: [f64; 2],
        #[serde(default = "default_argument_range")]
        argument: [f64; 2],
    },
    DiscreteSet { values: Vec<f64> },
}

fn default_interval_start() -> f64 {
    1.0
}

fn default_interval_stop() -> f64 {
    5.0
}

fn default_int_start() -> i64 {
    1
}

fn default_int_stop() -> i64 {
    5
}

fn default_unit_range() -> [f64; 2] {
    [1.0, 3.0]
}

fn default_argument_range() -> [f64; 2] {
    [0.0, std::f64::consts::FRAC_PI_2]
}

impl Default for SamplingSpec {
    fn default() -> Self {
        SamplingSpec::RealInterval {
            start: default_interval_start(),
            stop: default_interval_stop(),
        }
    }
}

/// A fixed constant value: real, or complex as `{ "re": .., "im": .. }`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConstantSpec {
    Real(f64),
    Complex { re: f64, im: f64 },
}

/// An author-defined function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserFunctionSpec {
    pub name: String,
    #[serde(flatten)]
    pub kind: UserFunctionKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UserFunctionKind {
    /// A fixed formula over named parameters.
    Formula { params: Vec<String>, formula: String },
    /// A fresh random smooth function per trial.
    Random {
        #[serde(default = "default_dim")]
        input_dim: usize,
        #[serde(default = "default_dim")]
        output_dim: usize,
        #[serde(default = "default_num_terms")]
        num_terms: usize,
        #[serde(default)]
        center: f64,
        #[serde(default = "default_amplitude")]
        amplitude: f64,
    },
    /// A uniform choice among named builtin functions per trial.
    OneOf { choices: Vec<String> },
}

fn default_dim() -> usize {
    1
}

fn default_num_terms() -> usize {
    3
}

fn default_amplitude() -> f64 {
    10.0
}

/// Numeric tolerance: absolute, or relative to the reference magnitude.
/// Deserializes from a bare number (absolute) or a percentage string like
/// `"0.01%"` (relative). The default is the relative `0.01%`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ToleranceRepr", into = "ToleranceRepr")]
pub enum Tolerance {
    Absolute(f64),
    /// Fraction of the reference magnitude (0.0001 is 0.01%).
    Relative(f64),
}

impl Default for Tolerance {
    fn default() -> Self {
        Tolerance::Relative(1e-4)
    }
}

impl Tolerance {
    /// Allowed deviation given the reference magnitude.
    pub fn bound(&self, reference_magnitude: f64) -> f64 {
        match self {
            Tolerance::Absolute(a) => *a,
            Tolerance::Relative(r) => r * reference_magnitude,
        }
    }

    pub fn value(&self) -> f64 {
        match self {
            Tolerance::Absolute(a) => *a,
            Tolerance::Relative(r) => *r,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToleranceRepr {
    Number(f64),
    Text(String),
}

impl TryFrom<ToleranceRepr> for Tolerance {
    type Error = String;

    fn try_from(repr: ToleranceRepr) -> Result<Self, Self::Error> {
        match repr {
            ToleranceRepr::Number(x) => Ok(Tolerance::Absolute(x)),
            ToleranceRepr::Text(text) => {
                let trimmed = text.trim();
                if let Some(percent) = trimmed.strip_suffix('%') {
                    let value: f64 = percent
                        .trim()
                        .parse()
                        .map_err(|_| format!("invalid tolerance '{}'", text))?;
                    Ok(Tolerance::Relative(value / 100.0))
                } else {
                    let value: f64 = trimmed
                        .parse()
                        .map_err(|_| format!("invalid tolerance '{}'", text))?;
                    Ok(Tolerance::Absolute(value))
                }
            }
        }
    }
}

impl From<Tolerance> for ToleranceRepr {
    fn from(tol: Tolerance) -> Self {
        match tol {
            Tolerance::Absolute(a) => ToleranceRepr::Number(a),
            Tolerance::Relative(r) => ToleranceRepr::Text(format!("{}%", r * 100.0)),
        }
    }
}

/// Configuration of a whole grader: a single formula, or a list of items
/// graded together, nested arbitrarily.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GraderSpecConfig {
    Formula(GraderConfig),
    List {
        #[serde(default = "default_true")]
        ordered: bool,
        /// Group id per input slot; adjacent equal ids form one atomic unit
        /// handed to the matching item grader.
        #[serde(default)]
        grouping: Option<Vec<usize>>,
        items: Vec<GraderSpecConfig>,
    },
}
