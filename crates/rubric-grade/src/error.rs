//! Grading errors and the learner-safety boundary
//!
//! Three families, with different audiences:
//!
//! * [`rubric_parse::error::ParseError`] - always learner-facing, it reflects
//!   the submitted text.
//! * [`rubric_eval::error::EvalError`] - learner-facing when the *submission*
//!   failed to evaluate; the same error from a *reference* expression means
//!   the author misconfigured the problem and becomes a [`ConfigError`].
//! * [`ConfigError`] - never shown verbatim to the learner. The detailed
//!   diagnostic goes to the log; the learner sees [`GENERIC_FAILURE`].

use rubric_eval::error::EvalError;
use rubric_parse::error::ParseError;
use rubric_sample::error::SampleError;
use thiserror::Error;

/// Fixed message shown to a learner when the failure is not theirs.
pub const GENERIC_FAILURE: &str =
    "There was a problem grading this response. Please report it to the course staff.";

/// Configuration-level (author) mistakes, found at validation time or while
/// evaluating reference expressions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("at least one reference answer is required")]
    NoAnswers,

    #[error("duplicate declaration of '{0}'")]
    DuplicateName(String),

    #[error("'{0}' is not a valid name: names start with a letter and contain only letters, digits and underscores")]
    InvalidName(String),

    #[error("reference answer '{formula}' does not parse: {error}")]
    BadAnswer { formula: String, error: ParseError },

    #[error("formula for '{name}' does not parse: {error}")]
    BadFormula { name: String, error: ParseError },

    #[error("dependent sampler '{name}' references unknown name '{referenced}'")]
    UnknownReference { name: String, referenced: String },

    #[error(transparent)]
    Sampling(#[from] SampleError),

    #[error("sample count must be at least 1, got {0}")]
    BadSampleCount(usize),

    #[error("tolerance must be non-negative, got {0}")]
    BadTolerance(f64),

    #[error("max_array_dim must be at least 1")]
    BadArrayDim,

    #[error("modulus for the congruence comparer must be nonzero")]
    BadModulus,

    #[error("'{name}' in the {context} is not a known function")]
    UnknownFunction { name: String, context: &'static str },

    #[error("blacklist and whitelist cannot both be set")]
    BlacklistAndWhitelist,

    #[error("unordered list graders support at most {max} answers, got {got}")]
    TooManyItems { got: usize, max: usize },

    #[error("grouping must cover every input slot: {got} group entries for {slots} slots")]
    BadGrouping { got: usize, slots: usize },

    #[error("grouping defines {groups} groups but {items} graders were supplied")]
    GroupCountMismatch { groups: usize, items: usize },

    #[error("reference answer failed to evaluate: {0}")]
    ReferenceEval(EvalError),

    #[error("comparer failed: {0}")]
    ComparerFailed(EvalError),

    #[error("a numerically correct submission is rejected by the grading policy ({0}); the policy is unreachable by a correct solution")]
    PolicyUnreachable(String),
}

/// Anything that can go wrong while grading one submission.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GradeError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Submission(EvalError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl GradeError {
    /// Whether the detailed message may cross the grading boundary. Only
    /// errors caused by the submission itself qualify; everything else is
    /// replaced by [`GENERIC_FAILURE`].
    pub fn learner_safe(&self) -> bool {
        matches!(self, GradeError::Parse(_) | GradeError::Submission(_))
    }
}
