//! # Rubric Grade - the grading engine
//!
//! Ties the pipeline together: validate the author's configuration once,
//! then per submission parse the text, draw seeded random trials, evaluate
//! reference and submission over every trial, and compare within tolerance.
//! A submission is correct only when every trial agrees.
//!
//! The one call boundary a host needs is [`grade`] (or [`FormulaGrader`] /
//! [`matcher::GraderSpec`] for long-lived graders). Messages crossing that
//! boundary are filtered: parse errors and submission evaluation errors pass
//! through, configuration problems are logged and replaced by a generic
//! failure message.

pub mod compare;
pub mod config;
pub mod error;
pub mod grader;
pub mod matcher;
pub mod validate;

pub use matcher::grade;

pub mod prelude {
    pub use crate::compare::{within_tolerance, Comparer, CustomComparer};
    pub use crate::config::{
        AnswerSpec, ComparerSpec, ConstantSpec, GraderConfig, GraderSpecConfig, SamplingSpec,
        Tolerance, UserFunctionKind, UserFunctionSpec, VariableSpec,
    };
    pub use crate::error::{ConfigError, GradeError, GENERIC_FAILURE};
    pub use crate::grader::{FormulaGrader, GradingVerdict};
    pub use crate::matcher::{grade, GraderSpec, ListGrader};
}
