//! # Rubric Sample - randomized trial data for the Rubric grader
//!
//! Sampling sets draw one value per declared name per trial; dependent
//! samplers evaluate a formula over the values drawn so far. All randomness
//! flows through an injected RNG, so a fixed seed reproduces every trial.

pub mod error;
pub mod sets;
pub mod trials;

pub mod prelude {
    pub use crate::error::{SampleError, SampleResult};
    pub use crate::sets::{FunctionSet, RandomFunctionSpec, SamplingSet};
    pub use crate::trials::{generate_trials, topological_order, Declaration};
}
