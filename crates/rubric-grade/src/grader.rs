//! The formula grader
//!
//! One grader instance holds a validated configuration. Grading a submission
//! parses it once, regenerates the seeded trial set, evaluates reference and
//! submission per trial, and requires every trial to agree. String-level
//! policy checks (blacklist, whitelist, forbidden substrings) run only after
//! numeric correctness is settled.

use std::collections::HashMap;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use rubric_ast::expr::Expr;
use rubric_eval::eval::Evaluator;
use rubric_parse::parse;
use rubric_sample::trials::generate_trials;

use crate::compare::{Comparer, CustomComparer};
use crate::config::GraderConfig;
use crate::error::{ConfigError, GradeError, GENERIC_FAILURE};
use crate::validate::{validate, ValidatedConfig};

/// Immutable result of one grading call.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct GradingVerdict {
    pub ok: bool,
    /// Credit fraction in [0, 1]; 1.0 exactly when `ok`.
    pub grade: f64,
    /// Learner-facing message. Empty for a plain correct/incorrect outcome.
    pub message: String,
}

impl GradingVerdict {
    pub fn correct() -> Self {
        GradingVerdict { ok: true, grade: 1.0, message: String::new() }
    }

    pub fn incorrect() -> Self {
        GradingVerdict { ok: false, grade: 0.0, message: String::new() }
    }

    pub fn partial(grade: f64) -> Self {
        GradingVerdict { ok: grade >= 1.0, grade, message: String::new() }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

/// Map a grading failure to a verdict, enforcing the learner-safety boundary:
/// only submission-caused messages pass through; configuration detail is
/// logged for the author and replaced by a fixed generic message.
pub fn verdict_from_error(error: &GradeError) -> GradingVerdict {
    if error.learner_safe() {
        GradingVerdict::incorrect().with_message(error.to_string())
    } else {
        tracing::error!(%error, "configuration error surfaced while grading");
        GradingVerdict::incorrect().with_message(GENERIC_FAILURE)
    }
}

/// Grader for a single formula answer (possibly with alternative reference
/// answers, each with its own comparer).
pub struct FormulaGrader {
    cfg: ValidatedConfig,
    custom: HashMap<usize, Arc<dyn CustomComparer>>,
}

impl FormulaGrader {
    /// Validate the configuration and build a grader. All author mistakes
    /// surface here, before any submission is seen.
    pub fn new(config: GraderConfig) -> Result<Self, ConfigError> {
        Ok(FormulaGrader { cfg: validate(&config)?, custom: HashMap::new() })
    }

    /// Attach a host-supplied comparer to the answer at `answer_index`,
    /// overriding its configured comparer.
    pub fn with_custom_comparer(
        mut self,
        answer_index: usize,
        comparer: Arc<dyn CustomComparer>,
    ) -> Self {
        self.custom.insert(answer_index, comparer);
        self
    }

    /// Grade one submitted string. Never panics; every failure becomes a
    /// verdict with an appropriately filtered message.
    pub fn grade(&self, text: &str) -> GradingVerdict {
        match self.grade_inner(text) {
            Ok(verdict) => verdict,
            Err(error) => verdict_from_error(&error),
        }
    }

    fn grade_inner(&self, text: &str) -> Result<GradingVerdict, GradeError> {
        let submitted = parse(text)?;

        // Numbered-variable instances used anywhere in this grading call,
        // drawn fresh per trial so repeats within a trial agree.
        let numbered = self.numbered_keys(&submitted);

        let mut rng = StdRng::seed_from_u64(self.cfg.seed);
        let trials = generate_trials(
            &self.cfg.base,
            &self.cfg.decls,
            &self.cfg.order,
            &numbered,
            self.cfg.samples,
            self.cfg.options,
            &mut rng,
        )
        .map_err(ConfigError::from)?;

        let mut best = 0.0f64;
        for (index, answer) in self.cfg.answers.iter().enumerate() {
            let comparer = match self.custom.get(&index) {
                Some(custom) => Comparer::Custom(custom.clone()),
                None => answer.comparer.clone(),
            };

            let mut credit = 1.0f64;
            for trial in &trials {
                let evaluator = Evaluator::with_options(trial, self.cfg.options);
                let reference = evaluator
                    .eval(&answer.tree)
                    .map_err(ConfigError::ReferenceEval)?;
                let value = evaluator.eval(&submitted).map_err(GradeError::Submission)?;
                let trial_credit = comparer
                    .apply(&reference, &value, trial, self.cfg.tolerance)
                    .map_err(ConfigError::ComparerFailed)?;
                credit = credit.min(trial_credit);
                if credit == 0.0 {
                    break;
                }
            }

            best = best.max(credit);
            if best >= 1.0 {
                break;
            }
        }

        let ok = best >= 1.0;
        if ok {
            // Policy checks apply only to numerically correct submissions: a
            // wrong answer using a forbidden term is simply wrong, while a
            // correct answer proving the policy reachable is the author's
            // configuration problem.
            if let Some(violation) = self.policy_violation(text, &submitted) {
                return Err(ConfigError::PolicyUnreachable(violation).into());
            }
            return Ok(GradingVerdict::correct());
        }
        Ok(GradingVerdict::partial(best))
    }

    /// Fully-formed numbered keys (`a_{3}`) for declared prefixes, collected
    /// from the submission and every reference tree.
    fn numbered_keys(&self, submitted: &Expr) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        let mut collect = |tree: &Expr| {
            tree.walk(&mut |e| {
                if let Expr::Numbered { prefix, index } = e {
                    let declared = self
                        .cfg
                        .numbered_prefixes
                        .iter()
                        .any(|p| self.fold(p) == self.fold(prefix));
                    if declared {
                        let key = format!("{}_{{{}}}", prefix, index);
                        if !keys.contains(&key) {
                            keys.push(key);
                        }
                    }
                }
            });
        };
        for answer in &self.cfg.answers {
            collect(&answer.tree);
        }
        collect(submitted);
        keys
    }

    fn fold(&self, name: &str) -> String {
        if self.cfg.case_sensitive {
            name.to_string()
        } else {
            name.to_lowercase()
        }
    }

    /// First policy violation in the submitted text, if any.
    fn policy_violation(&self, text: &str, submitted: &Expr) -> Option<String> {
        let lowered = text.to_lowercase();
        for forbidden in &self.cfg.forbidden_strings {
            if lowered.contains(&forbidden.to_lowercase()) {
                return Some(format!("submission contains the forbidden text '{}'", forbidden));
            }
        }

        let called = submitted.called_functions();
        for name in &called {
            let folded = self.fold(name);
            if self.cfg.blacklist.iter().any(|b| self.fold(b) == folded) {
                return Some(format!("submission uses the blacklisted function '{}'", name));
            }
        }

        if !self.cfg.whitelist.is_empty() {
            for name in &called {
                // Author-declared functions are always allowed; the whitelist
                // restricts builtins only.
                let declared = self.cfg.base.contains(name)
                    || self
                        .cfg
                        .decls
                        .iter()
                        .any(|d| self.fold(d.name()) == self.fold(name));
                if declared {
                    continue;
                }
                if !self.cfg.whitelist.iter().any(|w| self.fold(w) == self.fold(name)) {
                    return Some(format!(
                        "submission uses '{}', which is not on the function whitelist",
                        name
                    ));
                }
            }
        }

        None
    }
}
