//! Configuration validation
//!
//! Runs once, before any trial: checks the declared vocabulary for
//! collisions, parses every author formula, resolves the dependent-sampler
//! order, and normalizes numeric settings. This is the only place
//! configuration-level (author) mistakes are told apart from submission-level
//! (learner) mistakes; nothing past this point should discover a bad config
//! except by failing to evaluate a reference answer.

use std::collections::HashSet;
use std::rc::Rc;

use rubric_ast::expr::Expr;
use rubric_eval::eval::EvalOptions;
use rubric_eval::funcs;
use rubric_eval::value::{Bindings, FnValue, FormulaFn, Value};
use rubric_parse::parse;
use rubric_sample::sets::{FunctionSet, RandomFunctionSpec, SamplingSet};
use rubric_sample::trials::{referenced_names, topological_order, Declaration};

use num_complex::Complex64;

use crate::compare::Comparer;
use crate::config::{
    ConstantSpec, GraderConfig, SamplingSpec, Tolerance, UserFunctionKind, VariableSpec,
};
use crate::error::ConfigError;

/// Upper bound on unordered list answers; the optimal-assignment search is
/// exponential in this count.
pub const MAX_LIST_ITEMS: usize = 20;

/// A validated, ready-to-grade configuration.
#[derive(Debug)]
pub struct ValidatedConfig {
    /// Parsed reference answers with their comparers and raw text.
    pub answers: Vec<ValidatedAnswer>,
    /// Declarations in arena order.
    pub decls: Vec<Declaration>,
    /// Topological sampling order over `decls`.
    pub order: Vec<usize>,
    /// Constants and author formula functions, cloned per trial.
    pub base: Bindings,
    /// Declared numbered-variable prefixes.
    pub numbered_prefixes: Vec<String>,
    pub options: EvalOptions,
    pub tolerance: Tolerance,
    pub samples: usize,
    pub seed: u64,
    pub case_sensitive: bool,
    pub blacklist: Vec<String>,
    pub whitelist: Vec<String>,
    pub forbidden_strings: Vec<String>,
}

#[derive(Debug)]
pub struct ValidatedAnswer {
    pub raw: String,
    pub tree: Expr,
    pub comparer: Comparer,
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn fold(name: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        name.to_string()
    } else {
        name.to_lowercase()
    }
}

/// Builtin lookup under the configured case rule: builtin names are
/// lowercase, and case-insensitive configs fold before looking up.
fn lookup_builtin(name: &str, case_sensitive: bool) -> Option<funcs::Builtin> {
    funcs::lookup(&fold(name, case_sensitive))
}

impl SamplingSpec {
    fn to_set(&self) -> SamplingSet {
        match self {
            SamplingSpec::RealInterval { start, stop } => {
                SamplingSet::RealInterval { start: *start, stop: *stop }.normalized()
            }
            SamplingSpec::IntegerRange { start, stop } => {
                SamplingSet::IntegerRange { start: *start, stop: *stop }.normalized()
            }
            SamplingSpec::ComplexRectangle { re, im } => SamplingSet::ComplexRectangle {
                re: (re[0].min(re[1]), re[0].max(re[1])),
                im: (im[0].min(im[1]), im[0].max(im[1])),
            },
            SamplingSpec::ComplexSector { modulus, argument } => SamplingSet::ComplexSector {
                modulus: (modulus[0].min(modulus[1]), modulus[0].max(modulus[1])),
                argument: (argument[0].min(argument[1]), argument[0].max(argument[1])),
            },
            SamplingSpec::DiscreteSet { values } => SamplingSet::DiscreteSet(values.clone()),
        }
    }
}

/// Validate a configuration. On success the result carries everything the
/// trial loop needs; on failure the error names the author's mistake.
pub fn validate(config: &GraderConfig) -> Result<ValidatedConfig, ConfigError> {
    if config.answers.is_empty() {
        return Err(ConfigError::NoAnswers);
    }
    if config.samples < 1 {
        return Err(ConfigError::BadSampleCount(config.samples));
    }
    if config.tolerance.value() < 0.0 {
        return Err(ConfigError::BadTolerance(config.tolerance.value()));
    }
    if config.max_array_dim < 1 {
        return Err(ConfigError::BadArrayDim);
    }
    if !config.blacklist.is_empty() && !config.whitelist.is_empty() {
        return Err(ConfigError::BlacklistAndWhitelist);
    }

    let case_sensitive = config.case_sensitive;

    // No two declared names may collide. Shadowing a default constant or a
    // builtin function is deliberate and allowed; declaring the same name
    // twice is not.
    let mut declared: HashSet<String> = HashSet::new();
    let mut declare = |name: &str| -> Result<(), ConfigError> {
        if !is_valid_name(name) {
            return Err(ConfigError::InvalidName(name.to_string()));
        }
        if !declared.insert(fold(name, case_sensitive)) {
            return Err(ConfigError::DuplicateName(name.to_string()));
        }
        Ok(())
    };

    for spec in &config.variables {
        declare(&spec.name)?;
    }
    for name in config.user_constants.keys() {
        declare(name)?;
    }
    for spec in &config.user_functions {
        declare(&spec.name)?;
    }
    for prefix in &config.numbered_vars {
        declare(prefix)?;
    }

    // Base bindings: defaults, then user constants over them, then author
    // formula functions.
    let mut base = Bindings::with_defaults(case_sensitive);
    for (name, constant) in &config.user_constants {
        let value = match constant {
            ConstantSpec::Real(x) => Value::Real(*x),
            ConstantSpec::Complex { re, im } => Value::Complex(Complex64::new(*re, *im)),
        };
        base.insert_value(name, value);
    }

    let mut decls: Vec<Declaration> = Vec::new();
    let mut formula_fns: Vec<(String, Vec<String>, Expr)> = Vec::new();
    for spec in &config.user_functions {
        match &spec.kind {
            UserFunctionKind::Formula { params, formula } => {
                let mut seen = HashSet::new();
                for param in params {
                    if !is_valid_name(param) {
                        return Err(ConfigError::InvalidName(param.clone()));
                    }
                    if !seen.insert(fold(param, case_sensitive)) {
                        return Err(ConfigError::DuplicateName(param.clone()));
                    }
                }
                let body = parse(formula).map_err(|error| ConfigError::BadFormula {
                    name: spec.name.clone(),
                    error,
                })?;
                formula_fns.push((spec.name.clone(), params.clone(), body.clone()));
                base.insert_function(
                    &spec.name,
                    FnValue::Formula(Rc::new(FormulaFn {
                        name: spec.name.clone(),
                        params: params.clone(),
                        body,
                    })),
                );
            }
            UserFunctionKind::Random { input_dim, output_dim, num_terms, center, amplitude } => {
                decls.push(Declaration::Function {
                    name: spec.name.clone(),
                    set: FunctionSet::Random(RandomFunctionSpec {
                        input_dim: *input_dim,
                        output_dim: *output_dim,
                        num_terms: *num_terms,
                        center: *center,
                        amplitude: *amplitude,
                    }),
                });
            }
            UserFunctionKind::OneOf { choices } => {
                let mut builtins = Vec::with_capacity(choices.len());
                for choice in choices {
                    let builtin = lookup_builtin(choice, case_sensitive).ok_or_else(|| {
                        ConfigError::UnknownFunction {
                            name: choice.clone(),
                            context: "function choice list",
                        }
                    })?;
                    builtins.push(builtin);
                }
                decls.push(Declaration::Function {
                    name: spec.name.clone(),
                    set: FunctionSet::Specific(builtins),
                });
            }
        }
    }

    let strict_real = config.variables.iter().any(|v| v.strict);
    for spec in &config.variables {
        decls.push(variable_declaration(spec)?);
    }

    // Every name a dependent formula or author function body mentions must
    // resolve somewhere; discovering an author typo mid-trial would leak it
    // to the learner as an unresolved-name message.
    let known = |referenced: &str, decls: &[Declaration], base: &Bindings| {
        decls
            .iter()
            .any(|d| fold(d.name(), case_sensitive) == fold(referenced, case_sensitive))
            || base.contains(referenced)
            || lookup_builtin(referenced, case_sensitive).is_some()
    };
    for decl in &decls {
        if let Declaration::Dependent { name, formula } = decl {
            for referenced in referenced_names(formula) {
                if !known(&referenced, &decls, &base) {
                    return Err(ConfigError::UnknownReference {
                        name: name.clone(),
                        referenced,
                    });
                }
            }
        }
    }
    for (name, params, body) in &formula_fns {
        for referenced in referenced_names(body) {
            let is_param = params
                .iter()
                .any(|p| fold(p, case_sensitive) == fold(&referenced, case_sensitive));
            if !is_param && !known(&referenced, &decls, &base) {
                return Err(ConfigError::UnknownReference {
                    name: name.clone(),
                    referenced,
                });
            }
        }
    }

    // Fails fast on cycles; the order is fixed for the config's lifetime.
    let order = topological_order(&decls)?;

    for name in config.blacklist.iter().chain(&config.whitelist) {
        let context = if config.whitelist.is_empty() { "blacklist" } else { "whitelist" };
        if lookup_builtin(name, case_sensitive).is_none() {
            return Err(ConfigError::UnknownFunction { name: name.clone(), context });
        }
    }

    let options = EvalOptions {
        max_array_dim: config.max_array_dim,
        strict_real,
        max_depth: EvalOptions::default().max_depth,
    };

    let mut answers = Vec::with_capacity(config.answers.len());
    for answer in &config.answers {
        let tree = parse(answer.formula()).map_err(|error| ConfigError::BadAnswer {
            formula: answer.formula().to_string(),
            error,
        })?;
        let comparer: Comparer = answer.comparer().into();
        if let Comparer::Congruence { modulus } = comparer {
            if modulus == 0.0 {
                return Err(ConfigError::BadModulus);
            }
        }
        answers.push(ValidatedAnswer {
            raw: answer.formula().to_string(),
            tree,
            comparer,
        });
    }

    Ok(ValidatedConfig {
        answers,
        decls,
        order,
        base,
        numbered_prefixes: config.numbered_vars.clone(),
        options,
        tolerance: config.tolerance,
        samples: config.samples,
        seed: config.seed.unwrap_or_else(rand::random),
        case_sensitive,
        blacklist: config.blacklist.clone(),
        whitelist: config.whitelist.clone(),
        forbidden_strings: config.forbidden_strings.clone(),
    })
}

fn variable_declaration(spec: &VariableSpec) -> Result<Declaration, ConfigError> {
    if let Some(formula) = &spec.formula {
        let tree = parse(formula).map_err(|error| ConfigError::BadFormula {
            name: spec.name.clone(),
            error,
        })?;
        return Ok(Declaration::Dependent { name: spec.name.clone(), formula: tree });
    }
    Ok(Declaration::Variable {
        name: spec.name.clone(),
        set: spec.sample_from.to_set(),
        strict: spec.strict,
    })
}
