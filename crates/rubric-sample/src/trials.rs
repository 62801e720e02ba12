//! Trial generation
//!
//! A trial is one independent draw of values for every declared name. The
//! declarations are held in an arena (a plain vector); dependent samplers
//! reference other declarations by name and are topologically ordered once at
//! configuration time, so per-trial generation is a single ordered pass.

use rand::Rng;

use rubric_ast::expr::Expr;
use rubric_eval::eval::{EvalOptions, Evaluator};
use rubric_eval::value::Bindings;

use crate::error::{SampleError, SampleResult};
use crate::sets::{FunctionSet, SamplingSet};

/// One declared name and how to sample it.
#[derive(Debug, Clone)]
pub enum Declaration {
    /// A sampled variable. `strict` marks it as strictly real: evaluation
    /// over strict declarations refuses complex branch departures.
    Variable { name: String, set: SamplingSet, strict: bool },
    /// A sampled function.
    Function { name: String, set: FunctionSet },
    /// A value computed from other declarations' current trial values.
    Dependent { name: String, formula: Expr },
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Declaration::Variable { name, .. } => name,
            Declaration::Function { name, .. } => name,
            Declaration::Dependent { name, .. } => name,
        }
    }
}

/// Names a dependent declaration's formula refers to (identifiers and called
/// functions alike; anything that is not a declared name is resolved by the
/// ambient bindings at evaluation time).
pub fn referenced_names(formula: &Expr) -> Vec<String> {
    let mut names = Vec::new();
    formula.walk(&mut |e| match e {
        Expr::Ident(name) => {
            if !names.iter().any(|n| n == name.as_ref()) {
                names.push(name.to_string());
            }
        }
        Expr::Call { name, .. } => {
            if !names.iter().any(|n| n == name.as_ref()) {
                names.push(name.to_string());
            }
        }
        _ => {}
    });
    names
}

/// Order declarations so every dependent sampler runs after everything it
/// references. Fails with the offending names when the references form a
/// cycle. Kahn's algorithm over declaration indices.
pub fn topological_order(decls: &[Declaration]) -> SampleResult<Vec<usize>> {
    let index_of = |name: &str| decls.iter().position(|d| d.name() == name);

    // edges[i] holds the declarations that must run before declaration i.
    let mut before: Vec<Vec<usize>> = vec![Vec::new(); decls.len()];
    for (i, decl) in decls.iter().enumerate() {
        if let Declaration::Dependent { formula, .. } = decl {
            for referenced in referenced_names(formula) {
                if let Some(j) = index_of(&referenced) {
                    if j != i {
                        before[i].push(j);
                    }
                }
            }
        }
    }

    let mut remaining: Vec<usize> = (0..decls.len()).collect();
    let mut done = vec![false; decls.len()];
    let mut order = Vec::with_capacity(decls.len());
    while !remaining.is_empty() {
        let ready: Vec<usize> = remaining
            .iter()
            .copied()
            .filter(|&i| before[i].iter().all(|&j| done[j]))
            .collect();
        if ready.is_empty() {
            let names: Vec<&str> = remaining.iter().map(|&i| decls[i].name()).collect();
            return Err(SampleError::Cycle { names: names.join(", ") });
        }
        for i in ready {
            done[i] = true;
            order.push(i);
            remaining.retain(|&r| r != i);
        }
    }
    Ok(order)
}

/// Generate `count` independent trials.
///
/// * `base` carries constants and author-defined functions and is cloned
///   fresh per trial.
/// * `decls` are sampled in the given `order` (see [`topological_order`]).
/// * `numbered` lists fully-formed numbered-variable keys (`a_{3}`) that the
///   expressions under test use; each gets a fresh default-interval scalar
///   per trial, so repeated occurrences within a trial agree.
pub fn generate_trials<R: Rng>(
    base: &Bindings,
    decls: &[Declaration],
    order: &[usize],
    numbered: &[String],
    count: usize,
    options: EvalOptions,
    rng: &mut R,
) -> SampleResult<Vec<Bindings>> {
    let numbered_set = SamplingSet::default();
    let mut trials = Vec::with_capacity(count);

    for _ in 0..count {
        let mut bindings = base.clone();
        for &i in order {
            match &decls[i] {
                Declaration::Variable { name, set, .. } => {
                    bindings.insert_value(name, set.gen_sample(rng));
                }
                Declaration::Function { name, set } => {
                    bindings.insert_function(name, set.gen_sample(name, rng));
                }
                Declaration::Dependent { name, formula } => {
                    let value = Evaluator::with_options(&bindings, options)
                        .eval(formula)
                        .map_err(|error| SampleError::Dependent {
                            name: name.clone(),
                            error,
                        })?;
                    bindings.insert_value(name, value);
                }
            }
        }
        for key in numbered {
            bindings.insert_value(key, numbered_set.gen_sample(rng));
        }
        trials.push(bindings);
    }

    Ok(trials)
}
