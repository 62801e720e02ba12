//! End-to-end grading tests
//!
//! Each test builds a grader the way a host would (from a JSON-shaped
//! config) and grades raw submitted strings through the public boundary.

use serde_json::json;

use rubric_grade::prelude::*;

fn formula_config(value: serde_json::Value) -> GraderConfig {
    serde_json::from_value(value).expect("test config must deserialize")
}

fn grader(value: serde_json::Value) -> FormulaGrader {
    FormulaGrader::new(formula_config(value)).expect("test config must validate")
}

// ============ Parse errors ============

#[test]
fn unbalanced_parentheses_are_learner_facing() {
    let g = grader(json!({
        "answers": ["m*(1-sin(2*m))"],
        "variables": [{ "name": "m", "sample_from": { "type": "real_interval", "start": 1.0, "stop": 3.0 } }],
        "seed": 7,
    }));
    let verdict = g.grade("m*(1-sin(2*m)");
    assert!(!verdict.ok);
    assert!(verdict.message.contains("unbalanced parentheses"), "got: {}", verdict.message);
}

#[test]
fn empty_submission_is_a_clean_error() {
    let g = grader(json!({ "answers": ["1"], "seed": 7 }));
    let verdict = g.grade("   ");
    assert!(!verdict.ok);
    assert!(verdict.message.contains("empty input"), "got: {}", verdict.message);
}

#[test]
fn missing_operator_is_reported_not_guessed() {
    let g = grader(json!({
        "answers": ["2*x"],
        "variables": [{ "name": "x" }],
        "seed": 7,
    }));
    let verdict = g.grade("2x");
    assert!(!verdict.ok);
    assert!(verdict.message.contains("missing operator"), "got: {}", verdict.message);
}

// ============ Numeric grading ============

#[test]
fn reference_grades_correct_against_itself() {
    let g = grader(json!({
        "answers": ["m*(1-sin(2*m))"],
        "variables": [{ "name": "m", "sample_from": { "type": "real_interval", "start": 1.0, "stop": 3.0 } }],
        "seed": 11,
    }));
    let verdict = g.grade("m*(1-sin(2*m))");
    assert!(verdict.ok);
    assert_eq!(verdict.grade, 1.0);
}

#[test]
fn algebraically_equivalent_form_is_correct() {
    let g = grader(json!({
        "answers": ["(x+1)^2"],
        "variables": [{ "name": "x" }],
        "seed": 3,
    }));
    assert!(g.grade("x^2 + 2*x + 1").ok);
    assert!(!g.grade("x^2 + 2*x").ok);
}

#[test]
fn grading_is_deterministic_per_grader() {
    let g = grader(json!({
        "answers": ["sin(x)/x"],
        "variables": [{ "name": "x" }],
        "seed": 5,
    }));
    assert_eq!(g.grade("sin(x)/x"), g.grade("sin(x)/x"));
}

#[test]
fn gamma_factorial_accepts_integer_arguments() {
    // fact(n-1) evaluates fine on integers >= 2; it is just a different
    // expression, so the verdict is plain incorrect with no error message.
    let g = grader(json!({
        "answers": ["x^n/fact(n)"],
        "variables": [
            { "name": "x" },
            { "name": "n", "sample_from": { "type": "integer_range", "start": 3, "stop": 8 } },
        ],
        "seed": 13,
    }));
    let verdict = g.grade("fact(n-1)");
    assert!(!verdict.ok);
    assert_eq!(verdict.grade, 0.0);
    assert!(verdict.message.is_empty(), "expected silence, got: {}", verdict.message);
}

#[test]
fn complex_branch_agreement_is_correct() {
    // Some trials have 1 - x < 0; both sides take the same complex branch.
    let g = grader(json!({
        "answers": ["sqrt(1-x)"],
        "variables": [{ "name": "x", "sample_from": { "type": "real_interval", "start": 0.0, "stop": 10.0 } }],
        "seed": 17,
    }));
    assert!(g.grade("sqrt(1-x)").ok);
}

#[test]
fn strict_real_declaration_makes_branch_departure_an_error() {
    let g = grader(json!({
        "answers": ["x"],
        "variables": [{ "name": "x", "strict": true, "sample_from": { "type": "real_interval", "start": 0.0, "stop": 10.0 } }],
        "seed": 17,
    }));
    let verdict = g.grade("sqrt(1-x) * 0 + x");
    assert!(!verdict.ok);
    assert!(verdict.message.contains("domain violation"), "got: {}", verdict.message);
}

#[test]
fn division_by_zero_in_submission_is_learner_facing() {
    let g = grader(json!({
        "answers": ["x"],
        "variables": [{ "name": "x" }],
        "seed": 19,
    }));
    let verdict = g.grade("x + 1/(x - x)");
    assert!(!verdict.ok);
    assert!(verdict.message.contains("division by zero"), "got: {}", verdict.message);
}

#[test]
fn undefined_name_in_submission_is_learner_facing() {
    let g = grader(json!({
        "answers": ["x"],
        "variables": [{ "name": "x" }],
        "seed": 19,
    }));
    let verdict = g.grade("x + ghost");
    assert!(!verdict.ok);
    assert!(verdict.message.contains("'ghost'"), "got: {}", verdict.message);
}

// ============ Tolerance ============

#[test]
fn tolerance_boundary_absolute() {
    let config = json!({
        "answers": ["x"],
        "variables": [{ "name": "x" }],
        "tolerance": 0.5,
        "seed": 23,
    });
    let g = grader(config);
    // Deviation strictly inside the tolerance is always correct, strictly
    // outside is always incorrect.
    assert!(g.grade("x + 0.49").ok);
    assert!(!g.grade("x + 0.51").ok);
}

#[test]
fn relative_tolerance_scales_with_magnitude() {
    let g = grader(json!({
        "answers": ["1000000 * x"],
        "variables": [{ "name": "x" }],
        "tolerance": "1%",
        "seed": 29,
    }));
    assert!(g.grade("1000000 * x + 1000").ok);
    assert!(!g.grade("1000000 * x * 1.1").ok);
}

// ============ Comparers ============

#[test]
fn congruence_comparer_mod_360() {
    let g = grader(json!({
        "answers": [{
            "formula": "b^2/a",
            "comparer": { "type": "congruence", "modulus": 360.0 },
        }],
        "variables": [{ "name": "a" }, { "name": "b" }],
        "seed": 31,
    }));
    assert!(g.grade("b^2/a + 720").ok);
    assert!(g.grade("b^2/a - 360").ok);
    assert!(!g.grade("b^2/a + 7").ok);
}

#[test]
fn linear_scale_comparer_accepts_rescaled_vectors() {
    let g = grader(json!({
        "answers": [{
            "formula": "[x, 2*x, 3]",
            "comparer": { "type": "linear_scale" },
        }],
        "variables": [{ "name": "x" }],
        "seed": 37,
    }));
    assert!(g.grade("[-2*x, -4*x, -6]").ok);
    assert!(!g.grade("[x, 2*x, 4]").ok);
}

#[test]
fn custom_comparer_sees_trial_bindings() {
    use rubric_eval::error::EvalResult;
    use rubric_eval::value::{Binding, Bindings, Value};
    use std::sync::Arc;

    // Passes when the submission equals reference + the sampled variable a.
    struct OffsetByA;
    impl CustomComparer for OffsetByA {
        fn compare(
            &self,
            reference: &Value,
            submitted: &Value,
            trial: &Bindings,
            tolerance: Tolerance,
        ) -> EvalResult<f64> {
            let a = match trial.get("a") {
                Some(Binding::Value(Value::Real(a))) => *a,
                _ => return Ok(0.0),
            };
            let (r, s) = (reference.as_real().unwrap_or(f64::NAN), submitted.as_real().unwrap_or(f64::NAN));
            let pass = ((s - r) - a).abs() <= tolerance.bound(r.abs());
            Ok(if pass { 1.0 } else { 0.0 })
        }
    }

    let config = formula_config(json!({
        "answers": ["b"],
        "variables": [{ "name": "a" }, { "name": "b" }],
        "seed": 41,
    }));
    let g = FormulaGrader::new(config)
        .expect("valid config")
        .with_custom_comparer(0, Arc::new(OffsetByA));
    assert!(g.grade("b + a").ok);
    assert!(!g.grade("b").ok);
}

// ============ Numbered variables ============

#[test]
fn numbered_variables_sample_consistently_within_a_trial() {
    let g = grader(json!({
        "answers": ["a_{0} + a_{1} + a_{-1}"],
        "numbered_vars": ["a"],
        "seed": 43,
    }));
    assert!(g.grade("a_{0} + a_{1} + a_{-1}").ok);
    // A fresh instance cancels against itself within each trial.
    assert!(g.grade("a_{0} + a_{1} + a_{-1} + a_{42} - a_{42}").ok);
    // Fresh instances are genuinely sampled, not zero.
    assert!(!g.grade("a_{0} + a_{1} + a_{-1} + a_{42}").ok);
}

#[test]
fn undeclared_numbered_prefix_is_an_unresolved_name() {
    let g = grader(json!({
        "answers": ["1"],
        "numbered_vars": ["a"],
        "seed": 47,
    }));
    let verdict = g.grade("b_{0}");
    assert!(!verdict.ok);
    assert!(verdict.message.contains("b_{0}"), "got: {}", verdict.message);
}

// ============ Functions ============

#[test]
fn user_formula_function() {
    let g = grader(json!({
        "answers": ["f(x) + 1"],
        "variables": [{ "name": "x" }],
        "user_functions": [
            { "name": "f", "type": "formula", "params": ["t"], "formula": "t^2 - t" },
        ],
        "seed": 53,
    }));
    assert!(g.grade("x^2 - x + 1").ok);
}

#[test]
fn random_function_consistent_within_trial() {
    // An unknown function under test: f is sampled fresh per trial, so
    // f(x) - f(x) is always zero, while f(x) alone never matches.
    let g = grader(json!({
        "answers": ["f(x) - f(x)"],
        "variables": [{ "name": "x" }],
        "user_functions": [{ "name": "f", "type": "random" }],
        "seed": 59,
    }));
    assert!(g.grade("0").ok);

    let g2 = grader(json!({
        "answers": ["f(x)"],
        "variables": [{ "name": "x" }],
        "user_functions": [{ "name": "f", "type": "random" }],
        "seed": 59,
    }));
    assert!(g2.grade("f(x)").ok);
    assert!(!g2.grade("0").ok);
}

#[test]
fn dependent_sampler_follows_declarations() {
    let g = grader(json!({
        "answers": ["y"],
        "variables": [
            { "name": "x" },
            { "name": "y", "formula": "2*x + 1" },
        ],
        "seed": 61,
    }));
    assert!(g.grade("2*x + 1").ok);
}

// ============ Policy checks ============

#[test]
fn wrong_answer_with_forbidden_term_is_simply_incorrect() {
    let g = grader(json!({
        "answers": ["2*sin(x)*cos(x)"],
        "variables": [{ "name": "x" }],
        "forbidden_strings": ["sin(2"],
        "seed": 67,
    }));
    let verdict = g.grade("sin(2*x) + 1");
    assert!(!verdict.ok);
    assert!(verdict.message.is_empty(), "got: {}", verdict.message);
}

#[test]
fn correct_answer_with_forbidden_term_is_a_config_error() {
    let g = grader(json!({
        "answers": ["2*sin(x)*cos(x)"],
        "variables": [{ "name": "x" }],
        "forbidden_strings": ["sin(2"],
        "seed": 67,
    }));
    let verdict = g.grade("sin(2*x)");
    assert!(!verdict.ok);
    assert_eq!(verdict.message, GENERIC_FAILURE);
}

#[test]
fn blacklisted_function_in_correct_answer_is_a_config_error() {
    let g = grader(json!({
        "answers": ["sin(x)/cos(x)"],
        "variables": [{ "name": "x" }],
        "blacklist": ["tan"],
        "seed": 71,
    }));
    assert!(g.grade("sin(x)/cos(x)").ok);
    let verdict = g.grade("tan(x)");
    assert!(!verdict.ok);
    assert_eq!(verdict.message, GENERIC_FAILURE);
}

#[test]
fn whitelist_permits_user_functions() {
    let g = grader(json!({
        "answers": ["f(x)"],
        "variables": [{ "name": "x" }],
        "user_functions": [
            { "name": "f", "type": "formula", "params": ["t"], "formula": "t + 1" },
        ],
        "whitelist": ["sin"],
        "seed": 73,
    }));
    // f is author-declared, so the whitelist does not block it.
    assert!(g.grade("f(x)").ok);
}

// ============ The config/learner boundary ============

#[test]
fn reference_eval_failure_is_generic_to_the_learner() {
    // The reference divides by zero; that is the author's fault and must not
    // leak through the boundary.
    let g = grader(json!({
        "answers": ["1/(x - x)"],
        "variables": [{ "name": "x" }],
        "seed": 79,
    }));
    let verdict = g.grade("anything");
    assert!(!verdict.ok);
    assert_eq!(verdict.message, GENERIC_FAILURE);
}

#[test]
fn name_collision_fails_at_construction() {
    let config = formula_config(json!({
        "answers": ["m"],
        "variables": [{ "name": "m" }],
        "user_constants": { "m": 2.0 },
    }));
    assert!(matches!(FormulaGrader::new(config), Err(ConfigError::DuplicateName(_))));
}

#[test]
fn top_level_grade_turns_config_errors_generic() {
    let config: GraderSpecConfig = serde_json::from_value(json!({
        "type": "formula",
        "answers": ["m"],
        "variables": [{ "name": "m" }],
        "user_constants": { "m": 2.0 },
    }))
    .unwrap();
    let verdict = grade(config, &["m"]);
    assert!(!verdict.ok);
    assert_eq!(verdict.message, GENERIC_FAILURE);
}

// ============ List grading ============

fn two_item_list(ordered: bool) -> GraderSpecConfig {
    serde_json::from_value(json!({
        "type": "list",
        "ordered": ordered,
        "items": [
            { "type": "formula", "answers": ["x + 1"], "variables": [{ "name": "x" }], "seed": 83 },
            { "type": "formula", "answers": ["x + 2"], "variables": [{ "name": "x" }], "seed": 89 },
        ],
    }))
    .unwrap()
}

#[test]
fn ordered_list_grades_slot_by_slot() {
    let verdict = grade(two_item_list(true), &["x + 1", "x + 2"]);
    assert!(verdict.ok);
    let swapped = grade(two_item_list(true), &["x + 2", "x + 1"]);
    assert!(!swapped.ok);
    assert_eq!(swapped.grade, 0.0);
}

#[test]
fn unordered_list_matches_any_permutation() {
    // Grading ["B", "A"] unordered equals grading ["A", "B"] in order.
    let ordered = grade(two_item_list(true), &["x + 1", "x + 2"]);
    let permuted = grade(two_item_list(false), &["x + 2", "x + 1"]);
    assert_eq!(ordered.ok, permuted.ok);
    assert_eq!(ordered.grade, permuted.grade);
}

#[test]
fn list_partial_credit() {
    let verdict = grade(two_item_list(true), &["x + 1", "wrong"]);
    assert!(!verdict.ok);
    assert_eq!(verdict.grade, 0.5);
}

#[test]
fn list_wrong_count_is_reported() {
    let verdict = grade(two_item_list(true), &["x + 1"]);
    assert!(!verdict.ok);
    assert!(verdict.message.contains("expected 2 answers"), "got: {}", verdict.message);
}

#[test]
fn grouped_slots_grade_jointly() {
    // An eigenvalue paired with its eigenvector: the pair is one atomic unit,
    // so a correct value with the wrong vector is wrong as a whole.
    let config: GraderSpecConfig = serde_json::from_value(json!({
        "type": "list",
        "ordered": true,
        "grouping": [1, 1],
        "items": [
            {
                "type": "list",
                "ordered": true,
                "items": [
                    { "type": "formula", "answers": ["2"], "seed": 97 },
                    {
                        "type": "formula",
                        "answers": [{ "formula": "[1, 1]", "comparer": { "type": "linear_scale" } }],
                        "max_array_dim": 1,
                        "seed": 101,
                    },
                ],
            },
        ],
    }))
    .unwrap();

    assert!(grade(config.clone(), &["2", "[3, 3]"]).ok);
    let half = grade(config, &["2", "[1, 0]"]);
    assert!(!half.ok);
    assert!(half.grade < 1.0);
}

#[test]
fn unordered_groups_permute_as_units() {
    let config: GraderSpecConfig = serde_json::from_value(json!({
        "type": "list",
        "ordered": false,
        "grouping": [1, 1, 2, 2],
        "items": [
            {
                "type": "list",
                "ordered": true,
                "items": [
                    { "type": "formula", "answers": ["1"], "seed": 103 },
                    { "type": "formula", "answers": ["[1, 0]"], "seed": 107 },
                ],
            },
            {
                "type": "list",
                "ordered": true,
                "items": [
                    { "type": "formula", "answers": ["2"], "seed": 109 },
                    { "type": "formula", "answers": ["[0, 1]"], "seed": 113 },
                ],
            },
        ],
    }))
    .unwrap();

    // The two (value, vector) pairs are supplied in the opposite order.
    assert!(grade(config, &["2", "[0, 1]", "1", "[1, 0]"]).ok);
}
