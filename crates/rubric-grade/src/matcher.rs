//! Assignment matching for list answers
//!
//! A list grader matches submitted items against reference items. Ordered
//! mode compares slot by slot; unordered mode finds the bijection maximizing
//! total credit (exact search over subsets, ties broken by input order).
//! Adjacent input slots sharing a group id form one atomic unit handed to a
//! nested grader, and nesting recurses: a group's grader may itself be a
//! list.

use crate::config::GraderSpecConfig;
use crate::error::{ConfigError, GradeError};
use crate::grader::{verdict_from_error, FormulaGrader, GradingVerdict};
use crate::validate::MAX_LIST_ITEMS;

/// A grader for one answer unit: a single formula, or a nested list.
pub enum GraderSpec {
    Formula(Box<FormulaGrader>),
    List(Box<ListGrader>),
}

impl GraderSpec {
    /// Build a grader tree from its configuration.
    pub fn new(config: GraderSpecConfig) -> Result<Self, ConfigError> {
        match config {
            GraderSpecConfig::Formula(cfg) => {
                Ok(GraderSpec::Formula(Box::new(FormulaGrader::new(cfg)?)))
            }
            GraderSpecConfig::List { ordered, grouping, items } => {
                let mut built = Vec::with_capacity(items.len());
                for item in items {
                    built.push(GraderSpec::new(item)?);
                }
                Ok(GraderSpec::List(Box::new(ListGrader::new(ordered, grouping, built)?)))
            }
        }
    }

    /// Number of input slots this grader consumes.
    pub fn expected_slots(&self) -> usize {
        match self {
            GraderSpec::Formula(_) => 1,
            GraderSpec::List(list) => list.slots(),
        }
    }

    /// Grade one unit of submitted texts.
    pub fn grade_unit(&self, texts: &[&str]) -> GradingVerdict {
        match self {
            GraderSpec::Formula(grader) => {
                if texts.len() == 1 {
                    grader.grade(texts[0])
                } else {
                    GradingVerdict::incorrect().with_message(format!(
                        "expected a single answer, received {}",
                        texts.len()
                    ))
                }
            }
            GraderSpec::List(list) => list.grade(texts),
        }
    }
}

/// Grader for a list of answers.
pub struct ListGrader {
    ordered: bool,
    grouping: Option<Vec<usize>>,
    items: Vec<GraderSpec>,
}

/// Split a grouping vector into runs of adjacent equal ids, returning the
/// length of each run.
fn run_lengths(grouping: &[usize]) -> Vec<usize> {
    let mut runs = Vec::new();
    let mut iter = grouping.iter();
    let Some(mut current) = iter.next() else { return runs };
    let mut len = 1;
    for id in iter {
        if id == current {
            len += 1;
        } else {
            runs.push(len);
            current = id;
            len = 1;
        }
    }
    runs.push(len);
    runs
}

impl ListGrader {
    pub fn new(
        ordered: bool,
        grouping: Option<Vec<usize>>,
        items: Vec<GraderSpec>,
    ) -> Result<Self, ConfigError> {
        if !ordered && items.len() > MAX_LIST_ITEMS {
            return Err(ConfigError::TooManyItems { got: items.len(), max: MAX_LIST_ITEMS });
        }
        if let Some(grouping) = &grouping {
            let runs = run_lengths(grouping);
            if runs.len() != items.len() {
                return Err(ConfigError::GroupCountMismatch {
                    groups: runs.len(),
                    items: items.len(),
                });
            }
        }
        Ok(ListGrader { ordered, grouping, items })
    }

    /// Number of input slots across all groups.
    pub fn slots(&self) -> usize {
        match &self.grouping {
            Some(grouping) => grouping.len(),
            None => self.items.len(),
        }
    }

    pub fn grade(&self, texts: &[&str]) -> GradingVerdict {
        let slots = self.slots();
        if texts.len() != slots {
            return GradingVerdict::incorrect().with_message(format!(
                "expected {} answers, received {}",
                slots,
                texts.len()
            ));
        }

        // Cut the flat submission into units along the grouping runs.
        let units: Vec<&[&str]> = match &self.grouping {
            Some(grouping) => {
                let mut units = Vec::new();
                let mut offset = 0;
                for len in run_lengths(grouping) {
                    units.push(&texts[offset..offset + len]);
                    offset += len;
                }
                units
            }
            None => texts.chunks(1).collect(),
        };

        if self.ordered {
            self.grade_ordered(&units)
        } else {
            self.grade_unordered(&units)
        }
    }

    fn grade_ordered(&self, units: &[&[&str]]) -> GradingVerdict {
        let verdicts: Vec<GradingVerdict> = self
            .items
            .iter()
            .zip(units)
            .map(|(item, unit)| item.grade_unit(unit))
            .collect();
        combine(&verdicts, self.items.len())
    }

    /// Optimal assignment of submission units to reference items. Exact
    /// subset DP: items are rows in order, `choice[mask]` records which unit
    /// the last-processed item took. Earlier units win ties because only a
    /// strictly better total replaces a candidate.
    fn grade_unordered(&self, units: &[&[&str]]) -> GradingVerdict {
        let n = self.items.len();

        let scores: Vec<Vec<GradingVerdict>> = self
            .items
            .iter()
            .map(|item| units.iter().map(|unit| item.grade_unit(unit)).collect())
            .collect();

        let full: usize = (1 << n) - 1;
        let mut best = vec![f64::NEG_INFINITY; full + 1];
        let mut choice = vec![usize::MAX; full + 1];
        best[0] = 0.0;
        for mask in 1..=full {
            let item = (mask as u32).count_ones() as usize - 1;
            for unit in 0..n {
                if mask & (1 << unit) == 0 {
                    continue;
                }
                let prev = best[mask & !(1 << unit)];
                if prev == f64::NEG_INFINITY {
                    continue;
                }
                let total = prev + scores[item][unit].grade;
                if total > best[mask] {
                    best[mask] = total;
                    choice[mask] = unit;
                }
            }
        }

        // Walk the choices back out into unit-indexed verdicts.
        let mut assigned: Vec<Option<&GradingVerdict>> = vec![None; n];
        let mut mask = full;
        while mask != 0 {
            let unit = choice[mask];
            let item = (mask as u32).count_ones() as usize - 1;
            assigned[unit] = Some(&scores[item][unit]);
            mask &= !(1 << unit);
        }
        let verdicts: Vec<GradingVerdict> = assigned
            .into_iter()
            .map(|v| v.cloned().unwrap_or_else(GradingVerdict::incorrect))
            .collect();
        combine(&verdicts, n)
    }
}

/// Aggregate per-unit verdicts: the grade is the mean credit, and per-unit
/// messages are numbered in input order.
fn combine(verdicts: &[GradingVerdict], n_items: usize) -> GradingVerdict {
    let total: f64 = verdicts.iter().map(|v| v.grade).sum();
    let grade = if n_items == 0 { 0.0 } else { total / n_items as f64 };

    let mut messages = Vec::new();
    for (i, verdict) in verdicts.iter().enumerate() {
        if !verdict.message.is_empty() {
            messages.push(format!("Answer {}: {}", i + 1, verdict.message));
        }
    }
    GradingVerdict::partial(grade).with_message(messages.join("\n"))
}

/// Build a grader from its configuration and grade the submitted texts in
/// one call. Configuration errors become the generic learner-facing message,
/// with the detail logged for the author.
pub fn grade(config: GraderSpecConfig, texts: &[&str]) -> GradingVerdict {
    match GraderSpec::new(config) {
        Ok(grader) => grader.grade_unit(texts),
        Err(error) => verdict_from_error(&GradeError::Config(error)),
    }
}
