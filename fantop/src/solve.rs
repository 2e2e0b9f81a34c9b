//! The draft model: validate the input, build and optimize the integer
//! program, then read the picks back out.

use crate::error::{FantopError, Result};
use crate::schema::{
    input_schema, solution_schema, FLEX_ELIGIBLE, MAX_FLEX_STARTERS, RESERVE_WEIGHT, STARTER_WEIGHT,
};
use good_lp::{
    constraint, microlp, variable, Expression, ProblemVariables, ResolutionError, Solution,
    SolverModel, Variable,
};
use std::collections::{BTreeMap, BTreeSet};
use tic_guard::core::{PrimaryKey, Table, TicDat, Value};
use tic_guard::logging::{truncate_field, LogConfig};
use tic_guard::{log_data_op, log_detail, log_row};
use tracing::{info, instrument, warn};

/// Options for [`solve`].
#[derive(Debug, Clone)]
pub struct SolveOptions {
    /// How close to 1 a binary variable must be to count as picked
    pub tolerance: f64,
    /// Verbosity of the per-player log lines
    pub log: LogConfig,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-4,
            log: LogConfig::default(),
        }
    }
}

impl SolveOptions {
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_log_config(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }
}

/// A player I could still end up with.
struct Candidate {
    key: PrimaryKey,
    position: Value,
    points: f64,
    expected_pick: i64,
    already_mine: bool,
    flex: bool,
    starter: Variable,
    reserve: Variable,
}

/// Plans the rest of my draft.
///
/// Returns `Ok(None)` when no draft extending the current one by at least
/// one pick satisfies the roster requirements. A draft with fewer picks
/// than I own is returned with a warning.
#[instrument(skip(dat, options), fields(rows = dat.row_count()))]
pub fn solve(dat: &TicDat, options: &SolveOptions) -> Result<Option<TicDat>> {
    let schema = input_schema()?;
    let report = schema.validate(dat);
    if !report.is_success() {
        return Err(FantopError::invalid_report(report));
    }

    let players = dat.table("players")?;
    let drafted = draft_positions(dat.table("drafted")?)?;
    check_contiguous(&drafted)?;
    let expected = expected_picks(players, &drafted)?;

    let my_positions: Vec<i64> = dat
        .table("my_draft_positions")?
        .keys()
        .map(|key| pick_number(key.single().unwrap_or(&Value::Null)))
        .collect::<Result<BTreeSet<_>>>()?
        .into_iter()
        .collect();
    let already_mine: BTreeSet<&PrimaryKey> = drafted
        .iter()
        .filter(|(_, pick)| my_positions.binary_search(*pick).is_ok())
        .map(|(key, _)| key)
        .collect();

    if already_mine.len() + 1 > my_positions.len() {
        info!(
            my_picks = my_positions.len(),
            already_mine = already_mine.len(),
            "No draft at all is possible!"
        );
        return Ok(None);
    }

    let roster = dat.table("roster_requirements")?;
    let mut vars = ProblemVariables::new();
    let mut candidates = Vec::new();
    for (key, row) in players {
        let mine = already_mine.contains(&key);
        if drafted.contains_key(key) && !mine {
            continue;
        }
        let position = row.get("Position").cloned().unwrap_or_default();
        let flex = roster
            .get(&PrimaryKey::from(position.clone()))
            .and_then(|r| r.text("Flex Status"))
            == Some(FLEX_ELIGIBLE);
        candidates.push(Candidate {
            key: key.clone(),
            points: row.number("Expected Points").unwrap_or_default(),
            expected_pick: expected
                .get(key)
                .copied()
                .ok_or_else(|| FantopError::Internal(format!("no expected pick for {key}")))?,
            already_mine: mine,
            flex,
            position,
            starter: vars.add(variable().binary()),
            reserve: vars.add(variable().binary()),
        });
    }

    if candidates.is_empty() {
        info!("No draft at all is possible!");
        return Ok(None);
    }

    let starter_weight = parameter(dat, STARTER_WEIGHT)?.unwrap_or(1.0);
    let reserve_weight = parameter(dat, RESERVE_WEIGHT)?.unwrap_or(1.0);
    let objective: Expression = candidates
        .iter()
        .map(|c| c.starter * (c.points * starter_weight) + c.reserve * (c.points * reserve_weight))
        .sum();
    let mut model = vars.maximise(objective).using(microlp);

    for c in &candidates {
        if c.already_mine {
            model.add_constraint(constraint!(c.starter + c.reserve == 1.0));
        } else {
            model.add_constraint(constraint!(c.starter + c.reserve <= 1.0));
        }
    }

    // The i-th of my picks comes after at most i players I could take.
    for (i, &pick) in my_positions.iter().enumerate() {
        let ahead: Vec<&Candidate> = candidates.iter().filter(|c| c.expected_pick < pick).collect();
        if !ahead.is_empty() {
            model.add_constraint(constraint!(picks(&ahead) <= i as f64));
        }
    }

    let all: Vec<&Candidate> = candidates.iter().collect();
    let size = picks(&all);
    model.add_constraint(constraint!(size.clone() >= (already_mine.len() + 1) as f64));
    model.add_constraint(constraint!(size <= my_positions.len() as f64));

    for (key, row) in roster {
        let position = key.single().cloned().unwrap_or_default();
        let at_position: Vec<&Candidate> = candidates.iter().filter(|c| c.position == position).collect();
        let starters: Expression = at_position.iter().map(|c| c.starter).sum();
        let reserves: Expression = at_position.iter().map(|c| c.reserve).sum();
        log_detail!(
            options.log,
            position = %position,
            candidates = at_position.len(),
            "roster bounds"
        );
        let satisfiable = add_bounds(
            &mut model,
            at_position.len(),
            starters,
            row.number("Min Num Starters"),
            row.number("Max Num Starters"),
        ) && add_bounds(
            &mut model,
            at_position.len(),
            reserves,
            row.number("Min Num Reserve"),
            row.number("Max Num Reserve"),
        );
        if !satisfiable {
            info!(position = %position, "No draft at all is possible!");
            return Ok(None);
        }
    }

    if let Some(max_flex) = parameter(dat, MAX_FLEX_STARTERS)? {
        let eligible: Vec<Variable> = candidates.iter().filter(|c| c.flex).map(|c| c.starter).collect();
        if !eligible.is_empty() {
            let flex: Expression = eligible.into_iter().sum();
            model.add_constraint(constraint!(flex <= max_flex));
        }
    }

    log_data_op!(
        options.log,
        candidates = candidates.len(),
        my_picks = my_positions.len(),
        already_mine = already_mine.len(),
        "built draft model"
    );

    let solution = match model.solve() {
        Ok(solution) => solution,
        Err(ResolutionError::Infeasible) | Err(ResolutionError::Unbounded) => {
            info!("No draft at all is possible!");
            return Ok(None);
        }
        Err(e) => return Err(FantopError::Solver(e.to_string())),
    };

    let is_one = |v: Variable| (solution.value(v) - 1.0).abs() < options.tolerance;
    let mut picked: Vec<(&Candidate, bool)> = candidates
        .iter()
        .filter_map(|c| {
            let starter = is_one(c.starter);
            (starter || is_one(c.reserve)).then_some((c, starter))
        })
        .collect();
    picked.sort_by_key(|(c, _)| c.expected_pick);

    if picked.len() > my_positions.len() {
        return Err(FantopError::Internal(format!(
            "picked {} players for {} draft positions",
            picked.len(),
            my_positions.len()
        )));
    }
    if picked.len() < my_positions.len() {
        warn!(
            picked = picked.len(),
            my_picks = my_positions.len(),
            "Your model is over-constrained, and thus only a partial draft was possible"
        );
    }

    let mut sln = solution_schema()?.tic_dat();
    let my_draft = sln.table_mut("my_draft")?;
    for ((c, starter), &pick) in picked.into_iter().zip(&my_positions) {
        if pick > c.expected_pick {
            return Err(FantopError::Internal(format!(
                "player {} is planned for pick {pick} but expected to go at {}",
                c.key, c.expected_pick
            )));
        }
        log_row!(
            options.log,
            player = %truncate_field(&c.key.to_string(), options.log.max_field_length),
            pick,
            starter,
            "planned pick"
        );
        my_draft.insert(
            c.key.clone(),
            vec![
                Value::from(pick),
                c.position.clone(),
                Value::from(if c.already_mine { "Actual" } else { "Planned" }),
                Value::from(if starter { "Starter" } else { "Reserve" }),
            ],
        )?;
    }
    info!(picks = my_draft.len(), "draft planned");
    Ok(Some(sln))
}

fn picks(candidates: &[&Candidate]) -> Expression {
    candidates.iter().map(|c| c.starter + c.reserve).sum()
}

/// Adds `min <= expr <= max` for an expression over `terms` candidates.
/// Returns false when there are no terms and `min` is positive.
fn add_bounds<M: SolverModel>(
    model: &mut M,
    terms: usize,
    expr: Expression,
    min: Option<f64>,
    max: Option<f64>,
) -> bool {
    let min = min.filter(|m| *m > 0.0);
    if terms == 0 {
        return min.is_none();
    }
    if let Some(min) = min {
        model.add_constraint(constraint!(expr.clone() >= min));
    }
    if let Some(max) = max.filter(|m| m.is_finite()) {
        model.add_constraint(constraint!(expr <= max));
    }
    true
}

/// The numeric value of a parameter row, if present.
fn parameter(dat: &TicDat, key: &str) -> Result<Option<f64>> {
    Ok(dat
        .table("parameters")?
        .get(&PrimaryKey::from(key))
        .and_then(|row| row.number("Value")))
}

fn pick_number(value: &Value) -> Result<i64> {
    match value {
        Value::Number(n) if value.is_integer() && *n >= 1.0 => Ok(*n as i64),
        other => Err(FantopError::Internal(format!(
            "draft position {other} passed validation but is not a positive integer"
        ))),
    }
}

fn draft_positions(drafted: &Table) -> Result<BTreeMap<PrimaryKey, i64>> {
    drafted
        .iter()
        .map(|(key, row)| {
            let pick = pick_number(row.get("Draft Position").unwrap_or(&Value::Null))?;
            Ok((key.clone(), pick))
        })
        .collect()
}

/// Drafted picks must be exactly `1..=N`, each used once.
fn check_contiguous(drafted: &BTreeMap<PrimaryKey, i64>) -> Result<()> {
    let picks: BTreeSet<i64> = drafted.values().copied().collect();
    let n = drafted.len() as i64;
    let contiguous = picks.len() == drafted.len()
        && picks.first().map_or(true, |&first| first == 1)
        && picks.last().map_or(true, |&last| last == n);
    if !contiguous {
        return Err(FantopError::invalid_input(format!(
            "drafted positions must be exactly 1..={n}, found {picks:?}"
        )));
    }
    Ok(())
}

/// Drafted players keep their pick; the rest follow in order of average
/// draft position, ties broken by name.
fn expected_picks(players: &Table, drafted: &BTreeMap<PrimaryKey, i64>) -> Result<BTreeMap<PrimaryKey, i64>> {
    let mut expected = drafted.clone();
    let mut undrafted: Vec<(f64, &PrimaryKey)> = players
        .iter()
        .filter(|(key, _)| !drafted.contains_key(*key))
        .map(|(key, row)| (row.number("Average Draft Position").unwrap_or(f64::INFINITY), key))
        .collect();
    undrafted.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(b.1)));
    for (_, key) in undrafted {
        let next = expected.len() as i64 + 1;
        expected.insert(key.clone(), next);
    }

    let picks: BTreeSet<i64> = expected.values().copied().collect();
    let n = players.len() as i64;
    if expected.len() != players.len()
        || picks.len() != players.len()
        || picks.first().is_some_and(|&p| p != 1)
        || picks.last().is_some_and(|&p| p != n)
    {
        return Err(FantopError::Internal(format!(
            "expected draft positions do not form 1..={n}"
        )));
    }
    Ok(expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drafted(picks: &[(&str, i64)]) -> BTreeMap<PrimaryKey, i64> {
        picks
            .iter()
            .map(|(name, pick)| (PrimaryKey::from(*name), *pick))
            .collect()
    }

    #[test]
    fn test_contiguous_picks() {
        assert!(check_contiguous(&drafted(&[])).is_ok());
        assert!(check_contiguous(&drafted(&[("a", 2), ("b", 1)])).is_ok());
        assert!(check_contiguous(&drafted(&[("a", 1), ("b", 3)])).is_err());
        assert!(check_contiguous(&drafted(&[("a", 2)])).is_err());
        assert!(check_contiguous(&drafted(&[("a", 1), ("b", 1)])).is_err());
    }

    #[test]
    fn test_pick_number() {
        assert_eq!(pick_number(&Value::from(3)).unwrap(), 3);
        assert!(pick_number(&Value::from(2.5)).is_err());
        assert!(pick_number(&Value::from("first")).is_err());
    }

    #[test]
    fn test_default_options() {
        let options = SolveOptions::default();
        assert_eq!(options.tolerance, 1e-4);
        assert_eq!(SolveOptions::default().with_tolerance(1e-6).tolerance, 1e-6);
    }
}
