//! End-to-end draft planning on small hand-checked leagues.

use fantop::schema::{FLEX_ELIGIBLE, FLEX_INELIGIBLE, MAX_FLEX_STARTERS, RESERVE_WEIGHT};
use fantop::{input_schema, solution_schema, solve, FantopError, SolveOptions};
use tempfile::TempDir;
use tic_guard::core::{PrimaryKey, TicDat, Value};
use tic_guard::sources::{DataFormat, WriteOptions};

/// `(name, position, average draft position, expected points)`
type Player<'a> = (&'a str, &'a str, f64, f64);

/// `(position, min starters, max starters, min reserve, max reserve, flex status)`
type Requirement<'a> = (&'a str, f64, f64, f64, f64, &'a str);

fn league(
    players: &[Player],
    roster: &[Requirement],
    drafted: &[(&str, i32)],
    mine: &[i32],
    parameters: &[(&str, f64)],
) -> TicDat {
    let mut dat = input_schema().unwrap().tic_dat();
    let table = dat.table_mut("players").unwrap();
    for (name, position, adp, points) in players {
        table
            .insert(*name, vec![(*position).into(), (*adp).into(), (*points).into()])
            .unwrap();
    }
    let table = dat.table_mut("roster_requirements").unwrap();
    for (position, min_s, max_s, min_r, max_r, flex) in roster {
        table
            .insert(
                *position,
                vec![
                    (*min_s).into(),
                    (*max_s).into(),
                    (*min_r).into(),
                    (*max_r).into(),
                    (*flex).into(),
                ],
            )
            .unwrap();
    }
    let table = dat.table_mut("drafted").unwrap();
    for (name, pick) in drafted {
        table.insert(*name, vec![Value::from(*pick)]).unwrap();
    }
    let table = dat.table_mut("my_draft_positions").unwrap();
    for pick in mine {
        table.insert(*pick, vec![]).unwrap();
    }
    let table = dat.table_mut("parameters").unwrap();
    for (key, value) in parameters {
        table.insert(*key, vec![Value::from(*value)]).unwrap();
    }
    dat
}

const TWO_PLAYERS: [Player; 2] = [("A", "RB", 1.0, 10.0), ("B", "WR", 2.0, 8.0)];

const ONE_STARTER_EACH: [Requirement; 2] = [
    ("RB", 1.0, 1.0, 0.0, 1.0, FLEX_INELIGIBLE),
    ("WR", 1.0, 1.0, 0.0, 1.0, FLEX_INELIGIBLE),
];

/// `(draft position, position, planned or actual, starter or reserve)`
fn pick(draft: &TicDat, name: &str) -> Option<(f64, String, String, String)> {
    let row = draft.table("my_draft").unwrap().get(&PrimaryKey::from(name))?;
    Some((
        row.number("Draft Position")?,
        row.text("Position")?.to_string(),
        row.text("Planned Or Actual")?.to_string(),
        row.text("Starter Or Reserve")?.to_string(),
    ))
}

fn planned(pick_number: f64, position: &str, status: &str, role: &str) -> Option<(f64, String, String, String)> {
    Some((pick_number, position.into(), status.into(), role.into()))
}

#[test]
fn test_two_picks_two_starters() {
    let dat = league(&TWO_PLAYERS, &ONE_STARTER_EACH, &[], &[1, 2], &[]);
    let draft = solve(&dat, &SolveOptions::default()).unwrap().unwrap();

    assert!(solution_schema().unwrap().validate(&draft).is_success());
    assert_eq!(draft.table("my_draft").unwrap().len(), 2);
    assert_eq!(pick(&draft, "A"), planned(1.0, "RB", "Planned", "Starter"));
    assert_eq!(pick(&draft, "B"), planned(2.0, "WR", "Planned", "Starter"));
}

#[test]
fn test_already_drafted_player_is_actual() {
    let players = [
        ("A", "RB", 1.0, 10.0),
        ("B", "WR", 2.0, 8.0),
        ("C", "RB", 3.0, 5.0),
    ];
    let roster = [
        ("RB", 1.0, 1.0, 0.0, 1.0, FLEX_INELIGIBLE),
        ("WR", 0.0, 1.0, 0.0, 1.0, FLEX_INELIGIBLE),
    ];
    let dat = league(&players, &roster, &[("A", 1)], &[1, 3], &[(RESERVE_WEIGHT, 0.5)]);
    let draft = solve(&dat, &SolveOptions::default()).unwrap().unwrap();

    assert_eq!(pick(&draft, "A"), planned(1.0, "RB", "Actual", "Starter"));
    // B is expected to go at pick 2, before my second pick
    assert_eq!(pick(&draft, "B"), None);
    assert_eq!(pick(&draft, "C"), planned(3.0, "RB", "Planned", "Reserve"));
}

#[test]
fn test_flex_cap_moves_starters_to_reserve() {
    let players = [("A", "RB", 1.0, 10.0), ("B", "RB", 2.0, 8.0)];
    let roster = [("RB", 0.0, 2.0, 0.0, 2.0, FLEX_ELIGIBLE)];
    let dat = league(&players, &roster, &[], &[1, 2], &[(MAX_FLEX_STARTERS, 0.0)]);
    let draft = solve(&dat, &SolveOptions::default()).unwrap().unwrap();

    assert_eq!(pick(&draft, "A"), planned(1.0, "RB", "Planned", "Reserve"));
    assert_eq!(pick(&draft, "B"), planned(2.0, "RB", "Planned", "Reserve"));
}

#[test]
fn test_over_constrained_roster_returns_partial_draft() {
    let players = [("A", "RB", 1.0, 10.0), ("B", "RB", 2.0, 8.0)];
    let roster = [("RB", 0.0, 1.0, 0.0, 0.0, FLEX_INELIGIBLE)];
    let dat = league(&players, &roster, &[], &[1, 2], &[]);
    let draft = solve(&dat, &SolveOptions::default()).unwrap().unwrap();

    assert_eq!(draft.table("my_draft").unwrap().len(), 1);
    assert_eq!(pick(&draft, "A"), planned(1.0, "RB", "Planned", "Starter"));
    assert_eq!(pick(&draft, "B"), None);
}

#[test]
fn test_no_draft_possible() {
    let no_picks = league(&TWO_PLAYERS, &ONE_STARTER_EACH, &[], &[], &[]);
    assert!(solve(&no_picks, &SolveOptions::default()).unwrap().is_none());

    let roster = [
        ("RB", 3.0, 3.0, 0.0, 1.0, FLEX_INELIGIBLE),
        ("WR", 0.0, 1.0, 0.0, 1.0, FLEX_INELIGIBLE),
    ];
    let too_few_backs = league(&TWO_PLAYERS, &roster, &[], &[1, 2], &[]);
    assert!(solve(&too_few_backs, &SolveOptions::default()).unwrap().is_none());
}

#[test]
fn test_gapped_draft_positions_are_rejected() {
    let dat = league(&TWO_PLAYERS, &ONE_STARTER_EACH, &[("A", 2)], &[1, 3], &[]);
    let err = solve(&dat, &SolveOptions::default()).unwrap_err();
    assert!(matches!(err, FantopError::InvalidInput { .. }), "{err}");
    assert!(err.report().is_none());
}

#[test]
fn test_failed_validation_carries_report() {
    let players = [("A", "QB", 1.0, 10.0), ("B", "WR", 2.5, 8.0)];
    let dat = league(&players, &ONE_STARTER_EACH, &[], &[1, 2], &[]);
    let err = solve(&dat, &SolveOptions::default()).unwrap_err();
    let report = err.report().expect("validation report");
    assert!(!report.is_success());
    assert_eq!(report.metrics.foreign_key_failures, 1);
}

#[test]
fn test_league_round_trips_through_sqlite() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("league.db");
    let dat = league(&TWO_PLAYERS, &ONE_STARTER_EACH, &[("A", 1)], &[2], &[(RESERVE_WEIGHT, 0.5)]);
    assert!(input_schema().unwrap().validate(&dat).is_success());

    DataFormat::Sqlite
        .write(&path, &dat, &WriteOptions::default())
        .unwrap();
    let back = DataFormat::Sqlite.read(&path, &input_schema().unwrap()).unwrap();
    assert_eq!(back, dat);
}

#[test]
fn test_csv_files_end_to_end() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("league");
    let output = dir.path().join("my_draft");
    let dat = league(&TWO_PLAYERS, &ONE_STARTER_EACH, &[], &[1, 2], &[]);
    DataFormat::Csv
        .write(&input, &dat, &WriteOptions::default())
        .unwrap();

    let read = DataFormat::Csv.read(&input, &input_schema().unwrap()).unwrap();
    assert_eq!(read, dat);
    let draft = solve(&read, &SolveOptions::default()).unwrap().unwrap();
    DataFormat::Csv
        .write(&output, &draft, &WriteOptions::default())
        .unwrap();

    let back = DataFormat::Csv
        .read(&output, &solution_schema().unwrap())
        .unwrap();
    assert_eq!(back, draft);
    let text = std::fs::read_to_string(output.join("my_draft.csv")).unwrap();
    assert_eq!(
        text.lines().next(),
        Some("Player Name,Draft Position,Position,Planned Or Actual,Starter Or Reserve")
    );
}
