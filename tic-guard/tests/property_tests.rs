//! Property-based tests for the validation engine and the converters.
//!
//! ## Properties
//!
//! - Data built inside every declared domain validates cleanly.
//! - An integer-only field reports exactly the rows holding a fractional
//!   value.
//! - A foreign key reports exactly the native rows whose reference is
//!   missing from the foreign table, and no others.
//! - Writing to a format and reading back yields the same data object.

use proptest::prelude::*;
use std::collections::BTreeSet;
use std::sync::Arc;
use tempfile::TempDir;
use tic_guard::constraints::{DataType, FieldMapping};
use tic_guard::core::{PrimaryKey, Schema, TicDat, Value};
use tic_guard::sources::frames::{copy_from_frames, copy_to_frames, FrameOptions};
use tic_guard::sources::{DataFormat, WriteOptions};
use tic_guard::validation::TableField;

fn roster_schema() -> Arc<Schema> {
    Schema::builder()
        .table("positions", ["Position"], ["Max Starters"])
        .unwrap()
        .table("players", ["Player Name"], ["Position", "Points"])
        .unwrap()
        .set_data_type("positions", "Max Starters", DataType::number().integer_only())
        .unwrap()
        .set_data_type("players", "Points", DataType::any_number())
        .unwrap()
        .add_foreign_key(
            "players",
            "positions",
            vec![FieldMapping::new("Position", "Position")],
        )
        .unwrap()
        .build()
        .unwrap()
}

fn position_names() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set("[A-Z]{2}", 1..6)
}

/// Player rows as `(name, position, points)`.
fn player_rows() -> impl Strategy<Value = Vec<(String, String, i32)>> {
    prop::collection::vec(("p[a-z]{3,8}", "[A-Z]{2}", -500..500i32), 0..30)
}

fn build(positions: &BTreeSet<String>, starters: &[f64], players: &[(String, String, i32)]) -> TicDat {
    let schema = roster_schema();
    let mut dat = schema.tic_dat();
    let table = dat.table_mut("positions").unwrap();
    for (name, max) in positions.iter().zip(starters.iter().cycle()) {
        table.insert(name.as_str(), vec![Value::from(*max)]).unwrap();
    }
    let table = dat.table_mut("players").unwrap();
    for (name, position, points) in players {
        table
            .insert(
                name.as_str(),
                vec![Value::from(position.as_str()), Value::from(*points)],
            )
            .unwrap();
    }
    dat
}

proptest! {
    #[test]
    fn prop_integer_only_failures_are_exact(
        positions in position_names(),
        starters in prop::collection::vec(prop_oneof![
            (0..10i32).prop_map(f64::from),
            (0..1000i32).prop_map(|n| f64::from(n) + 0.5),
        ], 1..6),
    ) {
        let dat = build(&positions, &starters, &[]);
        let expected: BTreeSet<PrimaryKey> = positions
            .iter()
            .zip(starters.iter().cycle())
            .filter(|(_, max)| max.fract() != 0.0)
            .map(|(name, _)| PrimaryKey::from(name.as_str()))
            .collect();

        let failures = roster_schema().find_data_type_failures(&dat).unwrap();
        match failures.get(&TableField::new("positions", "Max Starters")) {
            Some(failure) => {
                prop_assert_eq!(&failure.primary_keys, &expected);
            }
            None => {
                prop_assert!(expected.is_empty());
            }
        }
    }

    #[test]
    fn prop_foreign_key_failures_are_exact(
        positions in position_names(),
        players in player_rows(),
    ) {
        let dat = build(&positions, &[1.0], &players);
        let table = dat.table("players").unwrap();
        let expected: BTreeSet<PrimaryKey> = table
            .iter()
            .filter(|(_, row)| !row.text("Position").is_some_and(|p| positions.contains(p)))
            .map(|(key, _)| key.clone())
            .collect();

        let schema = roster_schema();
        let failures = schema.find_foreign_key_failures(&dat).unwrap();
        let found: BTreeSet<PrimaryKey> = failures
            .values()
            .flat_map(|f| f.native_primary_keys.iter().cloned())
            .collect();
        prop_assert_eq!(found, expected.clone());
        prop_assert_eq!(schema.validate(&dat).is_success(), expected.is_empty());
    }

    #[test]
    fn prop_conforming_data_validates(
        positions in position_names(),
        players in player_rows(),
    ) {
        let fixed: Vec<(String, String, i32)> = players
            .into_iter()
            .zip(positions.iter().cycle())
            .map(|((name, _, points), position)| (name, position.clone(), points))
            .collect();
        let dat = build(&positions, &[2.0, 0.0], &fixed);
        let report = roster_schema().validate(&dat);
        prop_assert!(report.is_success());
        prop_assert!(report.issues.is_empty());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_round_trips(
        positions in position_names(),
        players in player_rows(),
    ) {
        let schema = roster_schema();
        let dat = build(&positions, &[3.0], &players);

        for format in [DataFormat::Csv, DataFormat::Json, DataFormat::Sqlite] {
            let dir = TempDir::new().unwrap();
            let path = match format {
                DataFormat::Csv => dir.path().join("roster"),
                DataFormat::Json => dir.path().join("roster.json"),
                _ => dir.path().join("roster.db"),
            };
            format.write(&path, &dat, &WriteOptions::default()).unwrap();
            let back = format.read(&path, &schema).unwrap();
            prop_assert_eq!(&back, &dat);
        }

        let frames = copy_to_frames(&dat, &FrameOptions::default()).unwrap();
        prop_assert_eq!(&copy_from_frames(&frames, &schema).unwrap(), &dat);
    }
}
