//! Integration tests for the Arrow-backed frames.

mod common;

use common::*;
use tic_guard::core::{PrimaryKey, Schema, Value};
use tic_guard::error::TicDatError;
use tic_guard::sources::frames::{copy_from_frames, copy_to_frames, FrameOptions, Selector};

fn total(selection: &[(PrimaryKey, Value)]) -> f64 {
    selection.iter().filter_map(|(_, v)| v.as_number()).sum()
}

#[test]
fn test_diet_point_lookups_and_selection() {
    let dat = diet_data().freeze();
    let frames = copy_to_frames(&dat, &FrameOptions::default()).unwrap();

    let cost = frames.frame("foods").unwrap().column("cost").unwrap();
    for (key, row) in dat.table("foods").unwrap() {
        assert_eq!(cost.get(key.clone()), row.get("cost").cloned());
    }
    let min = frames
        .frame("categories")
        .unwrap()
        .column("minNutrition")
        .unwrap();
    assert_eq!(min.get("protein"), Some(Value::from(91)));

    let qty = frames
        .frame("nutritionQuantities")
        .unwrap()
        .column("qty")
        .unwrap();
    assert_eq!(qty.get(("milk", "fat")), Some(Value::from(2.5)));

    assert!(matches!(
        qty.loc(&[Selector::Any, "fatty".into()]),
        Err(TicDatError::LabelNotFound { level: 1, .. })
    ));
    assert!(qty.loc(&["chickeny".into(), Selector::Any]).is_err());
    assert!(qty.sloc(&[Selector::Any, "fatty".into()]).is_empty());
    assert!(qty.sloc(&["chickeny".into(), Selector::Any]).is_empty());

    let expected_fat: f64 = DIET_QUANTITIES.iter().map(|(_, q)| q[2]).sum();
    let fat = qty.loc(&[Selector::Any, "fat".into()]).unwrap();
    assert_eq!(fat.len(), DIET_QUANTITIES.len());
    assert_eq!(total(&fat), expected_fat);
    assert_eq!(total(&qty.sloc(&[Selector::Any, "fat".into()])), expected_fat);

    let chicken = qty.loc(&["chicken".into(), Selector::Any]).unwrap();
    assert_eq!(total(&chicken), 420.0 + 32.0 + 10.0 + 1190.0);
}

#[test]
fn test_netflow_table_subset() {
    let dat = netflow_data();
    let options = FrameOptions::default().with_tables(["arcs", "cost"]);
    let frames = copy_to_frames(&dat, &options).unwrap();
    assert_eq!(frames.names().collect::<Vec<_>>(), ["arcs", "cost"]);
    assert!(frames.frame("nodes").is_err());

    let capacity = frames.frame("arcs").unwrap().column("capacity").unwrap();
    assert!(capacity.sloc(&["Boston".into(), Selector::Any]).is_empty());
    let into_boston = capacity.sloc(&[Selector::Any, "Boston".into()]);
    assert_eq!(into_boston.len(), 2);
    for (key, value) in into_boston {
        let expected = NETFLOW_ARCS
            .iter()
            .find(|(s, d, _)| PrimaryKey::from((*s, *d)) == key)
            .map(|(_, _, c)| Value::from(*c));
        assert_eq!(Some(value), expected);
    }

    let cost = frames.frame("cost").unwrap();
    assert!(cost.index().is_multi());
    assert_eq!(cost.index().levels(), 3);
    assert_eq!(cost.column_names(), ["cost"]);
}

fn silly_schema() -> std::sync::Arc<Schema> {
    Schema::builder()
        .table("c", ["cData1"], ["cData2"])
        .unwrap()
        .table("d", ["dData1", "dData2", "dData3", "dData4"], Vec::<String>::new())
        .unwrap()
        .table("e", ["eData"], Vec::<String>::new())
        .unwrap()
        .build()
        .unwrap()
}

#[test]
fn test_silly_tables_and_pk_columns() {
    let schema = silly_schema();
    let empty = copy_to_frames(&schema.tic_dat(), &FrameOptions::default()).unwrap();
    assert_eq!(empty.frame("d").unwrap().num_rows() + empty.frame("e").unwrap().num_rows(), 0);

    let mut dat = schema.tic_dat();
    for i in 0..3 {
        dat.table_mut("c")
            .unwrap()
            .insert(i, vec![Value::from(i * 10)])
            .unwrap();
    }
    let d = dat.table_mut("d").unwrap();
    let keys: [[Value; 4]; 3] = [
        [1.into(), 2.into(), 3.into(), 4.into()],
        [1.into(), "b".into(), "c".into(), "d".into()],
        ["a".into(), 2.into(), "c".into(), "d".into()],
    ];
    for key in keys {
        d.insert(key.to_vec(), vec![]).unwrap();
    }
    let e = dat.table_mut("e").unwrap();
    e.insert(11, vec![]).unwrap();
    e.insert("boger", vec![]).unwrap();
    let dat = dat.freeze();

    let frames = copy_to_frames(&dat, &FrameOptions::default()).unwrap();
    let d = frames.frame("d").unwrap();
    let e = frames.frame("e").unwrap();
    assert_eq!((d.num_rows(), e.num_rows()), (3, 2));
    assert!(d.column_names().is_empty() && e.column_names().is_empty());
    assert!(d.column("dData1").is_err());
    assert_eq!(frames.frame("c").unwrap().num_rows(), 3);

    let frames = copy_to_frames(&dat, &FrameOptions::default().with_drop_pk_columns(false)).unwrap();
    let d = frames.frame("d").unwrap();
    assert_eq!(d.column_names(), ["dData1", "dData2", "dData3", "dData4"]);
    let d_data1 = d.column("dData1").unwrap();
    assert_eq!(
        d_data1
            .sloc(&[1.into(), Selector::Any, Selector::Any, Selector::Any])
            .len(),
        2
    );
    let e = frames.frame("e").unwrap();
    assert_eq!(e.row(11), Some(vec![("eData".to_string(), Value::from(11))]));
    assert_eq!(
        e.column("eData").unwrap().get("boger"),
        Some(Value::from("boger"))
    );
}

#[test]
fn test_frames_round_trip() {
    for (schema, dat) in [
        (diet_schema(), diet_data()),
        (netflow_schema(), netflow_data()),
        (silly_schema(), silly_schema().tic_dat()),
    ] {
        for drop in [true, false] {
            let options = FrameOptions::default().with_drop_pk_columns(drop);
            let frames = copy_to_frames(&dat, &options).unwrap();
            let back = copy_from_frames(&frames, &schema).unwrap();
            assert_eq!(back, dat);
        }
    }
}

#[test]
fn test_copy_from_frames_requires_data_columns() {
    let dat = diet_data();
    let frames = copy_to_frames(&dat, &FrameOptions::default()).unwrap();
    let other = Schema::builder()
        .table("foods", ["name"], ["cost", "calories"])
        .unwrap()
        .build()
        .unwrap();
    let subset = {
        let mut set = tic_guard::sources::frames::FrameSet::new();
        set.insert(frames.frame("foods").unwrap().clone());
        set
    };
    assert!(matches!(
        copy_from_frames(&subset, &other),
        Err(TicDatError::FieldMismatch { ref missing, .. }) if missing == &["calories"]
    ));
    assert!(matches!(
        copy_from_frames(&frames, &other),
        Err(TicDatError::UnknownTable { .. })
    ));
}
