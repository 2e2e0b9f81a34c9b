//! Shared fixtures for integration tests: the diet and netflow models.

#![allow(dead_code)]

use std::sync::Arc;
use tic_guard::constraints::{DataType, FieldMapping};
use tic_guard::core::{Schema, TicDat, Value};

pub fn diet_schema() -> Arc<Schema> {
    Schema::builder()
        .table("categories", ["name"], ["minNutrition", "maxNutrition"])
        .unwrap()
        .table("foods", ["name"], ["cost"])
        .unwrap()
        .table("nutritionQuantities", ["food", "category"], ["qty"])
        .unwrap()
        .set_data_type(
            "categories",
            "maxNutrition",
            DataType::number().with_max(f64::INFINITY, true),
        )
        .unwrap()
        .set_data_type("foods", "cost", DataType::number())
        .unwrap()
        .add_foreign_key(
            "nutritionQuantities",
            "foods",
            vec![FieldMapping::new("food", "name")],
        )
        .unwrap()
        .add_foreign_key(
            "nutritionQuantities",
            "categories",
            vec![FieldMapping::new("category", "name")],
        )
        .unwrap()
        .build()
        .unwrap()
}

pub const DIET_FOODS: [(&str, f64); 9] = [
    ("hamburger", 2.49),
    ("salad", 2.49),
    ("hot dog", 1.5),
    ("fries", 1.89),
    ("macaroni", 2.09),
    ("chicken", 2.89),
    ("milk", 0.89),
    ("ice cream", 1.59),
    ("pizza", 1.99),
];

pub const DIET_CATEGORIES: [(&str, f64, f64); 4] = [
    ("protein", 91.0, f64::INFINITY),
    ("calories", 1800.0, 2200.0),
    ("fat", 0.0, 65.0),
    ("sodium", 0.0, 1779.0),
];

/// `(food, [calories, protein, fat, sodium])`
pub const DIET_QUANTITIES: [(&str, [f64; 4]); 9] = [
    ("hamburger", [410.0, 24.0, 26.0, 730.0]),
    ("salad", [370.0, 4.0, 28.0, 1190.0]),
    ("hot dog", [560.0, 20.0, 32.0, 1800.0]),
    ("fries", [380.0, 4.0, 19.0, 270.0]),
    ("macaroni", [320.0, 12.0, 10.0, 930.0]),
    ("chicken", [420.0, 32.0, 10.0, 1190.0]),
    ("milk", [100.0, 8.0, 2.5, 125.0]),
    ("ice cream", [330.0, 8.0, 10.0, 180.0]),
    ("pizza", [320.0, 15.0, 12.0, 820.0]),
];

pub const DIET_QUANTITY_CATEGORIES: [&str; 4] = ["calories", "protein", "fat", "sodium"];

pub fn diet_data() -> TicDat {
    let schema = diet_schema();
    let mut dat = schema.tic_dat();
    {
        let foods = dat.table_mut("foods").unwrap();
        for (name, cost) in DIET_FOODS {
            foods.insert(name, vec![Value::from(cost)]).unwrap();
        }
    }
    {
        let categories = dat.table_mut("categories").unwrap();
        for (name, min, max) in DIET_CATEGORIES {
            categories
                .insert(name, vec![Value::from(min), Value::from(max)])
                .unwrap();
        }
    }
    let quantities = dat.table_mut("nutritionQuantities").unwrap();
    for (food, qtys) in DIET_QUANTITIES {
        for (category, qty) in DIET_QUANTITY_CATEGORIES.iter().zip(qtys) {
            quantities
                .insert((food, *category), vec![Value::from(qty)])
                .unwrap();
        }
    }
    dat
}

pub fn netflow_schema() -> Arc<Schema> {
    Schema::builder()
        .table("commodities", ["name"], Vec::<String>::new())
        .unwrap()
        .table("nodes", ["name"], Vec::<String>::new())
        .unwrap()
        .table("arcs", ["source", "destination"], ["capacity"])
        .unwrap()
        .table("cost", ["commodity", "source", "destination"], ["cost"])
        .unwrap()
        .table("inflow", ["commodity", "node"], ["quantity"])
        .unwrap()
        .set_data_type("inflow", "quantity", DataType::any_number())
        .unwrap()
        .add_foreign_key("arcs", "nodes", vec![FieldMapping::new("source", "name")])
        .unwrap()
        .add_foreign_key(
            "arcs",
            "nodes",
            vec![FieldMapping::new("destination", "name")],
        )
        .unwrap()
        .add_foreign_key(
            "cost",
            "arcs",
            vec![
                FieldMapping::new("source", "source"),
                FieldMapping::new("destination", "destination"),
            ],
        )
        .unwrap()
        .add_foreign_key(
            "cost",
            "commodities",
            vec![FieldMapping::new("commodity", "name")],
        )
        .unwrap()
        .add_foreign_key(
            "inflow",
            "commodities",
            vec![FieldMapping::new("commodity", "name")],
        )
        .unwrap()
        .add_foreign_key("inflow", "nodes", vec![FieldMapping::new("node", "name")])
        .unwrap()
        .build()
        .unwrap()
}

pub const NETFLOW_NODES: [&str; 5] = ["Detroit", "Denver", "Boston", "New York", "Seattle"];

pub const NETFLOW_ARCS: [(&str, &str, f64); 6] = [
    ("Detroit", "Boston", 100.0),
    ("Detroit", "New York", 80.0),
    ("Detroit", "Seattle", 120.0),
    ("Denver", "Boston", 120.0),
    ("Denver", "New York", 120.0),
    ("Denver", "Seattle", 120.0),
];

pub fn netflow_data() -> TicDat {
    let schema = netflow_schema();
    let mut dat = schema.tic_dat();
    for name in ["Pencils", "Pens"] {
        dat.table_mut("commodities")
            .unwrap()
            .insert(name, vec![])
            .unwrap();
    }
    for name in NETFLOW_NODES {
        dat.table_mut("nodes").unwrap().insert(name, vec![]).unwrap();
    }
    for (source, destination, capacity) in NETFLOW_ARCS {
        dat.table_mut("arcs")
            .unwrap()
            .insert((source, destination), vec![Value::from(capacity)])
            .unwrap();
    }
    let costs = [
        ("Pencils", "Detroit", "Boston", 10.0),
        ("Pencils", "Detroit", "New York", 20.0),
        ("Pencils", "Denver", "Seattle", 40.0),
        ("Pens", "Detroit", "Boston", 20.0),
        ("Pens", "Denver", "Boston", 40.0),
        ("Pens", "Denver", "New York", 60.0),
    ];
    for (commodity, source, destination, cost) in costs {
        dat.table_mut("cost")
            .unwrap()
            .insert(
                vec![Value::from(commodity), Value::from(source), Value::from(destination)],
                vec![Value::from(cost)],
            )
            .unwrap();
    }
    let inflows = [
        ("Pencils", "Detroit", 50.0),
        ("Pencils", "Denver", 60.0),
        ("Pencils", "Boston", -40.0),
        ("Pencils", "New York", -30.0),
        ("Pencils", "Seattle", -40.0),
        ("Pens", "Detroit", 60.0),
        ("Pens", "Denver", 40.0),
        ("Pens", "Boston", -40.0),
        ("Pens", "New York", -60.0),
    ];
    for (commodity, node, quantity) in inflows {
        dat.table_mut("inflow")
            .unwrap()
            .insert((commodity, node), vec![Value::from(quantity)])
            .unwrap();
    }
    dat
}
