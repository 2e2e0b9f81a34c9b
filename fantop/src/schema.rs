//! Input and solution schemas of the draft optimizer.

use std::sync::Arc;
use tic_guard::constraints::{DataType, FieldMapping};
use tic_guard::core::Schema;
use tic_guard::error::Result;

pub const STARTER_WEIGHT: &str = "Starter Weight";
pub const RESERVE_WEIGHT: &str = "Reserve Weight";
pub const MAX_FLEX_STARTERS: &str = "Maximum Number of Flex Starters";

pub const FLEX_ELIGIBLE: &str = "Flex Eligible";
pub const FLEX_INELIGIBLE: &str = "Flex Ineligible";

/// The tables a draft is planned from.
///
/// - `parameters`: optional objective weights and the flex limit
/// - `players`: every player with position, average draft position and
///   expected points
/// - `roster_requirements`: per position starter and reserve limits
/// - `drafted`: the players picked so far and the pick they went at
/// - `my_draft_positions`: the picks that belong to me
pub fn input_schema() -> Result<Arc<Schema>> {
    let non_negative_int = DataType::number().integer_only();
    let positive_int = DataType::number().with_min(0.0, false).integer_only();

    let mut builder = Schema::builder()
        .table("parameters", ["Key"], ["Value"])?
        .table(
            "players",
            ["Player Name"],
            ["Position", "Average Draft Position", "Expected Points"],
        )?
        .table(
            "roster_requirements",
            ["Position"],
            [
                "Min Num Starters",
                "Max Num Starters",
                "Min Num Reserve",
                "Max Num Reserve",
                "Flex Status",
            ],
        )?
        .table("drafted", ["Player Name"], ["Draft Position"])?
        .table("my_draft_positions", ["Draft Position"], Vec::<String>::new())?
        .add_foreign_key(
            "drafted",
            "players",
            vec![FieldMapping::new("Player Name", "Player Name")],
        )?
        .add_foreign_key(
            "players",
            "roster_requirements",
            vec![FieldMapping::new("Position", "Position")],
        )?
        .set_data_type(
            "parameters",
            "Key",
            DataType::strings([STARTER_WEIGHT, RESERVE_WEIGHT, MAX_FLEX_STARTERS]),
        )?
        .set_data_type("parameters", "Value", DataType::number())?
        .set_data_type(
            "players",
            "Average Draft Position",
            DataType::number().with_min(0.0, false),
        )?
        .set_data_type(
            "players",
            "Expected Points",
            DataType::number().with_min(f64::NEG_INFINITY, false),
        )?
        .set_data_type(
            "roster_requirements",
            "Max Num Starters",
            positive_int.clone().with_max(f64::INFINITY, true),
        )?
        .set_data_type(
            "roster_requirements",
            "Flex Status",
            DataType::strings([FLEX_ELIGIBLE, FLEX_INELIGIBLE]),
        )?;
    for field in ["Min Num Starters", "Min Num Reserve", "Max Num Reserve"] {
        builder = builder.set_data_type("roster_requirements", field, non_negative_int.clone())?;
    }
    for table in ["drafted", "my_draft_positions"] {
        builder = builder.set_data_type(table, "Draft Position", positive_int.clone())?;
    }
    builder.build()
}

/// The planned draft: one row per pick I make.
pub fn solution_schema() -> Result<Arc<Schema>> {
    Schema::builder()
        .table(
            "my_draft",
            ["Player Name"],
            [
                "Draft Position",
                "Position",
                "Planned Or Actual",
                "Starter Or Reserve",
            ],
        )?
        .set_data_type(
            "my_draft",
            "Draft Position",
            DataType::number().with_min(0.0, false).integer_only(),
        )?
        .set_data_type(
            "my_draft",
            "Planned Or Actual",
            DataType::strings(["Planned", "Actual"]),
        )?
        .set_data_type(
            "my_draft",
            "Starter Or Reserve",
            DataType::strings(["Starter", "Reserve"]),
        )?
        .build()
}
