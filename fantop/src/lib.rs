//! # fantop - Fantasy Football Draft Optimizer
//!
//! Plans the rest of a fantasy football draft. Every undrafted player gets
//! an expected draft position from the picks made so far and the players'
//! average draft positions; the optimizer then chooses starters and
//! reserves for my remaining picks so as to maximize weighted expected
//! points while respecting per-position roster limits and an optional cap
//! on flex starters. No player is planned for a pick later than their
//! expected draft position.
//!
//! ```rust,no_run
//! use fantop::{input_schema, solve, SolveOptions};
//! use tic_guard::sources::DataFormat;
//!
//! # fn main() -> anyhow::Result<()> {
//! let schema = input_schema()?;
//! let dat = DataFormat::Csv.read("data/fantop", &schema)?;
//! match solve(&dat, &SolveOptions::default())? {
//!     Some(draft) => println!("{} picks planned", draft.row_count()),
//!     None => println!("no draft is possible"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod schema;
mod solve;

pub use error::{FantopError, Result};
pub use schema::{input_schema, solution_schema};
pub use solve::{solve, SolveOptions};
