//! Core value types shared by every scrape target.

pub mod dimension;
pub mod row_set;
pub mod work_unit;

pub use dimension::{FilterDimension, SelectionMode};
pub use row_set::{Row, RowSet};
pub use work_unit::{UnitKey, UnitOutcome, WorkUnit};
