//! Dashboard interaction layer.
//!
//! Everything that understands the Power BI views lives here: the
//! declarative per-view widget tables, the structural locator resolver, the
//! slicer filter controller, the virtualized-grid row accumulator, and the
//! completeness checker that cross-checks accumulated data against the
//! dashboard's own displayed totals.

pub mod filters;
pub mod grid;
pub mod locator;
pub mod summary;
pub mod view;

pub use filters::{FilterController, InteractionTiming};
pub use grid::{GridBudgets, Harvest, RowAccumulator};
pub use locator::{WidgetAddress, WidgetMap};
pub use summary::{ColumnPair, CompletenessPolicy, CountMismatch, SumMismatch};
pub use view::{ViewConfig, WidgetMatcher, WidgetSlot};
