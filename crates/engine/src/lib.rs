pub mod cell;
pub mod dep_graph;
pub mod error;
pub mod recalc;
pub mod sheet;

pub use cell::{Cell, Content, ESCAPE_PREFIX, FORMULA_SIGIL};
pub use dep_graph::DepGraph;
pub use error::SheetError;
pub use recalc::RecalcStats;
pub use sheet::Sheet;
