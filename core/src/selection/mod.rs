//! Consolidation decisions
//!
//! Duplicate detection for doubled acquisitions and selection of the one
//! series a folder should be reduced to.

mod duplicates;
mod series;

pub use duplicates::{find_duplicates, is_doubled_acquisition};
pub use series::{retain_selected, select_series, SeriesSelection};
