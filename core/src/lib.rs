pub mod api;
pub mod cli;
pub mod error;
pub mod extraction;
pub mod selection;
pub mod types;

#[cfg(feature = "python")]
mod python;

pub use api::{consolidate_folder, FolderConsolidator, RetainedFileSet};
pub use cli::report::{ConsolidationReport, TagReport};
pub use error::{DcmCheckError, Result};
pub use extraction::{
    discover_files, index_files, DicomTagReader, FolderTagIndex, InMemoryTagReader, TagReader,
};
pub use selection::{find_duplicates, retain_selected, select_series, SeriesSelection};
pub use types::*;
