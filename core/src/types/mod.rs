//! Core type definitions for folder consolidation
//!
//! - [`ImageFile`]: One on-disk DICOM slice
//! - [`TagName`]: A requested field, by keyword or group/element pair
//! - [`TagValue`]: A normalized field value (scalar or ordered tuple)
//! - [`ConsolidationConfig`]: Which fields are required and which steps run

mod config;
mod image_file;
mod tag_name;
mod tag_value;

pub use config::ConsolidationConfig;
pub use image_file::ImageFile;
pub use tag_name::TagName;
pub use tag_value::TagValue;
