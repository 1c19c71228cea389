pub mod folder;
pub mod index;
pub mod reader;
pub mod tags;

pub use folder::discover_files;
pub use index::{index_files, FolderTagIndex};
pub use reader::{read_tag_from_object, DicomTagReader, InMemoryTagReader, TagReader};
pub use tags::*;
