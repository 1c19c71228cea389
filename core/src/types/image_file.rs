use std::fmt;
use std::path::{Path, PathBuf};

/// One on-disk image slice
///
/// Only the path is held; tags are read on demand through a
/// [`TagReader`](crate::extraction::TagReader).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(transparent))]
pub struct ImageFile {
    path: PathBuf,
}

impl ImageFile {
    /// Creates a new ImageFile
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the slice on disk
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Checks if the file name carries one of `extensions` (case-insensitive)
    pub fn has_extension(&self, extensions: &[String]) -> bool {
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
    }
}

impl From<PathBuf> for ImageFile {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}

impl From<&Path> for ImageFile {
    fn from(path: &Path) -> Self {
        Self::new(path)
    }
}

impl AsRef<Path> for ImageFile {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for ImageFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}
