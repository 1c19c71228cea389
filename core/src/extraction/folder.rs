use crate::error::{DcmCheckError, Result};
use crate::types::ImageFile;
use log::debug;
use std::path::Path;

/// Lists the slice files of a folder
///
/// Extensions are tried in order and the first one matching at least one
/// regular file wins, so a folder with both `.dcm` and `.IMA` files only
/// yields the `.dcm` ones. Matching is case-insensitive, hidden files are
/// skipped and the result is sorted by path.
///
/// # Errors
///
/// Returns [`DcmCheckError::NoInputFiles`] if no extension matches, or an I/O
/// error if the folder cannot be listed.
pub fn discover_files(directory: &Path, extensions: &[String]) -> Result<Vec<ImageFile>> {
    let mut candidates = Vec::new();
    for entry in std::fs::read_dir(directory)? {
        let path = entry?.path();
        // Hidden files (e.g. AppleDouble `._x.dcm` sidecars) are not slices
        let hidden = path
            .file_name()
            .map_or(true, |name| name.to_string_lossy().starts_with('.'));
        if path.is_file() && !hidden {
            candidates.push(ImageFile::new(path));
        }
    }

    for extension in extensions {
        let wanted = std::slice::from_ref(extension);
        let mut files: Vec<ImageFile> = candidates
            .iter()
            .filter(|file| file.has_extension(wanted))
            .cloned()
            .collect();

        if !files.is_empty() {
            files.sort();
            debug!(
                "Found {} .{} files in {}",
                files.len(),
                extension,
                directory.display()
            );
            return Ok(files);
        }
    }

    Err(DcmCheckError::NoInputFiles(directory.to_path_buf()))
}
