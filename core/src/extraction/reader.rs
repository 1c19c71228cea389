use crate::error::{DcmCheckError, Result};
use crate::types::{ImageFile, TagName, TagValue};
use dicom_core::Tag;
use dicom_dictionary_std::tags::PIXEL_DATA;
use dicom_object::{DefaultDicomObject, InMemDicomObject, OpenFileOptions};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Source of normalized tag values for image files
pub trait TagReader {
    /// Reads one field of one file
    ///
    /// # Errors
    ///
    /// Returns [`DcmCheckError::MissingField`] if the file does not expose the
    /// field, or a DICOM/value error if the file or value cannot be decoded.
    fn read_tag(&self, file: &ImageFile, tag: &TagName) -> Result<TagValue>;

    /// Reads several fields of one file, one result per requested tag
    fn read_tags(&self, file: &ImageFile, tags: &[TagName]) -> Vec<Result<TagValue>> {
        tags.iter().map(|tag| self.read_tag(file, tag)).collect()
    }
}

impl<R: TagReader + ?Sized> TagReader for &R {
    fn read_tag(&self, file: &ImageFile, tag: &TagName) -> Result<TagValue> {
        (**self).read_tag(file, tag)
    }

    fn read_tags(&self, file: &ImageFile, tags: &[TagName]) -> Vec<Result<TagValue>> {
        (**self).read_tags(file, tags)
    }
}

/// Reads a field from an already-opened DICOM object
///
/// `path` is only used to label a missing field.
pub fn read_tag_from_object(dcm: &InMemDicomObject, tag: &TagName, path: &Path) -> Result<TagValue> {
    let missing = || DcmCheckError::MissingField {
        path: path.to_path_buf(),
        tag: tag.to_string(),
    };

    let element = match tag {
        TagName::Keyword(keyword) => dcm.element_by_name(keyword).map_err(|_| missing())?,
        TagName::Numeric(group, elem) => dcm.element(Tag(*group, *elem)).map_err(|_| missing())?,
    };

    let values = element.to_multi_str()?;
    Ok(TagValue::normalize(&values[..]))
}

/// Reads tags straight from DICOM files on disk
///
/// Only the header is parsed; reading stops at the pixel data.
#[derive(Debug, Clone, Copy, Default)]
pub struct DicomTagReader;

impl DicomTagReader {
    /// Opens the header of a DICOM file
    pub fn open(file: &ImageFile) -> Result<DefaultDicomObject> {
        let dcm = OpenFileOptions::new()
            .read_until(PIXEL_DATA)
            .open_file(file.path())?;
        Ok(dcm)
    }
}

impl TagReader for DicomTagReader {
    fn read_tag(&self, file: &ImageFile, tag: &TagName) -> Result<TagValue> {
        let dcm = Self::open(file)?;
        read_tag_from_object(&dcm, tag, file.path())
    }

    // Opens the file once for all tags
    fn read_tags(&self, file: &ImageFile, tags: &[TagName]) -> Vec<Result<TagValue>> {
        match Self::open(file) {
            Ok(dcm) => tags
                .iter()
                .map(|tag| read_tag_from_object(&dcm, tag, file.path()))
                .collect(),
            Err(e) => {
                let msg = e.to_string();
                tags.iter()
                    .map(|_| Err(DcmCheckError::DicomError(msg.clone())))
                    .collect()
            }
        }
    }
}

/// Reads tags from DICOM objects held in memory, keyed by path
///
/// Useful when the objects were already decoded elsewhere (e.g. received
/// over the network) and only the consolidation decision is needed.
#[derive(Debug, Default)]
pub struct InMemoryTagReader {
    objects: HashMap<PathBuf, InMemDicomObject>,
}

impl InMemoryTagReader {
    /// Creates an empty reader
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the object for `path`, replacing any previous one
    pub fn insert(&mut self, path: impl Into<PathBuf>, dcm: InMemDicomObject) {
        self.objects.insert(path.into(), dcm);
    }

    /// Builder: Register an object
    pub fn with_object(mut self, path: impl Into<PathBuf>, dcm: InMemDicomObject) -> Self {
        self.insert(path, dcm);
        self
    }

    /// All registered files, sorted by path
    pub fn files(&self) -> Vec<ImageFile> {
        let mut files: Vec<ImageFile> = self.objects.keys().cloned().map(ImageFile::from).collect();
        files.sort();
        files
    }
}

impl TagReader for InMemoryTagReader {
    fn read_tag(&self, file: &ImageFile, tag: &TagName) -> Result<TagValue> {
        let dcm = self.objects.get(file.path()).ok_or_else(|| {
            DcmCheckError::DicomError(format!("{} is not loaded", file.path().display()))
        })?;
        read_tag_from_object(dcm, tag, file.path())
    }
}
