use super::reader::TagReader;
use super::tags::{is_image_type, is_instance_number, is_series_number};
use crate::types::{ImageFile, TagName, TagValue};
use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Per-tag values observed across the files of one folder
///
/// Each requested tag keeps the ordered list of `(file, value)` pairs for
/// every file that could be read, so distinct sets can be derived at any
/// time and the index can be narrowed to a subset of files without
/// re-reading anything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FolderTagIndex {
    tags: Vec<TagName>,
    observations: BTreeMap<TagName, Vec<(ImageFile, TagValue)>>,
}

/// Reads `tags` from every file and indexes the values
///
/// Returns the index and the files that failed to expose at least one tag,
/// each listed once in input order. Failures are logged and never abort the
/// scan; the caller decides what to do with the malformed files.
pub fn index_files<R: TagReader>(
    reader: &R,
    files: &[ImageFile],
    tags: &[TagName],
) -> (FolderTagIndex, Vec<ImageFile>) {
    let mut index = FolderTagIndex {
        tags: tags.to_vec(),
        observations: tags.iter().map(|t| (t.clone(), Vec::new())).collect(),
    };
    let mut malformed = Vec::new();

    for file in files {
        let mut is_malformed = false;
        for (tag, result) in tags.iter().zip(reader.read_tags(file, tags)) {
            match result {
                Ok(value) => {
                    if let Some(values) = index.observations.get_mut(tag) {
                        values.push((file.clone(), value));
                    }
                }
                Err(e) => {
                    warn!(
                        "{} seems to lack the {} field and will be excluded: {}",
                        file, tag, e
                    );
                    is_malformed = true;
                }
            }
        }
        if is_malformed {
            malformed.push(file.clone());
        }
    }

    for tag in &index.tags {
        debug!("{}: {} distinct values", tag, index.distinct_count(tag));
    }

    (index, malformed)
}

impl FolderTagIndex {
    /// Requested tags, in request order
    pub fn tags(&self) -> &[TagName] {
        &self.tags
    }

    /// Ordered `(file, value)` pairs for a tag
    pub fn values(&self, tag: &TagName) -> &[(ImageFile, TagValue)] {
        self.observations
            .get(tag)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Distinct values of a tag
    pub fn distinct(&self, tag: &TagName) -> BTreeSet<&TagValue> {
        self.values(tag).iter().map(|(_, value)| value).collect()
    }

    /// Number of distinct values of a tag
    pub fn distinct_count(&self, tag: &TagName) -> usize {
        self.distinct(tag).len()
    }

    /// Value of a tag for one file, if it was read
    pub fn value_of(&self, tag: &TagName, file: &ImageFile) -> Option<&TagValue> {
        self.values(tag)
            .iter()
            .find(|(f, _)| f == file)
            .map(|(_, value)| value)
    }

    /// Raw per-file InstanceNumber values, if InstanceNumber was requested
    pub fn instance_numbers(&self) -> Option<&[(ImageFile, TagValue)]> {
        self.find_tag(is_instance_number).map(|tag| self.values(tag))
    }

    /// Distinct ImageType values (empty if not requested)
    pub fn image_types(&self) -> BTreeSet<&TagValue> {
        self.find_tag(is_image_type)
            .map(|tag| self.distinct(tag))
            .unwrap_or_default()
    }

    /// Distinct SeriesNumber values (empty if not requested)
    pub fn series_numbers(&self) -> BTreeSet<&TagValue> {
        self.find_tag(is_series_number)
            .map(|tag| self.distinct(tag))
            .unwrap_or_default()
    }

    /// First requested tag matching `pred`
    pub fn find_tag(&self, pred: impl Fn(&TagName) -> bool) -> Option<&TagName> {
        self.tags.iter().find(|tag| pred(tag))
    }

    /// Narrows the index to the given files
    ///
    /// Values only seen on dropped files disappear from the distinct sets.
    /// A file listed `n` times in `files` keeps at most `n` observations.
    pub fn restricted_to(&self, files: &[ImageFile]) -> FolderTagIndex {
        let mut keep: HashMap<&ImageFile, usize> = HashMap::new();
        for file in files {
            *keep.entry(file).or_default() += 1;
        }

        let observations = self
            .observations
            .iter()
            .map(|(tag, values)| {
                let mut remaining = keep.clone();
                let kept: Vec<(ImageFile, TagValue)> = values
                    .iter()
                    .filter(|(file, _)| match remaining.get_mut(file) {
                        Some(count) if *count > 0 => {
                            *count -= 1;
                            true
                        }
                        _ => false,
                    })
                    .cloned()
                    .collect();
                (tag.clone(), kept)
            })
            .collect();

        FolderTagIndex {
            tags: self.tags.clone(),
            observations,
        }
    }

    /// Distinct values per tag, keyed by tag name
    pub fn summary(&self) -> BTreeMap<String, Vec<TagValue>> {
        self.tags
            .iter()
            .map(|tag| {
                let values = self.distinct(tag).into_iter().cloned().collect();
                (tag.to_string(), values)
            })
            .collect()
    }
}
