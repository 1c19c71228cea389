use crate::extraction::tags::{IMAGE_TYPE, SERIES_NUMBER};
use crate::extraction::TagReader;
use crate::types::{ImageFile, TagName, TagValue};
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::fmt;

/// The single acquisition kept from a folder
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
#[cfg_attr(
    feature = "json",
    serde(tag = "by", content = "value", rename_all = "snake_case")
)]
pub enum SeriesSelection {
    /// Keep files of this ImageType (localizers present)
    ImageType(TagValue),
    /// Keep files of this SeriesNumber (several series present)
    SeriesNumber(TagValue),
    /// One image type and one series: keep everything
    All,
}

impl SeriesSelection {
    /// Field the selection filters on, if any
    pub fn tag(&self) -> Option<TagName> {
        match self {
            SeriesSelection::ImageType(_) => Some(TagName::keyword(IMAGE_TYPE)),
            SeriesSelection::SeriesNumber(_) => Some(TagName::keyword(SERIES_NUMBER)),
            SeriesSelection::All => None,
        }
    }

    /// Value a file must carry to be kept, if any
    pub fn value(&self) -> Option<&TagValue> {
        match self {
            SeriesSelection::ImageType(v) | SeriesSelection::SeriesNumber(v) => Some(v),
            SeriesSelection::All => None,
        }
    }

    /// Whether the selection keeps every file
    pub fn keeps_all(&self) -> bool {
        matches!(self, SeriesSelection::All)
    }
}

impl fmt::Display for SeriesSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeriesSelection::ImageType(v) => write!(f, "ImageType = {}", v),
            SeriesSelection::SeriesNumber(v) => write!(f, "SeriesNumber = {}", v),
            SeriesSelection::All => write!(f, "all files"),
        }
    }
}

/// Decides which acquisition of a folder to keep
///
/// Priority order:
/// 1. Several image types: the first (in set order) that does not carry
///    `projection_marker`, which drops localizer/projection scans
/// 2. Several series numbers: the numerically highest, assumed to be the
///    latest acquisition (e.g. post-contrast)
/// 3. Otherwise everything is kept
///
/// When every image type is a projection, rule 1 cannot pick anything and
/// the series numbers decide instead.
pub fn select_series(
    image_types: &BTreeSet<&TagValue>,
    series_numbers: &BTreeSet<&TagValue>,
    projection_marker: &str,
) -> SeriesSelection {
    if image_types.len() > 1 {
        match image_types
            .iter()
            .find(|image_type| !image_type.contains(projection_marker))
        {
            Some(image_type) => {
                info!("Several image types found, keeping {}", image_type);
                return SeriesSelection::ImageType((*image_type).clone());
            }
            None => warn!(
                "All {} image types are {}; falling back to series numbers",
                image_types.len(),
                projection_marker
            ),
        }
    }

    if series_numbers.len() > 1 {
        if let Some(latest) = series_numbers.iter().max_by(|a, b| a.numeric_cmp(b)) {
            info!(
                "{} series found, keeping series {}",
                series_numbers.len(),
                latest
            );
            return SeriesSelection::SeriesNumber((*latest).clone());
        }
    }

    SeriesSelection::All
}

/// Keeps the files matching a selection, in input order
///
/// Each file's field is read again through `reader`; files whose field
/// cannot be read are dropped.
pub fn retain_selected<R: TagReader>(
    reader: &R,
    files: &[ImageFile],
    selection: &SeriesSelection,
) -> Vec<ImageFile> {
    let (tag, wanted) = match (selection.tag(), selection.value()) {
        (Some(tag), Some(wanted)) => (tag, wanted),
        _ => return files.to_vec(),
    };

    files
        .iter()
        .filter(|file| match reader.read_tag(file, &tag) {
            Ok(value) => &value == wanted,
            Err(e) => {
                debug!("Dropping {}: {}", file, e);
                false
            }
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::reader::InMemoryTagReader;
    use crate::extraction::tags::{IMAGE_TYPE_TAG, SERIES_NUMBER_TAG};
    use dicom_core::{DataElement, PrimitiveValue, VR};
    use dicom_object::InMemDicomObject;

    const MARKER: &str = "PROJECTION IMAGE";

    fn original() -> TagValue {
        TagValue::tuple(["ORIGINAL", "PRIMARY"])
    }

    fn projection() -> TagValue {
        TagValue::tuple(["DERIVED", "PROJECTION IMAGE"])
    }

    fn slice(image_type: &[&str], series: &str) -> InMemDicomObject {
        let mut obj = InMemDicomObject::new_empty();
        obj.put(DataElement::new(
            IMAGE_TYPE_TAG,
            VR::CS,
            PrimitiveValue::Strs(image_type.iter().map(|s| s.to_string()).collect()),
        ));
        obj.put(DataElement::new(
            SERIES_NUMBER_TAG,
            VR::IS,
            PrimitiveValue::from(series),
        ));
        obj
    }

    #[test]
    fn test_projection_images_are_dropped() {
        let (a, b) = (original(), projection());
        let s = TagValue::scalar("4");
        let selection = select_series(&BTreeSet::from([&a, &b]), &BTreeSet::from([&s]), MARKER);
        assert_eq!(selection, SeriesSelection::ImageType(original()));
    }

    #[test]
    fn test_image_type_wins_over_series_number() {
        let (a, b) = (original(), projection());
        let (s1, s2) = (TagValue::scalar("1"), TagValue::scalar("2"));
        let selection = select_series(
            &BTreeSet::from([&a, &b]),
            &BTreeSet::from([&s1, &s2]),
            MARKER,
        );
        assert_eq!(selection, SeriesSelection::ImageType(original()));
    }

    #[test]
    fn test_first_non_projection_type_in_set_order() {
        let a = TagValue::tuple(["ORIGINAL", "SECONDARY"]);
        let b = TagValue::tuple(["DERIVED", "PRIMARY"]);
        let c = projection();
        let s = TagValue::scalar("1");
        let selection = select_series(
            &BTreeSet::from([&a, &b, &c]),
            &BTreeSet::from([&s]),
            MARKER,
        );
        // Tuples order element-wise: DERIVED\PRIMARY comes first
        assert_eq!(selection, SeriesSelection::ImageType(b));
    }

    #[test]
    fn test_latest_series_number_is_numeric() {
        let it = original();
        let (s1, s2, s3) = (
            TagValue::scalar("3"),
            TagValue::scalar("7"),
            TagValue::scalar("12"),
        );
        let selection = select_series(
            &BTreeSet::from([&it]),
            &BTreeSet::from([&s1, &s2, &s3]),
            MARKER,
        );
        assert_eq!(selection, SeriesSelection::SeriesNumber(TagValue::scalar("12")));
    }

    #[test]
    fn test_all_projection_falls_back_to_series() {
        let a = projection();
        let b = TagValue::tuple(["ORIGINAL", "PRIMARY", "PROJECTION IMAGE"]);
        let (s1, s2) = (TagValue::scalar("3"), TagValue::scalar("7"));
        let selection = select_series(
            &BTreeSet::from([&a, &b]),
            &BTreeSet::from([&s1, &s2]),
            MARKER,
        );
        assert_eq!(selection, SeriesSelection::SeriesNumber(TagValue::scalar("7")));
    }

    #[test]
    fn test_single_type_single_series_keeps_all() {
        let it = original();
        let s = TagValue::scalar("5");
        let selection = select_series(&BTreeSet::from([&it]), &BTreeSet::from([&s]), MARKER);
        assert_eq!(selection, SeriesSelection::All);
        assert!(selection.keeps_all());
        assert!(selection.tag().is_none());
    }

    #[test]
    fn test_retain_selected_by_image_type() {
        let reader = InMemoryTagReader::new()
            .with_object("1.dcm", slice(&["ORIGINAL", "PRIMARY"], "3"))
            .with_object("2.dcm", slice(&["DERIVED", "PROJECTION IMAGE"], "3"))
            .with_object("3.dcm", slice(&["ORIGINAL", "PRIMARY"], "3"));
        let files = reader.files();

        let kept = retain_selected(&reader, &files, &SeriesSelection::ImageType(original()));
        assert_eq!(kept, vec![files[0].clone(), files[2].clone()]);
    }

    #[test]
    fn test_retain_selected_by_series_number() {
        let reader = InMemoryTagReader::new()
            .with_object("1.dcm", slice(&["ORIGINAL", "PRIMARY"], "3"))
            .with_object("2.dcm", slice(&["ORIGINAL", "PRIMARY"], "7"))
            .with_object("3.dcm", slice(&["ORIGINAL", "PRIMARY"], "7"));
        let files = reader.files();

        let kept = retain_selected(
            &reader,
            &files,
            &SeriesSelection::SeriesNumber(TagValue::scalar("7")),
        );
        assert_eq!(kept, files[1..].to_vec());
    }

    #[test]
    fn test_retain_selected_drops_unreadable() {
        let reader =
            InMemoryTagReader::new().with_object("1.dcm", slice(&["ORIGINAL", "PRIMARY"], "7"));
        let files = vec![ImageFile::new("1.dcm"), ImageFile::new("gone.dcm")];

        let kept = retain_selected(
            &reader,
            &files,
            &SeriesSelection::SeriesNumber(TagValue::scalar("7")),
        );
        assert_eq!(kept, vec![ImageFile::new("1.dcm")]);
    }

    #[test]
    fn test_retain_all() {
        let files = vec![ImageFile::new("a.dcm"), ImageFile::new("b.dcm")];
        let reader = InMemoryTagReader::new();
        assert_eq!(retain_selected(&reader, &files, &SeriesSelection::All), files);
    }
}
