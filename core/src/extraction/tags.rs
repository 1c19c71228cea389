use crate::types::TagName;
use dicom_core::Tag;

// Keywords of the fields consolidation decides on
pub const IMAGE_TYPE: &str = "ImageType";
pub const SERIES_NUMBER: &str = "SeriesNumber";
pub const INSTANCE_NUMBER: &str = "InstanceNumber";
pub const ACQUISITION_TIME: &str = "AcquisitionTime";

// Same fields by number
pub const IMAGE_TYPE_TAG: Tag = Tag(0x0008, 0x0008);
pub const SERIES_NUMBER_TAG: Tag = Tag(0x0020, 0x0011);
pub const INSTANCE_NUMBER_TAG: Tag = Tag(0x0020, 0x0013);
pub const ACQUISITION_TIME_TAG: Tag = Tag(0x0008, 0x0032);

/// ImageType element of localizer/projection acquisitions
pub const PROJECTION_IMAGE: &str = "PROJECTION IMAGE";

/// Extensions of slice files, in search order
pub const DEFAULT_EXTENSIONS: [&str; 2] = ["dcm", "IMA"];

/// Fields printed by `dcmtags` when none are requested
pub const DEFAULT_INSPECT_TAGS: [&str; 6] = [
    "SeriesDescription",
    IMAGE_TYPE,
    SERIES_NUMBER,
    INSTANCE_NUMBER,
    ACQUISITION_TIME,
    "SeriesInstanceUID",
];

/// Checks if `name` refers to the field with the given keyword and number
pub fn names_field(name: &TagName, keyword: &str, tag: Tag) -> bool {
    name.is(keyword) || name.tag() == Some(tag)
}

/// Checks if `name` refers to ImageType
pub fn is_image_type(name: &TagName) -> bool {
    names_field(name, IMAGE_TYPE, IMAGE_TYPE_TAG)
}

/// Checks if `name` refers to SeriesNumber
pub fn is_series_number(name: &TagName) -> bool {
    names_field(name, SERIES_NUMBER, SERIES_NUMBER_TAG)
}

/// Checks if `name` refers to InstanceNumber
pub fn is_instance_number(name: &TagName) -> bool {
    names_field(name, INSTANCE_NUMBER, INSTANCE_NUMBER_TAG)
}
