use crate::error::Result;
use crate::extraction::tags::{
    ACQUISITION_TIME, DEFAULT_EXTENSIONS, IMAGE_TYPE, INSTANCE_NUMBER, PROJECTION_IMAGE,
    SERIES_NUMBER,
};
use crate::types::TagName;

/// Configuration for consolidating a folder of DICOM slices
///
/// # Example
///
/// ```
/// use dcmcheck_core::ConsolidationConfig;
///
/// let config = ConsolidationConfig::default()
///     .with_required_tags(["ImageType", "SeriesNumber", "InstanceNumber"])
///     .remove_duplicates(false);
///
/// assert_eq!(config.required_tags.len(), 3);
/// assert!(!config.remove_duplicates);
/// assert!(config.select_series);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(default))]
pub struct ConsolidationConfig {
    /// Fields every file must expose; a file missing any of them is malformed
    pub required_tags: Vec<String>,

    /// File extensions searched in a folder, in order. The first extension
    /// that matches at least one file wins.
    pub extensions: Vec<String>,

    /// ImageType element marking localizer/projection acquisitions
    pub projection_marker: String,

    /// Drop one copy of each instance when the folder holds a doubled series
    pub remove_duplicates: bool,

    /// Narrow the folder down to a single image type / series number
    pub select_series: bool,
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            required_tags: [IMAGE_TYPE, SERIES_NUMBER, ACQUISITION_TIME, INSTANCE_NUMBER]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            projection_marker: PROJECTION_IMAGE.to_string(),
            remove_duplicates: true,
            select_series: true,
        }
    }
}

impl ConsolidationConfig {
    /// Creates a config requiring only the fields the decisions depend on
    ///
    /// Files without an AcquisitionTime are kept.
    ///
    /// # Example
    ///
    /// ```
    /// use dcmcheck_core::ConsolidationConfig;
    ///
    /// let permissive = ConsolidationConfig::permissive();
    /// assert!(!permissive.required_tags.iter().any(|t| t == "AcquisitionTime"));
    /// ```
    pub fn permissive() -> Self {
        Self::default().with_required_tags([IMAGE_TYPE, SERIES_NUMBER, INSTANCE_NUMBER])
    }

    /// Builder: Set the required tags
    pub fn with_required_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Builder: Add one more required tag
    pub fn require_tag(mut self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        if !self.required_tags.contains(&tag) {
            self.required_tags.push(tag);
        }
        self
    }

    /// Builder: Set the searched file extensions
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Builder: Set the projection marker
    pub fn with_projection_marker(mut self, marker: impl Into<String>) -> Self {
        self.projection_marker = marker.into();
        self
    }

    /// Builder: Enable or disable duplicate removal
    pub fn remove_duplicates(mut self, enabled: bool) -> Self {
        self.remove_duplicates = enabled;
        self
    }

    /// Builder: Enable or disable series selection
    pub fn select_series(mut self, enabled: bool) -> Self {
        self.select_series = enabled;
        self
    }

    /// Parses the tags to index
    ///
    /// The fields used by duplicate removal and series selection are always
    /// indexed, after the required ones, so that a file missing any of them
    /// is excluded.
    ///
    /// # Errors
    ///
    /// Returns an error if a required tag name is malformed.
    pub fn tag_names(&self) -> Result<Vec<TagName>> {
        let mut names = Vec::new();
        let decision_tags = [IMAGE_TYPE, SERIES_NUMBER, INSTANCE_NUMBER];
        for raw in self
            .required_tags
            .iter()
            .map(String::as_str)
            .chain(decision_tags)
        {
            let name = TagName::parse(raw)?;
            if !names.contains(&name) {
                names.push(name);
            }
        }
        Ok(names)
    }

    /// Loads a config from a JSON file
    ///
    /// Missing fields take their default values.
    #[cfg(feature = "json")]
    pub fn from_json_file(path: &std::path::Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| {
            crate::error::DcmCheckError::InvalidValue(format!(
                "{}: invalid config ({})",
                path.display(),
                e
            ))
        })
    }
}
