use std::path::PathBuf;
use thiserror::Error;

/// Result type for dcmcheck operations
pub type Result<T> = std::result::Result<T, DcmCheckError>;

/// Error types for dcmcheck operations
#[derive(Error, Debug)]
pub enum DcmCheckError {
    /// No `.dcm`/`.IMA` files in the input folder, or an empty file list
    #[error("No DICOM files found in {}", .0.display())]
    NoInputFiles(PathBuf),

    /// Every file of the folder was excluded during consolidation
    #[error("No recoverable DICOM files left in {}", .0.display())]
    NoRecoverableFiles(PathBuf),

    /// The file does not expose the requested field
    #[error("{} has no {tag} field", .path.display())]
    MissingField { path: PathBuf, tag: String },

    /// DICOM reading error
    #[error("DICOM error: {0}")]
    DicomError(String),

    /// Invalid tag value
    #[error("Invalid tag value: {0}")]
    InvalidValue(String),

    /// Tag name that is neither a dictionary keyword nor a `gggg,eeee` pair
    #[error("Invalid tag name: {0}")]
    InvalidTagName(String),

    /// Export destination already holds files, or two exported files
    /// would share a name
    #[error("Export conflict at {}", .0.display())]
    ExportConflict(PathBuf),

    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl DcmCheckError {
    /// Whether the error only concerns a single file and can be absorbed
    /// by excluding that file from the folder.
    pub fn is_file_level(&self) -> bool {
        matches!(
            self,
            DcmCheckError::MissingField { .. }
                | DcmCheckError::DicomError(_)
                | DcmCheckError::InvalidValue(_)
        )
    }
}

// Convert dicom-object errors
impl From<dicom_object::ReadError> for DcmCheckError {
    fn from(e: dicom_object::ReadError) -> Self {
        DcmCheckError::DicomError(format!("{}", e))
    }
}

impl From<dicom_core::value::CastValueError> for DcmCheckError {
    fn from(e: dicom_core::value::CastValueError) -> Self {
        DcmCheckError::InvalidValue(format!("{}", e))
    }
}
