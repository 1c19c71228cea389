//! Python exception types for dcmcheck
//!
//! Each `DcmCheckError` variant maps to one exception class, all deriving
//! from `DcmCheckError` on the Python side.

// Suppress warnings from PyO3's create_exception! macro about gil-refs feature
#![allow(unexpected_cfgs)]

use pyo3::{create_exception, exceptions::PyException, prelude::*};

use crate::error::DcmCheckError;

// Base exception
create_exception!(
    dcmcheck,
    PyDcmCheckError,
    PyException,
    "Base exception for all dcmcheck errors"
);

create_exception!(
    dcmcheck,
    PyNoInputFilesError,
    PyDcmCheckError,
    "Folder holds no .dcm or .IMA file"
);

create_exception!(
    dcmcheck,
    PyNoRecoverableFilesError,
    PyDcmCheckError,
    "Every file of the folder was excluded"
);

create_exception!(
    dcmcheck,
    PyMissingFieldError,
    PyDcmCheckError,
    "DICOM file does not expose the requested field"
);

create_exception!(
    dcmcheck,
    PyDicomError,
    PyDcmCheckError,
    "DICOM reading or parsing error"
);

create_exception!(
    dcmcheck,
    PyInvalidValueError,
    PyDcmCheckError,
    "Invalid DICOM tag value encountered"
);

create_exception!(
    dcmcheck,
    PyInvalidTagNameError,
    PyDcmCheckError,
    "Tag name is neither a keyword nor a group,element pair"
);

create_exception!(
    dcmcheck,
    PyExportConflictError,
    PyDcmCheckError,
    "Export destination is not empty or two files share a name"
);

/// Convert Rust DcmCheckError to appropriate Python exception
pub fn convert_error(err: DcmCheckError) -> PyErr {
    let msg = err.to_string();
    match err {
        DcmCheckError::NoInputFiles(_) => PyNoInputFilesError::new_err(msg),
        DcmCheckError::NoRecoverableFiles(_) => PyNoRecoverableFilesError::new_err(msg),
        DcmCheckError::MissingField { .. } => PyMissingFieldError::new_err(msg),
        DcmCheckError::DicomError(_) => PyDicomError::new_err(msg),
        DcmCheckError::InvalidValue(_) => PyInvalidValueError::new_err(msg),
        DcmCheckError::InvalidTagName(_) => PyInvalidTagNameError::new_err(msg),
        DcmCheckError::ExportConflict(_) => PyExportConflictError::new_err(msg),
        DcmCheckError::IoError(_) => pyo3::exceptions::PyIOError::new_err(msg),
    }
}
