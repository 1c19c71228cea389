//! Python bindings for dcmcheck
//!
//! This module provides PyO3 bindings so the conversion pipeline can hand a
//! folder (or a list of slices) to the consolidator and get the retained
//! paths back.

// Suppress false positive warnings from PyO3 macro expansion
#![allow(clippy::useless_conversion)]

use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

use crate::api::FolderConsolidator;
use crate::extraction::{DicomTagReader, TagReader};
use crate::types::{ConsolidationConfig, ImageFile, TagName};

mod errors;
mod utils;

pub use errors::*;
use utils::{is_path_sequence, path_to_pathbuf, paths_to_image_files, tag_value_to_py};

/// Reduce a folder of DICOM slices to a single, de-duplicated acquisition
///
/// Args:
///     path_or_list: Folder (str or pathlib.Path) or list of slice paths
///     permissive: Keep files without an AcquisitionTime (default: False)
///
/// Returns:
///     tuple[list[str], dict[str, list]]: Retained paths and the distinct
///     values of each indexed tag among them
///
/// Raises:
///     NoInputFilesError: If the folder holds no .dcm or .IMA file
///     NoRecoverableFilesError: If every file was excluded
///     InvalidTagNameError: If a configured tag name is malformed
///
/// Example:
///     >>> from dcmcheck import consolidate
///     >>> paths, tags = consolidate("subject1/T1")
///     >>> print(tags["SeriesNumber"])
#[pyfunction]
#[pyo3(signature = (path_or_list, permissive=false))]
fn consolidate(
    py: Python,
    path_or_list: &Bound<'_, PyAny>,
    permissive: bool,
) -> PyResult<(Vec<String>, Py<PyDict>)> {
    let config = if permissive {
        ConsolidationConfig::permissive()
    } else {
        ConsolidationConfig::default()
    };
    let consolidator = FolderConsolidator::new(config);

    let result = if is_path_sequence(path_or_list) {
        let files = paths_to_image_files(path_or_list)?;
        consolidator.consolidate_files(files)
    } else {
        let directory = path_to_pathbuf(path_or_list)?;
        consolidator.consolidate_folder(&directory)
    }
    .map_err(convert_error)?;

    let paths = result
        .paths()
        .iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect();

    let tags = PyDict::new_bound(py);
    for (tag, values) in result.tag_values() {
        let values: Vec<PyObject> = values.iter().map(|v| tag_value_to_py(py, v)).collect();
        tags.set_item(tag, PyList::new_bound(py, values))?;
    }

    Ok((paths, tags.unbind()))
}

/// Read one normalized tag value from a DICOM file
///
/// Args:
///     path: Path to the DICOM file (str or pathlib.Path)
///     tag: Keyword (SeriesNumber) or group,element pair (0020,0011)
///
/// Returns:
///     str | tuple[str, ...]: Scalar value, or tuple for multi-valued fields
///
/// Raises:
///     MissingFieldError: If the file does not expose the field
///     DicomError: If the file cannot be read or parsed
///     InvalidTagNameError: If the tag name is malformed
#[pyfunction]
fn read_tag(py: Python, path: &Bound<'_, PyAny>, tag: &str) -> PyResult<PyObject> {
    let file = ImageFile::new(path_to_pathbuf(path)?);
    let tag = TagName::parse(tag).map_err(convert_error)?;
    let value = DicomTagReader
        .read_tag(&file, &tag)
        .map_err(convert_error)?;
    Ok(tag_value_to_py(py, &value))
}

/// Python module definition
#[pymodule]
fn _dcmcheck(py: Python, m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Register exception classes
    m.add("DcmCheckError", py.get_type_bound::<PyDcmCheckError>())?;
    m.add(
        "NoInputFilesError",
        py.get_type_bound::<PyNoInputFilesError>(),
    )?;
    m.add(
        "NoRecoverableFilesError",
        py.get_type_bound::<PyNoRecoverableFilesError>(),
    )?;
    m.add(
        "MissingFieldError",
        py.get_type_bound::<PyMissingFieldError>(),
    )?;
    m.add("DicomError", py.get_type_bound::<PyDicomError>())?;
    m.add(
        "InvalidValueError",
        py.get_type_bound::<PyInvalidValueError>(),
    )?;
    m.add(
        "InvalidTagNameError",
        py.get_type_bound::<PyInvalidTagNameError>(),
    )?;
    m.add(
        "ExportConflictError",
        py.get_type_bound::<PyExportConflictError>(),
    )?;

    // Register functions
    m.add_function(wrap_pyfunction!(consolidate, m)?)?;
    m.add_function(wrap_pyfunction!(read_tag, m)?)?;

    // Add version
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
