//! Utility functions for Python bindings conversions

use pyo3::prelude::*;
use pyo3::types::{PyList, PyTuple};
use std::path::PathBuf;

use crate::types::{ImageFile, TagValue};

/// Converts a Python path-like object (str or pathlib.Path) to PathBuf
pub fn path_to_pathbuf(path: &Bound<'_, PyAny>) -> PyResult<PathBuf> {
    // Try to convert as string first
    if let Ok(s) = path.extract::<String>() {
        return Ok(PathBuf::from(s));
    }

    // Try to call __str__() for pathlib.Path objects
    if let Ok(s) = path.str() {
        let path_str: String = s.extract()?;
        return Ok(PathBuf::from(path_str));
    }

    Err(pyo3::exceptions::PyTypeError::new_err(
        "Path must be a string or path-like object",
    ))
}

/// Converts a list or tuple of path-like objects to image files
pub fn paths_to_image_files(paths: &Bound<'_, PyAny>) -> PyResult<Vec<ImageFile>> {
    let mut files = Vec::new();
    for item in paths.iter()? {
        files.push(ImageFile::new(path_to_pathbuf(&item?)?));
    }
    Ok(files)
}

/// Whether the argument is a list or tuple rather than a single path
pub fn is_path_sequence(obj: &Bound<'_, PyAny>) -> bool {
    obj.is_instance_of::<PyList>() || obj.is_instance_of::<PyTuple>()
}

/// Converts a tag value to Python: str for scalars, tuple of str otherwise
pub fn tag_value_to_py(py: Python, value: &TagValue) -> PyObject {
    match value {
        TagValue::Scalar(s) => s.into_py(py),
        TagValue::Tuple(elements) => PyTuple::new_bound(py, elements).into_py(py),
    }
}
