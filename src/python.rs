use crate::imaging::error::ImagingError;
use crate::{reconstruct_folder, ReconstructionConfig};
use numpy::IntoPyArray;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;
use std::path::PathBuf;

impl From<ImagingError> for PyErr {
    fn from(value: ImagingError) -> Self {
        let msg = value.to_string();
        PyValueError::new_err(msg)
    }
}

/// Reconstructs the scan in `folder` into a depth stack.
///
/// Returns a dict with `stack` (depth x y x x magnitudes), `depths`, `x_axis` and `y_axis`
/// in mm, `skipped` as (depth, bin) pairs, and the zero-filled `missing_rows`.
#[pyfunction]
#[pyo3(name = "reconstruct")]
#[pyo3(signature = (folder, config = None))]
fn reconstruct_py(
    py: Python<'_>,
    folder: PathBuf,
    config: Option<PathBuf>,
) -> PyResult<Bound<'_, PyDict>> {
    let config = match config {
        Some(path) => ReconstructionConfig::from_yaml(path).map_err(ImagingError::from)?,
        None => ReconstructionConfig::default(),
    };
    let reconstruction = py.allow_threads(|| reconstruct_folder(&folder, &config))?;

    let stack = &reconstruction.stack;
    let dict = PyDict::new_bound(py);
    dict.set_item("stack", stack.volume().clone().into_pyarray_bound(py))?;
    dict.set_item("depths", stack.depths_mm().to_vec().into_pyarray_bound(py))?;
    dict.set_item("x_axis", stack.x_axis().clone().into_pyarray_bound(py))?;
    dict.set_item("y_axis", stack.y_axis().clone().into_pyarray_bound(py))?;
    dict.set_item(
        "skipped",
        reconstruction
            .skipped
            .iter()
            .map(|s| (s.depth_mm, s.bin))
            .collect::<Vec<_>>(),
    )?;
    dict.set_item("missing_rows", reconstruction.missing_rows.clone())?;
    Ok(dict)
}

/// Millimeter-wave SAR reconstruction.
#[pymodule]
fn mmsar(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(reconstruct_py, m)?)?;
    Ok(())
}
