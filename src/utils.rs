//! Conversion helpers for the Python bindings.
#[cfg(feature = "python-bindings")]
use ndarray::Array2;

#[cfg(feature = "python-bindings")]
use pyo3::{
    exceptions::{PyTypeError, PyValueError},
    prelude::*,
    types::{PyAny, PyDict},
};

#[cfg(feature = "python-bindings")]
use crate::{
    optimization::loglik_optimizer::traits::{Algorithm, LineSearcher, MLEOptions, Tolerances},
    term_structure::{
        core::{
            mask::ParameterMatrix,
            params::{MatrixName, ParameterSet},
        },
        errors::AffineError,
    },
};

#[cfg(feature = "python-bindings")]
use numpy::{
    IntoPyArray,    // Vec → PyArray
    PyArrayMethods, // .readonly()
    PyReadonlyArray1,
    PyReadonlyArray2,
};

#[cfg(feature = "python-bindings")]
#[inline]
pub fn extract_f64_array<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray1<'py, f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray1<f64>>() {
        if arr_ro.as_slice().is_ok() {
            return Ok(arr_ro);
        }
    }

    if let Ok(obj) = raw_data.call_method("to_numpy", (false,), None) {
        if let Ok(series_ro) = obj.extract::<PyReadonlyArray1<f64>>() {
            if series_ro.as_slice().is_ok() {
                return Ok(series_ro);
            }
        }
    }

    let vec: Vec<f64> = raw_data.extract().map_err(|_| {
        PyTypeError::new_err("expected a 1-D numpy.ndarray, pandas.Series, or sequence of float64")
    })?;
    Ok(vec.into_pyarray(py).readonly())
}

/// 2-D float matrix from an ndarray, a DataFrame (`to_numpy`), or nested
/// sequences.
#[cfg(feature = "python-bindings")]
pub fn extract_f64_matrix(raw_data: &Bound<'_, PyAny>) -> PyResult<Array2<f64>> {
    if let Ok(arr) = raw_data.extract::<PyReadonlyArray2<f64>>() {
        return Ok(arr.as_array().to_owned());
    }
    if let Ok(obj) = raw_data.call_method("to_numpy", (), None) {
        if let Ok(arr) = obj.extract::<PyReadonlyArray2<f64>>() {
            return Ok(arr.as_array().to_owned());
        }
    }
    let rows: Vec<Vec<f64>> = raw_data.extract().map_err(|_| {
        PyTypeError::new_err("expected a 2-D numpy.ndarray, DataFrame, or nested sequence of float64")
    })?;
    rows_to_array(rows)
}

#[cfg(feature = "python-bindings")]
fn extract_bool_matrix(raw_data: &Bound<'_, PyAny>) -> PyResult<Array2<bool>> {
    if let Ok(arr) = raw_data.extract::<PyReadonlyArray2<bool>>() {
        return Ok(arr.as_array().to_owned());
    }
    let rows: Vec<Vec<bool>> = raw_data
        .extract()
        .map_err(|_| PyTypeError::new_err("mask must be a 2-D boolean array or nested sequence"))?;
    rows_to_array(rows)
}

#[cfg(feature = "python-bindings")]
fn rows_to_array<T: Clone>(rows: Vec<Vec<T>>) -> PyResult<Array2<T>> {
    let n_rows = rows.len();
    let n_cols = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|r| r.len() != n_cols) {
        return Err(PyValueError::new_err("rows must all have the same length"));
    }
    let flat: Vec<T> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((n_rows, n_cols), flat)
        .map_err(|e| PyValueError::new_err(e.to_string()))
}

/// Build a [`ParameterSet`] from `{name: values}` or
/// `{name: (values, mask)}`; `mask[i][j] = True` frees a cell. Matrices not
/// named stay fixed at zero.
#[cfg(feature = "python-bindings")]
pub fn build_parameter_set(
    matrices: &Bound<'_, PyDict>, n_factors: usize, n_maturities: usize,
) -> PyResult<ParameterSet> {
    let mut set = ParameterSet::zeros(n_factors, n_maturities);
    for (key, value) in matrices.iter() {
        let name: MatrixName = key.extract::<String>()?.parse()?;
        let (values, mask) = match value.extract::<(Bound<'_, PyAny>, Bound<'_, PyAny>)>() {
            Ok((values, mask)) => (extract_f64_matrix(&values)?, Some(extract_bool_matrix(&mask)?)),
            Err(_) => (extract_f64_matrix(&value)?, None),
        };
        let mut matrix = ParameterMatrix::from_real(name, values.view());
        if let Some(mask) = mask {
            matrix.apply_mask(&mask)?;
        }
        set.set(matrix);
    }
    Ok(set)
}

#[cfg(feature = "python-bindings")]
pub fn extract_mle_opts(
    algorithm: Option<&str>, line_searcher: Option<&str>, tol_grad: Option<f64>,
    tol_cost: Option<f64>, max_iter: Option<usize>, max_fevals: Option<u64>,
    lbfgs_mem: Option<usize>,
) -> PyResult<MLEOptions> {
    use std::str::FromStr;

    let defaults = MLEOptions::default();
    let tols = if tol_grad.is_none() && tol_cost.is_none() && max_iter.is_none() {
        defaults.tols
    } else {
        Tolerances::new(tol_grad, tol_cost, max_iter).map_err(AffineError::from)?
    };
    let algorithm = match algorithm {
        Some(name) => Algorithm::from_str(name).map_err(AffineError::from)?,
        None => defaults.algorithm,
    };
    let ls = match line_searcher {
        Some(name) => LineSearcher::from_str(name).map_err(AffineError::from)?,
        None => defaults.line_searcher,
    };
    let opts = MLEOptions::new(tols, algorithm, ls, false, lbfgs_mem).map_err(AffineError::from)?;
    match max_fevals {
        Some(max) => Ok(opts.with_max_fevals(max).map_err(AffineError::from)?),
        None => Ok(opts),
    }
}
