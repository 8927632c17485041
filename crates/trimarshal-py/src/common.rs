use pyo3::exceptions::{PyRuntimeError, PyTypeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PySequence, PyString};
use trimarshal::host::{HostArray, HostField, HostObject};
use trimarshal::TriangulateError;

/// A Python `dict` read as a host configuration object.
pub struct PyHost<'py> {
    dict: &'py PyDict,
}

impl<'py> PyHost<'py> {
    /// Accept dicts only; anything else is the host's "object expected" type error.
    pub fn from_any(obj: &'py PyAny) -> PyResult<Self> {
        let dict = obj.downcast::<PyDict>().map_err(|_| {
            PyTypeError::new_err(format!("object expected, got {}", type_name(obj)))
        })?;
        Ok(Self { dict })
    }
}

/// A Python sequence (list, tuple, ...) read as a host array.
pub struct PyHostArray<'py> {
    seq: &'py PySequence,
    len: usize,
}

impl HostArray for PyHostArray<'_> {
    fn len(&self) -> usize {
        self.len
    }

    fn number(&self, i: usize) -> Option<f64> {
        self.seq.get_item(i).ok()?.extract::<f64>().ok()
    }
}

impl<'py> HostObject for PyHost<'py> {
    type Array = PyHostArray<'py>;

    fn field(&self, name: &str) -> HostField<Self::Array> {
        let value = match self.dict.get_item(name) {
            Ok(Some(value)) if !value.is_none() => value,
            _ => return HostField::Missing,
        };
        if value.is_instance_of::<PyString>() {
            return HostField::NotArray(type_name(value));
        }
        match value.downcast::<PySequence>() {
            Ok(seq) => match seq.len() {
                Ok(len) => HostField::Array(PyHostArray { seq, len }),
                Err(_) => HostField::NotArray(type_name(value)),
            },
            Err(_) => HostField::NotArray(type_name(value)),
        }
    }
}

fn type_name(obj: &PyAny) -> String {
    obj.get_type()
        .name()
        .map(|n| n.to_string())
        .unwrap_or_else(|_| "object".to_string())
}

/// Type errors → `TypeError`, routine failures → `RuntimeError`, the rest → `ValueError`.
pub fn map_triangulate_err(err: TriangulateError) -> PyErr {
    if err.is_type_error() {
        return PyTypeError::new_err(err.to_string());
    }
    match err {
        TriangulateError::Routine(_) | TriangulateError::Decode(_) => {
            PyRuntimeError::new_err(err.to_string())
        }
        _ => PyValueError::new_err(err.to_string()),
    }
}
