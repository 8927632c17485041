//! `triangulate(params, switches=None, max_field_len=None)` binding.
//!
//! `max_field_len=0` disables the allocation cap, as `--max-field-len 0` does in the CLI.
//!
//! Inputs are a plain `dict` with `pointlist`, `segmentlist` and `holelist`
//! sequences; the output is a `dict` of lists so results round-trip through JSON.

use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};
use trimarshal::{
    MarshalCfg, TriangulateError, TriangulateOptions, TriangulateResult, Triangulator,
};

use crate::common::{map_triangulate_err, PyHost};

pub fn register(m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(triangulate, m)?)?;
    m.add_function(wrap_pyfunction!(default_switches, m)?)?;
    Ok(())
}

/// Triangulate a planar straight-line graph given as flat lists.
#[pyfunction]
#[pyo3(signature = (params, switches=None, max_field_len=None))]
fn triangulate(
    py: Python<'_>,
    params: &PyAny,
    switches: Option<&str>,
    max_field_len: Option<usize>,
) -> PyResult<PyObject> {
    let host = PyHost::from_any(params)?;
    let options = match switches {
        Some(s) => s
            .parse::<TriangulateOptions>()
            .map_err(|e| map_triangulate_err(TriangulateError::from(e)))?,
        None => TriangulateOptions::default(),
    };
    let result = Triangulator::new(MarshalCfg::with_cap(max_field_len), options)
        .triangulate(&host)
        .map_err(map_triangulate_err)?;
    result_to_py(py, &result)
}

/// Switch string used when `switches` is omitted.
#[pyfunction]
fn default_switches() -> String {
    TriangulateOptions::default().switches()
}

fn result_to_py(py: Python<'_>, res: &TriangulateResult) -> PyResult<PyObject> {
    let triangles = PyList::empty(py);
    for tri in &res.trianglelist {
        triangles.append(PyList::new(py, tri))?;
    }
    let segments = PyList::empty(py);
    for seg in &res.segmentlist {
        segments.append(PyList::new(py, seg))?;
    }
    let dict = PyDict::new(py);
    dict.set_item("pointlist", PyList::new(py, &res.pointlist))?;
    dict.set_item("trianglelist", triangles)?;
    dict.set_item("segmentlist", segments)?;
    dict.set_item("pointmarkerlist", PyList::new(py, &res.pointmarkerlist))?;
    Ok(dict.into())
}
