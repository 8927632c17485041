//! PyO3 bindings for `trimarshal`.
//!
//! Notes
//! - Keep bindings thin: the host adapter in `common` reads dicts and sequences,
//!   everything else is the core crate.
//! - Calls hold the GIL from encode to release; no state survives a call.

mod common;
mod triangulate;

use pyo3::prelude::*;

#[pymodule]
fn trimarshal_native(_py: Python, m: &PyModule) -> PyResult<()> {
    triangulate::register(m)?;
    m.add("__version__", trimarshal::VERSION)?;
    Ok(())
}
