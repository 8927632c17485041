//! Marshalling layer between host-runtime arrays and a planar triangulation routine.
//!
//! A call is: encode the host object into owned flat buffers, invoke the routine
//! once, decode its output into host-neutral lists, release every buffer.
//!
//! Layout
//! - `field`, `buffer`, `record`: the fixed exchange schema and its owned storage.
//! - `host`: the seam hosts implement (`HostObject`, `HostArray`); JSON adapter.
//! - `encode`, `decode`, `call`: the protocol and its lifecycle.
//! - `routine`: the `GeometryRoutine` trait and the default `spade`-backed `CdtRoutine`.
//! - `options`, `cfg`: switch string and limits.
//! - `polyfile`: Triangle `.poly` text and `PlanarGraph`.
//! - `svg`: SVG path outlines flattened into planar graphs.

pub mod buffer;
pub mod call;
pub mod cfg;
pub mod decode;
pub mod encode;
pub mod field;
pub mod host;
pub mod options;
pub mod polyfile;
pub mod record;
pub mod routine;
pub mod svg;


pub use call::{Call, SolvedCall, TriangulateError, Triangulator};
pub use cfg::MarshalCfg;
pub use decode::{Decoder, TriangulateResult};
pub use encode::Encoder;
pub use options::TriangulateOptions;
pub use polyfile::{HoleSeeds, PlanarGraph};
pub use routine::{CdtRoutine, GeometryRoutine};

use nalgebra::Vector2;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common exports for callers.
pub mod prelude {
    pub use crate::host::{HostArray, HostField, HostObject};
    pub use crate::{
        CdtRoutine, GeometryRoutine, MarshalCfg, PlanarGraph, TriangulateError,
        TriangulateOptions, TriangulateResult, Triangulator,
    };
}

/// Triangulate a JSON configuration object with default options and limits.
pub fn triangulate_json(params: &serde_json::Value) -> Result<TriangulateResult, TriangulateError> {
    let obj = host::json::as_host_object(params)?;
    Triangulator::default().triangulate(&obj)
}

/// Signed area of the parallelogram spanned by `a` and `b`.
/// Positive for a→b counterclockwise, negative otherwise.
#[inline]
pub fn parallelogram_area(a: Vector2<f64>, b: Vector2<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}
