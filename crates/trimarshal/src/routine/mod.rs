//! Geometry routine seam.
//!
//! The marshalling layer only depends on `GeometryRoutine`. Contract for
//! implementors:
//! - `points` holds `2 * number_of_points` values and `triangles` holds
//!   `number_of_corners * number_of_triangles` zero-based point indices.
//! - Auxiliary buffers may be `None`.
//! - The routine is invoked once per call and must not keep references to the
//!   input record.

mod cdt;

pub use cdt::CdtRoutine;

use std::fmt;

use crate::options::TriangulateOptions;
use crate::record::{InputRecord, OutputRecord};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoutineError {
    /// A point the routine cannot represent (non-finite or out of range).
    InvalidPoint { index: usize, reason: String },
    /// Segment endpoint does not name an input point.
    SegmentIndex {
        segment: usize,
        index: i32,
        points: usize,
    },
    /// Output would need an index beyond the integer buffer range.
    IndexOverflow { count: usize },
}

impl fmt::Display for RoutineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPoint { index, reason } => write!(f, "point {index} rejected: {reason}"),
            Self::SegmentIndex {
                segment,
                index,
                points,
            } => write!(
                f,
                "segment {segment} references point {index}, but only {points} points exist"
            ),
            Self::IndexOverflow { count } => {
                write!(f, "{count} output points exceed the index range")
            }
        }
    }
}

impl std::error::Error for RoutineError {}

/// External triangulation routine.
pub trait GeometryRoutine {
    fn triangulate(
        &self,
        opts: &TriangulateOptions,
        input: &InputRecord,
    ) -> Result<OutputRecord, RoutineError>;
}

impl<R: GeometryRoutine + ?Sized> GeometryRoutine for &R {
    fn triangulate(
        &self,
        opts: &TriangulateOptions,
        input: &InputRecord,
    ) -> Result<OutputRecord, RoutineError> {
        (**self).triangulate(opts, input)
    }
}
