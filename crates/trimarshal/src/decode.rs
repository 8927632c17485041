//! Decoder: routine output buffers → host-neutral dynamic result.
//!
//! Reads exactly `count * multiplier` scalars per field (2 per point,
//! `number_of_corners` per triangle). Counts come from the routine; a buffer
//! shorter than its count implies is a `DecodeError`, never an out-of-bounds read.

use std::fmt;

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::buffer::FlatBuffer;
use crate::cfg::{COORD_ARITY, SEGMENT_ARITY};
use crate::field::{Scalar, POINTS, POINT_MARKERS, SEGMENTS, TRIANGLES};
use crate::record::OutputRecord;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodeError {
    ShortBuffer {
        field: &'static str,
        needed: usize,
        available: usize,
    },
    /// Declared corners per element is zero while elements are present.
    BadCorners { corners: usize },
    /// `count * multiplier` does not fit in `usize`.
    CountOverflow { field: &'static str },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShortBuffer {
                field,
                needed,
                available,
            } => write!(
                f,
                "output '{field}' holds {available} values, declared counts need {needed}"
            ),
            Self::BadCorners { corners } => {
                write!(f, "invalid corner count {corners} for a non-empty triangle list")
            }
            Self::CountOverflow { field } => write!(f, "declared size of '{field}' overflows"),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Decoded call result, in the shape handed back to hosts.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TriangulateResult {
    pub pointlist: Vec<f64>,
    pub trianglelist: Vec<Vec<i32>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub segmentlist: Vec<Vec<i32>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pointmarkerlist: Vec<i32>,
}

impl TriangulateResult {
    pub fn number_of_points(&self) -> usize {
        self.pointlist.len() / COORD_ARITY
    }

    pub fn number_of_triangles(&self) -> usize {
        self.trianglelist.len()
    }

    /// Output point `i`, if present.
    pub fn point(&self, i: usize) -> Option<Vector2<f64>> {
        let x = *self.pointlist.get(COORD_ARITY * i)?;
        let y = *self.pointlist.get(COORD_ARITY * i + 1)?;
        Some(Vector2::new(x, y))
    }

    /// Corner positions expanded to `[x, y, 0.0]` per corner, triangle by triangle.
    /// Corners naming a missing point are skipped.
    pub fn expand_vertices(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.trianglelist.len() * 9);
        for tri in &self.trianglelist {
            for &corner in tri {
                if let Some(p) = usize::try_from(corner).ok().and_then(|i| self.point(i)) {
                    out.extend([p.x, p.y, 0.0]);
                }
            }
        }
        out
    }

    /// Sum of absolute triangle areas (first three corners of each element).
    pub fn total_area(&self) -> f64 {
        self.trianglelist
            .iter()
            .filter_map(|tri| {
                let a = self.point(usize::try_from(*tri.first()?).ok()?)?;
                let b = self.point(usize::try_from(*tri.get(1)?).ok()?)?;
                let c = self.point(usize::try_from(*tri.get(2)?).ok()?)?;
                Some(0.5 * crate::parallelogram_area(b - a, c - a).abs())
            })
            .sum()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!(self)
    }
}

/// Reads an `OutputRecord` without taking ownership.
#[derive(Clone, Copy, Debug, Default)]
pub struct Decoder;

impl Decoder {
    pub fn decode(&self, out: &OutputRecord) -> Result<TriangulateResult, DecodeError> {
        let pointlist = flat(&out.points, POINTS.name, out.number_of_points, COORD_ARITY)?;
        let trianglelist = if out.number_of_triangles == 0 {
            Vec::new()
        } else if out.number_of_corners == 0 {
            return Err(DecodeError::BadCorners { corners: 0 });
        } else {
            chunked(
                &out.triangles,
                TRIANGLES,
                out.number_of_triangles,
                out.number_of_corners,
            )?
        };
        let segmentlist = match &out.segments {
            Some(buf) => chunked(buf, SEGMENTS.name, out.number_of_segments, SEGMENT_ARITY)?,
            None => Vec::new(),
        };
        let pointmarkerlist = match &out.point_markers {
            Some(buf) => flat(buf, POINT_MARKERS, out.number_of_points, 1)?,
            None => Vec::new(),
        };
        tracing::debug!(
            points = out.number_of_points,
            triangles = out.number_of_triangles,
            corners = out.number_of_corners,
            "decoded output record"
        );
        Ok(TriangulateResult {
            pointlist,
            trianglelist,
            segmentlist,
            pointmarkerlist,
        })
    }
}

/// First `count * multiplier` scalars of `buf` as a flat list.
pub fn flat<T: Scalar>(
    buf: &FlatBuffer<T>,
    field: &'static str,
    count: usize,
    multiplier: usize,
) -> Result<Vec<T>, DecodeError> {
    let needed = declared_len(buf, field, count, multiplier)?;
    Ok(buf.as_slice()[..needed].to_vec())
}

/// First `count` groups of `chunk` scalars of `buf`.
pub fn chunked<T: Scalar>(
    buf: &FlatBuffer<T>,
    field: &'static str,
    count: usize,
    chunk: usize,
) -> Result<Vec<Vec<T>>, DecodeError> {
    if chunk == 0 {
        return if count == 0 {
            Ok(Vec::new())
        } else {
            Err(DecodeError::BadCorners { corners: 0 })
        };
    }
    let needed = declared_len(buf, field, count, chunk)?;
    Ok(buf.as_slice()[..needed]
        .chunks_exact(chunk)
        .map(<[T]>::to_vec)
        .collect())
}

fn declared_len<T: Scalar>(
    buf: &FlatBuffer<T>,
    field: &'static str,
    count: usize,
    multiplier: usize,
) -> Result<usize, DecodeError> {
    let needed = count
        .checked_mul(multiplier)
        .ok_or(DecodeError::CountOverflow { field })?;
    if buf.len() < needed {
        return Err(DecodeError::ShortBuffer {
            field,
            needed,
            available: buf.len(),
        });
    }
    Ok(needed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_triangles() -> OutputRecord {
        let points = FlatBuffer::from_vec(2, vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0]);
        let triangles = FlatBuffer::from_vec(3, vec![0, 1, 2, 0, 2, 3]);
        OutputRecord::new(points, triangles)
    }

    #[test]
    fn chunked_decode_matches_flat_offsets() {
        let out = two_triangles();
        assert_eq!(out.number_of_corners, 3);
        assert_eq!(out.number_of_triangles, 2);
        let res = Decoder.decode(&out).unwrap();
        assert_eq!(res.trianglelist.len(), 2);
        for (i, tri) in res.trianglelist.iter().enumerate() {
            assert_eq!(tri.len(), 3);
            assert_eq!(tri.as_slice(), &out.triangles.as_slice()[i * 3..i * 3 + 3]);
        }
        assert_eq!(res.pointlist.len(), out.number_of_points * 2);
        assert!(res.segmentlist.is_empty() && res.pointmarkerlist.is_empty());
    }

    #[test]
    fn reads_only_declared_prefix() {
        let mut out = two_triangles();
        out.number_of_triangles = 1;
        out.number_of_points = 3;
        let res = Decoder.decode(&out).unwrap();
        assert_eq!(res.trianglelist, vec![vec![0, 1, 2]]);
        assert_eq!(res.pointlist.len(), 6);
    }

    #[test]
    fn overstated_count_is_an_error_not_an_overread() {
        let mut out = two_triangles();
        out.number_of_triangles = 3;
        assert_eq!(
            Decoder.decode(&out).unwrap_err(),
            DecodeError::ShortBuffer {
                field: "trianglelist",
                needed: 9,
                available: 6
            }
        );
    }

    #[test]
    fn zero_corners_with_triangles_is_rejected() {
        let mut out = two_triangles();
        out.number_of_corners = 0;
        assert_eq!(
            Decoder.decode(&out).unwrap_err(),
            DecodeError::BadCorners { corners: 0 }
        );
    }

    #[test]
    fn area_and_vertex_soup() {
        let res = Decoder.decode(&two_triangles()).unwrap();
        assert!((res.total_area() - 1.0).abs() < 1e-12);
        let soup = res.expand_vertices();
        assert_eq!(soup.len(), 2 * 3 * 3);
        assert_eq!(&soup[3..6], &[1.0, 0.0, 0.0]);
    }

    #[test]
    fn json_shape_omits_empty_auxiliaries() {
        let res = Decoder.decode(&two_triangles()).unwrap();
        let v = res.to_json();
        assert_eq!(v["trianglelist"][1], serde_json::json!([0, 2, 3]));
        assert!(v.get("segmentlist").is_none());
    }
}
