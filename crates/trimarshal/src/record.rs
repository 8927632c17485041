//! Input and output records exchanged with the geometry routine.
//!
//! Both records own their buffers. The input record lives from encode to the end
//! of the call; the output record is produced by the routine and handed to the
//! call, which decodes it and then drops it. Auxiliary output fields are
//! `Option`s: `None` is an absent buffer and releasing it is a no-op.

use crate::buffer::FlatBuffer;

/// Encoded host input.
#[derive(Debug)]
pub struct InputRecord {
    pub points: FlatBuffer<f64>,
    pub segments: FlatBuffer<i32>,
    pub holes: FlatBuffer<f64>,
}

impl InputRecord {
    #[inline]
    pub fn number_of_points(&self) -> usize {
        self.points.count()
    }

    #[inline]
    pub fn number_of_segments(&self) -> usize {
        self.segments.count()
    }

    #[inline]
    pub fn number_of_holes(&self) -> usize {
        self.holes.count()
    }

    /// Buffers held by this record.
    pub fn buffer_count(&self) -> usize {
        3
    }
}

/// Routine output. Counts are the routine-reported values; the decoder checks
/// them against the buffers actually present.
#[derive(Debug)]
pub struct OutputRecord {
    pub number_of_points: usize,
    pub number_of_triangles: usize,
    pub number_of_corners: usize,
    pub number_of_segments: usize,
    pub points: FlatBuffer<f64>,
    pub triangles: FlatBuffer<i32>,
    pub segments: Option<FlatBuffer<i32>>,
    pub point_markers: Option<FlatBuffer<i32>>,
    pub point_attributes: Option<FlatBuffer<f64>>,
    pub triangle_attributes: Option<FlatBuffer<f64>>,
}

impl OutputRecord {
    /// Record whose counts agree with its primary buffers; auxiliaries absent.
    pub fn new(points: FlatBuffer<f64>, triangles: FlatBuffer<i32>) -> Self {
        Self {
            number_of_points: points.count(),
            number_of_triangles: triangles.count(),
            number_of_corners: triangles.arity(),
            number_of_segments: 0,
            points,
            triangles,
            segments: None,
            point_markers: None,
            point_attributes: None,
            triangle_attributes: None,
        }
    }

    pub fn with_segments(mut self, segments: FlatBuffer<i32>) -> Self {
        self.number_of_segments = segments.count();
        self.segments = Some(segments);
        self
    }

    pub fn with_point_markers(mut self, markers: FlatBuffer<i32>) -> Self {
        self.point_markers = Some(markers);
        self
    }

    /// Buffers held by this record, absent auxiliaries excluded.
    pub fn buffer_count(&self) -> usize {
        2 + usize::from(self.segments.is_some())
            + usize::from(self.point_markers.is_some())
            + usize::from(self.point_attributes.is_some())
            + usize::from(self.triangle_attributes.is_some())
    }
}
