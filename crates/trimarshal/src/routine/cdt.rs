//! In-process routine on top of `spade`'s constrained Delaunay triangulation.
//!
//! Output numbering
//! - Every input point keeps its input index. Duplicates collapse onto the first
//!   occurrence: triangles reference the first index, the duplicate stays in the
//!   point list unreferenced.
//! - Crossing segments are always split. The vertex created at each crossing is
//!   appended after the input points, in creation order. `Y` only restrains
//!   refinement, and this routine never refines.
//!
//! Carving (PSLG mode only)
//! - Hole seeds eat every triangle reachable without crossing a segment.
//! - Unless `convex_hull` is set, triangles reachable from the hull through
//!   non-segment edges are eaten as well. With no segments at all the hull is
//!   kept, so plain point sets still triangulate.

use spade::handles::{FixedFaceHandle, FixedVertexHandle, InnerTag};
use spade::{ConstrainedDelaunayTriangulation, Point2, PositionInTriangulation, Triangulation};

use super::{GeometryRoutine, RoutineError};
use crate::buffer::FlatBuffer;
use crate::cfg::{COORD_ARITY, SEGMENT_ARITY, TRIANGLE_CORNERS};
use crate::options::TriangulateOptions;
use crate::record::{InputRecord, OutputRecord};

type Cdt = ConstrainedDelaunayTriangulation<Point2<f64>>;

/// Default routine: constrained Delaunay, no quality refinement.
#[derive(Clone, Copy, Debug, Default)]
pub struct CdtRoutine;

impl GeometryRoutine for CdtRoutine {
    fn triangulate(
        &self,
        opts: &TriangulateOptions,
        input: &InputRecord,
    ) -> Result<OutputRecord, RoutineError> {
        let mut cdt = Cdt::new();
        let handles = insert_points(&mut cdt, input)?;
        if opts.pslg {
            insert_segments(&mut cdt, input, &handles)?;
        }
        let removed = if opts.pslg {
            carve(&cdt, input, opts)
        } else {
            vec![false; cdt.num_all_faces()]
        };

        let numbering = Numbering::new(&cdt, &handles);
        if numbering.duplicates > 0 && !opts.quiet {
            tracing::warn!(
                duplicates = numbering.duplicates,
                "duplicate input points were merged"
            );
        }

        let out_n = numbering.order.len();
        if i32::try_from(out_n).is_err() {
            return Err(RoutineError::IndexOverflow { count: out_n });
        }

        let mut points = FlatBuffer::with_capacity(COORD_ARITY, out_n * COORD_ARITY);
        for v in &numbering.order {
            let p = cdt.vertex(*v).position();
            points.push(p.x);
            points.push(p.y);
        }

        let mut triangles =
            FlatBuffer::with_capacity(TRIANGLE_CORNERS, cdt.num_inner_faces() * TRIANGLE_CORNERS);
        let mut markers = vec![0i32; out_n];
        for face in cdt.inner_faces() {
            if removed[face.fix().index()] {
                continue;
            }
            for v in face.vertices() {
                triangles.push(numbering.index_of(v.fix()));
            }
            for edge in face.adjacent_edges() {
                let other = edge.rev().face();
                let boundary = other
                    .as_inner()
                    .map_or(true, |g| removed[g.fix().index()]);
                if boundary {
                    markers[numbering.index_of(edge.from().fix()) as usize] = 1;
                    markers[numbering.index_of(edge.to().fix()) as usize] = 1;
                }
            }
        }

        let mut segments = FlatBuffer::with_capacity(SEGMENT_ARITY, cdt.num_constraints() * 2);
        for edge in cdt.undirected_edges() {
            if !cdt.is_constraint_edge(edge.fix()) {
                continue;
            }
            for v in edge.vertices() {
                let idx = numbering.index_of(v.fix());
                segments.push(idx);
                markers[idx as usize] = 1;
            }
        }

        let out = OutputRecord::new(points, triangles)
            .with_segments(segments)
            .with_point_markers(FlatBuffer::from_vec(1, markers));
        if !opts.quiet {
            tracing::info!(
                points = out.number_of_points,
                triangles = out.number_of_triangles,
                segments = out.number_of_segments,
                "triangulation complete"
            );
        }
        Ok(out)
    }
}

fn insert_points(
    cdt: &mut Cdt,
    input: &InputRecord,
) -> Result<Vec<FixedVertexHandle>, RoutineError> {
    let mut handles = Vec::with_capacity(input.number_of_points());
    for (index, p) in input.points.elements().enumerate() {
        let handle = cdt
            .insert(Point2::new(p[0], p[1]))
            .map_err(|err| RoutineError::InvalidPoint {
                index,
                reason: format!("{err:?}"),
            })?;
        handles.push(handle);
    }
    Ok(handles)
}

fn insert_segments(
    cdt: &mut Cdt,
    input: &InputRecord,
    handles: &[FixedVertexHandle],
) -> Result<(), RoutineError> {
    let lookup = |segment: usize, index: i32| {
        usize::try_from(index)
            .ok()
            .and_then(|i| handles.get(i).copied())
            .ok_or(RoutineError::SegmentIndex {
                segment,
                index,
                points: handles.len(),
            })
    };
    for (segment, seg) in input.segments.elements().enumerate() {
        let from = lookup(segment, seg[0])?;
        let to = lookup(segment, seg[1])?;
        if from == to {
            continue;
        }
        if cdt.can_add_constraint(from, to) {
            cdt.add_constraint(from, to);
        } else {
            cdt.add_constraint_and_split(from, to, |p| p);
        }
    }
    Ok(())
}

/// Faces eaten by hole and hull seeds, indexed by face index.
fn carve(cdt: &Cdt, input: &InputRecord, opts: &TriangulateOptions) -> Vec<bool> {
    let mut removed = vec![false; cdt.num_all_faces()];
    let mut stack: Vec<FixedFaceHandle<InnerTag>> = Vec::new();

    if cdt.num_constraints() > 0 && !opts.convex_hull {
        for face in cdt.inner_faces() {
            let on_hull = face.adjacent_edges().iter().any(|edge| {
                edge.rev().face().is_outer()
                    && !cdt.is_constraint_edge(edge.fix().as_undirected())
            });
            if on_hull {
                stack.push(face.fix());
            }
        }
    }

    for h in input.holes.elements() {
        match cdt.locate(Point2::new(h[0], h[1])) {
            PositionInTriangulation::OnFace(face) => stack.push(face),
            PositionInTriangulation::OnEdge(edge) => {
                let edge = cdt.directed_edge(edge);
                for face in [edge.face(), edge.rev().face()] {
                    if let Some(inner) = face.as_inner() {
                        stack.push(inner.fix());
                    }
                }
            }
            _ => {}
        }
    }

    while let Some(fixed) = stack.pop() {
        if removed[fixed.index()] {
            continue;
        }
        removed[fixed.index()] = true;
        for edge in cdt.face(fixed).adjacent_edges() {
            if cdt.is_constraint_edge(edge.fix().as_undirected()) {
                continue;
            }
            if let Some(next) = edge.rev().face().as_inner() {
                if !removed[next.fix().index()] {
                    stack.push(next.fix());
                }
            }
        }
    }
    removed
}

/// Output numbering of triangulation vertices.
struct Numbering {
    /// Output index per vertex handle index.
    by_handle: Vec<i32>,
    /// Vertex handles in output order.
    order: Vec<FixedVertexHandle>,
    duplicates: usize,
}

impl Numbering {
    fn new(cdt: &Cdt, handles: &[FixedVertexHandle]) -> Self {
        let mut by_handle = vec![-1i32; cdt.num_vertices()];
        let mut order = Vec::with_capacity(handles.len());
        let mut duplicates = 0;
        for (i, h) in handles.iter().enumerate() {
            if by_handle[h.index()] < 0 {
                by_handle[h.index()] = i as i32;
            } else {
                duplicates += 1;
            }
            order.push(*h);
        }
        for v in cdt.fixed_vertices() {
            if by_handle[v.index()] < 0 {
                by_handle[v.index()] = order.len() as i32;
                order.push(v);
            }
        }
        Self {
            by_handle,
            order,
            duplicates,
        }
    }

    #[inline]
    fn index_of(&self, v: FixedVertexHandle) -> i32 {
        self.by_handle[v.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{HOLES, POINTS, SEGMENTS};

    fn record(points: &[f64], segments: &[i32], holes: &[f64]) -> InputRecord {
        InputRecord {
            points: FlatBuffer::from_vec(POINTS.arity, points.to_vec()),
            segments: FlatBuffer::from_vec(SEGMENTS.arity, segments.to_vec()),
            holes: FlatBuffer::from_vec(HOLES.arity, holes.to_vec()),
        }
    }

    fn ring(points: usize, start: i32) -> Vec<i32> {
        let n = points as i32;
        (0..n).flat_map(|i| [start + i, start + (i + 1) % n]).collect()
    }

    #[test]
    fn unit_square_gives_two_triangles() {
        let input = record(&[0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0], &ring(4, 0), &[]);
        let out = CdtRoutine
            .triangulate(&TriangulateOptions::default(), &input)
            .unwrap();
        assert_eq!(out.number_of_points, 4);
        assert_eq!(out.number_of_triangles, 2);
        assert_eq!(out.number_of_corners, 3);
        assert_eq!(out.number_of_segments, 4);
        let markers = out.point_markers.as_ref().unwrap();
        assert!(markers.as_slice().iter().all(|&m| m == 1));
    }

    #[test]
    fn hole_removes_enclosed_triangles() {
        // Outer square 0..4 and inner square 1..3, both as segment rings.
        let mut points = vec![0.0, 0.0, 4.0, 0.0, 4.0, 4.0, 0.0, 4.0];
        points.extend([1.0, 1.0, 3.0, 1.0, 3.0, 3.0, 1.0, 3.0]);
        let mut segments = ring(4, 0);
        let inner: Vec<i32> = ring(4, 0).into_iter().map(|i| i + 4).collect();
        segments.extend(inner);

        let filled = CdtRoutine
            .triangulate(
                &TriangulateOptions::default(),
                &record(&points, &segments, &[]),
            )
            .unwrap();
        let holed = CdtRoutine
            .triangulate(
                &TriangulateOptions::default(),
                &record(&points, &segments, &[2.0, 2.0]),
            )
            .unwrap();
        assert_eq!(filled.number_of_triangles, 10);
        assert_eq!(holed.number_of_triangles, 8);
    }

    #[test]
    fn concavity_is_carved_unless_convex_hull_requested() {
        // L-shape: the notch at (1,1)-(2,2) lies inside the hull but outside the segments.
        let points = [0.0, 0.0, 2.0, 0.0, 2.0, 1.0, 1.0, 1.0, 1.0, 2.0, 0.0, 2.0];
        let input = record(&points, &ring(6, 0), &[]);
        let carved = CdtRoutine
            .triangulate(&TriangulateOptions::default(), &input)
            .unwrap();
        let hull = CdtRoutine
            .triangulate(&"pcQ".parse().unwrap(), &input)
            .unwrap();
        assert_eq!(carved.number_of_triangles, 4);
        assert_eq!(hull.number_of_triangles, 5);
    }

    #[test]
    fn segment_index_out_of_range_is_reported() {
        let input = record(&[0.0, 0.0, 1.0, 0.0, 0.0, 1.0], &[0, 7], &[]);
        let err = CdtRoutine
            .triangulate(&TriangulateOptions::default(), &input)
            .unwrap_err();
        assert_eq!(
            err,
            RoutineError::SegmentIndex {
                segment: 0,
                index: 7,
                points: 3
            }
        );
    }

    #[test]
    fn crossing_segments_are_split_at_the_intersection() {
        let points = [0.0, 0.0, 2.0, 2.0, 2.0, 0.0, 0.0, 2.0];
        let input = record(&points, &[0, 1, 2, 3], &[]);
        for switches in ["pcYQ", "pcQ"] {
            let out = CdtRoutine
                .triangulate(&switches.parse().unwrap(), &input)
                .unwrap();
            assert_eq!(out.number_of_points, 5, "{switches}");
            let steiner = out.points.element(4).unwrap();
            assert!((steiner[0] - 1.0).abs() < 1e-12 && (steiner[1] - 1.0).abs() < 1e-12);
            assert_eq!(out.number_of_triangles, 4);
        }
    }

    #[test]
    fn bowtie_outline_triangulates_with_default_options() {
        // Ring 0 -> 1 -> 2 -> 3 -> 0 crosses itself at (1, 1).
        let points = [0.0, 0.0, 2.0, 2.0, 2.0, 0.0, 0.0, 2.0];
        let input = record(&points, &ring(4, 0), &[]);
        let out = CdtRoutine
            .triangulate(&TriangulateOptions::default(), &input)
            .unwrap();
        assert_eq!(out.number_of_points, 5);
        // Two lobes remain; the wedges between them touch the hull and are carved.
        assert_eq!(out.number_of_triangles, 2);
        assert!(out.triangles.elements().all(|t| t.contains(&4)));
    }

    #[test]
    fn duplicates_keep_input_numbering() {
        let input = record(&[0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 1.0], &[], &[]);
        let out = CdtRoutine
            .triangulate(&TriangulateOptions::default(), &input)
            .unwrap();
        assert_eq!(out.number_of_points, 4);
        assert_eq!(out.number_of_triangles, 1);
        assert!(!out.triangles.as_slice().contains(&2));
    }

    #[test]
    fn without_pslg_segments_and_holes_are_ignored() {
        let points = [0.0, 0.0, 4.0, 0.0, 4.0, 4.0, 0.0, 4.0];
        let input = record(&points, &[0, 7], &[2.0, 2.0]);
        let out = CdtRoutine
            .triangulate(&TriangulateOptions::none(), &input)
            .unwrap();
        assert_eq!(out.number_of_triangles, 2);
        assert_eq!(out.number_of_segments, 0);
    }
}
