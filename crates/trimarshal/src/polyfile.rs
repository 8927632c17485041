//! Planar straight-line graphs and the Triangle `.poly` text format.
//!
//! `PlanarGraph` is an in-process host object with the same three fields the
//! encoder reads from any host. The `.poly` reader accepts the usual layout:
//!
//! ```text
//! <#vertices> 2 <#attributes> <#markers>
//! <i> <x> <y> [attributes...] [marker]
//! <#segments> <#markers>
//! <j> <a> <b> [marker]
//! <#holes>
//! <k> <x> <y>
//! ```
//!
//! `#` starts a comment. Vertex numbering may start at 0 or 1; the first vertex
//! index decides, and segment endpoints are rebased to zero.

use std::fmt;

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::field::{HOLES, POINTS, SEGMENTS};
use crate::host::{HostField, HostObject, NativeArray};

/// Points, segments and holes in host-field layout.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanarGraph {
    pub pointlist: Vec<f64>,
    pub segmentlist: Vec<i32>,
    pub holelist: Vec<f64>,
}

/// Where `PlanarGraph::from_rings` takes its hole points from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HoleSeeds<'a> {
    Given(&'a [[f64; 2]]),
    /// Ring 0 is the outline and every later ring bounds a hole; each gets one
    /// interior point.
    InnerRings,
}

impl PlanarGraph {
    /// Closed rings joined into one graph; ring `r` gets segments `i -> i+1 (mod len)`.
    /// A ring whose last point repeats its first has the repeat dropped.
    pub fn from_rings(rings: &[Vec<[f64; 2]>], holes: HoleSeeds<'_>) -> Self {
        let mut graph = Self::default();
        let mut offset = 0i32;
        for (r, ring) in rings.iter().enumerate() {
            let mut pts = ring.as_slice();
            if pts.len() > 1 && pts.first() == pts.last() {
                pts = &pts[..pts.len() - 1];
            }
            let n = pts.len() as i32;
            for (i, p) in pts.iter().enumerate() {
                graph.pointlist.extend(p);
                let i = i as i32;
                graph.segmentlist.extend([offset + i, offset + (i + 1) % n]);
            }
            offset += n;

            if r > 0 && holes == HoleSeeds::InnerRings {
                match interior_point(pts) {
                    Some(seed) => graph.holelist.extend(seed),
                    None => tracing::debug!(ring = r, "ring encloses no area; no hole seed"),
                }
            }
        }
        if let HoleSeeds::Given(given) = holes {
            for h in given {
                graph.holelist.extend(h);
            }
        }
        graph
    }

    pub fn number_of_points(&self) -> usize {
        self.pointlist.len() / POINTS.arity
    }
}

impl<'a> HostObject for &'a PlanarGraph {
    type Array = NativeArray<'a>;

    fn field(&self, name: &str) -> HostField<Self::Array> {
        let graph: &'a PlanarGraph = *self;
        if name == POINTS.name {
            HostField::Array(NativeArray::Real(&graph.pointlist))
        } else if name == SEGMENTS.name {
            HostField::Array(NativeArray::Integer(&graph.segmentlist))
        } else if name == HOLES.name {
            HostField::Array(NativeArray::Real(&graph.holelist))
        } else {
            HostField::Missing
        }
    }
}

/// A point strictly inside a closed ring.
///
/// Scans horizontal lines halfway between consecutive vertex heights, so no
/// scanline passes through a vertex, and returns the middle of the widest
/// inside span under the even-odd rule. `None` when the ring has no area.
pub fn interior_point(ring: &[[f64; 2]]) -> Option<[f64; 2]> {
    let pts: Vec<Vector2<f64>> = ring.iter().map(|p| Vector2::new(p[0], p[1])).collect();
    if pts.len() < 3 {
        return None;
    }
    let mut heights: Vec<f64> = pts.iter().map(|p| p.y).collect();
    heights.sort_by(f64::total_cmp);
    heights.dedup();

    let mut best: Option<(f64, Vector2<f64>)> = None;
    let mut xs = Vec::with_capacity(pts.len());
    for pair in heights.windows(2) {
        let y = 0.5 * (pair[0] + pair[1]);
        xs.clear();
        for (i, a) in pts.iter().enumerate() {
            let b = pts[(i + 1) % pts.len()];
            if (a.y < y) != (b.y < y) {
                let t = (y - a.y) / (b.y - a.y);
                xs.push(a.x + t * (b.x - a.x));
            }
        }
        xs.sort_by(f64::total_cmp);
        for span in xs.chunks_exact(2) {
            let width = span[1] - span[0];
            if width > best.map_or(0.0, |(w, _)| w) {
                best = Some((width, Vector2::new(0.5 * (span[0] + span[1]), y)));
            }
        }
    }
    best.map(|(_, p)| [p.x, p.y])
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PolyError {
    pub line: usize,
    pub message: String,
}

impl fmt::Display for PolyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line == 0 {
            write!(f, ".poly: {}", self.message)
        } else {
            write!(f, ".poly line {}: {}", self.line, self.message)
        }
    }
}

impl std::error::Error for PolyError {}

/// Non-empty, comment-stripped lines with their 1-based line numbers.
struct Lines<'a> {
    inner: std::iter::Enumerate<std::str::Lines<'a>>,
    last: usize,
}

impl<'a> Lines<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            inner: text.lines().enumerate(),
            last: 0,
        }
    }

    fn err(&self, message: impl Into<String>) -> PolyError {
        PolyError {
            line: self.last,
            message: message.into(),
        }
    }

    /// Next data line split into tokens; `what` names the expected record.
    fn next_tokens(&mut self, what: &str) -> Result<Vec<&'a str>, PolyError> {
        for (i, line) in self.inner.by_ref() {
            let data = line.split('#').next().unwrap_or("");
            let tokens: Vec<&str> = data.split_whitespace().collect();
            if !tokens.is_empty() {
                self.last = i + 1;
                return Ok(tokens);
            }
        }
        Err(self.err(format!("unexpected end of file, expected {what}")))
    }

    fn parse<T: std::str::FromStr>(
        &self,
        tokens: &[&str],
        at: usize,
        what: &str,
    ) -> Result<T, PolyError> {
        let tok = tokens
            .get(at)
            .ok_or_else(|| self.err(format!("missing {what}")))?;
        tok.parse()
            .map_err(|_| self.err(format!("invalid {what} '{tok}'")))
    }
}

/// Parse `.poly` text into a graph.
pub fn read_poly(text: &str) -> Result<PlanarGraph, PolyError> {
    let mut lines = Lines::new(text);
    let mut graph = PlanarGraph::default();

    let header = lines.next_tokens("vertex header")?;
    let n: usize = lines.parse(&header, 0, "vertex count")?;
    if n == 0 {
        return Err(lines.err("vertices in a separate .node file are not supported"));
    }
    let dim: usize = lines.parse(&header, 1, "dimension")?;
    if dim != 2 {
        return Err(lines.err(format!("dimension must be 2, got {dim}")));
    }

    let mut base = 0i64;
    for k in 0..n {
        let row = lines.next_tokens("vertex")?;
        let id: i64 = lines.parse(&row, 0, "vertex index")?;
        if k == 0 {
            base = id;
            if base != 0 && base != 1 {
                return Err(lines.err(format!(
                    "vertex numbering must start at 0 or 1, got {id}"
                )));
            }
        }
        let x: f64 = lines.parse(&row, 1, "x coordinate")?;
        let y: f64 = lines.parse(&row, 2, "y coordinate")?;
        graph.pointlist.extend([x, y]);
    }

    let header = lines.next_tokens("segment header")?;
    let m: usize = lines.parse(&header, 0, "segment count")?;
    for _ in 0..m {
        let row = lines.next_tokens("segment")?;
        let a: i64 = lines.parse(&row, 1, "segment endpoint")?;
        let b: i64 = lines.parse(&row, 2, "segment endpoint")?;
        for end in [a, b] {
            let rebased = i32::try_from(end - base)
                .map_err(|_| lines.err(format!("segment endpoint {end} out of range")))?;
            graph.segmentlist.push(rebased);
        }
    }

    let header = lines.next_tokens("hole header")?;
    let h: usize = lines.parse(&header, 0, "hole count")?;
    for _ in 0..h {
        let row = lines.next_tokens("hole")?;
        let x: f64 = lines.parse(&row, 1, "hole x coordinate")?;
        let y: f64 = lines.parse(&row, 2, "hole y coordinate")?;
        graph.holelist.extend([x, y]);
    }
    Ok(graph)
}

/// Render a graph as zero-based `.poly` text.
pub fn write_poly(graph: &PlanarGraph) -> String {
    let mut out = String::new();
    let points: Vec<&[f64]> = graph.pointlist.chunks_exact(POINTS.arity).collect();
    let segments: Vec<&[i32]> = graph.segmentlist.chunks_exact(SEGMENTS.arity).collect();
    let holes: Vec<&[f64]> = graph.holelist.chunks_exact(HOLES.arity).collect();

    out.push_str(&format!("{} 2 0 0\n", points.len()));
    for (i, p) in points.iter().enumerate() {
        out.push_str(&format!("{i} {} {}\n", p[0], p[1]));
    }
    out.push_str(&format!("{} 0\n", segments.len()));
    for (i, s) in segments.iter().enumerate() {
        out.push_str(&format!("{i} {} {}\n", s[0], s[1]));
    }
    out.push_str(&format!("{}\n", holes.len()));
    for (i, h) in holes.iter().enumerate() {
        out.push_str(&format!("{i} {} {}\n", h[0], h[1]));
    }
    out
}
