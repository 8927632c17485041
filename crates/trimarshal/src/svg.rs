//! SVG path outlines as planar graphs.
//!
//! Path data (`d`) is flattened into closed rings:
//! - Every subpath is one ring, closed or not. Rings with fewer than three
//!   points after dropping a repeated closing point are discarded.
//! - Curves are sampled at `curve_samples` evenly spaced parameters including
//!   both ends, so each curve becomes `curve_samples - 1` segments. Arcs and
//!   smooth curves arrive as cubics from the parser.
//! - y is flipped, since SVG y grows downwards.
//! - The drawing is scaled into the unit box: the bounding-box minimum moves to
//!   the origin and the longer side becomes 1.
//!
//! The first ring is the outline and every later ring bounds a hole
//! (`HoleSeeds::InnerRings`).

use std::fmt;

use nalgebra::Vector2;
use svgtypes::{SimplePathSegment, SimplifyingPathParser};

use crate::polyfile::{HoleSeeds, PlanarGraph};

/// Samples per curve used when nothing else is configured.
pub const DEFAULT_CURVE_SAMPLES: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PathCfg {
    pub curve_samples: usize,
    pub flip_y: bool,
    pub unit_box: bool,
}

impl Default for PathCfg {
    fn default() -> Self {
        Self {
            curve_samples: DEFAULT_CURVE_SAMPLES,
            flip_y: true,
            unit_box: true,
        }
    }
}

impl PathCfg {
    /// Coordinates as written in the path, curves still flattened.
    pub fn raw() -> Self {
        Self {
            curve_samples: DEFAULT_CURVE_SAMPLES,
            flip_y: false,
            unit_box: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SvgError {
    Xml(String),
    NoPath,
    /// Several `<path>` elements and no id to pick one.
    AmbiguousPath { count: usize },
    UnknownId(String),
    MissingData { id: Option<String> },
    Syntax(String),
    /// No subpath encloses a ring of three or more points.
    Empty,
    /// All points coincide, so the unit box is undefined.
    Degenerate,
}

impl fmt::Display for SvgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Xml(msg) => write!(f, "invalid SVG document: {msg}"),
            Self::NoPath => write!(f, "no <path> element found"),
            Self::AmbiguousPath { count } => {
                write!(f, "{count} <path> elements found; choose one by id")
            }
            Self::UnknownId(id) => write!(f, "no <path> element with id '{id}'"),
            Self::MissingData { id: Some(id) } => write!(f, "path '{id}' has no 'd' attribute"),
            Self::MissingData { id: None } => write!(f, "path has no 'd' attribute"),
            Self::Syntax(msg) => write!(f, "invalid path data: {msg}"),
            Self::Empty => write!(f, "path data has no outline of three or more points"),
            Self::Degenerate => write!(f, "path outline has zero extent"),
        }
    }
}

impl std::error::Error for SvgError {}

/// Flatten path data into rings of `[x, y]` points.
pub fn flatten_path(d: &str, cfg: &PathCfg) -> Result<Vec<Vec<[f64; 2]>>, SvgError> {
    let samples = cfg.curve_samples.max(2);
    let mut rings: Vec<Vec<Vector2<f64>>> = Vec::new();
    let mut ring: Vec<Vector2<f64>> = Vec::new();
    let mut cursor = Vector2::zeros();
    let mut start = Vector2::zeros();

    for seg in SimplifyingPathParser::from(d) {
        let seg = seg.map_err(|e| SvgError::Syntax(e.to_string()))?;
        match seg {
            SimplePathSegment::MoveTo { x, y } => {
                finish_ring(&mut rings, &mut ring);
                cursor = Vector2::new(x, y);
                start = cursor;
                ring.push(cursor);
            }
            SimplePathSegment::LineTo { x, y } => {
                begin_ring(&mut ring, cursor);
                cursor = Vector2::new(x, y);
                ring.push(cursor);
            }
            SimplePathSegment::Quadratic { x1, y1, x, y } => {
                begin_ring(&mut ring, cursor);
                let ctrl = [cursor, Vector2::new(x1, y1), Vector2::new(x, y)];
                ring.extend((1..samples).map(|i| bezier_point(&ctrl, sample_t(i, samples))));
                cursor = ctrl[2];
            }
            SimplePathSegment::CurveTo {
                x1,
                y1,
                x2,
                y2,
                x,
                y,
            } => {
                begin_ring(&mut ring, cursor);
                let ctrl = [
                    cursor,
                    Vector2::new(x1, y1),
                    Vector2::new(x2, y2),
                    Vector2::new(x, y),
                ];
                ring.extend((1..samples).map(|i| bezier_point(&ctrl, sample_t(i, samples))));
                cursor = ctrl[3];
            }
            SimplePathSegment::ClosePath => {
                finish_ring(&mut rings, &mut ring);
                cursor = start;
            }
        }
    }
    finish_ring(&mut rings, &mut ring);
    if rings.is_empty() {
        return Err(SvgError::Empty);
    }

    if cfg.flip_y {
        for p in rings.iter_mut().flatten() {
            p.y = -p.y;
        }
    }
    if cfg.unit_box {
        to_unit_box(&mut rings)?;
    }
    Ok(rings
        .into_iter()
        .map(|r| r.into_iter().map(|p| [p.x, p.y]).collect())
        .collect())
}

/// Path data as a planar graph: one segment ring per subpath, holes seeded
/// inside every ring after the first.
pub fn path_to_graph(d: &str, cfg: &PathCfg) -> Result<PlanarGraph, SvgError> {
    let rings = flatten_path(d, cfg)?;
    tracing::debug!(rings = rings.len(), "flattened path");
    Ok(PlanarGraph::from_rings(&rings, HoleSeeds::InnerRings))
}

/// `d` of the `<path>` element in an SVG document. With several paths, `id`
/// picks one; a single path is taken regardless of `id`.
pub fn select_path(svg: &str, id: Option<&str>) -> Result<String, SvgError> {
    let doc = roxmltree::Document::parse(svg).map_err(|e| SvgError::Xml(e.to_string()))?;
    let paths: Vec<roxmltree::Node> = doc
        .descendants()
        .filter(|n| n.is_element() && n.has_tag_name("path"))
        .collect();
    let node = match (paths.as_slice(), id) {
        ([], _) => return Err(SvgError::NoPath),
        ([only], _) => *only,
        (_, Some(id)) => *paths
            .iter()
            .find(|n| n.attribute("id") == Some(id))
            .ok_or_else(|| SvgError::UnknownId(id.to_string()))?,
        (_, None) => return Err(SvgError::AmbiguousPath { count: paths.len() }),
    };
    node.attribute("d")
        .map(str::to_string)
        .ok_or_else(|| SvgError::MissingData {
            id: node.attribute("id").map(str::to_string),
        })
}

/// Read one path of an SVG document into a planar graph.
pub fn read_svg(svg: &str, id: Option<&str>, cfg: &PathCfg) -> Result<PlanarGraph, SvgError> {
    path_to_graph(&select_path(svg, id)?, cfg)
}

fn begin_ring(ring: &mut Vec<Vector2<f64>>, cursor: Vector2<f64>) {
    if ring.is_empty() {
        ring.push(cursor);
    }
}

fn finish_ring(rings: &mut Vec<Vec<Vector2<f64>>>, ring: &mut Vec<Vector2<f64>>) {
    let mut done = std::mem::take(ring);
    if done.len() > 1 && done.first() == done.last() {
        done.pop();
    }
    if done.len() >= 3 {
        rings.push(done);
    }
}

#[inline]
fn sample_t(i: usize, samples: usize) -> f64 {
    i as f64 / (samples - 1) as f64
}

/// de Casteljau evaluation.
fn bezier_point(ctrl: &[Vector2<f64>], t: f64) -> Vector2<f64> {
    let mut pts = ctrl.to_vec();
    for k in (1..pts.len()).rev() {
        for i in 0..k {
            pts[i] = pts[i].lerp(&pts[i + 1], t);
        }
    }
    pts[0]
}

fn to_unit_box(rings: &mut [Vec<Vector2<f64>>]) -> Result<(), SvgError> {
    let mut min = Vector2::repeat(f64::INFINITY);
    let mut max = Vector2::repeat(f64::NEG_INFINITY);
    for p in rings.iter().flatten() {
        min = min.inf(p);
        max = max.sup(p);
    }
    let long_side = (max - min).max();
    if !(long_side > 0.0 && long_side.is_finite()) {
        return Err(SvgError::Degenerate);
    }
    for p in rings.iter_mut().flatten() {
        *p = (*p - min) / long_side;
    }
    Ok(())
}
