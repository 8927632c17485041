//! Triangulation options and their switch-string spelling.
//!
//! Switches (Triangle-compatible letters)
//! - `p`: triangulate a planar straight-line graph (honor segments and holes).
//! - `Y`: refinement adds no Steiner points on boundary segments. Vertices at
//!   segment crossings are still inserted, and `CdtRoutine` never refines.
//! - `Q`: quiet; the routine emits no diagnostics of its own.
//! - `c`: keep the convex hull instead of carving concavities.
//! - `z`: zero-based indexing. Always on; accepted for compatibility.

use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TriangulateOptions {
    pub pslg: bool,
    pub no_boundary_steiner: bool,
    pub quiet: bool,
    pub convex_hull: bool,
}

impl Default for TriangulateOptions {
    /// `pYQ`: segment-aware, no boundary Steiner points, quiet.
    fn default() -> Self {
        Self {
            pslg: true,
            no_boundary_steiner: true,
            quiet: true,
            convex_hull: false,
        }
    }
}

impl TriangulateOptions {
    /// Every switch off: plain Delaunay triangulation of the points.
    pub fn none() -> Self {
        Self {
            pslg: false,
            no_boundary_steiner: false,
            quiet: false,
            convex_hull: false,
        }
    }

    /// Canonical switch string, e.g. `"pYQ"`.
    pub fn switches(&self) -> String {
        self.to_string()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OptionsError {
    UnknownSwitch(char),
}

impl fmt::Display for OptionsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSwitch(c) => write!(f, "unsupported triangulation switch '{c}'"),
        }
    }
}

impl std::error::Error for OptionsError {}

impl FromStr for TriangulateOptions {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut opts = Self::none();
        for c in s.chars() {
            match c {
                'p' => opts.pslg = true,
                'Y' => opts.no_boundary_steiner = true,
                'Q' => opts.quiet = true,
                'c' => opts.convex_hull = true,
                'z' => {}
                c if c.is_whitespace() || c == '-' => {}
                other => return Err(OptionsError::UnknownSwitch(other)),
            }
        }
        Ok(opts)
    }
}

impl fmt::Display for TriangulateOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (on, c) in [
            (self.pslg, 'p'),
            (self.convex_hull, 'c'),
            (self.no_boundary_steiner, 'Y'),
            (self.quiet, 'Q'),
        ] {
            if on {
                write!(f, "{c}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_legacy_switches() {
        let legacy: TriangulateOptions = "pzQY".parse().unwrap();
        assert_eq!(legacy, TriangulateOptions::default());
        assert_eq!(TriangulateOptions::default().switches(), "pYQ");
    }

    #[test]
    fn parses_and_renders_canonically() {
        let opts: TriangulateOptions = "-Qcp".parse().unwrap();
        assert!(opts.pslg && opts.convex_hull && opts.quiet);
        assert!(!opts.no_boundary_steiner);
        assert_eq!(opts.to_string(), "pcQ");
        assert_eq!("".parse::<TriangulateOptions>().unwrap(), TriangulateOptions::none());
    }

    #[test]
    fn refinement_switches_are_rejected() {
        assert_eq!(
            "pq30".parse::<TriangulateOptions>(),
            Err(OptionsError::UnknownSwitch('q'))
        );
    }
}
