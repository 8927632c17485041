//! Marshalling limits and fixed constants.
//!
//! Policy
//! - Field arities and the corner count are fixed by the exchange format and live
//!   here as constants. Only the allocation cap is a runtime knob (`MarshalCfg`).

/// Scalars per point / hole coordinate.
pub const COORD_ARITY: usize = 2;
/// Indices per segment.
pub const SEGMENT_ARITY: usize = 2;
/// Corners per triangle produced by the in-process routine.
pub const TRIANGLE_CORNERS: usize = 3;
/// Default cap on the raw length of any single host array.
pub const DEFAULT_MAX_FIELD_LEN: usize = 1 << 24;

/// Encoder configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MarshalCfg {
    /// Largest raw array length accepted per field; `None` disables the cap.
    pub max_field_len: Option<usize>,
}

impl Default for MarshalCfg {
    fn default() -> Self {
        Self {
            max_field_len: Some(DEFAULT_MAX_FIELD_LEN),
        }
    }
}

impl MarshalCfg {
    /// No allocation cap. Caller-controlled array sizes drive allocation directly.
    pub fn unbounded() -> Self {
        Self {
            max_field_len: None,
        }
    }

    /// Cap as given on a command line or keyword argument: `None` keeps the
    /// default, `Some(0)` disables the cap.
    pub fn with_cap(max_field_len: Option<usize>) -> Self {
        match max_field_len {
            None => Self::default(),
            Some(0) => Self::unbounded(),
            Some(max) => Self {
                max_field_len: Some(max),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_cap_means_unbounded() {
        assert_eq!(MarshalCfg::with_cap(Some(0)), MarshalCfg::unbounded());
        assert_eq!(MarshalCfg::with_cap(None), MarshalCfg::default());
        assert_eq!(MarshalCfg::with_cap(Some(8)).max_field_len, Some(8));
    }
}
