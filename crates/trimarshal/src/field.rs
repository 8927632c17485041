//! Field descriptors: the fixed schema of the exchange records.
//!
//! Each field is `(name, element kind, arity)`. The set is closed; hosts cannot
//! register new fields at runtime.

use std::fmt;

use crate::cfg::{COORD_ARITY, SEGMENT_ARITY};

/// Element type stored in a flat buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElemKind {
    Real,
    Integer,
}

impl fmt::Display for ElemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElemKind::Real => write!(f, "real"),
            ElemKind::Integer => write!(f, "integer"),
        }
    }
}

/// Static description of one record field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: ElemKind,
    pub arity: usize,
}

impl FieldDescriptor {
    pub const fn new(name: &'static str, kind: ElemKind, arity: usize) -> Self {
        Self { name, kind, arity }
    }
}

pub const POINTS: FieldDescriptor = FieldDescriptor::new("pointlist", ElemKind::Real, COORD_ARITY);
pub const SEGMENTS: FieldDescriptor =
    FieldDescriptor::new("segmentlist", ElemKind::Integer, SEGMENT_ARITY);
pub const HOLES: FieldDescriptor = FieldDescriptor::new("holelist", ElemKind::Real, COORD_ARITY);

/// Input fields in encode order.
pub const INPUT_FIELDS: [FieldDescriptor; 3] = [POINTS, SEGMENTS, HOLES];

/// Output-only field names.
pub const TRIANGLES: &str = "trianglelist";
pub const POINT_MARKERS: &str = "pointmarkerlist";

/// Scalar types a flat buffer can hold, with the host-number coercion rules.
pub trait Scalar: Copy + fmt::Debug + PartialEq + 'static {
    const KIND: ElemKind;

    /// Coerce a host number; `Err` carries a short reason.
    fn coerce(v: f64) -> Result<Self, &'static str>;
}

impl Scalar for f64 {
    const KIND: ElemKind = ElemKind::Real;

    #[inline]
    fn coerce(v: f64) -> Result<Self, &'static str> {
        if v.is_finite() {
            Ok(v)
        } else {
            Err("not a finite number")
        }
    }
}

impl Scalar for i32 {
    const KIND: ElemKind = ElemKind::Integer;

    #[inline]
    fn coerce(v: f64) -> Result<Self, &'static str> {
        if !v.is_finite() || v.fract() != 0.0 {
            return Err("not an integer");
        }
        if v < i32::MIN as f64 || v > i32::MAX as f64 {
            return Err("integer out of range");
        }
        Ok(v as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_coercion_rejects_fractions_and_overflow() {
        assert_eq!(i32::coerce(7.0), Ok(7));
        assert_eq!(i32::coerce(-0.0), Ok(0));
        assert!(i32::coerce(1.5).is_err());
        assert!(i32::coerce(f64::NAN).is_err());
        assert!(i32::coerce(3.0e10).is_err());
    }

    #[test]
    fn real_coercion_rejects_non_finite() {
        assert_eq!(f64::coerce(0.25), Ok(0.25));
        assert!(f64::coerce(f64::INFINITY).is_err());
    }

    #[test]
    fn input_fields_are_pairs() {
        assert!(INPUT_FIELDS.iter().all(|f| f.arity == 2));
        assert_eq!(SEGMENTS.kind, ElemKind::Integer);
    }
}
