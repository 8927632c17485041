//! Host-runtime seam.
//!
//! The encoder never touches a concrete runtime. It asks a `HostObject` for a
//! named field and reads numbers out of the returned `HostArray`. Adapters live
//! next to their runtime: JSON here, Python in the `trimarshal-py` crate.

pub mod json;

/// Result of looking up one field on a host object.
#[derive(Debug)]
pub enum HostField<A> {
    Missing,
    /// Present but not array-like; carries the host's type name for the message.
    NotArray(String),
    Array(A),
}

/// Array-like host value.
pub trait HostArray {
    /// Raw length in scalars.
    fn len(&self) -> usize;

    /// Element `i` as a host number, or `None` if it is not numeric.
    fn number(&self, i: usize) -> Option<f64>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Host configuration object holding the input fields.
pub trait HostObject {
    type Array: HostArray;

    fn field(&self, name: &str) -> HostField<Self::Array>;
}

impl HostArray for &[f64] {
    fn len(&self) -> usize {
        <[f64]>::len(self)
    }

    fn number(&self, i: usize) -> Option<f64> {
        self.get(i).copied()
    }
}

/// Borrowed Rust-native array, for in-process hosts such as `PlanarGraph`.
#[derive(Clone, Copy, Debug)]
pub enum NativeArray<'a> {
    Real(&'a [f64]),
    Integer(&'a [i32]),
}

impl HostArray for NativeArray<'_> {
    fn len(&self) -> usize {
        match self {
            Self::Real(v) => v.len(),
            Self::Integer(v) => v.len(),
        }
    }

    fn number(&self, i: usize) -> Option<f64> {
        match self {
            Self::Real(v) => v.get(i).copied(),
            Self::Integer(v) => v.get(i).map(|&x| f64::from(x)),
        }
    }
}
