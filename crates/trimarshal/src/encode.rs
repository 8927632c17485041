//! Encoder: host arrays → owned flat buffers.
//!
//! Order of checks per call
//! 1. Shape: every input field is present and array-like (type errors). Nothing
//!    is allocated until all three fields pass.
//! 2. Size: raw length divisible by the field arity and within the cap.
//! 3. Elements: each value numeric and coercible to the field's scalar type.
//!
//! A failure at step 2 or 3 for a later field drops the buffers already built
//! for earlier fields.

use std::fmt;

use crate::buffer::FlatBuffer;
use crate::cfg::MarshalCfg;
use crate::field::{FieldDescriptor, Scalar, HOLES, POINTS, SEGMENTS};
use crate::host::{HostArray, HostField, HostObject};
use crate::record::InputRecord;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EncodeError {
    /// The configuration value itself is not an object.
    NotAnObject { found: String },
    MissingField { field: &'static str },
    NotArray { field: &'static str, found: String },
    BadElement {
        field: &'static str,
        index: usize,
        reason: &'static str,
    },
    /// Raw length is not a multiple of the field arity.
    Arity {
        field: &'static str,
        len: usize,
        arity: usize,
    },
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
}

impl EncodeError {
    /// Shape errors the host reports as a type error.
    pub fn is_type_error(&self) -> bool {
        matches!(
            self,
            Self::NotAnObject { .. } | Self::MissingField { .. } | Self::NotArray { .. }
        )
    }
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnObject { found } => write!(f, "object expected, got {found}"),
            Self::MissingField { field } => write!(f, "missing required array '{field}'"),
            Self::NotArray { field, found } => {
                write!(f, "'{field}' must be an array, got {found}")
            }
            Self::BadElement {
                field,
                index,
                reason,
            } => write!(f, "{field}[{index}]: {reason}"),
            Self::Arity { field, len, arity } => write!(
                f,
                "'{field}' has {len} values, which is not a multiple of {arity}"
            ),
            Self::TooLong { field, len, max } => {
                write!(f, "'{field}' has {len} values, limit is {max}")
            }
        }
    }
}

impl std::error::Error for EncodeError {}

/// Converts host objects into `InputRecord`s.
#[derive(Clone, Copy, Debug, Default)]
pub struct Encoder {
    cfg: MarshalCfg,
}

impl Encoder {
    pub fn new(cfg: MarshalCfg) -> Self {
        Self { cfg }
    }

    /// Encode the three input fields of `host`.
    pub fn encode<H: HostObject>(&self, host: &H) -> Result<InputRecord, EncodeError> {
        let points = require(host, POINTS)?;
        let segments = require(host, SEGMENTS)?;
        let holes = require(host, HOLES)?;

        let points = self.encode_array::<f64, _>(&points, POINTS)?;
        let segments = self.encode_array::<i32, _>(&segments, SEGMENTS)?;
        let holes = self.encode_array::<f64, _>(&holes, HOLES)?;
        tracing::debug!(
            points = points.count(),
            segments = segments.count(),
            holes = holes.count(),
            "encoded input record"
        );
        Ok(InputRecord {
            points,
            segments,
            holes,
        })
    }

    /// Copy one host array into a fresh buffer, coercing each element to `T`.
    pub fn encode_array<T: Scalar, A: HostArray>(
        &self,
        arr: &A,
        desc: FieldDescriptor,
    ) -> Result<FlatBuffer<T>, EncodeError> {
        debug_assert_eq!(T::KIND, desc.kind, "scalar type does not match field kind");
        let len = arr.len();
        if let Some(max) = self.cfg.max_field_len {
            if len > max {
                return Err(EncodeError::TooLong {
                    field: desc.name,
                    len,
                    max,
                });
            }
        }
        if len % desc.arity != 0 {
            return Err(EncodeError::Arity {
                field: desc.name,
                len,
                arity: desc.arity,
            });
        }
        let mut buf = FlatBuffer::with_capacity(desc.arity, len);
        for index in 0..len {
            let bad = |reason| EncodeError::BadElement {
                field: desc.name,
                index,
                reason,
            };
            let raw = arr.number(index).ok_or_else(|| bad("not a number"))?;
            buf.push(T::coerce(raw).map_err(bad)?);
        }
        Ok(buf)
    }
}

fn require<H: HostObject>(host: &H, desc: FieldDescriptor) -> Result<H::Array, EncodeError> {
    match host.field(desc.name) {
        HostField::Array(arr) => Ok(arr),
        HostField::Missing => Err(EncodeError::MissingField { field: desc.name }),
        HostField::NotArray(found) => Err(EncodeError::NotArray {
            field: desc.name,
            found,
        }),
    }
}
