//! Call lifecycle: encode → run once → decode → release.
//!
//! `Call` owns the input record; `run` consumes it and yields a `SolvedCall`
//! that owns both records. Decoding borrows, `finish` consumes, so decoding
//! after release does not type-check and each record is dropped exactly once.
//! Early returns and panics drop whatever the call owns at that point.

use std::fmt;

use crate::buffer::live_buffers;
use crate::cfg::MarshalCfg;
use crate::decode::{DecodeError, Decoder, TriangulateResult};
use crate::encode::{EncodeError, Encoder};
use crate::host::HostObject;
use crate::options::{OptionsError, TriangulateOptions};
use crate::record::{InputRecord, OutputRecord};
use crate::routine::{CdtRoutine, GeometryRoutine, RoutineError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TriangulateError {
    Encode(EncodeError),
    Options(OptionsError),
    Routine(RoutineError),
    Decode(DecodeError),
}

impl TriangulateError {
    /// Malformed host input shape (missing or non-array field, non-object root).
    pub fn is_type_error(&self) -> bool {
        matches!(self, Self::Encode(e) if e.is_type_error())
    }
}

impl fmt::Display for TriangulateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode(e) => write!(f, "invalid input: {e}"),
            Self::Options(e) => write!(f, "invalid options: {e}"),
            Self::Routine(e) => write!(f, "triangulation failed: {e}"),
            Self::Decode(e) => write!(f, "malformed routine output: {e}"),
        }
    }
}

impl std::error::Error for TriangulateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Encode(e) => Some(e),
            Self::Options(e) => Some(e),
            Self::Routine(e) => Some(e),
            Self::Decode(e) => Some(e),
        }
    }
}

impl From<EncodeError> for TriangulateError {
    fn from(e: EncodeError) -> Self {
        Self::Encode(e)
    }
}

impl From<OptionsError> for TriangulateError {
    fn from(e: OptionsError) -> Self {
        Self::Options(e)
    }
}

impl From<RoutineError> for TriangulateError {
    fn from(e: RoutineError) -> Self {
        Self::Routine(e)
    }
}

impl From<DecodeError> for TriangulateError {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

/// An encoded call waiting for the routine.
#[derive(Debug)]
pub struct Call {
    input: InputRecord,
}

impl Call {
    pub fn encode<H: HostObject>(encoder: &Encoder, host: &H) -> Result<Self, EncodeError> {
        Ok(Self {
            input: encoder.encode(host)?,
        })
    }

    /// Invoke the routine exactly once. On failure the input is released here.
    pub fn run<R: GeometryRoutine + ?Sized>(
        self,
        routine: &R,
        opts: &TriangulateOptions,
    ) -> Result<SolvedCall, RoutineError> {
        let output = routine.triangulate(opts, &self.input)?;
        Ok(SolvedCall {
            input: self.input,
            output,
        })
    }
}

/// A call holding both records until `finish`.
#[derive(Debug)]
pub struct SolvedCall {
    input: InputRecord,
    output: OutputRecord,
}

impl SolvedCall {
    pub fn output(&self) -> &OutputRecord {
        &self.output
    }

    pub fn decode(&self) -> Result<TriangulateResult, DecodeError> {
        Decoder.decode(&self.output)
    }

    /// Decode, then release every buffer of both records regardless of the outcome.
    pub fn finish(self) -> Result<TriangulateResult, DecodeError> {
        let res = self.decode();
        self.release();
        res
    }

    fn release(self) {
        let input_buffers = self.input.buffer_count();
        let output_buffers = self.output.buffer_count();
        drop(self.input);
        drop(self.output);
        tracing::debug!(
            input_buffers,
            output_buffers,
            live = live_buffers(),
            "released call buffers"
        );
    }
}

/// Encoder, options and routine bundled for repeated calls.
#[derive(Clone, Debug)]
pub struct Triangulator<R = CdtRoutine> {
    pub encoder: Encoder,
    pub options: TriangulateOptions,
    pub routine: R,
}

impl Default for Triangulator<CdtRoutine> {
    fn default() -> Self {
        Self::new(MarshalCfg::default(), TriangulateOptions::default())
    }
}

impl Triangulator<CdtRoutine> {
    pub fn new(cfg: MarshalCfg, options: TriangulateOptions) -> Self {
        Self {
            encoder: Encoder::new(cfg),
            options,
            routine: CdtRoutine,
        }
    }
}

impl<R: GeometryRoutine> Triangulator<R> {
    pub fn with_routine(routine: R) -> Self {
        Self {
            encoder: Encoder::default(),
            options: TriangulateOptions::default(),
            routine,
        }
    }

    /// One full call against a host object.
    pub fn triangulate<H: HostObject>(
        &self,
        host: &H,
    ) -> Result<TriangulateResult, TriangulateError> {
        let call = Call::encode(&self.encoder, host)?;
        let solved = call.run(&self.routine, &self.options)?;
        Ok(solved.finish()?)
    }
}
