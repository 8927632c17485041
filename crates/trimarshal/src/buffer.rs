//! Owned flat buffers and the per-thread live-buffer ledger.
//!
//! A `FlatBuffer<T>` is the Rust side of one record field: a contiguous run of
//! scalars grouped into elements of fixed `arity`. Release happens on drop, so
//! a buffer is freed exactly once on every exit path.
//!
//! The ledger counts buffers that were allocated but not yet dropped on the
//! current thread. Calls are single-threaded, so a thread-local counter is
//! enough to observe that a call released everything it allocated.

use std::cell::Cell;
use std::fmt;
use std::slice::ChunksExact;

use crate::field::Scalar;

thread_local! {
    static LIVE: Cell<usize> = const { Cell::new(0) };
}

/// Number of `FlatBuffer`s alive on the current thread.
pub fn live_buffers() -> usize {
    LIVE.with(|c| c.get())
}

/// Ledger entry; decrements the live count exactly once.
struct Tracked;

impl Tracked {
    fn acquire() -> Self {
        LIVE.with(|c| c.set(c.get() + 1));
        Tracked
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        LIVE.with(|c| c.set(c.get().saturating_sub(1)));
    }
}

/// Owned contiguous buffer of `T`, logically grouped into elements of `arity` scalars.
pub struct FlatBuffer<T: Scalar> {
    data: Vec<T>,
    arity: usize,
    _ledger: Tracked,
}

impl<T: Scalar> FlatBuffer<T> {
    /// Empty buffer with room for `len` scalars. `arity` must be positive.
    pub fn with_capacity(arity: usize, len: usize) -> Self {
        assert!(arity > 0, "flat buffer arity must be positive");
        Self {
            data: Vec::with_capacity(len),
            arity,
            _ledger: Tracked::acquire(),
        }
    }

    /// Take ownership of `data`. Trailing scalars that do not fill an element are
    /// kept but not counted; the encoder never produces such buffers.
    pub fn from_vec(arity: usize, data: Vec<T>) -> Self {
        assert!(arity > 0, "flat buffer arity must be positive");
        Self {
            data,
            arity,
            _ledger: Tracked::acquire(),
        }
    }

    #[inline]
    pub fn push(&mut self, v: T) {
        self.data.push(v);
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Raw scalar length.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Logical element count (`len / arity`).
    #[inline]
    pub fn count(&self) -> usize {
        self.data.len() / self.arity
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Element `i` as an `arity`-long slice.
    pub fn element(&self, i: usize) -> Option<&[T]> {
        let start = i.checked_mul(self.arity)?;
        self.data.get(start..start + self.arity)
    }

    /// Iterate complete elements.
    pub fn elements(&self) -> ChunksExact<'_, T> {
        self.data.chunks_exact(self.arity)
    }
}

impl<T: Scalar> fmt::Debug for FlatBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlatBuffer")
            .field("kind", &T::KIND)
            .field("arity", &self.arity)
            .field("count", &self.count())
            .field("data", &self.data)
            .finish()
    }
}
