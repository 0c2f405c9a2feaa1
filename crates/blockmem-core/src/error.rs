//! Error taxonomy for pool operations.
//!
//! Every fallible operation reports failure through `PoolError`; there is
//! no logging or retry layer. The caller decides what to do next.

use thiserror::Error;

/// Errors returned by pool operations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    /// No contiguous run of free blocks is long enough for the request.
    ///
    /// Also returned when the aggregate free-block count already rules the
    /// request out, or when the request exceeds the longest run the slot
    /// record can describe.
    #[error("out of memory: no contiguous run of free blocks is long enough")]
    OutOfMemory,

    /// The address does not resolve to the start of a live allocation.
    #[error("invalid address: not the start of a live allocation")]
    InvalidAddress,

    /// The supplied buffer cannot hold the slot table plus block storage.
    #[error("buffer too small: need {needed} bytes, got {got}")]
    BufferTooSmall {
        /// Minimum buffer length for the requested geometry.
        needed: usize,
        /// Length of the buffer actually supplied.
        got: usize,
    },

    /// Block size or block count is zero, or the layout math overflows.
    #[error("invalid pool geometry")]
    BadGeometry,
}
