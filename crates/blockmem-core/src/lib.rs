//! # blockmem-core
//!
//! Fixed-block ("slab-style") pool allocator over a caller-supplied buffer.
//!
//! The pool partitions one contiguous buffer into a slot table followed by
//! block storage, and satisfies variable-sized requests by handing out runs
//! of one or more contiguous equal-sized blocks. It is built for
//! environments without a general-purpose heap: the caller supplies the
//! backing storage once, the pool never grows it and never allocates on its
//! own behalf, and all bookkeeping lives in the slot table colocated with
//! the buffer.
//!
//! Addresses are opaque offsets into the storage region rather than raw
//! pointers, so all table and storage access stays bounds-checked safe Rust.

#![deny(unsafe_code)]

pub mod error;
pub mod hint;
pub mod pool;
pub mod slot;

pub use error::PoolError;
pub use pool::{BlockAddr, BlockPool, required_buffer_len};
