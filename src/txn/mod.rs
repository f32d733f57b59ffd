//! Batched transactional writer.
//!
//! The store accepts at most [`crate::MAX_TXN_SIZE`] operations per
//! transaction. Larger write sets are split into contiguous chunks that are
//! submitted one after another. Each chunk is atomic on its own; the write
//! set as a whole is NOT: chunks committed before a failing chunk stay
//! committed and nothing is rolled back. [`BatchedTxnResult`] and
//! [`BatchedTxnError`] expose the per-chunk outcome so callers cannot mistake
//! a chunked write for an atomic one.
mod batched_writer;

pub use batched_writer::*;
