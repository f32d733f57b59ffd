//! Turns raw listings into typed records.
//!
//! Two policies exist and are picked per record type:
//! - [`decode_best_effort`]: bad entries are logged and dropped, the call
//!   never fails. Used for engine reports, where one stale entry is harmless.
//! - [`decode_all_or_partial`]: every entry is attempted, and if any fails
//!   the caller gets a [`PartialDecode`] error that still carries every
//!   record that did decode. Used for chain runtime properties, where the
//!   owner decides between keeping the partial set and rolling back.
mod policies;
mod record_key;

pub use policies::*;
pub use record_key::*;

#[cfg(test)]
mod policies_test;
