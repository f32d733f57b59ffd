//! Caller-owned poll loops.
//!
//! One task per watched resource, each blocked in its own long poll, so
//! slow resources never hold up the others.
mod fleet_view;
mod poll_loop;

pub use fleet_view::*;
pub use poll_loop::*;
