//! Records exchanged with engines through the store, JSON encoded in
//! camelCase.
mod engine_state;
mod library_update;
mod runtime_properties;

pub use engine_state::*;
pub use library_update::*;
pub use runtime_properties::*;

#[cfg(test)]
mod model_test;
