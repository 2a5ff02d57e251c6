//! Shared helpers for runner integration tests.

pub mod fixtures;

#[allow(unused_imports)]
pub use fixtures::*;
