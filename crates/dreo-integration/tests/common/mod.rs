//! Shared harness for the integration tests

#![allow(dead_code)]

mod fixtures;
mod test_dreo;

pub use fixtures::*;
pub use test_dreo::*;
