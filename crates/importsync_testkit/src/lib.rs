//! # importsync testkit
//!
//! Test utilities shared by the importsync crates:
//! - Record fixtures over a common test schema
//! - Property-based test generators using proptest

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

pub use fixtures::*;
pub use generators::*;
