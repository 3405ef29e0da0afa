//! Library half of the `quire` binary
//!
//! Config, batch parsing and vault helpers live here so integration tests
//! can drive them without spawning the binary.

pub mod batch;
pub mod config;
pub mod vault;
