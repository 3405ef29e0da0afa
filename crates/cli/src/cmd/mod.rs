//! CLI command implementations

pub mod apply;
pub mod config;
pub mod plan;
pub mod watch;
