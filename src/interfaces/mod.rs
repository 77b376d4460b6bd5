//! Edges of the crate: configuration loading and CSV input/output for the CLI.

pub mod config;
pub mod csv;
