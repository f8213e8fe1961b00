//! Command-line interface
//!
//! Argument parsing for the `keystone` binary.

pub mod commands;

pub use commands::{Command, Opt};
