//! Command-line surface
//!
//! clap definitions for the `hostwatch` binary and the table/JSON/compact
//! renderers its commands print through.

pub mod args;
pub mod output;

pub use args::{Cli, Commands, OutputFormat};
