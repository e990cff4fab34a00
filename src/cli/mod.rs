//! Command-line surface of the `actorflow` binary

pub mod args;
pub mod commands;

pub use args::{Cli, Commands};
