//! CLI library modules for the typealign binary.
//!
//! Kept in the library so argument parsing and commands can be tested
//! without spawning the binary.

pub mod commands;
pub mod output;
pub mod parser;

pub use parser::{Cli, Commands};
