//! Command implementations for the typealign CLI
//!
//! Each command has its own module with an `Args` struct and a `run` function.

pub mod score;
pub mod validate;

pub use score::ScoreArgs;
pub use validate::ValidateArgs;
