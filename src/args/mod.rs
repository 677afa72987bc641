//! CLI argument types and parsing helpers.
mod cli;
mod defaults;
pub(crate) mod parsers;
mod types;

#[cfg(test)]
mod tests;

pub use cli::BenchArgs;
pub use types::{PositiveU64, PositiveUsize};

pub(crate) use defaults::{DEFAULT_CONCURRENCY, DEFAULT_DURATION, DEFAULT_SEED};
pub(crate) use parsers::parse_duration_arg;
