//! Bootstrap from worker/service list files and existing agent state.

pub mod seed;

#[cfg(test)]
mod seed_test;

pub use seed::{bootstrap, parse_list, SeedReport};
