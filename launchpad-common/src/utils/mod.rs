//! Serialization and time helpers shared across the launch crates.

pub mod encoding;
pub mod time;
