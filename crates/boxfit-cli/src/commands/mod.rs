//! Subcommand implementations

pub mod batch;
pub mod inspect;
pub mod render;
