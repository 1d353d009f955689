//! CLI subcommand implementations.

pub mod directory;
pub mod export;
pub mod photo;
pub mod register;
pub mod signature;
pub mod students;
